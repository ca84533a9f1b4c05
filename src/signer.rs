use std::collections::BTreeMap;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use hmac::{Hmac, Mac};
use rand::distributions::Alphanumeric;
use rand::Rng;
use sha1::Sha1;
use url::Url;

use crate::parameters::{percent_encode, serialize_pairs};
use crate::{
    Credentials, ParameterSet, RequestMethod, TokenCredentials, OAUTH_CALLBACK_KEY,
    OAUTH_CONSUMER_KEY, OAUTH_KEY_PREFIX, OAUTH_NONCE_KEY, OAUTH_SIGNATURE_KEY,
    OAUTH_SIGNATURE_METHOD_KEY, OAUTH_TIMESTAMP_KEY, OAUTH_TOKEN_KEY, OAUTH_VERIFIER_KEY,
    OAUTH_VERSION_KEY, REALM_KEY,
};

type HmacSha1 = Hmac<Sha1>;

const SIGNATURE_METHOD: &str = "HMAC-SHA1";
const OAUTH_VERSION: &str = "1.0";
const NONCE_LENGTH: usize = 32;

/// Protocol parameters the signer always computes itself.
const ENGINE_OWNED_KEYS: &[&str] = &[
    OAUTH_CONSUMER_KEY,
    OAUTH_NONCE_KEY,
    OAUTH_SIGNATURE_KEY,
    OAUTH_SIGNATURE_METHOD_KEY,
    OAUTH_TIMESTAMP_KEY,
    OAUTH_TOKEN_KEY,
    OAUTH_VERSION_KEY,
];

/// Computes HMAC-SHA1 signatures for one set of credentials.
#[derive(Debug, Clone, Copy)]
pub struct Signer<'a> {
    credentials: &'a Credentials,
    token: Option<&'a TokenCredentials>,
    parameters: &'a OAuthParameters,
}

impl<'a> Signer<'a> {
    pub fn new(
        credentials: &'a Credentials,
        token: Option<&'a TokenCredentials>,
        parameters: &'a OAuthParameters,
    ) -> Self {
        Signer {
            credentials,
            token,
            parameters,
        }
    }

    /// Signs a request.
    ///
    /// Query parameters already on `url` are signed along with `params`.
    /// Entries of `params` whose key starts with `oauth_` are treated as
    /// protocol parameters and end up in the header; engine-owned keys such
    /// as `oauth_nonce` are ignored in favour of the computed values.
    ///
    /// Every call draws a fresh nonce and reads the clock, unless the
    /// [`OAuthParameters`] pin them.
    pub fn sign(&self, method: RequestMethod, url: &Url, params: &ParameterSet) -> Authorization {
        let nonce = self
            .parameters
            .nonce
            .clone()
            .unwrap_or_else(generate_nonce);
        let timestamp = self.parameters.timestamp.unwrap_or_else(current_timestamp);

        let mut protocol = BTreeMap::new();
        let mut request_params = url
            .query_pairs()
            .into_owned()
            .collect::<Vec<(String, String)>>();
        for (key, value) in params {
            if !key.starts_with(OAUTH_KEY_PREFIX) {
                request_params.push((key.to_string(), value.to_string()));
            } else if ENGINE_OWNED_KEYS.iter().any(|owned| *owned == key) {
                tracing::warn!(key, "ignoring engine-owned oauth parameter");
            } else {
                protocol.insert(key.to_string(), value.to_string());
            }
        }

        if let Some(ref callback) = self.parameters.callback {
            protocol.insert(OAUTH_CALLBACK_KEY.to_string(), callback.clone());
        }
        if let Some(ref verifier) = self.parameters.verifier {
            protocol.insert(OAUTH_VERIFIER_KEY.to_string(), verifier.clone());
        }
        protocol.insert(
            OAUTH_CONSUMER_KEY.to_string(),
            self.credentials.consumer_key().to_string(),
        );
        protocol.insert(OAUTH_NONCE_KEY.to_string(), nonce);
        protocol.insert(
            OAUTH_SIGNATURE_METHOD_KEY.to_string(),
            SIGNATURE_METHOD.to_string(),
        );
        protocol.insert(OAUTH_TIMESTAMP_KEY.to_string(), timestamp.to_string());
        if let Some(token) = self.token.filter(|t| !t.is_empty()) {
            protocol.insert(OAUTH_TOKEN_KEY.to_string(), token.token().to_string());
        }
        if self.parameters.version {
            protocol.insert(OAUTH_VERSION_KEY.to_string(), OAUTH_VERSION.to_string());
        }

        let pairs = request_params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .chain(protocol.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        let base_string = base_string(method, url, pairs);
        tracing::debug!(%method, url = %base_url(url), "signing request");
        tracing::trace!(%base_string, "signature base string");

        let token_secret = self.token.map(|t| t.token_secret()).unwrap_or_default();
        let key = signing_key(self.credentials.consumer_secret(), token_secret);
        let signature = hmac_sha1(&key, &base_string);

        protocol.insert(OAUTH_SIGNATURE_KEY.to_string(), signature.clone());
        Authorization {
            realm: self.parameters.realm.clone(),
            parameters: protocol,
            signature,
            base_string,
        }
    }
}

/// The outcome of one signing operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authorization {
    realm: Option<String>,
    parameters: BTreeMap<String, String>,
    signature: String,
    base_string: String,
}

impl Authorization {
    /// The base64 `oauth_signature`, not yet percent-encoded.
    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn base_string(&self) -> &str {
        &self.base_string
    }

    /// Looks up one of the `oauth_*` parameters that went into the header.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).map(String::as_str)
    }

    /// The value of the `Authorization` header.
    pub fn header_value(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Authorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut items = Vec::with_capacity(self.parameters.len() + 1);
        if let Some(ref realm) = self.realm {
            items.push(format!("{}=\"{}\"", REALM_KEY, percent_encode(realm)));
        }
        items.extend(
            self.parameters
                .iter()
                .map(|(k, v)| format!("{}=\"{}\"", percent_encode(k), percent_encode(v))),
        );
        write!(f, "OAuth {}", items.join(", "))
    }
}

/// Per-request protocol options.
///
/// `oauth_version="1.0"` is sent unless turned off with
/// [`version(false)`](Self::version).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthParameters {
    callback: Option<String>,
    nonce: Option<String>,
    realm: Option<String>,
    timestamp: Option<u64>,
    verifier: Option<String>,
    version: bool,
}

impl Default for OAuthParameters {
    fn default() -> Self {
        OAuthParameters {
            callback: None,
            nonce: None,
            realm: None,
            timestamp: None,
            verifier: None,
            version: true,
        }
    }
}

impl OAuthParameters {
    pub fn new() -> Self {
        Default::default()
    }

    /// set the oauth_callback value
    pub fn callback<T>(self, callback: T) -> Self
    where
        T: Into<String>,
    {
        OAuthParameters {
            callback: Some(callback.into()),
            ..self
        }
    }

    /// set the oauth_nonce value
    ///
    /// # Note
    /// A pinned nonce is reused by every request signed with these
    /// parameters. Only pin it to reproduce a known signature.
    pub fn nonce<T>(self, nonce: T) -> Self
    where
        T: Into<String>,
    {
        OAuthParameters {
            nonce: Some(nonce.into()),
            ..self
        }
    }

    /// set the realm value
    pub fn realm<T>(self, realm: T) -> Self
    where
        T: Into<String>,
    {
        OAuthParameters {
            realm: Some(realm.into()),
            ..self
        }
    }

    /// set the oauth_timestamp value
    pub fn timestamp<T>(self, timestamp: T) -> Self
    where
        T: Into<u64>,
    {
        OAuthParameters {
            timestamp: Some(timestamp.into()),
            ..self
        }
    }

    /// set the oauth_verifier value
    pub fn verifier<T>(self, verifier: T) -> Self
    where
        T: Into<String>,
    {
        OAuthParameters {
            verifier: Some(verifier.into()),
            ..self
        }
    }

    /// set whether oauth_version="1.0" is sent
    pub fn version<T>(self, version: T) -> Self
    where
        T: Into<bool>,
    {
        OAuthParameters {
            version: version.into(),
            ..self
        }
    }
}

/// Builds `METHOD&enc(base url)&enc(normalized parameters)`.
pub fn base_string<'a, I>(method: RequestMethod, url: &Url, params: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    format!(
        "{}&{}&{}",
        method.as_str(),
        percent_encode(base_url(url).as_str()),
        percent_encode(&serialize_pairs(params))
    )
}

/// `enc(consumer_secret)&enc(token_secret)`; the token half may be empty.
pub fn signing_key(consumer_secret: &str, token_secret: &str) -> String {
    format!(
        "{}&{}",
        percent_encode(consumer_secret),
        percent_encode(token_secret)
    )
}

// scheme and host are already lowercase and default ports dropped by `Url`
fn base_url(url: &Url) -> Url {
    let mut base = url.clone();
    base.set_query(None);
    base.set_fragment(None);
    let _ = base.set_username("");
    let _ = base.set_password(None);
    base
}

fn hmac_sha1(key: &str, message: &str) -> String {
    let mut mac =
        HmacSha1::new_from_slice(key.as_bytes()).expect("HMAC can take key of any size");
    mac.update(message.as_bytes());
    BASE64.encode(mac.finalize().into_bytes())
}

fn generate_nonce() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(NONCE_LENGTH)
        .map(char::from)
        .collect()
}

fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn twitter_credentials() -> (Credentials, TokenCredentials) {
        // https://developer.twitter.com/en/docs/authentication/oauth-1-0a/creating-a-signature
        (
            Credentials::new(
                "xvz1evFS4wEEPTGEFPHBog",
                "kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw",
            ),
            TokenCredentials::new(
                "370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb",
                "LswwdoUaIvS8ltyTt5jkRh4J50vUPVVHtR2YPi5kE",
            ),
        )
    }

    fn twitter_params() -> ParameterSet {
        ParameterSet::new()
            .with("include_entities", "true")
            .with("status", "Hello Ladies + Gentlemen, a signed OAuth request!")
    }

    #[test]
    fn twitter_signature_vector() {
        let (credentials, token) = twitter_credentials();
        let params = OAuthParameters::new()
            .nonce("kYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg")
            .timestamp(1_318_622_958u64);
        let url = Url::parse("https://api.twitter.com/1.1/statuses/update.json").unwrap();

        let auth = Signer::new(&credentials, Some(&token), &params).sign(
            RequestMethod::Post,
            &url,
            &twitter_params(),
        );

        assert_eq!(
            auth.base_string(),
            "POST&https%3A%2F%2Fapi.twitter.com%2F1.1%2Fstatuses%2Fupdate.json&\
             include_entities%3Dtrue%26oauth_consumer_key%3Dxvz1evFS4wEEPTGEFPHBog%26\
             oauth_nonce%3DkYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg%26\
             oauth_signature_method%3DHMAC-SHA1%26oauth_timestamp%3D1318622958%26\
             oauth_token%3D370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb%26\
             oauth_version%3D1.0%26status%3DHello%2520Ladies%2520%252B%2520\
             Gentlemen%252C%2520a%2520signed%2520OAuth%2520request%2521"
        );
        assert_eq!(auth.signature(), "hCtSmYh+iHYCEqBWrE7C7hYmtUk=");
        assert_eq!(
            auth.header_value(),
            "OAuth oauth_consumer_key=\"xvz1evFS4wEEPTGEFPHBog\", \
             oauth_nonce=\"kYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg\", \
             oauth_signature=\"hCtSmYh%2BiHYCEqBWrE7C7hYmtUk%3D\", \
             oauth_signature_method=\"HMAC-SHA1\", \
             oauth_timestamp=\"1318622958\", \
             oauth_token=\"370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb\", \
             oauth_version=\"1.0\""
        );
    }

    #[test]
    fn signing_key_joins_encoded_secrets() {
        let (credentials, token) = twitter_credentials();
        assert_eq!(
            signing_key(credentials.consumer_secret(), token.token_secret()),
            "kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw&LswwdoUaIvS8ltyTt5jkRh4J50vUPVVHtR2YPi5kE"
        );
        assert_eq!(signing_key("a b", ""), "a%20b&");
    }

    #[test]
    fn rfc5849_temporary_credentials_vector() {
        // https://tools.ietf.org/html/rfc5849#section-1.2
        let credentials = Credentials::new("dpf43f3p2l4k3l03", "kd94hf93k423kf44");
        let params = OAuthParameters::new()
            .nonce("wIjqoS")
            .timestamp(137_131_200u64)
            .callback("http://printer.example.com/ready")
            .realm("photos")
            .version(false);
        let url = Url::parse("https://photos.example.net/initiate").unwrap();

        let auth = Signer::new(&credentials, None, &params).sign(
            RequestMethod::Post,
            &url,
            &ParameterSet::new(),
        );

        assert_eq!(auth.signature(), "74KNZJeDHnMBp0EMJ9ZHt/XKycU=");
        assert_eq!(auth.get(OAUTH_TOKEN_KEY), None);
        assert!(auth
            .header_value()
            .starts_with("OAuth realm=\"photos\", oauth_callback=\"http%3A%2F%2Fprinter"));
    }

    #[test]
    fn rfc5849_resource_vector_with_query() {
        // https://tools.ietf.org/html/rfc5849#section-1.2
        let credentials = Credentials::new("dpf43f3p2l4k3l03", "kd94hf93k423kf44");
        let token = TokenCredentials::new("nnch734d00sl2jdk", "pfkkdhi9sl3r4s00");
        let params = OAuthParameters::new()
            .nonce("chapoH")
            .timestamp(137_131_202u64)
            .realm("Photos")
            .version(false);
        let url =
            Url::parse("http://photos.example.net/photos?file=vacation.jpg&size=original").unwrap();

        let auth = Signer::new(&credentials, Some(&token), &params).sign(
            RequestMethod::Get,
            &url,
            &ParameterSet::new(),
        );

        assert_eq!(
            auth.base_string(),
            "GET&http%3A%2F%2Fphotos.example.net%2Fphotos&file%3Dvacation.jpg%26\
             oauth_consumer_key%3Ddpf43f3p2l4k3l03%26oauth_nonce%3DchapoH%26\
             oauth_signature_method%3DHMAC-SHA1%26oauth_timestamp%3D137131202%26\
             oauth_token%3Dnnch734d00sl2jdk%26size%3Doriginal"
        );
        assert_eq!(auth.signature(), "MdpQcU8iPSUjWoN/UDMsK2sui9I=");
    }

    #[test]
    fn query_and_parameters_sign_the_same() {
        let credentials = Credentials::new("dpf43f3p2l4k3l03", "kd94hf93k423kf44");
        let token = TokenCredentials::new("nnch734d00sl2jdk", "pfkkdhi9sl3r4s00");
        let params = OAuthParameters::new()
            .nonce("chapoH")
            .timestamp(137_131_202u64)
            .version(false);
        let signer = Signer::new(&credentials, Some(&token), &params);

        let with_query = signer.sign(
            RequestMethod::Get,
            &Url::parse("http://photos.example.net/photos?file=vacation.jpg&size=original")
                .unwrap(),
            &ParameterSet::new(),
        );
        let with_params = signer.sign(
            RequestMethod::Get,
            &Url::parse("http://photos.example.net/photos").unwrap(),
            &ParameterSet::new()
                .with("size", "original")
                .with("file", "vacation.jpg"),
        );
        assert_eq!(with_query.signature(), with_params.signature());
    }

    #[test]
    fn natural_signatures_never_repeat() {
        let (credentials, token) = twitter_credentials();
        let params = OAuthParameters::new();
        let signer = Signer::new(&credentials, Some(&token), &params);
        let url = Url::parse("https://api.twitter.com/1.1/statuses/update.json").unwrap();

        let first = signer.sign(RequestMethod::Post, &url, &twitter_params());
        let second = signer.sign(RequestMethod::Post, &url, &twitter_params());

        assert_ne!(first.get(OAUTH_NONCE_KEY), second.get(OAUTH_NONCE_KEY));
        assert_ne!(first.signature(), second.signature());
        assert_eq!(first.get(OAUTH_NONCE_KEY).map(str::len), Some(NONCE_LENGTH));
    }

    #[test]
    fn empty_token_is_left_out() {
        let credentials = Credentials::new("key", "secret");
        let token = TokenCredentials::default();
        let params = OAuthParameters::new().nonce("n").timestamp(1u64);
        let url = Url::parse("https://example.com/oauth/request_token").unwrap();

        let auth = Signer::new(&credentials, Some(&token), &params).sign(
            RequestMethod::Post,
            &url,
            &ParameterSet::new(),
        );
        let header = auth.header_value();
        assert!(!header.contains("oauth_token="));
        assert_eq!(
            header,
            format!(
                "OAuth oauth_consumer_key=\"key\", oauth_nonce=\"n\", oauth_signature=\"{}\", \
                 oauth_signature_method=\"HMAC-SHA1\", oauth_timestamp=\"1\", oauth_version=\"1.0\"",
                percent_encode(auth.signature())
            )
        );
    }

    #[test]
    fn oauth_request_parameters_move_to_header() {
        let credentials = Credentials::new("key", "secret");
        let params = OAuthParameters::new().nonce("n").timestamp(1u64);
        let url = Url::parse("https://example.com/oauth/access_token").unwrap();
        let request = ParameterSet::new()
            .with(OAUTH_VERIFIER_KEY, "pin")
            .with(OAUTH_NONCE_KEY, "forged")
            .with("status", "hi");

        let auth =
            Signer::new(&credentials, None, &params).sign(RequestMethod::Post, &url, &request);

        assert_eq!(auth.get(OAUTH_VERIFIER_KEY), Some("pin"));
        assert_eq!(auth.get(OAUTH_NONCE_KEY), Some("n"));
        assert_eq!(auth.get("status"), None);
        assert!(auth.base_string().contains("oauth_verifier%3Dpin"));
        assert!(auth.base_string().contains("status%3Dhi"));
        assert!(!auth.base_string().contains("forged"));
    }

    #[test]
    fn base_url_drops_query_fragment_and_default_port() {
        let url = Url::parse("HTTPS://User:pw@Example.COM:443/Path?q=1#frag").unwrap();
        assert_eq!(base_url(&url).as_str(), "https://example.com/Path");
        let url = Url::parse("http://example.com:8080/").unwrap();
        assert_eq!(base_url(&url).as_str(), "http://example.com:8080/");
    }
}
