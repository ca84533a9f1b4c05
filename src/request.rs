use std::sync::Arc;

use http::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Serialize;
use url::Url;

use crate::config::parse_url;
use crate::parameters::serialize_pairs;
use crate::{
    Authorization, Config, ConfigError, ConfigResult, Credentials, OAuthParameters, ParameterSet,
    RequestMethod, Signer, TokenCredentials, OAUTH_KEY_PREFIX,
};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Whether a [`RequestSpec`] gets an `Authorization` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signing {
    Signed,
    Unsigned,
}

/// Everything needed to produce one outgoing request.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    method: RequestMethod,
    url: Url,
    parameters: ParameterSet,
    credentials: Option<Credentials>,
    token: Option<TokenCredentials>,
    oauth: OAuthParameters,
    signing: Signing,
}

impl RequestSpec {
    /// A signed request with no parameters and the default credentials.
    pub fn new(method: RequestMethod, url: Url) -> Self {
        RequestSpec {
            method,
            url,
            parameters: ParameterSet::new(),
            credentials: None,
            token: None,
            oauth: OAuthParameters::new(),
            signing: Signing::Signed,
        }
    }

    /// Same as [`new`](Self::new), parsing `url` first.
    pub fn parse(method: RequestMethod, url: &str) -> ConfigResult<Self> {
        Ok(RequestSpec::new(method, parse_url(url)?))
    }

    pub fn get(url: &str) -> ConfigResult<Self> {
        RequestSpec::parse(RequestMethod::Get, url)
    }

    pub fn post(url: &str) -> ConfigResult<Self> {
        RequestSpec::parse(RequestMethod::Post, url)
    }

    pub fn delete(url: &str) -> ConfigResult<Self> {
        RequestSpec::parse(RequestMethod::Delete, url)
    }

    // ------------------------------------------------------------------------
    // Parameters

    /// Adds one parameter, replacing an earlier value for the same key.
    pub fn parameter<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.parameters.insert(key, value);
        self
    }

    /// Merges `parameters` into the ones already set.
    pub fn parameters(mut self, parameters: ParameterSet) -> Self {
        self.parameters.extend(parameters.iter());
        self
    }

    /// Merges anything `serde_urlencoded` can serialize, e.g.
    /// `.form(&[("status", "Hello")])` or a struct deriving `Serialize`.
    ///
    /// # Errors
    /// This method fails if `form` cannot be serialized as key-value pairs.
    pub fn form<T: Serialize + ?Sized>(self, form: &T) -> ConfigResult<Self> {
        let encoded = serde_urlencoded::to_string(form)
            .map_err(|err| ConfigError::InvalidParameters(err.to_string()))?;
        Ok(self.parameters(ParameterSet::parse(&encoded)))
    }

    // ------------------------------------------------------------------------
    // Signing information

    /// Consumer credentials for this request only, overriding the defaults
    /// from [`Config`].
    pub fn consumer(self, credentials: Credentials) -> Self {
        RequestSpec {
            credentials: Some(credentials),
            ..self
        }
    }

    /// Signs with a token pair. An empty token signs as the request-token
    /// phase.
    pub fn token(self, token: TokenCredentials) -> Self {
        RequestSpec {
            token: Some(token),
            ..self
        }
    }

    pub fn oauth_parameters(self, oauth: OAuthParameters) -> Self {
        RequestSpec { oauth, ..self }
    }

    /// Sends the request without an `Authorization` header.
    pub fn unsigned(self) -> Self {
        RequestSpec {
            signing: Signing::Unsigned,
            ..self
        }
    }

    // ------------------------------------------------------------------------
    // Accessors

    pub fn method(&self) -> RequestMethod {
        self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn parameter_set(&self) -> &ParameterSet {
        &self.parameters
    }

    pub fn signing(&self) -> Signing {
        self.signing
    }
}

/// A concrete request, ready for a [`Transport`](crate::Transport).
#[derive(Debug, Clone)]
pub struct OutgoingRequest {
    method: RequestMethod,
    url: Url,
    headers: HeaderMap,
    body: Option<String>,
}

impl OutgoingRequest {
    pub fn method(&self) -> RequestMethod {
        self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// The `Authorization` header, if the request was signed.
    pub fn authorization(&self) -> Option<&str> {
        self.headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
    }
}

impl From<OutgoingRequest> for reqwest::Request {
    fn from(request: OutgoingRequest) -> Self {
        let mut inner = reqwest::Request::new(request.method.into(), request.url);
        *inner.headers_mut() = request.headers;
        if let Some(body) = request.body {
            *inner.body_mut() = Some(body.into());
        }
        inner
    }
}

/// Turns [`RequestSpec`]s into [`OutgoingRequest`]s.
///
/// Cloning is cheap; the configuration is shared.
#[derive(Debug, Clone, Default)]
pub struct RequestBuilder {
    config: Arc<Config>,
}

impl RequestBuilder {
    pub fn new(config: Config) -> Self {
        RequestBuilder {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Builds the request `spec` describes, signed unless it was
    /// marked [`unsigned`](RequestSpec::unsigned).
    ///
    /// # Errors
    /// Signing fails with [`ConfigError::MissingConsumerCredentials`] when
    /// neither `spec` nor the configuration holds a complete consumer
    /// key pair. No request is produced in that case.
    pub fn build(&self, spec: &RequestSpec) -> ConfigResult<OutgoingRequest> {
        match spec.signing {
            Signing::Signed => self.sign(spec, spec.token.as_ref()),
            Signing::Unsigned => self.assemble(spec, None),
        }
    }

    /// Builds `spec` without an `Authorization` header.
    pub fn unsigned_request(&self, spec: &RequestSpec) -> ConfigResult<OutgoingRequest> {
        self.assemble(spec, None)
    }

    /// Builds `spec` signed with `token`, ignoring its own token.
    pub fn signed_request(
        &self,
        spec: &RequestSpec,
        token: Option<&TokenCredentials>,
    ) -> ConfigResult<OutgoingRequest> {
        self.sign(spec, token)
    }

    fn sign(
        &self,
        spec: &RequestSpec,
        token: Option<&TokenCredentials>,
    ) -> ConfigResult<OutgoingRequest> {
        let credentials = spec
            .credentials
            .as_ref()
            .or_else(|| self.config.credentials.as_ref())
            .filter(|c| c.is_complete())
            .ok_or(ConfigError::MissingConsumerCredentials)?;
        let authorization = Signer::new(credentials, token, &spec.oauth).sign(
            spec.method,
            &spec.url,
            &spec.parameters,
        );
        self.assemble(spec, Some(authorization))
    }

    fn assemble(
        &self,
        spec: &RequestSpec,
        authorization: Option<Authorization>,
    ) -> ConfigResult<OutgoingRequest> {
        let signed = authorization.is_some();
        // protocol parameters travel in the header once the request is signed
        let payload = serialize_pairs(
            spec.parameters
                .iter()
                .filter(|(k, _)| !(signed && k.starts_with(OAUTH_KEY_PREFIX))),
        );

        let mut url = spec.url.clone();
        let mut headers = HeaderMap::new();
        let mut body = None;
        if spec.method.carries_body() {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));
            body = Some(payload);
        } else if !payload.is_empty() {
            let query = match url.query() {
                Some(q) if !q.is_empty() => format!("{}&{}", q, payload),
                _ => payload,
            };
            url.set_query(Some(&query));
        }

        if let Some(authorization) = authorization {
            let value = HeaderValue::from_str(&authorization.header_value())
                .map_err(|err| ConfigError::InvalidHeader(err.to_string()))?;
            headers.insert(AUTHORIZATION, value);
        }

        tracing::debug!(method = %spec.method, %url, signed, "built request");
        Ok(OutgoingRequest {
            method: spec.method,
            url,
            headers,
            body,
        })
    }
}
