use serde::Deserialize;
use url::Url;

use crate::{ConfigError, ConfigResult, Credentials, OAUTH_TOKEN_KEY};

/// Environment variable read by [`Config::from_env`] for the consumer key.
pub const CONSUMER_KEY_ENV: &str = "OAUTH_CONSUMER_KEY";
/// Environment variable read by [`Config::from_env`] for the consumer secret.
pub const CONSUMER_SECRET_ENV: &str = "OAUTH_CONSUMER_SECRET";

const TWITTER_REQUEST_TOKEN_URL: &str = "https://api.twitter.com/oauth/request_token";
const TWITTER_AUTHORIZE_URL: &str = "https://api.twitter.com/oauth/authorize";
const TWITTER_AUTHENTICATE_URL: &str = "https://api.twitter.com/oauth/authenticate";
const TWITTER_ACCESS_TOKEN_URL: &str = "https://api.twitter.com/oauth/access_token";

/// Settings shared by every request built from it.
///
/// The consumer credentials here are only a default: a
/// [`RequestSpec`](crate::RequestSpec) may carry its own pair, which wins.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub credentials: Option<Credentials>,
}

impl Config {
    pub fn new(credentials: Credentials) -> Self {
        Config {
            credentials: Some(credentials),
        }
    }

    /// Reads the default consumer credentials from `OAUTH_CONSUMER_KEY` and
    /// `OAUTH_CONSUMER_SECRET`.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let consumer_key =
            lookup(CONSUMER_KEY_ENV).ok_or(ConfigError::MissingEnv(CONSUMER_KEY_ENV))?;
        let consumer_secret =
            lookup(CONSUMER_SECRET_ENV).ok_or(ConfigError::MissingEnv(CONSUMER_SECRET_ENV))?;
        Ok(Config::new(Credentials::new(consumer_key, consumer_secret)))
    }
}

/// The three endpoints of an OAuth 1.0a provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Provider {
    pub request_token_url: String,
    pub authorize_url: String,
    pub access_token_url: String,
}

impl Provider {
    pub fn new<A, B, C>(request_token_url: A, authorize_url: B, access_token_url: C) -> Self
    where
        A: Into<String>,
        B: Into<String>,
        C: Into<String>,
    {
        Provider {
            request_token_url: request_token_url.into(),
            authorize_url: authorize_url.into(),
            access_token_url: access_token_url.into(),
        }
    }

    /// Twitter, with the user sent to `oauth/authorize`.
    pub fn twitter() -> Self {
        Provider::new(
            TWITTER_REQUEST_TOKEN_URL,
            TWITTER_AUTHORIZE_URL,
            TWITTER_ACCESS_TOKEN_URL,
        )
    }

    /// Twitter's "Sign in with Twitter" flow, which sends the user to
    /// `oauth/authenticate` and skips the prompt for apps already authorized.
    pub fn twitter_sign_in() -> Self {
        Provider::new(
            TWITTER_REQUEST_TOKEN_URL,
            TWITTER_AUTHENTICATE_URL,
            TWITTER_ACCESS_TOKEN_URL,
        )
    }

    /// The page the user visits to approve `token`.
    ///
    /// This is only a URL; nothing is signed or sent.
    pub fn authentication_url(&self, token: &str) -> ConfigResult<Url> {
        let mut url = parse_url(&self.authorize_url)?;
        url.query_pairs_mut().append_pair(OAUTH_TOKEN_KEY, token);
        Ok(url)
    }
}

pub(crate) fn parse_url(url: &str) -> ConfigResult<Url> {
    Url::parse(url).map_err(|err| ConfigError::InvalidUrl(url.to_string(), err))
}
