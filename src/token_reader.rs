use std::{collections::HashMap, future::Future};

use async_trait::async_trait;
use serde::Deserialize;

use crate::{
    Error, Response, Result, TokenCredentials, TokenReaderError, TokenReaderResult,
    OAUTH_TOKEN_KEY,
};

const OAUTH_TOKEN_SECRET_KEY: &str = "oauth_token_secret";

/// Represents response of token acquisition.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TokenResponse {
    /// OAuth Token
    pub oauth_token: String,
    /// OAuth Token Secret
    pub oauth_token_secret: String,
    /// Other contents, e.g. `oauth_callback_confirmed` or `screen_name`
    #[serde(flatten)]
    pub remain: HashMap<String, String>,
}

impl TokenResponse {
    /// Decodes a url-encoded token response such as
    /// `oauth_token=abc&oauth_token_secret=xyz`.
    pub fn from_query(query: &str) -> TokenReaderResult<Self> {
        read_oauth_token(query)
    }

    pub fn credentials(&self) -> TokenCredentials {
        TokenCredentials::new(self.oauth_token.as_str(), self.oauth_token_secret.as_str())
    }
}

/// Add parse_oauth_token feature to [`Response`].
// this trait is sealed
pub trait TokenReader: private::Sealed {
    /// Fails on a non-2xx status or a body without the token pair.
    fn parse_oauth_token(self) -> Result<TokenResponse>;
}

impl TokenReader for Response {
    fn parse_oauth_token(self) -> Result<TokenResponse> {
        let text = read_body(self)?;
        Ok(read_oauth_token(&text)?)
    }
}

/// Add parse_oauth_token feature to Future of [`Response`].
// this trait is also sealed
#[async_trait(?Send)]
pub trait TokenReaderFuture: private::SealedWrapper {
    async fn parse_oauth_token(self) -> Result<TokenResponse>;
}

#[async_trait(?Send)]
impl<T, E> TokenReaderFuture for T
where
    T: Future<Output = std::result::Result<Response, E>>,
    E: Into<Error> + 'static,
{
    async fn parse_oauth_token(self) -> Result<TokenResponse> {
        match self.await {
            Ok(resp) => resp.parse_oauth_token(),
            Err(err) => Err(err.into()),
        }
    }
}

/// Checks the status and decodes the body as UTF-8.
pub(crate) fn read_body(response: Response) -> Result<String> {
    let body = response.error_for_status()?.into_bytes();
    Ok(String::from_utf8(body).map_err(TokenReaderError::from)?)
}

pub(crate) fn read_oauth_token(text: &str) -> TokenReaderResult<TokenResponse> {
    let mut destructured = url::form_urlencoded::parse(text.as_bytes())
        .into_owned()
        .collect::<HashMap<String, String>>();
    let oauth_token = destructured.remove(OAUTH_TOKEN_KEY);
    let oauth_token_secret = destructured.remove(OAUTH_TOKEN_SECRET_KEY);
    match (oauth_token, oauth_token_secret) {
        (Some(t), Some(s)) => Ok(TokenResponse {
            oauth_token: t,
            oauth_token_secret: s,
            remain: destructured,
        }),
        (None, _) => Err(TokenReaderError::TokenKeyNotFound(
            OAUTH_TOKEN_KEY,
            text.to_string(),
        )),
        (_, _) => Err(TokenReaderError::TokenKeyNotFound(
            OAUTH_TOKEN_SECRET_KEY,
            text.to_string(),
        )),
    }
}

mod private {
    use std::future::Future;

    use crate::{Error, Response};

    pub trait Sealed {}
    impl Sealed for Response {}
    pub trait SealedWrapper {}
    impl<T, E> SealedWrapper for T
    where
        T: Future<Output = Result<Response, E>>,
        E: Into<Error>,
    {
    }
}
