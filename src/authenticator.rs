use std::sync::{Mutex, MutexGuard, PoisonError};

use reqwest::Client as ReqwestClient;
use url::Url;

use crate::token_reader::{read_body, read_oauth_token};
use crate::{
    Client, Config, Credentials, Error, OAuthParameters, Provider, RequestMethod, RequestSpec,
    Result, TokenCredentials, TokenResponse, Transport,
};

/// Where a three-legged handshake currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowState {
    Idle,
    TokenRequested,
    /// Holds the temporary request token.
    TokenObtained(TokenCredentials),
    AccessTokenRequested,
    /// Holds the long-lived access token.
    Authenticated(TokenCredentials),
    /// The last step failed for the given reason.
    Failed(String),
}

#[derive(Debug)]
struct Flow {
    state: FlowState,
    request_token: Option<TokenCredentials>,
    access_token: Option<TokenResponse>,
}

/// Drives the OAuth 1.0a handshake against one [`Provider`]:
/// request token, user authorization, access token.
///
/// Each step is a single HTTP call; nothing is retried. A failed step moves
/// the flow to [`FlowState::Failed`] but leaves the tokens obtained so far
/// in place. Running two handshakes on the same instance at once is not
/// guarded against.
#[derive(Debug)]
pub struct Authenticator<T = ReqwestClient> {
    client: Client<T>,
    provider: Provider,
    flow: Mutex<Flow>,
}

impl Authenticator<ReqwestClient> {
    pub fn new(credentials: Credentials, provider: Provider) -> Self {
        Authenticator::with_client(Client::new(Config::new(credentials)), provider)
    }
}

impl<T> Authenticator<T>
where
    T: Transport,
{
    pub fn with_client(client: Client<T>, provider: Provider) -> Self {
        Authenticator {
            client,
            provider,
            flow: Mutex::new(Flow {
                state: FlowState::Idle,
                request_token: None,
                access_token: None,
            }),
        }
    }

    pub fn provider(&self) -> &Provider {
        &self.provider
    }

    pub fn client(&self) -> &Client<T> {
        &self.client
    }

    pub fn state(&self) -> FlowState {
        self.lock().state.clone()
    }

    /// The temporary token from the last successful [`fetch_token`](Self::fetch_token).
    pub fn request_token(&self) -> Option<TokenCredentials> {
        self.lock().request_token.clone()
    }

    /// The response of the last successful
    /// [`authenticate_token`](Self::authenticate_token).
    pub fn access_token(&self) -> Option<TokenResponse> {
        self.lock().access_token.clone()
    }

    /// The page where the user approves `token`.
    pub fn authentication_url(&self, token: &str) -> Result<Url> {
        Ok(self.provider.authentication_url(token)?)
    }

    /// Step 1: obtains a request token.
    ///
    /// Returns the provider's url-encoded response as is, e.g.
    /// `oauth_token=abc&oauth_token_secret=xyz&oauth_callback_confirmed=true`;
    /// use [`TokenResponse::from_query`] to pick it apart. `callback` may be
    /// `oob` for out-of-band PIN verification.
    pub async fn fetch_token(&self, callback: &str) -> Result<String> {
        self.transition(FlowState::TokenRequested);
        match self.request_temporary_token(callback).await {
            Ok((body, token)) => {
                let mut flow = self.lock();
                flow.request_token = Some(token.clone());
                flow.state = FlowState::TokenObtained(token);
                tracing::debug!(state = ?flow.state, "oauth flow transition");
                Ok(body)
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Step 3: exchanges the authorized request token and the verifier for
    /// an access token.
    ///
    /// The request is signed with the token secret obtained by
    /// [`fetch_token`](Self::fetch_token) when `token` is that request token,
    /// and with an empty token secret otherwise.
    pub async fn authenticate_token(&self, token: &str, verifier: &str) -> Result<TokenResponse> {
        let token_secret = self
            .lock()
            .request_token
            .as_ref()
            .filter(|t| t.token() == token)
            .map(|t| t.token_secret().to_string())
            .unwrap_or_default();
        let temporary = TokenCredentials::new(token, token_secret);

        self.transition(FlowState::AccessTokenRequested);
        match self.request_access_token(&temporary, verifier).await {
            Ok(response) => {
                let mut flow = self.lock();
                flow.access_token = Some(response.clone());
                flow.state = FlowState::Authenticated(response.credentials());
                tracing::debug!(state = ?flow.state, "oauth flow transition");
                Ok(response)
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    async fn request_temporary_token(&self, callback: &str) -> Result<(String, TokenCredentials)> {
        let spec = RequestSpec::parse(RequestMethod::Post, &self.provider.request_token_url)?
            .oauth_parameters(OAuthParameters::new().callback(callback));
        let response = self.client.perform_signed(&spec, None).await?;
        let body = read_body(response)?;
        let token = read_oauth_token(&body)?;
        Ok((body, token.credentials()))
    }

    async fn request_access_token(
        &self,
        temporary: &TokenCredentials,
        verifier: &str,
    ) -> Result<TokenResponse> {
        let spec = RequestSpec::parse(RequestMethod::Post, &self.provider.access_token_url)?
            .oauth_parameters(OAuthParameters::new().verifier(verifier));
        let response = self.client.perform_signed(&spec, Some(temporary)).await?;
        let body = read_body(response)?;
        Ok(read_oauth_token(&body)?)
    }

    fn transition(&self, state: FlowState) {
        tracing::debug!(?state, "oauth flow transition");
        self.lock().state = state;
    }

    fn fail(&self, err: Error) -> Error {
        tracing::warn!(error = %err, "oauth handshake step failed");
        self.lock().state = FlowState::Failed(err.to_string());
        err
    }

    fn lock(&self) -> MutexGuard<'_, Flow> {
        self.flow.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
