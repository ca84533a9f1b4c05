use reqwest::Client as ReqwestClient;

use crate::{
    Config, OutgoingRequest, RequestBuilder, RequestMethod, RequestSpec, Response, Result,
    TokenCredentials, Transport,
};

/// Turns a `reqwest::Client` into an OAuth 1.0a [`Client`].
pub trait OAuthClientProvider {
    fn oauth1(self, config: Config) -> Client<Self>
    where
        Self: Sized;
}

impl OAuthClientProvider for ReqwestClient {
    fn oauth1(self, config: Config) -> Client<Self> {
        Client::with_transport(self, config)
    }
}

/// Builds requests from [`RequestSpec`]s and sends them over a [`Transport`].
#[derive(Debug, Clone)]
pub struct Client<T = ReqwestClient> {
    transport: T,
    builder: RequestBuilder,
}

impl Client<ReqwestClient> {
    /// Constructs a new `Client`.
    ///
    /// This method calls reqwest::Client::new() internally.
    pub fn new(config: Config) -> Self {
        Client::with_transport(ReqwestClient::new(), config)
    }
}

impl From<ReqwestClient> for Client<ReqwestClient> {
    fn from(client: ReqwestClient) -> Self {
        Client::with_transport(client, Config::default())
    }
}

impl<T> Client<T>
where
    T: Transport,
{
    /// Constructs a new `Client` with specifying the transport.
    pub fn with_transport(transport: T, config: Config) -> Self {
        Client {
            transport,
            builder: RequestBuilder::new(config),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn builder(&self) -> &RequestBuilder {
        &self.builder
    }

    pub fn config(&self) -> &Config {
        self.builder.config()
    }

    /// Convenience method to start a `GET` request spec.
    ///
    /// # Errors
    ///
    /// This method fails whenever supplied `url` cannot be parsed.
    pub fn get(&self, url: &str) -> Result<RequestSpec> {
        self.request(RequestMethod::Get, url)
    }

    /// Convenience method to start a `POST` request spec.
    ///
    /// # Errors
    ///
    /// This method fails whenever supplied `url` cannot be parsed.
    pub fn post(&self, url: &str) -> Result<RequestSpec> {
        self.request(RequestMethod::Post, url)
    }

    /// Convenience method to start a `DELETE` request spec.
    ///
    /// # Errors
    ///
    /// This method fails whenever supplied `url` cannot be parsed.
    pub fn delete(&self, url: &str) -> Result<RequestSpec> {
        self.request(RequestMethod::Delete, url)
    }

    pub fn request(&self, method: RequestMethod, url: &str) -> Result<RequestSpec> {
        Ok(RequestSpec::parse(method, url)?)
    }

    /// Builds `spec` and sends it. The response is returned whatever its
    /// status; see [`Response::error_for_status`].
    ///
    /// # Errors
    ///
    /// Fails with a configuration error when the request cannot be built
    /// (nothing is sent then) and with a transport error when sending fails.
    pub async fn perform(&self, spec: &RequestSpec) -> Result<Response> {
        let request = self.builder.build(spec)?;
        self.send(request).await
    }

    /// Sends `spec` without an `Authorization` header.
    pub async fn perform_unsigned(&self, spec: &RequestSpec) -> Result<Response> {
        let request = self.builder.unsigned_request(spec)?;
        self.send(request).await
    }

    /// Sends `spec` signed with `token`.
    pub async fn perform_signed(
        &self,
        spec: &RequestSpec,
        token: Option<&TokenCredentials>,
    ) -> Result<Response> {
        let request = self.builder.signed_request(spec, token)?;
        self.send(request).await
    }

    /// Sends an already built request.
    pub async fn send(&self, request: OutgoingRequest) -> Result<Response> {
        Ok(self.transport.send(request).await?)
    }
}
