/*!
oauth1-flow: OAuth 1.0a handshake and request signing on top of reqwest.

# Overview

This library signs HTTP requests with OAuth 1.0a HMAC-SHA1 signatures and
drives the three-legged handshake (request token, user authorization, access
token) against providers such as Twitter.

Requests are described by a [`RequestSpec`], turned into an
[`OutgoingRequest`] by a [`RequestBuilder`] and sent through a [`Transport`]
(a `reqwest::Client` by default). Tokens are never stored on disk; keeping
them is up to the caller.

# How to use

## Basic usecase 1 - sending the tweet

```rust,ignore
use oauth1_flow::{Client, Config, Credentials, TokenCredentials};

// prepare authorization info
let config = Config::new(Credentials::new("[CONSUMER_KEY]", "[CONSUMER_SECRET]"));
let token = TokenCredentials::new("[ACCESS_TOKEN]", "[TOKEN_SECRET]");

// sample: send new tweet to twitter
let client = Client::new(config);
let spec = client
    .post("https://api.twitter.com/1.1/statuses/update.json")?
    .parameter("status", "Hello, Twitter!")
    .token(token);
let resp = client.perform(&spec).await?.error_for_status()?;
```

## Basic usecase 2 - Acquiring OAuth token & secret

```rust,ignore
use std::io;
use oauth1_flow::{Authenticator, Credentials, Provider, TokenResponse};

let auth = Authenticator::new(
    Credentials::new("[CONSUMER_KEY]", "[CONSUMER_SECRET]"),
    Provider::twitter(),
);

// step 1: acquire request token & token secret
let query = auth.fetch_token("oob").await?;
let request_token = TokenResponse::from_query(&query)?;

// step 2. acquire user pin
println!("please access to: {}", auth.authentication_url(&request_token.oauth_token)?);
println!("input pin: ");
let mut user_input = String::new();
io::stdin().read_line(&mut user_input)?;
let pin = user_input.trim();

// step 3. acquire access token
let resp = auth.authenticate_token(&request_token.oauth_token, pin).await?;
println!(
    "your token and secret is: \n token: {}\n secret: {}",
    resp.oauth_token, resp.oauth_token_secret
);
println!("other attributes: {:#?}", resp.remain)
```
*/
mod authenticator;
mod client;
mod config;
mod error;
mod method;
mod parameters;
mod request;
mod secrets;
mod signer;
mod token_reader;
mod transport;

// exposed to external program
pub use authenticator::{Authenticator, FlowState};
pub use client::{Client, OAuthClientProvider};
pub use config::{Config, Provider, CONSUMER_KEY_ENV, CONSUMER_SECRET_ENV};
pub use error::{
    ConfigError, ConfigResult, Error, Result, TokenReaderError, TokenReaderResult, TransportError,
};
pub use method::RequestMethod;
pub use parameters::{percent_encode, serialize_pairs, ParameterSet};
pub use request::{OutgoingRequest, RequestBuilder, RequestSpec, Signing};
pub use secrets::{Credentials, TokenCredentials};
pub use signer::{base_string, signing_key, Authorization, OAuthParameters, Signer};
pub use token_reader::{TokenReader, TokenReaderFuture, TokenResponse};
pub use transport::{Response, Transport};

// exposed constant variables
/// Represents `oauth_callback`.
pub const OAUTH_CALLBACK_KEY: &str = "oauth_callback";
/// Represents `oauth_consumer_key`.
pub const OAUTH_CONSUMER_KEY: &str = "oauth_consumer_key";
/// Represents `oauth_nonce`.
pub const OAUTH_NONCE_KEY: &str = "oauth_nonce";
/// Represents `oauth_signature`.
pub const OAUTH_SIGNATURE_KEY: &str = "oauth_signature";
/// Represents `oauth_signature_method`.
pub const OAUTH_SIGNATURE_METHOD_KEY: &str = "oauth_signature_method";
/// Represents `oauth_timestamp`.
pub const OAUTH_TIMESTAMP_KEY: &str = "oauth_timestamp";
/// Represents `oauth_token`.
pub const OAUTH_TOKEN_KEY: &str = "oauth_token";
/// Represents `oauth_verifier`.
pub const OAUTH_VERIFIER_KEY: &str = "oauth_verifier";
/// Represents `oauth_version`.
pub const OAUTH_VERSION_KEY: &str = "oauth_version";
/// Represents `realm`.
pub const REALM_KEY: &str = "realm";

// crate-private constant variables
pub(crate) const OAUTH_KEY_PREFIX: &str = "oauth_";
