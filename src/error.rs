use http::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
pub type TokenReaderResult<T> = std::result::Result<T, TokenReaderError>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error : {0}")]
    Configuration(#[from] ConfigError),
    #[error("request failed : {0}")]
    Transport(#[from] TransportError),
    #[error("token acquisition failed : {0}")]
    TokenReader(#[from] TokenReaderError),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(TransportError::Reqwest(err))
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("consumer key and consumer secret are required to sign a request.")]
    MissingConsumerCredentials,
    #[error("invalid url {0} : {1}")]
    InvalidUrl(String, url::ParseError),
    #[error("parameters could not be serialized : {0}")]
    InvalidParameters(String),
    #[error("authorization header could not be encoded : {0}")]
    InvalidHeader(String),
    #[error("environment variable {0} is not set.")]
    MissingEnv(&'static str),
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("{0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("server responded with {status} : {body}")]
    Status { status: StatusCode, body: String },
}

impl TransportError {
    /// The HTTP status, when the server answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            TransportError::Reqwest(err) => err.status(),
            TransportError::Status { status, .. } => Some(*status),
        }
    }
}

#[derive(Error, Debug, Clone)]
pub enum TokenReaderError {
    #[error("response has malformed format: not found {0} in {1}")]
    TokenKeyNotFound(&'static str, String),
    #[error("response body is not valid utf-8 : {0}")]
    InvalidEncoding(#[from] std::string::FromUtf8Error),
}
