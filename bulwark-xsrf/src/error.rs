use http::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum XsrfError {
    #[error("XSRF session cookie missing")]
    MissingCookie,

    #[error("Invalid XSRF token")]
    InvalidToken,

    #[error("Missing XSRF token")]
    MissingToken,

    #[error("XSRF header missing or does not match cookie")]
    HeaderMismatch,

    #[error("Malformed request body: {0}")]
    MalformedBody(String),

    #[error("Random source failure: {0}")]
    RandomSource(#[from] rand::Error),

    #[error("Token codec error: {0}")]
    Codec(String),

    #[error("Generated data mismatch: injector expects {expected}, got {found}")]
    DataMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("Cookie write failed: {0}")]
    Cookie(#[from] bulwark_core::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl XsrfError {
    /// HTTP status written when this error rejects a request
    pub fn status_code(&self) -> StatusCode {
        match self {
            XsrfError::MissingCookie | XsrfError::InvalidToken => StatusCode::FORBIDDEN,
            XsrfError::MissingToken | XsrfError::HeaderMismatch => StatusCode::UNAUTHORIZED,
            XsrfError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            XsrfError::RandomSource(_)
            | XsrfError::Codec(_)
            | XsrfError::DataMismatch { .. }
            | XsrfError::Cookie(_)
            | XsrfError::InvalidConfig(_)
            | XsrfError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type Result<T> = std::result::Result<T, XsrfError>;
