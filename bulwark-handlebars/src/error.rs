//! Error types for Handlebars rendering

use http::StatusCode;
use thiserror::Error;

/// Result type for Handlebars operations
pub type Result<T> = std::result::Result<T, HandlebarsError>;

#[derive(Error, Debug)]
pub enum HandlebarsError {
    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("Template rendering error: {0}")]
    RenderError(String),

    #[error("Template parsing error: {0}")]
    ParseError(String),

    /// IO error when loading templates
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl HandlebarsError {
    /// Rendering failures are always the server's fault
    pub fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl From<handlebars::RenderError> for HandlebarsError {
    fn from(err: handlebars::RenderError) -> Self {
        HandlebarsError::RenderError(err.to_string())
    }
}

impl From<handlebars::TemplateError> for HandlebarsError {
    fn from(err: handlebars::TemplateError) -> Self {
        HandlebarsError::ParseError(err.to_string())
    }
}

impl From<HandlebarsError> for bulwark_core::Error {
    fn from(err: HandlebarsError) -> Self {
        bulwark_core::Error::Template(err.to_string())
    }
}
