use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Site structure changed, bootstrap payload not found: {0}")]
    MarkupNotFound(String),

    #[error("Bootstrap payload is not valid JSON: {0}")]
    MalformedPayload(String),

    #[error("Unexpected payload schema: {0}")]
    SchemaError(String),

    #[error("Parsing error: {0}")]
    ParseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}
