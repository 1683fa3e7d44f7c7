use thiserror::Error;

#[derive(Debug, Error)]
pub enum EtsError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("XML parsing error: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Endpoint not found: {0}")]
    MissingEndpoint(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Unexpected content: {0}")]
    UnexpectedContent(String),
}

pub type EtsResult<T> = Result<T, EtsError>;
