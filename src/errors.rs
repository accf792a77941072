use thiserror::Error;

#[derive(Error, Debug)]
pub enum StyleRagError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("Embedding error: {0}")]
    EmbeddingError(String),

    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("Vision error: {0}")]
    VisionError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Malformed pipeline output: {0}")]
    ParseError(String),

    #[error("{0}")]
    Custom(String),
}

pub type Result<T> = std::result::Result<T, StyleRagError>;
