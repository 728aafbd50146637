use thiserror::Error;

#[derive(Error, Debug)]
pub enum KbChatError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl KbChatError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation(message.into())
    }

    /// True for failures that must stop the process before any turn is served.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

pub type Result<T> = std::result::Result<T, KbChatError>;
