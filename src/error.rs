use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdvisorError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Request failed: {0}")]
    Request(String),

    #[cfg(feature = "gemini")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("File read error: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AdvisorError {
    /// Missing or unusable credentials. Nothing short of fixing the setup helps.
    pub fn is_configuration(&self) -> bool {
        matches!(self, AdvisorError::Configuration(_))
    }

    pub fn is_recoverable(&self) -> bool {
        !self.is_configuration()
    }
}

pub type Result<T> = std::result::Result<T, AdvisorError>;
