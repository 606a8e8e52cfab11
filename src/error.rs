use thiserror::Error;

#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error("Failed to load '{path}': {message}")]
    Load { path: String, message: String },

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Referential integrity violated: {0}")]
    Integrity(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),
}

impl NormalizeError {
    pub fn load(path: impl Into<String>, message: impl Into<String>) -> Self {
        NormalizeError::Load {
            path: path.into(),
            message: message.into(),
        }
    }

    /// True for errors caused by the shape of the input rather than the environment.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            NormalizeError::Load { .. } | NormalizeError::Schema(_) | NormalizeError::Integrity(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, NormalizeError>;
