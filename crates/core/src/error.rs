use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdlensError {
    #[error("Serialization error: {0}")]
    Serialize(String),
}

impl From<serde_json::Error> for AdlensError {
    fn from(e: serde_json::Error) -> Self {
        AdlensError::Serialize(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AdlensError>;
