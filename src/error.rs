
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EavError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Type error: {0}")]
    Type(String),
    #[error("Schema consistency error: {0}")]
    SchemaConsistency(String),
    #[error("Driver error: {0}")]
    Driver(String),
    #[error("Builder usage error: {0}")]
    BuilderUsage(String),
    #[error("Data corruption: {message}")]
    DataCorruption { message: String },
}

pub type Result<T> = std::result::Result<T, EavError>;

// Helper conversions
impl From<rusqlite::Error> for EavError {
    fn from(e: rusqlite::Error) -> Self { Self::Driver(e.to_string()) }
}
impl From<config::ConfigError> for EavError {
    fn from(e: config::ConfigError) -> Self { Self::Config(e.to_string()) }
}
