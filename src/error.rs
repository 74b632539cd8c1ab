use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to fetch rows: {0}")]
    Fetch(String),

    #[error("Failed to upload image: {0}")]
    Upload(String),

    #[error("{0}")]
    Persistence(String),
}

pub type Result<T> = std::result::Result<T, AppError>;
