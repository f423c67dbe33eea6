use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("malformed session title: {0:?}")]
    MalformedTitle(String),

    #[error("unrecognized theater: {0:?}")]
    UnknownTheater(String),

    #[error("unparseable draw ratio: {0:?}")]
    BadRatio(String),

    #[error("seat availability response is missing seat type {0}")]
    MissingSeatType(u8),

    #[error("unparseable index date: {0:?}")]
    BadIndexDate(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;
