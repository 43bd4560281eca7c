use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),
    #[error("ocr engine error: {0}")]
    Ocr(String),
    #[error("recognition failed for {screenshot} screenshot: {message}")]
    Recognition {
        screenshot: &'static str,
        message: String,
    },
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn ocr(message: impl Into<String>) -> Self {
        Self::Ocr(message.into())
    }

    pub fn recognition(screenshot: &'static str, message: impl Into<String>) -> Self {
        Self::Recognition {
            screenshot,
            message: message.into(),
        }
    }
}
