//! Errors raised by the playback layer

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("engine has been released")]
    Released,

    #[error("playlist index {index} out of range (playlist has {len} items)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),

    #[error("cache error: {0}")]
    Cache(#[from] std::io::Error),

    #[error("upstream fetch failed: {0}")]
    Upstream(String),

    #[error("upstream returned HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },
}

impl From<reqwest::Error> for PlayerError {
    fn from(e: reqwest::Error) -> Self {
        PlayerError::Upstream(e.to_string())
    }
}

pub type PlayerResult<T> = Result<T, PlayerError>;
