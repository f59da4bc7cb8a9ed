use thiserror::Error;

#[derive(Error, Debug)]
pub enum BylineError {
    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("post not found: {0}")]
    NotFound(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BylineError>;
