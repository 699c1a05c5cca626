// Crate-wide error type

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("OAuth error: {0}")]
    OAuth(String),

    #[error("Not authorized - run `drivetunes login` first")]
    NotAuthorized,

    #[error("Keychain error: {0}")]
    Keychain(#[from] keyring::Error),

    #[error("Store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("Tag error: {0}")]
    Tag(#[from] lofty::error::LoftyError),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Song not found: {0}")]
    SongNotFound(String),

    #[error("Tag worker disconnected")]
    WorkerDisconnected,
}

pub type Result<T> = std::result::Result<T, Error>;
