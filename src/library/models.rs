// Persisted song records

use serde::{Deserialize, Serialize};

/// A tagged song, keyed by its Drive file id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub url: String,
    pub filename: String,
}
