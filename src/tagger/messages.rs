// Messages exchanged between the indexer and the tag worker

use serde::{Deserialize, Serialize};

/// A single file queued for tagging
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub url: String,
    pub length: u64,
    pub filename: String,
}

/// Tags read from a file; absent frames are empty strings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tags {
    pub title: String,
    pub artist: String,
    pub album: String,
}

/// Result of tagging one job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagMessage {
    pub id: String,
    pub filename: String,
    pub url: String,
    pub title: String,
    pub artist: String,
    pub album: String,
}

impl TagMessage {
    pub fn from_job(job: &Job, tags: Tags) -> Self {
        Self {
            id: job.id.clone(),
            filename: job.filename.clone(),
            url: job.url.clone(),
            title: tags.title,
            artist: tags.artist,
            album: tags.album,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorkerRequest {
    Tag(Job),
    Shutdown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorkerReply {
    /// Diagnostics only; does not finish the job in flight
    Log(String),
    Tagged(TagMessage),
    Failed {
        id: String,
        filename: String,
        error: String,
    },
}
