// Indexing orchestration module

pub mod controller;
pub mod queue;

pub use crate::tagger::Job;
pub use controller::{is_mp3, IndexSummary, Indexer};
pub use queue::{JobQueue, QueueStatus};
