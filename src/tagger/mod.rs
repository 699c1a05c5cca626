// Tagging module: the out-of-line worker that reads tags from Drive files

pub mod cache;
pub mod messages;
pub mod reader;
pub mod stream;
pub mod worker;

pub use messages::{Job, TagMessage, Tags, WorkerReply, WorkerRequest};
pub use reader::{read_mpeg_tags, DriveTagger, Tagger};
pub use stream::DriveStream;
pub use worker::TagWorker;
