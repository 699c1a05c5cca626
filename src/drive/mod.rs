// Remote file API: Google Drive listing and lookups

pub mod client;
pub mod models;

pub use client::{DriveClient, FileSource, DRIVE_API_BASE_URL};
pub use models::{DriveFile, FilePage};
