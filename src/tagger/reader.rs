// Tag reading for queued jobs

use lofty::config::ParseOptions;
use lofty::file::FileType;
use lofty::prelude::*;
use lofty::probe::Probe;
use std::io::{Read, Seek};
use std::time::Duration;

use super::messages::{Job, Tags};
use super::stream::DriveStream;
use crate::error::Result;

/// Anything that can turn a job into tags. Runs on the worker thread.
pub trait Tagger: Send + 'static {
    fn tag(&mut self, job: &Job) -> Result<Tags>;
}

/// Read title, artist and album from an MPEG stream
pub fn read_mpeg_tags<R: Read + Seek>(reader: R) -> Result<Tags> {
    let tagged_file = Probe::with_file_type(reader, FileType::Mpeg)
        .options(ParseOptions::new().read_properties(false))
        .read()?;

    let Some(tag) = tagged_file.primary_tag().or_else(|| tagged_file.first_tag()) else {
        return Ok(Tags::default());
    };

    Ok(Tags {
        title: tag.title().map(|s| s.to_string()).unwrap_or_default(),
        artist: tag.artist().map(|s| s.to_string()).unwrap_or_default(),
        album: tag.album().map(|s| s.to_string()).unwrap_or_default(),
    })
}

/// Tags Drive files over HTTP range requests
pub struct DriveTagger {
    client: reqwest::blocking::Client,
    access_token: String,
}

impl DriveTagger {
    /// Must be called off the async runtime: the blocking client owns its own
    pub fn new(access_token: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: reqwest::blocking::Client::builder()
                .timeout(Duration::from_secs(60))
                .build()?,
            access_token: access_token.into(),
        })
    }
}

impl Tagger for DriveTagger {
    fn tag(&mut self, job: &Job) -> Result<Tags> {
        let mut stream = DriveStream::new(self.client.clone(), &job.url, job.length)
            .with_access_token(&self.access_token);
        stream.precache()?;
        read_mpeg_tags(stream)
    }
}
