// Random-access reader over a remote file, backed by HTTP range requests

use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, RANGE};
use reqwest::StatusCode;
use std::io::{self, Read, Seek, SeekFrom};
use tracing::debug;

use super::cache::SparseCache;

/// ID3v2 tags and the first MPEG frames live at the start of the file
pub const PREFIX_CACHE_BYTES: u64 = 64 * 1024;
/// ID3v1 and APE tags live at the end
pub const SUFFIX_CACHE_BYTES: u64 = 8 * 1024;
/// Small reads are widened to this much to avoid one request per header
const MIN_FETCH_BYTES: u64 = 16 * 1024;

pub struct DriveStream {
    client: Client,
    url: String,
    access_token: Option<String>,
    length: u64,
    cursor: u64,
    cache: SparseCache,
    requests: usize,
}

impl DriveStream {
    pub fn new(client: Client, url: impl Into<String>, length: u64) -> Self {
        Self {
            client,
            url: url.into(),
            access_token: None,
            length,
            cursor: 0,
            cache: SparseCache::new(),
            requests: 0,
        }
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn length(&self) -> u64 {
        self.length
    }

    pub fn tell(&self) -> u64 {
        self.cursor
    }

    /// Number of HTTP requests issued so far
    pub fn requests(&self) -> usize {
        self.requests
    }

    /// Rewind to the start of the file
    pub fn clear(&mut self) {
        self.cursor = 0;
    }

    /// Fetch the regions tag parsers look at first, then rewind
    pub fn precache(&mut self) -> io::Result<()> {
        self.clear();
        self.read_block(PREFIX_CACHE_BYTES)?;
        // Files shorter than the suffix window start it at zero
        let suffix_start = self.length.saturating_sub(SUFFIX_CACHE_BYTES);
        self.seek(SeekFrom::Start(suffix_start))?;
        self.read_block(SUFFIX_CACHE_BYTES)?;
        self.clear();
        Ok(())
    }

    /// Read up to `len` bytes at the cursor and advance past them
    pub fn read_block(&mut self, len: u64) -> io::Result<Vec<u8>> {
        let start = self.cursor;
        if len == 0 || start >= self.length {
            return Ok(Vec::new());
        }
        let len = len.min(self.length - start);

        if let Some(cached) = self.cache.get(start, len) {
            let bytes = cached.to_vec();
            self.cursor += bytes.len() as u64;
            return Ok(bytes);
        }

        let fetch_len = len.max(MIN_FETCH_BYTES).min(self.length - start);
        self.fetch(start, start + fetch_len - 1)?;

        let bytes = self
            .cache
            .get(start, len)
            .map(<[u8]>::to_vec)
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("short range response for bytes {}-{}", start, start + len - 1),
                )
            })?;
        self.cursor += bytes.len() as u64;
        Ok(bytes)
    }

    /// Issue `Range: bytes=start-end` and cache whatever comes back
    fn fetch(&mut self, start: u64, end: u64) -> io::Result<()> {
        let range = format!("bytes={}-{}", start, end);
        debug!("GET {} ({})", self.url, range);

        let mut request = self.client.get(&self.url).header(RANGE, &range);
        if let Some(token) = &self.access_token {
            request = request.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        self.requests += 1;

        let response = request.send().map_err(io::Error::other)?;
        let status = response.status();
        if !status.is_success() {
            return Err(io::Error::other(format!("range request failed with status {}", status)));
        }

        let body = response.bytes().map_err(io::Error::other)?;
        debug!("Read: {}/{}", body.len(), self.length);

        // A plain 200 means the server ignored the range and sent the whole file
        let body_start = if status == StatusCode::PARTIAL_CONTENT { start } else { 0 };
        self.cache.insert(body_start, &body);
        debug!("Cached: {}/{}", self.cache.cached_bytes(), self.length);
        Ok(())
    }
}

impl Read for DriveStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let bytes = self.read_block(buf.len() as u64)?;
        buf[..bytes.len()].copy_from_slice(&bytes);
        Ok(bytes.len())
    }
}

impl Seek for DriveStream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::Current(delta) => self.cursor.checked_add_signed(delta),
            // Offsets from the end count backwards whatever their sign
            SeekFrom::End(delta) => self.length.checked_sub(delta.unsigned_abs()),
        };

        match target {
            Some(position) => {
                self.cursor = position;
                Ok(position)
            }
            None => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek to a negative position",
            )),
        }
    }
}
