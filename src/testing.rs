// Shared fakes for unit tests

use futures_util::future::{BoxFuture, FutureExt};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::drive::{DriveFile, FilePage, FileSource};
use crate::error::{Error, Result};

/// In-memory stand-in for the Drive API. Page `n` is requested with token `p{n}`.
pub struct FakeSource {
    pages: Vec<FilePage>,
    files: HashMap<String, DriveFile>,
    fail_on_page: Option<usize>,
    pub requested: Mutex<Vec<Option<String>>>,
}

impl FakeSource {
    pub fn new(pages: Vec<Vec<DriveFile>>) -> Self {
        let count = pages.len();
        let pages: Vec<FilePage> = pages
            .into_iter()
            .enumerate()
            .map(|(i, items)| FilePage {
                items,
                next_page_token: (i + 1 < count).then(|| format!("p{}", i + 1)),
            })
            .collect();
        let files = pages
            .iter()
            .flat_map(|p| p.items.iter())
            .map(|f| (f.id.clone(), f.clone()))
            .collect();
        Self {
            pages,
            files,
            fail_on_page: None,
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_on_page(mut self, page: usize) -> Self {
        self.fail_on_page = Some(page);
        self
    }

    fn page_index(token: Option<&str>) -> usize {
        token
            .and_then(|t| t.strip_prefix('p'))
            .and_then(|n| n.parse().ok())
            .unwrap_or(0)
    }
}

impl FileSource for FakeSource {
    fn list_files(&self, page_token: Option<String>) -> BoxFuture<'_, Result<FilePage>> {
        self.requested.lock().unwrap().push(page_token.clone());
        let index = Self::page_index(page_token.as_deref());
        let result = if self.fail_on_page == Some(index) {
            Err(Error::Api {
                status: 500,
                body: "backend error".to_string(),
            })
        } else {
            Ok(self.pages.get(index).cloned().unwrap_or_default())
        };
        async move { result }.boxed()
    }

    fn get_file(&self, file_id: String) -> BoxFuture<'_, Result<DriveFile>> {
        let result = self.files.get(&file_id).cloned().ok_or(Error::Api {
            status: 404,
            body: format!("File not found: {}", file_id),
        });
        async move { result }.boxed()
    }

    fn access_token(&self) -> &str {
        "fake-token"
    }
}

pub fn drive_file(id: &str, filename: &str) -> DriveFile {
    DriveFile {
        id: id.to_string(),
        title: filename.to_string(),
        mime_type: "audio/mpeg".to_string(),
        download_url: Some(format!("https://drive.example/download/{}?e=download", id)),
        file_size: 4096,
        original_filename: Some(filename.to_string()),
    }
}
