// Indexing controller: listing -> job queue -> tag worker -> song library

use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::queue::{JobQueue, QueueStatus};
use crate::drive::{DriveFile, FilePage, FileSource};
use crate::error::{Error, Result};
use crate::library::{Song, SongStore};
use crate::tagger::{Job, TagMessage, TagWorker, WorkerReply};

/// Counters reported at the end of a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexSummary {
    pub pages: usize,
    pub listed: usize,
    pub queued: usize,
    pub tagged: usize,
    pub already_indexed: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Only MPEG audio is handed to the tagger
pub fn is_mp3(filename: &str) -> bool {
    filename.to_ascii_lowercase().ends_with(".mp3")
}

pub struct Indexer<S: FileSource> {
    source: Arc<S>,
    store: SongStore,
    queue: JobQueue,
    worker: TagWorker,
    summary: IndexSummary,
}

impl<S: FileSource> Indexer<S> {
    pub fn new(source: Arc<S>, store: SongStore, worker: TagWorker) -> Self {
        Self {
            source,
            store,
            queue: JobQueue::new(),
            worker,
            summary: IndexSummary::default(),
        }
    }

    pub fn store(&self) -> &SongStore {
        &self.store
    }

    pub fn queue_status(&self) -> QueueStatus {
        self.queue.status()
    }

    pub fn summary(&self) -> &IndexSummary {
        &self.summary
    }

    /// Turn a listed file into a job and queue it
    pub fn index(&mut self, item: &DriveFile) {
        self.summary.listed += 1;

        let Some(download_url) = &item.download_url else {
            debug!("No download URL, skipping: {} ({})", item.id, item.filename());
            self.summary.skipped += 1;
            return;
        };

        self.queue_job(Job {
            id: item.id.clone(),
            url: download_url.clone(),
            length: item.file_size,
            filename: item.filename().to_string(),
        });
    }

    pub fn queue_job(&mut self, job: Job) {
        self.summary.queued += 1;
        self.queue.queue_job(job);
    }

    /// Send the next job that still needs tagging, unless one is in flight
    pub fn pop_job(&mut self) -> Result<()> {
        while let Some(job) = self.queue.take_next() {
            if self.store.contains(&job.id)? {
                info!("Already indexed: {}", job.id);
                self.summary.already_indexed += 1;
                continue;
            }

            if !is_mp3(&job.filename) {
                info!("Skipping non-mp3: {}", job.filename);
                self.summary.skipped += 1;
                continue;
            }

            if self.queue.is_pending() {
                self.queue.requeue_front(job);
                return Ok(());
            }

            return self.send_job(job);
        }
        Ok(())
    }

    fn send_job(&mut self, job: Job) -> Result<()> {
        info!("Tag job starting: {} ({})", job.filename, job.id);
        self.queue.set_pending(true);
        if let Err(e) = self.worker.post_message(job) {
            self.queue.set_pending(false);
            return Err(e);
        }
        Ok(())
    }

    /// React to a worker reply; any finished job frees the worker for the next
    pub fn handle_message(&mut self, reply: WorkerReply) -> Result<()> {
        match reply {
            WorkerReply::Log(message) => {
                debug!("Worker: {}", message);
                return Ok(());
            }
            WorkerReply::Tagged(tag) => {
                self.queue.set_pending(false);
                info!("Tagged: {}", tag.id);
                if !tag.id.is_empty() {
                    self.add_song(tag)?;
                }
            }
            WorkerReply::Failed { id, filename, error } => {
                self.queue.set_pending(false);
                warn!("Tagging failed for {} ({}): {}", filename, id, error);
                self.summary.failed += 1;
            }
        }
        self.pop_job()
    }

    fn add_song(&mut self, tag: TagMessage) -> Result<()> {
        let title = if tag.title.trim().is_empty() {
            tag.filename.clone()
        } else {
            tag.title
        };

        self.store.put(&Song {
            id: tag.id,
            title,
            artist: tag.artist,
            album: tag.album,
            url: tag.url,
            filename: tag.filename,
        })?;
        self.summary.tagged += 1;
        Ok(())
    }

    /// Queue every item of a listed page, start the worker if idle, and
    /// return the token of the page to fetch next
    pub fn fetch_items(&mut self, page: FilePage) -> Result<Option<String>> {
        self.summary.pages += 1;
        for item in &page.items {
            self.index(item);
        }
        self.pop_job()?;
        Ok(page.next_page_token)
    }

    /// Walk every page of the listing and tag everything new, one job at a time
    pub async fn run(mut self) -> Result<IndexSummary> {
        let source = Arc::clone(&self.source);
        let mut next_page: Option<BoxFuture<'_, Result<FilePage>>> = Some(source.list_files(None));

        loop {
            if next_page.is_none() && self.queue.is_idle() {
                break;
            }

            tokio::select! {
                Some(page) = async {
                    match next_page.as_mut() {
                        Some(fetch) => Some(fetch.await),
                        None => None,
                    }
                }, if next_page.is_some() => {
                    let next_token = self.fetch_items(page?)?;
                    next_page = next_token.map(|token| source.list_files(Some(token)));
                }
                reply = self.worker.recv() => match reply {
                    Some(reply) => self.handle_message(reply)?,
                    None => return Err(Error::WorkerDisconnected),
                },
            }
        }

        let Indexer { worker, summary, .. } = self;
        worker.shutdown();

        info!(
            "Indexing complete: {} listed, {} tagged, {} already indexed, {} skipped, {} failed",
            summary.listed, summary.tagged, summary.already_indexed, summary.skipped, summary.failed
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tagger::worker::tests::FilenameTagger;
    use crate::testing::{drive_file, FakeSource};

    fn indexer(source: FakeSource) -> Indexer<FakeSource> {
        let worker = TagWorker::spawn(|| Ok(FilenameTagger)).unwrap();
        Indexer::new(Arc::new(source), SongStore::open_in_memory().unwrap(), worker)
    }

    async fn finish_current_job(indexer: &mut Indexer<FakeSource>) {
        loop {
            let reply = indexer.worker.recv().await.unwrap();
            let done = !matches!(reply, WorkerReply::Log(_));
            indexer.handle_message(reply).unwrap();
            if done {
                return;
            }
        }
    }

    #[test]
    fn test_is_mp3() {
        assert!(is_mp3("song.mp3"));
        assert!(is_mp3("SONG.MP3"));
        assert!(!is_mp3("song.flac"));
        assert!(!is_mp3("mp3"));
        assert!(!is_mp3("song.mp3.part"));
    }

    #[tokio::test]
    async fn test_index_skips_files_without_download_url() {
        let mut indexer = indexer(FakeSource::new(vec![]));
        let mut doc = drive_file("doc", "Notes");
        doc.download_url = None;

        indexer.index(&doc);
        indexer.index(&drive_file("a", "a.mp3"));

        assert_eq!(indexer.summary().listed, 2);
        assert_eq!(indexer.summary().skipped, 1);
        assert_eq!(indexer.queue_status().queued_count, 1);
    }

    #[tokio::test]
    async fn test_only_one_job_in_flight() {
        let mut indexer = indexer(FakeSource::new(vec![]));
        indexer.index(&drive_file("a", "a.mp3"));
        indexer.index(&drive_file("b", "b.mp3"));

        indexer.pop_job().unwrap();
        assert_eq!(
            indexer.queue_status(),
            QueueStatus {
                queued_count: 1,
                job_pending: true
            }
        );

        // A second pop while busy puts the job back
        indexer.pop_job().unwrap();
        assert_eq!(indexer.queue_status().queued_count, 1);

        finish_current_job(&mut indexer).await;
        assert!(indexer.store().contains("a").unwrap());
        assert_eq!(
            indexer.queue_status(),
            QueueStatus {
                queued_count: 0,
                job_pending: true
            }
        );

        finish_current_job(&mut indexer).await;
        assert!(indexer.store().contains("b").unwrap());
        assert!(indexer.queue.is_idle());
    }

    #[tokio::test]
    async fn test_log_reply_keeps_job_pending() {
        let mut indexer = indexer(FakeSource::new(vec![]));
        indexer.index(&drive_file("a", "a.mp3"));
        indexer.pop_job().unwrap();

        indexer
            .handle_message(WorkerReply::Log("still working".to_string()))
            .unwrap();
        assert!(indexer.queue.is_pending());
    }

    #[tokio::test]
    async fn test_tagged_reply_without_id_is_not_stored() {
        let mut indexer = indexer(FakeSource::new(vec![]));
        indexer.index(&drive_file("a", "a.mp3"));
        indexer.index(&drive_file("b", "b.mp3"));
        indexer.pop_job().unwrap();

        indexer
            .handle_message(WorkerReply::Tagged(TagMessage {
                id: String::new(),
                filename: "a.mp3".into(),
                url: "https://drive.example/download/a?e=download".into(),
                title: "A".into(),
                artist: "Artist".into(),
                album: "Album".into(),
            }))
            .unwrap();

        assert_eq!(indexer.store().count().unwrap(), 0);
        assert_eq!(indexer.summary().tagged, 0);
        assert_eq!(
            indexer.queue_status(),
            QueueStatus {
                queued_count: 0,
                job_pending: true
            }
        );
    }

    #[tokio::test]
    async fn test_already_indexed_and_non_mp3_are_skipped() {
        let mut indexer = indexer(FakeSource::new(vec![]));
        indexer
            .store()
            .put(&Song {
                id: "known".into(),
                title: "Known".into(),
                artist: String::new(),
                album: String::new(),
                url: String::new(),
                filename: "known.mp3".into(),
            })
            .unwrap();

        indexer.index(&drive_file("known", "known.mp3"));
        indexer.index(&drive_file("cover", "cover.jpg"));
        indexer.pop_job().unwrap();

        assert_eq!(indexer.summary().already_indexed, 1);
        assert_eq!(indexer.summary().skipped, 1);
        assert!(indexer.queue.is_idle());
    }

    #[tokio::test]
    async fn test_empty_title_defaults_to_filename() {
        let mut indexer = indexer(FakeSource::new(vec![]));
        indexer.index(&drive_file("u", "untitled track.mp3"));
        indexer.pop_job().unwrap();
        finish_current_job(&mut indexer).await;

        let song = indexer.store().get("u").unwrap().unwrap();
        assert_eq!(song.title, "untitled track.mp3");
        assert_eq!(song.artist, "Artist");
        assert_eq!(song.url, "https://drive.example/download/u?e=download");
    }

    #[tokio::test]
    async fn test_run_walks_all_pages() {
        let source = FakeSource::new(vec![
            vec![drive_file("a", "a.mp3"), drive_file("b", "b.MP3"), drive_file("c", "c.m4a")],
            vec![drive_file("d", "bad.mp3"), drive_file("e", "e.mp3")],
        ]);
        let indexer = indexer(source);

        let summary = indexer.run().await.unwrap();
        assert_eq!(
            summary,
            IndexSummary {
                pages: 2,
                listed: 5,
                queued: 5,
                tagged: 3,
                already_indexed: 0,
                skipped: 1,
                failed: 1,
            }
        );
    }

    #[tokio::test]
    async fn test_run_persists_songs_and_is_incremental() {
        let source = Arc::new(FakeSource::new(vec![vec![
            drive_file("a", "a.mp3"),
            drive_file("b", "b.mp3"),
        ]]));
        let path = std::env::temp_dir()
            .join(format!("drivetunes-indexer-{}", std::process::id()))
            .join("songs.db");

        let first = Indexer::new(
            Arc::clone(&source),
            SongStore::open(&path).unwrap(),
            TagWorker::spawn(|| Ok(FilenameTagger)).unwrap(),
        );
        assert_eq!(first.run().await.unwrap().tagged, 2);

        let second = Indexer::new(
            Arc::clone(&source),
            SongStore::open(&path).unwrap(),
            TagWorker::spawn(|| Ok(FilenameTagger)).unwrap(),
        );
        let summary = second.run().await.unwrap();
        assert_eq!(summary.tagged, 0);
        assert_eq!(summary.already_indexed, 2);

        assert_eq!(SongStore::open(&path).unwrap().count().unwrap(), 2);
        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[tokio::test]
    async fn test_run_with_empty_listing() {
        let summary = indexer(FakeSource::new(vec![vec![]])).run().await.unwrap();
        assert_eq!(summary.pages, 1);
        assert_eq!(summary.listed, 0);
    }

    #[tokio::test]
    async fn test_listing_error_stops_the_run() {
        let source = FakeSource::new(vec![vec![drive_file("a", "a.mp3")], vec![]]).failing_on_page(1);
        match indexer(source).run().await {
            Err(Error::Api { status, .. }) => assert_eq!(status, 500),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
