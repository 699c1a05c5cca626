// Tag worker thread, reached only through message passing

use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info};

use super::messages::{Job, TagMessage, WorkerReply, WorkerRequest};
use super::reader::Tagger;
use crate::error::{Error, Result};

pub struct TagWorker {
    requests: mpsc::Sender<WorkerRequest>,
    replies: UnboundedReceiver<WorkerReply>,
    handle: Option<JoinHandle<()>>,
}

impl TagWorker {
    /// Start the worker. `make_tagger` runs on the worker thread, so blocking
    /// clients can be built there safely.
    pub fn spawn<T, F>(make_tagger: F) -> Result<Self>
    where
        T: Tagger,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let (request_tx, request_rx) = mpsc::channel();
        let (reply_tx, reply_rx) = unbounded_channel();

        let handle = thread::Builder::new()
            .name("tag-worker".to_string())
            .spawn(move || run_worker(make_tagger, request_rx, reply_tx))?;

        Ok(Self {
            requests: request_tx,
            replies: reply_rx,
            handle: Some(handle),
        })
    }

    /// Hand a job to the worker; the reply arrives through `recv`
    pub fn post_message(&self, job: Job) -> Result<()> {
        self.requests
            .send(WorkerRequest::Tag(job))
            .map_err(|_| Error::WorkerDisconnected)
    }

    /// Next reply, or None once the worker has exited
    pub async fn recv(&mut self) -> Option<WorkerReply> {
        self.replies.recv().await
    }

    /// Stop the worker after its current job and wait for it
    pub fn shutdown(mut self) {
        self.requests.send(WorkerRequest::Shutdown).ok();
        if let Some(handle) = self.handle.take() {
            handle.join().ok();
        }
    }
}

impl Drop for TagWorker {
    fn drop(&mut self) {
        self.requests.send(WorkerRequest::Shutdown).ok();
    }
}

fn run_worker<T, F>(
    make_tagger: F,
    requests: mpsc::Receiver<WorkerRequest>,
    replies: UnboundedSender<WorkerReply>,
) where
    T: Tagger,
    F: FnOnce() -> Result<T>,
{
    let mut tagger = make_tagger().map_err(|e| e.to_string());
    info!("Tag worker started");

    while let Ok(request) = requests.recv() {
        let job = match request {
            WorkerRequest::Tag(job) => job,
            WorkerRequest::Shutdown => break,
        };

        replies.send(WorkerReply::Log(format!("Tagging {} ({} bytes)", job.filename, job.length))).ok();

        let outcome = match tagger.as_mut() {
            Ok(tagger) => tagger.tag(&job).map_err(|e| e.to_string()),
            Err(e) => Err(e.clone()),
        };
        let reply = match outcome {
            Ok(tags) => WorkerReply::Tagged(TagMessage::from_job(&job, tags)),
            Err(error) => WorkerReply::Failed {
                id: job.id,
                filename: job.filename,
                error,
            },
        };

        if replies.send(reply).is_err() {
            break;
        }
    }

    debug!("Tag worker stopped");
}
