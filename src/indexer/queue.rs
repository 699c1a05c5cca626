// Job queue: a FIFO plus the single in-flight flag

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::tagger::Job;

#[derive(Debug, Default)]
struct QueueState {
    queued: VecDeque<Job>,
    job_pending: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueStatus {
    pub queued_count: usize,
    pub job_pending: bool,
}

#[derive(Debug, Default)]
pub struct JobQueue {
    state: Mutex<QueueState>,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a job to the back of the queue
    pub fn queue_job(&self, job: Job) {
        self.lock().queued.push_back(job);
    }

    /// Take the job at the front of the queue
    pub fn take_next(&self) -> Option<Job> {
        self.lock().queued.pop_front()
    }

    /// Put a job back at the front, e.g. when the worker is busy
    pub fn requeue_front(&self, job: Job) {
        self.lock().queued.push_front(job);
    }

    pub fn is_pending(&self) -> bool {
        self.lock().job_pending
    }

    pub fn set_pending(&self, value: bool) {
        self.lock().job_pending = value;
    }

    /// Nothing queued and nothing in flight
    pub fn is_idle(&self) -> bool {
        let state = self.lock();
        state.queued.is_empty() && !state.job_pending
    }

    pub fn status(&self) -> QueueStatus {
        let state = self.lock();
        QueueStatus {
            queued_count: state.queued.len(),
            job_pending: state.job_pending,
        }
    }
}
