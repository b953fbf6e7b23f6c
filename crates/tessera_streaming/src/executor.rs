//! # Job Executors
//!
//! Where generation work runs. The manager hands every map and mesh job to
//! an [`Executor`]; results come back over the manager's completion channel,
//! never through the executor.
//!
//! | Executor | Runs jobs | Use |
//! |----------|-----------|-----|
//! | [`WorkerPool`] | on N background threads | production |
//! | [`InlineExecutor`] | immediately, on the caller | deterministic tests, tools |
//! | [`DeferredExecutor`] | when told to, in any order | simulating races |

use std::any::Any;
use std::collections::VecDeque;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::{unbounded, Sender};
use parking_lot::Mutex;

use crate::chunk::ChunkCoord;
use crate::error::StreamingResult;

/// What a job produces. Used for logging and by [`DeferredExecutor`] filters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JobKind {
    /// Heights, colours and texture for a chunk.
    Map(ChunkCoord),
    /// One LOD mesh for a chunk.
    Mesh {
        /// Target chunk.
        coord: ChunkCoord,
        /// Target LOD index.
        lod: usize,
    },
}

/// A unit of generation work.
pub struct Job {
    kind: JobKind,
    work: Box<dyn FnOnce() + Send + 'static>,
}

impl Job {
    /// Wraps a closure.
    pub fn new(kind: JobKind, work: impl FnOnce() + Send + 'static) -> Self {
        Self {
            kind,
            work: Box::new(work),
        }
    }

    /// What this job produces.
    #[must_use]
    pub const fn kind(&self) -> JobKind {
        self.kind
    }

    /// Runs the job to completion.
    ///
    /// A panic inside the job is caught and logged so the calling worker
    /// survives it. Returns false if the job panicked.
    #[must_use]
    pub fn run(self) -> bool {
        let Self { kind, work } = self;
        let start = Instant::now();
        match panic::catch_unwind(AssertUnwindSafe(work)) {
            Ok(()) => {
                tracing::trace!(?kind, elapsed_us = start.elapsed().as_micros() as u64, "job finished");
                true
            }
            Err(payload) => {
                tracing::error!(?kind, reason = %panic_message(payload.as_ref()), "job panicked");
                false
            }
        }
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job").field("kind", &self.kind).finish_non_exhaustive()
    }
}

/// Text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Something that runs jobs.
pub trait Executor: Send + Sync {
    /// Schedules `job`. It must eventually run exactly once.
    fn execute(&self, job: Job);
}

/// Fixed pool of worker threads fed by one job queue.
///
/// Dropping the pool closes the queue, lets the workers finish what is
/// already queued, and joins them.
pub struct WorkerPool {
    sender: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Starts `threads` workers (at least one).
    ///
    /// # Errors
    ///
    /// Returns [`crate::StreamingError::Io`] if the OS refuses a thread.
    pub fn new(threads: usize) -> StreamingResult<Self> {
        let threads = threads.max(1);
        let (sender, receiver) = unbounded::<Job>();

        let mut workers = Vec::with_capacity(threads);
        for index in 0..threads {
            let receiver = receiver.clone();
            let handle = thread::Builder::new()
                .name(format!("tessera-worker-{index}"))
                .spawn(move || {
                    for job in receiver.iter() {
                        let _ = job.run();
                    }
                })?;
            workers.push(handle);
        }

        tracing::info!(threads, "worker pool started");
        Ok(Self {
            sender: Some(sender),
            workers,
        })
    }

    /// Number of worker threads.
    #[must_use]
    pub fn thread_count(&self) -> usize {
        self.workers.len()
    }
}

impl Executor for WorkerPool {
    fn execute(&self, job: Job) {
        if let Some(sender) = &self.sender {
            if let Err(rejected) = sender.send(job) {
                // Only possible once every worker has exited
                tracing::warn!(kind = ?rejected.0.kind(), "worker pool closed, running job inline");
                let _ = rejected.0.run();
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.sender.take();
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                tracing::warn!("worker thread panicked");
            }
        }
        tracing::info!("worker pool stopped");
    }
}

impl fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool").field("threads", &self.workers.len()).finish()
    }
}

/// Runs each job on the calling thread before `execute` returns.
#[derive(Clone, Copy, Debug, Default)]
pub struct InlineExecutor;

impl Executor for InlineExecutor {
    fn execute(&self, job: Job) {
        let _ = job.run();
    }
}

/// Holds jobs until the caller releases them.
#[derive(Debug, Default)]
pub struct DeferredExecutor {
    queue: Mutex<VecDeque<Job>>,
}

impl DeferredExecutor {
    /// Creates an empty executor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Jobs waiting to run.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }

    /// Kinds of the waiting jobs, oldest first.
    #[must_use]
    pub fn pending_kinds(&self) -> Vec<JobKind> {
        self.queue.lock().iter().map(Job::kind).collect()
    }

    /// Runs the oldest job. Returns false if there was none.
    pub fn run_next(&self) -> bool {
        // Release the lock before running; jobs may enqueue more work
        let job = self.queue.lock().pop_front();
        match job {
            Some(job) => {
                let _ = job.run();
                true
            }
            None => false,
        }
    }

    /// Runs jobs until the queue is empty, including jobs queued meanwhile.
    /// Returns how many ran.
    pub fn run_all(&self) -> usize {
        let mut ran = 0;
        while self.run_next() {
            ran += 1;
        }
        ran
    }

    /// Runs, in queue order, every currently waiting job whose kind matches.
    /// Returns how many ran.
    pub fn run_matching(&self, mut filter: impl FnMut(JobKind) -> bool) -> usize {
        let selected: Vec<Job> = {
            let mut queue = self.queue.lock();
            let (take, keep): (VecDeque<Job>, VecDeque<Job>) =
                queue.drain(..).partition(|job| filter(job.kind()));
            *queue = keep;
            take.into_iter().collect()
        };
        let ran = selected.len();
        for job in selected {
            let _ = job.run();
        }
        ran
    }
}

impl Executor for DeferredExecutor {
    fn execute(&self, job: Job) {
        self.queue.lock().push_back(job);
    }
}
