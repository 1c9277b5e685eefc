// Patch database - background-indexed search over the patch library
//
// Indexing runs on a worker thread owned by the database. The GUI never waits
// on it: it reads `number_of_jobs_outstanding()` and polls until it reaches 0.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex, RwLock};
use std::thread::JoinHandle;

/// One searchable patch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchRecord {
    pub file: PathBuf,
    pub name: String,
    pub cat: String,
    pub author: String,
}

/// Search collaborator used by the type-ahead box
pub trait PatchDatabase {
    /// Make sure the indexing worker is running
    fn initialize(&self);

    /// Records whose name, category or author contain every whitespace
    /// separated term of `query` (case-insensitive), sorted by name
    fn query_from_query_string(&self, query: &str) -> Vec<PatchRecord>;

    fn number_of_jobs_outstanding(&self) -> usize;
}

enum IndexJob {
    Add(PatchRecord),
    Clear,
}

struct Worker {
    sender: Sender<IndexJob>,
    handle: JoinHandle<()>,
}

/// In-process patch database with a single indexing thread
pub struct PatchDb {
    index: Arc<RwLock<Vec<PatchRecord>>>,
    outstanding: Arc<AtomicUsize>,
    worker: Mutex<Option<Worker>>,
}

impl PatchDb {
    pub fn new() -> Self {
        Self {
            index: Arc::new(RwLock::new(Vec::new())),
            outstanding: Arc::new(AtomicUsize::new(0)),
            worker: Mutex::new(None),
        }
    }

    fn spawn_worker(&self) -> Option<Worker> {
        let (sender, receiver) = mpsc::channel::<IndexJob>();
        let index = Arc::clone(&self.index);
        let outstanding = Arc::clone(&self.outstanding);

        let handle = std::thread::Builder::new()
            .name("patch-db-index".to_string())
            .spawn(move || {
                while let Ok(job) = receiver.recv() {
                    match job {
                        IndexJob::Add(record) => {
                            if let Ok(mut index) = index.write() {
                                match index.iter_mut().find(|r| r.file == record.file) {
                                    Some(existing) => *existing = record,
                                    None => index.push(record),
                                }
                            }
                        }
                        IndexJob::Clear => {
                            if let Ok(mut index) = index.write() {
                                index.clear();
                            }
                        }
                    }
                    outstanding.fetch_sub(1, Ordering::AcqRel);
                }
                log::debug!("Patch database worker stopped");
            });

        match handle {
            Ok(handle) => Some(Worker { sender, handle }),
            Err(e) => {
                log::warn!("Failed to start patch database worker: {}", e);
                None
            }
        }
    }

    fn submit(&self, job: IndexJob) {
        self.initialize();

        let Ok(worker) = self.worker.lock() else {
            return;
        };
        let Some(worker) = worker.as_ref() else {
            return;
        };

        self.outstanding.fetch_add(1, Ordering::AcqRel);
        if worker.sender.send(job).is_err() {
            self.outstanding.fetch_sub(1, Ordering::AcqRel);
        }
    }

    /// Queue one indexing job per record
    pub fn enqueue(&self, records: impl IntoIterator<Item = PatchRecord>) {
        let mut count = 0;
        for record in records {
            self.submit(IndexJob::Add(record));
            count += 1;
        }
        log::info!("Queued {} patch database jobs", count);
    }

    /// Queue removal of every indexed record
    pub fn clear(&self) {
        self.submit(IndexJob::Clear);
    }

    pub fn indexed_count(&self) -> usize {
        self.index.read().map(|index| index.len()).unwrap_or(0)
    }
}

impl Default for PatchDb {
    fn default() -> Self {
        Self::new()
    }
}

impl PatchDatabase for PatchDb {
    fn initialize(&self) {
        let Ok(mut worker) = self.worker.lock() else {
            return;
        };
        if worker.is_none() {
            *worker = self.spawn_worker();
        }
    }

    fn query_from_query_string(&self, query: &str) -> Vec<PatchRecord> {
        let terms: Vec<String> = query
            .split_whitespace()
            .map(str::to_lowercase)
            .collect();

        if terms.is_empty() {
            return Vec::new();
        }

        let Ok(index) = self.index.read() else {
            return Vec::new();
        };

        let mut results: Vec<PatchRecord> = index
            .iter()
            .filter(|record| {
                let name = record.name.to_lowercase();
                let cat = record.cat.to_lowercase();
                let author = record.author.to_lowercase();
                terms
                    .iter()
                    .all(|t| name.contains(t) || cat.contains(t) || author.contains(t))
            })
            .cloned()
            .collect();

        results.sort_by_key(|r| r.name.to_lowercase());
        results
    }

    fn number_of_jobs_outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Acquire)
    }
}

impl Drop for PatchDb {
    fn drop(&mut self) {
        let worker = match self.worker.get_mut() {
            Ok(worker) => worker.take(),
            Err(_) => None,
        };

        if let Some(Worker { sender, handle }) = worker {
            // Closing the channel ends the worker loop
            drop(sender);
            let _ = handle.join();
        }
    }
}
