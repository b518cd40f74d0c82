//! Thread-backed worker handles and the pool that indexes them.
//!
//! Each worker runs a [`SelectorService`] on its own thread, receiving
//! tasks over an mpsc channel and pushing protocol replies into the shared
//! channel the picker drains. The pool keeps handles in a slot vector
//! indexed by worker id; removing a worker leaves a hole, which is how a
//! decoded pixel can end up referencing a worker that no longer exists.

use std::sync::mpsc::{channel, Sender};
use std::thread;

use log::debug;
use tilepick_core::protocol::{WorkerReply, WorkerRequest};
use tilepick_core::selector::SelectorService;

enum WorkerTask {
    Protocol(WorkerRequest),
    Run(Box<dyn FnOnce(&mut SelectorService) + Send>),
}

/// Handle to one live worker thread.
pub struct WorkerHandle {
    worker_id: u8,
    tx: Sender<WorkerTask>,
}

impl WorkerHandle {
    /// Spawns a worker thread servicing protocol requests, with replies
    /// funneled into `reply_tx`.
    #[must_use]
    pub fn spawn(worker_id: u8, reply_tx: Sender<WorkerReply>) -> Self {
        let (tx, rx) = channel::<WorkerTask>();
        thread::spawn(move || {
            let mut service = SelectorService::new(worker_id);
            while let Ok(task) = rx.recv() {
                match task {
                    WorkerTask::Protocol(request) => {
                        if let Some(reply) = service.handle(request) {
                            if reply_tx.send(reply).is_err() {
                                break;
                            }
                        }
                    }
                    WorkerTask::Run(f) => f(&mut service),
                }
            }
            debug!("worker {worker_id} shut down");
        });
        Self { worker_id, tx }
    }

    /// The worker's id, i.e. its slot in the pool and the low byte of every
    /// color key it mints.
    #[must_use]
    pub fn worker_id(&self) -> u8 {
        self.worker_id
    }

    /// Sends a protocol request. Returns false if the worker thread is gone.
    pub fn send(&self, request: WorkerRequest) -> bool {
        self.tx.send(WorkerTask::Protocol(request)).is_ok()
    }

    /// Runs a closure on the worker thread with its selector service, the
    /// path tile-geometry production uses to allocate colors.
    pub fn run(&self, f: impl FnOnce(&mut SelectorService) + Send + 'static) -> bool {
        self.tx.send(WorkerTask::Run(Box::new(f))).is_ok()
    }
}

impl std::fmt::Debug for WorkerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerHandle")
            .field("worker_id", &self.worker_id)
            .finish_non_exhaustive()
    }
}

/// Slot vector of worker handles indexed by worker id.
#[derive(Debug, Default)]
pub struct WorkerPool {
    slots: Vec<Option<WorkerHandle>>,
}

impl WorkerPool {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns a worker into the next slot and returns its id.
    ///
    /// # Panics
    ///
    /// Panics if all 255 assignable worker ids are taken.
    pub fn spawn(&mut self, reply_tx: &Sender<WorkerReply>) -> u8 {
        assert!(self.slots.len() < usize::from(tilepick_core::NO_WORKER));
        #[allow(clippy::cast_possible_truncation)]
        let worker_id = self.slots.len() as u8;
        self.slots
            .push(Some(WorkerHandle::spawn(worker_id, reply_tx.clone())));
        worker_id
    }

    /// Drops a worker's handle, leaving a hole in its slot.
    pub fn remove(&mut self, worker_id: u8) -> Option<WorkerHandle> {
        self.slots.get_mut(usize::from(worker_id))?.take()
    }

    /// The handle for a worker id, if that worker still exists.
    #[must_use]
    pub fn get(&self, worker_id: u8) -> Option<&WorkerHandle> {
        self.slots.get(usize::from(worker_id))?.as_ref()
    }

    /// Total slot count, including holes. Color vectors are sized to this
    /// so worker ids stay usable as indices.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Number of live workers.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// True when no workers are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live_count() == 0
    }

    /// Iterates live workers.
    pub fn iter(&self) -> impl Iterator<Item = &WorkerHandle> {
        self.slots.iter().filter_map(Option::as_ref)
    }
}
