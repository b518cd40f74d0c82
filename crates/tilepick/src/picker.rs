//! The main-thread picking orchestrator.
//!
//! [`Picker`] ties the pieces together: consumers queue point queries,
//! render code triggers debounced readbacks after each pick pass, and the
//! `process`/`pump` pair advances the pipeline. Each step samples the
//! target, decodes color keys, round-trips to the owning worker for
//! feature data, fans group-color fetches out to every worker, and finally
//! resolves the original futures.

use std::collections::HashMap;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::time::Instant;

use log::{debug, warn};
use tilepick_core::cache::StateCache;
use tilepick_core::feature::Feature;
use tilepick_core::group::GroupAssignment;
use tilepick_core::key::ColorKey;
use tilepick_core::options::PickOptions;
use tilepick_core::protocol::{Selection, WorkerReply, WorkerRequest};
use tilepick_core::queue::{PickPoint, RequestQueue, SelectionFuture, SelectionRequest};
use tilepick_core::schedule::ReadbackClock;
use tilepick_core::source::PixelSource;

use crate::worker::WorkerPool;

/// What a completed group-color gather feeds into.
enum GatherPurpose {
    /// Resolving a selection request whose feature has already arrived.
    Request {
        request_id: u64,
        feature: Feature,
        changed: bool,
        group: GroupAssignment,
    },
    /// Refreshing a cached UI state's colors.
    StateRefresh { state_key: String },
}

/// An in-flight broadcast to all workers for a group's index colors.
struct ColorGather {
    purpose: GatherPurpose,
    awaiting: usize,
    colors: Vec<Option<[u8; 4]>>,
}

/// Main-thread picking coordinator.
pub struct Picker {
    options: PickOptions,
    queue: RequestQueue,
    cache: StateCache,
    clock: ReadbackClock,
    pool: WorkerPool,
    reply_tx: Sender<WorkerReply>,
    reply_rx: Receiver<WorkerReply>,
    /// Feature currently under the last resolved selection, for the
    /// structural `changed` comparison.
    selected: Option<Feature>,
    gathers: HashMap<u64, ColorGather>,
    next_token: u64,
}

impl Picker {
    /// Creates a picker with no workers.
    #[must_use]
    pub fn new(options: PickOptions) -> Self {
        let (reply_tx, reply_rx) = channel();
        let clock = ReadbackClock::new(options.read_delay);
        Self {
            options,
            queue: RequestQueue::new(),
            cache: StateCache::new(),
            clock,
            pool: WorkerPool::new(),
            reply_tx,
            reply_rx,
            selected: None,
            gathers: HashMap::new(),
            next_token: 0,
        }
    }

    /// The configured options.
    #[must_use]
    pub fn options(&self) -> &PickOptions {
        &self.options
    }

    /// Spawns a worker thread and returns its id.
    pub fn spawn_worker(&mut self) -> u8 {
        self.pool.spawn(&self.reply_tx)
    }

    /// Removes a worker, leaving its id slot dead. Requests whose pixels
    /// still decode to this id will stay pending.
    pub fn remove_worker(&mut self, worker_id: u8) {
        self.pool.remove(worker_id);
    }

    /// The worker pool, for running allocation work on worker threads.
    #[must_use]
    pub fn workers(&self) -> &WorkerPool {
        &self.pool
    }

    /// Broadcasts a state wipe to every worker, e.g. on style reload.
    pub fn reset_workers(&mut self) {
        for worker in self.pool.iter() {
            worker.send(WorkerRequest::Reset);
        }
    }

    /// Queues a query for the feature at `point`, optionally caching the
    /// result under a named UI state.
    ///
    /// The returned future resolves once a later `read`/`process` cycle has
    /// sampled the target and the owning worker has answered.
    pub fn feature_at(&mut self, point: PickPoint, state_key: Option<&str>) -> SelectionFuture {
        let (id, future) = self.queue.request(point, state_key.map(str::to_string));
        debug!("queued selection request {id} at ({}, {})", point.x, point.y);
        future
    }

    /// Pending requests, in request order.
    pub fn pending_requests(&self) -> impl Iterator<Item = &SelectionRequest> {
        self.queue.pending()
    }

    /// Rejects every request not yet dispatched to a worker. Dispatched
    /// requests keep their slots so in-flight replies can land.
    pub fn cancel_pending(&mut self) {
        self.queue.cancel_all();
    }

    /// Debounced read trigger; call once per render pass that touched the
    /// picking target. Repeat triggers inside the delay window supersede
    /// the previous one.
    pub fn read(&mut self, now: Instant) {
        self.clock.trigger(now);
    }

    /// Advances the pipeline: drains worker replies, and runs the deferred
    /// read pass if its deadline has come due and `source` reports a stable
    /// frame. Call once per animation step.
    pub fn process(&mut self, now: Instant, source: &dyn PixelSource) {
        self.pump();
        if self.clock.fire(now) {
            if source.is_stable() {
                self.run_read_pass(source);
            } else {
                // Dropped, not rescheduled; the next render trigger will.
                debug!("skipping read pass: frame not stable");
            }
        }
        self.pump();
    }

    /// Samples the target for every not-yet-dispatched request.
    fn run_read_pass(&mut self, source: &dyn PixelSource) {
        let (width, height) = source.extent();
        for id in self.queue.unsent_ids() {
            let Some(request) = self.queue.get_mut(id) else {
                continue;
            };
            let (x, y) = request.point.to_pixel(width, height);
            let Some(pixel) = source.sample(x, y) else {
                // Failed sample; the request stays queued for the next pass.
                continue;
            };
            let key = ColorKey::from_pixel(pixel);

            if key.is_empty() {
                let changed = self.selected.is_some();
                self.resolve_without_feature(id, changed);
            } else if let Some(worker) = self.pool.get(key.worker_id()) {
                if worker.send(WorkerRequest::GetFeatureSelection {
                    request_id: id,
                    key,
                }) {
                    if let Some(request) = self.queue.get_mut(id) {
                        request.sent = true;
                    }
                } else {
                    warn!("worker {} hung up; request {id} retried next pass", key.worker_id());
                }
            } else {
                // Known gap: a pixel listing a despawned worker leaves the
                // request pending indefinitely.
                warn!(
                    "pixel at ({x}, {y}) references dead worker {}; request {id} left pending",
                    key.worker_id()
                );
            }
        }
    }

    /// Drains the shared reply channel, routing feature answers and
    /// gather completions. Dropped-in by `process`, but callable on its own
    /// wherever the host pumps its message loop.
    pub fn pump(&mut self) {
        while let Ok(reply) = self.reply_rx.try_recv() {
            match reply {
                WorkerReply::FeatureSelection {
                    request_id,
                    worker_id,
                    feature,
                    group,
                } => self.on_feature_reply(request_id, worker_id, feature, group),
                WorkerReply::GroupColor {
                    token,
                    worker_id,
                    color,
                } => self.on_group_color(token, worker_id, color),
            }
        }
    }

    fn on_feature_reply(
        &mut self,
        request_id: u64,
        worker_id: u8,
        feature: Option<Feature>,
        group: GroupAssignment,
    ) {
        if self.queue.get_mut(request_id).is_none() {
            // The request was cleared before the worker answered.
            warn!("dropping reply from worker {worker_id} for unknown request {request_id}");
            return;
        }

        let changed = self.selected != feature;
        self.selected = feature.clone();

        if let Some(feature) = feature {
            debug!(
                "request {request_id}: worker {worker_id} resolved feature in {:?}, changed={changed}",
                feature.source_layer
            );
            let group_key = group.key.clone();
            self.start_gather(
                GatherPurpose::Request {
                    request_id,
                    feature,
                    changed,
                    group,
                },
                &group_key,
            );
        } else {
            self.resolve_without_feature(request_id, changed);
        }
    }

    fn on_group_color(&mut self, token: u64, worker_id: u8, color: Option<[u8; 4]>) {
        let Some(gather) = self.gathers.get_mut(&token) else {
            warn!("dropping group color from worker {worker_id} for unknown gather {token}");
            return;
        };
        if let Some(slot) = gather.colors.get_mut(usize::from(worker_id)) {
            *slot = color;
        }
        gather.awaiting = gather.awaiting.saturating_sub(1);
        if gather.awaiting == 0 {
            if let Some(gather) = self.gathers.remove(&token) {
                self.finish_gather(gather);
            }
        }
    }

    /// Broadcasts a group-color fetch to every live worker. Completes
    /// immediately when no workers exist.
    fn start_gather(&mut self, purpose: GatherPurpose, group_key: &str) {
        self.next_token += 1;
        let token = self.next_token;
        let mut awaiting = 0;
        for worker in self.pool.iter() {
            if worker.send(WorkerRequest::GetGroupColor {
                token,
                group_key: group_key.to_string(),
            }) {
                awaiting += 1;
            }
        }
        let gather = ColorGather {
            purpose,
            awaiting,
            colors: vec![None; self.pool.slot_count()],
        };
        if gather.awaiting == 0 {
            self.finish_gather(gather);
        } else {
            self.gathers.insert(token, gather);
        }
    }

    fn finish_gather(&mut self, gather: ColorGather) {
        match gather.purpose {
            GatherPurpose::Request {
                request_id,
                feature,
                changed,
                group,
            } => {
                let Some(request) = self.queue.take(request_id) else {
                    warn!("request {request_id} vanished before group colors arrived");
                    return;
                };
                if let Some(state_key) = &request.state_key {
                    self.cache.store(
                        state_key,
                        Some(feature.clone()),
                        Some(group.clone()),
                        gather.colors.clone(),
                    );
                }
                request.resolve(Selection {
                    feature: Some(feature),
                    changed,
                    selection_colors: gather.colors,
                    group: Some(group),
                });
            }
            GatherPurpose::StateRefresh { state_key } => {
                debug!("state '{state_key}': refreshed group colors");
                self.cache.finish_refresh(&state_key, gather.colors);
            }
        }
    }

    /// Resolves a request with no feature under the point: the "empty
    /// pixel" fast path and the empty-reply path share this. `changed` is
    /// computed by the caller, against the selection as it stood before
    /// this resolution began.
    fn resolve_without_feature(&mut self, request_id: u64, changed: bool) {
        self.selected = None;
        let Some(request) = self.queue.take(request_id) else {
            return;
        };
        if let Some(state_key) = &request.state_key {
            self.cache.store(state_key, None, None, Vec::new());
        }
        request.resolve(Selection {
            feature: None,
            changed,
            selection_colors: Vec::new(),
            group: None,
        });
    }

    /// Refreshes a cached state's group colors from every worker, at most
    /// one refresh in flight per state. No-op when the state is absent,
    /// groupless, already refreshing, or already fully answered.
    pub fn update_state(&mut self, state_key: &str) {
        if !self.cache.needs_refresh(state_key, self.pool.slot_count()) {
            return;
        }
        let Some(group_key) = self.cache.begin_refresh(state_key) else {
            return;
        };
        debug!("state '{state_key}': requesting group colors for '{group_key}'");
        self.start_gather(
            GatherPurpose::StateRefresh {
                state_key: state_key.to_string(),
            },
            &group_key,
        );
    }

    /// Drops a cached UI state.
    pub fn clear_state(&mut self, state_key: &str) {
        self.cache.clear(state_key);
    }

    /// Read access to a cached UI state.
    #[must_use]
    pub fn state(&self, state_key: &str) -> Option<&tilepick_core::cache::SelectionStateEntry> {
        self.cache.get(state_key)
    }
}

impl Default for Picker {
    fn default() -> Self {
        Self::new(PickOptions::default())
    }
}
