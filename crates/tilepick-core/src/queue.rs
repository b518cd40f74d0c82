//! In-flight selection request tracking.

use std::collections::BTreeMap;
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};

use crate::error::{PickError, Result};
use crate::protocol::Selection;

/// A screen-space query point in normalized viewport coordinates, `[0, 1]`
/// on both axes with the origin at the bottom-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickPoint {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl PickPoint {
    /// Creates a point.
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Maps this point to pixel coordinates on a target of the given extent,
    /// flipping vertically (pixel rows grow downward).
    #[must_use]
    pub fn to_pixel(self, width: u32, height: u32) -> (u32, u32) {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let px = ((self.x * f64::from(width)).floor() as u32).min(width.saturating_sub(1));
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let py = (((1.0 - self.y) * f64::from(height)).floor() as u32).min(height.saturating_sub(1));
        (px, py)
    }
}

/// One in-flight selection query.
#[derive(Debug)]
pub struct SelectionRequest {
    /// Sequential request id, the correlation id for worker replies.
    pub id: u64,
    /// Queried point.
    pub point: PickPoint,
    /// UI state to cache the result under, if any.
    pub state_key: Option<String>,
    /// Whether this request has been dispatched to a worker. Dispatched
    /// requests are skipped by later readback passes and survive
    /// [`RequestQueue::cancel_all`].
    pub sent: bool,
    tx: Sender<Result<Selection>>,
}

impl SelectionRequest {
    /// Completes the request with a resolved selection.
    pub fn resolve(self, selection: Selection) {
        // The consumer may have dropped its future; that is fine.
        let _ = self.tx.send(Ok(selection));
    }

    /// Completes the request with an error.
    pub fn reject(self, error: PickError) {
        let _ = self.tx.send(Err(error));
    }
}

/// The consumer's handle to a pending selection result.
#[derive(Debug)]
pub struct SelectionFuture {
    rx: Receiver<Result<Selection>>,
}

impl SelectionFuture {
    /// Returns the result if it has arrived, without blocking.
    pub fn try_resolve(&self) -> Option<Result<Selection>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(PickError::Abandoned)),
        }
    }

    /// Blocks until the result arrives.
    pub fn wait(self) -> Result<Selection> {
        self.rx.recv().unwrap_or(Err(PickError::Abandoned))
    }

    /// Blocks up to `timeout` for the result.
    pub fn wait_timeout(&self, timeout: std::time::Duration) -> Option<Result<Selection>> {
        self.rx.recv_timeout(timeout).ok()
    }
}

/// Main-thread queue of selection requests awaiting readback or a worker
/// reply.
#[derive(Debug, Default)]
pub struct RequestQueue {
    next_id: u64,
    requests: BTreeMap<u64, SelectionRequest>,
}

impl RequestQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues a query for `point` and returns its id with the future the
    /// consumer will resolve on.
    pub fn request(
        &mut self,
        point: PickPoint,
        state_key: Option<String>,
    ) -> (u64, SelectionFuture) {
        self.next_id += 1;
        let id = self.next_id;
        let (tx, rx) = channel();
        self.requests.insert(
            id,
            SelectionRequest {
                id,
                point,
                state_key,
                sent: false,
                tx,
            },
        );
        (id, SelectionFuture { rx })
    }

    /// Iterates pending requests in id order.
    pub fn pending(&self) -> impl Iterator<Item = &SelectionRequest> {
        self.requests.values()
    }

    /// Number of pending requests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    /// True when nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Ids of requests not yet dispatched to a worker, in id order.
    #[must_use]
    pub fn unsent_ids(&self) -> Vec<u64> {
        self.requests
            .values()
            .filter(|r| !r.sent)
            .map(|r| r.id)
            .collect()
    }

    /// Mutable access to one request.
    pub fn get_mut(&mut self, id: u64) -> Option<&mut SelectionRequest> {
        self.requests.get_mut(&id)
    }

    /// Removes and returns one request, typically to resolve it.
    pub fn take(&mut self, id: u64) -> Option<SelectionRequest> {
        self.requests.remove(&id)
    }

    /// Rejects every request that has not been dispatched to a worker.
    ///
    /// Dispatched requests are left alone: a worker reply is still expected
    /// and must find a live slot to resolve into.
    pub fn cancel_all(&mut self) {
        let cancelled: Vec<u64> = self.unsent_ids();
        for id in cancelled {
            if let Some(request) = self.requests.remove(&id) {
                request.reject(PickError::Cancelled { id });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_sequential() {
        let mut queue = RequestQueue::new();
        let (a, _fa) = queue.request(PickPoint::new(0.5, 0.5), None);
        let (b, _fb) = queue.request(PickPoint::new(0.1, 0.9), None);
        assert_eq!(b, a + 1);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_cancel_skips_sent_requests() {
        let mut queue = RequestQueue::new();
        let (sent_id, sent_future) = queue.request(PickPoint::new(0.5, 0.5), None);
        let (unsent_id, unsent_future) = queue.request(PickPoint::new(0.2, 0.2), None);
        queue.get_mut(sent_id).unwrap().sent = true;

        queue.cancel_all();

        assert_eq!(
            unsent_future.try_resolve(),
            Some(Err(PickError::Cancelled { id: unsent_id }))
        );
        assert!(sent_future.try_resolve().is_none());
        assert_eq!(queue.len(), 1);
        assert!(queue.get_mut(sent_id).is_some());
    }

    #[test]
    fn test_resolve_delivers_to_future() {
        let mut queue = RequestQueue::new();
        let (id, future) = queue.request(PickPoint::new(0.0, 0.0), Some("hover".into()));
        let request = queue.take(id).unwrap();
        assert_eq!(request.state_key.as_deref(), Some("hover"));
        request.resolve(Selection {
            changed: true,
            ..Selection::default()
        });
        let selection = future.try_resolve().unwrap().unwrap();
        assert!(selection.changed);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_dropped_request_reports_abandoned() {
        let mut queue = RequestQueue::new();
        let (id, future) = queue.request(PickPoint::new(0.0, 0.0), None);
        drop(queue.take(id));
        assert_eq!(future.try_resolve(), Some(Err(PickError::Abandoned)));
    }

    #[test]
    fn test_point_to_pixel_flips_y() {
        let p = PickPoint::new(0.5, 0.25);
        assert_eq!(p.to_pixel(256, 256), (128, 192));
        // Edges clamp inside the target.
        assert_eq!(PickPoint::new(1.0, 0.0).to_pixel(256, 256), (255, 255));
        assert_eq!(PickPoint::new(0.0, 1.0).to_pixel(256, 256), (0, 0));
    }
}
