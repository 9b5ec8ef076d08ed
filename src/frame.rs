//! Scheduled repaint frames.
//!
//! The scan animation runs as a chain of one-shot frame requests: each tick
//! asks for the next frame, and the window loop consumes the request when the
//! display is ready to repaint. Only one request can be outstanding, so at most
//! one animation loop exists at a time.

use tracing::trace;

/// Handle for a single scheduled frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRequest(u64);

impl FrameRequest {
    pub fn id(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default)]
pub struct FrameScheduler {
    next_id: u64,
    pending: Option<FrameRequest>,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules a frame, replacing any request that is still pending.
    pub fn request(&mut self) -> FrameRequest {
        self.next_id += 1;
        let request = FrameRequest(self.next_id);
        if let Some(previous) = self.pending.replace(request) {
            trace!(replaced = previous.0, id = request.0, "frame request replaced");
        }
        request
    }

    /// Cancels `request` if it is the one pending. Returns whether anything was dropped.
    pub fn cancel(&mut self, request: FrameRequest) -> bool {
        if self.pending == Some(request) {
            self.pending = None;
            trace!(id = request.0, "frame request cancelled");
            true
        } else {
            false
        }
    }

    /// Consumes the pending frame when the display is ready to repaint.
    pub fn take_due(&mut self) -> Option<FrameRequest> {
        self.pending.take()
    }

    pub fn pending(&self) -> usize {
        usize::from(self.pending.is_some())
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_replaces_previous() {
        let mut frames = FrameScheduler::new();
        let first = frames.request();
        let second = frames.request();
        assert_ne!(first, second);
        assert_eq!(frames.pending(), 1);
        assert!(!frames.cancel(first));
        assert!(frames.cancel(second));
        assert_eq!(frames.pending(), 0);
    }

    #[test]
    fn take_due_consumes_once() {
        let mut frames = FrameScheduler::new();
        let request = frames.request();
        assert_eq!(frames.take_due(), Some(request));
        assert_eq!(frames.take_due(), None);
        assert!(!frames.is_pending());
    }

    #[test]
    fn cancelling_a_consumed_request_is_a_no_op() {
        let mut frames = FrameScheduler::new();
        let request = frames.request();
        frames.take_due();
        assert!(!frames.cancel(request));
        let next = frames.request();
        assert!(!frames.cancel(request));
        assert!(frames.cancel(next));
        assert!(!frames.is_pending());
    }
}
