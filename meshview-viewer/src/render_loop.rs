//! Continuously rescheduled frame callback
//!
//! The host owns the actual frame primitive (a window redraw request, a
//! vsync callback, a test harness) behind [`FrameScheduler`]. The loop only
//! tracks whether it is running and which frame request is outstanding, so
//! stopping it can cancel exactly that request.

use std::collections::BTreeSet;

use tracing::{debug, trace};

/// Handle to one outstanding frame request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameToken(pub u64);

/// Host-side per-frame scheduling primitive
pub trait FrameScheduler {
    /// Ask for one callback on the next frame
    fn request_frame(&mut self) -> FrameToken;

    /// Withdraw a request that has not fired yet
    fn cancel_frame(&mut self, token: FrameToken);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Stopped,
    Running { pending: FrameToken },
}

#[derive(Debug)]
pub struct RenderLoop {
    state: LoopState,
}

impl RenderLoop {
    pub fn new() -> Self {
        Self {
            state: LoopState::Stopped,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, LoopState::Running { .. })
    }

    /// Stopped -> Running; a running loop keeps its pending request
    pub fn start<S: FrameScheduler + ?Sized>(&mut self, scheduler: &mut S) {
        if self.is_running() {
            return;
        }
        let pending = scheduler.request_frame();
        debug!(token = pending.0, "render loop started");
        self.state = LoopState::Running { pending };
    }

    /// Running -> Stopped, cancelling the outstanding request
    pub fn stop<S: FrameScheduler + ?Sized>(&mut self, scheduler: &mut S) {
        if let LoopState::Running { pending } = self.state {
            scheduler.cancel_frame(pending);
            debug!(token = pending.0, "render loop stopped");
        }
        self.state = LoopState::Stopped;
    }

    /// Accept a fired frame
    ///
    /// The next frame is requested before this returns, so whatever the
    /// caller draws afterwards cannot stall the cadence. Returns false for a
    /// token that is not the outstanding one.
    pub fn on_tick<S: FrameScheduler + ?Sized>(&mut self, token: FrameToken, scheduler: &mut S) -> bool {
        match self.state {
            LoopState::Running { pending } if pending == token => {
                let next = scheduler.request_frame();
                trace!(fired = token.0, next = next.0, "frame rescheduled");
                self.state = LoopState::Running { pending: next };
                true
            }
            _ => {
                trace!(token = token.0, "ignoring stale frame");
                false
            }
        }
    }
}

impl Default for RenderLoop {
    fn default() -> Self {
        Self::new()
    }
}

/// Scheduler driven by hand
///
/// Frames only fire when the owner pops them; used by headless hosts and
/// tests.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next: u64,
    pending: BTreeSet<FrameToken>,
    requested: usize,
    cancelled: Vec<FrameToken>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests that have neither fired nor been cancelled
    pub fn pending(&self) -> Vec<FrameToken> {
        self.pending.iter().copied().collect()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Fire the oldest pending request
    pub fn fire_next(&mut self) -> Option<FrameToken> {
        self.pending.pop_first()
    }

    pub fn requested(&self) -> usize {
        self.requested
    }

    pub fn cancelled(&self) -> &[FrameToken] {
        &self.cancelled
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> FrameToken {
        self.next += 1;
        self.requested += 1;
        let token = FrameToken(self.next);
        self.pending.insert(token);
        token
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        if self.pending.remove(&token) {
            self.cancelled.push(token);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_requests_one_frame() {
        let mut scheduler = ManualScheduler::new();
        let mut render_loop = RenderLoop::new();
        render_loop.start(&mut scheduler);
        render_loop.start(&mut scheduler);
        assert!(render_loop.is_running());
        assert_eq!(scheduler.requested(), 1);
        assert_eq!(scheduler.pending().len(), 1);
    }

    #[test]
    fn test_tick_reschedules_before_returning() {
        let mut scheduler = ManualScheduler::new();
        let mut render_loop = RenderLoop::new();
        render_loop.start(&mut scheduler);

        let token = scheduler.fire_next().unwrap();
        assert!(render_loop.on_tick(token, &mut scheduler));
        assert_eq!(scheduler.pending().len(), 1);
        assert_ne!(scheduler.pending()[0], token);
    }

    #[test]
    fn test_stale_token_is_ignored() {
        let mut scheduler = ManualScheduler::new();
        let mut render_loop = RenderLoop::new();
        render_loop.start(&mut scheduler);
        assert!(!render_loop.on_tick(FrameToken(999), &mut scheduler));
        assert_eq!(scheduler.requested(), 1);
    }

    #[test]
    fn test_stop_cancels_pending() {
        let mut scheduler = ManualScheduler::new();
        let mut render_loop = RenderLoop::new();
        render_loop.start(&mut scheduler);
        let pending = scheduler.pending()[0];

        render_loop.stop(&mut scheduler);
        assert_eq!(render_loop.state(), LoopState::Stopped);
        assert!(!scheduler.has_pending());
        assert_eq!(scheduler.cancelled(), &[pending]);

        // a tick that raced the stop does nothing
        assert!(!render_loop.on_tick(pending, &mut scheduler));
        assert!(!scheduler.has_pending());
    }
}
