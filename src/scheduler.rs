//! Fixed-timestep scheduler
//!
//! Accumulator loop decoupling simulation rate from display refresh. The
//! host supplies frame callbacks through [`FrameHost`]; on the web that is
//! `requestAnimationFrame` / `cancelAnimationFrame`.

use crate::consts::MAX_DELTA_STEPS;
use crate::settings::Settings;

/// Id of a pending frame callback
pub type FrameId = i32;

/// Something that can schedule and cancel display-synced callbacks
pub trait FrameHost {
    fn request_frame(&mut self) -> FrameId;
    fn cancel_frame(&mut self, id: FrameId);
}

/// Result of one frame callback
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameOutcome {
    /// Simulation updates run this frame
    pub updates: u32,
    /// Leftover fraction of a step, for interpolated rendering
    pub alpha: f64,
}

#[derive(Debug, Clone)]
pub struct FixedStepScheduler {
    time_step_ms: f64,
    max_updates: u32,
    accumulator_ms: f64,
    last_ms: Option<f64>,
    pending: Option<FrameId>,
    running: bool,
}

impl FixedStepScheduler {
    pub fn new(settings: &Settings) -> Self {
        Self::with_step(settings.time_step_ms(), settings.max_updates)
    }

    pub fn with_step(time_step_ms: f64, max_updates: u32) -> Self {
        Self {
            time_step_ms,
            max_updates: max_updates.max(1),
            accumulator_ms: 0.0,
            last_ms: None,
            pending: None,
            running: false,
        }
    }

    #[inline]
    pub fn time_step_ms(&self) -> f64 {
        self.time_step_ms
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running
    }

    #[inline]
    pub fn accumulator_ms(&self) -> f64 {
        self.accumulator_ms
    }

    /// Callback id currently scheduled, if any
    #[inline]
    pub fn pending_frame(&self) -> Option<FrameId> {
        self.pending
    }

    /// Begin (or resume) the loop. The clock restarts, so time spent
    /// stopped is never caught up.
    pub fn start(&mut self, host: &mut impl FrameHost) {
        if self.running {
            return;
        }
        self.running = true;
        self.last_ms = None;
        self.accumulator_ms = 0.0;
        self.pending = Some(host.request_frame());
        log::debug!("Scheduler started ({:.2} ms step)", self.time_step_ms);
    }

    /// Halt the loop and cancel the pending callback
    pub fn stop(&mut self, host: &mut impl FrameHost) {
        self.running = false;
        if let Some(id) = self.pending.take() {
            host.cancel_frame(id);
        }
        log::debug!("Scheduler stopped");
    }

    /// Handle one frame callback at `now_ms`, running `update(step_ms)` for
    /// each whole step accumulated, then schedule the next callback.
    pub fn frame(
        &mut self,
        now_ms: f64,
        host: &mut impl FrameHost,
        mut update: impl FnMut(f64),
    ) -> FrameOutcome {
        self.pending = None;
        if !self.running {
            return FrameOutcome::default();
        }

        let raw_delta = self.last_ms.map_or(0.0, |last| (now_ms - last).max(0.0));
        self.last_ms = Some(now_ms);
        let max_delta = self.time_step_ms * MAX_DELTA_STEPS;
        if raw_delta > max_delta {
            log::warn!("Frame delta {:.1} ms clamped to {:.1} ms", raw_delta, max_delta);
        }
        self.accumulator_ms += raw_delta.min(max_delta);

        let mut updates = 0;
        while self.accumulator_ms >= self.time_step_ms && updates < self.max_updates {
            update(self.time_step_ms);
            self.accumulator_ms -= self.time_step_ms;
            updates += 1;
        }

        self.pending = Some(host.request_frame());
        FrameOutcome {
            updates,
            alpha: self.accumulator_ms / self.time_step_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{DESKTOP_TIME_STEP_MS, MAX_UPDATES};
    use proptest::prelude::*;

    #[derive(Default)]
    struct MockHost {
        next: FrameId,
        requested: Vec<FrameId>,
        cancelled: Vec<FrameId>,
    }

    impl FrameHost for MockHost {
        fn request_frame(&mut self) -> FrameId {
            self.next += 1;
            self.requested.push(self.next);
            self.next
        }

        fn cancel_frame(&mut self, id: FrameId) {
            self.cancelled.push(id);
        }
    }

    /// Power-of-two step keeps the accumulator arithmetic exact
    const STEP: f64 = 16.0;

    fn started_with(step: f64) -> (FixedStepScheduler, MockHost) {
        let mut host = MockHost::default();
        let mut s = FixedStepScheduler::with_step(step, MAX_UPDATES);
        s.start(&mut host);
        (s, host)
    }

    fn started() -> (FixedStepScheduler, MockHost) {
        started_with(STEP)
    }

    #[test]
    fn test_steady_frames_run_one_update() {
        let (mut s, mut host) = started_with(DESKTOP_TIME_STEP_MS);
        s.frame(1000.0, &mut host, |_| {});
        let mut total = 0;
        for i in 1..=60 {
            total += s
                .frame(1000.0 + i as f64 * DESKTOP_TIME_STEP_MS + 0.01, &mut host, |_| {})
                .updates;
        }
        assert_eq!(total, 60);
    }

    #[test]
    fn test_long_frame_is_capped() {
        let (mut s, mut host) = started();
        s.frame(0.0, &mut host, |_| {});
        let out = s.frame(10_000.0, &mut host, |_| {});
        assert_eq!(out.updates, MAX_UPDATES);
        assert!(out.alpha < 1.0);
    }

    #[test]
    fn test_alpha_reports_leftover() {
        let (mut s, mut host) = started();
        s.frame(0.0, &mut host, |_| {});
        let out = s.frame(STEP * 1.5, &mut host, |_| {});
        assert_eq!(out.updates, 1);
        assert!((out.alpha - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_update_receives_step() {
        let (mut s, mut host) = started();
        s.frame(0.0, &mut host, |_| {});
        let mut steps = Vec::new();
        s.frame(STEP * 2.0, &mut host, |dt| steps.push(dt));
        assert_eq!(steps, vec![STEP; 2]);
    }

    #[test]
    fn test_stop_cancels_pending_frame() {
        let (mut s, mut host) = started();
        s.frame(0.0, &mut host, |_| {});
        let pending = s.pending_frame();
        assert!(pending.is_some());
        s.stop(&mut host);
        assert_eq!(host.cancelled, vec![pending.unwrap()]);
        assert!(!s.is_running());
        // A stray callback after stop does nothing and schedules nothing
        let requested = host.requested.len();
        let out = s.frame(5000.0, &mut host, |_| panic!("must not update"));
        assert_eq!(out.updates, 0);
        assert_eq!(host.requested.len(), requested);
    }

    #[test]
    fn test_restart_does_not_catch_up() {
        let (mut s, mut host) = started();
        s.frame(0.0, &mut host, |_| {});
        s.stop(&mut host);
        s.start(&mut host);
        // Long pause: the first frame after restart only primes the clock
        assert_eq!(s.frame(60_000.0, &mut host, |_| {}).updates, 0);
        let out = s.frame(60_000.0 + STEP, &mut host, |_| {});
        assert_eq!(out.updates, 1);
    }

    proptest! {
        #[test]
        fn prop_updates_bounded(deltas in prop::collection::vec(0.0f64..2000.0, 1..50)) {
            let (mut s, mut host) = started();
            let mut now = 0.0;
            s.frame(now, &mut host, |_| {});
            for d in deltas {
                now += d;
                let out = s.frame(now, &mut host, |_| {});
                prop_assert!(out.updates <= MAX_UPDATES);
                prop_assert!(out.alpha >= 0.0 && out.alpha < 1.0);
            }
        }
    }
}
