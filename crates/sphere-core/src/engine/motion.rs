//! Motion tracking on the coarse poll cadence
//!
//! Encoder resolution is far too low for per-sample or per-block velocity:
//! a slowly turned sphere produces a tick every few blocks. The tracker
//! therefore keeps absolute tick counts that update whenever the decoder
//! reports motion, and only differentiates them once per poll window of
//! `poll_frames` audio frames, counted with a rolling frame counter.

use crate::types::Axis;

/// Sign of the most recent X delta
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Still,
    Forward,
    Reverse,
}

impl Direction {
    fn of(delta: i64) -> Self {
        match delta.signum() {
            1 => Direction::Forward,
            -1 => Direction::Reverse,
            _ => Direction::Still,
        }
    }
}

/// Motion summary produced when a poll window closes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollWindow {
    pub x_delta: i64,
    pub y_delta: i64,
    /// X tick count at the poll (the new baseline)
    pub now_x: i64,
    pub now_y: i64,
}

impl PollWindow {
    #[inline]
    pub fn direction(&self) -> Direction {
        Direction::of(self.x_delta)
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.x_delta != 0
    }
}

/// Per-channel two-axis tick accumulator
#[derive(Debug, Clone)]
pub struct MotionTracker {
    now_x: i64,
    now_y: i64,
    last_x: i64,
    last_y: i64,
    x_delta: i64,
    y_delta: i64,
    frames_since_poll: u32,
    poll_frames: u32,
    polls: u64,
}

impl MotionTracker {
    pub fn new(poll_frames: u32) -> Self {
        Self {
            now_x: 0,
            now_y: 0,
            last_x: 0,
            last_y: 0,
            x_delta: 0,
            y_delta: 0,
            frames_since_poll: 0,
            poll_frames: poll_frames.max(1),
            polls: 0,
        }
    }

    /// Accumulate a relative tick delta reported by the decoder
    #[inline]
    pub fn apply_delta(&mut self, axis: Axis, delta: i64) {
        match axis {
            Axis::X => self.now_x = self.now_x.wrapping_add(delta),
            Axis::Y => self.now_y = self.now_y.wrapping_add(delta),
        }
    }

    /// Overwrite the absolute tick count (decoders that report position)
    #[inline]
    pub fn set_position(&mut self, axis: Axis, ticks: i64) {
        match axis {
            Axis::X => self.now_x = ticks,
            Axis::Y => self.now_y = ticks,
        }
    }

    /// Count one audio frame; returns the window summary when it closes
    #[inline]
    pub fn advance_frame(&mut self) -> Option<PollWindow> {
        self.frames_since_poll += 1;
        if self.frames_since_poll < self.poll_frames {
            return None;
        }

        self.frames_since_poll = 0;
        self.polls += 1;
        self.x_delta = self.now_x.wrapping_sub(self.last_x);
        self.y_delta = self.now_y.wrapping_sub(self.last_y);
        self.last_x = self.now_x;
        self.last_y = self.now_y;

        Some(PollWindow {
            x_delta: self.x_delta,
            y_delta: self.y_delta,
            now_x: self.now_x,
            now_y: self.now_y,
        })
    }

    /// Progress through the current window, in `[0, 1)`
    #[inline]
    pub fn blend(&self) -> f32 {
        self.frames_since_poll as f32 / self.poll_frames as f32
    }

    #[inline]
    pub fn now(&self, axis: Axis) -> i64 {
        match axis {
            Axis::X => self.now_x,
            Axis::Y => self.now_y,
        }
    }

    /// Tick count captured at the previous poll
    #[inline]
    pub fn last(&self, axis: Axis) -> i64 {
        match axis {
            Axis::X => self.last_x,
            Axis::Y => self.last_y,
        }
    }

    #[inline]
    pub fn x_delta(&self) -> i64 {
        self.x_delta
    }

    #[inline]
    pub fn y_delta(&self) -> i64 {
        self.y_delta
    }

    #[inline]
    pub fn direction(&self) -> Direction {
        Direction::of(self.x_delta)
    }

    /// False while the sphere was stationary over the last window
    #[inline]
    pub fn is_active(&self) -> bool {
        self.x_delta != 0
    }

    #[inline]
    pub fn frames_since_poll(&self) -> u32 {
        self.frames_since_poll
    }

    #[inline]
    pub fn poll_frames(&self) -> u32 {
        self.poll_frames
    }

    /// Number of windows closed since construction
    pub fn polls(&self) -> u64 {
        self.polls
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_once_per_window() {
        let mut tracker = MotionTracker::new(4);
        let windows: Vec<_> = (0..12).map(|_| tracker.advance_frame()).collect();
        let closed: Vec<usize> = windows
            .iter()
            .enumerate()
            .filter_map(|(i, w)| w.map(|_| i))
            .collect();
        assert_eq!(closed, vec![3, 7, 11]);
        assert_eq!(tracker.polls(), 3);
    }

    #[test]
    fn test_deltas_and_rebaseline() {
        let mut tracker = MotionTracker::new(2);
        tracker.apply_delta(Axis::X, 3);
        tracker.apply_delta(Axis::X, 2);
        tracker.apply_delta(Axis::Y, -7);
        assert_eq!(tracker.advance_frame(), None);
        let window = tracker.advance_frame().unwrap();
        assert_eq!(window.x_delta, 5);
        assert_eq!(window.y_delta, -7);
        assert_eq!(window.direction(), Direction::Forward);
        assert_eq!(tracker.last(Axis::X), 5);
        assert_eq!(tracker.last(Axis::Y), -7);

        // No motion during the next window
        tracker.advance_frame();
        let window = tracker.advance_frame().unwrap();
        assert_eq!(window.x_delta, 0);
        assert!(!window.is_active());
        assert_eq!(tracker.direction(), Direction::Still);
    }

    #[test]
    fn test_reverse_direction() {
        let mut tracker = MotionTracker::new(1);
        tracker.set_position(Axis::X, -50);
        let window = tracker.advance_frame().unwrap();
        assert_eq!(window.x_delta, -50);
        assert_eq!(window.direction(), Direction::Reverse);
        assert!(tracker.is_active());
    }

    #[test]
    fn test_blend_ramps_across_window() {
        let mut tracker = MotionTracker::new(4);
        assert_eq!(tracker.blend(), 0.0);
        tracker.advance_frame();
        assert_eq!(tracker.blend(), 0.25);
        tracker.advance_frame();
        tracker.advance_frame();
        assert_eq!(tracker.blend(), 0.75);
        tracker.advance_frame();
        assert_eq!(tracker.blend(), 0.0);
    }

    #[test]
    fn test_zero_poll_frames_clamped() {
        let mut tracker = MotionTracker::new(0);
        assert_eq!(tracker.poll_frames(), 1);
        assert!(tracker.advance_frame().is_some());
    }
}
