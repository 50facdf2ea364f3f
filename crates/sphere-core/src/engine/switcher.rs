//! Track switcher: rising-edge slot advance
//!
//! A rising edge of the track-switch level advances channel B one slot. When
//! record-enable is held at the same moment, channel A advances too.
//!
//! Levels only change at block boundaries, so a press and release that
//! arrive within one block would cancel out. [`TrackSwitcher::latch_press`]
//! records the press so the next frame treats it as an edge.

use crate::types::{ChannelId, NUM_CHANNELS};

/// Which channels moved on this frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SwitchEvent {
    pub advanced: [bool; NUM_CHANNELS],
}

impl SwitchEvent {
    pub fn any(&self) -> bool {
        self.advanced.iter().any(|a| *a)
    }

    pub fn advanced(&self, channel: ChannelId) -> bool {
        self.advanced[channel.index()]
    }
}

#[derive(Debug, Clone, Default)]
pub struct TrackSwitcher {
    previous: bool,
    latched: bool,
}

impl TrackSwitcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a press on the next [`update`](Self::update) even if the level
    /// has dropped again by then
    pub fn latch_press(&mut self) {
        self.latched = true;
    }

    pub fn has_latched_press(&self) -> bool {
        self.latched
    }

    /// Feed one frame's levels; advances `slots` in place on a rising edge
    #[inline]
    pub fn update(
        &mut self,
        track_switch: bool,
        record: bool,
        slots: &mut [usize; NUM_CHANNELS],
        slot_count: usize,
    ) -> SwitchEvent {
        let rising = (track_switch && !self.previous) || self.latched;
        self.previous = track_switch;
        self.latched = false;

        let mut event = SwitchEvent::default();
        if !rising || slot_count == 0 {
            return event;
        }

        let mut advance = |channel: ChannelId| {
            let slot = &mut slots[channel.index()];
            *slot = (*slot + 1) % slot_count;
            event.advanced[channel.index()] = true;
        };
        advance(ChannelId::B);
        if record {
            advance(ChannelId::A);
        }
        event
    }

    /// Level seen on the previous frame
    pub fn previous_level(&self) -> bool {
        self.previous
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_rising_edge_advances() {
        let mut switcher = TrackSwitcher::new();
        let mut slots = [0, 0];
        let levels = [false, true, true, true, false, true];
        let advanced: Vec<bool> = levels
            .iter()
            .map(|level| switcher.update(*level, false, &mut slots, 10).any())
            .collect();
        assert_eq!(advanced, vec![false, true, false, false, false, true]);
        assert_eq!(slots, [0, 2]);
    }

    #[test]
    fn test_record_held_advances_both() {
        let mut switcher = TrackSwitcher::new();
        let mut slots = [3, 7];
        let event = switcher.update(true, true, &mut slots, 10);
        assert!(event.advanced(ChannelId::A));
        assert!(event.advanced(ChannelId::B));
        assert_eq!(slots, [4, 8]);
    }

    #[test]
    fn test_slot_wraps() {
        let mut switcher = TrackSwitcher::new();
        let mut slots = [0, 9];
        switcher.update(true, false, &mut slots, 10);
        assert_eq!(slots, [0, 0]);
    }

    #[test]
    fn test_latched_press_advances_once() {
        let mut switcher = TrackSwitcher::new();
        let mut slots = [0, 0];

        // Pressed and released before the frame ran
        switcher.latch_press();
        assert!(switcher.update(false, false, &mut slots, 4).advanced(ChannelId::B));
        assert!(!switcher.has_latched_press());
        assert!(!switcher.update(false, false, &mut slots, 4).any());
        assert_eq!(slots, [0, 1]);

        // Latch plus a rising level is still one edge
        switcher.latch_press();
        assert!(switcher.update(true, true, &mut slots, 4).any());
        assert!(!switcher.update(true, true, &mut slots, 4).any());
        assert_eq!(slots, [1, 2]);

        // Released and pressed again while held across blocks
        switcher.latch_press();
        assert!(switcher.update(true, false, &mut slots, 4).any());
        assert_eq!(slots, [1, 3]);
    }
}
