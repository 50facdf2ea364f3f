//! Looper engine - addressing, record/playback, channel state
//!
//! This module contains the real-time core of the looper:
//! - Angle normalization and spherical address mapping
//! - BufferBank: slots × bands of circular sample buffers
//! - Motion tracking on the coarse poll cadence
//! - Recorder and player for one channel engine
//! - LooperEngine: both channels, the track switcher and the command queue

pub mod address;
pub mod angle;
mod atomics;
mod bank;
mod capture;
mod channel;
mod command;
mod looper;
mod motion;
pub mod player;
pub mod recorder;
mod switcher;

pub use address::{crossfade_weights, AddressMapper, BandAddress, WriteInterval};
pub use angle::{normalize_angle, wrap_position, WrapPolicy, DEGREES_PER_TURN};
pub use atomics::{ChannelAtomics, EngineStats, StatsSnapshot};
pub use bank::{BankBuilder, BankError, BankShape, BufferBank};
pub use capture::CaptureQueue;
pub use channel::ChannelState;
pub use command::{command_channel, EngineCommand, COMMAND_QUEUE_CAPACITY};
pub use looper::LooperEngine;
pub use motion::{Direction, MotionTracker, PollWindow};
pub use recorder::{commit_window, CommitOutcome};
