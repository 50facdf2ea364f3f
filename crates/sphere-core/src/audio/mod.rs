//! Cross-platform audio backend for the looper
//!
//! # Architecture
//!
//! The audio system follows a lock-free design for real-time safety:
//!
//! - **Control thread**: sends commands via a lock-free ringbuffer
//! - **Output callback**: owns the `LooperEngine` exclusively, drains commands
//!   at block start and renders channel A left, channel B right
//! - **Input callback**: pushes live mono input into a second ringbuffer read
//!   by the output callback
//! - **Atomics**: the control thread reads channel state via relaxed atomics
//!
//! # Example Usage
//!
//! ```ignore
//! use sphere_core::audio::start_audio_system;
//!
//! let mut audio = start_audio_system(&config, engine)?;
//! audio.command_sender.send(EngineCommand::SetRecord(true))?;
//! let slot = audio.channel_atomics[0].active_slot();
//! ```

mod backend;
mod config;
mod cpal_backend;
mod device;
mod error;

pub use backend::{AudioSystemResult, CommandSender};
pub use config::{AudioConfig, BufferSize, DeviceId, DEFAULT_BUFFER_SIZE, MAX_BUFFER_SIZE};
pub use cpal_backend::{start_audio_system, AudioHandle};
pub use device::{default_device, find_device, list_devices, AudioDevice, DeviceDirection};
pub use error::{AudioError, AudioResult};
