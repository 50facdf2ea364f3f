//! Sphere Core - Real-time engine for the dual-sphere looper

pub mod audio;
pub mod config;
pub mod types;
pub mod effect;
pub mod engine;
pub mod loader;

pub use types::*;
