//! Output processing applied after the engine
//!
//! - [`PostFilter`]: fixed high-pass then low-pass per channel

mod filter;

pub use filter::*;
