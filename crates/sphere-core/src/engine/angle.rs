//! Angle normalization for raw encoder tick counts
//!
//! Tick counts are unbounded signed integers (accumulated rotation). They are
//! only folded into `[0, 360)` here, at the mapping step, and every axis of
//! every channel goes through [`normalize_angle`].
//!
//! Two policies exist because the axes treat negative rotation differently:
//!
//! - **Euclidean** (X axis): plain modular arithmetic, `-10` maps to `350`.
//! - **Antipodal** (Y axis): negative ticks map to `(|t| + 180) mod 360`, so
//!   rotating below zero continues onto the far side of the sphere instead of
//!   mirroring the near side. `-30` maps to `210`, not `330`.

/// Pseudo-degrees in one controller revolution
pub const DEGREES_PER_TURN: u32 = 360;

/// How negative tick counts are folded into `[0, 360)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapPolicy {
    Euclidean,
    Antipodal,
}

/// Fold a raw tick count into `[0, 360)`
#[inline]
pub fn normalize_angle(ticks: i64, policy: WrapPolicy) -> u32 {
    let turn = DEGREES_PER_TURN as u64;
    match policy {
        WrapPolicy::Euclidean => ticks.rem_euclid(turn as i64) as u32,
        WrapPolicy::Antipodal => {
            if ticks >= 0 {
                (ticks as u64 % turn) as u32
            } else {
                // unsigned_abs keeps i64::MIN well-defined
                ((ticks.unsigned_abs() % turn + turn / 2) % turn) as u32
            }
        }
    }
}

/// Wrap a fractional buffer position into `[0, len)`
#[inline]
pub fn wrap_position(position: f32, len: usize) -> f32 {
    let len_f = len as f32;
    let wrapped = position.rem_euclid(len_f);
    // rem_euclid can round up to exactly `len` for tiny negative inputs
    if wrapped >= len_f {
        0.0
    } else {
        wrapped
    }
}
