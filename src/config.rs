//! Process-wide engine settings.
//!
//! The only setting is the "coerce null and empty to zero" mode. It is read
//! on every coercion, never cached: an explicit override wins, otherwise the
//! `ELEXPR_COERCE_TO_ZERO` environment variable decides.

use std::env;
use std::sync::atomic::{AtomicU8, Ordering};

/// Environment variable consulted when no override is set
pub const COERCE_TO_ZERO_VAR: &str = "ELEXPR_COERCE_TO_ZERO";

const UNSET: u8 = 0;
const OFF: u8 = 1;
const ON: u8 = 2;

static COERCE_TO_ZERO: AtomicU8 = AtomicU8::new(UNSET);

/// Whether `null` and `""` coerce to zero-like values for nullable targets.
pub fn coerce_to_zero() -> bool {
    match COERCE_TO_ZERO.load(Ordering::Relaxed) {
        OFF => false,
        ON => true,
        _ => env::var(COERCE_TO_ZERO_VAR)
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false),
    }
}

/// Override the mode for the whole process; `None` falls back to the
/// environment again.
pub fn set_coerce_to_zero(mode: Option<bool>) {
    let raw = match mode {
        None => UNSET,
        Some(false) => OFF,
        Some(true) => ON,
    };
    COERCE_TO_ZERO.store(raw, Ordering::Relaxed);
}
