//! The two background pollers, one per upstream feed.
//!
//! Both follow the same loop: read the interval setting from the store
//! (once per iteration, so changes apply on the next loop), sleep, then
//! run a single tick to completion. A tick never overlaps with the next
//! one, and a failed tick is logged and retried at the following interval
//! with no backoff.

pub mod seismic;
pub mod weather;

/// Floor applied to both poll intervals; settings below this are rejected
/// at the API boundary and clamped here as a second line of defense.
pub const MIN_FETCH_INTERVAL_SECS: u64 = 30;

/// Default seconds between weather ticks when the setting is absent.
pub const DEFAULT_WEATHER_INTERVAL_SECS: u64 = 300;

/// Default seconds between seismic ticks when the setting is absent.
pub const DEFAULT_EARTHQUAKE_INTERVAL_SECS: u64 = 60;
