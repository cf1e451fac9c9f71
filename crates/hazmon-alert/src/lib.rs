//! Threshold rule engine for evaluating polled readings against stored
//! rules.
//!
//! The engine itself is pure: callers load the enabled rules from storage,
//! hand a `(metric, value, location)` observation to [`engine::evaluate`],
//! and receive every matching rule back. Each match produces its own alert;
//! rules carry no priority and are never ordered against each other.
//! Re-fire suppression for already-active alerts is a storage-side concern
//! driven by [`RefirePolicy`].

pub mod engine;


use serde::{Deserialize, Serialize};

/// What to do when a rule matches while an active alert for the same
/// rule+location pair already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RefirePolicy {
    /// Do not insert another row while one is still active (idempotent
    /// ticks). This is the default.
    #[default]
    SkipWhileActive,
    /// Insert a new alert row on every matching tick.
    AlwaysInsert,
}

impl std::str::FromStr for RefirePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "skip_while_active" => Ok(RefirePolicy::SkipWhileActive),
            "always_insert" => Ok(RefirePolicy::AlwaysInsert),
            _ => Err(format!("unknown refire policy: {s}")),
        }
    }
}
