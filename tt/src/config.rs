//! Throttle configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Throttle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThrottleConfig {
    /// Whether the throttle dispatches at all
    #[serde(default = "default_active")]
    pub active: bool,

    /// Max dispatches per rate window
    #[serde(default = "default_rate")]
    pub rate: u32,

    /// Rate window duration in milliseconds
    #[serde(default = "default_rate_per_ms")]
    pub rate_per_ms: u64,

    /// Max tasks in flight at once
    #[serde(default = "default_concurrent")]
    pub concurrent: usize,
}

fn default_active() -> bool {
    true
}

fn default_rate() -> u32 {
    40
}

fn default_rate_per_ms() -> u64 {
    40_000
}

fn default_concurrent() -> usize {
    20
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            active: true,
            rate: 40,
            rate_per_ms: 40_000,
            concurrent: 20,
        }
    }
}

impl ThrottleConfig {
    /// Get the rate window as a Duration
    pub fn rate_per(&self) -> Duration {
        Duration::from_millis(self.rate_per_ms)
    }
}

/// Update applied to a live throttle: the whole config or a single field
#[derive(Debug, Clone)]
pub enum ConfigUpdate {
    Replace(ThrottleConfig),
    Active(bool),
    Rate(u32),
    RatePerMs(u64),
    Concurrent(usize),
}

impl ConfigUpdate {
    /// Apply this update to a config in place
    pub fn apply(&self, config: &mut ThrottleConfig) {
        match self {
            ConfigUpdate::Replace(new) => *config = new.clone(),
            ConfigUpdate::Active(active) => config.active = *active,
            ConfigUpdate::Rate(rate) => config.rate = *rate,
            ConfigUpdate::RatePerMs(ms) => config.rate_per_ms = *ms,
            ConfigUpdate::Concurrent(concurrent) => config.concurrent = *concurrent,
        }
    }
}
