//! List behavior configuration.
//!
//! # Responsibility
//! - Name every tunable used by the list engine in one place.
//! - Load overrides from JSON with per-field defaults.
//!
//! # Invariants
//! - `page_size` is always within `1..=MAX_PAGE_SIZE` after normalization.
//! - Priority direction is explicit, never inferred from form defaults.

use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;
pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 60_000;
pub const DEFAULT_NOTIFY_DURATION_MS: u64 = 3_000;

/// Which end of the priority scale is treated as more urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityOrder {
    /// `1` outranks `3`.
    LowerIsUrgent,
    /// `3` outranks `1`.
    HigherIsUrgent,
}

/// Direction used when no configuration overrides it.
pub const DEFAULT_PRIORITY_ORDER: PriorityOrder = PriorityOrder::LowerIsUrgent;

impl PriorityOrder {
    /// Sort key where smaller means more urgent.
    pub fn urgency_key(self, priority: i32) -> i64 {
        match self {
            Self::LowerIsUrgent => i64::from(priority),
            Self::HigherIsUrgent => -i64::from(priority),
        }
    }

    /// Coarse urgency label, matched by the list filter.
    pub fn label(self, priority: i32) -> &'static str {
        let urgency = match self {
            Self::LowerIsUrgent => i64::from(priority),
            Self::HigherIsUrgent => 4 - i64::from(priority),
        };
        match urgency {
            i64::MIN..=1 => "High",
            2 => "Medium",
            _ => "Low",
        }
    }
}

impl Default for PriorityOrder {
    fn default() -> Self {
        DEFAULT_PRIORITY_ORDER
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read config: {err}"),
            Self::Parse(err) => write!(f, "invalid config json: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
        }
    }
}

/// Tunables for one task list view.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ListConfig {
    pub page_size: u32,
    pub priority_order: PriorityOrder,
    pub refresh_interval_ms: u64,
    pub notify_duration_ms: u64,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            priority_order: DEFAULT_PRIORITY_ORDER,
            refresh_interval_ms: DEFAULT_REFRESH_INTERVAL_MS,
            notify_duration_ms: DEFAULT_NOTIFY_DURATION_MS,
        }
    }
}

impl ListConfig {
    /// Parses JSON overrides; missing fields keep their defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let parsed: Self = serde_json::from_str(raw).map_err(ConfigError::Parse)?;
        Ok(parsed.normalized())
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_json_str(&raw)
    }

    /// Clamps out-of-range values instead of rejecting them.
    pub fn normalized(mut self) -> Self {
        self.page_size = normalize_page_size(self.page_size);
        if self.refresh_interval_ms == 0 {
            self.refresh_interval_ms = DEFAULT_REFRESH_INTERVAL_MS;
        }
        self
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }
}

pub fn normalize_page_size(page_size: u32) -> u32 {
    match page_size {
        0 => DEFAULT_PAGE_SIZE,
        value if value > MAX_PAGE_SIZE => MAX_PAGE_SIZE,
        value => value,
    }
}
