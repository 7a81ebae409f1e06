//! Stage tunables
//!
//! Embedding applications deserialize this as part of their own
//! configuration; the stage itself never touches the filesystem.

use serde::{Deserialize, Serialize};

use crate::interaction::DEFAULT_INTERACTION_CAPACITY;
use crate::monitor::DEFAULT_MONITOR_CAPACITY;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    /// Monitor events buffered per subscriber before the publisher drops
    pub monitor_capacity: usize,
    /// Pointer events buffered between render ticks
    pub interaction_capacity: usize,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            monitor_capacity: DEFAULT_MONITOR_CAPACITY,
            interaction_capacity: DEFAULT_INTERACTION_CAPACITY,
        }
    }
}
