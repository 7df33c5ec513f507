//! Log entry types for activity tracking

use super::ids::ActivityEntryId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A log entry recording one committed mutation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEntry {
    /// Unique ID for this log entry
    pub id: ActivityEntryId,

    /// When the operation occurred
    pub timestamp: DateTime<Utc>,

    /// Canonical op string (e.g., "create collection")
    pub op: String,

    /// The normalized input parameters
    pub input: Value,

    /// The committed result
    pub output: Value,

    /// Who performed the operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,

    /// How long the operation took
    pub duration_ms: u64,
}

impl ActivityEntry {
    /// Create a new log entry
    pub fn new(op: impl Into<String>, input: Value, output: Value, duration_ms: u64) -> Self {
        Self {
            id: ActivityEntryId::new(),
            timestamp: Utc::now(),
            op: op.into(),
            input,
            output,
            actor: None,
            duration_ms,
        }
    }

    /// Set the actor
    pub fn with_actor(mut self, actor: Option<String>) -> Self {
        self.actor = actor;
        self
    }
}
