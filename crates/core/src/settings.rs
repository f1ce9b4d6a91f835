//! The singleton daily-batch settings record.

use serde::{Deserialize, Serialize};

/// Default number of ideas per batch run.
pub const DEFAULT_BATCH_SIZE: u32 = 5;

/// Configuration for the daily batch run. Exactly one record exists in
/// the store at any time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSettings {
    /// Opaque storage record id.
    pub record_id: String,
    /// Gate: when false the orchestrator short-circuits without running.
    pub batch_enabled: bool,
    /// Target number of ideas per run.
    pub batch_size: u32,
    /// Next scheduled run, managed by external scheduling automation.
    pub next_batch_time: Option<String>,
    pub email_notifications: bool,
    /// One or more notification recipients.
    pub notification_emails: Vec<String>,
    /// Set to true by the orchestrator after a fully-successful run so
    /// external scheduling can detect completion. A partial run leaves
    /// it untouched.
    pub batch_complete: Option<bool>,
}

/// Sparse update for the settings record.
///
/// The record is last-write-wins with no version check; sparse patches
/// keep concurrent writers from clobbering each other's fields. The
/// orchestrator only ever sets `batch_complete`.
#[derive(Debug, Clone, Default)]
pub struct SettingsPatch {
    pub batch_enabled: Option<bool>,
    pub batch_size: Option<u32>,
    pub next_batch_time: Option<String>,
    pub email_notifications: Option<bool>,
    pub notification_emails: Option<Vec<String>>,
    pub batch_complete: Option<bool>,
}

impl SettingsPatch {
    /// Patch that marks the batch run complete.
    pub fn complete() -> Self {
        Self {
            batch_complete: Some(true),
            ..Self::default()
        }
    }
}
