//! Activity log for identity workflows.
//!
//! A user-facing record of every connect, submission and verification step,
//! kept newest first. Independent from `tracing` output.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// What part of the workflow produced an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityCategory {
    Wallet,
    Gateway,
    Validation,
    Encryption,
    Transaction,
    Success,
    AccessCheck,
    Decryption,
    Error,
}

impl ActivityCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wallet => "Wallet",
            Self::Gateway => "Gateway",
            Self::Validation => "Validation",
            Self::Encryption => "Encryption",
            Self::Transaction => "Transaction",
            Self::Success => "Success",
            Self::AccessCheck => "Access Check",
            Self::Decryption => "Decryption",
            Self::Error => "Error",
        }
    }
}

impl fmt::Display for ActivityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome attached to an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityStatus {
    Success,
    Pending,
    Error,
}

/// An entry in the activity log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEntry {
    /// Unique entry ID
    pub id: String,
    /// Insertion order, starting at 0
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub category: ActivityCategory,
    pub detail: String,
    pub status: ActivityStatus,
}

impl ActivityEntry {
    /// Wall-clock time as `HH:MM:SS`.
    pub fn display_time(&self) -> String {
        self.timestamp.format("%H:%M:%S").to_string()
    }
}

impl fmt::Display for ActivityEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.display_time(), self.category, self.detail)
    }
}

#[derive(Debug, Default)]
struct LogState {
    entries: VecDeque<ActivityEntry>,
    next_sequence: u64,
}

/// Append-only activity log (newest first).
#[derive(Debug, Clone, Default)]
pub struct ActivityLog {
    state: Arc<RwLock<LogState>>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an event. Returns the entry ID.
    pub async fn append(
        &self,
        category: ActivityCategory,
        detail: impl Into<String>,
        status: ActivityStatus,
    ) -> String {
        let detail = detail.into();
        debug!(category = category.as_str(), ?status, detail = %detail, "Activity");

        let mut state = self.state.write().await;
        let entry = ActivityEntry {
            id: uuid::Uuid::new_v4().to_string(),
            sequence: state.next_sequence,
            timestamp: Utc::now(),
            category,
            detail,
            status,
        };
        state.next_sequence += 1;

        let id = entry.id.clone();
        state.entries.push_front(entry);
        id
    }

    /// All entries, newest first.
    pub async fn entries(&self) -> Vec<ActivityEntry> {
        let state = self.state.read().await;
        state.entries.iter().cloned().collect()
    }

    /// Most recent entries.
    pub async fn recent(&self, limit: usize) -> Vec<ActivityEntry> {
        let state = self.state.read().await;
        state.entries.iter().take(limit).cloned().collect()
    }

    pub async fn latest(&self) -> Option<ActivityEntry> {
        let state = self.state.read().await;
        state.entries.front().cloned()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.entries.is_empty()
    }
}
