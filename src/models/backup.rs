//! Backup models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::RuleSection;

/// Who triggered a backup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackupKind {
    #[default]
    Manual,
    Auto,
}

impl BackupKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackupKind::Manual => "manual",
            BackupKind::Auto => "auto",
        }
    }
}

/// Persisted progress of a backup write.
///
/// The metadata row is written first as `MetadataWritten` and flipped to
/// `Completed` once the snapshot row exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackupStatus {
    MetadataWritten,
    Completed,
}

impl BackupStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackupStatus::MetadataWritten => "metadata_written",
            BackupStatus::Completed => "completed",
        }
    }
}

/// Backup metadata row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupMeta {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: BackupKind,
    pub status: BackupStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Request body for creating a backup.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBackupRequest {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: BackupKind,
    /// Snapshot to store; the live sections are captured when omitted.
    #[serde(default)]
    pub sections: Option<Vec<RuleSection>>,
}

/// Identifier of a newly written backup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupCreated {
    pub id: String,
}
