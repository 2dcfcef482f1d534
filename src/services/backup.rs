//! Backup snapshots.
//!
//! A backup is written in two phases: the metadata row goes in first with
//! status `metadata_written`, then the snapshot row, then the status flips to
//! `completed`. A failure between the phases leaves the metadata row behind;
//! nothing is rolled back. [`BackupApi::sweep_incomplete`] removes those rows
//! once they are old enough.

use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::errors::AppError;
use crate::mapper;
use crate::models::{BackupCreated, BackupKind, BackupMeta, BackupStatus, RuleSection};
use crate::store::{Filter, Order, RecordStore, Select, Table};

#[derive(Clone)]
pub struct BackupApi {
    store: Arc<dyn RecordStore>,
}

impl BackupApi {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Store a snapshot of `sections` under a new backup id.
    pub async fn create_backup(
        &self,
        name: &str,
        kind: BackupKind,
        sections: &[RuleSection],
    ) -> Result<BackupCreated, AppError> {
        let id = uuid::Uuid::new_v4().to_string();

        self.store
            .insert(
                Table::BackupMeta,
                mapper::backup_meta_row(&id, name, kind, BackupStatus::MetadataWritten),
            )
            .await?;

        let data = mapper::backup_data_row(&id, sections)?;
        if let Err(err) = self.store.insert(Table::BackupData, data).await {
            tracing::warn!(backup_id = %id, "Backup data write failed; metadata left incomplete");
            return Err(err.into());
        }

        self.store
            .update(
                Table::BackupMeta,
                &id,
                mapper::backup_status_row(BackupStatus::Completed),
            )
            .await?;

        tracing::info!(backup_id = %id, kind = kind.as_str(), sections = sections.len(), "Created backup");
        Ok(BackupCreated { id })
    }

    /// All backup metadata, newest first.
    pub async fn list_backups(&self) -> Result<Vec<BackupMeta>, AppError> {
        let rows = self
            .store
            .select(&Select::all(Table::BackupMeta).order(Order::desc("created_at")))
            .await?;
        let backups = rows
            .into_iter()
            .map(mapper::backup_meta_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(backups)
    }

    /// The snapshot stored for backup `id`.
    pub async fn fetch_backup_data(&self, id: &str) -> Result<Vec<RuleSection>, AppError> {
        let rows = self
            .store
            .select(&Select::all(Table::BackupData).filter(Filter::eq("backup_id", id)))
            .await?;

        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound(format!("Backup {} not found", id)))?;
        Ok(mapper::backup_data_from_row(row)?.data)
    }

    /// Delete backups stuck in `metadata_written` for longer than `older_than`,
    /// along with any partial snapshot rows. Returns how many were removed.
    ///
    /// An age reaching past the representable calendar is a `BadRequest`.
    pub async fn sweep_incomplete(&self, older_than: Duration) -> Result<usize, AppError> {
        let cutoff = Utc::now()
            .checked_sub_signed(older_than)
            .ok_or_else(|| AppError::BadRequest("Sweep age is out of range".to_string()))?;
        let rows = self
            .store
            .select(&Select::all(Table::BackupMeta).filter(Filter::eq(
                "status",
                BackupStatus::MetadataWritten.as_str(),
            )))
            .await?;

        let mut removed = 0;
        for row in rows {
            let meta = mapper::backup_meta_from_row(row)?;
            if meta.created_at.is_some_and(|created| created > cutoff) {
                continue;
            }

            self.store
                .delete(Table::BackupData, &Filter::eq("backup_id", meta.id.as_str()))
                .await?;
            self.store
                .delete(Table::BackupMeta, &Filter::eq("id", meta.id.as_str()))
                .await?;
            removed += 1;
        }

        if removed > 0 {
            tracing::info!(removed, "Swept incomplete backups");
        }
        Ok(removed)
    }
}
