//! Import session store
//!
//! Sessions are checkpointed after every stage so an interrupted ingest can
//! resume without redoing hash or copy work.

use super::Library;
use crate::error::{CoreError, CoreResult};
use crate::infrastructure::database::entities::import_session;
use crate::ingest::types::SessionStatus;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter};
use std::path::PathBuf;
use uuid::Uuid;

impl Library {
    pub async fn create_session(
        &self,
        location_id: &Uuid,
        source_paths: &[PathBuf],
    ) -> CoreResult<import_session::Model> {
        let now = Utc::now();
        let model = import_session::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            location_id: Set(location_id.to_string()),
            status: Set(SessionStatus::Pending.to_string()),
            source_paths: Set(serde_json::to_string(source_paths)?),
            copy_strategy: Set(None),
            total_files: Set(0),
            total_bytes: Set(0),
            files_copied: Set(0),
            duplicates: Set(0),
            errors: Set(0),
            last_step: Set(0),
            scan_result: Set(None),
            hash_result: Set(None),
            copy_result: Set(None),
            validate_result: Set(None),
            error: Set(None),
            can_resume: Set(true),
            started_at: Set(now),
            updated_at: Set(now),
            finished_at: Set(None),
        };
        Ok(model.insert(self.conn()).await?)
    }

    pub async fn get_session(&self, id: &str) -> CoreResult<Option<import_session::Model>> {
        Ok(import_session::Entity::find_by_id(id).one(self.conn()).await?)
    }

    pub async fn require_session(&self, id: &str) -> CoreResult<import_session::Model> {
        self.get_session(id)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("session {id}")))
    }

    /// Transition the session's state machine. Terminal states stamp
    /// `finished_at`; completed and cancelled sessions stop being resumable.
    pub async fn set_session_status(
        &self,
        id: &str,
        status: SessionStatus,
        error: Option<String>,
    ) -> CoreResult<()> {
        let mut model = import_session::ActiveModel {
            id: Set(id.to_string()),
            status: Set(status.to_string()),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };
        if let Some(error) = error {
            model.error = Set(Some(error));
        }
        if status.is_terminal() {
            model.finished_at = Set(Some(Utc::now()));
        }
        if matches!(status, SessionStatus::Completed | SessionStatus::Cancelled) {
            model.can_resume = Set(false);
        }
        model.update(self.conn()).await?;
        Ok(())
    }

    pub async fn set_session_strategy(&self, id: &str, strategy: &str) -> CoreResult<()> {
        import_session::ActiveModel {
            id: Set(id.to_string()),
            copy_strategy: Set(Some(strategy.to_string())),
            updated_at: Set(Utc::now()),
            ..Default::default()
        }
        .update(self.conn())
        .await?;
        Ok(())
    }

    /// Persist a completed stage's result blob and advance the checkpoint.
    /// `step` is the stage index (1 = scan .. 5 = finalize); stages 1-4
    /// carry blobs, finalize only advances the index.
    pub async fn save_stage_result(
        &self,
        id: &str,
        step: i32,
        blob: Option<String>,
    ) -> CoreResult<()> {
        let mut model = import_session::ActiveModel {
            id: Set(id.to_string()),
            last_step: Set(step),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };
        match step {
            1 => model.scan_result = Set(blob),
            2 => model.hash_result = Set(blob),
            3 => model.copy_result = Set(blob),
            4 => model.validate_result = Set(blob),
            5 => {}
            _ => return Err(CoreError::invalid_state(format!("stage index {step}"))),
        }
        model.update(self.conn()).await?;
        Ok(())
    }

    pub async fn set_session_totals(
        &self,
        id: &str,
        total_files: i64,
        total_bytes: i64,
    ) -> CoreResult<()> {
        import_session::ActiveModel {
            id: Set(id.to_string()),
            total_files: Set(total_files),
            total_bytes: Set(total_bytes),
            updated_at: Set(Utc::now()),
            ..Default::default()
        }
        .update(self.conn())
        .await?;
        Ok(())
    }

    pub async fn set_session_counters(
        &self,
        id: &str,
        files_copied: i64,
        duplicates: i64,
        errors: i64,
    ) -> CoreResult<()> {
        import_session::ActiveModel {
            id: Set(id.to_string()),
            files_copied: Set(files_copied),
            duplicates: Set(duplicates),
            errors: Set(errors),
            updated_at: Set(Utc::now()),
            ..Default::default()
        }
        .update(self.conn())
        .await?;
        Ok(())
    }

    /// Sessions that can pick up where they left off
    pub async fn list_resumable(&self) -> CoreResult<Vec<import_session::Model>> {
        Ok(import_session::Entity::find()
            .filter(import_session::Column::CanResume.eq(true))
            .filter(
                import_session::Column::Status.is_not_in([
                    SessionStatus::Completed.to_string(),
                    SessionStatus::Cancelled.to_string(),
                ]),
            )
            .all(self.conn())
            .await?)
    }
}
