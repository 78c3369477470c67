//! Durable key-value settings

use super::Library;
use crate::error::CoreResult;
use crate::infrastructure::database::entities::setting;
use sea_orm::{sea_query::OnConflict, ActiveValue::Set, EntityTrait};

/// Persisted scan throughput, the ETA baseline for the next run
pub const SCAN_BYTES_PER_SEC: &str = "scan_bytes_per_sec";

impl Library {
    pub async fn get_setting(&self, key: &str) -> CoreResult<Option<String>> {
        Ok(setting::Entity::find_by_id(key)
            .one(self.conn())
            .await?
            .map(|m| m.value))
    }

    pub async fn set_setting(&self, key: &str, value: &str) -> CoreResult<()> {
        let model = setting::ActiveModel {
            key: Set(key.to_string()),
            value: Set(value.to_string()),
        };
        setting::Entity::insert(model)
            .on_conflict(
                OnConflict::column(setting::Column::Key)
                    .update_column(setting::Column::Value)
                    .to_owned(),
            )
            .exec_without_returning(self.conn())
            .await?;
        Ok(())
    }

    pub async fn get_setting_f64(&self, key: &str) -> CoreResult<Option<f64>> {
        Ok(self.get_setting(key).await?.and_then(|v| v.parse().ok()))
    }
}
