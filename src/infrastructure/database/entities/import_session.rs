//! Import session entity
//!
//! One row per orchestrator invocation. The per-stage JSON blobs are what
//! make a session resumable after a crash or failure.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "import_sessions")]
pub struct Model {
	#[sea_orm(primary_key, auto_increment = false)]
	pub id: String,
	pub location_id: String,
	pub status: String,
	/// JSON array of operator-supplied source paths
	pub source_paths: String,
	pub copy_strategy: Option<String>,
	pub total_files: i64,
	pub total_bytes: i64,
	pub files_copied: i64,
	pub duplicates: i64,
	pub errors: i64,
	/// Last completed stage index, 0..5
	pub last_step: i32,
	pub scan_result: Option<String>,
	pub hash_result: Option<String>,
	pub copy_result: Option<String>,
	pub validate_result: Option<String>,
	pub error: Option<String>,
	pub can_resume: bool,
	pub started_at: DateTimeUtc,
	pub updated_at: DateTimeUtc,
	pub finished_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
