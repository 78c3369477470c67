//! Import summary entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "imports")]
pub struct Model {
	#[sea_orm(primary_key, auto_increment = false)]
	pub id: String,
	pub session_id: String,
	pub location_id: String,
	pub imported_by: String,
	pub image_count: i64,
	pub video_count: i64,
	pub document_count: i64,
	pub map_count: i64,
	pub bytes: i64,
	pub duplicates: i64,
	pub errors: i64,
	pub copy_strategy: String,
	pub finished_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
