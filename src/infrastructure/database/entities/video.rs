//! Video entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "videos")]
pub struct Model {
	#[sea_orm(primary_key, auto_increment = false)]
	pub fingerprint: String,
	pub original_filename: String,
	pub archive_filename: String,
	pub original_path: String,
	pub archive_path: String,
	pub location_id: String,
	pub sublocation_id: Option<String>,
	pub imported_by: String,
	pub imported_at: DateTimeUtc,
	pub size_bytes: i64,
	pub width: Option<i32>,
	pub height: Option<i32>,
	pub duration_secs: Option<f64>,
	pub codec: Option<String>,
	pub fps: Option<f64>,
	pub date_taken: Option<DateTimeUtc>,
	pub gps_lat: Option<f64>,
	pub gps_lng: Option<f64>,
	pub poster_path: Option<String>,
	pub proxy_path: Option<String>,
	pub hidden: bool,
	pub hidden_reason: Option<String>,
	pub live_photo: bool,
	pub contributed: bool,
	pub contribution_source: Option<String>,
	pub xmp_synced: bool,
	pub raw_metadata: Option<JsonValue>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
	#[sea_orm(
		belongs_to = "super::location::Entity",
		from = "Column::LocationId",
		to = "super::location::Column::Id"
	)]
	Location,
}

impl Related<super::location::Entity> for Entity {
	fn to() -> RelationDef {
		Relation::Location.def()
	}
}

impl ActiveModelBehavior for ActiveModel {}
