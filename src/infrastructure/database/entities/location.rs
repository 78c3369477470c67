//! Location entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "locations")]
pub struct Model {
	#[sea_orm(primary_key, auto_increment = false)]
	pub id: String,
	#[sea_orm(unique)]
	pub short_id: String,
	pub name: String,
	pub short_name: String,
	pub state: Option<String>,
	pub loc_type: String,
	pub gps_lat: Option<f64>,
	pub gps_lng: Option<f64>,
	pub gps_accuracy: Option<f64>,
	pub gps_source: Option<String>,
	pub gps_verified: bool,
	pub address_street: Option<String>,
	pub address_city: Option<String>,
	pub address_county: Option<String>,
	pub address_state: Option<String>,
	pub address_zip: Option<String>,
	pub address_confidence: Option<String>,
	pub geocoded_at: Option<DateTimeUtc>,
	pub census_region: Option<String>,
	pub census_division: Option<String>,
	pub state_direction: Option<String>,
	pub cultural_region: Option<String>,
	pub hero_fingerprint: Option<String>,
	pub historic: bool,
	pub favorite: bool,
	pub host_only: bool,
	pub bag_status: String,
	pub bag_last_verified: Option<DateTimeUtc>,
	pub bag_last_error: Option<String>,
	pub image_count: i64,
	pub video_count: i64,
	pub document_count: i64,
	pub map_count: i64,
	pub total_bytes: i64,
	pub created_at: DateTimeUtc,
	pub updated_at: DateTimeUtc,
	pub status_changed_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
	#[sea_orm(has_many = "super::image::Entity")]
	Images,
	#[sea_orm(has_many = "super::video::Entity")]
	Videos,
	#[sea_orm(has_many = "super::document::Entity")]
	Documents,
	#[sea_orm(has_many = "super::map_file::Entity")]
	Maps,
	#[sea_orm(has_many = "super::sublocation::Entity")]
	Sublocations,
}

impl Related<super::image::Entity> for Entity {
	fn to() -> RelationDef {
		Relation::Images.def()
	}
}

impl Related<super::video::Entity> for Entity {
	fn to() -> RelationDef {
		Relation::Videos.def()
	}
}

impl Related<super::document::Entity> for Entity {
	fn to() -> RelationDef {
		Relation::Documents.def()
	}
}

impl Related<super::map_file::Entity> for Entity {
	fn to() -> RelationDef {
		Relation::Maps.def()
	}
}

impl Related<super::sublocation::Entity> for Entity {
	fn to() -> RelationDef {
		Relation::Sublocations.def()
	}
}

impl ActiveModelBehavior for ActiveModel {}
