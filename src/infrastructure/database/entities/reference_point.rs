//! Reference point entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reference_points")]
pub struct Model {
	#[sea_orm(primary_key, auto_increment = false)]
	pub id: String,
	pub map_id: String,
	pub name: String,
	pub description: Option<String>,
	pub lat: f64,
	pub lng: f64,
	pub state: Option<String>,
	pub category: Option<String>,
	/// JSON array of alternate names
	pub aka_names: Option<String>,
	pub location_id: Option<String>,
	pub raw: Option<JsonValue>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
	#[sea_orm(
		belongs_to = "super::reference_map::Entity",
		from = "Column::MapId",
		to = "super::reference_map::Column::Id"
	)]
	Map,
}

impl Related<super::reference_map::Entity> for Entity {
	fn to() -> RelationDef {
		Relation::Map.def()
	}
}

impl ActiveModelBehavior for ActiveModel {}
