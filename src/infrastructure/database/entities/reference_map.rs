//! Reference map entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reference_maps")]
pub struct Model {
	#[sea_orm(primary_key, auto_increment = false)]
	pub id: String,
	pub file_path: String,
	pub kind: String,
	pub name: String,
	pub point_count: i64,
	pub imported_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
	#[sea_orm(has_many = "super::reference_point::Entity")]
	Points,
}

impl Related<super::reference_point::Entity> for Entity {
	fn to() -> RelationDef {
		Relation::Points.def()
	}
}

impl ActiveModelBehavior for ActiveModel {}
