//! Dead-letter entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "job_dead_letter")]
pub struct Model {
	#[sea_orm(primary_key)]
	pub id: i32,
	pub job_id: String,
	pub queue: String,
	pub payload: String,
	pub error: String,
	pub attempts: i32,
	pub failed_at: i64,
	pub acknowledged: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
