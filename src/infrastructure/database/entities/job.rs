//! Job entity
//!
//! Timestamps are unix epoch milliseconds so the queue's claim and backoff
//! predicates compare as plain integers in SQL.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "jobs")]
pub struct Model {
	#[sea_orm(primary_key, auto_increment = false)]
	pub id: String,
	pub queue: String,
	pub priority: i32,
	pub status: String,
	pub payload: String,
	pub depends_on: Option<String>,
	pub attempts: i32,
	pub max_attempts: i32,
	pub error: Option<String>,
	pub last_error: Option<String>,
	pub result: Option<String>,
	pub retry_after: Option<i64>,
	pub locked_by: Option<String>,
	pub locked_at: Option<i64>,
	pub created_at: i64,
	pub started_at: Option<i64>,
	pub completed_at: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
