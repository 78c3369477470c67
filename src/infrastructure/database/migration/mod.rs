//! Database migrations
//!
//! Forward-only and safe to re-run: every statement guards with
//! `if_not_exists`, and constraint changes rebuild the affected table.

use sea_orm_migration::prelude::*;

mod m20250601_000001_create_initial_tables;
mod m20250601_000002_create_job_queue;
mod m20250612_000001_create_reference_maps;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
	fn migrations() -> Vec<Box<dyn MigrationTrait>> {
		vec![
			Box::new(m20250601_000001_create_initial_tables::Migration),
			Box::new(m20250601_000002_create_job_queue::Migration),
			Box::new(m20250612_000001_create_reference_maps::Migration),
		]
	}
}
