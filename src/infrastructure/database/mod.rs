//! Database infrastructure using SeaORM

use sea_orm::{ConnectOptions, ConnectionTrait, Database as SeaDatabase, DatabaseConnection, DbErr, Statement};
use sea_orm_migration::MigratorTrait;
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod entities;
pub mod migration;

const PRAGMAS: &[&str] = &[
	"PRAGMA journal_mode=WAL",
	"PRAGMA synchronous=NORMAL",
	"PRAGMA foreign_keys=ON",
	"PRAGMA temp_store=MEMORY",
	"PRAGMA cache_size=-20000",
];

/// Hot-path indices re-asserted on every startup. Historic databases that
/// predate an index (or lost one to a table rebuild) pick it up here.
const CRITICAL_INDICES: &[&str] = &[
	"CREATE UNIQUE INDEX IF NOT EXISTS idx_locations_short_id ON locations (short_id)",
	"CREATE INDEX IF NOT EXISTS idx_jobs_claim ON jobs (queue, status, priority)",
	"CREATE INDEX IF NOT EXISTS idx_jobs_locked ON jobs (status, locked_at)",
	"CREATE INDEX IF NOT EXISTS idx_images_location ON images (location_id)",
	"CREATE INDEX IF NOT EXISTS idx_videos_location ON videos (location_id)",
	"CREATE INDEX IF NOT EXISTS idx_documents_location ON documents (location_id)",
	"CREATE INDEX IF NOT EXISTS idx_maps_location ON maps (location_id)",
	"CREATE INDEX IF NOT EXISTS idx_sessions_resumable ON import_sessions (can_resume, status)",
];

/// Database wrapper: one SQLite file co-located with the archive root
#[derive(Debug, Clone)]
pub struct Database {
	conn: DatabaseConnection,
}

impl Database {
	/// Open the database at the given path, creating it when absent,
	/// then migrate and re-assert critical indices.
	pub async fn open(path: &Path) -> Result<Self, DbErr> {
		if let Some(parent) = path.parent() {
			std::fs::create_dir_all(parent)
				.map_err(|e| DbErr::Custom(format!("Failed to create directory: {e}")))?;
		}

		let db_url = format!("sqlite://{}?mode=rwc", path.display());

		let mut opt = ConnectOptions::new(db_url);
		opt.max_connections(10)
			.min_connections(1)
			.connect_timeout(Duration::from_secs(8))
			.idle_timeout(Duration::from_secs(8))
			.sqlx_logging(false);

		let conn = SeaDatabase::connect(opt).await?;

		for pragma in PRAGMAS {
			conn.execute(Statement::from_string(
				sea_orm::DatabaseBackend::Sqlite,
				*pragma,
			))
			.await?;
		}

		let db = Self { conn };
		db.migrate().await?;
		db.ensure_critical_indices().await?;

		info!("Opened database at {:?}", path);
		Ok(db)
	}

	/// Run pending migrations
	pub async fn migrate(&self) -> Result<(), DbErr> {
		migration::Migrator::up(&self.conn, None).await?;
		Ok(())
	}

	/// Recreate any missing hot-path index. Idempotent.
	pub async fn ensure_critical_indices(&self) -> Result<(), DbErr> {
		for ddl in CRITICAL_INDICES {
			self.conn
				.execute(Statement::from_string(
					sea_orm::DatabaseBackend::Sqlite,
					*ddl,
				))
				.await?;
		}
		Ok(())
	}

	/// Get the database connection
	pub fn conn(&self) -> &DatabaseConnection {
		&self.conn
	}
}
