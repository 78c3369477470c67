use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
	async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
		manager
			.create_table(
				Table::create()
					.table(Jobs::Table)
					.if_not_exists()
					.col(ColumnDef::new(Jobs::Id).string().not_null().primary_key())
					.col(ColumnDef::new(Jobs::Queue).string().not_null())
					.col(ColumnDef::new(Jobs::Priority).integer().not_null().default(10))
					.col(ColumnDef::new(Jobs::Status).string().not_null().default("pending"))
					.col(ColumnDef::new(Jobs::Payload).string().not_null())
					.col(ColumnDef::new(Jobs::DependsOn).string().null())
					.col(ColumnDef::new(Jobs::Attempts).integer().not_null().default(0))
					.col(ColumnDef::new(Jobs::MaxAttempts).integer().not_null().default(3))
					.col(ColumnDef::new(Jobs::Error).string().null())
					.col(ColumnDef::new(Jobs::LastError).string().null())
					.col(ColumnDef::new(Jobs::Result).string().null())
					.col(ColumnDef::new(Jobs::RetryAfter).big_integer().null())
					.col(ColumnDef::new(Jobs::LockedBy).string().null())
					.col(ColumnDef::new(Jobs::LockedAt).big_integer().null())
					.col(ColumnDef::new(Jobs::CreatedAt).big_integer().not_null())
					.col(ColumnDef::new(Jobs::StartedAt).big_integer().null())
					.col(ColumnDef::new(Jobs::CompletedAt).big_integer().null())
					.to_owned(),
			)
			.await?;

		manager
			.create_table(
				Table::create()
					.table(JobDeadLetter::Table)
					.if_not_exists()
					.col(
						ColumnDef::new(JobDeadLetter::Id)
							.integer()
							.not_null()
							.auto_increment()
							.primary_key(),
					)
					.col(ColumnDef::new(JobDeadLetter::JobId).string().not_null())
					.col(ColumnDef::new(JobDeadLetter::Queue).string().not_null())
					.col(ColumnDef::new(JobDeadLetter::Payload).string().not_null())
					.col(ColumnDef::new(JobDeadLetter::Error).string().not_null())
					.col(ColumnDef::new(JobDeadLetter::Attempts).integer().not_null())
					.col(ColumnDef::new(JobDeadLetter::FailedAt).big_integer().not_null())
					.col(ColumnDef::new(JobDeadLetter::Acknowledged).boolean().not_null().default(false))
					.to_owned(),
			)
			.await?;

		// Claim path: queue + status scan ordered by priority
		manager
			.create_index(
				Index::create()
					.if_not_exists()
					.name("idx_jobs_claim")
					.table(Jobs::Table)
					.col(Jobs::Queue)
					.col(Jobs::Status)
					.col(Jobs::Priority)
					.to_owned(),
			)
			.await?;

		// Stale-lease sweep
		manager
			.create_index(
				Index::create()
					.if_not_exists()
					.name("idx_jobs_locked")
					.table(Jobs::Table)
					.col(Jobs::Status)
					.col(Jobs::LockedAt)
					.to_owned(),
			)
			.await?;

		Ok(())
	}

	async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
		manager
			.drop_table(Table::drop().table(JobDeadLetter::Table).to_owned())
			.await?;
		manager
			.drop_table(Table::drop().table(Jobs::Table).to_owned())
			.await?;
		Ok(())
	}
}

#[derive(Iden)]
enum Jobs {
	Table,
	Id,
	Queue,
	Priority,
	Status,
	Payload,
	DependsOn,
	Attempts,
	MaxAttempts,
	Error,
	LastError,
	Result,
	RetryAfter,
	LockedBy,
	LockedAt,
	CreatedAt,
	StartedAt,
	CompletedAt,
}

#[derive(Iden)]
enum JobDeadLetter {
	Table,
	Id,
	JobId,
	Queue,
	Payload,
	Error,
	Attempts,
	FailedAt,
	Acknowledged,
}
