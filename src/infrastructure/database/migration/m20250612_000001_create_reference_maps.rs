use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
	async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
		manager
			.create_table(
				Table::create()
					.table(ReferenceMaps::Table)
					.if_not_exists()
					.col(ColumnDef::new(ReferenceMaps::Id).string().not_null().primary_key())
					.col(ColumnDef::new(ReferenceMaps::FilePath).string().not_null())
					.col(ColumnDef::new(ReferenceMaps::Kind).string().not_null())
					.col(ColumnDef::new(ReferenceMaps::Name).string().not_null())
					.col(ColumnDef::new(ReferenceMaps::PointCount).big_integer().not_null().default(0))
					.col(ColumnDef::new(ReferenceMaps::ImportedAt).timestamp().not_null())
					.to_owned(),
			)
			.await?;

		manager
			.create_table(
				Table::create()
					.table(ReferencePoints::Table)
					.if_not_exists()
					.col(ColumnDef::new(ReferencePoints::Id).string().not_null().primary_key())
					.col(ColumnDef::new(ReferencePoints::MapId).string().not_null())
					.col(ColumnDef::new(ReferencePoints::Name).string().not_null())
					.col(ColumnDef::new(ReferencePoints::Description).string().null())
					.col(ColumnDef::new(ReferencePoints::Lat).double().not_null())
					.col(ColumnDef::new(ReferencePoints::Lng).double().not_null())
					.col(ColumnDef::new(ReferencePoints::State).string().null())
					.col(ColumnDef::new(ReferencePoints::Category).string().null())
					.col(ColumnDef::new(ReferencePoints::AkaNames).string().null())
					.col(ColumnDef::new(ReferencePoints::LocationId).string().null())
					.col(ColumnDef::new(ReferencePoints::Raw).json().null())
					.foreign_key(
						ForeignKey::create()
							.name("fk_point_map")
							.from(ReferencePoints::Table, ReferencePoints::MapId)
							.to(ReferenceMaps::Table, ReferenceMaps::Id)
							.on_delete(ForeignKeyAction::Cascade),
					)
					.foreign_key(
						ForeignKey::create()
							.name("fk_point_location")
							.from(ReferencePoints::Table, ReferencePoints::LocationId)
							.to(Locations::Table, Locations::Id)
							.on_delete(ForeignKeyAction::SetNull),
					)
					.to_owned(),
			)
			.await?;

		manager
			.create_index(
				Index::create()
					.if_not_exists()
					.name("idx_points_map")
					.table(ReferencePoints::Table)
					.col(ReferencePoints::MapId)
					.to_owned(),
			)
			.await?;

		Ok(())
	}

	async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
		manager
			.drop_table(Table::drop().table(ReferencePoints::Table).to_owned())
			.await?;
		manager
			.drop_table(Table::drop().table(ReferenceMaps::Table).to_owned())
			.await?;
		Ok(())
	}
}

#[derive(Iden)]
enum ReferenceMaps {
	Table,
	Id,
	FilePath,
	Kind,
	Name,
	PointCount,
	ImportedAt,
}

#[derive(Iden)]
enum ReferencePoints {
	Table,
	Id,
	MapId,
	Name,
	Description,
	Lat,
	Lng,
	State,
	Category,
	AkaNames,
	LocationId,
	Raw,
}

#[derive(Iden)]
enum Locations {
	Table,
	Id,
}
