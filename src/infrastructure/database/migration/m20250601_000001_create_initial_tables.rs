use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
	async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
		manager
			.create_table(
				Table::create()
					.table(Locations::Table)
					.if_not_exists()
					.col(ColumnDef::new(Locations::Id).string().not_null().primary_key())
					.col(ColumnDef::new(Locations::ShortId).string().not_null().unique_key())
					.col(ColumnDef::new(Locations::Name).string().not_null())
					.col(ColumnDef::new(Locations::ShortName).string().not_null())
					.col(ColumnDef::new(Locations::State).string().null())
					.col(ColumnDef::new(Locations::LocType).string().not_null())
					.col(ColumnDef::new(Locations::GpsLat).double().null())
					.col(ColumnDef::new(Locations::GpsLng).double().null())
					.col(ColumnDef::new(Locations::GpsAccuracy).double().null())
					.col(ColumnDef::new(Locations::GpsSource).string().null())
					.col(ColumnDef::new(Locations::GpsVerified).boolean().not_null().default(false))
					.col(ColumnDef::new(Locations::AddressStreet).string().null())
					.col(ColumnDef::new(Locations::AddressCity).string().null())
					.col(ColumnDef::new(Locations::AddressCounty).string().null())
					.col(ColumnDef::new(Locations::AddressState).string().null())
					.col(ColumnDef::new(Locations::AddressZip).string().null())
					.col(ColumnDef::new(Locations::AddressConfidence).string().null())
					.col(ColumnDef::new(Locations::GeocodedAt).timestamp().null())
					.col(ColumnDef::new(Locations::CensusRegion).string().null())
					.col(ColumnDef::new(Locations::CensusDivision).string().null())
					.col(ColumnDef::new(Locations::StateDirection).string().null())
					.col(ColumnDef::new(Locations::CulturalRegion).string().null())
					.col(ColumnDef::new(Locations::HeroFingerprint).string().null())
					.col(ColumnDef::new(Locations::Historic).boolean().not_null().default(false))
					.col(ColumnDef::new(Locations::Favorite).boolean().not_null().default(false))
					.col(ColumnDef::new(Locations::HostOnly).boolean().not_null().default(false))
					.col(ColumnDef::new(Locations::BagStatus).string().not_null().default("none"))
					.col(ColumnDef::new(Locations::BagLastVerified).timestamp().null())
					.col(ColumnDef::new(Locations::BagLastError).string().null())
					.col(ColumnDef::new(Locations::ImageCount).big_integer().not_null().default(0))
					.col(ColumnDef::new(Locations::VideoCount).big_integer().not_null().default(0))
					.col(ColumnDef::new(Locations::DocumentCount).big_integer().not_null().default(0))
					.col(ColumnDef::new(Locations::MapCount).big_integer().not_null().default(0))
					.col(ColumnDef::new(Locations::TotalBytes).big_integer().not_null().default(0))
					.col(ColumnDef::new(Locations::CreatedAt).timestamp().not_null())
					.col(ColumnDef::new(Locations::UpdatedAt).timestamp().not_null())
					.col(ColumnDef::new(Locations::StatusChangedAt).timestamp().null())
					.to_owned(),
			)
			.await?;

		manager
			.create_table(
				Table::create()
					.table(Sublocations::Table)
					.if_not_exists()
					.col(ColumnDef::new(Sublocations::Id).string().not_null().primary_key())
					.col(ColumnDef::new(Sublocations::LocationId).string().not_null())
					.col(ColumnDef::new(Sublocations::Name).string().not_null())
					.col(ColumnDef::new(Sublocations::Description).string().null())
					.col(ColumnDef::new(Sublocations::CreatedAt).timestamp().not_null())
					.col(ColumnDef::new(Sublocations::UpdatedAt).timestamp().not_null())
					.foreign_key(
						ForeignKey::create()
							.name("fk_sublocation_location")
							.from(Sublocations::Table, Sublocations::LocationId)
							.to(Locations::Table, Locations::Id)
							.on_delete(ForeignKeyAction::Cascade),
					)
					.to_owned(),
			)
			.await?;

		manager
			.create_table(
				Table::create()
					.table(Images::Table)
					.if_not_exists()
					.col(ColumnDef::new(Images::Fingerprint).string().not_null().primary_key())
					.col(ColumnDef::new(Images::OriginalFilename).string().not_null())
					.col(ColumnDef::new(Images::ArchiveFilename).string().not_null())
					.col(ColumnDef::new(Images::OriginalPath).string().not_null())
					.col(ColumnDef::new(Images::ArchivePath).string().not_null())
					.col(ColumnDef::new(Images::LocationId).string().not_null())
					.col(ColumnDef::new(Images::SublocationId).string().null())
					.col(ColumnDef::new(Images::ImportedBy).string().not_null())
					.col(ColumnDef::new(Images::ImportedAt).timestamp().not_null())
					.col(ColumnDef::new(Images::SizeBytes).big_integer().not_null())
					.col(ColumnDef::new(Images::Width).integer().null())
					.col(ColumnDef::new(Images::Height).integer().null())
					.col(ColumnDef::new(Images::DateTaken).timestamp().null())
					.col(ColumnDef::new(Images::CameraMake).string().null())
					.col(ColumnDef::new(Images::CameraModel).string().null())
					.col(ColumnDef::new(Images::GpsLat).double().null())
					.col(ColumnDef::new(Images::GpsLng).double().null())
					.col(ColumnDef::new(Images::ThumbSmPath).string().null())
					.col(ColumnDef::new(Images::ThumbLgPath).string().null())
					.col(ColumnDef::new(Images::PreviewPath).string().null())
					.col(ColumnDef::new(Images::Hidden).boolean().not_null().default(false))
					.col(ColumnDef::new(Images::HiddenReason).string().null())
					.col(ColumnDef::new(Images::LivePhoto).boolean().not_null().default(false))
					.col(ColumnDef::new(Images::Contributed).boolean().not_null().default(false))
					.col(ColumnDef::new(Images::ContributionSource).string().null())
					.col(ColumnDef::new(Images::XmpSynced).boolean().not_null().default(false))
					.col(ColumnDef::new(Images::RawMetadata).json().null())
					.foreign_key(
						ForeignKey::create()
							.name("fk_image_location")
							.from(Images::Table, Images::LocationId)
							.to(Locations::Table, Locations::Id)
							.on_delete(ForeignKeyAction::Cascade),
					)
					.to_owned(),
			)
			.await?;

		manager
			.create_table(
				Table::create()
					.table(Videos::Table)
					.if_not_exists()
					.col(ColumnDef::new(Videos::Fingerprint).string().not_null().primary_key())
					.col(ColumnDef::new(Videos::OriginalFilename).string().not_null())
					.col(ColumnDef::new(Videos::ArchiveFilename).string().not_null())
					.col(ColumnDef::new(Videos::OriginalPath).string().not_null())
					.col(ColumnDef::new(Videos::ArchivePath).string().not_null())
					.col(ColumnDef::new(Videos::LocationId).string().not_null())
					.col(ColumnDef::new(Videos::SublocationId).string().null())
					.col(ColumnDef::new(Videos::ImportedBy).string().not_null())
					.col(ColumnDef::new(Videos::ImportedAt).timestamp().not_null())
					.col(ColumnDef::new(Videos::SizeBytes).big_integer().not_null())
					.col(ColumnDef::new(Videos::Width).integer().null())
					.col(ColumnDef::new(Videos::Height).integer().null())
					.col(ColumnDef::new(Videos::DurationSecs).double().null())
					.col(ColumnDef::new(Videos::Codec).string().null())
					.col(ColumnDef::new(Videos::Fps).double().null())
					.col(ColumnDef::new(Videos::DateTaken).timestamp().null())
					.col(ColumnDef::new(Videos::GpsLat).double().null())
					.col(ColumnDef::new(Videos::GpsLng).double().null())
					.col(ColumnDef::new(Videos::PosterPath).string().null())
					.col(ColumnDef::new(Videos::ProxyPath).string().null())
					.col(ColumnDef::new(Videos::Hidden).boolean().not_null().default(false))
					.col(ColumnDef::new(Videos::HiddenReason).string().null())
					.col(ColumnDef::new(Videos::LivePhoto).boolean().not_null().default(false))
					.col(ColumnDef::new(Videos::Contributed).boolean().not_null().default(false))
					.col(ColumnDef::new(Videos::ContributionSource).string().null())
					.col(ColumnDef::new(Videos::XmpSynced).boolean().not_null().default(false))
					.col(ColumnDef::new(Videos::RawMetadata).json().null())
					.foreign_key(
						ForeignKey::create()
							.name("fk_video_location")
							.from(Videos::Table, Videos::LocationId)
							.to(Locations::Table, Locations::Id)
							.on_delete(ForeignKeyAction::Cascade),
					)
					.to_owned(),
			)
			.await?;

		manager
			.create_table(
				Table::create()
					.table(Documents::Table)
					.if_not_exists()
					.col(ColumnDef::new(Documents::Fingerprint).string().not_null().primary_key())
					.col(ColumnDef::new(Documents::OriginalFilename).string().not_null())
					.col(ColumnDef::new(Documents::ArchiveFilename).string().not_null())
					.col(ColumnDef::new(Documents::OriginalPath).string().not_null())
					.col(ColumnDef::new(Documents::ArchivePath).string().not_null())
					.col(ColumnDef::new(Documents::LocationId).string().not_null())
					.col(ColumnDef::new(Documents::SublocationId).string().null())
					.col(ColumnDef::new(Documents::ImportedBy).string().not_null())
					.col(ColumnDef::new(Documents::ImportedAt).timestamp().not_null())
					.col(ColumnDef::new(Documents::SizeBytes).big_integer().not_null())
					.col(ColumnDef::new(Documents::PageCount).integer().null())
					.col(ColumnDef::new(Documents::Hidden).boolean().not_null().default(false))
					.col(ColumnDef::new(Documents::HiddenReason).string().null())
					.col(ColumnDef::new(Documents::Contributed).boolean().not_null().default(false))
					.col(ColumnDef::new(Documents::ContributionSource).string().null())
					.col(ColumnDef::new(Documents::XmpSynced).boolean().not_null().default(false))
					.col(ColumnDef::new(Documents::RawMetadata).json().null())
					.foreign_key(
						ForeignKey::create()
							.name("fk_document_location")
							.from(Documents::Table, Documents::LocationId)
							.to(Locations::Table, Locations::Id)
							.on_delete(ForeignKeyAction::Cascade),
					)
					.to_owned(),
			)
			.await?;

		manager
			.create_table(
				Table::create()
					.table(Maps::Table)
					.if_not_exists()
					.col(ColumnDef::new(Maps::Fingerprint).string().not_null().primary_key())
					.col(ColumnDef::new(Maps::OriginalFilename).string().not_null())
					.col(ColumnDef::new(Maps::ArchiveFilename).string().not_null())
					.col(ColumnDef::new(Maps::OriginalPath).string().not_null())
					.col(ColumnDef::new(Maps::ArchivePath).string().not_null())
					.col(ColumnDef::new(Maps::LocationId).string().not_null())
					.col(ColumnDef::new(Maps::SublocationId).string().null())
					.col(ColumnDef::new(Maps::ImportedBy).string().not_null())
					.col(ColumnDef::new(Maps::ImportedAt).timestamp().not_null())
					.col(ColumnDef::new(Maps::SizeBytes).big_integer().not_null())
					.col(ColumnDef::new(Maps::PointCount).integer().null())
					.col(ColumnDef::new(Maps::Hidden).boolean().not_null().default(false))
					.col(ColumnDef::new(Maps::HiddenReason).string().null())
					.col(ColumnDef::new(Maps::Contributed).boolean().not_null().default(false))
					.col(ColumnDef::new(Maps::ContributionSource).string().null())
					.col(ColumnDef::new(Maps::XmpSynced).boolean().not_null().default(false))
					.col(ColumnDef::new(Maps::RawMetadata).json().null())
					.foreign_key(
						ForeignKey::create()
							.name("fk_map_location")
							.from(Maps::Table, Maps::LocationId)
							.to(Locations::Table, Locations::Id)
							.on_delete(ForeignKeyAction::Cascade),
					)
					.to_owned(),
			)
			.await?;

		manager
			.create_table(
				Table::create()
					.table(ImportSessions::Table)
					.if_not_exists()
					.col(ColumnDef::new(ImportSessions::Id).string().not_null().primary_key())
					.col(ColumnDef::new(ImportSessions::LocationId).string().not_null())
					.col(ColumnDef::new(ImportSessions::Status).string().not_null().default("pending"))
					.col(ColumnDef::new(ImportSessions::SourcePaths).string().not_null())
					.col(ColumnDef::new(ImportSessions::CopyStrategy).string().null())
					.col(ColumnDef::new(ImportSessions::TotalFiles).big_integer().not_null().default(0))
					.col(ColumnDef::new(ImportSessions::TotalBytes).big_integer().not_null().default(0))
					.col(ColumnDef::new(ImportSessions::FilesCopied).big_integer().not_null().default(0))
					.col(ColumnDef::new(ImportSessions::Duplicates).big_integer().not_null().default(0))
					.col(ColumnDef::new(ImportSessions::Errors).big_integer().not_null().default(0))
					.col(ColumnDef::new(ImportSessions::LastStep).integer().not_null().default(0))
					.col(ColumnDef::new(ImportSessions::ScanResult).string().null())
					.col(ColumnDef::new(ImportSessions::HashResult).string().null())
					.col(ColumnDef::new(ImportSessions::CopyResult).string().null())
					.col(ColumnDef::new(ImportSessions::ValidateResult).string().null())
					.col(ColumnDef::new(ImportSessions::Error).string().null())
					.col(ColumnDef::new(ImportSessions::CanResume).boolean().not_null().default(true))
					.col(ColumnDef::new(ImportSessions::StartedAt).timestamp().not_null())
					.col(ColumnDef::new(ImportSessions::UpdatedAt).timestamp().not_null())
					.col(ColumnDef::new(ImportSessions::FinishedAt).timestamp().null())
					.to_owned(),
			)
			.await?;

		manager
			.create_table(
				Table::create()
					.table(Imports::Table)
					.if_not_exists()
					.col(ColumnDef::new(Imports::Id).string().not_null().primary_key())
					.col(ColumnDef::new(Imports::SessionId).string().not_null())
					.col(ColumnDef::new(Imports::LocationId).string().not_null())
					.col(ColumnDef::new(Imports::ImportedBy).string().not_null())
					.col(ColumnDef::new(Imports::ImageCount).big_integer().not_null().default(0))
					.col(ColumnDef::new(Imports::VideoCount).big_integer().not_null().default(0))
					.col(ColumnDef::new(Imports::DocumentCount).big_integer().not_null().default(0))
					.col(ColumnDef::new(Imports::MapCount).big_integer().not_null().default(0))
					.col(ColumnDef::new(Imports::Bytes).big_integer().not_null().default(0))
					.col(ColumnDef::new(Imports::Duplicates).big_integer().not_null().default(0))
					.col(ColumnDef::new(Imports::Errors).big_integer().not_null().default(0))
					.col(ColumnDef::new(Imports::CopyStrategy).string().not_null())
					.col(ColumnDef::new(Imports::FinishedAt).timestamp().not_null())
					.to_owned(),
			)
			.await?;

		manager
			.create_table(
				Table::create()
					.table(Settings::Table)
					.if_not_exists()
					.col(ColumnDef::new(Settings::Key).string().not_null().primary_key())
					.col(ColumnDef::new(Settings::Value).string().not_null())
					.to_owned(),
			)
			.await?;

		for (name, table, column) in [
			("idx_images_location", "images", "location_id"),
			("idx_videos_location", "videos", "location_id"),
			("idx_documents_location", "documents", "location_id"),
			("idx_maps_location", "maps", "location_id"),
		] {
			manager
				.create_index(
					Index::create()
						.if_not_exists()
						.name(name)
						.table(Alias::new(table))
						.col(Alias::new(column))
						.to_owned(),
				)
				.await?;
		}

		manager
			.create_index(
				Index::create()
					.if_not_exists()
					.name("idx_sessions_resumable")
					.table(ImportSessions::Table)
					.col(ImportSessions::CanResume)
					.col(ImportSessions::Status)
					.to_owned(),
			)
			.await?;

		Ok(())
	}

	async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
		for table in [
			"imports",
			"import_sessions",
			"maps",
			"documents",
			"videos",
			"images",
			"sublocations",
			"settings",
			"locations",
		] {
			manager
				.drop_table(Table::drop().table(Alias::new(table)).to_owned())
				.await?;
		}
		Ok(())
	}
}

#[derive(Iden)]
enum Locations {
	Table,
	Id,
	ShortId,
	Name,
	ShortName,
	State,
	LocType,
	GpsLat,
	GpsLng,
	GpsAccuracy,
	GpsSource,
	GpsVerified,
	AddressStreet,
	AddressCity,
	AddressCounty,
	AddressState,
	AddressZip,
	AddressConfidence,
	GeocodedAt,
	CensusRegion,
	CensusDivision,
	StateDirection,
	CulturalRegion,
	HeroFingerprint,
	Historic,
	Favorite,
	HostOnly,
	BagStatus,
	BagLastVerified,
	BagLastError,
	ImageCount,
	VideoCount,
	DocumentCount,
	MapCount,
	TotalBytes,
	CreatedAt,
	UpdatedAt,
	StatusChangedAt,
}

#[derive(Iden)]
enum Sublocations {
	Table,
	Id,
	LocationId,
	Name,
	Description,
	CreatedAt,
	UpdatedAt,
}

#[derive(Iden)]
enum Images {
	Table,
	Fingerprint,
	OriginalFilename,
	ArchiveFilename,
	OriginalPath,
	ArchivePath,
	LocationId,
	SublocationId,
	ImportedBy,
	ImportedAt,
	SizeBytes,
	Width,
	Height,
	DateTaken,
	CameraMake,
	CameraModel,
	GpsLat,
	GpsLng,
	ThumbSmPath,
	ThumbLgPath,
	PreviewPath,
	Hidden,
	HiddenReason,
	LivePhoto,
	Contributed,
	ContributionSource,
	XmpSynced,
	RawMetadata,
}

#[derive(Iden)]
enum Videos {
	Table,
	Fingerprint,
	OriginalFilename,
	ArchiveFilename,
	OriginalPath,
	ArchivePath,
	LocationId,
	SublocationId,
	ImportedBy,
	ImportedAt,
	SizeBytes,
	Width,
	Height,
	DurationSecs,
	Codec,
	Fps,
	DateTaken,
	GpsLat,
	GpsLng,
	PosterPath,
	ProxyPath,
	Hidden,
	HiddenReason,
	LivePhoto,
	Contributed,
	ContributionSource,
	XmpSynced,
	RawMetadata,
}

#[derive(Iden)]
enum Documents {
	Table,
	Fingerprint,
	OriginalFilename,
	ArchiveFilename,
	OriginalPath,
	ArchivePath,
	LocationId,
	SublocationId,
	ImportedBy,
	ImportedAt,
	SizeBytes,
	PageCount,
	Hidden,
	HiddenReason,
	Contributed,
	ContributionSource,
	XmpSynced,
	RawMetadata,
}

#[derive(Iden)]
enum Maps {
	Table,
	Fingerprint,
	OriginalFilename,
	ArchiveFilename,
	OriginalPath,
	ArchivePath,
	LocationId,
	SublocationId,
	ImportedBy,
	ImportedAt,
	SizeBytes,
	PointCount,
	Hidden,
	HiddenReason,
	Contributed,
	ContributionSource,
	XmpSynced,
	RawMetadata,
}

#[derive(Iden)]
enum ImportSessions {
	Table,
	Id,
	LocationId,
	Status,
	SourcePaths,
	CopyStrategy,
	TotalFiles,
	TotalBytes,
	FilesCopied,
	Duplicates,
	Errors,
	LastStep,
	ScanResult,
	HashResult,
	CopyResult,
	ValidateResult,
	Error,
	CanResume,
	StartedAt,
	UpdatedAt,
	FinishedAt,
}

#[derive(Iden)]
enum Imports {
	Table,
	Id,
	SessionId,
	LocationId,
	ImportedBy,
	ImageCount,
	VideoCount,
	DocumentCount,
	MapCount,
	Bytes,
	Duplicates,
	Errors,
	CopyStrategy,
	FinishedAt,
}

#[derive(Iden)]
enum Settings {
	Table,
	Key,
	Value,
}
