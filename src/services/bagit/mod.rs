//! BagIt sidecar service (RFC 8493)
//!
//! Every location folder carries an `_archive/` bag so the folder stays
//! self-describing without the database: a version declaration, ordered
//! key-value metadata with a `Payload-Oxum`, a payload manifest keyed by
//! content fingerprint, and a tag manifest over the three files. This
//! service is the only writer of `_archive/` contents, and all writes are
//! tmp-then-rename.

mod tag_file;
mod validate;

pub use tag_file::TagFile;
pub use validate::BagValidation;

use crate::domain::location::Location;
use crate::error::CoreResult;
use crate::library::{Library, MediaEntry};
use crate::shared::fingerprint::Fingerprint;
use chrono::Utc;
use std::path::Path;
use tracing::info;

pub const BAGIT_TXT: &str = "bagit.txt";
pub const BAG_INFO_TXT: &str = "bag-info.txt";
pub const MANIFEST_TXT: &str = "manifest-sha256.txt";
pub const TAGMANIFEST_TXT: &str = "tagmanifest-sha256.txt";

/// Exact version declaration
const BAGIT_DECLARATION: &str = "BagIt-Version: 1.0\nTag-File-Character-Encoding: UTF-8\n";

const SOFTWARE_AGENT: &str = concat!("curator-core ", env!("CARGO_PKG_VERSION"));

/// What a bag write produced
#[derive(Debug, Clone)]
pub struct BagSummary {
    pub payload_oxum: String,
    pub file_count: u64,
    pub total_bytes: u64,
}

pub struct BagitService;

impl BagitService {
    /// Regenerate the bag for a location from the Index's records
    pub async fn write_bag(library: &Library, location: &Location) -> CoreResult<BagSummary> {
        let entries = library.media_for_location(&location.id).await?;
        let bag_dir = library.paths().bag_folder(location);
        tokio::fs::create_dir_all(&bag_dir).await?;

        let total_bytes: u64 = entries.iter().map(|e| e.size_bytes as u64).sum();
        let file_count = entries.len() as u64;
        let payload_oxum = format!("{total_bytes}.{file_count}");

        let manifest = render_manifest(&entries);
        let bag_info = render_bag_info(library, location, &payload_oxum);

        write_atomic(&bag_dir.join(BAGIT_TXT), BAGIT_DECLARATION.as_bytes()).await?;
        write_atomic(&bag_dir.join(BAG_INFO_TXT), bag_info.as_bytes()).await?;
        write_atomic(&bag_dir.join(MANIFEST_TXT), manifest.as_bytes()).await?;

        let mut tagmanifest = String::new();
        for (name, content) in [
            (BAGIT_TXT, BAGIT_DECLARATION),
            (BAG_INFO_TXT, bag_info.as_str()),
            (MANIFEST_TXT, manifest.as_str()),
        ] {
            let fp = Fingerprint::of_bytes(content.as_bytes());
            tagmanifest.push_str(&format!("{fp}  {name}\n"));
        }
        write_atomic(&bag_dir.join(TAGMANIFEST_TXT), tagmanifest.as_bytes()).await?;

        info!(
            "wrote bag for {} ({}): Payload-Oxum {payload_oxum}",
            location.short_id,
            location.name
        );
        Ok(BagSummary {
            payload_oxum,
            file_count,
            total_bytes,
        })
    }

    /// Check `Payload-Oxum` against the filesystem; see `validate` for the
    /// per-file pass. Updates the location's bag fields, mutates nothing
    /// on disk.
    pub async fn quick_validate(library: &Library, location: &Location) -> CoreResult<BagValidation> {
        let outcome = validate::quick_validate(library, location).await?;
        library
            .update_bag_status(&location.id, outcome.status, outcome.first_error())
            .await?;
        Ok(outcome)
    }

    /// Full validation: every payload file must exist and its
    /// filename-encoded fingerprint must match the manifest.
    pub async fn validate(library: &Library, location: &Location) -> CoreResult<BagValidation> {
        let outcome = validate::validate(library, location).await?;
        library
            .update_bag_status(&location.id, outcome.status, outcome.first_error())
            .await?;
        Ok(outcome)
    }
}

fn render_manifest(entries: &[MediaEntry]) -> String {
    // Entries arrive sorted by fingerprint; the manifest sorts by path
    let mut lines: Vec<String> = Vec::with_capacity(entries.len());
    for entry in entries {
        lines.push(format!("{}  {}", entry.fingerprint, manifest_rel_path(entry)));
    }
    lines.sort();
    let mut out = lines.join("\n");
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

fn render_bag_info(library: &Library, location: &Location, payload_oxum: &str) -> String {
    let mut tag = TagFile::new();
    tag.push("Source-Organization", &library.config().source_organization)
        .push("Bagging-Date", Utc::now().format("%Y-%m-%d").to_string())
        .push("Bag-Software-Agent", SOFTWARE_AGENT)
        .push("External-Identifier", &location.short_id)
        .push("External-Description", &location.name);

    tag.push_opt("Location-Type", Some(&location.loc_type))
        .push_opt("Location-State", location.state.as_deref())
        .push_opt("Location-City", location.address.city.as_deref())
        .push_opt("Location-County", location.address.county.as_deref())
        .push_opt("Location-Zip", location.address.zipcode.as_deref());

    if let Some(gps) = &location.gps {
        tag.push("GPS-Latitude", format!("{:.6}", gps.lat))
            .push("GPS-Longitude", format!("{:.6}", gps.lng));
    }

    tag.push_opt("Region-Census", location.census_region.as_deref())
        .push_opt("Region-Division", location.census_division.as_deref())
        .push_opt("Region-Cultural", location.cultural_region.as_deref());

    tag.push("Payload-Oxum", payload_oxum).push("Bag-Count", "1 of 1");

    tag.push_description(
        "Internal-Sender-Description",
        location.address.street.as_deref(),
    );

    tag.render()
}

/// Write-tmp then rename; rename is atomic within a device
async fn write_atomic(dest: &Path, content: &[u8]) -> CoreResult<()> {
    let file_name = dest
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let tmp = dest.with_file_name(format!(".{file_name}.tmp"));
    tokio::fs::write(&tmp, content).await?;
    let file = tokio::fs::File::open(&tmp).await?;
    file.sync_all().await?;
    tokio::fs::rename(&tmp, dest).await?;
    Ok(())
}

/// Manifest-relative path from `_archive/` up to the payload file
fn manifest_rel_path(entry: &MediaEntry) -> String {
    format!(
        "../../{}/{}",
        kind_dir_of(&entry.archive_path).unwrap_or_default(),
        entry.archive_filename
    )
}

fn kind_dir_of(archive_path: &str) -> Option<String> {
    Path::new(archive_path)
        .parent()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().to_string())
}
