//! Bag validation
//!
//! Two levels: `quick_validate` reconciles `Payload-Oxum` against the
//! filesystem; `validate` additionally confirms every payload file exists
//! and that its filename-encoded fingerprint agrees with the manifest.
//! Neither level mutates the filesystem.

use super::{BAGIT_TXT, BAG_INFO_TXT, MANIFEST_TXT};
use crate::domain::location::{BagStatus, Location};
use crate::error::CoreResult;
use crate::library::Library;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct BagValidation {
    pub status: BagStatus,
    pub errors: Vec<String>,
}

impl BagValidation {
    fn ok() -> Self {
        Self {
            status: BagStatus::Valid,
            errors: Vec::new(),
        }
    }

    fn with(status: BagStatus, error: String) -> Self {
        Self {
            status,
            errors: vec![error],
        }
    }

    pub fn first_error(&self) -> Option<String> {
        self.errors.first().cloned()
    }
}

/// One parsed manifest line: fingerprint and bag-relative path
struct ManifestEntry {
    fingerprint: String,
    rel_path: String,
}

fn parse_manifest(content: &str) -> Vec<ManifestEntry> {
    content
        .lines()
        .filter_map(|line| {
            let line = line.trim_end();
            if line.is_empty() {
                return None;
            }
            let (fingerprint, rel_path) = line.split_once("  ")?;
            Some(ManifestEntry {
                fingerprint: fingerprint.to_string(),
                rel_path: rel_path.to_string(),
            })
        })
        .collect()
}

fn parse_payload_oxum(bag_info: &str) -> Option<(u64, u64)> {
    let value = bag_info
        .lines()
        .find_map(|line| line.strip_prefix("Payload-Oxum: "))?;
    let (bytes, count) = value.trim().split_once('.')?;
    Some((bytes.parse().ok()?, count.parse().ok()?))
}

/// Filename-encoded fingerprint: the stem of `<fingerprint>.<ext>`
fn filename_fingerprint(rel_path: &str) -> Option<&str> {
    Path::new(rel_path)
        .file_stem()
        .and_then(|stem| stem.to_str())
}

async fn read_required(
    bag_dir: &Path,
    name: &str,
) -> CoreResult<std::result::Result<String, BagValidation>> {
    match tokio::fs::read_to_string(bag_dir.join(name)).await {
        Ok(content) => Ok(Ok(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Err(BagValidation::with(
            BagStatus::Incomplete,
            format!("missing required file {name}"),
        ))),
        Err(e) => Err(e.into()),
    }
}

pub(super) async fn quick_validate(
    library: &Library,
    location: &Location,
) -> CoreResult<BagValidation> {
    let bag_dir = library.paths().bag_folder(location);
    if !bag_dir.is_dir() {
        return Ok(BagValidation::with(
            BagStatus::None,
            "no _archive folder".to_string(),
        ));
    }

    if let Err(outcome) = read_required(&bag_dir, BAGIT_TXT).await? {
        return Ok(outcome);
    }
    let bag_info = match read_required(&bag_dir, BAG_INFO_TXT).await? {
        Ok(content) => content,
        Err(outcome) => return Ok(outcome),
    };
    let manifest = match read_required(&bag_dir, MANIFEST_TXT).await? {
        Ok(content) => content,
        Err(outcome) => return Ok(outcome),
    };

    let Some((recorded_bytes, recorded_count)) = parse_payload_oxum(&bag_info) else {
        return Ok(BagValidation::with(
            BagStatus::Incomplete,
            "bag-info.txt has no parseable Payload-Oxum".to_string(),
        ));
    };

    let mut found_bytes = 0u64;
    let mut found_count = 0u64;
    for entry in parse_manifest(&manifest) {
        if let Ok(meta) = tokio::fs::metadata(bag_dir.join(&entry.rel_path)).await {
            found_bytes += meta.len();
            found_count += 1;
        }
    }

    if (found_bytes, found_count) != (recorded_bytes, recorded_count) {
        return Ok(BagValidation::with(
            BagStatus::Incomplete,
            format!(
                "Payload-Oxum mismatch: recorded {recorded_bytes}.{recorded_count}, found {found_bytes}.{found_count}"
            ),
        ));
    }

    Ok(BagValidation::ok())
}

pub(super) async fn validate(library: &Library, location: &Location) -> CoreResult<BagValidation> {
    let bag_dir = library.paths().bag_folder(location);
    if !bag_dir.is_dir() {
        return Ok(BagValidation::with(
            BagStatus::None,
            "no _archive folder".to_string(),
        ));
    }

    if let Err(outcome) = read_required(&bag_dir, BAGIT_TXT).await? {
        return Ok(outcome);
    }
    let bag_info = match read_required(&bag_dir, BAG_INFO_TXT).await? {
        Ok(content) => content,
        Err(outcome) => return Ok(outcome),
    };
    let manifest = match read_required(&bag_dir, MANIFEST_TXT).await? {
        Ok(content) => content,
        Err(outcome) => return Ok(outcome),
    };

    let mut errors = Vec::new();
    let entries = parse_manifest(&manifest);
    let mut found_bytes = 0u64;

    for entry in &entries {
        let payload = bag_dir.join(&entry.rel_path);
        match tokio::fs::metadata(&payload).await {
            Ok(meta) => {
                found_bytes += meta.len();
                if filename_fingerprint(&entry.rel_path) != Some(entry.fingerprint.as_str()) {
                    errors.push(format!(
                        "checksum mismatch: {} does not carry fingerprint {}",
                        entry.rel_path, entry.fingerprint
                    ));
                }
            }
            Err(_) => {
                errors.push(format!(
                    "checksum target missing: {} ({})",
                    entry.rel_path, entry.fingerprint
                ));
            }
        }
    }

    if !errors.is_empty() {
        return Ok(BagValidation {
            status: BagStatus::Invalid,
            errors,
        });
    }

    if let Some((recorded_bytes, recorded_count)) = parse_payload_oxum(&bag_info) {
        if (found_bytes, entries.len() as u64) != (recorded_bytes, recorded_count) {
            return Ok(BagValidation::with(
                BagStatus::Incomplete,
                format!(
                    "Payload-Oxum mismatch: recorded {recorded_bytes}.{recorded_count}, found {found_bytes}.{}",
                    entries.len()
                ),
            ));
        }
    }

    Ok(BagValidation::ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_lines_parse() {
        let entries = parse_manifest("0123456789abcdef  ../../org-img-ABC123/0123456789abcdef.jpg\n");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].fingerprint, "0123456789abcdef");
        assert_eq!(
            filename_fingerprint(&entries[0].rel_path),
            Some("0123456789abcdef")
        );
    }

    #[test]
    fn payload_oxum_parses() {
        assert_eq!(
            parse_payload_oxum("Source-Organization: x\nPayload-Oxum: 12.1\n"),
            Some((12, 1))
        );
        assert_eq!(parse_payload_oxum("Payload-Oxum: nope\n"), None);
    }
}
