//! Deterministic archive layout
//!
//! Every path under the archive root is derived from stable inputs: the
//! location's short id, the media kind, and the content fingerprint. The
//! layout is the on-disk contract and never depends on database state.
//!
//! ```text
//! <archive>/locations/<STATE>-<type-slug>/<slocnam-slug>-<shortid>/
//!     org-img-<shortid>/<fingerprint>.<ext>
//!     org-doc-<shortid>/_archive/{bagit.txt,...}
//! <archive>/.thumbnails/<xx>/<fingerprint>_400.jpg
//! ```

use crate::domain::location::Location;
use crate::domain::media::MediaKind;
use crate::shared::fingerprint::Fingerprint;
use std::path::{Path, PathBuf};

/// Maximum slug length
const SLUG_MAX: usize = 50;

/// Rendered in place of a missing state code
const UNKNOWN_STATE: &str = "XX";

/// Thumbnail size variants, by pixel edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbSize {
    Small,
    Large,
    Preview,
}

impl ThumbSize {
    pub fn pixels(&self) -> u32 {
        match self {
            Self::Small => 400,
            Self::Large => 800,
            Self::Preview => 1920,
        }
    }
}

/// Lowercase, dash-separated, trimmed, at most 50 characters
pub fn slug(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut last_dash = true;
    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            out.push('-');
            last_dash = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out.truncate(SLUG_MAX);
    while out.ends_with('-') {
        out.pop();
    }
    out
}

/// Path service rooted at the archive directory
#[derive(Debug, Clone)]
pub struct ArchivePaths {
    root: PathBuf,
}

impl ArchivePaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `locations/<STATE>-<type-slug>/<slocnam-slug>-<shortid>/`
    pub fn location_folder(&self, location: &Location) -> PathBuf {
        let state = location
            .state
            .as_deref()
            .map(str::to_uppercase)
            .unwrap_or_else(|| UNKNOWN_STATE.to_string());
        self.root
            .join("locations")
            .join(format!("{state}-{}", slug(&location.loc_type)))
            .join(format!("{}-{}", slug(&location.short_name), location.short_id))
    }

    /// `org-img-<shortid>/` and friends, inside the location folder
    pub fn kind_folder(&self, location: &Location, kind: MediaKind) -> PathBuf {
        self.location_folder(location)
            .join(format!("{}-{}", kind.folder_prefix(), location.short_id))
    }

    /// Final destination for an archived file
    pub fn media_dest(
        &self,
        location: &Location,
        kind: MediaKind,
        fingerprint: &Fingerprint,
        extension: &str,
    ) -> PathBuf {
        self.kind_folder(location, kind)
            .join(format!("{fingerprint}.{}", extension.to_ascii_lowercase()))
    }

    /// `org-doc-<shortid>/_archive/`: the BagIt sidecar folder
    pub fn bag_folder(&self, location: &Location) -> PathBuf {
        self.kind_folder(location, MediaKind::Document).join("_archive")
    }

    pub fn thumbnail(&self, fingerprint: &Fingerprint, size: ThumbSize) -> PathBuf {
        match size {
            ThumbSize::Preview => self
                .root
                .join(".previews")
                .join(fingerprint.bucket())
                .join(format!("{fingerprint}.jpg")),
            _ => self
                .root
                .join(".thumbnails")
                .join(fingerprint.bucket())
                .join(format!("{fingerprint}_{}.jpg", size.pixels())),
        }
    }

    pub fn poster(&self, fingerprint: &Fingerprint) -> PathBuf {
        self.root
            .join(".posters")
            .join(fingerprint.bucket())
            .join(format!("{fingerprint}.jpg"))
    }

    pub fn video_proxy(&self, fingerprint: &Fingerprint) -> PathBuf {
        self.root
            .join(".video-proxies")
            .join(fingerprint.bucket())
            .join(format!("{fingerprint}.mp4"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::location::Location;
    use pretty_assertions::assert_eq;

    fn factory() -> Location {
        let mut loc = Location::new("Old Factory", "Old Factory", "Factory").with_state("NY");
        loc.short_id = "ABC123".to_string();
        loc
    }

    #[test]
    fn slug_rules() {
        assert_eq!(slug("Old Factory"), "old-factory");
        assert_eq!(slug("  St. Mary's -- Annex  "), "st-mary-s-annex");
        assert_eq!(slug("UPPER"), "upper");
        assert_eq!(slug("---"), "");
        let long = "x".repeat(80);
        assert_eq!(slug(&long).len(), 50);
    }

    #[test]
    fn location_folder_layout() {
        let paths = ArchivePaths::new("/archive");
        assert_eq!(
            paths.location_folder(&factory()),
            PathBuf::from("/archive/locations/NY-factory/old-factory-ABC123")
        );
    }

    #[test]
    fn missing_state_renders_xx() {
        let paths = ArchivePaths::new("/archive");
        let mut loc = factory();
        loc.state = None;
        assert!(paths
            .location_folder(&loc)
            .starts_with("/archive/locations/XX-factory"));
    }

    #[test]
    fn media_dest_uses_fingerprint_and_lowercased_extension() {
        let paths = ArchivePaths::new("/archive");
        let fp = Fingerprint::parse("0123456789abcdef").unwrap();
        assert_eq!(
            paths.media_dest(&factory(), MediaKind::Image, &fp, "JPG"),
            PathBuf::from(
                "/archive/locations/NY-factory/old-factory-ABC123/org-img-ABC123/0123456789abcdef.jpg"
            )
        );
    }

    #[test]
    fn bag_folder_lives_under_documents() {
        let paths = ArchivePaths::new("/archive");
        assert_eq!(
            paths.bag_folder(&factory()),
            PathBuf::from("/archive/locations/NY-factory/old-factory-ABC123/org-doc-ABC123/_archive")
        );
    }

    #[test]
    fn derived_artifacts_are_bucketed() {
        let paths = ArchivePaths::new("/archive");
        let fp = Fingerprint::parse("ab23456789abcdef").unwrap();
        assert_eq!(
            paths.thumbnail(&fp, ThumbSize::Small),
            PathBuf::from("/archive/.thumbnails/ab/ab23456789abcdef_400.jpg")
        );
        assert_eq!(
            paths.thumbnail(&fp, ThumbSize::Preview),
            PathBuf::from("/archive/.previews/ab/ab23456789abcdef.jpg")
        );
        assert_eq!(
            paths.video_proxy(&fp),
            PathBuf::from("/archive/.video-proxies/ab/ab23456789abcdef.mp4")
        );
    }
}
