//! Extension-based media classification

use super::media::MediaKind;

/// RAW still formats treated as images
const RAW_IMAGE_EXTENSIONS: &[&str] = &[
    "nef", "cr2", "cr3", "arw", "dng", "orf", "raf", "rw2", "pef", "srw", "x3f", "3fr",
];

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "tiff", "tif", "webp", "heic", "heif"];

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv", "wmv", "flv", "webm", "m4v", "mts"];

const DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "doc", "docx", "txt", "rtf", "odt"];

const MAP_EXTENSIONS: &[&str] = &["kml", "gpx", "geojson"];

/// Metadata sidecars: archived as hidden documents next to their parent
const SIDECAR_EXTENSIONS: &[&str] = &["srt", "lrf", "thm", "xmp", "aae"];

/// How a scanned file should be ingested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Regular media of the given kind
    Media(MediaKind),
    /// Metadata sidecar: stored as a hidden document
    Sidecar,
    /// Unrecognised extension: skipped
    Unknown,
}

impl Classification {
    /// The kind table a classified file lands in, if any
    pub fn media_kind(&self) -> Option<MediaKind> {
        match self {
            Self::Media(kind) => Some(*kind),
            Self::Sidecar => Some(MediaKind::Document),
            Self::Unknown => None,
        }
    }

    pub fn is_sidecar(&self) -> bool {
        matches!(self, Self::Sidecar)
    }
}

/// Classify a file extension (case-insensitive, no leading dot)
pub fn classify_extension(ext: &str) -> Classification {
    let ext = ext.to_ascii_lowercase();
    let ext = ext.as_str();
    if IMAGE_EXTENSIONS.contains(&ext) || RAW_IMAGE_EXTENSIONS.contains(&ext) {
        Classification::Media(MediaKind::Image)
    } else if VIDEO_EXTENSIONS.contains(&ext) {
        Classification::Media(MediaKind::Video)
    } else if DOCUMENT_EXTENSIONS.contains(&ext) {
        Classification::Media(MediaKind::Document)
    } else if MAP_EXTENSIONS.contains(&ext) {
        Classification::Media(MediaKind::Map)
    } else if SIDECAR_EXTENSIONS.contains(&ext) {
        Classification::Sidecar
    } else {
        Classification::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_is_case_insensitive() {
        assert_eq!(classify_extension("JPG"), Classification::Media(MediaKind::Image));
        assert_eq!(classify_extension("Mov"), Classification::Media(MediaKind::Video));
    }

    #[test]
    fn raw_formats_are_images() {
        for ext in ["nef", "cr3", "dng", "rw2"] {
            assert_eq!(classify_extension(ext), Classification::Media(MediaKind::Image));
        }
    }

    #[test]
    fn sidecars_are_hidden_documents() {
        let c = classify_extension("srt");
        assert!(c.is_sidecar());
        assert_eq!(c.media_kind(), Some(MediaKind::Document));
    }

    #[test]
    fn unknown_extensions_are_rejected() {
        assert_eq!(classify_extension("exe"), Classification::Unknown);
        assert_eq!(classify_extension(""), Classification::Unknown);
    }
}
