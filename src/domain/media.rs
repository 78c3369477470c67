//! Media domain types

use serde::{Deserialize, Serialize};
use std::fmt;

/// The four archived media kinds, each with its own table and kind folder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
    Document,
    Map,
}

impl MediaKind {
    /// Folder prefix inside a location folder: `org-img-<shortid>/` etc.
    pub fn folder_prefix(&self) -> &'static str {
        match self {
            Self::Image => "org-img",
            Self::Video => "org-vid",
            Self::Document => "org-doc",
            Self::Map => "org-map",
        }
    }

    pub fn all() -> [MediaKind; 4] {
        [Self::Image, Self::Video, Self::Document, Self::Map]
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Document => "document",
            Self::Map => "map",
        };
        f.write_str(s)
    }
}

/// Why a media record is hidden from default views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HiddenReason {
    /// Hidden by the operator
    User,
    /// Motion half of a live photo pair
    LivePhoto,
    /// SDR rendition shadowed by an HDR original
    SdrDuplicate,
    /// srt/lrf/thm style sidecar archived as a document
    MetadataSidecar,
}

impl HiddenReason {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Self::User),
            "live_photo" => Some(Self::LivePhoto),
            "sdr_duplicate" => Some(Self::SdrDuplicate),
            "metadata_sidecar" => Some(Self::MetadataSidecar),
            _ => None,
        }
    }
}

impl fmt::Display for HiddenReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::User => "user",
            Self::LivePhoto => "live_photo",
            Self::SdrDuplicate => "sdr_duplicate",
            Self::MetadataSidecar => "metadata_sidecar",
        };
        f.write_str(s)
    }
}
