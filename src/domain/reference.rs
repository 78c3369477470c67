//! Reference map domain types
//!
//! External pin collections (KML/GPX/GeoJSON/CSV) ingested as browsable
//! overlays and candidate links to locations.

use crate::error::{CoreError, CoreResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapKind {
    Kml,
    Gpx,
    Geojson,
    Csv,
}

impl MapKind {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "kml" => Some(Self::Kml),
            "gpx" => Some(Self::Gpx),
            "geojson" => Some(Self::Geojson),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }
}

impl fmt::Display for MapKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Kml => "kml",
            Self::Gpx => "gpx",
            Self::Geojson => "geojson",
            Self::Csv => "csv",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceMap {
    pub id: Uuid,
    pub file_path: String,
    pub kind: MapKind,
    pub name: String,
    pub point_count: i64,
    pub imported_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferencePoint {
    pub id: Uuid,
    pub map_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub lat: f64,
    pub lng: f64,
    pub state: Option<String>,
    pub category: Option<String>,
    pub aka_names: Vec<String>,
    /// When linked, the point leaves the unlinked overlay
    pub location_id: Option<Uuid>,
    pub raw: JsonValue,
}

impl ReferencePoint {
    pub fn validate(&self) -> CoreResult<()> {
        if !(-90.0..=90.0).contains(&self.lat) || !(-180.0..=180.0).contains(&self.lng) {
            return Err(CoreError::Invalid(format!(
                "point {:?} has out-of-range coordinates ({}, {})",
                self.name, self.lat, self.lng
            )));
        }
        Ok(())
    }
}
