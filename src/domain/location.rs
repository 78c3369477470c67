//! Location domain model
//!
//! A location is a logical collection: one folder tree in the archive, one
//! BagIt bag, and the owner of every media record imported under it.

use crate::error::{CoreError, CoreResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Fixed width of a short id
pub const SHORT_ID_LEN: usize = 6;

/// Crockford base32, no I/L/O/U
const CROCKFORD: &[u8] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// Derive the fixed-width short id used in filesystem paths from a
/// location's stable uuid. Deterministic and path-safe; global uniqueness
/// is enforced by the database index.
pub fn short_id_for(uuid: &Uuid) -> String {
    let digest = blake3::hash(uuid.as_bytes());
    let bytes = digest.as_bytes();

    let mut out = String::with_capacity(SHORT_ID_LEN);
    let mut acc: u32 = 0;
    let mut bits = 0;
    let mut idx = 0;
    while out.len() < SHORT_ID_LEN {
        if bits < 5 {
            acc = (acc << 8) | bytes[idx] as u32;
            bits += 8;
            idx += 1;
        }
        let shift = bits - 5;
        out.push(CROCKFORD[((acc >> shift) & 0x1f) as usize] as char);
        acc &= (1 << shift) - 1;
        bits -= 5;
    }
    out
}

/// GPS position with provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpsPosition {
    pub lat: f64,
    pub lng: f64,
    pub accuracy: Option<f64>,
    pub source: Option<String>,
    pub verified: bool,
}

impl GpsPosition {
    pub fn validate(&self) -> CoreResult<()> {
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(CoreError::Invalid(format!("latitude {} out of range", self.lat)));
        }
        if !(-180.0..=180.0).contains(&self.lng) {
            return Err(CoreError::Invalid(format!("longitude {} out of range", self.lng)));
        }
        Ok(())
    }
}

/// Postal address attached to a location
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationAddress {
    pub street: Option<String>,
    pub city: Option<String>,
    pub county: Option<String>,
    pub state: Option<String>,
    pub zipcode: Option<String>,
    pub confidence: Option<String>,
    pub geocoded_at: Option<DateTime<Utc>>,
}

/// BagIt verification status for a location folder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BagStatus {
    /// No `_archive/` folder yet
    None,
    /// Required tag files missing or Payload-Oxum disagrees
    Incomplete,
    /// A payload file fails its manifest check
    Invalid,
    /// All checks pass
    Valid,
}

impl BagStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "none" => Some(Self::None),
            "incomplete" => Some(Self::Incomplete),
            "invalid" => Some(Self::Invalid),
            "valid" => Some(Self::Valid),
            _ => None,
        }
    }
}

impl fmt::Display for BagStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::None => "none",
            Self::Incomplete => "incomplete",
            Self::Invalid => "invalid",
            Self::Valid => "valid",
        };
        f.write_str(s)
    }
}

/// A logical collection with stable identifiers and filesystem conventions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub id: Uuid,
    /// Fixed-width derivative of `id`, used in filesystem paths
    pub short_id: String,
    pub name: String,
    pub short_name: String,
    /// Two-letter uppercase state code
    pub state: Option<String>,
    pub loc_type: String,
    pub gps: Option<GpsPosition>,
    pub address: LocationAddress,
    pub census_region: Option<String>,
    pub census_division: Option<String>,
    pub state_direction: Option<String>,
    pub cultural_region: Option<String>,
    /// Fingerprint of the hero image, if chosen
    pub hero_fingerprint: Option<String>,
    pub historic: bool,
    pub favorite: bool,
    pub host_only: bool,
    pub bag_status: BagStatus,
    pub bag_last_verified: Option<DateTime<Utc>>,
    pub bag_last_error: Option<String>,
    pub image_count: i64,
    pub video_count: i64,
    pub document_count: i64,
    pub map_count: i64,
    pub total_bytes: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub status_changed_at: Option<DateTime<Utc>>,
}

impl Location {
    /// Create a new location with a derived short id
    pub fn new(name: impl Into<String>, short_name: impl Into<String>, loc_type: impl Into<String>) -> Self {
        let id = Uuid::new_v4();
        let now = Utc::now();
        Self {
            short_id: short_id_for(&id),
            id,
            name: name.into(),
            short_name: short_name.into(),
            state: None,
            loc_type: loc_type.into(),
            gps: None,
            address: LocationAddress::default(),
            census_region: None,
            census_division: None,
            state_direction: None,
            cultural_region: None,
            hero_fingerprint: None,
            historic: false,
            favorite: false,
            host_only: false,
            bag_status: BagStatus::None,
            bag_last_verified: None,
            bag_last_error: None,
            image_count: 0,
            video_count: 0,
            document_count: 0,
            map_count: 0,
            total_bytes: 0,
            created_at: now,
            updated_at: now,
            status_changed_at: None,
        }
    }

    pub fn with_state(mut self, state: &str) -> Self {
        self.state = Some(state.to_uppercase());
        self
    }

    /// Check model invariants before persisting
    pub fn validate(&self) -> CoreResult<()> {
        if self.short_id.len() != SHORT_ID_LEN {
            return Err(CoreError::Invalid(format!(
                "short id {:?} is not {} characters",
                self.short_id, SHORT_ID_LEN
            )));
        }
        if let Some(state) = &self.state {
            if state.len() != 2 || !state.bytes().all(|b| b.is_ascii_uppercase()) {
                return Err(CoreError::Invalid(format!("state {state:?} is not a two-letter code")));
            }
        }
        if let Some(gps) = &self.gps {
            gps.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_id_is_stable_and_fixed_width() {
        let uuid = Uuid::parse_str("67e55044-10b1-426f-9247-bb680e5fe0c8").unwrap();
        let a = short_id_for(&uuid);
        let b = short_id_for(&uuid);
        assert_eq!(a, b);
        assert_eq!(a.len(), SHORT_ID_LEN);
        assert!(a.bytes().all(|c| CROCKFORD.contains(&c)));
    }

    #[test]
    fn short_ids_differ_across_uuids() {
        let a = short_id_for(&Uuid::new_v4());
        let b = short_id_for(&Uuid::new_v4());
        assert_ne!(a, b);
    }

    #[test]
    fn state_must_be_two_uppercase_letters() {
        let mut loc = Location::new("Old Factory", "old-factory", "Factory");
        loc.state = Some("ny".to_string());
        assert!(loc.validate().is_err());
        loc.state = Some("NY".to_string());
        assert!(loc.validate().is_ok());
    }

    #[test]
    fn gps_range_is_enforced() {
        let mut loc = Location::new("Pier", "pier", "Industrial");
        loc.gps = Some(GpsPosition {
            lat: 91.0,
            lng: 0.0,
            accuracy: None,
            source: None,
            verified: false,
        });
        assert!(loc.validate().is_err());
    }
}
