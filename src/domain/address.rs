//! Address and region normalization
//!
//! Canonicalizes operator- or geocoder-supplied addresses and derives the
//! census and cultural groupings used for browsing. All lookups are closed
//! tables; nothing here talks to the network.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::warn;

/// Geocode confidence, passed through from the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        };
        f.write_str(s)
    }
}

/// Unnormalized address input
#[derive(Debug, Clone, Default)]
pub struct RawAddress {
    pub street: Option<String>,
    pub city: Option<String>,
    pub county: Option<String>,
    pub state: Option<String>,
    pub zipcode: Option<String>,
    pub confidence: Option<Confidence>,
}

/// Canonicalized address
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedAddress {
    pub street: Option<String>,
    pub city: Option<String>,
    pub county: Option<String>,
    /// Two-letter uppercase code
    pub state: Option<String>,
    /// `DDDDD` or `DDDDD-DDDD`
    pub zipcode: Option<String>,
    pub confidence: Option<Confidence>,
}

/// Census-bureau and cultural groupings derived from a state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionInfo {
    pub census_region: Option<String>,
    pub census_division: Option<String>,
    /// Compass position within the state, from GPS vs the state centroid
    pub state_direction: Option<String>,
    /// Suggestion only; callers keep any value already set
    pub cultural_region: Option<String>,
}

struct StateInfo {
    census_region: &'static str,
    census_division: &'static str,
    cultural_region: &'static str,
    /// Approximate geographic centroid
    centroid: (f64, f64),
}

macro_rules! state_table {
    ($($code:literal => $name:literal, $region:literal, $division:literal, $cultural:literal, ($lat:literal, $lng:literal);)*) => {
        static STATES: Lazy<HashMap<&'static str, StateInfo>> = Lazy::new(|| {
            let mut m = HashMap::new();
            $(m.insert($code, StateInfo {
                census_region: $region,
                census_division: $division,
                cultural_region: $cultural,
                centroid: ($lat, $lng),
            });)*
            m
        });
        static STATE_NAMES: Lazy<HashMap<String, &'static str>> = Lazy::new(|| {
            let mut m = HashMap::new();
            $(m.insert($name.to_ascii_lowercase(), $code);)*
            m
        });
    };
}

state_table! {
    "AL" => "Alabama", "South", "East South Central", "Deep South", (32.8, -86.8);
    "AK" => "Alaska", "West", "Pacific", "Alaska", (64.0, -152.0);
    "AZ" => "Arizona", "West", "Mountain", "Southwest", (34.3, -111.7);
    "AR" => "Arkansas", "South", "West South Central", "Upland South", (34.9, -92.4);
    "CA" => "California", "West", "Pacific", "West Coast", (37.2, -119.3);
    "CO" => "Colorado", "West", "Mountain", "Mountain West", (39.0, -105.5);
    "CT" => "Connecticut", "Northeast", "New England", "New England", (41.6, -72.7);
    "DE" => "Delaware", "South", "South Atlantic", "Mid-Atlantic", (39.0, -75.5);
    "DC" => "District of Columbia", "South", "South Atlantic", "Mid-Atlantic", (38.9, -77.0);
    "FL" => "Florida", "South", "South Atlantic", "Deep South", (28.6, -82.4);
    "GA" => "Georgia", "South", "South Atlantic", "Deep South", (32.6, -83.4);
    "HI" => "Hawaii", "West", "Pacific", "Hawaii", (20.3, -156.4);
    "ID" => "Idaho", "West", "Mountain", "Mountain West", (44.4, -114.6);
    "IL" => "Illinois", "Midwest", "East North Central", "Midwest", (40.0, -89.2);
    "IN" => "Indiana", "Midwest", "East North Central", "Midwest", (39.9, -86.3);
    "IA" => "Iowa", "Midwest", "West North Central", "Midwest", (42.1, -93.5);
    "KS" => "Kansas", "Midwest", "West North Central", "Great Plains", (38.5, -98.4);
    "KY" => "Kentucky", "South", "East South Central", "Upland South", (37.5, -85.3);
    "LA" => "Louisiana", "South", "West South Central", "Deep South", (31.1, -92.0);
    "ME" => "Maine", "Northeast", "New England", "New England", (45.4, -69.2);
    "MD" => "Maryland", "South", "South Atlantic", "Mid-Atlantic", (39.0, -76.8);
    "MA" => "Massachusetts", "Northeast", "New England", "New England", (42.3, -71.8);
    "MI" => "Michigan", "Midwest", "East North Central", "Midwest", (44.3, -85.4);
    "MN" => "Minnesota", "Midwest", "West North Central", "Midwest", (46.3, -94.3);
    "MS" => "Mississippi", "South", "East South Central", "Deep South", (32.7, -89.7);
    "MO" => "Missouri", "Midwest", "West North Central", "Midwest", (38.4, -92.5);
    "MT" => "Montana", "West", "Mountain", "Mountain West", (47.0, -109.6);
    "NE" => "Nebraska", "Midwest", "West North Central", "Great Plains", (41.5, -99.8);
    "NV" => "Nevada", "West", "Mountain", "Mountain West", (39.3, -116.6);
    "NH" => "New Hampshire", "Northeast", "New England", "New England", (43.7, -71.6);
    "NJ" => "New Jersey", "Northeast", "Middle Atlantic", "Mid-Atlantic", (40.1, -74.7);
    "NM" => "New Mexico", "West", "Mountain", "Southwest", (34.4, -106.1);
    "NY" => "New York", "Northeast", "Middle Atlantic", "Mid-Atlantic", (42.9, -75.5);
    "NC" => "North Carolina", "South", "South Atlantic", "Upland South", (35.5, -79.4);
    "ND" => "North Dakota", "Midwest", "West North Central", "Great Plains", (47.4, -100.5);
    "OH" => "Ohio", "Midwest", "East North Central", "Midwest", (40.3, -82.8);
    "OK" => "Oklahoma", "South", "West South Central", "Great Plains", (35.6, -97.5);
    "OR" => "Oregon", "West", "Pacific", "Pacific Northwest", (43.9, -120.6);
    "PA" => "Pennsylvania", "Northeast", "Middle Atlantic", "Mid-Atlantic", (40.9, -77.8);
    "RI" => "Rhode Island", "Northeast", "New England", "New England", (41.7, -71.6);
    "SC" => "South Carolina", "South", "South Atlantic", "Deep South", (33.9, -80.9);
    "SD" => "South Dakota", "Midwest", "West North Central", "Great Plains", (44.4, -100.2);
    "TN" => "Tennessee", "South", "East South Central", "Upland South", (35.8, -86.3);
    "TX" => "Texas", "South", "West South Central", "Texas", (31.5, -99.3);
    "UT" => "Utah", "West", "Mountain", "Mountain West", (39.3, -111.7);
    "VT" => "Vermont", "Northeast", "New England", "New England", (44.1, -72.7);
    "VA" => "Virginia", "South", "South Atlantic", "Upland South", (37.5, -78.9);
    "WA" => "Washington", "West", "Pacific", "Pacific Northwest", (47.4, -120.4);
    "WV" => "West Virginia", "South", "South Atlantic", "Appalachia", (38.6, -80.6);
    "WI" => "Wisconsin", "Midwest", "East North Central", "Midwest", (44.6, -89.7);
    "WY" => "Wyoming", "West", "Mountain", "Mountain West", (43.0, -107.6);
}

/// Normalize a state name or code to its two-letter uppercase form
pub fn normalize_state(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    let upper = trimmed.to_ascii_uppercase();
    if upper.len() == 2 && STATES.contains_key(upper.as_str()) {
        return Some(upper);
    }
    STATE_NAMES
        .get(&trimmed.to_ascii_lowercase())
        .map(|code| (*code).to_string())
}

/// Normalize a zip code to `DDDDD` or `DDDDD-DDDD`
pub fn normalize_zipcode(input: &str) -> Option<String> {
    let digits: String = input.chars().filter(|c| c.is_ascii_digit()).collect();
    match digits.len() {
        5 => Some(digits),
        9 => Some(format!("{}-{}", &digits[..5], &digits[5..])),
        _ => None,
    }
}

fn title_case(input: &str) -> String {
    input
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn single_spaced(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Canonicalize an address. Invalid fields become `None` and are logged;
/// the record itself is never rejected. Idempotent.
pub fn normalize_address(raw: &RawAddress) -> NormalizedAddress {
    let state = raw.state.as_deref().and_then(|s| {
        let normalized = normalize_state(s);
        if normalized.is_none() {
            warn!("unrecognized state {s:?} dropped during normalization");
        }
        normalized
    });

    let zipcode = raw.zipcode.as_deref().and_then(|z| {
        let normalized = normalize_zipcode(z);
        if normalized.is_none() {
            warn!("unparseable zip code {z:?} dropped during normalization");
        }
        normalized
    });

    let county = raw.county.as_deref().map(|c| {
        let c = title_case(c);
        c.strip_suffix(" County").map(str::to_string).unwrap_or(c)
    });

    NormalizedAddress {
        street: raw.street.as_deref().map(single_spaced).filter(|s| !s.is_empty()),
        city: raw.city.as_deref().map(title_case).filter(|s| !s.is_empty()),
        county: county.filter(|s| !s.is_empty()),
        state,
        zipcode,
        confidence: raw.confidence,
    }
}

/// Derive census and cultural groupings from a state code and optional GPS
pub fn derive_regions(state: Option<&str>, lat: Option<f64>, lng: Option<f64>) -> RegionInfo {
    let Some(info) = state.and_then(|code| STATES.get(code)) else {
        return RegionInfo::default();
    };

    let state_direction = match (lat, lng) {
        (Some(lat), Some(lng)) => {
            let (clat, clng) = info.centroid;
            let ns = if lat >= clat { "north" } else { "south" };
            let ew = if lng >= clng { "east" } else { "west" };
            Some(format!("{ns}{ew}"))
        }
        _ => None,
    };

    RegionInfo {
        census_region: Some(info.census_region.to_string()),
        census_division: Some(info.census_division.to_string()),
        state_direction,
        cultural_region: Some(info.cultural_region.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn state_codes_and_names_normalize() {
        assert_eq!(normalize_state("ny"), Some("NY".to_string()));
        assert_eq!(normalize_state("New York"), Some("NY".to_string()));
        assert_eq!(normalize_state("new york"), Some("NY".to_string()));
        assert_eq!(normalize_state("Narnia"), None);
    }

    #[test]
    fn zipcodes_strip_non_digits() {
        assert_eq!(normalize_zipcode("12345"), Some("12345".to_string()));
        assert_eq!(normalize_zipcode(" 12345-6789 "), Some("12345-6789".to_string()));
        assert_eq!(normalize_zipcode("123456789"), Some("12345-6789".to_string()));
        assert_eq!(normalize_zipcode("1234"), None);
    }

    #[test]
    fn county_title_cased_and_suffix_stripped() {
        let raw = RawAddress {
            county: Some("westchester county".to_string()),
            ..Default::default()
        };
        assert_eq!(normalize_address(&raw).county, Some("Westchester".to_string()));
    }

    #[test]
    fn normalization_is_idempotent() {
        let raw = RawAddress {
            street: Some("  12   Main   St ".to_string()),
            city: Some("yonkers".to_string()),
            county: Some("westchester county".to_string()),
            state: Some("new york".to_string()),
            zipcode: Some("10701-0000".to_string()),
            confidence: Some(Confidence::High),
        };
        let once = normalize_address(&raw);
        let again = normalize_address(&RawAddress {
            street: once.street.clone(),
            city: once.city.clone(),
            county: once.county.clone(),
            state: once.state.clone(),
            zipcode: once.zipcode.clone(),
            confidence: once.confidence,
        });
        assert_eq!(once, again);
    }

    #[test]
    fn invalid_fields_null_without_rejecting_record() {
        let raw = RawAddress {
            city: Some("yonkers".to_string()),
            state: Some("XQ".to_string()),
            zipcode: Some("abc".to_string()),
            ..Default::default()
        };
        let normalized = normalize_address(&raw);
        assert_eq!(normalized.city, Some("Yonkers".to_string()));
        assert_eq!(normalized.state, None);
        assert_eq!(normalized.zipcode, None);
    }

    #[test]
    fn regions_derive_from_state_and_centroid() {
        let info = derive_regions(Some("NY"), Some(40.7), Some(-74.0));
        assert_eq!(info.census_region.as_deref(), Some("Northeast"));
        assert_eq!(info.census_division.as_deref(), Some("Middle Atlantic"));
        assert_eq!(info.state_direction.as_deref(), Some("southeast"));
        assert_eq!(info.cultural_region.as_deref(), Some("Mid-Atlantic"));
    }
}
