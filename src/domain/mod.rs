//! Core domain models
//!
//! Plain types with their invariants; persistence lives in
//! `infrastructure::database` and the `library` stores.

pub mod address;
pub mod file_kind;
pub mod location;
pub mod media;
pub mod reference;

pub use address::{derive_regions, normalize_address, Confidence, NormalizedAddress, RawAddress, RegionInfo};
pub use file_kind::{classify_extension, Classification};
pub use location::{short_id_for, BagStatus, GpsPosition, Location, LocationAddress};
pub use media::{HiddenReason, MediaKind};
pub use reference::{MapKind, ReferenceMap, ReferencePoint};
