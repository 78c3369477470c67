//! Location store

use super::Library;
use crate::domain::address::{derive_regions, normalize_address, RawAddress};
use crate::domain::location::{BagStatus, GpsPosition, Location, LocationAddress};
use crate::error::{CoreError, CoreResult};
use crate::infrastructure::database::entities::{document, image, location, map_file, sublocation, video};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter,
};
use tracing::debug;
use uuid::Uuid;

fn to_domain(model: location::Model) -> CoreResult<Location> {
    let id = Uuid::parse_str(&model.id)
        .map_err(|e| CoreError::Invalid(format!("location id {:?}: {e}", model.id)))?;
    let gps = match (model.gps_lat, model.gps_lng) {
        (Some(lat), Some(lng)) => Some(GpsPosition {
            lat,
            lng,
            accuracy: model.gps_accuracy,
            source: model.gps_source.clone(),
            verified: model.gps_verified,
        }),
        _ => None,
    };
    Ok(Location {
        id,
        short_id: model.short_id,
        name: model.name,
        short_name: model.short_name,
        state: model.state,
        loc_type: model.loc_type,
        gps,
        address: LocationAddress {
            street: model.address_street,
            city: model.address_city,
            county: model.address_county,
            state: model.address_state,
            zipcode: model.address_zip,
            confidence: model.address_confidence,
            geocoded_at: model.geocoded_at,
        },
        census_region: model.census_region,
        census_division: model.census_division,
        state_direction: model.state_direction,
        cultural_region: model.cultural_region,
        hero_fingerprint: model.hero_fingerprint,
        historic: model.historic,
        favorite: model.favorite,
        host_only: model.host_only,
        bag_status: BagStatus::parse(&model.bag_status).unwrap_or(BagStatus::None),
        bag_last_verified: model.bag_last_verified,
        bag_last_error: model.bag_last_error,
        image_count: model.image_count,
        video_count: model.video_count,
        document_count: model.document_count,
        map_count: model.map_count,
        total_bytes: model.total_bytes,
        created_at: model.created_at,
        updated_at: model.updated_at,
        status_changed_at: model.status_changed_at,
    })
}

fn to_active(loc: &Location) -> location::ActiveModel {
    location::ActiveModel {
        id: Set(loc.id.to_string()),
        short_id: Set(loc.short_id.clone()),
        name: Set(loc.name.clone()),
        short_name: Set(loc.short_name.clone()),
        state: Set(loc.state.clone()),
        loc_type: Set(loc.loc_type.clone()),
        gps_lat: Set(loc.gps.as_ref().map(|g| g.lat)),
        gps_lng: Set(loc.gps.as_ref().map(|g| g.lng)),
        gps_accuracy: Set(loc.gps.as_ref().and_then(|g| g.accuracy)),
        gps_source: Set(loc.gps.as_ref().and_then(|g| g.source.clone())),
        gps_verified: Set(loc.gps.as_ref().map(|g| g.verified).unwrap_or(false)),
        address_street: Set(loc.address.street.clone()),
        address_city: Set(loc.address.city.clone()),
        address_county: Set(loc.address.county.clone()),
        address_state: Set(loc.address.state.clone()),
        address_zip: Set(loc.address.zipcode.clone()),
        address_confidence: Set(loc.address.confidence.clone()),
        geocoded_at: Set(loc.address.geocoded_at),
        census_region: Set(loc.census_region.clone()),
        census_division: Set(loc.census_division.clone()),
        state_direction: Set(loc.state_direction.clone()),
        cultural_region: Set(loc.cultural_region.clone()),
        hero_fingerprint: Set(loc.hero_fingerprint.clone()),
        historic: Set(loc.historic),
        favorite: Set(loc.favorite),
        host_only: Set(loc.host_only),
        bag_status: Set(loc.bag_status.to_string()),
        bag_last_verified: Set(loc.bag_last_verified),
        bag_last_error: Set(loc.bag_last_error.clone()),
        image_count: Set(loc.image_count),
        video_count: Set(loc.video_count),
        document_count: Set(loc.document_count),
        map_count: Set(loc.map_count),
        total_bytes: Set(loc.total_bytes),
        created_at: Set(loc.created_at),
        updated_at: Set(loc.updated_at),
        status_changed_at: Set(loc.status_changed_at),
    }
}

impl Library {
    pub async fn create_location(&self, loc: &Location) -> CoreResult<()> {
        loc.validate()?;
        to_active(loc).insert(self.conn()).await?;
        debug!("created location {} ({})", loc.name, loc.short_id);
        Ok(())
    }

    pub async fn get_location(&self, id: &Uuid) -> CoreResult<Option<Location>> {
        location::Entity::find_by_id(id.to_string())
            .one(self.conn())
            .await?
            .map(to_domain)
            .transpose()
    }

    pub async fn require_location(&self, id: &Uuid) -> CoreResult<Location> {
        self.get_location(id)
            .await?
            .ok_or_else(|| CoreError::not_found(format!("location {id}")))
    }

    pub async fn get_location_by_short_id(&self, short_id: &str) -> CoreResult<Option<Location>> {
        location::Entity::find()
            .filter(location::Column::ShortId.eq(short_id))
            .one(self.conn())
            .await?
            .map(to_domain)
            .transpose()
    }

    pub async fn list_locations(&self) -> CoreResult<Vec<Location>> {
        location::Entity::find()
            .all(self.conn())
            .await?
            .into_iter()
            .map(to_domain)
            .collect()
    }

    /// Full-row update; bumps `updated_at`
    pub async fn update_location(&self, loc: &Location) -> CoreResult<()> {
        loc.validate()?;
        let mut active = to_active(loc);
        active.updated_at = Set(Utc::now());
        active.update(self.conn()).await?;
        Ok(())
    }

    /// Normalize and apply an address, then refresh the derived regions.
    /// The cultural region is a suggestion only: an existing value wins.
    pub async fn apply_address(&self, id: &Uuid, raw: &RawAddress) -> CoreResult<Location> {
        let mut loc = self.require_location(id).await?;
        let normalized = normalize_address(raw);

        if loc.state.is_none() {
            loc.state = normalized.state.clone();
        }
        loc.address = LocationAddress {
            street: normalized.street,
            city: normalized.city,
            county: normalized.county,
            state: normalized.state,
            zipcode: normalized.zipcode,
            confidence: normalized.confidence.map(|c| c.to_string()),
            geocoded_at: Some(Utc::now()),
        };

        let regions = derive_regions(
            loc.state.as_deref(),
            loc.gps.as_ref().map(|g| g.lat),
            loc.gps.as_ref().map(|g| g.lng),
        );
        loc.census_region = regions.census_region;
        loc.census_division = regions.census_division;
        loc.state_direction = regions.state_direction;
        if loc.cultural_region.is_none() {
            loc.cultural_region = regions.cultural_region;
        }

        self.update_location(&loc).await?;
        Ok(loc)
    }

    pub async fn update_bag_status(
        &self,
        id: &Uuid,
        status: BagStatus,
        error: Option<String>,
    ) -> CoreResult<()> {
        let model = location::ActiveModel {
            id: Set(id.to_string()),
            bag_status: Set(status.to_string()),
            bag_last_verified: Set(Some(Utc::now())),
            bag_last_error: Set(error),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };
        model.update(self.conn()).await?;
        Ok(())
    }

    /// Recount media rows and byte totals from the kind tables
    pub async fn refresh_location_stats(&self, id: &Uuid) -> CoreResult<()> {
        let id_str = id.to_string();
        let conn = self.conn();

        let image_count = image::Entity::find()
            .filter(image::Column::LocationId.eq(&id_str))
            .count(conn)
            .await? as i64;
        let video_count = video::Entity::find()
            .filter(video::Column::LocationId.eq(&id_str))
            .count(conn)
            .await? as i64;
        let document_count = document::Entity::find()
            .filter(document::Column::LocationId.eq(&id_str))
            .count(conn)
            .await? as i64;
        let map_count = map_file::Entity::find()
            .filter(map_file::Column::LocationId.eq(&id_str))
            .count(conn)
            .await? as i64;

        let total_bytes = self
            .media_for_location(id)
            .await?
            .iter()
            .map(|m| m.size_bytes)
            .sum::<i64>();

        let model = location::ActiveModel {
            id: Set(id_str),
            image_count: Set(image_count),
            video_count: Set(video_count),
            document_count: Set(document_count),
            map_count: Set(map_count),
            total_bytes: Set(total_bytes),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };
        model.update(self.conn()).await?;
        Ok(())
    }

    /// Point the location's hero at an archived image. The fingerprint
    /// must name an image indexed under this location.
    pub async fn set_hero_image(&self, id: &Uuid, fingerprint: &str) -> CoreResult<()> {
        let owned = self
            .get_image(fingerprint)
            .await?
            .map(|m| m.location_id == id.to_string())
            .unwrap_or(false);
        if !owned {
            return Err(CoreError::Invalid(format!(
                "image {fingerprint} is not archived under location {id}"
            )));
        }
        location::ActiveModel {
            id: Set(id.to_string()),
            hero_fingerprint: Set(Some(fingerprint.to_string())),
            updated_at: Set(Utc::now()),
            ..Default::default()
        }
        .update(self.conn())
        .await?;
        Ok(())
    }

    pub async fn create_sublocation(
        &self,
        location_id: &Uuid,
        name: &str,
        description: Option<String>,
    ) -> CoreResult<String> {
        let now = Utc::now();
        let id = Uuid::new_v4().to_string();
        sublocation::ActiveModel {
            id: Set(id.clone()),
            location_id: Set(location_id.to_string()),
            name: Set(name.to_string()),
            description: Set(description),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.conn())
        .await?;
        Ok(id)
    }

    pub async fn sublocations_for_location(
        &self,
        location_id: &Uuid,
    ) -> CoreResult<Vec<sublocation::Model>> {
        Ok(sublocation::Entity::find()
            .filter(sublocation::Column::LocationId.eq(location_id.to_string()))
            .all(self.conn())
            .await?)
    }

    /// External operation; cascades to media and sublocations
    pub async fn delete_location(&self, id: &Uuid) -> CoreResult<()> {
        location::Entity::delete_by_id(id.to_string())
            .exec(self.conn())
            .await?;
        Ok(())
    }
}
