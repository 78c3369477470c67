//! Reference map store and pin importers
//!
//! Reads externally produced pin collections (KML, GPX, GeoJSON, CSV) into
//! `reference_maps`/`reference_points`. Points carrying out-of-range
//! coordinates are dropped per point; the map import itself never fails on
//! a bad pin.

use super::Library;
use crate::domain::reference::{MapKind, ReferenceMap, ReferencePoint};
use crate::error::{CoreError, CoreResult};
use crate::infrastructure::database::entities::{reference_map, reference_point};
use chrono::Utc;
use quick_xml::events::Event;
use quick_xml::Reader;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter, TransactionTrait};
use serde_json::{json, Value as JsonValue};
use std::path::Path;
use tracing::{info, warn};
use uuid::Uuid;

/// A pin parsed out of a reference file, before validation
#[derive(Debug, Clone)]
pub struct ParsedPoint {
    pub name: String,
    pub description: Option<String>,
    pub lat: f64,
    pub lng: f64,
    pub state: Option<String>,
    pub category: Option<String>,
    pub aka_names: Vec<String>,
    pub raw: JsonValue,
}

fn point_to_domain(model: reference_point::Model) -> CoreResult<ReferencePoint> {
    let id = Uuid::parse_str(&model.id)
        .map_err(|e| CoreError::Invalid(format!("point id {:?}: {e}", model.id)))?;
    let map_id = Uuid::parse_str(&model.map_id)
        .map_err(|e| CoreError::Invalid(format!("map id {:?}: {e}", model.map_id)))?;
    let location_id = model
        .location_id
        .as_deref()
        .map(Uuid::parse_str)
        .transpose()
        .map_err(|e| CoreError::Invalid(format!("linked location id: {e}")))?;
    let aka_names = model
        .aka_names
        .as_deref()
        .map(serde_json::from_str)
        .transpose()?
        .unwrap_or_default();
    Ok(ReferencePoint {
        id,
        map_id,
        name: model.name,
        description: model.description,
        lat: model.lat,
        lng: model.lng,
        state: model.state,
        category: model.category,
        aka_names,
        location_id,
        raw: model.raw.unwrap_or(JsonValue::Null),
    })
}

impl Library {
    /// Parse a reference file and store its pins
    pub async fn import_reference_map(&self, path: &Path) -> CoreResult<ReferenceMap> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        let kind = MapKind::from_extension(extension)
            .ok_or_else(|| CoreError::Invalid(format!("not a reference map: {}", path.display())))?;

        let content = tokio::fs::read_to_string(path).await?;
        let parsed = match kind {
            MapKind::Geojson => parse_geojson(&content)?,
            MapKind::Csv => parse_csv(&content)?,
            MapKind::Kml => parse_kml(&content)?,
            MapKind::Gpx => parse_gpx(&content)?,
        };

        let map = ReferenceMap {
            id: Uuid::new_v4(),
            file_path: path.to_string_lossy().to_string(),
            kind,
            name: path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("reference map")
                .to_string(),
            point_count: 0,
            imported_at: Utc::now(),
        };

        let mut points = Vec::with_capacity(parsed.len());
        for p in parsed {
            let point = ReferencePoint {
                id: Uuid::new_v4(),
                map_id: map.id,
                name: p.name,
                description: p.description,
                lat: p.lat,
                lng: p.lng,
                state: p.state,
                category: p.category,
                aka_names: p.aka_names,
                location_id: None,
                raw: p.raw,
            };
            if let Err(e) = point.validate() {
                warn!("dropping pin: {e}");
                continue;
            }
            points.push(point);
        }
        let map = ReferenceMap {
            point_count: points.len() as i64,
            ..map
        };

        let txn = self.conn().begin().await?;
        reference_map::ActiveModel {
            id: Set(map.id.to_string()),
            file_path: Set(map.file_path.clone()),
            kind: Set(map.kind.to_string()),
            name: Set(map.name.clone()),
            point_count: Set(map.point_count),
            imported_at: Set(map.imported_at),
        }
        .insert(&txn)
        .await?;

        for point in &points {
            reference_point::ActiveModel {
                id: Set(point.id.to_string()),
                map_id: Set(point.map_id.to_string()),
                name: Set(point.name.clone()),
                description: Set(point.description.clone()),
                lat: Set(point.lat),
                lng: Set(point.lng),
                state: Set(point.state.clone()),
                category: Set(point.category.clone()),
                aka_names: Set(if point.aka_names.is_empty() {
                    None
                } else {
                    Some(serde_json::to_string(&point.aka_names)?)
                }),
                location_id: Set(None),
                raw: Set(Some(point.raw.clone())),
            }
            .insert(&txn)
            .await?;
        }
        txn.commit().await?;

        info!("imported {} pins from {}", points.len(), path.display());
        Ok(map)
    }

    /// Pins not yet tied to a location: the "unlinked" overlay
    pub async fn unlinked_points(&self) -> CoreResult<Vec<ReferencePoint>> {
        reference_point::Entity::find()
            .filter(reference_point::Column::LocationId.is_null())
            .all(self.conn())
            .await?
            .into_iter()
            .map(point_to_domain)
            .collect()
    }

    /// Link a pin to a location, removing it from the unlinked overlay
    pub async fn link_point(&self, point_id: &str, location_id: &Uuid) -> CoreResult<()> {
        reference_point::ActiveModel {
            id: Set(point_id.to_string()),
            location_id: Set(Some(location_id.to_string())),
            ..Default::default()
        }
        .update(self.conn())
        .await?;
        Ok(())
    }
}

fn parse_geojson(content: &str) -> CoreResult<Vec<ParsedPoint>> {
    let doc: JsonValue = serde_json::from_str(content)?;
    let features = doc["features"].as_array().cloned().unwrap_or_default();

    let mut points = Vec::new();
    for feature in features {
        let geometry = &feature["geometry"];
        if geometry["type"].as_str() != Some("Point") {
            continue;
        }
        let Some(coords) = geometry["coordinates"].as_array() else {
            continue;
        };
        let (Some(lng), Some(lat)) = (
            coords.first().and_then(JsonValue::as_f64),
            coords.get(1).and_then(JsonValue::as_f64),
        ) else {
            continue;
        };
        let props = &feature["properties"];
        points.push(ParsedPoint {
            name: props["name"].as_str().unwrap_or("unnamed").to_string(),
            description: props["description"].as_str().map(str::to_string),
            lat,
            lng,
            state: props["state"].as_str().map(str::to_string),
            category: props["category"].as_str().map(str::to_string),
            aka_names: Vec::new(),
            raw: feature.clone(),
        });
    }
    Ok(points)
}

fn parse_csv(content: &str) -> CoreResult<Vec<ParsedPoint>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(content.as_bytes());
    let headers = reader
        .headers()
        .map_err(|e| CoreError::Invalid(format!("csv headers: {e}")))?
        .clone();
    let index_of = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));

    let (Some(lat_idx), Some(lng_idx)) = (index_of("lat"), index_of("lng").or_else(|| index_of("lon"))) else {
        return Err(CoreError::Invalid("csv is missing lat/lng columns".into()));
    };
    let name_idx = index_of("name");
    let desc_idx = index_of("description");
    let state_idx = index_of("state");
    let category_idx = index_of("category");

    let mut points = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| CoreError::Invalid(format!("csv row: {e}")))?;
        let (Some(lat), Some(lng)) = (
            record.get(lat_idx).and_then(|v| v.trim().parse().ok()),
            record.get(lng_idx).and_then(|v| v.trim().parse().ok()),
        ) else {
            continue;
        };
        let field = |idx: Option<usize>| {
            idx.and_then(|i| record.get(i))
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        points.push(ParsedPoint {
            name: field(name_idx).unwrap_or_else(|| "unnamed".to_string()),
            description: field(desc_idx),
            lat,
            lng,
            state: field(state_idx),
            category: field(category_idx),
            aka_names: Vec::new(),
            raw: json!({ "row": record.iter().collect::<Vec<_>>() }),
        });
    }
    Ok(points)
}

fn parse_kml(content: &str) -> CoreResult<Vec<ParsedPoint>> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut points = Vec::new();
    let mut in_placemark = false;
    let mut current_tag: Vec<u8> = Vec::new();
    let mut name = String::new();
    let mut description = None;
    let mut coords: Option<(f64, f64)> = None;

    loop {
        match reader
            .read_event()
            .map_err(|e| CoreError::Invalid(format!("kml parse: {e}")))?
        {
            Event::Start(e) => {
                let tag = e.local_name().as_ref().to_vec();
                if tag == b"Placemark" {
                    in_placemark = true;
                    name.clear();
                    description = None;
                    coords = None;
                }
                current_tag = tag;
            }
            Event::Text(t) if in_placemark => {
                let text = t
                    .unescape()
                    .map_err(|e| CoreError::Invalid(format!("kml text: {e}")))?
                    .into_owned();
                match current_tag.as_slice() {
                    b"name" => name = text,
                    b"description" => description = Some(text),
                    b"coordinates" => {
                        let mut parts = text.split(',');
                        if let (Some(lng), Some(lat)) = (
                            parts.next().and_then(|v| v.trim().parse().ok()),
                            parts.next().and_then(|v| v.trim().parse().ok()),
                        ) {
                            coords = Some((lat, lng));
                        }
                    }
                    _ => {}
                }
            }
            Event::End(e) if e.local_name().as_ref() == b"Placemark" => {
                in_placemark = false;
                if let Some((lat, lng)) = coords.take() {
                    points.push(ParsedPoint {
                        name: if name.is_empty() { "unnamed".to_string() } else { name.clone() },
                        description: description.take(),
                        lat,
                        lng,
                        state: None,
                        category: None,
                        aka_names: Vec::new(),
                        raw: json!({ "source": "kml" }),
                    });
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(points)
}

fn parse_gpx(content: &str) -> CoreResult<Vec<ParsedPoint>> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut points = Vec::new();
    let mut current: Option<ParsedPoint> = None;
    let mut current_tag: Vec<u8> = Vec::new();

    loop {
        match reader
            .read_event()
            .map_err(|e| CoreError::Invalid(format!("gpx parse: {e}")))?
        {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"wpt" => {
                let mut lat = None;
                let mut lng = None;
                for attr in e.attributes().flatten() {
                    let value = String::from_utf8_lossy(&attr.value).to_string();
                    match attr.key.local_name().as_ref() {
                        b"lat" => lat = value.trim().parse().ok(),
                        b"lon" => lng = value.trim().parse().ok(),
                        _ => {}
                    }
                }
                if let (Some(lat), Some(lng)) = (lat, lng) {
                    current = Some(ParsedPoint {
                        name: "unnamed".to_string(),
                        description: None,
                        lat,
                        lng,
                        state: None,
                        category: None,
                        aka_names: Vec::new(),
                        raw: json!({ "source": "gpx" }),
                    });
                }
                current_tag.clear();
            }
            Event::Start(e) => {
                current_tag = e.local_name().as_ref().to_vec();
            }
            Event::Text(t) => {
                if let Some(point) = current.as_mut() {
                    let text = t
                        .unescape()
                        .map_err(|e| CoreError::Invalid(format!("gpx text: {e}")))?
                        .into_owned();
                    match current_tag.as_slice() {
                        b"name" => point.name = text,
                        b"desc" => point.description = Some(text),
                        _ => {}
                    }
                }
            }
            Event::End(e) if e.local_name().as_ref() == b"wpt" => {
                if let Some(point) = current.take() {
                    points.push(point);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geojson_points_parse() {
        let doc = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [-73.9, 41.0]},
                 "properties": {"name": "Mill", "state": "NY", "category": "industrial"}},
                {"type": "Feature", "geometry": {"type": "LineString", "coordinates": []}, "properties": {}}
            ]
        }"#;
        let points = parse_geojson(doc).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].name, "Mill");
        assert_eq!(points[0].lat, 41.0);
        assert_eq!(points[0].lng, -73.9);
    }

    #[test]
    fn csv_points_parse() {
        let doc = "name,lat,lng,category\nMill,41.0,-73.9,industrial\nBad,,,x\n";
        let points = parse_csv(doc).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].category.as_deref(), Some("industrial"));
    }

    #[test]
    fn kml_placemarks_parse() {
        let doc = r#"<?xml version="1.0"?>
            <kml><Document><Placemark>
                <name>Mill</name>
                <Point><coordinates>-73.9,41.0,0</coordinates></Point>
            </Placemark></Document></kml>"#;
        let points = parse_kml(doc).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].name, "Mill");
        assert_eq!(points[0].lat, 41.0);
    }

    #[test]
    fn gpx_waypoints_parse() {
        let doc = r#"<?xml version="1.0"?>
            <gpx><wpt lat="41.0" lon="-73.9"><name>Mill</name></wpt></gpx>"#;
        let points = parse_gpx(doc).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].lng, -73.9);
    }
}
