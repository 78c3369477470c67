//! Reference map ingestion and the unlinked overlay

mod common;

use curator_core::domain::MapKind;
use pretty_assertions::assert_eq;

#[tokio::test]
async fn geojson_pins_import_and_link_to_locations() {
    let (guard, library) = common::test_library().await;
    let location = common::factory_location(&library).await;

    let geojson = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature",
             "geometry": {"type": "Point", "coordinates": [-73.86, 41.01]},
             "properties": {"name": "Old Factory", "state": "NY", "category": "industrial"}},
            {"type": "Feature",
             "geometry": {"type": "Point", "coordinates": [-73.90, 40.99]},
             "properties": {"name": "Grain Elevator"}},
            {"type": "Feature",
             "geometry": {"type": "Point", "coordinates": [-200.0, 41.0]},
             "properties": {"name": "Out Of Range"}}
        ]
    }"#;
    let map_path = common::write_source(guard.path(), "pins.geojson", geojson.as_bytes()).await;

    let map = library.import_reference_map(&map_path).await.unwrap();
    assert_eq!(map.kind, MapKind::Geojson);
    // The out-of-range pin is dropped per point, not fatal
    assert_eq!(map.point_count, 2);

    let unlinked = library.unlinked_points().await.unwrap();
    assert_eq!(unlinked.len(), 2);

    let factory_pin = unlinked
        .iter()
        .find(|p| p.name == "Old Factory")
        .unwrap();
    assert_eq!(factory_pin.state.as_deref(), Some("NY"));
    assert_eq!(factory_pin.map_id, map.id);

    // Linking removes the pin from the unlinked overlay
    library
        .link_point(&factory_pin.id.to_string(), &location.id)
        .await
        .unwrap();
    let remaining = library.unlinked_points().await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].name, "Grain Elevator");
}

#[tokio::test]
async fn csv_pins_import_with_flexible_headers() {
    let (guard, library) = common::test_library().await;

    let csv = "Name,LAT,Lng,Category\nRound Barn,43.1,-75.2,agricultural\n";
    let map_path = common::write_source(guard.path(), "pins.csv", csv.as_bytes()).await;

    let map = library.import_reference_map(&map_path).await.unwrap();
    assert_eq!(map.kind, MapKind::Csv);
    assert_eq!(map.point_count, 1);

    let points = library.unlinked_points().await.unwrap();
    assert_eq!(points[0].category.as_deref(), Some("agricultural"));
    assert_eq!(points[0].lat, 43.1);
}
