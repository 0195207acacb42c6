use pedalhop::route::{empty_route, parse_directions_response, route_summary};

fn full_payload() -> serde_json::Value {
    serde_json::json!({
        "routes": [{
            "geometry": {
                "type": "LineString",
                "coordinates": [[121.56, 25.04], [121.57, 25.05], [121.58, 25.05]],
            },
            "distance": 2543.7,
            "duration": 612.4,
        }],
        "waypoints": [],
        "code": "Ok",
    })
}

#[test]
fn parse_full_response_test() {
    let route = parse_directions_response(full_payload());
    assert_eq!(route.features.len(), 1);

    let feature = &route.features[0];
    let geometry = feature.geometry.as_ref().unwrap();
    match &geometry.value {
        geojson::Value::LineString(coords) => assert_eq!(coords.len(), 3),
        other => panic!("Expected a LineString, got {other:?}"),
    }

    let (distance, duration) = route_summary(&route).unwrap();
    assert_eq!(distance, 2543.7);
    assert_eq!(duration, 612.4);
}

#[test]
fn parse_empty_routes_test() {
    let route = parse_directions_response(serde_json::json!({ "routes": [] }));
    assert!(route.features.is_empty());

    let rendered = serde_json::to_value(&route).unwrap();
    assert_eq!(
        rendered,
        serde_json::json!({ "type": "FeatureCollection", "features": [] })
    );
}

#[test]
fn parse_missing_routes_key_test() {
    let route = parse_directions_response(serde_json::json!({ "code": "NoRoute" }));
    assert!(route.features.is_empty());
}

#[test]
fn parse_route_without_geometry_test() {
    let route = parse_directions_response(serde_json::json!({
        "routes": [{ "distance": 100.0, "duration": 60.0 }],
    }));
    assert!(route.features.is_empty());
}

#[test]
fn parse_malformed_payload_test() {
    let route = parse_directions_response(serde_json::json!({ "routes": "not-a-list" }));
    assert!(route.features.is_empty());
}

#[test]
fn empty_route_serializes_to_empty_collection_test() {
    let rendered = serde_json::to_value(empty_route()).unwrap();
    assert_eq!(rendered["type"], "FeatureCollection");
    assert_eq!(rendered["features"].as_array().unwrap().len(), 0);
}
