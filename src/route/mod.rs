use std::fmt::Display;

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue};
use serde::Deserialize;
use tracing::warn;

mod client;
pub use client::*;

use crate::shared::geo::Coordinate;

/// Travel profile understood by the directions provider.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    #[default]
    Cycling,
    Walking,
    Driving,
}

impl Profile {
    pub const fn as_path(&self) -> &'static str {
        match self {
            Profile::Cycling => "mapbox/cycling",
            Profile::Walking => "mapbox/walking",
            Profile::Driving => "mapbox/driving",
        }
    }
}

impl Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_path())
    }
}

/// Source of route geometry. The session controller is generic over this so
/// tests can hand back canned routes.
#[allow(async_fn_in_trait)]
pub trait RouteProvider {
    async fn fetch_route(&self, profile: Profile, waypoints: &[Coordinate]) -> FeatureCollection;
}

#[derive(Deserialize, Default)]
struct DirectionsResponse {
    #[serde(default)]
    routes: Vec<DirectionsRoute>,
}

#[derive(Deserialize)]
struct DirectionsRoute {
    geometry: Option<Geometry>,
    #[serde(default)]
    distance: f64,
    #[serde(default)]
    duration: f64,
}

/// A route with no geometry; the renderer skips drawing it.
pub fn empty_route() -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: Vec::new(),
        foreign_members: None,
    }
}

/// Turns a raw directions payload into a single-feature collection holding
/// the first route's geometry plus its distance and duration. Anything the
/// payload is missing collapses to the empty collection.
pub fn parse_directions_response(payload: serde_json::Value) -> FeatureCollection {
    let response: DirectionsResponse = match serde_json::from_value(payload) {
        Ok(response) => response,
        Err(err) => {
            warn!("Malformed directions response: {err}");
            return empty_route();
        }
    };

    let Some(route) = response.routes.into_iter().next() else {
        warn!("Directions response carried no routes");
        return empty_route();
    };
    let Some(geometry) = route.geometry else {
        warn!("Directions response route is missing geometry");
        return empty_route();
    };

    let mut properties = JsonObject::new();
    properties.insert("distance".into(), JsonValue::from(route.distance));
    properties.insert("duration".into(), JsonValue::from(route.duration));

    FeatureCollection {
        bbox: None,
        features: vec![Feature {
            bbox: None,
            geometry: Some(geometry),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        }],
        foreign_members: None,
    }
}

/// Distance in meters and duration in seconds of a rendered route.
pub fn route_summary(route: &FeatureCollection) -> Option<(f64, f64)> {
    let properties = route.features.first()?.properties.as_ref()?;
    let scalar = |key: &str| properties.get(key).and_then(JsonValue::as_f64);
    Some((scalar("distance")?, scalar("duration")?))
}

/// Waypoints joined into the provider's `lon,lat;lon,lat` path segment.
pub(crate) fn join_waypoints(waypoints: &[Coordinate]) -> String {
    waypoints
        .iter()
        .map(|coord| format!("{},{}", coord.longitude, coord.latitude))
        .collect::<Vec<_>>()
        .join(";")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_waypoints_test() {
        let path = join_waypoints(&[
            Coordinate::new(121.5, 25.0),
            Coordinate::new(121.6, 25.1),
        ]);
        assert_eq!(path, "121.5,25;121.6,25.1");
    }

    #[test]
    fn empty_routes_parse_test() {
        let route = parse_directions_response(serde_json::json!({ "routes": [] }));
        assert!(route.features.is_empty());
    }

    #[test]
    fn summary_of_empty_route_test() {
        assert!(route_summary(&empty_route()).is_none());
    }
}
