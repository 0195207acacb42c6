use std::sync::Arc;

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::shared::geo::Coordinate;

/// One record of the upstream inventory feed. The feed has shipped two
/// naming schemes over its lifetime and mixes them freely, so every field
/// that was ever renamed shows up here twice.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RawStation {
    /// Station name, the only stable identity the feed carries.
    pub sna: String,
    // Legacy names.
    pub sbi: Option<u32>,
    pub bemp: Option<u32>,
    pub tot: Option<u32>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    // Current names.
    pub available_rent_bikes: Option<u32>,
    pub available_return_bikes: Option<u32>,
    #[serde(rename = "Quantity")]
    pub quantity: Option<u32>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// A bike-share dock location.
///
/// Counts are non-negative by construction. The feed does not guarantee
/// `bikes_available <= capacity` and we keep whatever it reports.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Station {
    pub name: Arc<str>,
    pub bikes_available: u32,
    pub docks_available: u32,
    pub capacity: u32,
    pub coordinate: Coordinate,
}

impl Station {
    /// Normalizes a raw record, preferring the current field names and
    /// falling back to the legacy ones, then to zero for the counts.
    ///
    /// A record without a coordinate under either scheme is dropped: that is
    /// a data-quality bug upstream, not a station at (0, 0).
    pub fn from_raw(raw: RawStation) -> Option<Self> {
        let longitude = raw.longitude.or(raw.lng);
        let latitude = raw.latitude.or(raw.lat);
        let (Some(longitude), Some(latitude)) = (longitude, latitude) else {
            warn!("Dropping station {:?} without a coordinate", raw.sna);
            return None;
        };

        Some(Self {
            name: raw.sna.into(),
            bikes_available: raw.available_rent_bikes.or(raw.sbi).unwrap_or(0),
            docks_available: raw.available_return_bikes.or(raw.bemp).unwrap_or(0),
            capacity: raw.quantity.or(raw.tot).unwrap_or(0),
            coordinate: Coordinate {
                longitude,
                latitude,
            },
        })
    }

    /// Point feature for the stations map source.
    pub fn to_feature(&self) -> Feature {
        let mut properties = JsonObject::new();
        properties.insert("name".into(), JsonValue::from(self.name.as_ref()));
        properties.insert("bikes".into(), JsonValue::from(self.bikes_available));
        properties.insert("docks".into(), JsonValue::from(self.docks_available));
        properties.insert("capacity".into(), JsonValue::from(self.capacity));

        Feature {
            bbox: None,
            geometry: Some(Geometry::new(geojson::Value::Point(
                self.coordinate.to_position(),
            ))),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        }
    }

    /// Decodes a rendered station feature back into a record, used for
    /// hover and click hits coming out of the map surface.
    pub fn from_feature(feature: &Feature) -> Option<Self> {
        let geometry = feature.geometry.as_ref()?;
        let geojson::Value::Point(position) = &geometry.value else {
            return None;
        };
        let coordinate = Coordinate::from_position(position)?;
        let properties = feature.properties.as_ref()?;
        let name = properties.get("name")?.as_str()?;
        let count = |key: &str| {
            properties
                .get(key)
                .and_then(JsonValue::as_u64)
                .unwrap_or(0) as u32
        };

        Some(Self {
            name: name.into(),
            bikes_available: count("bikes"),
            docks_available: count("docks"),
            capacity: count("capacity"),
            coordinate,
        })
    }
}

/// Stations as the GeoJSON collection the map's station source consumes.
pub fn to_feature_collection(stations: &[Station]) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: stations.iter().map(Station::to_feature).collect(),
        foreign_members: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(json: serde_json::Value) -> RawStation {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn legacy_fields_test() {
        let station = Station::from_raw(raw(serde_json::json!({
            "sna": "City Hall",
            "sbi": 3,
            "bemp": 7,
            "tot": 10,
            "lat": 25.04,
            "lng": 121.56,
        })))
        .unwrap();
        assert_eq!(station.bikes_available, 3);
        assert_eq!(station.docks_available, 7);
        assert_eq!(station.capacity, 10);
        assert_eq!(station.coordinate, Coordinate::new(121.56, 25.04));
    }

    #[test]
    fn current_fields_win_test() {
        let station = Station::from_raw(raw(serde_json::json!({
            "sna": "City Hall",
            "sbi": 3,
            "bemp": 7,
            "tot": 10,
            "lat": 25.04,
            "lng": 121.56,
            "available_rent_bikes": 12,
            "available_return_bikes": 8,
            "Quantity": 20,
            "latitude": 25.05,
            "longitude": 121.57,
        })))
        .unwrap();
        assert_eq!(station.bikes_available, 12);
        assert_eq!(station.docks_available, 8);
        assert_eq!(station.capacity, 20);
        assert_eq!(station.coordinate, Coordinate::new(121.57, 25.05));
    }

    #[test]
    fn missing_counts_default_to_zero_test() {
        let station = Station::from_raw(raw(serde_json::json!({
            "sna": "Bare",
            "latitude": 25.0,
            "longitude": 121.5,
        })))
        .unwrap();
        assert_eq!(station.bikes_available, 0);
        assert_eq!(station.docks_available, 0);
        assert_eq!(station.capacity, 0);
    }

    #[test]
    fn missing_coordinate_drops_record_test() {
        assert!(
            Station::from_raw(raw(serde_json::json!({
                "sna": "Nowhere",
                "sbi": 5,
            })))
            .is_none()
        );
    }

    #[test]
    fn feature_round_trip_test() {
        let station = Station {
            name: "City Hall".into(),
            bikes_available: 4,
            docks_available: 6,
            capacity: 10,
            coordinate: Coordinate::new(121.56, 25.04),
        };
        let decoded = Station::from_feature(&station.to_feature()).unwrap();
        assert_eq!(decoded, station);
    }
}
