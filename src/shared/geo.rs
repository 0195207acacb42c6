use std::{
    cmp,
    fmt::Display,
    ops::{Add, Sub},
};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy)]
pub enum Distance {
    Meter(f64),
    Kilometers(f64),
}

impl Default for Distance {
    fn default() -> Self {
        Self::Meter(0.0)
    }
}

impl PartialEq for Distance {
    fn eq(&self, other: &Self) -> bool {
        self.as_meters() == other.as_meters()
    }
}

impl PartialOrd for Distance {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        self.as_meters().partial_cmp(&other.as_meters())
    }
}

impl Add for Distance {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::meters(self.as_meters() + rhs.as_meters())
    }
}

impl Sub for Distance {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::meters(self.as_meters() - rhs.as_meters())
    }
}

impl Distance {
    pub const fn meters(distance: f64) -> Self {
        Self::Meter(distance)
    }

    pub const fn kilometers(distance: f64) -> Self {
        Self::Kilometers(distance)
    }

    pub const fn as_meters(&self) -> f64 {
        match self {
            Distance::Meter(value) => *value,
            Distance::Kilometers(value) => *value * 1000.0,
        }
    }

    pub const fn as_kilometers(&self) -> f64 {
        match self {
            Distance::Meter(value) => *value * 0.001,
            Distance::Kilometers(value) => *value,
        }
    }
}

/// A point on the globe in decimal degrees, longitude first to match the
/// `[lon, lat]` order of the wire formats this crate speaks.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub longitude: f64,
    pub latitude: f64,
}

impl Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("{}, {}", self.longitude, self.latitude))
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from(value: (f64, f64)) -> Self {
        Self {
            longitude: value.0,
            latitude: value.1,
        }
    }
}

impl From<Coordinate> for (f64, f64) {
    fn from(value: Coordinate) -> Self {
        (value.longitude, value.latitude)
    }
}

impl Coordinate {
    pub const fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// Haversine distance over a spherical earth.
    pub fn distance_to(&self, coord: &Self) -> Distance {
        const R: f64 = 6371.0;
        let dist_lat = f64::to_radians(coord.latitude - self.latitude);
        let dist_lon = f64::to_radians(coord.longitude - self.longitude);
        let a = f64::powi(f64::sin(dist_lat / 2.0), 2)
            + f64::cos(f64::to_radians(self.latitude))
                * f64::cos(f64::to_radians(coord.latitude))
                * f64::sin(dist_lon / 2.0)
                * f64::sin(dist_lon / 2.0);
        // Round-off can push `a` a hair outside [0, 1] for identical or
        // antipodal points, which would feed sqrt a negative number.
        let a = a.clamp(0.0, 1.0);
        let c = 2.0 * f64::atan2(f64::sqrt(a), f64::sqrt(1.0 - a));
        Distance::kilometers(R * c)
    }

    /// GeoJSON position with the zero elevation component map sources expect.
    pub fn to_position(&self) -> Vec<f64> {
        vec![self.longitude, self.latitude, 0.0]
    }

    pub fn from_position(position: &[f64]) -> Option<Self> {
        match position {
            [longitude, latitude, ..] => Some(Self {
                longitude: *longitude,
                latitude: *latitude,
            }),
            _ => None,
        }
    }
}

/// Geographic bounds of the visible map area.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl BoundingBox {
    pub fn contains(&self, coord: &Coordinate) -> bool {
        coord.latitude >= self.south
            && coord.latitude <= self.north
            && coord.longitude >= self.west
            && coord.longitude <= self.east
    }

    /// A box spanning `half_width_deg` in every direction from `center`.
    pub fn around(center: &Coordinate, half_width_deg: f64) -> Self {
        Self {
            south: center.latitude - half_width_deg,
            west: center.longitude - half_width_deg,
            north: center.latitude + half_width_deg,
            east: center.longitude + half_width_deg,
        }
    }
}

/// Current map center and bounds, read-only input to visibility filtering.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub center: Coordinate,
    pub bounds: BoundingBox,
}

#[test]
fn distance_identity_test() {
    let coord = Coordinate::new(121.5654, 25.033);
    let d = coord.distance_to(&coord);
    assert_eq!(d.as_meters(), 0.0);
    assert!(!d.as_meters().is_nan());
}

#[test]
fn distance_antipodal_test() {
    let coord_a = Coordinate::new(0.0, 0.0);
    let coord_b = Coordinate::new(180.0, 0.0);
    let d = coord_a.distance_to(&coord_b);
    assert!(!d.as_meters().is_nan());
    assert!((d.as_kilometers() - 20_015.0).abs() < 5.0);
}

#[test]
fn bounding_box_test() {
    let bounds = BoundingBox {
        south: 25.0,
        west: 121.5,
        north: 25.1,
        east: 121.6,
    };
    assert!(bounds.contains(&Coordinate::new(121.55, 25.05)));
    assert!(!bounds.contains(&Coordinate::new(121.7, 25.05)));
    assert!(!bounds.contains(&Coordinate::new(121.55, 24.9)));
}
