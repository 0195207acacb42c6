use rayon::prelude::*;

mod client;
mod model;

pub use client::*;
pub use model::*;

use crate::shared::geo::{Coordinate, Distance};

/// Source of the full station inventory. The session controller is generic
/// over this so tests can plan trips against a fixed collection.
#[allow(async_fn_in_trait)]
pub trait StationProvider {
    async fn fetch_all(&self) -> Vec<Station>;
}

impl StationProvider for StationClient {
    async fn fetch_all(&self) -> Vec<Station> {
        StationClient::fetch_all(self).await
    }
}

/// Stations within `radius` of `center`. Pure: empty in, empty out, and no
/// station outside the radius ever survives.
pub fn filter_nearby(stations: &[Station], center: &Coordinate, radius: Distance) -> Vec<Station> {
    stations
        .par_iter()
        .filter(|station| station.coordinate.distance_to(center) <= radius)
        .cloned()
        .collect()
}

/// The closest station to `target` that still has a bike to rent. If every
/// station is exhausted the fallback pass returns the closest one anyway, so
/// `None` only means the collection was empty.
///
/// Exact-distance ties go to the first station in input order; the input
/// order carries no meaning, so callers must not rely on which one wins.
pub fn nearest_station<'a>(stations: &'a [Station], target: &Coordinate) -> Option<&'a Station> {
    nearest_of(stations.iter().filter(|s| s.bikes_available > 0), target)
        .or_else(|| nearest_of(stations.iter(), target))
}

fn nearest_of<'a, I>(stations: I, target: &Coordinate) -> Option<&'a Station>
where
    I: Iterator<Item = &'a Station>,
{
    let mut nearest: Option<&Station> = None;
    let mut shortest = Distance::kilometers(f64::INFINITY);
    for station in stations {
        let distance = station.coordinate.distance_to(target);
        if distance < shortest {
            nearest = Some(station);
            shortest = distance;
        }
    }
    nearest
}
