//! Map-based bike-share trip planning.
//!
//! Fetches the live station inventory, picks the nearest station with bikes
//! to rent, asks the directions provider for a start → station → end cycling
//! route, and drives markers, popups, and layers on a map surface. The
//! rendering engine stays behind the [`map::MapSurface`] trait; the bundled
//! [`map::HeadlessMap`] runs the whole session without one.

pub mod config;
pub mod map;
pub mod route;
pub mod session;
pub mod shared;
pub mod station;

pub mod prelude {
    pub use crate::config::Config;
    pub use crate::map::{HeadlessMap, MapSurface};
    pub use crate::route::{DirectionsClient, Profile, RouteProvider};
    pub use crate::session::{MapEvent, RouteStatus, SessionController, Trip};
    pub use crate::shared::geo::{Coordinate, Distance};
    pub use crate::station::{Station, StationClient, StationProvider};
}
