use geojson::FeatureCollection;
use tracing::{debug, error};

use crate::{
    config::Config,
    route::{Profile, RouteProvider, empty_route, join_waypoints, parse_directions_response},
    shared::geo::Coordinate,
};

/// Client for the directions REST endpoint.
///
/// One route per call: full overview geometry, no alternatives, no steps.
/// Every failure mode collapses to the empty collection; callers render
/// nothing rather than handle an error.
#[derive(Debug, Clone)]
pub struct DirectionsClient {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl DirectionsClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.directions_base_url.clone(),
            access_token: config.access_token.clone(),
        }
    }

    pub async fn fetch_route(
        &self,
        profile: Profile,
        waypoints: &[Coordinate],
    ) -> FeatureCollection {
        if waypoints.len() < 2 {
            error!("Directions request needs at least 2 waypoints");
            return empty_route();
        }

        let endpoint = format!(
            "{}/{}/{}",
            self.base_url,
            profile.as_path(),
            join_waypoints(waypoints)
        );
        debug!("Requesting {} route with {} waypoints", profile, waypoints.len());

        let response = self
            .http
            .get(&endpoint)
            .query(&[
                ("geometries", "geojson"),
                ("alternatives", "false"),
                ("steps", "false"),
                ("overview", "full"),
                ("access_token", self.access_token.as_str()),
            ])
            .send()
            .await;

        let payload = match response {
            Ok(response) => match response.error_for_status() {
                Ok(response) => response.json::<serde_json::Value>().await,
                Err(err) => {
                    error!("Directions request rejected: {err}");
                    return empty_route();
                }
            },
            Err(err) => {
                error!("Directions request failed: {err}");
                return empty_route();
            }
        };

        match payload {
            Ok(payload) => parse_directions_response(payload),
            Err(err) => {
                error!("Directions response was not JSON: {err}");
                empty_route()
            }
        }
    }
}

impl RouteProvider for DirectionsClient {
    async fn fetch_route(&self, profile: Profile, waypoints: &[Coordinate]) -> FeatureCollection {
        DirectionsClient::fetch_route(self, profile, waypoints).await
    }
}
