use tracing::{debug, error, warn};

use crate::{
    config::Config,
    station::{RawStation, Station},
};

/// Fetches the full station inventory from the upstream feed.
///
/// Failure is not an error state for callers: the planner treats an empty
/// inventory as a valid terminal state and never retries on its own.
#[derive(Debug, Clone)]
pub struct StationClient {
    http: reqwest::Client,
    url: String,
}

impl StationClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: config.station_inventory_url.clone(),
        }
    }

    /// One GET against the inventory endpoint. Transport and parse failures
    /// are logged and collapse to an empty collection.
    pub async fn fetch_all(&self) -> Vec<Station> {
        match self.try_fetch().await {
            Ok(stations) => stations,
            Err(err) => {
                error!("Failed to fetch station inventory: {err}");
                Vec::new()
            }
        }
    }

    async fn try_fetch(&self) -> Result<Vec<Station>, reqwest::Error> {
        let raw: Vec<RawStation> = self
            .http
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(normalize_all(raw))
    }
}

pub(crate) fn normalize_all(raw: Vec<RawStation>) -> Vec<Station> {
    let total = raw.len();
    let stations: Vec<Station> = raw.into_iter().filter_map(Station::from_raw).collect();
    let dropped = total - stations.len();
    if dropped > 0 {
        warn!("Dropped {dropped} of {total} inventory records");
    }
    debug!("Normalized {} stations", stations.len());
    stations
}
