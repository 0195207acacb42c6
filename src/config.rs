use std::env;

use thiserror::Error;

use crate::shared::geo::Distance;

pub const STATION_INVENTORY_URL: &str =
    "https://tcgbusfs.blob.core.windows.net/dotapp/youbike/v2/youbike_immediate.json";
pub const DIRECTIONS_BASE_URL: &str = "https://api.mapbox.com/directions/v5";

const TOKEN_VAR: &str = "MAPBOX_ACCESS_TOKEN";
const STATION_URL_VAR: &str = "PEDALHOP_STATION_URL";
const DIRECTIONS_URL_VAR: &str = "PEDALHOP_DIRECTIONS_URL";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing access token, set {TOKEN_VAR}")]
    MissingToken,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub station_inventory_url: String,
    pub directions_base_url: String,
    pub access_token: String,
    pub nearby_radius: Distance,
    pub default_zoom: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            station_inventory_url: STATION_INVENTORY_URL.into(),
            directions_base_url: DIRECTIONS_BASE_URL.into(),
            access_token: String::new(),
            nearby_radius: Distance::meters(1000.0),
            default_zoom: 14.0,
        }
    }
}

impl Config {
    /// Reads the provider token from the environment, plus optional endpoint
    /// overrides used by tests and mirrors.
    pub fn from_env() -> Result<Self, ConfigError> {
        let access_token = env::var(TOKEN_VAR).map_err(|_| ConfigError::MissingToken)?;
        let mut config = Self {
            access_token,
            ..Default::default()
        };
        if let Ok(url) = env::var(STATION_URL_VAR) {
            config.station_inventory_url = url;
        }
        if let Ok(url) = env::var(DIRECTIONS_URL_VAR) {
            config.directions_base_url = url;
        }
        Ok(config)
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = token.into();
        self
    }
}
