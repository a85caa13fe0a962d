// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Application configuration management.
//!
//! Persistent settings are stored as TOML through confy. Missing fields take
//! their defaults, so older files keep loading as new settings are added.

use geohash_client::config::{DEFAULT_CENTER, DEFAULT_REGION_RADIUS_M};
use geohash_client::{GraticuleCell, LatLng, SyncConfig};
use serde::{Deserialize, Serialize};

use crate::map::{OsmTileSource, DEFAULT_TILE_URL};

const APP_NAME: &str = "geohash-viewer";
const CONFIG_NAME: &str = "config";

/// Environment variable overriding the configured API URL.
pub const API_URL_ENV: &str = "GEOHASH_API_URL";

/// Default geohash API base URL
pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";

/// A named region of interest drawn as a circle
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RegionConfig {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

/// Application configuration stored in TOML format
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    /// Configuration schema version
    #[serde(default = "default_config_version")]
    pub config_version: u32,

    /// Base URL of the geohash API
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Map center used when no graticule is given
    #[serde(default = "default_center_lat")]
    pub default_lat: f64,

    #[serde(default = "default_center_lng")]
    pub default_lng: f64,

    /// Regions of interest
    #[serde(default = "default_regions")]
    pub regions: Vec<RegionConfig>,

    /// Region circle radius in meters
    #[serde(default = "default_region_radius")]
    pub region_radius_m: f64,

    /// Zoom when showing a graticule
    #[serde(default = "default_graticule_zoom")]
    pub graticule_zoom: f64,

    /// Zoom when showing the globalhash
    #[serde(default = "default_globalhash_zoom")]
    pub globalhash_zoom: f64,

    /// Tile URL template with {z}/{x}/{y} (and optional {s})
    #[serde(default = "default_tile_url")]
    pub tile_url: String,

    /// Ignore puzzle responses for superseded requests
    #[serde(default)]
    pub discard_stale_puzzles: bool,

    /// Side panel width in pixels
    #[serde(default = "default_side_panel_width")]
    pub side_panel_width: f32,
}

fn default_config_version() -> u32 {
    1
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_center_lat() -> f64 {
    DEFAULT_CENTER.lat
}

fn default_center_lng() -> f64 {
    DEFAULT_CENTER.lng
}

fn default_regions() -> Vec<RegionConfig> {
    SyncConfig::default()
        .region_centers
        .iter()
        .zip(["Home", "Work"])
        .map(|(center, name)| RegionConfig {
            name: name.to_string(),
            lat: center.lat,
            lng: center.lng,
        })
        .collect()
}

fn default_region_radius() -> f64 {
    DEFAULT_REGION_RADIUS_M
}

fn default_graticule_zoom() -> f64 {
    10.0
}

fn default_globalhash_zoom() -> f64 {
    3.0
}

fn default_tile_url() -> String {
    DEFAULT_TILE_URL.to_string()
}

fn default_side_panel_width() -> f32 {
    280.0
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_version: default_config_version(),
            api_url: default_api_url(),
            default_lat: default_center_lat(),
            default_lng: default_center_lng(),
            regions: default_regions(),
            region_radius_m: default_region_radius(),
            graticule_zoom: default_graticule_zoom(),
            globalhash_zoom: default_globalhash_zoom(),
            tile_url: default_tile_url(),
            discard_stale_puzzles: false,
            side_panel_width: default_side_panel_width(),
        }
    }
}

impl AppConfig {
    /// Load configuration from disk
    pub fn load() -> Result<Self, confy::ConfyError> {
        confy::load(APP_NAME, CONFIG_NAME)
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<(), confy::ConfyError> {
        confy::store(APP_NAME, CONFIG_NAME, self)
    }

    /// Get the config file path for display to user
    pub fn get_config_path() -> Result<std::path::PathBuf, confy::ConfyError> {
        confy::get_configuration_file_path(APP_NAME, CONFIG_NAME)
    }

    /// Engine settings derived from this configuration
    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            default_center: LatLng::new(self.default_lat, self.default_lng),
            region_centers: self
                .regions
                .iter()
                .map(|r| LatLng::new(r.lat, r.lng))
                .collect(),
            region_radius_m: self.region_radius_m,
            graticule_zoom: self.graticule_zoom,
            globalhash_zoom: self.globalhash_zoom,
            discard_stale_puzzles: self.discard_stale_puzzles,
            ..SyncConfig::default()
        }
    }

    pub fn tile_source(&self) -> OsmTileSource {
        OsmTileSource::new(self.tile_url.clone())
    }

    /// API URL with command line and environment overrides applied.
    /// The command line wins over the environment, which wins over the file.
    pub fn api_url(&self, cli: Option<&str>, env: Option<&str>) -> String {
        let given = |url: &&str| !url.trim().is_empty();
        cli.filter(given)
            .or(env.filter(given))
            .unwrap_or(&self.api_url)
            .to_string()
    }

    /// Named regions with the graticule each one falls in.
    pub fn region_graticules(&self) -> impl Iterator<Item = (&str, GraticuleCell)> {
        self.regions
            .iter()
            .map(|r| (r.name.as_str(), GraticuleCell::containing(LatLng::new(r.lat, r.lng))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_engine() {
        let config = AppConfig::default();
        let sync = config.sync_config();
        assert_eq!(sync, SyncConfig::default());
        assert_eq!(config.regions.len(), 2);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"api_url": "https://geo.example/api", "graticule_zoom": 9.0}"#)
                .unwrap();
        assert_eq!(config.api_url, "https://geo.example/api");
        assert!((config.graticule_zoom - 9.0).abs() < f64::EPSILON);
        assert_eq!(config.regions, default_regions());
        assert!(!config.discard_stale_puzzles);
    }

    #[test]
    fn test_api_url_precedence() {
        let config = AppConfig::default();
        assert_eq!(config.api_url(None, None), DEFAULT_API_URL);
        assert_eq!(config.api_url(None, Some("http://env")), "http://env");
        assert_eq!(
            config.api_url(Some("http://cli"), Some("http://env")),
            "http://cli"
        );
        assert_eq!(config.api_url(Some("  "), None), DEFAULT_API_URL);
    }

    #[test]
    fn test_blank_cli_url_falls_through_to_env() {
        let config = AppConfig::default();
        assert_eq!(config.api_url(Some("  "), Some("http://env")), "http://env");
        assert_eq!(config.api_url(Some(""), Some(" ")), DEFAULT_API_URL);
    }

    #[test]
    fn test_region_graticules() {
        let config = AppConfig {
            regions: vec![RegionConfig {
                name: "Cape".to_string(),
                lat: -33.9,
                lng: 18.4,
            }],
            ..AppConfig::default()
        };
        let regions: Vec<_> = config.region_graticules().collect();
        assert_eq!(regions, vec![("Cape", GraticuleCell::new(-34, 18))]);
    }
}
