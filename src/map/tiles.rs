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

use walkers::sources::{Attribution, TileSource};
use walkers::TileId;

/// Default OpenStreetMap raster tiles.
pub const DEFAULT_TILE_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";

/// Tile source built from a `{z}/{x}/{y}` URL template.
/// `{s}` is replaced by a subdomain (a-c) chosen from the tile coordinates.
#[derive(Debug, Clone)]
pub struct OsmTileSource {
    url_template: String,
}

impl OsmTileSource {
    #[must_use]
    pub fn new(url_template: impl Into<String>) -> Self {
        Self {
            url_template: url_template.into(),
        }
    }
}

impl Default for OsmTileSource {
    fn default() -> Self {
        Self::new(DEFAULT_TILE_URL)
    }
}

impl TileSource for OsmTileSource {
    fn tile_url(&self, tile_id: TileId) -> String {
        let subdomain = ["a", "b", "c"][((tile_id.x + tile_id.y) % 3) as usize];

        self.url_template
            .replace("{s}", subdomain)
            .replace("{z}", &tile_id.zoom.to_string())
            .replace("{x}", &tile_id.x.to_string())
            .replace("{y}", &tile_id.y.to_string())
    }

    fn attribution(&self) -> Attribution {
        Attribution {
            text: "© OpenStreetMap contributors",
            url: "https://www.openstreetmap.org/copyright",
            logo_light: None,
            logo_dark: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_url_template() {
        let source = OsmTileSource::default();
        let url = source.tile_url(TileId { x: 4, y: 2, zoom: 3 });
        assert_eq!(url, "https://a.tile.openstreetmap.org/3/4/2.png");
    }

    #[test]
    fn test_custom_template_without_subdomain() {
        let source = OsmTileSource::new("http://tiles.local/{z}/{x}/{y}.png");
        let url = source.tile_url(TileId { x: 1, y: 1, zoom: 10 });
        assert_eq!(url, "http://tiles.local/10/1/1.png");
    }
}
