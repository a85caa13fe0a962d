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

//! Engine configuration.

use crate::graticule::LatLng;

/// Default map center when no graticule is routed (Nuremberg area).
pub const DEFAULT_CENTER: LatLng = LatLng::new(49.29, 11.07);

/// Radius of the region-of-interest circles in meters.
pub const DEFAULT_REGION_RADIUS_M: f64 = 25_000.0;

/// Configuration for [`GeohashSync`](crate::GeohashSync).
#[derive(Debug, Clone, PartialEq)]
pub struct SyncConfig {
    /// Fallback center; its floor is the default graticule.
    pub default_center: LatLng,
    /// Points of interest drawn as circles.
    pub region_centers: Vec<LatLng>,
    /// Circle radius in meters.
    pub region_radius_m: f64,
    /// Zoom used when showing a graticule.
    pub graticule_zoom: f64,
    /// Zoom used when showing the globalhash.
    pub globalhash_zoom: f64,
    /// Drop puzzle completions that belong to a superseded request.
    pub discard_stale_puzzles: bool,
    /// Broadcast channel capacity for events.
    pub event_channel_capacity: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            default_center: DEFAULT_CENTER,
            region_centers: vec![
                LatLng::new(50.799_461, 20.465_209),
                LatLng::new(49.310_417, 11.024_885),
            ],
            region_radius_m: DEFAULT_REGION_RADIUS_M,
            graticule_zoom: 10.0,
            globalhash_zoom: 3.0,
            discard_stale_puzzles: false,
            event_channel_capacity: 64,
        }
    }
}
