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

//! Overlay layer lifecycle on top of a map surface.
//!
//! Every overlay kind has at most one live group on the surface. Installing an
//! overlay tears down the previous group of that kind before the new one is
//! created, so repeated fetches never leave stale markers behind.
//!
//! The map widget itself is abstracted by [`MapSurface`]; the manager owns the
//! surface and releases every group when it is dropped.

mod primitive;

pub use primitive::{PrimitiveStyle, RenderPrimitive, Rgb};

use std::collections::HashMap;
use std::fmt;

use log::debug;

use crate::graticule::LatLng;

/// Handle to a group of primitives on a [`MapSurface`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(pub u64);

/// The overlay groups managed by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OverlayKind {
    RegionCircles,
    GraticuleOutline,
    CandidateMarkers,
    ForecastMarkers,
    GlobalhashMarker,
}

impl OverlayKind {
    /// All kinds in drawing order (bottom first).
    pub const ALL: [Self; 5] = [
        Self::RegionCircles,
        Self::GraticuleOutline,
        Self::CandidateMarkers,
        Self::ForecastMarkers,
        Self::GlobalhashMarker,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RegionCircles => "region-circles",
            Self::GraticuleOutline => "graticule-outline",
            Self::CandidateMarkers => "candidate-markers",
            Self::ForecastMarkers => "forecast-markers",
            Self::GlobalhashMarker => "globalhash-marker",
        }
    }
}

impl fmt::Display for OverlayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The map widget as seen by the overlay engine.
pub trait MapSurface {
    /// Create an empty group on the map.
    fn create_group(&mut self) -> GroupId;

    /// Add a primitive to an existing group.
    fn add_to_group(&mut self, group: GroupId, primitive: RenderPrimitive);

    /// Remove a group and release all of its primitives.
    fn remove_group(&mut self, group: GroupId);

    /// Open the popup of the primitive at `index` within `group`.
    fn open_popup(&mut self, group: GroupId, index: usize);

    /// Move the viewport.
    fn set_view(&mut self, center: LatLng, zoom: f64);

    /// Current zoom level.
    fn zoom(&self) -> f64;
}

/// Owns the overlay groups on a map surface.
pub struct OverlayLayerManager<M: MapSurface> {
    surface: M,
    layers: HashMap<OverlayKind, GroupId>,
}

impl<M: MapSurface> fmt::Debug for OverlayLayerManager<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverlayLayerManager")
            .field("layers", &self.layers)
            .finish_non_exhaustive()
    }
}

impl<M: MapSurface> OverlayLayerManager<M> {
    #[must_use]
    pub fn new(surface: M) -> Self {
        Self {
            surface,
            layers: HashMap::new(),
        }
    }

    /// Replace the overlay of `kind` with a fresh group holding `primitives`.
    pub fn install(&mut self, kind: OverlayKind, primitives: Vec<RenderPrimitive>) -> GroupId {
        self.remove(kind);

        let group = self.surface.create_group();
        let count = primitives.len();
        for primitive in primitives {
            self.surface.add_to_group(group, primitive);
        }
        self.layers.insert(kind, group);

        debug!("Installed {} ({} primitives)", kind, count);
        group
    }

    /// Remove the overlay of `kind`. Returns whether one was present.
    pub fn remove(&mut self, kind: OverlayKind) -> bool {
        match self.layers.remove(&kind) {
            Some(group) => {
                self.surface.remove_group(group);
                debug!("Removed {}", kind);
                true
            }
            None => false,
        }
    }

    /// Remove every overlay.
    pub fn remove_all(&mut self) {
        for kind in OverlayKind::ALL {
            self.remove(kind);
        }
    }

    #[must_use]
    pub fn is_present(&self, kind: OverlayKind) -> bool {
        self.layers.contains_key(&kind)
    }

    #[must_use]
    pub fn group(&self, kind: OverlayKind) -> Option<GroupId> {
        self.layers.get(&kind).copied()
    }

    /// Open a popup inside an installed overlay.
    pub fn open_popup(&mut self, kind: OverlayKind, index: usize) {
        if let Some(group) = self.group(kind) {
            self.surface.open_popup(group, index);
        }
    }

    #[must_use]
    pub fn surface(&self) -> &M {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut M {
        &mut self.surface
    }
}

impl<M: MapSurface> Drop for OverlayLayerManager<M> {
    fn drop(&mut self) {
        self.remove_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graticule::GraticuleCell;
    use crate::testing::RecordingSurface;

    fn marker(lat: f64) -> RenderPrimitive {
        RenderPrimitive::Marker {
            position: LatLng::new(lat, 0.5),
            popup: format!("marker {lat}"),
            style: PrimitiveStyle::marker(Rgb::RED),
        }
    }

    #[test]
    fn test_install_creates_group() {
        let mut manager = OverlayLayerManager::new(RecordingSurface::default());
        let group = manager.install(OverlayKind::CandidateMarkers, vec![marker(1.0), marker(2.0)]);

        assert!(manager.is_present(OverlayKind::CandidateMarkers));
        assert_eq!(manager.surface().live_groups(), 1);
        assert_eq!(manager.surface().primitives(group).len(), 2);
    }

    #[test]
    fn test_install_twice_replaces() {
        let mut manager = OverlayLayerManager::new(RecordingSurface::default());
        let primitives = vec![marker(1.0), marker(2.0)];

        let first = manager.install(OverlayKind::ForecastMarkers, primitives.clone());
        let second = manager.install(OverlayKind::ForecastMarkers, primitives.clone());

        assert_ne!(first, second);
        assert_eq!(manager.surface().live_groups(), 1);
        assert_eq!(manager.surface().primitives(second), primitives);
        assert!(manager.surface().removed().contains(&first));
    }

    #[test]
    fn test_kinds_are_independent() {
        let mut manager = OverlayLayerManager::new(RecordingSurface::default());
        manager.install(
            OverlayKind::GraticuleOutline,
            vec![RenderPrimitive::cell_outline(GraticuleCell::new(0, 0))],
        );
        manager.install(OverlayKind::CandidateMarkers, vec![marker(0.5)]);

        assert!(manager.remove(OverlayKind::CandidateMarkers));
        assert!(manager.is_present(OverlayKind::GraticuleOutline));
        assert_eq!(manager.surface().live_groups(), 1);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut manager = OverlayLayerManager::new(RecordingSurface::default());
        assert!(!manager.remove(OverlayKind::GlobalhashMarker));

        manager.install(OverlayKind::GlobalhashMarker, vec![marker(3.0)]);
        assert!(manager.remove(OverlayKind::GlobalhashMarker));
        assert!(!manager.remove(OverlayKind::GlobalhashMarker));
        assert_eq!(manager.surface().live_groups(), 0);
        assert_eq!(manager.surface().removed().len(), 1);
    }

    #[test]
    fn test_remove_all() {
        let mut manager = OverlayLayerManager::new(RecordingSurface::default());
        for kind in OverlayKind::ALL {
            manager.install(kind, vec![marker(1.0)]);
        }
        assert_eq!(manager.surface().live_groups(), 5);

        manager.remove_all();
        assert_eq!(manager.surface().live_groups(), 0);
        assert!(OverlayKind::ALL.iter().all(|k| !manager.is_present(*k)));
    }

    #[test]
    fn test_drop_releases_groups() {
        let surface = RecordingSurface::default();
        let log = surface.shared_log();
        {
            let mut manager = OverlayLayerManager::new(surface);
            manager.install(OverlayKind::RegionCircles, vec![marker(1.0)]);
            manager.install(OverlayKind::CandidateMarkers, vec![marker(2.0)]);
        }
        assert_eq!(log.live_groups(), 0);
        assert_eq!(log.removed_count(), 2);
    }

    #[test]
    fn test_open_popup_targets_group() {
        let mut manager = OverlayLayerManager::new(RecordingSurface::default());
        manager.open_popup(OverlayKind::CandidateMarkers, 4);
        assert!(manager.surface().opened_popups().is_empty());

        let group = manager.install(OverlayKind::CandidateMarkers, vec![marker(1.0)]);
        manager.open_popup(OverlayKind::CandidateMarkers, 0);
        assert_eq!(manager.surface().opened_popups(), vec![(group, 0)]);
    }
}
