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

//! The graticule synchronization pipeline.
//!
//! [`GeohashSync`] keeps the rendered overlays consistent with three inputs:
//! the route (optional lat/lng), the puzzle date, and the user's overlay
//! toggles. It performs no I/O itself. Operations that need data return a
//! request; the caller runs it (usually on a background runtime) and feeds the
//! result back through the matching `apply_*` method on the same thread.
//!
//! Dependencies are recomputed explicitly:
//!
//! - route → cell → outline, viewport, puzzle request
//! - cell or puzzle → candidate set → candidate markers
//! - cell → forecast markers (while shown)

use std::collections::VecDeque;

use chrono::NaiveDate;
use log::{debug, info, warn};
use tokio::sync::broadcast;

use crate::config::SyncConfig;
use crate::graticule::{self, Bounds, GraticuleCell, LatLng, ResolvedGraticule};
use crate::overlay::{
    MapSurface, OverlayKind, OverlayLayerManager, PrimitiveStyle, RenderPrimitive, Rgb,
};
use crate::projector::{self, CandidateSet, NEIGHBOUR_OFFSETS};
use crate::puzzle::{BackendError, ForecastEntry, GlobalPuzzle, PuzzleFetcher, PuzzleRequest, PuzzleResult};
use crate::toggle::{Notice, ToggleAction, ToggleController, ToggleOutcome, ToggleState};

/// Index of the canonical candidate within the candidate markers group.
const CANONICAL_MARKER_INDEX: usize = 4;

/// Events emitted when synchronized state changes.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// The active graticule changed.
    CellChanged(GraticuleCell),
    /// A puzzle result was applied.
    PuzzleUpdated(PuzzleResult),
    /// An overlay was installed or removed.
    OverlayChanged { kind: OverlayKind, present: bool },
    /// The viewport settled on new bounds.
    BoundsChanged(Bounds),
}

/// Popup text for a candidate marker.
#[must_use]
pub fn candidate_label(position: LatLng, puzzle: &PuzzleResult) -> String {
    format!(
        "GeoHash: {:.6}/{:.6}\nDate: {} / DJIA: {}",
        position.lat, position.lng, puzzle.date, puzzle.auxiliary_value
    )
}

/// The 3×3 graticule outline around `cell`.
#[must_use]
pub fn graticule_outline(cell: GraticuleCell) -> Vec<RenderPrimitive> {
    NEIGHBOUR_OFFSETS
        .iter()
        .flat_map(|d_lat| {
            NEIGHBOUR_OFFSETS
                .iter()
                .map(move |d_lng| RenderPrimitive::cell_outline(cell.offset(*d_lat, *d_lng)))
        })
        .collect()
}

fn candidate_markers(set: &CandidateSet, puzzle: &PuzzleResult) -> Vec<RenderPrimitive> {
    set.iter()
        .map(|candidate| RenderPrimitive::Marker {
            position: candidate.position,
            popup: candidate_label(candidate.position, puzzle),
            style: PrimitiveStyle::marker(Rgb::RED),
        })
        .collect()
}

fn forecast_markers(cell: GraticuleCell, entries: &[ForecastEntry]) -> Vec<RenderPrimitive> {
    entries
        .iter()
        .map(|entry| {
            let position = LatLng::new(
                f64::from(cell.lat) + entry.lat_fraction,
                f64::from(cell.lng) + entry.lon_fraction,
            );
            RenderPrimitive::Marker {
                position,
                popup: format!(
                    "Forecast: {}\n{:.6}/{:.6}",
                    entry.date, position.lat, position.lng
                ),
                style: PrimitiveStyle::marker(Rgb::ORANGE),
            }
        })
        .collect()
}

fn globalhash_marker(global: &GlobalPuzzle) -> RenderPrimitive {
    let date = global
        .date
        .map(|d| format!("\nDate: {d}"))
        .unwrap_or_default();
    RenderPrimitive::Marker {
        position: global.location,
        popup: format!(
            "Globalhash: {:.6}/{:.6}{}",
            global.location.lat, global.location.lng, date
        ),
        style: PrimitiveStyle::marker(Rgb::MAGENTA),
    }
}

/// Synchronizes graticule, puzzle, and overlays on one map surface.
pub struct GeohashSync<M: MapSurface> {
    config: SyncConfig,
    overlays: OverlayLayerManager<M>,
    resolved: ResolvedGraticule,
    date: NaiveDate,
    fetcher: PuzzleFetcher,
    puzzle: Option<PuzzleResult>,
    candidates: Option<CandidateSet>,
    forecast: ToggleController,
    forecast_entries: Vec<ForecastEntry>,
    globalhash: ToggleController,
    notices: VecDeque<Notice>,
    last_bounds: Option<Bounds>,
    event_tx: broadcast::Sender<SyncEvent>,
}

impl<M: MapSurface> std::fmt::Debug for GeohashSync<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeohashSync")
            .field("cell", &self.resolved.cell)
            .field("date", &self.date)
            .field("puzzle", &self.puzzle)
            .field("overlays", &self.overlays)
            .finish_non_exhaustive()
    }
}

impl<M: MapSurface> GeohashSync<M> {
    /// Set up the map: region circles, default graticule, and viewport.
    ///
    /// No puzzle is requested yet; call [`set_route`](Self::set_route) to start.
    #[must_use]
    pub fn new(config: SyncConfig, surface: M, date: NaiveDate) -> Self {
        let (event_tx, _) = broadcast::channel(config.event_channel_capacity.max(1));
        let resolved = graticule::resolve(None, None, config.default_center);

        let mut overlays = OverlayLayerManager::new(surface);
        let circles = config
            .region_centers
            .iter()
            .map(|center| RenderPrimitive::Circle {
                center: *center,
                radius_m: config.region_radius_m,
                style: PrimitiveStyle::REGION,
            })
            .collect();
        overlays.install(OverlayKind::RegionCircles, circles);
        overlays.install(OverlayKind::GraticuleOutline, graticule_outline(resolved.cell));
        overlays
            .surface_mut()
            .set_view(resolved.view_center, config.graticule_zoom);

        info!("Geohash map ready at {} for {}", resolved.cell, date);

        Self {
            config,
            overlays,
            resolved,
            date,
            fetcher: PuzzleFetcher::new(),
            puzzle: None,
            candidates: None,
            forecast: ToggleController::new(OverlayKind::ForecastMarkers, "Forecast"),
            forecast_entries: Vec::new(),
            globalhash: ToggleController::new(OverlayKind::GlobalhashMarker, "Globalhash"),
            notices: VecDeque::new(),
            last_bounds: None,
            event_tx,
        }
    }

    /// Apply new route parameters.
    ///
    /// Returns the puzzle request to run if (cell, date) changed.
    pub fn set_route(&mut self, lat: Option<&str>, lng: Option<&str>) -> Option<PuzzleRequest> {
        let resolved = graticule::resolve(lat, lng, self.config.default_center);
        let cell_changed = resolved.cell != self.resolved.cell;
        self.resolved = resolved;

        let zoom = self.overlays.surface().zoom();
        self.overlays
            .surface_mut()
            .set_view(resolved.view_center, zoom);

        if cell_changed {
            info!("Graticule changed to {}", resolved.cell);
            self.on_cell_changed();
        }

        self.fetcher.request(self.resolved.cell, self.date)
    }

    /// Change the puzzle date.
    pub fn set_date(&mut self, date: NaiveDate) -> Option<PuzzleRequest> {
        self.date = date;
        self.fetcher.request(self.resolved.cell, date)
    }

    /// Request the current puzzle again, even if it was already fetched.
    pub fn refresh(&mut self) -> Option<PuzzleRequest> {
        self.fetcher.reset();
        self.fetcher.request(self.resolved.cell, self.date)
    }

    /// Apply a completed puzzle fetch. Returns whether state changed.
    pub fn apply_puzzle(
        &mut self,
        request: PuzzleRequest,
        result: Result<PuzzleResult, BackendError>,
    ) -> bool {
        if self.config.discard_stale_puzzles && !self.fetcher.is_latest(request.id) {
            debug!(
                "Discarding stale puzzle #{} for {} on {}",
                request.id, request.cell, request.date
            );
            return false;
        }

        match result {
            Ok(puzzle) => {
                debug!("Puzzle #{} for {} applied", request.id, request.cell);
                self.puzzle = Some(puzzle.clone());
                let _ = self.event_tx.send(SyncEvent::PuzzleUpdated(puzzle));
                self.render_candidates();
                true
            }
            Err(e) => {
                warn!(
                    "Puzzle fetch for {} on {} failed: {}",
                    request.cell, request.date, e
                );
                false
            }
        }
    }

    /// Toggle the forecast overlay. [`ToggleAction::Fetch`] means the caller
    /// must fetch the forecast and pass it to [`apply_forecast`](Self::apply_forecast).
    pub fn toggle_forecast(&mut self) -> ToggleAction {
        let action = self.forecast.begin(&mut self.overlays);
        if action == ToggleAction::Hide {
            self.forecast_entries.clear();
            self.emit_overlay(OverlayKind::ForecastMarkers);
        }
        action
    }

    pub fn apply_forecast(&mut self, result: Result<Vec<ForecastEntry>, BackendError>) {
        let cell = self.resolved.cell;
        let outcome = self
            .forecast
            .complete(result, &mut self.overlays, |entries| forecast_markers(cell, entries));

        match outcome {
            ToggleOutcome::Shown(entries) => {
                self.forecast_entries = entries;
                self.emit_overlay(OverlayKind::ForecastMarkers);
            }
            ToggleOutcome::Unavailable(notice) => self.notices.push_back(notice),
            ToggleOutcome::Hidden | ToggleOutcome::Ignored => {}
        }
    }

    /// Toggle the globalhash overlay. Hiding restores the graticule view.
    pub fn toggle_globalhash(&mut self) -> ToggleAction {
        let action = self.globalhash.begin(&mut self.overlays);
        if action == ToggleAction::Hide {
            self.emit_overlay(OverlayKind::GlobalhashMarker);
            let center = self.resolved.cell.midpoint();
            let zoom = self.config.graticule_zoom;
            self.overlays.surface_mut().set_view(center, zoom);
        }
        action
    }

    pub fn apply_globalhash(&mut self, result: Result<GlobalPuzzle, BackendError>) {
        let outcome = self.globalhash.complete(
            result.map(|global| vec![global]),
            &mut self.overlays,
            |globals| globals.iter().map(globalhash_marker).collect(),
        );

        match outcome {
            ToggleOutcome::Shown(globals) => {
                self.emit_overlay(OverlayKind::GlobalhashMarker);
                if let Some(global) = globals.first() {
                    let zoom = self.config.globalhash_zoom;
                    self.overlays.surface_mut().set_view(global.location, zoom);
                    self.overlays.open_popup(OverlayKind::GlobalhashMarker, 0);
                }
            }
            ToggleOutcome::Unavailable(notice) => self.notices.push_back(notice),
            ToggleOutcome::Hidden | ToggleOutcome::Ignored => {}
        }
    }

    /// Report that the viewport settled. Emits [`SyncEvent::BoundsChanged`]
    /// when the bounds differ from the last report.
    pub fn viewport_settled(&mut self, bounds: Bounds) {
        if self.last_bounds == Some(bounds) {
            return;
        }
        self.last_bounds = Some(bounds);
        let _ = self.event_tx.send(SyncEvent::BoundsChanged(bounds));
    }

    /// Take all pending user notices.
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }

    /// Subscribe to state change events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.event_tx.subscribe()
    }

    #[must_use]
    pub fn cell(&self) -> GraticuleCell {
        self.resolved.cell
    }

    #[must_use]
    pub fn resolved(&self) -> &ResolvedGraticule {
        &self.resolved
    }

    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    #[must_use]
    pub fn puzzle(&self) -> Option<&PuzzleResult> {
        self.puzzle.as_ref()
    }

    #[must_use]
    pub fn candidates(&self) -> Option<&CandidateSet> {
        self.candidates.as_ref()
    }

    #[must_use]
    pub fn forecast_state(&self) -> ToggleState {
        self.forecast.state()
    }

    #[must_use]
    pub fn globalhash_state(&self) -> ToggleState {
        self.globalhash.state()
    }

    /// Whether a forecast or globalhash fetch is outstanding.
    #[must_use]
    pub fn is_busy(&self, kind: OverlayKind) -> bool {
        match kind {
            OverlayKind::ForecastMarkers => self.forecast.is_pending(),
            OverlayKind::GlobalhashMarker => self.globalhash.is_pending(),
            _ => false,
        }
    }

    #[must_use]
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    #[must_use]
    pub fn overlays(&self) -> &OverlayLayerManager<M> {
        &self.overlays
    }

    #[must_use]
    pub fn surface(&self) -> &M {
        self.overlays.surface()
    }

    pub fn surface_mut(&mut self) -> &mut M {
        self.overlays.surface_mut()
    }

    fn on_cell_changed(&mut self) {
        let cell = self.resolved.cell;
        self.overlays
            .install(OverlayKind::GraticuleOutline, graticule_outline(cell));
        let _ = self.event_tx.send(SyncEvent::CellChanged(cell));

        self.render_candidates();

        if self.forecast.is_shown() {
            self.overlays.install(
                OverlayKind::ForecastMarkers,
                forecast_markers(cell, &self.forecast_entries),
            );
        }
    }

    fn render_candidates(&mut self) {
        let Some(puzzle) = self.puzzle.as_ref() else {
            return;
        };

        let set = projector::project(self.resolved.cell, puzzle);
        let markers = candidate_markers(&set, puzzle);
        let canonical = set.canonical().position;

        self.overlays.install(OverlayKind::CandidateMarkers, markers);
        self.overlays
            .open_popup(OverlayKind::CandidateMarkers, CANONICAL_MARKER_INDEX);
        let zoom = self.overlays.surface().zoom();
        self.overlays.surface_mut().set_view(canonical, zoom);

        self.candidates = Some(set);
        self.emit_overlay(OverlayKind::CandidateMarkers);
    }

    fn emit_overlay(&self, kind: OverlayKind) {
        let present = self.overlays.is_present(kind);
        let _ = self
            .event_tx
            .send(SyncEvent::OverlayChanged { kind, present });
    }
}
