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

//! Show/hide control for the secondary overlays.
//!
//! Showing an overlay always fetches fresh data; hiding never touches the
//! network. An empty or failed fetch leaves the overlay hidden and produces a
//! single [`Notice`] for the user.

use std::future::Future;

use log::{debug, info, warn};

use crate::overlay::{MapSurface, OverlayKind, OverlayLayerManager, RenderPrimitive};
use crate::puzzle::BackendError;

/// Whether a secondary overlay is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToggleState {
    #[default]
    Hidden,
    Shown,
}

/// A user-facing message about an overlay that could not be shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub overlay: OverlayKind,
    pub message: String,
}

/// What the caller has to do after [`ToggleController::begin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleAction {
    /// Run the fetch and hand the result to [`ToggleController::complete`].
    Fetch,
    /// The overlay was removed; nothing else to do.
    Hide,
    /// A fetch is already outstanding; the toggle was ignored.
    Busy,
}

/// Result of a completed toggle.
#[derive(Debug, Clone, PartialEq)]
pub enum ToggleOutcome<T> {
    /// Overlay installed with these items.
    Shown(Vec<T>),
    /// Overlay removed.
    Hidden,
    /// Nothing to show; the overlay stays hidden.
    Unavailable(Notice),
    /// Ignored because a fetch was still outstanding or none was expected.
    Ignored,
}

/// Controls one secondary overlay.
#[derive(Debug)]
pub struct ToggleController {
    kind: OverlayKind,
    label: &'static str,
    state: ToggleState,
    pending: bool,
}

impl ToggleController {
    #[must_use]
    pub fn new(kind: OverlayKind, label: &'static str) -> Self {
        Self {
            kind,
            label,
            state: ToggleState::Hidden,
            pending: false,
        }
    }

    #[must_use]
    pub fn state(&self) -> ToggleState {
        self.state
    }

    #[must_use]
    pub fn is_shown(&self) -> bool {
        self.state == ToggleState::Shown
    }

    /// Whether a show fetch is outstanding.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Start a toggle. Hides immediately if shown, otherwise asks for a fetch.
    pub fn begin<M: MapSurface>(&mut self, overlays: &mut OverlayLayerManager<M>) -> ToggleAction {
        match (self.state, self.pending) {
            (ToggleState::Shown, _) => {
                overlays.remove(self.kind);
                self.state = ToggleState::Hidden;
                info!("{} hidden", self.label);
                ToggleAction::Hide
            }
            (ToggleState::Hidden, true) => {
                debug!("{} fetch already in flight", self.label);
                ToggleAction::Busy
            }
            (ToggleState::Hidden, false) => {
                self.pending = true;
                ToggleAction::Fetch
            }
        }
    }

    /// Finish a show toggle with the fetch result.
    ///
    /// `render` turns the fetched items into primitives; it only runs when
    /// there is at least one item.
    pub fn complete<T, M, R>(
        &mut self,
        result: Result<Vec<T>, BackendError>,
        overlays: &mut OverlayLayerManager<M>,
        render: R,
    ) -> ToggleOutcome<T>
    where
        M: MapSurface,
        R: FnOnce(&[T]) -> Vec<RenderPrimitive>,
    {
        if !self.pending {
            debug!("Dropping unexpected {} result", self.label);
            return ToggleOutcome::Ignored;
        }
        self.pending = false;

        match result {
            Ok(items) if !items.is_empty() => {
                overlays.install(self.kind, render(&items));
                self.state = ToggleState::Shown;
                info!("{} shown ({} items)", self.label, items.len());
                ToggleOutcome::Shown(items)
            }
            Ok(_) => {
                info!("{} returned no data", self.label);
                ToggleOutcome::Unavailable(self.unavailable())
            }
            Err(e) => {
                warn!("{} fetch failed: {}", self.label, e);
                ToggleOutcome::Unavailable(self.unavailable())
            }
        }
    }

    /// Toggle in one step, running `fetch` when the overlay has to be shown.
    pub async fn toggle<T, M, F, Fut, R>(
        &mut self,
        overlays: &mut OverlayLayerManager<M>,
        fetch: F,
        render: R,
    ) -> ToggleOutcome<T>
    where
        M: MapSurface,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>, BackendError>>,
        R: FnOnce(&[T]) -> Vec<RenderPrimitive>,
    {
        match self.begin(overlays) {
            ToggleAction::Hide => ToggleOutcome::Hidden,
            ToggleAction::Busy => ToggleOutcome::Ignored,
            ToggleAction::Fetch => {
                let result = fetch().await;
                self.complete(result, overlays, render)
            }
        }
    }

    fn unavailable(&self) -> Notice {
        Notice {
            overlay: self.kind,
            message: format!("No {} available", self.label.to_lowercase()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graticule::LatLng;
    use crate::overlay::{PrimitiveStyle, Rgb};
    use crate::testing::RecordingSurface;

    fn render(items: &[f64]) -> Vec<RenderPrimitive> {
        items
            .iter()
            .map(|lat| RenderPrimitive::Marker {
                position: LatLng::new(*lat, 0.0),
                popup: String::new(),
                style: PrimitiveStyle::marker(Rgb::ORANGE),
            })
            .collect()
    }

    fn manager() -> OverlayLayerManager<RecordingSurface> {
        OverlayLayerManager::new(RecordingSurface::default())
    }

    #[tokio::test]
    async fn test_toggle_shows_then_hides() {
        let mut overlays = manager();
        let mut toggle = ToggleController::new(OverlayKind::ForecastMarkers, "Forecast");

        let outcome = toggle
            .toggle(&mut overlays, || async { Ok::<_, BackendError>(vec![1.0, 2.0]) }, render)
            .await;
        assert_eq!(outcome, ToggleOutcome::Shown(vec![1.0, 2.0]));
        assert!(toggle.is_shown());
        assert!(overlays.is_present(OverlayKind::ForecastMarkers));

        let mut fetched = false;
        let outcome = toggle
            .toggle(
                &mut overlays,
                || {
                    fetched = true;
                    async { Ok::<_, BackendError>(vec![3.0]) }
                },
                render,
            )
            .await;
        assert_eq!(outcome, ToggleOutcome::Hidden);
        assert!(!fetched);
        assert_eq!(toggle.state(), ToggleState::Hidden);
        assert!(!overlays.is_present(OverlayKind::ForecastMarkers));
    }

    #[tokio::test]
    async fn test_toggle_empty_result_stays_hidden() {
        let mut overlays = manager();
        let mut toggle = ToggleController::new(OverlayKind::ForecastMarkers, "Forecast");

        let outcome = toggle
            .toggle(&mut overlays, || async { Ok::<_, BackendError>(Vec::<f64>::new()) }, render)
            .await;
        match outcome {
            ToggleOutcome::Unavailable(notice) => {
                assert_eq!(notice.overlay, OverlayKind::ForecastMarkers);
                assert_eq!(notice.message, "No forecast available");
            }
            other => panic!("expected notice, got {other:?}"),
        }
        assert_eq!(toggle.state(), ToggleState::Hidden);
        assert!(!toggle.is_pending());
        assert_eq!(overlays.surface().live_groups(), 0);
    }

    #[tokio::test]
    async fn test_toggle_failure_stays_hidden() {
        let mut overlays = manager();
        let mut toggle = ToggleController::new(OverlayKind::GlobalhashMarker, "Globalhash");

        let outcome = toggle
            .toggle(
                &mut overlays,
                || async { Err::<Vec<f64>, _>(BackendError::Network("timeout".to_string())) },
                render,
            )
            .await;
        assert!(matches!(outcome, ToggleOutcome::Unavailable(_)));
        assert!(!toggle.is_shown());

        // a later retry is user-initiated and fetches again
        let outcome = toggle
            .toggle(&mut overlays, || async { Ok::<_, BackendError>(vec![5.0]) }, render)
            .await;
        assert_eq!(outcome, ToggleOutcome::Shown(vec![5.0]));
    }

    #[test]
    fn test_begin_while_pending_is_busy() {
        let mut overlays = manager();
        let mut toggle = ToggleController::new(OverlayKind::ForecastMarkers, "Forecast");

        assert_eq!(toggle.begin(&mut overlays), ToggleAction::Fetch);
        assert_eq!(toggle.begin(&mut overlays), ToggleAction::Busy);
        assert_eq!(toggle.state(), ToggleState::Hidden);

        let outcome = toggle.complete(Ok(vec![1.0]), &mut overlays, render);
        assert!(matches!(outcome, ToggleOutcome::Shown(_)));
        assert_eq!(toggle.begin(&mut overlays), ToggleAction::Hide);
    }

    #[test]
    fn test_complete_without_begin_is_ignored() {
        let mut overlays = manager();
        let mut toggle = ToggleController::new(OverlayKind::ForecastMarkers, "Forecast");

        let outcome = toggle.complete(Ok(vec![1.0]), &mut overlays, render);
        assert_eq!(outcome, ToggleOutcome::Ignored);
        assert!(!overlays.is_present(OverlayKind::ForecastMarkers));
    }
}
