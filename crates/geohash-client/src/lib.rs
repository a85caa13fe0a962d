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

//! Geohash client library: graticule synchronization for daily geohashing maps.
//!
//! The library keeps a map's overlays consistent with the active graticule
//! (a 1°×1° cell), the date, and the daily puzzle for that pair. It is split
//! into layers that can be used on their own:
//!
//! - **Graticule layer**: route parsing and cell resolution ([`graticule`])
//! - **Puzzle layer**: the [`Backend`] abstraction, request dedup ([`puzzle`])
//!   and the HTTP implementation ([`backend`])
//! - **Projection layer**: the 3×3 candidate set ([`projector`])
//! - **Overlay layer**: render primitives, the [`MapSurface`] trait, and the
//!   per-kind layer lifecycle ([`overlay`]), plus show/hide toggles ([`toggle`])
//!
//! [`GeohashSync`] wires all layers together. It does no I/O; fetches are
//! handed back to the caller as requests.
//!
//! # Quick Start
//!
//! ```no_run
//! use chrono::Local;
//! use geohash_client::{puzzle, GeohashSync, HttpBackend, MapSurface, SyncConfig};
//!
//! async fn show<M: MapSurface>(surface: M) -> Result<(), geohash_client::BackendError> {
//!     let backend = HttpBackend::new("http://localhost:8080/api")?;
//!     let mut sync = GeohashSync::new(SyncConfig::default(), surface, Local::now().date_naive());
//!
//!     if let Some(request) = sync.set_route(Some("50"), Some("20")) {
//!         let result = puzzle::fetch(&backend, request.cell, request.date).await;
//!         sync.apply_puzzle(request, result);
//!     }
//!
//!     for candidate in sync.candidates().into_iter().flatten() {
//!         println!("{:?} at {:?}", candidate.offset, candidate.position);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Using Individual Layers
//!
//! ```
//! use chrono::NaiveDate;
//! use geohash_client::graticule::{self, LatLng};
//! use geohash_client::projector;
//! use geohash_client::puzzle::PuzzleResult;
//!
//! let resolved = graticule::resolve(Some("50"), Some("20"), LatLng::new(49.29, 11.07));
//! let puzzle = PuzzleResult {
//!     fractional_lat: 0.5,
//!     fractional_lng: 0.3,
//!     auxiliary_value: "12345.67".to_string(),
//!     date: NaiveDate::from_ymd_opt(2025, 1, 7).unwrap(),
//! };
//!
//! let candidates = projector::project(resolved.cell, &puzzle);
//! assert_eq!(candidates.len(), 9);
//! ```

pub mod backend;
pub mod config;
pub mod graticule;
pub mod overlay;
pub mod projector;
pub mod puzzle;
pub mod sync;
pub mod toggle;

#[cfg(test)]
mod testing;

pub use backend::HttpBackend;
pub use config::SyncConfig;
pub use graticule::{Bounds, GraticuleCell, LatLng, ParseError, ResolvedGraticule};
pub use overlay::{
    GroupId, MapSurface, OverlayKind, OverlayLayerManager, PrimitiveStyle, RenderPrimitive, Rgb,
};
pub use projector::{Candidate, CandidateSet};
pub use puzzle::{
    Backend, BackendError, ForecastEntry, GlobalPuzzle, PuzzleFetcher, PuzzleRequest, PuzzleResult,
};
pub use sync::{GeohashSync, SyncEvent};
pub use toggle::{Notice, ToggleAction, ToggleController, ToggleOutcome, ToggleState};
