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

//! Puzzle results and the backend abstraction that produces them.
//!
//! The daily puzzle yields a fractional offset that is valid in every
//! graticule. Results are fetched per (cell, date) through a [`Backend`];
//! [`PuzzleFetcher`] decides when a new fetch is due and tags each request
//! with a sequence number so late completions can be recognised.

use std::future::Future;

use chrono::NaiveDate;
use log::{debug, warn};
use thiserror::Error;

use crate::graticule::{GraticuleCell, LatLng};

/// Errors returned by a [`Backend`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    #[error("network error: {0}")]
    Network(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid response: {0}")]
    Decode(String),
}

/// The puzzle for one graticule on one date.
#[derive(Debug, Clone, PartialEq)]
pub struct PuzzleResult {
    /// Fractional latitude offset in `[0, 1)`.
    pub fractional_lat: f64,
    /// Fractional longitude offset in `[0, 1)`.
    pub fractional_lng: f64,
    /// Opaque seed value (the DJIA opening, e.g. "12345.67").
    pub auxiliary_value: String,
    /// Calendar date the puzzle is valid for.
    pub date: NaiveDate,
}

impl PuzzleResult {
    /// Build a result from an absolute location, keeping only its fractional part.
    #[must_use]
    pub fn from_location(location: LatLng, auxiliary_value: String, date: NaiveDate) -> Self {
        Self {
            fractional_lat: location.lat - location.lat.floor(),
            fractional_lng: location.lng - location.lng.floor(),
            auxiliary_value,
            date,
        }
    }
}

/// One day of the puzzle forecast.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastEntry {
    pub date: NaiveDate,
    pub lat_fraction: f64,
    pub lon_fraction: f64,
}

/// The single worldwide puzzle point for a date.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalPuzzle {
    pub location: LatLng,
    pub date: Option<NaiveDate>,
}

/// Source of puzzle data.
///
/// Implementations must return `Send` futures so requests can run on a
/// background runtime.
pub trait Backend {
    /// Fetch the puzzle for a graticule on a date.
    fn get_puzzle(
        &self,
        cell: GraticuleCell,
        date: NaiveDate,
    ) -> impl Future<Output = Result<PuzzleResult, BackendError>> + Send;

    /// Fetch the upcoming puzzle forecast.
    fn get_forecast(&self) -> impl Future<Output = Result<Vec<ForecastEntry>, BackendError>> + Send;

    /// Fetch the worldwide puzzle.
    fn get_global_puzzle(&self) -> impl Future<Output = Result<GlobalPuzzle, BackendError>> + Send;
}

/// A puzzle fetch that should be issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PuzzleRequest {
    /// Sequence number, increasing with every issued request.
    pub id: u64,
    pub cell: GraticuleCell,
    pub date: NaiveDate,
}

/// Fetch a puzzle through the backend.
pub async fn fetch<B: Backend>(
    backend: &B,
    cell: GraticuleCell,
    date: NaiveDate,
) -> Result<PuzzleResult, BackendError> {
    let result = backend.get_puzzle(cell, date).await?;
    if result.date != date {
        warn!(
            "Puzzle for {} requested for {} but backend answered for {}",
            cell, date, result.date
        );
    }
    Ok(result)
}

/// Tracks which (cell, date) pair was last requested.
#[derive(Debug, Default)]
pub struct PuzzleFetcher {
    last_key: Option<(GraticuleCell, NaiveDate)>,
    next_id: u64,
}

impl PuzzleFetcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a request if `(cell, date)` differs from the previous request.
    pub fn request(&mut self, cell: GraticuleCell, date: NaiveDate) -> Option<PuzzleRequest> {
        if self.last_key == Some((cell, date)) {
            debug!("Puzzle for {} on {} already requested", cell, date);
            return None;
        }

        self.last_key = Some((cell, date));
        self.next_id += 1;

        Some(PuzzleRequest {
            id: self.next_id,
            cell,
            date,
        })
    }

    /// Whether `id` belongs to the most recently issued request.
    #[must_use]
    pub fn is_latest(&self, id: u64) -> bool {
        id == self.next_id
    }

    /// Forget the last request so the next call to [`request`](Self::request)
    /// always issues one.
    pub fn reset(&mut self) {
        self.last_key = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockBackend;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    #[test]
    fn test_from_location_keeps_fraction() {
        let result = PuzzleResult::from_location(
            LatLng::new(50.25, -20.75),
            "12345.67".to_string(),
            day(1),
        );
        assert!((result.fractional_lat - 0.25).abs() < 1e-12);
        assert!((result.fractional_lng - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_request_once_per_transition() {
        let mut fetcher = PuzzleFetcher::new();
        let cell = GraticuleCell::new(49, 11);

        let first = fetcher.request(cell, day(1)).unwrap();
        assert_eq!(first.id, 1);
        assert!(fetcher.request(cell, day(1)).is_none());

        let second = fetcher.request(cell, day(2)).unwrap();
        assert_eq!(second.id, 2);
        assert!(!fetcher.is_latest(first.id));
        assert!(fetcher.is_latest(second.id));

        let third = fetcher.request(GraticuleCell::new(50, 20), day(2)).unwrap();
        assert_eq!(third.id, 3);
    }

    #[test]
    fn test_reset_reissues() {
        let mut fetcher = PuzzleFetcher::new();
        let cell = GraticuleCell::new(49, 11);
        assert!(fetcher.request(cell, day(1)).is_some());
        fetcher.reset();
        assert!(fetcher.request(cell, day(1)).is_some());
    }

    #[tokio::test]
    async fn test_fetch_delegates_to_backend() {
        let backend = MockBackend::default().with_puzzle(PuzzleResult {
            fractional_lat: 0.5,
            fractional_lng: 0.3,
            auxiliary_value: "34000.00".to_string(),
            date: day(1),
        });

        let result = fetch(&backend, GraticuleCell::new(50, 20), day(1))
            .await
            .unwrap();
        assert_eq!(result.auxiliary_value, "34000.00");
        assert_eq!(backend.puzzle_calls(), vec![(GraticuleCell::new(50, 20), day(1))]);
    }

    #[tokio::test]
    async fn test_fetch_not_found() {
        let backend = MockBackend::default();
        let err = fetch(&backend, GraticuleCell::new(0, 0), day(1))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::NotFound(_)));
    }
}
