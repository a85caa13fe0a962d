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

//! Projection of a puzzle offset onto a graticule and its neighbours.
//!
//! The fractional offset is the same in every cell, so the candidate points
//! for the resolved cell and all eight neighbours are shown together. This
//! avoids ambiguity near cell edges at low zoom.

use crate::graticule::{GraticuleCell, LatLng};
use crate::puzzle::PuzzleResult;

/// Neighbour offsets in projection order (row-major, latitude outer).
pub const NEIGHBOUR_OFFSETS: [i32; 3] = [-1, 0, 1];

/// A single candidate point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub position: LatLng,
    /// Whole-degree offset `(d_lat, d_lng)` from the resolved cell.
    pub offset: (i32, i32),
    /// True only for the candidate inside the resolved cell.
    pub canonical: bool,
}

/// The nine candidates for a cell, in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateSet {
    candidates: Vec<Candidate>,
}

impl CandidateSet {
    /// The candidate inside the resolved cell.
    #[must_use]
    pub fn canonical(&self) -> &Candidate {
        // project() always emits the (0, 0) member at index 4
        &self.candidates[4]
    }

    #[must_use]
    pub fn iter(&self) -> std::slice::Iter<'_, Candidate> {
        self.candidates.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

impl<'a> IntoIterator for &'a CandidateSet {
    type Item = &'a Candidate;
    type IntoIter = std::slice::Iter<'a, Candidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.candidates.iter()
    }
}

/// Project a puzzle result onto `cell` and its eight neighbours.
#[must_use]
pub fn project(cell: GraticuleCell, result: &PuzzleResult) -> CandidateSet {
    let mut candidates = Vec::with_capacity(9);

    for d_lat in NEIGHBOUR_OFFSETS {
        for d_lng in NEIGHBOUR_OFFSETS {
            let neighbour = cell.offset(d_lat, d_lng);
            candidates.push(Candidate {
                position: LatLng::new(
                    f64::from(neighbour.lat) + result.fractional_lat,
                    f64::from(neighbour.lng) + result.fractional_lng,
                ),
                offset: (d_lat, d_lng),
                canonical: d_lat == 0 && d_lng == 0,
            });
        }
    }

    CandidateSet { candidates }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const EPSILON: f64 = 1e-9;

    fn result(fractional_lat: f64, fractional_lng: f64) -> PuzzleResult {
        PuzzleResult {
            fractional_lat,
            fractional_lng,
            auxiliary_value: "12345.67".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        }
    }

    fn close(a: LatLng, lat: f64, lng: f64) -> bool {
        (a.lat - lat).abs() < EPSILON && (a.lng - lng).abs() < EPSILON
    }

    #[test]
    fn test_project_scenario() {
        let set = project(GraticuleCell::new(50, 20), &result(0.5, 0.3));

        assert_eq!(set.len(), 9);
        assert!(close(set.canonical().position, 50.5, 20.3));
        assert!(set.iter().any(|c| close(c.position, 49.5, 19.3)));
        assert!(set.iter().any(|c| close(c.position, 51.5, 21.3)));
    }

    #[test]
    fn test_project_order_is_row_major() {
        let set = project(GraticuleCell::new(0, 0), &result(0.1, 0.2));
        let offsets: Vec<_> = set.iter().map(|c| c.offset).collect();
        assert_eq!(
            offsets,
            vec![
                (-1, -1),
                (-1, 0),
                (-1, 1),
                (0, -1),
                (0, 0),
                (0, 1),
                (1, -1),
                (1, 0),
                (1, 1)
            ]
        );
        assert_eq!(set.iter().filter(|c| c.canonical).count(), 1);
        assert!(set.canonical().canonical);
    }

    #[test]
    fn test_project_integer_offsets_from_canonical() {
        for (lat, lng) in [(49, 11), (-34, -71), (89, 179), (-90, -180), (0, 0)] {
            let set = project(GraticuleCell::new(lat, lng), &result(0.731, 0.052));
            let canonical = set.canonical().position;

            let mut seen = Vec::new();
            for candidate in &set {
                let d_lat = candidate.position.lat - canonical.lat;
                let d_lng = candidate.position.lng - canonical.lng;
                assert!((d_lat - d_lat.round()).abs() < EPSILON);
                assert!((d_lng - d_lng.round()).abs() < EPSILON);
                assert!((-1.0..=1.0).contains(&d_lat.round()));
                assert!((-1.0..=1.0).contains(&d_lng.round()));
                assert_eq!(
                    (d_lat.round(), d_lng.round()),
                    (f64::from(candidate.offset.0), f64::from(candidate.offset.1))
                );
                seen.push(candidate.offset);
            }
            seen.sort_unstable();
            seen.dedup();
            assert_eq!(seen.len(), 9);
        }
    }

    #[test]
    fn test_project_preserves_fraction() {
        for (frac_lat, frac_lng) in [(0.0, 0.0), (0.5, 0.3), (0.999_999, 0.123_456), (0.25, 0.75)] {
            let set = project(GraticuleCell::new(12, -7), &result(frac_lat, frac_lng));
            for candidate in &set {
                let lat_frac = candidate.position.lat - candidate.position.lat.floor();
                let lng_frac = candidate.position.lng - candidate.position.lng.floor();
                assert!((lat_frac - frac_lat).abs() < 1e-6);
                assert!((lng_frac - frac_lng).abs() < 1e-6);
            }
        }
    }
}
