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

//! Graticule cells and route resolution.
//!
//! A graticule is a 1°×1° latitude/longitude square identified by its integer
//! south-west corner. This module resolves the active cell from optional route
//! parameters, falling back to a configured default center.

use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A world coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl From<(f64, f64)> for LatLng {
    fn from((lat, lng): (f64, f64)) -> Self {
        Self { lat, lng }
    }
}

/// Viewport bounds reported by the map widget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

/// A 1°×1° grid cell, identified by its south-west corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GraticuleCell {
    pub lat: i32,
    pub lng: i32,
}

impl GraticuleCell {
    #[must_use]
    pub const fn new(lat: i32, lng: i32) -> Self {
        Self { lat, lng }
    }

    /// The cell containing the given coordinate.
    ///
    /// Coordinates outside the globe land in the nearest edge cell.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        reason = "values are clamped to the degree range before the cast"
    )]
    pub fn containing(point: LatLng) -> Self {
        Self {
            lat: point.lat.floor().clamp(-90.0, 89.0) as i32,
            lng: point.lng.floor().clamp(-180.0, 179.0) as i32,
        }
    }

    /// Center of the cell.
    #[must_use]
    pub fn midpoint(&self) -> LatLng {
        LatLng::new(f64::from(self.lat) + 0.5, f64::from(self.lng) + 0.5)
    }

    /// The neighbouring cell offset by whole degrees.
    #[must_use]
    pub const fn offset(&self, d_lat: i32, d_lng: i32) -> Self {
        Self {
            lat: self.lat.saturating_add(d_lat),
            lng: self.lng.saturating_add(d_lng),
        }
    }

    /// Format the cell back into route parameters.
    #[must_use]
    pub fn to_route_params(&self) -> (String, String) {
        (self.lat.to_string(), self.lng.to_string())
    }
}

impl fmt::Display for GraticuleCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

/// Errors from parsing route coordinates.
///
/// These are absorbed by [`resolve`]; they only show up in debug logs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("missing route parameter '{0}'")]
    Missing(&'static str),

    #[error("invalid value for route parameter '{field}': {value:?}")]
    InvalidValue { field: &'static str, value: String },
}

/// Outcome of resolving the active graticule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedGraticule {
    /// The active cell.
    pub cell: GraticuleCell,
    /// Where the viewport should be centered.
    pub view_center: LatLng,
    /// Whether the cell came from route parameters rather than the default.
    pub from_route: bool,
}

fn parse_degree(field: &'static str, value: Option<&str>) -> Result<i32, ParseError> {
    let raw = value.ok_or(ParseError::Missing(field))?;
    let Ok(degree) = raw.trim().parse::<i32>() else {
        return Err(ParseError::InvalidValue {
            field,
            value: raw.to_owned(),
        });
    };
    Ok(degree)
}

/// Parse both route parameters into a cell.
///
/// Any base-10 integer is accepted as-is; no degree range is enforced.
pub fn parse_route(lat: Option<&str>, lng: Option<&str>) -> Result<GraticuleCell, ParseError> {
    let lat = parse_degree("lat", lat)?;
    let lng = parse_degree("lng", lng)?;
    Ok(GraticuleCell::new(lat, lng))
}

/// Resolve the active graticule from optional route parameters.
///
/// Route values are whole-degree identifiers and are used as-is. If either is
/// missing or malformed, the cell falls back to the floor of `default_center`
/// and the viewport to the raw default center.
#[must_use]
pub fn resolve(lat: Option<&str>, lng: Option<&str>, default_center: LatLng) -> ResolvedGraticule {
    match parse_route(lat, lng) {
        Ok(cell) => ResolvedGraticule {
            cell,
            view_center: cell.midpoint(),
            from_route: true,
        },
        Err(e) => {
            if !matches!(e, ParseError::Missing(_)) {
                debug!("Ignoring route coordinates: {}", e);
            }
            ResolvedGraticule {
                cell: GraticuleCell::containing(default_center),
                view_center: default_center,
                from_route: false,
            }
        }
    }
}
