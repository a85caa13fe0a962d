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

//! Render primitives handed to the map surface.

use crate::graticule::{GraticuleCell, LatLng};

/// An RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const GREY: Self = Self(0x88, 0x88, 0x88);
    pub const LIGHT_BLUE: Self = Self(0xad, 0xd8, 0xe6);
    pub const ORANGE: Self = Self(0xff, 0x8c, 0x00);
    pub const MAGENTA: Self = Self(0xd0, 0x30, 0xd0);
    pub const RED: Self = Self(0xdc, 0x32, 0x32);
}

/// Stroke and fill styling shared by all primitives.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrimitiveStyle {
    pub color: Rgb,
    pub weight: f32,
    /// Fill opacity, `None` for outline only.
    pub fill_opacity: Option<f32>,
    pub interactive: bool,
}

impl PrimitiveStyle {
    /// Thin grey outline used for graticule borders.
    pub const OUTLINE: Self = Self {
        color: Rgb::GREY,
        weight: 1.0,
        fill_opacity: None,
        interactive: false,
    };

    /// Translucent light blue used for region-of-interest circles.
    pub const REGION: Self = Self {
        color: Rgb::LIGHT_BLUE,
        weight: 2.0,
        fill_opacity: Some(0.2),
        interactive: false,
    };

    #[must_use]
    pub const fn marker(color: Rgb) -> Self {
        Self {
            color,
            weight: 2.0,
            fill_opacity: Some(1.0),
            interactive: true,
        }
    }
}

/// A drawable shape in world coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderPrimitive {
    /// Point marker with popup text.
    Marker {
        position: LatLng,
        popup: String,
        style: PrimitiveStyle,
    },
    /// Axis-aligned lat/lng rectangle.
    Rectangle {
        south_west: LatLng,
        north_east: LatLng,
        style: PrimitiveStyle,
    },
    /// Circle with a radius in meters.
    Circle {
        center: LatLng,
        radius_m: f64,
        style: PrimitiveStyle,
    },
    /// Open line through the given points.
    Polyline {
        points: Vec<LatLng>,
        style: PrimitiveStyle,
    },
}

impl RenderPrimitive {
    /// Outline of a single graticule cell.
    #[must_use]
    pub fn cell_outline(cell: GraticuleCell) -> Self {
        let south_west = LatLng::new(f64::from(cell.lat), f64::from(cell.lng));
        Self::Rectangle {
            south_west,
            north_east: LatLng::new(south_west.lat + 1.0, south_west.lng + 1.0),
            style: PrimitiveStyle::OUTLINE,
        }
    }

    /// Popup text, for markers only.
    #[must_use]
    pub fn popup(&self) -> Option<&str> {
        match self {
            Self::Marker { popup, .. } => Some(popup),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_outline_spans_one_degree() {
        let outline = RenderPrimitive::cell_outline(GraticuleCell::new(-3, 7));
        match outline {
            RenderPrimitive::Rectangle {
                south_west,
                north_east,
                style,
            } => {
                assert_eq!(south_west, LatLng::new(-3.0, 7.0));
                assert_eq!(north_east, LatLng::new(-2.0, 8.0));
                assert!(!style.interactive);
                assert!(style.fill_opacity.is_none());
            }
            other => panic!("expected rectangle, got {other:?}"),
        }
    }

    #[test]
    fn test_popup_only_on_markers() {
        let marker = RenderPrimitive::Marker {
            position: LatLng::new(1.0, 2.0),
            popup: "hello".to_string(),
            style: PrimitiveStyle::marker(Rgb::RED),
        };
        assert_eq!(marker.popup(), Some("hello"));
        assert!(RenderPrimitive::cell_outline(GraticuleCell::new(0, 0))
            .popup()
            .is_none());
    }
}
