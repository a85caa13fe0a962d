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

//! Walkers plugin drawing the overlay groups of a [`RenderedMap`].

use std::sync::{Arc, Mutex};

use eframe::egui;
use geohash_client::{Bounds, GroupId, LatLng, PrimitiveStyle, RenderPrimitive, Rgb};
use walkers::{MapMemory, Plugin, Projector};

use super::RenderedMap;

/// Meters per degree of latitude.
const METERS_PER_DEGREE: f64 = 111_320.0;

/// Screen radius of a marker dot.
const MARKER_RADIUS: f32 = 7.0;

/// Clicks farther than this from any marker are ignored.
const CLICK_TOLERANCE: f32 = 14.0;

/// What the plugin observed while drawing, read back by the app.
#[derive(Debug, Default)]
pub struct MapFeedback {
    /// Marker clicked this frame.
    pub clicked: Option<(GroupId, usize)>,
    /// Visible bounds this frame.
    pub bounds: Option<Bounds>,
}

/// Draws a snapshot of the map's groups and reports clicks and bounds.
pub struct OverlayPlugin {
    groups: Vec<(GroupId, Vec<RenderPrimitive>)>,
    popup: Option<(LatLng, String)>,
    feedback: Arc<Mutex<MapFeedback>>,
}

impl std::fmt::Debug for OverlayPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayPlugin")
            .field("groups", &self.groups.len())
            .field("popup", &self.popup)
            .finish_non_exhaustive()
    }
}

impl OverlayPlugin {
    #[must_use]
    pub fn new(map: &RenderedMap, feedback: Arc<Mutex<MapFeedback>>) -> Self {
        Self {
            groups: map
                .groups()
                .map(|(id, primitives)| (id, primitives.to_vec()))
                .collect(),
            popup: map
                .open_popup_text()
                .map(|(position, text)| (position, text.to_owned())),
            feedback,
        }
    }
}

fn color(rgb: Rgb, alpha: f32) -> egui::Color32 {
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "alpha is clamped to 0..=1 before scaling"
    )]
    let a = (alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
    egui::Color32::from_rgba_unmultiplied(rgb.0, rgb.1, rgb.2, a)
}

fn stroke(style: &PrimitiveStyle) -> egui::Stroke {
    egui::Stroke::new(style.weight, color(style.color, 1.0))
}

fn fill(style: &PrimitiveStyle) -> egui::Color32 {
    style
        .fill_opacity
        .map_or(egui::Color32::TRANSPARENT, |opacity| color(style.color, opacity))
}

fn screen(projector: &Projector, point: LatLng) -> egui::Pos2 {
    projector.project(walkers::lat_lon(point.lat, point.lng)).to_pos2()
}

impl Plugin for OverlayPlugin {
    fn run(
        self: Box<Self>,
        ui: &mut egui::Ui,
        response: &egui::Response,
        projector: &Projector,
        _memory: &MapMemory,
    ) {
        let rect = response.rect;
        let painter = ui.painter().with_clip_rect(rect);

        for (_, primitives) in &self.groups {
            for primitive in primitives {
                match primitive {
                    RenderPrimitive::Rectangle {
                        south_west,
                        north_east,
                        style,
                    } => {
                        let shape = egui::Rect::from_two_pos(
                            screen(projector, *south_west),
                            screen(projector, *north_east),
                        );
                        painter.rect_filled(shape, 0.0, fill(style));
                        painter.rect_stroke(shape, 0.0, stroke(style), egui::StrokeKind::Middle);
                    }
                    RenderPrimitive::Circle {
                        center,
                        radius_m,
                        style,
                    } => {
                        let centre = screen(projector, *center);
                        let edge = screen(
                            projector,
                            LatLng::new(center.lat + radius_m / METERS_PER_DEGREE, center.lng),
                        );
                        painter.circle(centre, centre.distance(edge), fill(style), stroke(style));
                    }
                    RenderPrimitive::Polyline { points, style } => {
                        let points = points.iter().map(|p| screen(projector, *p)).collect();
                        painter.line(points, stroke(style));
                    }
                    RenderPrimitive::Marker { .. } => {}
                }
            }
        }

        let click = if response.clicked() {
            response.interact_pointer_pos()
        } else {
            None
        };
        let mut closest: Option<(f32, GroupId, usize)> = None;

        for (group, primitives) in &self.groups {
            for (index, primitive) in primitives.iter().enumerate() {
                let RenderPrimitive::Marker {
                    position, style, ..
                } = primitive
                else {
                    continue;
                };

                let pos = screen(projector, *position);
                painter.circle(pos, MARKER_RADIUS, fill(style), egui::Stroke::new(1.5, egui::Color32::WHITE));

                if let Some(click) = click.filter(|_| style.interactive) {
                    let distance = pos.distance(click);
                    if distance < CLICK_TOLERANCE && closest.is_none_or(|(best, _, _)| distance < best) {
                        closest = Some((distance, *group, index));
                    }
                }
            }
        }

        if let Some((position, text)) = &self.popup {
            let anchor = screen(projector, *position);
            let galley = painter.layout_no_wrap(
                text.clone(),
                egui::FontId::proportional(12.0),
                egui::Color32::BLACK,
            );
            let size = galley.size() + egui::vec2(12.0, 8.0);
            let frame = egui::Rect::from_min_size(
                anchor - egui::vec2(size.x / 2.0, size.y + MARKER_RADIUS + 4.0),
                size,
            );
            painter.rect_filled(frame, 4.0, egui::Color32::WHITE);
            painter.rect_stroke(frame, 4.0, egui::Stroke::new(1.0, egui::Color32::GRAY), egui::StrokeKind::Inside);
            painter.galley(frame.min + egui::vec2(6.0, 4.0), galley, egui::Color32::BLACK);
        }

        let top_left = projector.unproject(rect.min.to_vec2());
        let bottom_right = projector.unproject(rect.max.to_vec2());
        let bounds = Bounds {
            south_west: LatLng::new(bottom_right.y(), top_left.x()),
            north_east: LatLng::new(top_left.y(), bottom_right.x()),
        };

        if let Ok(mut feedback) = self.feedback.lock() {
            feedback.bounds = Some(bounds);
            if let Some((_, group, index)) = closest {
                feedback.clicked = Some((group, index));
            }
        }
    }
}
