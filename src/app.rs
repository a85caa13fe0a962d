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

//! The viewer window: side panel, map, and notices.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use eframe::egui;
use geohash_client::{
    Backend, Bounds, GeohashSync, GraticuleCell, MapSurface, Notice, OverlayKind, SyncEvent, ToggleAction,
    ToggleState,
};
use log::{debug, info, warn};
use tokio::sync::broadcast::{self, error::TryRecvError};
use walkers::{HttpTiles, Map, MapMemory};

use crate::config::AppConfig;
use crate::map::{MapFeedback, OverlayPlugin, RenderedMap};
use crate::worker::{FetchJob, FetchOutcome, FetchWorker};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Where the viewer starts.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub lat: Option<String>,
    pub lng: Option<String>,
    pub date: NaiveDate,
}

/// Button caption for an overlay toggle.
fn toggle_caption(name: &str, state: ToggleState, busy: bool) -> String {
    match (busy, state) {
        (true, _) => format!("Loading {name}…"),
        (false, ToggleState::Shown) => format!("Hide {name}"),
        (false, ToggleState::Hidden) => format!("Show {name}"),
    }
}

fn parse_date(input: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT).ok()
}

pub struct GeohashApp {
    config: AppConfig,
    sync: GeohashSync<RenderedMap>,
    worker: FetchWorker,
    events: broadcast::Receiver<SyncEvent>,
    map_memory: MapMemory,
    tiles: HttpTiles,
    feedback: Arc<Mutex<MapFeedback>>,
    notices: VecDeque<Notice>,
    lat_input: String,
    lng_input: String,
    date_input: String,
    status: Option<String>,
    visible_bounds: Option<Bounds>,
}

impl std::fmt::Debug for GeohashApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeohashApp")
            .field("sync", &self.sync)
            .field("worker", &self.worker)
            .finish_non_exhaustive()
    }
}

impl GeohashApp {
    pub fn new<B>(
        cc: &eframe::CreationContext<'_>,
        config: AppConfig,
        backend: B,
        launch: LaunchOptions,
    ) -> std::io::Result<Self>
    where
        B: Backend + Send + Sync + 'static,
    {
        let ctx = cc.egui_ctx.clone();
        let worker = FetchWorker::spawn(backend, move || ctx.request_repaint())?;

        let surface = RenderedMap::new(config.graticule_zoom);
        let sync = GeohashSync::new(config.sync_config(), surface, launch.date);
        let events = sync.subscribe();
        let tiles = HttpTiles::new(config.tile_source(), cc.egui_ctx.clone());

        let mut app = Self {
            sync,
            worker,
            events,
            map_memory: MapMemory::default(),
            tiles,
            feedback: Arc::default(),
            notices: VecDeque::new(),
            lat_input: launch.lat.clone().unwrap_or_default(),
            lng_input: launch.lng.clone().unwrap_or_default(),
            date_input: launch.date.format(DATE_FORMAT).to_string(),
            status: None,
            visible_bounds: None,
            config,
        };

        app.navigate(launch.lat.as_deref(), launch.lng.as_deref());
        info!("Viewer started at {} for {}", app.sync.cell(), launch.date);
        Ok(app)
    }

    fn navigate(&mut self, lat: Option<&str>, lng: Option<&str>) {
        if let Some(request) = self.sync.set_route(lat, lng) {
            self.worker.submit(FetchJob::Puzzle(request));
        }
        let resolved = self.sync.resolved();
        if !resolved.from_route && (lat.is_some() || lng.is_some()) {
            self.status = Some("Invalid graticule, showing the default".to_string());
        } else {
            self.status = None;
        }
    }

    fn apply_outcomes(&mut self) {
        let outcomes: Vec<FetchOutcome> = self.worker.try_iter().collect();
        for outcome in outcomes {
            match outcome {
                FetchOutcome::Puzzle(request, result) => {
                    self.sync.apply_puzzle(request, result);
                }
                FetchOutcome::Forecast(result) => self.sync.apply_forecast(result),
                FetchOutcome::Globalhash(result) => self.sync.apply_globalhash(result),
            }
        }
        self.notices.extend(self.sync.drain_notices());
    }

    fn drain_events(&mut self) {
        loop {
            match self.events.try_recv() {
                Ok(SyncEvent::BoundsChanged(bounds)) => self.visible_bounds = Some(bounds),
                Ok(SyncEvent::CellChanged(cell)) => {
                    let (lat, lng) = cell.to_route_params();
                    self.lat_input = lat;
                    self.lng_input = lng;
                }
                Ok(event) => debug!("{:?}", event),
                Err(TryRecvError::Lagged(skipped)) => warn!("Skipped {} map events", skipped),
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
    }

    fn apply_pending_view(&mut self) {
        if let Some((center, zoom)) = self.sync.surface_mut().take_pending_view() {
            self.map_memory
                .center_at(walkers::lat_lon(center.lat, center.lng));
            if let Err(e) = self.map_memory.set_zoom(zoom) {
                warn!("Cannot zoom to {}: {:?}", zoom, e);
            }
        }
    }

    fn save_default_center(&mut self) {
        let center = self.sync.cell().midpoint();
        self.config.default_lat = center.lat;
        self.config.default_lng = center.lng;
        match self.config.save() {
            Ok(()) => {
                info!("Default center saved as {:.2}, {:.2}", center.lat, center.lng);
                self.status = None;
            }
            Err(e) => {
                warn!("Failed to save config: {}", e);
                self.status = Some(format!("Could not save settings: {e}"));
            }
        }
    }

    fn toggle_overlay(&mut self, kind: OverlayKind) {
        let (action, job) = match kind {
            OverlayKind::ForecastMarkers => (self.sync.toggle_forecast(), FetchJob::Forecast),
            OverlayKind::GlobalhashMarker => (self.sync.toggle_globalhash(), FetchJob::Globalhash),
            _ => return,
        };
        if action == ToggleAction::Fetch {
            self.worker.submit(job);
        }
    }

    fn draw_side_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Geohash");
        ui.add_space(6.0);

        egui::Grid::new("puzzle_grid")
            .num_columns(2)
            .spacing([12.0, 4.0])
            .show(ui, |ui| {
                ui.label("Graticule");
                ui.monospace(self.sync.cell().to_string());
                ui.end_row();

                ui.label("Date");
                ui.monospace(self.sync.date().to_string());
                ui.end_row();

                ui.label("DJIA");
                ui.monospace(
                    self.sync
                        .puzzle()
                        .map_or("–", |p| p.auxiliary_value.as_str()),
                );
                ui.end_row();

                ui.label("Hash");
                match self.sync.candidates() {
                    Some(set) => {
                        let p = set.canonical().position;
                        ui.monospace(format!("{:.6}, {:.6}", p.lat, p.lng));
                    }
                    None => {
                        ui.weak("loading…");
                    }
                }
                ui.end_row();
            });

        ui.separator();
        ui.label("Graticule");
        ui.horizontal(|ui| {
            ui.add(egui::TextEdit::singleline(&mut self.lat_input).desired_width(50.0).hint_text("lat"));
            ui.add(egui::TextEdit::singleline(&mut self.lng_input).desired_width(50.0).hint_text("lng"));
        });
        ui.horizontal(|ui| {
            if ui.button("Go").clicked() {
                let (lat, lng) = (self.lat_input.clone(), self.lng_input.clone());
                let lat = Some(lat.as_str()).filter(|s| !s.trim().is_empty());
                let lng = Some(lng.as_str()).filter(|s| !s.trim().is_empty());
                self.navigate(lat, lng);
            }
            if ui.button("Default").clicked() {
                self.navigate(None, None);
            }
        });
        let regions: Vec<(String, GraticuleCell)> = self
            .config
            .region_graticules()
            .map(|(name, cell)| (name.to_owned(), cell))
            .collect();
        if !regions.is_empty() {
            ui.horizontal_wrapped(|ui| {
                for (name, cell) in regions {
                    if ui.button(name).on_hover_text(cell.to_string()).clicked() {
                        let (lat, lng) = cell.to_route_params();
                        self.navigate(Some(&lat), Some(&lng));
                    }
                }
            });
        }
        if ui
            .button("Save as default")
            .on_hover_text("Start here next time")
            .clicked()
        {
            self.save_default_center();
        }

        ui.add_space(4.0);
        ui.label("Date (YYYY-MM-DD)");
        ui.horizontal(|ui| {
            ui.add(egui::TextEdit::singleline(&mut self.date_input).desired_width(90.0));
            if ui.button("Set").clicked() {
                match parse_date(&self.date_input) {
                    Some(date) => {
                        if let Some(request) = self.sync.set_date(date) {
                            self.worker.submit(FetchJob::Puzzle(request));
                        }
                        self.status = None;
                    }
                    None => self.status = Some(format!("Invalid date '{}'", self.date_input)),
                }
            }
        });
        if ui.button("Refresh").clicked() {
            if let Some(request) = self.sync.refresh() {
                self.worker.submit(FetchJob::Puzzle(request));
            }
        }

        ui.separator();
        ui.label("Overlays");
        for (kind, name) in [
            (OverlayKind::ForecastMarkers, "forecast"),
            (OverlayKind::GlobalhashMarker, "globalhash"),
        ] {
            let state = match kind {
                OverlayKind::ForecastMarkers => self.sync.forecast_state(),
                _ => self.sync.globalhash_state(),
            };
            let busy = self.sync.is_busy(kind);
            let button = ui.add_enabled(!busy, egui::Button::new(toggle_caption(name, state, busy)));
            if button.clicked() {
                self.toggle_overlay(kind);
            }
        }

        if let Some(status) = &self.status {
            ui.separator();
            ui.colored_label(egui::Color32::from_rgb(220, 80, 80), status);
        }

        if let Some(bounds) = self.visible_bounds {
            ui.separator();
            ui.small(format!(
                "View {:.3},{:.3} – {:.3},{:.3}",
                bounds.south_west.lat, bounds.south_west.lng, bounds.north_east.lat, bounds.north_east.lng
            ));
        }
    }

    fn draw_map(&mut self, ui: &mut egui::Ui) {
        let plugin = OverlayPlugin::new(self.sync.surface(), Arc::clone(&self.feedback));
        let center = self.sync.resolved().view_center;

        let map = Map::new(
            Some(&mut self.tiles),
            &mut self.map_memory,
            walkers::lat_lon(center.lat, center.lng),
        )
        .with_plugin(plugin);
        let response = ui.add(map);

        self.sync.surface_mut().sync_zoom(self.map_memory.zoom());

        let (clicked, bounds) = match self.feedback.lock() {
            Ok(mut feedback) => (feedback.clicked.take(), feedback.bounds.take()),
            Err(_) => (None, None),
        };
        if let Some((group, index)) = clicked {
            self.sync.surface_mut().open_popup(group, index);
        }
        if !response.dragged() {
            if let Some(bounds) = bounds {
                self.sync.viewport_settled(bounds);
            }
        }
    }

    fn draw_notice(&mut self, ctx: &egui::Context) {
        let Some(notice) = self.notices.front() else {
            return;
        };

        let mut dismissed = false;
        egui::Window::new("Notice")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                ui.label(&notice.message);
                ui.add_space(6.0);
                if ui.button("OK").clicked() {
                    dismissed = true;
                }
            });

        if dismissed {
            self.notices.pop_front();
        }
    }
}

impl eframe::App for GeohashApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.apply_outcomes();
        self.drain_events();
        self.apply_pending_view();

        egui::SidePanel::left("geohash_panel")
            .default_width(self.config.side_panel_width)
            .resizable(true)
            .show(ctx, |ui| self.draw_side_panel(ui));

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.draw_map(ui));

        self.draw_notice(ctx);
    }
}
