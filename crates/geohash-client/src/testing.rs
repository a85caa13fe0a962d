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

//! Test doubles for the map surface and the backend.

use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;
use std::ops::Deref;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use chrono::NaiveDate;

use crate::graticule::{GraticuleCell, LatLng};
use crate::overlay::{GroupId, MapSurface, RenderPrimitive};
use crate::puzzle::{Backend, BackendError, ForecastEntry, GlobalPuzzle, PuzzleResult};

#[derive(Debug)]
struct SurfaceLog {
    next_group: u64,
    groups: HashMap<GroupId, Vec<RenderPrimitive>>,
    removed: Vec<GroupId>,
    popups: Vec<(GroupId, usize)>,
    views: Vec<(LatLng, f64)>,
    zoom: f64,
}

impl Default for SurfaceLog {
    fn default() -> Self {
        Self {
            next_group: 0,
            groups: HashMap::new(),
            removed: Vec::new(),
            popups: Vec::new(),
            views: Vec::new(),
            zoom: 13.0,
        }
    }
}

/// Surface state that outlives the surface itself.
#[derive(Debug, Clone, Default)]
pub struct SharedLog(Rc<RefCell<SurfaceLog>>);

impl SharedLog {
    pub fn live_groups(&self) -> usize {
        self.0.borrow().groups.len()
    }

    pub fn removed_count(&self) -> usize {
        self.0.borrow().removed.len()
    }

    pub fn removed(&self) -> Vec<GroupId> {
        self.0.borrow().removed.clone()
    }

    pub fn primitives(&self, group: GroupId) -> Vec<RenderPrimitive> {
        self.0.borrow().groups.get(&group).cloned().unwrap_or_default()
    }

    pub fn opened_popups(&self) -> Vec<(GroupId, usize)> {
        self.0.borrow().popups.clone()
    }

    pub fn views(&self) -> Vec<(LatLng, f64)> {
        self.0.borrow().views.clone()
    }

    pub fn last_view(&self) -> Option<(LatLng, f64)> {
        self.0.borrow().views.last().copied()
    }
}

/// A [`MapSurface`] that records everything done to it.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    log: SharedLog,
}

impl RecordingSurface {
    pub fn shared_log(&self) -> SharedLog {
        self.log.clone()
    }
}

impl Deref for RecordingSurface {
    type Target = SharedLog;

    fn deref(&self) -> &Self::Target {
        &self.log
    }
}

impl MapSurface for RecordingSurface {
    fn create_group(&mut self) -> GroupId {
        let mut log = self.log.0.borrow_mut();
        log.next_group += 1;
        let id = GroupId(log.next_group);
        log.groups.insert(id, Vec::new());
        id
    }

    fn add_to_group(&mut self, group: GroupId, primitive: RenderPrimitive) {
        let mut log = self.log.0.borrow_mut();
        log.groups
            .get_mut(&group)
            .expect("primitive added to unknown group")
            .push(primitive);
    }

    fn remove_group(&mut self, group: GroupId) {
        let mut log = self.log.0.borrow_mut();
        if log.groups.remove(&group).is_some() {
            log.removed.push(group);
        }
    }

    fn open_popup(&mut self, group: GroupId, index: usize) {
        self.log.0.borrow_mut().popups.push((group, index));
    }

    fn set_view(&mut self, center: LatLng, zoom: f64) {
        let mut log = self.log.0.borrow_mut();
        log.zoom = zoom;
        log.views.push((center, zoom));
    }

    fn zoom(&self) -> f64 {
        self.log.0.borrow().zoom
    }
}

/// An in-memory [`Backend`] with canned answers.
#[derive(Debug, Default)]
pub struct MockBackend {
    puzzle: Option<PuzzleResult>,
    forecast: Option<Vec<ForecastEntry>>,
    global: Option<GlobalPuzzle>,
    offline: bool,
    puzzle_calls: Mutex<Vec<(GraticuleCell, NaiveDate)>>,
    forecast_calls: AtomicUsize,
    global_calls: AtomicUsize,
}

impl MockBackend {
    pub fn with_puzzle(mut self, puzzle: PuzzleResult) -> Self {
        self.puzzle = Some(puzzle);
        self
    }

    pub fn with_forecast(mut self, forecast: Vec<ForecastEntry>) -> Self {
        self.forecast = Some(forecast);
        self
    }

    pub fn with_global(mut self, global: GlobalPuzzle) -> Self {
        self.global = Some(global);
        self
    }

    pub fn offline(mut self) -> Self {
        self.offline = true;
        self
    }

    pub fn puzzle_calls(&self) -> Vec<(GraticuleCell, NaiveDate)> {
        self.puzzle_calls.lock().unwrap().clone()
    }

    pub fn forecast_calls(&self) -> usize {
        self.forecast_calls.load(Ordering::SeqCst)
    }

    pub fn global_calls(&self) -> usize {
        self.global_calls.load(Ordering::SeqCst)
    }

    fn answer<T: Clone>(&self, value: Option<&T>, what: &str) -> Result<T, BackendError> {
        if self.offline {
            return Err(BackendError::Network("connection refused".to_string()));
        }
        value
            .cloned()
            .ok_or_else(|| BackendError::NotFound(what.to_string()))
    }
}

impl Backend for MockBackend {
    fn get_puzzle(
        &self,
        cell: GraticuleCell,
        date: NaiveDate,
    ) -> impl Future<Output = Result<PuzzleResult, BackendError>> + Send {
        self.puzzle_calls.lock().unwrap().push((cell, date));
        let result = self.answer(self.puzzle.as_ref(), "puzzle");
        async move { result }
    }

    fn get_forecast(&self) -> impl Future<Output = Result<Vec<ForecastEntry>, BackendError>> + Send {
        self.forecast_calls.fetch_add(1, Ordering::SeqCst);
        let result = self.answer(self.forecast.as_ref(), "forecast");
        async move { result }
    }

    fn get_global_puzzle(&self) -> impl Future<Output = Result<GlobalPuzzle, BackendError>> + Send {
        self.global_calls.fetch_add(1, Ordering::SeqCst);
        let result = self.answer(self.global.as_ref(), "globalhash");
        async move { result }
    }
}
