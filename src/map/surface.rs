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

use std::collections::BTreeMap;

use geohash_client::{GroupId, LatLng, MapSurface, RenderPrimitive};
use log::warn;

/// In-memory map surface drawn by the walkers plugin.
#[derive(Debug)]
pub struct RenderedMap {
    next_group: u64,
    groups: BTreeMap<GroupId, Vec<RenderPrimitive>>,
    open_popup: Option<(GroupId, usize)>,
    pending_view: Option<(LatLng, f64)>,
    zoom: f64,
}

impl RenderedMap {
    #[must_use]
    pub fn new(zoom: f64) -> Self {
        Self {
            next_group: 0,
            groups: BTreeMap::new(),
            open_popup: None,
            pending_view: None,
            zoom,
        }
    }

    /// Take the viewport change requested since the last frame.
    pub fn take_pending_view(&mut self) -> Option<(LatLng, f64)> {
        self.pending_view.take()
    }

    /// Record the zoom the widget actually shows (the user may have zoomed).
    pub fn sync_zoom(&mut self, zoom: f64) {
        if self.pending_view.is_none() {
            self.zoom = zoom;
        }
    }

    /// Groups in creation order.
    pub fn groups(&self) -> impl Iterator<Item = (GroupId, &[RenderPrimitive])> {
        self.groups.iter().map(|(id, prims)| (*id, prims.as_slice()))
    }

    /// Text of the open popup, if its marker still exists.
    #[must_use]
    pub fn open_popup_text(&self) -> Option<(LatLng, &str)> {
        let (group, index) = self.open_popup?;
        match self.groups.get(&group)?.get(index)? {
            RenderPrimitive::Marker {
                position, popup, ..
            } => Some((*position, popup.as_str())),
            _ => None,
        }
    }
}

impl MapSurface for RenderedMap {
    fn create_group(&mut self) -> GroupId {
        self.next_group += 1;
        let id = GroupId(self.next_group);
        self.groups.insert(id, Vec::new());
        id
    }

    fn add_to_group(&mut self, group: GroupId, primitive: RenderPrimitive) {
        match self.groups.get_mut(&group) {
            Some(primitives) => primitives.push(primitive),
            None => warn!("Dropping primitive for unknown group {:?}", group),
        }
    }

    fn remove_group(&mut self, group: GroupId) {
        self.groups.remove(&group);
        if self.open_popup.is_some_and(|(g, _)| g == group) {
            self.open_popup = None;
        }
    }

    fn open_popup(&mut self, group: GroupId, index: usize) {
        self.open_popup = Some((group, index));
    }

    fn set_view(&mut self, center: LatLng, zoom: f64) {
        self.zoom = zoom;
        self.pending_view = Some((center, zoom));
    }

    fn zoom(&self) -> f64 {
        self.zoom
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geohash_client::{PrimitiveStyle, Rgb};

    fn marker(text: &str) -> RenderPrimitive {
        RenderPrimitive::Marker {
            position: LatLng::new(1.0, 2.0),
            popup: text.to_string(),
            style: PrimitiveStyle::marker(Rgb::RED),
        }
    }

    #[test]
    fn test_groups_and_popup() {
        let mut map = RenderedMap::new(10.0);
        let group = map.create_group();
        map.add_to_group(group, marker("a"));
        map.add_to_group(group, marker("b"));
        map.open_popup(group, 1);

        assert_eq!(map.groups().count(), 1);
        assert_eq!(map.open_popup_text(), Some((LatLng::new(1.0, 2.0), "b")));

        map.remove_group(group);
        assert_eq!(map.groups().count(), 0);
        assert_eq!(map.open_popup_text(), None);
    }

    #[test]
    fn test_groups_iterate_in_creation_order() {
        let mut map = RenderedMap::new(10.0);
        let first = map.create_group();
        let second = map.create_group();
        let third = map.create_group();
        map.remove_group(second);

        let ids: Vec<GroupId> = map.groups().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![first, third]);
        assert!(first < third);
    }

    #[test]
    fn test_unknown_group_is_ignored() {
        let mut map = RenderedMap::new(10.0);
        map.add_to_group(GroupId(99), marker("x"));
        assert_eq!(map.groups().count(), 0);
    }

    #[test]
    fn test_pending_view_and_zoom() {
        let mut map = RenderedMap::new(13.0);
        map.set_view(LatLng::new(50.5, 20.5), 10.0);

        // widget zoom does not override a queued view
        map.sync_zoom(13.0);
        assert!((map.zoom() - 10.0).abs() < f64::EPSILON);

        assert_eq!(map.take_pending_view(), Some((LatLng::new(50.5, 20.5), 10.0)));
        assert_eq!(map.take_pending_view(), None);

        map.sync_zoom(12.0);
        assert!((map.zoom() - 12.0).abs() < f64::EPSILON);
    }
}
