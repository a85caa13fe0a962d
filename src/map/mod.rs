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

//! Map rendering on top of walkers.
//!
//! [`RenderedMap`] is the engine's map surface. It keeps overlay groups in
//! memory and queues viewport changes; the app applies those to the walkers
//! `MapMemory` each frame and draws the groups through [`OverlayPlugin`].

mod plugin;
mod surface;
mod tiles;

pub use plugin::{MapFeedback, OverlayPlugin};
pub use surface::RenderedMap;
pub use tiles::{OsmTileSource, DEFAULT_TILE_URL};
