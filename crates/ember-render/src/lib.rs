// Copyright 2025 eraflo
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

//! # Ember Render
//!
//! The threaded render-command pipeline. Producer threads submit
//! [`RenderJob`]s through the [`Renderer`] facade; each submission fans its
//! `setup` out onto the job scheduler's workers while a per-submission
//! signal chain keeps the queue appends totally ordered, and a single
//! dedicated render thread — the only thread allowed to touch the
//! [`GpuDevice`](ember_core::GpuDevice) — drains the queue and runs each
//! job's `execute` in submission order.
//!
//! The pipeline also owns:
//!
//! - a persistently-mapped transient upload buffer that producers
//!   bump-allocate per-frame vertex/index/uniform data from,
//! - a GPU timer-query profiler whose finished frames travel back to the
//!   producer side through a three-slot history ring,
//! - a frame-pacing semaphore that bounds CPU render-ahead to two frames.

#![warn(missing_docs)]

mod config;
mod interner;
mod job;
mod profiler;
mod queue;
mod render_thread;
mod renderer;
mod sync;
mod transient;

pub use config::RendererSettings;
pub use interner::InternTable;
pub use job::{RenderContext, RenderJob};
pub use profiler::{GpuTiming, PROFILER_HISTORY_FRAMES};
pub use renderer::{Renderer, MAX_LAYERS, MAX_SHADER_DEFINES};
pub use sync::Semaphore;
pub use transient::{TransientSlice, TRANSIENT_BUFFER_SIZE};
