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

//! # Ember Core
//!
//! Foundational crate containing the backend-agnostic contracts and types of
//! the Ember render-command pipeline: GPU resource handles, the
//! [`GpuDevice`] driver trait, buffer/texture flags and formats, device
//! errors, job payload memory, and the per-frame global uniform state.
//!
//! This crate defines the 'what' of talking to a GPU; the 'how' lives in a
//! concrete backend in `ember-infra`, and the threading machinery that
//! serialises driver access lives in `ember-render`.

#![warn(missing_docs)]

pub mod global_state;
pub mod gpu;
pub mod mem;
pub mod platform;

pub use global_state::GlobalState;
pub use gpu::{
    BufferFlags, BufferHandle, DeviceError, FramebufferHandle, GpuDevice, ProgramHandle,
    ProgramSource, QueryHandle, RendererError, ShaderKind, TextureFlags, TextureFormat,
    TextureHandle, TextureInfo,
};
pub use mem::MemRef;
pub use platform::WindowTarget;
