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

//! The abstract GPU driver surface.
//!
//! This module contains the contracts through which the rest of the engine
//! talks to a graphics backend:
//!
//! - [`GpuDevice`]: the driver capability set. Every stateful call must be
//!   made on the render thread; only the handle allocators are free-threaded.
//! - Handle newtypes ([`BufferHandle`], [`TextureHandle`], ...): small
//!   opaque ids reserved synchronously on any thread and made live by a
//!   creation job that runs on the render thread later.
//! - Flags, formats and descriptors shared by all backends.

mod device;
mod error;
mod flags;
mod handle;
mod shader;
mod texture;

pub use self::device::GpuDevice;
pub use self::error::{DeviceError, RendererError};
pub use self::flags::{BufferFlags, TextureFlags};
pub use self::handle::{
    BufferHandle, FramebufferHandle, ProgramHandle, QueryHandle, TextureHandle,
};
pub use self::shader::{ProgramSource, ShaderKind};
pub use self::texture::{parse_dds_header, TextureFormat, TextureInfo};
