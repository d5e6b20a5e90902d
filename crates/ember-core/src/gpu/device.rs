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

use super::error::DeviceError;
use super::flags::{BufferFlags, TextureFlags};
use super::handle::{
    BufferHandle, FramebufferHandle, ProgramHandle, QueryHandle, TextureHandle,
};
use super::shader::ProgramSource;
use super::texture::TextureFormat;
use crate::platform::WindowTarget;
use std::fmt::Debug;

/// The abstract interface to a graphics driver.
///
/// This trait is the single point of contact with the underlying graphics
/// API. It is implemented by a concrete backend in `ember-infra` and
/// consumed by the render thread in `ember-render`.
///
/// # Threading contract
///
/// All stateful operations (creation, destruction, updates, mapping,
/// binding, queries, present) must be called on the render thread; a
/// backend is expected to enforce this in debug builds via
/// [`check_thread`](Self::check_thread). The `alloc_*_handle` id allocators
/// are the one exception: they are free-threaded so that producer threads
/// can reserve handles synchronously while the matching creation job is
/// still in flight.
pub trait GpuDevice: Send + Sync + Debug + 'static {
    // --- Lifecycle ---

    /// Initialises the backend against an optional presentation target.
    ///
    /// Called exactly once, on the render thread, before any other stateful
    /// operation. A backend without a window (headless) receives `None`.
    ///
    /// # Errors
    /// Returns a [`DeviceError`] if context or surface creation fails.
    fn init(&self, window: Option<&WindowTarget>, vsync: bool) -> Result<(), DeviceError>;

    /// Tears the backend down. No stateful call may follow.
    fn shutdown(&self);

    /// Asserts that the caller is on the render thread (debug builds).
    fn check_thread(&self);

    /// Presents the current frame.
    fn swap_buffers(&self);

    // --- Handle allocators (free-threaded) ---

    /// Reserves a buffer id. Returns [`BufferHandle::INVALID`] on exhaustion.
    fn alloc_buffer_handle(&self) -> BufferHandle;

    /// Reserves a texture id. Returns [`TextureHandle::INVALID`] on exhaustion.
    fn alloc_texture_handle(&self) -> TextureHandle;

    /// Reserves a program id. Returns [`ProgramHandle::INVALID`] on exhaustion.
    fn alloc_program_handle(&self) -> ProgramHandle;

    /// Reserves a framebuffer id. Returns [`FramebufferHandle::INVALID`] on
    /// exhaustion.
    fn alloc_framebuffer_handle(&self) -> FramebufferHandle;

    // --- Buffers ---

    /// Creates the buffer behind a reserved handle.
    ///
    /// # Errors
    /// Returns a [`DeviceError`] if the handle is invalid or allocation
    /// fails.
    fn create_buffer(
        &self,
        handle: BufferHandle,
        flags: BufferFlags,
        size: usize,
        data: Option<&[u8]>,
    ) -> Result<(), DeviceError>;

    /// Destroys a buffer, releasing its memory.
    fn destroy_buffer(&self, handle: BufferHandle);

    /// Writes `data` into a buffer at `offset`.
    fn update_buffer(
        &self,
        handle: BufferHandle,
        offset: usize,
        data: &[u8],
    ) -> Result<(), DeviceError>;

    /// Maps a buffer range into host memory and returns the base pointer.
    ///
    /// The pointer stays valid until [`unmap_buffer`](Self::unmap_buffer)
    /// for `PERSISTENT` mappings.
    ///
    /// # Errors
    /// Returns a [`DeviceError`] if the range is out of bounds or the
    /// buffer's flags do not permit the mapping.
    fn map_buffer(
        &self,
        handle: BufferHandle,
        offset: usize,
        size: usize,
        flags: BufferFlags,
    ) -> Result<*mut u8, DeviceError>;

    /// Releases a mapping created by [`map_buffer`](Self::map_buffer).
    fn unmap_buffer(&self, handle: BufferHandle);

    /// Makes `len` mapped bytes at `offset` visible to the GPU
    /// (`MAP_FLUSH_EXPLICIT` mappings).
    fn flush_buffer(&self, handle: BufferHandle, offset: usize, len: usize);

    /// Binds a buffer range to a uniform binding slot.
    fn bind_uniform_buffer(&self, binding: u32, handle: BufferHandle, offset: usize, size: usize);

    // --- Textures ---

    /// Creates the texture behind a reserved handle.
    ///
    /// # Errors
    /// Returns a [`DeviceError`] if the handle is invalid or the
    /// dimensions/format combination is rejected.
    #[allow(clippy::too_many_arguments)]
    fn create_texture(
        &self,
        handle: TextureHandle,
        width: u32,
        height: u32,
        depth: u32,
        format: TextureFormat,
        flags: TextureFlags,
        data: Option<&[u8]>,
        debug_name: &str,
    ) -> Result<(), DeviceError>;

    /// Destroys a texture, releasing its memory.
    fn destroy_texture(&self, handle: TextureHandle);

    /// Writes a region of texel data into mip `level` of a texture.
    #[allow(clippy::too_many_arguments)]
    fn update_texture(
        &self,
        handle: TextureHandle,
        level: u32,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        format: TextureFormat,
        data: &[u8],
    ) -> Result<(), DeviceError>;

    /// Creates a texture from a container blob (header plus pixel data).
    ///
    /// # Errors
    /// Returns a [`DeviceError`] if the container cannot be decoded.
    fn load_texture(
        &self,
        handle: TextureHandle,
        data: &[u8],
        flags: TextureFlags,
        debug_name: &str,
    ) -> Result<(), DeviceError>;

    /// Copies up to `size` bytes of a texture's image back into `dst`.
    fn get_texture_image(
        &self,
        handle: TextureHandle,
        size: usize,
        dst: &mut [u8],
    ) -> Result<(), DeviceError>;

    // --- Programs ---

    /// Compiles and links the program behind a reserved handle.
    ///
    /// `defines` are preprocessor names prepended to every stage source.
    ///
    /// # Errors
    /// Returns [`DeviceError::ProgramFailed`] with compiler output on
    /// failure.
    fn create_program(
        &self,
        handle: ProgramHandle,
        sources: &[ProgramSource<'_>],
        defines: &[&str],
        debug_name: &str,
    ) -> Result<(), DeviceError>;

    /// Destroys a program.
    fn destroy_program(&self, handle: ProgramHandle);

    // --- Framebuffers ---

    /// Creates the framebuffer behind a reserved handle.
    fn create_framebuffer(&self, handle: FramebufferHandle) -> Result<(), DeviceError>;

    /// Destroys a framebuffer.
    fn destroy_framebuffer(&self, handle: FramebufferHandle);

    // --- Timestamp queries ---

    /// Creates a timestamp query object.
    fn create_query(&self) -> QueryHandle;

    /// Destroys a query object.
    fn destroy_query(&self, query: QueryHandle);

    /// Records the GPU timeline position into `query`.
    fn query_timestamp(&self, query: QueryHandle);

    /// Returns `true` once a query's result can be read without stalling.
    fn is_query_ready(&self, query: QueryHandle) -> bool;

    /// Reads a query's timestamp in nanoseconds, stalling if necessary.
    fn query_result(&self, query: QueryHandle) -> u64;

    // --- Diagnostics ---

    /// Opens a named debug group in the driver's command stream.
    fn push_debug_group(&self, name: &str);

    /// Closes the innermost debug group.
    fn pop_debug_group(&self);

    /// Starts a frame capture in an attached graphics debugger.
    fn start_capture(&self);

    /// Stops a frame capture.
    fn stop_capture(&self);
}
