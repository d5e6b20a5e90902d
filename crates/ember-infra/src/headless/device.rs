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

use ember_core::gpu::parse_dds_header;
use ember_core::{
    BufferFlags, BufferHandle, DeviceError, FramebufferHandle, GpuDevice, ProgramHandle,
    ProgramSource, QueryHandle, TextureFlags, TextureFormat, TextureHandle, WindowTarget,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};
use std::thread::{self, ThreadId};
use std::time::Instant;

struct BufferRecord {
    flags: BufferFlags,
    data: Box<[u8]>,
    mapped: bool,
}

struct TextureRecord {
    width: u32,
    height: u32,
    depth: u32,
    format: TextureFormat,
    data: Box<[u8]>,
}

struct ProgramRecord {
    stages: usize,
    defines: usize,
}

/// A [`GpuDevice`] that keeps every resource in host memory.
///
/// The device performs no rendering, but it faithfully models the parts of
/// a driver the pipeline depends on: free-threaded handle allocators,
/// persistent buffer mappings backed by real heap memory, monotonic
/// timestamp queries, and the render-thread affinity contract, which it
/// enforces with debug assertions on every stateful call. The sandbox and the pipeline's integration tests run against it.
pub struct HeadlessDevice {
    render_thread: OnceLock<ThreadId>,
    epoch: Instant,
    next_buffer: AtomicU32,
    next_texture: AtomicU32,
    next_program: AtomicU32,
    next_framebuffer: AtomicU32,
    next_query: AtomicU32,
    buffers: Mutex<HashMap<u32, BufferRecord>>,
    textures: Mutex<HashMap<u32, TextureRecord>>,
    programs: Mutex<HashMap<u32, ProgramRecord>>,
    framebuffers: Mutex<HashMap<u32, ()>>,
    queries: Mutex<HashMap<u32, Option<u64>>>,
    debug_groups: Mutex<Vec<String>>,
    frames_presented: AtomicU64,
    capturing: AtomicBool,
    vsync: AtomicBool,
    shut_down: AtomicBool,
}

impl HeadlessDevice {
    /// Creates an uninitialised device; `init` runs later, on the render
    /// thread.
    pub fn new() -> Self {
        Self {
            render_thread: OnceLock::new(),
            epoch: Instant::now(),
            next_buffer: AtomicU32::new(0),
            next_texture: AtomicU32::new(0),
            next_program: AtomicU32::new(0),
            next_framebuffer: AtomicU32::new(0),
            next_query: AtomicU32::new(0),
            buffers: Mutex::new(HashMap::new()),
            textures: Mutex::new(HashMap::new()),
            programs: Mutex::new(HashMap::new()),
            framebuffers: Mutex::new(HashMap::new()),
            queries: Mutex::new(HashMap::new()),
            debug_groups: Mutex::new(Vec::new()),
            frames_presented: AtomicU64::new(0),
            capturing: AtomicBool::new(false),
            vsync: AtomicBool::new(true),
            shut_down: AtomicBool::new(false),
        }
    }

    fn nanos(&self) -> u64 {
        self.epoch.elapsed().as_nanos() as u64
    }

    // --- Introspection for tests and the sandbox ---

    /// The thread `init` ran on, once it has.
    pub fn render_thread_id(&self) -> Option<ThreadId> {
        self.render_thread.get().copied()
    }

    /// The number of `swap_buffers` calls so far.
    pub fn frames_presented(&self) -> u64 {
        self.frames_presented.load(Ordering::SeqCst)
    }

    /// Whether `shutdown` has run.
    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    /// The number of live buffers.
    pub fn live_buffers(&self) -> usize {
        self.buffers.lock().unwrap().len()
    }

    /// The number of live textures.
    pub fn live_textures(&self) -> usize {
        self.textures.lock().unwrap().len()
    }

    /// The number of live programs.
    pub fn live_programs(&self) -> usize {
        self.programs.lock().unwrap().len()
    }

    /// A copy of a buffer's current contents.
    pub fn buffer_contents(&self, handle: BufferHandle) -> Option<Vec<u8>> {
        self.buffers
            .lock()
            .unwrap()
            .get(&handle.raw())
            .map(|record| record.data.to_vec())
    }

    /// A texture's dimensions and storage format.
    pub fn texture_info(&self, handle: TextureHandle) -> Option<(u32, u32, u32, TextureFormat)> {
        self.textures
            .lock()
            .unwrap()
            .get(&handle.raw())
            .map(|record| (record.width, record.height, record.depth, record.format))
    }

    /// A program's stage and define counts.
    pub fn program_info(&self, handle: ProgramHandle) -> Option<(usize, usize)> {
        self.programs
            .lock()
            .unwrap()
            .get(&handle.raw())
            .map(|record| (record.stages, record.defines))
    }
}

impl Default for HeadlessDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HeadlessDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeadlessDevice")
            .field("buffers", &self.live_buffers())
            .field("textures", &self.live_textures())
            .field("frames_presented", &self.frames_presented())
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}

impl GpuDevice for HeadlessDevice {
    fn init(&self, _window: Option<&WindowTarget>, vsync: bool) -> Result<(), DeviceError> {
        if self.render_thread.set(thread::current().id()).is_err() {
            return Err(DeviceError::InitializationFailed(
                "device initialised twice".to_string(),
            ));
        }
        self.vsync.store(vsync, Ordering::SeqCst);
        log::info!("Headless device initialised (vsync: {vsync}).");
        Ok(())
    }

    fn shutdown(&self) {
        self.check_thread();
        self.shut_down.store(true, Ordering::SeqCst);
        log::info!("Headless device shut down.");
    }

    fn check_thread(&self) {
        debug_assert!(
            !self.shut_down.load(Ordering::SeqCst),
            "driver call after shutdown"
        );
        debug_assert_eq!(
            self.render_thread.get(),
            Some(&thread::current().id()),
            "driver call off the render thread"
        );
    }

    fn swap_buffers(&self) {
        self.check_thread();
        self.frames_presented.fetch_add(1, Ordering::SeqCst);
    }

    fn alloc_buffer_handle(&self) -> BufferHandle {
        BufferHandle::new(self.next_buffer.fetch_add(1, Ordering::Relaxed))
    }

    fn alloc_texture_handle(&self) -> TextureHandle {
        TextureHandle::new(self.next_texture.fetch_add(1, Ordering::Relaxed))
    }

    fn alloc_program_handle(&self) -> ProgramHandle {
        ProgramHandle::new(self.next_program.fetch_add(1, Ordering::Relaxed))
    }

    fn alloc_framebuffer_handle(&self) -> FramebufferHandle {
        FramebufferHandle::new(self.next_framebuffer.fetch_add(1, Ordering::Relaxed))
    }

    fn create_buffer(
        &self,
        handle: BufferHandle,
        flags: BufferFlags,
        size: usize,
        data: Option<&[u8]>,
    ) -> Result<(), DeviceError> {
        self.check_thread();
        if !handle.is_valid() {
            return Err(DeviceError::InvalidHandle);
        }
        let mut bytes = vec![0u8; size].into_boxed_slice();
        if let Some(data) = data {
            if data.len() > size {
                return Err(DeviceError::OutOfBounds);
            }
            bytes[..data.len()].copy_from_slice(data);
        }
        self.buffers.lock().unwrap().insert(
            handle.raw(),
            BufferRecord {
                flags,
                data: bytes,
                mapped: false,
            },
        );
        Ok(())
    }

    fn destroy_buffer(&self, handle: BufferHandle) {
        self.check_thread();
        if self.buffers.lock().unwrap().remove(&handle.raw()).is_none() {
            log::warn!("Destroying unknown buffer {handle:?}.");
        }
    }

    fn update_buffer(
        &self,
        handle: BufferHandle,
        offset: usize,
        data: &[u8],
    ) -> Result<(), DeviceError> {
        self.check_thread();
        let mut buffers = self.buffers.lock().unwrap();
        let record = buffers
            .get_mut(&handle.raw())
            .ok_or(DeviceError::InvalidHandle)?;
        if offset + data.len() > record.data.len() {
            return Err(DeviceError::OutOfBounds);
        }
        record.data[offset..offset + data.len()].copy_from_slice(data);
        Ok(())
    }

    fn map_buffer(
        &self,
        handle: BufferHandle,
        offset: usize,
        size: usize,
        flags: BufferFlags,
    ) -> Result<*mut u8, DeviceError> {
        self.check_thread();
        if !flags.contains(BufferFlags::MAP_WRITE) && !flags.contains(BufferFlags::MAP_READ) {
            return Err(DeviceError::InvalidMapping(
                "mapping needs MAP_READ or MAP_WRITE".to_string(),
            ));
        }
        let mut buffers = self.buffers.lock().unwrap();
        let record = buffers
            .get_mut(&handle.raw())
            .ok_or(DeviceError::InvalidHandle)?;
        if flags.contains(BufferFlags::MAP_WRITE) && !record.flags.contains(BufferFlags::MAP_WRITE)
        {
            return Err(DeviceError::InvalidMapping(
                "buffer was not created with MAP_WRITE".to_string(),
            ));
        }
        if offset + size > record.data.len() {
            return Err(DeviceError::OutOfBounds);
        }
        record.mapped = true;
        // The boxed storage never moves while the record lives; the pointer
        // stays valid until unmap + destroy.
        Ok(unsafe { record.data.as_mut_ptr().add(offset) })
    }

    fn unmap_buffer(&self, handle: BufferHandle) {
        self.check_thread();
        if let Some(record) = self.buffers.lock().unwrap().get_mut(&handle.raw()) {
            record.mapped = false;
        }
    }

    fn flush_buffer(&self, _handle: BufferHandle, _offset: usize, _len: usize) {
        self.check_thread();
    }

    fn bind_uniform_buffer(
        &self,
        _binding: u32,
        handle: BufferHandle,
        _offset: usize,
        _size: usize,
    ) {
        self.check_thread();
        debug_assert!(self.buffers.lock().unwrap().contains_key(&handle.raw()));
    }

    fn create_texture(
        &self,
        handle: TextureHandle,
        width: u32,
        height: u32,
        depth: u32,
        format: TextureFormat,
        _flags: TextureFlags,
        data: Option<&[u8]>,
        debug_name: &str,
    ) -> Result<(), DeviceError> {
        self.check_thread();
        if !handle.is_valid() {
            return Err(DeviceError::InvalidHandle);
        }
        let size =
            (width as usize) * (height as usize) * (depth as usize) * format.bytes_per_texel() as usize;
        let mut bytes = vec![0u8; size].into_boxed_slice();
        if let Some(data) = data {
            let n = data.len().min(size);
            bytes[..n].copy_from_slice(&data[..n]);
        }
        log::trace!("Created texture '{debug_name}' ({width}x{height}x{depth}).");
        self.textures.lock().unwrap().insert(
            handle.raw(),
            TextureRecord {
                width,
                height,
                depth,
                format,
                data: bytes,
            },
        );
        Ok(())
    }

    fn destroy_texture(&self, handle: TextureHandle) {
        self.check_thread();
        if self.textures.lock().unwrap().remove(&handle.raw()).is_none() {
            log::warn!("Destroying unknown texture {handle:?}.");
        }
    }

    fn update_texture(
        &self,
        handle: TextureHandle,
        _level: u32,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        format: TextureFormat,
        data: &[u8],
    ) -> Result<(), DeviceError> {
        self.check_thread();
        let mut textures = self.textures.lock().unwrap();
        let record = textures
            .get_mut(&handle.raw())
            .ok_or(DeviceError::InvalidHandle)?;
        if x + width > record.width || y + height > record.height {
            return Err(DeviceError::OutOfBounds);
        }
        let texel = format.bytes_per_texel() as usize;
        if data.len() < width as usize * height as usize * texel {
            return Err(DeviceError::OutOfBounds);
        }
        for row in 0..height as usize {
            let src = row * width as usize * texel;
            let dst = ((y as usize + row) * record.width as usize + x as usize) * texel;
            record.data[dst..dst + width as usize * texel]
                .copy_from_slice(&data[src..src + width as usize * texel]);
        }
        Ok(())
    }

    fn load_texture(
        &self,
        handle: TextureHandle,
        data: &[u8],
        _flags: TextureFlags,
        debug_name: &str,
    ) -> Result<(), DeviceError> {
        self.check_thread();
        let info = parse_dds_header(data)?;
        log::trace!("Loaded texture '{debug_name}' ({}x{}).", info.width, info.height);
        self.textures.lock().unwrap().insert(
            handle.raw(),
            TextureRecord {
                width: info.width,
                height: info.height,
                depth: info.depth,
                format: TextureFormat::Rgba8,
                data: data.to_vec().into_boxed_slice(),
            },
        );
        Ok(())
    }

    fn get_texture_image(
        &self,
        handle: TextureHandle,
        size: usize,
        dst: &mut [u8],
    ) -> Result<(), DeviceError> {
        self.check_thread();
        let textures = self.textures.lock().unwrap();
        let record = textures
            .get(&handle.raw())
            .ok_or(DeviceError::InvalidHandle)?;
        let n = size.min(record.data.len()).min(dst.len());
        dst[..n].copy_from_slice(&record.data[..n]);
        Ok(())
    }

    fn create_program(
        &self,
        handle: ProgramHandle,
        sources: &[ProgramSource<'_>],
        defines: &[&str],
        debug_name: &str,
    ) -> Result<(), DeviceError> {
        self.check_thread();
        if sources.is_empty() {
            return Err(DeviceError::ProgramFailed {
                name: debug_name.to_string(),
                details: "no shader stages".to_string(),
            });
        }
        self.programs.lock().unwrap().insert(
            handle.raw(),
            ProgramRecord {
                stages: sources.len(),
                defines: defines.len(),
            },
        );
        Ok(())
    }

    fn destroy_program(&self, handle: ProgramHandle) {
        self.check_thread();
        self.programs.lock().unwrap().remove(&handle.raw());
    }

    fn create_framebuffer(&self, handle: FramebufferHandle) -> Result<(), DeviceError> {
        self.check_thread();
        self.framebuffers.lock().unwrap().insert(handle.raw(), ());
        Ok(())
    }

    fn destroy_framebuffer(&self, handle: FramebufferHandle) {
        self.check_thread();
        self.framebuffers.lock().unwrap().remove(&handle.raw());
    }

    fn create_query(&self) -> QueryHandle {
        self.check_thread();
        let handle = QueryHandle::new(self.next_query.fetch_add(1, Ordering::Relaxed));
        self.queries.lock().unwrap().insert(handle.raw(), None);
        handle
    }

    fn destroy_query(&self, query: QueryHandle) {
        self.check_thread();
        self.queries.lock().unwrap().remove(&query.raw());
    }

    fn query_timestamp(&self, query: QueryHandle) {
        self.check_thread();
        let now = self.nanos();
        if let Some(slot) = self.queries.lock().unwrap().get_mut(&query.raw()) {
            *slot = Some(now);
        }
    }

    fn is_query_ready(&self, query: QueryHandle) -> bool {
        self.check_thread();
        self.queries
            .lock()
            .unwrap()
            .get(&query.raw())
            .map_or(false, Option::is_some)
    }

    fn query_result(&self, query: QueryHandle) -> u64 {
        self.check_thread();
        self.queries
            .lock()
            .unwrap()
            .get(&query.raw())
            .and_then(|slot| *slot)
            .unwrap_or(0)
    }

    fn push_debug_group(&self, name: &str) {
        self.check_thread();
        self.debug_groups.lock().unwrap().push(name.to_string());
    }

    fn pop_debug_group(&self) {
        self.check_thread();
        if self.debug_groups.lock().unwrap().pop().is_none() {
            log::warn!("Unbalanced pop_debug_group.");
        }
    }

    fn start_capture(&self) {
        self.check_thread();
        self.capturing.store(true, Ordering::SeqCst);
    }

    fn stop_capture(&self) {
        self.check_thread();
        self.capturing.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_device() -> HeadlessDevice {
        let device = HeadlessDevice::new();
        device.init(None, true).expect("init succeeds");
        device
    }

    #[test]
    fn handle_allocators_hand_out_distinct_ids() {
        let device = HeadlessDevice::new();
        let a = device.alloc_buffer_handle();
        let b = device.alloc_buffer_handle();
        assert_ne!(a, b);
        assert!(a.is_valid() && b.is_valid());
    }

    #[test]
    fn buffers_round_trip_data() {
        let device = init_device();
        let handle = device.alloc_buffer_handle();
        device
            .create_buffer(handle, BufferFlags::DYNAMIC_STORAGE, 8, Some(&[1, 2, 3, 4]))
            .unwrap();
        device.update_buffer(handle, 4, &[9, 9]).unwrap();
        assert_eq!(
            device.buffer_contents(handle).unwrap(),
            vec![1, 2, 3, 4, 9, 9, 0, 0]
        );
    }

    #[test]
    fn mapping_exposes_live_storage() {
        let device = init_device();
        let handle = device.alloc_buffer_handle();
        let flags = BufferFlags::PERSISTENT | BufferFlags::MAP_WRITE;
        device.create_buffer(handle, flags, 16, None).unwrap();
        let ptr = device.map_buffer(handle, 0, 16, flags).unwrap();
        unsafe { ptr.write(42) };
        device.unmap_buffer(handle);
        assert_eq!(device.buffer_contents(handle).unwrap()[0], 42);
    }

    #[test]
    fn update_out_of_bounds_is_rejected() {
        let device = init_device();
        let handle = device.alloc_buffer_handle();
        device
            .create_buffer(handle, BufferFlags::DYNAMIC_STORAGE, 4, None)
            .unwrap();
        assert!(matches!(
            device.update_buffer(handle, 2, &[0, 0, 0]),
            Err(DeviceError::OutOfBounds)
        ));
    }

    #[test]
    fn timestamps_are_monotonic() {
        let device = init_device();
        let a = device.create_query();
        let b = device.create_query();
        device.query_timestamp(a);
        device.query_timestamp(b);
        assert!(device.is_query_ready(a));
        assert!(device.query_result(b) >= device.query_result(a));
    }

    #[test]
    fn swap_counts_frames() {
        let device = init_device();
        device.swap_buffers();
        device.swap_buffers();
        assert_eq!(device.frames_presented(), 2);
    }
}
