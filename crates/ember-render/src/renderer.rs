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

//! The renderer facade.
//!
//! The public entry point of the pipeline. Resource calls reserve a handle
//! synchronously and enqueue a job whose `execute` performs the actual
//! driver work on the render thread; `frame()` pushes the swap job and
//! paces the producer against the GPU through the frame semaphore.

use crate::config::RendererSettings;
use crate::interner::InternTable;
use crate::job::{FnOnceJob, RenderContext, RenderJob};
use crate::profiler::{GpuTiming, ProfilerHistory};
use crate::queue::CommandQueue;
use crate::render_thread;
use crate::sync::Semaphore;
use crate::transient::{TransientBuffer, TransientSlice};
use ember_core::{
    gpu::parse_dds_header, BufferFlags, BufferHandle, FramebufferHandle, GlobalState, GpuDevice,
    MemRef, ProgramHandle, ProgramSource, RendererError, ShaderKind, TextureFlags, TextureFormat,
    TextureHandle, TextureInfo,
};
use ember_jobs::{JobScheduler, Signal};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

/// Maximum number of render layers.
pub const MAX_LAYERS: usize = 64;
/// Maximum number of shader defines.
pub const MAX_SHADER_DEFINES: usize = 32;

/// The render-command pipeline facade.
///
/// Most entry points are callable from any producer thread: they reserve
/// handles through the driver's free-threaded allocators and enqueue
/// scheduler tasks instead of touching driver state. Driver work happens
/// exclusively on the render thread this facade owns.
///
/// Dropping the renderer executes every job submitted before the drop,
/// then stops the render thread and tears the driver down. Submitting jobs
/// concurrently with the drop is a contract violation.
pub struct Renderer {
    device: Arc<dyn GpuDevice>,
    scheduler: Arc<JobScheduler>,
    queue: Arc<CommandQueue>,
    transient: Arc<TransientBuffer>,
    history: Arc<ProfilerHistory>,
    frame_semaphore: Arc<Semaphore>,
    /// Completion signal of the most recent push task; precondition of the
    /// next submission's setup and the drain target of `frame()`.
    last_push: Mutex<Signal>,
    global_state: Mutex<GlobalState>,
    layers: InternTable,
    shader_defines: InternTable,
    framebuffer: FramebufferHandle,
    global_uniforms: BufferHandle,
    frame_index: AtomicU64,
    render_thread: Option<JoinHandle<()>>,
}

impl Renderer {
    /// Starts the pipeline: spawns the render thread, initialises the
    /// driver against `settings.window`, and blocks until the transient
    /// buffer and global uniform buffer exist.
    ///
    /// # Errors
    /// Returns a [`RendererError`] if the thread cannot be spawned or the
    /// driver fails to initialise.
    pub fn new(
        device: Arc<dyn GpuDevice>,
        scheduler: Arc<JobScheduler>,
        settings: RendererSettings,
    ) -> Result<Self, RendererError> {
        let queue = Arc::new(CommandQueue::new());
        let history = Arc::new(ProfilerHistory::new());

        let (handle, startup) = render_thread::spawn(
            device.clone(),
            queue.clone(),
            history.clone(),
            settings.window,
            settings.vsync,
        )?;

        let layers = InternTable::new("layers", MAX_LAYERS);
        layers.index_of("default");

        Ok(Self {
            device,
            scheduler,
            queue,
            transient: startup.transient,
            history,
            frame_semaphore: Arc::new(Semaphore::new(2, 2)),
            last_push: Mutex::new(Signal::fired()),
            global_state: Mutex::new(GlobalState::default()),
            layers,
            shader_defines: InternTable::new("shader defines", MAX_SHADER_DEFINES),
            framebuffer: startup.framebuffer,
            global_uniforms: startup.global_uniforms,
            frame_index: AtomicU64::new(0),
            render_thread: Some(handle),
        })
    }

    // --- Submission ---

    /// Submits a job to the pipeline.
    ///
    /// Two scheduler tasks are spawned: the setup task, gated on the
    /// previous submission's push, and the push task, gated on the setup.
    /// The chain serialises queue appends (and therefore executes) in
    /// submission order, while letting setups overlap with render-thread
    /// work.
    pub fn push(&self, job: Box<dyn RenderJob>) {
        let slot = Arc::new(Mutex::new(Some(job)));

        let mut last = self.last_push.lock().unwrap();
        let setup = {
            let slot = slot.clone();
            self.scheduler.spawn(Some(&*last), move || {
                if let Some(job) = slot.lock().unwrap().as_mut() {
                    job.setup();
                }
            })
        };
        let push = {
            let queue = self.queue.clone();
            self.scheduler.spawn(Some(&setup), move || {
                if let Some(job) = slot.lock().unwrap().take() {
                    queue.push(job);
                }
            })
        };
        *last = push;
    }

    /// Enqueues a closure for execution on the render thread.
    pub fn run_in_render_thread(
        &self,
        f: impl FnOnce(&mut RenderContext<'_>) + Send + 'static,
    ) {
        self.push(Box::new(FnOnceJob::new(f)));
    }

    // --- Resource creation ---

    /// Creates a buffer initialised with `memory`.
    ///
    /// The returned handle is usable in further submissions immediately;
    /// FIFO execution guarantees the creation runs first. An invalid handle
    /// means the allocator is exhausted and no job was enqueued.
    pub fn create_buffer(&self, memory: MemRef) -> BufferHandle {
        let handle = self.device.alloc_buffer_handle();
        if !handle.is_valid() {
            return handle;
        }
        self.push(Box::new(CreateBufferJob { handle, memory }));
        handle
    }

    /// Creates a texture from raw texel data.
    #[allow(clippy::too_many_arguments)]
    pub fn create_texture(
        &self,
        width: u32,
        height: u32,
        depth: u32,
        format: TextureFormat,
        flags: TextureFlags,
        memory: MemRef,
        debug_name: &str,
    ) -> TextureHandle {
        let handle = self.device.alloc_texture_handle();
        if !handle.is_valid() {
            return handle;
        }
        self.push(Box::new(CreateTextureJob {
            handle,
            width,
            height,
            depth,
            format,
            flags,
            memory,
            debug_name: debug_name.to_string(),
        }));
        handle
    }

    /// Creates a texture from a DDS container blob.
    ///
    /// The header is decoded synchronously so the [`TextureInfo`] is
    /// available before the creation job runs. An invalid handle in the
    /// result means the allocator is exhausted and no job was enqueued.
    ///
    /// # Errors
    /// Returns a [`DeviceError`](ember_core::DeviceError) when the header
    /// cannot be decoded; nothing is enqueued in that case.
    pub fn load_texture(
        &self,
        memory: MemRef,
        flags: TextureFlags,
        debug_name: &str,
    ) -> Result<(TextureHandle, TextureInfo), ember_core::DeviceError> {
        let info = parse_dds_header(memory.bytes())?;
        let handle = self.device.alloc_texture_handle();
        if !handle.is_valid() {
            return Ok((handle, info));
        }
        self.push(Box::new(LoadTextureJob {
            handle,
            memory,
            flags,
            debug_name: debug_name.to_string(),
        }));
        Ok((handle, info))
    }

    /// Writes a region of texel data into an existing texture.
    #[allow(clippy::too_many_arguments)]
    pub fn update_texture(
        &self,
        handle: TextureHandle,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        format: TextureFormat,
        memory: MemRef,
    ) {
        debug_assert!(handle.is_valid());
        debug_assert!(!memory.is_empty());
        self.push(Box::new(UpdateTextureJob {
            handle,
            x,
            y,
            width,
            height,
            format,
            memory,
        }));
    }

    /// Reads a texture's image back and hands it to `callback` on the
    /// render thread.
    pub fn get_texture_image(
        &self,
        handle: TextureHandle,
        size: usize,
        callback: impl FnOnce(Vec<u8>) + Send + 'static,
    ) {
        self.push(Box::new(GetTextureImageJob {
            handle,
            size,
            callback: Some(Box::new(callback)),
        }));
    }

    /// Compiles and links a program.
    ///
    /// `define_indices` refer to this renderer's shader-define table; the
    /// names are resolved here, on the producer side, so the driver never
    /// reads the table.
    pub fn create_program(
        &self,
        sources: Vec<(ShaderKind, String)>,
        define_indices: &[u8],
        debug_name: &str,
    ) -> ProgramHandle {
        let handle = self.device.alloc_program_handle();
        if !handle.is_valid() {
            return handle;
        }
        let defines: Vec<String> = define_indices
            .iter()
            .filter_map(|&idx| {
                let name = self.shader_defines.name_at(idx);
                if name.is_none() {
                    log::warn!("Unknown shader define index {idx} for program '{debug_name}'.");
                }
                name
            })
            .collect();
        self.push(Box::new(CreateProgramJob {
            handle,
            sources,
            defines,
            debug_name: debug_name.to_string(),
        }));
        handle
    }

    // --- Resource destruction ---

    /// Destroys a buffer once all previously submitted work has executed.
    pub fn destroy_buffer(&self, handle: BufferHandle) {
        self.push(Box::new(DestroyJob {
            resource: DestroyResource::Buffer(handle),
        }));
    }

    /// Destroys a texture.
    pub fn destroy_texture(&self, handle: TextureHandle) {
        self.push(Box::new(DestroyJob {
            resource: DestroyResource::Texture(handle),
        }));
    }

    /// Destroys a program.
    pub fn destroy_program(&self, handle: ProgramHandle) {
        self.push(Box::new(DestroyJob {
            resource: DestroyResource::Program(handle),
        }));
    }

    /// Destroys a framebuffer.
    pub fn destroy_framebuffer(&self, handle: FramebufferHandle) {
        self.push(Box::new(DestroyJob {
            resource: DestroyResource::Framebuffer(handle),
        }));
    }

    // --- Transient memory ---

    /// Bump-allocates `size` bytes of the frame's upload budget.
    ///
    /// Callable from any producer thread. Returns an empty slice when the
    /// budget is exhausted. All of a frame's allocations must happen before
    /// that frame's [`frame()`](Self::frame) call.
    pub fn alloc_transient(&self, size: u32) -> TransientSlice {
        self.transient.alloc(size)
    }

    // --- Global state ---

    /// Replaces the pipeline-global uniform state and schedules its upload.
    pub fn set_global_state(&self, state: GlobalState) {
        *self.global_state.lock().unwrap() = state;
        self.push(Box::new(UploadGlobalStateJob {
            buffer: self.global_uniforms,
            state,
        }));
    }

    /// The most recently set global state.
    pub fn global_state(&self) -> GlobalState {
        *self.global_state.lock().unwrap()
    }

    // --- Profiling ---

    /// Opens a named GPU timing block at this point of the submission
    /// stream.
    pub fn begin_profile_block(&self, name: &'static str) {
        self.run_in_render_thread(move |ctx| ctx.begin_profile_block(name));
    }

    /// Closes the innermost GPU timing block.
    pub fn end_profile_block(&self) {
        self.run_in_render_thread(|ctx| ctx.end_profile_block());
    }

    /// Swaps the oldest unread frame of GPU timings into `out`.
    ///
    /// Non-blocking; returns `false` when no unread frame exists. Each
    /// frame of timings is returned exactly once.
    pub fn get_gpu_timings(&self, out: &mut Vec<GpuTiming>) -> bool {
        self.history.read_into(out)
    }

    /// Starts a frame capture in an attached graphics debugger.
    pub fn start_capture(&self) {
        self.run_in_render_thread(|ctx| ctx.device().start_capture());
    }

    /// Stops a frame capture.
    pub fn stop_capture(&self) {
        self.run_in_render_thread(|ctx| ctx.device().stop_capture());
    }

    // --- Layers and shader defines ---

    /// Returns the index of a render layer, registering it if unseen.
    /// Returns `None` once [`MAX_LAYERS`] names are registered.
    pub fn layer_idx(&self, name: &str) -> Option<u8> {
        self.layers.index_of(name)
    }

    /// The name of layer `idx`.
    pub fn layer_name(&self, idx: u8) -> Option<String> {
        self.layers.name_at(idx)
    }

    /// The number of registered layers.
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Returns the index of a shader define, registering it if unseen.
    /// Returns `None` once [`MAX_SHADER_DEFINES`] names are registered.
    pub fn shader_define_idx(&self, name: &str) -> Option<u8> {
        self.shader_defines.index_of(name)
    }

    /// The name of shader define `idx`.
    pub fn shader_define(&self, idx: u8) -> Option<String> {
        self.shader_defines.name_at(idx)
    }

    /// The number of registered shader defines.
    pub fn shader_define_count(&self) -> usize {
        self.shader_defines.len()
    }

    // --- Frame ---

    /// Ends the producer frame.
    ///
    /// Pushes the swap job, then blocks on the frame semaphore (capping
    /// render-ahead at two frames), and finally waits for this frame's last
    /// push task, so the next frame's setups are ordered after everything
    /// submitted so far. Infallible.
    pub fn frame(&self) {
        self.push(Box::new(SwapJob {
            transient: self.transient.clone(),
            frame_semaphore: self.frame_semaphore.clone(),
        }));
        self.frame_semaphore.wait();
        let last = self.last_push.lock().unwrap().clone();
        last.wait();
        self.frame_index.fetch_add(1, Ordering::Relaxed);
    }

    // --- Introspection ---

    /// The number of completed producer frames.
    pub fn frame_index(&self) -> u64 {
        self.frame_index.load(Ordering::Relaxed)
    }

    /// The default framebuffer created at startup.
    pub fn framebuffer(&self) -> FramebufferHandle {
        self.framebuffer
    }

    /// The global-state uniform buffer, bound at binding 0.
    pub fn global_uniforms(&self) -> BufferHandle {
        self.global_uniforms
    }

    /// The driver. Only the free-threaded handle allocators may be called
    /// off the render thread.
    pub fn device(&self) -> &dyn GpuDevice {
        self.device.as_ref()
    }
}

impl Drop for Renderer {
    /// Executes every job submitted before the drop, then stops the render
    /// thread and tears the driver down.
    fn drop(&mut self) {
        self.push(Box::new(ShutdownJob));
        let last = self.last_push.lock().unwrap().clone();
        last.wait();
        if let Some(handle) = self.render_thread.take() {
            if handle.join().is_err() {
                log::error!("The render thread panicked during shutdown.");
            }
        }
    }
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("frame_index", &self.frame_index())
            .field("layers", &self.layers)
            .field("shader_defines", &self.shader_defines)
            .finish()
    }
}

// --- Resource jobs ---

struct CreateBufferJob {
    handle: BufferHandle,
    memory: MemRef,
}

impl RenderJob for CreateBufferJob {
    fn execute(&mut self, ctx: &mut RenderContext<'_>) {
        if let Err(err) = ctx.device().create_buffer(
            self.handle,
            BufferFlags::DYNAMIC_STORAGE,
            self.memory.len(),
            Some(self.memory.bytes()),
        ) {
            log::error!("Buffer creation failed: {err}");
        }
    }
}

struct CreateTextureJob {
    handle: TextureHandle,
    width: u32,
    height: u32,
    depth: u32,
    format: TextureFormat,
    flags: TextureFlags,
    memory: MemRef,
    debug_name: String,
}

impl RenderJob for CreateTextureJob {
    fn execute(&mut self, ctx: &mut RenderContext<'_>) {
        let data = if self.memory.is_empty() {
            None
        } else {
            Some(self.memory.bytes())
        };
        if let Err(err) = ctx.device().create_texture(
            self.handle,
            self.width,
            self.height,
            self.depth,
            self.format,
            self.flags,
            data,
            &self.debug_name,
        ) {
            log::error!("Texture creation failed for '{}': {err}", self.debug_name);
        }
    }
}

struct LoadTextureJob {
    handle: TextureHandle,
    memory: MemRef,
    flags: TextureFlags,
    debug_name: String,
}

impl RenderJob for LoadTextureJob {
    fn execute(&mut self, ctx: &mut RenderContext<'_>) {
        let device = ctx.device();
        device.push_debug_group("load texture");
        if let Err(err) =
            device.load_texture(self.handle, self.memory.bytes(), self.flags, &self.debug_name)
        {
            log::error!("Texture load failed for '{}': {err}", self.debug_name);
        }
        device.pop_debug_group();
    }
}

struct UpdateTextureJob {
    handle: TextureHandle,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
    format: TextureFormat,
    memory: MemRef,
}

impl RenderJob for UpdateTextureJob {
    fn execute(&mut self, ctx: &mut RenderContext<'_>) {
        if let Err(err) = ctx.device().update_texture(
            self.handle,
            0,
            self.x,
            self.y,
            self.width,
            self.height,
            self.format,
            self.memory.bytes(),
        ) {
            log::error!("Texture update failed: {err}");
        }
    }
}

type ImageCallback = Box<dyn FnOnce(Vec<u8>) + Send + 'static>;

struct GetTextureImageJob {
    handle: TextureHandle,
    size: usize,
    callback: Option<ImageCallback>,
}

impl RenderJob for GetTextureImageJob {
    fn execute(&mut self, ctx: &mut RenderContext<'_>) {
        let device = ctx.device();
        device.push_debug_group("get image data");
        let mut image = vec![0u8; self.size];
        match device.get_texture_image(self.handle, self.size, &mut image) {
            Ok(()) => {
                if let Some(callback) = self.callback.take() {
                    callback(image);
                }
            }
            Err(err) => log::error!("Texture readback failed: {err}"),
        }
        device.pop_debug_group();
    }
}

struct CreateProgramJob {
    handle: ProgramHandle,
    sources: Vec<(ShaderKind, String)>,
    defines: Vec<String>,
    debug_name: String,
}

impl RenderJob for CreateProgramJob {
    fn execute(&mut self, ctx: &mut RenderContext<'_>) {
        let sources: Vec<ProgramSource<'_>> = self
            .sources
            .iter()
            .map(|(kind, code)| ProgramSource {
                kind: *kind,
                code: code.as_str(),
            })
            .collect();
        let defines: Vec<&str> = self.defines.iter().map(String::as_str).collect();
        if let Err(err) =
            ctx.device()
                .create_program(self.handle, &sources, &defines, &self.debug_name)
        {
            log::error!("Program build failed for '{}': {err}", self.debug_name);
        }
    }
}

#[derive(Clone, Copy)]
enum DestroyResource {
    Buffer(BufferHandle),
    Texture(TextureHandle),
    Program(ProgramHandle),
    Framebuffer(FramebufferHandle),
}

struct DestroyJob {
    resource: DestroyResource,
}

impl RenderJob for DestroyJob {
    fn execute(&mut self, ctx: &mut RenderContext<'_>) {
        let device = ctx.device();
        match self.resource {
            DestroyResource::Buffer(handle) => device.destroy_buffer(handle),
            DestroyResource::Texture(handle) => device.destroy_texture(handle),
            DestroyResource::Program(handle) => device.destroy_program(handle),
            DestroyResource::Framebuffer(handle) => device.destroy_framebuffer(handle),
        }
    }
}

struct UploadGlobalStateJob {
    buffer: BufferHandle,
    state: GlobalState,
}

impl RenderJob for UploadGlobalStateJob {
    fn execute(&mut self, ctx: &mut RenderContext<'_>) {
        if let Err(err) = ctx
            .device()
            .update_buffer(self.buffer, 0, bytemuck::bytes_of(&self.state))
        {
            log::error!("Global state upload failed: {err}");
        }
    }
}

// --- Frame boundary jobs ---

struct SwapJob {
    transient: Arc<TransientBuffer>,
    frame_semaphore: Arc<Semaphore>,
}

impl RenderJob for SwapJob {
    fn execute(&mut self, ctx: &mut RenderContext<'_>) {
        ctx.device().swap_buffers();
        ctx.finish_profiler_frame();
        // The reset must precede the semaphore signal: a producer resumed
        // by the signal may allocate transient memory immediately.
        self.transient.reset();
        self.frame_semaphore.signal();
    }
}

struct ShutdownJob;

impl RenderJob for ShutdownJob {
    fn execute(&mut self, ctx: &mut RenderContext<'_>) {
        ctx.request_stop();
    }
}
