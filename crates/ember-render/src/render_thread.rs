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

//! The dedicated render thread.
//!
//! Exactly one exists per [`Renderer`](crate::Renderer) instance. It owns
//! the driver context: it initialises the backend, creates the default
//! framebuffer, the global-state uniform buffer (bound at binding 0) and
//! the persistently-mapped transient buffer, then drains the command queue
//! until the poison-pill shutdown job asks it to stop, and finally tears
//! everything down again.

use crate::job::RenderContext;
use crate::profiler::{GpuProfiler, ProfilerHistory};
use crate::queue::CommandQueue;
use crate::transient::{TransientBuffer, TRANSIENT_BUFFER_SIZE};
use ember_core::{
    BufferFlags, BufferHandle, DeviceError, FramebufferHandle, GlobalState, GpuDevice,
    RendererError, WindowTarget,
};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Uniform binding slot of the global-state buffer.
pub(crate) const GLOBAL_STATE_BINDING: u32 = 0;

/// Handles created during render-thread startup, reported back to the
/// facade through the startup handshake.
pub(crate) struct StartupInfo {
    pub framebuffer: FramebufferHandle,
    pub global_uniforms: BufferHandle,
    pub transient: Arc<TransientBuffer>,
}

struct RenderThreadState {
    framebuffer: FramebufferHandle,
    global_uniforms: BufferHandle,
    transient: Arc<TransientBuffer>,
}

/// Spawns the render thread and blocks until its startup completes.
pub(crate) fn spawn(
    device: Arc<dyn GpuDevice>,
    queue: Arc<CommandQueue>,
    history: Arc<ProfilerHistory>,
    window: Option<WindowTarget>,
    vsync: bool,
) -> Result<(JoinHandle<()>, StartupInfo), RendererError> {
    let (ready_tx, ready_rx) = flume::bounded::<Result<StartupInfo, DeviceError>>(1);

    let handle = std::thread::Builder::new()
        .name("ember-render".to_string())
        .spawn(move || {
            let state = match startup(device.as_ref(), window.as_ref(), vsync) {
                Ok(state) => state,
                Err(err) => {
                    log::error!("Render thread startup failed: {err}");
                    let _ = ready_tx.send(Err(err));
                    return;
                }
            };
            let _ = ready_tx.send(Ok(StartupInfo {
                framebuffer: state.framebuffer,
                global_uniforms: state.global_uniforms,
                transient: state.transient.clone(),
            }));
            drop(ready_tx);

            drain(device.as_ref(), &queue, history);
            teardown(device.as_ref(), &state);
        })
        .map_err(|err| RendererError::ThreadSpawnFailed(err.to_string()))?;

    match ready_rx.recv() {
        Ok(Ok(info)) => Ok((handle, info)),
        Ok(Err(err)) => {
            let _ = handle.join();
            Err(RendererError::StartupFailed(err))
        }
        Err(_) => {
            let _ = handle.join();
            Err(RendererError::ThreadSpawnFailed(
                "render thread exited before reporting startup".to_string(),
            ))
        }
    }
}

fn startup(
    device: &dyn GpuDevice,
    window: Option<&WindowTarget>,
    vsync: bool,
) -> Result<RenderThreadState, DeviceError> {
    device.init(window, vsync)?;

    let framebuffer = device.alloc_framebuffer_handle();
    device.create_framebuffer(framebuffer)?;

    let global_uniforms = device.alloc_buffer_handle();
    let initial_state = GlobalState::default();
    device.create_buffer(
        global_uniforms,
        BufferFlags::DYNAMIC_STORAGE,
        std::mem::size_of::<GlobalState>(),
        Some(bytemuck::bytes_of(&initial_state)),
    )?;
    device.bind_uniform_buffer(
        GLOBAL_STATE_BINDING,
        global_uniforms,
        0,
        std::mem::size_of::<GlobalState>(),
    );

    let transient_flags =
        BufferFlags::PERSISTENT | BufferFlags::MAP_WRITE | BufferFlags::MAP_FLUSH_EXPLICIT;
    let transient_handle = device.alloc_buffer_handle();
    device.create_buffer(
        transient_handle,
        transient_flags,
        TRANSIENT_BUFFER_SIZE as usize,
        None,
    )?;
    let transient_ptr = device.map_buffer(
        transient_handle,
        0,
        TRANSIENT_BUFFER_SIZE as usize,
        transient_flags,
    )?;

    log::info!("Render thread up; transient budget {} MiB.", TRANSIENT_BUFFER_SIZE / (1024 * 1024));
    Ok(RenderThreadState {
        framebuffer,
        global_uniforms,
        transient: Arc::new(TransientBuffer::new(
            transient_handle,
            transient_ptr,
            TRANSIENT_BUFFER_SIZE,
        )),
    })
}

fn drain(device: &dyn GpuDevice, queue: &CommandQueue, history: Arc<ProfilerHistory>) {
    let mut profiler = GpuProfiler::new(history);
    let mut stop = false;
    while !stop {
        let mut job = queue.pop();
        let mut ctx = RenderContext::new(device, &mut profiler, &mut stop);
        job.execute(&mut ctx);
        drop(job);
    }
    profiler.cleanup(device);
}

fn teardown(device: &dyn GpuDevice, state: &RenderThreadState) {
    device.unmap_buffer(state.transient.buffer());
    device.destroy_buffer(state.transient.buffer());
    device.destroy_buffer(state.global_uniforms);
    device.destroy_framebuffer(state.framebuffer);
    device.shutdown();
    log::info!("Render thread shut down.");
}
