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

use anyhow::Result;
use ember_core::{GlobalState, MemRef, TextureFlags, TextureFormat};
use ember_infra::HeadlessDevice;
use ember_jobs::JobScheduler;
use ember_render::{Renderer, RendererSettings};
use std::sync::Arc;

const FRAMES: u64 = 16;

fn main() -> Result<()> {
    env_logger::init();

    let settings = RendererSettings::from_args(std::env::args());
    log::info!("Starting sandbox with {settings:?}");

    let scheduler = Arc::new(JobScheduler::default());
    let device = Arc::new(HeadlessDevice::new());
    let renderer = Renderer::new(device.clone(), scheduler.clone(), settings)?;

    // A static vertex buffer and a small checkerboard texture.
    let vertices: Vec<u8> = (0..96).collect();
    let vertex_buffer = renderer.create_buffer(MemRef::copy_of(&vertices));
    anyhow::ensure!(vertex_buffer.is_valid(), "buffer allocator exhausted");

    let checker: Vec<u8> = (0..4 * 4 * 4).map(|i| ((i / 4) % 2 * 255) as u8).collect();
    let texture = renderer.create_texture(
        4,
        4,
        1,
        TextureFormat::Rgba8,
        TextureFlags::NONE,
        MemRef::copy_of(&checker),
        "checkerboard",
    );
    anyhow::ensure!(texture.is_valid(), "texture allocator exhausted");

    for frame in 0..FRAMES {
        let mut state = GlobalState::default();
        state.time = frame as f32 / 60.0;
        state.framebuffer_size = [1280.0, 720.0];
        renderer.set_global_state(state);

        renderer.begin_profile_block("frame");

        // Per-frame geometry goes through the transient buffer.
        let mut slice = renderer.alloc_transient(1024);
        if !slice.is_empty() {
            for (i, byte) in slice.bytes_mut().iter_mut().enumerate() {
                *byte = (i % 251) as u8;
            }
        }

        renderer.end_profile_block();
        renderer.frame();

        let mut timings = Vec::new();
        if renderer.get_gpu_timings(&mut timings) {
            if let (Some(begin), Some(end)) = (timings.first(), timings.last()) {
                log::info!(
                    "frame {}: '{}' took {} ns on the GPU timeline",
                    renderer.frame_index(),
                    begin.name,
                    end.timestamp.saturating_sub(begin.timestamp)
                );
            }
        }
    }

    renderer.destroy_texture(texture);
    renderer.destroy_buffer(vertex_buffer);
    drop(renderer);

    log::info!(
        "Done: {} frames presented, clean shutdown: {}",
        device.frames_presented(),
        device.is_shut_down()
    );
    Ok(())
}
