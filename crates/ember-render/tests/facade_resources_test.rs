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

//! Resource operations through the renderer facade.

use ember_core::{GlobalState, MemRef, ShaderKind, TextureFlags, TextureFormat};
use ember_infra::HeadlessDevice;
use ember_jobs::JobScheduler;
use ember_render::{Renderer, RendererSettings, MAX_SHADER_DEFINES};
use std::sync::{mpsc, Arc};

fn pipeline() -> (Arc<HeadlessDevice>, Renderer) {
    let scheduler = Arc::new(JobScheduler::new(2));
    let device = Arc::new(HeadlessDevice::new());
    let renderer = Renderer::new(device.clone(), scheduler, RendererSettings::new())
        .expect("headless startup succeeds");
    (device, renderer)
}

/// A minimal DDS blob: magic, header, and a little payload.
fn dds_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut blob = vec![0u8; 128 + 64];
    blob[0..4].copy_from_slice(&0x2053_4444u32.to_le_bytes());
    blob[4..8].copy_from_slice(&124u32.to_le_bytes());
    blob[12..16].copy_from_slice(&height.to_le_bytes());
    blob[16..20].copy_from_slice(&width.to_le_bytes());
    blob
}

#[test]
fn created_buffers_carry_their_initial_data() {
    let (device, renderer) = pipeline();
    let payload = vec![7u8; 32];
    let handle = renderer.create_buffer(MemRef::copy_of(&payload));
    assert!(handle.is_valid());
    drop(renderer);

    assert_eq!(device.buffer_contents(handle).unwrap(), payload);
}

#[test]
fn global_state_reaches_the_uniform_buffer() {
    let (device, renderer) = pipeline();
    let mut state = GlobalState::default();
    state.time = 4.25;
    state.framebuffer_size = [800.0, 600.0];
    renderer.set_global_state(state);

    assert_eq!(renderer.global_state().time, 4.25);

    // Ride a marker job through the FIFO so the upload has executed, then
    // compare the uniform buffer's bytes with what was set.
    let (tx, rx) = mpsc::channel();
    renderer.run_in_render_thread(move |_ctx| {
        let _ = tx.send(());
    });
    rx.recv().expect("upload job preceded the marker job");

    let uploaded = device
        .buffer_contents(renderer.global_uniforms())
        .expect("the uniform buffer exists until teardown");
    assert_eq!(uploaded, bytemuck::bytes_of(&state));
    drop(renderer);
}

#[test]
fn load_texture_decodes_the_header_synchronously() {
    let (device, renderer) = pipeline();
    let (handle, info) = renderer
        .load_texture(
            MemRef::copy_of(&dds_bytes(256, 64)),
            TextureFlags::SRGB,
            "terrain_albedo",
        )
        .expect("a well-formed header decodes");
    assert!(handle.is_valid());
    assert_eq!(info.width, 256);
    assert_eq!(info.height, 64);
    assert_eq!(info.mips, 1);
    drop(renderer);

    assert_eq!(device.live_textures(), 1);
    assert_eq!(
        device.texture_info(handle),
        Some((256, 64, 1, TextureFormat::Rgba8)),
        "the creation job saw the same dimensions the header promised"
    );
}

#[test]
fn load_texture_rejects_garbage_without_enqueueing() {
    let (device, renderer) = pipeline();
    let result = renderer.load_texture(
        MemRef::copy_of(&[0u8; 200]),
        TextureFlags::NONE,
        "corrupt",
    );
    assert!(result.is_err());
    drop(renderer);

    assert_eq!(device.live_textures(), 0);
}

#[test]
fn destroyed_resources_are_released_in_order() {
    let (device, renderer) = pipeline();
    let texture = renderer.create_texture(
        8,
        8,
        1,
        TextureFormat::Rgba8,
        TextureFlags::NONE,
        MemRef::allocate(8 * 8 * 4),
        "scratch",
    );
    let buffer = renderer.create_buffer(MemRef::allocate(64));
    renderer.destroy_texture(texture);
    renderer.destroy_buffer(buffer);
    drop(renderer);

    assert_eq!(device.live_textures(), 0);
    // The destroy jobs released the user buffer; render-thread teardown
    // released the transient and global-state buffers.
    assert_eq!(device.live_buffers(), 0);
}

#[test]
fn texture_readback_delivers_the_uploaded_texels() {
    let (_device, renderer) = pipeline();
    let texels: Vec<u8> = (0..16u8).collect();
    let texture = renderer.create_texture(
        2,
        2,
        1,
        TextureFormat::Rgba8,
        TextureFlags::NONE,
        MemRef::copy_of(&texels),
        "readback",
    );

    let (tx, rx) = mpsc::channel();
    renderer.get_texture_image(texture, 16, move |image| {
        let _ = tx.send(image);
    });
    let image = rx.recv().expect("readback job delivers");
    assert_eq!(image, texels);
    drop(renderer);
}

#[test]
fn programs_build_with_resolved_defines() {
    let (device, renderer) = pipeline();
    let skinned = renderer.shader_define_idx("SKINNED").expect("table has room");
    let instanced = renderer
        .shader_define_idx("INSTANCED")
        .expect("table has room");

    let program = renderer.create_program(
        vec![
            (ShaderKind::Vertex, "void main() {}".to_string()),
            (ShaderKind::Fragment, "void main() {}".to_string()),
        ],
        &[skinned, instanced],
        "skinned_mesh",
    );
    assert!(program.is_valid());
    drop(renderer);

    assert_eq!(device.live_programs(), 1);
    assert_eq!(
        device.program_info(program),
        Some((2, 2)),
        "both stages and both resolved defines reached the driver"
    );
}

#[test]
fn intern_tables_start_with_the_default_layer() {
    let (_device, renderer) = pipeline();
    assert_eq!(renderer.layer_count(), 1);
    assert_eq!(renderer.layer_idx("default"), Some(0));
    assert_eq!(renderer.layer_name(0).as_deref(), Some("default"));

    let transparent = renderer.layer_idx("transparent").unwrap();
    assert_eq!(transparent, 1);
    assert_eq!(renderer.layer_count(), 2);

    assert_eq!(renderer.shader_define_count(), 0);
    for i in 0..MAX_SHADER_DEFINES {
        assert!(renderer.shader_define_idx(&format!("DEFINE_{i}")).is_some());
    }
    assert_eq!(renderer.shader_define_count(), MAX_SHADER_DEFINES);
}
