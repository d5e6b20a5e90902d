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

//! The pipeline-global uniform block.

/// A column-major 4x4 identity matrix.
pub const IDENTITY_MATRIX: [[f32; 4]; 4] = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

/// Per-frame global state mirrored into the uniform buffer at binding 0.
///
/// The facade keeps the authoritative copy; `set_global_state` stores the
/// new value and pushes a job that uploads these exact bytes on the render
/// thread, so shaders always observe a state that was set on the producer
/// timeline.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlobalState {
    /// Camera view matrix.
    pub camera_view: [[f32; 4]; 4],
    /// Camera projection matrix.
    pub camera_projection: [[f32; 4]; 4],
    /// Combined view-projection matrix.
    pub camera_view_projection: [[f32; 4]; 4],
    /// Global light direction (xyz), w unused.
    pub light_direction: [f32; 4],
    /// Global light color (rgb) and direct intensity (a).
    pub light_color: [f32; 4],
    /// Framebuffer size in pixels.
    pub framebuffer_size: [f32; 2],
    /// Seconds since startup.
    pub time: f32,
    /// Indirect (ambient) light intensity.
    pub light_indirect_intensity: f32,
}

impl Default for GlobalState {
    fn default() -> Self {
        Self {
            camera_view: IDENTITY_MATRIX,
            camera_projection: IDENTITY_MATRIX,
            camera_view_projection: IDENTITY_MATRIX,
            light_direction: [0.0, -1.0, 0.0, 0.0],
            light_color: [1.0, 1.0, 1.0, 1.0],
            framebuffer_size: [0.0, 0.0],
            time: 0.0,
            light_indirect_intensity: 0.3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_uniform_block_friendly() {
        // Three mat4s plus two vec4s plus one trailing vec4's worth of scalars.
        assert_eq!(std::mem::size_of::<GlobalState>(), 3 * 64 + 2 * 16 + 16);
        assert_eq!(std::mem::size_of::<GlobalState>() % 16, 0);
    }

    #[test]
    fn bytes_round_trip_through_pod() {
        let state = GlobalState {
            time: 1.5,
            ..GlobalState::default()
        };
        let bytes = bytemuck::bytes_of(&state);
        let back: GlobalState = *bytemuck::from_bytes(bytes);
        assert_eq!(back, state);
    }
}
