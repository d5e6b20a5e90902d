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

//! Texture formats, metadata, and the synchronous container-header probe.

use super::error::DeviceError;

/// Pixel formats understood by the driver surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    /// Single 8-bit channel.
    R8,
    /// 32-bit float depth.
    D32,
    /// 24-bit depth.
    D24,
    /// 24-bit depth with 8-bit stencil.
    D24S8,
    /// 8-bit RGBA.
    Rgba8,
    /// 16-bit RGBA.
    Rgba16,
    /// 16-bit float RGBA.
    Rgba16F,
    /// 16-bit float single channel.
    R16F,
    /// 16-bit single channel.
    R16,
    /// 32-bit float single channel.
    R32F,
    /// 8-bit RGB in sRGB space.
    Srgb,
    /// 8-bit RGBA in sRGB space.
    Srgba,
}

impl TextureFormat {
    /// Bytes per texel for uncompressed formats.
    pub const fn bytes_per_texel(self) -> u32 {
        match self {
            TextureFormat::R8 => 1,
            TextureFormat::R16 | TextureFormat::R16F => 2,
            TextureFormat::D24 | TextureFormat::Srgb => 3,
            TextureFormat::D32
            | TextureFormat::D24S8
            | TextureFormat::Rgba8
            | TextureFormat::R32F
            | TextureFormat::Srgba => 4,
            TextureFormat::Rgba16 | TextureFormat::Rgba16F => 8,
        }
    }
}

/// Metadata decoded from a texture container's header.
///
/// Available to the caller immediately after `load_texture`, before the
/// creation job has run on the render thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextureInfo {
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
    /// Depth for volume textures, otherwise 1.
    pub depth: u32,
    /// Array layers (6 for a cubemap).
    pub layers: u32,
    /// Mip level count, at least 1.
    pub mips: u32,
    /// Whether the container holds a cubemap.
    pub is_cubemap: bool,
}

const DDS_MAGIC: u32 = 0x2053_4444; // "DDS "
const DDS_HEADER_SIZE: usize = 128;
const DDSD_DEPTH: u32 = 0x80_0000;
const DDSD_MIPMAPCOUNT: u32 = 0x2_0000;
const DDSCAPS2_CUBEMAP: u32 = 0x200;

fn read_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

/// Decodes the header of a DDS container without touching the pixel data.
///
/// # Errors
/// Returns [`DeviceError::BadImageData`] if the blob is too short or does
/// not start with the DDS magic.
pub fn parse_dds_header(data: &[u8]) -> Result<TextureInfo, DeviceError> {
    if data.len() < DDS_HEADER_SIZE {
        return Err(DeviceError::BadImageData(format!(
            "{} bytes is too short for a DDS header",
            data.len()
        )));
    }
    if read_u32(data, 0) != DDS_MAGIC {
        return Err(DeviceError::BadImageData(
            "missing DDS magic".to_string(),
        ));
    }

    let flags = read_u32(data, 8);
    let height = read_u32(data, 12);
    let width = read_u32(data, 16);
    let depth = if flags & DDSD_DEPTH != 0 {
        read_u32(data, 24).max(1)
    } else {
        1
    };
    let mips = if flags & DDSD_MIPMAPCOUNT != 0 {
        read_u32(data, 28).max(1)
    } else {
        1
    };
    let caps2 = read_u32(data, 112);
    let is_cubemap = caps2 & DDSCAPS2_CUBEMAP != 0;

    Ok(TextureInfo {
        width,
        height,
        depth,
        layers: if is_cubemap { 6 } else { 1 },
        mips,
        is_cubemap,
    })
}
