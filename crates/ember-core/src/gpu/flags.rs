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

//! Usage and storage flags for GPU resources.

/// Flags describing how a buffer is stored and accessed.
///
/// The driver uses these to choose a memory type and to validate mapping.
/// The transient upload buffer is created with
/// `PERSISTENT | MAP_WRITE | MAP_FLUSH_EXPLICIT`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BufferFlags {
    bits: u32,
}

impl BufferFlags {
    /// No flags.
    pub const NONE: Self = Self { bits: 0 };
    /// The mapping stays valid while the buffer is in use by the GPU.
    pub const PERSISTENT: Self = Self { bits: 1 << 0 };
    /// CPU writes are visible to the GPU without an explicit flush.
    pub const COHERENT: Self = Self { bits: 1 << 1 };
    /// The buffer can be mapped for reading.
    pub const MAP_READ: Self = Self { bits: 1 << 2 };
    /// The buffer can be mapped for writing.
    pub const MAP_WRITE: Self = Self { bits: 1 << 3 };
    /// Mapped writes must be made visible with an explicit flush call.
    pub const MAP_FLUSH_EXPLICIT: Self = Self { bits: 1 << 4 };
    /// The buffer contents can be updated after creation.
    pub const DYNAMIC_STORAGE: Self = Self { bits: 1 << 5 };

    /// Returns the raw bits.
    pub const fn bits(self) -> u32 {
        self.bits
    }

    /// Creates a flag set from raw bits.
    pub const fn from_bits(bits: u32) -> Self {
        Self { bits }
    }

    /// Returns `true` if all flags in `other` are set in `self`.
    pub const fn contains(self, other: Self) -> bool {
        (self.bits & other.bits) == other.bits
    }

    /// Returns the union of the two flag sets.
    pub const fn union(self, other: Self) -> Self {
        Self {
            bits: self.bits | other.bits,
        }
    }

    /// Returns `true` if no flag is set.
    pub const fn is_empty(self) -> bool {
        self.bits == 0
    }
}

impl core::ops::BitOr for BufferFlags {
    type Output = Self;
    fn bitor(self, other: Self) -> Self {
        self.union(other)
    }
}

impl core::ops::BitOrAssign for BufferFlags {
    fn bitor_assign(&mut self, other: Self) {
        self.bits |= other.bits;
    }
}

impl core::fmt::Debug for BufferFlags {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "BufferFlags({:#x})", self.bits)
    }
}

/// Flags applied at texture creation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextureFlags {
    bits: u32,
}

impl TextureFlags {
    /// No flags.
    pub const NONE: Self = Self { bits: 0 };
    /// Sample the texture in sRGB space.
    pub const SRGB: Self = Self { bits: 1 << 0 };
    /// Clamp texture coordinates instead of wrapping.
    pub const CLAMP: Self = Self { bits: 1 << 1 };
    /// Do not allocate or generate mip levels.
    pub const NO_MIPS: Self = Self { bits: 1 << 2 };

    /// Returns the raw bits.
    pub const fn bits(self) -> u32 {
        self.bits
    }

    /// Creates a flag set from raw bits.
    pub const fn from_bits(bits: u32) -> Self {
        Self { bits }
    }

    /// Returns `true` if all flags in `other` are set in `self`.
    pub const fn contains(self, other: Self) -> bool {
        (self.bits & other.bits) == other.bits
    }

    /// Returns the union of the two flag sets.
    pub const fn union(self, other: Self) -> Self {
        Self {
            bits: self.bits | other.bits,
        }
    }
}

impl core::ops::BitOr for TextureFlags {
    type Output = Self;
    fn bitor(self, other: Self) -> Self {
        self.union(other)
    }
}

impl core::ops::BitOrAssign for TextureFlags {
    fn bitor_assign(&mut self, other: Self) {
        self.bits |= other.bits;
    }
}

impl core::fmt::Debug for TextureFlags {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "TextureFlags({:#x})", self.bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_and_contains() {
        let transient =
            BufferFlags::PERSISTENT | BufferFlags::MAP_WRITE | BufferFlags::MAP_FLUSH_EXPLICIT;
        assert!(transient.contains(BufferFlags::PERSISTENT));
        assert!(transient.contains(BufferFlags::MAP_WRITE));
        assert!(!transient.contains(BufferFlags::MAP_READ));
    }

    #[test]
    fn empty_is_contained_everywhere() {
        assert!(TextureFlags::SRGB.contains(TextureFlags::NONE));
        assert!(BufferFlags::NONE.is_empty());
    }
}
