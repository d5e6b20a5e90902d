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

//! The per-frame transient upload buffer.

use ember_core::BufferHandle;
use std::sync::atomic::{AtomicU32, Ordering};

/// Size of the transient buffer. A frame's transient allocations must fit
/// in this budget; overflow yields empty slices.
pub const TRANSIENT_BUFFER_SIZE: u32 = 64 * 1024 * 1024;

/// A slice of the transient buffer, valid until the next swap.
///
/// The caller writes the frame's data through [`bytes_mut`] and references
/// `buffer`/`offset` in the draw that consumes it. An exhausted budget
/// yields an [`empty`](TransientSlice::is_empty) slice the caller must
/// check for.
///
/// [`bytes_mut`]: TransientSlice::bytes_mut
#[derive(Debug)]
pub struct TransientSlice {
    /// The transient buffer this slice lives in.
    pub buffer: BufferHandle,
    /// Byte offset of the slice within the buffer.
    pub offset: u32,
    /// Slice length in bytes; zero when the frame's budget was exhausted.
    pub size: u32,
    ptr: *mut u8,
}

// Slices of the bump allocator are pairwise disjoint, so handing one to
// another thread cannot alias a slice held elsewhere.
unsafe impl Send for TransientSlice {}

impl TransientSlice {
    /// Returns `true` if the allocation failed and no memory backs this
    /// slice.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// The mapped host memory of the slice.
    pub fn bytes_mut(&mut self) -> &mut [u8] {
        if self.ptr.is_null() {
            return &mut [];
        }
        // The region [ptr, ptr + size) is exclusively ours until the next
        // swap, and `&mut self` prevents overlapping borrows of it.
        unsafe { std::slice::from_raw_parts_mut(self.ptr, self.size as usize) }
    }
}

/// The persistently-mapped upload buffer producers bump-allocate from.
///
/// The offset is advanced with an atomic add on the producer side and reset
/// to zero by the swap job on the render thread, before the frame semaphore
/// is signalled; a producer blocked in `frame()` can never observe a
/// pre-reset offset. Producers must finish a frame's transient allocations
/// before calling `frame()`.
#[derive(Debug)]
pub struct TransientBuffer {
    buffer: BufferHandle,
    base: *mut u8,
    size: u32,
    offset: AtomicU32,
}

// The raw base pointer is only dereferenced through disjoint slices handed
// out by `alloc`; the offset that carves them out is atomic.
unsafe impl Send for TransientBuffer {}
unsafe impl Sync for TransientBuffer {}

impl TransientBuffer {
    pub(crate) fn new(buffer: BufferHandle, base: *mut u8, size: u32) -> Self {
        Self {
            buffer,
            base,
            size,
            offset: AtomicU32::new(0),
        }
    }

    /// Bump-allocates `size` bytes for the current frame.
    ///
    /// Returns an empty slice when the frame's budget is exhausted; the
    /// caller must degrade gracefully or skip the draw.
    pub fn alloc(&self, size: u32) -> TransientSlice {
        let offset = self.offset.fetch_add(size, Ordering::Relaxed);
        if offset as u64 + size as u64 > self.size as u64 {
            // Exhaustion is an in-band condition, not an error: the caller
            // degrades or skips. Roll the reservation back so smaller
            // requests can still succeed.
            self.offset.fetch_sub(size, Ordering::Relaxed);
            return TransientSlice {
                buffer: self.buffer,
                offset: 0,
                size: 0,
                ptr: std::ptr::null_mut(),
            };
        }
        TransientSlice {
            buffer: self.buffer,
            offset,
            size,
            // In bounds: offset + size <= self.size was just checked.
            ptr: unsafe { self.base.add(offset as usize) },
        }
    }

    /// The device handle of the backing buffer.
    pub fn buffer(&self) -> BufferHandle {
        self.buffer
    }

    /// Starts the next frame at offset zero. Render thread only, while
    /// producers are held off by the frame semaphore.
    pub(crate) fn reset(&self) {
        self.offset.store(0, Ordering::Release);
    }
}
