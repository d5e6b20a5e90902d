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

//! Opaque handles for GPU resources.
//!
//! A handle is reserved synchronously through the device's thread-safe
//! allocator and returned to the caller immediately; the resource behind it
//! only becomes live once its creation job executes on the render thread.
//! FIFO job ordering guarantees that any job submitted after the creation
//! call observes a live resource.

macro_rules! gpu_handle {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(u32);

        impl $name {
            /// The sentinel value of a handle that refers to no resource.
            pub const INVALID: Self = Self(u32::MAX);

            /// Wraps a raw id produced by a device's handle allocator.
            pub const fn new(raw: u32) -> Self {
                Self(raw)
            }

            /// Returns the raw id.
            pub const fn raw(self) -> u32 {
                self.0
            }

            /// Returns `true` unless this is the [`INVALID`](Self::INVALID)
            /// sentinel.
            pub const fn is_valid(self) -> bool {
                self.0 != u32::MAX
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl core::fmt::Debug for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                if self.is_valid() {
                    write!(f, "{}({})", stringify!($name), self.0)
                } else {
                    write!(f, "{}(INVALID)", stringify!($name))
                }
            }
        }
    };
}

gpu_handle! {
    /// An opaque handle to a GPU buffer.
    BufferHandle
}

gpu_handle! {
    /// An opaque handle to a GPU texture.
    TextureHandle
}

gpu_handle! {
    /// An opaque handle to a compiled shader program.
    ProgramHandle
}

gpu_handle! {
    /// An opaque handle to a framebuffer.
    FramebufferHandle
}

gpu_handle! {
    /// An opaque handle to a timestamp query.
    QueryHandle
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_handle_is_not_valid() {
        assert!(!BufferHandle::INVALID.is_valid());
        assert!(!TextureHandle::default().is_valid());
    }

    #[test]
    fn allocated_handle_is_valid() {
        let h = BufferHandle::new(0);
        assert!(h.is_valid());
        assert_eq!(h.raw(), 0);
    }

    #[test]
    fn debug_marks_invalid() {
        assert_eq!(format!("{:?}", QueryHandle::INVALID), "QueryHandle(INVALID)");
        assert_eq!(format!("{:?}", QueryHandle::new(7)), "QueryHandle(7)");
    }
}
