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

//! Error types for the GPU driver surface.

use std::fmt;

/// An error reported by a [`GpuDevice`](super::GpuDevice) operation.
///
/// Driver errors raised while a job executes on the render thread are logged
/// and swallowed there; they never cross a thread boundary as panics.
#[derive(Debug)]
pub enum DeviceError {
    /// The backend failed to initialise (context/surface creation).
    InitializationFailed(String),
    /// The handle used to reference a resource is invalid or was never
    /// created.
    InvalidHandle,
    /// The handle allocator is exhausted.
    OutOfHandles,
    /// An access fell outside a resource's bounds.
    OutOfBounds,
    /// A mapping request was incompatible with the buffer's flags.
    InvalidMapping(String),
    /// Shader compilation or program linking failed.
    ProgramFailed {
        /// The program's debug name.
        name: String,
        /// Compiler/linker output.
        details: String,
    },
    /// The provided image data could not be understood.
    BadImageData(String),
    /// An error specific to the backend implementation.
    Backend(String),
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::InitializationFailed(msg) => {
                write!(f, "Failed to initialise the graphics backend: {msg}")
            }
            DeviceError::InvalidHandle => write!(f, "Invalid resource handle."),
            DeviceError::OutOfHandles => write!(f, "Resource handle allocator exhausted."),
            DeviceError::OutOfBounds => write!(f, "Resource access out of bounds."),
            DeviceError::InvalidMapping(msg) => write!(f, "Invalid buffer mapping: {msg}"),
            DeviceError::ProgramFailed { name, details } => {
                write!(f, "Program '{name}' failed to build: {details}")
            }
            DeviceError::BadImageData(msg) => write!(f, "Unrecognised image data: {msg}"),
            DeviceError::Backend(msg) => write!(f, "Backend error: {msg}"),
        }
    }
}

impl std::error::Error for DeviceError {}

/// A high-level error raised by the renderer facade.
#[derive(Debug)]
pub enum RendererError {
    /// The render thread could not be started.
    ThreadSpawnFailed(String),
    /// The render thread failed during startup; the underlying device error
    /// is carried along.
    StartupFailed(DeviceError),
}

impl fmt::Display for RendererError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RendererError::ThreadSpawnFailed(msg) => {
                write!(f, "Failed to spawn the render thread: {msg}")
            }
            RendererError::StartupFailed(err) => {
                write!(f, "Render thread startup failed: {err}")
            }
        }
    }
}

impl std::error::Error for RendererError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RendererError::StartupFailed(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DeviceError> for RendererError {
    fn from(err: DeviceError) -> Self {
        RendererError::StartupFailed(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn device_error_display() {
        let err = DeviceError::ProgramFailed {
            name: "sky".to_string(),
            details: "undeclared identifier".to_string(),
        };
        assert_eq!(
            format!("{err}"),
            "Program 'sky' failed to build: undeclared identifier"
        );
    }

    #[test]
    fn renderer_error_carries_source() {
        let err: RendererError = DeviceError::InvalidHandle.into();
        assert!(err.source().is_some());
        assert_eq!(
            format!("{err}"),
            "Render thread startup failed: Invalid resource handle."
        );
    }
}
