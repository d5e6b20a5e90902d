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

//! Windowing abstraction consumed by [`GpuDevice::init`](crate::GpuDevice::init).

use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use std::sync::Arc;

/// A marker trait unifying the two raw-window-handle requirements so a
/// single trait object can carry both.
pub trait PresentTarget: HasWindowHandle + HasDisplayHandle {}

impl<T: HasWindowHandle + HasDisplayHandle> PresentTarget for T {}

/// A thread-safe, reference-counted handle to the window the backend
/// presents into.
///
/// The renderer facade hands this to the render thread at startup; a
/// headless backend simply never receives one.
pub type WindowTarget = Arc<dyn PresentTarget + Send + Sync>;
