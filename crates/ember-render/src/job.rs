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

//! The render-job contract and the render-thread execution context.

use crate::profiler::GpuProfiler;
use ember_core::GpuDevice;

/// A unit of render work with a two-phase lifecycle.
///
/// `setup` runs on a scheduler worker after every previously submitted job
/// has been appended to the command queue, so a job's setup may read state
/// that earlier submissions' setups mutated. `execute` runs on
/// the render thread, strictly in submission order, and is the only place
/// the job may touch the driver (through the [`RenderContext`]).
///
/// The pipeline owns a pushed job outright: it travels producer → worker →
/// queue → render thread and is dropped right after `execute` returns.
pub trait RenderJob: Send + 'static {
    /// Producer-side preparation. Runs on a worker thread; must not touch
    /// the driver.
    fn setup(&mut self) {}

    /// Render-thread execution.
    fn execute(&mut self, ctx: &mut RenderContext<'_>);
}

/// Everything a job may reach while executing on the render thread.
pub struct RenderContext<'a> {
    device: &'a dyn GpuDevice,
    profiler: &'a mut GpuProfiler,
    stop: &'a mut bool,
}

impl<'a> RenderContext<'a> {
    pub(crate) fn new(
        device: &'a dyn GpuDevice,
        profiler: &'a mut GpuProfiler,
        stop: &'a mut bool,
    ) -> Self {
        Self {
            device,
            profiler,
            stop,
        }
    }

    /// The graphics driver. Calls through this reference are on the render
    /// thread by construction.
    pub fn device(&self) -> &dyn GpuDevice {
        self.device
    }

    /// Opens a named GPU timing block.
    pub fn begin_profile_block(&mut self, name: &'static str) {
        self.profiler.begin_query(self.device, name);
    }

    /// Closes the innermost GPU timing block.
    pub fn end_profile_block(&mut self) {
        self.profiler.end_query(self.device);
    }

    /// Resolves the frame's timing queries and rotates them into the
    /// history ring. Called by the swap job.
    pub(crate) fn finish_profiler_frame(&mut self) {
        self.profiler.frame(self.device);
    }

    /// Asks the render loop to exit after this job. Only the poison-pill
    /// shutdown job does this.
    pub(crate) fn request_stop(&mut self) {
        *self.stop = true;
    }
}

/// Adapts a closure into a job for `run_in_render_thread`.
pub(crate) struct FnOnceJob {
    f: Option<Box<dyn FnOnce(&mut RenderContext<'_>) + Send + 'static>>,
}

impl FnOnceJob {
    pub(crate) fn new(f: impl FnOnce(&mut RenderContext<'_>) + Send + 'static) -> Self {
        Self {
            f: Some(Box::new(f)),
        }
    }
}

impl RenderJob for FnOnceJob {
    fn execute(&mut self, ctx: &mut RenderContext<'_>) {
        if let Some(f) = self.f.take() {
            f(ctx);
        }
    }
}
