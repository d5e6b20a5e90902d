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

//! # Ember Jobs
//!
//! A small fork-join job scheduler with explicit signal-based
//! preconditions.
//!
//! A task is a closure handed to [`JobScheduler::spawn`], optionally gated
//! on a [`Signal`]. Spawning returns the task's own completion signal, which
//! later tasks can use as their precondition and any thread can
//! [`wait`](Signal::wait) on. This is the primitive the render pipeline
//! builds its setup/push chains from: setups fan out across the workers
//! while the per-submission signal chain keeps pushes totally ordered.

#![warn(missing_docs)]

mod scheduler;
mod signal;

pub use scheduler::JobScheduler;
pub use signal::Signal;
