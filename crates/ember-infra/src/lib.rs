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

//! # Ember Infra
//!
//! Concrete implementations of the `ember-core` contracts. Currently ships
//! the [`HeadlessDevice`], a driver that keeps all resources in host memory
//! and enforces the pipeline's threading contract. The sandbox and the
//! pipeline's integration tests run against it.

#![warn(missing_docs)]

pub mod headless;

pub use headless::HeadlessDevice;
