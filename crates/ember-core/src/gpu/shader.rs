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

//! Shader stage kinds and program source descriptors.

/// The pipeline stage a shader source targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderKind {
    /// Vertex stage.
    Vertex,
    /// Fragment stage.
    Fragment,
    /// Geometry stage.
    Geometry,
}

/// One shader source participating in a program link.
///
/// Define names are resolved to plain strings before a program job is
/// built, so the driver never consults the renderer's intern tables.
#[derive(Debug, Clone, Copy)]
pub struct ProgramSource<'a> {
    /// The stage this source compiles for.
    pub kind: ShaderKind,
    /// The source text.
    pub code: &'a str,
}
