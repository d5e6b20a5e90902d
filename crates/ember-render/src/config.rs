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

//! Renderer configuration.

use ember_core::WindowTarget;

/// Settings consumed by [`Renderer::new`](crate::Renderer::new).
pub struct RendererSettings {
    /// Synchronise presentation with the display. On unless `-no_vsync`
    /// was passed.
    pub vsync: bool,
    /// The window the backend presents into; `None` runs headless.
    pub window: Option<WindowTarget>,
}

impl RendererSettings {
    /// Default settings: vsync on, no window.
    pub fn new() -> Self {
        Self {
            vsync: true,
            window: None,
        }
    }

    /// Builds settings from process arguments. `-no_vsync` is the one
    /// recognised flag.
    pub fn from_args(args: impl Iterator<Item = String>) -> Self {
        let mut settings = Self::new();
        for arg in args {
            if arg == "-no_vsync" {
                settings.vsync = false;
            }
        }
        settings
    }

    /// Attaches the presentation target.
    pub fn with_window(mut self, window: WindowTarget) -> Self {
        self.window = Some(window);
        self
    }
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RendererSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RendererSettings")
            .field("vsync", &self.vsync)
            .field("window", &self.window.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vsync_defaults_on() {
        assert!(RendererSettings::new().vsync);
    }

    #[test]
    fn no_vsync_flag_is_recognised() {
        let args = ["game.exe", "-window", "-no_vsync"]
            .iter()
            .map(|s| s.to_string());
        assert!(!RendererSettings::from_args(args).vsync);

        let args = ["game.exe"].iter().map(|s| s.to_string());
        assert!(RendererSettings::from_args(args).vsync);
    }
}
