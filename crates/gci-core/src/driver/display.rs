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

use serde::{Deserialize, Serialize};

/// A display output as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayInfo {
    /// The output name.
    pub name: String,
    /// Native width, in pixels.
    pub width: u32,
    /// Native height, in pixels.
    pub height: u32,
    /// Refresh rate, in millihertz.
    pub refresh_rate_millihertz: u32,
    /// Returns `true` for the primary output.
    pub primary: bool,
}

/// Enumerates the display outputs of the system.
pub trait DisplayManager: Send + Sync {
    /// Every connected output.
    fn displays(&self) -> Vec<DisplayInfo>;

    /// The primary output, if any output is connected.
    fn primary_display(&self) -> Option<DisplayInfo> {
        let displays = self.displays();
        displays
            .iter()
            .find(|display| display.primary)
            .or_else(|| displays.first())
            .cloned()
    }
}
