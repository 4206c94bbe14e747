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
use gci_core::driver::{DisplayInfo, DisplayManager};

/// Reports the outputs configured on the soft GPU.
#[derive(Debug, Clone)]
pub struct SoftDisplayManager {
    displays: Vec<DisplayInfo>,
}

impl SoftDisplayManager {
    /// Creates a manager reporting `displays`.
    pub fn new(displays: Vec<DisplayInfo>) -> Self {
        Self { displays }
    }
}

impl DisplayManager for SoftDisplayManager {
    fn displays(&self) -> Vec<DisplayInfo> {
        self.displays.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn display(name: &str, primary: bool) -> DisplayInfo {
        DisplayInfo {
            name: name.to_string(),
            width: 800,
            height: 600,
            refresh_rate_millihertz: 59_940,
            primary,
        }
    }

    #[test]
    fn primary_display_prefers_the_flagged_output() {
        let manager = SoftDisplayManager::new(vec![display("a", false), display("b", true)]);
        assert_eq!(manager.primary_display().unwrap().name, "b");
        let manager = SoftDisplayManager::new(vec![display("a", false)]);
        assert_eq!(manager.primary_display().unwrap().name, "a");
        assert!(SoftDisplayManager::new(Vec::new()).primary_display().is_none());
    }
}
