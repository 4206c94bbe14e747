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

//! Device-wide configuration.

use crate::memory::GpuMemoryHeapDesc;
use crate::resource::DEFAULT_BUFFER_ALIGNMENT;
use anyhow::{Context, Result};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Smallest frame ring a presentation layer accepts.
pub const MIN_FRAME_QUEUE_SIZE: u32 = 2;
/// Largest frame ring a presentation layer accepts.
pub const MAX_FRAME_QUEUE_SIZE: u32 = 4;

bitflags! {
    /// Optional driver features.
    ///
    /// A driver keeps only the bits its backend supports; the rest are dropped
    /// with a warning.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct GpuDriverConfigFlags: u32 {
        /// Enable the native debug layer.
        const DEBUG_LAYER = 1 << 0;
        /// Enable GPU-based validation.
        const GPU_VALIDATION = 1 << 1;
        /// Report resources whose active-ref count drops to zero.
        const RESOURCE_ACTIVE_REF_TRACKING = 1 << 2;
        /// Keep CPU-visible buffers persistently mapped.
        const PERSISTENT_MAPPING = 1 << 3;
        /// Create dedicated compute and transfer queues.
        const MULTI_QUEUE = 1 << 4;
        /// Allow tearing presents on variable refresh rate displays.
        const ALLOW_TEARING = 1 << 5;
    }
}

/// Settings a device is created with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GciSettings {
    /// Requested driver features.
    pub driver_config_flags: GpuDriverConfigFlags,
    /// Number of frames in flight. Clamped to
    /// [`MIN_FRAME_QUEUE_SIZE`]..=[`MAX_FRAME_QUEUE_SIZE`].
    pub frame_queue_size: u32,
    /// Upper bound on a frame fence wait, in milliseconds. `None` waits without bound.
    pub fence_wait_timeout_ms: Option<u64>,
    /// Alignment applied to buffers that do not request one.
    pub default_buffer_alignment: u64,
    /// The memory heaps the device creates.
    pub heaps: Vec<GpuMemoryHeapDesc>,
}

impl Default for GciSettings {
    fn default() -> Self {
        Self {
            driver_config_flags: GpuDriverConfigFlags::RESOURCE_ACTIVE_REF_TRACKING,
            frame_queue_size: 3,
            fence_wait_timeout_ms: None,
            default_buffer_alignment: DEFAULT_BUFFER_ALIGNMENT,
            heaps: GpuMemoryHeapDesc::default_set(),
        }
    }
}

impl GciSettings {
    /// Parses settings from JSON. Missing fields take their default value.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse GCI settings")
    }

    /// Reads settings from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read GCI settings from '{}'", path.display()))?;
        Self::from_json_str(&json)
    }

    /// Serializes the settings to pretty JSON.
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize GCI settings")
    }

    /// The frame ring size actually used.
    pub fn clamped_frame_queue_size(&self) -> u32 {
        self.frame_queue_size
            .clamp(MIN_FRAME_QUEUE_SIZE, MAX_FRAME_QUEUE_SIZE)
    }

    /// The fence wait bound, if any.
    pub fn fence_wait_timeout(&self) -> Option<Duration> {
        self.fence_wait_timeout_ms.map(Duration::from_millis)
    }

    /// The buffer alignment used when a create info leaves it at zero.
    pub fn effective_buffer_alignment(&self) -> u64 {
        if self.default_buffer_alignment.is_power_of_two() {
            self.default_buffer_alignment
        } else {
            DEFAULT_BUFFER_ALIGNMENT
        }
    }
}

/// Parameters of [`GpuDriver::create_device`](crate::driver::GpuDriver::create_device).
#[derive(Debug, Clone, Default)]
pub struct GpuDeviceCreateInfo {
    /// Index of the adapter to open, in backend enumeration order.
    pub adapter_index: u32,
    /// A debug label for the device.
    pub label: Option<String>,
    /// Device settings.
    pub settings: GciSettings,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let settings =
            GciSettings::from_json_str(r#"{ "frame_queue_size": 9, "fence_wait_timeout_ms": 50 }"#)
                .unwrap();
        assert_eq!(settings.clamped_frame_queue_size(), MAX_FRAME_QUEUE_SIZE);
        assert_eq!(settings.fence_wait_timeout(), Some(Duration::from_millis(50)));
        assert_eq!(settings.heaps, GpuMemoryHeapDesc::default_set());
        assert_eq!(settings.default_buffer_alignment, DEFAULT_BUFFER_ALIGNMENT);
    }

    #[test]
    fn settings_survive_a_json_round_trip() {
        let settings = GciSettings {
            driver_config_flags: GpuDriverConfigFlags::DEBUG_LAYER | GpuDriverConfigFlags::MULTI_QUEUE,
            frame_queue_size: 1,
            ..GciSettings::default()
        };
        let json = settings.to_json_string().unwrap();
        let parsed = GciSettings::from_json_str(&json).unwrap();
        assert_eq!(parsed, settings);
        assert_eq!(parsed.clamped_frame_queue_size(), MIN_FRAME_QUEUE_SIZE);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(GciSettings::from_json_str("{ frame_queue_size: }").is_err());
        assert!(GciSettings::load("/nonexistent/gci.json").is_err());
    }

    #[test]
    fn invalid_alignment_falls_back_to_default() {
        let settings = GciSettings {
            default_buffer_alignment: 100,
            ..GciSettings::default()
        };
        assert_eq!(settings.effective_buffer_alignment(), DEFAULT_BUFFER_ALIGNMENT);
    }
}
