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

//! Sampler state objects.

use super::GpuNativeHandle;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Defines how texture coordinates are handled when sampling outside the `[0, 1]` range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AddressMode {
    /// Coordinates wrap around. `1.1` becomes `0.1`.
    Repeat,
    /// Coordinates are clamped to the edge. `1.1` becomes `1.0`.
    #[default]
    ClampToEdge,
    /// Coordinates wrap around, mirroring at each integer boundary.
    MirrorRepeat,
    /// Coordinates outside the range are given a fixed border color.
    ClampToBorder,
}

/// Defines the filtering mode for texture sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FilterMode {
    /// Point sampling.
    Nearest,
    /// Linear interpolation.
    #[default]
    Linear,
}

/// A descriptor used to create a [`GpuSampler`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplerCreateInfo<'a> {
    /// An optional debug label.
    #[serde(borrow)]
    pub label: Option<Cow<'a, str>>,
    /// The address mode for the U coordinate.
    pub address_mode_u: AddressMode,
    /// The address mode for the V coordinate.
    pub address_mode_v: AddressMode,
    /// The address mode for the W coordinate.
    pub address_mode_w: AddressMode,
    /// The filter used when magnifying.
    pub mag_filter: FilterMode,
    /// The filter used when minifying.
    pub min_filter: FilterMode,
    /// The filter used between mip levels.
    pub mipmap_filter: FilterMode,
    /// The minimum level of detail.
    pub lod_min_clamp: f32,
    /// The maximum level of detail.
    pub lod_max_clamp: f32,
    /// The maximum anisotropy. One disables anisotropic filtering.
    pub anisotropy_clamp: u16,
}

impl Default for SamplerCreateInfo<'_> {
    fn default() -> Self {
        Self {
            label: None,
            address_mode_u: AddressMode::default(),
            address_mode_v: AddressMode::default(),
            address_mode_w: AddressMode::default(),
            mag_filter: FilterMode::default(),
            min_filter: FilterMode::default(),
            mipmap_filter: FilterMode::Nearest,
            lod_min_clamp: 0.0,
            lod_max_clamp: 32.0,
            anisotropy_clamp: 1,
        }
    }
}

/// An immutable sampler state object.
#[derive(Debug)]
pub struct GpuSampler {
    native: GpuNativeHandle,
    label: Option<String>,
    address_modes: [AddressMode; 3],
    filters: [FilterMode; 3],
}

impl GpuSampler {
    /// Wraps the native sampler created for `info`.
    pub fn new(native: GpuNativeHandle, info: &SamplerCreateInfo<'_>) -> Self {
        Self {
            native,
            label: info.label.as_deref().map(str::to_string),
            address_modes: [info.address_mode_u, info.address_mode_v, info.address_mode_w],
            filters: [info.mag_filter, info.min_filter, info.mipmap_filter],
        }
    }

    /// The backend object behind the sampler.
    pub fn native_handle(&self) -> GpuNativeHandle {
        self.native
    }

    /// The debug label, if any.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// The U, V and W address modes.
    pub fn address_modes(&self) -> [AddressMode; 3] {
        self.address_modes
    }

    /// The magnification, minification and mipmap filters.
    pub fn filters(&self) -> [FilterMode; 3] {
        self.filters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sampler_keeps_its_state() {
        let info = SamplerCreateInfo {
            label: Some(Cow::Borrowed("linear_wrap")),
            address_mode_u: AddressMode::Repeat,
            address_mode_v: AddressMode::Repeat,
            ..Default::default()
        };
        let sampler = GpuSampler::new(GpuNativeHandle(3), &info);
        assert_eq!(sampler.label(), Some("linear_wrap"));
        assert_eq!(
            sampler.address_modes(),
            [AddressMode::Repeat, AddressMode::Repeat, AddressMode::ClampToEdge]
        );
        assert_eq!(sampler.filters()[2], FilterMode::Nearest);
    }
}
