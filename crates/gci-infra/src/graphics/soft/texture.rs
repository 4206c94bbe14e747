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
use gci_core::resource::{GpuNativeHandle, GpuTextureBackend, TextureFormat};
use std::any::Any;

/// A texture of the soft backend. Texel data is not stored: only draws touch
/// textures, and draws are counted rather than rasterized.
#[derive(Debug)]
pub struct SoftTexture {
    native: GpuNativeHandle,
    format: TextureFormat,
    byte_size: u64,
}

impl SoftTexture {
    /// Creates the texture record.
    pub fn new(native: GpuNativeHandle, format: TextureFormat, byte_size: u64) -> Self {
        Self {
            native,
            format,
            byte_size,
        }
    }

    /// The texel format.
    pub fn format(&self) -> TextureFormat {
        self.format
    }

    /// The footprint the texture would have in device memory.
    pub fn byte_size(&self) -> u64 {
        self.byte_size
    }
}

impl GpuTextureBackend for SoftTexture {
    fn native_handle(&self) -> GpuNativeHandle {
        self.native
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
