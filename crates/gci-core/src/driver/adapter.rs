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

/// An enumeration of the native graphics APIs a driver can sit on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GraphicsBackendType {
    /// Microsoft's DirectX 11 API.
    Dx11,
    /// Microsoft's DirectX 12 API.
    Dx12,
    /// OpenGL API.
    OpenGL,
    /// Vulkan API.
    Vulkan,
    /// Apple's Metal API.
    Metal,
    /// A CPU implementation with no native API behind it.
    Soft,
    /// The driver that creates nothing.
    #[default]
    Null,
}

/// The physical type of a graphics adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RendererDeviceType {
    /// A GPU integrated into the CPU.
    IntegratedGpu,
    /// A discrete, dedicated GPU.
    DiscreteGpu,
    /// A virtualized GPU.
    VirtualGpu,
    /// A software renderer running on the CPU.
    Cpu,
    /// An unknown device type.
    #[default]
    Unknown,
}

/// Backend-agnostic information about the adapter a device was opened on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphicsAdapterInfo {
    /// The adapter name.
    pub name: String,
    /// The native API in use.
    pub backend_type: GraphicsBackendType,
    /// The physical type of the adapter.
    pub device_type: RendererDeviceType,
    /// Dedicated video memory, in bytes. Zero if unknown.
    pub dedicated_memory_bytes: u64,
}
