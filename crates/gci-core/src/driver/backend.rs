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

//! The hooks a native backend implements.
//!
//! Everything native-API specific lives behind these traits. The generic layer
//! in [`GpuDriver`](super::GpuDriver) and [`GpuDevice`](super::GpuDevice)
//! validates every request and does the memory accounting before a hook runs.

use super::adapter::{GraphicsAdapterInfo, GraphicsBackendType};
use super::display::DisplayManager;
use crate::command::CommandBackend;
use crate::error::{PipelineError, PresentError, ResourceError};
use crate::pipeline::{
    ComputePipelineBindings, ComputePipelineStateObjectCreateInfo, GraphicsPipelineBindings,
    GraphicsPipelineStateObjectCreateInfo,
};
use crate::presentation::{GpuFence, SwapChainBackend, SwapChainCreateInfo};
use crate::resource::{
    GpuBufferBackend, GpuBufferCreateInfo, GpuDescriptorHandle, GpuNativeHandle,
    GpuShaderCreateInfo, GpuTexture, GpuTextureBackend, ResourceMemoryInfo, SamplerCreateInfo,
    TextureCreateInfo,
};
use crate::root_signature::RootSignatureTranslator;
use crate::settings::{GpuDeviceCreateInfo, GpuDriverConfigFlags};
use std::sync::Arc;

/// The driver-level hooks of a backend.
pub trait GpuDriverBackend: Send + Sync {
    /// The native API this backend drives.
    fn backend_type(&self) -> GraphicsBackendType;

    /// Returns `true` only for the driver that creates nothing.
    fn is_null_driver(&self) -> bool {
        false
    }

    /// The config flags this backend honors.
    fn supported_config_flags(&self) -> GpuDriverConfigFlags;

    /// Opens the native device. `config_flags` is already reduced to the supported set.
    fn create_device_backend(
        &self,
        create_info: &GpuDeviceCreateInfo,
        config_flags: GpuDriverConfigFlags,
    ) -> Option<Box<dyn GpuDeviceBackend>>;

    /// Creates the display enumerator of the platform.
    fn create_default_display_manager(&self) -> Option<Box<dyn DisplayManager>>;
}

/// The device-level hooks of a backend.
///
/// Create infos reaching these hooks are already validated.
pub trait GpuDeviceBackend: RootSignatureTranslator + Send + Sync {
    /// The adapter the device was opened on.
    fn adapter_info(&self) -> GraphicsAdapterInfo;

    /// Creates the native half of a buffer. `memory` is the accounted placement.
    fn create_buffer(
        &self,
        info: &GpuBufferCreateInfo<'_>,
        memory: &ResourceMemoryInfo,
    ) -> Result<Box<dyn GpuBufferBackend>, ResourceError>;

    /// Creates the native half of a texture.
    fn create_texture(
        &self,
        info: &TextureCreateInfo<'_>,
    ) -> Result<Box<dyn GpuTextureBackend>, ResourceError>;

    /// Creates a render-target or depth-stencil view of `texture`.
    fn create_render_target_view(
        &self,
        texture: &GpuTexture,
    ) -> Result<GpuDescriptorHandle, ResourceError>;

    /// Wraps shader bytecode in a native shader object.
    fn create_shader(&self, info: &GpuShaderCreateInfo<'_>) -> Result<GpuNativeHandle, ResourceError>;

    /// Creates a native sampler.
    fn create_sampler(&self, info: &SamplerCreateInfo<'_>) -> Result<GpuNativeHandle, ResourceError>;

    /// Builds a native graphics pipeline from its cached sub-states.
    fn create_graphics_pipeline(
        &self,
        info: &GraphicsPipelineStateObjectCreateInfo,
        bindings: &GraphicsPipelineBindings,
    ) -> Result<GpuNativeHandle, PipelineError>;

    /// Builds a native compute pipeline.
    fn create_compute_pipeline(
        &self,
        info: &ComputePipelineStateObjectCreateInfo,
        bindings: &ComputePipelineBindings,
    ) -> Result<GpuNativeHandle, PipelineError>;

    /// The queue and command list hooks of this device.
    fn command_backend(&self) -> Arc<dyn CommandBackend>;

    /// Creates a swap chain. `info.buffer_count` is already clamped.
    fn create_swap_chain(
        &self,
        info: &SwapChainCreateInfo,
    ) -> Result<Box<dyn SwapChainBackend>, PresentError>;

    /// Creates a fence starting at `initial_value`.
    fn create_fence(&self, initial_value: u64) -> Option<Arc<dyn GpuFence>>;
}
