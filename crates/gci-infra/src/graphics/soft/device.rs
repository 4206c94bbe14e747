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
use super::buffer::SoftBuffer;
use super::command::SoftCommandBackend;
use super::gpu::SoftGpu;
use super::swap_chain::SoftSwapChain;
use super::texture::SoftTexture;
use gci_core::command::CommandBackend;
use gci_core::driver::{
    GpuDeviceBackend, GraphicsAdapterInfo, GraphicsBackendType, RendererDeviceType,
};
use gci_core::error::{PipelineError, PresentError, ResourceError};
use gci_core::pipeline::{
    ComputePipelineBindings, ComputePipelineStateObjectCreateInfo, GraphicsPipelineBindings,
    GraphicsPipelineStateObjectCreateInfo, PipelineStateDescriptorType,
};
use gci_core::presentation::{GpuFence, SwapChainBackend, SwapChainCreateInfo};
use gci_core::resource::{
    GpuBufferBackend, GpuBufferCreateInfo, GpuDescriptorHandle, GpuNativeHandle, GpuResource,
    GpuShaderCreateInfo, GpuTexture, GpuTextureBackend, ResourceMemoryInfo, SamplerCreateInfo,
    TextureCreateInfo,
};
use gci_core::root_signature::{RootSignature, RootSignatureTranslator};
use gci_core::settings::GpuDriverConfigFlags;
use std::sync::Arc;

/// Highest multisample count the soft rasterizer accepts.
pub const SOFT_MAX_SAMPLE_COUNT: u32 = 4;

/// A device of the soft backend.
#[derive(Debug)]
pub struct SoftDevice {
    gpu: Arc<SoftGpu>,
    commands: Arc<SoftCommandBackend>,
    config_flags: GpuDriverConfigFlags,
}

impl SoftDevice {
    /// Opens a device on `gpu`.
    pub fn new(gpu: Arc<SoftGpu>, config_flags: GpuDriverConfigFlags) -> Self {
        Self {
            commands: Arc::new(SoftCommandBackend::new(gpu.clone())),
            gpu,
            config_flags,
        }
    }

    /// The config flags the device was opened with.
    pub fn config_flags(&self) -> GpuDriverConfigFlags {
        self.config_flags
    }
}

impl RootSignatureTranslator for SoftDevice {
    fn translate_root_signature(
        &self,
        signature: &RootSignature,
    ) -> Result<GpuNativeHandle, PipelineError> {
        let native = self.gpu.next_handle();
        log::debug!(
            "Soft root signature {:?}: {} constant dwords, {} descriptor slots.",
            native,
            signature.total_constant_dwords(),
            signature.total_descriptor_slots()
        );
        Ok(native)
    }
}

impl GpuDeviceBackend for SoftDevice {
    fn adapter_info(&self) -> GraphicsAdapterInfo {
        GraphicsAdapterInfo {
            name: self.gpu.config().adapter_name.clone(),
            backend_type: GraphicsBackendType::Soft,
            device_type: RendererDeviceType::Cpu,
            dedicated_memory_bytes: 0,
        }
    }

    fn create_buffer(
        &self,
        info: &GpuBufferCreateInfo<'_>,
        memory: &ResourceMemoryInfo,
    ) -> Result<Box<dyn GpuBufferBackend>, ResourceError> {
        if info.buffer_size > memory.memory.as_ref().map_or(u64::MAX, |m| m.region().size) {
            return Err(ResourceError::BackendError(format!(
                "buffer of {} bytes does not fit its placement",
                info.buffer_size
            )));
        }
        Ok(Box::new(SoftBuffer::new(
            self.gpu.next_handle(),
            info.buffer_size,
            info.init_data,
        )))
    }

    fn create_texture(
        &self,
        info: &TextureCreateInfo<'_>,
    ) -> Result<Box<dyn GpuTextureBackend>, ResourceError> {
        let byte_size = info.estimated_byte_size().ok_or_else(|| {
            ResourceError::InvalidCreateInfo(format!("texture {:?} is too large", info.size))
        })?;
        Ok(Box::new(SoftTexture::new(
            self.gpu.next_handle(),
            info.format,
            byte_size,
        )))
    }

    fn create_render_target_view(
        &self,
        texture: &GpuTexture,
    ) -> Result<GpuDescriptorHandle, ResourceError> {
        let soft = texture
            .backend()
            .as_any()
            .downcast_ref::<SoftTexture>()
            .ok_or_else(|| {
                ResourceError::BackendError(format!(
                    "texture {:?} was not created by the soft backend",
                    texture.id()
                ))
            })?;
        log::trace!("View of {:?} ({:?}).", soft.native_handle(), soft.format());
        Ok(GpuDescriptorHandle(self.gpu.next_handle().0))
    }

    fn create_shader(&self, info: &GpuShaderCreateInfo<'_>) -> Result<GpuNativeHandle, ResourceError> {
        log::trace!(
            "Soft {:?} shader '{}' ({} bytes).",
            info.stage,
            info.entry_point,
            info.bytecode.len()
        );
        Ok(self.gpu.next_handle())
    }

    fn create_sampler(&self, _info: &SamplerCreateInfo<'_>) -> Result<GpuNativeHandle, ResourceError> {
        Ok(self.gpu.next_handle())
    }

    fn create_graphics_pipeline(
        &self,
        info: &GraphicsPipelineStateObjectCreateInfo,
        bindings: &GraphicsPipelineBindings,
    ) -> Result<GpuNativeHandle, PipelineError> {
        let samples = bindings.render_targets.create_info().sample_count;
        if samples > SOFT_MAX_SAMPLE_COUNT {
            log::error!(
                "Soft rasterizer supports up to {} samples, '{}' asks for {}.",
                SOFT_MAX_SAMPLE_COUNT,
                info.label.as_deref().unwrap_or("unnamed"),
                samples
            );
            return Err(PipelineError::CompilationFailed {
                descriptor_type: PipelineStateDescriptorType::GraphicsPipelineStateObject,
                label: info.label.clone(),
            });
        }
        Ok(self.gpu.next_handle())
    }

    fn create_compute_pipeline(
        &self,
        _info: &ComputePipelineStateObjectCreateInfo,
        _bindings: &ComputePipelineBindings,
    ) -> Result<GpuNativeHandle, PipelineError> {
        Ok(self.gpu.next_handle())
    }

    fn command_backend(&self) -> Arc<dyn CommandBackend> {
        self.commands.clone()
    }

    fn create_swap_chain(
        &self,
        info: &SwapChainCreateInfo,
    ) -> Result<Box<dyn SwapChainBackend>, PresentError> {
        Ok(Box::new(SoftSwapChain::new(self.gpu.clone(), info)?))
    }

    fn create_fence(&self, initial_value: u64) -> Option<Arc<dyn GpuFence>> {
        Some(self.gpu.create_fence(initial_value))
    }
}
