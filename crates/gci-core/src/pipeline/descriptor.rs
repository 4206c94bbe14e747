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

use super::hash::PipelineConfigHash;
use super::state::*;
use crate::resource::{GpuNativeHandle, TextureFormat};
use crate::root_signature::{RootSignature, RootSignatureDesc};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// The kind of an immutable pipeline state descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PipelineStateDescriptorType {
    /// Blend sub-state.
    Blend,
    /// Depth-stencil sub-state.
    DepthStencil,
    /// Rasterizer sub-state.
    Rasterizer,
    /// Vertex attribute layout sub-state.
    VertexAttributeLayout,
    /// Render target binding sub-state.
    RenderTargetBinding,
    /// Compiled root signature.
    RootSignature,
    /// Full graphics pipeline state object.
    GraphicsPipelineStateObject,
    /// Full compute pipeline state object.
    ComputePipelineStateObject,
}

/// A create info that can be turned into a cached [`PipelineStateDescriptor`].
pub trait PipelineStateCreateInfo: Serialize + Clone + Send + Sync + 'static {
    /// The kind of descriptor this info creates.
    const DESCRIPTOR_TYPE: PipelineStateDescriptorType;

    /// Backend-neutral data derived from the info at creation.
    type Compiled: Send + Sync + 'static;

    /// Checks the info before any backend work. `Err` carries the reason.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// An immutable, content-identified pipeline configuration object.
pub struct PipelineStateDescriptor<T: PipelineStateCreateInfo> {
    config_hash: PipelineConfigHash,
    create_info: T,
    compiled: T::Compiled,
    native: GpuNativeHandle,
}

impl<T: PipelineStateCreateInfo> PipelineStateDescriptor<T> {
    /// Assembles a descriptor. Called by the device while filling a cache miss.
    pub fn new(
        config_hash: PipelineConfigHash,
        create_info: T,
        compiled: T::Compiled,
        native: GpuNativeHandle,
    ) -> Self {
        Self {
            config_hash,
            create_info,
            compiled,
            native,
        }
    }

    /// The kind of this descriptor.
    pub fn descriptor_type(&self) -> PipelineStateDescriptorType {
        T::DESCRIPTOR_TYPE
    }

    /// The content hash of the create info.
    pub fn config_hash(&self) -> PipelineConfigHash {
        self.config_hash
    }

    /// The info this descriptor was created from.
    ///
    /// Labels are not part of the content hash, so a descriptor shared by several
    /// creators keeps the label of whichever request filled the cache first. Later
    /// requests with the same content but another label get this descriptor back
    /// unchanged.
    pub fn create_info(&self) -> &T {
        &self.create_info
    }

    /// The backend-neutral data derived at creation.
    pub fn compiled(&self) -> &T::Compiled {
        &self.compiled
    }

    /// The backend object, or the default handle for sub-states that have none.
    pub fn native_handle(&self) -> GpuNativeHandle {
        self.native
    }
}

impl<T: PipelineStateCreateInfo> fmt::Debug for PipelineStateDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineStateDescriptor")
            .field("type", &T::DESCRIPTOR_TYPE)
            .field("config_hash", &self.config_hash)
            .field("native", &self.native)
            .finish()
    }
}

impl PipelineStateDescriptor<RootSignatureDesc> {
    /// The compiled layout.
    pub fn root_signature(&self) -> &RootSignature {
        &self.compiled
    }
}

/// The cached sub-states a graphics pipeline was built from.
#[derive(Debug, Clone)]
pub struct GraphicsPipelineBindings {
    /// Blend sub-state.
    pub blend: Arc<PipelineStateDescriptor<BlendStateCreateInfo>>,
    /// Depth-stencil sub-state.
    pub depth_stencil: Arc<PipelineStateDescriptor<DepthStencilStateCreateInfo>>,
    /// Rasterizer sub-state.
    pub rasterizer: Arc<PipelineStateDescriptor<RasterizerStateCreateInfo>>,
    /// Vertex layout sub-state.
    pub vertex_layout: Arc<PipelineStateDescriptor<VertexAttributeLayoutCreateInfo>>,
    /// Render target binding sub-state.
    pub render_targets: Arc<PipelineStateDescriptor<RenderTargetBindingCreateInfo>>,
    /// Root signature.
    pub root_signature: Arc<PipelineStateDescriptor<RootSignatureDesc>>,
}

/// The cached sub-states a compute pipeline was built from.
#[derive(Debug, Clone)]
pub struct ComputePipelineBindings {
    /// Root signature.
    pub root_signature: Arc<PipelineStateDescriptor<RootSignatureDesc>>,
}

impl PipelineStateCreateInfo for BlendStateCreateInfo {
    const DESCRIPTOR_TYPE: PipelineStateDescriptorType = PipelineStateDescriptorType::Blend;
    type Compiled = ();

    fn validate(&self) -> Result<(), String> {
        if self.targets.len() > MAX_COLOR_TARGETS {
            return Err(format!(
                "{} blend targets, max is {}",
                self.targets.len(),
                MAX_COLOR_TARGETS
            ));
        }
        Ok(())
    }
}

impl PipelineStateCreateInfo for DepthStencilStateCreateInfo {
    const DESCRIPTOR_TYPE: PipelineStateDescriptorType = PipelineStateDescriptorType::DepthStencil;
    type Compiled = ();

    fn validate(&self) -> Result<(), String> {
        if self.depth_write_enabled && !self.depth_test_enabled {
            return Err("depth writes require the depth test".to_string());
        }
        Ok(())
    }
}

impl PipelineStateCreateInfo for RasterizerStateCreateInfo {
    const DESCRIPTOR_TYPE: PipelineStateDescriptorType = PipelineStateDescriptorType::Rasterizer;
    type Compiled = ();

    fn validate(&self) -> Result<(), String> {
        if !self.depth_bias_slope_scale.is_finite() || !self.depth_bias_clamp.is_finite() {
            return Err("depth bias factors must be finite".to_string());
        }
        Ok(())
    }
}

impl PipelineStateCreateInfo for VertexAttributeLayoutCreateInfo {
    const DESCRIPTOR_TYPE: PipelineStateDescriptorType =
        PipelineStateDescriptorType::VertexAttributeLayout;
    type Compiled = ();

    fn validate(&self) -> Result<(), String> {
        let mut locations = HashSet::new();
        for (slot, buffer) in self.buffers.iter().enumerate() {
            for attribute in &buffer.attributes {
                if !locations.insert(attribute.shader_location) {
                    return Err(format!(
                        "shader location {} is used twice",
                        attribute.shader_location
                    ));
                }
                let end = attribute.offset + attribute.format.size();
                if buffer.array_stride > 0 && end > buffer.array_stride {
                    return Err(format!(
                        "attribute at location {} ends at byte {} past the stride {} of slot {}",
                        attribute.shader_location, end, buffer.array_stride, slot
                    ));
                }
            }
        }
        Ok(())
    }
}

impl PipelineStateCreateInfo for RenderTargetBindingCreateInfo {
    const DESCRIPTOR_TYPE: PipelineStateDescriptorType =
        PipelineStateDescriptorType::RenderTargetBinding;
    type Compiled = ();

    fn validate(&self) -> Result<(), String> {
        if self.color_formats.len() > MAX_COLOR_TARGETS {
            return Err(format!(
                "{} color targets, max is {}",
                self.color_formats.len(),
                MAX_COLOR_TARGETS
            ));
        }
        if let Some(format) = self
            .color_formats
            .iter()
            .find(|format| format.is_depth_stencil())
        {
            return Err(format!("{format:?} cannot be a color target"));
        }
        if self
            .depth_stencil_format
            .is_some_and(|format: TextureFormat| !format.is_depth_stencil())
        {
            return Err("the depth-stencil format is not a depth format".to_string());
        }
        if !self.sample_count.is_power_of_two() {
            return Err(format!("invalid sample count {}", self.sample_count));
        }
        Ok(())
    }
}

impl PipelineStateCreateInfo for RootSignatureDesc {
    const DESCRIPTOR_TYPE: PipelineStateDescriptorType = PipelineStateDescriptorType::RootSignature;
    type Compiled = RootSignature;
}

impl PipelineStateCreateInfo for GraphicsPipelineStateObjectCreateInfo {
    const DESCRIPTOR_TYPE: PipelineStateDescriptorType =
        PipelineStateDescriptorType::GraphicsPipelineStateObject;
    type Compiled = GraphicsPipelineBindings;

    fn validate(&self) -> Result<(), String> {
        if self.shaders.hull.is_some() != self.shaders.domain.is_some() {
            return Err("hull and domain shaders must be set together".to_string());
        }
        if self.blend.targets.len() > self.render_targets.color_formats.len() {
            return Err(format!(
                "{} blend targets for {} color targets",
                self.blend.targets.len(),
                self.render_targets.color_formats.len()
            ));
        }
        Ok(())
    }
}

impl PipelineStateCreateInfo for ComputePipelineStateObjectCreateInfo {
    const DESCRIPTOR_TYPE: PipelineStateDescriptorType =
        PipelineStateDescriptorType::ComputePipelineStateObject;
    type Compiled = ComputePipelineBindings;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{VertexAttributeDescriptor, VertexBufferLayoutDescriptor, VertexFormat};

    #[test]
    fn vertex_layout_validation() {
        let mut layout = VertexAttributeLayoutCreateInfo {
            buffers: vec![VertexBufferLayoutDescriptor {
                array_stride: 20,
                attributes: vec![
                    VertexAttributeDescriptor {
                        shader_location: 0,
                        format: VertexFormat::Float32x3,
                        offset: 0,
                    },
                    VertexAttributeDescriptor {
                        shader_location: 1,
                        format: VertexFormat::Float32x2,
                        offset: 12,
                    },
                ],
                ..Default::default()
            }],
        };
        assert!(layout.validate().is_ok());
        layout.buffers[0].array_stride = 16;
        assert!(layout.validate().is_err());
        layout.buffers[0].array_stride = 20;
        layout.buffers[0].attributes[1].shader_location = 0;
        assert!(layout.validate().is_err());
    }

    #[test]
    fn render_target_validation() {
        assert!(RenderTargetBindingCreateInfo::default().validate().is_ok());
        let depth_as_color = RenderTargetBindingCreateInfo {
            color_formats: vec![TextureFormat::Depth32Float],
            ..Default::default()
        };
        assert!(depth_as_color.validate().is_err());
        let bad_samples = RenderTargetBindingCreateInfo {
            sample_count: 3,
            ..Default::default()
        };
        assert!(bad_samples.validate().is_err());
    }
}
