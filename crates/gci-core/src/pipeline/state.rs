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

//! Create infos of the pipeline sub-states and pipeline state objects.
//!
//! Every type here is plain data with a canonical serialized form; equality of
//! that form is what the pipeline cache keys on.

use super::enums::*;
use crate::resource::{GpuShaderId, TextureFormat};
use crate::root_signature::RootSignatureDesc;
use serde::{Deserialize, Serialize};

/// The maximum number of simultaneously bound color render targets.
pub const MAX_COLOR_TARGETS: usize = 8;

/// Describes a complete blend equation for the color or alpha channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlendComponentDescriptor {
    /// The blend factor for the source color (from the pixel shader).
    pub src_factor: BlendFactor,
    /// The blend factor for the destination color (already in the target).
    pub dst_factor: BlendFactor,
    /// The operation combining both.
    pub operation: BlendOperation,
}

impl BlendComponentDescriptor {
    /// `src * src_alpha + dst * (1 - src_alpha)`.
    pub const ALPHA_BLENDING: Self = Self {
        src_factor: BlendFactor::SrcAlpha,
        dst_factor: BlendFactor::OneMinusSrcAlpha,
        operation: BlendOperation::Add,
    };
}

/// Blending of one color target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct RenderTargetBlendDesc {
    /// The color and alpha equations. `None` disables blending.
    pub blend: Option<(BlendComponentDescriptor, BlendComponentDescriptor)>,
    /// Which channels are written.
    pub write_mask: ColorWrites,
}

/// Creates a blend sub-state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BlendStateCreateInfo {
    /// Use alpha as a multisample coverage mask.
    pub alpha_to_coverage: bool,
    /// Blend each target with its own description; otherwise the first one applies to all.
    pub independent_blend: bool,
    /// Per-target blending, at most [`MAX_COLOR_TARGETS`].
    pub targets: Vec<RenderTargetBlendDesc>,
}

/// Describes the stencil test and operations for a single face of a primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct StencilFaceState {
    /// The comparison function used for the stencil test.
    pub compare: CompareFunction,
    /// The operation to perform if the stencil test fails.
    pub fail_op: StencilOperation,
    /// The operation to perform if the stencil test passes but the depth test fails.
    pub depth_fail_op: StencilOperation,
    /// The operation to perform if both tests pass.
    pub pass_op: StencilOperation,
}

/// Creates a depth-stencil sub-state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DepthStencilStateCreateInfo {
    /// Enables the depth test.
    pub depth_test_enabled: bool,
    /// Enables depth writes.
    pub depth_write_enabled: bool,
    /// The depth comparison.
    pub depth_compare: CompareFunction,
    /// Enables the stencil test.
    pub stencil_enabled: bool,
    /// Stencil state of front faces.
    pub stencil_front: StencilFaceState,
    /// Stencil state of back faces.
    pub stencil_back: StencilFaceState,
    /// Mask applied when reading the stencil buffer.
    pub stencil_read_mask: u8,
    /// Mask applied when writing the stencil buffer.
    pub stencil_write_mask: u8,
}

impl Default for DepthStencilStateCreateInfo {
    fn default() -> Self {
        Self {
            depth_test_enabled: true,
            depth_write_enabled: true,
            depth_compare: CompareFunction::Less,
            stencil_enabled: false,
            stencil_front: StencilFaceState::default(),
            stencil_back: StencilFaceState::default(),
            stencil_read_mask: 0xFF,
            stencil_write_mask: 0xFF,
        }
    }
}

/// Creates a rasterizer sub-state.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RasterizerStateCreateInfo {
    /// How polygons are filled.
    pub polygon_mode: PolygonMode,
    /// Which faces are culled.
    pub cull_mode: CullMode,
    /// The winding of front faces.
    pub front_face: FrontFace,
    /// A constant depth bias.
    pub depth_bias: i32,
    /// A depth bias scaled by the primitive slope.
    pub depth_bias_slope_scale: f32,
    /// The maximum depth bias.
    pub depth_bias_clamp: f32,
    /// Disables depth clipping.
    pub unclipped_depth: bool,
    /// Enables conservative rasterization.
    pub conservative: bool,
}

/// Describes a single vertex attribute within a vertex buffer layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VertexAttributeDescriptor {
    /// The input location of this attribute in the vertex shader.
    pub shader_location: u32,
    /// The format of the attribute's data.
    pub format: VertexFormat,
    /// The byte offset of this attribute from the start of the vertex.
    pub offset: u32,
}

/// Describes the memory layout of a single vertex buffer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct VertexBufferLayoutDescriptor {
    /// The byte distance between consecutive elements in the buffer.
    pub array_stride: u32,
    /// How often the vertex buffer is advanced.
    pub step_mode: VertexStepMode,
    /// The attributes contained in each element.
    pub attributes: Vec<VertexAttributeDescriptor>,
}

/// Creates a vertex attribute layout sub-state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct VertexAttributeLayoutCreateInfo {
    /// One layout per vertex buffer slot.
    pub buffers: Vec<VertexBufferLayoutDescriptor>,
}

/// Creates a render target binding sub-state: the formats a pipeline renders into.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RenderTargetBindingCreateInfo {
    /// Color target formats, at most [`MAX_COLOR_TARGETS`].
    pub color_formats: Vec<TextureFormat>,
    /// The depth-stencil format, if any.
    pub depth_stencil_format: Option<TextureFormat>,
    /// Samples per pixel.
    pub sample_count: u32,
}

impl Default for RenderTargetBindingCreateInfo {
    fn default() -> Self {
        Self {
            color_formats: vec![TextureFormat::Bgra8Unorm],
            depth_stencil_format: None,
            sample_count: 1,
        }
    }
}

/// The shaders of a graphics pipeline, by stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphicsShaderSet {
    /// The vertex shader.
    pub vertex: GpuShaderId,
    /// The hull shader, if tessellation is used.
    pub hull: Option<GpuShaderId>,
    /// The domain shader, if tessellation is used.
    pub domain: Option<GpuShaderId>,
    /// The geometry shader, if any.
    pub geometry: Option<GpuShaderId>,
    /// The pixel shader, if any. Depth-only passes may omit it.
    pub pixel: Option<GpuShaderId>,
}

/// Creates a full graphics pipeline state object.
///
/// Sub-states are embedded by value; the device resolves each of them through
/// the cache, so pipelines sharing a sub-state share its descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphicsPipelineStateObjectCreateInfo {
    /// A debug label. Not part of the content hash, so a cached descriptor
    /// reports the label of its first creator.
    #[serde(skip)]
    pub label: Option<String>,
    /// The shaders of the pipeline.
    pub shaders: GraphicsShaderSet,
    /// How vertices are assembled.
    pub primitive_topology: PrimitiveTopology,
    /// Blend sub-state.
    pub blend: BlendStateCreateInfo,
    /// Depth-stencil sub-state.
    pub depth_stencil: DepthStencilStateCreateInfo,
    /// Rasterizer sub-state.
    pub rasterizer: RasterizerStateCreateInfo,
    /// Vertex layout sub-state.
    pub vertex_layout: VertexAttributeLayoutCreateInfo,
    /// Render target binding sub-state.
    pub render_targets: RenderTargetBindingCreateInfo,
    /// The shader input layout.
    pub root_signature: RootSignatureDesc,
}

/// Creates a compute pipeline state object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputePipelineStateObjectCreateInfo {
    /// A debug label. Not part of the content hash, so a cached descriptor
    /// reports the label of its first creator.
    #[serde(skip)]
    pub label: Option<String>,
    /// The compute shader.
    pub shader: GpuShaderId,
    /// The shader input layout.
    pub root_signature: RootSignatureDesc,
}
