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

//! The backend-neutral command stream and the native hooks that consume it.

use super::queue::{CommandListType, GpuQueueId};
use crate::error::CommandError;
use crate::memory::GpuMemoryRegion;
use crate::pipeline::{
    ComputePipelineStateObjectCreateInfo, GraphicsPipelineStateObjectCreateInfo, IndexFormat,
    PipelineStateDescriptor,
};
use crate::resource::{
    GpuBuffer, GpuDescriptorHandle, GpuNativeHandle, GpuResourceState, GpuSampler, GpuTexture,
};
use crate::root_signature::RootSignatureDesc;
use std::any::Any;
use std::sync::Arc;

/// A viewport rectangle and depth range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Left edge, in pixels.
    pub x: f32,
    /// Top edge, in pixels.
    pub y: f32,
    /// Width, in pixels.
    pub width: f32,
    /// Height, in pixels.
    pub height: f32,
    /// Near depth.
    pub min_depth: f32,
    /// Far depth.
    pub max_depth: f32,
}

/// The resource bound to a descriptor slot.
#[derive(Debug, Clone)]
pub enum DescriptorBinding {
    /// A buffer range.
    Buffer {
        /// The buffer.
        buffer: Arc<GpuBuffer>,
        /// The bound range.
        region: GpuMemoryRegion,
    },
    /// A texture.
    Texture(Arc<GpuTexture>),
    /// A sampler.
    Sampler(Arc<GpuSampler>),
}

/// One recorded command.
///
/// Resources are held by `Arc` so they outlive the submission that uses them.
/// Bindings are already resolved from ref ids to flattened layout offsets.
#[derive(Debug, Clone)]
pub enum GpuCommand {
    /// Binds a graphics pipeline.
    SetGraphicsPipeline(Arc<PipelineStateDescriptor<GraphicsPipelineStateObjectCreateInfo>>),
    /// Binds a compute pipeline.
    SetComputePipeline(Arc<PipelineStateDescriptor<ComputePipelineStateObjectCreateInfo>>),
    /// Binds a root signature.
    SetRootSignature(Arc<PipelineStateDescriptor<RootSignatureDesc>>),
    /// Writes root constants.
    SetConstants {
        /// Global dword offset of the first value.
        dword_offset: u32,
        /// The raw values.
        values: Vec<u32>,
    },
    /// Binds a resource to a descriptor slot.
    SetDescriptor {
        /// Global slot in the flattened descriptor array.
        slot: u32,
        /// The bound resource.
        binding: DescriptorBinding,
    },
    /// Binds a vertex buffer range to an input slot.
    SetVertexBuffer {
        /// The input slot.
        slot: u32,
        /// The buffer.
        buffer: Arc<GpuBuffer>,
        /// The bound range.
        region: GpuMemoryRegion,
    },
    /// Binds an index buffer range.
    SetIndexBuffer {
        /// The buffer.
        buffer: Arc<GpuBuffer>,
        /// The bound range.
        region: GpuMemoryRegion,
        /// The index format.
        format: IndexFormat,
    },
    /// Binds color and depth-stencil views.
    SetRenderTargets {
        /// Color views, in slot order.
        colors: Vec<GpuDescriptorHandle>,
        /// The depth-stencil view, if any.
        depth_stencil: Option<GpuDescriptorHandle>,
    },
    /// Sets the viewport.
    SetViewport(Viewport),
    /// Transitions a resource between usage states.
    Transition {
        /// The resource.
        resource: GpuNativeHandle,
        /// The state before the barrier.
        before: GpuResourceState,
        /// The state after the barrier.
        after: GpuResourceState,
    },
    /// Clears a color view.
    ClearRenderTarget {
        /// The view.
        view: GpuDescriptorHandle,
        /// The clear color.
        color: [f32; 4],
    },
    /// Clears a depth-stencil view.
    ClearDepthStencil {
        /// The view.
        view: GpuDescriptorHandle,
        /// The depth clear value.
        depth: f32,
        /// The stencil clear value.
        stencil: u8,
    },
    /// A non-indexed draw.
    Draw {
        /// Vertices per instance.
        vertex_count: u32,
        /// Number of instances.
        instance_count: u32,
        /// First vertex.
        first_vertex: u32,
        /// First instance.
        first_instance: u32,
    },
    /// An indexed draw.
    DrawIndexed {
        /// Indices per instance.
        index_count: u32,
        /// Number of instances.
        instance_count: u32,
        /// First index.
        first_index: u32,
        /// Value added to each index.
        base_vertex: i32,
        /// First instance.
        first_instance: u32,
    },
    /// A compute dispatch.
    Dispatch {
        /// Groups along X.
        x: u32,
        /// Groups along Y.
        y: u32,
        /// Groups along Z.
        z: u32,
    },
    /// A buffer-to-buffer copy.
    CopyBuffer {
        /// The source buffer.
        src: Arc<GpuBuffer>,
        /// Byte offset in the source.
        src_offset: u64,
        /// The destination buffer.
        dst: Arc<GpuBuffer>,
        /// Byte offset in the destination.
        dst_offset: u64,
        /// Bytes to copy.
        size: u64,
    },
}

/// A native command list with its allocator, owned by one [`CommandContext`](super::CommandContext).
pub trait NativeCommandList: Send {
    /// The native type of the list.
    fn list_type(&self) -> CommandListType;

    /// The backend object behind the list.
    fn native_handle(&self) -> GpuNativeHandle;

    /// Resets the allocator and reopens the list for recording.
    fn reset(&mut self) -> bool;

    /// Translates `commands` into native commands and closes the list.
    fn close(&mut self, commands: &[GpuCommand]) -> bool;

    /// Returns the list as `Any`, for backends that need their concrete type back.
    fn as_any(&self) -> &dyn Any;
}

/// The queue-facing half of a backend.
pub trait CommandBackend: Send + Sync {
    /// Creates the native queue backing `queue_id`.
    fn create_native_queue(
        &self,
        queue_id: GpuQueueId,
        list_type: CommandListType,
    ) -> Option<GpuNativeHandle>;

    /// Creates a native command list and allocator pair.
    fn create_command_list(
        &self,
        list_type: CommandListType,
    ) -> Result<Box<dyn NativeCommandList>, CommandError>;

    /// Submits a closed list to a native queue. Lists submitted to one queue run in order.
    fn submit(&self, queue: GpuNativeHandle, list: &dyn NativeCommandList) -> bool;
}
