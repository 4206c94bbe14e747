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

use super::queue::{CommandContextProperties, CommandListType};
use super::recorded::{DescriptorBinding, GpuCommand, NativeCommandList, Viewport};
use crate::pipeline::{
    ComputePipelineStateObjectCreateInfo, GraphicsPipelineStateObjectCreateInfo, IndexFormat,
    PipelineStateDescriptor,
};
use crate::resource::utils::check_buffer_region;
use crate::resource::{
    GpuBuffer, GpuBufferBindFlags, GpuBufferReference, GpuDescriptorHandle, GpuNativeHandle,
    GpuRenderTarget, GpuResourceState, GpuSampler, GpuTexture,
};
use crate::memory::GpuMemoryRegion;
use crate::root_signature::{DescriptorType, RootSignatureDesc, ShaderInputRefId};
use std::fmt;
use std::sync::Arc;

/// Identifies a pooled context for the lifetime of its command system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandContextId(pub u64);

/// The lifecycle state of a [`CommandContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandContextState {
    /// In the free pool.
    Idle,
    /// Acquired; accepts commands.
    Recording,
    /// The command sequence is closed and ready for submission.
    Executable,
    /// Handed to a queue. Only releasing the context is allowed.
    Submitted,
}

/// A recording context wrapping one pooled native command list.
///
/// Every recording call returns `false`, and records nothing, if the context
/// is not recording or the call does not fit the bound state.
pub struct CommandContext {
    id: CommandContextId,
    list_type: CommandListType,
    properties: CommandContextProperties,
    state: CommandContextState,
    native: Box<dyn NativeCommandList>,
    commands: Vec<GpuCommand>,
    root_signature: Option<Arc<PipelineStateDescriptor<RootSignatureDesc>>>,
    graphics_pipeline_bound: bool,
    compute_pipeline_bound: bool,
    index_buffer_bound: bool,
    sequence_open: bool,
}

impl fmt::Debug for CommandContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandContext")
            .field("id", &self.id)
            .field("list_type", &self.list_type)
            .field("state", &self.state)
            .field("commands", &self.commands.len())
            .finish()
    }
}

impl CommandContext {
    pub(crate) fn new(id: CommandContextId, native: Box<dyn NativeCommandList>) -> Self {
        Self {
            id,
            list_type: native.list_type(),
            properties: CommandContextProperties::default(),
            state: CommandContextState::Idle,
            native,
            commands: Vec::new(),
            root_signature: None,
            graphics_pipeline_bound: false,
            compute_pipeline_bound: false,
            index_buffer_bound: false,
            sequence_open: false,
        }
    }

    /// Resets the native list and opens the context for recording.
    pub(crate) fn activate(&mut self, properties: CommandContextProperties) -> bool {
        self.clear_recording();
        self.properties = properties;
        if !self.native.reset() {
            return false;
        }
        self.state = CommandContextState::Recording;
        true
    }

    /// Drops recorded state and marks the context idle.
    pub(crate) fn deactivate(&mut self) {
        self.clear_recording();
        self.state = CommandContextState::Idle;
    }

    pub(crate) fn mark_submitted(&mut self) {
        self.state = CommandContextState::Submitted;
    }

    fn clear_recording(&mut self) {
        self.commands.clear();
        self.root_signature = None;
        self.graphics_pipeline_bound = false;
        self.compute_pipeline_bound = false;
        self.index_buffer_bound = false;
        self.sequence_open = false;
    }

    /// The pool identity of this context.
    pub fn id(&self) -> CommandContextId {
        self.id
    }

    /// The native list type, which is also the pool key.
    pub fn list_type(&self) -> CommandListType {
        self.list_type
    }

    /// The properties of the current acquisition.
    pub fn properties(&self) -> CommandContextProperties {
        self.properties
    }

    /// The lifecycle state.
    pub fn state(&self) -> CommandContextState {
        self.state
    }

    /// The commands recorded since the last acquisition.
    pub fn commands(&self) -> &[GpuCommand] {
        &self.commands
    }

    /// The native command list.
    pub fn native(&self) -> &dyn NativeCommandList {
        self.native.as_ref()
    }

    /// The backend object behind the native list.
    pub fn native_handle(&self) -> GpuNativeHandle {
        self.native.native_handle()
    }

    fn is_recording(&self) -> bool {
        self.state == CommandContextState::Recording
    }

    fn record(&mut self, command: GpuCommand) -> bool {
        if !self.is_recording() {
            log::warn!(
                "Context {:?}: command recorded in state {:?}.",
                self.id,
                self.state
            );
            return false;
        }
        self.commands.push(command);
        true
    }

    /// Opens a command sequence. Fails if one is already open.
    pub fn begin_command_sequence(&mut self) -> bool {
        if !self.is_recording() || self.sequence_open {
            return false;
        }
        self.sequence_open = true;
        true
    }

    /// Closes the recorded stream into the native list: `Recording` becomes `Executable`.
    pub fn end_command_sequence(&mut self) -> bool {
        if !self.is_recording() {
            return false;
        }
        if !self.native.close(&self.commands) {
            log::error!("Context {:?}: native list failed to close.", self.id);
            return false;
        }
        self.sequence_open = false;
        self.state = CommandContextState::Executable;
        true
    }

    /// Binds a graphics pipeline and its root signature.
    pub fn set_graphics_pipeline_state(
        &mut self,
        pipeline: &Arc<PipelineStateDescriptor<GraphicsPipelineStateObjectCreateInfo>>,
    ) -> bool {
        if !self.list_type.supports_graphics() {
            return false;
        }
        let root_signature = pipeline.compiled().root_signature.clone();
        if !self.record(GpuCommand::SetGraphicsPipeline(pipeline.clone())) {
            return false;
        }
        self.graphics_pipeline_bound = true;
        self.compute_pipeline_bound = false;
        self.set_root_signature(&root_signature)
    }

    /// Binds a compute pipeline and its root signature.
    pub fn set_compute_pipeline_state(
        &mut self,
        pipeline: &Arc<PipelineStateDescriptor<ComputePipelineStateObjectCreateInfo>>,
    ) -> bool {
        if !self.list_type.supports_compute() {
            return false;
        }
        let root_signature = pipeline.compiled().root_signature.clone();
        if !self.record(GpuCommand::SetComputePipeline(pipeline.clone())) {
            return false;
        }
        self.compute_pipeline_bound = true;
        self.graphics_pipeline_bound = false;
        self.set_root_signature(&root_signature)
    }

    /// Binds a root signature. Later ref-id bindings resolve against it.
    pub fn set_root_signature(
        &mut self,
        root_signature: &Arc<PipelineStateDescriptor<RootSignatureDesc>>,
    ) -> bool {
        if self
            .root_signature
            .as_ref()
            .is_some_and(|bound| Arc::ptr_eq(bound, root_signature))
        {
            return self.is_recording();
        }
        if !self.record(GpuCommand::SetRootSignature(root_signature.clone())) {
            return false;
        }
        self.root_signature = Some(root_signature.clone());
        true
    }

    /// Writes the root constant `ref_id`. `values` must hold exactly its dwords.
    pub fn set_constant(&mut self, ref_id: ShaderInputRefId, values: &[u32]) -> bool {
        let Some(signature) = &self.root_signature else {
            log::warn!("Context {:?}: constant {:?} set without a root signature.", self.id, ref_id);
            return false;
        };
        let Some(constant) = signature.root_signature().constant(ref_id) else {
            log::warn!("Context {:?}: unknown constant {:?}.", self.id, ref_id);
            return false;
        };
        if values.len() as u32 != constant.format.dword_size() {
            log::warn!(
                "Context {:?}: constant {:?} expects {} dwords, got {}.",
                self.id,
                ref_id,
                constant.format.dword_size(),
                values.len()
            );
            return false;
        }
        let dword_offset = constant.dword_offset;
        self.record(GpuCommand::SetConstants {
            dword_offset,
            values: values.to_vec(),
        })
    }

    /// Writes the root constant `ref_id` from a plain-old-data value.
    pub fn set_constant_pod<T: bytemuck::Pod>(&mut self, ref_id: ShaderInputRefId, value: &T) -> bool {
        let bytes = bytemuck::bytes_of(value);
        if bytes.len() % 4 != 0 {
            return false;
        }
        let values: Vec<u32> = bytes
            .chunks_exact(4)
            .map(|chunk| u32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();
        self.set_constant(ref_id, &values)
    }

    fn descriptor_slot(
        &self,
        ref_id: ShaderInputRefId,
        accepts: impl Fn(DescriptorType) -> bool,
    ) -> Option<u32> {
        let signature = self.root_signature.as_ref()?;
        let Some(descriptor) = signature.root_signature().descriptor(ref_id) else {
            log::warn!("Context {:?}: unknown descriptor {:?}.", self.id, ref_id);
            return None;
        };
        if !accepts(descriptor.descriptor_type) {
            log::warn!(
                "Context {:?}: descriptor {:?} of type {:?} cannot take this binding.",
                self.id,
                ref_id,
                descriptor.descriptor_type
            );
            return None;
        }
        Some(descriptor.global_offset)
    }

    /// Binds a buffer range to the descriptor `ref_id`.
    pub fn set_descriptor_buffer(
        &mut self,
        ref_id: ShaderInputRefId,
        reference: &GpuBufferReference,
    ) -> bool {
        let Some(slot) = self.descriptor_slot(ref_id, |ty| ty.is_buffer()) else {
            return false;
        };
        let Some(buffer) = live_buffer(reference) else {
            return false;
        };
        self.record(GpuCommand::SetDescriptor {
            slot,
            binding: DescriptorBinding::Buffer {
                buffer,
                region: reference.sub_region(),
            },
        })
    }

    /// Binds a texture to the descriptor `ref_id`.
    pub fn set_descriptor_texture(&mut self, ref_id: ShaderInputRefId, texture: &Arc<GpuTexture>) -> bool {
        let Some(slot) = self.descriptor_slot(ref_id, |ty| {
            matches!(
                ty,
                DescriptorType::TextureShaderResource | DescriptorType::TextureUnorderedAccess
            )
        }) else {
            return false;
        };
        self.record(GpuCommand::SetDescriptor {
            slot,
            binding: DescriptorBinding::Texture(texture.clone()),
        })
    }

    /// Binds a sampler to the descriptor `ref_id`.
    pub fn set_descriptor_sampler(&mut self, ref_id: ShaderInputRefId, sampler: &Arc<GpuSampler>) -> bool {
        let Some(slot) = self.descriptor_slot(ref_id, |ty| ty.is_sampler()) else {
            return false;
        };
        self.record(GpuCommand::SetDescriptor {
            slot,
            binding: DescriptorBinding::Sampler(sampler.clone()),
        })
    }

    /// Binds a vertex buffer range to input `slot`.
    pub fn set_vertex_buffer(&mut self, slot: u32, reference: &GpuBufferReference) -> bool {
        let Some(buffer) = live_buffer(reference) else {
            return false;
        };
        if !buffer.bind_flags().contains(GpuBufferBindFlags::VERTEX) {
            log::warn!("Context {:?}: buffer without VERTEX flag bound as vertex buffer.", self.id);
            return false;
        }
        self.record(GpuCommand::SetVertexBuffer {
            slot,
            buffer,
            region: reference.sub_region(),
        })
    }

    /// Binds an index buffer range.
    pub fn set_index_buffer(&mut self, reference: &GpuBufferReference, format: IndexFormat) -> bool {
        let Some(buffer) = live_buffer(reference) else {
            return false;
        };
        if !buffer.bind_flags().contains(GpuBufferBindFlags::INDEX) {
            log::warn!("Context {:?}: buffer without INDEX flag bound as index buffer.", self.id);
            return false;
        }
        if !self.record(GpuCommand::SetIndexBuffer {
            buffer,
            region: reference.sub_region(),
            format,
        }) {
            return false;
        }
        self.index_buffer_bound = true;
        true
    }

    /// Binds color targets and an optional depth-stencil target.
    pub fn set_render_targets(
        &mut self,
        colors: &[GpuRenderTarget],
        depth_stencil: Option<&GpuRenderTarget>,
    ) -> bool {
        if !self.list_type.supports_graphics()
            || colors.iter().any(GpuRenderTarget::is_depth_stencil)
            || depth_stencil.is_some_and(|target| !target.is_depth_stencil())
        {
            return false;
        }
        self.record(GpuCommand::SetRenderTargets {
            colors: colors.iter().map(|target| target.view).collect(),
            depth_stencil: depth_stencil.map(|target| target.view),
        })
    }

    /// Sets the viewport.
    pub fn set_viewport(&mut self, viewport: Viewport) -> bool {
        if viewport.width <= 0.0 || viewport.height <= 0.0 {
            return false;
        }
        self.record(GpuCommand::SetViewport(viewport))
    }

    /// Records a usage transition of `resource`. A transition to the same state records nothing.
    pub fn transition(
        &mut self,
        resource: GpuNativeHandle,
        before: GpuResourceState,
        after: GpuResourceState,
    ) -> bool {
        if before == after {
            return self.is_recording();
        }
        self.record(GpuCommand::Transition {
            resource,
            before,
            after,
        })
    }

    /// Clears a color view.
    pub fn clear_render_target(&mut self, view: GpuDescriptorHandle, color: [f32; 4]) -> bool {
        if !self.list_type.supports_graphics() {
            return false;
        }
        self.record(GpuCommand::ClearRenderTarget { view, color })
    }

    /// Clears a depth-stencil view.
    pub fn clear_depth_stencil(&mut self, view: GpuDescriptorHandle, depth: f32, stencil: u8) -> bool {
        if !self.list_type.supports_graphics() || !(0.0..=1.0).contains(&depth) {
            return false;
        }
        self.record(GpuCommand::ClearDepthStencil {
            view,
            depth,
            stencil,
        })
    }

    /// Records a non-indexed draw. Requires a bound graphics pipeline.
    pub fn draw(
        &mut self,
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    ) -> bool {
        if !self.graphics_pipeline_bound {
            log::warn!("Context {:?}: draw without a graphics pipeline.", self.id);
            return false;
        }
        self.record(GpuCommand::Draw {
            vertex_count,
            instance_count,
            first_vertex,
            first_instance,
        })
    }

    /// Records an indexed draw. Requires a bound graphics pipeline and index buffer.
    pub fn draw_indexed(
        &mut self,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        base_vertex: i32,
        first_instance: u32,
    ) -> bool {
        if !self.graphics_pipeline_bound || !self.index_buffer_bound {
            log::warn!(
                "Context {:?}: indexed draw without a graphics pipeline or index buffer.",
                self.id
            );
            return false;
        }
        self.record(GpuCommand::DrawIndexed {
            index_count,
            instance_count,
            first_index,
            base_vertex,
            first_instance,
        })
    }

    /// Records a compute dispatch. Requires a bound compute pipeline.
    pub fn dispatch(&mut self, x: u32, y: u32, z: u32) -> bool {
        if !self.compute_pipeline_bound {
            log::warn!("Context {:?}: dispatch without a compute pipeline.", self.id);
            return false;
        }
        self.record(GpuCommand::Dispatch { x, y, z })
    }

    /// Records a copy of `size` bytes between two buffers.
    ///
    /// Both ranges must lie within their buffers, the source needs `COPY_SRC` and
    /// the destination `COPY_DST`. Overlapping ranges within one buffer are rejected.
    pub fn copy_buffer(
        &mut self,
        src: &Arc<GpuBuffer>,
        src_offset: u64,
        dst: &Arc<GpuBuffer>,
        dst_offset: u64,
        size: u64,
    ) -> bool {
        let src_region = GpuMemoryRegion::new(src_offset, size);
        let dst_region = GpuMemoryRegion::new(dst_offset, size);
        let overlapping = Arc::ptr_eq(src, dst)
            && src_offset < dst_offset.saturating_add(size)
            && dst_offset < src_offset.saturating_add(size);
        if !src.bind_flags().contains(GpuBufferBindFlags::COPY_SRC)
            || !dst.bind_flags().contains(GpuBufferBindFlags::COPY_DST)
            || !check_buffer_region(src.byte_size(), src_region)
            || !check_buffer_region(dst.byte_size(), dst_region)
            || overlapping
        {
            log::warn!(
                "Context {:?}: rejected buffer copy {:?} -> {:?}.",
                self.id,
                src_region,
                dst_region
            );
            return false;
        }
        self.record(GpuCommand::CopyBuffer {
            src: src.clone(),
            src_offset,
            dst: dst.clone(),
            dst_offset,
            size,
        })
    }
}

fn live_buffer(reference: &GpuBufferReference) -> Option<Arc<GpuBuffer>> {
    if reference.is_empty() || !reference.is_valid() {
        return None;
    }
    reference.buffer()
}
