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

use super::adapter::{GraphicsAdapterInfo, GraphicsBackendType};
use super::backend::GpuDeviceBackend;
use crate::command::{CommandListType, CommandSystem, GpuQueueId};
use crate::error::{CommandError, PipelineError, PresentError, ResourceError};
use crate::event::{EventBus, GpuDeviceEvent};
use crate::memory::{
    GpuMemoryHeap, GpuMemoryHeapFlags, GpuMemoryHeapId, GpuMemoryPool, GpuMemoryRef,
    GpuMemoryRegion, GpuMemoryStats,
};
use crate::pipeline::{
    BlendStateCreateInfo, ComputePipelineBindings, ComputePipelineStateObjectCreateInfo,
    DepthStencilStateCreateInfo, GraphicsPipelineBindings, GraphicsPipelineStateObjectCreateInfo,
    PipelineStateCreateInfo, PipelineStateDescriptor, PipelineStateDescriptorCache,
    PipelineStateDescriptorType, RasterizerStateCreateInfo, RenderTargetBindingCreateInfo,
    VertexAttributeLayoutCreateInfo,
};
use crate::presentation::{PresentationLayer, SwapChainCreateInfo};
use crate::resource::{
    validate_buffer_create_info, validate_texture_create_info, GpuBuffer, GpuBufferCreateInfo,
    GpuMemoryAccessFlags, GpuNativeHandle, GpuRenderTarget, GpuResource, GpuResourceBaseType,
    GpuResourceCore, GpuResourceId, GpuResourceObserver, GpuSampler, GpuShader,
    GpuShaderCreateInfo, GpuShaderId, GpuTexture, ResourceMemoryInfo, SamplerCreateInfo,
    ShaderStage, TextureCreateInfo, TextureUsage,
};
use crate::root_signature::{RootSignature, RootSignatureDesc};
use crate::settings::{
    GciSettings, GpuDeviceCreateInfo, GpuDriverConfigFlags, MAX_FRAME_QUEUE_SIZE,
    MIN_FRAME_QUEUE_SIZE,
};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, Weak};

/// A logical GPU device.
///
/// Owns the memory heaps and pools, the pipeline state cache and the command
/// system, and is the factory of every resource. All factories validate their
/// create info and fail with an error instead of returning an unusable object.
pub struct GpuDevice {
    self_ref: Weak<GpuDevice>,
    backend: Box<dyn GpuDeviceBackend>,
    adapter_info: GraphicsAdapterInfo,
    label: Option<String>,
    config_flags: GpuDriverConfigFlags,
    settings: GciSettings,
    heaps: Vec<Arc<GpuMemoryHeap>>,
    pools: Vec<Arc<GpuMemoryPool>>,
    pipeline_cache: PipelineStateDescriptorCache,
    command_system: OnceLock<Mutex<CommandSystem>>,
    shaders: Mutex<HashMap<GpuShaderId, Weak<GpuShader>>>,
    events: EventBus<GpuDeviceEvent>,
    next_resource_id: AtomicU64,
    next_shader_id: AtomicU64,
}

impl fmt::Debug for GpuDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GpuDevice")
            .field("label", &self.label)
            .field("adapter", &self.adapter_info.name)
            .field("backend_type", &self.adapter_info.backend_type)
            .field("config_flags", &self.config_flags)
            .field("pools", &self.pools.len())
            .field("pipeline_cache", &self.pipeline_cache)
            .finish()
    }
}

impl GpuDevice {
    pub(crate) fn new(
        backend: Box<dyn GpuDeviceBackend>,
        create_info: &GpuDeviceCreateInfo,
        config_flags: GpuDriverConfigFlags,
    ) -> Arc<Self> {
        let heaps: Vec<Arc<GpuMemoryHeap>> = create_info
            .settings
            .heaps
            .iter()
            .enumerate()
            .map(|(index, desc)| Arc::new(GpuMemoryHeap::new(GpuMemoryHeapId(index as u32), desc)))
            .collect();
        let pools = heaps
            .iter()
            .map(|heap| Arc::new(GpuMemoryPool::new(heap.label(), heap.clone())))
            .collect();
        let adapter_info = backend.adapter_info();
        Arc::new_cyclic(|self_ref| Self {
            self_ref: self_ref.clone(),
            backend,
            adapter_info,
            label: create_info.label.clone(),
            config_flags,
            settings: create_info.settings.clone(),
            heaps,
            pools,
            pipeline_cache: PipelineStateDescriptorCache::new(),
            command_system: OnceLock::new(),
            shaders: Mutex::new(HashMap::new()),
            events: EventBus::new(),
            next_resource_id: AtomicU64::new(1),
            next_shader_id: AtomicU64::new(1),
        })
    }

    /// The debug label of the device.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// The adapter the device runs on.
    pub fn adapter_info(&self) -> &GraphicsAdapterInfo {
        &self.adapter_info
    }

    /// The native API of the device.
    pub fn backend_type(&self) -> GraphicsBackendType {
        self.adapter_info.backend_type
    }

    /// The effective config flags.
    pub fn config_flags(&self) -> GpuDriverConfigFlags {
        self.config_flags
    }

    /// The settings the device was created with.
    pub fn settings(&self) -> &GciSettings {
        &self.settings
    }

    /// The backend hooks.
    pub fn backend(&self) -> &dyn GpuDeviceBackend {
        self.backend.as_ref()
    }

    /// Returns `true` if resources report their active-ref count reaching zero.
    pub fn is_resource_tracking_enabled(&self) -> bool {
        self.config_flags
            .contains(GpuDriverConfigFlags::RESOURCE_ACTIVE_REF_TRACKING)
    }

    /// The memory heaps of the device.
    pub fn heaps(&self) -> &[Arc<GpuMemoryHeap>] {
        &self.heaps
    }

    /// The memory pools, one per heap and named after it.
    pub fn pools(&self) -> &[Arc<GpuMemoryPool>] {
        &self.pools
    }

    /// The pool named `name`.
    pub fn pool(&self, name: &str) -> Option<&Arc<GpuMemoryPool>> {
        self.pools.iter().find(|pool| pool.name() == name)
    }

    /// A snapshot of the pool accounting.
    pub fn memory_stats(&self) -> GpuMemoryStats {
        GpuMemoryStats::capture(&self.pools)
    }

    /// The pipeline state cache.
    pub fn pipeline_cache(&self) -> &PipelineStateDescriptorCache {
        &self.pipeline_cache
    }

    /// The device event bus.
    pub fn events(&self) -> &EventBus<GpuDeviceEvent> {
        &self.events
    }

    /// A receiver of device events.
    pub fn subscribe_events(&self) -> flume::Receiver<GpuDeviceEvent> {
        self.events.subscribe()
    }

    /// Creates the command system and the default queues.
    ///
    /// `Present` aliases `DefaultGraphics`. With `MULTI_QUEUE`, `AsyncCompute`
    /// and `Transfer` get their own queues; otherwise they alias the graphics
    /// queue as well. Must run exactly once.
    pub fn initialize_command_system(&self) -> Result<(), CommandError> {
        if self.command_system.get().is_some() {
            log::error!("The command system of this device is already initialized.");
            debug_assert!(false, "initialize_command_system called twice");
            return Ok(());
        }
        let mut system = CommandSystem::with_default_queues(self.backend.command_backend())?;
        if self.config_flags.contains(GpuDriverConfigFlags::MULTI_QUEUE) {
            system.initialize_device_queue(GpuQueueId::AsyncCompute, CommandListType::Compute)?;
            system.initialize_device_queue(GpuQueueId::Transfer, CommandListType::Copy)?;
        } else {
            system.alias_device_queue(GpuQueueId::AsyncCompute, GpuQueueId::DefaultGraphics)?;
            system.alias_device_queue(GpuQueueId::Transfer, GpuQueueId::DefaultGraphics)?;
        }
        if self.command_system.set(Mutex::new(system)).is_err() {
            log::error!("The command system was initialized concurrently.");
        }
        log::info!("Command system initialized.");
        Ok(())
    }

    /// Locks the command system.
    ///
    /// Contexts are acquired, executed and released through the returned guard.
    pub fn command_system(&self) -> Result<MutexGuard<'_, CommandSystem>, ResourceError> {
        self.command_system
            .get()
            .map(|system| system.lock().unwrap_or_else(|poisoned| poisoned.into_inner()))
            .ok_or(ResourceError::CommandSystemUnavailable)
    }

    fn next_resource_id(&self) -> GpuResourceId {
        GpuResourceId(self.next_resource_id.fetch_add(1, Ordering::Relaxed))
    }

    fn new_resource_core(
        &self,
        base_type: GpuResourceBaseType,
        label: Option<&str>,
        memory_info: ResourceMemoryInfo,
    ) -> GpuResourceCore {
        let core = GpuResourceCore::new(
            self.next_resource_id(),
            base_type,
            label.map(str::to_string),
            memory_info,
        );
        if self.is_resource_tracking_enabled() {
            let observer: Weak<dyn GpuResourceObserver> = self.self_ref.clone();
            core.with_observer(observer)
        } else {
            core
        }
    }

    /// Picks the pool backing memory accessed as `access`.
    ///
    /// CPU-read memory prefers a GPU-coherent CPU-visible heap, CPU-write memory
    /// a CPU-coherent one, and GPU-only memory a device-local heap.
    fn select_pool(&self, access: GpuMemoryAccessFlags) -> Result<&Arc<GpuMemoryPool>, ResourceError> {
        let preferred = if access.contains(GpuMemoryAccessFlags::CPU_READ) {
            GpuMemoryHeapFlags::CPU_VISIBLE | GpuMemoryHeapFlags::GPU_COHERENT
        } else if access.contains(GpuMemoryAccessFlags::CPU_WRITE) {
            GpuMemoryHeapFlags::CPU_VISIBLE | GpuMemoryHeapFlags::CPU_COHERENT
        } else {
            GpuMemoryHeapFlags::DEVICE_LOCAL
        };
        let required = if access.is_cpu_accessible() {
            GpuMemoryHeapFlags::CPU_VISIBLE
        } else {
            GpuMemoryHeapFlags::empty()
        };
        self.pools
            .iter()
            .find(|pool| pool.heap().flags().contains(preferred))
            .or_else(|| {
                self.pools
                    .iter()
                    .find(|pool| pool.heap().flags().contains(required))
            })
            .ok_or_else(|| {
                ResourceError::InvalidCreateInfo(format!("no memory heap can back {access:?}"))
            })
    }

    fn reserve_memory(
        &self,
        pool: &Arc<GpuMemoryPool>,
        bytes: u64,
        alignment: u64,
        access: GpuMemoryAccessFlags,
    ) -> Result<ResourceMemoryInfo, ResourceError> {
        let _structural = pool.lock_exclusive();
        let offset = pool.reserve(bytes).ok_or_else(|| {
            log::warn!(
                "Pool '{}' cannot fit {} more bytes ({} available).",
                pool.name(),
                bytes,
                pool.available()
            );
            ResourceError::OutOfMemory {
                pool: pool.name().to_string(),
                requested: bytes,
            }
        })?;
        Ok(ResourceMemoryInfo {
            memory: Some(GpuMemoryRef::new(
                pool.clone(),
                GpuMemoryRegion::new(offset, bytes),
            )),
            base_alignment: alignment,
            access_flags: access,
            heap_flags: pool.heap().flags(),
        })
    }

    /// Creates a buffer.
    ///
    /// The create info is completed with defaults first. Its size is accounted
    /// in the pool matching its memory access, then the backend creates the
    /// native buffer and uploads any init data.
    pub fn create_buffer(&self, info: &GpuBufferCreateInfo<'_>) -> Result<Arc<GpuBuffer>, ResourceError> {
        let mut info = info.clone();
        if !validate_buffer_create_info(&mut info, self.settings.effective_buffer_alignment()) {
            return Err(ResourceError::InvalidCreateInfo(format!(
                "buffer '{}' was rejected",
                info.label.as_deref().unwrap_or("unnamed")
            )));
        }
        if info.memory_access.contains(GpuMemoryAccessFlags::PERSISTENT_MAP)
            && !self
                .config_flags
                .contains(GpuDriverConfigFlags::PERSISTENT_MAPPING)
        {
            log::warn!(
                "Buffer '{}': persistent mapping is disabled on this device.",
                info.label.as_deref().unwrap_or("unnamed")
            );
            info.memory_access.remove(GpuMemoryAccessFlags::PERSISTENT_MAP);
        }

        let pool = self.select_pool(info.memory_access)?;
        let reserved = info
            .buffer_size
            .checked_next_multiple_of(info.alignment)
            .and_then(|size| pool.heap().align_up(size))
            .ok_or_else(|| oversized(pool, info.buffer_size))?;
        let memory_info = self.reserve_memory(pool, reserved, info.alignment, info.memory_access)?;
        let core = self.new_resource_core(
            GpuResourceBaseType::Buffer,
            info.label.as_deref(),
            memory_info,
        );
        let backend = self.backend.create_buffer(&info, core.memory_info())?;
        let buffer = GpuBuffer::new(core, info.buffer_size, info.bind_flags, backend);
        log::debug!(
            "Created buffer {:?} ({} bytes in '{}').",
            buffer.id(),
            buffer.byte_size(),
            pool.name()
        );
        Ok(Arc::new(buffer))
    }

    /// Creates a texture in device-local memory.
    pub fn create_texture(&self, info: &TextureCreateInfo<'_>) -> Result<Arc<GpuTexture>, ResourceError> {
        let mut info = info.clone();
        if !validate_texture_create_info(&mut info) {
            return Err(ResourceError::InvalidCreateInfo(format!(
                "texture '{}' was rejected",
                info.label.as_deref().unwrap_or("unnamed")
            )));
        }
        let access = GpuMemoryAccessFlags::GPU_READ | GpuMemoryAccessFlags::GPU_WRITE;
        let pool = self.select_pool(access)?;
        let alignment = pool.heap().base_alignment();
        let estimated = info.estimated_byte_size().unwrap_or(u64::MAX);
        let reserved = pool
            .heap()
            .align_up(estimated)
            .ok_or_else(|| oversized(pool, estimated))?;
        let memory_info = self.reserve_memory(pool, reserved, alignment, access)?;
        let core = self.new_resource_core(
            GpuResourceBaseType::Texture,
            info.label.as_deref(),
            memory_info,
        );
        let backend = self.backend.create_texture(&info)?;
        let texture = GpuTexture::new(core, &info, backend);
        log::debug!("Created texture {:?} ({:?}).", texture.id(), texture.size());
        Ok(Arc::new(texture))
    }

    /// Creates a texture together with its render-target or depth-stencil view.
    ///
    /// The usage must include `RENDER_TARGET` for color formats and
    /// `DEPTH_STENCIL` for depth formats.
    pub fn create_render_target_texture(
        &self,
        info: &TextureCreateInfo<'_>,
    ) -> Result<GpuRenderTarget, ResourceError> {
        let required = if info.format.is_depth_stencil() {
            TextureUsage::DEPTH_STENCIL
        } else {
            TextureUsage::RENDER_TARGET
        };
        if !info.usage.contains(required) {
            return Err(ResourceError::InvalidCreateInfo(format!(
                "render target '{}' needs {:?} usage",
                info.label.as_deref().unwrap_or("unnamed"),
                required
            )));
        }
        let texture = self.create_texture(info)?;
        let view = self.backend.create_render_target_view(&texture)?;
        Ok(GpuRenderTarget {
            native: texture.native_handle(),
            view,
            format: texture.format(),
            size: texture.size(),
            texture: Some(texture),
        })
    }

    /// Wraps shader bytecode. The bytecode is not inspected.
    pub fn create_shader(&self, info: &GpuShaderCreateInfo<'_>) -> Result<Arc<GpuShader>, ResourceError> {
        if info.bytecode.is_empty() || info.entry_point.is_empty() {
            return Err(ResourceError::InvalidCreateInfo(format!(
                "shader '{}' has no bytecode or entry point",
                info.label.unwrap_or("unnamed")
            )));
        }
        let native = self.backend.create_shader(info)?;
        let id = GpuShaderId(self.next_shader_id.fetch_add(1, Ordering::Relaxed));
        let shader = Arc::new(GpuShader::new(id, native, info));
        let mut shaders = self
            .shaders
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        shaders.retain(|_, weak| weak.strong_count() > 0);
        shaders.insert(id, Arc::downgrade(&shader));
        Ok(shader)
    }

    /// Looks up a live shader created by this device.
    pub fn shader(&self, id: GpuShaderId) -> Option<Arc<GpuShader>> {
        self.shaders
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&id)
            .and_then(Weak::upgrade)
    }

    /// Creates a sampler.
    pub fn create_sampler(&self, info: &SamplerCreateInfo<'_>) -> Result<Arc<GpuSampler>, ResourceError> {
        let native = self.backend.create_sampler(info)?;
        Ok(Arc::new(GpuSampler::new(native, info)))
    }

    fn create_state<T>(&self, info: &T) -> Result<Arc<PipelineStateDescriptor<T>>, PipelineError>
    where
        T: PipelineStateCreateInfo<Compiled = ()>,
    {
        self.pipeline_cache.get_or_create(info, |info, hash| {
            Ok(PipelineStateDescriptor::new(
                hash,
                info.clone(),
                (),
                GpuNativeHandle::default(),
            ))
        })
    }

    /// Returns the cached blend state for `info`.
    pub fn create_blend_state(
        &self,
        info: &BlendStateCreateInfo,
    ) -> Result<Arc<PipelineStateDescriptor<BlendStateCreateInfo>>, PipelineError> {
        self.create_state(info)
    }

    /// Returns the cached depth-stencil state for `info`.
    pub fn create_depth_stencil_state(
        &self,
        info: &DepthStencilStateCreateInfo,
    ) -> Result<Arc<PipelineStateDescriptor<DepthStencilStateCreateInfo>>, PipelineError> {
        self.create_state(info)
    }

    /// Returns the cached rasterizer state for `info`.
    pub fn create_rasterizer_state(
        &self,
        info: &RasterizerStateCreateInfo,
    ) -> Result<Arc<PipelineStateDescriptor<RasterizerStateCreateInfo>>, PipelineError> {
        self.create_state(info)
    }

    /// Returns the cached vertex attribute layout for `info`.
    pub fn create_vertex_attribute_layout(
        &self,
        info: &VertexAttributeLayoutCreateInfo,
    ) -> Result<Arc<PipelineStateDescriptor<VertexAttributeLayoutCreateInfo>>, PipelineError> {
        self.create_state(info)
    }

    /// Returns the cached render target binding for `info`.
    pub fn create_render_target_binding(
        &self,
        info: &RenderTargetBindingCreateInfo,
    ) -> Result<Arc<PipelineStateDescriptor<RenderTargetBindingCreateInfo>>, PipelineError> {
        self.create_state(info)
    }

    /// Compiles `desc` and translates it into the backend binding model, or
    /// returns the cached result.
    pub fn create_root_signature(
        &self,
        desc: &RootSignatureDesc,
    ) -> Result<Arc<PipelineStateDescriptor<RootSignatureDesc>>, PipelineError> {
        self.pipeline_cache.get_or_create(desc, |desc, hash| {
            let compiled = RootSignature::compile(desc)?;
            let native = self.backend.translate_root_signature(&compiled)?;
            Ok(PipelineStateDescriptor::new(hash, desc.clone(), compiled, native))
        })
    }

    fn check_shader_stage(
        &self,
        label: Option<&str>,
        id: GpuShaderId,
        expected: ShaderStage,
    ) -> Result<(), PipelineError> {
        let details = match self.shader(id) {
            Some(shader) if shader.stage() == expected => return Ok(()),
            Some(shader) => format!(
                "{id:?} is a {:?} shader, expected {expected:?}",
                shader.stage()
            ),
            None => format!("{id:?} is not a live shader of this device"),
        };
        Err(PipelineError::ShaderStageMismatch {
            pipeline_label: label.map(str::to_string),
            details,
        })
    }

    /// Creates a graphics pipeline, or returns the cached one.
    ///
    /// Each sub-state and the root signature go through the cache on their
    /// own, so pipelines sharing them share their descriptors.
    pub fn create_graphics_pipeline_state_object(
        &self,
        info: &GraphicsPipelineStateObjectCreateInfo,
    ) -> Result<Arc<PipelineStateDescriptor<GraphicsPipelineStateObjectCreateInfo>>, PipelineError>
    {
        self.pipeline_cache.get_or_create(info, |info, hash| {
            let shaders = &info.shaders;
            self.check_shader_stage(info.label.as_deref(), shaders.vertex, ShaderStage::Vertex)?;
            let optional = [
                (shaders.hull, ShaderStage::Hull),
                (shaders.domain, ShaderStage::Domain),
                (shaders.geometry, ShaderStage::Geometry),
                (shaders.pixel, ShaderStage::Pixel),
            ];
            for (id, stage) in optional
                .into_iter()
                .filter_map(|(id, stage)| Some((id?, stage)))
            {
                self.check_shader_stage(info.label.as_deref(), id, stage)?;
            }

            let bindings = GraphicsPipelineBindings {
                blend: self.create_blend_state(&info.blend)?,
                depth_stencil: self.create_depth_stencil_state(&info.depth_stencil)?,
                rasterizer: self.create_rasterizer_state(&info.rasterizer)?,
                vertex_layout: self.create_vertex_attribute_layout(&info.vertex_layout)?,
                render_targets: self.create_render_target_binding(&info.render_targets)?,
                root_signature: self.create_root_signature(&info.root_signature)?,
            };
            let native = self
                .backend
                .create_graphics_pipeline(info, &bindings)
                .map_err(|err| {
                    log::error!(
                        "Graphics pipeline '{}' failed: {err}",
                        info.label.as_deref().unwrap_or("unnamed")
                    );
                    err
                })?;
            Ok(PipelineStateDescriptor::new(hash, info.clone(), bindings, native))
        })
    }

    /// Creates a compute pipeline, or returns the cached one.
    pub fn create_compute_pipeline_state_object(
        &self,
        info: &ComputePipelineStateObjectCreateInfo,
    ) -> Result<Arc<PipelineStateDescriptor<ComputePipelineStateObjectCreateInfo>>, PipelineError>
    {
        self.pipeline_cache.get_or_create(info, |info, hash| {
            self.check_shader_stage(info.label.as_deref(), info.shader, ShaderStage::Compute)?;
            let bindings = ComputePipelineBindings {
                root_signature: self.create_root_signature(&info.root_signature)?,
            };
            let native = self.backend.create_compute_pipeline(info, &bindings)?;
            Ok(PipelineStateDescriptor::new(hash, info.clone(), bindings, native))
        })
    }

    /// The number of cached descriptors of one kind.
    pub fn cached_pipeline_states(&self, descriptor_type: PipelineStateDescriptorType) -> usize {
        self.pipeline_cache.len_of(descriptor_type)
    }

    /// Creates a swap chain and its frame ring on the present queue.
    ///
    /// A zero buffer count takes the configured frame queue size; any count is
    /// clamped to the supported range. Tearing is only requested when the
    /// device allows it.
    pub fn create_presentation_layer(
        &self,
        info: &SwapChainCreateInfo,
    ) -> Result<PresentationLayer, PresentError> {
        let buffer_count = match info.buffer_count {
            0 => self.settings.clamped_frame_queue_size(),
            count => count.clamp(MIN_FRAME_QUEUE_SIZE, MAX_FRAME_QUEUE_SIZE),
        };
        let info = SwapChainCreateInfo {
            buffer_count,
            allow_tearing: info.allow_tearing
                && self.config_flags.contains(GpuDriverConfigFlags::ALLOW_TEARING),
            ..*info
        };
        let queue = self
            .command_system()
            .ok()
            .and_then(|system| system.native_queue(GpuQueueId::Present))
            .ok_or(PresentError::Command(CommandError::UnknownQueue(
                GpuQueueId::Present,
            )))?;
        let swap_chain = self.backend.create_swap_chain(&info)?;
        let fence = self
            .backend
            .create_fence(0)
            .ok_or(PresentError::FenceCreationFailed)?;
        PresentationLayer::new(swap_chain, fence, queue, self.settings.fence_wait_timeout())
    }
}

impl GpuResourceObserver for GpuDevice {
    fn on_gpu_resource_active_refs_zero(&self, resource: &GpuResourceCore) {
        log::debug!(
            "Resource {:?} ('{}') has no active refs left.",
            resource.id(),
            resource.label().unwrap_or("unnamed")
        );
        self.events.publish(GpuDeviceEvent::ResourceActiveRefsZero {
            id: resource.id(),
            base_type: resource.base_type(),
        });
    }
}

fn oversized(pool: &GpuMemoryPool, requested: u64) -> ResourceError {
    log::warn!(
        "Pool '{}': a request of {} bytes overflows once aligned.",
        pool.name(),
        requested
    );
    ResourceError::OutOfMemory {
        pool: pool.name().to_string(),
        requested,
    }
}
