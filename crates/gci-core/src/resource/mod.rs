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

//! GPU resources: lifetime tracking, CPU mapping and sub-region referencing.
//!
//! Every resource embeds a [`GpuResourceCore`] holding its identity, its memory
//! binding, an atomic count of dependent references and its current CPU mapping.
//! Concrete variants ([`GpuBuffer`], [`GpuTexture`]) add their own layout and
//! forward the native work to a backend hook object.

pub(crate) mod buffer;
mod buffer_reference;
mod sampler;
mod shader;
mod texture;
pub mod utils;

pub use self::buffer::{
    validate_buffer_create_info, GpuBuffer, GpuBufferBackend, GpuBufferBindFlags,
    GpuBufferCreateInfo, DEFAULT_BUFFER_ALIGNMENT,
};
pub use self::buffer_reference::GpuBufferReference;
pub use self::sampler::{AddressMode, FilterMode, GpuSampler, SamplerCreateInfo};
pub use self::shader::{GpuShader, GpuShaderCreateInfo, GpuShaderId, ShaderStage, ShaderStageFlags};
pub use self::texture::{
    validate_texture_create_info, Extent3D, GpuRenderTarget, GpuTexture, GpuTextureBackend,
    TextureCreateInfo, TextureDimension, TextureFormat, TextureUsage,
};

use crate::memory::{GpuMemoryHeapFlags, GpuMemoryRef, GpuMemoryRegion};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::ptr::NonNull;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard, Weak};

/// Identifies a resource within one device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GpuResourceId(pub u64);

/// An opaque handle to a backend object (native resource, pipeline, queue...).
///
/// The core never interprets the value; only the backend that issued it does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GpuNativeHandle(pub u64);

/// An opaque handle to a backend view descriptor (RTV, DSV, SRV...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GpuDescriptorHandle(pub u64);

/// The concrete kind behind a [`GpuResource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GpuResourceBaseType {
    /// A linear buffer.
    Buffer,
    /// A texture or render target.
    Texture,
}

bitflags! {
    /// How a resource's memory may be accessed. Also used as the access mode of map requests.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct GpuMemoryAccessFlags: u32 {
        /// The CPU may read mapped memory.
        const CPU_READ = 1 << 0;
        /// The CPU may write mapped memory.
        const CPU_WRITE = 1 << 1;
        /// Shaders may read the resource.
        const GPU_READ = 1 << 2;
        /// Shaders may write the resource.
        const GPU_WRITE = 1 << 3;
        /// The resource may stay mapped while in use by the GPU.
        const PERSISTENT_MAP = 1 << 4;
        /// CPU read and write.
        const CPU_READ_WRITE = Self::CPU_READ.bits() | Self::CPU_WRITE.bits();
    }
}

impl GpuMemoryAccessFlags {
    /// Returns `true` if any CPU access bit is set.
    pub fn is_cpu_accessible(&self) -> bool {
        self.intersects(Self::CPU_READ | Self::CPU_WRITE)
    }
}

/// The usage state a resource is in, for barrier transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GpuResourceState {
    /// No particular usage.
    Common,
    /// Owned by the presentation engine.
    Present,
    /// Bound as a color render target.
    RenderTarget,
    /// Bound as a writable depth-stencil target.
    DepthWrite,
    /// Bound as a read-only depth-stencil target.
    DepthRead,
    /// Read by shaders.
    ShaderResource,
    /// Read and written by shaders.
    UnorderedAccess,
    /// Source of a copy.
    CopySource,
    /// Destination of a copy.
    CopyDest,
    /// Bound as a vertex or constant buffer.
    VertexAndConstantBuffer,
    /// Bound as an index buffer.
    IndexBuffer,
}

/// Where a resource's memory comes from and how it may be accessed.
#[derive(Debug, Default)]
pub struct ResourceMemoryInfo {
    /// The pool sub-range backing the resource, if the device accounted one.
    pub memory: Option<GpuMemoryRef>,
    /// The alignment the resource was created with.
    pub base_alignment: u64,
    /// The declared access flags.
    pub access_flags: GpuMemoryAccessFlags,
    /// The capabilities of the heap the memory was drawn from.
    pub heap_flags: GpuMemoryHeapFlags,
}

/// The current CPU mapping of a resource.
///
/// Valid iff the pointer is non-null and the mapped region is non-empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct GpuMappedMemory {
    pointer: Option<NonNull<u8>>,
    region: GpuMemoryRegion,
    flags: GpuMemoryAccessFlags,
}

// SAFETY: the pointer is only an address into backend-owned memory. The core never
// dereferences it without holding the owning resource, and access to the mapping
// slot itself is serialized by the resource's mutex.
unsafe impl Send for GpuMappedMemory {}
// SAFETY: see the `Send` impl above.
unsafe impl Sync for GpuMappedMemory {}

impl GpuMappedMemory {
    /// Describes a mapping of `region` starting at `pointer`.
    pub fn new(pointer: NonNull<u8>, region: GpuMemoryRegion, flags: GpuMemoryAccessFlags) -> Self {
        Self {
            pointer: Some(pointer),
            region,
            flags,
        }
    }

    /// The unmapped state.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The start of the mapping, pointing at byte `region().offset` of the resource.
    pub fn pointer(&self) -> Option<NonNull<u8>> {
        self.pointer
    }

    /// The resource range that is mapped.
    pub fn region(&self) -> GpuMemoryRegion {
        self.region
    }

    /// The access the mapping was requested with.
    pub fn flags(&self) -> GpuMemoryAccessFlags {
        self.flags
    }

    /// Returns `true` if this describes a live mapping.
    pub fn is_valid(&self) -> bool {
        self.pointer.is_some() && !self.region.is_empty()
    }
}

/// Receives advisory lifecycle notifications from resources.
///
/// Implemented by the device. A notification never destroys anything; final
/// destruction stays with the owner of the resource.
pub trait GpuResourceObserver: Send + Sync {
    /// Called when a resource's active-ref counter returns to zero.
    fn on_gpu_resource_active_refs_zero(&self, resource: &GpuResourceCore);
}

/// State shared by every resource variant.
#[derive(Debug)]
pub struct GpuResourceCore {
    id: GpuResourceId,
    base_type: GpuResourceBaseType,
    label: Option<String>,
    memory_info: ResourceMemoryInfo,
    active_refs: AtomicU32,
    mapped: Mutex<GpuMappedMemory>,
    observer: Option<Weak<dyn GpuResourceObserver>>,
}

impl GpuResourceCore {
    /// Creates an untracked resource core.
    pub fn new(
        id: GpuResourceId,
        base_type: GpuResourceBaseType,
        label: Option<String>,
        memory_info: ResourceMemoryInfo,
    ) -> Self {
        Self {
            id,
            base_type,
            label,
            memory_info,
            active_refs: AtomicU32::new(0),
            mapped: Mutex::new(GpuMappedMemory::empty()),
            observer: None,
        }
    }

    /// Enables active-ref tracking: `observer` is notified whenever the counter returns to zero.
    pub fn with_observer(mut self, observer: Weak<dyn GpuResourceObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// The identifier of this resource.
    pub fn id(&self) -> GpuResourceId {
        self.id
    }

    /// The concrete kind of this resource.
    pub fn base_type(&self) -> GpuResourceBaseType {
        self.base_type
    }

    /// The debug label, if any.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// The memory binding of this resource.
    pub fn memory_info(&self) -> &ResourceMemoryInfo {
        &self.memory_info
    }

    /// Returns `true` if zero-ref notifications are delivered for this resource.
    pub fn is_tracked(&self) -> bool {
        self.observer.is_some()
    }

    /// The number of live dependent references.
    pub fn active_refs(&self) -> u32 {
        self.active_refs.load(Ordering::Acquire)
    }

    /// Registers one more dependent reference. Returns the new count.
    pub fn add_active_ref(&self) -> u32 {
        self.active_refs.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Drops one dependent reference. Returns the new count.
    ///
    /// Reaching zero notifies the observer when tracking is enabled.
    pub fn release_active_ref(&self) -> u32 {
        let previous = self
            .active_refs
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| {
                count.checked_sub(1)
            });
        match previous {
            Ok(1) => {
                if let Some(observer) = self.observer.as_ref().and_then(Weak::upgrade) {
                    observer.on_gpu_resource_active_refs_zero(self);
                }
                0
            }
            Ok(count) => count - 1,
            Err(_) => {
                log::warn!(
                    "Resource {:?}: active ref released while the counter is already zero.",
                    self.id
                );
                debug_assert!(false, "unbalanced release_active_ref");
                0
            }
        }
    }

    /// The mapping slot itself. Checks and updates made under one guard are atomic.
    pub(crate) fn mapped_slot(&self) -> MutexGuard<'_, GpuMappedMemory> {
        self.mapped
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Records the current CPU mapping.
    pub fn set_mapped_memory(&self, mapped: GpuMappedMemory) {
        *self.mapped_slot() = mapped;
    }

    /// Clears the current CPU mapping.
    pub fn reset_mapped_memory(&self) {
        *self.mapped_slot() = GpuMappedMemory::empty();
    }

    /// The current CPU mapping.
    pub fn mapped_memory(&self) -> GpuMappedMemory {
        *self.mapped_slot()
    }

    /// Returns `true` if any part of the resource is mapped.
    pub fn is_mapped(&self) -> bool {
        self.mapped_slot().is_valid()
    }

    /// Returns `true` if `region` lies within the currently mapped range.
    pub fn is_mapped_region(&self, region: GpuMemoryRegion) -> bool {
        let mapped = self.mapped_slot();
        mapped.is_valid() && mapped.region.contains(&region)
    }
}

impl Drop for GpuResourceCore {
    fn drop(&mut self) {
        if let Some(memory) = &self.memory_info.memory {
            let _structural = memory.pool().lock_exclusive();
            memory.pool().release(memory.region().size);
        }
    }
}

/// A GPU resource, abstract over its variant.
pub trait GpuResource: Send + Sync {
    /// The shared state of this resource.
    fn resource_core(&self) -> &GpuResourceCore;

    /// The backend object behind this resource.
    fn native_handle(&self) -> GpuNativeHandle;

    /// The identifier of this resource.
    fn id(&self) -> GpuResourceId {
        self.resource_core().id()
    }

    /// The concrete kind of this resource.
    fn base_type(&self) -> GpuResourceBaseType {
        self.resource_core().base_type()
    }

    /// Registers one more dependent reference.
    fn add_active_ref(&self) -> u32 {
        self.resource_core().add_active_ref()
    }

    /// Drops one dependent reference.
    fn release_active_ref(&self) -> u32 {
        self.resource_core().release_active_ref()
    }

    /// The number of live dependent references.
    fn active_refs(&self) -> u32 {
        self.resource_core().active_refs()
    }

    /// Returns `true` if any part of the resource is mapped.
    fn is_mapped(&self) -> bool {
        self.resource_core().is_mapped()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[derive(Default)]
    struct CountingObserver {
        notified: AtomicUsize,
    }

    impl GpuResourceObserver for CountingObserver {
        fn on_gpu_resource_active_refs_zero(&self, _resource: &GpuResourceCore) {
            self.notified.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn tracked_core(observer: &Arc<CountingObserver>) -> GpuResourceCore {
        let weak: Weak<dyn GpuResourceObserver> = Arc::downgrade(observer) as Weak<CountingObserver>;
        GpuResourceCore::new(
            GpuResourceId(1),
            GpuResourceBaseType::Buffer,
            None,
            ResourceMemoryInfo::default(),
        )
        .with_observer(weak)
    }

    #[test]
    fn balanced_refs_notify_once_at_last_release() {
        let observer = Arc::new(CountingObserver::default());
        let core = tracked_core(&observer);
        const K: u32 = 5;
        for i in 1..=K {
            assert_eq!(core.add_active_ref(), i);
        }
        for i in (0..K).rev() {
            assert_eq!(observer.notified.load(Ordering::SeqCst), 0);
            assert_eq!(core.release_active_ref(), i);
        }
        assert_eq!(core.active_refs(), 0);
        assert_eq!(observer.notified.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn untracked_core_never_notifies() {
        let core = GpuResourceCore::new(
            GpuResourceId(2),
            GpuResourceBaseType::Texture,
            Some("untracked".to_string()),
            ResourceMemoryInfo::default(),
        );
        core.add_active_ref();
        assert_eq!(core.release_active_ref(), 0);
        assert!(!core.is_tracked());
    }

    #[test]
    fn concurrent_refs_balance_out() {
        let observer = Arc::new(CountingObserver::default());
        let core = Arc::new(tracked_core(&observer));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let core = core.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        core.add_active_ref();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(core.active_refs(), 4000);
        for _ in 0..4000 {
            core.release_active_ref();
        }
        assert_eq!(core.active_refs(), 0);
        assert_eq!(observer.notified.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn mapped_iff_pointer_and_region() {
        let core = GpuResourceCore::new(
            GpuResourceId(3),
            GpuResourceBaseType::Buffer,
            None,
            ResourceMemoryInfo::default(),
        );
        let mut backing = [0u8; 64];
        let ptr = NonNull::new(backing.as_mut_ptr()).unwrap();

        assert!(!core.is_mapped());
        core.set_mapped_memory(GpuMappedMemory::new(
            ptr,
            GpuMemoryRegion::new(0, 0),
            GpuMemoryAccessFlags::CPU_WRITE,
        ));
        assert!(!core.is_mapped());

        core.set_mapped_memory(GpuMappedMemory::new(
            ptr,
            GpuMemoryRegion::new(16, 32),
            GpuMemoryAccessFlags::CPU_WRITE,
        ));
        assert!(core.is_mapped());
        assert!(core.is_mapped_region(GpuMemoryRegion::new(16, 32)));
        assert!(core.is_mapped_region(GpuMemoryRegion::new(20, 8)));
        assert!(!core.is_mapped_region(GpuMemoryRegion::new(8, 16)));

        core.reset_mapped_memory();
        assert!(!core.is_mapped());
    }
}
