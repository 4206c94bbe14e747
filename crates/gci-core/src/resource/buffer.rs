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

//! Defines data structures related to GPU buffer resources.

use super::utils::check_buffer_region;
use super::{
    GpuMappedMemory, GpuMemoryAccessFlags, GpuNativeHandle, GpuResource, GpuResourceCore,
};
use crate::memory::GpuMemoryRegion;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::ptr::NonNull;

/// The alignment a buffer gets when its create info leaves it at zero.
pub const DEFAULT_BUFFER_ALIGNMENT: u64 = 256;

bitflags! {
    /// A set of flags describing how a [`GpuBuffer`] may be bound.
    ///
    /// Backends use them to pick native usage bits and to validate bindings at record time.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct GpuBufferBindFlags: u32 {
        /// The buffer can be bound as a vertex buffer.
        const VERTEX = 1 << 0;
        /// The buffer can be bound as an index buffer.
        const INDEX = 1 << 1;
        /// The buffer can be bound as a constant (uniform) buffer.
        const CONSTANT = 1 << 2;
        /// The buffer can be read by shaders as a structured or raw buffer.
        const SHADER_RESOURCE = 1 << 3;
        /// The buffer can be read and written by shaders.
        const UNORDERED_ACCESS = 1 << 4;
        /// The buffer can feed indirect draw or dispatch arguments.
        const INDIRECT = 1 << 5;
        /// The buffer can be the source of a copy.
        const COPY_SRC = 1 << 6;
        /// The buffer can be the destination of a copy or upload.
        const COPY_DST = 1 << 7;
    }
}

/// A descriptor used to create a [`GpuBuffer`].
#[derive(Debug, Clone, Default)]
pub struct GpuBufferCreateInfo<'a> {
    /// An optional debug label for the buffer.
    pub label: Option<Cow<'a, str>>,
    /// The total size of the buffer in bytes. Zero takes the size of `init_data`.
    pub buffer_size: u64,
    /// The placement alignment. Zero takes the platform default.
    pub alignment: u64,
    /// How the buffer may be bound.
    pub bind_flags: GpuBufferBindFlags,
    /// How the buffer memory may be accessed.
    pub memory_access: GpuMemoryAccessFlags,
    /// Bytes uploaded into the buffer at creation.
    pub init_data: Option<&'a [u8]>,
}

/// Fills in defaults and rejects unusable buffer create infos.
///
/// - a zero `alignment` becomes `default_alignment`;
/// - a zero `buffer_size` with non-empty `init_data` takes the init data's size.
///
/// Returns `false` if the size is still zero, the alignment is not a power of
/// two, or the init data does not fit.
pub fn validate_buffer_create_info(
    info: &mut GpuBufferCreateInfo<'_>,
    default_alignment: u64,
) -> bool {
    if info.alignment == 0 {
        info.alignment = default_alignment;
    }
    let init_len = info.init_data.map_or(0, |data| data.len() as u64);
    if info.buffer_size == 0 && init_len > 0 {
        info.buffer_size = init_len;
    }

    if info.buffer_size == 0 {
        log::warn!(
            "Buffer '{}': zero size and no init data.",
            info.label.as_deref().unwrap_or("unnamed")
        );
        return false;
    }
    if !info.alignment.is_power_of_two() {
        log::warn!(
            "Buffer '{}': alignment {} is not a power of two.",
            info.label.as_deref().unwrap_or("unnamed"),
            info.alignment
        );
        return false;
    }
    if init_len > info.buffer_size {
        log::warn!(
            "Buffer '{}': {} bytes of init data do not fit in {} bytes.",
            info.label.as_deref().unwrap_or("unnamed"),
            init_len,
            info.buffer_size
        );
        return false;
    }
    true
}

/// The native half of a [`GpuBuffer`], implemented once per backend.
///
/// Every region handed to these hooks has already been validated against the
/// buffer size and resolved (no "whole remaining" sentinel).
pub trait GpuBufferBackend: Send + Sync {
    /// The backend object behind the buffer.
    fn native_handle(&self) -> GpuNativeHandle;

    /// Maps `region` for CPU access and returns a pointer to its first byte.
    fn map_region(
        &self,
        region: GpuMemoryRegion,
        mode: GpuMemoryAccessFlags,
    ) -> Option<NonNull<u8>>;

    /// Releases the current mapping.
    fn unmap(&self);

    /// Makes CPU writes to `region` visible to the GPU.
    fn flush_mapped_region(&self, region: GpuMemoryRegion) -> bool;

    /// Makes GPU writes to `region` visible to the CPU.
    fn invalidate_region(&self, region: GpuMemoryRegion) -> bool;

    /// Writes `data` into `region` through a transient CPU mapping.
    fn update_sub_data_copy(&self, region: GpuMemoryRegion, data: &[u8]) -> bool;

    /// Writes `data` into `region` through a staging upload.
    fn update_sub_data_upload(&self, region: GpuMemoryRegion, data: &[u8]) -> bool;

    /// Returns the backend object as `Any`, for backends that need their concrete type back.
    fn as_any(&self) -> &dyn Any;
}

/// A linear GPU buffer.
pub struct GpuBuffer {
    core: GpuResourceCore,
    byte_size: u64,
    bind_flags: GpuBufferBindFlags,
    backend: Box<dyn GpuBufferBackend>,
}

impl fmt::Debug for GpuBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GpuBuffer")
            .field("core", &self.core)
            .field("byte_size", &self.byte_size)
            .field("bind_flags", &self.bind_flags)
            .field("backend", &self.backend.native_handle())
            .finish()
    }
}

impl GpuBuffer {
    /// Assembles a buffer from its shared state and its native half.
    pub fn new(
        core: GpuResourceCore,
        byte_size: u64,
        bind_flags: GpuBufferBindFlags,
        backend: Box<dyn GpuBufferBackend>,
    ) -> Self {
        Self {
            core,
            byte_size,
            bind_flags,
            backend,
        }
    }

    /// The size of the buffer in bytes.
    pub fn byte_size(&self) -> u64 {
        self.byte_size
    }

    /// How the buffer may be bound.
    pub fn bind_flags(&self) -> GpuBufferBindFlags {
        self.bind_flags
    }

    /// The declared memory access flags.
    pub fn memory_access(&self) -> GpuMemoryAccessFlags {
        self.core.memory_info().access_flags
    }

    /// The region `[0, byte_size)`.
    pub fn whole_buffer_region(&self) -> GpuMemoryRegion {
        GpuMemoryRegion::new(0, self.byte_size)
    }

    /// The native half of the buffer.
    pub fn backend(&self) -> &dyn GpuBufferBackend {
        self.backend.as_ref()
    }

    /// Checks whether `region` may be mapped with `mode`.
    ///
    /// Fails if the buffer is already mapped, if `mode` asks for no CPU access or
    /// for access the buffer did not declare, or if `region` is not contained in
    /// `[0, byte_size)`.
    pub fn validate_map_request(&self, region: GpuMemoryRegion, mode: GpuMemoryAccessFlags) -> bool {
        self.check_map_request(&self.core.mapped_slot(), region, mode)
    }

    fn check_map_request(
        &self,
        mapped: &GpuMappedMemory,
        region: GpuMemoryRegion,
        mode: GpuMemoryAccessFlags,
    ) -> bool {
        if mapped.is_valid() {
            log::warn!("Buffer {:?}: map requested while already mapped.", self.id());
            return false;
        }
        if !mode.is_cpu_accessible() || !self.memory_access().contains(mode) {
            log::warn!(
                "Buffer {:?}: map mode {:?} is not allowed by declared access {:?}.",
                self.id(),
                mode,
                self.memory_access()
            );
            return false;
        }
        if !check_buffer_region(self.byte_size, region) {
            log::warn!(
                "Buffer {:?}: map region {:?} is outside of [0, {}).",
                self.id(),
                region,
                self.byte_size
            );
            return false;
        }
        true
    }

    /// Maps `region` for CPU access and records the mapping.
    ///
    /// The buffer's [`GpuMemoryRef`](crate::memory::GpuMemoryRef) stays locked until
    /// [`unmap`](Self::unmap). Returns `None` if another holder owns that lock.
    pub fn map_region(
        &self,
        region: GpuMemoryRegion,
        mode: GpuMemoryAccessFlags,
    ) -> Option<GpuMappedMemory> {
        let mut slot = self.core.mapped_slot();
        if !self.check_map_request(&slot, region, mode) {
            return None;
        }
        let memory = self.core.memory_info().memory.as_ref();
        let _pool = memory.map(|memory| memory.lock_pool_shared());
        if memory.is_some_and(|memory| !memory.try_lock()) {
            log::warn!("Buffer {:?}: memory is locked by another holder.", self.id());
            return None;
        }
        let region = region.resolve(self.byte_size);
        let Some(pointer) = self.backend.map_region(region, mode) else {
            log::error!("Buffer {:?}: native map of {:?} failed.", self.id(), region);
            if let Some(memory) = memory {
                memory.unlock();
            }
            return None;
        };
        let mapped = GpuMappedMemory::new(pointer, region, mode);
        *slot = mapped;
        Some(mapped)
    }

    /// Releases the current mapping and its memory lock. Returns `false` if nothing was mapped.
    pub fn unmap(&self) -> bool {
        let mut slot = self.core.mapped_slot();
        if !slot.is_valid() {
            return false;
        }
        self.backend.unmap();
        *slot = GpuMappedMemory::empty();
        if let Some(memory) = &self.core.memory_info().memory {
            memory.unlock();
        }
        true
    }

    /// Makes CPU writes to `region` visible to the GPU. `region` must be mapped.
    pub fn flush_mapped_region(&self, region: GpuMemoryRegion) -> bool {
        let region = region.resolve(self.byte_size);
        if !self.core.is_mapped_region(region) {
            return false;
        }
        self.backend.flush_mapped_region(region)
    }

    /// Makes GPU writes to `region` visible to the CPU. `region` must be mapped.
    pub fn invalidate_region(&self, region: GpuMemoryRegion) -> bool {
        let region = region.resolve(self.byte_size);
        if !self.core.is_mapped_region(region) {
            return false;
        }
        self.backend.invalidate_region(region)
    }

    /// Copies `data` into the mapped memory at absolute buffer offset `offset`.
    pub fn write_mapped(&self, offset: u64, data: &[u8]) -> bool {
        let target = GpuMemoryRegion::new(offset, data.len() as u64);
        let mapped = self.core.mapped_slot();
        if data.is_empty()
            || !mapped.flags().contains(GpuMemoryAccessFlags::CPU_WRITE)
            || !mapped.is_valid()
            || !mapped.region().contains(&target)
        {
            return false;
        }
        let Some(base) = mapped.pointer() else {
            return false;
        };
        let delta = (offset - mapped.region().offset) as usize;
        // SAFETY: `target` lies within the mapped region, and the backend guarantees
        // `base` addresses at least `mapped.region().size` writable bytes while mapped.
        // Holding the slot keeps `unmap` and other mapped copies out until we finish.
        unsafe {
            std::ptr::copy_nonoverlapping(data.as_ptr(), base.as_ptr().add(delta), data.len());
        }
        true
    }

    /// Copies mapped memory at absolute buffer offset `offset` into `out`.
    pub fn read_mapped(&self, offset: u64, out: &mut [u8]) -> bool {
        let source = GpuMemoryRegion::new(offset, out.len() as u64);
        let mapped = self.core.mapped_slot();
        if out.is_empty()
            || !mapped.flags().contains(GpuMemoryAccessFlags::CPU_READ)
            || !mapped.is_valid()
            || !mapped.region().contains(&source)
        {
            return false;
        }
        let Some(base) = mapped.pointer() else {
            return false;
        };
        let delta = (offset - mapped.region().offset) as usize;
        // SAFETY: `source` lies within the mapped region, which the backend keeps
        // readable for as long as the mapping is recorded. The held slot pins it.
        unsafe {
            std::ptr::copy_nonoverlapping(base.as_ptr().add(delta), out.as_mut_ptr(), out.len());
        }
        true
    }

    /// Writes `data` at `offset` through a transient CPU mapping.
    ///
    /// Requires declared CPU write access, no live mapping and an uncontended
    /// memory lock, which is held for the duration of the write.
    pub fn update_sub_data_copy(&self, offset: u64, data: &[u8]) -> bool {
        let region = GpuMemoryRegion::new(offset, data.len() as u64);
        let slot = self.core.mapped_slot();
        if slot.is_valid()
            || !self.memory_access().contains(GpuMemoryAccessFlags::CPU_WRITE)
            || !check_buffer_region(self.byte_size, region)
        {
            log::warn!(
                "Buffer {:?}: rejected copy update of {:?}.",
                self.id(),
                region
            );
            return false;
        }
        let memory = self.core.memory_info().memory.as_ref();
        let _pool = memory.map(|memory| memory.lock_pool_shared());
        let _guard = match memory {
            Some(memory) => match memory.try_scoped_lock() {
                Some(guard) => Some(guard),
                None => {
                    log::warn!("Buffer {:?}: memory is locked by another holder.", self.id());
                    return false;
                }
            },
            None => None,
        };
        self.backend.update_sub_data_copy(region, data)
    }

    /// Writes `data` at `offset` through a staging upload.
    ///
    /// Requires the `COPY_DST` bind flag.
    pub fn update_sub_data_upload(&self, offset: u64, data: &[u8]) -> bool {
        let region = GpuMemoryRegion::new(offset, data.len() as u64);
        if !self.bind_flags.contains(GpuBufferBindFlags::COPY_DST)
            || !check_buffer_region(self.byte_size, region)
        {
            log::warn!(
                "Buffer {:?}: rejected upload update of {:?}.",
                self.id(),
                region
            );
            return false;
        }
        self.backend.update_sub_data_upload(region, data)
    }

    /// Writes a slice of plain-old-data values at `offset`, choosing the copy path
    /// for CPU-writable buffers and the upload path otherwise.
    pub fn update_sub_data_pod<T: bytemuck::Pod>(&self, offset: u64, values: &[T]) -> bool {
        let bytes: &[u8] = bytemuck::cast_slice(values);
        if self.memory_access().contains(GpuMemoryAccessFlags::CPU_WRITE) && !self.core.is_mapped()
        {
            self.update_sub_data_copy(offset, bytes)
        } else {
            self.update_sub_data_upload(offset, bytes)
        }
    }
}

impl GpuResource for GpuBuffer {
    fn resource_core(&self) -> &GpuResourceCore {
        &self.core
    }

    fn native_handle(&self) -> GpuNativeHandle {
        self.backend.native_handle()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::memory::{
        GpuMemoryHeap, GpuMemoryHeapDesc, GpuMemoryHeapFlags, GpuMemoryHeapId, GpuMemoryPool,
        GpuMemoryRef,
    };
    use crate::resource::{GpuResourceBaseType, GpuResourceId, ResourceMemoryInfo};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier, Mutex};
    use std::thread;

    /// A buffer backend that keeps its bytes in a vector.
    pub(crate) struct VecBufferBackend {
        pub(crate) bytes: Mutex<Vec<u8>>,
    }

    impl GpuBufferBackend for VecBufferBackend {
        fn native_handle(&self) -> GpuNativeHandle {
            GpuNativeHandle(0xB0)
        }
        fn map_region(&self, region: GpuMemoryRegion, _m: GpuMemoryAccessFlags) -> Option<NonNull<u8>> {
            let mut bytes = self.bytes.lock().unwrap();
            NonNull::new(bytes[region.offset as usize..].as_mut_ptr())
        }
        fn unmap(&self) {}
        fn flush_mapped_region(&self, _r: GpuMemoryRegion) -> bool {
            true
        }
        fn invalidate_region(&self, _r: GpuMemoryRegion) -> bool {
            true
        }
        fn update_sub_data_copy(&self, region: GpuMemoryRegion, data: &[u8]) -> bool {
            let mut bytes = self.bytes.lock().unwrap();
            let start = region.offset as usize;
            bytes[start..start + data.len()].copy_from_slice(data);
            true
        }
        fn update_sub_data_upload(&self, region: GpuMemoryRegion, data: &[u8]) -> bool {
            self.update_sub_data_copy(region, data)
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    pub(crate) fn test_buffer(
        id: u64,
        size: u64,
        access: GpuMemoryAccessFlags,
        bind_flags: GpuBufferBindFlags,
    ) -> GpuBuffer {
        let core = GpuResourceCore::new(
            GpuResourceId(id),
            GpuResourceBaseType::Buffer,
            None,
            ResourceMemoryInfo {
                access_flags: access,
                base_alignment: DEFAULT_BUFFER_ALIGNMENT,
                ..Default::default()
            },
        );
        GpuBuffer::new(
            core,
            size,
            bind_flags,
            Box::new(VecBufferBackend {
                bytes: Mutex::new(vec![0; size as usize]),
            }),
        )
    }

    /// A CPU read/write buffer whose memory is bound to a pool region.
    fn pooled_buffer(id: u64, size: u64) -> GpuBuffer {
        let heap = Arc::new(GpuMemoryHeap::new(
            GpuMemoryHeapId(0),
            &GpuMemoryHeapDesc {
                label: "upload".to_string(),
                base_alignment: DEFAULT_BUFFER_ALIGNMENT,
                total_size: 1 << 16,
                flags: GpuMemoryHeapFlags::CPU_VISIBLE,
            },
        ));
        let pool = Arc::new(GpuMemoryPool::new("upload", heap));
        let core = GpuResourceCore::new(
            GpuResourceId(id),
            GpuResourceBaseType::Buffer,
            None,
            ResourceMemoryInfo {
                memory: Some(GpuMemoryRef::new(pool, GpuMemoryRegion::new(0, size))),
                access_flags: GpuMemoryAccessFlags::CPU_READ_WRITE,
                base_alignment: DEFAULT_BUFFER_ALIGNMENT,
                ..Default::default()
            },
        );
        GpuBuffer::new(
            core,
            size,
            GpuBufferBindFlags::CONSTANT | GpuBufferBindFlags::COPY_DST,
            Box::new(VecBufferBackend {
                bytes: Mutex::new(vec![0; size as usize]),
            }),
        )
    }

    fn memory_ref(buffer: &GpuBuffer) -> &GpuMemoryRef {
        buffer.resource_core().memory_info().memory.as_ref().unwrap()
    }

    fn contents(buffer: &GpuBuffer) -> Vec<u8> {
        buffer
            .backend()
            .as_any()
            .downcast_ref::<VecBufferBackend>()
            .unwrap()
            .bytes
            .lock()
            .unwrap()
            .clone()
    }

    #[test]
    fn create_info_defaults() {
        let data = [1u8; 48];
        let mut info = GpuBufferCreateInfo {
            init_data: Some(&data),
            ..Default::default()
        };
        assert!(validate_buffer_create_info(&mut info, DEFAULT_BUFFER_ALIGNMENT));
        assert_eq!(info.alignment, DEFAULT_BUFFER_ALIGNMENT);
        assert_eq!(info.buffer_size, 48);

        let mut empty = GpuBufferCreateInfo::default();
        assert!(!validate_buffer_create_info(&mut empty, DEFAULT_BUFFER_ALIGNMENT));

        let mut too_small = GpuBufferCreateInfo {
            buffer_size: 16,
            init_data: Some(&data),
            ..Default::default()
        };
        assert!(!validate_buffer_create_info(&mut too_small, DEFAULT_BUFFER_ALIGNMENT));

        let mut odd_alignment = GpuBufferCreateInfo {
            buffer_size: 16,
            alignment: 24,
            ..Default::default()
        };
        assert!(!validate_buffer_create_info(&mut odd_alignment, DEFAULT_BUFFER_ALIGNMENT));
    }

    #[test]
    fn map_request_validation() {
        let buffer = test_buffer(
            1,
            256,
            GpuMemoryAccessFlags::CPU_WRITE,
            GpuBufferBindFlags::VERTEX,
        );
        assert!(buffer.validate_map_request(GpuMemoryRegion::new(0, 256), GpuMemoryAccessFlags::CPU_WRITE));
        assert!(!buffer.validate_map_request(GpuMemoryRegion::new(0, 256), GpuMemoryAccessFlags::CPU_READ));
        assert!(!buffer.validate_map_request(GpuMemoryRegion::new(200, 100), GpuMemoryAccessFlags::CPU_WRITE));
        assert!(!buffer.validate_map_request(GpuMemoryRegion::new(0, 16), GpuMemoryAccessFlags::empty()));

        assert!(buffer
            .map_region(GpuMemoryRegion::new(0, 128), GpuMemoryAccessFlags::CPU_WRITE)
            .is_some());
        assert!(!buffer.validate_map_request(GpuMemoryRegion::new(128, 16), GpuMemoryAccessFlags::CPU_WRITE));
        assert!(buffer.unmap());
        assert!(!buffer.unmap());
    }

    #[test]
    fn write_through_mapping() {
        let buffer = test_buffer(
            2,
            64,
            GpuMemoryAccessFlags::CPU_READ_WRITE,
            GpuBufferBindFlags::CONSTANT,
        );
        let mapped = buffer
            .map_region(
                GpuMemoryRegion::new(16, GpuMemoryRegion::WHOLE_SIZE),
                GpuMemoryAccessFlags::CPU_READ_WRITE,
            )
            .unwrap();
        assert_eq!(mapped.region(), GpuMemoryRegion::new(16, 48));
        assert!(buffer.write_mapped(20, &[7, 8, 9]));
        assert!(!buffer.write_mapped(8, &[1]));
        assert!(!buffer.write_mapped(62, &[1, 2, 3]));
        assert!(buffer.flush_mapped_region(GpuMemoryRegion::new(20, 3)));
        assert!(!buffer.flush_mapped_region(GpuMemoryRegion::new(0, 3)));

        let mut out = [0u8; 3];
        assert!(buffer.read_mapped(20, &mut out));
        assert_eq!(out, [7, 8, 9]);
        assert!(buffer.unmap());
        assert_eq!(&contents(&buffer)[20..23], &[7, 8, 9]);
    }

    #[test]
    fn sub_data_updates_validate_paths() {
        let writable = test_buffer(
            3,
            32,
            GpuMemoryAccessFlags::CPU_WRITE,
            GpuBufferBindFlags::empty(),
        );
        assert!(writable.update_sub_data_copy(4, &[1, 2, 3, 4]));
        assert!(!writable.update_sub_data_copy(30, &[1, 2, 3, 4]));
        assert!(!writable.update_sub_data_upload(0, &[1]));
        assert_eq!(&contents(&writable)[4..8], &[1, 2, 3, 4]);

        let gpu_only = test_buffer(
            4,
            32,
            GpuMemoryAccessFlags::GPU_READ,
            GpuBufferBindFlags::COPY_DST,
        );
        assert!(!gpu_only.update_sub_data_copy(0, &[1]));
        assert!(gpu_only.update_sub_data_pod(8, &[0xAABBCCDDu32]));
        assert_eq!(
            &contents(&gpu_only)[8..12],
            &0xAABBCCDDu32.to_ne_bytes()
        );
    }

    #[test]
    fn mapping_holds_the_memory_lock_until_unmap() {
        let buffer = pooled_buffer(5, 64);
        let whole = GpuMemoryRegion::whole();
        assert!(buffer.map_region(whole, GpuMemoryAccessFlags::CPU_WRITE).is_some());
        assert!(memory_ref(&buffer).is_locked());
        assert!(buffer.map_region(whole, GpuMemoryAccessFlags::CPU_WRITE).is_none());
        assert!(!buffer.update_sub_data_copy(0, &[1]));

        assert!(buffer.unmap());
        assert!(!memory_ref(&buffer).is_locked());
        assert!(buffer.update_sub_data_copy(0, &[1]));
        assert!(!memory_ref(&buffer).is_locked());
    }

    #[test]
    fn foreign_lock_holder_blocks_cpu_access() {
        let buffer = pooled_buffer(6, 64);
        let whole = GpuMemoryRegion::whole();
        let held = memory_ref(&buffer).try_scoped_lock().unwrap();

        assert!(buffer.validate_map_request(whole, GpuMemoryAccessFlags::CPU_READ));
        assert!(buffer.map_region(whole, GpuMemoryAccessFlags::CPU_READ).is_none());
        assert!(!buffer.resource_core().is_mapped());
        assert!(!buffer.update_sub_data_copy(0, &[1, 2]));
        assert!(buffer.update_sub_data_upload(0, &[1, 2]));

        drop(held);
        assert!(buffer.map_region(whole, GpuMemoryAccessFlags::CPU_READ).is_some());
        assert!(buffer.unmap());
    }

    #[test]
    fn concurrent_maps_admit_exactly_one() {
        const THREADS: usize = 8;
        let buffer = Arc::new(pooled_buffer(7, 256));
        let barrier = Arc::new(Barrier::new(THREADS));
        let winners = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..THREADS)
            .map(|i| {
                let buffer = buffer.clone();
                let barrier = barrier.clone();
                let winners = winners.clone();
                thread::spawn(move || {
                    barrier.wait();
                    let region = GpuMemoryRegion::new(i as u64 * 32, 32);
                    if let Some(mapped) = buffer.map_region(region, GpuMemoryAccessFlags::CPU_WRITE) {
                        winners.fetch_add(1, Ordering::SeqCst);
                        assert_eq!(mapped.region(), region);
                        assert!(buffer.write_mapped(region.offset, &[i as u8; 32]));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(winners.load(Ordering::SeqCst), 1);
        let mapped = buffer.resource_core().mapped_memory();
        assert!(mapped.is_valid());
        assert!(memory_ref(&buffer).is_locked());
        assert!(buffer.unmap());
        assert!(!memory_ref(&buffer).is_locked());
    }
}
