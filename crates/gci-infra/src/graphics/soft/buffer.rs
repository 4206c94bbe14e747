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
use gci_core::memory::GpuMemoryRegion;
use gci_core::resource::{GpuBuffer, GpuBufferBackend, GpuMemoryAccessFlags, GpuNativeHandle};
use std::any::Any;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Buffer storage in host memory.
///
/// The byte box is allocated once and never resized, so pointers handed out by
/// [`map_region`](GpuBufferBackend::map_region) stay valid for the buffer's lifetime.
#[derive(Debug)]
pub struct SoftBuffer {
    native: GpuNativeHandle,
    bytes: Mutex<Box<[u8]>>,
    mapped: AtomicBool,
}

impl SoftBuffer {
    /// Allocates `size` zeroed bytes, then copies `init_data` at the start.
    pub fn new(native: GpuNativeHandle, size: u64, init_data: Option<&[u8]>) -> Self {
        let mut bytes = vec![0u8; size as usize].into_boxed_slice();
        if let Some(data) = init_data {
            let len = data.len().min(bytes.len());
            bytes[..len].copy_from_slice(&data[..len]);
        }
        Self {
            native,
            bytes: Mutex::new(bytes),
            mapped: AtomicBool::new(false),
        }
    }

    /// The soft storage of `buffer`, if it was created by the soft backend.
    pub fn of(buffer: &GpuBuffer) -> Option<&SoftBuffer> {
        buffer.backend().as_any().downcast_ref::<SoftBuffer>()
    }

    fn bytes(&self) -> MutexGuard<'_, Box<[u8]>> {
        self.bytes.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// A copy of the whole storage.
    pub fn snapshot(&self) -> Vec<u8> {
        self.bytes().to_vec()
    }

    /// Returns `true` while a CPU mapping is live.
    pub fn is_mapped(&self) -> bool {
        self.mapped.load(Ordering::Acquire)
    }

    /// Reads `len` bytes at `offset`. Returns `None` when the range is out of bounds.
    pub(crate) fn read(&self, offset: u64, len: u64) -> Option<Vec<u8>> {
        let bytes = self.bytes();
        let start = usize::try_from(offset).ok()?;
        let end = start.checked_add(usize::try_from(len).ok()?)?;
        bytes.get(start..end).map(<[u8]>::to_vec)
    }

    /// Writes `data` at `offset`. Returns `false` when the range is out of bounds.
    pub(crate) fn write(&self, offset: u64, data: &[u8]) -> bool {
        let mut bytes = self.bytes();
        let Ok(start) = usize::try_from(offset) else {
            return false;
        };
        match bytes.get_mut(start..start.saturating_add(data.len())) {
            Some(target) if target.len() == data.len() => {
                target.copy_from_slice(data);
                true
            }
            _ => false,
        }
    }
}

impl GpuBufferBackend for SoftBuffer {
    fn native_handle(&self) -> GpuNativeHandle {
        self.native
    }

    fn map_region(
        &self,
        region: GpuMemoryRegion,
        mode: GpuMemoryAccessFlags,
    ) -> Option<NonNull<u8>> {
        let mut bytes = self.bytes();
        let start = usize::try_from(region.offset).ok()?;
        let end = start.checked_add(usize::try_from(region.size).ok()?)?;
        let target = bytes.get_mut(start..end)?;
        if self.mapped.swap(true, Ordering::AcqRel) {
            log::warn!("Soft buffer {:?} mapped twice.", self.native);
        }
        log::trace!("Soft buffer {:?}: mapped {:?} as {:?}.", self.native, region, mode);
        NonNull::new(target.as_mut_ptr())
    }

    fn unmap(&self) {
        self.mapped.store(false, Ordering::Release);
    }

    fn flush_mapped_region(&self, _region: GpuMemoryRegion) -> bool {
        self.is_mapped()
    }

    fn invalidate_region(&self, _region: GpuMemoryRegion) -> bool {
        self.is_mapped()
    }

    fn update_sub_data_copy(&self, region: GpuMemoryRegion, data: &[u8]) -> bool {
        region.size == data.len() as u64 && self.write(region.offset, data)
    }

    fn update_sub_data_upload(&self, region: GpuMemoryRegion, data: &[u8]) -> bool {
        // Host memory is the "device" memory here, so the staging copy is direct.
        self.update_sub_data_copy(region, data)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_data_fills_the_front() {
        let buffer = SoftBuffer::new(GpuNativeHandle(1), 6, Some(&[1, 2, 3]));
        assert_eq!(buffer.snapshot(), vec![1, 2, 3, 0, 0, 0]);
    }

    #[test]
    fn out_of_bounds_access_is_refused() {
        let buffer = SoftBuffer::new(GpuNativeHandle(1), 8, None);
        assert!(buffer.read(4, 5).is_none());
        assert!(!buffer.write(7, &[1, 2]));
        assert!(buffer.write(6, &[1, 2]));
        assert_eq!(buffer.read(6, 2), Some(vec![1, 2]));
        assert!(buffer
            .map_region(GpuMemoryRegion::new(4, 8), GpuMemoryAccessFlags::CPU_READ)
            .is_none());
        assert!(!buffer.is_mapped());
    }

    #[test]
    fn mapped_pointer_aliases_the_storage() {
        let buffer = SoftBuffer::new(GpuNativeHandle(1), 8, None);
        let pointer = buffer
            .map_region(GpuMemoryRegion::new(2, 4), GpuMemoryAccessFlags::CPU_WRITE)
            .unwrap();
        // SAFETY: the mapping covers 4 bytes starting at offset 2 of an 8 byte box.
        unsafe { pointer.as_ptr().write(9) };
        assert!(buffer.flush_mapped_region(GpuMemoryRegion::new(2, 4)));
        buffer.unmap();
        assert!(!buffer.flush_mapped_region(GpuMemoryRegion::new(2, 4)));
        assert_eq!(buffer.snapshot()[2], 9);
    }
}
