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

use super::utils::{check_gpu_buffer_region, validate_gpu_buffer_region};
use super::{GpuBuffer, GpuResource};
use crate::memory::GpuMemoryRegion;
use std::sync::{Arc, Weak};

/// A non-owning handle to a sub-region of a [`GpuBuffer`].
///
/// While it targets a buffer, the reference holds exactly one active ref on it.
/// It never extends the buffer's lifetime: once the buffer is gone the reference
/// simply stops resolving.
#[derive(Debug, Default)]
pub struct GpuBufferReference {
    target: Option<Weak<GpuBuffer>>,
    sub_region: GpuMemoryRegion,
}

impl GpuBufferReference {
    /// The empty reference.
    pub fn new() -> Self {
        Self::default()
    }

    /// References the whole of `buffer`.
    pub fn from_buffer(buffer: &Arc<GpuBuffer>) -> Self {
        let mut reference = Self::new();
        reference.set_ref_buffer(Some(buffer));
        reference
    }

    /// References `region` of `buffer`, clamped to the buffer bounds.
    pub fn with_region(buffer: &Arc<GpuBuffer>, region: GpuMemoryRegion) -> Self {
        let mut reference = Self::new();
        reference.set_ref_buffer_region(Some(buffer), region);
        reference
    }

    /// References `size` bytes of `buffer` starting at `offset`, clamped to the buffer bounds.
    pub fn with_range(buffer: &Arc<GpuBuffer>, offset: u64, size: u64) -> Self {
        Self::with_region(buffer, GpuMemoryRegion::new(offset, size))
    }

    fn targets(&self, buffer: Option<&Arc<GpuBuffer>>) -> bool {
        match (&self.target, buffer) {
            (None, None) => true,
            (Some(current), Some(buffer)) => Weak::ptr_eq(current, &Arc::downgrade(buffer)),
            _ => false,
        }
    }

    fn retarget(&mut self, buffer: Option<&Arc<GpuBuffer>>) {
        if let Some(previous) = self.target.take().and_then(|weak| weak.upgrade()) {
            previous.release_active_ref();
        }
        if let Some(buffer) = buffer {
            buffer.add_active_ref();
            self.target = Some(Arc::downgrade(buffer));
        }
    }

    /// Points the reference at the whole of `buffer`, or empties it for `None`.
    ///
    /// Active refs are only moved when the target changes. Returns `false` if
    /// nothing changed.
    pub fn set_ref_buffer(&mut self, buffer: Option<&Arc<GpuBuffer>>) -> bool {
        let region = buffer.map_or(GpuMemoryRegion::empty(), |b| b.whole_buffer_region());
        self.set_ref_buffer_region(buffer, region)
    }

    /// Points the reference at `region` of `buffer`. The region is clamped to the
    /// buffer bounds. Returns `false` if neither the target nor the region changed.
    pub fn set_ref_buffer_region(
        &mut self,
        buffer: Option<&Arc<GpuBuffer>>,
        region: GpuMemoryRegion,
    ) -> bool {
        let region = match buffer {
            Some(buffer) => validate_gpu_buffer_region(buffer, region),
            None => GpuMemoryRegion::empty(),
        };
        let same_target = self.targets(buffer);
        if same_target && region == self.sub_region {
            return false;
        }
        if !same_target {
            self.retarget(buffer);
        }
        self.sub_region = region;
        true
    }

    /// Empties the reference, releasing its active ref.
    pub fn reset(&mut self) {
        self.set_ref_buffer(None);
    }

    /// The referenced buffer, if it is still alive.
    pub fn buffer(&self) -> Option<Arc<GpuBuffer>> {
        self.target.as_ref().and_then(Weak::upgrade)
    }

    /// The referenced byte range.
    pub fn sub_region(&self) -> GpuMemoryRegion {
        self.sub_region
    }

    /// Returns `true` if the reference targets nothing.
    pub fn is_empty(&self) -> bool {
        self.target.is_none()
    }

    /// Returns `true` if the reference is empty with an empty region, or if its
    /// region lies within the live target buffer.
    ///
    /// Re-evaluated on every call, so a buffer dropped since the reference was
    /// set turns it invalid.
    pub fn is_valid(&self) -> bool {
        match &self.target {
            None => self.sub_region.is_empty(),
            Some(weak) => weak
                .upgrade()
                .is_some_and(|buffer| check_gpu_buffer_region(&buffer, self.sub_region)),
        }
    }
}

impl Clone for GpuBufferReference {
    fn clone(&self) -> Self {
        if let Some(buffer) = self.buffer() {
            buffer.add_active_ref();
        }
        Self {
            target: self.target.clone(),
            sub_region: self.sub_region,
        }
    }
}

impl Drop for GpuBufferReference {
    fn drop(&mut self) {
        self.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::buffer::tests::test_buffer;
    use crate::resource::{GpuBufferBindFlags, GpuMemoryAccessFlags};

    fn buffer(id: u64, size: u64) -> Arc<GpuBuffer> {
        Arc::new(test_buffer(
            id,
            size,
            GpuMemoryAccessFlags::GPU_READ,
            GpuBufferBindFlags::VERTEX,
        ))
    }

    #[test]
    fn set_reset_set_keeps_refs_balanced() {
        let buf = buffer(1, 128);
        let mut reference = GpuBufferReference::new();
        assert!(reference.set_ref_buffer(Some(&buf)));
        assert_eq!(buf.active_refs(), 1);
        assert!(!reference.set_ref_buffer(Some(&buf)));
        assert_eq!(buf.active_refs(), 1);
        reference.reset();
        assert_eq!(buf.active_refs(), 0);
        assert!(reference.set_ref_buffer(Some(&buf)));
        assert_eq!(buf.active_refs(), 1);
        drop(reference);
        assert_eq!(buf.active_refs(), 0);
    }

    #[test]
    fn region_change_keeps_ref_count() {
        let buf = buffer(2, 256);
        let mut reference = GpuBufferReference::from_buffer(&buf);
        assert_eq!(reference.sub_region(), GpuMemoryRegion::new(0, 256));
        assert!(reference.set_ref_buffer_region(Some(&buf), GpuMemoryRegion::new(64, 64)));
        assert_eq!(buf.active_refs(), 1);
        assert_eq!(reference.sub_region(), GpuMemoryRegion::new(64, 64));
    }

    #[test]
    fn retarget_moves_the_ref() {
        let a = buffer(3, 64);
        let b = buffer(4, 64);
        let mut reference = GpuBufferReference::from_buffer(&a);
        assert!(reference.set_ref_buffer(Some(&b)));
        assert_eq!(a.active_refs(), 0);
        assert_eq!(b.active_refs(), 1);
    }

    #[test]
    fn regions_are_clamped() {
        let buf = buffer(5, 100);
        let reference = GpuBufferReference::with_range(&buf, 80, 50);
        assert_eq!(reference.sub_region(), GpuMemoryRegion::new(80, 20));
        assert!(reference.is_valid());
    }

    #[test]
    fn clone_adds_a_ref() {
        let buf = buffer(6, 32);
        let reference = GpuBufferReference::from_buffer(&buf);
        let copy = reference.clone();
        assert_eq!(buf.active_refs(), 2);
        drop(copy);
        drop(reference);
        assert_eq!(buf.active_refs(), 0);
    }

    #[test]
    fn validity_tracks_buffer_lifetime() {
        assert!(GpuBufferReference::new().is_valid());
        let buf = buffer(7, 32);
        let reference = GpuBufferReference::from_buffer(&buf);
        assert!(reference.is_valid());
        drop(buf);
        assert!(!reference.is_valid());
        assert!(reference.buffer().is_none());
    }
}
