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

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Capabilities of a [`GpuMemoryHeap`].
    ///
    /// Backends map these onto their native memory types (D3D12 heap types,
    /// Vulkan memory property flags, Metal storage modes).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct GpuMemoryHeapFlags: u32 {
        /// CPU writes become visible to the GPU without an explicit flush.
        const CPU_COHERENT = 1 << 0;
        /// GPU writes become visible to the CPU without an explicit invalidate.
        const GPU_COHERENT = 1 << 1;
        /// Memory may stay mapped for the whole resource lifetime.
        const PERSISTENT_MAP = 1 << 2;
        /// Memory can be mapped by the CPU at all.
        const CPU_VISIBLE = 1 << 3;
        /// Memory lives in device-local (video) memory.
        const DEVICE_LOCAL = 1 << 4;
    }
}

/// Identifies a heap within one device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GpuMemoryHeapId(pub u32);

/// The configuration a heap is created from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpuMemoryHeapDesc {
    /// A debug label, also used as the name of the heap's default pool.
    pub label: String,
    /// The alignment every sub-allocation offset is rounded up to.
    pub base_alignment: u64,
    /// The capacity of the heap in bytes.
    pub total_size: u64,
    /// The capabilities of the heap.
    pub flags: GpuMemoryHeapFlags,
}

impl GpuMemoryHeapDesc {
    /// The heap set a device creates when the settings do not name one:
    /// device-local, upload and readback.
    pub fn default_set() -> Vec<GpuMemoryHeapDesc> {
        const MIB: u64 = 1024 * 1024;
        vec![
            GpuMemoryHeapDesc {
                label: "device_local".to_string(),
                base_alignment: 256,
                total_size: 512 * MIB,
                flags: GpuMemoryHeapFlags::DEVICE_LOCAL,
            },
            GpuMemoryHeapDesc {
                label: "upload".to_string(),
                base_alignment: 256,
                total_size: 128 * MIB,
                flags: GpuMemoryHeapFlags::CPU_VISIBLE
                    | GpuMemoryHeapFlags::CPU_COHERENT
                    | GpuMemoryHeapFlags::PERSISTENT_MAP,
            },
            GpuMemoryHeapDesc {
                label: "readback".to_string(),
                base_alignment: 256,
                total_size: 64 * MIB,
                flags: GpuMemoryHeapFlags::CPU_VISIBLE | GpuMemoryHeapFlags::GPU_COHERENT,
            },
        ]
    }
}

/// A fixed-size domain of GPU memory.
///
/// Heaps are created once per device and are never resized at runtime.
#[derive(Debug)]
pub struct GpuMemoryHeap {
    id: GpuMemoryHeapId,
    label: String,
    base_alignment: u64,
    total_size: u64,
    flags: GpuMemoryHeapFlags,
}

impl GpuMemoryHeap {
    /// Creates a heap from its description.
    ///
    /// A zero or non power-of-two alignment is replaced by `1`.
    pub fn new(id: GpuMemoryHeapId, desc: &GpuMemoryHeapDesc) -> Self {
        let base_alignment = if desc.base_alignment.is_power_of_two() {
            desc.base_alignment
        } else {
            log::warn!(
                "Heap '{}': alignment {} is not a power of two, using 1.",
                desc.label,
                desc.base_alignment
            );
            1
        };
        Self {
            id,
            label: desc.label.clone(),
            base_alignment,
            total_size: desc.total_size,
            flags: desc.flags,
        }
    }

    /// The identifier of this heap within its device.
    pub fn id(&self) -> GpuMemoryHeapId {
        self.id
    }

    /// The debug label of this heap.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The alignment every sub-allocation offset is rounded up to.
    pub fn base_alignment(&self) -> u64 {
        self.base_alignment
    }

    /// The capacity of this heap in bytes.
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// The capability flags of this heap.
    pub fn flags(&self) -> GpuMemoryHeapFlags {
        self.flags
    }

    /// Returns `true` if the CPU can map memory from this heap.
    pub fn is_cpu_mappable(&self) -> bool {
        self.flags.contains(GpuMemoryHeapFlags::CPU_VISIBLE)
    }

    /// Rounds `value` up to this heap's base alignment, or `None` on overflow.
    pub fn align_up(&self, value: u64) -> Option<u64> {
        value.checked_next_multiple_of(self.base_alignment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn align_up_rounds_to_base_alignment() {
        let heap = GpuMemoryHeap::new(
            GpuMemoryHeapId(0),
            &GpuMemoryHeapDesc {
                label: "test".to_string(),
                base_alignment: 256,
                total_size: 4096,
                flags: GpuMemoryHeapFlags::DEVICE_LOCAL,
            },
        );
        assert_eq!(heap.align_up(0), Some(0));
        assert_eq!(heap.align_up(1), Some(256));
        assert_eq!(heap.align_up(256), Some(256));
        assert_eq!(heap.align_up(257), Some(512));
        assert_eq!(heap.align_up(u64::MAX - 10), None);
        assert!(!heap.is_cpu_mappable());
    }

    #[test]
    fn invalid_alignment_falls_back_to_one() {
        let heap = GpuMemoryHeap::new(
            GpuMemoryHeapId(3),
            &GpuMemoryHeapDesc {
                label: "odd".to_string(),
                base_alignment: 48,
                total_size: 1024,
                flags: GpuMemoryHeapFlags::CPU_VISIBLE,
            },
        );
        assert_eq!(heap.base_alignment(), 1);
        assert_eq!(heap.align_up(47), Some(47));
        assert!(heap.is_cpu_mappable());
    }

    #[test]
    fn default_set_has_one_mappable_upload_heap() {
        let set = GpuMemoryHeapDesc::default_set();
        assert_eq!(set.len(), 3);
        let upload = set.iter().find(|d| d.label == "upload").unwrap();
        assert!(upload.flags.contains(GpuMemoryHeapFlags::PERSISTENT_MAP));
    }
}
