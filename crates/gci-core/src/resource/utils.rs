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

//! Pure region helpers shared by buffers, buffer references and command recording.

use super::GpuBuffer;
use crate::memory::GpuMemoryRegion;

/// Strict containment test of `region` against a buffer of `byte_size` bytes.
///
/// The "whole remaining" sentinel is resolved first. Empty regions are rejected:
/// they can be neither mapped nor copied.
pub fn check_buffer_region(byte_size: u64, region: GpuMemoryRegion) -> bool {
    let region = region.resolve(byte_size);
    !region.is_empty() && GpuMemoryRegion::new(0, byte_size).contains(&region)
}

/// Coerces `region` into a valid sub-range of a buffer of `byte_size` bytes.
///
/// The offset is clamped to the buffer size, then the size is clamped to what
/// remains after the offset. Never fails; may return an empty region.
pub fn validate_buffer_region(byte_size: u64, region: GpuMemoryRegion) -> GpuMemoryRegion {
    let offset = region.offset.min(byte_size);
    let remaining = byte_size - offset;
    GpuMemoryRegion::new(offset, region.size.min(remaining))
}

/// [`check_buffer_region`] against a live buffer.
pub fn check_gpu_buffer_region(buffer: &GpuBuffer, region: GpuMemoryRegion) -> bool {
    check_buffer_region(buffer.byte_size(), region)
}

/// [`validate_buffer_region`] against a live buffer.
pub fn validate_gpu_buffer_region(buffer: &GpuBuffer, region: GpuMemoryRegion) -> GpuMemoryRegion {
    validate_buffer_region(buffer.byte_size(), region)
}
