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

use serde::{Deserialize, Serialize};

/// A byte range `{offset, size}` inside some GPU memory domain.
///
/// A size of [`GpuMemoryRegion::WHOLE_SIZE`] means "everything from `offset` to
/// the end", and is resolved against a concrete length with [`resolve`](Self::resolve).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GpuMemoryRegion {
    /// The start of the range, in bytes.
    pub offset: u64,
    /// The length of the range, in bytes.
    pub size: u64,
}

impl GpuMemoryRegion {
    /// Sentinel size meaning "the whole remaining range".
    pub const WHOLE_SIZE: u64 = u64::MAX;

    /// Creates a region from an offset and a size.
    pub const fn new(offset: u64, size: u64) -> Self {
        Self { offset, size }
    }

    /// The empty region.
    pub const fn empty() -> Self {
        Self { offset: 0, size: 0 }
    }

    /// The region covering everything, whatever the actual length turns out to be.
    pub const fn whole() -> Self {
        Self {
            offset: 0,
            size: Self::WHOLE_SIZE,
        }
    }

    /// Returns `true` if the region covers no bytes.
    pub const fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Returns `true` if the size is the "whole remaining" sentinel.
    pub const fn is_whole_remaining(&self) -> bool {
        self.size == Self::WHOLE_SIZE
    }

    /// The exclusive end of the region, or `None` on overflow or for an unresolved sentinel.
    pub fn end(&self) -> Option<u64> {
        if self.is_whole_remaining() {
            return None;
        }
        self.offset.checked_add(self.size)
    }

    /// Replaces the "whole remaining" sentinel with the concrete remainder of `total`.
    pub fn resolve(&self, total: u64) -> Self {
        if self.is_whole_remaining() {
            Self::new(self.offset, total.saturating_sub(self.offset))
        } else {
            *self
        }
    }

    /// Returns `true` if `other` lies entirely within `self`.
    ///
    /// An empty `other` is contained as long as its offset is within `self`'s bounds.
    pub fn contains(&self, other: &GpuMemoryRegion) -> bool {
        let (Some(self_end), Some(other_end)) = (self.end(), other.end()) else {
            return false;
        };
        other.offset >= self.offset && other_end <= self_end
    }
}
