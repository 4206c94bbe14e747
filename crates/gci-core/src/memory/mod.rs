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

//! Coarse GPU memory accounting primitives.
//!
//! - [`GpuMemoryRegion`]: an `{offset, size}` byte range.
//! - [`GpuMemoryHeap`]: a fixed-size memory domain tagged with capability flags.
//! - [`GpuMemoryPool`]: a named sub-allocation domain drawn from one heap.
//! - [`GpuMemoryRef`]: one pool plus one region, with its own lock flag.
//!
//! None of these place memory. Placement is backend business; the generic layer
//! only needs to answer "how much of this domain is used" without a backend call.

mod heap;
mod pool;
mod reference;
mod region;
mod stats;

pub use self::heap::{GpuMemoryHeap, GpuMemoryHeapDesc, GpuMemoryHeapFlags, GpuMemoryHeapId};
pub use self::pool::GpuMemoryPool;
pub use self::reference::{GpuMemoryRef, GpuMemoryRefGuard};
pub use self::region::GpuMemoryRegion;
pub use self::stats::{GpuMemoryPoolUsage, GpuMemoryStats};
