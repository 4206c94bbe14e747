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

use crate::resource::GpuNativeHandle;
use std::time::Duration;

/// A GPU/CPU synchronization primitive with a monotonically increasing completion value.
pub trait GpuFence: Send + Sync {
    /// The last value the GPU has reached.
    fn completed_value(&self) -> u64;

    /// Enqueues a signal of `value` on the native queue `queue`, after all work
    /// already submitted to it.
    fn signal_on_queue(&self, queue: GpuNativeHandle, value: u64) -> bool;

    /// Blocks until the completed value reaches `value`.
    ///
    /// `None` waits without bound. Returns `false` if the timeout elapsed first.
    fn wait_for_value(&self, value: u64, timeout: Option<Duration>) -> bool;
}
