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
//! The shared state of the simulated GPU.

use super::fence::SoftFence;
use gci_core::driver::DisplayInfo;
use gci_core::resource::GpuNativeHandle;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

/// When fence signals enqueued on a queue complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SoftFenceMode {
    /// Signals complete as soon as they are enqueued. Submissions run synchronously,
    /// so all earlier work is already done at that point.
    #[default]
    Immediate,
    /// Signals stay pending until [`SoftGpu::retire_all`] runs, which models a GPU
    /// running behind the CPU.
    Deferred,
}

/// The back buffer order the simulated presentation engine reports.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SoftPresentOrder {
    /// `0, 1, .., n-1, 0, ..`
    #[default]
    Sequential,
    /// Indices taken from the list after each present, cycling. The index before
    /// the first present is 0. Out-of-range entries are reported as-is.
    Scripted(Vec<u32>),
}

/// Behavior knobs of the soft backend.
#[derive(Debug, Clone)]
pub struct SoftConfig {
    /// The name reported in the adapter info.
    pub adapter_name: String,
    /// When fence signals complete.
    pub fence_mode: SoftFenceMode,
    /// The presentation order of every swap chain.
    pub present_order: SoftPresentOrder,
    /// The outputs the display manager reports.
    pub displays: Vec<DisplayInfo>,
}

impl Default for SoftConfig {
    fn default() -> Self {
        Self {
            adapter_name: "GCI Soft Adapter".to_string(),
            fence_mode: SoftFenceMode::Immediate,
            present_order: SoftPresentOrder::Sequential,
            displays: vec![DisplayInfo {
                name: "SOFT-0".to_string(),
                width: 1920,
                height: 1080,
                refresh_rate_millihertz: 60_000,
                primary: true,
            }],
        }
    }
}

/// Counters of the work the simulated GPU executed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SoftGpuStats {
    /// Command lists submitted.
    pub submissions: u64,
    /// Draw and indexed draw commands executed.
    pub draws: u64,
    /// Dispatch commands executed.
    pub dispatches: u64,
    /// Buffer copies executed.
    pub copies: u64,
    /// Bytes moved by buffer copies.
    pub bytes_copied: u64,
}

#[derive(Debug, Default)]
struct Counters {
    submissions: AtomicU64,
    draws: AtomicU64,
    dispatches: AtomicU64,
    copies: AtomicU64,
    bytes_copied: AtomicU64,
}

/// The simulated GPU shared by a soft driver and every device it opens.
///
/// Hosts keep an `Arc` to it to drive deferred fences and read execution counters.
#[derive(Debug)]
pub struct SoftGpu {
    config: SoftConfig,
    next_handle: AtomicU64,
    fences: Mutex<Vec<Weak<SoftFence>>>,
    counters: Counters,
}

impl SoftGpu {
    /// Creates a simulated GPU.
    pub fn new(config: SoftConfig) -> Arc<Self> {
        Arc::new(Self {
            config,
            next_handle: AtomicU64::new(0x1000),
            fences: Mutex::new(Vec::new()),
            counters: Counters::default(),
        })
    }

    /// The configuration the GPU was created with.
    pub fn config(&self) -> &SoftConfig {
        &self.config
    }

    /// Allocates a fresh native handle. Never returns the null handle.
    pub(crate) fn next_handle(&self) -> GpuNativeHandle {
        GpuNativeHandle(self.next_handle.fetch_add(1, Ordering::Relaxed))
    }

    /// Creates a fence on this GPU.
    pub(crate) fn create_fence(&self, initial_value: u64) -> Arc<SoftFence> {
        let fence = Arc::new(SoftFence::new(initial_value, self.config.fence_mode));
        let mut fences = self.fences.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        fences.retain(|weak| weak.strong_count() > 0);
        fences.push(Arc::downgrade(&fence));
        fence
    }

    /// Completes every pending signal of every live fence.
    ///
    /// Returns the number of fences that advanced.
    pub fn retire_all(&self) -> usize {
        let fences: Vec<Arc<SoftFence>> = self
            .fences
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .filter_map(Weak::upgrade)
            .collect();
        let advanced = fences
            .iter()
            .filter(|fence| fence.complete_pending())
            .count();
        log::trace!("Soft GPU retired pending signals on {advanced} fences.");
        advanced
    }

    /// A snapshot of the execution counters.
    pub fn stats(&self) -> SoftGpuStats {
        let c = &self.counters;
        SoftGpuStats {
            submissions: c.submissions.load(Ordering::Relaxed),
            draws: c.draws.load(Ordering::Relaxed),
            dispatches: c.dispatches.load(Ordering::Relaxed),
            copies: c.copies.load(Ordering::Relaxed),
            bytes_copied: c.bytes_copied.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn count_submission(&self) {
        self.counters.submissions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn count_draw(&self) {
        self.counters.draws.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn count_dispatch(&self) {
        self.counters.dispatches.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn count_copy(&self, bytes: u64) {
        self.counters.copies.fetch_add(1, Ordering::Relaxed);
        self.counters.bytes_copied.fetch_add(bytes, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gci_core::presentation::GpuFence;

    #[test]
    fn handles_are_unique_and_non_null() {
        let gpu = SoftGpu::new(SoftConfig::default());
        let a = gpu.next_handle();
        let b = gpu.next_handle();
        assert_ne!(a, b);
        assert_ne!(a, GpuNativeHandle::default());
    }

    #[test]
    fn retire_all_only_touches_live_deferred_fences() {
        let gpu = SoftGpu::new(SoftConfig {
            fence_mode: SoftFenceMode::Deferred,
            ..SoftConfig::default()
        });
        let kept = gpu.create_fence(0);
        drop(gpu.create_fence(0));
        kept.signal_on_queue(GpuNativeHandle(1), 4);
        assert_eq!(kept.completed_value(), 0);
        assert_eq!(gpu.retire_all(), 1);
        assert_eq!(kept.completed_value(), 4);
        assert_eq!(gpu.retire_all(), 0);
    }
}
