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
use super::gpu::SoftFenceMode;
use gci_core::presentation::GpuFence;
use gci_core::resource::GpuNativeHandle;
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::Duration;

#[derive(Debug)]
struct FenceValues {
    completed: u64,
    pending: u64,
}

/// A fence backed by a mutex and a condition variable.
#[derive(Debug)]
pub struct SoftFence {
    mode: SoftFenceMode,
    values: Mutex<FenceValues>,
    reached: Condvar,
}

impl SoftFence {
    /// Creates a fence whose completed value starts at `initial_value`.
    pub fn new(initial_value: u64, mode: SoftFenceMode) -> Self {
        Self {
            mode,
            values: Mutex::new(FenceValues {
                completed: initial_value,
                pending: initial_value,
            }),
            reached: Condvar::new(),
        }
    }

    fn values(&self) -> MutexGuard<'_, FenceValues> {
        self.values.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// The highest value signaled so far, completed or not.
    pub fn pending_value(&self) -> u64 {
        self.values().pending
    }

    /// Advances the completed value to `value` and wakes waiters.
    ///
    /// The completed value never moves backwards.
    pub fn complete_up_to(&self, value: u64) {
        let mut values = self.values();
        if value > values.completed {
            values.completed = value;
            values.pending = values.pending.max(value);
            self.reached.notify_all();
        }
    }

    /// Completes every pending signal. Returns `false` if nothing was pending.
    pub fn complete_pending(&self) -> bool {
        let mut values = self.values();
        if values.pending <= values.completed {
            return false;
        }
        values.completed = values.pending;
        self.reached.notify_all();
        true
    }
}

impl GpuFence for SoftFence {
    fn completed_value(&self) -> u64 {
        self.values().completed
    }

    fn signal_on_queue(&self, queue: GpuNativeHandle, value: u64) -> bool {
        log::trace!("Fence signal {value} enqueued on queue {queue:?}.");
        match self.mode {
            SoftFenceMode::Immediate => self.complete_up_to(value),
            SoftFenceMode::Deferred => {
                let mut values = self.values();
                values.pending = values.pending.max(value);
            }
        }
        true
    }

    fn wait_for_value(&self, value: u64, timeout: Option<Duration>) -> bool {
        let values = self.values();
        if values.completed >= value {
            return true;
        }
        log::trace!(
            "Waiting for fence value {value} (completed {}).",
            values.completed
        );
        match timeout {
            None => {
                let _values = self
                    .reached
                    .wait_while(values, |values| values.completed < value)
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                true
            }
            Some(timeout) => {
                let (values, _) = self
                    .reached
                    .wait_timeout_while(values, timeout, |values| values.completed < value)
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                values.completed >= value
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn immediate_signals_complete_at_once() {
        let fence = SoftFence::new(0, SoftFenceMode::Immediate);
        assert!(fence.signal_on_queue(GpuNativeHandle(1), 3));
        assert_eq!(fence.completed_value(), 3);
        assert!(fence.wait_for_value(2, Some(Duration::ZERO)));
    }

    #[test]
    fn completed_value_never_regresses() {
        let fence = SoftFence::new(5, SoftFenceMode::Immediate);
        fence.signal_on_queue(GpuNativeHandle(1), 2);
        assert_eq!(fence.completed_value(), 5);
    }

    #[test]
    fn deferred_wait_times_out_until_completed() {
        let fence = SoftFence::new(0, SoftFenceMode::Deferred);
        fence.signal_on_queue(GpuNativeHandle(1), 1);
        assert_eq!(fence.pending_value(), 1);
        assert!(!fence.wait_for_value(1, Some(Duration::from_millis(5))));
        assert!(fence.complete_pending());
        assert!(fence.wait_for_value(1, Some(Duration::ZERO)));
        assert!(!fence.complete_pending());
    }

    #[test]
    fn unbounded_wait_wakes_on_completion() {
        let fence = Arc::new(SoftFence::new(0, SoftFenceMode::Deferred));
        let waiter = {
            let fence = fence.clone();
            thread::spawn(move || fence.wait_for_value(7, None))
        };
        thread::sleep(Duration::from_millis(10));
        fence.complete_up_to(7);
        assert!(waiter.join().unwrap());
    }
}
