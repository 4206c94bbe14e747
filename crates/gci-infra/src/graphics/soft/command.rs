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
use super::buffer::SoftBuffer;
use super::gpu::SoftGpu;
use gci_core::command::{
    CommandBackend, CommandListType, GpuCommand, GpuQueueId, NativeCommandList,
};
use gci_core::error::CommandError;
use gci_core::resource::{GpuBuffer, GpuNativeHandle};
use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// A command list of the soft backend: the closed command stream itself.
#[derive(Debug)]
pub struct SoftCommandList {
    native: GpuNativeHandle,
    list_type: CommandListType,
    commands: Vec<GpuCommand>,
    closed: bool,
}

impl SoftCommandList {
    /// The commands captured at the last close.
    pub fn commands(&self) -> &[GpuCommand] {
        &self.commands
    }

    /// Returns `true` once the list is closed and ready for submission.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl NativeCommandList for SoftCommandList {
    fn list_type(&self) -> CommandListType {
        self.list_type
    }

    fn native_handle(&self) -> GpuNativeHandle {
        self.native
    }

    fn reset(&mut self) -> bool {
        self.commands.clear();
        self.closed = false;
        true
    }

    fn close(&mut self, commands: &[GpuCommand]) -> bool {
        if self.closed {
            return false;
        }
        self.commands = commands.to_vec();
        self.closed = true;
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug, Clone, Copy)]
struct SoftQueue {
    id: GpuQueueId,
    list_type: CommandListType,
    submitted: u64,
}

/// Queues of the soft backend. Submission executes the list synchronously.
#[derive(Debug)]
pub struct SoftCommandBackend {
    gpu: Arc<SoftGpu>,
    queues: Mutex<HashMap<GpuNativeHandle, SoftQueue>>,
}

impl SoftCommandBackend {
    /// Creates the queue set of one device.
    pub fn new(gpu: Arc<SoftGpu>) -> Self {
        Self {
            gpu,
            queues: Mutex::new(HashMap::new()),
        }
    }

    /// Lists submitted so far to the native queue `queue`.
    pub fn submitted_on(&self, queue: GpuNativeHandle) -> Option<u64> {
        self.queues
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&queue)
            .map(|queue| queue.submitted)
    }

    fn execute(&self, commands: &[GpuCommand]) -> bool {
        for command in commands {
            match command {
                GpuCommand::CopyBuffer {
                    src,
                    src_offset,
                    dst,
                    dst_offset,
                    size,
                } => {
                    if !copy_buffer(src, *src_offset, dst, *dst_offset, *size) {
                        log::error!(
                            "Soft copy {:?} -> {:?} of {} bytes failed.",
                            src,
                            dst,
                            size
                        );
                        return false;
                    }
                    self.gpu.count_copy(*size);
                }
                GpuCommand::Draw { .. } | GpuCommand::DrawIndexed { .. } => self.gpu.count_draw(),
                GpuCommand::Dispatch { .. } => self.gpu.count_dispatch(),
                _ => {}
            }
        }
        true
    }
}

fn copy_buffer(src: &GpuBuffer, src_offset: u64, dst: &GpuBuffer, dst_offset: u64, size: u64) -> bool {
    let (Some(src), Some(dst)) = (SoftBuffer::of(src), SoftBuffer::of(dst)) else {
        return false;
    };
    // Read first: both sides lock their own storage.
    src.read(src_offset, size)
        .is_some_and(|bytes| dst.write(dst_offset, &bytes))
}

impl CommandBackend for SoftCommandBackend {
    fn create_native_queue(
        &self,
        queue_id: GpuQueueId,
        list_type: CommandListType,
    ) -> Option<GpuNativeHandle> {
        let native = self.gpu.next_handle();
        self.queues
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(
                native,
                SoftQueue {
                    id: queue_id,
                    list_type,
                    submitted: 0,
                },
            );
        log::debug!("Soft queue {native:?} created for {queue_id:?} ({list_type:?}).");
        Some(native)
    }

    fn create_command_list(
        &self,
        list_type: CommandListType,
    ) -> Result<Box<dyn NativeCommandList>, CommandError> {
        Ok(Box::new(SoftCommandList {
            native: self.gpu.next_handle(),
            list_type,
            commands: Vec::new(),
            closed: false,
        }))
    }

    fn submit(&self, queue: GpuNativeHandle, list: &dyn NativeCommandList) -> bool {
        let Some(list) = list.as_any().downcast_ref::<SoftCommandList>() else {
            log::error!("A foreign command list was submitted to soft queue {queue:?}.");
            return false;
        };
        if !list.is_closed() {
            log::warn!("Command list {:?} submitted while open.", list.native);
            return false;
        }
        {
            let mut queues = self.queues.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            let Some(target) = queues.get_mut(&queue) else {
                log::error!("Submission to unknown soft queue {queue:?}.");
                return false;
            };
            target.submitted += 1;
            log::trace!(
                "Submitting {} commands to {:?} ({:?} queue).",
                list.commands.len(),
                target.id,
                target.list_type
            );
        }
        self.gpu.count_submission();
        self.execute(&list.commands)
    }
}
