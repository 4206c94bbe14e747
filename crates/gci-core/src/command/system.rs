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

use super::context::{CommandContext, CommandContextId, CommandContextState};
use super::queue::{CommandContextProperties, CommandListType, GpuQueueId};
use super::recorded::CommandBackend;
use crate::error::CommandError;
use crate::resource::GpuNativeHandle;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy)]
struct DeviceQueue {
    list_type: CommandListType,
    native: GpuNativeHandle,
}

/// Direct queues run every class of work, compute queues also run copies and
/// copy queues only copies. Bundles are never submitted on their own.
fn queue_accepts(queue: CommandListType, list: CommandListType) -> bool {
    match list {
        CommandListType::Direct => queue == CommandListType::Direct,
        CommandListType::Compute => queue.supports_compute(),
        CommandListType::Copy => queue != CommandListType::Bundle,
        CommandListType::Bundle => false,
    }
}

/// Counters of a [`CommandSystem`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommandSystemStats {
    /// Contexts created with a fresh native list.
    pub contexts_allocated: u64,
    /// Acquisitions served from a free pool.
    pub contexts_reused: u64,
    /// Successful submissions.
    pub contexts_submitted: u64,
    /// Contexts currently waiting in the free pools.
    pub contexts_pooled: usize,
    /// Native queues created.
    pub queues: usize,
}

/// Owns the device queues and the per-list-type context pools.
///
/// Not synchronized: the owning device serializes access.
pub struct CommandSystem {
    backend: Arc<dyn CommandBackend>,
    queues: HashMap<GpuQueueId, DeviceQueue>,
    aliases: HashMap<GpuQueueId, GpuQueueId>,
    free_contexts: [Vec<Box<CommandContext>>; CommandListType::COUNT],
    next_context_id: u64,
    stats: CommandSystemStats,
}

impl std::fmt::Debug for CommandSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandSystem")
            .field("queues", &self.queues.keys().collect::<Vec<_>>())
            .field("aliases", &self.aliases)
            .field("stats", &self.stats())
            .finish()
    }
}

impl CommandSystem {
    /// Creates an empty command system. No queue exists yet.
    pub fn new(backend: Arc<dyn CommandBackend>) -> Self {
        Self {
            backend,
            queues: HashMap::new(),
            aliases: HashMap::new(),
            free_contexts: Default::default(),
            next_context_id: 0,
            stats: CommandSystemStats::default(),
        }
    }

    /// Creates the graphics queue and aliases `Present` onto it.
    pub fn with_default_queues(backend: Arc<dyn CommandBackend>) -> Result<Self, CommandError> {
        let mut system = Self::new(backend);
        system.initialize_device_queue(GpuQueueId::DefaultGraphics, CommandListType::Direct)?;
        system.alias_device_queue(GpuQueueId::Present, GpuQueueId::DefaultGraphics)?;
        Ok(system)
    }

    /// Creates the native queue for `queue_id`.
    ///
    /// Initializing a queue that already exists, or an id that is an alias, is a
    /// no-op success.
    pub fn initialize_device_queue(
        &mut self,
        queue_id: GpuQueueId,
        list_type: CommandListType,
    ) -> Result<(), CommandError> {
        if self.queues.contains_key(&queue_id) || self.aliases.contains_key(&queue_id) {
            return Ok(());
        }
        if list_type == CommandListType::Bundle {
            return Err(CommandError::NativeQueueCreationFailed(queue_id));
        }
        let native = self
            .backend
            .create_native_queue(queue_id, list_type)
            .ok_or(CommandError::NativeQueueCreationFailed(queue_id))?;
        log::debug!("Created device queue {:?} ({:?}).", queue_id, list_type);
        self.queues.insert(queue_id, DeviceQueue { list_type, native });
        Ok(())
    }

    /// Makes `alias` resolve to the existing queue `target`.
    ///
    /// An id that already names a queue or an alias is left untouched.
    pub fn alias_device_queue(
        &mut self,
        alias: GpuQueueId,
        target: GpuQueueId,
    ) -> Result<(), CommandError> {
        if self.queues.contains_key(&alias) || self.aliases.contains_key(&alias) {
            return Ok(());
        }
        let resolved = self
            .resolve_queue(target)
            .ok_or(CommandError::UnknownQueue(target))?;
        log::debug!("Aliased device queue {:?} -> {:?}.", alias, resolved);
        self.aliases.insert(alias, resolved);
        Ok(())
    }

    /// Follows aliases to the queue that actually exists.
    pub fn resolve_queue(&self, queue_id: GpuQueueId) -> Option<GpuQueueId> {
        let resolved = self.aliases.get(&queue_id).copied().unwrap_or(queue_id);
        self.queues.contains_key(&resolved).then_some(resolved)
    }

    /// The native queue behind `queue_id`, after alias resolution.
    pub fn native_queue(&self, queue_id: GpuQueueId) -> Option<GpuNativeHandle> {
        self.resolve_queue(queue_id)
            .and_then(|id| self.queues.get(&id))
            .map(|queue| queue.native)
    }

    /// Returns a recording context able to record the classes in `properties`.
    ///
    /// A pooled context of the same native list type is reused when available.
    pub fn acquire_context(
        &mut self,
        properties: CommandContextProperties,
    ) -> Result<Box<CommandContext>, CommandError> {
        let list_type = properties.list_type();
        let mut context = match self.free_contexts[list_type.index()].pop() {
            Some(context) => {
                self.stats.contexts_reused += 1;
                log::trace!("Reusing pooled context {:?} ({:?}).", context.id(), list_type);
                context
            }
            None => {
                let native = self.backend.create_command_list(list_type)?;
                let id = CommandContextId(self.next_context_id);
                self.next_context_id += 1;
                self.stats.contexts_allocated += 1;
                log::trace!("Allocated context {:?} ({:?}).", id, list_type);
                Box::new(CommandContext::new(id, native))
            }
        };
        if !context.activate(properties) {
            let id = context.id();
            self.release_context(context);
            return Err(CommandError::NativeListCreationFailed(format!(
                "native list of context {id:?} failed to reset"
            )));
        }
        Ok(context)
    }

    /// Submits `context` to `queue_id`. Returns `false` on any failure.
    pub fn execute_context(&mut self, queue_id: GpuQueueId, context: &mut CommandContext) -> bool {
        match self.try_execute_context(queue_id, context) {
            Ok(()) => true,
            Err(err) => {
                log::error!("{err}");
                false
            }
        }
    }

    /// Submits `context` to `queue_id`.
    ///
    /// A context still recording is closed first. The queue id is resolved
    /// through aliases, and the queue must be able to run the context's list type.
    pub fn try_execute_context(
        &mut self,
        queue_id: GpuQueueId,
        context: &mut CommandContext,
    ) -> Result<(), CommandError> {
        let resolved = self
            .resolve_queue(queue_id)
            .ok_or(CommandError::UnknownQueue(queue_id))?;
        let queue = self.queues[&resolved];
        if !queue_accepts(queue.list_type, context.list_type()) {
            log::warn!(
                "Context {:?} ({:?}) cannot run on queue {:?} ({:?}).",
                context.id(),
                context.list_type(),
                resolved,
                queue.list_type
            );
            return Err(CommandError::SubmissionFailed(queue_id));
        }
        if context.state() == CommandContextState::Recording && !context.end_command_sequence() {
            return Err(CommandError::SubmissionFailed(queue_id));
        }
        if context.state() != CommandContextState::Executable {
            return Err(CommandError::SubmissionFailed(queue_id));
        }
        if !self.backend.submit(queue.native, context.native()) {
            return Err(CommandError::SubmissionFailed(queue_id));
        }
        context.mark_submitted();
        self.stats.contexts_submitted += 1;
        Ok(())
    }

    /// Returns `context` to the pool of its native list type.
    pub fn release_context(&mut self, mut context: Box<CommandContext>) {
        context.deactivate();
        self.free_contexts[context.list_type().index()].push(context);
    }

    /// The number of pooled contexts of one list type.
    pub fn free_context_count(&self, list_type: CommandListType) -> usize {
        self.free_contexts[list_type.index()].len()
    }

    /// Current counters.
    pub fn stats(&self) -> CommandSystemStats {
        CommandSystemStats {
            contexts_pooled: self.free_contexts.iter().map(Vec::len).sum(),
            queues: self.queues.len(),
            ..self.stats
        }
    }
}
