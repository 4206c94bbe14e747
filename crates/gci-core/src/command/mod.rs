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

//! Command context pooling, recording and submission.
//!
//! A [`CommandSystem`] owns the device queues and one free pool of
//! [`CommandContext`]s per native command list type. Rendering code acquires a
//! context, records backend-neutral [`GpuCommand`]s through it, executes it on a
//! queue and releases it back to the pool.

mod context;
mod queue;
mod recorded;
pub(crate) mod system;

pub use self::context::{CommandContext, CommandContextId, CommandContextState};
pub use self::queue::{
    CommandClassFlags, CommandContextProperties, CommandContextType, CommandListType, GpuQueueId,
};
pub use self::recorded::{
    CommandBackend, DescriptorBinding, GpuCommand, NativeCommandList, Viewport,
};
pub use self::system::{CommandSystem, CommandSystemStats};
