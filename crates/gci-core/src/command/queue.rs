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

/// Identifies a device queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GpuQueueId {
    /// The main graphics queue. Always created with the command system.
    DefaultGraphics,
    /// A compute queue running alongside graphics.
    AsyncCompute,
    /// A copy queue.
    Transfer,
    /// The queue presentation signals on. Aliases `DefaultGraphics` by default.
    Present,
    /// An application-defined queue.
    Custom(u32),
}

/// The native command list (and queue) type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandListType {
    /// Graphics, compute and copy work.
    Direct,
    /// Compute and copy work.
    Compute,
    /// Copy work only.
    Copy,
    /// A secondary list replayed from a direct list. Never submitted to a queue.
    Bundle,
}

impl CommandListType {
    /// The number of list types.
    pub const COUNT: usize = 4;

    /// A dense index in `[0, COUNT)`.
    pub const fn index(self) -> usize {
        match self {
            CommandListType::Direct => 0,
            CommandListType::Compute => 1,
            CommandListType::Copy => 2,
            CommandListType::Bundle => 3,
        }
    }

    /// Returns `true` if draw calls may be recorded.
    pub fn supports_graphics(self) -> bool {
        matches!(self, CommandListType::Direct | CommandListType::Bundle)
    }

    /// Returns `true` if dispatches may be recorded.
    pub fn supports_compute(self) -> bool {
        matches!(self, CommandListType::Direct | CommandListType::Compute)
    }
}

bitflags! {
    /// The classes of work a context will record.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct CommandClassFlags: u32 {
        /// Draws and render target operations.
        const GRAPHICS = 1 << 0;
        /// Dispatches.
        const COMPUTE = 1 << 1;
        /// Copies.
        const TRANSFER = 1 << 2;
    }
}

/// Whether a context is submitted directly or replayed from another one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CommandContextType {
    /// Submitted to a queue.
    #[default]
    Primary,
    /// Replayed from a primary context.
    Secondary,
}

/// What a caller asks of a context when acquiring one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CommandContextProperties {
    /// Primary or secondary.
    pub context_type: CommandContextType,
    /// The work classes that will be recorded.
    pub class_flags: CommandClassFlags,
}

impl CommandContextProperties {
    /// A primary graphics context.
    pub const GRAPHICS: Self = Self {
        context_type: CommandContextType::Primary,
        class_flags: CommandClassFlags::GRAPHICS,
    };

    /// A primary compute context.
    pub const COMPUTE: Self = Self {
        context_type: CommandContextType::Primary,
        class_flags: CommandClassFlags::COMPUTE,
    };

    /// A primary copy context.
    pub const TRANSFER: Self = Self {
        context_type: CommandContextType::Primary,
        class_flags: CommandClassFlags::TRANSFER,
    };

    /// The narrowest native list type able to record every requested class.
    pub fn list_type(&self) -> CommandListType {
        if self.context_type == CommandContextType::Secondary {
            return CommandListType::Bundle;
        }
        let flags = self.class_flags;
        if flags.is_empty() || flags.contains(CommandClassFlags::GRAPHICS) {
            CommandListType::Direct
        } else if flags.contains(CommandClassFlags::COMPUTE) {
            CommandListType::Compute
        } else {
            CommandListType::Copy
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn properties_map_to_narrowest_list_type() {
        assert_eq!(CommandContextProperties::GRAPHICS.list_type(), CommandListType::Direct);
        assert_eq!(CommandContextProperties::COMPUTE.list_type(), CommandListType::Compute);
        assert_eq!(CommandContextProperties::TRANSFER.list_type(), CommandListType::Copy);
        let mixed = CommandContextProperties {
            class_flags: CommandClassFlags::COMPUTE | CommandClassFlags::TRANSFER,
            ..Default::default()
        };
        assert_eq!(mixed.list_type(), CommandListType::Compute);
        let secondary = CommandContextProperties {
            context_type: CommandContextType::Secondary,
            class_flags: CommandClassFlags::GRAPHICS,
        };
        assert_eq!(secondary.list_type(), CommandListType::Bundle);
        assert_eq!(CommandContextProperties::default().list_type(), CommandListType::Direct);
    }

    #[test]
    fn list_type_indices_are_dense() {
        let all = [
            CommandListType::Direct,
            CommandListType::Compute,
            CommandListType::Copy,
            CommandListType::Bundle,
        ];
        for (i, ty) in all.into_iter().enumerate() {
            assert_eq!(ty.index(), i);
        }
        assert_eq!(all.len(), CommandListType::COUNT);
    }
}
