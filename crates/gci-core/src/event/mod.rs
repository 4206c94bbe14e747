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

//! Advisory device notifications.
//!
//! The device publishes [`GpuDeviceEvent`]s on an [`EventBus`]; any number of
//! subscribers may drain them. Nothing in the core depends on an event being
//! consumed.

mod bus;

pub use self::bus::EventBus;

use crate::resource::{GpuResourceBaseType, GpuResourceId};

/// A notification published by a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpuDeviceEvent {
    /// A tracked resource's active-ref counter returned to zero.
    ///
    /// The resource is still alive; its owner decides what to do with it.
    ResourceActiveRefsZero {
        /// The resource.
        id: GpuResourceId,
        /// Its variant.
        base_type: GpuResourceBaseType,
    },
}
