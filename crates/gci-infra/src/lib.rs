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
//! # GCI Infra
//!
//! Concrete implementations of the GCI backend hooks.
//!
//! The `soft` backend runs every hook on the CPU: buffers are plain byte
//! vectors, queues execute copies at submission and fences are condition
//! variables. It is what headless hosts and the integration tests drive.
//! [`logging`] bootstraps the `log` facade for hosts that have no logger of
//! their own.

#![warn(missing_docs)]

pub mod graphics;
pub mod logging;

#[cfg(feature = "soft")]
pub use graphics::soft::{
    create_soft_device, register_soft_backend, soft_driver, soft_driver_with, SoftConfig,
    SoftFenceMode, SoftGpu, SoftPresentOrder,
};
