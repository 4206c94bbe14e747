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

//! Drivers, devices and the backend hook boundary.
//!
//! A [`GpuDriver`] wraps one backend and opens [`GpuDevice`]s. The device owns
//! every generic subsystem and forwards native work to the hooks in
//! [`backend`]. The [`null_driver`] creates nothing and is the fallback when no
//! backend is available.

mod adapter;
pub mod backend;
mod device;
mod display;
mod gpu_driver;
mod null;
mod registry;

pub use self::adapter::{GraphicsAdapterInfo, GraphicsBackendType, RendererDeviceType};
pub use self::backend::{GpuDeviceBackend, GpuDriverBackend};
pub use self::device::GpuDevice;
pub use self::display::{DisplayInfo, DisplayManager};
pub use self::gpu_driver::GpuDriver;
pub use self::null::{null_driver, NullDriverBackend};
pub use self::registry::GpuDriverRegistry;
