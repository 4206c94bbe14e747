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
//! A headless backend that runs every hook on the CPU.
//!
//! Buffers live in host memory, submissions execute copies synchronously and
//! fences are condition variables. [`SoftFenceMode::Deferred`] and
//! [`SoftPresentOrder::Scripted`] let hosts model a GPU running behind the CPU
//! and a presentation engine that reorders back buffers.

mod buffer;
mod command;
mod device;
mod display;
mod driver;
mod fence;
mod gpu;
mod swap_chain;
mod texture;

pub use self::buffer::SoftBuffer;
pub use self::command::{SoftCommandBackend, SoftCommandList};
pub use self::device::{SoftDevice, SOFT_MAX_SAMPLE_COUNT};
pub use self::display::SoftDisplayManager;
pub use self::driver::SoftDriverBackend;
pub use self::fence::SoftFence;
pub use self::gpu::{SoftConfig, SoftFenceMode, SoftGpu, SoftGpuStats, SoftPresentOrder};
pub use self::swap_chain::SoftSwapChain;
pub use self::texture::SoftTexture;

use anyhow::{Context, Result};
use gci_core::driver::{GpuDevice, GpuDriver, GpuDriverRegistry, GraphicsBackendType};
use gci_core::settings::{GciSettings, GpuDeviceCreateInfo};
use std::sync::Arc;

/// A soft driver with the default configuration.
pub fn soft_driver() -> GpuDriver {
    soft_driver_with(SoftConfig::default()).0
}

/// A soft driver over a new simulated GPU configured by `config`.
pub fn soft_driver_with(config: SoftConfig) -> (GpuDriver, Arc<SoftGpu>) {
    let gpu = SoftGpu::new(config);
    let driver = GpuDriver::new(Box::new(SoftDriverBackend::new(gpu.clone())));
    (driver, gpu)
}

/// Registers the soft backend in `registry`.
pub fn register_soft_backend(registry: &mut GpuDriverRegistry) {
    registry.register(GraphicsBackendType::Soft, || Some(soft_driver()));
}

/// Opens a soft device with `settings`, its command system ready.
pub fn create_soft_device(
    settings: GciSettings,
    config: SoftConfig,
) -> Result<(Arc<GpuDevice>, Arc<SoftGpu>)> {
    let (driver, gpu) = soft_driver_with(config);
    let create_info = GpuDeviceCreateInfo {
        label: Some("soft".to_string()),
        settings,
        ..Default::default()
    };
    let device = driver
        .try_create_device(&create_info)
        .context("Failed to open the soft device")?;
    log::info!(
        "Soft device ready ({:?}).",
        device.config_flags()
    );
    Ok((device, gpu))
}
