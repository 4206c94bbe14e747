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
use super::device::SoftDevice;
use super::display::SoftDisplayManager;
use super::gpu::SoftGpu;
use gci_core::driver::{DisplayManager, GpuDeviceBackend, GpuDriverBackend, GraphicsBackendType};
use gci_core::settings::{GpuDeviceCreateInfo, GpuDriverConfigFlags};
use std::sync::Arc;

/// The driver half of the soft backend. It exposes a single adapter.
#[derive(Debug, Clone)]
pub struct SoftDriverBackend {
    gpu: Arc<SoftGpu>,
}

impl SoftDriverBackend {
    /// Creates a driver over `gpu`.
    pub fn new(gpu: Arc<SoftGpu>) -> Self {
        Self { gpu }
    }

    /// The simulated GPU behind the driver.
    pub fn gpu(&self) -> &Arc<SoftGpu> {
        &self.gpu
    }
}

impl GpuDriverBackend for SoftDriverBackend {
    fn backend_type(&self) -> GraphicsBackendType {
        GraphicsBackendType::Soft
    }

    fn supported_config_flags(&self) -> GpuDriverConfigFlags {
        GpuDriverConfigFlags::all()
    }

    fn create_device_backend(
        &self,
        create_info: &GpuDeviceCreateInfo,
        config_flags: GpuDriverConfigFlags,
    ) -> Option<Box<dyn GpuDeviceBackend>> {
        if create_info.adapter_index != 0 {
            log::error!(
                "The soft driver has one adapter, index {} was requested.",
                create_info.adapter_index
            );
            return None;
        }
        Some(Box::new(SoftDevice::new(self.gpu.clone(), config_flags)))
    }

    fn create_default_display_manager(&self) -> Option<Box<dyn DisplayManager>> {
        Some(Box::new(SoftDisplayManager::new(
            self.gpu.config().displays.clone(),
        )))
    }
}
