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

use super::adapter::GraphicsBackendType;
use super::backend::GpuDriverBackend;
use super::device::GpuDevice;
use super::display::DisplayManager;
use crate::error::GciError;
use crate::settings::{GpuDeviceCreateInfo, GpuDriverConfigFlags};
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// The entry point of one backend: creates devices and display managers.
pub struct GpuDriver {
    backend: Box<dyn GpuDriverBackend>,
    config_flags: AtomicU32,
}

impl fmt::Debug for GpuDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GpuDriver")
            .field("backend_type", &self.backend_type())
            .field("config_flags", &self.config_flags())
            .finish()
    }
}

impl GpuDriver {
    /// Wraps a backend. No config flag is set.
    pub fn new(backend: Box<dyn GpuDriverBackend>) -> Self {
        Self {
            backend,
            config_flags: AtomicU32::new(0),
        }
    }

    /// The native API of this driver.
    pub fn backend_type(&self) -> GraphicsBackendType {
        self.backend.backend_type()
    }

    /// Returns `true` for the driver that creates nothing.
    pub fn is_null_driver(&self) -> bool {
        self.backend.is_null_driver()
    }

    /// The config flags the backend honors.
    pub fn supported_config_flags(&self) -> GpuDriverConfigFlags {
        self.backend.supported_config_flags()
    }

    /// The stored config flags.
    pub fn config_flags(&self) -> GpuDriverConfigFlags {
        GpuDriverConfigFlags::from_bits_truncate(self.config_flags.load(Ordering::Acquire))
    }

    fn mask_config_flags(&self, requested: GpuDriverConfigFlags) -> GpuDriverConfigFlags {
        let supported = self.supported_config_flags();
        let dropped = requested - supported;
        if !dropped.is_empty() {
            log::warn!(
                "{:?} driver does not support {:?}; ignoring them.",
                self.backend_type(),
                dropped
            );
        }
        requested & supported
    }

    /// Stores `flags` reduced to the supported subset. Unsupported bits are
    /// dropped, not rejected. Returns the stored flags.
    pub fn set_config_flags(&self, flags: GpuDriverConfigFlags) -> GpuDriverConfigFlags {
        let effective = self.mask_config_flags(flags);
        self.config_flags.store(effective.bits(), Ordering::Release);
        effective
    }

    /// Opens a device and initializes its command system.
    ///
    /// Returns `None` if the backend cannot open the device.
    pub fn create_device(&self, create_info: &GpuDeviceCreateInfo) -> Option<Arc<GpuDevice>> {
        match self.try_create_device(create_info) {
            Ok(device) => Some(device),
            Err(err) => {
                if !self.is_null_driver() {
                    log::error!("{err}");
                }
                None
            }
        }
    }

    /// Opens a device and initializes its command system.
    ///
    /// The device runs with the driver's stored flags plus the supported
    /// subset of `create_info.settings.driver_config_flags`.
    pub fn try_create_device(
        &self,
        create_info: &GpuDeviceCreateInfo,
    ) -> Result<Arc<GpuDevice>, GciError> {
        let flags =
            self.config_flags() | self.mask_config_flags(create_info.settings.driver_config_flags);
        let backend = self
            .backend
            .create_device_backend(create_info, flags)
            .ok_or_else(|| {
                GciError::DeviceCreationFailed(format!(
                    "{:?} backend could not open adapter {}",
                    self.backend_type(),
                    create_info.adapter_index
                ))
            })?;
        let device = GpuDevice::new(backend, create_info, flags);
        device.initialize_command_system()?;
        log::info!(
            "Created {:?} device on '{}'.",
            self.backend_type(),
            device.adapter_info().name
        );
        Ok(device)
    }

    /// Creates the display enumerator of the platform.
    pub fn create_default_display_manager(&self) -> Option<Box<dyn DisplayManager>> {
        self.backend.create_default_display_manager()
    }
}
