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
use super::backend::{GpuDeviceBackend, GpuDriverBackend};
use super::display::DisplayManager;
use super::gpu_driver::GpuDriver;
use crate::settings::{GpuDeviceCreateInfo, GpuDriverConfigFlags};
use std::sync::OnceLock;

/// The backend of the null driver. Every creation hook returns nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDriverBackend;

impl GpuDriverBackend for NullDriverBackend {
    fn backend_type(&self) -> GraphicsBackendType {
        GraphicsBackendType::Null
    }

    fn is_null_driver(&self) -> bool {
        true
    }

    fn supported_config_flags(&self) -> GpuDriverConfigFlags {
        GpuDriverConfigFlags::empty()
    }

    fn create_device_backend(
        &self,
        _create_info: &GpuDeviceCreateInfo,
        _config_flags: GpuDriverConfigFlags,
    ) -> Option<Box<dyn GpuDeviceBackend>> {
        None
    }

    fn create_default_display_manager(&self) -> Option<Box<dyn DisplayManager>> {
        None
    }
}

/// The process-wide null driver.
///
/// The safe default when no backend is available: it never creates a device.
pub fn null_driver() -> &'static GpuDriver {
    static NULL_DRIVER: OnceLock<GpuDriver> = OnceLock::new();
    NULL_DRIVER.get_or_init(|| GpuDriver::new(Box::new(NullDriverBackend)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::GciSettings;

    #[test]
    fn null_driver_creates_nothing() {
        let driver = null_driver();
        assert!(driver.is_null_driver());
        assert_eq!(driver.backend_type(), GraphicsBackendType::Null);
        for adapter_index in 0..3 {
            let info = GpuDeviceCreateInfo {
                adapter_index,
                label: Some("headless".to_string()),
                settings: GciSettings {
                    driver_config_flags: GpuDriverConfigFlags::all(),
                    ..GciSettings::default()
                },
            };
            assert!(driver.create_device(&info).is_none());
        }
        assert!(driver.create_default_display_manager().is_none());
    }

    #[test]
    fn null_driver_is_a_singleton() {
        assert!(std::ptr::eq(null_driver(), null_driver()));
    }

    #[test]
    fn null_driver_drops_every_config_flag() {
        let driver = GpuDriver::new(Box::new(NullDriverBackend));
        assert_eq!(
            driver.set_config_flags(GpuDriverConfigFlags::DEBUG_LAYER),
            GpuDriverConfigFlags::empty()
        );
        assert!(driver.config_flags().is_empty());
    }
}
