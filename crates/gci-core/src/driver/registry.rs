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
use super::gpu_driver::GpuDriver;
use super::null::NullDriverBackend;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

type DriverFactory = Box<dyn Fn() -> Option<GpuDriver> + Send + Sync>;

/// Maps backend types to driver factories, resolved at startup.
#[derive(Default)]
pub struct GpuDriverRegistry {
    factories: HashMap<GraphicsBackendType, DriverFactory>,
}

impl fmt::Debug for GpuDriverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GpuDriverRegistry")
            .field("backends", &self.registered())
            .finish()
    }
}

impl GpuDriverRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `factory` for `backend_type`, replacing any previous one.
    ///
    /// A factory returns `None` when its API is unavailable on this machine.
    pub fn register<F>(&mut self, backend_type: GraphicsBackendType, factory: F)
    where
        F: Fn() -> Option<GpuDriver> + Send + Sync + 'static,
    {
        if self
            .factories
            .insert(backend_type, Box::new(factory))
            .is_some()
        {
            log::debug!("Replaced the {:?} driver factory.", backend_type);
        }
    }

    /// Returns `true` if a factory is registered for `backend_type`.
    pub fn is_registered(&self, backend_type: GraphicsBackendType) -> bool {
        self.factories.contains_key(&backend_type)
    }

    /// The registered backend types, in no particular order.
    pub fn registered(&self) -> Vec<GraphicsBackendType> {
        self.factories.keys().copied().collect()
    }

    /// Creates the driver of `backend_type`, if registered and available.
    pub fn create(&self, backend_type: GraphicsBackendType) -> Option<GpuDriver> {
        self.factories.get(&backend_type).and_then(|factory| factory())
    }

    /// Creates the first available driver in `preferred` order, falling back
    /// to a null driver.
    pub fn select(&self, preferred: &[GraphicsBackendType]) -> Arc<GpuDriver> {
        for backend_type in preferred {
            match self.create(*backend_type) {
                Some(driver) => {
                    log::info!("Selected the {:?} driver.", backend_type);
                    return Arc::new(driver);
                }
                None if self.is_registered(*backend_type) => {
                    log::warn!("The {:?} driver is unavailable.", backend_type);
                }
                None => {}
            }
        }
        log::warn!("No preferred driver is available, falling back to the null driver.");
        Arc::new(GpuDriver::new(Box::new(NullDriverBackend)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::backend::{GpuDeviceBackend, GpuDriverBackend};
    use crate::driver::display::DisplayManager;
    use crate::settings::{GpuDeviceCreateInfo, GpuDriverConfigFlags};

    struct TaggedBackend(GraphicsBackendType);

    impl GpuDriverBackend for TaggedBackend {
        fn backend_type(&self) -> GraphicsBackendType {
            self.0
        }
        fn supported_config_flags(&self) -> GpuDriverConfigFlags {
            GpuDriverConfigFlags::all()
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

    #[test]
    fn select_takes_the_first_available_backend() {
        let mut registry = GpuDriverRegistry::new();
        registry.register(GraphicsBackendType::Dx12, || None);
        registry.register(GraphicsBackendType::Vulkan, || {
            Some(GpuDriver::new(Box::new(TaggedBackend(GraphicsBackendType::Vulkan))))
        });
        assert!(registry.is_registered(GraphicsBackendType::Dx12));
        assert!(registry.create(GraphicsBackendType::Dx12).is_none());

        let driver = registry.select(&[
            GraphicsBackendType::Metal,
            GraphicsBackendType::Dx12,
            GraphicsBackendType::Vulkan,
        ]);
        assert_eq!(driver.backend_type(), GraphicsBackendType::Vulkan);
        assert!(!driver.is_null_driver());
        assert_eq!(registry.registered().len(), 2);
    }

    #[test]
    fn empty_registry_falls_back_to_null() {
        let registry = GpuDriverRegistry::new();
        let driver = registry.select(&[GraphicsBackendType::Vulkan]);
        assert!(driver.is_null_driver());
        assert!(registry.create(GraphicsBackendType::Vulkan).is_none());
    }
}
