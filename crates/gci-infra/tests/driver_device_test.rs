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
use anyhow::Result;
use gci_core::driver::{GpuDriverRegistry, GraphicsBackendType, RendererDeviceType};
use gci_core::settings::{GciSettings, GpuDeviceCreateInfo, GpuDriverConfigFlags};
use gci_core::{null_driver, GciError};
use gci_infra::{create_soft_device, register_soft_backend, soft_driver, SoftConfig};

#[test]
fn test_soft_driver_opens_a_ready_device() -> Result<()> {
    let driver = soft_driver();
    assert_eq!(driver.backend_type(), GraphicsBackendType::Soft);
    assert!(!driver.is_null_driver());

    let device = driver.try_create_device(&GpuDeviceCreateInfo::default())?;
    assert_eq!(device.backend_type(), GraphicsBackendType::Soft);
    assert_eq!(device.adapter_info().device_type, RendererDeviceType::Cpu);
    assert_eq!(device.pools().len(), 3);
    assert!(device.command_system().is_ok());
    assert!(device.is_resource_tracking_enabled());
    Ok(())
}

#[test]
fn test_missing_adapter_fails_softly() {
    let driver = soft_driver();
    let info = GpuDeviceCreateInfo {
        adapter_index: 3,
        ..Default::default()
    };
    assert!(driver.create_device(&info).is_none());
    assert!(matches!(
        driver.try_create_device(&info),
        Err(GciError::DeviceCreationFailed(_))
    ));
}

#[test]
fn test_null_driver_creates_nothing() {
    let driver = null_driver();
    assert!(driver.is_null_driver());
    assert!(driver.create_device(&GpuDeviceCreateInfo::default()).is_none());
    assert!(driver.create_default_display_manager().is_none());
    assert_eq!(
        driver.set_config_flags(GpuDriverConfigFlags::all()),
        GpuDriverConfigFlags::empty()
    );
}

#[test]
fn test_registry_prefers_registered_backends() {
    let mut registry = GpuDriverRegistry::new();
    let fallback = registry.select(&[GraphicsBackendType::Vulkan, GraphicsBackendType::Soft]);
    assert!(fallback.is_null_driver());

    register_soft_backend(&mut registry);
    assert!(registry.is_registered(GraphicsBackendType::Soft));
    let driver = registry.select(&[GraphicsBackendType::Vulkan, GraphicsBackendType::Soft]);
    assert_eq!(driver.backend_type(), GraphicsBackendType::Soft);
}

#[test]
fn test_settings_flags_reach_the_device() -> Result<()> {
    let settings = GciSettings::from_json_str(
        r#"{ "driver_config_flags": "MULTI_QUEUE | PERSISTENT_MAPPING", "frame_queue_size": 9 }"#,
    )?;
    assert_eq!(settings.clamped_frame_queue_size(), 4);

    let (device, _gpu) = create_soft_device(settings, SoftConfig::default())?;
    assert!(device
        .config_flags()
        .contains(GpuDriverConfigFlags::MULTI_QUEUE | GpuDriverConfigFlags::PERSISTENT_MAPPING));
    assert!(!device.is_resource_tracking_enabled());
    assert_eq!(device.command_system()?.stats().queues, 3);
    Ok(())
}

#[test]
fn test_display_manager_reports_configured_outputs() {
    let manager = soft_driver()
        .create_default_display_manager()
        .expect("soft driver has a display manager");
    let primary = manager.primary_display().expect("one output is configured");
    assert!(primary.primary);
    assert_eq!((primary.width, primary.height), (1920, 1080));
}
