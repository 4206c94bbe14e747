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
use gci_core::driver::GpuDevice;
use gci_core::event::GpuDeviceEvent;
use gci_core::memory::GpuMemoryRegion;
use gci_core::resource::{
    GpuBuffer, GpuBufferBindFlags, GpuBufferCreateInfo, GpuBufferReference, GpuMemoryAccessFlags,
    GpuResource, GpuResourceBaseType,
};
use gci_core::settings::{GciSettings, GpuDriverConfigFlags};
use gci_infra::graphics::soft::SoftBuffer;
use gci_infra::{create_soft_device, SoftConfig};
use std::sync::Arc;

fn device(flags: GpuDriverConfigFlags) -> Result<Arc<GpuDevice>> {
    let settings = GciSettings {
        driver_config_flags: flags,
        ..GciSettings::default()
    };
    Ok(create_soft_device(settings, SoftConfig::default())?.0)
}

fn buffer(
    device: &GpuDevice,
    size: u64,
    access: GpuMemoryAccessFlags,
    bind_flags: GpuBufferBindFlags,
    init_data: Option<&[u8]>,
) -> Result<Arc<GpuBuffer>> {
    Ok(device.create_buffer(&GpuBufferCreateInfo {
        label: None,
        buffer_size: size,
        bind_flags,
        memory_access: access,
        init_data,
        ..Default::default()
    })?)
}

fn contents(buffer: &GpuBuffer) -> Vec<u8> {
    SoftBuffer::of(buffer)
        .expect("buffer comes from the soft backend")
        .snapshot()
}

#[test]
fn test_map_write_unmap_round() -> Result<()> {
    let device = device(GpuDriverConfigFlags::empty())?;
    let upload = buffer(
        &device,
        16,
        GpuMemoryAccessFlags::CPU_WRITE,
        GpuBufferBindFlags::COPY_SRC,
        None,
    )?;

    let mapped = upload
        .map_region(GpuMemoryRegion::new(4, 8), GpuMemoryAccessFlags::CPU_WRITE)
        .expect("upload buffers map for writing");
    assert_eq!(mapped.region(), GpuMemoryRegion::new(4, 8));
    assert!(upload.is_mapped());
    assert!(upload
        .map_region(GpuMemoryRegion::whole(), GpuMemoryAccessFlags::CPU_WRITE)
        .is_none());

    assert!(upload.write_mapped(4, &[1, 2, 3, 4]));
    assert!(!upload.write_mapped(10, &[0; 4]));
    assert!(upload.flush_mapped_region(GpuMemoryRegion::new(4, 4)));
    assert!(!upload.flush_mapped_region(GpuMemoryRegion::new(0, 4)));
    assert!(upload.unmap());
    assert!(!upload.unmap());

    let bytes = contents(&upload);
    assert_eq!(&bytes[4..8], &[1, 2, 3, 4]);
    assert!(bytes[..4].iter().all(|&b| b == 0));
    Ok(())
}

#[test]
fn test_mapping_owns_the_memory_lock() -> Result<()> {
    let device = device(GpuDriverConfigFlags::empty())?;
    let upload = buffer(
        &device,
        64,
        GpuMemoryAccessFlags::CPU_WRITE,
        GpuBufferBindFlags::COPY_SRC,
        None,
    )?;
    let memory = upload
        .resource_core()
        .memory_info()
        .memory
        .as_ref()
        .expect("device buffers are bound to a pool region");

    let held = memory.try_scoped_lock().expect("nobody holds the region yet");
    assert!(upload
        .map_region(GpuMemoryRegion::whole(), GpuMemoryAccessFlags::CPU_WRITE)
        .is_none());
    assert!(!upload.write_mapped(0, &[1]));
    assert!(!upload.update_sub_data_copy(0, &[1]));
    drop(held);

    let racers: Vec<_> = (0..4)
        .map(|_| {
            let upload = upload.clone();
            std::thread::spawn(move || {
                upload
                    .map_region(GpuMemoryRegion::whole(), GpuMemoryAccessFlags::CPU_WRITE)
                    .is_some()
            })
        })
        .collect();
    let mut winners = 0;
    for racer in racers {
        if racer.join().expect("map thread panicked") {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);
    assert!(memory.is_locked());
    assert!(upload.unmap());
    assert!(!memory.is_locked());
    assert!(upload.update_sub_data_copy(0, &[1]));
    Ok(())
}

#[test]
fn test_map_requests_are_validated() -> Result<()> {
    let device = device(GpuDriverConfigFlags::empty())?;
    let readback = buffer(
        &device,
        8,
        GpuMemoryAccessFlags::CPU_READ,
        GpuBufferBindFlags::COPY_DST,
        Some(&[9, 8, 7, 6, 5, 4, 3, 2]),
    )?;
    assert!(!readback.validate_map_request(GpuMemoryRegion::whole(), GpuMemoryAccessFlags::CPU_WRITE));
    assert!(!readback.validate_map_request(GpuMemoryRegion::new(4, 8), GpuMemoryAccessFlags::CPU_READ));
    assert!(!readback.validate_map_request(GpuMemoryRegion::new(2, 0), GpuMemoryAccessFlags::CPU_READ));

    readback
        .map_region(GpuMemoryRegion::whole(), GpuMemoryAccessFlags::CPU_READ)
        .expect("readback buffers map for reading");
    let mut out = [0u8; 3];
    assert!(readback.invalidate_region(GpuMemoryRegion::new(5, 3)));
    assert!(readback.read_mapped(5, &mut out));
    assert_eq!(out, [4, 3, 2]);
    assert!(!readback.write_mapped(0, &[1]));
    readback.unmap();

    let local = buffer(
        &device,
        8,
        GpuMemoryAccessFlags::GPU_READ,
        GpuBufferBindFlags::VERTEX,
        None,
    )?;
    assert!(local
        .map_region(GpuMemoryRegion::whole(), GpuMemoryAccessFlags::CPU_READ)
        .is_none());
    Ok(())
}

#[test]
fn test_sub_data_updates_pick_their_path() -> Result<()> {
    let device = device(GpuDriverConfigFlags::empty())?;
    let vertices = buffer(
        &device,
        32,
        GpuMemoryAccessFlags::GPU_READ,
        GpuBufferBindFlags::VERTEX | GpuBufferBindFlags::COPY_DST,
        None,
    )?;
    assert!(vertices.update_sub_data_pod(16, &[1.0f32, 2.0]));
    assert!(!vertices.update_sub_data_pod(28, &[1.0f32, 2.0]));
    assert!(!vertices.update_sub_data_copy(0, &[1]));
    assert_eq!(&contents(&vertices)[16..24], bytemuck::cast_slice::<f32, u8>(&[1.0, 2.0]));

    let constants = buffer(
        &device,
        8,
        GpuMemoryAccessFlags::CPU_WRITE,
        GpuBufferBindFlags::CONSTANT,
        None,
    )?;
    assert!(constants.update_sub_data_pod(0, &[7u32, 9]));
    assert!(!constants.update_sub_data_upload(0, &[1]));
    assert_eq!(contents(&constants), bytemuck::cast_slice::<u32, u8>(&[7, 9]));
    Ok(())
}

#[test]
fn test_pool_usage_follows_buffer_lifetime() -> Result<()> {
    let device = device(GpuDriverConfigFlags::empty())?;
    let upload = device.pool("upload").expect("default heap set");
    let before = upload.get_current_usage();

    let first = buffer(&device, 100, GpuMemoryAccessFlags::CPU_WRITE, GpuBufferBindFlags::COPY_SRC, None)?;
    let second = buffer(&device, 300, GpuMemoryAccessFlags::CPU_WRITE, GpuBufferBindFlags::COPY_SRC, None)?;
    assert_eq!(upload.get_current_usage(), before + 256 + 512);
    drop(first);
    assert_eq!(upload.get_current_usage(), before + 512);
    drop(second);
    assert_eq!(upload.get_current_usage(), before);

    let stats = device.memory_stats();
    assert_eq!(stats.pool("upload").map(|p| p.peak_bytes), Some(before + 768));
    Ok(())
}

#[test]
fn test_persistent_mapping_needs_the_device_flag() -> Result<()> {
    let access = GpuMemoryAccessFlags::CPU_WRITE | GpuMemoryAccessFlags::PERSISTENT_MAP;
    let plain = device(GpuDriverConfigFlags::empty())?;
    let stripped = buffer(&plain, 64, access, GpuBufferBindFlags::CONSTANT, None)?;
    assert_eq!(stripped.memory_access(), GpuMemoryAccessFlags::CPU_WRITE);

    let persistent = device(GpuDriverConfigFlags::PERSISTENT_MAPPING)?;
    let kept = buffer(&persistent, 64, access, GpuBufferBindFlags::CONSTANT, None)?;
    assert_eq!(kept.memory_access(), access);
    Ok(())
}

#[test]
fn test_references_report_zero_active_refs() -> Result<()> {
    let device = device(GpuDriverConfigFlags::RESOURCE_ACTIVE_REF_TRACKING)?;
    let events = device.subscribe_events();
    let vertices = buffer(
        &device,
        64,
        GpuMemoryAccessFlags::GPU_READ,
        GpuBufferBindFlags::VERTEX,
        None,
    )?;

    let mut first = GpuBufferReference::with_range(&vertices, 0, 32);
    let second = first.clone();
    assert_eq!(vertices.active_refs(), 2);
    first.reset();
    assert!(events.try_recv().is_err());
    drop(second);
    assert_eq!(vertices.active_refs(), 0);
    assert_eq!(
        events.try_recv()?,
        GpuDeviceEvent::ResourceActiveRefsZero {
            id: vertices.id(),
            base_type: GpuResourceBaseType::Buffer,
        }
    );

    assert!(first.set_ref_buffer(Some(&vertices)));
    drop(vertices);
    assert!(!first.is_valid());
    assert!(first.buffer().is_none());
    Ok(())
}
