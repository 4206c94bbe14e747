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
use gci_core::command::{CommandContextProperties, CommandContextState, CommandListType, GpuQueueId};
use gci_core::driver::GpuDevice;
use gci_core::error::CommandError;
use gci_core::memory::GpuMemoryRegion;
use gci_core::resource::{GpuBuffer, GpuBufferBindFlags, GpuBufferCreateInfo, GpuMemoryAccessFlags};
use gci_core::settings::{GciSettings, GpuDriverConfigFlags};
use gci_infra::{create_soft_device, SoftConfig, SoftGpu};
use std::sync::Arc;
use std::thread;

fn device(flags: GpuDriverConfigFlags) -> Result<(Arc<GpuDevice>, Arc<SoftGpu>)> {
    let settings = GciSettings {
        driver_config_flags: flags,
        ..GciSettings::default()
    };
    create_soft_device(settings, SoftConfig::default())
}

fn buffer(
    device: &GpuDevice,
    access: GpuMemoryAccessFlags,
    bind_flags: GpuBufferBindFlags,
    init_data: Option<&[u8]>,
) -> Result<Arc<GpuBuffer>> {
    Ok(device.create_buffer(&GpuBufferCreateInfo {
        buffer_size: 64,
        bind_flags,
        memory_access: access,
        init_data,
        ..Default::default()
    })?)
}

#[test]
fn test_upload_then_readback_through_the_transfer_queue() -> Result<()> {
    let (device, gpu) = device(GpuDriverConfigFlags::MULTI_QUEUE)?;
    let data: Vec<u8> = (0..64).collect();
    let upload = buffer(
        &device,
        GpuMemoryAccessFlags::CPU_WRITE,
        GpuBufferBindFlags::COPY_SRC,
        Some(&data),
    )?;
    let local = buffer(
        &device,
        GpuMemoryAccessFlags::GPU_READ | GpuMemoryAccessFlags::GPU_WRITE,
        GpuBufferBindFlags::COPY_SRC | GpuBufferBindFlags::COPY_DST,
        None,
    )?;
    let readback = buffer(
        &device,
        GpuMemoryAccessFlags::CPU_READ,
        GpuBufferBindFlags::COPY_DST,
        None,
    )?;

    let mut system = device.command_system()?;
    let mut context = system.acquire_context(CommandContextProperties::TRANSFER)?;
    assert_eq!(context.list_type(), CommandListType::Copy);
    assert!(context.copy_buffer(&upload, 0, &local, 0, 64));
    assert!(context.copy_buffer(&local, 16, &readback, 0, 32));
    assert!(!context.copy_buffer(&readback, 0, &local, 0, 8));
    assert!(!context.draw(3, 1, 0, 0));
    system.try_execute_context(GpuQueueId::Transfer, &mut context)?;
    assert_eq!(context.state(), CommandContextState::Submitted);
    system.release_context(context);
    drop(system);

    let stats = gpu.stats();
    assert_eq!(stats.submissions, 1);
    assert_eq!(stats.copies, 2);
    assert_eq!(stats.bytes_copied, 96);

    readback
        .map_region(GpuMemoryRegion::new(0, 32), GpuMemoryAccessFlags::CPU_READ)
        .expect("readback maps");
    let mut out = [0u8; 32];
    assert!(readback.read_mapped(0, &mut out));
    readback.unmap();
    assert_eq!(&out[..], &data[16..48]);
    Ok(())
}

#[test]
fn test_queues_enforce_list_types() -> Result<()> {
    let (device, _gpu) = device(GpuDriverConfigFlags::MULTI_QUEUE)?;
    let mut system = device.command_system()?;

    let mut graphics = system.acquire_context(CommandContextProperties::GRAPHICS)?;
    assert_eq!(
        system.try_execute_context(GpuQueueId::Transfer, &mut graphics),
        Err(CommandError::SubmissionFailed(GpuQueueId::Transfer))
    );
    assert_eq!(
        system.try_execute_context(GpuQueueId::AsyncCompute, &mut graphics),
        Err(CommandError::SubmissionFailed(GpuQueueId::AsyncCompute))
    );
    assert_eq!(
        system.try_execute_context(GpuQueueId::Custom(7), &mut graphics),
        Err(CommandError::UnknownQueue(GpuQueueId::Custom(7)))
    );
    assert!(system.execute_context(GpuQueueId::Present, &mut graphics));
    system.release_context(graphics);

    let mut copy = system.acquire_context(CommandContextProperties::TRANSFER)?;
    assert!(system.execute_context(GpuQueueId::AsyncCompute, &mut copy));
    system.release_context(copy);

    system.initialize_device_queue(GpuQueueId::Custom(7), CommandListType::Compute)?;
    let mut compute = system.acquire_context(CommandContextProperties::COMPUTE)?;
    assert!(system.execute_context(GpuQueueId::Custom(7), &mut compute));
    system.release_context(compute);
    Ok(())
}

#[test]
fn test_contexts_are_recycled_per_list_type() -> Result<()> {
    let (device, _gpu) = device(GpuDriverConfigFlags::empty())?;
    let mut system = device.command_system()?;
    for _ in 0..10 {
        let mut context = system.acquire_context(CommandContextProperties::GRAPHICS)?;
        assert!(system.execute_context(GpuQueueId::DefaultGraphics, &mut context));
        system.release_context(context);
    }
    let copy = system.acquire_context(CommandContextProperties::TRANSFER)?;
    system.release_context(copy);

    let stats = system.stats();
    assert_eq!(stats.contexts_allocated, 2);
    assert_eq!(stats.contexts_reused, 9);
    assert_eq!(stats.contexts_submitted, 10);
    assert_eq!(system.free_context_count(CommandListType::Direct), 1);
    assert_eq!(system.free_context_count(CommandListType::Copy), 1);
    Ok(())
}

#[test]
fn test_threads_share_the_command_system() -> Result<()> {
    let (device, gpu) = device(GpuDriverConfigFlags::empty())?;
    let workers: Vec<_> = (0..4)
        .map(|_| {
            let device = device.clone();
            thread::spawn(move || {
                for _ in 0..25 {
                    let mut system = device.command_system().expect("command system is up");
                    let mut context = system
                        .acquire_context(CommandContextProperties::GRAPHICS)
                        .expect("soft lists never fail");
                    assert!(system.execute_context(GpuQueueId::DefaultGraphics, &mut context));
                    system.release_context(context);
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().expect("worker panicked");
    }

    let stats = device.command_system()?.stats();
    assert_eq!(stats.contexts_submitted, 100);
    assert_eq!(stats.contexts_allocated, 1);
    assert_eq!(gpu.stats().submissions, 100);
    Ok(())
}
