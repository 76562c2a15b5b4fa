use super::handle;
use super::memory;

use anyhow::Result;
use log::*;
use std::mem::size_of;
use std::ptr::copy_nonoverlapping as memcpy;
use vulkanalia::prelude::v1_0::*;

/// Everything a load-time upload needs: where to allocate memory from and
/// which queue/pool to run the one-shot copy on.
#[derive(Copy, Clone, Debug)]
pub struct TransferContext {
    pub physical_device: vk::PhysicalDevice,
    pub queue: vk::Queue,
    pub command_pool: vk::CommandPool,
}

/// A buffer together with the memory bound to it.
#[derive(Copy, Clone, Debug, Default)]
pub struct AllocatedBuffer {
    pub buffer: vk::Buffer,
    pub memory: vk::DeviceMemory,
    pub size: vk::DeviceSize,
}

impl AllocatedBuffer {
    pub unsafe fn destroy(&mut self, device: &Device) {
        if let Some(buffer) = handle::take(&mut self.buffer) {
            device.destroy_buffer(buffer, None);
        }
        if let Some(memory) = handle::take(&mut self.memory) {
            device.free_memory(memory, None);
        }
    }
}

pub unsafe fn create_buffer(
    instance: &Instance,
    device: &Device,
    physical_device: vk::PhysicalDevice,
    size: vk::DeviceSize,
    usage: vk::BufferUsageFlags,
    properties: vk::MemoryPropertyFlags,
) -> Result<AllocatedBuffer> {
    // Buffer

    let buffer_info = vk::BufferCreateInfo::builder()
        .size(size)
        .usage(usage)
        .sharing_mode(vk::SharingMode::EXCLUSIVE);

    let mut allocated = AllocatedBuffer {
        buffer: device.create_buffer(&buffer_info, None)?,
        memory: vk::DeviceMemory::null(),
        size,
    };

    // Memory

    let result = (|| -> Result<()> {
        let requirements = device.get_buffer_memory_requirements(allocated.buffer);
        let memory_type_index = memory::get_memory_type_index(instance, physical_device, properties, requirements)?;

        let memory_info = vk::MemoryAllocateInfo::builder()
            .allocation_size(requirements.size)
            .memory_type_index(memory_type_index);

        allocated.memory = device.allocate_memory(&memory_info, None)?;
        device.bind_buffer_memory(allocated.buffer, allocated.memory, 0)?;

        Ok(())
    })();

    match result {
        Ok(()) => Ok(allocated),
        Err(e) => {
            allocated.destroy(device);
            Err(e)
        }
    }
}

/// Copies `bytes` into host-visible memory through a temporary mapping.
pub unsafe fn write_host_visible(device: &Device, memory: vk::DeviceMemory, bytes: &[u8]) -> Result<()> {
    let mapped = device.map_memory(memory, 0, bytes.len() as u64, vk::MemoryMapFlags::empty())?;

    memcpy(bytes.as_ptr(), mapped.cast(), bytes.len());

    device.unmap_memory(memory);

    Ok(())
}

/// Reads `len` bytes back out of host-visible memory.
#[cfg(test)]
pub unsafe fn read_host_visible(device: &Device, memory: vk::DeviceMemory, len: usize) -> Result<Vec<u8>> {
    let mut bytes = vec![0u8; len];

    let mapped = device.map_memory(memory, 0, len as u64, vk::MemoryMapFlags::empty())?;

    memcpy(mapped.cast::<u8>(), bytes.as_mut_ptr(), len);

    device.unmap_memory(memory);

    Ok(bytes)
}

/// Views a slice of plain `#[repr(C)]` values as raw bytes.
pub fn as_bytes<T: Copy>(values: &[T]) -> &[u8] {
    unsafe { std::slice::from_raw_parts(values.as_ptr().cast::<u8>(), size_of::<T>() * values.len()) }
}

pub unsafe fn create_staging_buffer(
    instance: &Instance,
    device: &Device,
    physical_device: vk::PhysicalDevice,
    bytes: &[u8],
) -> Result<AllocatedBuffer> {
    let staging = create_buffer(
        instance,
        device,
        physical_device,
        bytes.len() as u64,
        vk::BufferUsageFlags::TRANSFER_SRC,
        vk::MemoryPropertyFlags::HOST_COHERENT | vk::MemoryPropertyFlags::HOST_VISIBLE,
    )?;

    write_host_visible(device, staging.memory, bytes)?;

    Ok(staging)
}

/// Uploads `bytes` into a new device-local buffer with the given usage.
///
/// Blocks until the transfer queue is idle, so this belongs on the load path only.
pub unsafe fn upload_device_local(
    instance: &Instance,
    device: &Device,
    transfer: TransferContext,
    bytes: &[u8],
    usage: vk::BufferUsageFlags,
) -> Result<AllocatedBuffer> {
    let mut staging = create_staging_buffer(instance, device, transfer.physical_device, bytes)?;

    let destination = create_buffer(
        instance,
        device,
        transfer.physical_device,
        bytes.len() as u64,
        vk::BufferUsageFlags::TRANSFER_DST | usage,
        vk::MemoryPropertyFlags::DEVICE_LOCAL,
    );

    let result = destination.and_then(|mut destination| {
        match copy_buffer(device, transfer, staging.buffer, destination.buffer, bytes.len() as u64) {
            Ok(()) => Ok(destination),
            Err(e) => {
                destination.destroy(device);
                Err(e)
            }
        }
    });

    staging.destroy(device);

    trace!("Uploaded {} bytes to device-local buffer ({:?}).", bytes.len(), usage);

    result
}

pub unsafe fn copy_buffer(
    device: &Device,
    transfer: TransferContext,
    source: vk::Buffer,
    destination: vk::Buffer,
    size: vk::DeviceSize,
) -> Result<()> {
    let command_buffer = begin_single_time_commands(device, transfer)?;

    let regions = vk::BufferCopy::builder().size(size);
    device.cmd_copy_buffer(command_buffer, source, destination, &[regions]);

    end_single_time_commands(device, transfer, command_buffer)
}

pub unsafe fn begin_single_time_commands(device: &Device, transfer: TransferContext) -> Result<vk::CommandBuffer> {
    // Allocate

    let info = vk::CommandBufferAllocateInfo::builder()
        .level(vk::CommandBufferLevel::PRIMARY)
        .command_pool(transfer.command_pool)
        .command_buffer_count(1);

    let command_buffer = device.allocate_command_buffers(&info)?[0];

    // Begin

    let info = vk::CommandBufferBeginInfo::builder().flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);

    device.begin_command_buffer(command_buffer, &info)?;

    Ok(command_buffer)
}

pub unsafe fn end_single_time_commands(
    device: &Device,
    transfer: TransferContext,
    command_buffer: vk::CommandBuffer,
) -> Result<()> {
    let command_buffers = &[command_buffer];

    let result = (|| -> Result<()> {
        device.end_command_buffer(command_buffer)?;

        let info = vk::SubmitInfo::builder().command_buffers(command_buffers);

        device.queue_submit(transfer.queue, &[info], vk::Fence::null())?;
        device.queue_wait_idle(transfer.queue)?;

        Ok(())
    })();

    device.free_command_buffers(transfer.command_pool, command_buffers);

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn as_bytes_covers_every_element() {
        let indices = [0u32, 1, 2, 2, 3, 0];
        let bytes = as_bytes(&indices);

        assert_eq!(bytes.len(), 24);
        assert_eq!(&bytes[4..8], &1u32.to_ne_bytes());
        assert_eq!(&bytes[20..24], &0u32.to_ne_bytes());
    }

    #[test]
    fn default_buffer_holds_null_handles() {
        let buffer = AllocatedBuffer::default();

        assert!(buffer.buffer.is_null());
        assert!(buffer.memory.is_null());
        assert_eq!(buffer.size, 0);
    }
}

/// Round trips through a real device. Needs a Vulkan driver, so these only run
/// with `cargo test -- --ignored`.
#[cfg(test)]
mod gpu_tests {
    use super::*;
    use crate::renderer::error::RendererError;

    use anyhow::anyhow;
    use vulkanalia::loader::{LibloadingLoader, LIBRARY};

    struct Headless {
        instance: Instance,
        device: Device,
        transfer: TransferContext,
    }

    impl Headless {
        unsafe fn new() -> Result<Self> {
            let loader = LibloadingLoader::new(LIBRARY)?;
            let entry = Entry::new(loader).map_err(|b| anyhow!("{}", b))?;

            let application_info = vk::ApplicationInfo::builder()
                .application_name(b"vk_renderer tests\0")
                .api_version(vk::make_version(1, 0, 0));
            let info = vk::InstanceCreateInfo::builder().application_info(&application_info);
            let instance = entry.create_instance(&info, None)?;

            let (physical_device, family) = instance
                .enumerate_physical_devices()?
                .into_iter()
                .find_map(|physical_device| {
                    instance
                        .get_physical_device_queue_family_properties(physical_device)
                        .iter()
                        .position(|p| p.queue_flags.contains(vk::QueueFlags::GRAPHICS))
                        .map(|family| (physical_device, family as u32))
                })
                .ok_or_else(|| anyhow!("No device with a graphics queue."))?;

            let queue_priorities = &[1.0];
            let queue_infos = &[vk::DeviceQueueCreateInfo::builder()
                .queue_family_index(family)
                .queue_priorities(queue_priorities)];
            let info = vk::DeviceCreateInfo::builder().queue_create_infos(queue_infos);
            let device = instance.create_device(physical_device, &info, None)?;
            let queue = device.get_device_queue(family, 0);

            let info = vk::CommandPoolCreateInfo::builder().queue_family_index(family);
            let command_pool = device.create_command_pool(&info, None)?;

            Ok(Self {
                instance,
                device,
                transfer: TransferContext { physical_device, queue, command_pool },
            })
        }

        unsafe fn destroy(&mut self) {
            self.device.destroy_command_pool(self.transfer.command_pool, None);
            self.device.destroy_device(None);
            self.instance.destroy_instance(None);
        }
    }

    #[test]
    #[ignore = "requires a Vulkan driver"]
    fn upload_then_readback_returns_the_same_bytes() {
        unsafe {
            let mut headless = Headless::new().unwrap();
            let (instance, device, transfer) = (&headless.instance, &headless.device, headless.transfer);

            let bytes = (0..=255u8).cycle().take(1000).collect::<Vec<_>>();

            let mut uploaded = upload_device_local(
                instance,
                device,
                transfer,
                &bytes,
                vk::BufferUsageFlags::TRANSFER_SRC,
            )
            .unwrap();

            let mut readback = create_buffer(
                instance,
                device,
                transfer.physical_device,
                bytes.len() as u64,
                vk::BufferUsageFlags::TRANSFER_DST,
                vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
            )
            .unwrap();

            copy_buffer(device, transfer, uploaded.buffer, readback.buffer, bytes.len() as u64).unwrap();

            assert_eq!(read_host_visible(device, readback.memory, bytes.len()).unwrap(), bytes);

            readback.destroy(device);
            uploaded.destroy(device);
            uploaded.destroy(device);
            assert!(uploaded.buffer.is_null());

            headless.destroy();
        }
    }

    #[test]
    #[ignore = "requires a Vulkan driver"]
    fn unsatisfiable_memory_is_reported_without_a_buffer() {
        unsafe {
            let mut headless = Headless::new().unwrap();

            // No memory type is both lazily allocated and host visible.
            let error = create_buffer(
                &headless.instance,
                &headless.device,
                headless.transfer.physical_device,
                64,
                vk::BufferUsageFlags::VERTEX_BUFFER,
                vk::MemoryPropertyFlags::LAZILY_ALLOCATED | vk::MemoryPropertyFlags::HOST_VISIBLE,
            )
            .unwrap_err();

            assert!(matches!(
                error.downcast_ref::<RendererError>(),
                Some(RendererError::NoSuitableMemoryType { .. })
            ));

            headless.destroy();
        }
    }
}
