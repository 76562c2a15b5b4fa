use super::buffer::{self, TransferContext};
use super::error::RendererError;
use super::handle;
use super::memory;

use anyhow::{anyhow, Result};
use vulkanalia::prelude::v1_0::*;

/// An image, the memory bound to it and a view over its single mip level.
#[derive(Copy, Clone, Debug, Default)]
pub struct AllocatedImage {
    pub image: vk::Image,
    pub memory: vk::DeviceMemory,
    pub view: vk::ImageView,
}

impl AllocatedImage {
    pub unsafe fn destroy(&mut self, device: &Device) {
        if let Some(view) = handle::take(&mut self.view) {
            device.destroy_image_view(view, None);
        }
        if let Some(image) = handle::take(&mut self.image) {
            device.destroy_image(image, None);
        }
        if let Some(memory) = handle::take(&mut self.memory) {
            device.free_memory(memory, None);
        }
    }
}

/// Access and stage masks for a layout transition barrier.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TransitionMasks {
    pub src_access: vk::AccessFlags,
    pub dst_access: vk::AccessFlags,
    pub src_stage: vk::PipelineStageFlags,
    pub dst_stage: vk::PipelineStageFlags,
}

/// Only the two transitions a texture upload goes through are known.
pub fn transition_masks(old: vk::ImageLayout, new: vk::ImageLayout) -> Result<TransitionMasks> {
    match (old, new) {
        (vk::ImageLayout::UNDEFINED, vk::ImageLayout::TRANSFER_DST_OPTIMAL) => Ok(TransitionMasks {
            src_access: vk::AccessFlags::empty(),
            dst_access: vk::AccessFlags::TRANSFER_WRITE,
            src_stage: vk::PipelineStageFlags::TOP_OF_PIPE,
            dst_stage: vk::PipelineStageFlags::TRANSFER,
        }),
        (vk::ImageLayout::TRANSFER_DST_OPTIMAL, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL) => Ok(TransitionMasks {
            src_access: vk::AccessFlags::TRANSFER_WRITE,
            dst_access: vk::AccessFlags::SHADER_READ,
            src_stage: vk::PipelineStageFlags::TRANSFER,
            dst_stage: vk::PipelineStageFlags::FRAGMENT_SHADER,
        }),
        _ => Err(anyhow!(RendererError::UnsupportedLayoutTransition { old, new })),
    }
}

#[allow(clippy::too_many_arguments)]
pub unsafe fn create_image(
    instance: &Instance,
    device: &Device,
    physical_device: vk::PhysicalDevice,
    width: u32,
    height: u32,
    format: vk::Format,
    usage: vk::ImageUsageFlags,
    properties: vk::MemoryPropertyFlags,
) -> Result<(vk::Image, vk::DeviceMemory)> {
    // Image

    let info = vk::ImageCreateInfo::builder()
        .image_type(vk::ImageType::_2D)
        .extent(vk::Extent3D { width, height, depth: 1 })
        .mip_levels(1)
        .array_layers(1)
        .format(format)
        .tiling(vk::ImageTiling::OPTIMAL)
        .initial_layout(vk::ImageLayout::UNDEFINED)
        .usage(usage)
        .sharing_mode(vk::SharingMode::EXCLUSIVE)
        .samples(vk::SampleCountFlags::_1);

    let image = device.create_image(&info, None)?;
    let mut image_memory = vk::DeviceMemory::null();

    // Memory

    let result = (|| -> Result<()> {
        let requirements = device.get_image_memory_requirements(image);
        let memory_type_index = memory::get_memory_type_index(instance, physical_device, properties, requirements)?;

        let info = vk::MemoryAllocateInfo::builder()
            .allocation_size(requirements.size)
            .memory_type_index(memory_type_index);

        image_memory = device.allocate_memory(&info, None)?;
        device.bind_image_memory(image, image_memory, 0)?;

        Ok(())
    })();

    if let Err(e) = result {
        if !image_memory.is_null() {
            device.free_memory(image_memory, None);
        }
        device.destroy_image(image, None);
        return Err(e);
    }

    Ok((image, image_memory))
}

pub unsafe fn create_image_view(
    device: &Device,
    image: vk::Image,
    format: vk::Format,
    aspects: vk::ImageAspectFlags,
) -> Result<vk::ImageView> {
    let subresource_range = vk::ImageSubresourceRange::builder()
        .aspect_mask(aspects)
        .base_mip_level(0)
        .level_count(1)
        .base_array_layer(0)
        .layer_count(1);

    let info = vk::ImageViewCreateInfo::builder()
        .image(image)
        .view_type(vk::ImageViewType::_2D)
        .format(format)
        .subresource_range(subresource_range);

    Ok(device.create_image_view(&info, None)?)
}

pub unsafe fn transition_image_layout(
    device: &Device,
    transfer: TransferContext,
    image: vk::Image,
    old_layout: vk::ImageLayout,
    new_layout: vk::ImageLayout,
) -> Result<()> {
    let masks = transition_masks(old_layout, new_layout)?;

    let command_buffer = buffer::begin_single_time_commands(device, transfer)?;

    let subresource = vk::ImageSubresourceRange::builder()
        .aspect_mask(vk::ImageAspectFlags::COLOR)
        .base_mip_level(0)
        .level_count(1)
        .base_array_layer(0)
        .layer_count(1);

    let barrier = vk::ImageMemoryBarrier::builder()
        .old_layout(old_layout)
        .new_layout(new_layout)
        .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .image(image)
        .subresource_range(subresource)
        .src_access_mask(masks.src_access)
        .dst_access_mask(masks.dst_access);

    device.cmd_pipeline_barrier(
        command_buffer,
        masks.src_stage,
        masks.dst_stage,
        vk::DependencyFlags::empty(),
        &[] as &[vk::MemoryBarrier],
        &[] as &[vk::BufferMemoryBarrier],
        &[barrier],
    );

    buffer::end_single_time_commands(device, transfer, command_buffer)
}

pub unsafe fn copy_buffer_to_image(
    device: &Device,
    transfer: TransferContext,
    source: vk::Buffer,
    image: vk::Image,
    width: u32,
    height: u32,
) -> Result<()> {
    let command_buffer = buffer::begin_single_time_commands(device, transfer)?;

    let subresource = vk::ImageSubresourceLayers::builder()
        .aspect_mask(vk::ImageAspectFlags::COLOR)
        .mip_level(0)
        .base_array_layer(0)
        .layer_count(1);

    let region = vk::BufferImageCopy::builder()
        .buffer_offset(0)
        .buffer_row_length(0)
        .buffer_image_height(0)
        .image_subresource(subresource)
        .image_offset(vk::Offset3D { x: 0, y: 0, z: 0 })
        .image_extent(vk::Extent3D { width, height, depth: 1 });

    device.cmd_copy_buffer_to_image(
        command_buffer,
        source,
        image,
        vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        &[region],
    );

    buffer::end_single_time_commands(device, transfer, command_buffer)
}

/// Uploads tightly packed pixels into a new sampled image, leaving it in
/// `SHADER_READ_ONLY_OPTIMAL` with a color view.
pub unsafe fn upload_sampled_image(
    instance: &Instance,
    device: &Device,
    transfer: TransferContext,
    pixels: &[u8],
    width: u32,
    height: u32,
    format: vk::Format,
) -> Result<AllocatedImage> {
    let mut staging = buffer::create_staging_buffer(instance, device, transfer.physical_device, pixels)?;

    let mut allocated = AllocatedImage::default();

    let result = (|| -> Result<()> {
        let (image, image_memory) = create_image(
            instance,
            device,
            transfer.physical_device,
            width,
            height,
            format,
            vk::ImageUsageFlags::SAMPLED | vk::ImageUsageFlags::TRANSFER_DST,
            vk::MemoryPropertyFlags::DEVICE_LOCAL,
        )?;

        allocated.image = image;
        allocated.memory = image_memory;

        transition_image_layout(
            device,
            transfer,
            image,
            vk::ImageLayout::UNDEFINED,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        )?;

        copy_buffer_to_image(device, transfer, staging.buffer, image, width, height)?;

        transition_image_layout(
            device,
            transfer,
            image,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        )?;

        allocated.view = create_image_view(device, image, format, vk::ImageAspectFlags::COLOR)?;

        Ok(())
    })();

    staging.destroy(device);

    match result {
        Ok(()) => Ok(allocated),
        Err(e) => {
            allocated.destroy(device);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_transition_waits_for_nothing() {
        let masks = transition_masks(vk::ImageLayout::UNDEFINED, vk::ImageLayout::TRANSFER_DST_OPTIMAL).unwrap();

        assert_eq!(masks.src_access, vk::AccessFlags::empty());
        assert_eq!(masks.dst_access, vk::AccessFlags::TRANSFER_WRITE);
        assert_eq!(masks.src_stage, vk::PipelineStageFlags::TOP_OF_PIPE);
        assert_eq!(masks.dst_stage, vk::PipelineStageFlags::TRANSFER);
    }

    #[test]
    fn sampling_transition_waits_for_the_copy() {
        let masks =
            transition_masks(vk::ImageLayout::TRANSFER_DST_OPTIMAL, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL).unwrap();

        assert_eq!(masks.src_access, vk::AccessFlags::TRANSFER_WRITE);
        assert_eq!(masks.dst_access, vk::AccessFlags::SHADER_READ);
        assert_eq!(masks.src_stage, vk::PipelineStageFlags::TRANSFER);
        assert_eq!(masks.dst_stage, vk::PipelineStageFlags::FRAGMENT_SHADER);
    }

    #[test]
    fn other_transitions_are_rejected() {
        let pairs = [
            (vk::ImageLayout::UNDEFINED, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL),
            (vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL, vk::ImageLayout::TRANSFER_DST_OPTIMAL),
            (vk::ImageLayout::UNDEFINED, vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL),
        ];

        for (old, new) in pairs {
            let error = transition_masks(old, new).unwrap_err();
            assert!(matches!(
                error.downcast_ref::<RendererError>(),
                Some(RendererError::UnsupportedLayoutTransition { .. })
            ));
        }
    }
}
