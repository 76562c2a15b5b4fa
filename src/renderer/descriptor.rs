use super::defines;
use super::handle;
use super::render_data;
use super::uniform;

use anyhow::Result;
use std::mem::size_of;
use vulkanalia::prelude::v1_0::*;

/// Set 0: the view/projection uniform, read by the vertex stage.
pub unsafe fn create_uniform_set_layout(device: &Device, data: &mut render_data::Data) -> Result<()> {
    let ubo_binding = vk::DescriptorSetLayoutBinding::builder()
        .binding(0)
        .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
        .descriptor_count(1)
        .stage_flags(vk::ShaderStageFlags::VERTEX);

    let bindings = &[ubo_binding];
    let info = vk::DescriptorSetLayoutCreateInfo::builder().bindings(bindings);

    data.uniform_set_layout = device.create_descriptor_set_layout(&info, None)?;

    Ok(())
}

/// Set 1: one texture, read by the fragment stage.
pub unsafe fn create_sampler_set_layout(device: &Device, data: &mut render_data::Data) -> Result<()> {
    let sampler_binding = vk::DescriptorSetLayoutBinding::builder()
        .binding(0)
        .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
        .descriptor_count(1)
        .stage_flags(vk::ShaderStageFlags::FRAGMENT);

    let bindings = &[sampler_binding];
    let info = vk::DescriptorSetLayoutCreateInfo::builder().bindings(bindings);

    data.sampler_set_layout = device.create_descriptor_set_layout(&info, None)?;

    Ok(())
}

pub unsafe fn create_uniform_pool(device: &Device, data: &mut render_data::Data) -> Result<()> {
    let ubo_size = vk::DescriptorPoolSize::builder()
        .type_(vk::DescriptorType::UNIFORM_BUFFER)
        .descriptor_count(data.swapchain_images.len() as u32);

    let pool_sizes = &[ubo_size];
    let info = vk::DescriptorPoolCreateInfo::builder()
        .pool_sizes(pool_sizes)
        .max_sets(data.swapchain_images.len() as u32);

    data.uniform_pool = device.create_descriptor_pool(&info, None)?;

    Ok(())
}

pub unsafe fn create_sampler_pool(device: &Device, data: &mut render_data::Data) -> Result<()> {
    let sampler_size = vk::DescriptorPoolSize::builder()
        .type_(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
        .descriptor_count(defines::MAX_TEXTURES as u32);

    let pool_sizes = &[sampler_size];
    let info = vk::DescriptorPoolCreateInfo::builder()
        .pool_sizes(pool_sizes)
        .max_sets(defines::MAX_TEXTURES as u32);

    data.sampler_pool = device.create_descriptor_pool(&info, None)?;

    Ok(())
}

/// One uniform set per swapchain image, each pointing at that image's buffer.
pub unsafe fn create_uniform_sets(device: &Device, data: &mut render_data::Data) -> Result<()> {
    // Allocate

    let layouts = vec![data.uniform_set_layout; data.swapchain_images.len()];
    let info = vk::DescriptorSetAllocateInfo::builder()
        .descriptor_pool(data.uniform_pool)
        .set_layouts(&layouts);

    data.uniform_sets = device.allocate_descriptor_sets(&info)?;

    // Update

    for (set, uniform_buffer) in data.uniform_sets.iter().zip(&data.uniform_buffers) {
        let info = vk::DescriptorBufferInfo::builder()
            .buffer(uniform_buffer.buffer)
            .offset(0)
            .range(size_of::<uniform::ViewProjection>() as u64);

        let buffer_info = &[info];
        let ubo_write = vk::WriteDescriptorSet::builder()
            .dst_set(*set)
            .dst_binding(0)
            .dst_array_element(0)
            .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
            .buffer_info(buffer_info);

        device.update_descriptor_sets(&[ubo_write], &[] as &[vk::CopyDescriptorSet]);
    }

    Ok(())
}

/// Allocates a sampler set from the texture pool and points it at `view`.
pub unsafe fn create_texture_set(
    device: &Device,
    data: &render_data::Data,
    view: vk::ImageView,
    sampler: vk::Sampler,
) -> Result<vk::DescriptorSet> {
    let layouts = &[data.sampler_set_layout];
    let info = vk::DescriptorSetAllocateInfo::builder()
        .descriptor_pool(data.sampler_pool)
        .set_layouts(layouts);

    let set = device.allocate_descriptor_sets(&info)?[0];

    let info = vk::DescriptorImageInfo::builder()
        .image_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
        .image_view(view)
        .sampler(sampler);

    let image_info = &[info];
    let sampler_write = vk::WriteDescriptorSet::builder()
        .dst_set(set)
        .dst_binding(0)
        .dst_array_element(0)
        .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
        .image_info(image_info);

    device.update_descriptor_sets(&[sampler_write], &[] as &[vk::CopyDescriptorSet]);

    Ok(set)
}

/// Pools free their sets with them.
pub unsafe fn destroy(device: &Device, data: &mut render_data::Data) {
    data.uniform_sets.clear();

    if let Some(pool) = handle::take(&mut data.sampler_pool) {
        device.destroy_descriptor_pool(pool, None);
    }
    if let Some(pool) = handle::take(&mut data.uniform_pool) {
        device.destroy_descriptor_pool(pool, None);
    }
    if let Some(layout) = handle::take(&mut data.sampler_set_layout) {
        device.destroy_descriptor_set_layout(layout, None);
    }
    if let Some(layout) = handle::take(&mut data.uniform_set_layout) {
        device.destroy_descriptor_set_layout(layout, None);
    }
}
