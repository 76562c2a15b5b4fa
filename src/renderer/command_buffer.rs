use super::handle;
use super::mesh::DrawCall;
use super::mesh_model::MeshModel;
use super::queue_family;
use super::render_data;
use super::texture::TextureRegistry;

use anyhow::Result;
use nalgebra_glm as glm;
use std::mem::size_of;
use vulkanalia::prelude::v1_0::*;

pub unsafe fn create_command_pool(instance: &Instance, device: &Device, data: &mut render_data::Data) -> Result<()> {
    let indices = queue_family::QueueFamilyIndices::get(instance, data, data.physical_device)?;

    // Buffers are re-recorded every frame.
    let info = vk::CommandPoolCreateInfo::builder()
        .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER)
        .queue_family_index(indices.graphics);

    data.command_pool = device.create_command_pool(&info, None)?;

    Ok(())
}

/// One primary command buffer per swapchain image.
pub unsafe fn create_command_buffers(device: &Device, data: &mut render_data::Data) -> Result<()> {
    let allocate_info = vk::CommandBufferAllocateInfo::builder()
        .command_pool(data.command_pool)
        .level(vk::CommandBufferLevel::PRIMARY)
        .command_buffer_count(data.swapchain_images.len() as u32);

    data.command_buffers = device.allocate_command_buffers(&allocate_info)?;

    Ok(())
}

pub unsafe fn destroy(device: &Device, data: &mut render_data::Data) {
    if !data.command_buffers.is_empty() && !data.command_pool.is_null() {
        device.free_command_buffers(data.command_pool, &data.command_buffers);
    }
    data.command_buffers.clear();

    if let Some(pool) = handle::take(&mut data.command_pool) {
        device.destroy_command_pool(pool, None);
    }
}

/// Records the draw of every mesh of every model into the image's command buffer.
pub unsafe fn record(
    device: &Device,
    data: &render_data::Data,
    image_index: usize,
    models: &[MeshModel],
    textures: &TextureRegistry,
    clear_color: [f32; 4],
) -> Result<()> {
    let command_buffer = data.command_buffers[image_index];

    device.reset_command_buffer(command_buffer, vk::CommandBufferResetFlags::empty())?;

    let info = vk::CommandBufferBeginInfo::builder().flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);

    device.begin_command_buffer(command_buffer, &info)?;

    // Render Pass

    let render_area = vk::Rect2D::builder()
        .offset(vk::Offset2D::default())
        .extent(data.swapchain_extent);

    let color_clear_value = vk::ClearValue {
        color: vk::ClearColorValue { float32: clear_color },
    };

    let depth_clear_value = vk::ClearValue {
        depth_stencil: vk::ClearDepthStencilValue { depth: 1.0, stencil: 0 },
    };

    let clear_values = &[color_clear_value, depth_clear_value];
    let info = vk::RenderPassBeginInfo::builder()
        .render_pass(data.render_pass)
        .framebuffer(data.framebuffers[image_index])
        .render_area(render_area)
        .clear_values(clear_values);

    device.cmd_begin_render_pass(command_buffer, &info, vk::SubpassContents::INLINE);
    device.cmd_bind_pipeline(command_buffer, vk::PipelineBindPoint::GRAPHICS, data.pipeline);

    // Meshes

    for model in models {
        for mesh in model.meshes() {
            device.cmd_bind_vertex_buffers(command_buffer, 0, &[mesh.vertex_buffer()], &[0]);

            if let Some(index_buffer) = mesh.index_buffer() {
                device.cmd_bind_index_buffer(command_buffer, index_buffer, 0, vk::IndexType::UINT32);
            }

            let transform = model.transform() * mesh.transform();
            device.cmd_push_constants(
                command_buffer,
                data.pipeline_layout,
                vk::ShaderStageFlags::VERTEX,
                0,
                mat4_bytes(&transform),
            );

            let descriptor_sets = &[data.uniform_sets[image_index], textures.descriptor_set(mesh.texture_id())];
            device.cmd_bind_descriptor_sets(
                command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                data.pipeline_layout,
                0,
                descriptor_sets,
                &[],
            );

            match mesh.draw_call() {
                DrawCall::Indexed { index_count } => device.cmd_draw_indexed(command_buffer, index_count, 1, 0, 0, 0),
                DrawCall::Vertices { vertex_count } => device.cmd_draw(command_buffer, vertex_count, 1, 0, 0),
            }
        }
    }

    device.cmd_end_render_pass(command_buffer);

    device.end_command_buffer(command_buffer)?;

    Ok(())
}

fn mat4_bytes(matrix: &glm::Mat4) -> &[u8] {
    unsafe { std::slice::from_raw_parts((matrix as *const glm::Mat4).cast::<u8>(), size_of::<glm::Mat4>()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_constant_is_column_major_floats() {
        let translation = glm::translation(&glm::vec3(1.0, 2.0, 3.0));

        let bytes = mat4_bytes(&translation);

        assert_eq!(bytes.len(), 64);
        // Fourth column holds the translation.
        assert_eq!(&bytes[48..52], &1.0f32.to_ne_bytes());
        assert_eq!(&bytes[56..60], &3.0f32.to_ne_bytes());
    }
}
