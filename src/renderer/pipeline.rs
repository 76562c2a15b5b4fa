use super::error::RendererError;
use super::handle;
use super::render_data;
use super::vertex::Vertex;

use anyhow::{anyhow, Result};
use log::*;
use nalgebra_glm as glm;
use std::mem::size_of;
use std::path::Path;
use vulkanalia::prelude::v1_0::*;

pub const VERTEX_SHADER: &str = "vert.spv";
pub const FRAGMENT_SHADER: &str = "frag.spv";

pub unsafe fn create_render_pass(device: &Device, data: &mut render_data::Data) -> Result<()> {
    // Attachments

    let color_attachment = vk::AttachmentDescription::builder()
        .format(data.swapchain_format)
        .samples(vk::SampleCountFlags::_1)
        .load_op(vk::AttachmentLoadOp::CLEAR)
        .store_op(vk::AttachmentStoreOp::STORE)
        .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
        .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
        .initial_layout(vk::ImageLayout::UNDEFINED)
        .final_layout(vk::ImageLayout::PRESENT_SRC_KHR);

    let depth_attachment = vk::AttachmentDescription::builder()
        .format(data.depth_format)
        .samples(vk::SampleCountFlags::_1)
        .load_op(vk::AttachmentLoadOp::CLEAR)
        .store_op(vk::AttachmentStoreOp::DONT_CARE)
        .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
        .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
        .initial_layout(vk::ImageLayout::UNDEFINED)
        .final_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL);

    // Subpass

    let color_attachment_ref = vk::AttachmentReference::builder()
        .attachment(0)
        .layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL);

    let depth_attachment_ref = vk::AttachmentReference::builder()
        .attachment(1)
        .layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL);

    let color_attachments = &[color_attachment_ref];
    let subpass = vk::SubpassDescription::builder()
        .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
        .color_attachments(color_attachments)
        .depth_stencil_attachment(&depth_attachment_ref);

    // The acquired image may still be read by the presentation engine.
    let dependency = vk::SubpassDependency::builder()
        .src_subpass(vk::SUBPASS_EXTERNAL)
        .dst_subpass(0)
        .src_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS)
        .src_access_mask(vk::AccessFlags::empty())
        .dst_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS)
        .dst_access_mask(vk::AccessFlags::COLOR_ATTACHMENT_WRITE | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE);

    let attachments = &[color_attachment, depth_attachment];
    let subpasses = &[subpass];
    let dependencies = &[dependency];
    let info = vk::RenderPassCreateInfo::builder()
        .attachments(attachments)
        .subpasses(subpasses)
        .dependencies(dependencies);

    data.render_pass = device.create_render_pass(&info, None)?;

    Ok(())
}

pub unsafe fn create_pipeline(device: &Device, data: &mut render_data::Data, shader_dir: &Path) -> Result<()> {
    // Stages

    let vert = read_shader(shader_dir, VERTEX_SHADER)?;
    let frag = read_shader(shader_dir, FRAGMENT_SHADER)?;

    let vert_shader_module = create_shader_module(device, &vert)?;
    let frag_shader_module = match create_shader_module(device, &frag) {
        Ok(module) => module,
        Err(e) => {
            device.destroy_shader_module(vert_shader_module, None);
            return Err(e);
        }
    };

    let result = build_pipeline(device, data, vert_shader_module, frag_shader_module);

    device.destroy_shader_module(vert_shader_module, None);
    device.destroy_shader_module(frag_shader_module, None);

    result
}

unsafe fn build_pipeline(
    device: &Device,
    data: &mut render_data::Data,
    vert_shader_module: vk::ShaderModule,
    frag_shader_module: vk::ShaderModule,
) -> Result<()> {
    let vert_stage = vk::PipelineShaderStageCreateInfo::builder()
        .stage(vk::ShaderStageFlags::VERTEX)
        .module(vert_shader_module)
        .name(b"main\0");

    let frag_stage = vk::PipelineShaderStageCreateInfo::builder()
        .stage(vk::ShaderStageFlags::FRAGMENT)
        .module(frag_shader_module)
        .name(b"main\0");

    // Vertex Input State

    let binding_descriptions = &[Vertex::binding_description()];
    let attribute_descriptions = Vertex::attribute_descriptions();
    let vertex_input_state = vk::PipelineVertexInputStateCreateInfo::builder()
        .vertex_binding_descriptions(binding_descriptions)
        .vertex_attribute_descriptions(&attribute_descriptions);

    let input_assembly_state = vk::PipelineInputAssemblyStateCreateInfo::builder()
        .topology(vk::PrimitiveTopology::TRIANGLE_LIST)
        .primitive_restart_enable(false);

    // Viewport State

    let viewport = vk::Viewport::builder()
        .x(0.0)
        .y(0.0)
        .width(data.swapchain_extent.width as f32)
        .height(data.swapchain_extent.height as f32)
        .min_depth(0.0)
        .max_depth(1.0);

    let scissor = vk::Rect2D::builder()
        .offset(vk::Offset2D { x: 0, y: 0 })
        .extent(data.swapchain_extent);

    let viewports = &[viewport];
    let scissors = &[scissor];
    let viewport_state = vk::PipelineViewportStateCreateInfo::builder()
        .viewports(viewports)
        .scissors(scissors);

    let rasterization_state = vk::PipelineRasterizationStateCreateInfo::builder()
        .depth_clamp_enable(false)
        .rasterizer_discard_enable(false)
        .polygon_mode(vk::PolygonMode::FILL)
        .line_width(1.0)
        .cull_mode(vk::CullModeFlags::BACK)
        .front_face(vk::FrontFace::COUNTER_CLOCKWISE)
        .depth_bias_enable(false);

    let multisample_state = vk::PipelineMultisampleStateCreateInfo::builder()
        .sample_shading_enable(false)
        .rasterization_samples(vk::SampleCountFlags::_1);

    let depth_stencil_state = vk::PipelineDepthStencilStateCreateInfo::builder()
        .depth_test_enable(true)
        .depth_write_enable(true)
        .depth_compare_op(vk::CompareOp::LESS)
        .depth_bounds_test_enable(false)
        .stencil_test_enable(false);

    // Color Blend State

    let attachment = vk::PipelineColorBlendAttachmentState::builder()
        .color_write_mask(vk::ColorComponentFlags::all())
        .blend_enable(true)
        .src_color_blend_factor(vk::BlendFactor::SRC_ALPHA)
        .dst_color_blend_factor(vk::BlendFactor::ONE_MINUS_SRC_ALPHA)
        .color_blend_op(vk::BlendOp::ADD)
        .src_alpha_blend_factor(vk::BlendFactor::ONE)
        .dst_alpha_blend_factor(vk::BlendFactor::ZERO)
        .alpha_blend_op(vk::BlendOp::ADD);

    let attachments = &[attachment];
    let color_blend_state = vk::PipelineColorBlendStateCreateInfo::builder()
        .logic_op_enable(false)
        .logic_op(vk::LogicOp::COPY)
        .attachments(attachments)
        .blend_constants([0.0, 0.0, 0.0, 0.0]);

    // Layout

    let model_push_constant_range = vk::PushConstantRange::builder()
        .stage_flags(vk::ShaderStageFlags::VERTEX)
        .offset(0)
        .size(size_of::<glm::Mat4>() as u32);

    let set_layouts = &[data.uniform_set_layout, data.sampler_set_layout];
    let push_constant_ranges = &[model_push_constant_range];
    let layout_info = vk::PipelineLayoutCreateInfo::builder()
        .set_layouts(set_layouts)
        .push_constant_ranges(push_constant_ranges);

    data.pipeline_layout = device.create_pipeline_layout(&layout_info, None)?;

    // Create

    let stages = &[vert_stage, frag_stage];
    let info = vk::GraphicsPipelineCreateInfo::builder()
        .stages(stages)
        .vertex_input_state(&vertex_input_state)
        .input_assembly_state(&input_assembly_state)
        .viewport_state(&viewport_state)
        .rasterization_state(&rasterization_state)
        .multisample_state(&multisample_state)
        .depth_stencil_state(&depth_stencil_state)
        .color_blend_state(&color_blend_state)
        .layout(data.pipeline_layout)
        .render_pass(data.render_pass)
        .subpass(0);

    data.pipeline = device
        .create_graphics_pipelines(vk::PipelineCache::null(), &[info], None)?
        .0[0];

    Ok(())
}

/// Reads a compiled SPIR-V file from the shader directory.
pub fn read_shader(shader_dir: &Path, name: &str) -> Result<Vec<u8>> {
    let path = shader_dir.join(name);

    let bytes = std::fs::read(&path).map_err(|source| RendererError::ShaderLoad { path: path.clone(), source })?;

    debug!("Loaded shader `{}` ({} bytes).", path.display(), bytes.len());

    Ok(bytes)
}

/// Reinterprets SPIR-V bytes as 32-bit words.
fn spirv_words(bytecode: &[u8]) -> Result<Vec<u32>> {
    if bytecode.is_empty() || bytecode.len() % 4 != 0 {
        return Err(anyhow!("Invalid SPIR-V bytecode ({} bytes).", bytecode.len()));
    }

    Ok(bytecode
        .chunks_exact(4)
        .map(|w| u32::from_ne_bytes([w[0], w[1], w[2], w[3]]))
        .collect())
}

unsafe fn create_shader_module(device: &Device, bytecode: &[u8]) -> Result<vk::ShaderModule> {
    let code = spirv_words(bytecode)?;
    let info = vk::ShaderModuleCreateInfo::builder()
        .code_size(bytecode.len())
        .code(&code);
    Ok(device.create_shader_module(&info, None)?)
}

pub unsafe fn destroy(device: &Device, data: &mut render_data::Data) {
    if let Some(pipeline) = handle::take(&mut data.pipeline) {
        device.destroy_pipeline(pipeline, None);
    }
    if let Some(layout) = handle::take(&mut data.pipeline_layout) {
        device.destroy_pipeline_layout(layout, None);
    }
    if let Some(render_pass) = handle::take(&mut data.render_pass) {
        device.destroy_render_pass(render_pass, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_shader_is_a_shader_load_error() {
        let error = read_shader(Path::new("no/such/dir"), VERTEX_SHADER).unwrap_err();

        match error.downcast_ref::<RendererError>() {
            Some(RendererError::ShaderLoad { path, .. }) => assert!(path.ends_with("vert.spv")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn spirv_bytes_become_words() {
        let magic = 0x0723_0203u32.to_ne_bytes();
        let bytes = [magic, 1u32.to_ne_bytes()].concat();

        assert_eq!(spirv_words(&bytes).unwrap(), vec![0x0723_0203, 1]);
    }

    #[test]
    fn truncated_spirv_is_rejected() {
        assert!(spirv_words(&[0x03, 0x02, 0x23]).is_err());
        assert!(spirv_words(&[]).is_err());
    }
}
