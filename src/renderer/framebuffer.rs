use super::handle;
use super::image;
use super::render_data;

use anyhow::{anyhow, Result};
use vulkanalia::prelude::v1_0::*;

const DEPTH_FORMATS: &[vk::Format] = &[
    vk::Format::D32_SFLOAT,
    vk::Format::D32_SFLOAT_S8_UINT,
    vk::Format::D24_UNORM_S8_UINT,
];

/// Picks the depth format before the render pass is built.
pub unsafe fn choose_depth_format(instance: &Instance, data: &mut render_data::Data) -> Result<()> {
    data.depth_format = get_supported_format(
        instance,
        data.physical_device,
        DEPTH_FORMATS,
        vk::ImageTiling::OPTIMAL,
        vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT,
    )?;

    Ok(())
}

pub unsafe fn get_supported_format(
    instance: &Instance,
    physical_device: vk::PhysicalDevice,
    candidates: &[vk::Format],
    tiling: vk::ImageTiling,
    features: vk::FormatFeatureFlags,
) -> Result<vk::Format> {
    candidates
        .iter()
        .cloned()
        .find(|f| {
            let properties = instance.get_physical_device_format_properties(physical_device, *f);
            supports(&properties, tiling, features)
        })
        .ok_or_else(|| anyhow!("Failed to find supported format."))
}

fn supports(properties: &vk::FormatProperties, tiling: vk::ImageTiling, features: vk::FormatFeatureFlags) -> bool {
    match tiling {
        vk::ImageTiling::LINEAR => properties.linear_tiling_features.contains(features),
        vk::ImageTiling::OPTIMAL => properties.optimal_tiling_features.contains(features),
        _ => false,
    }
}

pub unsafe fn create_depth_objects(instance: &Instance, device: &Device, data: &mut render_data::Data) -> Result<()> {
    let (depth_image, depth_memory) = image::create_image(
        instance,
        device,
        data.physical_device,
        data.swapchain_extent.width,
        data.swapchain_extent.height,
        data.depth_format,
        vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT,
        vk::MemoryPropertyFlags::DEVICE_LOCAL,
    )?;

    data.depth.image = depth_image;
    data.depth.memory = depth_memory;
    data.depth.view = image::create_image_view(device, depth_image, data.depth_format, vk::ImageAspectFlags::DEPTH)?;

    Ok(())
}

/// Every framebuffer shares the single depth view.
///
/// Framebuffers are stored as they are created so a failure part way
/// through is still released by `destroy`.
pub unsafe fn create(device: &Device, data: &mut render_data::Data) -> Result<()> {
    for view in data.swapchain_image_views.clone() {
        let attachments = &[view, data.depth.view];
        let create_info = vk::FramebufferCreateInfo::builder()
            .render_pass(data.render_pass)
            .attachments(attachments)
            .width(data.swapchain_extent.width)
            .height(data.swapchain_extent.height)
            .layers(1);

        let framebuffer = device.create_framebuffer(&create_info, None)?;
        data.framebuffers.push(framebuffer);
    }

    Ok(())
}

pub unsafe fn destroy(device: &Device, data: &mut render_data::Data) {
    handle::take_all(&mut data.framebuffers)
        .into_iter()
        .for_each(|f| device.destroy_framebuffer(f, None));
    data.depth.destroy(device);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiling_selects_the_matching_feature_set() {
        let properties = vk::FormatProperties {
            optimal_tiling_features: vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT,
            ..Default::default()
        };
        let depth = vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT;

        assert!(supports(&properties, vk::ImageTiling::OPTIMAL, depth));
        assert!(!supports(&properties, vk::ImageTiling::LINEAR, depth));
    }
}
