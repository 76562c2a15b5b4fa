use super::handle;
use super::image;
use super::queue_family;
use super::render_data;

use anyhow::Result;
use log::*;
use vulkanalia::prelude::v1_0::*;
use vulkanalia::vk::{KhrSurfaceExtension, KhrSwapchainExtension};
use winit::window::Window;

#[derive(Clone, Debug)]
pub struct SwapchainSupport {
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    pub formats: Vec<vk::SurfaceFormatKHR>,
    pub present_modes: Vec<vk::PresentModeKHR>,
}

impl SwapchainSupport {
    pub unsafe fn get(
        instance: &Instance,
        data: &render_data::Data,
        physical_device: vk::PhysicalDevice,
    ) -> Result<Self> {
        Ok(Self {
            capabilities: instance.get_physical_device_surface_capabilities_khr(physical_device, data.surface)?,
            formats: instance.get_physical_device_surface_formats_khr(physical_device, data.surface)?,
            present_modes: instance.get_physical_device_surface_present_modes_khr(physical_device, data.surface)?,
        })
    }
}

pub unsafe fn create(window: &Window, instance: &Instance, device: &Device, data: &mut render_data::Data) -> Result<()> {
    let indices = queue_family::QueueFamilyIndices::get(instance, data, data.physical_device)?;
    let support = SwapchainSupport::get(instance, data, data.physical_device)?;

    let size = window.inner_size();

    let surface_format = choose_surface_format(&support.formats);
    let present_mode = choose_present_mode(&support.present_modes);
    let extent = choose_extent(&support.capabilities, size.width, size.height);
    let image_count = choose_image_count(&support.capabilities);

    data.swapchain_format = surface_format.format;
    data.swapchain_extent = extent;

    let mut queue_family_indices = vec![];
    let image_sharing_mode = if indices.is_shared() {
        vk::SharingMode::EXCLUSIVE
    } else {
        queue_family_indices.push(indices.graphics);
        queue_family_indices.push(indices.present);
        vk::SharingMode::CONCURRENT
    };

    let info = vk::SwapchainCreateInfoKHR::builder()
        .surface(data.surface)
        .min_image_count(image_count)
        .image_format(surface_format.format)
        .image_color_space(surface_format.color_space)
        .image_extent(extent)
        .image_array_layers(1)
        .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
        .image_sharing_mode(image_sharing_mode)
        .queue_family_indices(&queue_family_indices)
        .pre_transform(support.capabilities.current_transform)
        .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
        .present_mode(present_mode)
        .clipped(true)
        .old_swapchain(vk::SwapchainKHR::null());

    data.swapchain = device.create_swapchain_khr(&info, None)?;
    data.swapchain_images = device.get_swapchain_images_khr(data.swapchain)?;

    info!(
        "Created swapchain ({:?}, {:?}, {}x{}, {} images).",
        surface_format.format,
        present_mode,
        extent.width,
        extent.height,
        data.swapchain_images.len()
    );

    Ok(())
}

/// Views are stored one at a time, so `destroy` releases a partial set.
pub unsafe fn create_swapchain_image_views(device: &Device, data: &mut render_data::Data) -> Result<()> {
    for image in data.swapchain_images.clone() {
        let view = image::create_image_view(device, image, data.swapchain_format, vk::ImageAspectFlags::COLOR)?;
        data.swapchain_image_views.push(view);
    }

    Ok(())
}

/// Images belong to the swapchain, only the views are ours.
pub unsafe fn destroy(device: &Device, data: &mut render_data::Data) {
    handle::take_all(&mut data.swapchain_image_views)
        .into_iter()
        .for_each(|v| device.destroy_image_view(v, None));
    data.swapchain_images.clear();

    if let Some(swapchain) = handle::take(&mut data.swapchain) {
        device.destroy_swapchain_khr(swapchain, None);
    }
}

/// Prefers 8-bit RGBA/BGRA in sRGB space. A lone `UNDEFINED` entry means
/// the surface accepts anything.
pub fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> vk::SurfaceFormatKHR {
    let preferred = vk::SurfaceFormatKHR {
        format: vk::Format::R8G8B8A8_UNORM,
        color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
    };

    match formats {
        [] => preferred,
        [only] if only.format == vk::Format::UNDEFINED => preferred,
        _ => formats
            .iter()
            .cloned()
            .find(|f| {
                (f.format == vk::Format::R8G8B8A8_UNORM || f.format == vk::Format::B8G8R8A8_UNORM)
                    && f.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
            })
            .unwrap_or(formats[0]),
    }
}

pub fn choose_present_mode(present_modes: &[vk::PresentModeKHR]) -> vk::PresentModeKHR {
    present_modes
        .iter()
        .cloned()
        .find(|m| *m == vk::PresentModeKHR::MAILBOX)
        .unwrap_or(vk::PresentModeKHR::FIFO)
}

/// Uses the surface's fixed extent, or the framebuffer size clamped to the
/// surface limits when the surface leaves it open.
pub fn choose_extent(capabilities: &vk::SurfaceCapabilitiesKHR, width: u32, height: u32) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        return capabilities.current_extent;
    }

    let (min, max) = (capabilities.min_image_extent, capabilities.max_image_extent);

    vk::Extent2D {
        width: width.max(min.width).min(max.width),
        height: height.max(min.height).min(max.height),
    }
}

pub fn choose_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let image_count = capabilities.min_image_count + 1;

    if capabilities.max_image_count != 0 {
        image_count.min(capabilities.max_image_count)
    } else {
        image_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(format: vk::Format, color_space: vk::ColorSpaceKHR) -> vk::SurfaceFormatKHR {
        vk::SurfaceFormatKHR { format, color_space }
    }

    fn capabilities(min_count: u32, max_count: u32, current: vk::Extent2D) -> vk::SurfaceCapabilitiesKHR {
        vk::SurfaceCapabilitiesKHR {
            min_image_count: min_count,
            max_image_count: max_count,
            current_extent: current,
            min_image_extent: vk::Extent2D { width: 100, height: 100 },
            max_image_extent: vk::Extent2D { width: 1920, height: 1080 },
            ..Default::default()
        }
    }

    const OPEN: vk::Extent2D = vk::Extent2D { width: u32::MAX, height: u32::MAX };

    #[test]
    fn undefined_surface_format_means_any() {
        let chosen = choose_surface_format(&[format(vk::Format::UNDEFINED, vk::ColorSpaceKHR::SRGB_NONLINEAR)]);

        assert_eq!(chosen.format, vk::Format::R8G8B8A8_UNORM);
        assert_eq!(chosen.color_space, vk::ColorSpaceKHR::SRGB_NONLINEAR);
    }

    #[test]
    fn preferred_surface_format_is_found_anywhere_in_the_list() {
        let formats = [
            format(vk::Format::R16G16B16A16_SFLOAT, vk::ColorSpaceKHR::SRGB_NONLINEAR),
            format(vk::Format::B8G8R8A8_UNORM, vk::ColorSpaceKHR::SRGB_NONLINEAR),
        ];

        assert_eq!(choose_surface_format(&formats).format, vk::Format::B8G8R8A8_UNORM);
    }

    #[test]
    fn first_surface_format_is_the_last_resort() {
        let formats = [
            format(vk::Format::R16G16B16A16_SFLOAT, vk::ColorSpaceKHR::SRGB_NONLINEAR),
            format(vk::Format::A2B10G10R10_UNORM_PACK32, vk::ColorSpaceKHR::SRGB_NONLINEAR),
        ];

        assert_eq!(choose_surface_format(&formats).format, vk::Format::R16G16B16A16_SFLOAT);
    }

    #[test]
    fn mailbox_is_preferred_over_fifo() {
        assert_eq!(
            choose_present_mode(&[vk::PresentModeKHR::FIFO, vk::PresentModeKHR::MAILBOX]),
            vk::PresentModeKHR::MAILBOX
        );
        assert_eq!(
            choose_present_mode(&[vk::PresentModeKHR::IMMEDIATE]),
            vk::PresentModeKHR::FIFO
        );
    }

    #[test]
    fn fixed_extent_is_used_as_is() {
        let current = vk::Extent2D { width: 800, height: 600 };

        assert_eq!(choose_extent(&capabilities(2, 3, current), 4000, 10), current);
    }

    #[test]
    fn open_extent_is_clamped_to_surface_limits() {
        let extent = choose_extent(&capabilities(2, 3, OPEN), 4000, 10);

        assert_eq!(extent, vk::Extent2D { width: 1920, height: 100 });
    }

    #[test]
    fn image_count_is_one_above_the_minimum() {
        assert_eq!(choose_image_count(&capabilities(2, 0, OPEN)), 3);
        assert_eq!(choose_image_count(&capabilities(2, 8, OPEN)), 3);
    }

    #[test]
    fn image_count_respects_the_maximum() {
        assert_eq!(choose_image_count(&capabilities(3, 3, OPEN)), 3);
    }
}
