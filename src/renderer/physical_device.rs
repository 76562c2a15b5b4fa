use super::defines;
use super::error::SuitabilityError;
use super::queue_family::QueueFamilyIndices;
use super::render_data;
use super::swapchain::SwapchainSupport;

use anyhow::{anyhow, Result};
use log::*;
use std::collections::HashSet;
use vulkanalia::prelude::v1_0::*;

/// Takes the first GPU that can draw to the surface, in enumeration order.
pub unsafe fn pick_physical_device(instance: &Instance, data: &mut render_data::Data) -> Result<()> {
    let candidates = instance.enumerate_physical_devices()?;

    let chosen = candidates.into_iter().find(|candidate| {
        let name = instance.get_physical_device_properties(*candidate).device_name;
        match check_physical_device(instance, data, *candidate) {
            Ok(()) => {
                info!("Selected physical device (`{}`).", name);
                true
            }
            Err(error) => {
                warn!("Skipping physical device (`{}`): {}", name, error);
                false
            }
        }
    });

    data.physical_device = chosen.ok_or_else(|| anyhow!("Failed to find suitable physical device."))?;

    Ok(())
}

unsafe fn check_physical_device(
    instance: &Instance,
    data: &render_data::Data,
    physical_device: vk::PhysicalDevice,
) -> Result<()> {
    QueueFamilyIndices::get(instance, data, physical_device)?;

    let extensions = instance
        .enumerate_device_extension_properties(physical_device, None)?
        .iter()
        .map(|e| e.extension_name)
        .collect::<HashSet<_>>();
    if !defines::DEVICE_EXTENSIONS.iter().all(|e| extensions.contains(e)) {
        return Err(anyhow!(SuitabilityError("required device extensions")));
    }

    let support = SwapchainSupport::get(instance, data, physical_device)?;
    if support.formats.is_empty() || support.present_modes.is_empty() {
        return Err(anyhow!(SuitabilityError("swapchain support")));
    }

    // Every texture sampler enables anisotropic filtering.
    if instance.get_physical_device_features(physical_device).sampler_anisotropy != vk::TRUE {
        return Err(anyhow!(SuitabilityError("sampler anisotropy")));
    }

    Ok(())
}
