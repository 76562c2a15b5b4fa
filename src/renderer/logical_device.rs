use super::defines;
use super::queue_family::QueueFamilyIndices;
use super::render_data;

use anyhow::Result;
use log::*;
use vulkanalia::prelude::v1_0::*;

/// Opens the selected GPU with one queue per distinct family.
pub unsafe fn create(instance: &Instance, data: &mut render_data::Data) -> Result<Device> {
    let indices = QueueFamilyIndices::get(instance, data, data.physical_device)?;

    let families = if indices.is_shared() {
        vec![indices.graphics]
    } else {
        vec![indices.graphics, indices.present]
    };

    let queue_priorities = &[1.0];
    let queue_infos = families
        .iter()
        .map(|family| {
            vk::DeviceQueueCreateInfo::builder()
                .queue_family_index(*family)
                .queue_priorities(queue_priorities)
        })
        .collect::<Vec<_>>();

    // Device layers are ignored by current loaders but older ones still read them.
    let layers = match data.validation {
        true => vec![defines::VALIDATION_LAYER.as_ptr()],
        false => vec![],
    };

    let extensions = defines::DEVICE_EXTENSIONS.iter().map(|n| n.as_ptr()).collect::<Vec<_>>();

    let features = vk::PhysicalDeviceFeatures::builder().sampler_anisotropy(true);

    let info = vk::DeviceCreateInfo::builder()
        .queue_create_infos(&queue_infos)
        .enabled_layer_names(&layers)
        .enabled_extension_names(&extensions)
        .enabled_features(&features);

    let device = instance.create_device(data.physical_device, &info, None)?;

    data.graphics_queue = device.get_device_queue(indices.graphics, 0);
    data.present_queue = device.get_device_queue(indices.present, 0);

    debug!(
        "Created logical device (graphics family {}, present family {}).",
        indices.graphics, indices.present
    );

    Ok(device)
}
