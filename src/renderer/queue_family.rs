use super::error::SuitabilityError;
use super::render_data;

use anyhow::{anyhow, Result};
use vulkanalia::prelude::v1_0::*;
use vulkanalia::vk::KhrSurfaceExtension;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct QueueFamilyIndices {
    pub graphics: u32,
    pub present: u32,
}

impl QueueFamilyIndices {
    pub unsafe fn get(
        instance: &Instance,
        data: &render_data::Data,
        physical_device: vk::PhysicalDevice,
    ) -> Result<Self> {
        let properties = instance.get_physical_device_queue_family_properties(physical_device);

        Self::pick(&properties, |index| {
            Ok(instance.get_physical_device_surface_support_khr(physical_device, index, data.surface)?)
        })
    }

    /// First graphics-capable family and first family that can present.
    pub fn pick(
        properties: &[vk::QueueFamilyProperties],
        mut can_present: impl FnMut(u32) -> Result<bool>,
    ) -> Result<Self> {
        let graphics = properties
            .iter()
            .position(|p| p.queue_count > 0 && p.queue_flags.contains(vk::QueueFlags::GRAPHICS))
            .map(|i| i as u32);

        let mut present = None;
        for (index, p) in properties.iter().enumerate() {
            if p.queue_count > 0 && can_present(index as u32)? {
                present = Some(index as u32);
                break;
            }
        }

        if let (Some(graphics), Some(present)) = (graphics, present) {
            Ok(Self { graphics, present })
        } else {
            Err(anyhow!(SuitabilityError("required queue families")))
        }
    }

    pub fn is_shared(&self) -> bool {
        self.graphics == self.present
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn family(flags: vk::QueueFlags) -> vk::QueueFamilyProperties {
        vk::QueueFamilyProperties { queue_flags: flags, queue_count: 1, ..Default::default() }
    }

    #[test]
    fn one_family_can_serve_both_roles() {
        let properties = [family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::TRANSFER)];

        let indices = QueueFamilyIndices::pick(&properties, |_| Ok(true)).unwrap();

        assert_eq!(indices, QueueFamilyIndices { graphics: 0, present: 0 });
        assert!(indices.is_shared());
    }

    #[test]
    fn roles_may_live_in_different_families() {
        let properties = [family(vk::QueueFlags::COMPUTE), family(vk::QueueFlags::GRAPHICS)];

        let indices = QueueFamilyIndices::pick(&properties, |i| Ok(i == 0)).unwrap();

        assert_eq!(indices, QueueFamilyIndices { graphics: 1, present: 0 });
        assert!(!indices.is_shared());
    }

    #[test]
    fn missing_presentation_rejects_the_device() {
        let properties = [family(vk::QueueFlags::GRAPHICS)];

        let error = QueueFamilyIndices::pick(&properties, |_| Ok(false)).unwrap_err();

        assert!(error.downcast_ref::<SuitabilityError>().is_some());
    }
}
