use super::error::RendererError;

use anyhow::{anyhow, Result};
use vulkanalia::prelude::v1_0::*;

/// Picks the lowest memory type allowed by `type_bits` whose flags contain `properties`.
pub fn find_memory_type(
    memory: &vk::PhysicalDeviceMemoryProperties,
    type_bits: u32,
    properties: vk::MemoryPropertyFlags,
) -> Result<u32> {
    (0..memory.memory_type_count)
        .find(|i| {
            let suitable = (type_bits & (1 << i)) != 0;
            let memory_type = memory.memory_types[*i as usize];
            suitable && memory_type.property_flags.contains(properties)
        })
        .ok_or_else(|| anyhow!(RendererError::NoSuitableMemoryType { type_bits, properties }))
}

pub unsafe fn get_memory_type_index(
    instance: &Instance,
    physical_device: vk::PhysicalDevice,
    properties: vk::MemoryPropertyFlags,
    requirements: vk::MemoryRequirements,
) -> Result<u32> {
    let memory = instance.get_physical_device_memory_properties(physical_device);
    find_memory_type(&memory, requirements.memory_type_bits, properties)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEVICE_LOCAL: vk::MemoryPropertyFlags = vk::MemoryPropertyFlags::DEVICE_LOCAL;
    const HOST_VISIBLE: vk::MemoryPropertyFlags = vk::MemoryPropertyFlags::HOST_VISIBLE;
    const HOST_COHERENT: vk::MemoryPropertyFlags = vk::MemoryPropertyFlags::HOST_COHERENT;

    fn memory_table(types: &[vk::MemoryPropertyFlags]) -> vk::PhysicalDeviceMemoryProperties {
        let mut memory = vk::PhysicalDeviceMemoryProperties::default();
        memory.memory_type_count = types.len() as u32;
        for (i, flags) in types.iter().enumerate() {
            memory.memory_types[i] = vk::MemoryType { property_flags: *flags, heap_index: 0 };
        }
        memory
    }

    // Resembles a discrete GPU: device-local, host-visible+coherent, then all three.
    fn discrete() -> vk::PhysicalDeviceMemoryProperties {
        memory_table(&[
            DEVICE_LOCAL,
            HOST_VISIBLE | HOST_COHERENT,
            DEVICE_LOCAL | HOST_VISIBLE | HOST_COHERENT,
        ])
    }

    #[test]
    fn picks_lowest_matching_index() {
        let memory = discrete();

        assert_eq!(find_memory_type(&memory, 0b111, DEVICE_LOCAL).unwrap(), 0);
        assert_eq!(find_memory_type(&memory, 0b111, HOST_VISIBLE | HOST_COHERENT).unwrap(), 1);
        assert_eq!(find_memory_type(&memory, 0b111, vk::MemoryPropertyFlags::empty()).unwrap(), 0);
    }

    #[test]
    fn respects_the_allowed_type_mask() {
        let memory = discrete();

        assert_eq!(find_memory_type(&memory, 0b100, DEVICE_LOCAL).unwrap(), 2);
        assert_eq!(find_memory_type(&memory, 0b110, HOST_VISIBLE).unwrap(), 1);
    }

    #[test]
    fn requested_flags_must_be_a_subset() {
        let memory = discrete();

        assert_eq!(
            find_memory_type(&memory, 0b111, DEVICE_LOCAL | HOST_VISIBLE).unwrap(),
            2
        );
    }

    #[test]
    fn no_match_is_an_error() {
        let memory = discrete();

        let error = find_memory_type(&memory, 0b001, HOST_VISIBLE).unwrap_err();
        assert!(matches!(
            error.downcast_ref::<RendererError>(),
            Some(RendererError::NoSuitableMemoryType { type_bits: 0b001, .. })
        ));

        assert!(find_memory_type(&memory, 0, DEVICE_LOCAL).is_err());
        assert!(find_memory_type(&memory, 0b111, vk::MemoryPropertyFlags::LAZILY_ALLOCATED).is_err());
    }

    #[test]
    fn ignores_bits_past_the_type_count() {
        let memory = memory_table(&[HOST_VISIBLE]);

        assert!(find_memory_type(&memory, 0b10, HOST_VISIBLE).is_err());
    }
}
