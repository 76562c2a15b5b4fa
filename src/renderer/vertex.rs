use nalgebra_glm as glm;
use std::mem::{offset_of, size_of};
use vulkanalia::prelude::v1_0::*;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Vertex {
    pub pos: glm::Vec3,
    pub color: glm::Vec3,
    pub tex_coord: glm::Vec2,
}

impl Vertex {
    pub fn new(pos: glm::Vec3, color: glm::Vec3, tex_coord: glm::Vec2) -> Self {
        Self { pos, color, tex_coord }
    }

    pub fn binding_description() -> vk::VertexInputBindingDescription {
        vk::VertexInputBindingDescription::builder()
            .binding(0)
            .stride(size_of::<Vertex>() as u32)
            .input_rate(vk::VertexInputRate::VERTEX)
            .build()
    }

    pub fn attribute_descriptions() -> [vk::VertexInputAttributeDescription; 3] {
        let pos = vk::VertexInputAttributeDescription::builder()
            .binding(0)
            .location(0)
            .format(vk::Format::R32G32B32_SFLOAT)
            .offset(offset_of!(Vertex, pos) as u32)
            .build();
        let color = vk::VertexInputAttributeDescription::builder()
            .binding(0)
            .location(1)
            .format(vk::Format::R32G32B32_SFLOAT)
            .offset(offset_of!(Vertex, color) as u32)
            .build();
        let tex_coord = vk::VertexInputAttributeDescription::builder()
            .binding(0)
            .location(2)
            .format(vk::Format::R32G32_SFLOAT)
            .offset(offset_of!(Vertex, tex_coord) as u32)
            .build();
        [pos, color, tex_coord]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stride_matches_the_struct() {
        assert_eq!(Vertex::binding_description().stride, 32);
        assert_eq!(Vertex::binding_description().stride as usize, size_of::<Vertex>());
    }

    #[test]
    fn attributes_are_packed_in_declaration_order() {
        let [pos, color, tex_coord] = Vertex::attribute_descriptions();

        assert_eq!((pos.location, pos.offset), (0, 0));
        assert_eq!((color.location, color.offset), (1, 12));
        assert_eq!((tex_coord.location, tex_coord.offset), (2, 24));
        assert_eq!(tex_coord.offset as usize + size_of::<glm::Vec2>(), size_of::<Vertex>());
    }
}
