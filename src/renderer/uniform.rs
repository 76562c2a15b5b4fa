use super::buffer;
use super::render_data;

use anyhow::Result;
use nalgebra_glm as glm;
use std::mem::size_of;
use vulkanalia::prelude::v1_0::*;

/// Where the scene is seen from.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Camera {
    pub eye: glm::Vec3,
    pub target: glm::Vec3,
    pub up: glm::Vec3,
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            eye: glm::vec3(0.0, 0.0, 5.0),
            target: glm::vec3(0.0, 0.0, 0.0),
            up: glm::vec3(0.0, 1.0, 0.0),
            fov_degrees: 45.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

/// Contents of the set 0 uniform buffer.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ViewProjection {
    pub projection: glm::Mat4,
    pub view: glm::Mat4,
}

impl ViewProjection {
    pub fn new(camera: &Camera, extent: vk::Extent2D) -> Self {
        let aspect = extent.width as f32 / extent.height.max(1) as f32;

        let mut projection = glm::perspective_rh_zo(aspect, camera.fov_degrees.to_radians(), camera.near, camera.far);

        // Vulkan clip space points Y down.
        projection[(1, 1)] *= -1.0;

        let view = glm::look_at_rh(&camera.eye, &camera.target, &camera.up);

        Self { projection, view }
    }
}

pub unsafe fn create_uniform_buffers(instance: &Instance, device: &Device, data: &mut render_data::Data) -> Result<()> {
    data.uniform_buffers.clear();

    for _ in 0..data.swapchain_images.len() {
        let uniform_buffer = buffer::create_buffer(
            instance,
            device,
            data.physical_device,
            size_of::<ViewProjection>() as u64,
            vk::BufferUsageFlags::UNIFORM_BUFFER,
            vk::MemoryPropertyFlags::HOST_COHERENT | vk::MemoryPropertyFlags::HOST_VISIBLE,
        )?;

        data.uniform_buffers.push(uniform_buffer);
    }

    Ok(())
}

pub unsafe fn update_uniform_buffer(
    device: &Device,
    data: &render_data::Data,
    image_index: usize,
    view_projection: &ViewProjection,
) -> Result<()> {
    let bytes = buffer::as_bytes(std::slice::from_ref(view_projection));
    buffer::write_host_visible(device, data.uniform_buffers[image_index].memory, bytes)
}

pub unsafe fn destroy_uniform_buffers(device: &Device, data: &mut render_data::Data) {
    data.uniform_buffers.iter_mut().for_each(|b| b.destroy(device));
    data.uniform_buffers.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    const EXTENT: vk::Extent2D = vk::Extent2D { width: 800, height: 600 };

    fn clip(view_projection: &ViewProjection, point: glm::Vec3) -> glm::Vec3 {
        let clip = view_projection.projection * view_projection.view * glm::vec4(point.x, point.y, point.z, 1.0);
        glm::vec3(clip.x / clip.w, clip.y / clip.w, clip.z / clip.w)
    }

    #[test]
    fn default_camera_looks_down_negative_z() {
        let view_projection = ViewProjection::new(&Camera::default(), EXTENT);

        let origin = view_projection.view * glm::vec4(0.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(origin, glm::vec4(0.0, 0.0, -5.0, 1.0), epsilon = 1e-6);
    }

    #[test]
    fn target_lands_in_the_middle_of_the_screen() {
        let ndc = clip(&ViewProjection::new(&Camera::default(), EXTENT), glm::vec3(0.0, 0.0, 0.0));

        assert_relative_eq!(ndc.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(ndc.y, 0.0, epsilon = 1e-6);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn world_up_maps_to_negative_clip_y() {
        let ndc = clip(&ViewProjection::new(&Camera::default(), EXTENT), glm::vec3(0.0, 1.0, 0.0));

        assert!(ndc.y < 0.0);
    }

    #[test]
    fn depth_spans_zero_to_one() {
        let camera = Camera::default();
        let view_projection = ViewProjection::new(&camera, EXTENT);

        let near = clip(&view_projection, glm::vec3(0.0, 0.0, camera.eye.z - camera.near));
        let far = clip(&view_projection, glm::vec3(0.0, 0.0, camera.eye.z - camera.far));

        assert_relative_eq!(near.z, 0.0, epsilon = 1e-5);
        assert_relative_eq!(far.z, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn zero_height_does_not_divide_by_zero() {
        let view_projection = ViewProjection::new(&Camera::default(), vk::Extent2D { width: 640, height: 0 });

        assert!(view_projection.projection.iter().all(|v| v.is_finite()));
    }
}
