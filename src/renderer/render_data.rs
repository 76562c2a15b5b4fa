use super::buffer::{AllocatedBuffer, TransferContext};
use super::image::AllocatedImage;

use vulkanalia::prelude::v1_0::*;

/// The Vulkan handles owned by the renderer, outside of meshes and textures.
#[derive(Clone, Debug, Default)]
pub struct Data {
    pub validation: bool,
    pub messenger: vk::DebugUtilsMessengerEXT,

    pub surface: vk::SurfaceKHR,

    pub physical_device: vk::PhysicalDevice,
    pub graphics_queue: vk::Queue,
    pub present_queue: vk::Queue,

    pub swapchain_format: vk::Format,
    pub swapchain_extent: vk::Extent2D,
    pub swapchain: vk::SwapchainKHR,
    pub swapchain_images: Vec<vk::Image>,
    pub swapchain_image_views: Vec<vk::ImageView>,

    pub depth_format: vk::Format,
    pub depth: AllocatedImage,

    // Pipeline
    pub render_pass: vk::RenderPass,
    pub uniform_set_layout: vk::DescriptorSetLayout,
    pub sampler_set_layout: vk::DescriptorSetLayout,
    pub pipeline_layout: vk::PipelineLayout,
    pub pipeline: vk::Pipeline,

    pub framebuffers: Vec<vk::Framebuffer>,

    // Descriptors
    pub uniform_buffers: Vec<AllocatedBuffer>,
    pub uniform_pool: vk::DescriptorPool,
    pub uniform_sets: Vec<vk::DescriptorSet>,
    pub sampler_pool: vk::DescriptorPool,

    pub command_pool: vk::CommandPool,
    pub command_buffers: Vec<vk::CommandBuffer>,

    // Sync Objects
    pub image_available_semaphores: Vec<vk::Semaphore>,
    pub render_finished_semaphores: Vec<vk::Semaphore>,
    pub in_flight_fences: Vec<vk::Fence>,
}

impl Data {
    /// Queue and pool used for load-time uploads.
    pub fn transfer(&self) -> TransferContext {
        TransferContext {
            physical_device: self.physical_device,
            queue: self.graphics_queue,
            command_pool: self.command_pool,
        }
    }
}
