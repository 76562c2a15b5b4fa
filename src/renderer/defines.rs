use vulkanalia::prelude::v1_0::*;

/// Whether the validation layers should be enabled.
pub const VALIDATION_ENABLED: bool = cfg!(debug_assertions);

/// The name of the validation layers.
pub const VALIDATION_LAYER: vk::ExtensionName = vk::ExtensionName::from_bytes(b"VK_LAYER_KHRONOS_validation");

/// The required device extensions.
pub const DEVICE_EXTENSIONS: &[vk::ExtensionName] = &[vk::KHR_SWAPCHAIN_EXTENSION.name];

/// The maximum number of frames the CPU may queue ahead of the GPU.
pub const MAX_QUEUED_DRAWS: usize = 2;

/// Capacity of the texture registry (and of the sampler descriptor pool).
pub const MAX_TEXTURES: usize = 64;

/// Capacity of the mesh model list.
pub const MAX_MESH_MODELS: usize = 64;

/// Timeout used for fence waits and image acquisition.
pub const DRAW_TIMEOUT: u64 = u64::MAX;

/// Texture id of the generated 1x1 white texture.
pub const FALLBACK_TEXTURE_ID: usize = 0;

/// Format used for every sampled texture.
pub const TEXTURE_FORMAT: vk::Format = vk::Format::R8G8B8A8_UNORM;

/// Color the swapchain image is cleared to before drawing.
pub const CLEAR_COLOR: [f32; 4] = [0.6, 0.65, 0.4, 1.0];
