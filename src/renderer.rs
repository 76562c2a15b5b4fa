mod buffer;
mod command_buffer;
mod defines;
mod descriptor;
mod error;
mod framebuffer;
mod handle;
mod image;
mod instance;
mod logical_device;
mod memory;
mod mesh;
mod mesh_model;
mod physical_device;
mod pipeline;
mod queue_family;
mod render_data;
mod scene;
mod swapchain;
mod sync;
mod texture;
mod uniform;
mod vertex;

pub use defines::CLEAR_COLOR;
pub use uniform::Camera;
pub use vertex::Vertex;

use defines::MAX_MESH_MODELS;
use error::{FrameError, RendererError};
use anyhow::{anyhow, Result};
use log::*;
use nalgebra_glm as glm;
use std::path::{Path, PathBuf};
use vulkanalia::loader::{LibloadingLoader, LIBRARY};
use vulkanalia::prelude::v1_0::*;
use vulkanalia::vk::{ExtDebugUtilsExtension, KhrSurfaceExtension, KhrSwapchainExtension};
use vulkanalia::window as vk_window;
use winit::window::Window;

use mesh::Mesh;
use mesh_model::MeshModel;
use scene::Scene;
use texture::{Pixels, Texture, TextureRegistry};

/// Runtime inputs of the renderer.
#[derive(Clone, Debug)]
pub struct Settings {
    pub shader_dir: PathBuf,
    pub texture_dir: PathBuf,
    pub clear_color: [f32; 4],
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            shader_dir: PathBuf::from("shaders"),
            texture_dir: PathBuf::from("textures"),
            clear_color: CLEAR_COLOR,
        }
    }
}

/// Owns every Vulkan object and draws the loaded mesh models once per `draw`.
#[derive(Debug)]
pub struct Renderer {
    _entry: Entry,
    instance: Instance,
    data: render_data::Data,
    device: Device,
    frame: sync::FrameCounter,
    image_fences: sync::ImageFences,
    textures: TextureRegistry,
    models: Vec<MeshModel>,
    camera: Camera,
    clear_color: [f32; 4],
    texture_dir: PathBuf,
    destroyed: bool,
}

impl Renderer {
    pub unsafe fn create(window: &Window, settings: &Settings) -> Result<Self> {
        let loader = LibloadingLoader::new(LIBRARY)?;
        let entry = Entry::new(loader).map_err(|b| anyhow!("{}", b))?;
        let mut data = render_data::Data::default();
        let instance = instance::create(window, &entry, &mut data)?;

        let device = match open_device(window, &instance, &mut data) {
            Ok(device) => device,
            Err(e) => {
                destroy_instance(&instance, &mut data);
                return Err(e);
            }
        };

        // From here on a failure is cleaned up by `Drop`.
        let mut renderer = Self {
            _entry: entry,
            instance,
            data,
            device,
            frame: sync::FrameCounter::default(),
            image_fences: sync::ImageFences::default(),
            textures: TextureRegistry::default(),
            models: Vec::new(),
            camera: Camera::default(),
            clear_color: settings.clear_color,
            texture_dir: settings.texture_dir.clone(),
            destroyed: false,
        };

        renderer.create_resources(window, &settings.shader_dir)?;

        info!("Renderer ready.");

        Ok(renderer)
    }

    unsafe fn create_resources(&mut self, window: &Window, shader_dir: &Path) -> Result<()> {
        let (instance, device, data) = (&self.instance, &self.device, &mut self.data);

        swapchain::create(window, instance, device, data)?;
        swapchain::create_swapchain_image_views(device, data)?;

        framebuffer::choose_depth_format(instance, data)?;
        pipeline::create_render_pass(device, data)?;

        descriptor::create_uniform_set_layout(device, data)?;
        descriptor::create_sampler_set_layout(device, data)?;
        pipeline::create_pipeline(device, data, shader_dir)?;

        command_buffer::create_command_pool(instance, device, data)?;

        framebuffer::create_depth_objects(instance, device, data)?;
        framebuffer::create(device, data)?;

        uniform::create_uniform_buffers(instance, device, data)?;
        descriptor::create_uniform_pool(device, data)?;
        descriptor::create_uniform_sets(device, data)?;
        descriptor::create_sampler_pool(device, data)?;

        command_buffer::create_command_buffers(device, data)?;

        sync::create_sync_objects(device, data)?;
        self.image_fences = sync::ImageFences::new(data.swapchain_images.len());

        // Fallback texture, always id 0.
        let fallback = Texture::new(instance, device, data, &Pixels::white())?;
        self.textures.push(fallback)?;

        Ok(())
    }

    /// Renders and presents one frame.
    pub unsafe fn draw(&mut self) -> Result<()> {
        let slot = self.frame.slot();
        let in_flight_fence = self.data.in_flight_fences[slot];

        self.device.wait_for_fences(&[in_flight_fence], true, defines::DRAW_TIMEOUT)?;
        self.device.reset_fences(&[in_flight_fence])?;

        // Acquire

        let result = self.device.acquire_next_image_khr(
            self.data.swapchain,
            defines::DRAW_TIMEOUT,
            self.data.image_available_semaphores[slot],
            vk::Fence::null(),
        );

        let image_index = match result {
            Ok((image_index, code)) if code == vk::SuccessCode::SUCCESS => image_index as usize,
            Ok((_, code)) => return Err(anyhow!(FrameError::Acquire(format!("{:?}", code)))),
            Err(e) => return Err(anyhow!(FrameError::Acquire(e.to_string()))),
        };

        if let Some(image_fence) = self.image_fences.claim(image_index, in_flight_fence) {
            self.device.wait_for_fences(&[image_fence], true, defines::DRAW_TIMEOUT)?;
        }

        // Record

        command_buffer::record(
            &self.device,
            &self.data,
            image_index,
            &self.models,
            &self.textures,
            self.clear_color,
        )?;

        let view_projection = uniform::ViewProjection::new(&self.camera, self.data.swapchain_extent);
        uniform::update_uniform_buffer(&self.device, &self.data, image_index, &view_projection)?;

        // Submit

        let wait_semaphores = &[self.data.image_available_semaphores[slot]];
        let wait_stages = &[vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let command_buffers = &[self.data.command_buffers[image_index]];
        let signal_semaphores = &[self.data.render_finished_semaphores[slot]];
        let submit_info = vk::SubmitInfo::builder()
            .wait_semaphores(wait_semaphores)
            .wait_dst_stage_mask(wait_stages)
            .command_buffers(command_buffers)
            .signal_semaphores(signal_semaphores);

        self.device
            .queue_submit(self.data.graphics_queue, &[submit_info], in_flight_fence)
            .map_err(FrameError::Submit)?;

        // Present

        let swapchains = &[self.data.swapchain];
        let image_indices = &[image_index as u32];
        let present_info = vk::PresentInfoKHR::builder()
            .wait_semaphores(signal_semaphores)
            .swapchains(swapchains)
            .image_indices(image_indices);

        match self.device.queue_present_khr(self.data.present_queue, &present_info) {
            Ok(code) if code == vk::SuccessCode::SUCCESS => {}
            Ok(code) => return Err(anyhow!(FrameError::Present(format!("{:?}", code)))),
            Err(e) => return Err(anyhow!(FrameError::Present(e.to_string()))),
        }

        self.frame.advance();

        Ok(())
    }

    /// Imports a model file and returns its id.
    pub unsafe fn create_mesh_model(&mut self, path: &Path) -> Result<usize> {
        self.ensure_model_capacity()?;

        let scene = Scene::load(path)?;
        let material_textures = mesh_model::resolve_materials(&scene.materials, |name| self.load_texture(name))?;

        let model = MeshModel::from_scene(&self.instance, &self.device, self.data.transfer(), &scene, &material_textures)?;

        info!("Loaded mesh model `{}` ({} meshes).", path.display(), model.mesh_count());

        self.models.push(model);
        Ok(self.models.len() - 1)
    }

    /// Builds a single-mesh model from in-memory geometry and returns its id.
    pub unsafe fn create_primitive_model(
        &mut self,
        vertices: &[Vertex],
        indices: Option<&[u32]>,
        texture_id: usize,
    ) -> Result<usize> {
        self.ensure_model_capacity()?;

        let mesh = Mesh::new(&self.instance, &self.device, self.data.transfer(), vertices, indices, texture_id)?;

        self.models.push(MeshModel::new(vec![mesh]));
        Ok(self.models.len() - 1)
    }

    pub fn update_model(&mut self, model_id: usize, transform: glm::Mat4) -> Result<()> {
        let count = self.models.len();
        let model = self
            .models
            .get_mut(model_id)
            .ok_or_else(|| anyhow!(RendererError::ModelOutOfRange { id: model_id, count }))?;

        model.set_transform(transform);

        Ok(())
    }

    /// Places one mesh relative to its model.
    pub fn update_mesh(&mut self, model_id: usize, mesh_index: usize, transform: glm::Mat4) -> Result<()> {
        let count = self.models.len();
        let model = self
            .models
            .get_mut(model_id)
            .ok_or_else(|| anyhow!(RendererError::ModelOutOfRange { id: model_id, count }))?;

        model.mesh_mut(mesh_index)?.set_transform(transform);

        Ok(())
    }

    pub fn model_count(&self) -> usize {
        self.models.len()
    }

    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
    }

    fn ensure_model_capacity(&self) -> Result<()> {
        if self.models.len() >= MAX_MESH_MODELS {
            return Err(anyhow!(RendererError::ModelListFull { capacity: MAX_MESH_MODELS }));
        }

        Ok(())
    }

    unsafe fn load_texture(&mut self, file_name: &str) -> Result<usize> {
        if let Some(id) = self.textures.find(file_name) {
            return Ok(id);
        }

        self.textures.ensure_capacity()?;

        let pixels = texture::load_png(&self.texture_dir.join(file_name))?;
        let texture = Texture::new(&self.instance, &self.device, &self.data, &pixels)?;
        let id = self.textures.push_named(file_name, texture)?;

        info!("Loaded texture `{}` as id {}.", file_name, id);

        Ok(id)
    }

    /// Releases everything in reverse dependency order. Safe to call twice.
    pub unsafe fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;

        if let Err(e) = self.device.device_wait_idle() {
            error!("Failed to idle device before teardown: {}", e);
        }

        self.models.iter_mut().for_each(|m| m.destroy(&self.device));
        self.models.clear();
        self.textures.destroy(&self.device);

        sync::destroy_sync_objects(&self.device, &mut self.data);
        self.image_fences.clear();
        command_buffer::destroy(&self.device, &mut self.data);
        uniform::destroy_uniform_buffers(&self.device, &mut self.data);
        descriptor::destroy(&self.device, &mut self.data);
        framebuffer::destroy(&self.device, &mut self.data);
        pipeline::destroy(&self.device, &mut self.data);
        swapchain::destroy(&self.device, &mut self.data);

        self.device.destroy_device(None);
        destroy_instance(&self.instance, &mut self.data);

        debug!("Renderer destroyed.");
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        unsafe { self.destroy() }
    }
}

/// Surface, physical device and logical device.
unsafe fn open_device(window: &Window, instance: &Instance, data: &mut render_data::Data) -> Result<Device> {
    data.surface = vk_window::create_surface(instance, window, window)?;
    physical_device::pick_physical_device(instance, data)?;
    logical_device::create(instance, data)
}

unsafe fn destroy_instance(instance: &Instance, data: &mut render_data::Data) {
    if let Some(surface) = handle::take(&mut data.surface) {
        instance.destroy_surface_khr(surface, None);
    }
    if let Some(messenger) = handle::take(&mut data.messenger) {
        instance.destroy_debug_utils_messenger_ext(messenger, None);
    }
    instance.destroy_instance(None);
}
