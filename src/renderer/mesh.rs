use super::buffer::{self, AllocatedBuffer, TransferContext};
use super::error::RendererError;
use super::vertex::Vertex;

use anyhow::{anyhow, Result};
use log::*;
use nalgebra_glm as glm;
use vulkanalia::prelude::v1_0::*;

/// How a mesh is drawn.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DrawCall {
    Indexed { index_count: u32 },
    Vertices { vertex_count: u32 },
}

impl DrawCall {
    /// Vulkan buffers cannot be empty, so neither list may be.
    pub fn new(vertex_count: usize, indices: Option<&[u32]>) -> Result<Self> {
        if vertex_count == 0 {
            return Err(anyhow!(RendererError::EmptyGeometry("vertices")));
        }

        match indices {
            Some([]) => Err(anyhow!(RendererError::EmptyGeometry("indices"))),
            Some(indices) => Ok(DrawCall::Indexed { index_count: indices.len() as u32 }),
            None => Ok(DrawCall::Vertices { vertex_count: vertex_count as u32 }),
        }
    }
}

/// Device-local geometry plus its transform and texture id.
#[derive(Clone, Debug)]
pub struct Mesh {
    vertex_buffer: AllocatedBuffer,
    index_buffer: Option<AllocatedBuffer>,
    draw_call: DrawCall,
    transform: glm::Mat4,
    texture_id: usize,
}

impl Mesh {
    pub unsafe fn new(
        instance: &Instance,
        device: &Device,
        transfer: TransferContext,
        vertices: &[Vertex],
        indices: Option<&[u32]>,
        texture_id: usize,
    ) -> Result<Self> {
        let draw_call = DrawCall::new(vertices.len(), indices)?;

        let mut vertex_buffer = buffer::upload_device_local(
            instance,
            device,
            transfer,
            buffer::as_bytes(vertices),
            vk::BufferUsageFlags::VERTEX_BUFFER,
        )?;

        let index_buffer = match indices {
            Some(indices) => {
                let uploaded = buffer::upload_device_local(
                    instance,
                    device,
                    transfer,
                    buffer::as_bytes(indices),
                    vk::BufferUsageFlags::INDEX_BUFFER,
                );
                match uploaded {
                    Ok(index_buffer) => Some(index_buffer),
                    Err(e) => {
                        vertex_buffer.destroy(device);
                        return Err(e);
                    }
                }
            }
            None => None,
        };

        debug!("Created mesh ({:?}, texture {}).", draw_call, texture_id);

        Ok(Self {
            vertex_buffer,
            index_buffer,
            draw_call,
            transform: glm::identity(),
            texture_id,
        })
    }

    pub fn vertex_buffer(&self) -> vk::Buffer {
        self.vertex_buffer.buffer
    }

    pub fn index_buffer(&self) -> Option<vk::Buffer> {
        self.index_buffer.map(|b| b.buffer)
    }

    pub fn draw_call(&self) -> DrawCall {
        self.draw_call
    }

    pub fn texture_id(&self) -> usize {
        self.texture_id
    }

    pub fn transform(&self) -> &glm::Mat4 {
        &self.transform
    }

    pub fn set_transform(&mut self, transform: glm::Mat4) {
        self.transform = transform;
    }

    pub unsafe fn destroy(&mut self, device: &Device) {
        if let Some(index_buffer) = self.index_buffer.as_mut() {
            index_buffer.destroy(device);
        }
        self.vertex_buffer.destroy(device);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_geometry(error: anyhow::Error) -> Option<&'static str> {
        match error.downcast_ref::<RendererError>() {
            Some(RendererError::EmptyGeometry(what)) => Some(*what),
            _ => None,
        }
    }

    #[test]
    fn quad_indices_draw_indexed() {
        let indices = [0, 1, 2, 2, 3, 0];

        assert_eq!(DrawCall::new(4, Some(&indices)).unwrap(), DrawCall::Indexed { index_count: 6 });
    }

    #[test]
    fn missing_indices_draw_every_vertex() {
        assert_eq!(DrawCall::new(3, None).unwrap(), DrawCall::Vertices { vertex_count: 3 });
    }

    #[test]
    fn empty_index_list_is_rejected() {
        let error = DrawCall::new(3, Some(&[])).unwrap_err();

        assert_eq!(empty_geometry(error), Some("indices"));
    }

    #[test]
    fn empty_vertex_list_is_rejected() {
        assert_eq!(empty_geometry(DrawCall::new(0, None).unwrap_err()), Some("vertices"));
        assert_eq!(empty_geometry(DrawCall::new(0, Some(&[0, 1, 2])).unwrap_err()), Some("vertices"));
    }
}
