use super::buffer::TransferContext;
use super::defines;
use super::error::RendererError;
use super::mesh::Mesh;
use super::scene::{Scene, SceneMaterial};

use anyhow::{anyhow, Result};
use log::*;
use nalgebra_glm as glm;
use vulkanalia::prelude::v1_0::*;

/// The meshes of one imported asset, drawn in order under a shared transform.
#[derive(Clone, Debug)]
pub struct MeshModel {
    meshes: Vec<Mesh>,
    transform: glm::Mat4,
}

impl MeshModel {
    pub fn new(meshes: Vec<Mesh>) -> Self {
        Self { meshes, transform: glm::identity() }
    }

    /// Uploads every mesh of `scene` in depth-first node order.
    ///
    /// `material_textures` maps material index to texture id.
    pub unsafe fn from_scene(
        instance: &Instance,
        device: &Device,
        transfer: TransferContext,
        scene: &Scene,
        material_textures: &[usize],
    ) -> Result<Self> {
        let mut meshes = Vec::with_capacity(scene.meshes.len());

        for index in scene.mesh_order() {
            let source = &scene.meshes[index];
            if source.is_empty() {
                warn!("Skipping mesh `{}` without faces.", source.name);
                continue;
            }

            let texture_id = material_texture(material_textures, source.material);

            match Mesh::new(instance, device, transfer, &source.vertices, Some(&source.indices), texture_id) {
                Ok(mesh) => meshes.push(mesh),
                Err(e) => {
                    meshes.iter_mut().for_each(|m: &mut Mesh| m.destroy(device));
                    return Err(e);
                }
            }
        }

        Ok(Self::new(meshes))
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn mesh(&self, index: usize) -> Result<&Mesh> {
        self.meshes
            .get(index)
            .ok_or_else(|| anyhow!(RendererError::MeshOutOfRange { index, count: self.meshes.len() }))
    }

    pub fn mesh_mut(&mut self, index: usize) -> Result<&mut Mesh> {
        let count = self.meshes.len();
        self.meshes
            .get_mut(index)
            .ok_or_else(|| anyhow!(RendererError::MeshOutOfRange { index, count }))
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    pub fn transform(&self) -> &glm::Mat4 {
        &self.transform
    }

    pub fn set_transform(&mut self, transform: glm::Mat4) {
        self.transform = transform;
    }

    pub unsafe fn destroy(&mut self, device: &Device) {
        self.meshes.iter_mut().for_each(|m| m.destroy(device));
        self.meshes.clear();
    }
}

/// Strips any `\` or `/` directory prefix from a material's texture path.
pub fn texture_file_name(path: &str) -> &str {
    match path.rfind(['\\', '/']) {
        Some(i) => &path[i + 1..],
        None => path,
    }
}

/// Resolves each material to a texture id once per file.
///
/// Materials without a diffuse texture get the fallback id; the rest are
/// handed to `load` by file name.
pub fn resolve_materials(
    materials: &[SceneMaterial],
    mut load: impl FnMut(&str) -> Result<usize>,
) -> Result<Vec<usize>> {
    materials
        .iter()
        .map(|material| match material.diffuse_texture.as_deref().map(texture_file_name) {
            Some(file_name) if !file_name.is_empty() => load(file_name),
            _ => {
                debug!("Material `{}` has no diffuse texture.", material.name);
                Ok(defines::FALLBACK_TEXTURE_ID)
            }
        })
        .collect()
}

pub fn material_texture(material_textures: &[usize], material: Option<usize>) -> usize {
    material
        .and_then(|m| material_textures.get(m).copied())
        .unwrap_or(defines::FALLBACK_TEXTURE_ID)
}
