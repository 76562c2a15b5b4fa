//! Model import boundary.
//!
//! Files are read with `tobj` and converted into a small node hierarchy with
//! flat mesh and material arrays, which is all the mesh model loader needs.

use super::error::RendererError;
use super::vertex::Vertex;

use anyhow::Result;
use log::*;
use nalgebra_glm as glm;
use std::path::Path;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SceneNode {
    pub meshes: Vec<usize>,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    /// Own meshes first, then each child in order.
    fn collect_meshes(&self, order: &mut Vec<usize>) {
        order.extend_from_slice(&self.meshes);
        for child in &self.children {
            child.collect_meshes(order);
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SceneMesh {
    pub name: String,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub material: Option<usize>,
}

impl SceneMesh {
    /// Meshes without vertices or faces cannot back a Vulkan buffer.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.indices.is_empty()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SceneMaterial {
    pub name: String,
    pub diffuse_texture: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scene {
    pub root: SceneNode,
    pub meshes: Vec<SceneMesh>,
    pub materials: Vec<SceneMaterial>,
}

impl Scene {
    pub fn load(path: &Path) -> Result<Self> {
        let (models, materials) = tobj::load_obj(path, &load_options()).map_err(|e| RendererError::ModelLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let materials = materials.unwrap_or_else(|e| {
            warn!("No materials for `{}` ({}), using the fallback texture.", path.display(), e);
            Vec::new()
        });

        let scene = Scene::from_obj(models, materials);
        info!(
            "Imported `{}` ({} meshes, {} materials).",
            path.display(),
            scene.meshes.len(),
            scene.materials.len()
        );

        Ok(scene)
    }

    /// Each OBJ object becomes one child of the root, holding its mesh.
    pub fn from_obj(models: Vec<tobj::Model>, materials: Vec<tobj::Material>) -> Self {
        let materials = materials
            .into_iter()
            .map(|m| SceneMaterial {
                name: m.name,
                diffuse_texture: Some(m.diffuse_texture).filter(|t| !t.is_empty()),
            })
            .collect();

        let meshes = models.into_iter().map(convert_mesh).collect::<Vec<_>>();

        let children = (0..meshes.len())
            .map(|i| SceneNode { meshes: vec![i], children: vec![] })
            .collect();

        Self { root: SceneNode { meshes: vec![], children }, meshes, materials }
    }

    /// Mesh indices in depth-first node order.
    pub fn mesh_order(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.meshes.len());
        self.root.collect_meshes(&mut order);
        order
    }
}

pub fn load_options() -> tobj::LoadOptions {
    tobj::LoadOptions { triangulate: true, single_index: true, ..Default::default() }
}

fn convert_mesh(model: tobj::Model) -> SceneMesh {
    let mesh = model.mesh;
    let vertex_count = mesh.positions.len() / 3;
    let has_tex_coords = mesh.texcoords.len() >= vertex_count * 2;

    let vertices = (0..vertex_count)
        .map(|i| {
            let pos = glm::vec3(mesh.positions[i * 3], mesh.positions[i * 3 + 1], mesh.positions[i * 3 + 2]);
            // OBJ puts v = 0 at the bottom of the image.
            let tex_coord = if has_tex_coords {
                glm::vec2(mesh.texcoords[i * 2], 1.0 - mesh.texcoords[i * 2 + 1])
            } else {
                glm::vec2(0.0, 0.0)
            };
            Vertex::new(pos, glm::vec3(1.0, 1.0, 1.0), tex_coord)
        })
        .collect();

    SceneMesh { name: model.name, vertices, indices: mesh.indices, material: mesh.material_id }
}
