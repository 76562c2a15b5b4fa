use std::path::PathBuf;

use thiserror::Error;
use vulkanalia::prelude::v1_0::*;

/// Failures of setup, asset loading and API contract checks.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Failed to find suitable memory type (type bits {type_bits:#b}, properties {properties:?}).")]
    NoSuitableMemoryType {
        type_bits: u32,
        properties: vk::MemoryPropertyFlags,
    },
    #[error("Unsupported image layout transition ({old:?} -> {new:?}).")]
    UnsupportedLayoutTransition {
        old: vk::ImageLayout,
        new: vk::ImageLayout,
    },
    #[error("Mesh index {index} out of range ({count} meshes).")]
    MeshOutOfRange { index: usize, count: usize },
    #[error("Mesh model id {id} out of range ({count} models).")]
    ModelOutOfRange { id: usize, count: usize },
    #[error("Texture registry is full ({capacity} textures).")]
    TextureRegistryFull { capacity: usize },
    #[error("Mesh has no {0}.")]
    EmptyGeometry(&'static str),
    #[error("Mesh model list is full ({capacity} models).")]
    ModelListFull { capacity: usize },
    #[error("Failed to load shader `{path}`: {source}")]
    ShaderLoad {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to load texture `{path}`: {reason}")]
    TextureLoad { path: PathBuf, reason: String },
    #[error("Failed to load model `{path}`: {reason}")]
    ModelLoad { path: PathBuf, reason: String },
}

/// Failures on the per-frame path. None of them are retried.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("Failed to acquire swapchain image: {0}")]
    Acquire(String),
    #[error("Failed to submit draw commands: {0}")]
    Submit(vk::ErrorCode),
    #[error("Failed to present swapchain image: {0}")]
    Present(String),
}

/// Reason a physical device was skipped during selection.
#[derive(Debug, Error)]
#[error("Missing {0}.")]
pub struct SuitabilityError(pub &'static str);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_messages_name_the_index() {
        let error = RendererError::MeshOutOfRange { index: 7, count: 3 };
        assert_eq!(error.to_string(), "Mesh index 7 out of range (3 meshes).");

        let error = RendererError::ModelOutOfRange { id: 2, count: 0 };
        assert_eq!(error.to_string(), "Mesh model id 2 out of range (0 models).");
    }

    #[test]
    fn suitability_error_reads_as_a_missing_feature() {
        let error = SuitabilityError("required queue families");
        assert_eq!(error.to_string(), "Missing required queue families.");
    }
}
