//! Runtime configuration, read from `renderer.toml` when present.

use crate::renderer::{Camera, Settings, CLEAR_COLOR};

use nalgebra_glm as glm;
use serde::Deserialize;
use std::io;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "renderer.toml";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self { title: "vk_renderer".into(), width: 1600, height: 900 }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CameraConfig {
    pub eye: [f32; 3],
    pub target: [f32; 3],
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        let camera = Camera::default();
        Self {
            eye: camera.eye.into(),
            target: camera.target.into(),
            fov: camera.fov_degrees,
            near: camera.near,
            far: camera.far,
        }
    }
}

/// The spin applied to the loaded model every frame.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AnimationConfig {
    pub scale: f32,
    pub degrees_per_second: f32,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self { scale: 0.1, degrees_per_second: 10.0 }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub shader_dir: PathBuf,
    pub texture_dir: PathBuf,
    /// Built-in quads are drawn when unset.
    pub model: Option<PathBuf>,
    pub clear_color: [f32; 4],
    pub window: WindowConfig,
    pub camera: CameraConfig,
    pub animation: AnimationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            shader_dir: PathBuf::from("shaders"),
            texture_dir: PathBuf::from("textures"),
            model: None,
            clear_color: CLEAR_COLOR,
            window: WindowConfig::default(),
            camera: CameraConfig::default(),
            animation: AnimationConfig::default(),
        }
    }
}

impl Config {
    /// Reads `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_toml(&contents),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// The first argument, if any, replaces the model path.
    pub fn with_args(mut self, mut args: impl Iterator<Item = String>) -> Self {
        if let Some(model) = args.next() {
            self.model = Some(PathBuf::from(model));
        }
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid {
                field: "window",
                reason: format!("size {}x{} is empty", self.window.width, self.window.height),
            });
        }
        if !(self.camera.near > 0.0 && self.camera.near < self.camera.far) {
            return Err(ConfigError::Invalid {
                field: "camera",
                reason: format!("near {} must be positive and below far {}", self.camera.near, self.camera.far),
            });
        }
        if !(self.camera.fov > 0.0 && self.camera.fov < 180.0) {
            return Err(ConfigError::Invalid { field: "camera.fov", reason: format!("{} degrees", self.camera.fov) });
        }

        Ok(())
    }

    pub fn camera(&self) -> Camera {
        Camera {
            eye: glm::Vec3::from(self.camera.eye),
            target: glm::Vec3::from(self.camera.target),
            fov_degrees: self.camera.fov,
            near: self.camera.near,
            far: self.camera.far,
            ..Camera::default()
        }
    }

    pub fn settings(&self) -> Settings {
        Settings {
            shader_dir: self.shader_dir.clone(),
            texture_dir: self.texture_dir.clone(),
            clear_color: self.clear_color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(Config::from_toml("").unwrap(), Config::default());
    }

    #[test]
    fn missing_file_gives_defaults() {
        assert_eq!(Config::load(Path::new("no/such/renderer.toml")).unwrap(), Config::default());
    }

    #[test]
    fn partial_tables_keep_remaining_defaults() {
        let config = Config::from_toml(
            r#"
            model = "models/cottage.obj"

            [window]
            title = "Cottage"

            [camera]
            eye = [0.0, 2.0, 8.0]
            "#,
        )
        .unwrap();

        assert_eq!(config.model, Some(PathBuf::from("models/cottage.obj")));
        assert_eq!(config.window.title, "Cottage");
        assert_eq!(config.window.width, 1600);
        assert_eq!(config.camera().eye, glm::vec3(0.0, 2.0, 8.0));
        assert_eq!(config.camera().fov_degrees, 45.0);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(Config::from_toml("colour = 1"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn degenerate_values_are_rejected() {
        let error = Config::from_toml("[window]\nwidth = 0").unwrap_err();
        assert!(matches!(error, ConfigError::Invalid { field: "window", .. }));

        let error = Config::from_toml("[camera]\nnear = 10.0\nfar = 1.0").unwrap_err();
        assert!(matches!(error, ConfigError::Invalid { field: "camera", .. }));
    }

    #[test]
    fn first_argument_overrides_the_model() {
        let config = Config::default().with_args(vec!["house.obj".to_string(), "ignored".to_string()].into_iter());

        assert_eq!(config.model, Some(PathBuf::from("house.obj")));
        assert_eq!(Config::default().with_args(std::iter::empty()).model, None);
    }

    #[test]
    fn default_camera_matches_the_renderer() {
        let config = Config::default();

        assert_eq!(config.camera(), Camera::default());
        assert_eq!(config.settings().clear_color, CLEAR_COLOR);
    }
}
