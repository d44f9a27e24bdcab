//! Asset layout and loading.
//!
//! Media lives in a fixed directory scheme: one directory per avatar model
//! (`models/<name>/scene.gltf`, `preview.png`, `license.txt`), one per
//! marker (`markers/<name>/icon.png`, `sound.mp3`, `image.png`), plus the
//! numbered reward pools and the fixed rejection sound.

pub mod loader;

pub use loader::{AssetLoader, LoadedModel};

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors surfaced by asset loading.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("model import failed: {0}")]
    ModelImport(String),

    #[error("image decode failed: {0}")]
    ImageDecode(String),
}

/// CPU-side triangle mesh extracted from a model file.
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

/// Resolves media paths under the asset root.
#[derive(Debug, Clone)]
pub struct AssetPaths {
    root: PathBuf,
}

impl AssetPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn model_scene(&self, asset_path: &str) -> PathBuf {
        self.root.join(asset_path).join("scene.gltf")
    }

    pub fn model_preview(&self, asset_path: &str) -> PathBuf {
        self.root.join(asset_path).join("preview.png")
    }

    pub fn model_license(&self, asset_path: &str) -> PathBuf {
        self.root.join(asset_path).join("license.txt")
    }

    pub fn marker_icon(&self, name: &str) -> PathBuf {
        self.root.join("markers").join(name).join("icon.png")
    }

    pub fn marker_sound(&self, name: &str) -> PathBuf {
        self.root.join("markers").join(name).join("sound.mp3")
    }

    pub fn marker_image(&self, name: &str) -> PathBuf {
        self.root.join("markers").join(name).join("image.png")
    }

    pub fn media(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }
}

/// Decode an image file to RGBA.
pub fn load_image(path: &Path) -> Result<image::RgbaImage, AssetError> {
    let bytes = std::fs::read(path).map_err(|source| AssetError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(image::load_from_memory(&bytes)
        .map_err(|e| AssetError::ImageDecode(e.to_string()))?
        .to_rgba8())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_layout() {
        let paths = AssetPaths::new("/assets");
        assert_eq!(
            paths.model_scene("models/mei/"),
            PathBuf::from("/assets/models/mei/scene.gltf")
        );
        assert_eq!(
            paths.marker_sound("schloss"),
            PathBuf::from("/assets/markers/schloss/sound.mp3")
        );
        assert_eq!(
            paths.media("nope.mp3"),
            PathBuf::from("/assets/nope.mp3")
        );
    }
}
