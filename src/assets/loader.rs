//! Cancellable avatar-model loading.
//!
//! Loads run on the tokio runtime; results come back over a channel tagged
//! with a request generation. A superseding request aborts the in-flight
//! future and bumps the generation, so a stale completion can never splice
//! itself into the scene: rapid model switches always end on the model
//! picked last.

use std::path::PathBuf;

use anyhow::Context;
use crossbeam::channel::{unbounded, Receiver, Sender};
use futures::future::{AbortHandle, Abortable};

use super::{AssetError, AssetPaths, MeshData};
use crate::world::avatar::PlayerModel;

/// A fully loaded avatar model.
#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub model: PlayerModel,
    pub meshes: Vec<MeshData>,
}

/// Loader with single-slot, latest-wins semantics.
pub struct AssetLoader {
    runtime: tokio::runtime::Handle,
    paths: AssetPaths,
    generation: u64,
    abort: Option<AbortHandle>,
    tx: Sender<(u64, Result<LoadedModel, AssetError>)>,
    rx: Receiver<(u64, Result<LoadedModel, AssetError>)>,
}

impl AssetLoader {
    pub fn new(runtime: tokio::runtime::Handle, paths: AssetPaths) -> Self {
        let (tx, rx) = unbounded();
        Self {
            runtime,
            paths,
            generation: 0,
            abort: None,
            tx,
            rx,
        }
    }

    /// Request an avatar model, superseding any load still in flight.
    pub fn request_model(&mut self, model: PlayerModel) {
        if let Some(abort) = self.abort.take() {
            abort.abort();
        }
        self.generation += 1;
        let generation = self.generation;

        let scene_path = self.paths.model_scene(&model.asset_path);
        let tx = self.tx.clone();

        let (abort_handle, abort_registration) = AbortHandle::new_pair();
        self.abort = Some(abort_handle);

        let task = Abortable::new(
            async move {
                let result = tokio::task::spawn_blocking(move || load_gltf(scene_path, model))
                    .await
                    .unwrap_or_else(|e| Err(AssetError::ModelImport(e.to_string())));
                let _ = tx.send((generation, result));
            },
            abort_registration,
        );

        self.runtime.spawn(task);
    }

    /// Drain completed loads, keeping only the current generation.
    pub fn poll(&mut self) -> Option<Result<LoadedModel, AssetError>> {
        let mut latest = None;
        while let Ok((generation, result)) = self.rx.try_recv() {
            if generation == self.generation {
                latest = Some(result);
            } else {
                tracing::debug!("dropping superseded model load (gen {})", generation);
            }
        }
        latest
    }
}

/// Import a glTF scene into CPU meshes.
fn load_gltf(path: PathBuf, model: PlayerModel) -> Result<LoadedModel, AssetError> {
    let (document, buffers, _images) = gltf::import(&path)
        .with_context(|| format!("importing {}", path.display()))
        .map_err(|e| AssetError::ModelImport(format!("{:#}", e)))?;

    let mut meshes = Vec::new();
    for mesh in document.meshes() {
        for primitive in mesh.primitives() {
            let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

            let Some(positions) = reader.read_positions() else {
                continue;
            };
            let positions: Vec<[f32; 3]> = positions.collect();

            let normals: Vec<[f32; 3]> = reader
                .read_normals()
                .map(|iter| iter.collect())
                .unwrap_or_default();

            let indices: Vec<u32> = reader
                .read_indices()
                .map(|iter| iter.into_u32().collect())
                .unwrap_or_else(|| (0..positions.len() as u32).collect());

            meshes.push(MeshData {
                positions,
                normals,
                indices,
            });
        }
    }

    if meshes.is_empty() {
        return Err(AssetError::ModelImport(format!(
            "{} contains no triangle meshes",
            path.display()
        )));
    }

    Ok(LoadedModel { model, meshes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::avatar::builtin_models;

    #[test]
    fn test_superseded_load_is_dropped() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let mut loader = AssetLoader::new(
            runtime.handle().clone(),
            AssetPaths::new("/nonexistent-assets"),
        );

        // Two requests back to back: only the second generation may ever
        // surface from poll. Both fail (no files on disk), which is exactly
        // the point: a stale failure must not masquerade as current.
        let mut models = builtin_models();
        loader.request_model(models.remove(0));
        loader.request_model(models.remove(0));

        std::thread::sleep(std::time::Duration::from_millis(200));

        match loader.poll() {
            Some(Err(AssetError::ModelImport(_))) | Some(Err(AssetError::Io { .. })) | None => {}
            other => panic!("unexpected poll result: {:?}", other.map(|r| r.is_ok())),
        }
        assert_eq!(loader.generation, 2);
    }
}
