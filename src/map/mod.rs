//! Slippy-map camera and tile service.
//!
//! This module plays the role the map renderer played in the original game:
//! it owns the camera transform (center, zoom, pitch, bearing), produces the
//! mercator-space view-projection matrix the 3D overlay composes against,
//! and fetches raster tiles for the base map.

pub mod camera;
pub mod style;
pub mod transform;

pub use camera::CameraPose;
pub use style::{StyleVariant, TileFetcher, TileId};
pub use transform::{MapOptions, MapTransform};

use thiserror::Error;

/// Errors from the map service.
#[derive(Debug, Error)]
pub enum MapError {
    #[error("tile fetch failed: {0}")]
    TileFetch(String),

    #[error("tile decode failed: {0}")]
    TileDecode(String),

    #[error("style fetch failed: {0}")]
    StyleFetch(String),
}
