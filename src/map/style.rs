//! Map style and tile service.
//!
//! Tile styles are fetched by URL with an embedded API key; the key travels
//! in the query string because that is how the tile provider's ecosystem
//! works. Raster tiles for the base map are fetched asynchronously and
//! handed back to the UI thread through a channel.

use std::collections::HashSet;

use crossbeam::channel::{unbounded, Receiver, Sender};
use image::RgbaImage;

use super::MapError;
use crate::geo::MercatorCoord;

/// Base style selected by the 3D-mode toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleVariant {
    /// Street style with 3D building extrusions
    Streets3d,
    /// Flat style for low-powered devices
    Bright,
}

impl StyleVariant {
    pub fn from_enable_3d(enable_3d: bool) -> Self {
        if enable_3d {
            Self::Streets3d
        } else {
            Self::Bright
        }
    }

    fn slug(&self) -> &'static str {
        match self {
            Self::Streets3d => "streets-v2",
            Self::Bright => "bright",
        }
    }

    /// Full style URL with the API key embedded.
    pub fn style_url(&self, api_key: &str) -> String {
        format!(
            "https://api.maptiler.com/maps/{}/style.json?key={}",
            self.slug(),
            api_key
        )
    }
}

/// Address of a single slippy-map tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileId {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

impl TileId {
    /// The tile containing a Mercator coordinate at a zoom level.
    pub fn containing(merc: &MercatorCoord, z: u8) -> Self {
        let n = (1u32 << z) as f64;
        let x = (merc.x * n).floor().clamp(0.0, n - 1.0) as u32;
        let y = (merc.y * n).floor().clamp(0.0, n - 1.0) as u32;
        Self { z, x, y }
    }

    /// North-west corner of this tile in normalized Mercator space.
    pub fn mercator_origin(&self) -> (f64, f64) {
        let n = (1u32 << self.z) as f64;
        (self.x as f64 / n, self.y as f64 / n)
    }

    /// Normalized Mercator extent of one tile edge at this zoom.
    pub fn mercator_extent(&self) -> f64 {
        1.0 / (1u32 << self.z) as f64
    }

    /// Raster tile URL with the API key embedded.
    pub fn url(&self, api_key: &str) -> String {
        format!(
            "https://api.maptiler.com/tiles/satellite-v2/{}/{}/{}.jpg?key={}",
            self.z, self.x, self.y, api_key
        )
    }
}

/// A fetched, decoded tile.
pub struct FetchedTile {
    pub id: TileId,
    pub image: RgbaImage,
}

/// Asynchronous tile fetcher.
///
/// Requests are spawned onto the tokio runtime; decoded tiles come back over
/// a channel and are drained by the UI thread once per frame. In-flight
/// requests are tracked so a tile is never fetched twice.
pub struct TileFetcher {
    client: reqwest::Client,
    runtime: tokio::runtime::Handle,
    api_key: String,
    tx: Sender<(TileId, Result<RgbaImage, MapError>)>,
    rx: Receiver<(TileId, Result<RgbaImage, MapError>)>,
    in_flight: HashSet<TileId>,
}

impl TileFetcher {
    pub fn new(runtime: tokio::runtime::Handle, api_key: String) -> Self {
        let (tx, rx) = unbounded();
        Self {
            client: reqwest::Client::new(),
            runtime,
            api_key,
            tx,
            rx,
            in_flight: HashSet::new(),
        }
    }

    /// Request a tile unless it is already being fetched.
    pub fn request(&mut self, id: TileId) {
        if !self.in_flight.insert(id) {
            return;
        }

        let client = self.client.clone();
        let url = id.url(&self.api_key);
        let tx = self.tx.clone();

        self.runtime.spawn(async move {
            let result = Self::fetch_one(&client, &url).await;
            let _ = tx.send((id, result));
        });
    }

    async fn fetch_one(client: &reqwest::Client, url: &str) -> Result<RgbaImage, MapError> {
        let bytes = client
            .get(url)
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|e| MapError::TileFetch(e.to_string()))?
            .bytes()
            .await
            .map_err(|e| MapError::TileFetch(e.to_string()))?;

        let image = image::load_from_memory(&bytes)
            .map_err(|e| MapError::TileDecode(e.to_string()))?
            .to_rgba8();

        Ok(image)
    }

    /// Drain completed fetches. Failed tiles are logged and retried on a
    /// later request.
    pub fn poll(&mut self) -> Vec<FetchedTile> {
        let mut done = Vec::new();
        while let Ok((id, result)) = self.rx.try_recv() {
            self.in_flight.remove(&id);
            match result {
                Ok(image) => done.push(FetchedTile { id, image }),
                Err(e) => tracing::warn!("tile {}/{}/{}: {}", id.z, id.x, id.y, e),
            }
        }
        done
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoPosition;

    #[test]
    fn test_style_url_follows_toggle() {
        assert!(StyleVariant::from_enable_3d(true)
            .style_url("k")
            .contains("streets-v2"));
        assert!(StyleVariant::from_enable_3d(false)
            .style_url("k")
            .contains("bright"));
    }

    #[test]
    fn test_tile_containing_center() {
        let merc = MercatorCoord::from_geo(&GeoPosition::new(0.0, 0.0));
        let tile = TileId::containing(&merc, 1);
        // The equator/prime-meridian point sits at the corner of tile (1, 1).
        assert_eq!(tile, TileId { z: 1, x: 1, y: 1 });
    }

    #[test]
    fn test_tile_origin_round_trips() {
        let tile = TileId { z: 15, x: 17214, y: 11229 };
        let (mx, my) = tile.mercator_origin();
        assert_eq!(TileId::containing(&MercatorCoord { x: mx + 1e-9, y: my + 1e-9, z: 0.0 }, 15), tile);
    }
}
