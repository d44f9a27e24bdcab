//! Timewalk - Location-Based History Game
//!
//! An educational browser-game rework in Rust: a 3D avatar walks a
//! real-world map, the player seeks out historical-figure markers, listens
//! to their stories and places them on a chronological timeline. The core
//! of the crate is the coordinate-synchronization layer that keeps the 3D
//! overlay locked onto the slippy map's camera, frame by frame.

pub mod assets;
pub mod audio;
pub mod game;
pub mod geo;
pub mod input;
pub mod map;
pub mod storage;
pub mod ui;
pub mod world;

// Re-export commonly used types
pub use game::{CompletionSet, TimelineConfig, TimelineGame};
pub use geo::GeoPosition;
pub use map::{CameraPose, MapTransform};
pub use world::bridge::CoordinateBridge;
pub use world::World;
