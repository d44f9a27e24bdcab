//! The timeline mini-game: layout, placement rounds, progress, rewards.

pub mod progress;
pub mod rewards;
pub mod timeline;

pub use progress::CompletionSet;
pub use rewards::RewardPools;
pub use timeline::{PlacementOutcome, TimelineConfig, TimelineGame, TimelineSlot};
