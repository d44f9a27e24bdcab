//! UI screens for the application.

pub mod info;
pub mod map_view;
pub mod model_select;
pub mod settings;
pub mod timeline;

pub use info::InfoScreen;
pub use map_view::{MapAction, MapViewScreen};
pub use model_select::{ModelSelectAction, ModelSelectScreen};
pub use settings::{SettingsAction, SettingsScreen};
pub use timeline::{TimelineAction, TimelineScreen};

/// Which modal overlay currently sits above the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Overlay {
    /// Plain map view
    #[default]
    None,
    /// Settings panel
    Settings,
    /// Info and license panel
    Info,
    /// Avatar selection grid; closable only once an avatar exists
    ModelSelect {
        can_close: bool,
    },
    /// Timeline (browsing or an active placement round)
    Timeline,
}
