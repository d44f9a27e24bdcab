//! Geolocation input.
//!
//! A provider delivers an unbounded stream of position-or-error events on
//! its own schedule; only the latest position is acted upon. The first
//! error tears the watch down for the rest of the session and the UI offers
//! touch control instead.

use crossbeam::channel::{unbounded, Receiver, Sender};
use thiserror::Error;

use crate::geo::GeoPosition;

/// Geolocation failure reasons.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GeoError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("no position source available")]
    Unavailable,

    #[error("position request timed out")]
    Timeout,
}

/// One event from the provider.
#[derive(Debug, Clone)]
pub enum GeoEvent {
    Position(GeoPosition),
    Error(GeoError),
}

/// Source of geolocation events.
pub trait GeoProvider {
    /// Start watching; events arrive on the returned channel until the
    /// provider stops or errors.
    fn watch(&mut self) -> Receiver<GeoEvent>;
}

/// Provider that replays a fixed sequence of events, then goes quiet.
///
/// The desktop build has no live positioning hardware; this stands in for
/// it in demos and tests.
pub struct ReplayProvider {
    events: Vec<GeoEvent>,
}

impl ReplayProvider {
    pub fn new(events: Vec<GeoEvent>) -> Self {
        Self { events }
    }

    /// A provider that immediately reports the absence of a position
    /// source, driving the touch-control fallback path.
    pub fn unavailable() -> Self {
        Self::new(vec![GeoEvent::Error(GeoError::Unavailable)])
    }
}

impl GeoProvider for ReplayProvider {
    fn watch(&mut self) -> Receiver<GeoEvent> {
        let (tx, rx): (Sender<GeoEvent>, _) = unbounded();
        for event in self.events.drain(..) {
            let _ = tx.send(event);
        }
        rx
    }
}

/// Consumes a provider's event stream on behalf of the game loop.
pub struct GeoWatcher {
    rx: Option<Receiver<GeoEvent>>,
    error: Option<GeoError>,
}

impl GeoWatcher {
    pub fn new(provider: &mut dyn GeoProvider) -> Self {
        Self {
            rx: Some(provider.watch()),
            error: None,
        }
    }

    /// Drain pending events and return the latest position, if any.
    ///
    /// On error the watch is dropped: geolocation stays disabled for the
    /// session, matching the single-shot failure policy.
    pub fn poll_latest(&mut self) -> Option<GeoPosition> {
        let rx = self.rx.as_ref()?;

        let mut latest = None;
        while let Ok(event) = rx.try_recv() {
            match event {
                GeoEvent::Position(pos) => latest = Some(pos),
                GeoEvent::Error(e) => {
                    tracing::warn!("geolocation failed, disabling for session: {}", e);
                    self.error = Some(e);
                    self.rx = None;
                    return latest;
                }
            }
        }
        latest
    }

    pub fn error(&self) -> Option<&GeoError> {
        self.error.as_ref()
    }

    pub fn active(&self) -> bool {
        self.rx.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_position_wins() {
        let mut provider = ReplayProvider::new(vec![
            GeoEvent::Position(GeoPosition::new(9.0, 49.0)),
            GeoEvent::Position(GeoPosition::new(9.1, 49.1)),
            GeoEvent::Position(GeoPosition::new(9.2, 49.2)),
        ]);
        let mut watcher = GeoWatcher::new(&mut provider);

        let latest = watcher.poll_latest().unwrap();
        assert!((latest.lng - 9.2).abs() < 1e-12);
        assert!(watcher.error().is_none());
    }

    #[test]
    fn test_error_disables_watch_for_session() {
        let mut provider = ReplayProvider::new(vec![
            GeoEvent::Position(GeoPosition::new(9.0, 49.0)),
            GeoEvent::Error(GeoError::PermissionDenied),
            GeoEvent::Position(GeoPosition::new(9.5, 49.5)),
        ]);
        let mut watcher = GeoWatcher::new(&mut provider);

        // The position before the error still comes through once.
        let latest = watcher.poll_latest().unwrap();
        assert!((latest.lng - 9.0).abs() < 1e-12);

        assert_eq!(watcher.error(), Some(&GeoError::PermissionDenied));
        assert!(!watcher.active());

        // Nothing after the error is ever delivered.
        assert!(watcher.poll_latest().is_none());
    }
}
