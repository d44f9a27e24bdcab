//! Timeline layout and the placement round state machine.

use serde::{Deserialize, Serialize};

use super::progress::CompletionSet;
use crate::world::markers::Marker;

/// Timeline geometry, tuned by eye in the original campaign and therefore
/// kept as named configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineConfig {
    /// First year on the axis
    pub start_year: i32,
    /// Last year on the axis
    pub end_year: i32,
    /// Vertical pixel density
    pub px_per_year: f64,
    /// Slot height in years
    pub slot_years: f64,
    /// Breathing room kept between compromised neighbors, in years
    pub neighbor_pad_years: f64,
    /// Tick spacing in years
    pub tick_years: i32,
    /// Every how many years a tick carries a numeral
    pub numeral_years: i32,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            start_year: 900,
            end_year: 1900,
            px_per_year: 5.0,
            slot_years: 32.0,
            neighbor_pad_years: 1.0,
            tick_years: 5,
            numeral_years: 25,
        }
    }
}

impl TimelineConfig {
    /// Pixel offset of a year position from the top of the axis.
    pub fn year_to_px(&self, year: f64) -> f64 {
        (year - self.start_year as f64) * self.px_per_year
    }

    /// Slot height in pixels.
    pub fn slot_px(&self) -> f64 {
        self.slot_years * self.px_per_year
    }
}

/// One laid-out marker slot.
#[derive(Debug, Clone)]
pub struct TimelineSlot {
    /// Marker key
    pub name: String,
    /// Marker display title
    pub title: String,
    /// The marker's year
    pub year: i32,
    /// Slot top offset in years from the axis origin's year scale
    pub offset_years: f64,
}

impl TimelineSlot {
    /// Slot top in pixels.
    pub fn top_px(&self, config: &TimelineConfig) -> f64 {
        config.year_to_px(self.offset_years)
    }
}

/// Lay out marker slots along the chronological axis.
///
/// A single left-to-right pass with immediate-neighbor lookahead: each slot
/// wants to sit at `year − slot/2`, but is clamped between a top compromise
/// (midpoint with the previous year, padded) and a bottom compromise
/// (midpoint with the next year, minus the slot, padded) so neighbors never
/// overlap. Markers must arrive sorted by year and reasonably spread; this
/// is not a general constraint solver.
pub fn layout(markers: &[Marker], config: &TimelineConfig) -> Vec<TimelineSlot> {
    markers
        .iter()
        .enumerate()
        .map(|(i, marker)| {
            let year = marker.year as f64;
            let want = year - config.slot_years / 2.0;

            let top_compromise = match i.checked_sub(1).and_then(|p| markers.get(p)) {
                Some(prev) => (year + prev.year as f64) / 2.0 + config.neighbor_pad_years,
                None => want,
            };
            let bottom_compromise = match markers.get(i + 1) {
                Some(next) => {
                    (year + next.year as f64) / 2.0 - config.slot_years - config.neighbor_pad_years
                }
                None => want,
            };

            let offset_years = if top_compromise > want {
                top_compromise
            } else if bottom_compromise < want {
                bottom_compromise
            } else {
                want
            };

            TimelineSlot {
                name: marker.name.clone(),
                title: marker.title.clone(),
                year: marker.year,
                offset_years,
            }
        })
        .collect()
}

/// Result of tapping a slot during a placement round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementOutcome {
    /// Right slot: progress persisted, reward due
    Correct,
    /// Wrong slot: rejection cue plays, input locked until it finishes
    Incorrect,
    /// A rejection cue is still playing
    InputLocked,
    /// This round is already solved; taps do nothing
    AlreadySolved,
}

/// State machine for one placement round.
///
/// `Unknown → Revealed` on the correct tap, nothing else moves the state.
/// While the rejection cue plays, input is locked; the cue's end unlocks it.
#[derive(Debug, Clone)]
pub struct TimelineGame {
    marker_name: String,
    locked: bool,
    solved: bool,
}

impl TimelineGame {
    /// Start a round asking the player to place the given marker.
    pub fn begin(marker_name: &str, progress: &CompletionSet) -> Self {
        Self {
            marker_name: marker_name.to_string(),
            locked: false,
            solved: progress.is_completed(marker_name),
        }
    }

    pub fn marker_name(&self) -> &str {
        &self.marker_name
    }

    pub fn solved(&self) -> bool {
        self.solved
    }

    pub fn input_locked(&self) -> bool {
        self.locked
    }

    /// The player taps the slot belonging to `slot_name`.
    pub fn tap(&mut self, slot_name: &str, progress: &mut CompletionSet) -> PlacementOutcome {
        if self.locked {
            return PlacementOutcome::InputLocked;
        }
        if self.solved {
            return PlacementOutcome::AlreadySolved;
        }

        if slot_name == self.marker_name {
            self.solved = true;
            progress.mark_completed(&self.marker_name);
            PlacementOutcome::Correct
        } else {
            self.locked = true;
            PlacementOutcome::Incorrect
        }
    }

    /// The rejection cue finished; accept input again.
    pub fn rejection_finished(&mut self) {
        self.locked = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker(name: &str, year: i32) -> Marker {
        Marker::new(name, name, 9.0, 49.0, year)
    }

    #[test]
    fn test_sparse_years_get_desired_positions() {
        let config = TimelineConfig::default();
        let markers = vec![marker("a", 1000), marker("b", 1100), marker("c", 1300)];

        let slots = layout(&markers, &config);

        for slot in &slots {
            let want = slot.year as f64 - config.slot_years / 2.0;
            assert!((slot.offset_years - want).abs() < 1e-9);
        }

        // Strictly increasing, non-overlapping.
        for pair in slots.windows(2) {
            assert!(pair[1].offset_years - pair[0].offset_years >= config.slot_years);
        }
    }

    #[test]
    fn test_dense_cluster_compromises_without_overlap() {
        let config = TimelineConfig::default();
        // 15-year gap, less than the 32-year slot.
        let markers = vec![marker("a", 1544), marker("b", 1605), marker("c", 1620), marker("d", 1700)];

        let slots = layout(&markers, &config);

        // b is pushed up by its bottom compromise, c down by its top one.
        let midpoint = (1605.0 + 1620.0) / 2.0;
        assert!(
            (slots[1].offset_years - (midpoint - config.slot_years - config.neighbor_pad_years))
                .abs()
                < 1e-9
        );
        assert!((slots[2].offset_years - (midpoint + config.neighbor_pad_years)).abs() < 1e-9);

        // Shifted apart by the slot plus padding on both sides; never
        // overlapping.
        let gap = slots[2].offset_years - slots[1].offset_years;
        assert!((gap - (config.slot_years + 2.0 * config.neighbor_pad_years)).abs() < 1e-9);
        for pair in slots.windows(2) {
            assert!(pair[1].offset_years - pair[0].offset_years >= config.slot_years);
        }
    }

    #[test]
    fn test_zero_padding_makes_dense_neighbors_contact_adjacent() {
        let config = TimelineConfig {
            neighbor_pad_years: 0.0,
            ..TimelineConfig::default()
        };
        let markers = vec![marker("a", 1605), marker("b", 1620)];

        let slots = layout(&markers, &config);

        let gap = slots[1].offset_years - slots[0].offset_years;
        assert!((gap - config.slot_years).abs() < 1e-9);
    }

    #[test]
    fn test_builtin_catalog_never_overlaps() {
        let config = TimelineConfig::default();
        let slots = layout(&crate::world::markers::builtin_markers(), &config);

        for pair in slots.windows(2) {
            assert!(pair[1].offset_years - pair[0].offset_years >= config.slot_years);
        }
    }

    #[test]
    fn test_correct_tap_reveals_and_persists_once() {
        let mut progress = CompletionSet::default();
        let mut round = TimelineGame::begin("schloss", &progress);

        assert_eq!(round.tap("schloss", &mut progress), PlacementOutcome::Correct);
        assert!(progress.is_completed("schloss"));
        assert!(round.solved());

        // Further taps are inert.
        assert_eq!(
            round.tap("schloss", &mut progress),
            PlacementOutcome::AlreadySolved
        );
        assert_eq!(progress.solved(), 1);
    }

    #[test]
    fn test_incorrect_tap_locks_until_cue_ends() {
        let mut progress = CompletionSet::default();
        let mut round = TimelineGame::begin("schloss", &progress);

        assert_eq!(
            round.tap("altstadt", &mut progress),
            PlacementOutcome::Incorrect
        );
        assert!(round.input_locked());
        assert!(progress.is_empty());

        // Locked: even the correct slot does nothing yet.
        assert_eq!(
            round.tap("schloss", &mut progress),
            PlacementOutcome::InputLocked
        );
        assert!(progress.is_empty());

        round.rejection_finished();
        assert!(!round.input_locked());
        assert_eq!(round.tap("schloss", &mut progress), PlacementOutcome::Correct);
    }

    #[test]
    fn test_repeated_incorrect_taps_never_mutate_progress() {
        let mut progress = CompletionSet::default();
        let mut round = TimelineGame::begin("schloss", &progress);

        for _ in 0..5 {
            round.tap("altstadt", &mut progress);
            round.rejection_finished();
        }
        assert!(progress.is_empty());
        assert!(!round.solved());
    }
}
