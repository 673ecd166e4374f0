use minigames_core::pathfinding::{DEFAULT_NODES, GRID_CITY_NODES, search};
use minigames_core::sorting::{self, DEFAULT_BARS, DEFAULT_DELAY_MS, MAX_BARS, MAX_BARS_EXTENDED, MIN_BARS};
use minigames_core::sudoku::Difficulty;
use serde::{Deserialize, Serialize};

use crate::utils::*;

pub(crate) const MIN_NODES: usize = 10;
pub(crate) const MAX_NODES: usize = 300;
pub(crate) const DEFAULT_PATH_DELAY_MS: u32 = 40;
pub(crate) const MAX_DELAY_MS: u32 = 500;

/// User preferences for the visualizers and Sudoku.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Settings {
    pub sorting_algorithm: sorting::Algorithm,
    pub sorting_delay_ms: u32,
    pub sorting_bars: usize,
    /// Allows up to [`MAX_BARS_EXTENDED`] bars.
    pub sorting_extended: bool,
    pub path_algorithm: search::Algorithm,
    pub path_delay_ms: u32,
    pub path_nodes: usize,
    pub grid_city: bool,
    pub sparse_percent: u8,
    pub medium_percent: u8,
    pub traffic: bool,
    pub traffic_density: usize,
    pub sudoku_difficulty: Difficulty,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sorting_algorithm: sorting::Algorithm::default(),
            sorting_delay_ms: DEFAULT_DELAY_MS,
            sorting_bars: DEFAULT_BARS,
            sorting_extended: false,
            path_algorithm: search::Algorithm::default(),
            path_delay_ms: DEFAULT_PATH_DELAY_MS,
            path_nodes: DEFAULT_NODES,
            grid_city: false,
            sparse_percent: 85,
            medium_percent: 10,
            traffic: false,
            traffic_density: minigames_core::pathfinding::traffic::DEFAULT_DENSITY,
            sudoku_difficulty: Difficulty::default(),
        }
    }
}

impl StorageKey for Settings {
    const KEY: &'static str = "minigames:settings:v1";
}

impl Settings {
    /// Stored settings with out-of-range values pulled back into range.
    pub(crate) fn load() -> Self {
        let settings: Self = LocalOrDefault::local_or_default();
        settings.sanitized()
    }

    /// Applies `change` on top of what is stored and saves the result.
    pub(crate) fn update(change: impl FnOnce(&mut Self)) -> Self {
        let mut settings = Self::load();
        change(&mut settings);
        let settings = settings.sanitized();
        settings.local_save();
        settings
    }

    pub(crate) fn max_bars(&self) -> usize {
        if self.sorting_extended {
            MAX_BARS_EXTENDED
        } else {
            MAX_BARS
        }
    }

    /// Node count used for generation, the grid city overrides the slider.
    pub(crate) fn node_count(&self) -> usize {
        if self.grid_city {
            GRID_CITY_NODES
        } else {
            self.path_nodes
        }
    }

    fn sanitized(mut self) -> Self {
        self.sorting_delay_ms = self.sorting_delay_ms.min(MAX_DELAY_MS);
        self.sorting_bars = self.sorting_bars.clamp(MIN_BARS, self.max_bars());
        self.path_delay_ms = self.path_delay_ms.min(MAX_DELAY_MS);
        self.path_nodes = self.path_nodes.clamp(MIN_NODES, MAX_NODES);
        self.sparse_percent = self.sparse_percent.min(100);
        self.medium_percent = self.medium_percent.min(100 - self.sparse_percent);
        self.traffic_density = self
            .traffic_density
            .min(minigames_core::pathfinding::traffic::MAX_DENSITY);
        self
    }
}

/// Best local results, kept even when signed out.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct BestScores {
    pub twenty48: u32,
    pub snake: u32,
}

impl StorageKey for BestScores {
    const KEY: &'static str = "minigames:best:v1";
}

impl BestScores {
    /// Records `score` if it beats the stored one. Returns the best score.
    pub(crate) fn record(pick: impl Fn(&mut Self) -> &mut u32, score: u32) -> u32 {
        let mut best: Self = LocalOrDefault::local_or_default();
        let slot = pick(&mut best);
        if score > *slot {
            *slot = score;
            best.local_save();
            return score;
        }
        *slot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_keys_are_versioned() {
        assert_eq!(<Settings as StorageKey>::KEY, "minigames:settings:v1");
        assert_eq!(<BestScores as StorageKey>::KEY, "minigames:best:v1");
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"sorting_bars":77}"#).unwrap();
        assert_eq!(settings.sorting_bars, 77);
        assert_eq!(settings.path_nodes, DEFAULT_NODES);
        assert_eq!(settings.sudoku_difficulty, Difficulty::Medium);
    }

    #[test]
    fn sanitizing_clamps_ranges() {
        let settings = Settings {
            sorting_bars: 400,
            sorting_delay_ms: 10_000,
            path_nodes: 3,
            sparse_percent: 90,
            medium_percent: 50,
            traffic_density: 1000,
            ..Settings::default()
        }
        .sanitized();
        assert_eq!(settings.sorting_bars, MAX_BARS);
        assert_eq!(settings.sorting_delay_ms, MAX_DELAY_MS);
        assert_eq!(settings.path_nodes, MIN_NODES);
        assert_eq!(settings.medium_percent, 10);
        assert_eq!(settings.traffic_density, 50);

        let extended = Settings {
            sorting_bars: 400,
            sorting_extended: true,
            ..Settings::default()
        }
        .sanitized();
        assert_eq!(extended.sorting_bars, 400);
    }

    #[test]
    fn grid_city_overrides_node_count() {
        let settings = Settings {
            grid_city: true,
            ..Settings::default()
        };
        assert_eq!(settings.node_count(), GRID_CITY_NODES);
    }
}
