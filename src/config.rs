use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{PlannerError, Result};
use crate::layout::{ChainTiming, RowGeometry};
use crate::model::{DayWindow, Minutes, TimelineViewport, TimingRules};

const CONFIG_FILE_NAME: &str = "planner.toml";

/// Planner settings. Every field has a default, so an empty file is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Visible day span before stretching to fit late tasks.
    #[serde(default)]
    pub window: DayWindow,

    /// Minutes between grid lines.
    #[serde(default = "default_grid_step")]
    pub grid_step: Minutes,

    /// Room kept after the latest task when stretching the window.
    #[serde(default = "default_day_end_buffer")]
    pub day_end_buffer: Minutes,

    /// Bracket lead and trail.
    #[serde(default)]
    pub timing: ChainTiming,

    /// Rules for deriving service times from a departure.
    #[serde(default)]
    pub derivation: TimingRules,

    #[serde(default)]
    pub geometry: RowGeometry,

    #[serde(default = "default_pixels_per_minute")]
    pub pixels_per_minute: f32,

    #[serde(default = "default_min_bar_width")]
    pub min_bar_width: f32,
}

fn default_grid_step() -> Minutes {
    30
}

fn default_day_end_buffer() -> Minutes {
    60
}

fn default_pixels_per_minute() -> f32 {
    4.0
}

fn default_min_bar_width() -> f32 {
    12.0
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            window: DayWindow::default(),
            grid_step: default_grid_step(),
            day_end_buffer: default_day_end_buffer(),
            timing: ChainTiming::default(),
            derivation: TimingRules::default(),
            geometry: RowGeometry::default(),
            pixels_per_minute: default_pixels_per_minute(),
            min_bar_width: default_min_bar_width(),
        }
    }
}

impl PlannerConfig {
    /// Parse and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: PlannerConfig = toml::from_str(&text)?;
        config.validate()?;
        debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// Like [`load`](Self::load), but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// `planner.toml` in the platform config directory.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "flight-planner").map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    pub fn validate(&self) -> Result<()> {
        if self.window.is_empty() {
            return Err(PlannerError::Config(format!(
                "window end ({}) must be after start ({})",
                self.window.end, self.window.start
            )));
        }
        if self.grid_step <= 0 {
            return Err(PlannerError::Config("grid_step must be positive".into()));
        }
        if self.day_end_buffer < 0 {
            return Err(PlannerError::Config("day_end_buffer must not be negative".into()));
        }
        if self.timing.trail < 0 || self.timing.lead.single < 0 || self.timing.lead.dual < 0 {
            return Err(PlannerError::Config("bracket lead and trail must not be negative".into()));
        }

        let g = &self.geometry;
        let sizes = [
            ("lane_height", g.lane_height),
            ("bracket_height", g.bracket_height),
            ("pixels_per_minute", self.pixels_per_minute),
        ];
        if let Some((name, _)) = sizes.iter().find(|(_, v)| *v <= 0.0) {
            return Err(PlannerError::Config(format!("{name} must be positive")));
        }
        if g.task_inset < 0.0 || g.layer_gap < 0.0 || g.row_padding < 0.0 || self.min_bar_width < 0.0 {
            return Err(PlannerError::Config("geometry sizes must not be negative".into()));
        }
        if g.task_height() <= 0.0 {
            return Err(PlannerError::Config("task_inset must be smaller than lane_height".into()));
        }
        Ok(())
    }

    /// A viewport over `window` at this config's scale.
    pub fn viewport(&self, window: DayWindow) -> TimelineViewport {
        TimelineViewport::new(window, self.pixels_per_minute, self.min_bar_width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config: PlannerConfig = toml::from_str("").unwrap();
        assert_eq!(config, PlannerConfig::default());
        assert_eq!(config.window, DayWindow::new(-360, 1800));
        assert_eq!(config.timing.trail, 20);
        assert_eq!(config.geometry.task_height(), 43.0);
        config.validate().unwrap();
    }

    #[test]
    fn partial_tables_keep_other_defaults() {
        let config: PlannerConfig = toml::from_str(
            r#"
            grid_step = 15

            [timing.lead]
            dual = 200

            [geometry]
            lane_height = 60.0
            "#,
        )
        .unwrap();
        assert_eq!(config.grid_step, 15);
        assert_eq!(config.timing.lead.dual, 200);
        assert_eq!(config.timing.lead.single, 155);
        assert_eq!(config.timing.trail, 20);
        assert_eq!(config.geometry.lane_height, 60.0);
        assert_eq!(config.geometry.layer_gap, 6.0);
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut config = PlannerConfig::default();
        config.window = DayWindow::new(100, 100);
        assert!(matches!(config.validate(), Err(PlannerError::Config(_))));

        let mut config = PlannerConfig::default();
        config.grid_step = 0;
        assert!(config.validate().is_err());

        let mut config = PlannerConfig::default();
        config.geometry.task_inset = 55.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let config = PlannerConfig::load_or_default(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config, PlannerConfig::default());
    }
}
