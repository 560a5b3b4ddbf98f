use serde::{Deserialize, Serialize};

use super::clock::{Minutes, MINUTES_PER_DAY};
use super::task::Task;

/// The visible span of the timeline, in minutes from the day origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayWindow {
    pub start: Minutes,
    pub end: Minutes,
}

impl Default for DayWindow {
    /// 18:00 of the previous day through 06:00 of the next.
    fn default() -> Self {
        Self {
            start: -6 * 60,
            end: 30 * 60,
        }
    }
}

impl DayWindow {
    pub fn new(start: Minutes, end: Minutes) -> Self {
        Self { start, end }
    }

    pub fn clamp(&self, minutes: Minutes) -> Minutes {
        minutes.max(self.start).min(self.end)
    }

    pub fn contains(&self, minutes: Minutes) -> bool {
        minutes >= self.start && minutes <= self.end
    }

    pub fn len(&self) -> Minutes {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Stretch the end so every task fits, plus `buffer`, rounded up to the hour.
    /// Never shrinks below the configured end.
    pub fn extended_to_fit<'a>(
        &self,
        tasks: impl IntoIterator<Item = &'a Task>,
        buffer: Minutes,
    ) -> DayWindow {
        let latest = tasks
            .into_iter()
            .map(Task::latest_time)
            .fold(self.end, Minutes::max);
        let aligned = ceil_to_hour(latest + buffer);
        DayWindow::new(self.start, self.end.max(aligned))
    }

    /// Grid line positions from start to end inclusive.
    pub fn grid_lines(&self, step: Minutes) -> Vec<GridLine> {
        if step <= 0 {
            return Vec::new();
        }
        (self.start..=self.end)
            .step_by(step as usize)
            .map(|at| GridLine {
                at,
                is_hour: at.rem_euclid(60) == 0,
            })
            .collect()
    }

    /// Midnights (day boundaries) inside the window.
    pub fn midnight_markers(&self) -> Vec<Minutes> {
        [0, MINUTES_PER_DAY]
            .into_iter()
            .filter(|m| self.contains(*m))
            .collect()
    }
}

fn ceil_to_hour(minutes: Minutes) -> Minutes {
    let rem = minutes.rem_euclid(60);
    if rem == 0 {
        minutes
    } else {
        minutes + (60 - rem)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLine {
    pub at: Minutes,
    pub is_hour: bool,
}

/// Horizontal extent of a task bar, in pixels from the window start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarExtent {
    pub left: f32,
    pub width: f32,
}

/// Manages the horizontal mapping of the timeline.
#[derive(Debug, Clone)]
pub struct TimelineViewport {
    pub window: DayWindow,
    /// Pixels per minute at scale 1.0.
    pub base_pixels_per_minute: f32,
    /// Horizontal zoom factor.
    pub scale: f32,
    pub min_bar_width: f32,
}

impl TimelineViewport {
    pub fn new(window: DayWindow, base_pixels_per_minute: f32, min_bar_width: f32) -> Self {
        Self {
            window,
            base_pixels_per_minute,
            scale: 1.0,
            min_bar_width,
        }
    }

    pub fn pixels_per_minute(&self) -> f32 {
        self.base_pixels_per_minute * self.scale
    }

    /// Convert a minute offset to an x-pixel offset from the window start.
    pub fn minute_to_x(&self, minutes: Minutes) -> f32 {
        (minutes - self.window.start) as f32 * self.pixels_per_minute()
    }

    /// Convert an x-pixel offset back to a minute offset.
    pub fn x_to_minute(&self, x: f32) -> Minutes {
        self.window.start + (x / self.pixels_per_minute()).round() as Minutes
    }

    /// Total width in pixels for the visible range.
    pub fn total_width(&self) -> f32 {
        self.minute_to_x(self.window.end)
    }

    /// Bar of a task: from load start to load end, never thinner than the minimum.
    pub fn bar_extent(&self, task: &Task) -> BarExtent {
        let width = (task.times.load_end - task.times.load_start) as f32 * self.pixels_per_minute();
        BarExtent {
            left: self.minute_to_x(task.times.load_start),
            width: width.max(self.min_bar_width),
        }
    }

    pub fn zoom_in(&mut self) {
        self.scale = (self.scale * 1.2).min(4.0);
    }

    pub fn zoom_out(&mut self) {
        self.scale = (self.scale / 1.2).max(0.25);
    }

    pub fn reset_zoom(&mut self) {
        self.scale = 1.0;
    }
}
