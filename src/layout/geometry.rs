use serde::{Deserialize, Serialize};

/// Vertical sizes of a resource row and its task layers, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RowGeometry {
    /// Height of a row holding a single layer.
    pub lane_height: f32,
    /// Task height is `lane_height - task_inset`.
    pub task_inset: f32,
    /// Space between two stacked layers.
    pub layer_gap: f32,
    /// Height of a bracket on a single-layer row, and the minimum otherwise.
    pub bracket_height: f32,
    /// Extra room added around a multi-layer stack.
    pub row_padding: f32,
    /// Smallest height of the unassigned tray.
    pub tray_min_height: f32,
}

impl Default for RowGeometry {
    fn default() -> Self {
        Self {
            lane_height: 55.0,
            task_inset: 12.0,
            layer_gap: 6.0,
            bracket_height: 25.0,
            row_padding: 12.0,
            tray_min_height: 114.0,
        }
    }
}

impl RowGeometry {
    pub fn task_height(&self) -> f32 {
        self.lane_height - self.task_inset
    }

    /// Distance from one layer's top to the next.
    pub fn layer_spacing(&self) -> f32 {
        self.task_height() + self.layer_gap
    }

    /// Row height needed to show `layers` stacked layers.
    pub fn row_height(&self, layers: usize) -> f32 {
        if layers <= 1 {
            self.lane_height
        } else {
            self.lane_height
                .max(layers as f32 * self.layer_spacing() + self.row_padding)
        }
    }

    /// Top edge of the layer stack, centred in the row.
    pub fn stack_top(&self, layers: usize) -> f32 {
        let layers = layers.max(1);
        let stack = layers as f32 * self.layer_spacing();
        self.row_height(layers) / 2.0 - stack / 2.0
    }

    /// Top edge of a task on `layer` in a row with `layers` layers.
    pub fn layer_top(&self, layer: usize, layers: usize) -> f32 {
        if layers <= 1 {
            (self.lane_height - self.task_height()) / 2.0
        } else {
            self.stack_top(layers) + layer as f32 * self.layer_spacing()
        }
    }

    /// Height of the unassigned tray holding `lanes` lanes.
    pub fn tray_height(&self, lanes: usize) -> f32 {
        self.tray_min_height.max(lanes as f32 * self.lane_height)
    }
}
