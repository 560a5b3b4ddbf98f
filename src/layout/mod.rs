pub mod chain;
pub mod gap;
pub mod geometry;
pub mod lanes;
pub mod layers;

pub use chain::{
    bracket_bounds, bracket_position, chain_window, chain_windows, BracketBounds, BracketPosition,
    ChainTiming, ChainWindow, LeadTimes,
};
pub use gap::{compute_gaps, Gap, GapInfo};
pub use geometry::RowGeometry;
pub use lanes::{pack_unassigned, LanePacking};
pub use layers::{assign_layers, layers_by_resource, LayerMap};
