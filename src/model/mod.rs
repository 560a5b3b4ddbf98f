pub mod clock;
pub mod plan;
pub mod resource;
pub mod task;
pub mod timeline;

pub use clock::Minutes;
pub use plan::Plan;
pub use resource::{Resource, ResourceId, ShiftWindow};
pub use task::{ChainId, Interval, ServiceTimes, Task, TaskId, TaskKind, TimingRules};
pub use timeline::{DayWindow, TimelineViewport};
