use std::fmt;

use serde::{Deserialize, Serialize};

use super::clock::{format_duration, Minutes, MINUTES_PER_DAY};
use super::task::{Interval, Task};

/// Identifier of a vehicle (or the driver operating it).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(pub String);

impl ResourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ResourceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for ResourceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A working shift. An end before the start means the shift runs past midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftWindow {
    pub start: Minutes,
    pub end: Minutes,
}

impl Default for ShiftWindow {
    fn default() -> Self {
        Self {
            start: 6 * 60,
            end: 22 * 60,
        }
    }
}

impl ShiftWindow {
    pub fn new(start: Minutes, end: Minutes) -> Self {
        Self { start, end }
    }

    pub fn effective_end(&self) -> Minutes {
        if self.end < self.start {
            self.end + MINUTES_PER_DAY
        } else {
            self.end
        }
    }

    pub fn duration(&self) -> Minutes {
        self.effective_end() - self.start
    }

    pub fn duration_label(&self) -> String {
        format_duration(self.duration())
    }

    pub fn covers(&self, span: &Interval) -> bool {
        span.start >= self.start && span.end <= self.effective_end()
    }
}

/// A vehicle that tasks can be assigned to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    pub name: String,
    #[serde(default)]
    pub driver: Option<String>,
    #[serde(default)]
    pub shift: ShiftWindow,
}

impl Resource {
    pub fn new(id: impl Into<String>, name: impl Into<String>, shift: ShiftWindow) -> Self {
        Self {
            id: ResourceId::new(id),
            name: name.into(),
            driver: None,
            shift,
        }
    }

    /// Lift number encoded in the id (`"M133"` → `"133"`).
    pub fn lift_number(&self) -> Option<String> {
        let number = self.id.as_str().trim_start_matches('M');
        (!number.is_empty()).then(|| number.to_string())
    }

    /// True when the resource's tasks run outside its shift.
    ///
    /// `tasks` is expected to hold only this resource's tasks.
    pub fn is_overtime<'a>(&self, tasks: impl IntoIterator<Item = &'a Task>) -> bool {
        let mut first: Option<Minutes> = None;
        let mut last: Option<Minutes> = None;
        for task in tasks {
            first = Some(first.map_or(task.start(), |f| f.min(task.start())));
            last = Some(last.map_or(task.end(), |l| l.max(task.end())));
        }
        match (first, last) {
            (Some(first), Some(last)) => !self.shift.covers(&Interval::new(first, last)),
            _ => false,
        }
    }
}
