use std::fmt;

use serde::{Deserialize, Serialize};

use super::clock::Minutes;
use super::resource::ResourceId;
use super::timeline::DayWindow;

/// Aircraft types served by the dual-cabin ("DMS") procedure.
const DUAL_AIRCRAFT_TYPES: &[&str] = &["77W", "77R", "773", "744", "333", "359"];

/// Stable identifier of a task (flight).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Identifier shared by the members of a chain (bracket).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainId(pub String);

impl ChainId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// A fresh identifier for a chain created from a selection.
    pub fn generate() -> Self {
        Self(format!("chain-{}", uuid::Uuid::new_v4().simple()))
    }

    /// Placeholder marking `task` as explicitly ungrouped.
    pub fn solo(task: &TaskId) -> Self {
        Self(format!("solo-{}", task.as_str()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Placeholder ids (`solo-…`) and empty strings never form a bracket.
    pub fn is_groupable(&self) -> bool {
        !self.0.trim().is_empty() && !self.0.starts_with("solo-")
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChainId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// The two service categories; each has its own timing constants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    #[default]
    #[serde(alias = "SMS", alias = "sms")]
    Single,
    #[serde(alias = "DMS", alias = "dms")]
    Dual,
}

impl TaskKind {
    /// Classify by aircraft type code (case and whitespace insensitive).
    pub fn from_aircraft_type(ac_type: &str) -> Self {
        let normalized = ac_type.trim().to_uppercase();
        if DUAL_AIRCRAFT_TYPES.contains(&normalized.as_str()) {
            TaskKind::Dual
        } else {
            TaskKind::Single
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TaskKind::Single => "SMS",
            TaskKind::Dual => "DMS",
        }
    }
}

/// Half-open `[start, end)` span in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub start: Minutes,
    pub end: Minutes,
}

impl Interval {
    pub fn new(start: Minutes, end: Minutes) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> Minutes {
        self.end - self.start
    }

    pub fn is_instant(&self) -> bool {
        self.start == self.end
    }

    /// Touching endpoints do not overlap. Two zero-length spans at the same
    /// instant do.
    pub fn overlaps(&self, other: &Interval) -> bool {
        if self.is_instant() && other.is_instant() {
            return self.start == other.start;
        }
        !(self.end <= other.start || self.start >= other.end)
    }
}

/// Timing constants used to derive a task's service times from its departure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingRules {
    pub load_single: Minutes,
    pub load_dual: Minutes,
    pub service_single: Minutes,
    pub service_dual: Minutes,
    pub leave_before_departure: Minutes,
}

impl Default for TimingRules {
    fn default() -> Self {
        Self {
            load_single: 180,
            load_dual: 240,
            service_single: 19,
            service_dual: 45,
            leave_before_departure: 60,
        }
    }
}

impl TimingRules {
    pub fn load_time(&self, kind: TaskKind) -> Minutes {
        match kind {
            TaskKind::Single => self.load_single,
            TaskKind::Dual => self.load_dual,
        }
    }

    pub fn service_time(&self, kind: TaskKind) -> Minutes {
        match kind {
            TaskKind::Single => self.service_single,
            TaskKind::Dual => self.service_dual,
        }
    }
}

/// The time fields of a task, all in minutes from the plan's day origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceTimes {
    pub scheduled_departure: Minutes,
    pub kitchen_out: Minutes,
    pub service_start: Minutes,
    pub service_end: Minutes,
    pub unload_end: Minutes,
    pub load_start: Minutes,
    pub load_end: Minutes,
}

impl ServiceTimes {
    /// Derive every field from the scheduled departure.
    ///
    /// The vehicle leaves the aircraft `leave_before_departure` minutes before
    /// departure; service ends there and starts one service duration earlier.
    /// Kitchen hand-off and return to the unload window are one load time
    /// either side. Derived values are clamped to `window`.
    pub fn from_departure(
        kind: TaskKind,
        departure: Minutes,
        rules: &TimingRules,
        window: &DayWindow,
    ) -> Self {
        let leave = departure - rules.leave_before_departure;
        let service_end = window.clamp(leave);
        let service_start = window.clamp(leave - rules.service_time(kind));
        let kitchen_out = window.clamp(leave - rules.service_time(kind) - rules.load_time(kind));
        let unload_end = window.clamp(leave + rules.load_time(kind));
        Self {
            scheduled_departure: departure,
            kitchen_out,
            service_start,
            service_end,
            unload_end,
            load_start: kitchen_out,
            load_end: unload_end,
        }
    }

    /// `load_start <= service_start <= service_end <= unload_end`.
    pub fn is_ordered(&self) -> bool {
        self.load_start <= self.service_start
            && self.service_start <= self.service_end
            && self.service_end <= self.unload_end
    }
}

/// A single flight to be served by a vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    #[serde(default)]
    pub flight_no: String,
    #[serde(default)]
    pub route: String,
    #[serde(default)]
    pub aircraft_type: String,
    pub kind: TaskKind,
    /// Bracket this task belongs to; `None` when not grouped.
    #[serde(default, with = "empty_as_none")]
    pub chain_id: Option<ChainId>,
    /// Vehicle serving this task; `None` when unassigned.
    #[serde(default, with = "empty_as_none")]
    pub resource_id: Option<ResourceId>,
    #[serde(flatten)]
    pub times: ServiceTimes,
    #[serde(default)]
    pub cancelled: bool,
}

impl Task {
    /// Create an unassigned, ungrouped task with the given times.
    pub fn new(id: impl Into<String>, kind: TaskKind, times: ServiceTimes) -> Self {
        Self {
            id: TaskId::new(id),
            flight_no: String::new(),
            route: String::new(),
            aircraft_type: String::new(),
            kind,
            chain_id: None,
            resource_id: None,
            times,
            cancelled: false,
        }
    }

    /// The `[service_start, service_end)` span used for overlap tests.
    pub fn service_interval(&self) -> Interval {
        Interval::new(self.times.service_start, self.times.service_end)
    }

    pub fn start(&self) -> Minutes {
        self.times.service_start
    }

    pub fn end(&self) -> Minutes {
        self.times.service_end
    }

    pub fn is_assigned(&self) -> bool {
        self.resource_id.is_some()
    }

    pub fn is_on(&self, resource: &ResourceId) -> bool {
        self.resource_id.as_ref() == Some(resource)
    }

    pub fn in_chain(&self, chain: &ChainId) -> bool {
        self.chain_id.as_ref() == Some(chain)
    }

    /// Latest of the fields that bound the rendered bar.
    pub fn latest_time(&self) -> Minutes {
        self.times
            .load_end
            .max(self.times.service_end)
            .max(self.times.unload_end)
    }
}

/// Serde helper: the wire form uses `""` for "no value".
mod empty_as_none {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: AsRef<str>,
        S: Serializer,
    {
        value
            .as_ref()
            .map(|v| AsRef::<str>::as_ref(v))
            .unwrap_or("")
            .serialize(serializer)
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        T: From<String>,
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(raw
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(T::from))
    }
}

impl AsRef<str> for TaskId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ChainId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for ChainId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}
