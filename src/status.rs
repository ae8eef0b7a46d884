use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Recorded state of a study day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Planned,
    Done,
    Partial,
    Missed,
    None,
}

/// Click order of the status cycle.
pub const CYCLE: [Status; 5] = [
    Status::Planned,
    Status::Done,
    Status::Partial,
    Status::Missed,
    Status::None,
];

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Planned => "planned",
            Status::Done => "done",
            Status::Partial => "partial",
            Status::Missed => "missed",
            Status::None => "none",
        }
    }

    pub fn next(self) -> Status {
        next_status(Some(self))
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for Status {
    type Err = UnknownStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        CYCLE
            .iter()
            .copied()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| UnknownStatus(value.to_string()))
    }
}

/// Successor of `current` in the cycle, wrapping after `none`.
///
/// A missing status has no position in the cycle and is treated as sitting
/// just before the first entry, so it always advances to `planned`.
pub fn next_status(current: Option<Status>) -> Status {
    let index = current
        .and_then(|status| CYCLE.iter().position(|s| *s == status))
        .map(|i| i as isize)
        .unwrap_or(-1);
    CYCLE[((index + 1) as usize) % CYCLE.len()]
}

/// Same as [`next_status`] for a raw markup value; unknown strings cycle to `planned`.
pub fn next_status_str(current: Option<&str>) -> Status {
    next_status(current.and_then(|raw| raw.parse().ok()))
}
