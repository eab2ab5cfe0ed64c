use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a task node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Created, not yet handed to a runner
    #[default]
    New,
    /// Task logic is executing
    Running,
    /// Completed successfully or skipped
    Ok,
    /// Task logic returned an error
    Fail,
}

impl TaskStatus {
    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ok | Self::Fail)
    }

    /// Check whether `next` is a legal transition from this state
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (Self::New, Self::Running)
                | (Self::New, Self::Ok)
                | (Self::Running, Self::Ok)
                | (Self::Running, Self::Fail)
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::New => write!(f, "new"),
            Self::Running => write!(f, "running"),
            Self::Ok => write!(f, "ok"),
            Self::Fail => write!(f, "fail"),
        }
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(Self::New),
            "running" => Ok(Self::Running),
            "ok" => Ok(Self::Ok),
            "fail" => Ok(Self::Fail),
            _ => Err(format!("Invalid task status: {s}")),
        }
    }
}
