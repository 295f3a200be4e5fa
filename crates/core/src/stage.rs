//! Pipeline stages and per-stage outcomes

use serde::Serialize;

/// Position of a request in the pipeline. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Idle,
    Linking,
    Expanding,
    Retrieving,
    Generating,
    Completed,
}

impl PipelineStage {
    /// The following stage; `Completed` is terminal.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Idle => Some(Self::Linking),
            Self::Linking => Some(Self::Expanding),
            Self::Expanding => Some(Self::Retrieving),
            Self::Retrieving => Some(Self::Generating),
            Self::Generating => Some(Self::Completed),
            Self::Completed => None,
        }
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Linking => write!(f, "linking"),
            Self::Expanding => write!(f, "expanding"),
            Self::Retrieving => write!(f, "retrieving"),
            Self::Generating => write!(f, "generating"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

/// What a stage produced: its real output, or the safe default it fell back
/// to after a soft collaborator failure.
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutcome<T> {
    Completed(T),
    Degraded { fallback: T, reason: String },
}

impl<T> StageOutcome<T> {
    pub fn degraded(fallback: T, reason: impl Into<String>) -> Self {
        Self::Degraded {
            fallback,
            reason: reason.into(),
        }
    }

    pub fn value(&self) -> &T {
        match self {
            Self::Completed(value) => value,
            Self::Degraded { fallback, .. } => fallback,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Self::Completed(value) => value,
            Self::Degraded { fallback, .. } => fallback,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Completed(_) => None,
            Self::Degraded { reason, .. } => Some(reason),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> StageOutcome<U> {
        match self {
            Self::Completed(value) => StageOutcome::Completed(f(value)),
            Self::Degraded { fallback, reason } => StageOutcome::Degraded {
                fallback: f(fallback),
                reason,
            },
        }
    }
}
