//! Candidate pipeline stages, the transition policy applied on writes, and the derived
//! per-stage aggregates. No transition history is kept: every aggregate is a pure read
//! over current stages.

mod summary;

pub use summary::{FunnelEntry, PipelineSummary};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    #[default]
    New,
    Screening,
    Interview,
    Offer,
    Hired,
    Rejected,
}

impl Stage {
    /// Conventional order, which is also the funnel order.
    pub const ALL: [Stage; 6] = [
        Stage::New,
        Stage::Screening,
        Stage::Interview,
        Stage::Offer,
        Stage::Hired,
        Stage::Rejected,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Stage::New => "new",
            Stage::Screening => "screening",
            Stage::Interview => "interview",
            Stage::Offer => "offer",
            Stage::Hired => "hired",
            Stage::Rejected => "rejected",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Stage::Hired | Stage::Rejected)
    }

    const fn rank(self) -> u8 {
        match self {
            Stage::New => 0,
            Stage::Screening => 1,
            Stage::Interview => 2,
            Stage::Offer => 3,
            Stage::Hired | Stage::Rejected => 4,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = PipelineError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Stage::ALL
            .into_iter()
            .find(|stage| stage.as_str() == normalized)
            .ok_or_else(|| PipelineError::UnknownStage(value.trim().to_string()))
    }
}

/// How stage changes on existing candidates are governed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelinePolicy {
    /// Any stage may be written at any time.
    #[default]
    Permissive,
    /// Forward moves only; `rejected` is reachable from any open stage and both
    /// terminal stages are final.
    Progressive,
}

impl PipelinePolicy {
    pub fn check(self, from: Stage, to: Stage) -> Result<(), PipelineError> {
        if from == to || self == PipelinePolicy::Permissive {
            return Ok(());
        }

        let allowed = !from.is_terminal() && (to == Stage::Rejected || to.rank() > from.rank());
        if allowed {
            Ok(())
        } else {
            Err(PipelineError::Transition { from, to })
        }
    }
}

impl FromStr for PipelinePolicy {
    type Err = PipelineError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "permissive" => Ok(PipelinePolicy::Permissive),
            "progressive" => Ok(PipelinePolicy::Progressive),
            other => Err(PipelineError::UnknownPolicy(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PipelineError {
    #[error(
        "Invalid stage '{0}'. Expected one of: new, screening, interview, offer, hired, rejected"
    )]
    UnknownStage(String),
    #[error("Cannot move candidate from {from} to {to}")]
    Transition { from: Stage, to: Stage },
    #[error("unknown pipeline policy '{0}'")]
    UnknownPolicy(String),
}
