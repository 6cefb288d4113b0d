//! Pipeline assignment types.
//!
//! A pipeline binds a trigger kind to an ordered list of jobs. Gate
//! pipelines also name a queue: the serialization domain that lets only one
//! change's gate run advance at a time.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    /// Runs against proposed changes; results are advisory per-job voting.
    Check,
    /// Runs before merge; serialized per queue across changes.
    Gate,
}

impl std::fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TriggerKind::Check => write!(f, "check"),
            TriggerKind::Gate => write!(f, "gate"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pipeline {
    pub trigger: TriggerKind,
    /// Serialization domain for gate pipelines; required when `trigger` is
    /// `gate`, ignored for check.
    #[serde(default)]
    pub queue: Option<String>,
    pub jobs: Vec<PipelineJob>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineJob {
    pub job: String,
    /// Overrides the job definition's voting flag for this pipeline only.
    #[serde(default)]
    pub voting: Option<bool>,
}
