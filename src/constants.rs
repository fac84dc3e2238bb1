//! # Run-State Contract
//!
//! Status enums describing the lifecycle the external orchestrator enforces
//! for scheduled runs and per-entity load chains. This crate never drives
//! these transitions; the types exist so that callers integrating with an
//! orchestrator share one vocabulary for run history and alerting.

use serde::{Deserialize, Serialize};

/// Default owner recorded on every workflow definition.
pub const DEFAULT_OWNER: &str = "data-platform";

/// Task identifier prefixes derived from an entity's process name.
pub mod task_prefixes {
    pub const SUBDAG: &str = "etl_";
    pub const SUBDAG_SUFFIX: &str = "_subdag";
    pub const SYNC: &str = "gsync_";
    pub const MERGE: &str = "gmerge_";
}

/// Lifecycle of one scheduled parent run, as reported by the orchestrator.
///
/// The parent's terminal status reflects the worst status among its entity
/// chains: failed if any chain failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Scheduled,
    Running,
    Success,
    Failed,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Success | RunStatus::Failed)
    }

    /// Valid forward transitions under the orchestrator contract.
    pub fn can_transition_to(&self, next: RunStatus) -> bool {
        matches!(
            (self, next),
            (RunStatus::Scheduled, RunStatus::Running)
                | (RunStatus::Running, RunStatus::Success)
                | (RunStatus::Running, RunStatus::Failed)
        )
    }
}

/// Lifecycle of a single entity's load chain within a parent run.
///
/// Failure at any stage halts that chain without affecting sibling chains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainStage {
    Pending,
    SubworkflowRunning,
    SyncRunning,
    MergeRunning,
    Success,
    Failed,
}

impl ChainStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ChainStage::Success | ChainStage::Failed)
    }

    /// Strict stage ordering: subworkflow, then sync, then merge. Any active
    /// stage may fail; only merge completes the chain.
    pub fn can_transition_to(&self, next: ChainStage) -> bool {
        use ChainStage::*;
        matches!(
            (self, next),
            (Pending, SubworkflowRunning)
                | (SubworkflowRunning, SyncRunning)
                | (SubworkflowRunning, Failed)
                | (SyncRunning, MergeRunning)
                | (SyncRunning, Failed)
                | (MergeRunning, Success)
                | (MergeRunning, Failed)
        )
    }
}
