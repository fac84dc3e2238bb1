//! # Workflow Graph Model
//!
//! Declarative task/edge graphs handed to the external orchestrator at
//! registration time. A graph is constructed once from the entity
//! configuration table, never mutated at runtime, and reconstructed on every
//! orchestrator reload; the configuration table is the sole source of truth
//! and no graph state is persisted by this layer.
//!
//! ## Invariants
//!
//! - Node identifiers are unique within a workflow.
//! - Every edge endpoint names an existing node.
//! - The graph is a DAG; [`WorkflowGraph::validate`] rejects cycles.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};

use crate::command::{CommandTemplate, ParamContext};
use crate::error::{Result, TableflowError};
use crate::schedule::ScheduleSpec;

/// What a task node does when the orchestrator runs it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum TaskKind {
    /// Invoke a child workflow and wait for it to complete
    SubWorkflow { workflow_id: String },

    /// Run the entity's transform scripts, in order, inside a sub-workflow.
    /// If any script fails the task fails as a whole; there is no partial
    /// retry of later scripts at this layer.
    Transform { scripts: Vec<String> },

    /// Synchronize transform output (opaque external command)
    Sync,

    /// Merge synchronized output into the target store (opaque external command)
    Merge,
}

/// One unit of work submitted to the orchestrator's executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskNode {
    /// Unique task identifier within its workflow
    pub id: String,

    pub kind: TaskKind,

    /// Shell command template with named placeholders
    pub command: CommandTemplate,

    /// Parameters substituted into the command
    pub params: ParamContext,
}

impl TaskNode {
    /// Render this task's command against its own parameter context.
    pub fn rendered_command(&self) -> Result<String> {
        self.command.render(&self.params)
    }
}

/// Directed edge: `to` starts only after `from` succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
}

impl Edge {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Task/edge graph for one workflow.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorkflowGraph {
    pub nodes: Vec<TaskNode>,
    pub edges: Vec<Edge>,
}

impl WorkflowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.iter().any(|n| n.id == id)
    }

    pub fn node(&self, id: &str) -> Option<&TaskNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Node identifiers in insertion order.
    pub fn node_ids(&self) -> Vec<&str> {
        self.nodes.iter().map(|n| n.id.as_str()).collect()
    }

    pub fn has_edge(&self, from: &str, to: &str) -> bool {
        self.edges.iter().any(|e| e.from == from && e.to == to)
    }

    /// Direct successors of a node.
    pub fn successors(&self, id: &str) -> Vec<&str> {
        self.edges
            .iter()
            .filter(|e| e.from == id)
            .map(|e| e.to.as_str())
            .collect()
    }

    /// All nodes transitively downstream of `id`.
    pub fn downstream_of(&self, id: &str) -> HashSet<&str> {
        let mut seen = HashSet::new();
        let mut queue: VecDeque<&str> = self.successors(id).into();
        while let Some(next) = queue.pop_front() {
            if seen.insert(next) {
                queue.extend(self.successors(next));
            }
        }
        seen
    }

    /// Validate structural invariants: unique node ids, known edge endpoints,
    /// renderable commands, and acyclicity.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        let mut seen = HashSet::new();
        for node in &self.nodes {
            if !seen.insert(node.id.as_str()) {
                errors.push(format!("duplicate node identifier '{}'", node.id));
            }
            if let Err(e) = node.rendered_command() {
                errors.push(format!("node '{}': {e}", node.id));
            }
        }

        for edge in &self.edges {
            if !self.contains_node(&edge.from) {
                errors.push(format!("edge from unknown node '{}'", edge.from));
            }
            if !self.contains_node(&edge.to) {
                errors.push(format!("edge to unknown node '{}'", edge.to));
            }
        }

        if errors.is_empty() && self.topological_order().is_err() {
            errors.push("workflow graph contains a cycle".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(TableflowError::ValidationError(errors.join("; ")))
        }
    }

    /// Kahn's algorithm. Errors if the graph has a cycle.
    pub fn topological_order(&self) -> Result<Vec<&str>> {
        let mut in_degree: HashMap<&str, usize> =
            self.nodes.iter().map(|n| (n.id.as_str(), 0)).collect();
        for edge in &self.edges {
            if let Some(count) = in_degree.get_mut(edge.to.as_str()) {
                *count += 1;
            }
        }

        // Seed with roots in insertion order so the result is deterministic
        let mut queue: VecDeque<&str> = self
            .nodes
            .iter()
            .map(|n| n.id.as_str())
            .filter(|id| in_degree[id] == 0)
            .collect();

        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(id) = queue.pop_front() {
            order.push(id);
            for succ in self.successors(id) {
                if let Some(count) = in_degree.get_mut(succ) {
                    *count -= 1;
                    if *count == 0 {
                        queue.push_back(succ);
                    }
                }
            }
        }

        if order.len() == self.nodes.len() {
            Ok(order)
        } else {
            Err(TableflowError::ValidationError(
                "workflow graph contains a cycle".to_string(),
            ))
        }
    }
}

/// A complete workflow: identifier, metadata, optional schedule, and graph.
///
/// Sub-workflows carry `schedule: None`; they are independently inspectable
/// through their own identifier namespace but only ever triggered by the
/// parent chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    pub id: String,
    pub description: String,
    pub owner: String,
    pub schedule: Option<ScheduleSpec>,
    pub graph: WorkflowGraph,
}

impl WorkflowDefinition {
    /// Validate the definition before registration: graph invariants plus the
    /// schedule's cron expression when one is attached.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(TableflowError::ValidationError(
                "workflow identifier must not be empty".to_string(),
            ));
        }
        if let Some(schedule) = &self.schedule {
            schedule.validate()?;
        }
        self.graph.validate()
    }
}
