//! # Workflow Registry
//!
//! Explicit registration entry point for the hosting process. Nothing in this
//! crate registers workflows as an import-time side effect: the host calls
//! [`register_workflows`] once with the entity table and schedule, and gets
//! back an [`OrchestratorHandle`] holding every definition the orchestrator
//! needs — unique identifiers, recurrence spec, start anchor, catch-up flag,
//! and the task/edge graphs.

use std::collections::HashMap;
use tracing::{info, warn};

use crate::builder::build_parent_workflow;
use crate::config::EntityConfigTable;
use crate::error::{Result, TableflowError};
use crate::graph::WorkflowDefinition;
use crate::logging::log_registry_operation;
use crate::schedule::ScheduleSpec;

/// In-memory registry of workflow definitions keyed by identifier.
///
/// Enforces identifier uniqueness at registration time; the orchestrator's
/// own registration API is expected to do the same, but rejecting collisions
/// here keeps an invalid set from ever reaching it.
#[derive(Debug, Default)]
pub struct WorkflowRegistry {
    workflows: HashMap<String, WorkflowDefinition>,
    registration_order: Vec<String>,
}

impl WorkflowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one workflow definition. The definition is validated first;
    /// a duplicate identifier is rejected.
    pub fn register(&mut self, definition: WorkflowDefinition) -> Result<()> {
        definition.validate()?;

        if self.workflows.contains_key(&definition.id) {
            warn!(workflow_id = %definition.id, "Rejecting duplicate workflow registration");
            return Err(TableflowError::DuplicateWorkflowId(definition.id));
        }

        info!(
            workflow_id = %definition.id,
            task_count = definition.graph.nodes.len(),
            scheduled = definition.schedule.is_some(),
            "Registering workflow"
        );

        self.registration_order.push(definition.id.clone());
        self.workflows.insert(definition.id.clone(), definition);
        Ok(())
    }

    pub fn get(&self, workflow_id: &str) -> Option<&WorkflowDefinition> {
        self.workflows.get(workflow_id)
    }

    pub fn contains(&self, workflow_id: &str) -> bool {
        self.workflows.contains_key(workflow_id)
    }

    pub fn len(&self) -> usize {
        self.workflows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workflows.is_empty()
    }

    /// Workflow identifiers in registration order.
    pub fn workflow_ids(&self) -> Vec<&str> {
        self.registration_order.iter().map(String::as_str).collect()
    }
}

/// Result of a completed registration: the parent identifier plus a registry
/// of every definition handed to the orchestrator.
#[derive(Debug)]
pub struct OrchestratorHandle {
    parent_id: String,
    registry: WorkflowRegistry,
}

impl OrchestratorHandle {
    /// Identifier of the scheduled parent workflow.
    pub fn parent_id(&self) -> &str {
        &self.parent_id
    }

    pub fn parent(&self) -> &WorkflowDefinition {
        self.registry
            .get(&self.parent_id)
            .expect("parent is registered by construction")
    }

    /// Sub-workflow definitions in registration (table) order.
    pub fn subdags(&self) -> Vec<&WorkflowDefinition> {
        self.registry
            .workflow_ids()
            .into_iter()
            .filter(|id| *id != self.parent_id)
            .filter_map(|id| self.registry.get(id))
            .collect()
    }

    pub fn get(&self, workflow_id: &str) -> Option<&WorkflowDefinition> {
        self.registry.get(workflow_id)
    }

    /// Total number of registered workflows (parent plus sub-workflows).
    pub fn workflow_count(&self) -> usize {
        self.registry.len()
    }
}

/// Build and register the complete workflow set for one entity table.
///
/// Fails closed: any configuration, schedule, or identifier problem aborts
/// registration entirely and nothing is handed to the orchestrator.
pub fn register_workflows(
    parent_id: &str,
    table: &EntityConfigTable,
    schedule: ScheduleSpec,
) -> Result<OrchestratorHandle> {
    let built = build_parent_workflow(parent_id, table, schedule).inspect_err(|e| {
        log_registry_operation(
            "register_workflows",
            Some(parent_id),
            None,
            "failed",
            Some(&e.to_string()),
        );
    })?;

    let mut registry = WorkflowRegistry::new();
    registry.register(built.parent)?;
    for subdag in built.subdags {
        registry.register(subdag)?;
    }

    log_registry_operation(
        "register_workflows",
        Some(parent_id),
        Some(registry.len()),
        "success",
        None,
    );

    Ok(OrchestratorHandle {
        parent_id: parent_id.to_string(),
        registry,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EntityConfig, TableEntry};

    fn one_entity_table() -> EntityConfigTable {
        EntityConfigTable {
            tables: vec![TableEntry {
                key: "t1".to_string(),
                config: EntityConfig {
                    process_group: "era".to_string(),
                    process_name: "x".to_string(),
                    alert_name: "a".to_string(),
                    tag: "t".to_string(),
                    prod_schema: "s".to_string(),
                    prod_table: "p".to_string(),
                    hql_scripts: vec!["/a.sql".to_string()],
                },
            }],
        }
    }

    #[test]
    fn test_register_workflows_registers_parent_and_subdags() {
        let handle =
            register_workflows("load", &one_entity_table(), ScheduleSpec::monthly_day30())
                .unwrap();

        assert_eq!(handle.parent_id(), "load");
        assert_eq!(handle.workflow_count(), 2);
        assert!(handle.get("load.etl_x_subdag").is_some());
        assert_eq!(handle.subdags().len(), 1);
        assert!(handle.parent().schedule.is_some());
        assert!(handle.subdags()[0].schedule.is_none());
    }

    #[test]
    fn test_empty_table_registers_parent_only() {
        let handle = register_workflows(
            "load",
            &EntityConfigTable::default(),
            ScheduleSpec::monthly_day30(),
        )
        .unwrap();
        assert_eq!(handle.workflow_count(), 1);
        assert!(handle.subdags().is_empty());
    }

    #[test]
    fn test_registry_rejects_duplicate_workflow_id() {
        let built = crate::builder::build_parent_workflow(
            "load",
            &one_entity_table(),
            ScheduleSpec::monthly_day30(),
        )
        .unwrap();

        let mut registry = WorkflowRegistry::new();
        registry.register(built.parent.clone()).unwrap();
        let err = registry.register(built.parent).unwrap_err();
        assert_eq!(err, TableflowError::DuplicateWorkflowId("load".to_string()));
    }

    #[test]
    fn test_registration_order_is_preserved() {
        let mut table = one_entity_table();
        table.tables.push(TableEntry {
            key: "t2".to_string(),
            config: EntityConfig {
                process_name: "y".to_string(),
                prod_table: "p2".to_string(),
                ..table.tables[0].config.clone()
            },
        });

        let handle =
            register_workflows("load", &table, ScheduleSpec::monthly_day30()).unwrap();
        let ids: Vec<&str> = handle.subdags().iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["load.etl_x_subdag", "load.etl_y_subdag"]);
    }

    #[test]
    fn test_malformed_table_aborts_registration() {
        let mut table = one_entity_table();
        table.tables[0].config.process_name = String::new();
        let err = register_workflows("load", &table, ScheduleSpec::monthly_day30()).unwrap_err();
        assert!(matches!(err, TableflowError::ConfigurationError(_)));
    }
}
