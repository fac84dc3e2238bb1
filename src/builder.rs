//! # Workflow Builders
//!
//! Pure construction of the parent workflow and its per-entity sub-workflows
//! from an [`EntityConfigTable`]. Construction is a deterministic fold over
//! the table's declaration order: the same table always produces the same
//! node identifiers and edge sets, so redeploys re-register an identical
//! graph and never orphan task history.
//!
//! Per entity the parent gains a three-node chain,
//!
//! ```text
//! etl_{process_name}_subdag -> gsync_{process_name} -> gmerge_{process_name}
//! ```
//!
//! with no edges between chains of different entities; sibling chains are
//! free to run concurrently under whatever limits the orchestrator enforces.

use std::collections::HashSet;
use tracing::debug;

use crate::command::{CommandTemplate, ParamContext};
use crate::config::{EntityConfig, EntityConfigTable};
use crate::constants::{task_prefixes, DEFAULT_OWNER};
use crate::error::{Result, TableflowError};
use crate::graph::{Edge, TaskKind, TaskNode, WorkflowDefinition, WorkflowGraph};
use crate::schedule::ScheduleSpec;

// Placeholder commands standing in for the real transform/sync/merge logic;
// each deployment supplies real semantics behind the same parameter contract.
const TRANSFORM_COMMAND: &str = "echo \"Running ETL process for {{ process_name }}\"";
const SYNC_COMMAND: &str = "echo \"Running gsync step for {{ process_name }}\"";
const MERGE_COMMAND: &str = "echo \"Running gmerge step for {{ process_name }}\"";

/// Task identifier for an entity's sub-workflow invocation node.
pub fn subdag_task_id(process_name: &str) -> String {
    format!(
        "{}{process_name}{}",
        task_prefixes::SUBDAG,
        task_prefixes::SUBDAG_SUFFIX
    )
}

/// Task identifier for an entity's synchronize step.
pub fn sync_task_id(process_name: &str) -> String {
    format!("{}{process_name}", task_prefixes::SYNC)
}

/// Task identifier for an entity's merge step.
pub fn merge_task_id(process_name: &str) -> String {
    format!("{}{process_name}", task_prefixes::MERGE)
}

/// Child workflow identifier: the parent's namespace plus the child id.
pub fn subdag_workflow_id(parent_id: &str, child_id: &str) -> String {
    format!("{parent_id}.{child_id}")
}

/// Everything one registration produces: the scheduled parent plus one
/// unscheduled sub-workflow per entity, in table order.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltWorkflows {
    pub parent: WorkflowDefinition,
    pub subdags: Vec<WorkflowDefinition>,
}

/// Build the self-contained sub-workflow for one entity.
///
/// The sub-workflow holds a single task that runs every entry of
/// `hql_scripts` in order against the entity's parameters. It carries no
/// schedule of its own and is only ever triggered by the parent chain, but
/// its derived identifier (`{parent}.{child}`) makes it independently
/// inspectable in the orchestrator.
pub fn build_subdag(parent_id: &str, config: &EntityConfig) -> Result<WorkflowDefinition> {
    let child_id = subdag_task_id(&config.process_name);
    let workflow_id = subdag_workflow_id(parent_id, &child_id);

    let params = ParamContext::new()
        .with("process_name", &config.process_name)
        .with("prod_schema", &config.prod_schema)
        .with("prod_table", &config.prod_table);

    let task = TaskNode {
        id: "run_etl".to_string(),
        kind: TaskKind::Transform {
            scripts: config.hql_scripts.clone(),
        },
        command: CommandTemplate::new(TRANSFORM_COMMAND),
        params,
    };

    let definition = WorkflowDefinition {
        id: workflow_id,
        description: format!("ETL workflow for {}", config.process_name),
        owner: DEFAULT_OWNER.to_string(),
        schedule: None,
        graph: WorkflowGraph {
            nodes: vec![task],
            edges: vec![],
        },
    };

    definition.validate()?;
    Ok(definition)
}

/// Build the scheduled parent workflow and all per-entity sub-workflows.
///
/// A pure fold over the table: no side effects beyond the returned
/// definitions. Fails closed on any configuration problem (missing fields,
/// duplicate `process_name`, colliding derived task identifiers) before
/// anything could reach the orchestrator. An empty table yields a valid
/// parent with zero chains.
pub fn build_parent_workflow(
    parent_id: &str,
    table: &EntityConfigTable,
    schedule: ScheduleSpec,
) -> Result<BuiltWorkflows> {
    table.validate()?;
    schedule.validate()?;

    let mut graph = WorkflowGraph::new();
    let mut subdags = Vec::with_capacity(table.len());
    let mut task_ids: HashSet<String> = HashSet::new();

    for entry in table.iter() {
        let config = &entry.config;
        let subdag = build_subdag(parent_id, config)?;

        let subdag_id = subdag_task_id(&config.process_name);
        let sync_id = sync_task_id(&config.process_name);
        let merge_id = merge_task_id(&config.process_name);

        for id in [&subdag_id, &sync_id, &merge_id] {
            if !task_ids.insert(id.clone()) {
                return Err(TableflowError::DuplicateTaskId {
                    task_id: id.clone(),
                    process_name: config.process_name.clone(),
                });
            }
        }

        let step_params = ParamContext::new().with("process_name", &config.process_name);

        graph.nodes.push(TaskNode {
            id: subdag_id.clone(),
            kind: TaskKind::SubWorkflow {
                workflow_id: subdag.id.clone(),
            },
            // The orchestrator interprets the kind; no shell command here
            command: CommandTemplate::new(""),
            params: ParamContext::new(),
        });
        graph.nodes.push(TaskNode {
            id: sync_id.clone(),
            kind: TaskKind::Sync,
            command: CommandTemplate::new(SYNC_COMMAND),
            params: step_params.clone(),
        });
        graph.nodes.push(TaskNode {
            id: merge_id.clone(),
            kind: TaskKind::Merge,
            command: CommandTemplate::new(MERGE_COMMAND),
            params: step_params,
        });

        graph.edges.push(Edge::new(&subdag_id, &sync_id));
        graph.edges.push(Edge::new(&sync_id, &merge_id));

        debug!(
            parent_id = parent_id,
            process_name = %config.process_name,
            subdag = %subdag.id,
            "Attached entity load chain"
        );

        subdags.push(subdag);
    }

    let parent = WorkflowDefinition {
        id: parent_id.to_string(),
        description: format!(
            "Scheduled load workflow '{parent_id}' ({} table chains)",
            table.len()
        ),
        owner: DEFAULT_OWNER.to_string(),
        schedule: Some(schedule),
        graph,
    };

    parent.validate()?;
    Ok(BuiltWorkflows { parent, subdags })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TableEntry;
    use crate::graph::TaskKind;

    fn entity(process_name: &str, scripts: Vec<&str>) -> EntityConfig {
        EntityConfig {
            process_group: "era".to_string(),
            process_name: process_name.to_string(),
            alert_name: format!("alerts.{process_name}"),
            tag: format!("tag.{process_name}"),
            prod_schema: "dmart_era_customized_reporting".to_string(),
            prod_table: process_name.to_string(),
            hql_scripts: scripts.into_iter().map(String::from).collect(),
        }
    }

    fn table_of(names: &[&str]) -> EntityConfigTable {
        EntityConfigTable {
            tables: names
                .iter()
                .enumerate()
                .map(|(i, name)| TableEntry {
                    key: format!("table{}", i + 1),
                    config: entity(name, vec!["/a.sql"]),
                })
                .collect(),
        }
    }

    #[test]
    fn test_subdag_identifier_derivation() {
        assert_eq!(subdag_task_id("x"), "etl_x_subdag");
        assert_eq!(sync_task_id("x"), "gsync_x");
        assert_eq!(merge_task_id("x"), "gmerge_x");
        assert_eq!(
            subdag_workflow_id("parent_load", "etl_x_subdag"),
            "parent_load.etl_x_subdag"
        );
    }

    #[test]
    fn test_build_subdag_single_task_runs_all_scripts() {
        let config = entity("x", vec!["/a.sql", "/b.sql"]);
        let subdag = build_subdag("parent_load", &config).unwrap();

        assert_eq!(subdag.id, "parent_load.etl_x_subdag");
        assert!(subdag.schedule.is_none());
        assert_eq!(subdag.graph.nodes.len(), 1);

        let task = &subdag.graph.nodes[0];
        assert_eq!(task.id, "run_etl");
        match &task.kind {
            TaskKind::Transform { scripts } => {
                assert_eq!(scripts, &vec!["/a.sql".to_string(), "/b.sql".to_string()]);
            }
            other => panic!("expected transform task, got {other:?}"),
        }
        assert_eq!(
            task.rendered_command().unwrap(),
            "echo \"Running ETL process for x\""
        );
    }

    #[test]
    fn test_subdag_params_carry_entity_substitutions() {
        let config = entity("x", vec!["/a.sql"]);
        let subdag = build_subdag("p", &config).unwrap();
        let params = &subdag.graph.nodes[0].params;
        assert_eq!(params.get("process_name"), Some("x"));
        assert_eq!(
            params.get("prod_schema"),
            Some("dmart_era_customized_reporting")
        );
        assert_eq!(params.get("prod_table"), Some("x"));
    }

    #[test]
    fn test_parent_has_three_nodes_and_two_edges_per_entity() {
        let table = table_of(&["a", "b", "c"]);
        let built =
            build_parent_workflow("load", &table, ScheduleSpec::monthly_day30()).unwrap();

        assert_eq!(built.parent.graph.nodes.len(), 9);
        assert_eq!(built.parent.graph.edges.len(), 6);
        assert_eq!(built.subdags.len(), 3);
    }

    #[test]
    fn test_chain_ordering_per_entity() {
        let table = table_of(&["x"]);
        let built =
            build_parent_workflow("load", &table, ScheduleSpec::monthly_day30()).unwrap();
        let graph = &built.parent.graph;

        assert_eq!(
            graph.node_ids(),
            vec!["etl_x_subdag", "gsync_x", "gmerge_x"]
        );
        assert!(graph.has_edge("etl_x_subdag", "gsync_x"));
        assert!(graph.has_edge("gsync_x", "gmerge_x"));
        assert!(!graph.has_edge("etl_x_subdag", "gmerge_x"));
    }

    #[test]
    fn test_no_cross_entity_edges() {
        let table = table_of(&["a", "b"]);
        let built =
            build_parent_workflow("load", &table, ScheduleSpec::monthly_day30()).unwrap();
        let graph = &built.parent.graph;

        let downstream_a = graph.downstream_of("etl_a_subdag");
        assert!(downstream_a.contains("gsync_a"));
        assert!(downstream_a.contains("gmerge_a"));
        assert!(!downstream_a.iter().any(|id| id.ends_with("_b")));
    }

    #[test]
    fn test_subworkflow_node_references_child_workflow() {
        let table = table_of(&["x"]);
        let built =
            build_parent_workflow("load", &table, ScheduleSpec::monthly_day30()).unwrap();
        let node = built.parent.graph.node("etl_x_subdag").unwrap();
        match &node.kind {
            TaskKind::SubWorkflow { workflow_id } => {
                assert_eq!(workflow_id, "load.etl_x_subdag");
            }
            other => panic!("expected sub-workflow node, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_process_name_fails_construction() {
        let table = table_of(&["x", "x"]);
        let err =
            build_parent_workflow("load", &table, ScheduleSpec::monthly_day30()).unwrap_err();
        assert!(err.to_string().contains("duplicate process_name 'x'"));
    }

    #[test]
    fn test_empty_table_builds_parent_with_zero_chains() {
        let table = EntityConfigTable::default();
        let built =
            build_parent_workflow("load", &table, ScheduleSpec::monthly_day30()).unwrap();
        assert!(built.parent.graph.nodes.is_empty());
        assert!(built.parent.graph.edges.is_empty());
        assert!(built.subdags.is_empty());
        assert!(built.parent.schedule.is_some());
    }

    #[test]
    fn test_construction_is_idempotent() {
        let table = table_of(&["a", "b", "c"]);
        let first =
            build_parent_workflow("load", &table, ScheduleSpec::monthly_day30()).unwrap();
        let second =
            build_parent_workflow("load", &table, ScheduleSpec::monthly_day30()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_invalid_schedule_fails_construction() {
        let table = table_of(&["x"]);
        let err = build_parent_workflow("load", &table, ScheduleSpec::new("bad", 2, false))
            .unwrap_err();
        assert!(matches!(err, TableflowError::ScheduleError(_)));
    }

    #[test]
    fn test_sync_and_merge_commands_render_with_process_name() {
        let table = table_of(&["x"]);
        let built =
            build_parent_workflow("load", &table, ScheduleSpec::monthly_day30()).unwrap();
        let graph = &built.parent.graph;

        assert_eq!(
            graph.node("gsync_x").unwrap().rendered_command().unwrap(),
            "echo \"Running gsync step for x\""
        );
        assert_eq!(
            graph.node("gmerge_x").unwrap().rendered_command().unwrap(),
            "echo \"Running gmerge step for x\""
        );
    }
}
