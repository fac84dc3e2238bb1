#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Tableflow Core
//!
//! Declarative workflow-graph construction for scheduled per-table ETL load
//! chains. This crate declares the *shape* of the work — a scheduled parent
//! workflow fanning out into independent per-entity chains of
//! sub-workflow → synchronize → merge — and hands the resulting definitions
//! to an external orchestrator, which owns all execution semantics
//! (scheduling, retries, parallelism, task-state persistence).
//!
//! ## Architecture
//!
//! The entity configuration table is the sole source of truth. At
//! registration time it is folded, deterministically and in declaration
//! order, into one parent [`graph::WorkflowDefinition`] plus one unscheduled
//! sub-workflow per entity. Anything malformed — a missing field, a
//! duplicate derived identifier, an unparseable cron expression — aborts
//! registration before the orchestrator sees a single task.
//!
//! ## Module Organization
//!
//! - [`config`] - Entity configuration table (YAML-backed, validated)
//! - [`command`] - Templated shell commands with explicit parameter contexts
//! - [`graph`] - Task/edge workflow graphs and DAG validation
//! - [`schedule`] - Cron recurrence, start anchor, and catch-up policy
//! - [`builder`] - Pure fold from configuration table to workflow graphs
//! - [`registry`] - Explicit registration entry point and handle
//! - [`constants`] - Run-state contract shared with the orchestrator
//! - [`error`] - Structured error handling
//! - [`logging`] - Environment-aware structured logging
//!
//! ## Quick Start
//!
//! ```rust
//! use tableflow_core::config::EntityConfigTable;
//! use tableflow_core::registry::register_workflows;
//! use tableflow_core::schedule::ScheduleSpec;
//!
//! # fn example() -> tableflow_core::Result<()> {
//! let table = EntityConfigTable::from_yaml(
//!     r#"
//! tables:
//!   - key: table1
//!     process_group: era
//!     process_name: istock_credit_expiry
//!     alert_name: snowflake_dmart.expiry_by_acquiry
//!     tag: dmart.expiry_by_acquiry
//!     prod_schema: dmart_era_customized_reporting
//!     prod_table: expiry_by_acquiry
//!     hql_scripts: ["/etl/era/expiry_by_acquiry.sql"]
//! "#,
//! )?;
//!
//! let handle = register_workflows(
//!     "dmart_era_customized_reporting_a606_load",
//!     &table,
//!     ScheduleSpec::monthly_day30(),
//! )?;
//!
//! assert_eq!(handle.workflow_count(), 2); // parent + one sub-workflow
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

pub mod builder;
pub mod command;
pub mod config;
pub mod constants;
pub mod error;
pub mod graph;
pub mod logging;
pub mod registry;
pub mod schedule;

pub use builder::{build_parent_workflow, build_subdag, BuiltWorkflows};
pub use command::{CommandTemplate, ParamContext};
pub use config::{EntityConfig, EntityConfigTable, TableEntry};
pub use constants::{ChainStage, RunStatus};
pub use error::{Result, TableflowError};
pub use graph::{Edge, TaskKind, TaskNode, WorkflowDefinition, WorkflowGraph};
pub use registry::{register_workflows, OrchestratorHandle, WorkflowRegistry};
pub use schedule::ScheduleSpec;
