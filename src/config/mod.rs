//! # Entity Configuration Table
//!
//! YAML-driven table configuration: an ordered mapping from logical table key
//! to the processing metadata for one per-table load chain. The table is fully
//! known at deploy time and is the sole externally editable artifact; a
//! malformed entry fails at load or graph-construction time, never at run
//! time, so an invalid graph is never registered with the orchestrator.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::error::{Result, TableflowError};

/// Processing metadata for one logical table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityConfig {
    /// Logical grouping label, free-form
    pub process_group: String,

    /// Unique key used to derive task and sub-workflow identifiers
    pub process_name: String,

    /// Alert routing label carried for downstream alerting systems
    pub alert_name: String,

    /// Metadata tag, not used for execution logic
    pub tag: String,

    /// Destination schema in the target store
    pub prod_schema: String,

    /// Destination table in the target store
    pub prod_table: String,

    /// Transform scripts executed in sequence by the sub-workflow.
    /// The observed configuration always carries exactly one, but the model
    /// supports more.
    pub hql_scripts: Vec<String>,
}

/// One table entry: logical key plus its processing metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableEntry {
    /// Logical table key (e.g. `table1`)
    pub key: String,

    #[serde(flatten)]
    pub config: EntityConfig,
}

/// Ordered collection of table entries. Declaration order in the YAML file is
/// the iteration order, which makes graph construction deterministic.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EntityConfigTable {
    #[serde(default)]
    pub tables: Vec<TableEntry>,
}

// Config files are small; anything larger is a deploy mistake.
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

impl EntityConfigTable {
    /// Parse a table from a YAML string. Missing required fields surface as
    /// configuration errors here, before any graph is built.
    pub fn from_yaml(yaml_str: &str) -> Result<Self> {
        let table: EntityConfigTable = serde_yaml::from_str(yaml_str)?;
        Ok(table)
    }

    /// Parse a table from a YAML file.
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let contents = read_config_file_safely(path)?;
        Self::from_yaml(&contents)
    }

    /// Iterate entries in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &TableEntry> {
        self.tables.iter()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Look up an entry by its logical table key.
    pub fn get(&self, key: &str) -> Option<&EntityConfig> {
        self.tables
            .iter()
            .find(|entry| entry.key == key)
            .map(|entry| &entry.config)
    }

    /// Validate table structure, collecting every problem found.
    ///
    /// Rejects empty derived-identifier sources, empty script lists, and
    /// duplicate `process_name` values (which would collide in the derived
    /// task identifier namespace).
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();
        let mut seen_keys = HashSet::new();
        let mut seen_processes = HashSet::new();

        for entry in &self.tables {
            let context = format!("table entry '{}'", entry.key);

            if entry.key.trim().is_empty() {
                errors.push("table entry with empty key".to_string());
            } else if !seen_keys.insert(entry.key.as_str()) {
                errors.push(format!("duplicate table key '{}'", entry.key));
            }

            if entry.config.process_name.trim().is_empty() {
                errors.push(format!("empty process_name in {context}"));
            } else if !seen_processes.insert(entry.config.process_name.as_str()) {
                errors.push(format!(
                    "duplicate process_name '{}' in {context}",
                    entry.config.process_name
                ));
            }

            if entry.config.hql_scripts.is_empty() {
                errors.push(format!("hql_scripts must not be empty in {context}"));
            }
            if entry.config.hql_scripts.iter().any(|s| s.trim().is_empty()) {
                errors.push(format!("blank script path in {context}"));
            }

            if entry.config.prod_schema.trim().is_empty() {
                errors.push(format!("empty prod_schema in {context}"));
            }
            if entry.config.prod_table.trim().is_empty() {
                errors.push(format!("empty prod_table in {context}"));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(TableflowError::ConfigurationError(errors.join("; ")))
        }
    }
}

/// Read a configuration file with a size cap and regular-file check.
fn read_config_file_safely(path: &Path) -> Result<String> {
    let metadata = std::fs::metadata(path).map_err(|e| {
        TableflowError::ConfigurationError(format!(
            "Failed to read configuration file '{}': {e}",
            path.display()
        ))
    })?;

    if metadata.len() > MAX_CONFIG_FILE_SIZE {
        return Err(TableflowError::ConfigurationError(format!(
            "Configuration file '{}' too large ({} bytes)",
            path.display(),
            metadata.len()
        )));
    }

    if !metadata.is_file() {
        return Err(TableflowError::ConfigurationError(format!(
            "Configuration path '{}' must point to a regular file",
            path.display()
        )));
    }

    std::fs::read_to_string(path).map_err(|e| {
        TableflowError::ConfigurationError(format!(
            "Failed to read configuration file '{}': {e}",
            path.display()
        ))
    })
}
