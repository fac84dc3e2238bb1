//! # Templated Shell Commands
//!
//! Each task's unit of work is a shell command template with named
//! placeholders (`{{ key }}`) filled from an explicit per-task parameter
//! context. Rendering happens eagerly at graph-construction time so that a
//! placeholder with no matching parameter fails registration instead of a
//! scheduled run.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{Result, TableflowError};

/// Named parameters for one task's command. No ambient template state: every
/// value a template can reference is in the context that task carries.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParamContext {
    params: HashMap<String, String>,
}

impl ParamContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

/// A shell command template with `{{ key }}` placeholders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandTemplate {
    template: String,
}

impl CommandTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Render the template against a parameter context.
    ///
    /// Every placeholder must resolve; an unknown key or an unclosed
    /// placeholder is a template error.
    pub fn render(&self, context: &ParamContext) -> Result<String> {
        let mut rendered = String::with_capacity(self.template.len());
        let mut rest = self.template.as_str();

        while let Some(start) = rest.find("{{") {
            rendered.push_str(&rest[..start]);
            let after_open = &rest[start + 2..];
            let end = after_open.find("}}").ok_or_else(|| {
                TableflowError::TemplateError(format!(
                    "Unclosed placeholder in command template '{}'",
                    self.template
                ))
            })?;

            let key = after_open[..end].trim();
            let value = context.get(key).ok_or_else(|| {
                TableflowError::TemplateError(format!(
                    "No parameter '{key}' for command template '{}'",
                    self.template
                ))
            })?;
            rendered.push_str(value);

            rest = &after_open[end + 2..];
        }

        rendered.push_str(rest);
        Ok(rendered)
    }
}
