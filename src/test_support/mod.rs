//! Test utilities and mocks for unit tests.
//!
//! This module provides in-memory implementations of the external
//! collaborators: the graph sink the macros deliver rules to, and the
//! path lookup the executor would supply at expansion time.

use std::collections::{HashMap, HashSet};

use crate::command::template::{ExpandError, RuleLookup};
use crate::core::context::RuleGraph;
use crate::core::label::RuleRef;
use crate::core::rule::RuleSpec;

/// An in-memory rule graph recording every spec handed to it.
#[derive(Debug, Default)]
pub struct MemoryGraph {
    rules: Vec<RuleSpec>,
}

impl MemoryGraph {
    /// Look up a recorded rule by label.
    pub fn rule(&self, label: RuleRef) -> Option<&RuleSpec> {
        self.rules.iter().find(|rule| rule.label == label)
    }

    /// All recorded rules, in definition order.
    pub fn rules(&self) -> &[RuleSpec] {
        &self.rules
    }

    /// Whether no rules were defined.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl RuleGraph for MemoryGraph {
    fn add_rule(&mut self, rule: RuleSpec) {
        self.rules.push(rule);
    }
}

/// A fixed path lookup standing in for the external executor.
#[derive(Debug, Default)]
pub struct StaticLookup {
    outputs: HashMap<RuleRef, Vec<String>>,
    final_outputs: HashMap<RuleRef, Vec<String>>,
    binaries: HashSet<RuleRef>,
    file_root: String,
}

impl StaticLookup {
    /// Register a rule's sandbox-relative output paths.
    pub fn add_outputs(
        &mut self,
        rule: RuleRef,
        outputs: impl IntoIterator<Item = impl Into<String>>,
    ) {
        self.outputs
            .insert(rule, outputs.into_iter().map(|o| o.into()).collect());
    }

    /// Register a rule's final installed output paths.
    pub fn add_final_outputs(
        &mut self,
        rule: RuleRef,
        outputs: impl IntoIterator<Item = impl Into<String>>,
    ) {
        self.final_outputs
            .insert(rule, outputs.into_iter().map(|o| o.into()).collect());
    }

    /// Mark a rule as binary.
    pub fn set_binary(&mut self, rule: RuleRef) {
        self.binaries.insert(rule);
    }

    /// Prefix file sources with a package directory.
    pub fn set_file_root(&mut self, root: impl Into<String>) {
        self.file_root = root.into();
    }
}

impl RuleLookup for StaticLookup {
    fn output_paths(&self, rule: RuleRef) -> Result<Vec<String>, ExpandError> {
        self.outputs
            .get(&rule)
            .cloned()
            .ok_or(ExpandError::UnknownRule { rule })
    }

    fn final_output_paths(&self, rule: RuleRef) -> Result<Vec<String>, ExpandError> {
        match self.final_outputs.get(&rule) {
            Some(outputs) => Ok(outputs.clone()),
            None => self.output_paths(rule),
        }
    }

    fn is_binary(&self, rule: RuleRef) -> bool {
        self.binaries.contains(&rule)
    }

    fn tool_path(&self, rule: RuleRef) -> Result<String, ExpandError> {
        let outputs = self.output_paths(rule)?;
        match outputs.as_slice() {
            [tool] => Ok(tool.clone()),
            _ => Err(ExpandError::SingleOutputRequired {
                rule,
                count: outputs.len(),
            }),
        }
    }

    fn file_path(&self, file: &str) -> String {
        if self.file_root.is_empty() {
            file.to_string()
        } else {
            format!("{}/{}", self.file_root, file)
        }
    }
}
