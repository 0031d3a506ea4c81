//! Slipway - rule definition and capability matching for a build graph
//!
//! This crate is the layer between user-facing rule macros and the
//! build engine's primitive rule constructor. It lowers every macro
//! into one canonical rule description, resolving command templating
//! (deferred to build time), capability-based dependency substitution
//! (requires/provides), and output normalization along the way. It
//! never builds anything itself.

pub mod capability;
pub mod command;
pub mod core;
pub mod rules;

/// Test utilities and mocks for unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides in-memory implementations of the graph
/// sink and the executor-side path lookup.
#[cfg(test)]
pub mod test_support;

pub use crate::core::{
    BuildConfig, ContainerSpec, DefineContext, DefineError, HookOutcome, Hooks, RuleGraph,
    RuleRef, RuleSpec, Source, Sources,
};

pub use crate::capability::ProvideIndex;
pub use crate::command::{CommandTemplate, ExpandError, Placeholder, RuleLookup};
