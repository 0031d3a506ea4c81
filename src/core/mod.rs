//! Core data structures for the rule definition layer.
//!
//! This module contains the foundational types used throughout the
//! crate:
//! - Interned rule references
//! - Sources (files and rule outputs, flat or named-grouped)
//! - The canonical rule spec handed to the primitive constructor
//! - Output normalization and definition-time errors
//! - The boundaries to the host engine (graph sink, config, context)

pub mod context;
pub mod error;
pub mod label;
pub mod outputs;
pub mod rule;
pub mod source;

pub use context::{BuildConfig, DefineContext, RuleGraph};
pub use error::DefineError;
pub use label::RuleRef;
pub use outputs::{check_binary_outputs, normalize_outputs};
pub use rule::{ContainerSpec, HookOutcome, Hooks, PostBuildHook, PreBuildHook, RuleSpec};
pub use source::{Source, Sources};
