//! Command templating with deferred path resolution.
//!
//! Placeholders in a rule's command refer to dependency outputs that
//! don't exist yet when the graph is constructed. Templates therefore
//! store typed markers ([`Placeholder`]) and are expanded by the
//! external executor, against a [`RuleLookup`], at build time. The
//! [`env`] module declares the environment-variable channel.

pub mod env;
pub mod template;

pub use env::{environment, EnvScope};
pub use template::{CommandTemplate, ExpandError, Placeholder, RuleLookup, Segment};
