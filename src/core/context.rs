//! Definition context - the boundaries to the host build engine.
//!
//! This crate never builds anything itself. The three collaborators it
//! needs are modeled here: the primitive rule constructor
//! ([`RuleGraph`]), the configuration object ([`BuildConfig`]), and the
//! package-path resolver (carried by [`DefineContext`]).

use serde::{Deserialize, Serialize};

use crate::core::error::DefineError;
use crate::core::label::RuleRef;
use crate::core::rule::RuleSpec;
use crate::core::source::Source;

/// Read-only environment values supplied by the host configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Architecture tag, e.g. "x86_64". Used to name platform-qualified
    /// package outputs.
    pub arch: String,

    /// Operating system tag, e.g. "linux".
    pub os: String,

    /// Restricted search path passed to build commands.
    pub path: Vec<String>,
}

impl BuildConfig {
    /// Detect the current host platform.
    pub fn host() -> Self {
        BuildConfig {
            arch: std::env::consts::ARCH.to_string(),
            os: std::env::consts::OS.to_string(),
            path: vec!["/usr/local/bin".to_string(), "/usr/bin".to_string(), "/bin".to_string()],
        }
    }

    /// Set the architecture tag.
    pub fn with_arch(mut self, arch: impl Into<String>) -> Self {
        self.arch = arch.into();
        self
    }

    /// Set the search path.
    pub fn with_path(mut self, path: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.path = path.into_iter().map(|p| p.into()).collect();
        self
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig::host()
    }
}

/// The primitive rule constructor: accepts a fully-resolved rule
/// description and inserts a node into the global dependency graph.
///
/// Owned by the external build engine; this crate only produces the
/// argument.
pub trait RuleGraph {
    /// Insert a rule into the graph.
    fn add_rule(&mut self, rule: RuleSpec);
}

/// Per-package definition context handed to the rule macros.
///
/// Carries the graph sink, the configuration, and the declaring
/// package's path. The root package has the empty path.
pub struct DefineContext<'a> {
    graph: &'a mut dyn RuleGraph,
    config: &'a BuildConfig,
    package: String,
}

impl<'a> DefineContext<'a> {
    /// Create a context for definitions in the given package.
    pub fn new(
        graph: &'a mut dyn RuleGraph,
        config: &'a BuildConfig,
        package: impl Into<String>,
    ) -> Self {
        DefineContext {
            graph,
            config,
            package: package.into(),
        }
    }

    /// The current declaring package's path.
    pub fn package_path(&self) -> &str {
        &self.package
    }

    /// Whether the current package is the repository root.
    pub fn is_root_package(&self) -> bool {
        self.package.is_empty()
    }

    /// The host configuration.
    pub fn config(&self) -> &BuildConfig {
        self.config
    }

    /// The configured architecture tag.
    pub fn arch(&self) -> &str {
        &self.config.arch
    }

    /// A reference to a rule named in the current package.
    pub fn label(&self, name: &str) -> RuleRef {
        RuleRef::new(self.package.as_str(), name)
    }

    /// Parse a source string relative to the current package.
    pub fn source(&self, s: &str) -> Result<Source, DefineError> {
        Source::parse(s, &self.package)
    }

    /// Hand a finished spec to the primitive constructor.
    pub fn add_rule(&mut self, rule: RuleSpec) -> RuleRef {
        let label = rule.label;
        tracing::debug!("defined rule {}", label);
        self.graph.add_rule(rule);
        label
    }
}
