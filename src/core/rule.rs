//! The canonical rule description.
//!
//! Every macro in `crate::rules` lowers into one [`RuleSpec`], the exact
//! argument set of the external primitive rule constructor. A spec is
//! built once, synchronously, during the macro call, and is immutable
//! from this crate's point of view after it has been handed to the
//! graph; the only sanctioned later mutation is a post-build hook's
//! [`HookOutcome`], which the external executor applies as one atomic
//! graph change.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::command::template::CommandTemplate;
use crate::core::label::RuleRef;
use crate::core::outputs::check_binary_outputs;
use crate::core::source::{Source, Sources};

/// Container execution for test rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerSpec {
    /// Run directly on the host.
    Disabled,

    /// Run in the engine's default container.
    Enabled,

    /// Run in a container with custom settings.
    Custom(BTreeMap<String, String>),
}

impl Default for ContainerSpec {
    fn default() -> Self {
        ContainerSpec::Disabled
    }
}

impl ContainerSpec {
    /// Whether any container execution was requested.
    pub fn is_enabled(&self) -> bool {
        !matches!(self, ContainerSpec::Disabled)
    }
}

/// Called immediately before a rule builds; receives the rule identity.
pub type PreBuildHook = Arc<dyn Fn(RuleRef) + Send + Sync>;

/// Called immediately after a rule builds; receives the rule identity
/// and the captured command output, and may register additional outputs
/// and dependencies on the already-registered rule.
pub type PostBuildHook = Arc<dyn Fn(RuleRef, &str) -> HookOutcome + Send + Sync>;

/// What a post-build hook wants added to its rule.
///
/// The external executor applies this as a single atomic graph mutation
/// visible to not-yet-scheduled dependents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HookOutcome {
    /// Outputs to append to the rule's declared outputs.
    pub extra_outputs: Vec<String>,

    /// Dependencies to append to the rule's dependency list.
    pub extra_deps: Vec<RuleRef>,
}

impl HookOutcome {
    /// An outcome that changes nothing.
    pub fn none() -> Self {
        HookOutcome::default()
    }
}

/// Lifecycle hooks of a rule. Invoked by the external executor, never by
/// this crate.
#[derive(Clone, Default)]
pub struct Hooks {
    pub pre_build: Option<PreBuildHook>,
    pub post_build: Option<PostBuildHook>,
}

impl Hooks {
    /// Check if neither hook is registered.
    pub fn is_empty(&self) -> bool {
        self.pre_build.is_none() && self.post_build.is_none()
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("pre_build", &self.pre_build.is_some())
            .field("post_build", &self.post_build.is_some())
            .finish()
    }
}

/// A fully-resolved rule description, ready for the primitive
/// constructor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSpec {
    /// Rule identity: declaring package plus name.
    pub label: RuleRef,

    /// Sources consumed as files, flat or in named groups.
    #[serde(default)]
    pub sources: Sources,

    /// Runtime data files for test rules.
    #[serde(default)]
    pub data: Vec<Source>,

    /// Declared output file names, relative to the rule's temporary
    /// build directory. Already normalized to the plural form.
    #[serde(default)]
    pub outputs: Vec<String>,

    /// The build command template.
    pub command: CommandTemplate,

    /// The test command template, for test rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_command: Option<CommandTemplate>,

    /// Rules whose outputs must exist before this rule's command runs.
    #[serde(default)]
    pub dependencies: Vec<RuleRef>,

    /// Dependencies that become visible to rules depending on this one.
    #[serde(default)]
    pub exported_deps: Vec<RuleRef>,

    /// Rules used as executables but not copied into the build sandbox.
    #[serde(default)]
    pub tools: Vec<RuleRef>,

    /// Visibility declaration, as label patterns.
    #[serde(default)]
    pub visibility: Vec<String>,

    /// Arbitrary labels attached to the rule.
    #[serde(default)]
    pub labels: Vec<String>,

    /// Declared output hashes. Carried through verbatim; verification
    /// happens after the externally-owned build step.
    #[serde(default)]
    pub hashes: Vec<String>,

    /// Description shown to the user while the rule builds.
    pub building_description: String,

    /// Produces a runnable artifact. Binary rules declare at most one
    /// output.
    #[serde(default)]
    pub binary: bool,

    /// Produces a pass/fail verdict.
    #[serde(default)]
    pub test: bool,

    /// The test is judged on its exit code only and writes no results
    /// file.
    #[serde(default)]
    pub no_test_output: bool,

    /// All transitive dependencies are made available when this rule
    /// builds, not just the immediate ones.
    #[serde(default)]
    pub needs_transitive_deps: bool,

    /// Visibility boundary: rules depending on this one see its outputs
    /// but not its dependencies' outputs.
    #[serde(default)]
    pub output_is_complete: bool,

    /// Don't store this rule's outputs in the artifact cache.
    #[serde(default)]
    pub skip_cache: bool,

    /// Only usable by test rules.
    #[serde(default)]
    pub test_only: bool,

    /// Container execution for test rules.
    #[serde(default)]
    pub container: ContainerSpec,

    /// Maximum build time before the executor kills the command.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_timeout: Option<Duration>,

    /// Maximum test time before the executor kills the command.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_timeout: Option<Duration>,

    /// Automatic retry count for flaky tests. Zero means not flaky.
    #[serde(default)]
    pub flaky: u32,

    /// Capability tags this rule consumes from its dependencies.
    #[serde(default)]
    pub requires: Vec<String>,

    /// Capability tag to dependency mapping this rule exposes.
    #[serde(default)]
    pub provides: BTreeMap<String, RuleRef>,

    /// Lifecycle hooks; invoked by the external executor.
    #[serde(skip)]
    pub hooks: Hooks,
}

impl RuleSpec {
    /// Create a new rule spec with the given identity and command.
    pub fn new(label: RuleRef, command: CommandTemplate) -> Self {
        RuleSpec {
            label,
            sources: Sources::default(),
            data: Vec::new(),
            outputs: Vec::new(),
            command,
            test_command: None,
            dependencies: Vec::new(),
            exported_deps: Vec::new(),
            tools: Vec::new(),
            visibility: Vec::new(),
            labels: Vec::new(),
            hashes: Vec::new(),
            building_description: "Building...".to_string(),
            binary: false,
            test: false,
            no_test_output: false,
            needs_transitive_deps: false,
            output_is_complete: false,
            skip_cache: false,
            test_only: false,
            container: ContainerSpec::Disabled,
            build_timeout: None,
            test_timeout: None,
            flaky: 0,
            requires: Vec::new(),
            provides: BTreeMap::new(),
            hooks: Hooks::default(),
        }
    }

    /// Set the sources.
    pub fn with_sources(mut self, sources: impl Into<Sources>) -> Self {
        self.sources = sources.into();
        self
    }

    /// Set the declared outputs.
    pub fn with_outputs(mut self, outputs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.outputs = outputs.into_iter().map(|o| o.into()).collect();
        self
    }

    /// Set the dependency list.
    pub fn with_dependencies(mut self, deps: impl IntoIterator<Item = RuleRef>) -> Self {
        self.dependencies = deps.into_iter().collect();
        self
    }

    /// Set the tool list.
    pub fn with_tools(mut self, tools: impl IntoIterator<Item = RuleRef>) -> Self {
        self.tools = tools.into_iter().collect();
        self
    }

    /// Set the visibility declaration.
    pub fn with_visibility(
        mut self,
        visibility: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.visibility = visibility.into_iter().map(|v| v.into()).collect();
        self
    }

    /// Append labels.
    pub fn with_labels(mut self, labels: impl IntoIterator<Item = impl Into<String>>) -> Self {
        for label in labels {
            let label = label.into();
            if !self.labels.contains(&label) {
                self.labels.push(label);
            }
        }
        self
    }

    /// Set the declared hashes.
    pub fn with_hashes(mut self, hashes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.hashes = hashes.into_iter().map(|h| h.into()).collect();
        self
    }

    /// Set the building description.
    pub fn with_building_description(mut self, description: impl Into<String>) -> Self {
        self.building_description = description.into();
        self
    }

    /// Set the required capability tags.
    ///
    /// Each tag is also recorded as a label on the rule, so capability
    /// intent propagates through rules that only aggregate others.
    pub fn with_requires(mut self, requires: impl IntoIterator<Item = impl Into<String>>) -> Self {
        for tag in requires {
            let tag = tag.into();
            if !self.labels.contains(&tag) {
                self.labels.push(tag.clone());
            }
            self.requires.push(tag);
        }
        self
    }

    /// Set the provided capability mapping.
    pub fn with_provides(mut self, provides: BTreeMap<String, RuleRef>) -> Self {
        self.provides = provides;
        self
    }

    /// Set the lifecycle hooks.
    pub fn with_hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Check invariants that span multiple fields.
    pub fn validate(&self) -> Result<()> {
        check_binary_outputs(self.label.name(), self.binary, &self.outputs)?;
        Ok(())
    }

    /// Whether this rule can run without doing any work.
    ///
    /// True for pure collector rules whose command is the no-op.
    pub fn is_passthrough(&self) -> bool {
        self.command.is_noop() && self.outputs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str) -> RuleSpec {
        RuleSpec::new(RuleRef::new("pkg", name), CommandTemplate::noop())
    }

    #[test]
    fn test_requires_become_labels() {
        let rule = spec("r").with_labels(["py"]).with_requires(["py", "go"]);
        assert_eq!(rule.requires, vec!["py", "go"]);
        // "py" was already a label; it isn't duplicated.
        assert_eq!(rule.labels, vec!["py", "go"]);
    }

    #[test]
    fn test_binary_validation() {
        let ok = spec("r").with_outputs(["one"]);
        let mut bad = spec("r").with_outputs(["one", "two"]);
        bad.binary = true;
        assert!(ok.validate().is_ok());
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_passthrough() {
        assert!(spec("collector").is_passthrough());
        assert!(!spec("r").with_outputs(["f"]).is_passthrough());
    }

    #[test]
    fn test_hooks_debug_shows_presence() {
        let mut hooks = Hooks::default();
        assert!(hooks.is_empty());
        hooks.pre_build = Some(Arc::new(|_| {}));
        assert!(!hooks.is_empty());
        let debug = format!("{:?}", hooks);
        assert!(debug.contains("pre_build: true"));
        assert!(debug.contains("post_build: false"));
    }

    #[test]
    fn test_hook_outcome() {
        let hook: PostBuildHook = Arc::new(|rule, output| {
            assert_eq!(rule.name(), "r");
            HookOutcome {
                extra_outputs: output.lines().map(str::to_string).collect(),
                extra_deps: Vec::new(),
            }
        });
        let outcome = hook(RuleRef::new("pkg", "r"), "gen1.go\ngen2.go");
        assert_eq!(outcome.extra_outputs, vec!["gen1.go", "gen2.go"]);
        assert_eq!(HookOutcome::none(), HookOutcome::default());
    }
}
