//! The generic command rule.
//!
//! The primary vehicle for arbitrary build steps: a user-supplied
//! command passed through the placeholder parser, with everything else
//! normalized and delegated to the primitive constructor.

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::Result;

use crate::command::CommandTemplate;
use crate::core::{
    check_binary_outputs, normalize_outputs, DefineContext, Hooks, PostBuildHook, PreBuildHook,
    RuleRef, RuleSpec, Sources,
};

/// Arguments to [`genrule`].
#[derive(Clone)]
pub struct GenruleArgs {
    /// Rule name.
    pub name: String,

    /// Command to run; subject to placeholder replacement and the
    /// build environment variables.
    pub cmd: String,

    /// Sources, flat or named-grouped.
    pub srcs: Sources,

    /// Single output name. Discouraged in favour of `outs`.
    pub out: Option<String>,

    /// Output names.
    pub outs: Option<Vec<String>>,

    /// Dependencies.
    pub deps: Vec<RuleRef>,

    /// Tools used to build; not copied into the build sandbox.
    pub tools: Vec<RuleRef>,

    /// Visibility declaration.
    pub visibility: Vec<String>,

    /// Description shown while building.
    pub building_description: Option<String>,

    /// Output hashes to verify after building.
    pub hashes: Vec<String>,

    /// Maximum build time.
    pub timeout: Option<Duration>,

    /// True to mark a rule that produces a runnable output.
    pub binary: bool,

    /// Make all transitive dependencies available to the build.
    pub needs_transitive_deps: bool,

    /// Block downward searches of transitive dependencies past this
    /// rule.
    pub output_is_complete: bool,

    /// Only usable by test rules.
    pub test_only: bool,

    /// Capability tags consumed from dependencies.
    pub requires: Vec<String>,

    /// Capability tag to dependency mapping exposed to dependents.
    pub provides: BTreeMap<String, RuleRef>,

    /// Runs immediately before the rule builds.
    pub pre_build: Option<PreBuildHook>,

    /// Runs immediately after the rule builds; may register further
    /// outputs and dependencies.
    pub post_build: Option<PostBuildHook>,
}

impl Default for GenruleArgs {
    fn default() -> Self {
        GenruleArgs {
            name: String::new(),
            cmd: String::new(),
            srcs: Sources::default(),
            out: None,
            outs: None,
            deps: Vec::new(),
            tools: Vec::new(),
            visibility: Vec::new(),
            building_description: None,
            hashes: Vec::new(),
            timeout: None,
            binary: false,
            needs_transitive_deps: false,
            output_is_complete: true,
            test_only: false,
            requires: Vec::new(),
            provides: BTreeMap::new(),
            pre_build: None,
            post_build: None,
        }
    }
}

/// A general build rule running a user-specified command.
pub fn genrule(ctx: &mut DefineContext, args: GenruleArgs) -> Result<RuleRef> {
    let outputs = normalize_outputs(&args.name, args.out, args.outs)?;
    check_binary_outputs(&args.name, args.binary, &outputs)?;

    let command = CommandTemplate::parse(&args.cmd, ctx.package_path());
    let mut spec = RuleSpec::new(ctx.label(&args.name), command)
        .with_sources(args.srcs)
        .with_outputs(outputs)
        .with_dependencies(args.deps)
        .with_tools(args.tools)
        .with_visibility(args.visibility)
        .with_hashes(args.hashes)
        .with_requires(args.requires)
        .with_provides(args.provides)
        .with_hooks(Hooks {
            pre_build: args.pre_build,
            post_build: args.post_build,
        });
    if let Some(description) = args.building_description {
        spec = spec.with_building_description(description);
    }
    spec.binary = args.binary;
    spec.needs_transitive_deps = args.needs_transitive_deps;
    spec.output_is_complete = args.output_is_complete;
    spec.test_only = args.test_only;
    spec.build_timeout = args.timeout;

    Ok(ctx.add_rule(spec))
}
