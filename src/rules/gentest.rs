//! The generic test rule.
//!
//! Like [`genrule`](crate::rules::genrule) but always binary and always
//! a test. The command must return zero on success and nonzero on
//! failure; results are written to the test output file unless
//! `no_test_output` is set.

use std::time::Duration;

use anyhow::Result;

use crate::command::CommandTemplate;
use crate::core::{
    check_binary_outputs, ContainerSpec, DefineContext, RuleRef, RuleSpec, Source, Sources,
};

/// Arguments to [`gentest`].
#[derive(Clone)]
pub struct GentestArgs {
    /// Rule name.
    pub name: String,

    /// Command to run for the test.
    pub test_cmd: String,

    /// Command to run to build the test. Defaults to doing nothing,
    /// for artifacts that need no separate build step.
    pub cmd: Option<String>,

    /// Labels to apply to this test.
    pub labels: Vec<String>,

    /// Sources.
    pub srcs: Sources,

    /// Output names.
    pub outs: Vec<String>,

    /// Dependencies.
    pub deps: Vec<RuleRef>,

    /// Runtime data files for the test.
    pub data: Vec<Source>,

    /// Tools used to build; not copied into the build sandbox.
    pub tools: Vec<RuleRef>,

    /// Visibility declaration.
    pub visibility: Vec<String>,

    /// Maximum test time before the run is killed.
    pub timeout: Option<Duration>,

    /// Make all transitive dependencies available to the build.
    pub needs_transitive_deps: bool,

    /// Automatic retry count for flaky tests. Zero means not flaky.
    pub flaky: u32,

    /// The test writes no results file and is judged on its exit code
    /// only.
    pub no_test_output: bool,

    /// Block downward searches of transitive dependencies past this
    /// rule.
    pub output_is_complete: bool,

    /// Capability tags consumed from dependencies.
    pub requires: Vec<String>,

    /// Container execution for the test run.
    pub container: ContainerSpec,
}

impl Default for GentestArgs {
    fn default() -> Self {
        GentestArgs {
            name: String::new(),
            test_cmd: String::new(),
            cmd: None,
            labels: Vec::new(),
            srcs: Sources::default(),
            outs: Vec::new(),
            deps: Vec::new(),
            data: Vec::new(),
            tools: Vec::new(),
            visibility: Vec::new(),
            timeout: None,
            needs_transitive_deps: false,
            flaky: 0,
            no_test_output: false,
            output_is_complete: true,
            requires: Vec::new(),
            container: ContainerSpec::Disabled,
        }
    }
}

/// A rule which creates a test with an arbitrary command.
pub fn gentest(ctx: &mut DefineContext, args: GentestArgs) -> Result<RuleRef> {
    check_binary_outputs(&args.name, true, &args.outs)?;

    let command = match &args.cmd {
        Some(cmd) => CommandTemplate::parse(cmd, ctx.package_path()),
        None => CommandTemplate::noop(),
    };
    let test_command = CommandTemplate::parse(&args.test_cmd, ctx.package_path());

    let mut spec = RuleSpec::new(ctx.label(&args.name), command)
        .with_sources(args.srcs)
        .with_outputs(args.outs)
        .with_dependencies(args.deps)
        .with_tools(args.tools)
        .with_visibility(args.visibility)
        .with_labels(args.labels)
        .with_requires(args.requires);
    spec.test_command = Some(test_command);
    spec.data = args.data;
    spec.binary = true;
    spec.test = true;
    spec.no_test_output = args.no_test_output;
    spec.needs_transitive_deps = args.needs_transitive_deps;
    spec.output_is_complete = args.output_is_complete;
    spec.test_timeout = args.timeout;
    spec.flaky = args.flaky;
    spec.container = args.container;

    Ok(ctx.add_rule(spec))
}
