//! Build environment variables.
//!
//! The second channel into a rule's command, next to placeholder
//! expansion. The host populates these when it executes the command;
//! this module declares the names and semantics the command channel
//! relies on, and provides the reference computation.

use crate::core::context::BuildConfig;
use crate::core::rule::RuleSpec;
use crate::core::source::Source;

use super::template::{ExpandError, RuleLookup};

/// Architecture tag of the host, e.g. "x86_64".
pub const ARCH: &str = "ARCH";

/// Operating system tag of the host, e.g. "linux".
pub const OS: &str = "OS";

/// Restricted search path from the host configuration. External
/// environment variables deliberately don't leak into builds.
pub const PATH: &str = "PATH";

/// The temporary directory the rule builds in.
pub const TMP_DIR: &str = "TMP_DIR";

/// All source paths of the rule, space-joined.
pub const SRCS: &str = "SRCS";

/// All declared outputs of the rule, space-joined.
pub const OUTS: &str = "OUTS";

/// The path of the package declaring the rule.
pub const PKG: &str = "PKG";

/// The rule's name.
pub const NAME: &str = "NAME";

/// The rule's output. Only present when there is exactly one output.
pub const OUT: &str = "OUT";

/// The rule's source. Only present when there is exactly one source.
pub const SRC: &str = "SRC";

/// Invocation paths of all tools, space-joined.
pub const TOOLS: &str = "TOOLS";

/// The rule's tool. Only present when there is exactly one tool.
pub const TOOL: &str = "TOOL";

/// Prefix for named source groups; one `SRCS_<GROUP>` variable exists
/// per group, with the group name uppercased.
pub const SRCS_PREFIX: &str = "SRCS_";

/// The directory a test rule runs in. Test runs only.
pub const TEST_DIR: &str = "TEST_DIR";

/// Set to "true" when coverage collection was requested. Test runs
/// only.
pub const COVERAGE: &str = "COVERAGE";

/// Where a command is about to run.
#[derive(Debug, Clone)]
pub enum EnvScope {
    /// The build command, in its temporary build directory.
    Build { tmp_dir: String },

    /// The test command, in its test directory.
    Test { test_dir: String, coverage: bool },
}

/// Compute the environment for running one of a rule's commands.
///
/// `lookup` supplies the realized source, output, and tool paths, so
/// this runs at build time, driven by the external executor.
pub fn environment(
    config: &BuildConfig,
    rule: &RuleSpec,
    scope: &EnvScope,
    lookup: &dyn RuleLookup,
) -> Result<Vec<(String, String)>, ExpandError> {
    let mut env = vec![
        (PKG.to_string(), rule.label.package().to_string()),
        (ARCH.to_string(), config.arch.clone()),
        (OS.to_string(), config.os.clone()),
        (PATH.to_string(), config.path.join(":")),
    ];

    match scope {
        EnvScope::Build { tmp_dir } => {
            let sources = source_paths(rule.sources.iter(), lookup)?;
            let tools = rule
                .tools
                .iter()
                .map(|tool| lookup.tool_path(*tool))
                .collect::<Result<Vec<_>, _>>()?;

            env.push((TMP_DIR.to_string(), tmp_dir.clone()));
            env.push((SRCS.to_string(), sources.join(" ")));
            env.push((OUTS.to_string(), rule.outputs.join(" ")));
            env.push((NAME.to_string(), rule.label.name().to_string()));
            env.push((TOOLS.to_string(), tools.join(" ")));

            if let [output] = rule.outputs.as_slice() {
                env.push((OUT.to_string(), format!("{}/{}", tmp_dir, output)));
            }
            if let [source] = sources.as_slice() {
                env.push((SRC.to_string(), source.clone()));
            }
            if let [tool] = tools.as_slice() {
                env.push((TOOL.to_string(), tool.clone()));
            }
            if let Some(groups) = rule.sources.groups() {
                for (name, sources) in groups {
                    let paths = source_paths(sources.iter(), lookup)?;
                    env.push((
                        format!("{}{}", SRCS_PREFIX, name.to_uppercase()),
                        paths.join(" "),
                    ));
                }
            }
        }
        EnvScope::Test { test_dir, coverage } => {
            env.push((TEST_DIR.to_string(), test_dir.clone()));
            if *coverage {
                env.push((COVERAGE.to_string(), "true".to_string()));
            }
        }
    }

    Ok(env)
}

fn source_paths<'a>(
    sources: impl Iterator<Item = &'a Source>,
    lookup: &dyn RuleLookup,
) -> Result<Vec<String>, ExpandError> {
    let mut paths = Vec::new();
    for source in sources {
        match source {
            Source::File(file) => paths.push(lookup.file_path(file)),
            Source::Rule(rule) => paths.extend(lookup.output_paths(*rule)?),
        }
    }
    Ok(paths)
}
