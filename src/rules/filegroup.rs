//! File collection rules.
//!
//! A filegroup collects files and other rules so dependents can reach
//! them as one unit. With no sources it is a pure collector with
//! nothing to execute; with sources it links or copies them into place
//! via location pairs.

use std::collections::BTreeMap;

use anyhow::Result;

use crate::command::{CommandTemplate, Placeholder};
use crate::core::{check_binary_outputs, DefineContext, RuleRef, RuleSpec, Source};

/// Arguments to [`filegroup`].
#[derive(Clone)]
pub struct FilegroupArgs {
    /// Rule name.
    pub name: String,

    /// Source files and rules to collect.
    pub srcs: Vec<Source>,

    /// Dependencies.
    pub deps: Vec<RuleRef>,

    /// Dependencies that become visible to rules depending on this one.
    pub exported_deps: Vec<RuleRef>,

    /// Visibility declaration.
    pub visibility: Vec<String>,

    /// Labels to apply to this rule.
    pub labels: Vec<String>,

    /// True to mark the rule outputs as binary.
    pub binary: bool,

    /// Block downward searches of transitive dependencies past this
    /// rule.
    pub output_is_complete: bool,

    /// Capability tags consumed from dependencies.
    pub requires: Vec<String>,

    /// Capability tag to dependency mapping exposed to dependents.
    pub provides: BTreeMap<String, RuleRef>,

    /// Symlink sources into place instead of copying them.
    pub link: bool,

    /// Only usable by test rules.
    pub test_only: bool,
}

impl Default for FilegroupArgs {
    fn default() -> Self {
        FilegroupArgs {
            name: String::new(),
            srcs: Vec::new(),
            deps: Vec::new(),
            exported_deps: Vec::new(),
            visibility: Vec::new(),
            labels: Vec::new(),
            binary: false,
            output_is_complete: true,
            requires: Vec::new(),
            provides: BTreeMap::new(),
            link: true,
            test_only: false,
        }
    }
}

/// Defines a collection of files which other rules can depend on.
///
/// Sources can be omitted entirely, in which case this is simply a rule
/// to collect other rules, with zero execution cost.
pub fn filegroup(ctx: &mut DefineContext, args: FilegroupArgs) -> Result<RuleRef> {
    // In the root package, plain relative files are already where they
    // belong; only rule outputs and absolute-style paths need placing.
    let not_root = !ctx.is_root_package();
    let placed: Vec<&Source> = args
        .srcs
        .iter()
        .filter(|src| match src {
            Source::Rule(_) => true,
            Source::File(path) => not_root || path.starts_with('/'),
        })
        .collect();

    let command = if placed.is_empty() {
        CommandTemplate::noop()
    } else {
        let mut template = CommandTemplate::new();
        template.push_text("echo ");
        for (i, src) in placed.iter().enumerate() {
            if i > 0 {
                template.push_text(" ");
            }
            template.push(Placeholder::LocationPairs((*src).clone()));
        }
        template.push_text(if args.link {
            " | xargs -n 2 ln -s"
        } else {
            " | xargs -n 2 cp -r"
        });
        template
    };

    // Statically-known output names come from the file sources; rule
    // sources contribute their outputs through the graph.
    let outputs: Vec<String> = args
        .srcs
        .iter()
        .filter_map(|src| src.as_file().map(str::to_string))
        .collect();
    check_binary_outputs(&args.name, args.binary, &outputs)?;

    let mut spec = RuleSpec::new(ctx.label(&args.name), command)
        .with_sources(args.srcs)
        .with_outputs(outputs)
        .with_dependencies(args.deps)
        .with_visibility(args.visibility)
        .with_labels(args.labels)
        .with_building_description(if args.link {
            "Symlinking..."
        } else {
            "Copying..."
        })
        .with_requires(args.requires)
        .with_provides(args.provides);
    spec.exported_deps = args.exported_deps;
    spec.binary = args.binary;
    spec.output_is_complete = args.output_is_complete;
    // Links only produce references, not independent content, so
    // there's nothing worth copying to the artifact cache and back.
    spec.skip_cache = args.link;
    spec.test_only = args.test_only;

    Ok(ctx.add_rule(spec))
}

/// Arguments to [`export_file`].
#[derive(Clone, Default)]
pub struct ExportFileArgs {
    /// Rule name.
    pub name: String,

    /// Source file for the rule.
    pub src: String,

    /// Visibility declaration.
    pub visibility: Vec<String>,

    /// True to mark the rule outputs as binary.
    pub binary: bool,

    /// If true the exported file can only be used by test targets.
    pub test_only: bool,
}

/// Essentially a single-file alias for [`filegroup`].
pub fn export_file(ctx: &mut DefineContext, args: ExportFileArgs) -> Result<RuleRef> {
    let src = ctx.source(&args.src)?;
    filegroup(
        ctx,
        FilegroupArgs {
            name: args.name,
            srcs: vec![src],
            visibility: args.visibility,
            binary: args.binary,
            test_only: args.test_only,
            ..Default::default()
        },
    )
}
