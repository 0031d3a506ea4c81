//! System package construction via fpm.
//!
//! Builds a staging directory from a destination -> source mapping,
//! then invokes fpm over it. Mapping iteration is lexicographic by
//! destination path so the generated command is reproducible
//! byte-for-byte across runs.

use std::collections::BTreeMap;

use anyhow::Result;

use crate::command::{CommandTemplate, Placeholder};
use crate::core::{DefineContext, RuleRef, RuleSpec, Source, Sources};

/// Arguments to [`fpm_package`].
#[derive(Debug, Clone, Default)]
pub struct FpmPackageArgs {
    /// Rule name.
    pub name: String,

    /// Install locations mapped to the files to place there, e.g.
    /// `/usr/bin/tool` -> `//src:tool`.
    pub files: BTreeMap<String, Source>,

    /// Install locations mapped to symlink targets.
    pub links: BTreeMap<String, String>,

    /// Version of the package.
    pub version: String,

    /// Type of package to build (deb, rpm, etc).
    pub package_type: String,

    /// Name of the package. Defaults to the rule name.
    pub package_name: Option<String>,

    /// Extra options to pass to fpm.
    pub options: String,

    /// Extra sources; entries in `files` need not be repeated here.
    pub srcs: Vec<Source>,

    /// Dependencies.
    pub deps: Vec<RuleRef>,

    /// Visibility declaration.
    pub visibility: Vec<String>,

    /// Labels to apply to this rule.
    pub labels: Vec<String>,
}

/// Defines a rule to build a system package using fpm.
pub fn fpm_package(ctx: &mut DefineContext, args: FpmPackageArgs) -> Result<RuleRef> {
    let package_name = args.package_name.unwrap_or_else(|| args.name.clone());

    let mut template = CommandTemplate::new();
    template.push_text("mkdir _tmp && cd _tmp");
    for (location, source) in &args.files {
        let location = location.trim_start_matches('/');
        template.push_text(format!(
            " && mkdir -p $(dirname {}) && cp -r ../",
            location
        ));
        match source {
            Source::Rule(rule) => template.push(Placeholder::Location(*rule)),
            Source::File(file) => template.push_text(staged_path(ctx, file)),
        }
        template.push_text(format!(" {}", location));
    }
    for (location, target) in &args.links {
        let location = location.trim_start_matches('/');
        template.push_text(format!(
            " && mkdir -p $(dirname {0}) && ln -s {1} {0}",
            location, target
        ));
    }
    template.push_text(format!(
        " && fpm -s dir -t {} -n \"{}\" -v \"{}\" {} -p $OUT .",
        args.package_type, package_name, args.version, args.options
    ));

    let mut sources: Vec<Source> = args.files.values().cloned().collect();
    sources.sort_by_key(source_sort_key);
    sources.extend(args.srcs);

    let output = format!(
        "{}_{}_{}.{}",
        package_name,
        args.version,
        ctx.arch(),
        args.package_type
    );

    let spec = RuleSpec::new(ctx.label(&args.name), template)
        .with_sources(Sources::Flat(sources))
        .with_outputs([output])
        .with_dependencies(args.deps)
        .with_visibility(args.visibility)
        .with_labels(args.labels)
        .with_building_description("Packaging...")
        .with_requires(["fpm"]);

    Ok(ctx.add_rule(spec))
}

/// Convenience wrapper around [`fpm_package`] that always builds a
/// .deb package.
pub fn fpm_deb(ctx: &mut DefineContext, args: FpmPackageArgs) -> Result<RuleRef> {
    fpm_package(
        ctx,
        FpmPackageArgs {
            package_type: "deb".to_string(),
            ..args
        },
    )
}

fn staged_path(ctx: &DefineContext, file: &str) -> String {
    if ctx.is_root_package() {
        file.to_string()
    } else {
        format!("{}/{}", ctx.package_path(), file)
    }
}

fn source_sort_key(source: &Source) -> String {
    match source {
        Source::File(file) => file.clone(),
        Source::Rule(rule) => rule.to_string(),
    }
}
