//! Tarball construction.
//!
//! Collects outputs of other rules into a tar archive, staging them
//! under a subdirectory first. Compression methods resolve to a tar
//! flag and file extension through a fixed lookup table.

use anyhow::Result;

use crate::command::{CommandTemplate, Placeholder};
use crate::core::{DefineContext, DefineError, RuleRef, RuleSpec, Source, Sources};

/// A known compression method: tar flag plus output extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionMethod {
    pub name: &'static str,
    pub tar_flag: &'static str,
    pub extension: &'static str,
}

/// The known compression methods, by name.
static COMPRESSION_METHODS: &[CompressionMethod] = &[
    CompressionMethod { name: "gzip", tar_flag: "-z", extension: ".gz" },
    CompressionMethod { name: "bzip2", tar_flag: "-j", extension: ".bz2" },
    CompressionMethod { name: "xz", tar_flag: "-J", extension: ".xz" },
    CompressionMethod { name: "lzma", tar_flag: "--lzma", extension: ".lzma" },
    CompressionMethod { name: "compress", tar_flag: "-Z", extension: ".Z" },
];

/// How to compress a tarball.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compression {
    /// One of the known methods.
    Method(&'static CompressionMethod),

    /// Let tar pick from the output name (`-a`). No extension can be
    /// inferred.
    Detect,

    /// A raw tar flag, passed through as given. The output name can't
    /// be inferred either, so the rule must declare one explicitly.
    Flag(String),
}

impl Default for Compression {
    fn default() -> Self {
        Compression::from_name("gzip")
    }
}

impl Compression {
    /// Resolve a compression name against the lookup table.
    ///
    /// `-`-prefixed strings are raw flags; unrecognized names fall back
    /// to tar's auto-detection.
    pub fn from_name(name: &str) -> Self {
        if name.starts_with('-') {
            return Compression::Flag(name.to_string());
        }
        COMPRESSION_METHODS
            .iter()
            .find(|method| method.name == name)
            .map(Compression::Method)
            .unwrap_or(Compression::Detect)
    }

    /// The flag to pass to tar.
    pub fn tar_flag(&self) -> &str {
        match self {
            Compression::Method(method) => method.tar_flag,
            Compression::Detect => "-a",
            Compression::Flag(flag) => flag,
        }
    }

    /// The output file extension, following ".tar".
    pub fn extension(&self) -> &'static str {
        match self {
            Compression::Method(method) => method.extension,
            Compression::Detect | Compression::Flag(_) => "",
        }
    }
}

/// Arguments to [`tarball`].
#[derive(Debug, Clone)]
pub struct TarballArgs {
    /// Rule name.
    pub name: String,

    /// Source files and rules to include in the tarball.
    pub srcs: Vec<Source>,

    /// Name of the output tarball. Defaults to `<name>.tar<ext>` with
    /// the extension from the compression method.
    pub out: Option<String>,

    /// Subdirectory to stage into. Defaults to the rule name.
    pub subdir: Option<String>,

    /// Kind of compression to use.
    pub compression: Compression,

    /// Dependencies.
    pub deps: Vec<RuleRef>,

    /// Visibility declaration.
    pub visibility: Vec<String>,

    /// Labels to apply to this rule.
    pub labels: Vec<String>,
}

impl Default for TarballArgs {
    fn default() -> Self {
        TarballArgs {
            name: String::new(),
            srcs: Vec::new(),
            out: None,
            subdir: None,
            compression: Compression::default(),
            deps: Vec::new(),
            visibility: Vec::new(),
            labels: Vec::new(),
        }
    }
}

/// Defines a rule to create a tarball containing outputs of other
/// rules.
pub fn tarball(ctx: &mut DefineContext, args: TarballArgs) -> Result<RuleRef> {
    if matches!(args.compression, Compression::Flag(_)) && args.out.is_none() {
        return Err(DefineError::CompressionNeedsOutput { rule: args.name }.into());
    }

    let subdir = args.subdir.unwrap_or_else(|| args.name.clone());
    let output = args
        .out
        .unwrap_or_else(|| format!("{}.tar{}", args.name, args.compression.extension()));

    let mut template = CommandTemplate::new();
    template.push_text(format!("mkdir -p _tmp/{0} && cd _tmp/{0} && echo ", subdir));
    for (i, src) in args.srcs.iter().enumerate() {
        if i > 0 {
            template.push_text(" ");
        }
        template.push(Placeholder::LocationPairs(src.clone()));
    }
    template.push_text(format!(
        " | xargs -n 2 cp -r && cd ${{TMP_DIR}}/_tmp && tar {} -cf $OUT *",
        args.compression.tar_flag()
    ));

    let spec = RuleSpec::new(ctx.label(&args.name), template)
        .with_sources(Sources::Flat(args.srcs))
        .with_outputs([output])
        .with_dependencies(args.deps)
        .with_visibility(args.visibility)
        .with_labels(args.labels)
        .with_labels(["tar"]);

    Ok(ctx.add_rule(spec))
}
