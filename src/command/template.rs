//! Deferred command templates.
//!
//! A rule's command is stored as an intermediate representation rather
//! than a flat string: a sequence of literal text segments and typed
//! placeholders. Dependency outputs don't exist when the rule graph is
//! constructed, so placeholders are resolved by the external executor,
//! through [`CommandTemplate::expand`], once paths are known.
//!
//! Recognized placeholder forms in a raw command string:
//! - `$(location //path/to:rule)` - the rule's single output path
//! - `$(locations //path/to:rule)` - all output paths, space-joined
//! - `$(exe //path/to:rule)` - invocation of a binary rule's output
//! - `$(out_location //path/to:rule)` - the output's final installed path
//! - `$(location_pairs src)` - source/destination pairs for copy or link
//!
//! Anything else, including plain `$VAR` and `$(shell substitutions)`,
//! passes through untouched for late shell expansion.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::label::RuleRef;
use crate::core::source::Source;

/// Error while expanding a template at build time.
///
/// These conditions originate in this crate's contracts but surface
/// through the external executor's error channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpandError {
    #[error("rule {rule} is not known to the build graph")]
    UnknownRule { rule: RuleRef },

    #[error("rule {rule} must have exactly one output, got {count}")]
    SingleOutputRequired { rule: RuleRef, count: usize },

    #[error("rule {rule} is not marked binary")]
    NotBinary { rule: RuleRef },
}

/// A deferred reference to be resolved once dependency outputs exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placeholder {
    /// The single output path of a rule. Referencing a rule with any
    /// other number of outputs is a resolution error.
    Location(RuleRef),

    /// All output paths of a rule, space-joined.
    Locations(RuleRef),

    /// An invocation of a binary rule's runnable output.
    Exe(RuleRef),

    /// A rule's output path rewritten to its final installed location.
    OutLocation(RuleRef),

    /// Source-path/destination-path pairs for copy or link pipelines.
    LocationPairs(Source),
}

impl Placeholder {
    fn verb(&self) -> &'static str {
        match self {
            Placeholder::Location(_) => "location",
            Placeholder::Locations(_) => "locations",
            Placeholder::Exe(_) => "exe",
            Placeholder::OutLocation(_) => "out_location",
            Placeholder::LocationPairs(_) => "location_pairs",
        }
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Placeholder::Location(r)
            | Placeholder::Locations(r)
            | Placeholder::Exe(r)
            | Placeholder::OutLocation(r) => write!(f, "$({} {})", self.verb(), r),
            Placeholder::LocationPairs(Source::Rule(r)) => {
                write!(f, "$({} {})", self.verb(), r)
            }
            Placeholder::LocationPairs(Source::File(path)) => {
                write!(f, "$({} {})", self.verb(), path)
            }
        }
    }
}

/// One piece of a command template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    /// Literal command text, owned by late shell expansion.
    Text(String),

    /// A deferred reference marker.
    Placeholder(Placeholder),
}

/// A shell command with deferred references.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandTemplate {
    segments: Vec<Segment>,
}

impl CommandTemplate {
    /// Create an empty template.
    pub fn new() -> Self {
        CommandTemplate::default()
    }

    /// The no-op command, used by pure collector rules.
    pub fn noop() -> Self {
        CommandTemplate::text("true")
    }

    /// A template of literal text with no deferred references.
    pub fn text(s: impl Into<String>) -> Self {
        let mut template = CommandTemplate::new();
        template.push_text(s.into());
        template
    }

    /// Parse a raw command string, recognizing the placeholder forms.
    ///
    /// Relative labels in placeholders resolve against `package`.
    /// Unrecognized `$(...)` forms stay literal text; the shell owns
    /// them at execution time.
    pub fn parse(raw: &str, package: &str) -> Self {
        let mut template = CommandTemplate::new();
        let mut rest = raw;
        while let Some(start) = rest.find("$(") {
            template.push_text(&rest[..start]);
            let tail = &rest[start..];
            let body_end = match tail[2..].find(')') {
                Some(end) => end,
                None => {
                    // Unterminated; keep the remainder verbatim.
                    template.push_text(tail);
                    return template;
                }
            };
            match parse_placeholder(&tail[2..2 + body_end], package) {
                Some(placeholder) => {
                    template.push(placeholder);
                    rest = &tail[2 + body_end + 1..];
                }
                None => {
                    // Not one of ours; emit the opener and rescan from
                    // just past it so nested forms are still found.
                    template.push_text("$(");
                    rest = &tail[2..];
                }
            }
        }
        template.push_text(rest);
        template
    }

    /// Append literal text, merging adjacent text segments.
    pub fn push_text(&mut self, text: impl AsRef<str>) {
        let text = text.as_ref();
        if text.is_empty() {
            return;
        }
        if let Some(Segment::Text(last)) = self.segments.last_mut() {
            last.push_str(text);
        } else {
            self.segments.push(Segment::Text(text.to_string()));
        }
    }

    /// Append a deferred reference.
    pub fn push(&mut self, placeholder: Placeholder) {
        self.segments.push(Segment::Placeholder(placeholder));
    }

    /// The template's segments.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Whether this template is the no-op command.
    pub fn is_noop(&self) -> bool {
        matches!(self.segments.as_slice(), [Segment::Text(t)] if t == "true")
    }

    /// All rules referenced by deferred markers in this template.
    pub fn referenced_rules(&self) -> Vec<RuleRef> {
        let mut rules = Vec::new();
        for segment in &self.segments {
            let rule = match segment {
                Segment::Placeholder(Placeholder::Location(r))
                | Segment::Placeholder(Placeholder::Locations(r))
                | Segment::Placeholder(Placeholder::Exe(r))
                | Segment::Placeholder(Placeholder::OutLocation(r))
                | Segment::Placeholder(Placeholder::LocationPairs(Source::Rule(r))) => *r,
                _ => continue,
            };
            if !rules.contains(&rule) {
                rules.push(rule);
            }
        }
        rules
    }

    /// Resolve every deferred reference into a concrete command string.
    ///
    /// Driven by the external executor once dependency outputs exist on
    /// disk; `lookup` supplies the realized paths.
    pub fn expand(&self, lookup: &dyn RuleLookup) -> Result<String, ExpandError> {
        let mut command = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => command.push_str(text),
                Segment::Placeholder(Placeholder::Location(rule)) => {
                    command.push_str(&single_output(lookup, *rule)?);
                }
                Segment::Placeholder(Placeholder::Locations(rule)) => {
                    command.push_str(&lookup.output_paths(*rule)?.join(" "));
                }
                Segment::Placeholder(Placeholder::Exe(rule)) => {
                    if !lookup.is_binary(*rule) {
                        return Err(ExpandError::NotBinary { rule: *rule });
                    }
                    command.push_str(&single_output(lookup, *rule)?);
                }
                Segment::Placeholder(Placeholder::OutLocation(rule)) => {
                    command.push_str(&lookup.final_output_paths(*rule)?.join(" "));
                }
                Segment::Placeholder(Placeholder::LocationPairs(source)) => {
                    command.push_str(&location_pairs(lookup, source)?.join(" "));
                }
            }
        }
        Ok(command)
    }
}

impl fmt::Display for CommandTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => f.write_str(text)?,
                Segment::Placeholder(placeholder) => write!(f, "{}", placeholder)?,
            }
        }
        Ok(())
    }
}

fn parse_placeholder(body: &str, package: &str) -> Option<Placeholder> {
    let (verb, arg) = body.split_once(' ')?;
    let arg = arg.trim();
    match verb {
        "location" => RuleRef::parse(arg, package).ok().map(Placeholder::Location),
        "locations" => RuleRef::parse(arg, package).ok().map(Placeholder::Locations),
        "exe" => RuleRef::parse(arg, package).ok().map(Placeholder::Exe),
        "out_location" => RuleRef::parse(arg, package)
            .ok()
            .map(Placeholder::OutLocation),
        "location_pairs" => Source::parse(arg, package)
            .ok()
            .map(Placeholder::LocationPairs),
        _ => None,
    }
}

fn single_output(lookup: &dyn RuleLookup, rule: RuleRef) -> Result<String, ExpandError> {
    let mut outputs = lookup.output_paths(rule)?;
    if outputs.len() != 1 {
        return Err(ExpandError::SingleOutputRequired {
            rule,
            count: outputs.len(),
        });
    }
    Ok(outputs.remove(0))
}

fn location_pairs(lookup: &dyn RuleLookup, source: &Source) -> Result<Vec<String>, ExpandError> {
    match source {
        Source::File(file) => Ok(vec![lookup.file_path(file), file.clone()]),
        Source::Rule(rule) => {
            let mut pairs = Vec::new();
            for output in lookup.output_paths(*rule)? {
                let destination = output.rsplit('/').next().unwrap_or(&output).to_string();
                pairs.push(output);
                pairs.push(destination);
            }
            Ok(pairs)
        }
    }
}

/// Executor-side path resolution driving template expansion.
///
/// Implemented by the external build engine, which knows where rule
/// outputs land once they exist.
pub trait RuleLookup {
    /// The sandbox-relative output paths of a rule.
    fn output_paths(&self, rule: RuleRef) -> Result<Vec<String>, ExpandError>;

    /// The final installed output paths of a rule.
    fn final_output_paths(&self, rule: RuleRef) -> Result<Vec<String>, ExpandError>;

    /// Whether the rule is marked binary.
    fn is_binary(&self, rule: RuleRef) -> bool;

    /// The invocation path of a tool rule.
    fn tool_path(&self, rule: RuleRef) -> Result<String, ExpandError>;

    /// The build-directory path of a literal file source.
    fn file_path(&self, file: &str) -> String;
}
