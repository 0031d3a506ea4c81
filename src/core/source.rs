//! Rule sources - literal files or references to other rules' outputs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::error::DefineError;
use crate::core::label::RuleRef;

/// A single source of a rule.
///
/// File paths are relative to the declaring package. Anything starting
/// with `:` or `//` is a reference to another rule, whose outputs become
/// the sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Source {
    /// A literal file path within the declaring package.
    File(String),

    /// Another rule; its outputs are consumed as sources.
    Rule(RuleRef),
}

impl Source {
    /// Parse a source string relative to the given package.
    pub fn parse(s: &str, current_package: &str) -> Result<Self, DefineError> {
        if RuleRef::is_label(s) {
            Ok(Source::Rule(RuleRef::parse(s, current_package)?))
        } else {
            Ok(Source::File(s.to_string()))
        }
    }

    /// Create a file source.
    pub fn file(path: impl Into<String>) -> Self {
        Source::File(path.into())
    }

    /// Create a rule source.
    pub fn rule(rule: RuleRef) -> Self {
        Source::Rule(rule)
    }

    /// Get the rule reference, if this source is one.
    pub fn as_rule(&self) -> Option<RuleRef> {
        match self {
            Source::Rule(r) => Some(*r),
            Source::File(_) => None,
        }
    }

    /// Get the file path, if this source is one.
    pub fn as_file(&self) -> Option<&str> {
        match self {
            Source::File(f) => Some(f),
            Source::Rule(_) => None,
        }
    }
}

/// The source list of a rule: a flat ordered list, or named groups.
///
/// Named groups are useful when a rule consumes separate kinds of
/// things; each group is exposed to the command through its own
/// `SRCS_<GROUP>` environment variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sources {
    /// Ordered list of sources.
    Flat(Vec<Source>),

    /// Named groups of sources, iterated in name order.
    Named(BTreeMap<String, Vec<Source>>),
}

impl Default for Sources {
    fn default() -> Self {
        Sources::Flat(Vec::new())
    }
}

impl Sources {
    /// Create a flat source list.
    pub fn flat(sources: impl IntoIterator<Item = Source>) -> Self {
        Sources::Flat(sources.into_iter().collect())
    }

    /// Create named source groups.
    pub fn named(groups: impl IntoIterator<Item = (String, Vec<Source>)>) -> Self {
        Sources::Named(groups.into_iter().collect())
    }

    /// Iterate over all sources, ignoring grouping.
    pub fn iter(&self) -> Box<dyn Iterator<Item = &Source> + '_> {
        match self {
            Sources::Flat(list) => Box::new(list.iter()),
            Sources::Named(groups) => Box::new(groups.values().flatten()),
        }
    }

    /// Total number of sources across all groups.
    pub fn len(&self) -> usize {
        match self {
            Sources::Flat(list) => list.len(),
            Sources::Named(groups) => groups.values().map(Vec::len).sum(),
        }
    }

    /// Check if there are no sources at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The named groups, if sources were declared that way.
    pub fn groups(&self) -> Option<&BTreeMap<String, Vec<Source>>> {
        match self {
            Sources::Flat(_) => None,
            Sources::Named(groups) => Some(groups),
        }
    }

    /// Collect all rule references among the sources.
    pub fn rules(&self) -> Vec<RuleRef> {
        self.iter().filter_map(Source::as_rule).collect()
    }
}

impl From<Vec<Source>> for Sources {
    fn from(sources: Vec<Source>) -> Self {
        Sources::Flat(sources)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_source() {
        let file = Source::parse("main.c", "src").unwrap();
        assert_eq!(file, Source::File("main.c".to_string()));

        let local = Source::parse(":lib", "src").unwrap();
        assert_eq!(local.as_rule(), Some(RuleRef::new("src", "lib")));

        let absolute = Source::parse("//third_party:zlib", "src").unwrap();
        assert_eq!(absolute.as_rule(), Some(RuleRef::new("third_party", "zlib")));
    }

    #[test]
    fn test_flat_iteration() {
        let srcs = Sources::flat([Source::file("a.c"), Source::file("b.c")]);
        assert_eq!(srcs.len(), 2);
        assert!(!srcs.is_empty());
        assert!(srcs.groups().is_none());
    }

    #[test]
    fn test_named_groups_deterministic() {
        let srcs = Sources::named([
            ("zz".to_string(), vec![Source::file("z.c")]),
            ("aa".to_string(), vec![Source::file("a.c"), Source::file("b.c")]),
        ]);
        assert_eq!(srcs.len(), 3);

        // BTreeMap iteration is name-ordered regardless of insertion order.
        let names: Vec<_> = srcs.groups().unwrap().keys().collect();
        assert_eq!(names, ["aa", "zz"]);
    }

    #[test]
    fn test_collect_rules() {
        let dep = RuleRef::new("pkg", "dep");
        let srcs = Sources::flat([Source::file("a.c"), Source::rule(dep)]);
        assert_eq!(srcs.rules(), vec![dep]);
    }
}
