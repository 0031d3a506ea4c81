//! Capability matching over the dependency graph.
//!
//! A rule with several kinds of output (say, one artifact with Go and
//! Python bindings) declares `provides`, a mapping from capability tag
//! to the dependency that carries that kind. A consumer declares
//! `requires`, the tags it wants. When a consumer depends on a
//! provider, the edge is rewritten to point at the matching kind rather
//! than the provider itself, so consumers never need to know which
//! concrete output a polymorphic dependency should hand them.
//!
//! Resolution is two-phase: [`ProvideIndex::record`] collects every
//! provides mapping, then [`ProvideIndex::resolve`] rewrites a
//! consumer's dependency edges against the index. Tags with no
//! satisfying mapping fall back to the original edge; whether that is
//! ultimately an error belongs to the consuming build step.

use std::collections::{BTreeMap, HashMap};

use crate::core::label::RuleRef;
use crate::core::rule::RuleSpec;

/// Index of every rule's provides mapping, keyed by producing rule.
#[derive(Debug, Clone, Default)]
pub struct ProvideIndex {
    entries: HashMap<RuleRef, BTreeMap<String, RuleRef>>,
}

impl ProvideIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        ProvideIndex::default()
    }

    /// Record a rule's provides mapping, if it has one.
    pub fn record(&mut self, rule: &RuleSpec) {
        if !rule.provides.is_empty() {
            self.record_provides(rule.label, rule.provides.clone());
        }
    }

    /// Record a provides mapping directly.
    pub fn record_provides(&mut self, rule: RuleRef, provides: BTreeMap<String, RuleRef>) {
        self.entries.insert(rule, provides);
    }

    /// The recorded provides mapping of a rule, if any.
    pub fn provides(&self, rule: RuleRef) -> Option<&BTreeMap<String, RuleRef>> {
        self.entries.get(&rule)
    }

    /// Compute the edges a consumer should actually get when it
    /// declared a dependency on `producer`.
    ///
    /// Every required tag present in the producer's mapping yields the
    /// mapped target; with no matching tag the original edge stands,
    /// unchanged.
    pub fn provide_for(&self, producer: RuleRef, requires: &[String]) -> Vec<RuleRef> {
        let provides = match self.entries.get(&producer) {
            Some(provides) if !requires.is_empty() => provides,
            _ => return vec![producer],
        };
        let mut edges = Vec::new();
        for tag in requires {
            if let Some(&target) = provides.get(tag) {
                if !edges.contains(&target) {
                    tracing::trace!(
                        "capability '{}' routes {} -> {}",
                        tag,
                        producer,
                        target
                    );
                    edges.push(target);
                }
            }
        }
        if edges.is_empty() {
            tracing::trace!("no capability of {} matches; keeping direct edge", producer);
            return vec![producer];
        }
        edges
    }

    /// Rewrite a consumer's whole dependency list, preserving
    /// first-seen order and deduplicating.
    pub fn resolve(&self, consumer: &RuleSpec) -> Vec<RuleRef> {
        let mut edges = Vec::new();
        for &dep in &consumer.dependencies {
            for edge in self.provide_for(dep, &consumer.requires) {
                if !edges.contains(&edge) {
                    edges.push(edge);
                }
            }
        }
        edges
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandTemplate;

    fn rule(name: &str) -> RuleSpec {
        RuleSpec::new(RuleRef::new("pkg", name), CommandTemplate::noop())
    }

    fn index_with_proto() -> (ProvideIndex, RuleRef, RuleRef, RuleRef) {
        let proto = RuleRef::new("pkg", "proto");
        let py = RuleRef::new("pkg", "proto_py");
        let go = RuleRef::new("pkg", "proto_go");

        let mut index = ProvideIndex::new();
        index.record_provides(
            proto,
            BTreeMap::from([("py".to_string(), py), ("go".to_string(), go)]),
        );
        (index, proto, py, go)
    }

    #[test]
    fn test_matched_tag_substitutes_edge() {
        let (index, proto, py, _) = index_with_proto();
        let consumer = rule("py_lib")
            .with_dependencies([proto])
            .with_requires(["py"]);

        assert_eq!(index.resolve(&consumer), vec![py]);
    }

    #[test]
    fn test_unmatched_tag_keeps_direct_edge() {
        let (index, proto, _, _) = index_with_proto();
        let consumer = rule("cc_lib")
            .with_dependencies([proto])
            .with_requires(["cc"]);

        assert_eq!(index.resolve(&consumer), vec![proto]);
    }

    #[test]
    fn test_no_requires_keeps_direct_edge() {
        let (index, proto, _, _) = index_with_proto();
        let consumer = rule("any").with_dependencies([proto]);

        assert_eq!(index.resolve(&consumer), vec![proto]);
    }

    #[test]
    fn test_multiple_tags_fan_out() {
        let (index, proto, py, go) = index_with_proto();
        let consumer = rule("mixed")
            .with_dependencies([proto])
            .with_requires(["py", "go"]);

        assert_eq!(index.resolve(&consumer), vec![py, go]);
    }

    #[test]
    fn test_plain_dependencies_untouched() {
        let (index, proto, py, _) = index_with_proto();
        let plain = RuleRef::new("pkg", "helper");
        let consumer = rule("py_lib")
            .with_dependencies([plain, proto])
            .with_requires(["py"]);

        assert_eq!(index.resolve(&consumer), vec![plain, py]);
    }

    #[test]
    fn test_requires_chain_through_aggregators() {
        // An aggregation rule that itself requires "py" both resolves
        // its own edge and carries the tag as a label, which is what
        // lets capability intent chain through intermediate collectors.
        let (index, proto, py, _) = index_with_proto();
        let aggregator = rule("group")
            .with_dependencies([proto])
            .with_requires(["py"]);

        assert_eq!(index.resolve(&aggregator), vec![py]);
        assert!(aggregator.labels.contains(&"py".to_string()));
    }

    #[test]
    fn test_resolution_deduplicates() {
        let proto = RuleRef::new("pkg", "proto");
        let py = RuleRef::new("pkg", "proto_py");

        let mut index = ProvideIndex::new();
        index.record_provides(proto, BTreeMap::from([("py".to_string(), py)]));

        let consumer = rule("lib")
            .with_dependencies([proto, py])
            .with_requires(["py"]);

        // The substituted edge and the direct one collapse.
        assert_eq!(index.resolve(&consumer), vec![py]);
    }

    #[test]
    fn test_record_from_spec() {
        let py = RuleRef::new("pkg", "proto_py");
        let producer = rule("proto").with_provides(BTreeMap::from([("py".to_string(), py)]));

        let mut index = ProvideIndex::new();
        index.record(&producer);

        assert_eq!(
            index.provide_for(producer.label, &["py".to_string()]),
            vec![py]
        );
    }
}
