//! Remote file fetching.

use anyhow::Result;
use url::Url;

use crate::command::CommandTemplate;
use crate::core::{DefineContext, DefineError, RuleRef, RuleSpec};

/// Arguments to [`remote_file`].
#[derive(Debug, Clone, Default)]
pub struct RemoteFileArgs {
    /// Rule name.
    pub name: String,

    /// URL to fetch.
    pub url: String,

    /// Output hashes; the fetched content must match at least one.
    /// Required, because the remote file must not change - otherwise
    /// it would introduce fundamental indeterminacy into the build.
    pub hashes: Vec<String>,

    /// Output name of the file. Chosen automatically if not given.
    pub out: Option<String>,

    /// True to mark the output as binary and runnable.
    pub binary: bool,

    /// Visibility declaration.
    pub visibility: Vec<String>,

    /// If true the rule is only visible to test targets.
    pub test_only: bool,
}

/// Defines a rule to fetch a file over HTTP(S).
pub fn remote_file(ctx: &mut DefineContext, args: RemoteFileArgs) -> Result<RuleRef> {
    if args.hashes.is_empty() {
        return Err(DefineError::MissingHashes { rule: args.name }.into());
    }
    Url::parse(&args.url).map_err(|err| DefineError::InvalidUrl {
        rule: args.name.clone(),
        url: args.url.clone(),
        reason: err.to_string(),
    })?;

    let mut cmd = match &args.out {
        Some(out) => format!("curl {} -o {}", args.url, out),
        None => format!("curl {} -O", args.url),
    };
    if args.binary {
        cmd.push_str(" && chmod +x $OUT");
    }

    let output = args
        .out
        .unwrap_or_else(|| args.url[args.url.rfind('/').map_or(0, |i| i + 1)..].to_string());

    let mut spec = RuleSpec::new(ctx.label(&args.name), CommandTemplate::text(cmd))
        .with_outputs([output])
        .with_visibility(args.visibility)
        .with_hashes(args.hashes)
        .with_building_description("Fetching...");
    spec.binary = args.binary;
    spec.test_only = args.test_only;

    Ok(ctx.add_rule(spec))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::BuildConfig;
    use crate::test_support::MemoryGraph;

    fn define(graph: &mut MemoryGraph, args: RemoteFileArgs) -> Result<RuleRef> {
        let config = BuildConfig::host();
        let mut ctx = DefineContext::new(graph, &config, "third_party");
        remote_file(&mut ctx, args)
    }

    #[test]
    fn test_output_defaults_to_last_url_segment() {
        let mut graph = MemoryGraph::default();
        let label = define(
            &mut graph,
            RemoteFileArgs {
                name: "jq".to_string(),
                url: "https://example.com/downloads/v1.7/jq-linux64".to_string(),
                hashes: vec!["sha1: 5309c5a".to_string()],
                ..Default::default()
            },
        )
        .unwrap();

        let rule = graph.rule(label).unwrap();
        assert_eq!(rule.outputs, vec!["jq-linux64"]);
        assert_eq!(
            rule.command.to_string(),
            "curl https://example.com/downloads/v1.7/jq-linux64 -O"
        );
        assert_eq!(rule.building_description, "Fetching...");
    }

    #[test]
    fn test_explicit_output_and_binary() {
        let mut graph = MemoryGraph::default();
        let label = define(
            &mut graph,
            RemoteFileArgs {
                name: "jq".to_string(),
                url: "https://example.com/downloads/v1.7/jq-linux64".to_string(),
                hashes: vec!["sha1: 5309c5a".to_string()],
                out: Some("jq".to_string()),
                binary: true,
                ..Default::default()
            },
        )
        .unwrap();

        let rule = graph.rule(label).unwrap();
        assert_eq!(rule.outputs, vec!["jq"]);
        assert_eq!(
            rule.command.to_string(),
            "curl https://example.com/downloads/v1.7/jq-linux64 -o jq && chmod +x $OUT"
        );
        assert!(rule.binary);
    }

    #[test]
    fn test_hashes_are_mandatory() {
        let mut graph = MemoryGraph::default();
        let err = define(
            &mut graph,
            RemoteFileArgs {
                name: "jq".to_string(),
                url: "https://example.com/jq".to_string(),
                ..Default::default()
            },
        )
        .unwrap_err();

        assert_eq!(
            err.downcast_ref::<DefineError>(),
            Some(&DefineError::MissingHashes {
                rule: "jq".to_string()
            })
        );
    }

    #[test]
    fn test_invalid_url_fails() {
        let mut graph = MemoryGraph::default();
        let err = define(
            &mut graph,
            RemoteFileArgs {
                name: "bad".to_string(),
                url: "not a url".to_string(),
                hashes: vec!["sha1: 123".to_string()],
                ..Default::default()
            },
        )
        .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<DefineError>(),
            Some(DefineError::InvalidUrl { .. })
        ));
    }
}
