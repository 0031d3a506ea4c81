//! Definition-time error types.
//!
//! Configuration errors raise synchronously out of the macro call that
//! caused them; sibling rule definitions are unaffected. Build-time
//! resolution errors live in `command::template::ExpandError`.

use thiserror::Error;

/// Error in a rule definition, detected while the macro runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefineError {
    #[error("rule '{rule}' declares both `out` and `outs`")]
    ConflictingOutputs { rule: String },

    #[error("binary rule '{rule}' must declare at most one output, got {count}")]
    BinaryOutputs { rule: String, count: usize },

    #[error("remote file rule '{rule}' must declare at least one hash")]
    MissingHashes { rule: String },

    #[error("tarball rule '{rule}' passes a raw compression flag, so it must declare an explicit `out`")]
    CompressionNeedsOutput { rule: String },

    #[error("rule '{rule}' has an invalid fetch url `{url}`: {reason}")]
    InvalidUrl {
        rule: String,
        url: String,
        reason: String,
    },

    #[error("invalid build label `{label}`")]
    InvalidLabel { label: String },
}
