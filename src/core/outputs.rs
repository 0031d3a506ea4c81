//! Output declaration normalization.
//!
//! Rules declare outputs through either the singular `out` or the plural
//! `outs` form. Internally only the plural form exists; declaring both
//! is a configuration error.

use crate::core::error::DefineError;

/// Reconcile the singular and plural output declarations into the
/// canonical plural form.
pub fn normalize_outputs(
    rule: &str,
    out: Option<String>,
    outs: Option<Vec<String>>,
) -> Result<Vec<String>, DefineError> {
    match (out, outs) {
        (Some(_), Some(_)) => Err(DefineError::ConflictingOutputs {
            rule: rule.to_string(),
        }),
        (Some(single), None) => Ok(vec![single]),
        (None, Some(many)) => Ok(many),
        (None, None) => Ok(Vec::new()),
    }
}

/// Binary rules produce one runnable artifact, so more than one declared
/// output is a configuration error.
pub fn check_binary_outputs(
    rule: &str,
    binary: bool,
    outputs: &[String],
) -> Result<(), DefineError> {
    if binary && outputs.len() > 1 {
        return Err(DefineError::BinaryOutputs {
            rule: rule.to_string(),
            count: outputs.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_singular_becomes_plural() {
        let outs = normalize_outputs("r", Some("a.out".to_string()), None).unwrap();
        assert_eq!(outs, vec!["a.out"]);
    }

    #[test]
    fn test_plural_passes_through() {
        let outs =
            normalize_outputs("r", None, Some(vec!["a".to_string(), "b".to_string()])).unwrap();
        assert_eq!(outs, vec!["a", "b"]);
    }

    #[test]
    fn test_neither_is_empty() {
        assert!(normalize_outputs("r", None, None).unwrap().is_empty());
    }

    #[test]
    fn test_both_is_an_error() {
        let err = normalize_outputs(
            "r",
            Some("a".to_string()),
            Some(vec!["b".to_string()]),
        )
        .unwrap_err();
        assert_eq!(
            err,
            DefineError::ConflictingOutputs {
                rule: "r".to_string()
            }
        );
    }

    #[test]
    fn test_binary_cardinality() {
        let two = vec!["a".to_string(), "b".to_string()];
        assert!(check_binary_outputs("r", false, &two).is_ok());
        assert_eq!(
            check_binary_outputs("r", true, &two).unwrap_err(),
            DefineError::BinaryOutputs {
                rule: "r".to_string(),
                count: 2
            }
        );

        let one = vec!["a".to_string()];
        assert!(check_binary_outputs("r", true, &one).is_ok());
        assert!(check_binary_outputs("r", true, &[]).is_ok());
    }
}
