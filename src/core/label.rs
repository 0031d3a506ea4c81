//! Rule identity - WHICH rule (declaring package + name).
//!
//! RuleRef uniquely identifies a rule in the build graph. It's interned
//! for cheap comparison and cloning.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{LazyLock, RwLock};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::core::error::DefineError;

/// Global rule reference interner
static LABEL_INTERNER: LazyLock<RwLock<HashMap<RuleRefInner, &'static RuleRefInner>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// A unique reference to a build rule (interned).
///
/// RuleRefs are cheap to clone and compare (pointer comparison). They
/// combine the declaring package path and the rule name, the two parts
/// that identify a rule in the graph. The root package has the empty
/// path, so its rules display as `//:name`.
#[derive(Clone, Copy)]
pub struct RuleRef {
    inner: &'static RuleRefInner,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RuleRefInner {
    package: String,
    name: String,
}

impl RuleRef {
    /// Create a new rule reference.
    pub fn new(package: impl Into<String>, name: impl Into<String>) -> Self {
        let inner = RuleRefInner {
            package: package.into(),
            name: name.into(),
        };

        Self::intern(inner)
    }

    fn intern(inner: RuleRefInner) -> Self {
        // Fast path: check if already interned
        {
            let interner = LABEL_INTERNER.read().unwrap();
            if let Some(&interned) = interner.get(&inner) {
                return RuleRef { inner: interned };
            }
        }

        // Slow path: intern the new reference
        let mut interner = LABEL_INTERNER.write().unwrap();

        // Double-check after acquiring write lock
        if let Some(&interned) = interner.get(&inner) {
            return RuleRef { inner: interned };
        }

        let leaked: &'static RuleRefInner = Box::leak(Box::new(inner.clone()));
        interner.insert(inner, leaked);

        RuleRef { inner: leaked }
    }

    /// Parse a label string relative to the given package.
    ///
    /// Accepted forms:
    /// - `//path/to/pkg:name` - absolute
    /// - `//path/to/pkg` - absolute, name defaults to the last path segment
    /// - `:name` - relative to `current_package`
    pub fn parse(label: &str, current_package: &str) -> Result<Self, DefineError> {
        if let Some(rest) = label.strip_prefix("//") {
            let (package, name) = match rest.split_once(':') {
                Some((pkg, name)) if !name.is_empty() => (pkg, name),
                Some(_) => {
                    return Err(DefineError::InvalidLabel {
                        label: label.to_string(),
                    })
                }
                // //path/to/pkg is shorthand for //path/to/pkg:pkg
                None => match rest.rsplit_once('/') {
                    Some((_, last)) => {
                        if last.is_empty() {
                            return Err(DefineError::InvalidLabel {
                                label: label.to_string(),
                            });
                        }
                        (rest, last)
                    }
                    None => {
                        if rest.is_empty() {
                            return Err(DefineError::InvalidLabel {
                                label: label.to_string(),
                            });
                        }
                        (rest, rest)
                    }
                },
            };
            Ok(RuleRef::new(package, name))
        } else if let Some(name) = label.strip_prefix(':') {
            if name.is_empty() {
                return Err(DefineError::InvalidLabel {
                    label: label.to_string(),
                });
            }
            Ok(RuleRef::new(current_package, name))
        } else {
            Err(DefineError::InvalidLabel {
                label: label.to_string(),
            })
        }
    }

    /// Check whether a string is a label (as opposed to a file path).
    pub fn is_label(s: &str) -> bool {
        s.starts_with("//") || s.starts_with(':')
    }

    /// Get the declaring package path. Empty for the root package.
    pub fn package(&self) -> &'static str {
        &self.inner.package
    }

    /// Get the rule name.
    pub fn name(&self) -> &'static str {
        &self.inner.name
    }
}

impl PartialEq for RuleRef {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.inner, other.inner)
    }
}

impl Eq for RuleRef {}

impl Hash for RuleRef {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(self.inner, state)
    }
}

impl PartialOrd for RuleRef {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RuleRef {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.inner
            .package
            .cmp(&other.inner.package)
            .then_with(|| self.inner.name.cmp(&other.inner.name))
    }
}

impl fmt::Debug for RuleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RuleRef({})", self)
    }
}

impl fmt::Display for RuleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "//{}:{}", self.inner.package, self.inner.name)
    }
}

impl Serialize for RuleRef {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RuleRef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        RuleRef::parse(&s, "").map_err(serde::de::Error::custom)
    }
}
