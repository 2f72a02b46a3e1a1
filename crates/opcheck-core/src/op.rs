//! Operator identity.
//!
//! An [`OpId`] names one concrete overload (`aten::transpose.int`), an
//! [`OpFamily`] names every overload sharing a base name (`aten::transpose`).

use crate::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Overload qualifier used when a schema declares no overload name.
pub const DEFAULT_OVERLOAD: &str = "default";

/// Identifier of one concrete operator overload.
///
/// Immutable once created and usable as a map key. The overload qualifier is
/// never empty: schemas with an empty overload name are registered under
/// [`DEFAULT_OVERLOAD`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OpId {
    namespace: String,
    name: String,
    overload: String,
}

impl OpId {
    /// Create an identifier. An empty `overload` maps to `"default"`.
    pub fn new(namespace: &str, name: &str, overload: &str) -> Self {
        let overload = if overload.is_empty() {
            DEFAULT_OVERLOAD
        } else {
            overload
        };
        Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
            overload: overload.to_string(),
        }
    }

    /// Shorthand for an identifier in the `aten` namespace.
    pub fn aten(name: &str, overload: &str) -> Self {
        Self::new("aten", name, overload)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Base operator name without namespace or overload (`transpose`).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn overload(&self) -> &str {
        &self.overload
    }

    /// Qualified name without the overload (`aten::transpose`).
    pub fn qualified_name(&self) -> String {
        format!("{}::{}", self.namespace, self.name)
    }

    /// The overload family this identifier belongs to.
    pub fn family(&self) -> OpFamily {
        OpFamily::new(&self.namespace, &self.name)
    }
}

impl fmt::Display for OpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}.{}", self.namespace, self.name, self.overload)
    }
}

impl FromStr for OpId {
    type Err = Error;

    /// Parse `ns::name` or `ns::name.overload`.
    fn from_str(s: &str) -> Result<Self> {
        let (namespace, rest) = s
            .split_once("::")
            .ok_or_else(|| Error::Schema(format!("Operator '{s}' is missing a namespace")))?;
        let (name, overload) = rest.split_once('.').unwrap_or((rest, ""));

        if namespace.is_empty() || name.is_empty() {
            return Err(Error::Schema(format!("Malformed operator name '{s}'")));
        }

        Ok(Self::new(namespace, name, overload))
    }
}

/// A family of overloads sharing one qualified base name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OpFamily {
    namespace: String,
    name: String,
}

impl OpFamily {
    pub fn new(namespace: &str, name: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }

    pub fn aten(name: &str) -> Self {
        Self::new("aten", name)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check whether `op` is one of this family's overloads.
    pub fn contains(&self, op: &OpId) -> bool {
        self.namespace == op.namespace && self.name == op.name
    }
}

impl fmt::Display for OpFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.namespace, self.name)
    }
}
