//! Declared operator properties used to gate static analyses.

use crate::{Error, Result};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// A declared property of an operator overload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tag {
    /// Part of the stable core operator set.
    Core,

    /// Output values depend on input data in a way shape inference cannot see.
    DataDependentOutput,

    /// Output shape depends on input data (e.g. `nonzero`).
    DynamicOutputShape,

    /// Mutates the metadata of its input in place (e.g. `transpose_`).
    InplaceView,

    /// Elementwise over broadcast inputs.
    PointwiseOp,

    /// Materializing counterpart of a view op.
    ViewCopy,

    /// Consumes randomness.
    NondeterministicSeeded,
}

impl Tag {
    pub const ALL: [Tag; 7] = [
        Tag::Core,
        Tag::DataDependentOutput,
        Tag::DynamicOutputShape,
        Tag::InplaceView,
        Tag::PointwiseOp,
        Tag::ViewCopy,
        Tag::NondeterministicSeeded,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tag::Core => "core",
            Tag::DataDependentOutput => "data_dependent_output",
            Tag::DynamicOutputShape => "dynamic_output_shape",
            Tag::InplaceView => "inplace_view",
            Tag::PointwiseOp => "pointwise",
            Tag::ViewCopy => "view_copy",
            Tag::NondeterministicSeeded => "nondeterministic_seeded",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Tag::ALL
            .into_iter()
            .find(|tag| tag.as_str() == s)
            .ok_or_else(|| Error::Schema(format!("Unknown tag '{s}'")))
    }
}

/// The set of tags declared for one operator overload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet(BTreeSet<Tag>);

impl TagSet {
    pub fn new() -> Self {
        Self(BTreeSet::new())
    }

    pub fn insert(&mut self, tag: Tag) -> bool {
        self.0.insert(tag)
    }

    pub fn contains(&self, tag: Tag) -> bool {
        self.0.contains(&tag)
    }

    /// Check whether any of `tags` is present.
    pub fn contains_any(&self, tags: &[Tag]) -> bool {
        tags.iter().any(|tag| self.0.contains(tag))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Tag> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Tag> for TagSet {
    fn from_iter<I: IntoIterator<Item = Tag>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<const N: usize> From<[Tag; N]> for TagSet {
    fn from(tags: [Tag; N]) -> Self {
        tags.into_iter().collect()
    }
}

impl fmt::Display for TagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(Tag::as_str).collect();
        write!(f, "[{}]", names.join(", "))
    }
}
