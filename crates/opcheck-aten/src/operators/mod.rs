//! Individual operator kernels.

mod copy;
mod data_dependent;
mod indexing;
mod layout;
mod metadata;
mod view;

pub use copy::{CloneKernel, ViewCopyKernel};
pub use data_dependent::{ItemKernel, NonzeroKernel};
pub use indexing::{SelectKernel, SliceKernel, SplitKernel, UnbindKernel};
pub use layout::{
    AliasKernel, ExpandKernel, PermuteKernel, SqueezeKernel, TKernel, TransposeKernel,
    UnsqueezeKernel,
};
pub use metadata::{MetadataKernel, MetadataQuery};
pub use view::{ReshapeKernel, ViewKernel};
