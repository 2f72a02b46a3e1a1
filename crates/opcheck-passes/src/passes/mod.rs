//! Graph passes.

mod propagate_meta;
mod replace_view_ops;
mod retrace;

pub use propagate_meta::MetadataPropagationPass;
pub use replace_view_ops::{
    ReplaceViewOpsWithViewCopyOpsPass, get_view_copy_of_view_op, is_view_op,
};
pub use retrace::RetracePass;
