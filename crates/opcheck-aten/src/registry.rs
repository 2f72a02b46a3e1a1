//! Kernel registry for the `aten` catalog.

use opcheck_core::OpId;

use crate::families::{BinaryElementwiseOp, ReductionOp, UnaryElementwiseOp};
use crate::kernel::KernelRegistry;
use crate::operators::{
    AliasKernel, CloneKernel, ExpandKernel, ItemKernel, MetadataKernel, NonzeroKernel,
    PermuteKernel, ReshapeKernel, SelectKernel, SliceKernel, SplitKernel, SqueezeKernel, TKernel,
    TransposeKernel, UnbindKernel, UnsqueezeKernel, ViewCopyKernel, ViewKernel,
};

/// Returns a kernel registry covering every executable catalog operator.
///
/// Each view with a `_copy` counterpart is registered twice: once as the
/// view itself and once wrapped in `ViewCopyKernel`.
pub fn aten_kernels() -> KernelRegistry {
    let mut kernels = KernelRegistry::new();
    let op = OpId::aten;

    // Views and their copies
    kernels
        .register(op("view", ""), ViewKernel)
        .register(op("view_copy", ""), ViewCopyKernel::new(ViewKernel))
        .register(op("_unsafe_view", ""), ViewKernel)
        .register(op("reshape", ""), ReshapeKernel)
        .register(op("transpose", "int"), TransposeKernel)
        .register(op("transpose_copy", "int"), ViewCopyKernel::new(TransposeKernel))
        .register(op("permute", ""), PermuteKernel)
        .register(op("permute_copy", ""), ViewCopyKernel::new(PermuteKernel))
        .register(op("t", ""), TKernel)
        .register(op("t_copy", ""), ViewCopyKernel::new(TKernel))
        .register(op("expand", ""), ExpandKernel)
        .register(op("expand_copy", ""), ViewCopyKernel::new(ExpandKernel))
        .register(op("unsqueeze", ""), UnsqueezeKernel)
        .register(op("unsqueeze_copy", ""), ViewCopyKernel::new(UnsqueezeKernel))
        .register(op("squeeze", "dim"), SqueezeKernel)
        .register(op("squeeze", "dims"), SqueezeKernel)
        .register(op("squeeze_copy", "dim"), ViewCopyKernel::new(SqueezeKernel))
        .register(op("select", "int"), SelectKernel)
        .register(op("select_copy", "int"), ViewCopyKernel::new(SelectKernel))
        .register(op("slice", "Tensor"), SliceKernel)
        .register(op("slice_copy", "Tensor"), ViewCopyKernel::new(SliceKernel))
        .register(op("split", "Tensor"), SplitKernel)
        .register(op("split_copy", "Tensor"), ViewCopyKernel::new(SplitKernel))
        .register(op("unbind", "int"), UnbindKernel)
        .register(op("unbind_copy", "int"), ViewCopyKernel::new(UnbindKernel))
        .register(op("alias", ""), AliasKernel)
        .register(op("alias_copy", ""), ViewCopyKernel::new(AliasKernel))
        .register(op("detach", ""), AliasKernel)
        .register(op("detach_copy", ""), ViewCopyKernel::new(AliasKernel))
        .register(op("real", ""), AliasKernel);

    // In-place views return the re-laid-out alias
    kernels
        .register(op("transpose_", ""), TransposeKernel)
        .register(op("unsqueeze_", ""), UnsqueezeKernel);

    // Pointwise
    kernels
        .register(op("add", "Tensor"), BinaryElementwiseOp::add())
        .register(op("sub", "Tensor"), BinaryElementwiseOp::sub())
        .register(op("mul", "Tensor"), BinaryElementwiseOp::mul())
        .register(op("div", "Tensor"), BinaryElementwiseOp::div())
        .register(op("relu", ""), UnaryElementwiseOp::relu())
        .register(op("neg", ""), UnaryElementwiseOp::neg())
        .register(op("abs", ""), UnaryElementwiseOp::abs());

    // Reductions and copies
    kernels
        .register(op("sum", ""), ReductionOp::sum())
        .register(op("sum", "dim_IntList"), ReductionOp::sum())
        .register(op("mean", ""), ReductionOp::mean())
        .register(op("mean", "dim"), ReductionOp::mean())
        .register(op("clone", ""), CloneKernel);

    // Data-dependent
    kernels
        .register(op("nonzero", ""), NonzeroKernel)
        .register(op("item", ""), ItemKernel)
        .register(op("_local_scalar_dense", ""), ItemKernel);

    // Metadata queries
    kernels
        .register(op("sym_size", "int"), MetadataKernel::size())
        .register(op("sym_stride", "int"), MetadataKernel::stride())
        .register(op("sym_numel", ""), MetadataKernel::numel());

    // Lifting
    kernels
        .register(op("lift_fresh", ""), AliasKernel)
        .register(op("lift_fresh_copy", ""), CloneKernel);

    kernels
}
