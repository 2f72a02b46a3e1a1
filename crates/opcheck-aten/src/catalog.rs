//! The `aten` operator catalog.
//!
//! Schemas are written in the operator library's own notation; tags carry
//! the properties that callers filter on.

use opcheck_core::{OperatorRegistry, Result, Tag};

/// Schema declarations and tags of every catalog operator.
pub const ATEN_SCHEMAS: &[(&str, &[Tag])] = &[
    // Views and their non-aliasing counterparts
    ("aten::view(Tensor(a) self, SymInt[] size) -> Tensor(a)", &[Tag::Core]),
    ("aten::view_copy(Tensor self, SymInt[] size) -> Tensor", &[Tag::ViewCopy]),
    ("aten::_unsafe_view(Tensor self, SymInt[] size) -> Tensor", &[]),
    ("aten::reshape(Tensor(a) self, SymInt[] shape) -> Tensor(a)", &[]),
    ("aten::transpose.int(Tensor(a) self, int dim0, int dim1) -> Tensor(a)", &[]),
    ("aten::transpose_copy.int(Tensor self, int dim0, int dim1) -> Tensor", &[Tag::ViewCopy]),
    ("aten::permute(Tensor(a) self, int[] dims) -> Tensor(a)", &[Tag::Core]),
    ("aten::permute_copy(Tensor self, int[] dims) -> Tensor", &[Tag::ViewCopy]),
    ("aten::t(Tensor(a) self) -> Tensor(a)", &[]),
    ("aten::t_copy(Tensor self) -> Tensor", &[Tag::ViewCopy]),
    (
        "aten::expand(Tensor(a) self, SymInt[] size, *, bool implicit=False) -> Tensor(a)",
        &[Tag::Core],
    ),
    (
        "aten::expand_copy(Tensor self, SymInt[] size, *, bool implicit=False) -> Tensor",
        &[Tag::ViewCopy],
    ),
    ("aten::unsqueeze(Tensor(a) self, int dim) -> Tensor(a)", &[Tag::Core]),
    ("aten::unsqueeze_copy(Tensor self, int dim) -> Tensor", &[Tag::ViewCopy]),
    ("aten::squeeze.dim(Tensor(a) self, int dim) -> Tensor(a)", &[Tag::Core]),
    ("aten::squeeze_copy.dim(Tensor self, int dim) -> Tensor", &[Tag::ViewCopy]),
    ("aten::squeeze.dims(Tensor(a) self, int[] dim) -> Tensor(a)", &[Tag::Core]),
    ("aten::select.int(Tensor(a) self, int dim, SymInt index) -> Tensor(a)", &[Tag::Core]),
    ("aten::select_copy.int(Tensor self, int dim, SymInt index) -> Tensor", &[Tag::ViewCopy]),
    (
        "aten::slice.Tensor(Tensor(a) self, int dim=0, SymInt? start=None, SymInt? end=None, SymInt step=1) -> Tensor(a)",
        &[Tag::Core],
    ),
    (
        "aten::slice_copy.Tensor(Tensor self, int dim=0, SymInt? start=None, SymInt? end=None, SymInt step=1) -> Tensor",
        &[Tag::ViewCopy],
    ),
    (
        "aten::split.Tensor(Tensor(a -> *) self, SymInt split_size, int dim=0) -> Tensor(a)[]",
        &[Tag::Core],
    ),
    (
        "aten::split_copy.Tensor(Tensor self, SymInt split_size, int dim=0) -> Tensor[]",
        &[Tag::ViewCopy],
    ),
    ("aten::unbind.int(Tensor(a -> *) self, int dim=0) -> Tensor(a)[]", &[]),
    ("aten::unbind_copy.int(Tensor self, int dim=0) -> Tensor[]", &[Tag::ViewCopy]),
    ("aten::alias(Tensor(a) self) -> Tensor(a)", &[Tag::Core]),
    ("aten::alias_copy(Tensor self) -> Tensor", &[Tag::ViewCopy]),
    ("aten::detach(Tensor(a) self) -> Tensor(a)", &[]),
    ("aten::detach_copy(Tensor self) -> Tensor", &[Tag::ViewCopy]),
    ("aten::real(Tensor(a) self) -> Tensor(a)", &[]),
    // In-place views
    (
        "aten::transpose_(Tensor(a!) self, int dim0, int dim1) -> Tensor(a!)",
        &[Tag::InplaceView],
    ),
    ("aten::unsqueeze_(Tensor(a!) self, int dim) -> Tensor(a!)", &[Tag::InplaceView]),
    // Pointwise
    (
        "aten::add.Tensor(Tensor self, Tensor other, *, Scalar alpha=1) -> Tensor",
        &[Tag::Core, Tag::PointwiseOp],
    ),
    (
        "aten::sub.Tensor(Tensor self, Tensor other, *, Scalar alpha=1) -> Tensor",
        &[Tag::Core, Tag::PointwiseOp],
    ),
    ("aten::mul.Tensor(Tensor self, Tensor other) -> Tensor", &[Tag::Core, Tag::PointwiseOp]),
    ("aten::div.Tensor(Tensor self, Tensor other) -> Tensor", &[Tag::Core, Tag::PointwiseOp]),
    ("aten::relu(Tensor self) -> Tensor", &[Tag::Core, Tag::PointwiseOp]),
    ("aten::neg(Tensor self) -> Tensor", &[Tag::Core, Tag::PointwiseOp]),
    ("aten::abs(Tensor self) -> Tensor", &[Tag::Core, Tag::PointwiseOp]),
    // Reductions and copies
    ("aten::sum(Tensor self, *, ScalarType? dtype=None) -> Tensor", &[Tag::Core]),
    (
        "aten::sum.dim_IntList(Tensor self, int[1]? dim, bool keepdim=False, *, ScalarType? dtype=None) -> Tensor",
        &[Tag::Core],
    ),
    ("aten::mean(Tensor self, *, ScalarType? dtype=None) -> Tensor", &[Tag::Core]),
    (
        "aten::mean.dim(Tensor self, int[1]? dim, bool keepdim=False, *, ScalarType? dtype=None) -> Tensor",
        &[Tag::Core],
    ),
    (
        "aten::clone(Tensor self, *, MemoryFormat? memory_format=None) -> Tensor",
        &[Tag::Core],
    ),
    // Data-dependent results
    ("aten::nonzero(Tensor self) -> Tensor", &[Tag::Core, Tag::DynamicOutputShape]),
    ("aten::item(Tensor self) -> Scalar", &[Tag::DataDependentOutput]),
    ("aten::_local_scalar_dense(Tensor self) -> Scalar", &[Tag::DataDependentOutput]),
    // Metadata queries
    ("aten::sym_size.int(Tensor self, int dim) -> SymInt", &[Tag::Core]),
    ("aten::sym_stride.int(Tensor self, int dim) -> SymInt", &[Tag::Core]),
    ("aten::sym_numel(Tensor self) -> SymInt", &[Tag::Core]),
    // Lifting and storage
    ("aten::lift_fresh(Tensor(a) self) -> Tensor(a)", &[]),
    ("aten::lift_fresh_copy(Tensor self) -> Tensor", &[]),
    (
        "aten::set_.source_Storage_storage_offset(Tensor(a!) self, Storage source, SymInt storage_offset, SymInt[] size, SymInt[] stride=[]) -> Tensor(a!)",
        &[],
    ),
];

/// Returns a registry pre-populated with the `aten` catalog.
pub fn aten_registry() -> Result<OperatorRegistry> {
    let mut registry = OperatorRegistry::new();
    for (schema, tags) in ATEN_SCHEMAS {
        registry.register(schema, tags)?;
    }
    Ok(registry)
}
