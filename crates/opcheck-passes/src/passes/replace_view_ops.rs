//! Replace aliasing view operators with their `*_copy` counterparts.
//!
//! A view's result shares storage with its input; downstream consumers that
//! cannot reason about aliasing want the non-aliasing `*_copy` variant
//! instead. Resolution for each call is a strict priority chain:
//!
//! 1. the static substitution table,
//! 2. the exclusion set (left unchanged),
//! 3. derivation from the schema: `aten::<name>.<overload>` whose first
//!    argument aliases becomes `aten::<name>_copy.<overload>` if that
//!    overload is registered.
//!
//! Failed lookups leave the operator unchanged and are never errors.

use opcheck_core::{
    FunctionSchema, IrNodeId, NodeArg, NodeMeta, OpFamily, OpId, Result, SchemaRegistry,
    op::DEFAULT_OVERLOAD,
};
use std::collections::{BTreeMap, HashMap};

use crate::export::{ExportPass, PassHost};

/// Whether `schema` describes a view: its first argument carries alias info.
pub fn is_view_op(schema: &FunctionSchema) -> bool {
    schema
        .arguments
        .first()
        .is_some_and(|arg| arg.alias_info.is_some())
}

/// Look up the `*_copy` overload matching a view schema.
///
/// Only `aten` operators are considered. An empty overload name maps to the
/// default overload; any other overload name is kept verbatim.
pub fn get_view_copy_of_view_op(
    schema: &FunctionSchema,
    registry: &dyn SchemaRegistry,
) -> Option<OpId> {
    if schema.namespace() != "aten" {
        return None;
    }
    let copy_name = format!("{}_copy", schema.base_name());
    let family = registry.overload_family("aten", &copy_name)?;
    let overload = if schema.overload_name.is_empty() {
        DEFAULT_OVERLOAD
    } else {
        schema.overload_name.as_str()
    };
    family.overload(overload).cloned()
}

/// Rewrites view calls into non-aliasing copies during a retrace.
pub struct ReplaceViewOpsWithViewCopyOpsPass {
    substitutions: HashMap<OpId, OpId>,
    excluded: Vec<OpFamily>,
}

impl ReplaceViewOpsWithViewCopyOpsPass {
    pub fn new() -> Self {
        Self {
            substitutions: HashMap::from([(
                OpId::aten("_unsafe_view", ""),
                OpId::aten("view_copy", ""),
            )]),
            excluded: vec![
                OpFamily::aten("sym_size"),
                OpFamily::aten("sym_stride"),
                OpFamily::aten("sym_numel"),
            ],
        }
    }

    /// Fixed replacements that take priority over everything else.
    pub fn substitutions(&self) -> &HashMap<OpId, OpId> {
        &self.substitutions
    }

    /// Operator families that are never rewritten.
    pub fn excluded(&self) -> &[OpFamily] {
        &self.excluded
    }

    /// The operator a call to `op` should be replaced with.
    ///
    /// Returns `op` itself when no replacement applies.
    pub fn resolve_op(&self, op: &OpId, registry: &dyn SchemaRegistry) -> OpId {
        if let Some(substitute) = self.substitutions.get(op) {
            return substitute.clone();
        }
        if self.excluded.iter().any(|family| family.contains(op)) {
            return op.clone();
        }

        let Some(schema) = registry.schema(op) else {
            tracing::trace!(op = %op, "No schema registered; keeping operator");
            return op.clone();
        };
        if !is_view_op(schema) {
            return op.clone();
        }
        match get_view_copy_of_view_op(schema, registry) {
            Some(copy) => copy,
            None => {
                tracing::trace!(op = %op, "View has no registered copy variant");
                op.clone()
            }
        }
    }

    /// Resolve one call. Arguments and metadata pass through untouched.
    pub fn resolve(
        &self,
        op: &OpId,
        args: Vec<NodeArg>,
        kwargs: BTreeMap<String, NodeArg>,
        meta: NodeMeta,
        registry: &dyn SchemaRegistry,
    ) -> (OpId, Vec<NodeArg>, BTreeMap<String, NodeArg>, NodeMeta) {
        (self.resolve_op(op, registry), args, kwargs, meta)
    }
}

impl Default for ReplaceViewOpsWithViewCopyOpsPass {
    fn default() -> Self {
        Self::new()
    }
}

impl ExportPass for ReplaceViewOpsWithViewCopyOpsPass {
    fn name(&self) -> &str {
        "replace_view_ops_with_view_copy_ops"
    }

    fn call_operator(
        &self,
        op: &OpId,
        args: Vec<NodeArg>,
        kwargs: BTreeMap<String, NodeArg>,
        meta: NodeMeta,
        host: &mut dyn PassHost,
    ) -> Result<IrNodeId> {
        let (resolved, args, kwargs, meta) = self.resolve(op, args, kwargs, meta, host.registry());
        if &resolved != op {
            tracing::debug!(from = %op, to = %resolved, "Replacing view op with view_copy op");
        }
        host.delegate(resolved, args, kwargs, meta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opcheck_core::{Error, OperatorRegistry};

    fn registry(schemas: &[&str]) -> OperatorRegistry {
        let mut registry = OperatorRegistry::new();
        for schema in schemas {
            registry.register(schema, &[]).unwrap();
        }
        registry
    }

    /// Records every delegated call instead of building a graph.
    struct RecordingHost<'a> {
        registry: &'a dyn SchemaRegistry,
        delegated: Vec<OpId>,
    }

    impl PassHost for RecordingHost<'_> {
        fn delegate(
            &mut self,
            op: OpId,
            _args: Vec<NodeArg>,
            _kwargs: BTreeMap<String, NodeArg>,
            _meta: NodeMeta,
        ) -> Result<IrNodeId> {
            self.delegated.push(op);
            Ok(IrNodeId::new(self.delegated.len() - 1))
        }

        fn registry(&self) -> &dyn SchemaRegistry {
            self.registry
        }
    }

    #[test]
    fn test_transpose_resolves_to_transpose_copy() {
        let registry = registry(&[
            "aten::transpose.int(Tensor(a) self, int dim0, int dim1) -> Tensor(a)",
            "aten::transpose_copy.int(Tensor self, int dim0, int dim1) -> Tensor",
        ]);
        let pass = ReplaceViewOpsWithViewCopyOpsPass::new();
        assert_eq!(
            pass.resolve_op(&OpId::aten("transpose", "int"), &registry),
            OpId::aten("transpose_copy", "int")
        );
    }

    #[test]
    fn test_empty_overload_maps_to_default() {
        let registry = registry(&[
            "aten::t(Tensor(a) self) -> Tensor(a)",
            "aten::t_copy(Tensor self) -> Tensor",
        ]);
        let pass = ReplaceViewOpsWithViewCopyOpsPass::new();
        assert_eq!(
            pass.resolve_op(&OpId::aten("t", ""), &registry),
            OpId::aten("t_copy", "default")
        );
    }

    #[test]
    fn test_static_substitution_wins() {
        // No schemas at all: the table alone decides.
        let registry = OperatorRegistry::new();
        let pass = ReplaceViewOpsWithViewCopyOpsPass::new();
        assert_eq!(
            pass.resolve_op(&OpId::aten("_unsafe_view", ""), &registry),
            OpId::aten("view_copy", "default")
        );
    }

    #[test]
    fn test_excluded_families_are_kept() {
        // Even a sym_size that looks like a view with a copy variant.
        let registry = registry(&[
            "aten::sym_size.int(Tensor(a) self, int dim) -> SymInt",
            "aten::sym_size_copy.int(Tensor self, int dim) -> SymInt",
        ]);
        let pass = ReplaceViewOpsWithViewCopyOpsPass::new();
        let op = OpId::aten("sym_size", "int");
        assert_eq!(pass.resolve_op(&op, &registry), op);
    }

    #[test]
    fn test_non_views_and_missing_lookups_are_kept() {
        let registry = registry(&[
            "aten::add.Tensor(Tensor self, Tensor other, *, Scalar alpha=1) -> Tensor",
            "aten::real(Tensor(a) self) -> Tensor(a)",
            "aten::squeeze.dims(Tensor(a) self, int[] dim) -> Tensor(a)",
            "aten::squeeze_copy.dim(Tensor self, int dim) -> Tensor",
            "aten::size() -> int",
            "custom::view(Tensor(a) self, SymInt[] size) -> Tensor(a)",
            "custom::view_copy(Tensor self, SymInt[] size) -> Tensor",
        ]);
        let pass = ReplaceViewOpsWithViewCopyOpsPass::new();
        for op in [
            OpId::aten("add", "Tensor"),
            // no real_copy family
            OpId::aten("real", ""),
            // family exists, overload does not
            OpId::aten("squeeze", "dims"),
            // zero arguments
            OpId::aten("size", ""),
            // not aten
            OpId::new("custom", "view", ""),
            // not registered at all
            OpId::aten("mystery", ""),
        ] {
            assert_eq!(pass.resolve_op(&op, &registry), op, "{op}");
        }
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let registry = registry(&[
            "aten::view(Tensor(a) self, SymInt[] size) -> Tensor(a)",
            "aten::view_copy(Tensor self, SymInt[] size) -> Tensor",
            "aten::sym_numel(Tensor self) -> SymInt",
        ]);
        let pass = ReplaceViewOpsWithViewCopyOpsPass::new();
        for op in [
            OpId::aten("view", ""),
            OpId::aten("_unsafe_view", ""),
            OpId::aten("sym_numel", ""),
        ] {
            let once = pass.resolve_op(&op, &registry);
            assert_eq!(pass.resolve_op(&once, &registry), once);
        }
    }

    #[test]
    fn test_resolve_passes_payload_through() {
        let registry = registry(&[
            "aten::t(Tensor(a) self) -> Tensor(a)",
            "aten::t_copy(Tensor self) -> Tensor",
        ]);
        let pass = ReplaceViewOpsWithViewCopyOpsPass::new();
        let args = vec![NodeArg::Node(IrNodeId::new(0)), NodeArg::int(3)];
        let mut kwargs = BTreeMap::new();
        kwargs.insert("dim".to_string(), NodeArg::int(1));
        let meta = NodeMeta {
            val: None,
            stack_trace: Some("model.py:10".to_string()),
        };

        let (op, out_args, out_kwargs, out_meta) = pass.resolve(
            &OpId::aten("t", ""),
            args.clone(),
            kwargs.clone(),
            meta,
            &registry,
        );
        assert_eq!(op, OpId::aten("t_copy", ""));
        assert_eq!(out_args, args);
        assert_eq!(out_kwargs, kwargs);
        assert_eq!(out_meta.stack_trace.as_deref(), Some("model.py:10"));
    }

    #[test]
    fn test_call_operator_delegates_exactly_once() {
        let registry = registry(&[
            "aten::t(Tensor(a) self) -> Tensor(a)",
            "aten::t_copy(Tensor self) -> Tensor",
        ]);
        let pass = ReplaceViewOpsWithViewCopyOpsPass::new();
        let mut host = RecordingHost {
            registry: &registry,
            delegated: Vec::new(),
        };

        for op in [OpId::aten("t", ""), OpId::aten("relu", "")] {
            pass.call_operator(&op, Vec::new(), BTreeMap::new(), NodeMeta::default(), &mut host)
                .unwrap();
        }
        assert_eq!(
            host.delegated,
            vec![OpId::aten("t_copy", ""), OpId::aten("relu", "")]
        );
    }

    #[test]
    fn test_delegate_error_propagates() {
        struct FailingHost(OperatorRegistry);

        impl PassHost for FailingHost {
            fn delegate(
                &mut self,
                op: OpId,
                _args: Vec<NodeArg>,
                _kwargs: BTreeMap<String, NodeArg>,
                _meta: NodeMeta,
            ) -> Result<IrNodeId> {
                Err(Error::InvalidGraph(format!("cannot add {op}")))
            }

            fn registry(&self) -> &dyn SchemaRegistry {
                &self.0
            }
        }

        let pass = ReplaceViewOpsWithViewCopyOpsPass::new();
        let mut host = FailingHost(OperatorRegistry::new());
        let result = pass.call_operator(
            &OpId::aten("relu", ""),
            Vec::new(),
            BTreeMap::new(),
            NodeMeta::default(),
            &mut host,
        );
        assert!(matches!(result, Err(Error::InvalidGraph(_))));
    }
}
