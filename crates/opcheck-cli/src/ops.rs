//! Operator catalog listing and view-copy resolution.

use anyhow::{Context, Result};
use opcheck_core::{OpId, OperatorRegistry, SchemaRegistry, TagSet};
use opcheck_passes::{ReplaceViewOpsWithViewCopyOpsPass, is_view_op};
use regex::Regex;

/// One catalog entry as shown by `opcheck ops`.
#[derive(Debug, Clone)]
pub struct OpSummary {
    pub op: OpId,
    pub tags: TagSet,
    pub is_view: bool,

    /// What the view-copy rewrite turns this operator into, if anything.
    pub replacement: Option<OpId>,
}

/// Catalog entries whose qualified name matches `filter`, sorted by name.
pub fn list_ops(
    registry: &OperatorRegistry,
    filter: Option<&str>,
    views_only: bool,
) -> Result<Vec<OpSummary>> {
    let pattern = filter
        .map(Regex::new)
        .transpose()
        .context("Invalid regex pattern")?;
    let pass = ReplaceViewOpsWithViewCopyOpsPass::new();

    let mut ops: Vec<&OpId> = registry.op_ids().collect();
    ops.sort();

    let mut summaries = Vec::new();
    for op in ops {
        if let Some(ref regex) = pattern
            && !regex.is_match(&op.to_string())
        {
            continue;
        }
        let is_view = registry.schema(op).is_some_and(is_view_op);
        if views_only && !is_view {
            continue;
        }

        let resolved = pass.resolve_op(op, registry);
        summaries.push(OpSummary {
            op: op.clone(),
            tags: registry.tags(op),
            is_view,
            replacement: (&resolved != op).then_some(resolved),
        });
    }
    Ok(summaries)
}

/// Resolve each operator through the view-copy rewrite.
///
/// Unknown operators are not an error; they resolve to themselves.
pub fn resolve_ops(registry: &OperatorRegistry, names: &[String]) -> Result<Vec<(OpId, OpId)>> {
    let pass = ReplaceViewOpsWithViewCopyOpsPass::new();
    names
        .iter()
        .map(|name| {
            let op = crate::parse_op(name)?;
            let resolved = pass.resolve_op(&op, registry);
            Ok((op, resolved))
        })
        .collect()
}
