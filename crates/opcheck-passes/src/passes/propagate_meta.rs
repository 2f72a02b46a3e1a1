//! Example-value propagation.

use opcheck_core::{AbstractSubstrate, IrGraph, Pass, Result, SchemaRegistry, Stage};
use std::sync::Arc;

use crate::export::{ExportInterpreter, IdentityPass};

/// Recomputes `meta.val` of every call node by running the graph on abstract
/// tensors.
///
/// Placeholders keep their example values; real ones are lifted on use.
/// Nodes the substrate cannot evaluate end up with no example value.
pub struct MetadataPropagationPass {
    registry: Arc<dyn SchemaRegistry>,
    fake_mode: Arc<dyn AbstractSubstrate>,
}

impl MetadataPropagationPass {
    pub fn new(registry: Arc<dyn SchemaRegistry>, fake_mode: Arc<dyn AbstractSubstrate>) -> Self {
        Self {
            registry,
            fake_mode,
        }
    }
}

impl Pass for MetadataPropagationPass {
    fn name(&self) -> &str {
        "propagate_meta"
    }

    fn stage(&self) -> Stage {
        Stage::Propagation
    }

    fn run(&self, graph: &mut IrGraph) -> Result<bool> {
        let retraced = ExportInterpreter::new(self.registry.as_ref())
            .with_fake_mode(self.fake_mode.as_ref())
            .retrace(graph, &IdentityPass)?;

        let computed = retraced
            .call_nodes()
            .filter(|(_, node)| node.meta.val.is_some())
            .count();
        tracing::debug!(
            computed,
            calls = retraced.call_nodes().count(),
            "Propagated example values"
        );

        *graph = retraced;
        Ok(computed > 0)
    }
}
