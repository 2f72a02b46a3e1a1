//! Graph rewriting for opcheck.
//!
//! This crate rebuilds operator graphs node by node and rewrites calls on the
//! way through:
//! - [`ExportInterpreter`] retraces an [`IrGraph`] through an [`ExportPass`],
//!   optionally recomputing every node's example value on abstract tensors
//! - [`ReplaceViewOpsWithViewCopyOpsPass`] swaps aliasing view operators for
//!   their non-aliasing `*_copy` variants
//! - [`PassManager`] runs [`Pass`] objects in stage order:
//!   1. **Functionalization** - rewrite aliasing operators
//!   2. **Propagation** - recompute example values
//!
//! # Example
//!
//! ```no_run
//! use opcheck_passes::{ExportInterpreter, ReplaceViewOpsWithViewCopyOpsPass};
//! # fn main() -> opcheck_core::Result<()> {
//! # let graph = opcheck_core::IrGraph::new();
//! let registry = opcheck_aten::aten_registry()?;
//! let rewritten = ExportInterpreter::new(&registry)
//!     .retrace(&graph, &ReplaceViewOpsWithViewCopyOpsPass::new())?;
//! println!("{rewritten}");
//! # Ok(())
//! # }
//! ```

pub mod export;
pub mod passes;

pub use export::{ExportInterpreter, ExportPass, IdentityPass, PassHost};
pub use passes::{
    MetadataPropagationPass, ReplaceViewOpsWithViewCopyOpsPass, RetracePass,
    get_view_copy_of_view_op, is_view_op,
};

pub use opcheck_core::{IrGraph, Pass, Stage};

use opcheck_core::{AbstractSubstrate, Result, SchemaRegistry};
use std::sync::Arc;

/// Ordered collection of graph passes.
///
/// Passes run sorted by [`Stage`]; within a stage they run in the order they
/// were added.
pub struct PassManager {
    passes: Vec<Box<dyn Pass>>,
}

impl PassManager {
    /// Create an empty manager.
    pub fn new() -> Self {
        Self { passes: Vec::new() }
    }

    /// The standard pipeline: the view-copy rewrite followed, when a fake
    /// mode is given, by example-value propagation.
    pub fn functionalize(
        registry: Arc<dyn SchemaRegistry>,
        fake_mode: Option<Arc<dyn AbstractSubstrate>>,
    ) -> Self {
        let mut manager = Self::new();
        manager.add_pass(RetracePass::new(
            ReplaceViewOpsWithViewCopyOpsPass::new(),
            registry.clone(),
        ));
        if let Some(fake_mode) = fake_mode {
            manager.add_pass(MetadataPropagationPass::new(registry, fake_mode));
        }
        manager
    }

    /// Add a pass. It runs in the stage reported by `pass.stage()`.
    pub fn add_pass(&mut self, pass: impl Pass + 'static) -> &mut Self {
        self.passes.push(Box::new(pass));
        self
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    /// Run every pass over `graph`.
    ///
    /// Returns `true` if any pass changed the graph. Stops at the first
    /// failing pass; the graph then holds the result of the passes before it.
    #[tracing::instrument(skip_all, fields(num_nodes = graph.node_count(), num_passes = self.passes.len()))]
    pub fn run(&mut self, graph: &mut IrGraph) -> Result<bool> {
        self.passes.sort_by_key(|p| p.stage());

        let mut changed = false;
        for pass in &self.passes {
            let _span =
                tracing::debug_span!("pass", name = pass.name(), stage = ?pass.stage()).entered();
            changed |= pass.run(graph)?;
        }
        Ok(changed)
    }
}

impl Default for PassManager {
    fn default() -> Self {
        Self::new()
    }
}
