//! Adapter that runs an [`ExportPass`] as a pipeline [`Pass`].

use opcheck_core::{AbstractSubstrate, IrGraph, Pass, Result, SchemaRegistry, Stage};
use std::sync::Arc;

use crate::export::{ExportInterpreter, ExportPass};

/// Retraces the whole graph through an [`ExportPass`] in the
/// functionalization stage.
///
/// The pass reports a change when any call node ends up with a different
/// target.
pub struct RetracePass<P> {
    pass: P,
    registry: Arc<dyn SchemaRegistry>,
    fake_mode: Option<Arc<dyn AbstractSubstrate>>,
}

impl<P: ExportPass> RetracePass<P> {
    pub fn new(pass: P, registry: Arc<dyn SchemaRegistry>) -> Self {
        Self {
            pass,
            registry,
            fake_mode: None,
        }
    }

    /// Recompute example values while retracing.
    pub fn with_fake_mode(mut self, fake_mode: Arc<dyn AbstractSubstrate>) -> Self {
        self.fake_mode = Some(fake_mode);
        self
    }

    pub fn inner(&self) -> &P {
        &self.pass
    }
}

impl<P: ExportPass> Pass for RetracePass<P> {
    fn name(&self) -> &str {
        self.pass.name()
    }

    fn stage(&self) -> Stage {
        Stage::Functionalization
    }

    fn run(&self, graph: &mut IrGraph) -> Result<bool> {
        let mut interpreter = ExportInterpreter::new(self.registry.as_ref());
        if let Some(fake_mode) = &self.fake_mode {
            interpreter = interpreter.with_fake_mode(fake_mode.as_ref());
        }
        let retraced = interpreter.retrace(graph, &self.pass)?;

        let rewritten = graph
            .call_nodes()
            .zip(retraced.call_nodes())
            .filter(|((_, before), (_, after))| before.target() != after.target())
            .count();
        tracing::debug!(rewritten, "Retraced graph");

        *graph = retraced;
        Ok(rewritten > 0)
    }
}
