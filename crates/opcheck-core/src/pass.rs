//! Whole-graph passes and the stages they are ordered by.

use crate::Result;
use crate::ir::IrGraph;

/// Pipeline stage of a [`Pass`].
///
/// A pass manager sorts by stage; passes sharing a stage keep registration
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    /// Swap aliasing operators for non-aliasing ones.
    Functionalization,

    /// Refresh `meta.val` on every node by re-running the graph on abstract
    /// tensors.
    Propagation,
}

/// A transformation over a whole [`IrGraph`].
///
/// Dependencies such as schema registries or abstract substrates are owned by
/// the pass, so `run` only sees the graph.
///
/// ```ignore
/// struct CountCalls;
///
/// impl Pass for CountCalls {
///     fn name(&self) -> &str {
///         "count_calls"
///     }
///
///     fn stage(&self) -> Stage {
///         Stage::Propagation
///     }
///
///     fn run(&self, graph: &mut IrGraph) -> Result<bool> {
///         tracing::debug!(calls = graph.call_nodes().count());
///         Ok(false)
///     }
/// }
/// ```
pub trait Pass: Send + Sync {
    /// Name used in log spans.
    fn name(&self) -> &str;

    fn stage(&self) -> Stage;

    /// Transform `graph` in place, returning whether anything changed.
    fn run(&self, graph: &mut IrGraph) -> Result<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Untouched;

    impl Pass for Untouched {
        fn name(&self) -> &str {
            "untouched"
        }

        fn stage(&self) -> Stage {
            Stage::Propagation
        }

        fn run(&self, _graph: &mut IrGraph) -> Result<bool> {
            Ok(false)
        }
    }

    #[test]
    fn test_boxed_pass_reports_no_change() {
        let pass: Box<dyn Pass> = Box::new(Untouched);
        assert_eq!(pass.name(), "untouched");
        assert_eq!(pass.stage(), Stage::Propagation);
        assert!(!pass.run(&mut IrGraph::new()).unwrap());
    }

    #[test]
    fn test_functionalization_sorts_first() {
        let mut stages = vec![Stage::Propagation, Stage::Functionalization];
        stages.sort();
        assert_eq!(stages, [Stage::Functionalization, Stage::Propagation]);
    }
}
