//! The cross-checking dispatcher.

use opcheck_core::{
    AbstractSubstrate, Dispatcher, Error, Kwargs, OpId, Result, SchemaRegistry, Tag, Value,
    call_tensors, map_call_tensors,
};

use crate::compare::compare_results;

/// Predicate selecting operators that are never cross-checked.
pub type IgnoreOp = Box<dyn Fn(&OpId) -> bool + Send + Sync>;

/// Tags whose operators cannot be predicted from metadata alone.
const UNCHECKABLE_TAGS: [Tag; 3] = [
    Tag::DynamicOutputShape,
    Tag::InplaceView,
    Tag::DataDependentOutput,
];

/// Why a call was not cross-checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// One of the built-in exclusions.
    Excluded,

    /// Selected by the caller's ignore predicate.
    Ignored,

    /// Carries a tag that rules out abstract prediction.
    Tagged(Tag),

    /// The abstract substrate cannot run this call.
    Unsupported(String),
}

/// What happened to the abstract side of one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Results agreed; `tensors` pairs were compared.
    Verified { tensors: usize },

    /// No abstract run took place, or its result was discarded.
    Skipped(SkipReason),
}

/// A [`Dispatcher`] that checks every call against abstract execution.
///
/// Returns the real result unchanged when the check passes or is skipped.
pub struct CrossRefFakeMode<'a> {
    real: &'a dyn Dispatcher,
    fake: &'a dyn AbstractSubstrate,
    registry: &'a dyn SchemaRegistry,
    ignore_op: IgnoreOp,
    excluded: Vec<OpId>,
}

impl<'a> CrossRefFakeMode<'a> {
    pub fn new(
        real: &'a dyn Dispatcher,
        fake: &'a dyn AbstractSubstrate,
        registry: &'a dyn SchemaRegistry,
    ) -> Self {
        Self {
            real,
            fake,
            registry,
            ignore_op: Box::new(|_| false),
            excluded: vec![
                OpId::aten("lift_fresh", ""),
                OpId::aten("lift_fresh_copy", ""),
                OpId::aten("set_", "source_Storage_storage_offset"),
            ],
        }
    }

    /// Never cross-check operators matching `ignore_op`.
    pub fn with_ignore_op(mut self, ignore_op: impl Fn(&OpId) -> bool + Send + Sync + 'static) -> Self {
        self.ignore_op = Box::new(ignore_op);
        self
    }

    /// Operators that are never cross-checked.
    pub fn excluded(&self) -> &[OpId] {
        &self.excluded
    }

    /// Why `op` would not be cross-checked, if it would not.
    pub fn skip_reason(&self, op: &OpId) -> Option<SkipReason> {
        if self.excluded.contains(op) {
            return Some(SkipReason::Excluded);
        }
        if (self.ignore_op)(op) {
            return Some(SkipReason::Ignored);
        }
        let tags = self.registry.tags(op);
        UNCHECKABLE_TAGS
            .into_iter()
            .find(|&tag| tags.contains(tag))
            .map(SkipReason::Tagged)
    }

    /// Run `op` for real, cross-checking it when possible.
    ///
    /// # Errors
    ///
    /// Besides errors of either execution: `AbstractLeak` when an abstract
    /// tensor reaches or leaves the real execution, `ResultStructure` and
    /// `CrossRefMismatch` when the two results disagree.
    pub fn check(&self, op: &OpId, args: &[Value], kwargs: &Kwargs) -> Result<(Value, Outcome)> {
        if let Some(leaked) = call_tensors(args, kwargs).into_iter().find(|t| t.is_abstract()) {
            return Err(Error::AbstractLeak {
                op: op.clone(),
                detail: format!("argument of shape {:?} is abstract", leaked.shape()),
            });
        }

        let shadow = match self.skip_reason(op) {
            Some(reason) => Err(reason),
            None => self.run_abstract(op, args, kwargs)?,
        };

        let real = self.real.call(op, args, kwargs)?;
        if let Some(leaked) = real.tensors().into_iter().find(|t| t.is_abstract()) {
            return Err(Error::AbstractLeak {
                op: op.clone(),
                detail: format!("result of shape {:?} is abstract", leaked.shape()),
            });
        }

        let outcome = match shadow {
            Ok(fake) => Outcome::Verified {
                tensors: compare_results(op, &real, &fake)?,
            },
            Err(reason) => {
                tracing::debug!(op = %op, reason = ?reason, "Skipped cross-check");
                Outcome::Skipped(reason)
            }
        };
        Ok((real, outcome))
    }

    /// Run `op` on lifted copies of its arguments in a fresh scope.
    ///
    /// The scope is gone when this returns.
    fn run_abstract(
        &self,
        op: &OpId,
        args: &[Value],
        kwargs: &Kwargs,
    ) -> Result<std::result::Result<Value, SkipReason>> {
        let attempt = (|| {
            let mut scope = self.fake.enter()?;
            let (args, kwargs) = map_call_tensors(args, kwargs, |t| scope.lift(t))?;
            scope.call(op, &args, &kwargs)
        })();

        match attempt {
            Ok(fake) => Ok(Ok(fake)),
            Err(Error::UnsupportedAbstract(reason)) => Ok(Err(SkipReason::Unsupported(reason))),
            Err(e) => Err(e),
        }
    }
}

impl Dispatcher for CrossRefFakeMode<'_> {
    fn call(&self, op: &OpId, args: &[Value], kwargs: &Kwargs) -> Result<Value> {
        let (result, outcome) = self.check(op, args, kwargs)?;
        if let Outcome::Verified { tensors } = outcome {
            tracing::trace!(op = %op, tensors, "Cross-check passed");
        }
        Ok(result)
    }
}
