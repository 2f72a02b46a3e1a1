//! Sample calls run through the cross-checker by `opcheck crossref`.

use anyhow::{Context, Result};
use opcheck_core::{Error, Kwargs, OpId, OperatorRegistry, Value};
use opcheck_crossref::{CrossRefFakeMode, Outcome, SkipReason};
use opcheck_runtime::{EagerRuntime, FakeTensorMode};
use regex::Regex;

use crate::rewrite::arange;

/// One operator call with concrete arguments.
pub struct SampleCall {
    pub op: OpId,
    pub args: Vec<Value>,
    pub kwargs: Kwargs,
}

impl SampleCall {
    fn new(op: OpId, args: Vec<Value>) -> Self {
        Self {
            op,
            args,
            kwargs: Kwargs::new(),
        }
    }

    fn with_kwarg(mut self, name: &str, value: Value) -> Self {
        self.kwargs.insert(name.to_string(), value);
        self
    }
}

/// Calls covering views, their copies, pointwise ops, reductions and the
/// operators the cross-checker skips.
pub fn sample_calls() -> Result<Vec<SampleCall>> {
    let matrix = Value::Tensor(arange(&[2, 3])?);
    let cube = Value::Tensor(arange(&[2, 3, 4])?);
    let column = Value::Tensor(arange(&[3, 1])?);
    let vector = Value::Tensor(arange(&[6])?);
    let row = Value::Tensor(arange(&[3])?);
    let single = Value::Tensor(arange(&[1])?);

    let i = Value::int;
    let ints = Value::int_list;
    Ok(vec![
        SampleCall::new(OpId::aten("view", ""), vec![cube.clone(), ints(&[6, 4])]),
        SampleCall::new(OpId::aten("view_copy", ""), vec![cube.clone(), ints(&[4, -1])]),
        SampleCall::new(OpId::aten("_unsafe_view", ""), vec![matrix.clone(), ints(&[3, 2])]),
        SampleCall::new(OpId::aten("reshape", ""), vec![cube.clone(), ints(&[-1])]),
        SampleCall::new(OpId::aten("transpose", "int"), vec![cube.clone(), i(0), i(2)]),
        SampleCall::new(OpId::aten("transpose_copy", "int"), vec![cube.clone(), i(0), i(2)]),
        SampleCall::new(OpId::aten("permute", ""), vec![cube.clone(), ints(&[2, 0, 1])]),
        SampleCall::new(OpId::aten("t", ""), vec![matrix.clone()]),
        SampleCall::new(OpId::aten("t_copy", ""), vec![matrix.clone()]),
        SampleCall::new(OpId::aten("expand", ""), vec![column.clone(), ints(&[2, 3, 4])]),
        SampleCall::new(OpId::aten("unsqueeze", ""), vec![matrix.clone(), i(1)]),
        SampleCall::new(OpId::aten("squeeze", "dim"), vec![column.clone(), i(1)]),
        SampleCall::new(OpId::aten("select", "int"), vec![cube.clone(), i(1), i(-1)]),
        SampleCall::new(OpId::aten("slice", "Tensor"), vec![vector])
            .with_kwarg("start", i(1))
            .with_kwarg("step", i(2)),
        SampleCall::new(OpId::aten("split", "Tensor"), vec![cube.clone(), i(2), i(2)]),
        SampleCall::new(OpId::aten("unbind", "int"), vec![matrix.clone(), i(1)]),
        SampleCall::new(OpId::aten("alias", ""), vec![matrix.clone()]),
        SampleCall::new(OpId::aten("add", "Tensor"), vec![matrix.clone(), row.clone()])
            .with_kwarg("alpha", i(2)),
        SampleCall::new(OpId::aten("div", "Tensor"), vec![matrix.clone(), row]),
        SampleCall::new(OpId::aten("relu", ""), vec![matrix.clone()]),
        SampleCall::new(OpId::aten("sum", "dim_IntList"), vec![cube.clone(), ints(&[1])])
            .with_kwarg("keepdim", Value::bool(true)),
        SampleCall::new(OpId::aten("mean", ""), vec![cube.clone()]),
        SampleCall::new(OpId::aten("clone", ""), vec![matrix.clone()]),
        SampleCall::new(OpId::aten("sym_size", "int"), vec![cube.clone(), i(2)]),
        SampleCall::new(OpId::aten("nonzero", ""), vec![matrix.clone()]),
        SampleCall::new(OpId::aten("item", ""), vec![single]),
        SampleCall::new(OpId::aten("lift_fresh", ""), vec![matrix]),
    ])
}

/// Per-call results of a cross-check run.
#[derive(Debug, Default)]
pub struct CrossRefReport {
    pub verified: Vec<OpId>,
    pub skipped: Vec<(OpId, SkipReason)>,
    pub mismatched: Vec<(OpId, String)>,
}

impl CrossRefReport {
    pub fn is_clean(&self) -> bool {
        self.mismatched.is_empty()
    }
}

/// Run `calls` through the cross-checker, skipping operators matching `ignore`.
///
/// Disagreements are collected in the report; any other failure aborts the run.
pub fn run_crossref(
    registry: &OperatorRegistry,
    calls: &[SampleCall],
    ignore: Option<&str>,
) -> Result<CrossRefReport> {
    let runtime = EagerRuntime::new();
    let fake = FakeTensorMode::new();
    let mut mode = CrossRefFakeMode::new(&runtime, &fake, registry);
    if let Some(pattern) = ignore {
        let regex = Regex::new(pattern).context("Invalid regex pattern")?;
        mode = mode.with_ignore_op(move |op| regex.is_match(&op.to_string()));
    }

    let mut report = CrossRefReport::default();
    for call in calls {
        let _span = tracing::debug_span!("crossref", op = %call.op).entered();
        match mode.check(&call.op, &call.args, &call.kwargs) {
            Ok((_, Outcome::Verified { .. })) => report.verified.push(call.op.clone()),
            Ok((_, Outcome::Skipped(reason))) => report.skipped.push((call.op.clone(), reason)),
            Err(e @ (Error::CrossRefMismatch { .. } | Error::ResultStructure { .. })) => {
                tracing::warn!(op = %call.op, error = %e, "Cross-check failed");
                report.mismatched.push((call.op.clone(), e.to_string()));
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to run {}", call.op));
            }
        }
    }
    Ok(report)
}
