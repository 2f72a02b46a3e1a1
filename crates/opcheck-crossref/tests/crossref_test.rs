//! Cross-checking eager execution against fake tensors.

use opcheck_aten::aten_registry;
use opcheck_core::{
    AbstractScope, AbstractSubstrate, Dispatcher, Error, Kwargs, MetaMismatch, OpId,
    OperatorRegistry, Result, Tag, Tensor, TensorData, TensorMeta, Value,
};
use opcheck_crossref::{CrossRefFakeMode, Outcome, SkipReason};
use opcheck_runtime::{EagerRuntime, FakeTensorMode};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_target(false)
        .with_test_writer()
        .try_init();
}

fn arange(shape: &[usize]) -> Tensor {
    let n: usize = shape.iter().product();
    Tensor::from_data(TensorData::F32((0..n).map(|x| x as f32).collect()), shape)
        .expect("arange shape is consistent")
}

/// Wraps the fake tensor mode, counting lifts and tracking open scopes.
#[derive(Default)]
struct InstrumentedFake {
    inner: FakeTensorMode,
    lifts: Arc<AtomicUsize>,
    open: Arc<AtomicBool>,
}

struct InstrumentedScope<'a> {
    inner: Box<dyn AbstractScope + 'a>,
    lifts: Arc<AtomicUsize>,
    open: Arc<AtomicBool>,
}

impl AbstractSubstrate for InstrumentedFake {
    fn enter(&self) -> Result<Box<dyn AbstractScope + '_>> {
        self.open.store(true, Ordering::SeqCst);
        Ok(Box::new(InstrumentedScope {
            inner: self.inner.enter()?,
            lifts: self.lifts.clone(),
            open: self.open.clone(),
        }))
    }
}

impl AbstractScope for InstrumentedScope<'_> {
    fn lift(&mut self, tensor: &Tensor) -> Result<Tensor> {
        self.lifts.fetch_add(1, Ordering::SeqCst);
        self.inner.lift(tensor)
    }

    fn call(&mut self, op: &OpId, args: &[Value], kwargs: &Kwargs) -> Result<Value> {
        self.inner.call(op, args, kwargs)
    }
}

impl Drop for InstrumentedScope<'_> {
    fn drop(&mut self) {
        self.open.store(false, Ordering::SeqCst);
    }
}

/// Answers every call with a fixed value.
struct RiggedFake(Value);

struct RiggedScope(Value);

impl AbstractSubstrate for RiggedFake {
    fn enter(&self) -> Result<Box<dyn AbstractScope + '_>> {
        Ok(Box::new(RiggedScope(self.0.clone())))
    }
}

impl AbstractScope for RiggedScope {
    fn lift(&mut self, tensor: &Tensor) -> Result<Tensor> {
        Ok(Tensor::new_abstract(tensor.meta().clone()))
    }

    fn call(&mut self, _op: &OpId, _args: &[Value], _kwargs: &Kwargs) -> Result<Value> {
        Ok(self.0.clone())
    }
}

/// Reports every call as unsupported.
struct UnsupportedFake;

impl AbstractSubstrate for UnsupportedFake {
    fn enter(&self) -> Result<Box<dyn AbstractScope + '_>> {
        Ok(Box::new(UnsupportedFake))
    }
}

impl AbstractScope for UnsupportedFake {
    fn lift(&mut self, tensor: &Tensor) -> Result<Tensor> {
        Ok(Tensor::new_abstract(tensor.meta().clone()))
    }

    fn call(&mut self, op: &OpId, _args: &[Value], _kwargs: &Kwargs) -> Result<Value> {
        Err(Error::UnsupportedAbstract(format!("{op} has no meta function")))
    }
}

fn fake_like(meta: TensorMeta) -> Value {
    Value::Tensor(Tensor::new_abstract(meta))
}

#[test]
fn test_agreeing_results_return_real_result() {
    init_tracing();
    let registry = aten_registry().unwrap();
    let runtime = EagerRuntime::new();
    let fake = InstrumentedFake::default();
    let mode = CrossRefFakeMode::new(&runtime, &fake, &registry);

    let x = arange(&[2, 3]);
    let (out, outcome) = mode
        .check(
            &OpId::aten("transpose", "int"),
            &[x.clone().into(), Value::int(0), Value::int(1)],
            &Kwargs::new(),
        )
        .unwrap();

    assert_eq!(outcome, Outcome::Verified { tensors: 1 });
    let out = out.as_tensor().unwrap();
    assert!(!out.is_abstract());
    assert!(out.shares_storage(&x));
    assert_eq!(fake.lifts.load(Ordering::SeqCst), 1);
}

#[test]
fn test_multi_output_views_agree() {
    let registry = aten_registry().unwrap();
    let runtime = EagerRuntime::new();
    let fake = FakeTensorMode::new();
    let mode = CrossRefFakeMode::new(&runtime, &fake, &registry);

    let (out, outcome) = mode
        .check(
            &OpId::aten("split", "Tensor"),
            &[arange(&[5, 2]).into(), Value::int(2)],
            &Kwargs::new(),
        )
        .unwrap();
    assert_eq!(out.tensors().len(), 3);
    assert_eq!(outcome, Outcome::Verified { tensors: 3 });
}

#[test]
fn test_dispatcher_wraps_a_sequence_of_calls() {
    let registry = aten_registry().unwrap();
    let runtime = EagerRuntime::new();
    let fake = FakeTensorMode::new();
    let mode = CrossRefFakeMode::new(&runtime, &fake, &registry);
    let dispatcher: &dyn Dispatcher = &mode;

    let x = arange(&[2, 3]);
    let t = dispatcher
        .call(&OpId::aten("t", ""), &[x.into()], &Kwargs::new())
        .unwrap();
    let copy = dispatcher
        .call(&OpId::aten("clone", ""), &[t.clone()], &Kwargs::new())
        .unwrap();
    let sum = dispatcher
        .call(&OpId::aten("add", "Tensor"), &[t, copy], &Kwargs::new())
        .unwrap();
    assert_eq!(sum.as_tensor().unwrap().shape(), &[3, 2]);
}

#[test]
fn test_dynamic_output_shape_is_never_lifted() {
    let registry = aten_registry().unwrap();
    let runtime = EagerRuntime::new();
    let fake = InstrumentedFake::default();
    let mode = CrossRefFakeMode::new(&runtime, &fake, &registry);

    let x = arange(&[4]);
    let (out, outcome) = mode
        .check(&OpId::aten("nonzero", ""), &[x.into()], &Kwargs::new())
        .unwrap();

    assert_eq!(outcome, Outcome::Skipped(SkipReason::Tagged(Tag::DynamicOutputShape)));
    assert_eq!(out.as_tensor().unwrap().shape(), &[3, 1]);
    assert_eq!(fake.lifts.load(Ordering::SeqCst), 0);
}

#[test]
fn test_tagged_and_excluded_ops_are_skipped() {
    let registry = aten_registry().unwrap();
    let runtime = EagerRuntime::new();
    let fake = FakeTensorMode::new();
    let mode = CrossRefFakeMode::new(&runtime, &fake, &registry);

    assert_eq!(
        mode.skip_reason(&OpId::aten("transpose_", "")),
        Some(SkipReason::Tagged(Tag::InplaceView))
    );
    assert_eq!(
        mode.skip_reason(&OpId::aten("item", "")),
        Some(SkipReason::Tagged(Tag::DataDependentOutput))
    );
    for op in mode.excluded() {
        assert_eq!(mode.skip_reason(op), Some(SkipReason::Excluded));
    }
    assert_eq!(mode.skip_reason(&OpId::aten("view", "")), None);

    let (_, outcome) = mode
        .check(&OpId::aten("lift_fresh", ""), &[arange(&[2]).into()], &Kwargs::new())
        .unwrap();
    assert_eq!(outcome, Outcome::Skipped(SkipReason::Excluded));
}

#[test]
fn test_ignore_op() {
    let registry = aten_registry().unwrap();
    let runtime = EagerRuntime::new();
    let fake = InstrumentedFake::default();
    let mode = CrossRefFakeMode::new(&runtime, &fake, &registry)
        .with_ignore_op(|op| op.name() == "relu");

    let (_, outcome) = mode
        .check(&OpId::aten("relu", ""), &[arange(&[3]).into()], &Kwargs::new())
        .unwrap();
    assert_eq!(outcome, Outcome::Skipped(SkipReason::Ignored));
    assert_eq!(fake.lifts.load(Ordering::SeqCst), 0);

    let (_, outcome) = mode
        .check(&OpId::aten("neg", ""), &[arange(&[3]).into()], &Kwargs::new())
        .unwrap();
    assert_eq!(outcome, Outcome::Verified { tensors: 1 });
}

#[test]
fn test_shape_mismatch_is_reported() {
    let registry = aten_registry().unwrap();
    let runtime = EagerRuntime::new();
    let wrong = TensorMeta::contiguous(vec![2, 3], arange(&[1]).dtype(), arange(&[1]).device());
    let fake = RiggedFake(fake_like(wrong));
    let mode = CrossRefFakeMode::new(&runtime, &fake, &registry);

    let err = mode
        .call(&OpId::aten("t", ""), &[arange(&[2, 3]).into()], &Kwargs::new())
        .unwrap_err();
    assert!(matches!(
        err,
        Error::CrossRefMismatch {
            source: MetaMismatch::Shape { .. },
            ..
        }
    ));
    assert!(err.to_string().starts_with("Mismatch on aten::t.default:"));
}

#[test]
fn test_stride_mismatch_is_reported() {
    let registry = aten_registry().unwrap();
    let runtime = EagerRuntime::new();
    let x = arange(&[2, 3]);
    // Right shape, but laid out as if the transpose had copied.
    let fake = RiggedFake(fake_like(TensorMeta::contiguous(vec![3, 2], x.dtype(), x.device())));
    let mode = CrossRefFakeMode::new(&runtime, &fake, &registry);

    let err = mode
        .call(
            &OpId::aten("transpose", "int"),
            &[x.into(), Value::int(0), Value::int(1)],
            &Kwargs::new(),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        Error::CrossRefMismatch {
            source: MetaMismatch::Stride { .. },
            ..
        }
    ));
}

#[test]
fn test_non_tensor_abstract_result_is_a_structure_error() {
    let registry = aten_registry().unwrap();
    let runtime = EagerRuntime::new();
    let fake = RiggedFake(Value::int(3));
    let mode = CrossRefFakeMode::new(&runtime, &fake, &registry);

    let err = mode
        .call(&OpId::aten("neg", ""), &[arange(&[3]).into()], &Kwargs::new())
        .unwrap_err();
    assert!(matches!(err, Error::ResultStructure { .. }));
}

#[test]
fn test_unsupported_abstract_skips_the_comparison() {
    let registry = aten_registry().unwrap();
    let runtime = EagerRuntime::new();
    let mode = CrossRefFakeMode::new(&runtime, &UnsupportedFake, &registry);

    let (out, outcome) = mode
        .check(&OpId::aten("neg", ""), &[arange(&[3]).into()], &Kwargs::new())
        .unwrap();
    assert!(matches!(outcome, Outcome::Skipped(SkipReason::Unsupported(_))));
    assert_eq!(out.as_tensor().unwrap().to_f64_vec().unwrap(), vec![0.0, -1.0, -2.0]);
}

#[test]
fn test_abstract_argument_is_a_leak() {
    let registry = aten_registry().unwrap();
    let runtime = EagerRuntime::new();
    let fake = FakeTensorMode::new();
    let mode = CrossRefFakeMode::new(&runtime, &fake, &registry);

    let abstract_x = fake_like(arange(&[3]).meta().clone());
    let err = mode
        .call(&OpId::aten("neg", ""), &[abstract_x], &Kwargs::new())
        .unwrap_err();
    assert!(matches!(err, Error::AbstractLeak { .. }));
}

#[test]
fn test_abstract_real_result_is_a_leak() {
    struct LeakyRuntime;

    impl Dispatcher for LeakyRuntime {
        fn call(&self, _op: &OpId, args: &[Value], _kwargs: &Kwargs) -> Result<Value> {
            let meta = args[0].as_tensor().map(|t| t.meta().clone());
            Ok(meta.map(fake_like).unwrap_or_else(Value::none))
        }
    }

    let registry = OperatorRegistry::new();
    let fake = FakeTensorMode::new();
    let mode = CrossRefFakeMode::new(&LeakyRuntime, &fake, &registry);

    let err = mode
        .call(&OpId::aten("neg", ""), &[arange(&[3]).into()], &Kwargs::new())
        .unwrap_err();
    assert!(matches!(err, Error::AbstractLeak { .. }));
}

#[test]
fn test_scope_is_closed_before_real_execution() {
    struct ScopeWatcher {
        open: Arc<AtomicBool>,
        inner: EagerRuntime,
        saw_open_scope: AtomicBool,
    }

    impl Dispatcher for ScopeWatcher {
        fn call(&self, op: &OpId, args: &[Value], kwargs: &Kwargs) -> Result<Value> {
            if self.open.load(Ordering::SeqCst) {
                self.saw_open_scope.store(true, Ordering::SeqCst);
            }
            self.inner.call(op, args, kwargs)
        }
    }

    let registry = aten_registry().unwrap();
    let fake = InstrumentedFake::default();
    let runtime = ScopeWatcher {
        open: fake.open.clone(),
        inner: EagerRuntime::new(),
        saw_open_scope: AtomicBool::new(false),
    };
    let mode = CrossRefFakeMode::new(&runtime, &fake, &registry);

    mode.call(&OpId::aten("t", ""), &[arange(&[2, 3]).into()], &Kwargs::new())
        .unwrap();
    assert!(!runtime.saw_open_scope.load(Ordering::SeqCst));
    assert_eq!(fake.lifts.load(Ordering::SeqCst), 1);
}

#[test]
fn test_real_failure_propagates_after_abstract_failure_is_skipped() {
    let registry = aten_registry().unwrap();
    let runtime = EagerRuntime::new();
    let mode = CrossRefFakeMode::new(&runtime, &UnsupportedFake, &registry);

    let result = mode.call(&OpId::aten("t", ""), &[arange(&[2, 2, 2]).into()], &Kwargs::new());
    assert!(matches!(result, Err(Error::Shape(_))));
}
