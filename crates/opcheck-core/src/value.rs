//! Argument and result trees.
//!
//! Every operator argument and result is a [`Value`]: a tensor leaf, a
//! container of further values, or an opaque non-tensor leaf. Structure
//! preserving walks (`map_tensors`) and flattening (`leaves`) both visit
//! children in declaration order, so two trees of the same shape flatten to
//! pairwise-corresponding leaves.

use crate::tensor::Tensor;
use crate::types::DataType;
use crate::{Error, Result};
use std::collections::BTreeMap;
use std::fmt;

/// Keyword arguments, ordered by name.
pub type Kwargs = BTreeMap<String, Value>;

/// Non-tensor literal.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Dtype(DataType),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::None => f.write_str("None"),
            Scalar::Bool(b) => write!(f, "{}", if *b { "True" } else { "False" }),
            Scalar::Int(i) => write!(f, "{i}"),
            Scalar::Float(x) => write!(f, "{x:?}"),
            Scalar::Str(s) => write!(f, "{s:?}"),
            Scalar::Dtype(dtype) => write!(f, "{dtype}"),
        }
    }
}

/// One node of an argument or result tree.
#[derive(Debug, Clone)]
pub enum Value {
    Tensor(Tensor),
    List(Vec<Value>),
    Scalar(Scalar),
}

impl Value {
    pub fn int(value: i64) -> Self {
        Value::Scalar(Scalar::Int(value))
    }

    pub fn float(value: f64) -> Self {
        Value::Scalar(Scalar::Float(value))
    }

    pub fn bool(value: bool) -> Self {
        Value::Scalar(Scalar::Bool(value))
    }

    pub fn none() -> Self {
        Value::Scalar(Scalar::None)
    }

    pub fn int_list(values: &[i64]) -> Self {
        Value::List(values.iter().map(|&v| Value::int(v)).collect())
    }

    pub fn is_tensor(&self) -> bool {
        matches!(self, Value::Tensor(_))
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::Scalar(Scalar::None))
    }

    pub fn as_tensor(&self) -> Option<&Tensor> {
        match self {
            Value::Tensor(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Scalar(Scalar::Int(i)) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Scalar(Scalar::Int(i)) => Some(*i as f64),
            Value::Scalar(Scalar::Float(x)) => Some(*x),
            Value::Scalar(Scalar::Bool(b)) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Scalar(Scalar::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    /// Read an `int[]`; a bare int is accepted as a one-element list.
    pub fn as_int_list(&self) -> Option<Vec<i64>> {
        match self {
            Value::List(items) => items.iter().map(Value::as_int).collect(),
            Value::Scalar(Scalar::Int(i)) => Some(vec![*i]),
            _ => None,
        }
    }

    /// Rebuild the tree with every tensor leaf replaced by `f(leaf)`.
    ///
    /// Containers keep their structure and non-tensor leaves are cloned
    /// unchanged. Stops at the first error.
    pub fn map_tensors<F>(&self, f: &mut F) -> Result<Value>
    where
        F: FnMut(&Tensor) -> Result<Tensor>,
    {
        Ok(match self {
            Value::Tensor(t) => Value::Tensor(f(t)?),
            Value::List(items) => Value::List(
                items
                    .iter()
                    .map(|item| item.map_tensors(f))
                    .collect::<Result<Vec<_>>>()?,
            ),
            Value::Scalar(s) => Value::Scalar(s.clone()),
        })
    }

    /// Flatten the tree into its leaves in depth-first order.
    pub fn leaves(&self) -> Vec<&Value> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a Value>) {
        match self {
            Value::List(items) => items.iter().for_each(|item| item.collect_leaves(out)),
            leaf => out.push(leaf),
        }
    }

    /// All tensor leaves in depth-first order.
    pub fn tensors(&self) -> Vec<&Tensor> {
        self.leaves()
            .into_iter()
            .filter_map(Value::as_tensor)
            .collect()
    }
}

impl From<Tensor> for Value {
    fn from(tensor: Tensor) -> Self {
        Value::Tensor(tensor)
    }
}

impl From<Scalar> for Value {
    fn from(scalar: Scalar) -> Self {
        Value::Scalar(scalar)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Tensor(t) => write!(
                f,
                "Tensor({:?}, stride={:?}, dtype={}, device={}{})",
                t.shape(),
                t.strides(),
                t.dtype(),
                t.device(),
                if t.is_abstract() { ", abstract" } else { "" }
            ),
            Value::List(items) => {
                let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            Value::Scalar(s) => write!(f, "{s}"),
        }
    }
}

/// Map every tensor leaf of a call's positional and keyword arguments.
pub fn map_call_tensors<F>(args: &[Value], kwargs: &Kwargs, mut f: F) -> Result<(Vec<Value>, Kwargs)>
where
    F: FnMut(&Tensor) -> Result<Tensor>,
{
    let args = args
        .iter()
        .map(|arg| arg.map_tensors(&mut f))
        .collect::<Result<Vec<_>>>()?;
    let kwargs = kwargs
        .iter()
        .map(|(name, value)| -> Result<(String, Value)> {
            Ok((name.clone(), value.map_tensors(&mut f)?))
        })
        .collect::<Result<Kwargs>>()?;
    Ok((args, kwargs))
}

/// Iterate over every tensor leaf of a call's arguments.
pub fn call_tensors<'a>(args: &'a [Value], kwargs: &'a Kwargs) -> Vec<&'a Tensor> {
    args.iter()
        .chain(kwargs.values())
        .flat_map(Value::tensors)
        .collect()
}

/// Fetch positional argument `index`, falling back to keyword `name`.
pub fn arg<'a>(args: &'a [Value], kwargs: &'a Kwargs, index: usize, name: &str) -> Option<&'a Value> {
    args.get(index).or_else(|| kwargs.get(name))
}

/// Fetch a required tensor argument.
pub fn tensor_arg<'a>(
    args: &'a [Value],
    kwargs: &'a Kwargs,
    index: usize,
    name: &str,
) -> Result<&'a Tensor> {
    arg(args, kwargs, index, name)
        .and_then(Value::as_tensor)
        .ok_or_else(|| Error::Kernel(format!("Expected tensor argument '{name}'")))
}

/// Fetch an int argument with a default.
pub fn int_arg(args: &[Value], kwargs: &Kwargs, index: usize, name: &str, default: Option<i64>) -> Result<i64> {
    match arg(args, kwargs, index, name) {
        Some(value) if !value.is_none() => value
            .as_int()
            .ok_or_else(|| Error::Kernel(format!("Expected int argument '{name}', got {value}"))),
        _ => default.ok_or_else(|| Error::Kernel(format!("Missing int argument '{name}'"))),
    }
}

/// Fetch an optional int argument (`SymInt?`).
pub fn opt_int_arg(args: &[Value], kwargs: &Kwargs, index: usize, name: &str) -> Result<Option<i64>> {
    match arg(args, kwargs, index, name) {
        Some(value) if !value.is_none() => value
            .as_int()
            .map(Some)
            .ok_or_else(|| Error::Kernel(format!("Expected int argument '{name}', got {value}"))),
        _ => Ok(None),
    }
}

/// Fetch a required `int[]` argument.
pub fn int_list_arg(args: &[Value], kwargs: &Kwargs, index: usize, name: &str) -> Result<Vec<i64>> {
    arg(args, kwargs, index, name)
        .and_then(Value::as_int_list)
        .ok_or_else(|| Error::Kernel(format!("Expected int[] argument '{name}'")))
}
