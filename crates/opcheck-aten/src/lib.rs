//! `aten` operator catalog and kernels for opcheck.
//!
//! This crate provides the schemas of the supported `aten` operators and one
//! kernel per executable overload. Every kernel runs in either execution mode:
//!
//! - **Eager**: real data; views share storage with their input
//! - **Abstract**: metadata only; results are abstract tensors
//!
//! # Operator Families
//!
//! - **Binary elementwise**: add, sub, mul, div
//! - **Unary elementwise**: relu, neg, abs
//! - **Reduction**: sum, mean
//!
//! # Individual Operators
//!
//! - Views (view, reshape, transpose, permute, t, expand, unsqueeze, squeeze, alias)
//! - Indexing views (select, slice, split, unbind)
//! - View copies (`ViewCopyKernel` wraps any view kernel)
//! - Data-dependent (nonzero, item)
//! - Metadata queries (sym_size, sym_stride, sym_numel)

pub mod families;
pub mod kernel;
pub mod operators;

mod catalog;
mod helpers;
mod registry;

pub use catalog::{ATEN_SCHEMAS, aten_registry};
pub use kernel::{ExecMode, KernelCtx, KernelRegistry, OpKernel};
pub use registry::aten_kernels;
