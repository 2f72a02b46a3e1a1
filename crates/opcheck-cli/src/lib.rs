//! opcheck CLI library - shared functionality for testing and the binary.

pub mod crossref;
pub mod ops;
pub mod rewrite;

use anyhow::{Context, Result};
use opcheck_core::OpId;

/// Parse an operator name given on the command line.
///
/// Accepts `ns::name`, `ns::name.overload` and, for the `aten` namespace,
/// a bare `name` or `name.overload`.
pub fn parse_op(text: &str) -> Result<OpId> {
    let qualified = if text.contains("::") {
        text.to_string()
    } else {
        format!("aten::{text}")
    };
    qualified
        .parse()
        .with_context(|| format!("Invalid operator name '{text}'"))
}
