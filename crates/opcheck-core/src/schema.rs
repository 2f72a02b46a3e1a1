//! Operator schemas and the schema notation parser.
//!
//! A schema is written the way operator libraries declare them:
//!
//! ```text
//! aten::transpose.int(Tensor(a) self, int dim0, int dim1) -> Tensor(a)
//! aten::add.Tensor(Tensor self, Tensor other, *, Scalar alpha=1) -> Tensor
//! aten::split.Tensor(Tensor(a -> *) self, SymInt split_size, int dim=0) -> Tensor(a)[]
//! ```
//!
//! The `(a)` annotation is the argument's alias classification: the result
//! shares storage with that argument. `(a!)` additionally marks a write.

use crate::op::OpId;
use crate::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Alias classification of one argument or return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasInfo {
    /// Alias sets the value belongs to before the call (`a` in `Tensor(a)`).
    pub before_set: Vec<String>,

    /// Alias sets after the call (`*` in `Tensor(a -> *)`), empty if unchanged.
    pub after_set: Vec<String>,

    /// The operator writes through this alias (`Tensor(a!)`).
    pub is_write: bool,
}

impl AliasInfo {
    fn parse(text: &str) -> Result<Self> {
        let (before, after) = match text.split_once("->") {
            Some((before, after)) => (before.trim(), Some(after.trim())),
            None => (text.trim(), None),
        };

        let is_write = before.ends_with('!');
        let before = before.trim_end_matches('!');
        if before.is_empty() {
            return Err(Error::Schema(format!("Empty alias annotation '({text})'")));
        }

        let split = |set: &str| -> Vec<String> {
            set.split('|')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        };

        Ok(Self {
            before_set: split(before),
            after_set: after.map(split).unwrap_or_default(),
            is_write,
        })
    }
}

impl fmt::Display for AliasInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.before_set.join("|"))?;
        if self.is_write {
            f.write_str("!")?;
        }
        if !self.after_set.is_empty() {
            write!(f, " -> {}", self.after_set.join("|"))?;
        }
        Ok(())
    }
}

/// One argument (or return) of a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    /// Argument name; returns may be unnamed.
    pub name: String,

    /// Base type name (`Tensor`, `int`, `SymInt`, `Scalar`, ...).
    pub type_name: String,

    /// Type modifiers following the base type (`[]`, `[2]`, `?`, `?[]`).
    pub type_suffix: String,

    /// Alias classification, if the value may share storage.
    pub alias_info: Option<AliasInfo>,

    /// Default value as written in the schema.
    pub default: Option<String>,

    /// Declared after the `*` marker.
    pub kwarg_only: bool,
}

impl Argument {
    pub fn is_tensor(&self) -> bool {
        self.type_name == "Tensor"
    }

    pub fn is_list(&self) -> bool {
        self.type_suffix.contains('[')
    }

    pub fn is_optional(&self) -> bool {
        self.type_suffix.ends_with('?')
    }

    pub fn is_mutable(&self) -> bool {
        self.alias_info.as_ref().is_some_and(|info| info.is_write)
    }

    fn parse(text: &str, kwarg_only: bool, require_name: bool) -> Result<Self> {
        let text = text.trim();

        let (decl, default) = match find_top_level(text, '=') {
            Some(pos) => (text[..pos].trim(), Some(text[pos + 1..].trim().to_string())),
            None => (text, None),
        };

        let (type_text, name) = match rfind_top_level(decl, ' ') {
            Some(pos) => (decl[..pos].trim(), decl[pos + 1..].trim().to_string()),
            None if require_name => {
                return Err(Error::Schema(format!("Argument '{text}' has no name")));
            }
            None => (decl, String::new()),
        };

        let base_end = type_text
            .find(|c: char| !(c.is_alphanumeric() || c == '_'))
            .unwrap_or(type_text.len());
        let type_name = type_text[..base_end].to_string();
        if type_name.is_empty() {
            return Err(Error::Schema(format!("Argument '{text}' has no type")));
        }

        let mut rest = &type_text[base_end..];
        let mut alias_info = None;
        if let Some(stripped) = rest.strip_prefix('(') {
            let close = stripped
                .find(')')
                .ok_or_else(|| Error::Schema(format!("Unclosed alias annotation in '{text}'")))?;
            alias_info = Some(AliasInfo::parse(&stripped[..close])?);
            rest = &stripped[close + 1..];
        }

        let type_suffix: String = rest.chars().filter(|c| !c.is_whitespace()).collect();
        if !type_suffix
            .chars()
            .all(|c| c == '[' || c == ']' || c == '?' || c.is_ascii_digit())
        {
            return Err(Error::Schema(format!("Malformed type in '{text}'")));
        }

        Ok(Self {
            name,
            type_name,
            type_suffix,
            alias_info,
            default,
            kwarg_only,
        })
    }
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.type_name)?;
        if let Some(alias) = &self.alias_info {
            write!(f, "({alias})")?;
        }
        f.write_str(&self.type_suffix)?;
        if !self.name.is_empty() {
            write!(f, " {}", self.name)?;
        }
        if let Some(default) = &self.default {
            write!(f, "={default}")?;
        }
        Ok(())
    }
}

/// Structured description of one operator overload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSchema {
    /// Qualified operator name (`aten::transpose`).
    pub name: String,

    /// Overload name as declared; empty for the default overload.
    pub overload_name: String,

    pub arguments: Vec<Argument>,

    pub returns: Vec<Argument>,
}

impl FunctionSchema {
    /// Parse a schema from its textual declaration.
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        let open = text
            .find('(')
            .ok_or_else(|| Error::Schema(format!("Schema '{text}' has no argument list")))?;
        let close = matching_paren(text, open)
            .ok_or_else(|| Error::Schema(format!("Unbalanced parentheses in '{text}'")))?;

        let full_name = text[..open].trim();
        let (name, overload_name) = full_name.split_once('.').unwrap_or((full_name, ""));
        if !name.contains("::") {
            return Err(Error::Schema(format!(
                "Schema name '{name}' is missing a namespace"
            )));
        }

        let mut arguments = Vec::new();
        let mut kwarg_only = false;
        for piece in split_top_level(&text[open + 1..close]) {
            if piece == "*" {
                kwarg_only = true;
                continue;
            }
            arguments.push(Argument::parse(piece, kwarg_only, true)?);
        }

        let tail = text[close + 1..].trim();
        let returns_text = tail
            .strip_prefix("->")
            .ok_or_else(|| Error::Schema(format!("Schema '{text}' has no return type")))?
            .trim();

        let returns = if returns_text.starts_with('(') {
            let end = matching_paren(returns_text, 0).ok_or_else(|| {
                Error::Schema(format!("Unbalanced return tuple in '{text}'"))
            })?;
            split_top_level(&returns_text[1..end])
                .into_iter()
                .map(|piece| Argument::parse(piece, false, false))
                .collect::<Result<Vec<_>>>()?
        } else {
            vec![Argument::parse(returns_text, false, false)?]
        };

        Ok(Self {
            name: name.to_string(),
            overload_name: overload_name.to_string(),
            arguments,
            returns,
        })
    }

    /// Namespace portion of the qualified name (`aten`).
    pub fn namespace(&self) -> &str {
        self.name.split_once("::").map_or("", |(ns, _)| ns)
    }

    /// Name without the namespace (`transpose`).
    pub fn base_name(&self) -> &str {
        self.name.split_once("::").map_or(&self.name, |(_, name)| name)
    }

    /// The identifier this schema is registered under.
    pub fn op_id(&self) -> OpId {
        OpId::new(self.namespace(), self.base_name(), &self.overload_name)
    }

    /// Look up an argument by name.
    pub fn argument(&self, name: &str) -> Option<(usize, &Argument)> {
        self.arguments
            .iter()
            .enumerate()
            .find(|(_, arg)| arg.name == name)
    }

    /// Check whether any argument is written in place.
    pub fn is_mutable(&self) -> bool {
        self.arguments.iter().any(Argument::is_mutable)
    }
}

impl FromStr for FunctionSchema {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for FunctionSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.overload_name.is_empty() {
            write!(f, ".{}", self.overload_name)?;
        }

        f.write_str("(")?;
        let mut wrote_star = false;
        for (i, arg) in self.arguments.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            if arg.kwarg_only && !wrote_star {
                f.write_str("*, ")?;
                wrote_star = true;
            }
            write!(f, "{arg}")?;
        }
        f.write_str(") -> ")?;

        match self.returns.as_slice() {
            [single] => write!(f, "{single}"),
            returns => {
                let parts: Vec<String> = returns.iter().map(ToString::to_string).collect();
                write!(f, "({})", parts.join(", "))
            }
        }
    }
}

// ── Scanning helpers ──

/// Depth tracker over `()`, `[]` and double-quoted strings.
fn scan_depths(text: &str) -> impl Iterator<Item = (usize, char, bool)> + '_ {
    let mut depth = 0usize;
    let mut in_string = false;
    text.char_indices().map(move |(pos, c)| {
        let top_level_before = depth == 0 && !in_string;
        match c {
            '"' => in_string = !in_string,
            '(' | '[' if !in_string => depth += 1,
            ')' | ']' if !in_string => depth = depth.saturating_sub(1),
            _ => {}
        }
        (pos, c, top_level_before && !matches!(c, '(' | '[' | '"'))
    })
}

fn find_top_level(text: &str, needle: char) -> Option<usize> {
    scan_depths(text)
        .find(|&(_, c, top)| top && c == needle)
        .map(|(pos, _, _)| pos)
}

fn rfind_top_level(text: &str, needle: char) -> Option<usize> {
    scan_depths(text)
        .filter(|&(_, c, top)| top && c == needle)
        .map(|(pos, _, _)| pos)
        .last()
}

fn split_top_level(text: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    for (pos, c, top) in scan_depths(text) {
        if top && c == ',' {
            pieces.push(text[start..pos].trim());
            start = pos + 1;
        }
    }
    let last = text[start..].trim();
    if !last.is_empty() || !pieces.is_empty() {
        pieces.push(last);
    }
    pieces
}

fn matching_paren(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (pos, c) in text[open..].char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + pos);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_view_schema() {
        let schema =
            FunctionSchema::parse("aten::transpose.int(Tensor(a) self, int dim0, int dim1) -> Tensor(a)")
                .unwrap();

        assert_eq!(schema.name, "aten::transpose");
        assert_eq!(schema.namespace(), "aten");
        assert_eq!(schema.base_name(), "transpose");
        assert_eq!(schema.overload_name, "int");
        assert_eq!(schema.arguments.len(), 3);

        let self_arg = &schema.arguments[0];
        assert_eq!(self_arg.name, "self");
        assert!(self_arg.is_tensor());
        let alias = self_arg.alias_info.as_ref().unwrap();
        assert_eq!(alias.before_set, vec!["a".to_string()]);
        assert!(!alias.is_write);

        assert!(schema.returns[0].alias_info.is_some());
        assert_eq!(schema.op_id(), OpId::aten("transpose", "int"));
    }

    #[test]
    fn test_parse_default_overload_and_no_alias() {
        let schema = FunctionSchema::parse("aten::view_copy(Tensor self, SymInt[] size) -> Tensor")
            .unwrap();
        assert_eq!(schema.overload_name, "");
        assert_eq!(schema.op_id().overload(), "default");
        assert!(schema.arguments[0].alias_info.is_none());
        assert!(schema.arguments[1].is_list());
        assert_eq!(schema.arguments[1].type_name, "SymInt");
    }

    #[test]
    fn test_parse_kwarg_only_and_defaults() {
        let schema = FunctionSchema::parse(
            "aten::add.Tensor(Tensor self, Tensor other, *, Scalar alpha=1) -> Tensor",
        )
        .unwrap();
        let alpha = &schema.arguments[2];
        assert!(alpha.kwarg_only);
        assert_eq!(alpha.default.as_deref(), Some("1"));
        assert!(!schema.arguments[1].kwarg_only);
    }

    #[test]
    fn test_parse_wildcard_alias_and_list_return() {
        let schema = FunctionSchema::parse(
            "aten::split.Tensor(Tensor(a -> *) self, SymInt split_size, int dim=0) -> Tensor(a)[]",
        )
        .unwrap();
        let alias = schema.arguments[0].alias_info.as_ref().unwrap();
        assert_eq!(alias.after_set, vec!["*".to_string()]);
        assert!(schema.returns[0].is_list());
        assert_eq!(schema.arguments[2].default.as_deref(), Some("0"));
    }

    #[test]
    fn test_parse_mutable_and_optional() {
        let schema = FunctionSchema::parse(
            "aten::slice.Tensor(Tensor(a) self, int dim=0, SymInt? start=None, SymInt? end=None, SymInt step=1) -> Tensor(a)",
        )
        .unwrap();
        assert!(schema.arguments[2].is_optional());
        assert!(!schema.is_mutable());

        let inplace =
            FunctionSchema::parse("aten::transpose_(Tensor(a!) self, int dim0, int dim1) -> Tensor(a!)")
                .unwrap();
        assert!(inplace.is_mutable());
    }

    #[test]
    fn test_parse_tuple_returns_and_bracketed_defaults() {
        let schema = FunctionSchema::parse(
            "aten::max.dim(Tensor self, int dim, bool keepdim=False) -> (Tensor values, Tensor indices)",
        )
        .unwrap();
        assert_eq!(schema.returns.len(), 2);
        assert_eq!(schema.returns[1].name, "indices");

        let schema = FunctionSchema::parse(
            "aten::flip(Tensor self, int[] dims=[0, 1], str mode=\"a, b\") -> Tensor",
        )
        .unwrap();
        assert_eq!(schema.arguments.len(), 3);
        assert_eq!(schema.arguments[1].default.as_deref(), Some("[0, 1]"));
    }

    #[test]
    fn test_parse_zero_arguments() {
        let schema = FunctionSchema::parse("aten::_get_tracing_state() -> bool").unwrap();
        assert!(schema.arguments.is_empty());
    }

    #[test]
    fn test_parse_errors() {
        assert!(FunctionSchema::parse("transpose(Tensor self) -> Tensor").is_err());
        assert!(FunctionSchema::parse("aten::t(Tensor(a) self").is_err());
        assert!(FunctionSchema::parse("aten::t(Tensor(a) self)").is_err());
        assert!(FunctionSchema::parse("aten::t(Tensor) -> Tensor").is_err());
    }

    #[test]
    fn test_display_round_trips() {
        for text in [
            "aten::transpose.int(Tensor(a) self, int dim0, int dim1) -> Tensor(a)",
            "aten::add.Tensor(Tensor self, Tensor other, *, Scalar alpha=1) -> Tensor",
            "aten::split.Tensor(Tensor(a -> *) self, SymInt split_size, int dim=0) -> Tensor(a)[]",
        ] {
            let schema = FunctionSchema::parse(text).unwrap();
            assert_eq!(schema.to_string(), text);
        }
    }
}
