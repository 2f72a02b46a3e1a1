//! Operator registry: schemas, tags and overload lookup.

use crate::op::{OpFamily, OpId};
use crate::schema::FunctionSchema;
use crate::tags::{Tag, TagSet};
use crate::{Error, Result};
use std::collections::{BTreeMap, HashMap};

/// Read-only view of the known operator overloads.
///
/// Passed explicitly to the components that need it; nothing in opcheck
/// reaches for a process-wide registry.
pub trait SchemaRegistry: Send + Sync {
    /// Schema of a registered overload, or `None` if unknown.
    fn schema(&self, op: &OpId) -> Option<&FunctionSchema>;

    /// All overloads registered under `namespace::name`, or `None` if no
    /// overload of that name exists.
    fn overload_family(&self, namespace: &str, name: &str) -> Option<&OverloadFamily>;

    /// Declared tags of an overload. Unknown overloads have no tags.
    fn tags(&self, op: &OpId) -> TagSet;
}

/// Every registered overload sharing one qualified base name.
#[derive(Debug, Clone)]
pub struct OverloadFamily {
    family: OpFamily,
    overloads: BTreeMap<String, OpId>,
}

impl OverloadFamily {
    fn new(family: OpFamily) -> Self {
        Self {
            family,
            overloads: BTreeMap::new(),
        }
    }

    pub fn family(&self) -> &OpFamily {
        &self.family
    }

    /// Look up one overload by qualifier (`"default"`, `"int"`, ...).
    pub fn overload(&self, qualifier: &str) -> Option<&OpId> {
        self.overloads.get(qualifier)
    }

    /// Iterate over the registered overload qualifiers.
    pub fn qualifiers(&self) -> impl Iterator<Item = &str> {
        self.overloads.keys().map(|s| s.as_str())
    }
}

struct RegisteredOp {
    schema: FunctionSchema,
    tags: TagSet,
}

/// In-memory registry of operator schemas and tags.
///
/// # Example
///
/// ```
/// use opcheck_core::{OperatorRegistry, OpId, SchemaRegistry, Tag};
///
/// let mut registry = OperatorRegistry::new();
/// registry
///     .register("aten::t(Tensor(a) self) -> Tensor(a)", &[Tag::Core])?
///     .register("aten::t_copy(Tensor self) -> Tensor", &[Tag::ViewCopy])?;
///
/// let family = registry.overload_family("aten", "t_copy").unwrap();
/// assert_eq!(family.overload("default"), Some(&OpId::aten("t_copy", "default")));
/// # Ok::<(), opcheck_core::Error>(())
/// ```
#[derive(Default)]
pub struct OperatorRegistry {
    ops: HashMap<OpId, RegisteredOp>,
    families: HashMap<OpFamily, OverloadFamily>,
}

impl OperatorRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and register a schema with its tags.
    ///
    /// Returns `self` for method chaining. Registering the same overload twice
    /// is an error.
    pub fn register(&mut self, schema: &str, tags: &[Tag]) -> Result<&mut Self> {
        let schema = FunctionSchema::parse(schema)?;
        self.register_schema(schema, tags.iter().copied().collect())
    }

    /// Register an already parsed schema.
    pub fn register_schema(&mut self, schema: FunctionSchema, tags: TagSet) -> Result<&mut Self> {
        let id = schema.op_id();
        if self.ops.contains_key(&id) {
            return Err(Error::Schema(format!("Operator {id} is already registered")));
        }

        let family = id.family();
        self.families
            .entry(family.clone())
            .or_insert_with(|| OverloadFamily::new(family))
            .overloads
            .insert(id.overload().to_string(), id.clone());
        tracing::trace!(op = %id, tags = %tags, "Registered operator");
        self.ops.insert(id, RegisteredOp { schema, tags });

        Ok(self)
    }

    /// Check if an overload is registered.
    pub fn contains(&self, op: &OpId) -> bool {
        self.ops.contains_key(op)
    }

    /// Get the number of registered overloads.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Iterate over all registered overloads in sorted order.
    pub fn op_ids(&self) -> impl Iterator<Item = &OpId> {
        let mut ids: Vec<&OpId> = self.ops.keys().collect();
        ids.sort();
        ids.into_iter()
    }
}

impl SchemaRegistry for OperatorRegistry {
    fn schema(&self, op: &OpId) -> Option<&FunctionSchema> {
        self.ops.get(op).map(|entry| &entry.schema)
    }

    fn overload_family(&self, namespace: &str, name: &str) -> Option<&OverloadFamily> {
        self.families.get(&OpFamily::new(namespace, name))
    }

    fn tags(&self, op: &OpId) -> TagSet {
        self.ops
            .get(op)
            .map(|entry| entry.tags.clone())
            .unwrap_or_default()
    }
}
