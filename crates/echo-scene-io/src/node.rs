// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Immutable scene nodes with mutable field values.
//!
//! Children are shared through [`Arc`], so one node may appear under several
//! parents. A node's child list is fixed when it is built and every child
//! exists before its parent, so the graph is always acyclic.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use echo_field::{AnyField, FieldValue, MField};
use echo_writeref::{Dialect, ObjectId, WriteObject};

/// One named field slot on a node.
pub(crate) struct NodeField {
    name: String,
    value: Mutex<Box<dyn AnyField>>,
}

impl NodeField {
    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Box<dyn AnyField>> {
        self.value.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A node in a scene DAG.
pub struct SceneNode {
    id: ObjectId,
    type_name: String,
    name: String,
    dialect: Dialect,
    fields: Vec<NodeField>,
    children: Vec<Arc<SceneNode>>,
}

impl fmt::Debug for SceneNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneNode")
            .field("id", &self.id)
            .field("type_name", &self.type_name)
            .field("name", &self.name)
            .field("dialect", &self.dialect)
            .field(
                "fields",
                &self.fields.iter().map(NodeField::name).collect::<Vec<_>>(),
            )
            .field("children", &self.children.len())
            .finish()
    }
}

impl SceneNode {
    /// Start building a node of `type_name`.
    pub fn builder(type_name: impl Into<String>) -> SceneNodeBuilder {
        SceneNodeBuilder::new(type_name)
    }

    /// Identity used for write-reference bookkeeping.
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Node type, e.g. `Separator`.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Children in write order.
    pub fn children(&self) -> &[Arc<SceneNode>] {
        &self.children
    }

    /// Field names in write order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(NodeField::name)
    }

    pub(crate) fn fields(&self) -> &[NodeField] {
        &self.fields
    }

    /// Run `f` on the field `name` if it exists and holds `T` values.
    pub fn with_field<T: FieldValue, R>(
        &self,
        name: &str,
        f: impl FnOnce(&mut MField<T>) -> R,
    ) -> Option<R> {
        let field = self.fields.iter().find(|field| field.name == name)?;
        let mut guard = field.lock();
        guard.as_any_mut().downcast_mut::<MField<T>>().map(f)
    }
}

impl WriteObject for SceneNode {
    fn object_id(&self) -> ObjectId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn dialect(&self) -> Dialect {
        self.dialect
    }
}

/// Builder for [`SceneNode`].
///
/// All methods take `self` by value and return `Self` for chaining.
pub struct SceneNodeBuilder {
    type_name: String,
    name: String,
    dialect: Dialect,
    fields: Vec<NodeField>,
    children: Vec<Arc<SceneNode>>,
}

impl SceneNodeBuilder {
    /// Builder for an unnamed node of `type_name`.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            name: String::new(),
            dialect: Dialect::default(),
            fields: Vec::new(),
            children: Vec::new(),
        }
    }

    /// User name written after `DEF`.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// File dialect the node belongs to.
    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Append a typed field.
    pub fn field<T: FieldValue>(self, name: impl Into<String>, value: MField<T>) -> Self {
        self.any_field(name, Box::new(value))
    }

    /// Append a type-erased field.
    pub fn any_field(mut self, name: impl Into<String>, value: Box<dyn AnyField>) -> Self {
        self.fields.push(NodeField {
            name: name.into(),
            value: Mutex::new(value),
        });
        self
    }

    /// Append a child.
    pub fn child(mut self, child: Arc<SceneNode>) -> Self {
        self.children.push(child);
        self
    }

    /// Append several children.
    pub fn children(mut self, children: impl IntoIterator<Item = Arc<SceneNode>>) -> Self {
        self.children.extend(children);
        self
    }

    /// Finish with a fresh identity.
    pub fn build(self) -> Arc<SceneNode> {
        Arc::new(SceneNode {
            id: ObjectId::fresh(),
            type_name: self.type_name,
            name: self.name,
            dialect: self.dialect,
            fields: self.fields,
            children: self.children,
        })
    }
}
