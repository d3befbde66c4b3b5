// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! In-memory tree model: a document is an arena of nodes addressed by
//! compact u32 ids, each node holding its parent id as a back-reference.
//!
//! The arena keeps ownership simple: the document owns every node, child
//! links are ids, and dropping the document releases the whole tree. Nodes
//! are created detached and only join the tree through [`Document::add_child`]
//! and friends, which enforce the single-parent and cycle-free invariants.
//!
//! A document is not thread-safe under mutation. Once built (or decoded) it
//! is read-only shareable; every query here takes `&self`.

use crate::codec::header::FormatVersion;
use crate::error::{FluxionError, Result};
use crate::value::{Tolerance, Value};

/// Compact node identifier (index into the document arena).
pub type NodeId = u32;

/// Collapse blank and whitespace-only names to absent.
fn normalize_name(name: Option<&str>) -> Option<String> {
    match name {
        Some(s) if !s.trim().is_empty() => Some(s.to_string()),
        _ => None,
    }
}

/// A named, valued leaf attached to a node. Attributes carry no children.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Attribute {
    name: Option<String>,
    value: Value,
}

impl Attribute {
    pub fn new(name: Option<&str>, value: Value) -> Self {
        Self {
            name: normalize_name(name),
            value,
        }
    }

    pub fn named(name: &str, value: Value) -> Self {
        Self::new(Some(name), value)
    }

    pub fn unnamed(value: Value) -> Self {
        Self::new(None, value)
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: Option<&str>) {
        self.name = normalize_name(name);
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn set_value(&mut self, value: Value) {
        self.value = value;
    }

    /// Tolerance-aware equality on name and value.
    pub fn approx_eq(&self, other: &Attribute, tolerance: &Tolerance) -> bool {
        self.name == other.name && self.value.approx_eq(&other.value, tolerance)
    }
}

/// A tree element: optional name, value, ordered children, ordered attributes.
#[derive(Debug, Clone, Default)]
pub struct Node {
    name: Option<String>,
    value: Value,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attributes: Vec<Attribute>,
}

impl Node {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }
}

/// Selectors for [`Document::clone_node`]: which parts of the source node
/// to carry into the copy. Descendant nodes, when copied, are always copied
/// whole.
#[derive(Debug, Clone, Copy)]
pub struct CloneSpec {
    pub name: bool,
    pub value: bool,
    pub attributes: bool,
    pub children: bool,
}

impl Default for CloneSpec {
    fn default() -> Self {
        Self::all()
    }
}

impl CloneSpec {
    pub fn all() -> Self {
        Self {
            name: true,
            value: true,
            attributes: true,
            children: true,
        }
    }
}

/// An arena of nodes with a designated root.
///
/// The root is pinned: it has no parent and cannot be attached under any
/// other node. The document's format version is authoritative for the whole
/// tree; decoders stamp it with the version of the file they read.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    version: FormatVersion,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// A fresh document: one unnamed null-valued root, current format version.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::default()],
            root: 0,
            version: FormatVersion::CURRENT,
        }
    }

    /// An arena with no nodes yet. Decoders fill it and call `set_root`.
    pub(crate) fn empty(version: FormatVersion) -> Self {
        Self {
            nodes: Vec::new(),
            root: 0,
            version,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub(crate) fn set_root(&mut self, id: NodeId) {
        debug_assert!((id as usize) < self.nodes.len());
        self.root = id;
    }

    pub fn version(&self) -> FormatVersion {
        self.version
    }

    pub fn set_version(&mut self, version: FormatVersion) {
        self.version = version;
    }

    /// Total number of nodes in the arena, detached ones included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Create a detached node and return its id.
    pub fn create_node(&mut self, name: Option<&str>, value: Value) -> NodeId {
        let id = self.nodes.len() as NodeId;
        self.nodes.push(Node {
            name: normalize_name(name),
            value,
            parent: None,
            children: Vec::new(),
            attributes: Vec::new(),
        });
        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id as usize]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id as usize]
    }

    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.node(id).name()
    }

    pub fn set_name(&mut self, id: NodeId, name: Option<&str>) {
        self.node_mut(id).name = normalize_name(name);
    }

    pub fn value(&self, id: NodeId) -> &Value {
        self.node(id).value()
    }

    pub fn set_value(&mut self, id: NodeId, value: Value) {
        self.node_mut(id).value = value;
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).children()
    }

    pub fn child_at(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.node(id).children.get(index).copied()
    }

    /// First child with the given name, in insertion order.
    pub fn child_by_name(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.node(id)
            .children
            .iter()
            .copied()
            .find(|&c| self.node(c).name() == Some(name))
    }

    pub fn attributes(&self, id: NodeId) -> &[Attribute] {
        self.node(id).attributes()
    }

    pub fn attribute_at(&self, id: NodeId, index: usize) -> Option<&Attribute> {
        self.node(id).attributes.get(index)
    }

    /// First attribute with the given name, in insertion order.
    pub fn attribute_by_name(&self, id: NodeId, name: &str) -> Option<&Attribute> {
        self.node(id)
            .attributes
            .iter()
            .find(|a| a.name() == Some(name))
    }

    pub fn push_attribute(&mut self, id: NodeId, attribute: Attribute) {
        self.node_mut(id).attributes.push(attribute);
    }

    /// Remove the first attribute with the given name. Returns it if found.
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Option<Attribute> {
        let node = self.node_mut(id);
        let pos = node.attributes.iter().position(|a| a.name() == Some(name))?;
        Some(node.attributes.remove(pos))
    }

    /// Whether `ancestor` appears on the parent chain of `node` (or is `node`).
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(id) = cursor {
            if id == ancestor {
                return true;
            }
            cursor = self.node(id).parent;
        }
        false
    }

    fn check_attachable(&self, parent: NodeId, child: NodeId) -> Result<()> {
        // Self-parenting, re-parenting the root, and attaching an ancestor
        // under its own descendant all fail the cycle invariant.
        if child == parent || child == self.root || self.is_ancestor_or_self(child, parent) {
            return Err(FluxionError::InvalidParent);
        }
        Ok(())
    }

    fn detach(&mut self, child: NodeId) {
        if let Some(old_parent) = self.node(child).parent {
            self.node_mut(old_parent).children.retain(|&c| c != child);
            self.node_mut(child).parent = None;
        }
    }

    /// Append `child` to `parent`'s child sequence and return its index.
    ///
    /// Detaches the child from any previous parent first. Fails with
    /// [`FluxionError::InvalidParent`] when the attachment would create a
    /// cycle.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<usize> {
        self.check_attachable(parent, child)?;
        self.detach(child);
        self.node_mut(parent).children.push(child);
        self.node_mut(child).parent = Some(parent);
        Ok(self.node(parent).children.len() - 1)
    }

    /// Insert `child` at `index`. An index past the end is a silent no-op.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) -> Result<()> {
        self.check_attachable(parent, child)?;
        if index > self.node(parent).children.len() {
            return Ok(());
        }
        self.detach(child);
        let index = index.min(self.node(parent).children.len());
        self.node_mut(parent).children.insert(index, child);
        self.node_mut(child).parent = Some(parent);
        Ok(())
    }

    /// Remove the first occurrence of `child` from `parent`'s children.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        let Some(pos) = self.node(parent).children.iter().position(|&c| c == child) else {
            return false;
        };
        self.node_mut(parent).children.remove(pos);
        if self.node(child).parent == Some(parent) {
            self.node_mut(child).parent = None;
        }
        true
    }

    /// Append a batch of children. Every attachment is checked against the
    /// cycle invariant before any mutation happens.
    pub fn add_children(&mut self, parent: NodeId, children: &[NodeId]) -> Result<()> {
        for &child in children {
            self.check_attachable(parent, child)?;
        }
        for &child in children {
            self.add_child(parent, child)?;
        }
        Ok(())
    }

    /// Deep-copy a subtree. The copy is detached; `spec` selects which parts
    /// of the top node to carry over. Copied descendants are copied whole.
    pub fn clone_node(&mut self, source: NodeId, spec: &CloneSpec) -> NodeId {
        let src = self.node(source);
        let name = if spec.name { src.name.clone() } else { None };
        let value = if spec.value {
            src.value.clone()
        } else {
            Value::Null
        };
        let attributes = if spec.attributes {
            src.attributes.clone()
        } else {
            Vec::new()
        };
        let children = if spec.children {
            src.children.clone()
        } else {
            Vec::new()
        };

        let copy = self.create_node(name.as_deref(), value);
        self.node_mut(copy).attributes = attributes;
        for child in children {
            let child_copy = self.clone_node(child, &CloneSpec::all());
            self.node_mut(copy).children.push(child_copy);
            self.node_mut(child_copy).parent = Some(copy);
        }
        copy
    }

    /// Structural equality of two subtrees, possibly across documents:
    /// name, value (tolerance-aware), then children and attributes as
    /// ordered sequences.
    pub fn eq_nodes(
        &self,
        a: NodeId,
        other: &Document,
        b: NodeId,
        tolerance: &Tolerance,
    ) -> bool {
        let na = self.node(a);
        let nb = other.node(b);
        if na.name != nb.name || !na.value.approx_eq(&nb.value, tolerance) {
            return false;
        }
        if na.attributes.len() != nb.attributes.len() || na.children.len() != nb.children.len() {
            return false;
        }
        if !na
            .attributes
            .iter()
            .zip(&nb.attributes)
            .all(|(x, y)| x.approx_eq(y, tolerance))
        {
            return false;
        }
        na.children
            .iter()
            .zip(&nb.children)
            .all(|(&x, &y)| self.eq_nodes(x, other, y, tolerance))
    }

    /// Structural equality of two subtrees within this document.
    pub fn deep_eq(&self, a: NodeId, b: NodeId, tolerance: &Tolerance) -> bool {
        self.eq_nodes(a, self, b, tolerance)
    }

    /// Structural equality of two whole documents (root against root).
    pub fn content_eq(&self, other: &Document, tolerance: &Tolerance) -> bool {
        self.eq_nodes(self.root, other, other.root, tolerance)
    }
}
