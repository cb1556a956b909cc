// Copyright 2025 TAKKT Industrial & Packaging GmbH
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

//! The position-preserving YAML document model.
//!
//! A [`Node`] is a cheaply-clonable handle onto a shared, mutable YAML value. Besides the value
//! itself, every node carries the source file and line/column it was parsed from, so that callers
//! can point at exactly where a piece of a composed template came from. Structural equality
//! ([`Node::eq_structural`]) ignores all of that positional bookkeeping, as well as scalar quoting
//! style, so that two nodes written differently but meaning the same thing compare equal.

use std::cell::RefCell;
use std::rc::Rc;

/// Stable identity for a [`Node`], unique within a single composition run.
pub type NodeId = u64;

/// A monotonic generator of [`NodeId`]s, shared across every file parsed during one composition.
///
/// Node identity has to stay unique across every fragment merged into a template, not just within
/// a single parsed file, since the origin index is keyed on it.
#[derive(Debug, Default)]
pub struct NodeIdGen(RefCell<NodeId>);

impl NodeIdGen {
    /// Create a fresh generator, starting after the reserved zero-node id.
    pub fn new() -> Self {
        NodeIdGen(RefCell::new(1))
    }

    /// Allocate the next id.
    pub fn next(&self) -> NodeId {
        let mut counter = self.0.borrow_mut();
        let id = *counter;
        *counter += 1;
        id
    }
}

/// The original quoting/block style of a scalar, preserved purely for round-tripping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarStyle {
    /// Unquoted, e.g. `foo`.
    Plain,
    /// `'foo'`.
    SingleQuoted,
    /// `"foo"`.
    DoubleQuoted,
    /// Block literal, `|`.
    Literal,
    /// Block folded, `>`.
    Folded,
}

/// Source location of a [`Node`], 1-based to match how editors report positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    /// Name of the file the node was parsed from.
    pub file: String,
    /// 1-based line number.
    pub line: usize,
    /// 1-based column number.
    pub column: usize,
}

impl Position {
    /// A position with no meaningful location, used for nodes synthesized by the engine itself
    /// (for instance a rewritten `Code` property after packaging).
    pub fn synthetic() -> Position {
        Position {
            file: String::new(),
            line: 0,
            column: 0,
        }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "\"{}\" at Ln {}, Col {}", self.file, self.line, self.column)
    }
}

/// The value held by a [`Node`].
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// The zero/sentinel node: an explicitly absent value, distinct from an explicit YAML null.
    Absent,
    /// A scalar leaf.
    Scalar {
        /// The scalar's textual value, after quote/escape resolution.
        value: String,
    },
    /// An ordered sequence.
    Sequence(Vec<Node>),
    /// An ordered mapping. Order is preserved; lookups are linear, matching CloudFormation
    /// templates which are small enough that this never matters in practice.
    Mapping(Vec<(Node, Node)>),
    /// A `*name` alias, resolving structurally to the content of its anchor.
    Alias(Node),
}

#[derive(Debug)]
struct NodeData {
    id: NodeId,
    kind: NodeKind,
    tag: Option<String>,
    anchor: Option<String>,
    flow: bool,
    style: ScalarStyle,
    position: Position,
}

/// A node in the YAML document model.
///
/// Cloning a [`Node`] is cheap (an `Rc` bump) and shares the same underlying data; this is what
/// lets the merger reuse a parsed fragment's subtree directly in a composed template without
/// deep-copying it.
#[derive(Debug, Clone)]
pub struct Node(Rc<RefCell<NodeData>>);

impl Node {
    fn new(id: NodeId, kind: NodeKind, position: Position) -> Node {
        Node(Rc::new(RefCell::new(NodeData {
            id,
            kind,
            tag: None,
            anchor: None,
            flow: false,
            style: ScalarStyle::Plain,
            position,
        })))
    }

    /// The zero/sentinel node, used as the "no value here" placeholder.
    pub fn zero() -> Node {
        Node::new(0, NodeKind::Absent, Position::synthetic())
    }

    /// Construct a scalar node.
    pub fn new_scalar(id: NodeId, value: impl Into<String>, tag: Option<String>, style: ScalarStyle, position: Position) -> Node {
        let node = Node::new(id, NodeKind::Scalar { value: value.into() }, position);
        {
            let mut data = node.0.borrow_mut();
            data.style = style;
            data.tag = tag;
        }
        node
    }

    /// Construct a scalar node with no position information, for values synthesized by the engine.
    pub fn synthetic_scalar(value: impl Into<String>) -> Node {
        Node::new(0, NodeKind::Scalar { value: value.into() }, Position::synthetic())
    }

    /// Construct a sequence node.
    pub fn new_sequence(id: NodeId, items: Vec<Node>, flow: bool, tag: Option<String>, position: Position) -> Node {
        let node = Node::new(id, NodeKind::Sequence(items), position);
        {
            let mut data = node.0.borrow_mut();
            data.flow = flow;
            data.tag = tag;
        }
        node
    }

    /// Construct a mapping node.
    pub fn new_mapping(id: NodeId, entries: Vec<(Node, Node)>, flow: bool, tag: Option<String>, position: Position) -> Node {
        let node = Node::new(id, NodeKind::Mapping(entries), position);
        {
            let mut data = node.0.borrow_mut();
            data.flow = flow;
            data.tag = tag;
        }
        node
    }

    /// Construct an empty, synthetic mapping, used for sections the engine has to materialize
    /// even when no fragment ever defined them (`Resources`, most notably).
    pub fn synthetic_mapping() -> Node {
        Node::new(0, NodeKind::Mapping(Vec::new()), Position::synthetic())
    }

    /// Construct an alias node resolving to `target`.
    pub fn new_alias(id: NodeId, target: Node, anchor_name: Option<String>, position: Position) -> Node {
        let node = Node::new(id, NodeKind::Alias(target), position);
        node.0.borrow_mut().anchor = anchor_name;
        node
    }

    /// Record the anchor name this node was defined under, if any.
    pub fn set_anchor(&self, name: String) {
        self.0.borrow_mut().anchor = Some(name);
    }

    /// The anchor name this node was defined under, if any.
    pub fn anchor(&self) -> Option<String> {
        self.0.borrow().anchor.clone()
    }

    /// This node's stable identity.
    pub fn id(&self) -> NodeId {
        self.0.borrow().id
    }

    /// Where this node was parsed from.
    pub fn position(&self) -> Position {
        self.0.borrow().position.clone()
    }

    /// Whether this is the zero/sentinel node.
    pub fn is_zero(&self) -> bool {
        matches!(self.0.borrow().kind, NodeKind::Absent)
    }

    /// Follow the alias chain, if any, returning the node whose content should actually be read.
    ///
    /// Cheap: every step is an `Rc` clone, not a deep copy.
    pub fn content(&self) -> Node {
        if let NodeKind::Alias(target) = &self.0.borrow().kind {
            return target.content();
        }
        self.clone()
    }

    /// Whether this node (after alias resolution) is a scalar.
    pub fn is_scalar(&self) -> bool {
        matches!(self.content().0.borrow().kind, NodeKind::Scalar { .. })
    }

    /// Whether this node (after alias resolution) is a mapping.
    pub fn is_mapping(&self) -> bool {
        matches!(self.content().0.borrow().kind, NodeKind::Mapping(_))
    }

    /// Whether this node (after alias resolution) is a sequence.
    pub fn is_sequence(&self) -> bool {
        matches!(self.content().0.borrow().kind, NodeKind::Sequence(_))
    }

    /// The scalar value, if this node (after alias resolution) is a scalar.
    pub fn as_scalar_str(&self) -> Option<String> {
        match &self.content().0.borrow().kind {
            NodeKind::Scalar { value, .. } => Some(value.clone()),
            _ => None,
        }
    }

    /// This node's tag suffix, if present (e.g. `"GetAtt"` for `!GetAtt`).
    pub fn tag(&self) -> Option<String> {
        self.content().0.borrow().tag.clone()
    }

    /// A clone of this mapping's entries, if this node (after alias resolution) is a mapping.
    pub fn mapping_entries(&self) -> Vec<(Node, Node)> {
        match &self.content().0.borrow().kind {
            NodeKind::Mapping(entries) => entries.clone(),
            _ => Vec::new(),
        }
    }

    /// A clone of this sequence's items, if this node (after alias resolution) is a sequence.
    pub fn sequence_items(&self) -> Vec<Node> {
        match &self.content().0.borrow().kind {
            NodeKind::Sequence(items) => items.clone(),
            _ => Vec::new(),
        }
    }

    /// Look up a mapping value by its string key, comparing against scalar keys only.
    pub fn mapping_lookup(&self, key: &str) -> Option<Node> {
        self.mapping_entries()
            .into_iter()
            .find(|(k, _)| k.as_scalar_str().as_deref() == Some(key))
            .map(|(_, v)| v)
    }

    /// Append an entry to a mapping node in place.
    ///
    /// Panics if this node is not a mapping; callers only ever call this on nodes they know to be
    /// section containers.
    pub fn push_mapping_entry(&self, key: Node, value: Node) {
        let resolved = self.content();
        let mut data = resolved.0.borrow_mut();
        match &mut data.kind {
            NodeKind::Mapping(entries) => entries.push((key, value)),
            _ => panic!("push_mapping_entry called on a non-mapping node"),
        }
    }

    /// Replace the value associated with `key` in a mapping node in place.
    ///
    /// Returns whether an entry with that key existed.
    pub fn replace_mapping_value(&self, key: &str, value: Node) -> bool {
        let resolved = self.content();
        let mut data = resolved.0.borrow_mut();
        match &mut data.kind {
            NodeKind::Mapping(entries) => {
                for (k, v) in entries.iter_mut() {
                    if k.as_scalar_str().as_deref() == Some(key) {
                        *v = value;
                        return true;
                    }
                }
                false
            }
            _ => false,
        }
    }

    /// Append an item to a sequence node in place.
    pub fn push_sequence_item(&self, item: Node) {
        let resolved = self.content();
        let mut data = resolved.0.borrow_mut();
        match &mut data.kind {
            NodeKind::Sequence(items) => items.push(item),
            _ => panic!("push_sequence_item called on a non-sequence node"),
        }
    }

    /// Whether this node's own kind (not resolved through aliases) is a flow-style collection.
    pub fn is_flow(&self) -> bool {
        self.0.borrow().flow
    }

    /// The original quoting style of a scalar.
    pub fn scalar_style(&self) -> ScalarStyle {
        self.0.borrow().style
    }

    /// The direct children of this node, for subtree traversal (origin stamping, deep walks).
    ///
    /// Does not follow aliases: an alias node has no children of its own, since its target was
    /// already visited at its own defining location.
    pub fn children(&self) -> Vec<Node> {
        match &self.0.borrow().kind {
            NodeKind::Absent | NodeKind::Scalar { .. } | NodeKind::Alias(_) => Vec::new(),
            NodeKind::Sequence(items) => items.clone(),
            NodeKind::Mapping(entries) => entries.iter().flat_map(|(k, v)| vec![k.clone(), v.clone()]).collect(),
        }
    }

    /// Structural equality: ignores position, quoting style, flow-vs-block and anchor naming, and
    /// resolves aliases to their target's content before comparing.
    pub fn eq_structural(a: &Node, b: &Node) -> bool {
        let a = a.content();
        let b = b.content();
        let a_ref = a.0.borrow();
        let b_ref = b.0.borrow();
        if a_ref.tag != b_ref.tag {
            return false;
        }
        match (&a_ref.kind, &b_ref.kind) {
            (NodeKind::Absent, NodeKind::Absent) => true,
            (NodeKind::Scalar { value: v1 }, NodeKind::Scalar { value: v2 }) => v1 == v2,
            (NodeKind::Sequence(i1), NodeKind::Sequence(i2)) => {
                i1.len() == i2.len() && i1.iter().zip(i2.iter()).all(|(x, y)| Node::eq_structural(x, y))
            }
            (NodeKind::Mapping(e1), NodeKind::Mapping(e2)) => {
                e1.len() == e2.len()
                    && e1
                        .iter()
                        .zip(e2.iter())
                        .all(|((k1, v1), (k2, v2))| Node::eq_structural(k1, k2) && Node::eq_structural(v1, v2))
            }
            _ => false,
        }
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        Node::eq_structural(self, other)
    }
}
