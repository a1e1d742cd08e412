// Copyright (c) cstep contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Leaf and node types of the concrete syntax tree.
//!
//! A [`SourceNode`] is an ordered list of [`SourceValue`]s: child nodes,
//! tokens and literal text gaps. Concatenating the values in order gives
//! the node's source text; this is the only reconstruction rule.
//!
//! Identity is carried by integers rather than by object addresses:
//!
//! - [`NodeId`] is structural identity. A copy of a node keeps its id, so a
//!   modification aimed at the original still finds the copy.
//! - [`TokenId`] identifies a token across every copy of its node.
//! - [`Handle`] is the arena slot. Every copy gets a new handle.

use std::fmt;

use cstep_core::Span;
use cstep_cparse::{ParseNodeId, TokenKind};

// ============================================================================
// Identity
// ============================================================================

/// Structural identity of a node, stable across copies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identity of a token, stable across copies of its node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenId(pub u32);

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// Index of a node in its [`SourceTree`](crate::SourceTree) arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(u32);

impl Handle {
    pub(crate) fn new(index: usize) -> Self {
        Handle(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Node and token counters of one tree.
///
/// A fresh allocator starts both counters at zero, so ids are reproducible
/// for the same input file.
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    next_node: u32,
    next_token: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        IdAllocator::default()
    }

    pub fn node(&mut self) -> NodeId {
        let id = NodeId(self.next_node);
        self.next_node += 1;
        id
    }

    pub fn token(&mut self) -> TokenId {
        let id = TokenId(self.next_token);
        self.next_token += 1;
        id
    }
}

// ============================================================================
// Leaves
// ============================================================================

/// Literal text: a gap between tokens in the original, or inserted text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceText {
    /// Where the text came from; `None` for inserted text.
    pub span: Option<Span>,
    pub text: String,
}

impl SourceText {
    pub fn new(text: impl Into<String>) -> Self {
        SourceText {
            span: None,
            text: text.into(),
        }
    }

    pub fn at(span: Span, text: impl Into<String>) -> Self {
        SourceText {
            span: Some(span),
            text: text.into(),
        }
    }
}

/// A lexical token of the original source.
///
/// Equality compares ids only.
#[derive(Debug, Clone)]
pub struct SourceToken {
    pub id: TokenId,
    pub kind: TokenKind,
    pub spelling: String,
    pub span: Span,
    /// Exact source bytes of the token.
    pub text: String,
}

impl PartialEq for SourceToken {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for SourceToken {}

impl SourceToken {
    /// True if the token has `kind` and, when given, `spelling`.
    pub fn matches(&self, kind: TokenKind, spelling: Option<&str>) -> bool {
        self.kind == kind && spelling.map_or(true, |s| self.spelling == s)
    }
}

/// One entry of a node's value list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceValue {
    Node(Handle),
    Token(SourceToken),
    Text(SourceText),
}

impl SourceValue {
    pub fn as_node(&self) -> Option<Handle> {
        match self {
            SourceValue::Node(handle) => Some(*handle),
            _ => None,
        }
    }

    pub fn as_token(&self) -> Option<&SourceToken> {
        match self {
            SourceValue::Token(token) => Some(token),
            _ => None,
        }
    }
}

// ============================================================================
// Nodes
// ============================================================================

/// A composite CST node.
#[derive(Debug, Clone)]
pub struct SourceNode {
    pub id: NodeId,
    /// The parse node this was built from; `None` for synthetic nodes.
    pub origin: Option<ParseNodeId>,
    /// Byte range in the original source, for built nodes and their copies.
    pub span: Option<Span>,
    /// Parent in the original tree. Copies keep the original's parent.
    pub parent: Option<Handle>,
    pub values: Vec<SourceValue>,
}

impl SourceNode {
    pub fn is_synthetic(&self) -> bool {
        self.origin.is_none()
    }

    /// Child node handles in order.
    pub fn children(&self) -> impl Iterator<Item = Handle> + '_ {
        self.values.iter().filter_map(SourceValue::as_node)
    }

    /// Tokens held directly by this node, in order.
    pub fn tokens(&self) -> impl Iterator<Item = &SourceToken> + '_ {
        self.values.iter().filter_map(SourceValue::as_token)
    }
}
