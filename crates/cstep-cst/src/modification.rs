// Copyright (c) cstep contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Declarative edits over a [`SourceTree`].
//!
//! Modifications are values. Building one never touches the tree; the
//! [`Rewriter`](crate::Rewriter) performs them later. There are two
//! families with disjoint operations:
//!
//! - [`Insert`] produces a new node on demand and has no target.
//! - [`Replace`] is anchored to one original node by [`NodeId`] and turns
//!   the rewritten version of that node into its replacement.
//!
//! | Replace | Effect on the target |
//! |---------|----------------------|
//! | `Node` | replaced by an insertion |
//! | `Token` | one token replaced by the text of an insertion |
//! | `AfterToken` | text spliced in after one token |
//! | `Children` | every child replaced, one insertion each |
//! | `Compound` | nested replacements applied inside the target |
//! | `Templated` | replaced by a template over insertions |
//! | `Ext` | a domain-specific shape, see [`Extension`] |
//!
//! # Compound targets
//!
//! A compound without an explicit target applies at the lowest common
//! ancestor of its children's targets: the deepest node whose subtree
//! holds every target, so that no child of it does. This merges edits to
//! sibling subexpressions into one edit of their parent.

use std::fmt;

use cstep_cparse::{NodeKind, TokenKind};

use crate::apply::Rewriter;
use crate::error::CstError;
use crate::node::{Handle, NodeId, TokenId};
use crate::template::{Piece, Template};
use crate::tree::SourceTree;

// ============================================================================
// Extension seam
// ============================================================================

/// Domain-specific replace shapes.
///
/// An extension is applied like any other [`Replace`]: the rewriter calls
/// [`Extension::apply`] with the already rewritten target, and the
/// extension may build nodes, apply nested modifications, and update its
/// `State` (for example a counter of emitted references).
pub trait Extension: Sized + fmt::Debug {
    /// Mutable state threaded through one rewrite.
    type State;
    /// Error type of the rewrite; must absorb engine errors.
    type Error: From<CstError> + fmt::Debug;

    /// The original node this shape replaces.
    fn target(&self) -> Handle;

    /// Produce the replacement for `node`, the rewritten target.
    fn apply(&self, rewriter: &mut Rewriter<'_, Self>, node: Handle) -> Result<Handle, Self::Error>;

    /// One-line label for debug output.
    fn label(&self, tree: &SourceTree) -> String;

    /// Modifications nested in this shape, for debug output.
    fn nested(&self) -> Vec<&Replace<Self>> {
        Vec::new()
    }
}

/// The empty extension: only the built-in shapes exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoExtension {}

impl Extension for NoExtension {
    type State = ();
    type Error = CstError;

    fn target(&self) -> Handle {
        match *self {}
    }

    fn apply(&self, _: &mut Rewriter<'_, Self>, _: Handle) -> Result<Handle, CstError> {
        match *self {}
    }

    fn label(&self, _: &SourceTree) -> String {
        match *self {}
    }
}

// ============================================================================
// Insert
// ============================================================================

/// Produces a new node; has no target.
#[derive(Debug, Clone)]
pub enum Insert<X: Extension = NoExtension> {
    /// Literal text.
    Constant(String),
    /// The node itself, shared.
    Copy(Handle),
    /// The node with nested replacements applied inside it.
    CopyReplace {
        source: Handle,
        replacements: Vec<Replace<X>>,
    },
    /// A template whose slots are filled by nested insertions.
    Template {
        template: Template,
        insertions: Vec<Insert<X>>,
    },
}

impl<X: Extension> Insert<X> {
    pub fn constant(text: impl Into<String>) -> Self {
        Insert::Constant(text.into())
    }

    pub fn copy(source: Handle) -> Self {
        Insert::Copy(source)
    }

    /// Copy `source` with `replacements` applied; a plain copy when there
    /// are none.
    pub fn copy_replace(source: Handle, replacements: Vec<Replace<X>>) -> Self {
        if replacements.is_empty() {
            Insert::Copy(source)
        } else {
            Insert::CopyReplace {
                source,
                replacements,
            }
        }
    }

    pub fn template(text: &str, insertions: Vec<Insert<X>>) -> Result<Self, CstError> {
        let template = Template::parse(text);
        template.check(insertions.len())?;
        Ok(Insert::Template {
            template,
            insertions,
        })
    }

    /// Join parts with `separator` by folding a binary template:
    /// `[a, b, c]` becomes `((a, b), c)` as nested templates.
    pub fn join(separator: &str, parts: Vec<Insert<X>>) -> Self {
        let pair = Template::from_pieces(vec![
            Piece::Slot(0),
            Piece::Text(separator.to_string()),
            Piece::Slot(1),
        ]);
        let mut parts = parts.into_iter();
        let Some(first) = parts.next() else {
            return Insert::Constant(String::new());
        };
        parts.fold(first, |acc, next| Insert::Template {
            template: pair.clone(),
            insertions: vec![acc, next],
        })
    }

    /// `a, b, c`.
    pub fn comma(parts: Vec<Insert<X>>) -> Self {
        Insert::join(", ", parts)
    }

    /// `(a, b, c)`.
    pub fn comma_parenthesized(parts: Vec<Insert<X>>) -> Self {
        Insert::wrap("(", Insert::comma(parts), ")")
    }

    /// `open` + inner + `close`.
    pub fn wrap(open: &str, inner: Insert<X>, close: &str) -> Self {
        Insert::Template {
            template: Template::from_pieces(vec![
                Piece::Text(open.to_string()),
                Piece::Slot(0),
                Piece::Text(close.to_string()),
            ]),
            insertions: vec![inner],
        }
    }

    /// `lhs = rhs`.
    pub fn assignment(lhs: Insert<X>, rhs: Insert<X>) -> Self {
        Insert::Template {
            template: Template::parse("{0} = {1}"),
            insertions: vec![lhs, rhs],
        }
    }
}

// ============================================================================
// Replace
// ============================================================================

/// Anchored to one original node; turns its rewritten form into a
/// replacement.
#[derive(Debug, Clone)]
pub enum Replace<X: Extension = NoExtension> {
    Node {
        target: Handle,
        insertion: Insert<X>,
    },
    Token {
        target: Handle,
        token: TokenId,
        insertion: Insert<X>,
    },
    AfterToken {
        target: Handle,
        token: TokenId,
        insertion: Insert<X>,
    },
    Children {
        target: Handle,
        insertions: Vec<Insert<X>>,
    },
    Compound {
        target: Option<Handle>,
        modifications: Vec<Replace<X>>,
    },
    Templated {
        target: Handle,
        template: Template,
        insertions: Vec<Insert<X>>,
    },
    Ext(X),
}

impl<X: Extension> Replace<X> {
    // ========================================================================
    // Constructors
    // ========================================================================

    pub fn node(target: Handle, insertion: Insert<X>) -> Self {
        Replace::Node { target, insertion }
    }

    /// Replace the token `token` of `target`.
    pub fn token(
        tree: &SourceTree,
        target: Handle,
        token: TokenId,
        insertion: Insert<X>,
    ) -> Result<Self, CstError> {
        if !tree.has_token(target, token) {
            return Err(missing_token(tree, target, "token", Some(token.to_string())));
        }
        Ok(Replace::Token {
            target,
            token,
            insertion,
        })
    }

    /// Replace the first token of `kind` (and `spelling`) in `target`.
    pub fn token_of_kind(
        tree: &SourceTree,
        target: Handle,
        kind: TokenKind,
        spelling: Option<&str>,
        insertion: Insert<X>,
    ) -> Result<Self, CstError> {
        let token = select_token(tree, target, kind, spelling)?;
        Ok(Replace::Token {
            target,
            token,
            insertion,
        })
    }

    /// Splice text in after the first token of `kind` (and `spelling`).
    pub fn after_token_of_kind(
        tree: &SourceTree,
        target: Handle,
        kind: TokenKind,
        spelling: Option<&str>,
        insertion: Insert<X>,
    ) -> Result<Self, CstError> {
        let token = select_token(tree, target, kind, spelling)?;
        Ok(Replace::AfterToken {
            target,
            token,
            insertion,
        })
    }

    /// Rename the variable declared by a `VarDecl`.
    pub fn identifier(tree: &SourceTree, target: Handle, name: &str) -> Result<Self, CstError> {
        if tree.kind(target) != Some(&NodeKind::VarDecl) {
            return Err(CstError::UnsupportedIdentifierTarget {
                kind: tree.kind_name(target).to_string(),
            });
        }
        let declared = tree.parse_node(target).and_then(|n| n.spelling.clone());
        Replace::token_of_kind(
            tree,
            target,
            TokenKind::Identifier,
            declared.as_deref(),
            Insert::constant(name),
        )
    }

    /// Replace every child of `target`, one insertion per child.
    pub fn children(
        tree: &SourceTree,
        target: Handle,
        insertions: Vec<Insert<X>>,
    ) -> Result<Self, CstError> {
        let expected = tree.children(target).count();
        if expected != insertions.len() {
            return Err(CstError::ChildCountMismatch {
                kind: tree.kind_name(target).to_string(),
                expected,
                actual: insertions.len(),
            });
        }
        Ok(Replace::Children { target, insertions })
    }

    /// Compound applied at the common ancestor of its children's targets.
    pub fn compound(modifications: Vec<Replace<X>>) -> Self {
        Replace::Compound {
            target: None,
            modifications,
        }
    }

    /// Compound applied at `target`.
    pub fn compound_at(target: Handle, modifications: Vec<Replace<X>>) -> Self {
        Replace::Compound {
            target: Some(target),
            modifications,
        }
    }

    pub fn templated(target: Handle, text: &str, insertions: Vec<Insert<X>>) -> Result<Self, CstError> {
        let template = Template::parse(text);
        template.check(insertions.len())?;
        Ok(Replace::Templated {
            target,
            template,
            insertions,
        })
    }

    // ========================================================================
    // Targets
    // ========================================================================

    /// The explicit target, if any.
    pub fn explicit_target(&self) -> Option<Handle> {
        match self {
            Replace::Node { target, .. }
            | Replace::Token { target, .. }
            | Replace::AfterToken { target, .. }
            | Replace::Children { target, .. }
            | Replace::Templated { target, .. } => Some(*target),
            Replace::Compound { target, .. } => *target,
            Replace::Ext(ext) => Some(ext.target()),
        }
    }

    /// Identity of the node this modification applies to.
    ///
    /// An untargeted compound resolves to the lowest common ancestor of its
    /// children's resolved targets; an empty one resolves to nothing.
    pub fn resolve_target(&self, tree: &SourceTree) -> Result<Option<NodeId>, CstError> {
        if let Some(target) = self.explicit_target() {
            return Ok(Some(tree.node_id(target)));
        }
        let Replace::Compound { modifications, .. } = self else {
            return Ok(None);
        };
        let mut ids = Vec::with_capacity(modifications.len());
        for modification in modifications {
            if let Some(id) = modification.resolve_target(tree)? {
                ids.push(id);
            }
        }
        if ids.is_empty() {
            return Ok(None);
        }
        tree.lowest_common_ancestor(&ids)
            .map(|h| Some(tree.node_id(h)))
            .ok_or(CstError::UnresolvableCompound)
    }

    /// True if this modification applies to `node`.
    pub fn is_applicable(&self, tree: &SourceTree, node: Handle) -> Result<bool, CstError> {
        Ok(self.resolve_target(tree)? == Some(tree.node_id(node)))
    }

    /// True if this modification applies to `node` or to a node below it
    /// in the original tree.
    pub fn applies_within(&self, tree: &SourceTree, node: Handle) -> Result<bool, CstError> {
        let Some(id) = self.resolve_target(tree)? else {
            return Ok(false);
        };
        Ok(tree.original(id).is_some_and(|target| tree.is_within(target, node)))
    }
}

/// Where an untargeted compound over `modifications` applies, by the
/// literal rule: every modification applies within `node`, and no child
/// of `node` has the same property.
pub fn compound_applies_at<X: Extension>(
    tree: &SourceTree,
    node: Handle,
    modifications: &[Replace<X>],
) -> Result<bool, CstError> {
    let all_within = |at: Handle| -> Result<bool, CstError> {
        for modification in modifications {
            if !modification.applies_within(tree, at)? {
                return Ok(false);
            }
        }
        Ok(!modifications.is_empty())
    };
    if !all_within(node)? {
        return Ok(false);
    }
    for child in tree.children(node) {
        if all_within(child)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn select_token(
    tree: &SourceTree,
    target: Handle,
    kind: TokenKind,
    spelling: Option<&str>,
) -> Result<TokenId, CstError> {
    tree.find_token(target, kind, spelling)
        .map(|t| t.id)
        .ok_or_else(|| missing_token(tree, target, kind.as_str(), spelling.map(str::to_string)))
}

fn missing_token(tree: &SourceTree, target: Handle, token_kind: &str, spelling: Option<String>) -> CstError {
    CstError::MissingToken {
        node_kind: tree.kind_name(target).to_string(),
        token_kind: token_kind.to_string(),
        spelling,
    }
}
