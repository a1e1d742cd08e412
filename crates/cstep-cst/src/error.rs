// Copyright (c) cstep contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Errors raised while building or rewriting a [`SourceTree`](crate::SourceTree).

use thiserror::Error;

use crate::node::NodeId;

/// Errors from the CST builder, the modification constructors and the
/// rewrite applier.
///
/// The variants fall into three groups:
///
/// | Group | Variants |
/// |-------|----------|
/// | Build invariant | `RoundTripMismatch`, `InvalidExtent` |
/// | Metadata precondition | `MissingToken`, `ChildCountMismatch` |
/// | Contract violation | `OverlappingChanges`, `UnsupportedIdentifierTarget`, `PlaceholderOutOfRange`, `UnresolvableCompound` |
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CstError {
    /// Stringifying the freshly built tree did not give back the input.
    #[error("round-trip mismatch at byte {offset}: rebuilt source differs from input")]
    RoundTripMismatch { offset: usize },

    /// A parse node extent does not map to a byte range of the source.
    #[error("invalid extent for {kind} node at {location}")]
    InvalidExtent { kind: String, location: String },

    /// A token-level edit named a token the node does not hold.
    #[error("{node_kind} node has no {token_kind} token{}", spelling_suffix(.spelling))]
    MissingToken {
        node_kind: String,
        token_kind: String,
        spelling: Option<String>,
    },

    /// More than one replace modification applies to the same node.
    #[error("overlapping changes: {count} modifications apply to node {node}")]
    OverlappingChanges { node: NodeId, count: usize },

    /// Identifier replacement was requested on a node shape that is not
    /// known to hold exactly one declared name.
    #[error("identifier replacement is only supported on VarDecl, not {kind}")]
    UnsupportedIdentifierTarget { kind: String },

    /// A template refers to a slot that no insertion fills.
    #[error("template placeholder {{{index}}} has no insertion ({available} given)")]
    PlaceholderOutOfRange { index: usize, available: usize },

    /// A children replacement did not supply one insertion per child.
    #[error("{kind} node has {expected} children but {actual} replacements were given")]
    ChildCountMismatch {
        kind: String,
        expected: usize,
        actual: usize,
    },

    /// An untargeted compound has targets outside any single original tree.
    #[error("no common ancestor for the targets of a compound modification")]
    UnresolvableCompound,
}

impl CstError {
    /// True for errors that indicate a rule-set bug rather than bad input.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            CstError::OverlappingChanges { .. }
                | CstError::UnsupportedIdentifierTarget { .. }
                | CstError::PlaceholderOutOfRange { .. }
                | CstError::UnresolvableCompound
        )
    }
}

fn spelling_suffix(spelling: &Option<String>) -> String {
    match spelling {
        Some(s) => format!(" '{}'", s),
        None => String::new(),
    }
}
