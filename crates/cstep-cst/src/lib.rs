// Copyright (c) cstep contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! A round-tripping C concrete syntax tree and a declarative rewrite engine.
//!
//! # Overview
//!
//! - **Building**: [`SourceTree::build`] splits a source file along its parse
//!   tree into nodes, tokens and text gaps, and checks that the result
//!   stringifies back to the exact input.
//! - **Describing edits**: [`Insert`] and [`Replace`] values describe edits
//!   without performing them.
//! - **Applying edits**: [`Rewriter`] applies a modification forest depth
//!   first and returns a new root that shares unchanged subtrees.
//! - **Producing edits**: [`visitor::SourceVisitor`] dispatches on node kind
//!   and merges child results bottom-up.
//!
//! # Quick Start
//!
//! ```
//! use cstep_cparse::{parse_translation_unit, NodeKind};
//! use cstep_cst::{apply_modifications, Insert, Replace, SourceTree};
//!
//! let source = "int main(void) { return 40 + 2; }";
//! let mut tree = SourceTree::build(source, parse_translation_unit(source).unwrap()).unwrap();
//! assert_eq!(tree.stringify(tree.root()), source);
//!
//! let sum = tree
//!     .original_nodes()
//!     .find(|&h| tree.kind(h) == Some(&NodeKind::BinaryOperator))
//!     .unwrap();
//! let root = apply_modifications(&mut tree, &[Replace::node(sum, Insert::constant("42"))]).unwrap();
//! assert_eq!(tree.stringify(root), "int main(void) { return 42; }");
//! ```

// ============================================================================
// Public modules and re-exports
// ============================================================================

/// Applying modification forests.
pub mod apply;
/// Building a tree from a parse tree, and the round-trip check.
pub mod builder;
pub mod error;
/// The modification algebra.
pub mod modification;
pub mod node;
/// Debug printers for trees and modifications.
pub mod printer;
pub mod template;
pub mod tree;
/// Kind-dispatched visitors.
pub mod visitor;

pub use apply::{apply_modifications, Rewriter};
pub use builder::check_round_trip;
pub use error::CstError;
pub use modification::{compound_applies_at, Extension, Insert, NoExtension, Replace};
pub use node::{Handle, IdAllocator, NodeId, SourceNode, SourceText, SourceToken, SourceValue, TokenId};
pub use printer::{describe, SourceTreePrinter};
pub use template::Template;
pub use tree::SourceTree;
