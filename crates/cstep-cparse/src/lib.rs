// Copyright (c) cstep contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! C frontend boundary for cstep.
//!
//! The CST builder and the instrumentation only ever see a [`ParseTree`]:
//! node kinds, extents, children, tokens with owners, and type spellings.
//! This crate defines that contract and provides two ways to obtain one:
//!
//! - [`parse_translation_unit`]: a built-in lexer and recursive-descent
//!   parser for a practical C subset, with light clang-style typing
//! - [`ParseTree::from_json`]: a tree dumped by an external libclang-based
//!   frontend
//!
//! # Example
//!
//! ```
//! use cstep_cparse::{parse_translation_unit, NodeKind};
//!
//! let tree = parse_translation_unit("int main(void) { return 0; }").unwrap();
//! let root = tree.node(tree.root());
//! assert_eq!(root.kind, NodeKind::TranslationUnit);
//! ```

pub mod ctype;
pub mod error;
pub mod kind;
pub mod lexer;
mod parser;
pub mod printer;
pub mod tree;

pub use ctype::CType;
pub use error::{prettify_error, ParseError};
pub use kind::NodeKind;
pub use parser::parse_translation_unit;
pub use printer::ParseTreePrinter;
pub use tree::{
    Extent, Location, ParseNode, ParseNodeId, ParseTree, StorageClass, Token, TokenKind,
};
