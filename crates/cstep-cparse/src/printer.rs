// Copyright (c) cstep contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Indented debug dump of a [`ParseTree`].

use std::fmt::Write;

use cstep_core::LineIndex;

use crate::tree::{ParseNodeId, ParseTree};

/// Prints one line per node:
/// `Kind: type=int name=a loc=l1c5 code="a + 1"`.
pub struct ParseTreePrinter<'a> {
    tree: &'a ParseTree,
    source: &'a str,
    index: LineIndex,
    /// Longest code excerpt before it is elided.
    pub max_code: usize,
}

impl<'a> ParseTreePrinter<'a> {
    pub fn new(tree: &'a ParseTree, source: &'a str) -> Self {
        ParseTreePrinter {
            tree,
            source,
            index: LineIndex::new(source),
            max_code: 40,
        }
    }

    pub fn print(&self) -> String {
        let mut out = String::new();
        self.print_node(self.tree.root(), 0, &mut out);
        out
    }

    fn print_node(&self, id: ParseNodeId, depth: usize, out: &mut String) {
        let node = self.tree.node(id);
        let _ = write!(out, "{}{}:", "  ".repeat(depth), node.kind);
        if let Some(ty) = &node.type_spelling {
            let _ = write!(out, " type={}", ty);
        }
        if let Some(name) = &node.spelling {
            let _ = write!(out, " name={}", name);
        }
        let _ = write!(out, " loc={}", node.extent.start);
        if let Some(code) = self.code(id) {
            let _ = write!(out, " code={:?}", code);
        }
        out.push('\n');
        for &child in self.tree.children(id) {
            self.print_node(child, depth + 1, out);
        }
    }

    fn code(&self, id: ParseNodeId) -> Option<String> {
        let extent = self.tree.node(id).extent;
        let start = self.index.offset(extent.start.line, extent.start.column)?;
        let end = self.index.offset(extent.end.line, extent.end.column)?;
        let text = self.source.get(start..end)?;
        if text.len() > self.max_code {
            let mut cut = self.max_code;
            while !text.is_char_boundary(cut) {
                cut -= 1;
            }
            Some(format!("{}...", &text[..cut]))
        } else {
            Some(text.to_string())
        }
    }
}
