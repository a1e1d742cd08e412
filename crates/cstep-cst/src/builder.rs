// Copyright (c) cstep contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Building a [`SourceTree`] from a parse tree.
//!
//! The builder splits each node's byte range into three kinds of value:
//!
//! | Value | Source |
//! |-------|--------|
//! | child node | a kept parse child, built recursively |
//! | token | a token the parse tree assigns to this node |
//! | text | every other byte (whitespace, comments, directives) |
//!
//! Parse extents are not always well nested, so children that escape
//! their parent, or that start inside an earlier kept sibling, are dropped
//! and their bytes become part of the parent. Top-level declarations from
//! other files are dropped the same way.
//!
//! After building, the tree is stringified once and compared with the
//! input. A mismatch fails the build.

use tracing::{debug, trace, warn};

use cstep_core::{LineIndex, Span};
use cstep_cparse::{Extent, ParseNodeId, ParseTree};

use crate::error::CstError;
use crate::node::{Handle, IdAllocator, NodeId, SourceNode, SourceText, SourceToken, SourceValue};
use crate::tree::SourceTree;

impl SourceTree {
    /// Build the CST for `source` from its parse tree and verify that it
    /// reproduces the source exactly.
    pub fn build(source: impl Into<String>, parse: ParseTree) -> Result<SourceTree, CstError> {
        let source = source.into();
        let (nodes, ids) = {
            let mut builder = Builder::new(&source, &parse);
            let root = parse.root();
            builder.build_node(root, Span::new(0, source.len()), None, true)?;
            (builder.nodes, builder.ids)
        };
        let tree = SourceTree::from_parts(source, parse, nodes, Handle::new(0), ids);
        check_round_trip(&tree)?;
        debug!(nodes = tree.len(), "built source tree");
        Ok(tree)
    }
}

/// Compare the rebuilt text of `tree` with its source.
pub fn check_round_trip(tree: &SourceTree) -> Result<(), CstError> {
    let rebuilt = tree.stringify(tree.root());
    let source = tree.source();
    if rebuilt == source {
        return Ok(());
    }
    let offset = rebuilt
        .bytes()
        .zip(source.bytes())
        .position(|(a, b)| a != b)
        .unwrap_or_else(|| rebuilt.len().min(source.len()));
    Err(CstError::RoundTripMismatch { offset })
}

// ============================================================================
// Builder
// ============================================================================

struct Builder<'a> {
    source: &'a str,
    parse: &'a ParseTree,
    index: LineIndex,
    owned: Vec<Vec<usize>>,
    nodes: Vec<SourceNode>,
    ids: IdAllocator,
}

/// A kept child or owned token, positioned in the parent's range.
enum Piece {
    Child(ParseNodeId, Span),
    Token(usize, Span),
}

impl Piece {
    fn span(&self) -> Span {
        match self {
            Piece::Child(_, span) | Piece::Token(_, span) => *span,
        }
    }
}

impl<'a> Builder<'a> {
    fn new(source: &'a str, parse: &'a ParseTree) -> Self {
        Builder {
            source,
            parse,
            index: LineIndex::new(source),
            owned: parse.owned_token_table(),
            nodes: Vec::with_capacity(parse.len()),
            ids: IdAllocator::new(),
        }
    }

    fn build_node(
        &mut self,
        id: ParseNodeId,
        span: Span,
        parent: Option<Handle>,
        top: bool,
    ) -> Result<Handle, CstError> {
        let handle = Handle::new(self.nodes.len());
        let node_id: NodeId = self.ids.node();
        self.nodes.push(SourceNode {
            id: node_id,
            origin: Some(id),
            span: Some(span),
            parent,
            values: Vec::new(),
        });

        let children = self.kept_children(id, span, top);
        let tokens = self.kept_tokens(id, span, &children)?;
        let mut pieces: Vec<Piece> = children
            .into_iter()
            .map(|(child, s)| Piece::Child(child, s))
            .chain(tokens.into_iter().map(|(t, s)| Piece::Token(t, s)))
            .collect();
        pieces.sort_by_key(|p| (p.span().start, matches!(p, Piece::Token(..))));

        let mut values = Vec::with_capacity(pieces.len() * 2 + 1);
        let mut cursor = span.start;
        for piece in pieces {
            let piece_span = piece.span();
            if piece_span.start > cursor {
                values.push(self.gap(cursor, piece_span.start)?);
            }
            match piece {
                Piece::Child(child, child_span) => {
                    let built = self.build_node(child, child_span, Some(handle), false)?;
                    values.push(SourceValue::Node(built));
                }
                Piece::Token(index, token_span) => {
                    let token = self.parse.token(index);
                    let text = self.slice(token_span, token.extent)?;
                    values.push(SourceValue::Token(SourceToken {
                        id: self.ids.token(),
                        kind: token.kind,
                        spelling: token.spelling.clone(),
                        span: token_span,
                        text: text.to_string(),
                    }));
                }
            }
            cursor = piece_span.end;
        }
        if cursor < span.end {
            values.push(self.gap(cursor, span.end)?);
        }
        self.nodes[handle.index()].values = values;
        Ok(handle)
    }

    /// Children sorted by start, minus those outside `span` or overlapping
    /// an earlier kept sibling.
    fn kept_children(&self, id: ParseNodeId, span: Span, top: bool) -> Vec<(ParseNodeId, Span)> {
        let mut children = Vec::new();
        for &child in self.parse.children(id) {
            let node = self.parse.node(child);
            if top && !node.in_main_file {
                warn!(kind = %node.kind, "skipping declaration from another file");
                continue;
            }
            match self.span_of(node.extent, node.kind.as_str()) {
                Ok(child_span) => children.push((child, child_span)),
                Err(err) => trace!(child = %child, error = %err, "dropping child with an unmappable extent"),
            }
        }
        children.sort_by_key(|(_, s)| s.start);

        let mut kept = Vec::with_capacity(children.len());
        let mut last_end = span.start;
        for (child, child_span) in children {
            if !span.contains(&child_span) {
                trace!(child = %child, "dropping child outside its parent");
                continue;
            }
            if child_span.start < last_end {
                trace!(child = %child, "dropping child overlapping a sibling");
                continue;
            }
            last_end = child_span.end;
            kept.push((child, child_span));
        }
        kept
    }

    /// Owned tokens inside `span` that no kept child covers.
    fn kept_tokens(
        &self,
        id: ParseNodeId,
        span: Span,
        children: &[(ParseNodeId, Span)],
    ) -> Result<Vec<(usize, Span)>, CstError> {
        let mut kept: Vec<(usize, Span)> = Vec::new();
        for &index in &self.owned[id.index()] {
            let token = self.parse.token(index);
            let token_span = self.span_of(token.extent, token.kind.as_str())?;
            if token_span.is_empty() || !span.contains(&token_span) {
                continue;
            }
            if children.iter().any(|(_, s)| s.overlaps(&token_span)) {
                continue;
            }
            if kept.last().is_some_and(|(_, prev)| prev.end > token_span.start) {
                continue;
            }
            kept.push((index, token_span));
        }
        Ok(kept)
    }

    fn span_of(&self, extent: Extent, kind: &str) -> Result<Span, CstError> {
        let invalid = || CstError::InvalidExtent {
            kind: kind.to_string(),
            location: extent.start.to_string(),
        };
        let start = self
            .index
            .offset(extent.start.line, extent.start.column)
            .ok_or_else(invalid)?;
        let end = self
            .index
            .offset(extent.end.line, extent.end.column)
            .ok_or_else(invalid)?;
        if start > end {
            return Err(invalid());
        }
        Ok(Span::new(start, end))
    }

    fn slice(&self, span: Span, extent: Extent) -> Result<&'a str, CstError> {
        span.slice(self.source).ok_or_else(|| CstError::InvalidExtent {
            kind: "token".to_string(),
            location: extent.start.to_string(),
        })
    }

    fn gap(&self, start: usize, end: usize) -> Result<SourceValue, CstError> {
        let span = Span::new(start, end);
        let text = span.slice(self.source).ok_or_else(|| {
            let (line, column) = self.index.position(start);
            CstError::InvalidExtent {
                kind: "text".to_string(),
                location: format!("l{}c{}", line, column),
            }
        })?;
        Ok(SourceValue::Text(SourceText::at(span, text)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cstep_cparse::{parse_translation_unit, Location, NodeKind, ParseNode, Token, TokenKind};

    fn build(source: &str) -> SourceTree {
        SourceTree::build(source, parse_translation_unit(source).unwrap()).unwrap()
    }

    mod round_trip {
        use super::*;

        #[test]
        fn preserves_comments_and_directives() {
            let source = "#include <stdio.h>\n/* hi */\nint main(void) {\n  // note\n  return 0;\n}\n";
            let tree = build(source);
            assert_eq!(tree.stringify(tree.root()), source);
        }

        #[test]
        fn empty_source() {
            let tree = build("");
            assert_eq!(tree.stringify(tree.root()), "");
        }

        #[test]
        fn node_text_matches_extent() {
            let source = "int f(int a) { return a * (a + 2); }";
            let tree = build(source);
            for handle in tree.original_nodes() {
                let text = tree.stringify(handle);
                assert_eq!(Some(text.as_str()), tree.source_text(handle));
            }
        }
    }

    mod structure {
        use super::*;

        #[test]
        fn tokens_belong_to_their_owner() {
            let tree = build("int x = 1;");
            let var = tree
                .original_nodes()
                .find(|&h| tree.kind(h) == Some(&NodeKind::VarDecl))
                .unwrap();
            let spellings: Vec<_> = tree.tokens(var).map(|t| t.spelling.as_str()).collect();
            assert_eq!(spellings, vec!["int", "x", "="]);
        }

        #[test]
        fn gaps_are_merged() {
            let tree = build("int   x ;");
            let root = tree.node(tree.root());
            let texts: Vec<_> = root
                .values
                .iter()
                .filter_map(|v| match v {
                    SourceValue::Text(t) => Some(t.text.as_str()),
                    _ => None,
                })
                .collect();
            assert_eq!(texts, vec![" "]);
        }

        #[test]
        fn parents_are_linked() {
            let tree = build("int main(void) { return 0; }");
            for handle in tree.original_nodes().skip(1) {
                let parent = tree.parent(handle).unwrap();
                assert!(tree.children(parent).any(|c| c == handle));
            }
            assert_eq!(tree.parent(tree.root()), None);
        }
    }

    mod dropped_children {
        use super::*;

        fn extent(sl: u32, sc: u32, el: u32, ec: u32) -> Extent {
            Extent::new(Location::new(sl, sc), Location::new(el, ec))
        }

        fn token(spelling: &str, col: u32) -> Token {
            Token {
                kind: TokenKind::Identifier,
                spelling: spelling.to_string(),
                extent: extent(1, col, 1, col + spelling.len() as u32),
                owner: None,
            }
        }

        #[test]
        fn overlapping_and_escaping_children_are_dropped() {
            // "ab cd": root with children [ab], [a] (overlaps) and [cd, past end].
            let source = "ab cd";
            let mut root = ParseNode::new(NodeKind::TranslationUnit, extent(1, 1, 1, 6));
            root.children = vec![ParseNodeId(1), ParseNodeId(2), ParseNodeId(3)];
            let first = ParseNode::new(NodeKind::DeclRefExpr, extent(1, 1, 1, 3));
            let overlapping = ParseNode::new(NodeKind::DeclRefExpr, extent(1, 1, 1, 2));
            let escaping = ParseNode::new(NodeKind::DeclRefExpr, extent(1, 4, 1, 9));
            let parse = ParseTree::from_parts(
                vec![root, first, overlapping, escaping],
                vec![token("ab", 1), token("cd", 4)],
                ParseNodeId(0),
            )
            .unwrap();
            let tree = SourceTree::build(source, parse).unwrap();
            assert_eq!(tree.children(tree.root()).count(), 1);
            assert_eq!(tree.stringify(tree.root()), source);
        }

        #[test]
        fn other_file_declarations_become_text() {
            let source = "int a;";
            let mut root = ParseNode::new(NodeKind::TranslationUnit, extent(1, 1, 1, 7));
            root.children = vec![ParseNodeId(1)];
            let mut header = ParseNode::new(NodeKind::VarDecl, extent(1, 1, 1, 6));
            header.in_main_file = false;
            let parse = ParseTree::from_parts(vec![root, header], Vec::new(), ParseNodeId(0)).unwrap();
            let tree = SourceTree::build(source, parse).unwrap();
            assert_eq!(tree.children(tree.root()).count(), 0);
            assert_eq!(tree.stringify(tree.root()), source);
        }

        #[test]
        fn child_on_a_missing_line_is_dropped() {
            let source = "int a;";
            let mut root = ParseNode::new(NodeKind::TranslationUnit, extent(1, 1, 1, 7));
            root.children = vec![ParseNodeId(1)];
            let bad = ParseNode::new(NodeKind::VarDecl, extent(9, 1, 9, 4));
            let parse = ParseTree::from_parts(vec![root, bad], Vec::new(), ParseNodeId(0)).unwrap();
            let tree = SourceTree::build(source, parse).unwrap();
            assert_eq!(tree.children(tree.root()).count(), 0);
            assert_eq!(tree.stringify(tree.root()), source);
        }
    }
}
