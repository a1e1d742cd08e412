// Copyright (c) cstep contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! The node arena of one file.
//!
//! [`SourceTree`] owns every node ever created for a file: the nodes built
//! from the parse tree (the *original* nodes, allocated first and in
//! pre-order), and the copies and synthetic nodes that rewriting creates.
//! Nodes are never mutated after construction, so a rewritten tree can
//! share any unchanged subtree with the original by handle.

use std::collections::{HashMap, HashSet};

use cstep_core::Span;
use cstep_cparse::{NodeKind, ParseNode, ParseTree, TokenKind};

use crate::error::CstError;
use crate::node::{Handle, IdAllocator, NodeId, SourceNode, SourceText, SourceToken, SourceValue, TokenId};
use crate::template::{Piece, Template};

/// Arena of [`SourceNode`]s for one translation unit.
#[derive(Debug, Clone)]
pub struct SourceTree {
    source: String,
    parse: ParseTree,
    nodes: Vec<SourceNode>,
    root: Handle,
    originals: HashMap<NodeId, Handle>,
    original_count: usize,
    ids: IdAllocator,
}

impl SourceTree {
    pub(crate) fn from_parts(
        source: String,
        parse: ParseTree,
        nodes: Vec<SourceNode>,
        root: Handle,
        ids: IdAllocator,
    ) -> Self {
        let originals = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id, Handle::new(i)))
            .collect();
        let original_count = nodes.len();
        SourceTree {
            source,
            parse,
            nodes,
            root,
            originals,
            original_count,
            ids,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Root of the original tree.
    pub fn root(&self) -> Handle {
        self.root
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn parse_tree(&self) -> &ParseTree {
        &self.parse
    }

    pub fn node(&self, handle: Handle) -> &SourceNode {
        &self.nodes[handle.index()]
    }

    pub fn get(&self, handle: Handle) -> Option<&SourceNode> {
        self.nodes.get(handle.index())
    }

    pub fn node_id(&self, handle: Handle) -> NodeId {
        self.node(handle).id
    }

    /// Total arena size, copies and synthetic nodes included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Handles of the original nodes in pre-order.
    pub fn original_nodes(&self) -> impl Iterator<Item = Handle> {
        (0..self.original_count).map(Handle::new)
    }

    pub fn is_original(&self, handle: Handle) -> bool {
        handle.index() < self.original_count
    }

    /// The original node with structural identity `id`.
    pub fn original(&self, id: NodeId) -> Option<Handle> {
        self.originals.get(&id).copied()
    }

    /// The parse node a built node (or a copy of one) came from.
    pub fn parse_node(&self, handle: Handle) -> Option<&ParseNode> {
        self.node(handle).origin.map(|id| self.parse.node(id))
    }

    pub fn kind(&self, handle: Handle) -> Option<&NodeKind> {
        self.parse_node(handle).map(|n| &n.kind)
    }

    /// Kind name for messages; `Synthetic` for inserted nodes.
    pub fn kind_name(&self, handle: Handle) -> &str {
        self.kind(handle).map_or("Synthetic", NodeKind::as_str)
    }

    pub fn span(&self, handle: Handle) -> Option<Span> {
        self.node(handle).span
    }

    pub fn parent(&self, handle: Handle) -> Option<Handle> {
        self.node(handle).parent
    }

    pub fn children(&self, handle: Handle) -> impl Iterator<Item = Handle> + '_ {
        self.node(handle).children()
    }

    pub fn tokens(&self, handle: Handle) -> impl Iterator<Item = &SourceToken> + '_ {
        self.node(handle).tokens()
    }

    /// First token of `kind` (and `spelling`, when given) held by the node.
    pub fn find_token(
        &self,
        handle: Handle,
        kind: TokenKind,
        spelling: Option<&str>,
    ) -> Option<&SourceToken> {
        self.tokens(handle).find(|t| t.matches(kind, spelling))
    }

    pub fn has_token(&self, handle: Handle, token: TokenId) -> bool {
        self.tokens(handle).any(|t| t.id == token)
    }

    /// Original source text under a built node.
    pub fn source_text(&self, handle: Handle) -> Option<&str> {
        self.span(handle).and_then(|s| s.slice(&self.source))
    }

    // ========================================================================
    // Reconstruction
    // ========================================================================

    /// Concatenate the values of `handle`, recursively.
    pub fn stringify(&self, handle: Handle) -> String {
        let mut out = String::new();
        self.write_to(handle, &mut out);
        out
    }

    pub fn write_to(&self, handle: Handle, out: &mut String) {
        for value in &self.node(handle).values {
            match value {
                SourceValue::Node(child) => self.write_to(*child, out),
                SourceValue::Token(token) => out.push_str(&token.text),
                SourceValue::Text(text) => out.push_str(&text.text),
            }
        }
    }

    // ========================================================================
    // Original-tree navigation
    // ========================================================================

    /// Pre-order walk over the nodes reachable from `handle`.
    pub fn descendants(&self, handle: Handle) -> Vec<Handle> {
        let mut out = Vec::new();
        let mut stack = vec![handle];
        while let Some(next) = stack.pop() {
            out.push(next);
            let children: Vec<_> = self.children(next).collect();
            stack.extend(children.into_iter().rev());
        }
        out
    }

    /// Original ancestors of `handle`, nearest first, excluding itself.
    pub fn ancestors(&self, handle: Handle) -> impl Iterator<Item = Handle> + '_ {
        std::iter::successors(self.parent(handle), move |&h| self.parent(h))
    }

    /// True if `node` is `ancestor` or lies below it in the original tree.
    pub fn is_within(&self, node: Handle, ancestor: Handle) -> bool {
        let target = self.node_id(ancestor);
        self.node_id(node) == target || self.ancestors(node).any(|h| self.node_id(h) == target)
    }

    /// Lowest original node that is an ancestor-or-self of every id.
    ///
    /// Returns `None` when an id has no original node or when the ids do
    /// not share a root.
    pub fn lowest_common_ancestor(&self, ids: &[NodeId]) -> Option<Handle> {
        let (first, rest) = ids.split_first()?;
        let first = self.original(*first)?;
        let mut path: Vec<Handle> = std::iter::once(first).chain(self.ancestors(first)).collect();
        for id in rest {
            let node = self.original(*id)?;
            let chain: HashSet<Handle> =
                std::iter::once(node).chain(self.ancestors(node)).collect();
            let keep = path.iter().position(|h| chain.contains(h))?;
            path.drain(..keep);
        }
        path.first().copied()
    }

    // ========================================================================
    // Construction
    // ========================================================================

    /// Allocate a synthetic node with fresh identity.
    pub fn create_node(&mut self, values: Vec<SourceValue>) -> Handle {
        let id = self.ids.node();
        self.push(SourceNode {
            id,
            origin: None,
            span: None,
            parent: None,
            values,
        })
    }

    /// Synthetic node holding one piece of literal text.
    pub fn text_node(&mut self, text: impl Into<String>) -> Handle {
        self.create_node(vec![SourceValue::Text(SourceText::new(text))])
    }

    /// Copy `handle` with a new value list, keeping its identity.
    pub fn copy_with_values(&mut self, handle: Handle, values: Vec<SourceValue>) -> Handle {
        let node = self.node(handle);
        let copy = SourceNode {
            id: node.id,
            origin: node.origin,
            span: node.span,
            parent: node.parent,
            values,
        };
        self.push(copy)
    }

    /// Synthetic node whose values are the template's text with each slot
    /// replaced by the node in that position of `slots`.
    pub fn from_template(&mut self, template: &Template, slots: &[Handle]) -> Result<Handle, CstError> {
        template.check(slots.len())?;
        let values = template
            .pieces()
            .iter()
            .map(|piece| match piece {
                Piece::Text(text) => SourceValue::Text(SourceText::new(text.clone())),
                Piece::Slot(i) => SourceValue::Node(slots[*i]),
            })
            .collect();
        Ok(self.create_node(values))
    }

    fn push(&mut self, node: SourceNode) -> Handle {
        let handle = Handle::new(self.nodes.len());
        self.nodes.push(node);
        handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cstep_cparse::parse_translation_unit;

    fn build(source: &str) -> SourceTree {
        let parse = parse_translation_unit(source).unwrap();
        SourceTree::build(source, parse).unwrap()
    }

    fn find(tree: &SourceTree, kind: NodeKind) -> Handle {
        tree.original_nodes()
            .find(|&h| tree.kind(h) == Some(&kind))
            .unwrap()
    }

    mod navigation {
        use super::*;

        #[test]
        fn ancestors_walk_to_the_root() {
            let tree = build("int f(int a){ return a + 1; }");
            let reference = find(&tree, NodeKind::DeclRefExpr);
            let kinds: Vec<_> = tree
                .ancestors(reference)
                .map(|h| tree.kind_name(h).to_string())
                .collect();
            assert_eq!(
                kinds,
                vec![
                    "BinaryOperator",
                    "ReturnStmt",
                    "CompoundStmt",
                    "FunctionDecl",
                    "TranslationUnit"
                ]
            );
        }

        #[test]
        fn common_ancestor_of_operands() {
            let tree = build("int f(int a, int b){ return a + b; }");
            let refs: Vec<_> = tree
                .original_nodes()
                .filter(|&h| tree.kind(h) == Some(&NodeKind::DeclRefExpr))
                .map(|h| tree.node_id(h))
                .collect();
            let lca = tree.lowest_common_ancestor(&refs).unwrap();
            assert_eq!(tree.kind(lca), Some(&NodeKind::BinaryOperator));
            assert_eq!(tree.lowest_common_ancestor(&refs[..1]).map(|h| tree.node_id(h)), Some(refs[0]));
        }

        #[test]
        fn common_ancestor_of_nested_targets_is_the_outer_one() {
            let tree = build("int f(int a){ return a + 1; }");
            let plus = tree.node_id(find(&tree, NodeKind::BinaryOperator));
            let a = tree.node_id(find(&tree, NodeKind::DeclRefExpr));
            let lca = tree.lowest_common_ancestor(&[a, plus]).unwrap();
            assert_eq!(tree.node_id(lca), plus);
        }

        #[test]
        fn containment_follows_original_links() {
            let tree = build("int f(int a){ return a; }");
            let body = find(&tree, NodeKind::CompoundStmt);
            let reference = find(&tree, NodeKind::DeclRefExpr);
            assert!(tree.is_within(reference, body));
            assert!(!tree.is_within(body, reference));
        }
    }

    mod construction {
        use super::*;

        #[test]
        fn copies_keep_identity() {
            let mut tree = build("int x = 1;");
            let var = find(&tree, NodeKind::VarDecl);
            let copy = tree.copy_with_values(var, vec![SourceValue::Text(SourceText::new("int y"))]);
            assert_ne!(copy, var);
            assert_eq!(tree.node_id(copy), tree.node_id(var));
            assert_eq!(tree.stringify(copy), "int y");
            assert_eq!(tree.stringify(var), "int x = 1");
        }

        #[test]
        fn synthetic_nodes_get_fresh_ids() {
            let mut tree = build("int x;");
            let a = tree.text_node("a");
            let b = tree.text_node("b");
            assert_ne!(tree.node_id(a), tree.node_id(b));
            assert!(tree.node(a).is_synthetic());
            assert_eq!(tree.kind_name(a), "Synthetic");
        }

        #[test]
        fn template_nodes_share_slots() {
            let mut tree = build("int x = 1;");
            let literal = find(&tree, NodeKind::IntegerLiteral);
            let t = Template::parse("({0} + {0})");
            let sum = tree.from_template(&t, &[literal]).unwrap();
            assert_eq!(tree.stringify(sum), "(1 + 1)");
            assert_eq!(tree.children(sum).collect::<Vec<_>>(), vec![literal, literal]);
        }
    }
}
