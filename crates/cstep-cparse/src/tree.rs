// Copyright (c) cstep contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! The parse-tree contract between a C frontend and the CST builder.
//!
//! A [`ParseTree`] is an arena of [`ParseNode`]s plus the flat list of lexical
//! [`Token`]s of the file. Extents are 1-based line / byte-column pairs, the
//! way libclang reports them; converting them to byte offsets is the CST
//! builder's job. Every token names its owning node: the deepest node whose
//! extent contains it.
//!
//! Trees come either from the built-in frontend
//! ([`parse_translation_unit`](crate::parse_translation_unit)) or from JSON
//! written by an external libclang dumper ([`ParseTree::from_json`]).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::kind::NodeKind;

// ============================================================================
// Positions
// ============================================================================

/// Index of a node in its [`ParseTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParseNodeId(pub u32);

impl ParseNodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ParseNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A 1-based line and byte column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

impl Location {
    pub fn new(line: u32, column: u32) -> Self {
        Location { line, column }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "l{}c{}", self.line, self.column)
    }
}

/// Half-open source extent `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Extent {
    pub start: Location,
    pub end: Location,
}

impl Extent {
    pub fn new(start: Location, end: Location) -> Self {
        Extent { start, end }
    }

    /// True when `other` lies entirely inside this extent.
    pub fn contains(&self, other: &Extent) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

// ============================================================================
// Tokens
// ============================================================================

/// Lexical category of a token, as libclang classifies them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Punctuation,
    Keyword,
    Identifier,
    Literal,
    Comment,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Punctuation => "punctuation",
            TokenKind::Keyword => "keyword",
            TokenKind::Identifier => "identifier",
            TokenKind::Literal => "literal",
            TokenKind::Comment => "comment",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One lexical token of the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    pub spelling: String,
    pub extent: Extent,
    /// Deepest node whose extent contains this token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<ParseNodeId>,
}

// ============================================================================
// Nodes
// ============================================================================

/// Storage class of a declaration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageClass {
    #[default]
    None,
    Static,
    Extern,
    Register,
    Auto,
}

fn default_true() -> bool {
    true
}

fn is_true(value: &bool) -> bool {
    *value
}

fn is_default_storage(storage: &StorageClass) -> bool {
    *storage == StorageClass::None
}

/// One node of the parse tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseNode {
    pub kind: NodeKind,
    pub extent: Extent,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ParseNodeId>,
    /// Declared or referenced name (declarations, references, members).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spelling: Option<String>,
    /// C type spelling, clang style.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_spelling: Option<String>,
    /// Return type spelling of a function declaration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_type: Option<String>,
    #[serde(default, skip_serializing_if = "is_default_storage")]
    pub storage: StorageClass,
    /// False for declarations pulled in from headers.
    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub in_main_file: bool,
}

impl ParseNode {
    pub fn new(kind: NodeKind, extent: Extent) -> Self {
        ParseNode {
            kind,
            extent,
            children: Vec::new(),
            spelling: None,
            type_spelling: None,
            result_type: None,
            storage: StorageClass::None,
            in_main_file: true,
        }
    }
}

// ============================================================================
// Tree
// ============================================================================

/// Arena of parse nodes plus the token list of one translation unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseTree {
    nodes: Vec<ParseNode>,
    #[serde(default)]
    tokens: Vec<Token>,
    root: ParseNodeId,
}

impl ParseTree {
    /// Assemble a tree from parts, validating indices and filling in any
    /// missing token owners.
    pub fn from_parts(
        nodes: Vec<ParseNode>,
        tokens: Vec<Token>,
        root: ParseNodeId,
    ) -> Result<Self, ParseError> {
        let mut tree = ParseTree {
            nodes,
            tokens,
            root,
        };
        tree.validate()?;
        if tree.tokens.iter().any(|t| t.owner.is_none()) {
            tree.assign_token_owners();
        }
        Ok(tree)
    }

    /// Load a tree written by an external frontend.
    pub fn from_json(json: &str) -> Result<Self, ParseError> {
        let raw: ParseTree = serde_json::from_str(json)
            .map_err(|e| ParseError::invalid_tree(format!("malformed parse tree JSON: {}", e)))?;
        ParseTree::from_parts(raw.nodes, raw.tokens, raw.root)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn root(&self) -> ParseNodeId {
        self.root
    }

    pub fn node(&self, id: ParseNodeId) -> &ParseNode {
        &self.nodes[id.index()]
    }

    pub fn get(&self, id: ParseNodeId) -> Option<&ParseNode> {
        self.nodes.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn children(&self, id: ParseNodeId) -> &[ParseNodeId] {
        &self.node(id).children
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn token(&self, index: usize) -> &Token {
        &self.tokens[index]
    }

    /// Indices of the tokens owned by each node, in source order.
    pub fn owned_token_table(&self) -> Vec<Vec<usize>> {
        let mut table = vec![Vec::new(); self.nodes.len()];
        for (index, token) in self.tokens.iter().enumerate() {
            if let Some(owner) = token.owner {
                if let Some(slot) = table.get_mut(owner.index()) {
                    slot.push(index);
                }
            }
        }
        for slot in &mut table {
            slot.sort_by_key(|&i| self.tokens[i].extent.start);
        }
        table
    }

    /// Tokens whose owner is `id`.
    pub fn owned_tokens(&self, id: ParseNodeId) -> impl Iterator<Item = &Token> + '_ {
        self.tokens.iter().filter(move |t| t.owner == Some(id))
    }

    /// Every token inside the node's extent, owned or not.
    pub fn tokens_within(&self, id: ParseNodeId) -> impl Iterator<Item = &Token> + '_ {
        let extent = self.node(id).extent;
        self.tokens
            .iter()
            .filter(move |t| extent.contains(&t.extent))
    }

    /// Pre-order walk starting at `id`.
    pub fn descendants(&self, id: ParseNodeId) -> Vec<ParseNodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    fn validate(&self) -> Result<(), ParseError> {
        if self.root.index() >= self.nodes.len() {
            return Err(ParseError::invalid_tree(format!(
                "root {} out of range ({} nodes)",
                self.root,
                self.nodes.len()
            )));
        }
        let mut seen = vec![false; self.nodes.len()];
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            if std::mem::replace(&mut seen[id.index()], true) {
                return Err(ParseError::invalid_tree(format!(
                    "node {} is reachable twice",
                    id
                )));
            }
            for &child in self.children(id) {
                if child.index() >= self.nodes.len() {
                    return Err(ParseError::invalid_tree(format!(
                        "node {} has out-of-range child {}",
                        id, child
                    )));
                }
                stack.push(child);
            }
        }
        for token in &self.tokens {
            if let Some(owner) = token.owner {
                if owner.index() >= self.nodes.len() {
                    return Err(ParseError::invalid_tree(format!(
                        "token '{}' has out-of-range owner {}",
                        token.spelling, owner
                    )));
                }
            }
        }
        Ok(())
    }

    /// Give every token the deepest node whose extent contains it.
    pub fn assign_token_owners(&mut self) {
        let root = self.root;
        for index in 0..self.tokens.len() {
            let extent = self.tokens[index].extent;
            if !self.node(root).extent.contains(&extent) {
                self.tokens[index].owner = None;
                continue;
            }
            let mut owner = root;
            'descend: loop {
                for &child in self.children(owner) {
                    let child_node = self.node(child);
                    if child_node.in_main_file && child_node.extent.contains(&extent) {
                        owner = child;
                        continue 'descend;
                    }
                }
                break;
            }
            self.tokens[index].owner = Some(owner);
        }
    }

    pub(crate) fn push_node(&mut self, node: ParseNode) -> ParseNodeId {
        let id = ParseNodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub(crate) fn node_mut(&mut self, id: ParseNodeId) -> &mut ParseNode {
        &mut self.nodes[id.index()]
    }

    pub(crate) fn empty() -> Self {
        ParseTree {
            nodes: Vec::new(),
            tokens: Vec::new(),
            root: ParseNodeId(0),
        }
    }

    pub(crate) fn set_root(&mut self, root: ParseNodeId) {
        self.root = root;
    }

    pub(crate) fn set_tokens(&mut self, tokens: Vec<Token>) {
        self.tokens = tokens;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ext(l0: u32, c0: u32, l1: u32, c1: u32) -> Extent {
        Extent::new(Location::new(l0, c0), Location::new(l1, c1))
    }

    fn token(spelling: &str, kind: TokenKind, extent: Extent) -> Token {
        Token {
            kind,
            spelling: spelling.to_string(),
            extent,
            owner: None,
        }
    }

    /// `x = 1;` as TU > BinaryOperator > (DeclRefExpr, IntegerLiteral)
    fn small_tree() -> ParseTree {
        let mut tu = ParseNode::new(NodeKind::TranslationUnit, ext(1, 1, 1, 7));
        tu.children = vec![ParseNodeId(1)];
        let mut op = ParseNode::new(NodeKind::BinaryOperator, ext(1, 1, 1, 6));
        op.children = vec![ParseNodeId(2), ParseNodeId(3)];
        let lhs = ParseNode::new(NodeKind::DeclRefExpr, ext(1, 1, 1, 2));
        let rhs = ParseNode::new(NodeKind::IntegerLiteral, ext(1, 5, 1, 6));
        let tokens = vec![
            token("x", TokenKind::Identifier, ext(1, 1, 1, 2)),
            token("=", TokenKind::Punctuation, ext(1, 3, 1, 4)),
            token("1", TokenKind::Literal, ext(1, 5, 1, 6)),
            token(";", TokenKind::Punctuation, ext(1, 6, 1, 7)),
        ];
        ParseTree::from_parts(vec![tu, op, lhs, rhs], tokens, ParseNodeId(0)).unwrap()
    }

    #[test]
    fn owners_are_deepest_containing_nodes() {
        let tree = small_tree();
        let owners: Vec<_> = tree.tokens().iter().map(|t| t.owner).collect();
        assert_eq!(
            owners,
            vec![
                Some(ParseNodeId(2)),
                Some(ParseNodeId(1)),
                Some(ParseNodeId(3)),
                Some(ParseNodeId(0)),
            ]
        );
    }

    #[test]
    fn owned_token_table_groups_by_owner() {
        let tree = small_tree();
        let table = tree.owned_token_table();
        assert_eq!(table[1], vec![1]);
        assert_eq!(table[0], vec![3]);
        assert_eq!(tree.owned_tokens(ParseNodeId(1)).count(), 1);
        assert_eq!(tree.tokens_within(ParseNodeId(1)).count(), 3);
    }

    #[test]
    fn json_round_trip_preserves_tree() {
        let tree = small_tree();
        let json = tree.to_json().unwrap();
        let back = ParseTree::from_json(&json).unwrap();
        assert_eq!(tree, back);
    }

    #[test]
    fn json_without_owners_gets_owners() {
        let json = r#"{
            "root": 0,
            "nodes": [
                {"kind": "TRANSLATION_UNIT", "extent": {"start": {"line":1,"column":1}, "end": {"line":1,"column":3}}, "children": [1]},
                {"kind": "INTEGER_LITERAL", "extent": {"start": {"line":1,"column":1}, "end": {"line":1,"column":2}}, "type_spelling": "int"}
            ],
            "tokens": [
                {"kind": "literal", "spelling": "1", "extent": {"start": {"line":1,"column":1}, "end": {"line":1,"column":2}}}
            ]
        }"#;
        let tree = ParseTree::from_json(json).unwrap();
        assert_eq!(tree.node(ParseNodeId(1)).kind, NodeKind::IntegerLiteral);
        assert_eq!(tree.tokens()[0].owner, Some(ParseNodeId(1)));
    }

    #[test]
    fn out_of_range_child_is_rejected() {
        let mut tu = ParseNode::new(NodeKind::TranslationUnit, ext(1, 1, 1, 1));
        tu.children = vec![ParseNodeId(7)];
        let err = ParseTree::from_parts(vec![tu], vec![], ParseNodeId(0)).unwrap_err();
        assert!(err.to_string().contains("out-of-range child"));
    }

    #[test]
    fn shared_child_is_rejected() {
        let mut tu = ParseNode::new(NodeKind::TranslationUnit, ext(1, 1, 1, 1));
        tu.children = vec![ParseNodeId(1), ParseNodeId(1)];
        let leaf = ParseNode::new(NodeKind::NullStmt, ext(1, 1, 1, 1));
        assert!(ParseTree::from_parts(vec![tu, leaf], vec![], ParseNodeId(0)).is_err());
    }
}
