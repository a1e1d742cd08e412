// Copyright (c) cstep contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Recursive-descent parser producing a clang-shaped [`ParseTree`].
//!
//! # Parser Architecture
//!
//! - This module: the [`Parser`] state, token helpers, node allocation, the
//!   scoped symbol table and the translation-unit entry point
//! - `declarations`: specifiers, declarators, functions, structs, typedefs
//! - `statements`: compound and control-flow statements
//! - `expressions`: precedence climbing over the full C operator table
//!
//! Parser methods are split across files using `impl Parser` blocks.
//!
//! Node shapes follow libclang so that externally dumped trees and trees
//! from this parser drive the instrumentation identically:
//! - expression statements are bare expression nodes
//! - `;` after expressions, `return`, `break`, `continue`, `goto` and
//!   `do ... while (..)` is owned by the enclosing statement, while a
//!   `DeclStmt` includes its `;`
//! - the first declarator of a declaration spans the specifiers, later
//!   declarators span only themselves

mod declarations;
mod expressions;
mod statements;

use std::collections::HashMap;

use cstep_core::LineIndex;
use tracing::warn;

use crate::ctype::CType;
use crate::error::ParseError;
use crate::kind::NodeKind;
use crate::lexer::{Lexeme, Lexer};
use crate::tree::{Extent, Location, ParseNode, ParseNodeId, ParseTree, StorageClass, Token};

/// Parse a C translation unit with the built-in frontend.
pub fn parse_translation_unit(source: &str) -> Result<ParseTree, ParseError> {
    let lexemes = Lexer::new(source).tokenize()?;
    Parser::new(source, lexemes).parse()
}

// ============================================================================
// Parser state
// ============================================================================

/// An entry of the scoped symbol table.
#[derive(Debug, Clone)]
pub(crate) struct Symbol {
    pub ty: CType,
    pub is_typedef: bool,
}

/// A parsed expression: its node, its type and its byte range.
#[derive(Debug, Clone)]
pub(crate) struct Expr {
    pub id: ParseNodeId,
    pub ty: CType,
    pub start: usize,
    pub end: usize,
}

pub(crate) struct Parser<'a> {
    source: &'a str,
    lexemes: Vec<Lexeme>,
    position: usize,
    index: LineIndex,
    tree: ParseTree,
    /// Start offset of each node, for ordering children.
    starts: Vec<usize>,
    scopes: Vec<HashMap<String, Symbol>>,
    /// Field tables keyed by `struct S` / `union U`.
    records: HashMap<String, Vec<(String, CType)>>,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(source: &'a str, lexemes: Vec<Lexeme>) -> Self {
        Parser {
            source,
            lexemes,
            position: 0,
            index: LineIndex::new(source),
            tree: ParseTree::empty(),
            starts: Vec::new(),
            scopes: vec![HashMap::new()],
            records: HashMap::new(),
        }
    }

    /// Parse the whole file into a tree rooted at a `TranslationUnit`.
    pub(crate) fn parse(mut self) -> Result<ParseTree, ParseError> {
        let mut children = Vec::new();
        while !self.is_at_end() {
            if self.eat(";").is_some() {
                continue;
            }
            children.extend(self.parse_external_declaration()?);
        }
        let root = self.add_node(NodeKind::TranslationUnit, 0, self.source.len(), children);
        self.tree.set_root(root);

        let tokens = self
            .lexemes
            .iter()
            .map(|lexeme| Token {
                kind: lexeme.kind,
                spelling: lexeme.text.clone(),
                extent: self.extent(lexeme.start, lexeme.end),
                owner: None,
            })
            .collect();
        let mut tree = self.tree;
        tree.set_tokens(tokens);
        tree.assign_token_owners();
        Ok(tree)
    }

    // ===== Token helpers =====

    pub(crate) fn is_at_end(&self) -> bool {
        self.position >= self.lexemes.len()
    }

    pub(crate) fn peek(&self) -> Option<&Lexeme> {
        self.lexemes.get(self.position)
    }

    pub(crate) fn peek_ahead(&self, n: usize) -> Option<&Lexeme> {
        self.lexemes.get(self.position + n)
    }

    pub(crate) fn check(&self, text: &str) -> bool {
        self.peek().is_some_and(|l| l.is(text))
    }

    pub(crate) fn check_ahead(&self, n: usize, text: &str) -> bool {
        self.peek_ahead(n).is_some_and(|l| l.is(text))
    }

    pub(crate) fn advance(&mut self) -> Option<Lexeme> {
        let lexeme = self.lexemes.get(self.position).cloned();
        if lexeme.is_some() {
            self.position += 1;
        }
        lexeme
    }

    /// Consume the next token if it is `text`, returning it.
    pub(crate) fn eat(&mut self, text: &str) -> Option<Lexeme> {
        if self.check(text) {
            self.advance()
        } else {
            None
        }
    }

    pub(crate) fn expect(&mut self, text: &str, context: &str) -> Result<Lexeme, ParseError> {
        match self.eat(text) {
            Some(lexeme) => Ok(lexeme),
            None => Err(self.error_here(format!("expected '{}' {}", text, context))),
        }
    }

    /// End offset of the most recently consumed token.
    pub(crate) fn previous_end(&self) -> usize {
        self.position
            .checked_sub(1)
            .and_then(|i| self.lexemes.get(i))
            .map_or(0, |l| l.end)
    }

    /// Start offset of the next token (or end of file).
    pub(crate) fn current_start(&self) -> usize {
        self.peek().map_or(self.source.len(), |l| l.start)
    }

    pub(crate) fn location(&self, offset: usize) -> Location {
        let (line, column) = self.index.position(offset);
        Location::new(line, column)
    }

    pub(crate) fn extent(&self, start: usize, end: usize) -> Extent {
        Extent::new(self.location(start), self.location(end))
    }

    pub(crate) fn error_here(&self, message: impl Into<String>) -> ParseError {
        match self.peek() {
            Some(lexeme) => {
                let message = format!("{}, found '{}'", message.into(), lexeme.text);
                ParseError::syntax(message, self.location(lexeme.start), self.location(lexeme.end))
            }
            None => {
                let end = self.source.len();
                let message = format!("{}, found end of file", message.into());
                ParseError::syntax(message, self.location(end), self.location(end))
            }
        }
    }

    // ===== Node allocation =====

    /// Push a node covering `[start, end)`; children are kept in source order.
    pub(crate) fn add_node(
        &mut self,
        kind: NodeKind,
        start: usize,
        end: usize,
        mut children: Vec<ParseNodeId>,
    ) -> ParseNodeId {
        children.sort_by_key(|c| self.starts[c.index()]);
        let mut node = ParseNode::new(kind, self.extent(start, end));
        node.children = children;
        self.starts.push(start);
        self.tree.push_node(node)
    }

    pub(crate) fn set_type(&mut self, id: ParseNodeId, ty: &CType) {
        self.tree.node_mut(id).type_spelling = Some(ty.spelling());
    }

    pub(crate) fn set_spelling(&mut self, id: ParseNodeId, name: &str) {
        self.tree.node_mut(id).spelling = Some(name.to_string());
    }

    pub(crate) fn set_storage(&mut self, id: ParseNodeId, storage: StorageClass) {
        self.tree.node_mut(id).storage = storage;
    }

    pub(crate) fn set_result_type(&mut self, id: ParseNodeId, ty: &CType) {
        self.tree.node_mut(id).result_type = Some(ty.spelling());
    }

    // ===== Symbols =====

    pub(crate) fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub(crate) fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    pub(crate) fn declare(&mut self, name: &str, ty: CType, is_typedef: bool) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), Symbol { ty, is_typedef });
        }
    }

    pub(crate) fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    pub(crate) fn is_typedef_name(&self, name: &str) -> bool {
        self.lookup(name).is_some_and(|s| s.is_typedef)
    }

    /// Type of an identifier in an expression.
    pub(crate) fn identifier_type(&self, name: &str, called: bool, offset: usize) -> CType {
        if let Some(symbol) = self.lookup(name) {
            return symbol.ty.clone();
        }
        if let Some(ty) = builtin_function(name) {
            return ty;
        }
        let location = self.location(offset);
        if called {
            warn!(name, %location, "implicit declaration of function");
            CType::Function {
                ret: Box::new(CType::int()),
                params: Vec::new(),
                variadic: true,
            }
        } else {
            warn!(name, %location, "use of undeclared identifier, assuming int");
            CType::int()
        }
    }

    pub(crate) fn record_fields(&self, key: &str) -> Option<&[(String, CType)]> {
        self.records.get(key).map(Vec::as_slice)
    }

    pub(crate) fn define_record(&mut self, key: String, fields: Vec<(String, CType)>) {
        self.records.insert(key, fields);
    }
}

/// Signatures of common libc functions, used when a call has no prototype
/// in the translation unit (headers are not expanded).
fn builtin_function(name: &str) -> Option<CType> {
    let const_char_ptr = || CType::char().qualified_const().pointer_to();
    let void_ptr = || CType::Void.pointer_to();
    let (ret, params, variadic) = match name {
        "printf" | "scanf" => (CType::int(), vec![const_char_ptr()], true),
        "puts" => (CType::int(), vec![const_char_ptr()], false),
        "putchar" | "abs" => (CType::int(), vec![CType::int()], false),
        "getchar" | "rand" => (CType::int(), vec![], false),
        "srand" => (
            CType::Void,
            vec![CType::Int {
                kind: crate::ctype::IntKind::Int,
                unsigned: true,
            }],
            false,
        ),
        "malloc" => (void_ptr(), vec![CType::unsigned_long()], false),
        "calloc" => (
            void_ptr(),
            vec![CType::unsigned_long(), CType::unsigned_long()],
            false,
        ),
        "free" => (CType::Void, vec![void_ptr()], false),
        "exit" => (CType::Void, vec![CType::int()], false),
        "strlen" => (CType::unsigned_long(), vec![const_char_ptr()], false),
        "strcmp" => (CType::int(), vec![const_char_ptr(), const_char_ptr()], false),
        "strcpy" => (
            CType::char().pointer_to(),
            vec![CType::char().pointer_to(), const_char_ptr()],
            false,
        ),
        "memset" => (void_ptr(), vec![void_ptr(), CType::int(), CType::unsigned_long()], false),
        _ => return None,
    };
    Some(CType::Function {
        ret: Box::new(ret),
        params,
        variadic,
    })
}
