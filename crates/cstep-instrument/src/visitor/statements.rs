//! Statement rules.
//!
//! Every statement reports a `stat` event before it runs. Expression
//! statements and conditions carry it in the start group of their own
//! shape; jumps (`break`, `continue`, `goto`, bare `return`) have no value
//! to wrap and become `{ notify; jump; }` blocks instead.

use cstep_cparse::{NodeKind, TokenKind};
use cstep_cst::visitor::{SourceVisitor, VisitResult};
use cstep_cst::{Handle, Insert, Replace};

use super::InstrumentVisitor;
use crate::ctypes;
use crate::error::InstrumentError;
use crate::event::{Action, NotifyData};
use crate::shapes::Notify;

/// Where a part of a `for` header sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ForPart {
    Init,
    Condition,
    Increment,
}

impl InstrumentVisitor<'_> {
    /// Rewrite one statement in statement position.
    pub(super) fn statement(&mut self, node: Handle) -> VisitResult<Notify> {
        if self.kind(node).is_some_and(NodeKind::is_expression) {
            return self.condition(node, node).map(Some);
        }
        self.visit(node)
    }

    /// An expression evaluated as part of `statement`, with the statement's
    /// `stat` in front.
    fn condition(&mut self, statement: Handle, expression: Handle) -> Result<Replace<Notify>, InstrumentError> {
        let start = self.stat(statement, expression);
        let mut shape = self.expression(expression)?;
        shape.prepend_start(start);
        Ok(Replace::Ext(shape))
    }

    /// Statements that become `{ ...; jump; }` blocks.
    fn is_jump(&self, node: Handle) -> bool {
        match self.kind(node) {
            Some(NodeKind::BreakStmt | NodeKind::ContinueStmt | NodeKind::GotoStmt) => true,
            Some(NodeKind::ReturnStmt) => self.tree.children(node).next().is_none(),
            _ => false,
        }
    }

    /// Drop the `;` that `parent` holds right after its child `body`, once
    /// `body` has become a block. Needed where a stray empty statement would
    /// change the meaning, as before `else` or `while`.
    fn drop_semicolon(&self, parent: Handle, body: Handle) -> Result<Option<Replace<Notify>>, InstrumentError> {
        let Some(end) = self.tree.span(body).map(|s| s.end) else {
            return Ok(None);
        };
        let semicolon = self
            .tree
            .tokens(parent)
            .filter(|t| t.kind == TokenKind::Punctuation && t.spelling == ";")
            .find(|t| t.span.start >= end)
            .map(|t| t.id);
        match semicolon {
            Some(token) => Ok(Some(Replace::token(self.tree, parent, token, Insert::constant(""))?)),
            None => Ok(None),
        }
    }

    /// A body statement that may need its trailing `;` removed.
    fn body(&mut self, parent: Handle, body: Handle, drop_semicolon: bool) -> Result<Vec<Replace<Notify>>, InstrumentError> {
        let mut modifications: Vec<_> = self.statement(body)?.into_iter().collect();
        if drop_semicolon && self.is_jump(body) {
            modifications.extend(self.drop_semicolon(parent, body)?);
        }
        Ok(modifications)
    }

    fn compound(node: Handle, modifications: Vec<Replace<Notify>>) -> Option<Replace<Notify>> {
        (!modifications.is_empty()).then(|| Replace::compound_at(node, modifications))
    }

    pub(super) fn block(&mut self, node: Handle) -> VisitResult<Notify> {
        let mut modifications = Vec::new();
        for child in self.children(node) {
            modifications.extend(self.statement(child)?);
        }
        Ok(Self::compound(node, modifications))
    }

    pub(super) fn if_statement(&mut self, node: Handle) -> VisitResult<Notify> {
        let children = self.children(node);
        let Some((&cond, branches)) = children.split_first() else {
            return Ok(None);
        };
        let mut modifications = vec![self.condition(node, cond)?];
        let has_else = branches.len() > 1;
        if let Some(&then) = branches.first() {
            modifications.extend(self.body(node, then, has_else)?);
        }
        if let Some(&otherwise) = branches.get(1) {
            modifications.extend(self.statement(otherwise)?);
        }
        Ok(Self::compound(node, modifications))
    }

    pub(super) fn while_statement(&mut self, node: Handle) -> VisitResult<Notify> {
        let children = self.children(node);
        let mut modifications = Vec::new();
        if let Some(&cond) = children.first() {
            modifications.push(self.condition(node, cond)?);
        }
        if let Some(&body) = children.get(1) {
            modifications.extend(self.statement(body)?);
        }
        Ok(Self::compound(node, modifications))
    }

    pub(super) fn do_statement(&mut self, node: Handle) -> VisitResult<Notify> {
        let children = self.children(node);
        let mut modifications = Vec::new();
        if let Some(&body) = children.first() {
            modifications.extend(self.body(node, body, true)?);
        }
        if let Some(&cond) = children.get(1) {
            modifications.push(self.condition(node, cond)?);
        }
        Ok(Self::compound(node, modifications))
    }

    /// Classify the header parts of a `for` by the `;` tokens before them.
    /// A declaration holds the first `;` itself.
    fn for_parts(&self, node: Handle, header: &[Handle]) -> Vec<(ForPart, Handle)> {
        let semicolons: Vec<usize> = self
            .tree
            .tokens(node)
            .filter(|t| t.kind == TokenKind::Punctuation && t.spelling == ";")
            .map(|t| t.span.start)
            .collect();
        let declared = header
            .first()
            .is_some_and(|&h| self.kind(h) == Some(&NodeKind::DeclStmt));
        header
            .iter()
            .map(|&part| {
                if self.kind(part) == Some(&NodeKind::DeclStmt) {
                    return (ForPart::Init, part);
                }
                let start = self.tree.span(part).map_or(0, |s| s.start);
                let before = semicolons.iter().filter(|&&s| s < start).count() + usize::from(declared);
                let role = match before {
                    0 => ForPart::Init,
                    1 => ForPart::Condition,
                    _ => ForPart::Increment,
                };
                (role, part)
            })
            .collect()
    }

    pub(super) fn for_statement(&mut self, node: Handle) -> VisitResult<Notify> {
        let children = self.children(node);
        let Some((&body, header)) = children.split_last() else {
            return Ok(None);
        };
        let mut modifications = Vec::new();
        for (role, part) in self.for_parts(node, header) {
            if role == ForPart::Init && self.kind(part) == Some(&NodeKind::DeclStmt) {
                modifications.extend(self.declaration_statement(part)?);
            } else {
                modifications.push(self.condition(node, part)?);
            }
        }
        modifications.extend(self.statement(body)?);
        Ok(Self::compound(node, modifications))
    }

    pub(super) fn switch_statement(&mut self, node: Handle) -> VisitResult<Notify> {
        self.while_statement(node)
    }

    /// `case` values are constant expressions and stay as written.
    pub(super) fn case_statement(&mut self, node: Handle) -> VisitResult<Notify> {
        match self.children(node).get(1) {
            Some(&body) => self.statement(body),
            None => Ok(None),
        }
    }

    pub(super) fn labeled_statement(&mut self, node: Handle) -> VisitResult<Notify> {
        match self.children(node).first() {
            Some(&body) => self.statement(body),
            None => Ok(None),
        }
    }

    pub(super) fn jump_statement(&mut self, node: Handle) -> VisitResult<Notify> {
        let start = self.stat(node, node);
        Ok(Some(Replace::Ext(Notify::stmt(node, start))))
    }

    /// `return x;` reports `x` as the function's return value.
    pub(super) fn return_statement(&mut self, node: Handle) -> VisitResult<Notify> {
        let Some(operand) = self.tree.children(node).next() else {
            return self.jump_statement(node);
        };
        let start = self.stat(node, node);
        let result_type = self.result_type().map(str::to_string);
        let Some(result_type) = result_type.filter(|t| ctypes::is_capturable(t)) else {
            let mut shape = self.expression(operand)?;
            shape.prepend_start(start);
            return Ok(Some(Replace::Ext(shape)));
        };
        let nested: Vec<_> = self.operand(operand)?.into_iter().collect();
        let temp = self.temporary(&result_type);
        let returned = self.event(
            NotifyData::new(Action::Return, Some(self.id(node)))
                .with_type(result_type)
                .with_temp(temp.clone()),
        );
        let mut shape = Notify::value(operand, temp, vec![returned], nested);
        shape.prepend_start(start);
        Ok(Some(Replace::Ext(shape)))
    }
}
