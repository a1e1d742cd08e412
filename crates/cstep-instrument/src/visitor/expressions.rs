//! Expression rules.
//!
//! Every expression that yields a reportable value is captured: it is
//! assigned to a fresh temporary, an `eval` event reports the temporary,
//! and the temporary is the value of the rewritten expression. Operands are
//! rewritten first (as nested modifications), so the events of a compound
//! expression fire inside out, in evaluation order.
//!
//! Lvalues are never captured. An assignment target keeps its place and
//! only the values computed inside it (array indices, pointers being
//! dereferenced) are reported.

use cstep_cparse::NodeKind;
use cstep_cst::{Handle, Replace};

use super::InstrumentVisitor;
use crate::ctypes;
use crate::error::InstrumentError;
use crate::event::{Action, NotifyData};
use crate::shapes::Notify;

type Nested = Vec<Replace<Notify>>;

impl InstrumentVisitor<'_> {
    /// The shape reporting `node`, possibly a no-op.
    pub(super) fn expression(&mut self, node: Handle) -> Result<Notify, InstrumentError> {
        let Some(kind) = self.kind(node) else {
            return Ok(Notify::void(node, Vec::new()));
        };
        let children = self.children(node);
        match kind {
            NodeKind::ParenExpr => match children.first() {
                Some(&inner) => self.expression(inner),
                None => Ok(Notify::void(node, Vec::new())),
            },
            NodeKind::BinaryOperator => match (self.operator(node), children.as_slice()) {
                (Some("="), &[lhs, rhs]) => self.assignment(node, lhs, rhs),
                // `temp = a, b` would capture `a`; the value of a comma
                // expression is its right operand, captured on its own.
                (Some(","), _) => {
                    let mut nested = Vec::new();
                    for &operand in &children {
                        nested.extend(self.operand(operand)?);
                    }
                    Ok(Notify::void(node, nested))
                }
                _ => self.computed(node, &children),
            },
            NodeKind::CompoundAssignmentOperator => match children.as_slice() {
                &[lhs, rhs] => self.assignment(node, lhs, rhs),
                _ => self.computed(node, &children),
            },
            NodeKind::UnaryOperator => self.unary(node),
            NodeKind::CallExpr => {
                let mut nested = Vec::new();
                for &argument in children.iter().skip(1) {
                    nested.extend(self.operand(argument)?);
                }
                self.capture(node, nested)
            }
            NodeKind::ConditionalOperator | NodeKind::ArraySubscriptExpr => self.computed(node, &children),
            NodeKind::MemberRefExpr => {
                let nested = self.member_base(node)?;
                self.capture(node, nested)
            }
            NodeKind::CstyleCastExpr => {
                let mut nested = Vec::new();
                if let Some(&operand) = children.last() {
                    if self.kind(operand).is_some_and(NodeKind::is_expression) {
                        nested.extend(self.operand(operand)?);
                    }
                }
                self.capture(node, nested)
            }
            NodeKind::CxxUnaryExpr | NodeKind::DeclRefExpr => self.capture(node, Vec::new()),
            k if k.is_literal() => self.capture(node, Vec::new()),
            _ => {
                // Initializer lists and unexposed expressions are not values
                // themselves; only their parts are reported.
                let mut nested = Vec::new();
                for child in children {
                    if self.kind(child).is_some_and(NodeKind::is_expression) {
                        nested.extend(self.operand(child)?);
                    }
                }
                Ok(Notify::void(node, nested))
            }
        }
    }

    /// The rewrite of an operand, or nothing for constants and no-ops.
    pub(super) fn operand(&mut self, node: Handle) -> Result<Option<Replace<Notify>>, InstrumentError> {
        if self.is_constant(node) {
            return Ok(None);
        }
        let shape = self.expression(node)?;
        Ok((!shape.is_noop()).then_some(Replace::Ext(shape)))
    }

    /// Literals, signed literals and parenthesized constants.
    pub(super) fn is_constant(&self, node: Handle) -> bool {
        match self.kind(node) {
            Some(k) if k.is_literal() => true,
            Some(NodeKind::ParenExpr) => self.children(node).first().is_some_and(|&c| self.is_constant(c)),
            Some(NodeKind::UnaryOperator) => {
                matches!(self.operator(node), Some("-" | "+"))
                    && self.children(node).first().is_some_and(|&c| self.kind(c).is_some_and(NodeKind::is_literal))
            }
            _ => false,
        }
    }

    /// Capture the value of `node` after applying `nested` inside it;
    /// values that cannot be held in a temporary are only wrapped.
    fn capture(&mut self, node: Handle, nested: Nested) -> Result<Notify, InstrumentError> {
        let spelling = self.type_of(node)?;
        if !ctypes::is_capturable(&spelling) {
            return Ok(Notify::void(node, nested));
        }
        let temp = self.temporary(&spelling);
        let eval = self.event(
            NotifyData::new(Action::Eval, Some(self.id(node)))
                .with_type(spelling)
                .with_temp(temp.clone()),
        );
        Ok(Notify::value(node, temp, vec![eval], nested))
    }

    /// Operators and conditionals: report every operand, then the result.
    fn computed(&mut self, node: Handle, operands: &[Handle]) -> Result<Notify, InstrumentError> {
        let mut nested = Vec::new();
        for &operand in operands {
            nested.extend(self.operand(operand)?);
        }
        self.capture(node, nested)
    }

    fn unary(&mut self, node: Handle) -> Result<Notify, InstrumentError> {
        let Some(&operand) = self.children(node).first() else {
            return self.capture(node, Vec::new());
        };
        match self.operator(node) {
            Some("++" | "--") => self.assigning(node, operand, Vec::new()),
            Some("&") => {
                let nested = self.lvalue(operand)?;
                self.capture(node, nested)
            }
            _ => {
                let nested: Nested = self.operand(operand)?.into_iter().collect();
                self.capture(node, nested)
            }
        }
    }

    /// `=` and the compound assignments.
    fn assignment(&mut self, node: Handle, lhs: Handle, rhs: Handle) -> Result<Notify, InstrumentError> {
        let mut nested = self.lvalue(lhs)?;
        nested.extend(self.operand(rhs)?);
        self.assigning(node, lhs, nested)
    }

    /// Capture an expression that stores into `target`, then report the
    /// store. Stores through impure lvalues report only the value.
    fn assigning(&mut self, node: Handle, target: Handle, nested: Nested) -> Result<Notify, InstrumentError> {
        let mut shape = self.capture(node, nested)?;
        let (Notify::Expr(_) | Notify::CompoundExpr(_)) = shape else {
            return Ok(shape);
        };
        if !self.is_pure(target) {
            return Ok(shape);
        }
        let Some(identifier) = self.tree.source_text(target) else {
            return Ok(shape);
        };
        let assign = self.event(
            NotifyData::new(Action::Assign, Some(self.id(node)))
                .with_type(self.type_of(target)?)
                .with_identifier(identifier),
        );
        shape.push_end(assign);
        Ok(shape)
    }

    /// Values computed inside an lvalue, which itself stays in place.
    pub(super) fn lvalue(&mut self, node: Handle) -> Result<Nested, InstrumentError> {
        let children = self.children(node);
        let mut nested = Vec::new();
        match self.kind(node) {
            Some(NodeKind::ParenExpr) => {
                if let Some(&inner) = children.first() {
                    nested = self.lvalue(inner)?;
                }
            }
            Some(NodeKind::MemberRefExpr) => nested = self.member_base(node)?,
            Some(NodeKind::ArraySubscriptExpr) => {
                for child in children {
                    nested.extend(self.operand(child)?);
                }
            }
            Some(NodeKind::UnaryOperator) if self.operator(node) == Some("*") => {
                if let Some(&pointer) = children.first() {
                    nested.extend(self.operand(pointer)?);
                }
            }
            _ => {}
        }
        Ok(nested)
    }

    /// `p->m` reports the pointer `p`; `s.m` reaches into the lvalue `s`.
    fn member_base(&mut self, node: Handle) -> Result<Nested, InstrumentError> {
        let Some(&base) = self.children(node).first() else {
            return Ok(Vec::new());
        };
        if self.operator(node) == Some("->") {
            Ok(self.operand(base)?.into_iter().collect())
        } else {
            self.lvalue(base)
        }
    }

    /// True if evaluating `node` again has no side effects, so its text can
    /// be reused to take the address of an assigned location.
    fn is_pure(&self, node: Handle) -> bool {
        let pure_here = match self.kind(node) {
            Some(NodeKind::CallExpr | NodeKind::CompoundAssignmentOperator) => false,
            Some(NodeKind::BinaryOperator) => self.operator(node) != Some("="),
            Some(NodeKind::UnaryOperator) => !matches!(self.operator(node), Some("++" | "--")),
            Some(_) => true,
            None => false,
        };
        pure_here && self.children(node).iter().all(|&child| self.is_pure(child))
    }
}
