// Copyright (c) cstep contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Expression parsing implementation
//!
//! Binary operators use precedence climbing; everything else is recursive
//! descent. Every expression node gets a clang-style type spelling.
//!
//! # Precedence (lowest first)
//!
//! comma, assignment, conditional, `||`, `&&`, `|`, `^`, `&`, equality,
//! relational, shift, additive, multiplicative, cast, unary, postfix.

use tracing::warn;

use crate::ctype::{CType, FloatKind, IntKind};
use crate::error::ParseError;
use crate::kind::NodeKind;
use crate::lexer::is_floating_literal;
use crate::tree::{ParseNodeId, TokenKind};

use super::declarations::parse_integer_literal;
use super::{Expr, Parser};

const ASSIGNMENT_OPERATORS: &[&str] = &[
    "+=", "-=", "*=", "/=", "%=", "<<=", ">>=", "&=", "^=", "|=",
];

fn binary_precedence(op: &str) -> Option<u8> {
    let prec = match op {
        "||" => 1,
        "&&" => 2,
        "|" => 3,
        "^" => 4,
        "&" => 5,
        "==" | "!=" => 6,
        "<" | ">" | "<=" | ">=" => 7,
        "<<" | ">>" => 8,
        "+" | "-" => 9,
        "*" | "/" | "%" => 10,
        _ => return None,
    };
    Some(prec)
}

/// Result type of a binary operator.
fn binary_type(op: &str, left: &CType, right: &CType) -> CType {
    let (l, r) = (left.decay(), right.decay());
    match op {
        "||" | "&&" | "==" | "!=" | "<" | ">" | "<=" | ">=" => CType::int(),
        "<<" | ">>" => l.promoted(),
        "+" if l.is_pointer() => l,
        "+" if r.is_pointer() => r,
        "-" if l.is_pointer() && r.is_pointer() => CType::Int {
            kind: IntKind::Long,
            unsigned: false,
        },
        "-" if l.is_pointer() => l,
        _ => CType::usual_arithmetic(&l, &r),
    }
}

fn conditional_type(a: &CType, b: &CType) -> CType {
    if a.is_arithmetic() && b.is_arithmetic() {
        CType::usual_arithmetic(a, b)
    } else if a.decay().is_pointer() {
        a.decay()
    } else if b.decay().is_pointer() {
        b.decay()
    } else {
        a.clone()
    }
}

impl<'a> Parser<'a> {
    fn expr_node(
        &mut self,
        kind: NodeKind,
        start: usize,
        end: usize,
        children: Vec<ParseNodeId>,
        ty: CType,
    ) -> Expr {
        let id = self.add_node(kind, start, end, children);
        self.set_type(id, &ty);
        Expr { id, ty, start, end }
    }

    /// Parse expression (top-level entry point, including the comma operator)
    pub(crate) fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_assignment_expression()?;
        while self.eat(",").is_some() {
            let right = self.parse_assignment_expression()?;
            let ty = right.ty.clone();
            left = self.expr_node(
                NodeKind::BinaryOperator,
                left.start,
                right.end,
                vec![left.id, right.id],
                ty,
            );
        }
        Ok(left)
    }

    /// Assignment and compound assignment (right-associative)
    pub(crate) fn parse_assignment_expression(&mut self) -> Result<Expr, ParseError> {
        let left = self.parse_conditional_expression()?;
        let kind = match self.peek() {
            Some(l) if l.is("=") => NodeKind::BinaryOperator,
            Some(l) if ASSIGNMENT_OPERATORS.iter().any(|op| l.is(op)) => {
                NodeKind::CompoundAssignmentOperator
            }
            _ => return Ok(left),
        };
        self.advance();
        let right = self.parse_assignment_expression()?;
        let ty = left.ty.clone();
        Ok(self.expr_node(kind, left.start, right.end, vec![left.id, right.id], ty))
    }

    /// `cond ? a : b`
    pub(crate) fn parse_conditional_expression(&mut self) -> Result<Expr, ParseError> {
        let condition = self.parse_binary(1)?;
        if self.eat("?").is_none() {
            return Ok(condition);
        }
        let then_value = self.parse_expression()?;
        self.expect(":", "in conditional expression")?;
        let else_value = self.parse_conditional_expression()?;
        let ty = conditional_type(&then_value.ty, &else_value.ty);
        Ok(self.expr_node(
            NodeKind::ConditionalOperator,
            condition.start,
            else_value.end,
            vec![condition.id, then_value.id, else_value.id],
            ty,
        ))
    }

    fn parse_binary(&mut self, min_precedence: u8) -> Result<Expr, ParseError> {
        let mut left = self.parse_cast_expression()?;
        loop {
            let op = match self.peek() {
                Some(l) if l.kind == TokenKind::Punctuation => l.text.clone(),
                _ => break,
            };
            let precedence = match binary_precedence(&op) {
                Some(p) if p >= min_precedence => p,
                _ => break,
            };
            self.advance();
            let right = self.parse_binary(precedence + 1)?;
            let ty = binary_type(&op, &left.ty, &right.ty);
            left = self.expr_node(
                NodeKind::BinaryOperator,
                left.start,
                right.end,
                vec![left.id, right.id],
                ty,
            );
        }
        Ok(left)
    }

    /// `(type) operand`
    fn parse_cast_expression(&mut self) -> Result<Expr, ParseError> {
        if !(self.check("(") && self.starts_type_name_at(1)) {
            return self.parse_unary_expression();
        }
        let open = self.current_start();
        self.advance();
        let (ty, mut children) = self.parse_type_name()?;
        self.expect(")", "to close cast")?;
        if self.check("{") {
            return Err(self.error_here("compound literals are not supported"));
        }
        let operand = self.parse_cast_expression()?;
        children.push(operand.id);
        Ok(self.expr_node(NodeKind::CstyleCastExpr, open, operand.end, children, ty))
    }

    fn parse_unary_expression(&mut self) -> Result<Expr, ParseError> {
        let Some(lexeme) = self.peek().cloned() else {
            return Err(self.error_here("expected expression"));
        };
        if lexeme.kind == TokenKind::Keyword && lexeme.text == "sizeof" {
            return self.parse_sizeof();
        }
        if lexeme.kind != TokenKind::Punctuation {
            return self.parse_postfix_expression();
        }
        let operand = match lexeme.text.as_str() {
            "++" | "--" => {
                self.advance();
                self.parse_unary_expression()?
            }
            "&" | "*" | "+" | "-" | "~" | "!" => {
                self.advance();
                self.parse_cast_expression()?
            }
            _ => return self.parse_postfix_expression(),
        };
        let ty = match lexeme.text.as_str() {
            "&" => operand.ty.clone().pointer_to(),
            "*" => match operand.ty.decay().pointee() {
                Some(pointee) => pointee,
                None => {
                    warn!(location = %self.location(lexeme.start), "dereference of non-pointer");
                    CType::int()
                }
            },
            "+" | "-" | "~" => operand.ty.promoted(),
            "!" => CType::int(),
            _ => operand.ty.clone(),
        };
        Ok(self.expr_node(
            NodeKind::UnaryOperator,
            lexeme.start,
            operand.end,
            vec![operand.id],
            ty,
        ))
    }

    /// `sizeof expr` or `sizeof(type)`
    fn parse_sizeof(&mut self) -> Result<Expr, ParseError> {
        let start = self.current_start();
        self.advance();
        let children = if self.check("(") && self.starts_type_name_at(1) {
            self.advance();
            let (_, nodes) = self.parse_type_name()?;
            self.expect(")", "to close sizeof")?;
            nodes
        } else {
            vec![self.parse_unary_expression()?.id]
        };
        let end = self.previous_end();
        Ok(self.expr_node(
            NodeKind::CxxUnaryExpr,
            start,
            end,
            children,
            CType::unsigned_long(),
        ))
    }

    /// Subscripts, calls, member access and postfix `++`/`--`
    fn parse_postfix_expression(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary_expression()?;
        loop {
            let Some(lexeme) = self.peek().cloned() else {
                break;
            };
            if lexeme.kind != TokenKind::Punctuation {
                break;
            }
            expr = match lexeme.text.as_str() {
                "[" => {
                    self.advance();
                    let index = self.parse_expression()?;
                    let close = self.expect("]", "to close subscript")?;
                    let ty = expr
                        .ty
                        .decay()
                        .pointee()
                        .or_else(|| index.ty.decay().pointee())
                        .unwrap_or_else(CType::int);
                    self.expr_node(
                        NodeKind::ArraySubscriptExpr,
                        expr.start,
                        close.end,
                        vec![expr.id, index.id],
                        ty,
                    )
                }
                "(" => {
                    self.advance();
                    let mut children = vec![expr.id];
                    while !self.check(")") {
                        children.push(self.parse_assignment_expression()?.id);
                        if self.eat(",").is_none() {
                            break;
                        }
                    }
                    let close = self.expect(")", "to close argument list")?;
                    let ty = expr.ty.return_type().unwrap_or_else(CType::int);
                    self.expr_node(NodeKind::CallExpr, expr.start, close.end, children, ty)
                }
                "." | "->" => {
                    self.advance();
                    let member = match self.advance() {
                        Some(l) if l.kind == TokenKind::Identifier => l,
                        _ => return Err(self.error_here("expected member name")),
                    };
                    let record = if lexeme.text == "->" {
                        expr.ty.decay().pointee().unwrap_or_else(CType::int)
                    } else {
                        expr.ty.clone()
                    };
                    let ty = self.member_type(&record, &member.text, member.start);
                    let node = self.expr_node(
                        NodeKind::MemberRefExpr,
                        expr.start,
                        member.end,
                        vec![expr.id],
                        ty,
                    );
                    self.set_spelling(node.id, &member.text);
                    node
                }
                "++" | "--" => {
                    self.advance();
                    let ty = expr.ty.clone();
                    self.expr_node(
                        NodeKind::UnaryOperator,
                        expr.start,
                        lexeme.end,
                        vec![expr.id],
                        ty,
                    )
                }
                _ => break,
            };
        }
        Ok(expr)
    }

    fn member_type(&self, record: &CType, member: &str, offset: usize) -> CType {
        let key = match record.resolved() {
            CType::Struct(tag) => format!("struct {}", tag),
            CType::Union(tag) => format!("union {}", tag),
            _ => {
                warn!(member, location = %self.location(offset), "member access on non-record");
                return CType::int();
            }
        };
        let found = self
            .record_fields(&key)
            .and_then(|fields| fields.iter().find(|(name, _)| name == member))
            .map(|(_, ty)| ty.clone());
        match found {
            Some(ty) => ty,
            None => {
                warn!(member, record = %key, "unknown member, assuming int");
                CType::int()
            }
        }
    }

    fn parse_primary_expression(&mut self) -> Result<Expr, ParseError> {
        let Some(lexeme) = self.peek().cloned() else {
            return Err(self.error_here("expected expression"));
        };
        match lexeme.kind {
            TokenKind::Identifier => {
                self.advance();
                let called = self.check("(");
                let ty = self.identifier_type(&lexeme.text, called, lexeme.start);
                let expr = self.expr_node(
                    NodeKind::DeclRefExpr,
                    lexeme.start,
                    lexeme.end,
                    Vec::new(),
                    ty,
                );
                self.set_spelling(expr.id, &lexeme.text);
                Ok(expr)
            }
            TokenKind::Literal => self.parse_literal(),
            TokenKind::Punctuation if lexeme.text == "(" => {
                self.advance();
                let inner = self.parse_expression()?;
                let close = self.expect(")", "to close parenthesized expression")?;
                let ty = inner.ty.clone();
                Ok(self.expr_node(
                    NodeKind::ParenExpr,
                    lexeme.start,
                    close.end,
                    vec![inner.id],
                    ty,
                ))
            }
            _ => Err(self.error_here("expected expression")),
        }
    }

    fn parse_literal(&mut self) -> Result<Expr, ParseError> {
        let Some(lexeme) = self.advance() else {
            return Err(self.error_here("expected literal"));
        };
        let text = lexeme.text.as_str();
        let quote = text.find(['"', '\'']);
        match quote.map(|i| (i, text.as_bytes()[i])) {
            Some((prefix, b'"')) => {
                let element = string_element_type(&text[..prefix]);
                let mut len = string_literal_length(text);
                let mut end = lexeme.end;
                // Adjacent string literals concatenate.
                while let Some(next) = self.peek() {
                    if next.kind != TokenKind::Literal || !next.text.ends_with('"') {
                        break;
                    }
                    len += string_literal_length(&next.text);
                    end = next.end;
                    self.advance();
                }
                let ty = element.array_of(Some(len + 1));
                Ok(self.expr_node(NodeKind::StringLiteral, lexeme.start, end, Vec::new(), ty))
            }
            Some((_, _)) => Ok(self.expr_node(
                NodeKind::CharacterLiteral,
                lexeme.start,
                lexeme.end,
                Vec::new(),
                CType::int(),
            )),
            None if is_floating_literal(text) => {
                let kind = match text.chars().last() {
                    Some('f' | 'F') => FloatKind::Float,
                    Some('l' | 'L') => FloatKind::LongDouble,
                    _ => FloatKind::Double,
                };
                Ok(self.expr_node(
                    NodeKind::FloatingLiteral,
                    lexeme.start,
                    lexeme.end,
                    Vec::new(),
                    CType::Float(kind),
                ))
            }
            None => {
                let ty = integer_literal_type(text);
                Ok(self.expr_node(
                    NodeKind::IntegerLiteral,
                    lexeme.start,
                    lexeme.end,
                    Vec::new(),
                    ty,
                ))
            }
        }
    }
}

fn integer_literal_type(text: &str) -> CType {
    let lower = text.to_ascii_lowercase();
    let is_hex = lower.starts_with("0x");
    let suffix: String = lower
        .chars()
        .rev()
        .take_while(|c| *c == 'u' || *c == 'l')
        .collect();
    let unsigned = suffix.contains('u');
    let longs = suffix.matches('l').count();
    let value = parse_integer_literal(text).unwrap_or(0);
    let kind = if longs >= 2 {
        IntKind::LongLong
    } else if longs == 1 || value > i32::MAX as u64 && !(is_hex && value <= u32::MAX as u64) {
        IntKind::Long
    } else {
        IntKind::Int
    };
    let unsigned = unsigned || (is_hex && kind == IntKind::Int && value > i32::MAX as u64);
    CType::Int { kind, unsigned }
}

fn string_element_type(prefix: &str) -> CType {
    match prefix {
        "L" | "U" => CType::int(),
        "u" => CType::Int {
            kind: IntKind::Short,
            unsigned: true,
        },
        _ => CType::char(),
    }
}

/// Number of characters a string literal contributes, excluding the NUL.
fn string_literal_length(text: &str) -> u64 {
    let body = match (text.find('"'), text.rfind('"')) {
        (Some(open), Some(close)) if close > open => &text[open + 1..close],
        _ => return 0,
    };
    let bytes = body.as_bytes();
    let mut count = 0;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 1 < bytes.len() {
            i += 2;
            match bytes[i - 1] {
                b'x' => {
                    while i < bytes.len() && bytes[i].is_ascii_hexdigit() {
                        i += 1;
                    }
                }
                b'0'..=b'7' => {
                    let mut digits = 1;
                    while digits < 3 && i < bytes.len() && (b'0'..=b'7').contains(&bytes[i]) {
                        i += 1;
                        digits += 1;
                    }
                }
                _ => {}
            }
        } else {
            i += 1;
        }
        count += 1;
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_translation_unit;
    use crate::tree::ParseTree;

    fn expression_kinds(source: &str) -> Vec<(NodeKind, String)> {
        let tree: ParseTree = parse_translation_unit(source).unwrap();
        tree.descendants(tree.root())
            .into_iter()
            .map(|id| tree.node(id))
            .filter(|n| n.kind.is_expression())
            .map(|n| (n.kind.clone(), n.type_spelling.clone().unwrap_or_default()))
            .collect()
    }

    #[test]
    fn precedence_nests_multiplication_under_addition() {
        let kinds = expression_kinds("int f(int a, int b){ return a + b * 2; }");
        let names: Vec<_> = kinds.iter().map(|(k, _)| k.as_str().to_string()).collect();
        assert_eq!(
            names,
            vec![
                "BinaryOperator",
                "DeclRefExpr",
                "BinaryOperator",
                "DeclRefExpr",
                "IntegerLiteral"
            ]
        );
    }

    #[test]
    fn casts_and_unary_operators() {
        let kinds = expression_kinds("void f(int x){ (double)-x; !x; &x; }");
        assert_eq!(kinds[0], (NodeKind::CstyleCastExpr, "double".into()));
        assert_eq!(kinds[1], (NodeKind::UnaryOperator, "int".into()));
        assert!(kinds.contains(&(NodeKind::UnaryOperator, "int *".into())));
    }

    #[test]
    fn comma_and_conditional() {
        let kinds = expression_kinds("void f(int x, double d){ x ? d : x; x, d; }");
        assert_eq!(kinds[0], (NodeKind::ConditionalOperator, "double".into()));
        assert!(kinds.contains(&(NodeKind::BinaryOperator, "double".into())));
    }

    #[test]
    fn literal_types() {
        let kinds = expression_kinds("void f(){ 1; 2u; 3L; 1.5; 1.5f; 'c'; \"ab\" \"cd\"; }");
        let types: Vec<_> = kinds.into_iter().map(|(_, t)| t).collect();
        assert_eq!(
            types,
            vec!["int", "unsigned int", "long", "double", "float", "int", "char [5]"]
        );
    }

    #[test]
    fn string_lengths_decode_escapes() {
        assert_eq!(string_literal_length("\"a\\n\""), 2);
        assert_eq!(string_literal_length("\"\\x41\\101\""), 2);
        assert_eq!(string_literal_length("L\"wide\""), 4);
    }

    #[test]
    fn postfix_increment_spans_operand_and_operator() {
        let source = "void f(int i){ i++; }";
        let tree = parse_translation_unit(source).unwrap();
        let op = tree
            .descendants(tree.root())
            .into_iter()
            .find(|&id| tree.node(id).kind == NodeKind::UnaryOperator)
            .unwrap();
        let extent = tree.node(op).extent;
        assert_eq!(extent.end.column - extent.start.column, 3);
    }

    #[test]
    fn pointer_difference_is_long() {
        assert_eq!(
            binary_type("-", &CType::int().pointer_to(), &CType::int().pointer_to()).spelling(),
            "long"
        );
        assert_eq!(
            binary_type("+", &CType::int(), &CType::char().array_of(Some(3))).spelling(),
            "char *"
        );
    }
}
