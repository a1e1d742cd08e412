// Copyright (c) cstep contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Statement parsing implementation
//!
//! # Supported Statements
//!
//! - Compound `{ ... }` with its own scope
//! - Declarations (`DeclStmt`) and expression statements
//! - `if`/`else`, `while`, `do`/`while`, `for`, `switch`/`case`/`default`
//! - `break`, `continue`, `return`, `goto`, labels and `;`

use crate::error::ParseError;
use crate::kind::NodeKind;
use crate::tree::{ParseNodeId, TokenKind};

use super::Parser;

impl<'a> Parser<'a> {
    /// Parse any statement
    pub(crate) fn parse_statement(&mut self) -> Result<ParseNodeId, ParseError> {
        let Some(lexeme) = self.peek().cloned() else {
            return Err(self.error_here("expected statement"));
        };
        if lexeme.kind == TokenKind::Identifier && self.check_ahead(1, ":") {
            return self.parse_label();
        }
        if lexeme.kind == TokenKind::Punctuation {
            match lexeme.text.as_str() {
                "{" => return self.parse_compound_statement(),
                ";" => {
                    self.advance();
                    return Ok(self.add_node(NodeKind::NullStmt, lexeme.start, lexeme.end, Vec::new()));
                }
                _ => {}
            }
        }
        if lexeme.kind == TokenKind::Keyword {
            match lexeme.text.as_str() {
                "if" => return self.parse_if(),
                "while" => return self.parse_while(),
                "do" => return self.parse_do_while(),
                "for" => return self.parse_for(),
                "switch" => return self.parse_switch(),
                "case" => return self.parse_case(),
                "default" => return self.parse_default(),
                "return" => return self.parse_return(),
                "break" | "continue" => {
                    self.advance();
                    let kind = if lexeme.text == "break" {
                        NodeKind::BreakStmt
                    } else {
                        NodeKind::ContinueStmt
                    };
                    let id = self.add_node(kind, lexeme.start, lexeme.end, Vec::new());
                    self.expect(";", &format!("after '{}'", lexeme.text))?;
                    return Ok(id);
                }
                "goto" => return self.parse_goto(),
                _ => {}
            }
        }
        if self.starts_declaration() {
            return self.parse_declaration_statement();
        }

        // Expression statement: the `;` stays with the enclosing statement.
        let expr = self.parse_expression()?;
        self.expect(";", "after expression")?;
        Ok(expr.id)
    }

    /// `{ statements }`, opening a new scope.
    pub(crate) fn parse_compound_statement(&mut self) -> Result<ParseNodeId, ParseError> {
        let open = self.expect("{", "to open block")?;
        self.push_scope();
        let mut children = Vec::new();
        let result = loop {
            if self.check("}") {
                break Ok(());
            }
            if self.is_at_end() {
                break Err(self.error_here("expected '}' to close block"));
            }
            match self.parse_statement() {
                Ok(child) => children.push(child),
                Err(err) => break Err(err),
            }
        };
        self.pop_scope();
        result?;
        let close = self.expect("}", "to close block")?;
        Ok(self.add_node(NodeKind::CompoundStmt, open.start, close.end, children))
    }

    /// `( expression )` of a control statement.
    fn parse_condition(&mut self, keyword: &str) -> Result<ParseNodeId, ParseError> {
        self.expect("(", &format!("after '{}'", keyword))?;
        let condition = self.parse_expression()?;
        self.expect(")", &format!("after {} condition", keyword))?;
        Ok(condition.id)
    }

    fn parse_if(&mut self) -> Result<ParseNodeId, ParseError> {
        let start = self.current_start();
        self.advance();
        let mut children = vec![self.parse_condition("if")?];
        children.push(self.parse_statement()?);
        if self.eat("else").is_some() {
            children.push(self.parse_statement()?);
        }
        Ok(self.add_node(NodeKind::IfStmt, start, self.previous_end(), children))
    }

    fn parse_while(&mut self) -> Result<ParseNodeId, ParseError> {
        let start = self.current_start();
        self.advance();
        let condition = self.parse_condition("while")?;
        let body = self.parse_statement()?;
        Ok(self.add_node(
            NodeKind::WhileStmt,
            start,
            self.previous_end(),
            vec![condition, body],
        ))
    }

    fn parse_do_while(&mut self) -> Result<ParseNodeId, ParseError> {
        let start = self.current_start();
        self.advance();
        let body = self.parse_statement()?;
        self.expect("while", "after do body")?;
        let condition = self.parse_condition("while")?;
        let id = self.add_node(
            NodeKind::DoStmt,
            start,
            self.previous_end(),
            vec![body, condition],
        );
        self.expect(";", "after do/while statement")?;
        Ok(id)
    }

    /// `for (init; cond; inc) body`; only the parts present become children.
    fn parse_for(&mut self) -> Result<ParseNodeId, ParseError> {
        let start = self.current_start();
        self.advance();
        self.expect("(", "after 'for'")?;
        self.push_scope();
        let result = self.parse_for_parts();
        self.pop_scope();
        let children = result?;
        Ok(self.add_node(NodeKind::ForStmt, start, self.previous_end(), children))
    }

    fn parse_for_parts(&mut self) -> Result<Vec<ParseNodeId>, ParseError> {
        let mut children = Vec::new();
        if self.starts_declaration() {
            children.push(self.parse_declaration_statement()?);
        } else {
            if !self.check(";") {
                children.push(self.parse_expression()?.id);
            }
            self.expect(";", "in 'for' header")?;
        }
        if !self.check(";") {
            children.push(self.parse_expression()?.id);
        }
        self.expect(";", "in 'for' header")?;
        if !self.check(")") {
            children.push(self.parse_expression()?.id);
        }
        self.expect(")", "to close 'for' header")?;
        children.push(self.parse_statement()?);
        Ok(children)
    }

    fn parse_switch(&mut self) -> Result<ParseNodeId, ParseError> {
        let start = self.current_start();
        self.advance();
        let condition = self.parse_condition("switch")?;
        let body = self.parse_statement()?;
        Ok(self.add_node(
            NodeKind::SwitchStmt,
            start,
            self.previous_end(),
            vec![condition, body],
        ))
    }

    fn parse_case(&mut self) -> Result<ParseNodeId, ParseError> {
        let start = self.current_start();
        self.advance();
        let value = self.parse_conditional_expression()?;
        self.expect(":", "after case value")?;
        let body = self.parse_statement()?;
        Ok(self.add_node(
            NodeKind::CaseStmt,
            start,
            self.previous_end(),
            vec![value.id, body],
        ))
    }

    fn parse_default(&mut self) -> Result<ParseNodeId, ParseError> {
        let start = self.current_start();
        self.advance();
        self.expect(":", "after 'default'")?;
        let body = self.parse_statement()?;
        Ok(self.add_node(NodeKind::DefaultStmt, start, self.previous_end(), vec![body]))
    }

    fn parse_return(&mut self) -> Result<ParseNodeId, ParseError> {
        let start = self.current_start();
        self.advance();
        let mut children = Vec::new();
        if !self.check(";") {
            children.push(self.parse_expression()?.id);
        }
        let id = self.add_node(NodeKind::ReturnStmt, start, self.previous_end(), children);
        self.expect(";", "after return value")?;
        Ok(id)
    }

    fn parse_goto(&mut self) -> Result<ParseNodeId, ParseError> {
        let start = self.current_start();
        self.advance();
        let label = match self.advance() {
            Some(l) if l.kind == TokenKind::Identifier => l,
            _ => return Err(self.error_here("expected label after 'goto'")),
        };
        let id = self.add_node(NodeKind::GotoStmt, start, label.end, Vec::new());
        self.set_spelling(id, &label.text);
        self.expect(";", "after goto label")?;
        Ok(id)
    }

    fn parse_label(&mut self) -> Result<ParseNodeId, ParseError> {
        let label = match self.advance() {
            Some(l) => l,
            None => return Err(self.error_here("expected label")),
        };
        self.expect(":", "after label")?;
        let body = self.parse_statement()?;
        let id = self.add_node(NodeKind::LabelStmt, label.start, self.previous_end(), vec![body]);
        self.set_spelling(id, &label.text);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use crate::kind::NodeKind;
    use crate::parse_translation_unit;

    fn kinds_under_body(source: &str) -> Vec<NodeKind> {
        let tree = parse_translation_unit(source).unwrap();
        let func = tree.children(tree.root())[0];
        let body = *tree.children(func).last().unwrap();
        tree.children(body)
            .iter()
            .map(|&id| tree.node(id).kind.clone())
            .collect()
    }

    #[test]
    fn control_statements() {
        let kinds = kinds_under_body(
            "void f(int n){ if (n) n = 1; else ; while (n) n--; do { } while (0); \
             switch (n) { case 1: break; default: ; } goto out; out: return; }",
        );
        assert_eq!(
            kinds,
            vec![
                NodeKind::IfStmt,
                NodeKind::WhileStmt,
                NodeKind::DoStmt,
                NodeKind::SwitchStmt,
                NodeKind::GotoStmt,
                NodeKind::LabelStmt,
            ]
        );
    }

    #[test]
    fn case_has_value_and_body() {
        let tree = parse_translation_unit("void f(int n){ switch (n) { case 2: n = 0; } }").unwrap();
        let case = tree
            .descendants(tree.root())
            .into_iter()
            .find(|&id| tree.node(id).kind == NodeKind::CaseStmt)
            .unwrap();
        let children: Vec<_> = tree
            .children(case)
            .iter()
            .map(|&id| tree.node(id).kind.clone())
            .collect();
        assert_eq!(children, vec![NodeKind::IntegerLiteral, NodeKind::BinaryOperator]);
    }

    #[test]
    fn for_with_declaration_scopes_variable() {
        let tree =
            parse_translation_unit("void f(){ for (int i = 0; i < 2; i++) { } }").unwrap();
        let for_stmt = tree
            .descendants(tree.root())
            .into_iter()
            .find(|&id| tree.node(id).kind == NodeKind::ForStmt)
            .unwrap();
        let first = tree.children(for_stmt)[0];
        assert_eq!(tree.node(first).kind, NodeKind::DeclStmt);
    }

    #[test]
    fn return_excludes_semicolon() {
        let tree = parse_translation_unit("int f(){ return 1; }").unwrap();
        let ret = tree
            .descendants(tree.root())
            .into_iter()
            .find(|&id| tree.node(id).kind == NodeKind::ReturnStmt)
            .unwrap();
        let extent = tree.node(ret).extent;
        assert_eq!(extent.end.column - extent.start.column, "return 1".len() as u32);
    }
}
