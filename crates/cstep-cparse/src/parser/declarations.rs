// Copyright (c) cstep contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Declaration parsing: specifiers, declarators, functions, records,
//! enums and typedefs.
//!
//! Declarators are parsed into a [`Shape`] first and applied to the base
//! type afterwards, which handles the inside-out reading of C declarators
//! (`int (*fp)(int)`, `char *argv[]`) without backtracking.

use crate::ctype::{CType, FloatKind, IntKind};
use crate::error::ParseError;
use crate::kind::NodeKind;
use crate::tree::{ParseNodeId, StorageClass, TokenKind};

use super::{Expr, Parser};

/// Declaration specifiers: base type, storage and the nodes they produced.
#[derive(Debug, Clone)]
pub(crate) struct Specifiers {
    pub base: CType,
    pub storage: StorageClass,
    pub is_typedef: bool,
    pub start: usize,
    /// Record/enum definitions and type references inside the specifiers.
    pub nodes: Vec<ParseNodeId>,
}

/// A function parameter as seen by the function body.
#[derive(Debug, Clone)]
pub(crate) struct Param {
    pub name: Option<String>,
    pub ty: CType,
}

/// A fully applied declarator.
#[derive(Debug, Clone)]
pub(crate) struct Declarator {
    pub name: Option<(String, usize)>,
    pub start: usize,
    pub end: usize,
    pub ty: CType,
    /// Parameters when the name itself is declared as a function.
    pub params: Option<Vec<Param>>,
    /// Parameter and array-size nodes found inside the declarator.
    pub nodes: Vec<ParseNodeId>,
}

#[derive(Debug)]
enum Suffix {
    Array(Option<u64>),
    Function { params: Vec<Param>, variadic: bool },
}

#[derive(Debug, Default)]
struct Shape {
    /// One entry per `*`, true when the pointer itself is `const`.
    pointers: Vec<bool>,
    inner: Option<Box<Shape>>,
    name: Option<(String, usize)>,
    suffixes: Vec<Suffix>,
}

impl Shape {
    /// Apply the declarator to `base`, returning the declared type, the
    /// name, and the parameters of a function declarator on the name.
    fn apply(self, base: CType) -> (CType, Option<(String, usize)>, Option<Vec<Param>>) {
        let mut ty = base;
        for is_const in self.pointers {
            ty = ty.pointer_to();
            if is_const {
                ty = ty.qualified_const();
            }
        }
        let mut direct = None;
        let named = self.inner.is_none();
        for (i, suffix) in self.suffixes.into_iter().enumerate().rev() {
            ty = match suffix {
                Suffix::Array(len) => ty.array_of(len),
                Suffix::Function { params, variadic } => {
                    let types = params.iter().map(|p| p.ty.clone()).collect();
                    if i == 0 && named {
                        direct = Some(params);
                    }
                    CType::Function {
                        ret: Box::new(ty),
                        params: types,
                        variadic,
                    }
                }
            };
        }
        match self.inner {
            Some(inner) => inner.apply(ty),
            None => (ty, self.name, direct),
        }
    }
}

const STORAGE_KEYWORDS: &[&str] = &["static", "extern", "register", "auto", "typedef"];
const TYPE_KEYWORDS: &[&str] = &[
    "void", "char", "short", "int", "long", "float", "double", "signed", "unsigned", "_Bool",
    "struct", "union", "enum", "const", "volatile", "restrict", "inline",
];

impl<'a> Parser<'a> {
    // ========================================================================
    // Lookahead
    // ========================================================================

    /// True when the next token can begin a declaration.
    pub(crate) fn starts_declaration(&self) -> bool {
        match self.peek() {
            Some(l) if l.kind == TokenKind::Keyword => {
                STORAGE_KEYWORDS.contains(&l.text.as_str()) || TYPE_KEYWORDS.contains(&l.text.as_str())
            }
            Some(l) if l.kind == TokenKind::Identifier => {
                self.is_typedef_name(&l.text) && !self.check_ahead(1, ":")
            }
            _ => false,
        }
    }

    /// True when the token `n` ahead can begin a type name (casts, sizeof).
    pub(crate) fn starts_type_name_at(&self, n: usize) -> bool {
        match self.peek_ahead(n) {
            Some(l) if l.kind == TokenKind::Keyword => TYPE_KEYWORDS.contains(&l.text.as_str()),
            Some(l) if l.kind == TokenKind::Identifier => self.is_typedef_name(&l.text),
            _ => false,
        }
    }

    // ========================================================================
    // Top level
    // ========================================================================

    /// A function definition, or a declaration with one or more declarators.
    pub(crate) fn parse_external_declaration(&mut self) -> Result<Vec<ParseNodeId>, ParseError> {
        let specs = match self.parse_specifiers()? {
            Some(specs) => specs,
            None => return Err(self.error_here("expected declaration")),
        };
        if self.eat(";").is_some() {
            return Ok(specs.nodes);
        }

        let mut declarator = self.parse_declarator(&specs.base, true)?;
        if declarator.params.is_some() && self.check("{") {
            return Ok(vec![self.parse_function_definition(specs, declarator)?]);
        }

        let mut out = Vec::new();
        let mut first = true;
        loop {
            out.push(self.finish_declaration(&specs, declarator, first)?);
            first = false;
            if self.eat(",").is_none() {
                break;
            }
            declarator = self.parse_declarator(&specs.base, true)?;
        }
        self.expect(";", "after declaration")?;
        Ok(out)
    }

    fn parse_function_definition(
        &mut self,
        specs: Specifiers,
        declarator: Declarator,
    ) -> Result<ParseNodeId, ParseError> {
        let (name, _) = declarator
            .name
            .clone()
            .ok_or_else(|| self.error_here("expected function name"))?;
        self.declare(&name, declarator.ty.clone(), false);

        self.push_scope();
        for param in declarator.params.iter().flatten() {
            if let Some(param_name) = &param.name {
                self.declare(param_name, param.ty.clone(), false);
            }
        }
        let body = self.parse_compound_statement();
        self.pop_scope();
        let body = body?;

        let mut children = specs.nodes;
        children.extend(declarator.nodes);
        children.push(body);
        let id = self.add_node(
            NodeKind::FunctionDecl,
            specs.start,
            self.previous_end(),
            children,
        );
        self.set_spelling(id, &name);
        self.set_type(id, &declarator.ty);
        if let Some(ret) = declarator.ty.return_type() {
            self.set_result_type(id, &ret);
        }
        self.set_storage(id, specs.storage);
        Ok(id)
    }

    /// A local declaration statement, including its `;`.
    pub(crate) fn parse_declaration_statement(&mut self) -> Result<ParseNodeId, ParseError> {
        let start = self.current_start();
        let specs = match self.parse_specifiers()? {
            Some(specs) => specs,
            None => return Err(self.error_here("expected declaration")),
        };
        let mut children = Vec::new();
        if self.eat(";").is_some() {
            children.extend(specs.nodes);
        } else {
            let mut first = true;
            loop {
                let declarator = self.parse_declarator(&specs.base, true)?;
                children.push(self.finish_declaration(&specs, declarator, first)?);
                first = false;
                if self.eat(",").is_none() {
                    break;
                }
            }
            self.expect(";", "after declaration")?;
        }
        Ok(self.add_node(NodeKind::DeclStmt, start, self.previous_end(), children))
    }

    /// Turn one declarator into a `VarDecl`, `FunctionDecl` or `TypedefDecl`,
    /// parsing its initializer if any.
    fn finish_declaration(
        &mut self,
        specs: &Specifiers,
        declarator: Declarator,
        first: bool,
    ) -> Result<ParseNodeId, ParseError> {
        let (name, name_offset) = match declarator.name.clone() {
            Some(name) => name,
            None => return Err(self.error_here("expected identifier in declaration")),
        };
        let start = if first { specs.start } else { declarator.start };
        let mut children = if first { specs.nodes.clone() } else { Vec::new() };
        children.extend(declarator.nodes.iter().copied());
        let mut ty = declarator.ty.clone();

        if specs.is_typedef {
            self.declare(&name, CType::Typedef(name.clone(), Box::new(ty.clone())), true);
            let id = self.add_node(NodeKind::TypedefDecl, start, declarator.end, children);
            self.set_spelling(id, &name);
            self.set_type(id, &ty);
            return Ok(id);
        }

        if ty.is_function() {
            self.declare(&name, ty.clone(), false);
            let id = self.add_node(NodeKind::FunctionDecl, start, declarator.end, children);
            self.set_spelling(id, &name);
            self.set_type(id, &ty);
            if let Some(ret) = ty.return_type() {
                self.set_result_type(id, &ret);
            }
            self.set_storage(id, specs.storage);
            return Ok(id);
        }

        // The name is in scope inside its own initializer.
        self.declare(&name, ty.clone(), false);
        let mut end = declarator.end;
        if self.eat("=").is_some() {
            let init = if self.check("{") {
                self.parse_init_list(&ty)?
            } else {
                self.parse_assignment_expression()?
            };
            if let CType::Array(element, None) = &ty {
                let len = match &init.ty {
                    CType::Array(_, Some(n)) => Some(*n),
                    _ => Some(self.tree.children(init.id).len() as u64),
                };
                ty = element.as_ref().clone().array_of(len);
                self.declare(&name, ty.clone(), false);
            }
            end = init.end;
            children.push(init.id);
        }

        tracing::trace!(name, offset = name_offset, "declared variable");
        let id = self.add_node(NodeKind::VarDecl, start, end, children);
        self.set_spelling(id, &name);
        self.set_type(id, &ty);
        self.set_storage(id, specs.storage);
        Ok(id)
    }

    /// `{ a, b, { c } }`, typed as the declared object.
    fn parse_init_list(&mut self, ty: &CType) -> Result<Expr, ParseError> {
        let open = self.expect("{", "to open initializer list")?;
        let element = match ty.resolved() {
            CType::Array(element, _) => Some(element.as_ref().clone()),
            _ => None,
        };
        let fields = match ty.resolved() {
            CType::Struct(tag) => self.record_fields(&format!("struct {}", tag)).map(<[_]>::to_vec),
            CType::Union(tag) => self.record_fields(&format!("union {}", tag)).map(<[_]>::to_vec),
            _ => None,
        };
        let mut children = Vec::new();
        while !self.check("}") {
            let item_ty = element
                .clone()
                .or_else(|| {
                    fields
                        .as_ref()
                        .and_then(|f| f.get(children.len()))
                        .map(|(_, t)| t.clone())
                })
                .unwrap_or_else(CType::int);
            let item = if self.check("{") {
                self.parse_init_list(&item_ty)?
            } else {
                self.parse_assignment_expression()?
            };
            children.push(item.id);
            if self.eat(",").is_none() {
                break;
            }
        }
        self.expect("}", "to close initializer list")?;
        let end = self.previous_end();
        let id = self.add_node(NodeKind::InitListExpr, open.start, end, children);
        self.set_type(id, ty);
        Ok(Expr {
            id,
            ty: ty.clone(),
            start: open.start,
            end,
        })
    }

    // ========================================================================
    // Specifiers
    // ========================================================================

    /// Read declaration specifiers; `None` when the next token starts none.
    pub(crate) fn parse_specifiers(&mut self) -> Result<Option<Specifiers>, ParseError> {
        let start = self.current_start();
        let mut storage = StorageClass::None;
        let mut is_typedef = false;
        let mut is_const = false;
        let mut unsigned = false;
        let mut short = false;
        let mut longs = 0;
        let mut keyword: Option<String> = None;
        let mut named: Option<CType> = None;
        let mut nodes = Vec::new();
        let mut any = false;

        while let Some(lexeme) = self.peek().cloned() {
            if lexeme.kind == TokenKind::Identifier {
                let plain = named.is_none() && keyword.is_none() && !unsigned && !short && longs == 0;
                if plain && self.is_typedef_name(&lexeme.text) {
                    let ty = self
                        .lookup(&lexeme.text)
                        .map(|s| s.ty.clone())
                        .unwrap_or_else(CType::int);
                    self.advance();
                    let id = self.add_node(NodeKind::TypeRef, lexeme.start, lexeme.end, Vec::new());
                    self.set_spelling(id, &lexeme.text);
                    self.set_type(id, &ty);
                    nodes.push(id);
                    named = Some(ty);
                    any = true;
                    continue;
                }
                break;
            }
            if lexeme.kind != TokenKind::Keyword {
                break;
            }
            match lexeme.text.as_str() {
                "typedef" => is_typedef = true,
                "static" => storage = StorageClass::Static,
                "extern" => storage = StorageClass::Extern,
                "register" => storage = StorageClass::Register,
                "auto" => storage = StorageClass::Auto,
                "const" => is_const = true,
                "volatile" | "restrict" | "inline" | "signed" => {}
                "unsigned" => unsigned = true,
                "short" => short = true,
                "long" => longs += 1,
                "void" | "char" | "int" | "float" | "double" | "_Bool" => {
                    keyword = Some(lexeme.text.clone())
                }
                "struct" | "union" => {
                    let (ty, node) = self.parse_record_specifier()?;
                    nodes.extend(node);
                    named = Some(ty);
                    any = true;
                    continue;
                }
                "enum" => {
                    let (ty, node) = self.parse_enum_specifier()?;
                    nodes.extend(node);
                    named = Some(ty);
                    any = true;
                    continue;
                }
                _ => break,
            }
            self.advance();
            any = true;
        }

        if !any {
            return Ok(None);
        }

        let base = match (named, keyword.as_deref()) {
            (Some(ty), _) => ty,
            (None, Some("void")) => CType::Void,
            (None, Some("float")) => CType::Float(FloatKind::Float),
            (None, Some("double")) if longs > 0 => CType::Float(FloatKind::LongDouble),
            (None, Some("double")) => CType::Float(FloatKind::Double),
            (None, Some("_Bool")) => CType::Int {
                kind: IntKind::Bool,
                unsigned: false,
            },
            (None, Some("char")) => CType::Int {
                kind: IntKind::Char,
                unsigned,
            },
            _ => {
                let kind = if short {
                    IntKind::Short
                } else if longs >= 2 {
                    IntKind::LongLong
                } else if longs == 1 {
                    IntKind::Long
                } else {
                    IntKind::Int
                };
                CType::Int { kind, unsigned }
            }
        };
        let base = if is_const { base.qualified_const() } else { base };
        Ok(Some(Specifiers {
            base,
            storage,
            is_typedef,
            start,
            nodes,
        }))
    }

    /// `struct tag`, `struct tag { fields }` or `struct { fields }`.
    fn parse_record_specifier(&mut self) -> Result<(CType, Option<ParseNodeId>), ParseError> {
        let keyword = match self.advance() {
            Some(lexeme) => lexeme,
            None => return Err(self.error_here("expected 'struct' or 'union'")),
        };
        let is_union = keyword.text == "union";
        let tag = match self.peek() {
            Some(l) if l.kind == TokenKind::Identifier => {
                let l = l.clone();
                self.advance();
                Some(l)
            }
            _ => None,
        };
        let tag_name = match &tag {
            Some(l) => l.text.clone(),
            None => format!("(unnamed at {})", self.location(keyword.start)),
        };
        let ty = if is_union {
            CType::Union(tag_name.clone())
        } else {
            CType::Struct(tag_name.clone())
        };
        let key = format!("{} {}", keyword.text, tag_name);

        if !self.check("{") {
            let tag = match tag {
                Some(tag) => tag,
                None => return Err(self.error_here("expected record name or '{'")),
            };
            let id = self.add_node(NodeKind::TypeRef, tag.start, tag.end, Vec::new());
            self.set_spelling(id, &ty.spelling());
            self.set_type(id, &ty);
            return Ok((ty, Some(id)));
        }

        self.advance();
        let mut fields = Vec::new();
        let mut children = Vec::new();
        while !self.check("}") {
            let specs = match self.parse_specifiers()? {
                Some(specs) => specs,
                None => return Err(self.error_here("expected field declaration")),
            };
            let mut first = true;
            loop {
                let declarator = self.parse_declarator(&specs.base, false)?;
                let start = if first { specs.start } else { declarator.start };
                let mut field_children = if first { specs.nodes.clone() } else { Vec::new() };
                field_children.extend(declarator.nodes.iter().copied());
                if self.eat(":").is_some() {
                    field_children.push(self.parse_conditional_expression()?.id);
                }
                let end = self.previous_end();
                let id = self.add_node(NodeKind::FieldDecl, start, end, field_children);
                if let Some((name, _)) = &declarator.name {
                    self.set_spelling(id, name);
                    fields.push((name.clone(), declarator.ty.clone()));
                }
                self.set_type(id, &declarator.ty);
                children.push(id);
                first = false;
                if self.eat(",").is_none() {
                    break;
                }
            }
            self.expect(";", "after field declaration")?;
        }
        self.expect("}", "to close record body")?;
        self.define_record(key, fields);

        let kind = if is_union {
            NodeKind::UnionDecl
        } else {
            NodeKind::StructDecl
        };
        let id = self.add_node(kind, keyword.start, self.previous_end(), children);
        if tag.is_some() {
            self.set_spelling(id, &tag_name);
        }
        self.set_type(id, &ty);
        Ok((ty, Some(id)))
    }

    /// `enum tag`, `enum tag { A, B = 2 }`; constants are declared as `int`.
    fn parse_enum_specifier(&mut self) -> Result<(CType, Option<ParseNodeId>), ParseError> {
        let keyword = match self.advance() {
            Some(lexeme) => lexeme,
            None => return Err(self.error_here("expected 'enum'")),
        };
        let tag = match self.peek() {
            Some(l) if l.kind == TokenKind::Identifier => {
                let l = l.clone();
                self.advance();
                Some(l)
            }
            _ => None,
        };
        let tag_name = match &tag {
            Some(l) => l.text.clone(),
            None => format!("(unnamed at {})", self.location(keyword.start)),
        };
        let ty = CType::Enum(tag_name.clone());
        if self.eat("{").is_none() {
            return Ok((ty, None));
        }

        let mut children = Vec::new();
        while !self.check("}") {
            let name = match self.advance() {
                Some(l) if l.kind == TokenKind::Identifier => l,
                _ => return Err(self.error_here("expected enumerator name")),
            };
            let mut constant_children = Vec::new();
            if self.eat("=").is_some() {
                constant_children.push(self.parse_conditional_expression()?.id);
            }
            let id = self.add_node(
                NodeKind::EnumConstantDecl,
                name.start,
                self.previous_end(),
                constant_children,
            );
            self.set_spelling(id, &name.text);
            self.set_type(id, &CType::int());
            self.declare(&name.text, CType::int(), false);
            children.push(id);
            if self.eat(",").is_none() {
                break;
            }
        }
        self.expect("}", "to close enum body")?;
        let id = self.add_node(NodeKind::EnumDecl, keyword.start, self.previous_end(), children);
        if tag.is_some() {
            self.set_spelling(id, &tag_name);
        }
        self.set_type(id, &ty);
        Ok((ty, Some(id)))
    }

    // ========================================================================
    // Declarators
    // ========================================================================

    /// Parse a declarator and apply it to `base`.
    ///
    /// With `named` false (fields, parameters, type names) the name may be
    /// absent.
    pub(crate) fn parse_declarator(
        &mut self,
        base: &CType,
        named: bool,
    ) -> Result<Declarator, ParseError> {
        let start = self.current_start();
        let before = self.position;
        let mut nodes = Vec::new();
        let shape = self.parse_shape(&mut nodes)?;
        let end = if self.position > before {
            self.previous_end()
        } else {
            start
        };
        let (ty, name, params) = shape.apply(base.clone());
        if named && name.is_none() {
            return Err(self.error_here("expected identifier"));
        }
        Ok(Declarator {
            name,
            start,
            end,
            ty,
            params,
            nodes,
        })
    }

    fn parse_shape(&mut self, nodes: &mut Vec<ParseNodeId>) -> Result<Shape, ParseError> {
        let mut shape = Shape::default();
        while self.eat("*").is_some() {
            let mut is_const = false;
            loop {
                if self.eat("const").is_some() {
                    is_const = true;
                } else if self.eat("volatile").is_none() && self.eat("restrict").is_none() {
                    break;
                }
            }
            shape.pointers.push(is_const);
        }

        if self.check("(") && self.check_ahead(1, "*") {
            self.advance();
            shape.inner = Some(Box::new(self.parse_shape(nodes)?));
            self.expect(")", "to close declarator")?;
        } else if let Some(l) = self.peek() {
            if l.kind == TokenKind::Identifier {
                shape.name = Some((l.text.clone(), l.start));
                self.advance();
            }
        }

        loop {
            if self.eat("[").is_some() {
                let mut len = None;
                if !self.check("]") {
                    let size = self.parse_assignment_expression()?;
                    len = self.integer_value(&size);
                    nodes.push(size.id);
                }
                self.expect("]", "to close array declarator")?;
                shape.suffixes.push(Suffix::Array(len));
            } else if self.eat("(").is_some() {
                let (params, variadic) = self.parse_parameter_list(nodes)?;
                shape.suffixes.push(Suffix::Function { params, variadic });
            } else {
                break;
            }
        }
        Ok(shape)
    }

    /// Parameters after the opening `(`, through the closing `)`.
    fn parse_parameter_list(
        &mut self,
        nodes: &mut Vec<ParseNodeId>,
    ) -> Result<(Vec<Param>, bool), ParseError> {
        let mut params = Vec::new();
        let mut variadic = false;
        if self.check("void") && self.check_ahead(1, ")") {
            self.advance();
        }
        while !self.check(")") {
            if self.eat("...").is_some() {
                variadic = true;
                break;
            }
            let specs = match self.parse_specifiers()? {
                Some(specs) => specs,
                None => return Err(self.error_here("expected parameter declaration")),
            };
            let declarator = self.parse_declarator(&specs.base, false)?;

            // Parameters of array and function type are adjusted to pointers.
            let ty = if declarator.ty.is_array() || declarator.ty.is_function() {
                declarator.ty.decay()
            } else {
                declarator.ty.clone()
            };
            let end = self.previous_end();
            let mut children = specs.nodes.clone();
            children.extend(declarator.nodes.iter().copied());
            let id = self.add_node(NodeKind::ParmDecl, specs.start, end, children);
            let name = declarator.name.map(|(name, _)| name);
            if let Some(name) = &name {
                self.set_spelling(id, name);
            }
            self.set_type(id, &ty);
            nodes.push(id);
            params.push(Param { name, ty });
            if self.eat(",").is_none() {
                break;
            }
        }
        self.expect(")", "to close parameter list")?;
        Ok((params, variadic))
    }

    /// A type name in a cast or `sizeof`: specifiers plus abstract declarator.
    pub(crate) fn parse_type_name(&mut self) -> Result<(CType, Vec<ParseNodeId>), ParseError> {
        let specs = match self.parse_specifiers()? {
            Some(specs) => specs,
            None => return Err(self.error_here("expected type name")),
        };
        let declarator = self.parse_declarator(&specs.base, false)?;
        Ok((declarator.ty, specs.nodes))
    }

    /// Value of an integer constant expression, when it is a plain literal.
    pub(crate) fn integer_value(&self, expr: &Expr) -> Option<u64> {
        let node = self.tree.node(expr.id);
        if node.kind != NodeKind::IntegerLiteral {
            return None;
        }
        parse_integer_literal(&self.source[expr.start..expr.end])
    }
}

/// Parse the value of a C integer literal, ignoring suffixes.
pub(crate) fn parse_integer_literal(text: &str) -> Option<u64> {
    let digits = text.trim_end_matches(['u', 'U', 'l', 'L']);
    if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        u64::from_str_radix(hex, 16).ok()
    } else if digits.len() > 1 && digits.starts_with('0') {
        u64::from_str_radix(&digits[1..], 8).ok()
    } else {
        digits.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_literal_values() {
        assert_eq!(parse_integer_literal("42"), Some(42));
        assert_eq!(parse_integer_literal("0x1F"), Some(31));
        assert_eq!(parse_integer_literal("010"), Some(8));
        assert_eq!(parse_integer_literal("10UL"), Some(10));
        assert_eq!(parse_integer_literal("0"), Some(0));
    }

    #[test]
    fn shape_applies_inside_out() {
        // int (*fp)(int)
        let inner = Shape {
            pointers: vec![false],
            name: Some(("fp".into(), 0)),
            ..Shape::default()
        };
        let outer = Shape {
            inner: Some(Box::new(inner)),
            suffixes: vec![Suffix::Function {
                params: vec![Param {
                    name: None,
                    ty: CType::int(),
                }],
                variadic: false,
            }],
            ..Shape::default()
        };
        let (ty, name, params) = outer.apply(CType::int());
        assert_eq!(ty.spelling(), "int (*)(int)");
        assert_eq!(name.map(|n| n.0).as_deref(), Some("fp"));
        assert!(params.is_none());
    }

    #[test]
    fn pointer_binds_before_suffixes() {
        // int *a[3]
        let shape = Shape {
            pointers: vec![false],
            name: Some(("a".into(), 0)),
            suffixes: vec![Suffix::Array(Some(3))],
            ..Shape::default()
        };
        let (ty, _, _) = shape.apply(CType::int());
        assert_eq!(ty.spelling(), "int *[3]");
    }
}
