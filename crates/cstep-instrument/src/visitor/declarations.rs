//! Declaration rules: the translation unit, function definitions and
//! local variables.

use tracing::{debug, trace, warn};

use cstep_cparse::{NodeKind, StorageClass, TokenKind};
use cstep_cst::visitor::VisitResult;
use cstep_cst::{Handle, Replace};

use super::{Frame, InstrumentVisitor};
use crate::ctypes;
use crate::error::InstrumentError;
use crate::event::{Action, NotifyData};
use crate::scope::get_scope;
use crate::shapes::{BodyShape, DeclShape, Groups, Notify, PreludeShape};

impl InstrumentVisitor<'_> {
    pub(super) fn translation_unit(&mut self, node: Handle) -> VisitResult<Notify> {
        let mut nested = Vec::new();
        for child in self.children(node) {
            let Some(parse) = self.parse_node(child) else {
                continue;
            };
            if !parse.in_main_file {
                warn!(
                    kind = %parse.kind,
                    name = parse.spelling.as_deref().unwrap_or(""),
                    "skipping declaration from another file"
                );
                continue;
            }
            match parse.kind {
                NodeKind::FunctionDecl => nested.extend(self.function(child)?),
                NodeKind::VarDecl => {
                    debug!(name = parse.spelling.as_deref().unwrap_or(""), "global variables are not instrumented");
                }
                _ => {}
            }
        }
        if self.state.options.emit_prelude {
            return Ok(Some(Replace::Ext(Notify::Prelude(PreludeShape { target: node, nested }))));
        }
        Ok((!nested.is_empty()).then(|| Replace::compound_at(node, nested)))
    }

    /// A function definition: `invocation` and `par` events on entry, then
    /// the body's statements. Prototypes are left alone.
    pub(super) fn function(&mut self, node: Handle) -> VisitResult<Notify> {
        let children = self.children(node);
        let Some(&body) = children
            .iter()
            .find(|&&c| self.kind(c) == Some(&NodeKind::CompoundStmt))
        else {
            trace!(node = %self.id(node), "prototype");
            return Ok(None);
        };
        let name = self.name_of(node)?;
        let result_type = self
            .parse_node(node)
            .and_then(|n| n.result_type.clone())
            .ok_or_else(|| InstrumentError::MissingType {
                node: self.id(node),
                kind: self.tree.kind_name(node).to_string(),
            })?;
        let scope = self.tree.span(body).ok_or_else(|| InstrumentError::MissingScope {
            node: self.id(body),
            kind: self.tree.kind_name(body).to_string(),
        })?;

        let invocation = NotifyData::new(Action::Invocation, Some(self.id(node)))
            .with_type(self.type_of(node)?)
            .with_identifier(name.clone());
        let mut entry = vec![self.event(invocation)];
        let parameters: Vec<Handle> = children
            .iter()
            .copied()
            .filter(|&c| self.kind(c) == Some(&NodeKind::ParmDecl))
            .collect();
        for parameter in parameters {
            let Some(parse) = self.parse_node(parameter) else {
                continue;
            };
            let Some(parameter_name) = parse.spelling.clone() else {
                continue;
            };
            if parse.storage == StorageClass::Register {
                warn!(function = %name, parameter = %parameter_name, "register parameter is not reported");
                continue;
            }
            let data = NotifyData::new(Action::Par, Some(self.id(parameter)))
                .with_type(self.type_of(parameter)?)
                .with_identifier(parameter_name)
                .with_scope(scope);
            entry.push(self.event(data));
        }

        self.frame = Some(Frame {
            result_type,
            first_statement: self.tree.children(body).next(),
            entry,
            temporaries: Vec::new(),
        });
        let mut nested = Vec::new();
        for statement in self.children(body) {
            nested.extend(self.statement(statement)?);
        }
        let frame = self.frame.take();
        let (temporaries, entry) = frame.map(|f| (f.temporaries, f.entry)).unwrap_or_default();
        debug!(function = %name, temporaries = temporaries.len(), "instrumented function");
        Ok(Some(Replace::Ext(Notify::FunctionBody(BodyShape {
            target: body,
            nested,
            temporaries,
            entry,
            report_types: name == "main",
        }))))
    }

    /// The statement declaring one or more variables; the first one
    /// instrumented carries the statement's `stat`.
    pub(super) fn declaration_statement(&mut self, node: Handle) -> VisitResult<Notify> {
        let mut modifications = Vec::new();
        let mut statement = Some(node);
        for child in self.children(node) {
            if self.kind(child) != Some(&NodeKind::VarDecl) {
                continue;
            }
            if let Some(modification) = self.variable(child, statement)? {
                modifications.push(modification);
                statement = None;
            }
        }
        Ok((!modifications.is_empty()).then(|| Replace::compound_at(node, modifications)))
    }

    /// The initializer of a `VarDecl`: the child after its `=`.
    fn initializer(&self, node: Handle) -> Option<Handle> {
        let equals = self.tree.find_token(node, TokenKind::Punctuation, Some("="))?.span.end;
        self.tree
            .children(node)
            .find(|&c| self.tree.span(c).is_some_and(|s| s.start >= equals))
    }

    /// A local variable: `decl` event and a read-back declarator after it.
    /// `statement` is the enclosing declaration statement when this
    /// variable reports it.
    pub(super) fn variable(&mut self, node: Handle, statement: Option<Handle>) -> VisitResult<Notify> {
        let Some(parse) = self.parse_node(node) else {
            return Ok(None);
        };
        if self.frame.is_none() {
            trace!(node = %self.id(node), "variable outside a function");
            return Ok(None);
        }
        let storage = parse.storage;
        if matches!(storage, StorageClass::Static | StorageClass::Extern | StorageClass::Register) {
            warn!(
                name = parse.spelling.as_deref().unwrap_or(""),
                storage = ?storage,
                "local declaration is not instrumented"
            );
            return Ok(None);
        }
        let name = self.name_of(node)?;
        let spelling = self.type_of(node)?;
        if ctypes::shape(&spelling) == ctypes::TypeShape::Function {
            trace!(name = %name, "local function declaration");
            return Ok(None);
        }
        let scope = get_scope(self.tree, node)?;

        let start = match statement {
            Some(statement) => self.stat(statement, statement),
            None => Vec::new(),
        };
        let mut groups = Groups::default();
        let mut nested = Vec::new();
        match self.initializer(node) {
            // Aggregate initializers cannot sit inside a comma expression,
            // so the statement is reported with the declaration instead.
            Some(init)
                if self.kind(init) != Some(&NodeKind::InitListExpr)
                    && ctypes::shape(&spelling) != ctypes::TypeShape::Array =>
            {
                let mut shape = if self.is_constant(init) {
                    Notify::void(init, Vec::new())
                } else {
                    self.expression(init)?
                };
                shape.prepend_start(start);
                if !shape.is_noop() {
                    nested.push(Replace::Ext(shape));
                }
            }
            Some(init) => {
                nested.extend(self.operand(init)?);
                groups.start = start;
            }
            None => groups.start = start,
        }

        let decl = NotifyData::new(Action::Decl, Some(self.id(node)))
            .with_type(spelling.clone())
            .with_identifier(name.clone())
            .with_scope(scope);
        groups.end.push(self.event(decl));
        let read_back = ctypes::read_back(&spelling, &self.state.temps.fresh());
        Ok(Some(Replace::Ext(Notify::Decl(DeclShape {
            target: node,
            name,
            read_back,
            groups,
            nested,
        }))))
    }
}
