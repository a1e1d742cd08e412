//! The instrumentation rule set.
//!
//! [`InstrumentVisitor`] is a [`SourceVisitor`] whose rules decide, per
//! construct, which events to report, where the hook calls go, and how to
//! report a value without evaluating its expression twice. Rules are
//! grouped by what they rewrite:
//!
//! - `expressions`: values, captured into temporaries
//! - `statements`: blocks and control flow, with a `stat` event per
//!   statement
//! - `declarations`: the translation unit, functions and local variables
//!
//! Rules only create events and modifications; nothing is rewritten until
//! the pass applies the forest.

mod declarations;
mod expressions;
mod statements;

use std::mem;

use cstep_cparse::{NodeKind, ParseNode};
use cstep_cst::visitor::{SourceVisitor, VisitResult};
use cstep_cst::{Handle, NodeId, Replace, SourceTree};

use crate::ctypes;
use crate::error::InstrumentError;
use crate::event::{Action, EventId, NotifyData};
use crate::pass::PassState;
use crate::shapes::Notify;

/// The function whose body is being visited.
#[derive(Debug)]
struct Frame {
    result_type: String,
    first_statement: Option<Handle>,
    /// `invocation` and `par` events not yet attached to a statement.
    entry: Vec<EventId>,
    /// Declarations of the temporaries the body needs.
    temporaries: Vec<String>,
}

/// Produces the notify modification forest of one translation unit.
pub struct InstrumentVisitor<'p> {
    tree: &'p SourceTree,
    state: &'p mut PassState,
    frame: Option<Frame>,
}

impl<'p> InstrumentVisitor<'p> {
    pub fn new(tree: &'p SourceTree, state: &'p mut PassState) -> Self {
        InstrumentVisitor {
            tree,
            state,
            frame: None,
        }
    }

    /// Visit the whole translation unit.
    pub fn visit_tree(&mut self) -> VisitResult<Notify> {
        self.visit_root()
    }

    // ========================================================================
    // Node facts
    // ========================================================================

    fn id(&self, node: Handle) -> NodeId {
        self.tree.node_id(node)
    }

    fn kind(&self, node: Handle) -> Option<&'p NodeKind> {
        self.tree.kind(node)
    }

    fn parse_node(&self, node: Handle) -> Option<&'p ParseNode> {
        self.tree.parse_node(node)
    }

    fn children(&self, node: Handle) -> Vec<Handle> {
        self.tree.children(node).collect()
    }

    /// The node's C type; missing or empty spellings are fatal.
    fn type_of(&self, node: Handle) -> Result<String, InstrumentError> {
        self.parse_node(node)
            .and_then(|n| n.type_spelling.as_deref())
            .filter(|t| !t.trim().is_empty())
            .map(str::to_string)
            .ok_or_else(|| InstrumentError::MissingType {
                node: self.id(node),
                kind: self.tree.kind_name(node).to_string(),
            })
    }

    /// The declared or referenced name.
    fn name_of(&self, node: Handle) -> Result<String, InstrumentError> {
        self.parse_node(node)
            .and_then(|n| n.spelling.clone())
            .ok_or_else(|| InstrumentError::MissingIdentifier {
                node: self.id(node),
                kind: self.tree.kind_name(node).to_string(),
            })
    }

    /// Spelling of the first punctuation token the node holds itself.
    fn operator(&self, node: Handle) -> Option<&'p str> {
        self.tree
            .tokens(node)
            .find(|t| t.kind == cstep_cparse::TokenKind::Punctuation)
            .map(|t| t.spelling.as_str())
    }

    // ========================================================================
    // Events and temporaries
    // ========================================================================

    fn event(&mut self, data: NotifyData) -> EventId {
        self.state.event(data)
    }

    /// A fresh temporary of type `spelling`, declared at the top of the
    /// current function.
    fn temporary(&mut self, spelling: &str) -> String {
        let name = self.state.temps.fresh();
        if let Some(frame) = self.frame.as_mut() {
            frame.temporaries.push(ctypes::temporary(spelling, &name));
        }
        name
    }

    /// Start events of a statement: its `stat`, preceded by the function
    /// entry events when this is the first statement of the body.
    fn stat(&mut self, statement: Handle, about: Handle) -> Vec<EventId> {
        let mut events = self.take_entry(statement);
        let id = self.id(about);
        events.push(self.event(NotifyData::new(Action::Stat, Some(id))));
        events
    }

    /// Entry events, if `statement` opens the function body and runs
    /// exactly once per call.
    fn take_entry(&mut self, statement: Handle) -> Vec<EventId> {
        let once = self.kind(statement).is_some_and(|k| {
            k.is_expression()
                || matches!(
                    k,
                    NodeKind::DeclStmt
                        | NodeKind::IfStmt
                        | NodeKind::SwitchStmt
                        | NodeKind::ReturnStmt
                        | NodeKind::BreakStmt
                        | NodeKind::ContinueStmt
                        | NodeKind::GotoStmt
                )
        });
        match self.frame.as_mut() {
            Some(frame) if once && frame.first_statement == Some(statement) => mem::take(&mut frame.entry),
            _ => Vec::new(),
        }
    }

    /// Return type of the current function.
    fn result_type(&self) -> Option<&str> {
        self.frame.as_ref().map(|f| f.result_type.as_str())
    }
}

impl SourceVisitor for InstrumentVisitor<'_> {
    type Ext = Notify;

    fn tree(&self) -> &SourceTree {
        self.tree
    }

    fn visit_kind(&mut self, kind: &NodeKind, node: Handle) -> Option<VisitResult<Notify>> {
        let result = match kind {
            NodeKind::TranslationUnit => self.translation_unit(node),
            NodeKind::FunctionDecl => self.function(node),
            NodeKind::VarDecl => self.variable(node, None),
            NodeKind::DeclStmt => self.declaration_statement(node),
            NodeKind::ParmDecl
            | NodeKind::FieldDecl
            | NodeKind::StructDecl
            | NodeKind::UnionDecl
            | NodeKind::EnumDecl
            | NodeKind::EnumConstantDecl
            | NodeKind::TypedefDecl
            | NodeKind::TypeRef => Ok(None),
            NodeKind::CompoundStmt => self.block(node),
            NodeKind::IfStmt => self.if_statement(node),
            NodeKind::WhileStmt => self.while_statement(node),
            NodeKind::DoStmt => self.do_statement(node),
            NodeKind::ForStmt => self.for_statement(node),
            NodeKind::SwitchStmt => self.switch_statement(node),
            NodeKind::CaseStmt => self.case_statement(node),
            NodeKind::DefaultStmt | NodeKind::LabelStmt => self.labeled_statement(node),
            NodeKind::ReturnStmt => self.return_statement(node),
            NodeKind::BreakStmt | NodeKind::ContinueStmt | NodeKind::GotoStmt => self.jump_statement(node),
            NodeKind::NullStmt => Ok(None),
            k if k.is_expression() => self.expression(node).map(|shape| Some(shape).filter(|s| !s.is_noop()).map(Replace::Ext)),
            _ => return None,
        };
        Some(result)
    }
}

#[cfg(test)]
mod tests;
