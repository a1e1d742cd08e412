//! Notify replace shapes.
//!
//! Each shape is a [`Replace`] extension that wraps one node in the code
//! that reports on it. Shapes carry two groups of events: the start group
//! fires before the node runs and the end group after. A group becomes one
//! hook call whose reference is assigned when the shape is applied: the
//! start group first, then whatever the nested modifications emit, then
//! the end group. References therefore increase in the order the calls
//! run.
//!
//! | Shape | Output |
//! |-------|--------|
//! | `Expr` | `(start, tmp = x, end, tmp)` |
//! | `Void` | `(start, x, end)` |
//! | `Stmt` | `{ start; x; end; }` |
//! | `CompoundExpr` / `CompoundVoid` | as above, `x` rewritten by nested modifications |
//! | `Decl` | `x, tmp = (start, end, name)`, start numbered after `x` |
//! | `FunctionBody` | temporaries and entry events after `{` |
//! | `Prelude` | hook prototypes before the translation unit |

use cstep_cparse::TokenKind;
use cstep_cst::printer::node_label;
use cstep_cst::{CstError, Extension, Handle, Insert, Replace, Rewriter, SourceTree};

use crate::ctypes;
use crate::error::InstrumentError;
use crate::event::{Action, EventId, NotifyData};
use crate::pass::PassState;

/// Events fired before and after the wrapped code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Groups {
    pub start: Vec<EventId>,
    pub end: Vec<EventId>,
}

impl Groups {
    pub fn is_empty(&self) -> bool {
        self.start.is_empty() && self.end.is_empty()
    }
}

/// An expression or statement wrapped in hook calls.
#[derive(Debug, Clone)]
pub struct Wrap {
    pub target: Handle,
    pub groups: Groups,
    /// Temporary receiving the value, for value-capturing shapes.
    pub temp: Option<String>,
    /// Edits inside the target, applied before wrapping.
    pub nested: Vec<Replace<Notify>>,
}

/// A local variable declaration followed by a read-back declarator.
#[derive(Debug, Clone)]
pub struct DeclShape {
    pub target: Handle,
    /// Name of the declared variable.
    pub name: String,
    /// Declarator of the read-back temporary, such as `*temp3`.
    pub read_back: String,
    pub groups: Groups,
    pub nested: Vec<Replace<Notify>>,
}

/// A function body: statement edits, then declarations and entry events
/// spliced in after its `{`.
#[derive(Debug, Clone)]
pub struct BodyShape {
    pub target: Handle,
    pub nested: Vec<Replace<Notify>>,
    /// Declarations of the temporaries used in the body, without `;`.
    pub temporaries: Vec<String>,
    /// Entry events no statement took over, emitted as a call of their own.
    pub entry: Vec<EventId>,
    /// Report the size of every captured type here.
    pub report_types: bool,
}

/// The translation unit with hook prototypes in front.
#[derive(Debug, Clone)]
pub struct PreludeShape {
    pub target: Handle,
    pub nested: Vec<Replace<Notify>>,
}

/// Every notify shape.
#[derive(Debug, Clone)]
pub enum Notify {
    Expr(Wrap),
    Void(Wrap),
    Stmt(Wrap),
    CompoundExpr(Wrap),
    CompoundVoid(Wrap),
    Decl(DeclShape),
    FunctionBody(BodyShape),
    Prelude(PreludeShape),
}

impl Notify {
    /// Capture the value of `target` into `temp`.
    pub fn value(target: Handle, temp: String, end: Vec<EventId>, nested: Vec<Replace<Notify>>) -> Notify {
        let wrap = Wrap {
            target,
            groups: Groups { start: Vec::new(), end },
            temp: Some(temp),
            nested,
        };
        if wrap.nested.is_empty() {
            Notify::Expr(wrap)
        } else {
            Notify::CompoundExpr(wrap)
        }
    }

    /// Wrap `target` without capturing a value.
    pub fn void(target: Handle, nested: Vec<Replace<Notify>>) -> Notify {
        let wrap = Wrap {
            target,
            groups: Groups::default(),
            temp: None,
            nested,
        };
        if wrap.nested.is_empty() {
            Notify::Void(wrap)
        } else {
            Notify::CompoundVoid(wrap)
        }
    }

    /// Wrap a statement in a block.
    pub fn stmt(target: Handle, start: Vec<EventId>) -> Notify {
        Notify::Stmt(Wrap {
            target,
            groups: Groups { start, end: Vec::new() },
            temp: None,
            nested: Vec::new(),
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Notify::Expr(_) => "Expr",
            Notify::Void(_) => "Void",
            Notify::Stmt(_) => "Stmt",
            Notify::CompoundExpr(_) => "CompoundExpr",
            Notify::CompoundVoid(_) => "CompoundVoid",
            Notify::Decl(_) => "Decl",
            Notify::FunctionBody(_) => "FunctionBody",
            Notify::Prelude(_) => "Prelude",
        }
    }

    fn groups_mut(&mut self) -> Option<&mut Groups> {
        match self {
            Notify::Expr(w) | Notify::Void(w) | Notify::Stmt(w) | Notify::CompoundExpr(w) | Notify::CompoundVoid(w) => {
                Some(&mut w.groups)
            }
            Notify::Decl(d) => Some(&mut d.groups),
            Notify::FunctionBody(_) | Notify::Prelude(_) => None,
        }
    }

    fn groups(&self) -> Option<&Groups> {
        match self {
            Notify::Expr(w) | Notify::Void(w) | Notify::Stmt(w) | Notify::CompoundExpr(w) | Notify::CompoundVoid(w) => {
                Some(&w.groups)
            }
            Notify::Decl(d) => Some(&d.groups),
            Notify::FunctionBody(_) | Notify::Prelude(_) => None,
        }
    }

    /// Put `events` in front of the start group.
    pub fn prepend_start(&mut self, events: Vec<EventId>) {
        if let Some(groups) = self.groups_mut() {
            groups.start.splice(0..0, events);
        }
    }

    pub fn push_end(&mut self, event: EventId) {
        if let Some(groups) = self.groups_mut() {
            groups.end.push(event);
        }
    }

    /// True if applying the shape changes nothing.
    pub fn is_noop(&self) -> bool {
        match self {
            Notify::Void(w) | Notify::CompoundVoid(w) => w.groups.is_empty() && w.nested.is_empty(),
            _ => false,
        }
    }
}

// ============================================================================
// Application
// ============================================================================

fn call(state: &mut PassState, group: &[EventId]) -> Result<Option<String>, InstrumentError> {
    if group.is_empty() {
        return Ok(None);
    }
    state.call(group).map(Some)
}

/// `(a, b, c)` over the present parts; a single part is used bare.
fn comma_expression(rewriter: &mut Rewriter<'_, Notify>, parts: Vec<Insert<Notify>>) -> Result<Handle, InstrumentError> {
    match <[Insert<Notify>; 1]>::try_from(parts) {
        Ok([only]) => rewriter.build(&only),
        Err(parts) => rewriter.build(&Insert::comma_parenthesized(parts)),
    }
}

fn apply_wrap(wrap: &Wrap, kind: &Notify, rewriter: &mut Rewriter<'_, Notify>, node: Handle) -> Result<Handle, InstrumentError> {
    let start = call(rewriter.state, &wrap.groups.start)?;
    let inner = rewriter.apply_all(node, &wrap.nested)?;
    let end = call(rewriter.state, &wrap.groups.end)?;

    if let Notify::Stmt(_) = kind {
        let statements: Vec<Insert<Notify>> = start
            .into_iter()
            .map(Insert::Constant)
            .chain(std::iter::once(Insert::copy(inner)))
            .chain(end.map(Insert::Constant))
            .collect();
        return rewriter.build(&Insert::wrap("{ ", Insert::join("; ", statements), "; }"));
    }

    let mut parts: Vec<Insert<Notify>> = start.into_iter().map(Insert::Constant).collect();
    match (&wrap.temp, end) {
        (Some(temp), Some(end)) => {
            parts.push(Insert::assignment(Insert::constant(temp.clone()), Insert::copy(inner)));
            parts.push(Insert::Constant(end));
            parts.push(Insert::constant(temp.clone()));
        }
        (_, end) => {
            parts.push(Insert::copy(inner));
            parts.extend(end.map(Insert::Constant));
        }
    }
    comma_expression(rewriter, parts)
}

fn apply_decl(decl: &DeclShape, rewriter: &mut Rewriter<'_, Notify>, node: Handle) -> Result<Handle, InstrumentError> {
    // The start group sits in the read-back and runs after the initializer.
    let declaration = rewriter.apply_all(node, &decl.nested)?;
    let start = call(rewriter.state, &decl.groups.start)?;
    let end = call(rewriter.state, &decl.groups.end)?;
    let value: Vec<Insert<Notify>> = start
        .into_iter()
        .chain(end)
        .map(Insert::Constant)
        .chain(std::iter::once(Insert::constant(decl.name.clone())))
        .collect();
    let read_back = Insert::assignment(Insert::constant(decl.read_back.clone()), Insert::comma_parenthesized(value));
    rewriter.build(&Insert::comma(vec![Insert::copy(declaration), read_back]))
}

fn apply_body(body: &BodyShape, rewriter: &mut Rewriter<'_, Notify>, node: Handle) -> Result<Handle, InstrumentError> {
    let mut lines: Vec<String> = body.temporaries.iter().map(|d| format!("{};", d)).collect();
    if body.report_types && rewriter.state.options.emit_type_events {
        lines.extend(type_report(rewriter.state)?);
    }
    if let Some(entry) = call(rewriter.state, &body.entry)? {
        lines.push(format!("{};", entry));
    }
    let rewritten = rewriter.apply_all(node, &body.nested)?;
    if lines.is_empty() {
        return Ok(rewritten);
    }
    let open = rewriter
        .tree
        .find_token(rewritten, TokenKind::Punctuation, Some("{"))
        .map(|t| t.id)
        .ok_or_else(|| CstError::MissingToken {
            node_kind: rewriter.tree.kind_name(rewritten).to_string(),
            token_kind: TokenKind::Punctuation.as_str().to_string(),
            spelling: Some("{".to_string()),
        })?;
    let splice = Replace::AfterToken {
        target: body.target,
        token: open,
        insertion: Insert::constant(format!(" {}", lines.join(" "))),
    };
    rewriter.apply_one(&splice, rewritten)
}

/// Declarations and calls reporting `sizeof` of every type seen so far.
fn type_report(state: &mut PassState) -> Result<Vec<String>, InstrumentError> {
    let mut lines = Vec::new();
    let mut events = Vec::new();
    for data_type in state.events.data_types() {
        if ctypes::shape(&data_type) == ctypes::TypeShape::Function
            || ctypes::is_void(&data_type)
            || ctypes::is_unnamed(&data_type)
        {
            continue;
        }
        let temp = state.temps.fresh();
        lines.push(format!("unsigned long {} = sizeof({});", temp, data_type));
        events.push(state.event(
            NotifyData::new(Action::Type, None)
                .with_type("unsigned long")
                .with_identifier(data_type)
                .with_temp(temp),
        ));
    }
    for group in events.chunks(state.options.max_notify_arity.max(1)) {
        lines.push(format!("{};", state.call(group)?));
    }
    Ok(lines)
}

fn apply_prelude(prelude: &PreludeShape, rewriter: &mut Rewriter<'_, Notify>, node: Handle) -> Result<Handle, InstrumentError> {
    let unit = rewriter.apply_all(node, &prelude.nested)?;
    let text = rewriter.state.options.prelude();
    rewriter.build(&Insert::wrap(&text, Insert::copy(unit), ""))
}

impl Extension for Notify {
    type State = PassState;
    type Error = InstrumentError;

    fn target(&self) -> Handle {
        match self {
            Notify::Expr(w) | Notify::Void(w) | Notify::Stmt(w) | Notify::CompoundExpr(w) | Notify::CompoundVoid(w) => {
                w.target
            }
            Notify::Decl(d) => d.target,
            Notify::FunctionBody(b) => b.target,
            Notify::Prelude(p) => p.target,
        }
    }

    fn apply(&self, rewriter: &mut Rewriter<'_, Self>, node: Handle) -> Result<Handle, InstrumentError> {
        match self {
            Notify::Expr(w) | Notify::Void(w) | Notify::Stmt(w) | Notify::CompoundExpr(w) | Notify::CompoundVoid(w) => {
                apply_wrap(w, self, rewriter, node)
            }
            Notify::Decl(d) => apply_decl(d, rewriter, node),
            Notify::FunctionBody(b) => apply_body(b, rewriter, node),
            Notify::Prelude(p) => apply_prelude(p, rewriter, node),
        }
    }

    fn label(&self, tree: &SourceTree) -> String {
        let mut label = format!("{} {}", self.name(), node_label(tree, self.target()));
        if let Some(groups) = self.groups() {
            if !groups.start.is_empty() {
                label.push_str(&format!(" start={}", groups.start.len()));
            }
            if !groups.end.is_empty() {
                label.push_str(&format!(" end={}", groups.end.len()));
            }
        }
        label
    }

    fn nested(&self) -> Vec<&Replace<Self>> {
        match self {
            Notify::Expr(w) | Notify::Void(w) | Notify::Stmt(w) | Notify::CompoundExpr(w) | Notify::CompoundVoid(w) => {
                w.nested.iter().collect()
            }
            Notify::Decl(d) => d.nested.iter().collect(),
            Notify::FunctionBody(b) => b.nested.iter().collect(),
            Notify::Prelude(p) => p.nested.iter().collect(),
        }
    }
}
