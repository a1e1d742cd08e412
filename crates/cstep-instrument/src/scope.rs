//! Scope resolution and statement classification over the original tree.

use cstep_core::Span;
use cstep_cparse::NodeKind;
use cstep_cst::{Handle, SourceTree};

use crate::error::InstrumentError;

/// Byte range of the nearest enclosing block, loop or function of `node`.
///
/// Stored on `decl` events so that a consumer resolving a variable name
/// at some position picks the innermost declaration whose scope contains
/// that position.
pub fn get_scope(tree: &SourceTree, node: Handle) -> Result<Span, InstrumentError> {
    tree.ancestors(node)
        .find(|&h| {
            matches!(
                tree.kind(h),
                Some(
                    NodeKind::CompoundStmt
                        | NodeKind::ForStmt
                        | NodeKind::WhileStmt
                        | NodeKind::DoStmt
                        | NodeKind::FunctionDecl
                )
            )
        })
        .and_then(|h| tree.span(h))
        .ok_or_else(|| InstrumentError::MissingScope {
            node: tree.node_id(node),
            kind: tree.kind_name(node).to_string(),
        })
}

/// True if `node` sits in statement position.
///
/// A `case` label is not a statement, but whatever follows it is; the
/// body of `default:` or of a label is its only child.
pub fn is_statement(tree: &SourceTree, node: Handle) -> bool {
    let Some(parent) = tree.parent(node) else {
        return false;
    };
    let position = tree.children(parent).position(|c| c == node);
    match tree.kind(parent) {
        Some(NodeKind::CompoundStmt | NodeKind::DeclStmt) => true,
        Some(NodeKind::ForStmt | NodeKind::IfStmt | NodeKind::WhileStmt) => true,
        Some(NodeKind::DefaultStmt | NodeKind::LabelStmt) => true,
        Some(NodeKind::CaseStmt) if position.is_some_and(|p| p > 0) => true,
        _ => {
            position == Some(0)
                && tree
                    .parent(parent)
                    .is_some_and(|g| tree.kind(g) == Some(&NodeKind::SwitchStmt))
        }
    }
}
