// Copyright (c) cstep contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Dispatch and the generic fallback.

use tracing::trace;

use crate::modification::{Extension, Replace};
use crate::node::Handle;

use super::{SourceVisitor, VisitResult};

/// Run the visitor's rule for `node`'s kind, or [`generic_visit`] when
/// there is none. Synthetic nodes always take the generic path.
pub fn dispatch<V: SourceVisitor + ?Sized>(visitor: &mut V, node: Handle) -> VisitResult<V::Ext> {
    let kind = visitor.tree().kind(node).cloned();
    if let Some(kind) = kind {
        trace!(kind = %kind, node = %visitor.tree().node_id(node), "dispatch");
        if let Some(result) = visitor.visit_kind(&kind, node) {
            return result;
        }
    }
    generic_visit(visitor, node)
}

/// Visit every child and merge the results.
pub fn generic_visit<V: SourceVisitor + ?Sized>(visitor: &mut V, node: Handle) -> VisitResult<V::Ext> {
    Ok(merge(visit_children(visitor, node)?))
}

/// Visit every child of `node` in order, keeping the non-empty results.
pub fn visit_children<V: SourceVisitor + ?Sized>(
    visitor: &mut V,
    node: Handle,
) -> Result<Vec<Replace<V::Ext>>, <V::Ext as Extension>::Error> {
    let children: Vec<Handle> = visitor.tree().children(node).collect();
    let mut results = Vec::new();
    for child in children {
        if let Some(modification) = visitor.visit(child)? {
            results.push(modification);
        }
    }
    Ok(results)
}

/// Zero results merge to nothing, one to itself, more to an untargeted
/// compound.
pub fn merge<X: Extension>(mut results: Vec<Replace<X>>) -> Option<Replace<X>> {
    match results.len() {
        0 => None,
        1 => results.pop(),
        _ => Some(Replace::compound(results)),
    }
}
