// Copyright (c) cstep contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Kind-dispatched visitors that produce modifications.
//!
//! A [`SourceVisitor`] turns a [`SourceTree`] into a modification forest.
//! Each node is dispatched on its [`NodeKind`]; the visitor answers with a
//! rule result, or with `None` to fall back to [`generic_visit`], which
//! visits every child and merges what they return:
//!
//! - no results: `None`
//! - one result: that result
//! - several results: an untargeted [`Replace::Compound`], applied at the
//!   lowest common ancestor of their targets
//!
//! Adding support for a construct means adding one match arm to
//! [`SourceVisitor::visit_kind`]; the traversal stays the same.
//!
//! ```ignore
//! use cstep_cst::visitor::{SourceVisitor, VisitResult};
//!
//! impl SourceVisitor for Zeroer<'_> {
//!     type Ext = NoExtension;
//!
//!     fn tree(&self) -> &SourceTree {
//!         self.tree
//!     }
//!
//!     fn visit_kind(&mut self, kind: &NodeKind, node: Handle) -> Option<VisitResult<NoExtension>> {
//!         match kind {
//!             NodeKind::IntegerLiteral => Some(Ok(Some(Replace::node(node, Insert::constant("0"))))),
//!             _ => None,
//!         }
//!     }
//! }
//! ```

mod dispatch;
mod rename;

pub use dispatch::{dispatch, generic_visit, merge, visit_children};
pub use rename::{rename, RenameOutcome, RenameVisitor};

use cstep_cparse::NodeKind;

use crate::modification::{Extension, Replace};
use crate::node::Handle;
use crate::tree::SourceTree;

/// Result of visiting one node: an optional modification, or the
/// extension's error.
pub type VisitResult<X> = Result<Option<Replace<X>>, <X as Extension>::Error>;

/// A rule set over node kinds.
pub trait SourceVisitor {
    type Ext: Extension;

    fn tree(&self) -> &SourceTree;

    /// The rule for `kind`, or `None` when there is none.
    fn visit_kind(&mut self, kind: &NodeKind, node: Handle) -> Option<VisitResult<Self::Ext>>;

    /// Visit `node`: its rule if it has one, else [`generic_visit`].
    fn visit(&mut self, node: Handle) -> VisitResult<Self::Ext> {
        dispatch(self, node)
    }

    /// Visit the whole tree from its root.
    fn visit_root(&mut self) -> VisitResult<Self::Ext> {
        let root = self.tree().root();
        self.visit(root)
    }
}
