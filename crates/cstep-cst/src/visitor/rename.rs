// Copyright (c) cstep contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Identifier renaming by token replacement.
//!
//! [`RenameVisitor`] renames one name wherever it is declared (`VarDecl`,
//! `ParmDecl`) or referenced (`DeclRefExpr`). Each edit replaces a single
//! identifier token, so spacing and comments around it are untouched.
//! The rename is by spelling only: every variable with that name is
//! renamed, whatever its scope.
//!
//! # Usage
//!
//! ```
//! use cstep_cparse::parse_translation_unit;
//! use cstep_cst::{visitor::rename, SourceTree};
//!
//! let source = "int main(void) { int n = 1; return n + n; }";
//! let mut tree = SourceTree::build(source, parse_translation_unit(source).unwrap()).unwrap();
//! let outcome = rename(&mut tree, "n", "count").unwrap();
//! assert_eq!(outcome.text, "int main(void) { int count = 1; return count + count; }");
//! assert_eq!(outcome.renamed, 3);
//! ```

use cstep_cparse::{NodeKind, TokenKind};

use crate::apply::apply_modifications;
use crate::error::CstError;
use crate::modification::{Insert, NoExtension, Replace};
use crate::node::Handle;
use crate::tree::SourceTree;

use super::{visit_children, SourceVisitor, VisitResult};

/// Renames every declaration of and reference to one name.
pub struct RenameVisitor<'a> {
    tree: &'a SourceTree,
    from: String,
    to: String,
    /// Number of identifier tokens replaced so far.
    pub renamed: usize,
}

impl<'a> RenameVisitor<'a> {
    pub fn new(tree: &'a SourceTree, from: impl Into<String>, to: impl Into<String>) -> Self {
        RenameVisitor {
            tree,
            from: from.into(),
            to: to.into(),
            renamed: 0,
        }
    }

    fn names_target(&self, node: Handle) -> bool {
        self.tree
            .parse_node(node)
            .and_then(|n| n.spelling.as_deref())
            .is_some_and(|s| s == self.from)
    }

    /// A declaration: rename its own token and whatever its initializer
    /// references, as one edit of the declaration.
    fn rename_declaration(&mut self, node: Handle, own: Replace) -> VisitResult<NoExtension> {
        let mut modifications = visit_children(self, node)?;
        modifications.push(own);
        self.renamed += 1;
        Ok(Some(Replace::compound_at(node, modifications)))
    }
}

impl SourceVisitor for RenameVisitor<'_> {
    type Ext = NoExtension;

    fn tree(&self) -> &SourceTree {
        self.tree
    }

    fn visit_kind(&mut self, kind: &NodeKind, node: Handle) -> Option<VisitResult<NoExtension>> {
        if !self.names_target(node) {
            return None;
        }
        let result = match kind {
            NodeKind::VarDecl => Replace::identifier(self.tree, node, &self.to)
                .and_then(|own| self.rename_declaration(node, own)),
            NodeKind::ParmDecl => Replace::token_of_kind(
                self.tree,
                node,
                TokenKind::Identifier,
                Some(self.from.as_str()),
                Insert::constant(self.to.clone()),
            )
            .and_then(|own| self.rename_declaration(node, own)),
            NodeKind::DeclRefExpr => {
                self.renamed += 1;
                Replace::token_of_kind(
                    self.tree,
                    node,
                    TokenKind::Identifier,
                    Some(self.from.as_str()),
                    Insert::constant(self.to.clone()),
                )
                .map(Some)
            }
            _ => return None,
        };
        Some(result)
    }
}

/// Result of [`rename`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameOutcome {
    /// The rewritten translation unit.
    pub text: String,
    /// Number of identifier tokens replaced.
    pub renamed: usize,
}

/// Rename `from` to `to` across the whole tree.
pub fn rename(tree: &mut SourceTree, from: &str, to: &str) -> Result<RenameOutcome, CstError> {
    let (modification, renamed) = {
        let mut visitor = RenameVisitor::new(tree, from, to);
        let modification = visitor.visit_root()?;
        (modification, visitor.renamed)
    };
    let modifications: Vec<Replace> = modification.into_iter().collect();
    let root = apply_modifications(tree, &modifications)?;
    Ok(RenameOutcome {
        text: tree.stringify(root),
        renamed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cstep_cparse::parse_translation_unit;

    fn run(source: &str, from: &str, to: &str) -> RenameOutcome {
        let mut tree = SourceTree::build(source, parse_translation_unit(source).unwrap()).unwrap();
        rename(&mut tree, from, to).unwrap()
    }

    #[test]
    fn renames_parameters_and_references() {
        let out = run("int sq(int v) { return v * v; }", "v", "value");
        assert_eq!(out.text, "int sq(int value) { return value * value; }");
        assert_eq!(out.renamed, 3);
    }

    #[test]
    fn initializer_references_are_renamed_with_the_declaration() {
        let out = run("int f(int a) { int a2 = a; int b = a + a2; return b; }", "a", "x");
        assert_eq!(
            out.text,
            "int f(int x) { int a2 = x; int b = x + a2; return b; }"
        );
    }

    #[test]
    fn globals_and_locals_share_a_spelling() {
        let out = run("int g; void f(void) { int g = 1; g = g + 1; }", "g", "h");
        assert_eq!(out.text, "int h; void f(void) { int h = 1; h = h + 1; }");
        assert_eq!(out.renamed, 4);
    }

    #[test]
    fn members_and_functions_are_left_alone() {
        let out = run(
            "struct p { int n; }; int n(void); int f(struct p s) { int n = s.n; return n; }",
            "n",
            "m",
        );
        assert_eq!(
            out.text,
            "struct p { int n; }; int n(void); int f(struct p s) { int m = s.n; return m; }"
        );
    }

    #[test]
    fn unknown_name_changes_nothing() {
        let source = "int main(void) { return 0; }";
        let out = run(source, "missing", "x");
        assert_eq!(out.text, source);
        assert_eq!(out.renamed, 0);
    }
}
