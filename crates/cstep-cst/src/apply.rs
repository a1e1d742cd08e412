// Copyright (c) cstep contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Applying modifications to a [`SourceTree`].
//!
//! The walk is depth-first with children before parents. Each node's
//! children are rewritten first; if any changed, the node is copied with
//! the new child handles (keeping its [`NodeId`]). Then the one
//! modification whose target is this node, if any, turns the copy into its
//! replacement. Subtrees without targets are returned as they are, so the
//! result shares every unchanged node with the input.
//!
//! Two modifications resolving to the same node is a contract violation
//! and fails the rewrite with [`CstError::OverlappingChanges`].

use std::collections::{HashMap, HashSet};

use tracing::trace;

use crate::error::CstError;
use crate::modification::{Extension, Insert, NoExtension, Replace};
use crate::node::{Handle, NodeId, SourceText, SourceValue, TokenId};
use crate::tree::SourceTree;

/// Target index of one modification list.
struct Targets {
    /// Resolved target id to position in the list.
    by_node: HashMap<NodeId, usize>,
    /// Every target plus all its original ancestors.
    on_path: HashSet<NodeId>,
}

/// Performs modifications against one tree.
pub struct Rewriter<'t, X: Extension = NoExtension> {
    pub tree: &'t mut SourceTree,
    pub state: &'t mut X::State,
}

impl<'t, X: Extension> Rewriter<'t, X> {
    pub fn new(tree: &'t mut SourceTree, state: &'t mut X::State) -> Self {
        Rewriter { tree, state }
    }

    /// Rewrite the subtree at `node` with `modifications`.
    pub fn apply_all(&mut self, node: Handle, modifications: &[Replace<X>]) -> Result<Handle, X::Error> {
        if modifications.is_empty() {
            return Ok(node);
        }
        let targets = self.index(modifications)?;
        self.rewrite(node, modifications, &targets)
    }

    /// Apply `modification` to `node`, the rewritten form of its target.
    pub fn apply_one(&mut self, modification: &Replace<X>, node: Handle) -> Result<Handle, X::Error> {
        trace!(node = %self.tree.node_id(node), kind = self.tree.kind_name(node), "applying modification");
        match modification {
            Replace::Node { insertion, .. } => self.build(insertion),
            Replace::Token {
                token, insertion, ..
            } => {
                let text = self.render(insertion)?;
                Ok(self.splice_token(node, *token, text, false)?)
            }
            Replace::AfterToken {
                token, insertion, ..
            } => {
                let text = self.render(insertion)?;
                Ok(self.splice_token(node, *token, text, true)?)
            }
            Replace::Children { insertions, .. } => self.replace_children(node, insertions),
            Replace::Compound { modifications, .. } => self.apply_all(node, modifications),
            Replace::Templated {
                template,
                insertions,
                ..
            } => {
                let slots = self.build_all(insertions)?;
                Ok(self.tree.from_template(template, &slots)?)
            }
            Replace::Ext(ext) => ext.apply(self, node),
        }
    }

    /// Produce the node an insertion describes.
    pub fn build(&mut self, insertion: &Insert<X>) -> Result<Handle, X::Error> {
        match insertion {
            Insert::Constant(text) => Ok(self.tree.text_node(text.clone())),
            Insert::Copy(source) => Ok(*source),
            Insert::CopyReplace {
                source,
                replacements,
            } => self.apply_all(*source, replacements),
            Insert::Template {
                template,
                insertions,
            } => {
                let slots = self.build_all(insertions)?;
                Ok(self.tree.from_template(template, &slots)?)
            }
        }
    }

    pub fn build_all(&mut self, insertions: &[Insert<X>]) -> Result<Vec<Handle>, X::Error> {
        insertions.iter().map(|i| self.build(i)).collect()
    }

    /// Build an insertion and return its text.
    pub fn render(&mut self, insertion: &Insert<X>) -> Result<String, X::Error> {
        let handle = self.build(insertion)?;
        Ok(self.tree.stringify(handle))
    }

    // ========================================================================
    // Traversal
    // ========================================================================

    fn index(&self, modifications: &[Replace<X>]) -> Result<Targets, CstError> {
        let mut by_node = HashMap::with_capacity(modifications.len());
        let mut on_path = HashSet::new();
        let mut resolved = Vec::with_capacity(modifications.len());
        for (position, modification) in modifications.iter().enumerate() {
            let Some(id) = modification.resolve_target(self.tree)? else {
                continue;
            };
            resolved.push(id);
            if by_node.insert(id, position).is_some() {
                let count = resolved.iter().filter(|&&r| r == id).count();
                return Err(CstError::OverlappingChanges { node: id, count });
            }
            on_path.insert(id);
            if let Some(original) = self.tree.original(id) {
                on_path.extend(self.tree.ancestors(original).map(|h| self.tree.node_id(h)));
            }
        }
        Ok(Targets { by_node, on_path })
    }

    fn rewrite(&mut self, node: Handle, modifications: &[Replace<X>], targets: &Targets) -> Result<Handle, X::Error> {
        let current = self.tree.node(node);
        let id = current.id;
        if !current.is_synthetic() && !targets.on_path.contains(&id) {
            return Ok(node);
        }
        let children: Vec<(usize, Handle)> = current
            .values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.as_node().map(|h| (i, h)))
            .collect();

        let mut replaced = Vec::new();
        for (position, child) in children {
            let rewritten = self.rewrite(child, modifications, targets)?;
            if rewritten != child {
                replaced.push((position, rewritten));
            }
        }
        let rewritten = if replaced.is_empty() {
            node
        } else {
            let mut values = self.tree.node(node).values.clone();
            for (position, child) in replaced {
                values[position] = SourceValue::Node(child);
            }
            self.tree.copy_with_values(node, values)
        };

        match targets.by_node.get(&id) {
            Some(&position) => self.apply_one(&modifications[position], rewritten),
            None => Ok(rewritten),
        }
    }

    // ========================================================================
    // Value-level edits
    // ========================================================================

    fn splice_token(&mut self, node: Handle, token: TokenId, text: String, after: bool) -> Result<Handle, CstError> {
        let mut values = self.tree.node(node).values.clone();
        let position = values
            .iter()
            .position(|v| v.as_token().is_some_and(|t| t.id == token))
            .ok_or_else(|| CstError::MissingToken {
                node_kind: self.tree.kind_name(node).to_string(),
                token_kind: "token".to_string(),
                spelling: Some(token.to_string()),
            })?;
        let inserted = SourceValue::Text(SourceText::new(text));
        if after {
            values.insert(position + 1, inserted);
        } else {
            values[position] = inserted;
        }
        Ok(self.tree.copy_with_values(node, values))
    }

    fn replace_children(&mut self, node: Handle, insertions: &[Insert<X>]) -> Result<Handle, X::Error> {
        let positions: Vec<usize> = self
            .tree
            .node(node)
            .values
            .iter()
            .enumerate()
            .filter(|(_, v)| v.as_node().is_some())
            .map(|(i, _)| i)
            .collect();
        if positions.len() != insertions.len() {
            return Err(CstError::ChildCountMismatch {
                kind: self.tree.kind_name(node).to_string(),
                expected: positions.len(),
                actual: insertions.len(),
            }
            .into());
        }
        let built = self.build_all(insertions)?;
        let mut values = self.tree.node(node).values.clone();
        for (position, child) in positions.into_iter().zip(built) {
            values[position] = SourceValue::Node(child);
        }
        Ok(self.tree.copy_with_values(node, values))
    }
}

/// Rewrite the whole tree with built-in modifications only.
pub fn apply_modifications(tree: &mut SourceTree, modifications: &[Replace]) -> Result<Handle, CstError> {
    let root = tree.root();
    let mut state = ();
    Rewriter::<NoExtension>::new(tree, &mut state).apply_all(root, modifications)
}
