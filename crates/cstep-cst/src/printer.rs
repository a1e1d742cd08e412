// Copyright (c) cstep contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Debug dumps of source trees and modification forests.

use std::fmt::Write;

use crate::modification::{Extension, Insert, Replace};
use crate::node::{Handle, SourceValue};
use crate::tree::SourceTree;

/// Longest node text shown in a label before it is elided.
const LABEL_TEXT: usize = 32;

// ============================================================================
// Source trees
// ============================================================================

/// Prints one line per node, `text (#id)`, indented by depth.
///
/// With `placeholders`, each line shows only the node's own values, with
/// `{n}` for the n-th child and `{tN:text}` for token N.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceTreePrinter {
    pub placeholders: bool,
}

impl SourceTreePrinter {
    pub fn new() -> Self {
        SourceTreePrinter::default()
    }

    pub fn with_placeholders() -> Self {
        SourceTreePrinter { placeholders: true }
    }

    pub fn print(&self, tree: &SourceTree, node: Handle) -> String {
        let mut out = String::new();
        self.print_node(tree, node, 0, &mut out);
        out
    }

    fn print_node(&self, tree: &SourceTree, node: Handle, depth: usize, out: &mut String) {
        let text = if self.placeholders {
            placeholder_text(tree, node)
        } else {
            tree.stringify(node)
        };
        let _ = writeln!(
            out,
            "{}{} ({})",
            "  ".repeat(depth),
            escape(&text),
            tree.node_id(node)
        );
        for child in tree.children(node) {
            self.print_node(tree, child, depth + 1, out);
        }
    }
}

fn placeholder_text(tree: &SourceTree, node: Handle) -> String {
    let mut text = String::new();
    let mut child = 0;
    for value in &tree.node(node).values {
        match value {
            SourceValue::Node(_) => {
                let _ = write!(text, "{{{}}}", child);
                child += 1;
            }
            SourceValue::Token(token) => {
                let _ = write!(text, "{{{}:{}}}", token.id, token.text);
            }
            SourceValue::Text(gap) => text.push_str(&gap.text),
        }
    }
    text
}

fn escape(text: &str) -> String {
    text.replace('\n', "\\n").replace('\t', "\\t")
}

fn short(text: &str) -> String {
    let text = escape(text);
    if text.chars().count() <= LABEL_TEXT {
        return text;
    }
    let cut: String = text.chars().take(LABEL_TEXT).collect();
    format!("{}...", cut)
}

// ============================================================================
// Modifications
// ============================================================================

/// Describe a node for a modification label: `#id Kind "text"`.
pub fn node_label(tree: &SourceTree, node: Handle) -> String {
    format!(
        "{} {} {:?}",
        tree.node_id(node),
        tree.kind_name(node),
        short(&tree.stringify(node))
    )
}

/// Print a modification forest, one line per modification or insertion,
/// nested modifications indented below their parent.
pub fn describe<X: Extension>(tree: &SourceTree, modifications: &[Replace<X>]) -> String {
    let mut out = String::new();
    for modification in modifications {
        describe_replace(tree, modification, 0, &mut out);
    }
    out
}

fn describe_replace<X: Extension>(tree: &SourceTree, modification: &Replace<X>, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    match modification {
        Replace::Node { target, insertion } => {
            let _ = writeln!(out, "{}Replace {}", indent, node_label(tree, *target));
            describe_insert(tree, insertion, depth + 1, out);
        }
        Replace::Token {
            target,
            token,
            insertion,
        } => {
            let _ = writeln!(out, "{}ReplaceToken {} in {}", indent, token, node_label(tree, *target));
            describe_insert(tree, insertion, depth + 1, out);
        }
        Replace::AfterToken {
            target,
            token,
            insertion,
        } => {
            let _ = writeln!(out, "{}InsertAfterToken {} in {}", indent, token, node_label(tree, *target));
            describe_insert(tree, insertion, depth + 1, out);
        }
        Replace::Children { target, insertions } => {
            let _ = writeln!(out, "{}ReplaceChildren {}", indent, node_label(tree, *target));
            for insertion in insertions {
                describe_insert(tree, insertion, depth + 1, out);
            }
        }
        Replace::Compound {
            target,
            modifications,
        } => {
            let at = match target {
                Some(target) => node_label(tree, *target),
                None => "(common ancestor)".to_string(),
            };
            let _ = writeln!(out, "{}Compound {}", indent, at);
            for nested in modifications {
                describe_replace(tree, nested, depth + 1, out);
            }
        }
        Replace::Templated {
            target,
            template,
            insertions,
        } => {
            let _ = writeln!(
                out,
                "{}Templated {} as {:?}",
                indent,
                node_label(tree, *target),
                template.as_str()
            );
            for insertion in insertions {
                describe_insert(tree, insertion, depth + 1, out);
            }
        }
        Replace::Ext(ext) => {
            let _ = writeln!(out, "{}{}", indent, ext.label(tree));
            for nested in ext.nested() {
                describe_replace(tree, nested, depth + 1, out);
            }
        }
    }
}

fn describe_insert<X: Extension>(tree: &SourceTree, insertion: &Insert<X>, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    match insertion {
        Insert::Constant(text) => {
            let _ = writeln!(out, "{}Constant {:?}", indent, short(text));
        }
        Insert::Copy(source) => {
            let _ = writeln!(out, "{}Copy {}", indent, node_label(tree, *source));
        }
        Insert::CopyReplace {
            source,
            replacements,
        } => {
            let _ = writeln!(out, "{}CopyReplace {}", indent, node_label(tree, *source));
            for nested in replacements {
                describe_replace(tree, nested, depth + 1, out);
            }
        }
        Insert::Template {
            template,
            insertions,
        } => {
            let _ = writeln!(out, "{}Template {:?}", indent, template.as_str());
            for nested in insertions {
                describe_insert(tree, nested, depth + 1, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modification::NoExtension;
    use cstep_cparse::{parse_translation_unit, NodeKind};

    fn build(source: &str) -> SourceTree {
        SourceTree::build(source, parse_translation_unit(source).unwrap()).unwrap()
    }

    #[test]
    fn full_text_lines() {
        let tree = build("int x = 1;\n");
        let text = SourceTreePrinter::new().print(&tree, tree.root());
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "int x = 1;\\n (#0)");
        assert_eq!(lines[1], "  int x = 1 (#1)");
        assert_eq!(lines[2], "    1 (#2)");
    }

    #[test]
    fn placeholder_lines() {
        let tree = build("int x = 1;");
        let text = SourceTreePrinter::with_placeholders().print(&tree, tree.root());
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "{0}{t4:;} (#0)");
        assert_eq!(lines[1], "  {t0:int} {t1:x} {t2:=} {0} (#1)");
    }

    #[test]
    fn describes_nested_modifications() {
        let tree = build("int x = 1;");
        let literal = tree
            .original_nodes()
            .find(|&h| tree.kind(h) == Some(&NodeKind::IntegerLiteral))
            .unwrap();
        let var = tree.parent(literal).unwrap();
        let modifications: Vec<Replace<NoExtension>> = vec![Replace::compound_at(
            var,
            vec![Replace::node(
                literal,
                Insert::template("({0})", vec![Insert::copy(literal)]).unwrap(),
            )],
        )];
        let text = describe(&tree, &modifications);
        assert_eq!(
            text,
            "Compound #1 VarDecl \"int x = 1\"\n  Replace #2 IntegerLiteral \"1\"\n    Template \"({0})\"\n      Copy #2 IntegerLiteral \"1\"\n"
        );
    }
}
