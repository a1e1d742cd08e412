// Copyright (c) cstep contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Text templates with positional `{n}` slots.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::CstError;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(\d+)\}").expect("placeholder pattern compiles"));

/// A piece of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Piece {
    Text(String),
    Slot(usize),
}

/// A template such as `({0}, {1})`.
///
/// Only `{` digits `}` is a slot; any other brace is literal text, so
/// templates can hold C blocks like `{ {0}; }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    text: String,
    pieces: Vec<Piece>,
}

impl Template {
    pub fn parse(text: &str) -> Template {
        let mut pieces = Vec::new();
        let mut last = 0;
        for captures in PLACEHOLDER.captures_iter(text) {
            let (Some(whole), Some(digits)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            // Overlong digit runs are not slots.
            let Ok(index) = digits.as_str().parse::<usize>() else {
                continue;
            };
            if whole.start() > last {
                pieces.push(Piece::Text(text[last..whole.start()].to_string()));
            }
            pieces.push(Piece::Slot(index));
            last = whole.end();
        }
        if last < text.len() {
            pieces.push(Piece::Text(text[last..].to_string()));
        }
        Template {
            text: text.to_string(),
            pieces,
        }
    }

    /// Assemble a template from pieces; text pieces are taken literally
    /// even if they look like slots.
    pub fn from_pieces(pieces: Vec<Piece>) -> Template {
        let mut text = String::new();
        let mut kept = Vec::with_capacity(pieces.len());
        for piece in pieces {
            match &piece {
                Piece::Text(t) if t.is_empty() => continue,
                Piece::Text(t) => text.push_str(t),
                Piece::Slot(i) => text.push_str(&format!("{{{}}}", i)),
            }
            kept.push(piece);
        }
        Template { text, pieces: kept }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    /// Number of insertions the template needs: one past the highest slot.
    pub fn slot_count(&self) -> usize {
        self.pieces
            .iter()
            .filter_map(|p| match p {
                Piece::Slot(i) => Some(i + 1),
                Piece::Text(_) => None,
            })
            .max()
            .unwrap_or(0)
    }

    /// Check that `available` insertions fill every slot.
    pub fn check(&self, available: usize) -> Result<(), CstError> {
        let needed = self.slot_count();
        if needed > available {
            return Err(CstError::PlaceholderOutOfRange {
                index: needed - 1,
                available,
            });
        }
        Ok(())
    }

    /// Fill the slots with plain strings.
    pub fn render(&self, values: &[&str]) -> Result<String, CstError> {
        self.check(values.len())?;
        let mut out = String::with_capacity(self.text.len());
        for piece in &self.pieces {
            match piece {
                Piece::Text(text) => out.push_str(text),
                Piece::Slot(i) => out.push_str(values[*i]),
            }
        }
        Ok(out)
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
