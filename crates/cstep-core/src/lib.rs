//! Core infrastructure for cstep.
//!
//! This crate provides the shared, language-layer-agnostic pieces:
//! - Error types and error codes
//! - Byte spans, content hashing and the line/column index
//! - JSON output types for CLI responses
//! - Configuration loaded from `cstep.toml`

pub mod config;
pub mod error;
pub mod output;
pub mod span;
pub mod text;

pub use error::{CstepError, OutputErrorCode};
pub use span::{ContentHash, SourceRange, Span};
pub use text::LineIndex;
