//! cstep: a source-to-source compiler that instruments C programs for
//! step-through replay.
//!
//! The engine is layered across the workspace crates:
//! - `cstep-core`: errors, spans, configuration and JSON responses
//! - `cstep-cparse`: the C frontend producing parse trees
//! - `cstep-cst`: the lossless source tree and its rewriter
//! - `cstep-instrument`: the instrumentation pass and its metadata
//!
//! This crate adds the command runners used by the `cstep` binary.

pub mod cli;

pub use cstep_core::config;
pub use cstep_core::error;
pub use cstep_core::output;

pub use cstep_core::{CstepError, OutputErrorCode};
pub use cstep_instrument::{instrument, instrument_source, InstrumentOptions, Instrumented, Metadata};
