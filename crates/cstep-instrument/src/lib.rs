//! Step-through instrumentation of C translation units.
//!
//! Given a C source file and its parse tree, [`instrument`] produces an
//! equivalent program that calls `notify_N(ref, ...)` hooks as it runs,
//! plus a [`Metadata`] document mapping every reference back to the
//! source. A replay tool links the program against its own hooks and
//! reconstructs each step of an execution from the reported references.
//!
//! The pass runs in three stages:
//!
//! 1. [`InstrumentVisitor`] walks the source tree and plans a forest of
//!    notify shapes, creating events as it goes
//! 2. the rewriter applies the forest bottom-up, assigning each group of
//!    events its reference in output order
//! 3. the rewritten tree is printed and the events are serialized
//!
//! A pass either completes or fails as a whole; partial output is never
//! returned.

pub mod ctypes;
pub mod error;
pub mod error_bridges;
pub mod event;
pub mod metadata;
pub mod options;
pub mod pass;
pub mod scope;
pub mod shapes;
pub mod visitor;

use tracing::debug;

use cstep_cparse::ParseTree;

pub use error::InstrumentError;
pub use event::{Action, NotificationRecord, NotifyData, NotifyRegistry};
pub use metadata::{Metadata, NodeRecord, METADATA_SCHEMA_VERSION};
pub use options::InstrumentOptions;
pub use pass::Pass;
pub use shapes::Notify;
pub use visitor::InstrumentVisitor;

/// The result of instrumenting one file.
#[derive(Debug, Clone)]
pub struct Instrumented {
    pub source: String,
    pub metadata: Metadata,
}

/// Instrument `source`, whose parse tree is `parse`. `file` is recorded in
/// the metadata as given.
pub fn instrument(
    file: &str,
    source: &str,
    parse: ParseTree,
    options: &InstrumentOptions,
) -> Result<Instrumented, InstrumentError> {
    let mut pass = Pass::new(source, parse, options.clone())?;
    let plan = pass.plan()?;
    let root = pass.apply(&plan)?;
    let output = pass.tree.stringify(root);
    let metadata = Metadata::collect(file, &pass.tree, &pass.state.events)?;
    debug!(
        file,
        events = metadata.notifications.len(),
        nodes = metadata.nodes.len(),
        "instrumented"
    );
    Ok(Instrumented {
        source: output,
        metadata,
    })
}

/// Parse `source` with the built-in frontend, then instrument it.
pub fn instrument_source(file: &str, source: &str, options: &InstrumentOptions) -> Result<Instrumented, InstrumentError> {
    let parse = cstep_cparse::parse_translation_unit(source)?;
    instrument(file, source, parse, options)
}

/// The planned modification forest of `source`, rendered one shape per
/// line. Nothing is applied.
pub fn describe_plan(source: &str, parse: ParseTree, options: &InstrumentOptions) -> Result<String, InstrumentError> {
    let mut pass = Pass::new(source, parse, options.clone())?;
    let plan = pass.plan()?;
    Ok(pass.describe(&plan))
}
