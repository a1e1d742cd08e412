//! Error types for instrumentation passes.

use thiserror::Error;

use cstep_cparse::ParseError;
use cstep_cst::{CstError, NodeId};

use crate::event::Action;

/// Why an instrumentation pass aborted.
///
/// Every variant is fatal for the file being processed; callers discard
/// any partial output and move on to the next file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InstrumentError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Cst(#[from] CstError),

    /// A node to be captured has no type spelling, so its temporary has
    /// no declared type.
    #[error("{kind} node {node} has no type spelling")]
    MissingType { node: NodeId, kind: String },

    /// A declaration lies outside any block, loop or function.
    #[error("{kind} node {node} has no enclosing scope")]
    MissingScope { node: NodeId, kind: String },

    /// A declaration or reference has no name to report.
    #[error("{kind} node {node} has no identifier")]
    MissingIdentifier { node: NodeId, kind: String },

    /// A grouped notify call needs more pointer parameters than the
    /// runtime provides hooks for.
    #[error("notify call needs {count} parameters, the maximum is {max}")]
    TooManyNotifyParameters { count: usize, max: usize },

    /// An event reached serialization without a field its action needs.
    #[error("event {id} ({action}) has no {field}")]
    IncompleteEvent {
        id: u32,
        action: Action,
        field: &'static str,
    },
}

impl InstrumentError {
    /// True for failures that indicate a rule bug rather than bad input.
    pub fn is_contract_violation(&self) -> bool {
        match self {
            InstrumentError::Cst(err) => err.is_contract_violation(),
            InstrumentError::IncompleteEvent { .. } => true,
            _ => false,
        }
    }

    /// True when the input did not parse or did not round-trip.
    pub fn is_build_failure(&self) -> bool {
        matches!(
            self,
            InstrumentError::Parse(_)
                | InstrumentError::Cst(CstError::RoundTripMismatch { .. } | CstError::InvalidExtent { .. })
        )
    }
}
