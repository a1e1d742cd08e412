//! Conversions from the layer errors to the unified `CstepError`.
//!
//! These live here rather than in `cstep-core` because they need the
//! parse, CST and instrumentation error types, and rather than in the
//! root crate because a `From` impl must name a type local to the crate
//! that defines it.

use cstep_core::CstepError;
use cstep_cparse::ParseError;
use cstep_cst::CstError;

use crate::error::InstrumentError;

/// Frontend failures: code 3.
pub fn parse_error(err: ParseError) -> CstepError {
    match err {
        ParseError::Syntax { message, start, .. } => CstepError::ParseFailed {
            file: String::new(),
            line: start.line,
            col: start.column,
            message,
        },
        ParseError::InvalidTree { message } => CstepError::ParseFailed {
            file: String::new(),
            line: 0,
            col: 0,
            message: format!("invalid parse tree: {}", message),
        },
    }
}

/// CST failures, by category: build invariant (4), metadata
/// precondition (5), or contract violation (10).
pub fn cst_error(err: CstError) -> CstepError {
    let message = err.to_string();
    match err {
        CstError::RoundTripMismatch { .. } | CstError::InvalidExtent { .. } => CstepError::RoundTripFailed {
            message,
            file: None,
        },
        CstError::MissingToken { node_kind, .. } => CstepError::MetadataPrecondition {
            message,
            node_kind: Some(node_kind),
        },
        CstError::ChildCountMismatch { kind, .. } => CstepError::MetadataPrecondition {
            message,
            node_kind: Some(kind),
        },
        _ => CstepError::ContractViolation { message },
    }
}

impl From<InstrumentError> for CstepError {
    fn from(err: InstrumentError) -> Self {
        let message = err.to_string();
        match err {
            InstrumentError::Parse(err) => parse_error(err),
            InstrumentError::Cst(err) => cst_error(err),
            InstrumentError::MissingType { kind, .. }
            | InstrumentError::MissingScope { kind, .. }
            | InstrumentError::MissingIdentifier { kind, .. } => CstepError::MetadataPrecondition {
                message,
                node_kind: Some(kind),
            },
            InstrumentError::TooManyNotifyParameters { .. } => CstepError::MetadataPrecondition {
                message,
                node_kind: None,
            },
            InstrumentError::IncompleteEvent { .. } => CstepError::ContractViolation { message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cstep_core::OutputErrorCode;
    use cstep_cparse::Location;
    use cstep_cst::NodeId;

    fn code(err: InstrumentError) -> u8 {
        OutputErrorCode::from(&CstepError::from(err)).code()
    }

    #[test]
    fn codes_follow_the_failure_category() {
        let syntax = ParseError::Syntax {
            message: "expected ';'".into(),
            start: Location::new(2, 5),
            end: Location::new(2, 6),
        };
        assert_eq!(code(InstrumentError::Parse(syntax)), 3);
        assert_eq!(code(InstrumentError::Cst(CstError::RoundTripMismatch { offset: 4 })), 4);
        assert_eq!(
            code(InstrumentError::MissingType {
                node: NodeId(3),
                kind: "DeclRefExpr".into()
            }),
            5
        );
        assert_eq!(code(InstrumentError::Cst(CstError::OverlappingChanges { node: NodeId(1), count: 2 })), 10);
    }

    #[test]
    fn syntax_errors_keep_their_position() {
        let err = parse_error(ParseError::Syntax {
            message: "unexpected token".into(),
            start: Location::new(3, 7),
            end: Location::new(3, 8),
        });
        match err.in_file("a.c") {
            CstepError::ParseFailed { file, line, col, .. } => {
                assert_eq!((file.as_str(), line, col), ("a.c", 3, 7));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn missing_nodes_name_their_kind() {
        let err = CstepError::from(InstrumentError::MissingScope {
            node: NodeId(9),
            kind: "VarDecl".into(),
        });
        assert!(matches!(
            err,
            CstepError::MetadataPrecondition { node_kind: Some(ref k), .. } if k == "VarDecl"
        ));
    }
}
