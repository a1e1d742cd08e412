// Copyright (c) cstep contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Closed set of parse-node kinds.
//!
//! Names follow clang's cursor kinds in CamelCase (`COMPOUND_STMT` becomes
//! `CompoundStmt`, `CSTYLE_CAST_EXPR` becomes `CstyleCastExpr`). Kinds the
//! engine has no rule for still round-trip through [`NodeKind::Other`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// The type-name-like discriminant of a parse node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeKind {
    // Declarations
    TranslationUnit,
    FunctionDecl,
    ParmDecl,
    VarDecl,
    FieldDecl,
    StructDecl,
    UnionDecl,
    EnumDecl,
    EnumConstantDecl,
    TypedefDecl,
    TypeRef,

    // Statements
    CompoundStmt,
    DeclStmt,
    ReturnStmt,
    BreakStmt,
    ContinueStmt,
    IfStmt,
    WhileStmt,
    DoStmt,
    ForStmt,
    SwitchStmt,
    CaseStmt,
    DefaultStmt,
    NullStmt,
    GotoStmt,
    LabelStmt,

    // Expressions
    BinaryOperator,
    CompoundAssignmentOperator,
    UnaryOperator,
    CallExpr,
    DeclRefExpr,
    MemberRefExpr,
    ArraySubscriptExpr,
    ConditionalOperator,
    CstyleCastExpr,
    ParenExpr,
    InitListExpr,
    CxxUnaryExpr,
    UnexposedExpr,

    // Literals
    IntegerLiteral,
    FloatingLiteral,
    CharacterLiteral,
    StringLiteral,

    /// Any kind outside the set above, by normalized name.
    Other(String),
}

impl NodeKind {
    /// CamelCase name of this kind.
    pub fn as_str(&self) -> &str {
        match self {
            NodeKind::TranslationUnit => "TranslationUnit",
            NodeKind::FunctionDecl => "FunctionDecl",
            NodeKind::ParmDecl => "ParmDecl",
            NodeKind::VarDecl => "VarDecl",
            NodeKind::FieldDecl => "FieldDecl",
            NodeKind::StructDecl => "StructDecl",
            NodeKind::UnionDecl => "UnionDecl",
            NodeKind::EnumDecl => "EnumDecl",
            NodeKind::EnumConstantDecl => "EnumConstantDecl",
            NodeKind::TypedefDecl => "TypedefDecl",
            NodeKind::TypeRef => "TypeRef",
            NodeKind::CompoundStmt => "CompoundStmt",
            NodeKind::DeclStmt => "DeclStmt",
            NodeKind::ReturnStmt => "ReturnStmt",
            NodeKind::BreakStmt => "BreakStmt",
            NodeKind::ContinueStmt => "ContinueStmt",
            NodeKind::IfStmt => "IfStmt",
            NodeKind::WhileStmt => "WhileStmt",
            NodeKind::DoStmt => "DoStmt",
            NodeKind::ForStmt => "ForStmt",
            NodeKind::SwitchStmt => "SwitchStmt",
            NodeKind::CaseStmt => "CaseStmt",
            NodeKind::DefaultStmt => "DefaultStmt",
            NodeKind::NullStmt => "NullStmt",
            NodeKind::GotoStmt => "GotoStmt",
            NodeKind::LabelStmt => "LabelStmt",
            NodeKind::BinaryOperator => "BinaryOperator",
            NodeKind::CompoundAssignmentOperator => "CompoundAssignmentOperator",
            NodeKind::UnaryOperator => "UnaryOperator",
            NodeKind::CallExpr => "CallExpr",
            NodeKind::DeclRefExpr => "DeclRefExpr",
            NodeKind::MemberRefExpr => "MemberRefExpr",
            NodeKind::ArraySubscriptExpr => "ArraySubscriptExpr",
            NodeKind::ConditionalOperator => "ConditionalOperator",
            NodeKind::CstyleCastExpr => "CstyleCastExpr",
            NodeKind::ParenExpr => "ParenExpr",
            NodeKind::InitListExpr => "InitListExpr",
            NodeKind::CxxUnaryExpr => "CxxUnaryExpr",
            NodeKind::UnexposedExpr => "UnexposedExpr",
            NodeKind::IntegerLiteral => "IntegerLiteral",
            NodeKind::FloatingLiteral => "FloatingLiteral",
            NodeKind::CharacterLiteral => "CharacterLiteral",
            NodeKind::StringLiteral => "StringLiteral",
            NodeKind::Other(name) => name,
        }
    }

    /// Parse a kind from a CamelCase name or a clang `UPPER_SNAKE` cursor name.
    pub fn from_name(name: &str) -> NodeKind {
        let normalized = normalize_kind_name(name);
        match normalized.as_str() {
            "TranslationUnit" => NodeKind::TranslationUnit,
            "FunctionDecl" => NodeKind::FunctionDecl,
            "ParmDecl" => NodeKind::ParmDecl,
            "VarDecl" => NodeKind::VarDecl,
            "FieldDecl" => NodeKind::FieldDecl,
            "StructDecl" => NodeKind::StructDecl,
            "UnionDecl" => NodeKind::UnionDecl,
            "EnumDecl" => NodeKind::EnumDecl,
            "EnumConstantDecl" => NodeKind::EnumConstantDecl,
            "TypedefDecl" => NodeKind::TypedefDecl,
            "TypeRef" => NodeKind::TypeRef,
            "CompoundStmt" => NodeKind::CompoundStmt,
            "DeclStmt" => NodeKind::DeclStmt,
            "ReturnStmt" => NodeKind::ReturnStmt,
            "BreakStmt" => NodeKind::BreakStmt,
            "ContinueStmt" => NodeKind::ContinueStmt,
            "IfStmt" => NodeKind::IfStmt,
            "WhileStmt" => NodeKind::WhileStmt,
            "DoStmt" => NodeKind::DoStmt,
            "ForStmt" => NodeKind::ForStmt,
            "SwitchStmt" => NodeKind::SwitchStmt,
            "CaseStmt" => NodeKind::CaseStmt,
            "DefaultStmt" => NodeKind::DefaultStmt,
            "NullStmt" => NodeKind::NullStmt,
            "GotoStmt" => NodeKind::GotoStmt,
            "LabelStmt" => NodeKind::LabelStmt,
            "BinaryOperator" => NodeKind::BinaryOperator,
            "CompoundAssignmentOperator" => NodeKind::CompoundAssignmentOperator,
            "UnaryOperator" => NodeKind::UnaryOperator,
            "CallExpr" => NodeKind::CallExpr,
            "DeclRefExpr" => NodeKind::DeclRefExpr,
            "MemberRefExpr" => NodeKind::MemberRefExpr,
            "ArraySubscriptExpr" => NodeKind::ArraySubscriptExpr,
            "ConditionalOperator" => NodeKind::ConditionalOperator,
            "CstyleCastExpr" => NodeKind::CstyleCastExpr,
            "ParenExpr" => NodeKind::ParenExpr,
            "InitListExpr" => NodeKind::InitListExpr,
            "CxxUnaryExpr" => NodeKind::CxxUnaryExpr,
            "UnexposedExpr" => NodeKind::UnexposedExpr,
            "IntegerLiteral" => NodeKind::IntegerLiteral,
            "FloatingLiteral" => NodeKind::FloatingLiteral,
            "CharacterLiteral" => NodeKind::CharacterLiteral,
            "StringLiteral" => NodeKind::StringLiteral,
            _ => NodeKind::Other(normalized),
        }
    }

    /// Kinds that evaluate to a value.
    pub fn is_expression(&self) -> bool {
        matches!(
            self,
            NodeKind::BinaryOperator
                | NodeKind::CompoundAssignmentOperator
                | NodeKind::UnaryOperator
                | NodeKind::CallExpr
                | NodeKind::DeclRefExpr
                | NodeKind::MemberRefExpr
                | NodeKind::ArraySubscriptExpr
                | NodeKind::ConditionalOperator
                | NodeKind::CstyleCastExpr
                | NodeKind::ParenExpr
                | NodeKind::InitListExpr
                | NodeKind::CxxUnaryExpr
                | NodeKind::UnexposedExpr
        ) || self.is_literal()
    }

    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            NodeKind::IntegerLiteral
                | NodeKind::FloatingLiteral
                | NodeKind::CharacterLiteral
                | NodeKind::StringLiteral
        )
    }
}

/// Convert a clang `UPPER_SNAKE` cursor name to CamelCase.
///
/// Names that are already CamelCase pass through unchanged.
pub fn normalize_kind_name(name: &str) -> String {
    if !name.contains('_') && !name.chars().all(|c| c.is_ascii_uppercase()) {
        return name.to_string();
    }
    name.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let lower = part.to_ascii_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for NodeKind {
    fn from(name: String) -> Self {
        NodeKind::from_name(&name)
    }
}

impl From<NodeKind> for String {
    fn from(kind: NodeKind) -> Self {
        kind.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clang_names_normalize_to_camel_case() {
        assert_eq!(normalize_kind_name("COMPOUND_STMT"), "CompoundStmt");
        assert_eq!(normalize_kind_name("CSTYLE_CAST_EXPR"), "CstyleCastExpr");
        assert_eq!(normalize_kind_name("DeclRefExpr"), "DeclRefExpr");
    }

    #[test]
    fn from_name_accepts_both_spellings() {
        assert_eq!(NodeKind::from_name("BINARY_OPERATOR"), NodeKind::BinaryOperator);
        assert_eq!(NodeKind::from_name("BinaryOperator"), NodeKind::BinaryOperator);
        assert_eq!(
            NodeKind::from_name("COMPOUND_ASSIGNMENT_OPERATOR"),
            NodeKind::CompoundAssignmentOperator
        );
        assert_eq!(NodeKind::from_name("CXX_UNARY_EXPR"), NodeKind::CxxUnaryExpr);
    }

    #[test]
    fn unknown_kinds_are_preserved() {
        let kind = NodeKind::from_name("GENERIC_SELECTION_EXPR");
        assert_eq!(kind, NodeKind::Other("GenericSelectionExpr".to_string()));
        assert_eq!(kind.as_str(), "GenericSelectionExpr");
    }

    #[test]
    fn serializes_as_name() {
        let json = serde_json::to_string(&NodeKind::CallExpr).unwrap();
        assert_eq!(json, "\"CallExpr\"");
        let back: NodeKind = serde_json::from_str("\"RETURN_STMT\"").unwrap();
        assert_eq!(back, NodeKind::ReturnStmt);
    }

    #[test]
    fn literal_kinds_are_expressions() {
        assert!(NodeKind::IntegerLiteral.is_expression());
        assert!(NodeKind::StringLiteral.is_literal());
        assert!(!NodeKind::CompoundStmt.is_expression());
    }
}
