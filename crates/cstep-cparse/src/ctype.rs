// Copyright (c) cstep contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! C types as far as the built-in frontend needs them.
//!
//! This is not a type checker: it computes the type *spelling* of every
//! declaration and expression so the instrumentation can declare
//! temporaries, and it follows the usual arithmetic conversions, pointer
//! arithmetic and array decay closely enough for that purpose. Spellings
//! match clang's (`int *`, `int [3]`, `int (*)(int)`, `int (int, int)`).

/// Integer ranks, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IntKind {
    Bool,
    Char,
    Short,
    Int,
    Long,
    LongLong,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FloatKind {
    Float,
    Double,
    LongDouble,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CType {
    Void,
    Int { kind: IntKind, unsigned: bool },
    Float(FloatKind),
    Pointer(Box<CType>),
    Array(Box<CType>, Option<u64>),
    Function {
        ret: Box<CType>,
        params: Vec<CType>,
        variadic: bool,
    },
    Struct(String),
    Union(String),
    Enum(String),
    /// A typedef name and what it stands for.
    Typedef(String, Box<CType>),
    Const(Box<CType>),
}

impl CType {
    pub fn int() -> CType {
        CType::Int {
            kind: IntKind::Int,
            unsigned: false,
        }
    }

    pub fn char() -> CType {
        CType::Int {
            kind: IntKind::Char,
            unsigned: false,
        }
    }

    pub fn unsigned_long() -> CType {
        CType::Int {
            kind: IntKind::Long,
            unsigned: true,
        }
    }

    pub fn double() -> CType {
        CType::Float(FloatKind::Double)
    }

    pub fn pointer_to(self) -> CType {
        CType::Pointer(Box::new(self))
    }

    pub fn array_of(self, len: Option<u64>) -> CType {
        CType::Array(Box::new(self), len)
    }

    pub fn qualified_const(self) -> CType {
        match self {
            CType::Const(_) => self,
            other => CType::Const(Box::new(other)),
        }
    }

    // ========================================================================
    // Spelling
    // ========================================================================

    /// clang-style spelling of the type.
    pub fn spelling(&self) -> String {
        self.spell_with("")
    }

    fn spell_with(&self, inner: &str) -> String {
        match self {
            CType::Pointer(pointee) => match pointee.as_ref() {
                CType::Array(..) | CType::Function { .. } => {
                    pointee.spell_with(&format!("(*{})", inner))
                }
                _ => pointee.spell_with(&format!("*{}", inner)),
            },
            CType::Array(element, len) => {
                let len = len.map(|n| n.to_string()).unwrap_or_default();
                element.spell_with(&format!("{}[{}]", inner, len))
            }
            CType::Function {
                ret,
                params,
                variadic,
            } => {
                let mut list: Vec<String> = params.iter().map(CType::spelling).collect();
                if *variadic {
                    list.push("...".to_string());
                }
                if list.is_empty() {
                    list.push("void".to_string());
                }
                ret.spell_with(&format!("{}({})", inner, list.join(", ")))
            }
            CType::Const(base) => match base.as_ref() {
                CType::Pointer(_) => base.spell_with(&format!("const{}", inner)),
                other => format!("const {}", other.spell_with(inner)),
            },
            _ => {
                let name = self.base_name();
                if inner.is_empty() {
                    name
                } else {
                    format!("{} {}", name, inner)
                }
            }
        }
    }

    fn base_name(&self) -> String {
        match self {
            CType::Void => "void".to_string(),
            CType::Int { kind, unsigned } => {
                let base = match kind {
                    IntKind::Bool => return "_Bool".to_string(),
                    IntKind::Char => "char",
                    IntKind::Short => "short",
                    IntKind::Int => "int",
                    IntKind::Long => "long",
                    IntKind::LongLong => "long long",
                };
                if *unsigned {
                    format!("unsigned {}", base)
                } else {
                    base.to_string()
                }
            }
            CType::Float(FloatKind::Float) => "float".to_string(),
            CType::Float(FloatKind::Double) => "double".to_string(),
            CType::Float(FloatKind::LongDouble) => "long double".to_string(),
            CType::Struct(name) => format!("struct {}", name),
            CType::Union(name) => format!("union {}", name),
            CType::Enum(name) => format!("enum {}", name),
            CType::Typedef(name, _) => name.clone(),
            CType::Pointer(_)
            | CType::Array(..)
            | CType::Function { .. }
            | CType::Const(_) => self.spelling(),
        }
    }

    // ========================================================================
    // Classification
    // ========================================================================

    /// The type with typedefs and top-level `const` removed.
    pub fn resolved(&self) -> &CType {
        match self {
            CType::Typedef(_, target) | CType::Const(target) => target.resolved(),
            other => other,
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self.resolved(), CType::Void)
    }

    pub fn is_integer(&self) -> bool {
        matches!(self.resolved(), CType::Int { .. } | CType::Enum(_))
    }

    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self.resolved(),
            CType::Int { .. } | CType::Float(_) | CType::Enum(_)
        )
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self.resolved(), CType::Pointer(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self.resolved(), CType::Array(..))
    }

    pub fn is_function(&self) -> bool {
        matches!(self.resolved(), CType::Function { .. })
    }

    /// Target of a pointer, element of an array.
    pub fn pointee(&self) -> Option<CType> {
        match self.resolved() {
            CType::Pointer(inner) | CType::Array(inner, _) => Some(inner.as_ref().clone()),
            _ => None,
        }
    }

    /// Return type when this is a function or a pointer to one.
    pub fn return_type(&self) -> Option<CType> {
        match self.resolved() {
            CType::Function { ret, .. } => Some(ret.as_ref().clone()),
            CType::Pointer(inner) => match inner.resolved() {
                CType::Function { ret, .. } => Some(ret.as_ref().clone()),
                _ => None,
            },
            _ => None,
        }
    }

    /// Arrays and functions decay to pointers in value contexts.
    pub fn decay(&self) -> CType {
        match self.resolved() {
            CType::Array(element, _) => element.as_ref().clone().pointer_to(),
            CType::Function { .. } => self.clone().pointer_to(),
            _ => self.clone(),
        }
    }

    /// The unqualified type with integer promotions applied.
    pub fn promoted(&self) -> CType {
        match self.resolved() {
            CType::Int { kind, .. } if *kind < IntKind::Int => CType::int(),
            CType::Enum(_) => CType::int(),
            other => other.clone(),
        }
    }

    /// Usual arithmetic conversions of two operand types.
    pub fn usual_arithmetic(a: &CType, b: &CType) -> CType {
        let (a, b) = (a.promoted(), b.promoted());
        match (&a, &b) {
            (CType::Float(x), CType::Float(y)) => CType::Float((*x).max(*y)),
            (CType::Float(_), _) => a,
            (_, CType::Float(_)) => b,
            (
                CType::Int {
                    kind: ka,
                    unsigned: ua,
                },
                CType::Int {
                    kind: kb,
                    unsigned: ub,
                },
            ) => {
                if ua == ub {
                    CType::Int {
                        kind: (*ka).max(*kb),
                        unsigned: *ua,
                    }
                } else {
                    let (uk, sk) = if *ua { (*ka, *kb) } else { (*kb, *ka) };
                    if uk >= sk {
                        CType::Int {
                            kind: uk,
                            unsigned: true,
                        }
                    } else {
                        CType::Int {
                            kind: sk,
                            unsigned: false,
                        }
                    }
                }
            }
            _ => CType::int(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_spellings() {
        assert_eq!(CType::int().spelling(), "int");
        assert_eq!(CType::unsigned_long().spelling(), "unsigned long");
        assert_eq!(CType::Float(FloatKind::LongDouble).spelling(), "long double");
        assert_eq!(CType::Struct("point".into()).spelling(), "struct point");
    }

    #[test]
    fn declarator_spellings() {
        assert_eq!(CType::int().pointer_to().spelling(), "int *");
        assert_eq!(CType::char().pointer_to().pointer_to().spelling(), "char **");
        assert_eq!(CType::int().array_of(Some(3)).spelling(), "int [3]");
        assert_eq!(
            CType::int().array_of(Some(3)).array_of(Some(2)).spelling(),
            "int [2][3]"
        );
        assert_eq!(
            CType::int().array_of(Some(3)).pointer_to().spelling(),
            "int (*)[3]"
        );
        let func = CType::Function {
            ret: Box::new(CType::int()),
            params: vec![CType::int(), CType::char().pointer_to()],
            variadic: false,
        };
        assert_eq!(func.spelling(), "int (int, char *)");
        assert_eq!(func.pointer_to().spelling(), "int (*)(int, char *)");
    }

    #[test]
    fn const_spellings() {
        assert_eq!(CType::int().qualified_const().spelling(), "const int");
        assert_eq!(
            CType::char().qualified_const().pointer_to().spelling(),
            "const char *"
        );
        assert_eq!(
            CType::int().pointer_to().qualified_const().spelling(),
            "int *const"
        );
    }

    #[test]
    fn empty_parameter_list_spells_void() {
        let func = CType::Function {
            ret: Box::new(CType::Void),
            params: vec![],
            variadic: false,
        };
        assert_eq!(func.spelling(), "void (void)");
    }

    #[test]
    fn arithmetic_conversions() {
        let uint = CType::Int {
            kind: IntKind::Int,
            unsigned: true,
        };
        let long = CType::Int {
            kind: IntKind::Long,
            unsigned: false,
        };
        assert_eq!(CType::usual_arithmetic(&CType::char(), &CType::char()), CType::int());
        assert_eq!(CType::usual_arithmetic(&CType::int(), &uint), uint);
        assert_eq!(CType::usual_arithmetic(&uint, &long), long);
        assert_eq!(
            CType::usual_arithmetic(&CType::int(), &CType::double()),
            CType::double()
        );
    }

    #[test]
    fn typedefs_resolve_for_classification() {
        let alias = CType::Typedef("count_t".into(), Box::new(CType::unsigned_long()));
        assert_eq!(alias.spelling(), "count_t");
        assert!(alias.is_integer());
        assert_eq!(alias.promoted(), CType::unsigned_long());
    }

    #[test]
    fn arrays_decay_to_pointers() {
        let arr = CType::int().array_of(Some(4));
        assert_eq!(arr.decay().spelling(), "int *");
        assert_eq!(arr.pointee(), Some(CType::int()));
    }
}
