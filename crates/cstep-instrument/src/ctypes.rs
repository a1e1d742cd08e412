//! Declarations of generated temporaries, derived from type spellings.
//!
//! Type spellings follow clang: the specifiers, then an abstract
//! declarator with no name in it, as in `int`, `char *const`, `int [3]`,
//! `int (*)[3]` or `int (*)(int, char *)`. Declaring a variable of that
//! type means placing the name where the abstract declarator leaves a
//! gap: `int (*temp4)[3]`.

/// The outermost type constructor of a spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeShape {
    Scalar,
    Pointer,
    Array,
    Function,
}

/// Split a spelling into its specifiers and its abstract declarator.
fn split(spelling: &str) -> (&str, &str) {
    match spelling.find(['*', '(', '[']) {
        Some(i) => (spelling[..i].trim_end(), spelling[i..].trim_end()),
        None => (spelling.trim(), ""),
    }
}

/// Byte offset in an abstract declarator where a name would go.
fn name_position(declarator: &str) -> usize {
    let bytes = declarator.as_bytes();
    let mut i = 0;
    loop {
        while i < bytes.len() && (bytes[i] == b'*' || bytes[i] == b' ') {
            i += 1;
        }
        let rest = &declarator[i..];
        if let Some(qualifier) = ["const", "volatile", "restrict"].iter().find(|q| rest.starts_with(*q)) {
            i += qualifier.len();
            continue;
        }
        if bytes.get(i) == Some(&b'(') {
            let inner = declarator[i + 1..].trim_start();
            if inner.starts_with('*') || inner.starts_with('(') {
                i += 1;
                continue;
            }
        }
        return i;
    }
}

pub fn shape(spelling: &str) -> TypeShape {
    let (_, declarator) = split(spelling);
    let at = name_position(declarator);
    match declarator[at..].chars().next() {
        Some('[') => TypeShape::Array,
        Some('(') => TypeShape::Function,
        _ if declarator[..at].contains('*') => TypeShape::Pointer,
        _ => TypeShape::Scalar,
    }
}

/// Specifiers without their qualifiers, for `void` checks.
fn unqualified_base(spelling: &str) -> String {
    split(spelling)
        .0
        .split_whitespace()
        .filter(|w| !matches!(*w, "const" | "volatile"))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn is_void(spelling: &str) -> bool {
    shape(spelling) == TypeShape::Scalar && unqualified_base(spelling) == "void"
}

/// True if a value of this type can be copied into a temporary and
/// reported: not an array, a function, `void`, or a type with no name.
pub fn is_capturable(spelling: &str) -> bool {
    let spelling = spelling.trim();
    !spelling.is_empty()
        && matches!(shape(spelling), TypeShape::Scalar | TypeShape::Pointer)
        && !is_void(spelling)
        && !is_unnamed(spelling)
}

/// Types spelled with a location instead of a tag, which cannot be named
/// in generated code.
pub fn is_unnamed(spelling: &str) -> bool {
    spelling.contains("(anonymous") || spelling.contains("(unnamed")
}

/// The pointer type an array of this type converts to; other types are
/// returned unchanged.
pub fn decay(spelling: &str) -> String {
    if shape(spelling) != TypeShape::Array {
        return spelling.trim().to_string();
    }
    let (base, declarator) = split(spelling);
    let at = name_position(declarator);
    let (before, after) = declarator.split_at(at);
    let rest = match after.find(']') {
        Some(close) => &after[close + 1..],
        None => "",
    };
    let decayed = if rest.starts_with('[') {
        format!("{}(*){}", before, rest)
    } else {
        format!("{}*{}", before, rest)
    };
    format!("{} {}", base, decayed)
}

/// Drop a `const` that applies to the value itself, so the temporary
/// can be assigned after its declaration.
pub fn strip_top_level_const(spelling: &str) -> String {
    let spelling = spelling.trim();
    match shape(spelling) {
        TypeShape::Scalar => spelling.strip_prefix("const ").unwrap_or(spelling).to_string(),
        TypeShape::Pointer => {
            let (base, declarator) = split(spelling);
            let at = name_position(declarator);
            let (before, after) = declarator.split_at(at);
            match before.trim_end().strip_suffix("const") {
                Some(kept) => format!("{} {}{}", base, kept.trim_end(), after),
                None => spelling.to_string(),
            }
        }
        _ => spelling.to_string(),
    }
}

fn insert_name(declarator: &str, name: &str) -> String {
    let at = name_position(declarator);
    let (before, after) = declarator.split_at(at);
    let gap = if before.ends_with(|c: char| c.is_ascii_alphanumeric()) {
        " "
    } else {
        ""
    };
    format!("{}{}{}{}", before, gap, name, after)
}

/// Declaration of a block temporary named `name` that can hold a value
/// of type `spelling`, without the trailing `;`.
pub fn temporary(spelling: &str, name: &str) -> String {
    let declared = strip_top_level_const(&decay(spelling));
    let (base, declarator) = split(&declared);
    format!("{} {}", base, insert_name(declarator, name))
}

/// Declarator of a read-back temporary for a variable of type `spelling`,
/// for use as one more declarator of the variable's own declaration.
///
/// The temporary shares the declaration's specifiers, so only the
/// declarator part is produced: `*temp2` for `int *`, `(*temp2)(int)`
/// for `int (*)(int)`, and arrays as the pointers they convert to.
pub fn read_back(spelling: &str, name: &str) -> String {
    let decayed = decay(spelling);
    insert_name(split(&decayed).1, name)
}

#[cfg(test)]
mod tests {
    use super::*;

    mod shapes {
        use super::*;

        #[test]
        fn outermost_constructor() {
            assert_eq!(shape("int"), TypeShape::Scalar);
            assert_eq!(shape("struct point"), TypeShape::Scalar);
            assert_eq!(shape("const char *"), TypeShape::Pointer);
            assert_eq!(shape("int *const"), TypeShape::Pointer);
            assert_eq!(shape("int [3]"), TypeShape::Array);
            assert_eq!(shape("char *[4]"), TypeShape::Array);
            assert_eq!(shape("int (*)[3]"), TypeShape::Pointer);
            assert_eq!(shape("int (int, char *)"), TypeShape::Function);
            assert_eq!(shape("int (*)(int)"), TypeShape::Pointer);
            assert_eq!(shape("int (*[2])(int)"), TypeShape::Array);
        }

        #[test]
        fn capturable_values() {
            assert!(is_capturable("int"));
            assert!(is_capturable("double *"));
            assert!(is_capturable("struct point"));
            assert!(!is_capturable("void"));
            assert!(!is_capturable("const void"));
            assert!(is_capturable("void *"));
            assert!(!is_capturable("char [6]"));
            assert!(!is_capturable("int (void)"));
            assert!(!is_capturable(""));
            assert!(!is_capturable("struct (anonymous at a.c:1:1)"));
        }
    }

    mod declarations {
        use super::*;

        #[test]
        fn block_temporaries() {
            assert_eq!(temporary("int", "temp0"), "int temp0");
            assert_eq!(temporary("unsigned long", "temp1"), "unsigned long temp1");
            assert_eq!(temporary("const int", "temp2"), "int temp2");
            assert_eq!(temporary("const char *", "temp3"), "const char *temp3");
            assert_eq!(temporary("char *const", "temp4"), "char *temp4");
            assert_eq!(temporary("int (*)(int, int)", "temp5"), "int (*temp5)(int, int)");
            assert_eq!(temporary("int [3]", "temp6"), "int *temp6");
            assert_eq!(temporary("int [2][3]", "temp7"), "int (*temp7)[3]");
            assert_eq!(temporary("struct point", "temp8"), "struct point temp8");
        }

        #[test]
        fn read_back_declarators() {
            assert_eq!(read_back("int", "temp0"), "temp0");
            assert_eq!(read_back("int *", "temp1"), "*temp1");
            assert_eq!(read_back("char **", "temp2"), "**temp2");
            assert_eq!(read_back("int [3]", "temp3"), "*temp3");
            assert_eq!(read_back("char *[4]", "temp4"), "**temp4");
            assert_eq!(read_back("int (*)(int)", "temp5"), "(*temp5)(int)");
            assert_eq!(read_back("int *const", "temp6"), "*const temp6");
        }

        #[test]
        fn decay_keeps_inner_dimensions() {
            assert_eq!(decay("int [3]"), "int *");
            assert_eq!(decay("int [2][3]"), "int (*)[3]");
            assert_eq!(decay("int (*[2])(int)"), "int (**)(int)");
            assert_eq!(decay("double"), "double");
        }
    }
}
