//! Elementary QBasic types and the numeric widening rules.
//!
//! Both the compiler (type checking, symbol declaration) and the executor
//! (value coercion, built-in signatures) speak in terms of [`TypeSpec`],
//! so it lives in the runtime crate.

use serde::{Deserialize, Serialize};

/// Bounds of one array dimension, `lower TO upper` inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimSpec {
    pub lower: i64,
    pub upper: i64,
}

impl DimSpec {
    pub fn new(lower: i64, upper: i64) -> Self {
        Self { lower, upper }
    }
}

/// An elementary QBasic type, or an array of one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TypeSpec {
    Integer,
    Long,
    Single,
    Double,
    String,
    Array {
        element: Box<TypeSpec>,
        dims: Vec<DimSpec>,
    },
}

/// Pairwise numeric widening, written out as data so the rules can be read
/// off directly. Symmetric; missing pairs are looked up flipped.
const WIDEN_TABLE: &[(TypeSpec, TypeSpec, TypeSpec)] = &[
    (TypeSpec::Integer, TypeSpec::Integer, TypeSpec::Integer),
    (TypeSpec::Integer, TypeSpec::Long, TypeSpec::Long),
    (TypeSpec::Integer, TypeSpec::Single, TypeSpec::Single),
    (TypeSpec::Integer, TypeSpec::Double, TypeSpec::Double),
    (TypeSpec::Long, TypeSpec::Long, TypeSpec::Long),
    (TypeSpec::Long, TypeSpec::Single, TypeSpec::Single),
    (TypeSpec::Long, TypeSpec::Double, TypeSpec::Double),
    (TypeSpec::Single, TypeSpec::Single, TypeSpec::Single),
    (TypeSpec::Single, TypeSpec::Double, TypeSpec::Double),
    (TypeSpec::Double, TypeSpec::Double, TypeSpec::Double),
];

impl TypeSpec {
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            TypeSpec::Integer | TypeSpec::Long | TypeSpec::Single | TypeSpec::Double
        )
    }

    pub fn is_string(&self) -> bool {
        matches!(self, TypeSpec::String)
    }

    pub fn is_elementary(&self) -> bool {
        !matches!(self, TypeSpec::Array { .. })
    }

    pub fn is_array(&self) -> bool {
        matches!(self, TypeSpec::Array { .. })
    }

    /// Two elementary types are compatible when both are numeric or both
    /// are strings.
    pub fn are_matching_elementary(a: &TypeSpec, b: &TypeSpec) -> bool {
        (a.is_numeric() && b.is_numeric()) || (a.is_string() && b.is_string())
    }

    /// The result type of a binary numeric operation, per the widening
    /// table. `None` when either side is not numeric.
    pub fn widen(a: &TypeSpec, b: &TypeSpec) -> Option<TypeSpec> {
        for (x, y, result) in WIDEN_TABLE {
            if (x == a && y == b) || (x == b && y == a) {
                return Some(result.clone());
            }
        }
        None
    }

    /// Widening for `/`: the result floor is Single, so two integral
    /// operands still divide as floating point.
    pub fn widen_for_divide(a: &TypeSpec, b: &TypeSpec) -> Option<TypeSpec> {
        match TypeSpec::widen(a, b)? {
            TypeSpec::Integer | TypeSpec::Long => Some(TypeSpec::Single),
            other => Some(other),
        }
    }

    /// The elementary type declared by a name sigil.
    pub fn from_sigil(sigil: char) -> Option<TypeSpec> {
        match sigil {
            '%' => Some(TypeSpec::Integer),
            '&' => Some(TypeSpec::Long),
            '!' => Some(TypeSpec::Single),
            '#' => Some(TypeSpec::Double),
            '$' => Some(TypeSpec::String),
            _ => None,
        }
    }

    /// The type a bare identifier declares: its sigil if present,
    /// Single otherwise.
    pub fn from_name(name: &str) -> TypeSpec {
        name.chars()
            .last()
            .and_then(TypeSpec::from_sigil)
            .unwrap_or(TypeSpec::Single)
    }

    /// An array type with unspecified bounds, used for built-in
    /// signatures that accept any array.
    pub fn any_array() -> TypeSpec {
        TypeSpec::Array {
            element: Box::new(TypeSpec::Single),
            dims: Vec::new(),
        }
    }

    /// Display name for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            TypeSpec::Integer => "INTEGER",
            TypeSpec::Long => "LONG",
            TypeSpec::Single => "SINGLE",
            TypeSpec::Double => "DOUBLE",
            TypeSpec::String => "STRING",
            TypeSpec::Array { .. } => "ARRAY",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_widens_with_single_to_single() {
        assert_eq!(
            TypeSpec::widen(&TypeSpec::Integer, &TypeSpec::Single),
            Some(TypeSpec::Single)
        );
    }

    #[test]
    fn long_widens_with_single_to_single() {
        assert_eq!(
            TypeSpec::widen(&TypeSpec::Long, &TypeSpec::Single),
            Some(TypeSpec::Single)
        );
    }

    #[test]
    fn anything_with_double_is_double() {
        for t in [TypeSpec::Integer, TypeSpec::Long, TypeSpec::Single, TypeSpec::Double] {
            assert_eq!(
                TypeSpec::widen(&t, &TypeSpec::Double),
                Some(TypeSpec::Double)
            );
        }
    }

    #[test]
    fn widen_is_symmetric() {
        assert_eq!(
            TypeSpec::widen(&TypeSpec::Single, &TypeSpec::Integer),
            TypeSpec::widen(&TypeSpec::Integer, &TypeSpec::Single)
        );
    }

    #[test]
    fn widen_rejects_strings() {
        assert_eq!(TypeSpec::widen(&TypeSpec::String, &TypeSpec::Integer), None);
    }

    #[test]
    fn widen_is_associative_left_to_right() {
        let types = [TypeSpec::Integer, TypeSpec::Long, TypeSpec::Single, TypeSpec::Double];
        for a in &types {
            for b in &types {
                for c in &types {
                    let left = TypeSpec::widen(&TypeSpec::widen(a, b).unwrap(), c);
                    let right = TypeSpec::widen(a, &TypeSpec::widen(b, c).unwrap());
                    assert_eq!(left, right, "widen not associative for {:?} {:?} {:?}", a, b, c);
                }
            }
        }
    }

    #[test]
    fn divide_widening_floors_at_single() {
        assert_eq!(
            TypeSpec::widen_for_divide(&TypeSpec::Integer, &TypeSpec::Integer),
            Some(TypeSpec::Single)
        );
        assert_eq!(
            TypeSpec::widen_for_divide(&TypeSpec::Double, &TypeSpec::Integer),
            Some(TypeSpec::Double)
        );
    }

    #[test]
    fn sigils_map_to_types() {
        assert_eq!(TypeSpec::from_sigil('%'), Some(TypeSpec::Integer));
        assert_eq!(TypeSpec::from_sigil('&'), Some(TypeSpec::Long));
        assert_eq!(TypeSpec::from_sigil('!'), Some(TypeSpec::Single));
        assert_eq!(TypeSpec::from_sigil('#'), Some(TypeSpec::Double));
        assert_eq!(TypeSpec::from_sigil('$'), Some(TypeSpec::String));
        assert_eq!(TypeSpec::from_sigil('x'), None);
    }

    #[test]
    fn unsuffixed_names_default_to_single() {
        assert_eq!(TypeSpec::from_name("count"), TypeSpec::Single);
        assert_eq!(TypeSpec::from_name("count%"), TypeSpec::Integer);
        assert_eq!(TypeSpec::from_name("title$"), TypeSpec::String);
    }

    #[test]
    fn matching_elementary_pairs() {
        assert!(TypeSpec::are_matching_elementary(&TypeSpec::Integer, &TypeSpec::Double));
        assert!(TypeSpec::are_matching_elementary(&TypeSpec::String, &TypeSpec::String));
        assert!(!TypeSpec::are_matching_elementary(&TypeSpec::String, &TypeSpec::Single));
    }

    #[test]
    fn array_type_is_not_elementary() {
        assert!(!TypeSpec::any_array().is_elementary());
        assert!(TypeSpec::any_array().is_array());
    }
}
