//! Total order over terms, used to enumerate type candidates deterministically.
//!
//! Host types come first, ranked by category: primitive numerics by width and signedness,
//! then the other primitives, strings, enums, value types, classes, interfaces and the rest.
//! Within a rank deeper types come first, so a derived type precedes its bases, and names break
//! the remaining ties. Other terms follow, grouped by variant and then by their printed form.

use std::cmp::Ordering;

use crate::{
    expr::{
        Expr, ExprKind,
        pretty::{PrettyExpr, PrettyMode},
    },
    host::{HostType, TypeCategory},
};

fn primitive_rank(name: &str) -> u8 {
    match name {
        "u8" => 10,
        "i16" => 11,
        "i32" => 12,
        "i64" => 13,
        "i8" => 20,
        "u16" => 21,
        "u32" => 22,
        "u64" => 23,
        "bool" => 30,
        "char" => 31,
        "f32" => 32,
        "f64" => 33,
        _ => 39,
    }
}

fn rank(ty: &HostType) -> u8 {
    match ty.category() {
        TypeCategory::Primitive => primitive_rank(ty.name()),
        TypeCategory::String => 40,
        TypeCategory::Enum => 50,
        TypeCategory::Value => 60,
        TypeCategory::Class => 70,
        TypeCategory::Interface => 80,
        TypeCategory::Other => 90,
    }
}

/// Order two host types.
///
/// A derived type is strictly deeper than each of its bases, so comparing depths (deepest
/// first) puts the more specific of two related types first while staying transitive.
pub fn compare_types(lhs: &HostType, rhs: &HostType) -> Ordering {
    rank(lhs)
        .cmp(&rank(rhs))
        .then_with(|| rhs.depth().cmp(&lhs.depth()))
        .then_with(|| lhs.name().cmp(rhs.name()))
}

/// Order two terms; see the module documentation.
pub fn compare_terms(lhs: &Expr, rhs: &Expr) -> Ordering {
    match (lhs.kind(), rhs.kind()) {
        (ExprKind::Type(lt), ExprKind::Type(rt)) => compare_types(lt, rt),
        (ExprKind::Placeholder(li), ExprKind::Placeholder(ri)) => li.cmp(ri),
        _ => lhs.expr_type().cmp(&rhs.expr_type()).then_with(|| {
            lhs.pretty_string(PrettyMode::Minimum)
                .cmp(&rhs.pretty_string(PrettyMode::Minimum))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{type_term, variable};
    use crate::host::builtin;

    #[test]
    fn numerics_before_classes() {
        let mut terms = vec![
            type_term(builtin::OBJECT.clone()),
            type_term(builtin::F64.clone()),
            type_term(builtin::STRING.clone()),
            variable("x"),
            type_term(builtin::U8.clone()),
            type_term(builtin::NUMERIC.clone()),
        ];
        terms.sort_by(compare_terms);
        let names: Vec<String> = terms
            .iter()
            .map(|t| t.pretty_string(PrettyMode::Minimum))
            .collect();
        assert_eq!(names, vec!["u8", "f64", "string", "object", "Numeric", "x"]);
    }
}
