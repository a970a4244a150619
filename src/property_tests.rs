use quickcheck::{Arbitrary, Gen, QuickCheck};

use crate::ast::Program;
use crate::parser::{parse_program, parse_texp};
use crate::texp::TExp;
use crate::type_checker::{
    check_equal_type, check_program, compute_cover, is_subtype, most_specific, parent_chain,
};

// Random type expressions over a fixed pool of declared names, so name
// references sometimes resolve and sometimes dangle.
#[derive(Clone, Debug)]
struct AnyTExp(TExp);

impl Arbitrary for AnyTExp {
    fn arbitrary(g: &mut Gen) -> Self {
        AnyTExp(generate_texp(g, 2))
    }
}

fn generate_texp(g: &mut Gen, depth: usize) -> TExp {
    let leaf = depth == 0 || u8::arbitrary(g) % 3 != 0;
    if leaf {
        match u8::arbitrary(g) % 8 {
            0 => TExp::Num,
            1 => TExp::Bool,
            2 => TExp::Str,
            3 => TExp::Void,
            4 => TExp::Lit,
            5 => TExp::Any,
            6 => TExp::NameRef(
                g.choose(&["Shape", "Circle", "Square", "Unknown"])
                    .unwrap()
                    .to_string(),
            ),
            _ => TExp::NameRef("Color".to_string()),
        }
    } else {
        let arity = usize::arbitrary(g) % 3;
        let params = (0..arity).map(|_| generate_texp(g, depth - 1)).collect();
        TExp::proc(params, generate_texp(g, depth - 1))
    }
}

fn fixture() -> Program {
    parse_program(
        "(define-type Shape (Circle (radius : number)) (Square (side : number)))
         (define-type Color (Red) (Green) (Blue))
         1",
    )
    .unwrap()
}

// Property: type compatibility is reflexive for every type expression.
fn prop_check_equal_type_reflexive(t: AnyTExp) -> bool {
    let program = fixture();
    check_equal_type(&t.0, &t.0, "prop", &program) == Ok(t.0)
}

// Property: everything is a subtype of any.
fn prop_any_is_top(t: AnyTExp) -> bool {
    let program = fixture();
    is_subtype(&t.0, &TExp::Any, &program)
}

// Property: a parent chain always contains the covered members a cover
// computation would keep, so covers are subsets of the first chain.
fn prop_cover_subset_of_first_chain(a: AnyTExp, b: AnyTExp) -> bool {
    let program = fixture();
    let chain = parent_chain(&a.0, &program);
    compute_cover(&[a.0, b.0], &program)
        .iter()
        .all(|t| chain.contains(t))
}

// Property: the set of types in a cover does not depend on argument order.
fn prop_cover_set_commutative(a: AnyTExp, b: AnyTExp) -> bool {
    let program = fixture();
    let ab = compute_cover(&[a.0.clone(), b.0.clone()], &program);
    let ba = compute_cover(&[b.0, a.0], &program);
    ab.iter().all(|t| ba.contains(t)) && ba.iter().all(|t| ab.contains(t))
}

// Property: the most specific member of a cover is a member of it (or any,
// when the input is empty).
fn prop_most_specific_is_member(a: AnyTExp, b: AnyTExp) -> bool {
    let program = fixture();
    let cover = compute_cover(&[a.0, b.0], &program);
    let best = most_specific(&cover, &program);
    cover.is_empty() || cover.contains(&best) || best == TExp::Any
}

// Property: the rendered form of a type parses back to an equal type, for
// every type that has a surface syntax (all generated ones do).
fn prop_texp_display_round_trips(t: AnyTExp) -> bool {
    match parse_texp(&t.0.to_string()) {
        Ok(parsed) => parsed == t.0,
        Err(_) => false,
    }
}

// Property: checking is deterministic.
fn prop_checker_deterministic(t: AnyTExp) -> bool {
    let source = format!(
        "(define-type Shape (Circle (radius : number)) (Square (side : number)))
         (lambda ((x : {0})) : {0} x)",
        t.0
    );
    match parse_program(&source) {
        Ok(program) => check_program(&program) == check_program(&program),
        Err(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_equal_type_reflexive() {
        QuickCheck::new()
            .tests(200)
            .quickcheck(prop_check_equal_type_reflexive as fn(AnyTExp) -> bool);
    }

    #[test]
    fn test_any_is_top() {
        QuickCheck::new()
            .tests(200)
            .quickcheck(prop_any_is_top as fn(AnyTExp) -> bool);
    }

    #[test]
    fn test_cover_subset_of_first_chain() {
        QuickCheck::new()
            .tests(200)
            .quickcheck(prop_cover_subset_of_first_chain as fn(AnyTExp, AnyTExp) -> bool);
    }

    #[test]
    fn test_cover_set_commutative() {
        QuickCheck::new()
            .tests(200)
            .quickcheck(prop_cover_set_commutative as fn(AnyTExp, AnyTExp) -> bool);
    }

    #[test]
    fn test_most_specific_is_member() {
        QuickCheck::new()
            .tests(200)
            .quickcheck(prop_most_specific_is_member as fn(AnyTExp, AnyTExp) -> bool);
    }

    #[test]
    fn test_texp_display_round_trips() {
        QuickCheck::new()
            .tests(200)
            .quickcheck(prop_texp_display_round_trips as fn(AnyTExp) -> bool);
    }

    #[test]
    fn test_checker_deterministic() {
        QuickCheck::new()
            .tests(100)
            .quickcheck(prop_checker_deterministic as fn(AnyTExp) -> bool);
    }
}
