//! End-to-end tests running whole programs through the parser and the type
//! checker, exercising user-defined types, subtyping and type-case dispatch
//! the way source programs actually use them.

use pretty_assertions::assert_eq;
use union_lang::{check_source, parse_program, LangError, TExp, TypeError};

fn check(source: &str) -> Result<TExp, TypeError> {
    let program = parse_program(source).unwrap();
    union_lang::check_program(&program)
}

const SHAPES: &str = r#"
    (define-type Shape
      (Circle (radius : number))
      (Square (side : number)))
"#;

#[test]
fn test_shape_area_with_type_case() {
    let source = format!(
        r#"{SHAPES}
        (define (area : (Shape -> number))
          (lambda ((s : Shape)) : number
            (type-case Shape s
              (Circle (r) (* 3 (* r r)))
              (Square (e) (* e e)))))
        (area (make-Circle 2))
        "#
    );
    assert_eq!(check(&source), Ok(TExp::Num));
}

#[test]
fn test_record_value_flows_into_union_parameter() {
    let source = format!(
        r#"{SHAPES}
        (define (describe : (Shape -> string))
          (lambda ((s : Shape)) : string
            (type-case Shape s
              (Circle (r) "round")
              (Square (e) "angular"))))
        (describe (make-Square 4))
        "#
    );
    assert_eq!(check(&source), Ok(TExp::Str));
}

#[test]
fn test_union_value_rejected_where_record_expected() {
    let source = format!(
        r#"{SHAPES}
        (define (circle-radius : (Circle -> number))
          (lambda ((c : Circle)) : number 1))
        (define (s : Shape) (make-Circle 1))
        (circle-radius s)
        "#
    );
    assert!(matches!(check(&source), Err(TypeError::TypeMismatch { .. })));
}

#[test]
fn test_if_branches_unify_through_union() {
    let source = format!(
        r#"{SHAPES}
        (if (> 1 2) (make-Circle 1) (make-Square 2))
        "#
    );
    assert_eq!(check(&source), Ok(TExp::NameRef("Shape".to_string())));
}

#[test]
fn test_if_branches_without_common_ancestor_fail() {
    let source = format!(
        r#"{SHAPES}
        (define-type Color (Red) (Blue))
        (if (> 1 2) (make-Circle 1) (make-Red))
        "#
    );
    assert!(matches!(
        check(&source),
        Err(TypeError::UncoverableUnion { .. })
    ));
}

#[test]
fn test_recursive_list_type() {
    let source = r#"
        (define-type IntList
          (EmptyList)
          (Cons (first : number) (rest : IntList)))
        (define (sum : (IntList -> number))
          (lambda ((lst : IntList)) : number
            (type-case IntList lst
              (EmptyList () 0)
              (Cons (x rest) (+ x (sum rest))))))
        (sum (make-Cons 1 (make-Cons 2 (make-EmptyList))))
    "#;
    assert_eq!(check(source), Ok(TExp::Num));
}

#[test]
fn test_recursive_type_without_base_case_rejected() {
    let source = "(define-type Stream (SCons (head : number) (tail : Stream)))";
    assert_eq!(
        check(source),
        Err(TypeError::InvalidUdt("Stream".to_string()))
    );
}

#[test]
fn test_type_case_must_be_exhaustive() {
    let source = format!(
        r#"{SHAPES}
        (define (s : Shape) (make-Circle 1))
        (type-case Shape s
          (Circle (r) r))
        "#
    );
    assert_eq!(
        check(&source),
        Err(TypeError::InvalidTypeCase("Shape".to_string()))
    );
}

#[test]
fn test_type_case_clause_binds_fields_in_order() {
    // Cons binds (first rest); using rest as a number must fail.
    let source = r#"
        (define-type IntList
          (EmptyList)
          (Cons (first : number) (rest : IntList)))
        (define (lst : IntList) (make-EmptyList))
        (type-case IntList lst
          (EmptyList () 0)
          (Cons (x rest) (+ x rest)))
    "#;
    assert!(matches!(check(source), Err(TypeError::TypeMismatch { .. })));
}

#[test]
fn test_synthesized_predicates_are_usable() {
    let source = format!(
        r#"{SHAPES}
        (define (s : Shape) (make-Circle 1))
        (if (Circle? s) 1 2)
        "#
    );
    assert_eq!(check(&source), Ok(TExp::Num));
}

#[test]
fn test_constructor_arity_is_checked() {
    let source = format!("{SHAPES} (make-Circle 1 2)");
    assert!(matches!(
        check(&source),
        Err(TypeError::ArityMismatch { .. })
    ));
}

#[test]
fn test_constructor_field_types_are_checked() {
    let source = format!("{SHAPES} (make-Circle #t)");
    assert!(matches!(check(&source), Err(TypeError::TypeMismatch { .. })));
}

#[test]
fn test_higher_order_procedures() {
    let source = r#"
        (define (twice : ((number -> number) * number -> number))
          (lambda ((f : (number -> number)) (x : number)) : number
            (f (f x))))
        (twice (lambda ((n : number)) : number (+ n 1)) 5)
    "#;
    assert_eq!(check(source), Ok(TExp::Num));
}

#[test]
fn test_thunks_take_no_arguments() {
    let source = r#"
        (define (make-counter : (Empty -> number))
          (lambda () : number 0))
        (make-counter)
    "#;
    assert_eq!(check(source), Ok(TExp::Num));
}

#[test]
fn test_letrec_over_user_defined_types() {
    let source = r#"
        (define-type IntList
          (EmptyList)
          (Cons (first : number) (rest : IntList)))
        (letrec (((len : (IntList -> number))
                  (lambda ((lst : IntList)) : number
                    (type-case IntList lst
                      (EmptyList () 0)
                      (Cons (x rest) (+ 1 (len rest)))))))
          (len (make-EmptyList)))
    "#;
    assert_eq!(check(source), Ok(TExp::Num));
}

#[test]
fn test_display_and_sequencing() {
    let source = r#"
        (define (x : number) 42)
        (display x)
        (newline)
        x
    "#;
    assert_eq!(check(source), Ok(TExp::Num));
}

#[test]
fn test_shared_record_across_unions() {
    // Dot is a case of both Pixel and Glyph with identical fields; values
    // of it are accepted where either union is expected.
    let source = r#"
        (define-type Pixel (Dot (x : number) (y : number)))
        (define-type Glyph (Dot (x : number) (y : number)) (Bar (w : number)))
        (define (p : Pixel) (make-Dot 1 2))
        (define (g : Glyph) (make-Dot 3 4))
        g
    "#;
    assert_eq!(check(source), Ok(TExp::NameRef("Glyph".to_string())));
}

#[test]
fn test_conflicting_record_redeclaration_rejected() {
    let source = r#"
        (define-type Pixel (Dot (x : number)))
        (define-type Glyph (Dot (x : boolean)))
        1
    "#;
    assert_eq!(check(source), Err(TypeError::InvalidUdt("Dot".to_string())));
}

#[test]
fn test_check_source_reports_parse_and_type_errors() {
    assert_eq!(check_source("(+ 1 2)"), Ok("number".to_string()));
    assert!(matches!(
        check_source("(+ 1"),
        Err(LangError::Parse(_))
    ));
    assert!(matches!(
        check_source("(+ 1 #t)"),
        Err(LangError::Type(TypeError::TypeMismatch { .. }))
    ));
}

#[test]
fn test_error_messages_render_types_and_expressions() {
    let err = check("(if (> 1 2) (+ 1 1) \"a\")").unwrap_err();
    let message = err.to_string();
    assert!(message.contains("number"), "message: {message}");
    assert!(message.contains("string"), "message: {message}");
}
