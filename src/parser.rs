//! # Parser Module
//!
//! The parser transforms Union Language source text into an Abstract Syntax
//! Tree. The surface syntax is s-expressions, so the parser works token-at-
//! a-time over the input string with nom combinators, backtracking between
//! the special forms (`define`, `define-type`, `if`, `lambda`, `let`,
//! `letrec`, `set!`, `quote`, `type-case`) and plain application.
//!
//! Type annotations are parsed into [`TExp`] values here as well; the
//! annotation grammar is
//!
//! ```text
//! texp ::= number | boolean | string | void | any | literal
//!        | Name                      ; user-defined type / record reference
//!        | (texp * ... * texp -> texp)
//!        | (Empty -> texp)
//! ```
//!
//! Whether a `Name` annotation actually resolves to a declared type is a
//! checking-time question; the parser produces [`TExp::NameRef`] unconditionally.
//!
//! ## Example
//!
//! ```rust
//! use union_lang::parser::parse_program;
//!
//! let program = parse_program("(define (x : number) 42) (+ x 1)").unwrap();
//! assert_eq!(program.exps.len(), 2);
//! ```

use nom::{
    IResult,
    branch::alt,
    combinator::map,
    multi::{many0, many1, separated_list1},
    sequence::{delimited, preceded, tuple},
};
use thiserror::Error;

use crate::ast::*;
use crate::lexer::{lex_token, skip, Token};
use crate::texp::{Field, Record, TExp, UserDefinedTExp};

/// Errors produced while parsing source text.
#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("Syntax error near: {0}")]
    Syntax(String),

    #[error("Unexpected trailing input: {0}")]
    Trailing(String),
}

/// Primitive operator names with fixed signatures in the type checker.
pub const PRIMITIVES: &[&str] = &[
    "+", "-", "*", "/", "<", ">", "=", "and", "or", "not", "eq?", "number?",
    "boolean?", "string?", "display", "newline",
];

/// Type alias for parser results.
type ParseResult<'a, T> = IResult<&'a str, T>;

/// Expects a specific token and consumes it.
///
/// Returns an error with the original input to allow backtracking.
fn expect_token<'a>(expected: Token) -> impl Fn(&'a str) -> ParseResult<'a, ()> {
    move |input| {
        let original_input = input;
        let (input, token) = lex_token(input)?;
        if token == expected {
            Ok((input, ()))
        } else {
            Err(nom::Err::Error(nom::error::Error::new(
                original_input,
                nom::error::ErrorKind::Tag,
            )))
        }
    }
}

/// Expects a specific identifier (used for special-form keywords).
fn keyword<'a>(name: &'static str) -> impl Fn(&'a str) -> ParseResult<'a, ()> {
    move |input| {
        let original_input = input;
        let (input, token) = lex_token(input)?;
        match token {
            Token::Ident(ref id) if id == name => Ok((input, ())),
            _ => Err(nom::Err::Error(nom::error::Error::new(
                original_input,
                nom::error::ErrorKind::Tag,
            ))),
        }
    }
}

/// Parses an identifier.
fn ident(input: &str) -> ParseResult<String> {
    let original_input = input;
    let (input, token) = lex_token(input)?;
    match token {
        Token::Ident(name) => Ok((input, name)),
        _ => Err(nom::Err::Error(nom::error::Error::new(
            original_input,
            nom::error::ErrorKind::Tag,
        ))),
    }
}

/// Maps a bare type name to its primitive type, or a name reference.
fn texp_from_name(name: &str) -> TExp {
    match name {
        "number" => TExp::Num,
        "boolean" => TExp::Bool,
        "string" => TExp::Str,
        "void" => TExp::Void,
        "literal" => TExp::Lit,
        "any" => TExp::Any,
        _ => TExp::NameRef(name.to_string()),
    }
}

/// Parses a type annotation.
///
/// Compound annotations are procedure types: `(number * number -> boolean)`.
/// Zero-parameter procedures are written `(Empty -> T)`.
fn texp(input: &str) -> ParseResult<TExp> {
    let original_input = input;
    let (input, token) = lex_token(input)?;
    match token {
        Token::Ident(name) => Ok((input, texp_from_name(&name))),
        Token::LParen => {
            let (input, params) = separated_list1(keyword("*"), texp)(input)?;
            let (input, _) = keyword("->")(input)?;
            let (input, ret) = texp(input)?;
            let (input, _) = expect_token(Token::RParen)(input)?;
            let params = match params.as_slice() {
                [TExp::NameRef(name)] if name == "Empty" => vec![],
                _ => params,
            };
            Ok((input, TExp::proc(params, ret)))
        }
        _ => Err(nom::Err::Error(nom::error::Error::new(
            original_input,
            nom::error::ErrorKind::Tag,
        ))),
    }
}

/// Parses the public entry for a standalone type annotation.
pub fn parse_texp(input: &str) -> Result<TExp, ParseError> {
    match texp(input) {
        Ok((rest, t)) => {
            let (rest, _) = skip(rest).map_err(to_parse_error)?;
            if rest.is_empty() {
                Ok(t)
            } else {
                Err(ParseError::Trailing(snippet(rest)))
            }
        }
        Err(e) => Err(to_parse_error(e)),
    }
}

/// Parses a typed variable declaration: `(x : number)`.
fn var_decl(input: &str) -> ParseResult<VarDecl> {
    map(
        delimited(
            expect_token(Token::LParen),
            tuple((ident, expect_token(Token::Colon), texp)),
            expect_token(Token::RParen),
        ),
        |(var, _, texp)| VarDecl { var, texp },
    )(input)
}

/// Parses quoted literal data (the datum after `'` or inside `(quote ...)`).
fn sexp_value(input: &str) -> ParseResult<SExpValue> {
    let original_input = input;
    let (input, token) = lex_token(input)?;
    match token {
        Token::NumLit(n) => Ok((input, SExpValue::Number(n))),
        Token::BoolLit(b) => Ok((input, SExpValue::Boolean(b))),
        Token::StrLit(s) => Ok((input, SExpValue::String(s))),
        Token::Ident(name) => Ok((input, SExpValue::Symbol(name))),
        Token::LParen => {
            let (input, items) = many0(sexp_value)(input)?;
            let (input, _) = expect_token(Token::RParen)(input)?;
            Ok((input, SExpValue::List(items)))
        }
        _ => Err(nom::Err::Error(nom::error::Error::new(
            original_input,
            nom::error::ErrorKind::Tag,
        ))),
    }
}

/// Parses atomic expressions: literals, primitive operators, variables.
fn atomic(input: &str) -> ParseResult<CExp> {
    let original_input = input;
    let (input, token) = lex_token(input)?;
    match token {
        Token::NumLit(n) => Ok((input, CExp::NumLit(n))),
        Token::BoolLit(b) => Ok((input, CExp::BoolLit(b))),
        Token::StrLit(s) => Ok((input, CExp::StrLit(s))),
        Token::Ident(name) => {
            if PRIMITIVES.contains(&name.as_str()) {
                Ok((input, CExp::PrimOp(name)))
            } else {
                Ok((input, CExp::VarRef(name)))
            }
        }
        _ => Err(nom::Err::Error(nom::error::Error::new(
            original_input,
            nom::error::ErrorKind::Tag,
        ))),
    }
}

/// Parses `'datum`.
fn quoted(input: &str) -> ParseResult<CExp> {
    map(preceded(expect_token(Token::Quote), sexp_value), CExp::Lit)(input)
}

/// Parses `(quote datum)`.
fn quote_form(input: &str) -> ParseResult<CExp> {
    map(
        delimited(
            expect_token(Token::LParen),
            preceded(keyword("quote"), sexp_value),
            expect_token(Token::RParen),
        ),
        CExp::Lit,
    )(input)
}

/// Parses `(if test then else)`.
fn if_exp(input: &str) -> ParseResult<CExp> {
    map(
        delimited(
            expect_token(Token::LParen),
            preceded(keyword("if"), tuple((cexp, cexp, cexp))),
            expect_token(Token::RParen),
        ),
        |(test, then, alt)| {
            CExp::If(IfExp {
                test: Box::new(test),
                then: Box::new(then),
                alt: Box::new(alt),
            })
        },
    )(input)
}

/// Parses `(lambda ((x : T) ...) : T body ...)`.
fn lambda_exp(input: &str) -> ParseResult<CExp> {
    map(
        delimited(
            expect_token(Token::LParen),
            preceded(
                keyword("lambda"),
                tuple((
                    delimited(
                        expect_token(Token::LParen),
                        many0(var_decl),
                        expect_token(Token::RParen),
                    ),
                    preceded(expect_token(Token::Colon), texp),
                    many1(cexp),
                )),
            ),
            expect_token(Token::RParen),
        ),
        |(params, ret, body)| CExp::Proc(ProcExp { params, ret, body }),
    )(input)
}

/// Parses a single `let`/`letrec` binding: `((x : T) value)`.
fn binding(input: &str) -> ParseResult<Binding> {
    map(
        delimited(
            expect_token(Token::LParen),
            tuple((var_decl, cexp)),
            expect_token(Token::RParen),
        ),
        |(var, val)| Binding {
            var,
            val: Box::new(val),
        },
    )(input)
}

fn bindings_and_body(input: &str) -> ParseResult<(Vec<Binding>, Vec<CExp>)> {
    tuple((
        delimited(
            expect_token(Token::LParen),
            many0(binding),
            expect_token(Token::RParen),
        ),
        many1(cexp),
    ))(input)
}

/// Parses `(let (bindings ...) body ...)`.
fn let_exp(input: &str) -> ParseResult<CExp> {
    map(
        delimited(
            expect_token(Token::LParen),
            preceded(keyword("let"), bindings_and_body),
            expect_token(Token::RParen),
        ),
        |(bindings, body)| CExp::Let(LetExp { bindings, body }),
    )(input)
}

/// Parses `(letrec (bindings ...) body ...)`.
fn letrec_exp(input: &str) -> ParseResult<CExp> {
    map(
        delimited(
            expect_token(Token::LParen),
            preceded(keyword("letrec"), bindings_and_body),
            expect_token(Token::RParen),
        ),
        |(bindings, body)| CExp::Letrec(LetrecExp { bindings, body }),
    )(input)
}

/// Parses `(set! x value)`.
fn set_exp(input: &str) -> ParseResult<CExp> {
    map(
        delimited(
            expect_token(Token::LParen),
            preceded(keyword("set!"), tuple((ident, cexp))),
            expect_token(Token::RParen),
        ),
        |(var, val)| {
            CExp::Set(SetExp {
                var,
                val: Box::new(val),
            })
        },
    )(input)
}

/// Parses a `type-case` clause: `(Circle (r) body ...)`.
fn case_exp(input: &str) -> ParseResult<CaseExp> {
    map(
        delimited(
            expect_token(Token::LParen),
            tuple((
                ident,
                delimited(
                    expect_token(Token::LParen),
                    many0(ident),
                    expect_token(Token::RParen),
                ),
                many1(cexp),
            )),
            expect_token(Token::RParen),
        ),
        |(name, var_names, body)| CaseExp {
            name,
            var_names,
            body,
        },
    )(input)
}

/// Parses `(type-case Name value clauses ...)`.
fn type_case_exp(input: &str) -> ParseResult<CExp> {
    map(
        delimited(
            expect_token(Token::LParen),
            preceded(keyword("type-case"), tuple((ident, cexp, many1(case_exp)))),
            expect_token(Token::RParen),
        ),
        |(type_name, dispatch, cases)| {
            CExp::TypeCase(TypeCaseExp {
                type_name,
                dispatch: Box::new(dispatch),
                cases,
            })
        },
    )(input)
}

/// Parses a procedure application `(rator rand ...)`.
fn app_exp(input: &str) -> ParseResult<CExp> {
    map(
        delimited(
            expect_token(Token::LParen),
            tuple((cexp, many0(cexp))),
            expect_token(Token::RParen),
        ),
        |(rator, rands)| {
            CExp::App(AppExp {
                rator: Box::new(rator),
                rands,
            })
        },
    )(input)
}

/// Parses any expression. Special forms are tried before application.
fn cexp(input: &str) -> ParseResult<CExp> {
    alt((
        atomic,
        quoted,
        quote_form,
        if_exp,
        lambda_exp,
        let_exp,
        letrec_exp,
        set_exp,
        type_case_exp,
        app_exp,
    ))(input)
}

/// Parses a record field declaration: `(radius : number)`.
fn field_decl(input: &str) -> ParseResult<Field> {
    map(
        delimited(
            expect_token(Token::LParen),
            tuple((ident, expect_token(Token::Colon), texp)),
            expect_token(Token::RParen),
        ),
        |(name, _, texp)| Field { name, texp },
    )(input)
}

/// Parses a record case declaration: `(Circle (radius : number))`.
fn record_decl(input: &str) -> ParseResult<Record> {
    map(
        delimited(
            expect_token(Token::LParen),
            tuple((ident, many0(field_decl))),
            expect_token(Token::RParen),
        ),
        |(name, fields)| Record { name, fields },
    )(input)
}

/// Parses `(define (x : T) value)`.
fn define_exp(input: &str) -> ParseResult<Exp> {
    map(
        delimited(
            expect_token(Token::LParen),
            preceded(keyword("define"), tuple((var_decl, cexp))),
            expect_token(Token::RParen),
        ),
        |(var, val)| {
            Exp::Define(DefineExp {
                var,
                val: Box::new(val),
            })
        },
    )(input)
}

/// Parses `(define-type Name records ...)`.
fn define_type_exp(input: &str) -> ParseResult<Exp> {
    map(
        delimited(
            expect_token(Token::LParen),
            preceded(keyword("define-type"), tuple((ident, many1(record_decl)))),
            expect_token(Token::RParen),
        ),
        |(name, records)| Exp::DefineType(UserDefinedTExp { name, records }),
    )(input)
}

/// Parses a top-level expression.
fn exp(input: &str) -> ParseResult<Exp> {
    alt((define_exp, define_type_exp, map(cexp, Exp::Cexp)))(input)
}

fn snippet(input: &str) -> String {
    let trimmed = input.trim_start();
    trimmed.chars().take(40).collect()
}

fn to_parse_error(err: nom::Err<nom::error::Error<&str>>) -> ParseError {
    match err {
        nom::Err::Error(e) | nom::Err::Failure(e) => ParseError::Syntax(snippet(e.input)),
        nom::Err::Incomplete(_) => ParseError::Syntax("<incomplete input>".to_string()),
    }
}

/// Parses a whole program: one or more top-level expressions.
pub fn parse_program(input: &str) -> Result<Program, ParseError> {
    match many1(exp)(input) {
        Ok((rest, exps)) => {
            let (rest, _) = skip(rest).map_err(to_parse_error)?;
            if rest.is_empty() {
                Ok(Program { exps })
            } else {
                Err(ParseError::Trailing(snippet(rest)))
            }
        }
        Err(e) => Err(to_parse_error(e)),
    }
}

/// Parses a single expression (convenience entry used by tests).
pub fn parse_exp(input: &str) -> Result<Exp, ParseError> {
    match exp(input) {
        Ok((rest, exp)) => {
            let (rest, _) = skip(rest).map_err(to_parse_error)?;
            if rest.is_empty() {
                Ok(exp)
            } else {
                Err(ParseError::Trailing(snippet(rest)))
            }
        }
        Err(e) => Err(to_parse_error(e)),
    }
}
