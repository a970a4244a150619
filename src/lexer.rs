//! # Lexer Module
//!
//! Tokenizes Union Language source code using the nom parser combinator library.
//! The surface syntax is s-expressions, so the token set is deliberately small:
//! parentheses, the quote mark, the annotation colon, and the three literal
//! kinds alongside identifiers.
//!
//! Scheme-style identifiers may contain operator characters (`+`, `-`, `*`,
//! `/`, `<`, `>`, `=`), `?`, `!`, `.` and `_`, so `eq?`, `set!`, `make-Circle`
//! and `->` all lex as plain identifiers. Disambiguation between an operator
//! identifier and a negative number literal happens here, not in the parser.
//!
//! ## Example
//!
//! ```rust
//! use union_lang::lexer::{lex, Token};
//!
//! let (rest, tokens) = lex("(+ 1 2)").unwrap();
//! assert!(rest.is_empty());
//! assert_eq!(tokens[0], Token::LParen);
//! ```

use nom::{
    IResult,
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, digit1, none_of},
    combinator::{map, opt, recognize, value, verify},
    multi::many0,
    sequence::{delimited, pair, preceded, tuple},
};
use std::fmt;

/// Token types in Union Language.
///
/// Keywords (`define`, `lambda`, `type-case`, ...) are not distinguished at
/// the lexical level; the parser recognizes them from `Ident` tokens so that
/// the same names remain usable as record or type names.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Opening parenthesis `(`
    LParen,
    /// Closing parenthesis `)`
    RParen,
    /// Quote mark `'` introducing literal data
    Quote,
    /// Annotation colon `:` as in `(x : number)`
    Colon,
    /// Boolean literal `#t` or `#f`
    BoolLit(bool),
    /// Numeric literal
    NumLit(f64),
    /// String literal
    StrLit(String),
    /// Identifier (variable, primitive operator, type or record name)
    Ident(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Quote => write!(f, "'"),
            Token::Colon => write!(f, ":"),
            Token::BoolLit(true) => write!(f, "#t"),
            Token::BoolLit(false) => write!(f, "#f"),
            Token::NumLit(n) => write!(f, "{}", n),
            Token::StrLit(s) => write!(f, "\"{}\"", s),
            Token::Ident(name) => write!(f, "{}", name),
        }
    }
}

/// Returns true for characters that may appear in an identifier.
fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric()
        || matches!(c, '+' | '-' | '*' | '/' | '<' | '>' | '=' | '?' | '!' | '.' | '_')
}

/// Skips whitespace and `;` line comments.
pub fn skip(input: &str) -> IResult<&str, ()> {
    value(
        (),
        many0(alt((
            value((), take_while1(|c: char| c.is_whitespace())),
            value((), pair(char(';'), take_while(|c| c != '\n'))),
        ))),
    )(input)
}

fn lex_number(input: &str) -> IResult<&str, Token> {
    let (rest, text) = recognize(tuple((
        opt(char('-')),
        digit1,
        opt(pair(char('.'), digit1)),
    )))(input)?;
    // "-" followed by digits is a number; a lone "-" stays an identifier.
    // A trailing identifier character (e.g. `1x`) means this is not a number.
    if rest.starts_with(is_ident_char) {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Digit,
        )));
    }
    let n: f64 = text.parse().map_err(|_| {
        nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Float))
    })?;
    Ok((rest, Token::NumLit(n)))
}

fn lex_boolean(input: &str) -> IResult<&str, Token> {
    alt((
        value(Token::BoolLit(true), tag("#t")),
        value(Token::BoolLit(false), tag("#f")),
    ))(input)
}

fn lex_string(input: &str) -> IResult<&str, Token> {
    map(
        delimited(char('"'), many0(none_of("\"")), char('"')),
        |chars: Vec<char>| Token::StrLit(chars.into_iter().collect()),
    )(input)
}

fn lex_ident(input: &str) -> IResult<&str, Token> {
    map(
        verify(take_while1(is_ident_char), |s: &str| {
            !s.chars().next().map_or(false, |c| c.is_ascii_digit())
        }),
        |s: &str| Token::Ident(s.to_string()),
    )(input)
}

/// Lexes a single token, consuming leading whitespace and comments.
pub fn lex_token(input: &str) -> IResult<&str, Token> {
    preceded(
        skip,
        alt((
            value(Token::LParen, char('(')),
            value(Token::RParen, char(')')),
            value(Token::Quote, char('\'')),
            lex_boolean,
            lex_string,
            lex_number,
            lex_ident,
            value(Token::Colon, char(':')),
        )),
    )(input)
}

/// Lexes an entire source string into a token stream.
pub fn lex(input: &str) -> IResult<&str, Vec<Token>> {
    let (input, tokens) = many0(lex_token)(input)?;
    let (input, _) = skip(input)?;
    Ok((input, tokens))
}
