//! # Type Expressions
//!
//! The type-expression model for Union Language. Types form a closed sum:
//! primitives, procedure types, user-defined tagged unions, the record cases
//! that make them up, and unresolved name references.
//!
//! A `define-type` declares a closed union of records:
//!
//! ```scheme
//! (define-type Shape
//!   (Circle (radius : number))
//!   (Square (side : number)))
//! ```
//!
//! Here `Shape` is a [`UserDefinedTExp`] owning the two [`Record`] cases.
//! Everywhere else in a program the names `Shape`, `Circle` and `Square`
//! appear as [`TExp::NameRef`] values, resolved against the whole program at
//! check time. An unresolvable reference is a checking failure, never a parse
//! failure.

use std::fmt;

/// A type expression.
///
/// Structural equality (`PartialEq`) is the first step of every type
/// compatibility check; the rendered `Display` form is what type errors embed.
#[derive(Debug, Clone, PartialEq)]
pub enum TExp {
    /// The type of numeric literals and arithmetic results
    Num,
    /// The type of `#t` and `#f`
    Bool,
    /// The type of string literals
    Str,
    /// The type of expressions evaluated for effect (`define`, `set!`)
    Void,
    /// The type of quoted data
    Lit,
    /// The top type; every type is acceptable where `any` is expected
    Any,
    /// A procedure type: ordered parameter types and a return type
    Proc {
        params: Vec<TExp>,
        ret: Box<TExp>,
    },
    /// A user-defined tagged union, owning its record cases
    UserDefined(UserDefinedTExp),
    /// A record case of some user-defined type
    Record(Record),
    /// An unresolved reference to a user-defined type or record by name
    NameRef(String),
}

/// A user-defined type: a named closed union of record cases.
#[derive(Debug, Clone, PartialEq)]
pub struct UserDefinedTExp {
    pub name: String,
    pub records: Vec<Record>,
}

/// A record: a named product of typed fields, always a case of some union.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub name: String,
    pub fields: Vec<Field>,
}

/// A named, typed field of a record. Field names are unique within a record.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub texp: TExp,
}

impl TExp {
    /// Shorthand for a procedure type.
    pub fn proc(params: Vec<TExp>, ret: TExp) -> Self {
        TExp::Proc {
            params,
            ret: Box::new(ret),
        }
    }

    /// The name this type is referred to by, if it has one.
    pub fn name(&self) -> Option<&str> {
        match self {
            TExp::UserDefined(udt) => Some(&udt.name),
            TExp::Record(record) => Some(&record.name),
            TExp::NameRef(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for TExp {
    /// Renders the canonical textual form, round-trippable through
    /// [`crate::parser::parse_texp`] for every type that has a textual form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TExp::Num => write!(f, "number"),
            TExp::Bool => write!(f, "boolean"),
            TExp::Str => write!(f, "string"),
            TExp::Void => write!(f, "void"),
            TExp::Lit => write!(f, "literal"),
            TExp::Any => write!(f, "any"),
            TExp::Proc { params, ret } => {
                write!(f, "(")?;
                if params.is_empty() {
                    write!(f, "Empty")?;
                } else {
                    for (i, param) in params.iter().enumerate() {
                        if i > 0 {
                            write!(f, " * ")?;
                        }
                        write!(f, "{}", param)?;
                    }
                }
                write!(f, " -> {})", ret)
            }
            TExp::UserDefined(udt) => write!(f, "{}", udt.name),
            TExp::Record(record) => write!(f, "{}", record.name),
            TExp::NameRef(name) => write!(f, "{}", name),
        }
    }
}
