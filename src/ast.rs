//! # Abstract Syntax Tree (AST)
//!
//! AST nodes for Union Language programs. A program is an ordered sequence of
//! top-level expressions; order matters for sequencing semantics but not for
//! type-definition visibility (all `define-type` declarations are globally
//! visible regardless of where they appear).
//!
//! Every node implements `Display` with its s-expression rendering because
//! type errors embed the offending expression verbatim.
//!
//! ## Example
//!
//! ```scheme
//! (define-type Shape
//!   (Circle (radius : number))
//!   (Square (side : number)))
//!
//! (define (area : (Shape -> number))
//!   (lambda ((s : Shape)) : number
//!     (type-case Shape s
//!       (Circle (r) (* r r))
//!       (Square (e) (* e e)))))
//! ```

use crate::texp::{TExp, UserDefinedTExp};
use std::fmt;

/// The root node: an ordered, non-empty sequence of top-level expressions.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub exps: Vec<Exp>,
}

/// Top-level expressions.
#[derive(Debug, Clone, PartialEq)]
pub enum Exp {
    /// `(define (x : T) value)`
    Define(DefineExp),
    /// `(define-type Name (Case (field : T) ...) ...)`
    DefineType(UserDefinedTExp),
    /// Any ordinary expression
    Cexp(CExp),
}

/// A top-level variable definition with a declared type.
#[derive(Debug, Clone, PartialEq)]
pub struct DefineExp {
    pub var: VarDecl,
    pub val: Box<CExp>,
}

/// A variable declaration with its type annotation: `(x : number)`.
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub var: String,
    pub texp: TExp,
}

/// Expressions (everything that can appear in value position).
#[derive(Debug, Clone, PartialEq)]
pub enum CExp {
    /// Numeric literal
    NumLit(f64),
    /// Boolean literal `#t` / `#f`
    BoolLit(bool),
    /// String literal
    StrLit(String),
    /// Primitive operator reference (`+`, `eq?`, `number?`, ...)
    PrimOp(String),
    /// Variable reference
    VarRef(String),
    /// Quoted literal data
    Lit(SExpValue),
    /// `(if test then else)`
    If(IfExp),
    /// `(lambda ((x : T) ...) : T body ...)`
    Proc(ProcExp),
    /// `(let (((x : T) v) ...) body ...)`
    Let(LetExp),
    /// `(letrec (((f : T) proc) ...) body ...)`
    Letrec(LetrecExp),
    /// `(set! x v)`
    Set(SetExp),
    /// Procedure application
    App(AppExp),
    /// `(type-case Name val (Case (vars ...) body ...) ...)`
    TypeCase(TypeCaseExp),
}

/// Conditional expression.
#[derive(Debug, Clone, PartialEq)]
pub struct IfExp {
    pub test: Box<CExp>,
    pub then: Box<CExp>,
    pub alt: Box<CExp>,
}

/// Procedure expression with fully annotated parameters and return type.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcExp {
    pub params: Vec<VarDecl>,
    pub ret: TExp,
    pub body: Vec<CExp>,
}

/// A single binding in a `let` or `letrec`.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub var: VarDecl,
    pub val: Box<CExp>,
}

/// `let` expression. Initializers see the outer environment only; all
/// bindings extend the body environment simultaneously.
#[derive(Debug, Clone, PartialEq)]
pub struct LetExp {
    pub bindings: Vec<Binding>,
    pub body: Vec<CExp>,
}

/// `letrec` expression. Restricted to procedure-valued bindings; all bound
/// names share one environment frame, enabling mutual recursion.
#[derive(Debug, Clone, PartialEq)]
pub struct LetrecExp {
    pub bindings: Vec<Binding>,
    pub body: Vec<CExp>,
}

/// Assignment to an existing binding.
#[derive(Debug, Clone, PartialEq)]
pub struct SetExp {
    pub var: String,
    pub val: Box<CExp>,
}

/// Procedure application.
#[derive(Debug, Clone, PartialEq)]
pub struct AppExp {
    pub rator: Box<CExp>,
    pub rands: Vec<CExp>,
}

/// Pattern dispatch over the record cases of a user-defined type.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeCaseExp {
    /// Name of the dispatched user-defined type
    pub type_name: String,
    /// The dispatched value
    pub dispatch: Box<CExp>,
    /// One clause per record case, in any source order
    pub cases: Vec<CaseExp>,
}

/// A single `type-case` clause: the record name, the variables bound to its
/// fields in field order, and the clause body.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseExp {
    pub name: String,
    pub var_names: Vec<String>,
    pub body: Vec<CExp>,
}

/// Quoted (literal) data.
#[derive(Debug, Clone, PartialEq)]
pub enum SExpValue {
    Number(f64),
    Boolean(bool),
    String(String),
    Symbol(String),
    List(Vec<SExpValue>),
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, exp) in self.exps.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", exp)?;
        }
        Ok(())
    }
}

impl fmt::Display for Exp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Exp::Define(def) => write!(f, "{}", def),
            Exp::DefineType(udt) => {
                write!(f, "(define-type {}", udt.name)?;
                for record in &udt.records {
                    write!(f, " ({}", record.name)?;
                    for field in &record.fields {
                        write!(f, " ({} : {})", field.name, field.texp)?;
                    }
                    write!(f, ")")?;
                }
                write!(f, ")")
            }
            Exp::Cexp(cexp) => write!(f, "{}", cexp),
        }
    }
}

impl fmt::Display for DefineExp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(define {} {})", self.var, self.val)
    }
}

impl fmt::Display for VarDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} : {})", self.var, self.texp)
    }
}

fn write_body(f: &mut fmt::Formatter<'_>, body: &[CExp]) -> fmt::Result {
    for cexp in body {
        write!(f, " {}", cexp)?;
    }
    Ok(())
}

impl fmt::Display for CExp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CExp::NumLit(n) => write!(f, "{}", n),
            CExp::BoolLit(true) => write!(f, "#t"),
            CExp::BoolLit(false) => write!(f, "#f"),
            CExp::StrLit(s) => write!(f, "\"{}\"", s),
            CExp::PrimOp(op) => write!(f, "{}", op),
            CExp::VarRef(name) => write!(f, "{}", name),
            CExp::Lit(sexp) => write!(f, "'{}", sexp),
            CExp::If(if_exp) => write!(f, "{}", if_exp),
            CExp::Proc(proc) => write!(f, "{}", proc),
            CExp::Let(let_exp) => write!(f, "{}", let_exp),
            CExp::Letrec(letrec) => write!(f, "{}", letrec),
            CExp::Set(set) => write!(f, "{}", set),
            CExp::App(app) => write!(f, "{}", app),
            CExp::TypeCase(tc) => write!(f, "{}", tc),
        }
    }
}

impl fmt::Display for IfExp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(if {} {} {})", self.test, self.then, self.alt)
    }
}

impl fmt::Display for ProcExp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(lambda (")?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", param)?;
        }
        write!(f, ") : {}", self.ret)?;
        write_body(f, &self.body)?;
        write!(f, ")")
    }
}

fn write_bindings(f: &mut fmt::Formatter<'_>, bindings: &[Binding]) -> fmt::Result {
    write!(f, "(")?;
    for (i, binding) in bindings.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "({} {})", binding.var, binding.val)?;
    }
    write!(f, ")")
}

impl fmt::Display for LetExp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(let ")?;
        write_bindings(f, &self.bindings)?;
        write_body(f, &self.body)?;
        write!(f, ")")
    }
}

impl fmt::Display for LetrecExp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(letrec ")?;
        write_bindings(f, &self.bindings)?;
        write_body(f, &self.body)?;
        write!(f, ")")
    }
}

impl fmt::Display for SetExp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(set! {} {})", self.var, self.val)
    }
}

impl fmt::Display for AppExp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}", self.rator)?;
        for rand in &self.rands {
            write!(f, " {}", rand)?;
        }
        write!(f, ")")
    }
}

impl fmt::Display for TypeCaseExp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(type-case {} {}", self.type_name, self.dispatch)?;
        for case in &self.cases {
            write!(f, " ({} (", case.name)?;
            for (i, var) in case.var_names.iter().enumerate() {
                if i > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{}", var)?;
            }
            write!(f, ")")?;
            write_body(f, &case.body)?;
            write!(f, ")")?;
        }
        write!(f, ")")
    }
}

impl fmt::Display for SExpValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SExpValue::Number(n) => write!(f, "{}", n),
            SExpValue::Boolean(true) => write!(f, "#t"),
            SExpValue::Boolean(false) => write!(f, "#f"),
            SExpValue::String(s) => write!(f, "\"{}\"", s),
            SExpValue::Symbol(name) => write!(f, "{}", name),
            SExpValue::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
        }
    }
}
