//! # Type Checker
//!
//! The static type checker for Union Language. The language requires full
//! explicit annotation on procedures, `let`/`letrec` bindings, record fields
//! and `define`s, so checking is a single recursive pass that verifies every
//! expression against its declarations — there is no ML-style inference.
//!
//! Beyond the usual typing rules, the checker implements one level of
//! nominal subtyping: a record is accepted wherever a union that declares it
//! as a case is expected. Branching constructs (`if`, `type-case`) unify
//! their branch types through a *cover*: the set of types that are ancestors
//! of every branch type, from which the most specific member is chosen.
//!
//! All failures are values of [`TypeError`]; checking short-circuits at the
//! first incompatibility and never panics on user programs.

use std::fmt;

use thiserror::Error;

use crate::ast::*;
use crate::parser::{parse_program, ParseError};
use crate::tenv::TEnv;
use crate::texp::{Record, TExp, UserDefinedTExp};

/// Type-checking failures. Messages embed the textual rendering of the
/// incompatible types and of the offending expression.
#[derive(Debug, Error, PartialEq)]
pub enum TypeError {
    #[error("Unbound variable: {0}")]
    UnboundVariable(String),

    #[error("Incompatible types: {found} and {expected} in {exp}")]
    TypeMismatch {
        found: String,
        expected: String,
        exp: String,
    },

    #[error("Wrong number of arguments: expected {expected}, found {found} in {exp}")]
    ArityMismatch {
        expected: usize,
        found: usize,
        exp: String,
    },

    #[error("Expected a procedure, found {found} in {exp}")]
    NonProcedure { found: String, exp: String },

    #[error("Unresolvable type name: {0}")]
    UnresolvableNameRef(String),

    #[error("No common ancestor for types {types} in {exp}")]
    UncoverableUnion { types: String, exp: String },

    #[error("Invalid UDT: {0}")]
    InvalidUdt(String),

    #[error("Invalid type-case: {0}")]
    InvalidTypeCase(String),

    #[error("Primitive not implemented: {0}")]
    UnimplementedPrimitive(String),

    #[error("letrec bindings must be procedures: {0}")]
    LetrecNonProcedure(String),

    #[error("Expected a non-empty sequence of expressions")]
    EmptySequence,
}

/// Errors from the combined parse-then-check entry point.
#[derive(Debug, Error, PartialEq)]
pub enum LangError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Type(#[from] TypeError),
}

// ---------------------------------------------------------------------------
// Program introspection
// ---------------------------------------------------------------------------

/// A name can resolve either to a user-defined type or to one of its records.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TypeDefinition<'a> {
    Udt(&'a UserDefinedTExp),
    Record(&'a Record),
}

/// All `define-type` declarations, in encounter order.
pub fn type_definitions(program: &Program) -> Vec<&UserDefinedTExp> {
    program
        .exps
        .iter()
        .filter_map(|exp| match exp {
            Exp::DefineType(udt) => Some(udt),
            _ => None,
        })
        .collect()
}

/// All top-level variable `define`s, in encounter order.
pub fn definitions(program: &Program) -> Vec<&DefineExp> {
    program
        .exps
        .iter()
        .filter_map(|exp| match exp {
            Exp::Define(def) => Some(def),
            _ => None,
        })
        .collect()
}

/// All records across all type declarations, flattened in encounter order.
pub fn records(program: &Program) -> Vec<&Record> {
    type_definitions(program)
        .into_iter()
        .flat_map(|udt| udt.records.iter())
        .collect()
}

/// Resolves a name to a user-defined type or record. Linear scan over the
/// whole program, first match wins.
pub fn lookup_type_or_record<'a>(
    program: &'a Program,
    name: &str,
) -> Result<TypeDefinition<'a>, TypeError> {
    for udt in type_definitions(program) {
        if udt.name == name {
            return Ok(TypeDefinition::Udt(udt));
        }
        if let Some(record) = udt.records.iter().find(|r| r.name == name) {
            return Ok(TypeDefinition::Record(record));
        }
    }
    Err(TypeError::UnresolvableNameRef(name.to_string()))
}

/// Resolves a name that must denote a user-defined type.
pub fn user_defined_type_by_name<'a>(
    program: &'a Program,
    name: &str,
) -> Result<&'a UserDefinedTExp, TypeError> {
    type_definitions(program)
        .into_iter()
        .find(|udt| udt.name == name)
        .ok_or_else(|| TypeError::UnresolvableNameRef(name.to_string()))
}

/// The user-defined types that list a record with this name as a case.
pub fn record_parents<'a>(program: &'a Program, name: &str) -> Vec<&'a UserDefinedTExp> {
    type_definitions(program)
        .into_iter()
        .filter(|udt| udt.records.iter().any(|r| r.name == name))
        .collect()
}

// ---------------------------------------------------------------------------
// Subtype & coverage engine
// ---------------------------------------------------------------------------

fn resolve_udt<'a>(texp: &'a TExp, program: &'a Program) -> Option<&'a UserDefinedTExp> {
    match texp {
        TExp::UserDefined(udt) => Some(udt),
        TExp::NameRef(name) => match lookup_type_or_record(program, name) {
            Ok(TypeDefinition::Udt(udt)) => Some(udt),
            _ => None,
        },
        _ => None,
    }
}

fn resolve_name(name: &str, program: &Program) -> Option<TExp> {
    match lookup_type_or_record(program, name) {
        Ok(TypeDefinition::Udt(udt)) => Some(TExp::UserDefined(udt.clone())),
        Ok(TypeDefinition::Record(record)) => Some(TExp::Record(record.clone())),
        Err(_) => None,
    }
}

/// One level of nominal subtyping: a record is a subtype of every union that
/// declares it as a case, and everything is a subtype of `any`.
pub fn is_subtype(t1: &TExp, t2: &TExp, program: &Program) -> bool {
    if matches!(t2, TExp::Any) {
        return true;
    }
    let udt = match resolve_udt(t2, program) {
        Some(udt) => udt,
        None => return false,
    };
    match t1 {
        TExp::Record(record) => udt.records.contains(record),
        TExp::NameRef(name) => udt.records.iter().any(|r| &r.name == name),
        _ => false,
    }
}

/// The chain of ancestor types of `texp`, up to and including itself.
///
/// Primitives, procedure types and user-defined type values are their own
/// only ancestor. A record's ancestors are itself followed by every union
/// that declares it. An unresolvable name has no ancestors at all, which
/// makes any cover involving it empty.
pub fn parent_chain(texp: &TExp, program: &Program) -> Vec<TExp> {
    match texp {
        TExp::Record(record) => parent_chain(&TExp::NameRef(record.name.clone()), program),
        TExp::NameRef(name) => match lookup_type_or_record(program, name) {
            Ok(TypeDefinition::Udt(udt)) => vec![TExp::NameRef(udt.name.clone())],
            Ok(TypeDefinition::Record(record)) => {
                let mut chain = vec![TExp::NameRef(record.name.clone())];
                chain.extend(
                    record_parents(program, &record.name)
                        .into_iter()
                        .map(|udt| TExp::NameRef(udt.name.clone())),
                );
                chain
            }
            Err(_) => vec![],
        },
        _ => vec![texp.clone()],
    }
}

/// The set of types that are ancestors of every input type simultaneously.
/// Order of the first input's chain is preserved.
pub fn compute_cover(texps: &[TExp], program: &Program) -> Vec<TExp> {
    let mut chains = texps.iter().map(|t| parent_chain(t, program));
    let first = match chains.next() {
        Some(chain) => chain,
        None => return vec![],
    };
    let rest: Vec<Vec<TExp>> = chains.collect();
    first
        .into_iter()
        .filter(|t| rest.iter().all(|chain| chain.contains(t)))
        .collect()
}

/// Folds over candidates starting from `any`, replacing the running
/// candidate whenever a new element is a subtype of it. Incomparable
/// candidates are resolved by first-occurrence order.
pub fn most_specific(texps: &[TExp], program: &Program) -> TExp {
    texps.iter().fold(TExp::Any, |candidate, t| {
        if is_subtype(t, &candidate, program) {
            t.clone()
        } else {
            candidate
        }
    })
}

/// Computes the cover of `texps` and picks its most specific member, or
/// fails when the types share no common ancestor.
pub fn check_cover<E: fmt::Display + ?Sized>(
    texps: &[TExp],
    exp: &E,
    program: &Program,
) -> Result<TExp, TypeError> {
    let cover = compute_cover(texps, program);
    if cover.is_empty() {
        Err(TypeError::UncoverableUnion {
            types: texps
                .iter()
                .map(|t| t.to_string())
                .collect::<Vec<_>>()
                .join(" and "),
            exp: exp.to_string(),
        })
    } else {
        Ok(most_specific(&cover, program))
    }
}

/// The general compatibility test used wherever two types must agree.
///
/// Checks, in order: structural equality; one-level name-reference
/// resolution against the other side's structure (symmetrically); the
/// directional subtype test `t1 <= t2`, yielding the widened `t2`. Name
/// references are resolved one level only — an alias chain of references is
/// not followed recursively.
pub fn check_equal_type<E: fmt::Display + ?Sized>(
    t1: &TExp,
    t2: &TExp,
    exp: &E,
    program: &Program,
) -> Result<TExp, TypeError> {
    if t1 == t2 {
        return Ok(t2.clone());
    }
    if let TExp::NameRef(name) = t1 {
        if resolve_name(name, program).as_ref() == Some(t2) {
            return Ok(t2.clone());
        }
    }
    if let TExp::NameRef(name) = t2 {
        if resolve_name(name, program).as_ref() == Some(t1) {
            return Ok(t2.clone());
        }
    }
    if is_subtype(t1, t2, program) {
        return Ok(t2.clone());
    }
    Err(TypeError::TypeMismatch {
        found: t1.to_string(),
        expected: t2.to_string(),
        exp: exp.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Environment construction
// ---------------------------------------------------------------------------

/// Builds the initial type environment for a program: the declared types of
/// global `define`s, each user-defined type bound to its own value together
/// with a synthesized `Name?` predicate, and for every record the record
/// value, its `Name?` predicate and its `make-Name` constructor. Bindings
/// are pushed in that order, so later ones shadow earlier ones on collision.
pub fn make_initial_tenv(program: &Program) -> TEnv {
    let predicate = || TExp::proc(vec![TExp::Any], TExp::Bool);
    let mut names = Vec::new();
    let mut texps = Vec::new();
    for def in definitions(program) {
        names.push(def.var.var.clone());
        texps.push(def.var.texp.clone());
    }
    for udt in type_definitions(program) {
        names.push(udt.name.clone());
        texps.push(TExp::UserDefined(udt.clone()));
        names.push(format!("{}?", udt.name));
        texps.push(predicate());
    }
    for record in records(program) {
        names.push(record.name.clone());
        texps.push(TExp::Record(record.clone()));
        names.push(format!("{}?", record.name));
        texps.push(predicate());
        names.push(format!("make-{}", record.name));
        texps.push(TExp::proc(
            record.fields.iter().map(|f| f.texp.clone()).collect(),
            TExp::Record(record.clone()),
        ));
    }
    TEnv::empty().extend(&names, &texps)
}

// ---------------------------------------------------------------------------
// Well-formedness of user-defined types
// ---------------------------------------------------------------------------

fn same_field_set(a: &Record, b: &Record) -> bool {
    a.fields.len() == b.fields.len()
        && a.fields
            .iter()
            .all(|fa| b.fields.iter().any(|fb| fa.name == fb.name && fa.texp == fb.texp))
}

fn references_type(texp: &TExp, name: &str) -> bool {
    match texp {
        TExp::NameRef(n) => n == name,
        TExp::UserDefined(udt) => udt.name == name,
        _ => false,
    }
}

/// Validates every `define-type` in the program.
///
/// Two independent checks: every redeclaration of a record name must carry
/// the same field set (order-independent), and a type definition with a
/// directly self-referential record must have at least one record that does
/// not reference the enclosing type — otherwise the type has no base case
/// and no value of it could ever be constructed.
pub fn check_user_defined_types(program: &Program) -> Result<(), TypeError> {
    let all = records(program);
    for (i, a) in all.iter().enumerate() {
        for b in &all[i + 1..] {
            if a.name == b.name && !same_field_set(a, b) {
                return Err(TypeError::InvalidUdt(a.name.clone()));
            }
        }
    }
    for udt in type_definitions(program) {
        let is_recursive = |record: &Record| {
            record
                .fields
                .iter()
                .any(|field| references_type(&field.texp, &udt.name))
        };
        if udt.records.iter().any(|r| is_recursive(r))
            && !udt.records.iter().any(|r| !is_recursive(r))
        {
            return Err(TypeError::InvalidUdt(udt.name.clone()));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Type-case validation
// ---------------------------------------------------------------------------

/// Confirms a `type-case` lists exactly one clause per record of the
/// dispatched type. Clauses may appear in any source order; alignment is by
/// sorted name, which catches duplicate, missing and surplus clauses alike.
pub fn check_type_case(tc: &TypeCaseExp, program: &Program) -> Result<(), TypeError> {
    let mut named: Vec<TExp> = vec![TExp::NameRef(tc.type_name.clone())];
    named.extend(tc.cases.iter().map(|c| TExp::NameRef(c.name.clone())));
    check_cover(&named, tc, program)?;

    let udt = user_defined_type_by_name(program, &tc.type_name)?;
    if udt.records.len() != tc.cases.len() {
        return Err(TypeError::InvalidTypeCase(tc.type_name.clone()));
    }
    let mut records: Vec<&Record> = udt.records.iter().collect();
    records.sort_by(|a, b| a.name.cmp(&b.name));
    let mut cases: Vec<&CaseExp> = tc.cases.iter().collect();
    cases.sort_by(|a, b| a.name.cmp(&b.name));
    for (record, case) in records.iter().zip(&cases) {
        if record.name != case.name || record.fields.len() != case.var_names.len() {
            return Err(TypeError::InvalidTypeCase(tc.type_name.clone()));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Expression typer
// ---------------------------------------------------------------------------

/// Fixed signature table for primitive operators.
fn typeof_prim_op(op: &str) -> Result<TExp, TypeError> {
    match op {
        "+" | "-" | "*" | "/" => Ok(TExp::proc(vec![TExp::Num, TExp::Num], TExp::Num)),
        "<" | ">" | "=" => Ok(TExp::proc(vec![TExp::Num, TExp::Num], TExp::Bool)),
        "and" | "or" => Ok(TExp::proc(vec![TExp::Bool, TExp::Bool], TExp::Bool)),
        "not" => Ok(TExp::proc(vec![TExp::Bool], TExp::Bool)),
        "eq?" => Ok(TExp::proc(vec![TExp::Any, TExp::Any], TExp::Bool)),
        "number?" | "boolean?" | "string?" => Ok(TExp::proc(vec![TExp::Any], TExp::Bool)),
        "display" => Ok(TExp::proc(vec![TExp::Any], TExp::Void)),
        "newline" => Ok(TExp::proc(vec![], TExp::Void)),
        _ => Err(TypeError::UnimplementedPrimitive(op.to_string())),
    }
}

fn typeof_if(if_exp: &IfExp, tenv: &TEnv, program: &Program) -> Result<TExp, TypeError> {
    let test_t = typeof_cexp(&if_exp.test, tenv, program)?;
    check_equal_type(&test_t, &TExp::Bool, if_exp, program)?;
    let then_t = typeof_cexp(&if_exp.then, tenv, program)?;
    let alt_t = typeof_cexp(&if_exp.alt, tenv, program)?;
    check_cover(&[then_t, alt_t], if_exp, program)
}

fn typeof_proc(proc: &ProcExp, tenv: &TEnv, program: &Program) -> Result<TExp, TypeError> {
    let names: Vec<String> = proc.params.iter().map(|p| p.var.clone()).collect();
    let texps: Vec<TExp> = proc.params.iter().map(|p| p.texp.clone()).collect();
    let body_t = typeof_cexps(&proc.body, &tenv.extend(&names, &texps), program)?;
    check_equal_type(&body_t, &proc.ret, proc, program)?;
    Ok(TExp::proc(texps, proc.ret.clone()))
}

fn typeof_app(app: &AppExp, tenv: &TEnv, program: &Program) -> Result<TExp, TypeError> {
    let rator_t = typeof_cexp(&app.rator, tenv, program)?;
    let (params, ret) = match rator_t {
        TExp::Proc { params, ret } => (params, ret),
        other => {
            return Err(TypeError::NonProcedure {
                found: other.to_string(),
                exp: app.to_string(),
            })
        }
    };
    if params.len() != app.rands.len() {
        return Err(TypeError::ArityMismatch {
            expected: params.len(),
            found: app.rands.len(),
            exp: app.to_string(),
        });
    }
    for (rand, param_t) in app.rands.iter().zip(&params) {
        let rand_t = typeof_cexp(rand, tenv, program)?;
        check_equal_type(&rand_t, param_t, app, program)?;
    }
    Ok(*ret)
}

fn typeof_let(let_exp: &LetExp, tenv: &TEnv, program: &Program) -> Result<TExp, TypeError> {
    let mut names = Vec::new();
    let mut texps = Vec::new();
    // Initializers see the outer environment only.
    for binding in &let_exp.bindings {
        let val_t = typeof_cexp(&binding.val, tenv, program)?;
        check_equal_type(&val_t, &binding.var.texp, binding.val.as_ref(), program)?;
        names.push(binding.var.var.clone());
        texps.push(binding.var.texp.clone());
    }
    typeof_cexps(&let_exp.body, &tenv.extend(&names, &texps), program)
}

fn typeof_letrec(letrec: &LetrecExp, tenv: &TEnv, program: &Program) -> Result<TExp, TypeError> {
    let mut procs = Vec::new();
    for binding in &letrec.bindings {
        match binding.val.as_ref() {
            CExp::Proc(proc) => procs.push(proc),
            other => return Err(TypeError::LetrecNonProcedure(other.to_string())),
        }
    }
    // One shared frame holding every bound procedure's declared type, so
    // mutually recursive bodies can see each other.
    let names: Vec<String> = letrec.bindings.iter().map(|b| b.var.var.clone()).collect();
    let texps: Vec<TExp> = procs
        .iter()
        .map(|p| {
            TExp::proc(
                p.params.iter().map(|d| d.texp.clone()).collect(),
                p.ret.clone(),
            )
        })
        .collect();
    let shared = tenv.extend(&names, &texps);
    for proc in &procs {
        let param_names: Vec<String> = proc.params.iter().map(|d| d.var.clone()).collect();
        let param_texps: Vec<TExp> = proc.params.iter().map(|d| d.texp.clone()).collect();
        let body_t = typeof_cexps(
            &proc.body,
            &shared.extend(&param_names, &param_texps),
            program,
        )?;
        check_equal_type(&body_t, &proc.ret, *proc, program)?;
    }
    typeof_cexps(&letrec.body, &shared, program)
}

fn typeof_set(set: &SetExp, tenv: &TEnv, program: &Program) -> Result<TExp, TypeError> {
    let current = tenv.lookup(&set.var)?;
    let val_t = typeof_cexp(&set.val, tenv, program)?;
    check_equal_type(&val_t, &current, set, program)?;
    Ok(TExp::Void)
}

fn typeof_define(def: &DefineExp, tenv: &TEnv, program: &Program) -> Result<TExp, TypeError> {
    // The defined name is visible inside its own value, so recursive
    // procedures bound via define check out.
    let self_tenv = tenv.extend(
        std::slice::from_ref(&def.var.var),
        std::slice::from_ref(&def.var.texp),
    );
    let val_t = typeof_cexp(&def.val, &self_tenv, program)?;
    check_equal_type(&val_t, &def.var.texp, def, program)?;
    Ok(TExp::Void)
}

fn typeof_type_case(tc: &TypeCaseExp, tenv: &TEnv, program: &Program) -> Result<TExp, TypeError> {
    let dispatch_t = typeof_cexp(&tc.dispatch, tenv, program)?;
    check_equal_type(&dispatch_t, &TExp::NameRef(tc.type_name.clone()), tc, program)?;
    check_type_case(tc, program)?;
    let udt = user_defined_type_by_name(program, &tc.type_name)?;
    let mut case_types = Vec::new();
    for case in &tc.cases {
        let record = udt
            .records
            .iter()
            .find(|r| r.name == case.name)
            .ok_or_else(|| TypeError::InvalidTypeCase(tc.type_name.clone()))?;
        let field_texps: Vec<TExp> = record.fields.iter().map(|f| f.texp.clone()).collect();
        let case_tenv = tenv.extend(&case.var_names, &field_texps);
        case_types.push(typeof_cexps(&case.body, &case_tenv, program)?);
    }
    check_cover(&case_types, tc, program)
}

/// Types a non-empty body sequence; the sequence's type is its last
/// expression's type.
fn typeof_cexps(cexps: &[CExp], tenv: &TEnv, program: &Program) -> Result<TExp, TypeError> {
    let (last, init) = cexps.split_last().ok_or(TypeError::EmptySequence)?;
    for cexp in init {
        typeof_cexp(cexp, tenv, program)?;
    }
    typeof_cexp(last, tenv, program)
}

/// Computes the type of a single expression.
pub fn typeof_cexp(cexp: &CExp, tenv: &TEnv, program: &Program) -> Result<TExp, TypeError> {
    match cexp {
        CExp::NumLit(_) => Ok(TExp::Num),
        CExp::BoolLit(_) => Ok(TExp::Bool),
        CExp::StrLit(_) => Ok(TExp::Str),
        CExp::Lit(_) => Ok(TExp::Lit),
        CExp::PrimOp(op) => typeof_prim_op(op),
        CExp::VarRef(name) => tenv.lookup(name),
        CExp::If(if_exp) => typeof_if(if_exp, tenv, program),
        CExp::Proc(proc) => typeof_proc(proc, tenv, program),
        CExp::Let(let_exp) => typeof_let(let_exp, tenv, program),
        CExp::Letrec(letrec) => typeof_letrec(letrec, tenv, program),
        CExp::Set(set) => typeof_set(set, tenv, program),
        CExp::App(app) => typeof_app(app, tenv, program),
        CExp::TypeCase(tc) => typeof_type_case(tc, tenv, program),
    }
}

/// Computes the type of a top-level expression.
pub fn typeof_exp(exp: &Exp, tenv: &TEnv, program: &Program) -> Result<TExp, TypeError> {
    match exp {
        Exp::Define(def) => typeof_define(def, tenv, program),
        Exp::DefineType(_) => {
            check_user_defined_types(program)?;
            Ok(TExp::Void)
        }
        Exp::Cexp(cexp) => typeof_cexp(cexp, tenv, program),
    }
}

/// Types a non-empty top-level sequence, threading `define`d names into the
/// environment of subsequent expressions.
pub fn typeof_exps(exps: &[Exp], tenv: &TEnv, program: &Program) -> Result<TExp, TypeError> {
    let (last, init) = exps.split_last().ok_or(TypeError::EmptySequence)?;
    let mut tenv = tenv.clone();
    for exp in init {
        typeof_exp(exp, &tenv, program)?;
        if let Exp::Define(def) = exp {
            tenv = tenv.extend(
                std::slice::from_ref(&def.var.var),
                std::slice::from_ref(&def.var.texp),
            );
        }
    }
    typeof_exp(last, &tenv, program)
}

/// Checks a whole program: builds the initial environment, types every
/// top-level expression, then re-validates all user-defined types so a
/// program with a well-typed body but an invalid `define-type` is still
/// rejected.
pub fn check_program(program: &Program) -> Result<TExp, TypeError> {
    let tenv = make_initial_tenv(program);
    let result = typeof_exps(&program.exps, &tenv, program)?;
    check_user_defined_types(program)?;
    Ok(result)
}

/// Parses and checks a source string, returning the rendered program type.
pub fn check_source(source: &str) -> Result<String, LangError> {
    let program = parse_program(source)?;
    let result = check_program(&program)?;
    Ok(result.to_string())
}
