pub mod lexer;
pub mod texp;
pub mod ast;
pub mod parser;
pub mod tenv;
pub mod type_checker;

#[cfg(test)]
mod property_tests;

pub use lexer::*;
pub use texp::*;
pub use ast::*;
pub use parser::*;
pub use tenv::*;
pub use type_checker::*;
