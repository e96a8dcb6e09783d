//! Predicate expression parsing and encoding
//!
//! This module turns composite constraint strings like
//! "(and (age 17) (season summer))" into a typed tree and encodes that tree
//! as the `predicate_builder` payload the backend accepts.

mod ast;
pub mod cache;
mod codec;
pub mod parser;

#[cfg(test)]
mod property_tests;

pub use ast::*;
pub use cache::*;
pub use parser::*;
