//! Query engine module
//!
//! Tokenizing, clause parsing, expression compilation and evaluation,
//! grouping, ordering and session execution.

/// Helpers over expression lists (field extraction, aggregate detection)
pub mod analysis;
/// Expression tree types
pub mod ast;
/// Expression compiler
pub mod compiler;
/// Expression evaluator
pub mod evaluator;
/// Scalar function library
pub mod functions;
/// Grouping and aggregate projection
pub mod grouping;
/// Expression lexer
pub mod lexer;
/// Multi-key ordering
pub mod ordering;
/// Clause parser
pub mod parser;
/// Query sessions
pub mod session;
/// Query tokenizer
pub mod tokenizer;

// Re-export main types
pub use analysis::{extract_fields, is_all_aggregate};
pub use compiler::Expression;
pub use evaluator::{evaluate, evaluate_predicate};
pub use grouping::group;
pub use lexer::{Lexer, Token};
pub use ordering::{order, OrderDirection};
pub use parser::{parse, split_items, Parser};
pub use session::{Session, Source};
pub use tokenizer::{tokenize, Tokenizer};
