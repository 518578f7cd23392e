//! # mas2g-parser
//!
//! Front end of the MAS toolchain: scanning, parsing and diagnostics for
//! multi-agent system files (`*.mas2g`) and their test scripts (`*.test2g`).
//!
//! The crate's job is not only to accept or reject input but to explain what
//! is wrong in the words of a MAS author:
//!
//! - **Recovering scanning**: an unterminated string is reported once and
//!   healed, so the rest of the file still scans.
//! - **Humanized syntax errors**: "in a launch rule, expected ':' but found
//!   identifier 'bob'" instead of grammar-internal names.
//! - **A closed diagnostic catalog** whose messages come from an embedded,
//!   replaceable message bundle.
//!
//! ## Quick Start
//!
//! ```rust
//! use mas2g_parser::parse_mas_with_recovery;
//!
//! let source = r#"
//! environment {
//!    env = "elevator.jar".
//! }
//!
//! agentfiles {
//!    "elevator.goal" [name = car].
//! }
//!
//! launchpolicy {
//!    when *@env do launch * : car.
//! }
//! "#;
//!
//! let result = parse_mas_with_recovery("elevator.mas2g", source);
//! assert!(result.usable);
//! for d in &result.diagnostics {
//!     eprintln!("{}", d);
//! }
//! ```
//!
//! ## Module Overview
//!
//! - [`catalog`] - Diagnostic kinds and message templates
//! - [`diagnostic`] - Positioned diagnostics and source maps
//! - [`humanize`] - Token and rule phrases
//! - [`lexer`] - Raw tokenizer that never fails
//! - [`scanner`] - Healing token stream with listener notifications
//! - [`strategy`] - Parser error reporting
//! - [`ast`] - Syntax trees
//! - [`parser`] - chumsky grammars with recovery
//! - [`error`] - Pretty printing via ariadne

pub mod ast;
pub mod catalog;
pub mod diagnostic;
pub mod error;
pub mod humanize;
pub mod lexer;
pub mod parser;
pub mod scanner;
pub mod strategy;

// Re-export commonly used types
pub use ast::{MasFile, Spanned, TestFile};
pub use catalog::{Catalog, DiagnosticKind};
pub use diagnostic::{Diagnostic, DiagnosticSink, Position, Severity, SourceMap};
pub use error::ErrorReporter;
pub use parser::{
    parse_mas, parse_mas_into, parse_mas_with_recovery, parse_test, parse_test_into,
    parse_test_with_recovery, ParseOutcome, ParseResult,
};
pub use scanner::{scan, LiteralKind, ScanListener};
pub use strategy::ErrorStrategy;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal() {
        let result = parse_mas_with_recovery("m.mas2g", "agentfiles { \"a.goal\". }");
        assert!(result.usable);
    }

    #[test]
    fn test_lexer_integration() {
        let tokens = lexer::lex(r#"env = "x.jar"."#);
        assert_eq!(tokens.len(), 4);
    }
}
