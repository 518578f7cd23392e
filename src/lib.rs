//! # mas2g
//!
//! Diagnostics for MAS files (`*.mas2g`) and their test scripts (`*.test2g`).
//!
//! | Crate | Description |
//! |-------|-------------|
//! | [`mas2g-parser`](parser) | Scanner, grammar, humanized syntax errors, message catalog |
//! | [`mas2g-resolver`](resolver) | Symbol tables, reference graph, MAS and test checks |
//!
//! A compilation unit is one file. [`compile_mas`] and [`compile_test`] run
//! the whole pipeline on it and return every diagnostic, ordered by position.
//! Semantic checks only run when the file parsed without syntax errors.
//!
//! ## Quick Start
//!
//! ```rust
//! use mas2g::{compile_mas, compile_test, AnalysisOptions, MemoryProbe};
//!
//! let mas_source = r#"
//! agentfiles { "car.goal". }
//! launchpolicy { launch car : car. }
//! "#;
//! let test_source = r#"
//! masTest {
//!    mas = "demo.mas2g".
//!    car { eventually bel(done). }
//! }
//! "#;
//!
//! let probe = MemoryProbe::new()
//!     .with_file("car.goal", Vec::new())
//!     .with_file("demo.mas2g", mas_source.as_bytes().to_vec());
//! let options = AnalysisOptions::default();
//!
//! let mas = compile_mas("demo.mas2g", mas_source, &probe, &options);
//! assert!(mas.is_success());
//!
//! let test = compile_test("demo.test2g", test_source, mas.analysis.as_ref(), &probe, &options);
//! assert!(test.is_success(), "{:?}", test.diagnostics);
//! ```

pub use mas2g_parser as parser;
pub use mas2g_resolver as resolver;

pub use mas2g_parser::{Diagnostic, DiagnosticKind, ErrorReporter, Severity, SourceMap};
pub use mas2g_resolver::{
    AnalysisOptions, DiskProbe, MasAnalysis, MemoryProbe, ResourceProbe, SymbolTable,
};

use mas2g_parser::diagnostic::{error_count, sort_by_position};
use mas2g_parser::{parse_mas_into, parse_test_into};
use mas2g_resolver::{MasAnalyzer, TestAnalyzer};
use serde::Serialize;
use tracing::{debug, info_span};

/// Outcome of compiling one file.
#[derive(Debug, Clone, Serialize)]
pub struct UnitReport {
    pub file: String,
    /// All diagnostics, ordered by source position.
    pub diagnostics: Vec<Diagnostic>,
    /// The parse was clean enough for semantic checks to run.
    pub analyzed: bool,
    /// Symbols of a MAS unit, for checking the test scripts that use it.
    #[serde(skip)]
    pub analysis: Option<MasAnalysis>,
}

impl UnitReport {
    fn new(file: &str, mut diagnostics: Vec<Diagnostic>, analyzed: bool) -> Self {
        sort_by_position(&mut diagnostics);
        Self {
            file: file.to_string(),
            diagnostics,
            analyzed,
            analysis: None,
        }
    }

    /// No error-severity diagnostic was produced.
    pub fn is_success(&self) -> bool {
        self.error_count() == 0
    }

    pub fn error_count(&self) -> usize {
        error_count(&self.diagnostics)
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_warning()).count()
    }
}

/// Scan, parse and check a MAS file.
pub fn compile_mas(
    file: &str,
    source: &str,
    probe: &dyn ResourceProbe,
    options: &AnalysisOptions,
) -> UnitReport {
    let _span = info_span!("compile_mas", file).entered();
    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    let parsed = parse_mas_into(file, source, &mut diagnostics);

    let Some(ast) = parsed.ast.filter(|_| parsed.usable) else {
        debug!(errors = diagnostics.len(), "skipping semantic checks");
        return UnitReport::new(file, diagnostics, false);
    };

    let mut analysis = MasAnalyzer::new(SourceMap::new(file, source), probe, options).analyze(&ast);
    diagnostics.append(&mut analysis.diagnostics);

    let mut report = UnitReport::new(file, diagnostics, true);
    report.analysis = Some(analysis);
    report
}

/// Scan, parse and check a test script. `mas` is the analysis of the MAS file
/// the script names; without it tested agents are not checked.
pub fn compile_test(
    file: &str,
    source: &str,
    mas: Option<&MasAnalysis>,
    probe: &dyn ResourceProbe,
    options: &AnalysisOptions,
) -> UnitReport {
    let _span = info_span!("compile_test", file).entered();
    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    let parsed = parse_test_into(file, source, &mut diagnostics);

    let Some(ast) = parsed.ast.filter(|_| parsed.usable) else {
        debug!(errors = diagnostics.len(), "skipping semantic checks");
        return UnitReport::new(file, diagnostics, false);
    };

    let analysis = TestAnalyzer::new(SourceMap::new(file, source), probe, options, mas).analyze(&ast);
    diagnostics.extend(analysis.diagnostics);
    UnitReport::new(file, diagnostics, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_errors_skip_analysis() {
        let report = compile_mas(
            "m.mas2g",
            "agentfiles { \"a.goal\" }\nlaunchpolicy { launch a : nobody. }\n",
            &MemoryProbe::new(),
            &AnalysisOptions::offline(),
        );
        assert!(!report.analyzed);
        assert!(report.analysis.is_none());
        assert!(!report.is_success());
        assert!(report
            .diagnostics
            .iter()
            .all(|d| d.kind.id() != "AGENTFILE_NONEXISTANT_REFERENCE"));
    }

    #[test]
    fn test_diagnostics_are_sorted() {
        let source = "launchpolicy {\n launch b : b.\n}\nagentfiles {\n \"a.goal\".\n}\n";
        let report = compile_mas("m.mas2g", source, &MemoryProbe::new(), &AnalysisOptions::offline());
        let lines: Vec<_> = report.diagnostics.iter().map(|d| d.position.line).collect();
        assert_eq!(lines, vec![2, 5]);
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.warning_count(), 1);
    }
}
