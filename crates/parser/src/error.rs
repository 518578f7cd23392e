//! Pretty terminal rendering of diagnostics.
//!
//! Uses the [ariadne](https://crates.io/crates/ariadne) crate to draw the
//! offending source line with a labelled underline:
//!
//! ```rust
//! use mas2g_parser::catalog::{DiagnosticKind, MasError};
//! use mas2g_parser::diagnostic::SourceMap;
//! use mas2g_parser::error::ErrorReporter;
//!
//! let source = "agentfiles {\n   \"bob.goal\".\n}\n";
//! let map = SourceMap::new("demo.mas2g", source);
//! let d = map.diagnostic(
//!     DiagnosticKind::MasError(MasError::AgentFileNotFound),
//!     vec!["bob.goal".into()],
//!     16..26,
//! );
//!
//! let text = ErrorReporter::new("demo.mas2g", source).render_to_string(&d).unwrap();
//! assert!(text.contains("AGENTFILE_COULDNOT_FIND"));
//! ```

use crate::diagnostic::{Diagnostic, Severity};
use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use std::io::{self, Write};

/// Error reporter that uses ariadne for pretty diagnostic output.
pub struct ErrorReporter<'src> {
    source_name: String,
    source: &'src str,
    color: bool,
}

impl<'src> ErrorReporter<'src> {
    /// Create a new reporter; output is uncolored.
    pub fn new(source_name: impl Into<String>, source: &'src str) -> Self {
        Self {
            source_name: source_name.into(),
            source,
            color: false,
        }
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Write one diagnostic as a source excerpt.
    pub fn write_diagnostic(&self, diagnostic: &Diagnostic, out: &mut impl Write) -> io::Result<()> {
        let (kind, color) = match diagnostic.severity {
            Severity::Error => (ReportKind::Error, Color::Red),
            Severity::Warning => (ReportKind::Warning, Color::Yellow),
        };
        let offset = diagnostic.position.span.as_ref().map_or(0, |s| s.start);

        let mut report = Report::build(kind, &self.source_name, offset)
            .with_config(Config::default().with_color(self.color))
            .with_code(diagnostic.kind.id())
            .with_message(&diagnostic.message);

        // Whole-file diagnostics have no span to underline
        if let Some(span) = diagnostic.position.span.clone() {
            report = report.with_label(
                Label::new((&self.source_name, span))
                    .with_color(color)
                    .with_message("here"),
            );
        }

        report
            .finish()
            .write((&self.source_name, Source::from(self.source)), out)
    }

    /// Write every diagnostic, in order.
    pub fn write_all(&self, diagnostics: &[Diagnostic], out: &mut impl Write) -> io::Result<()> {
        for diagnostic in diagnostics {
            self.write_diagnostic(diagnostic, out)?;
        }
        Ok(())
    }

    pub fn render_to_string(&self, diagnostic: &Diagnostic) -> io::Result<String> {
        let mut buf = Vec::new();
        self.write_diagnostic(diagnostic, &mut buf)?;
        String::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{DiagnosticKind, MasWarning};
    use crate::diagnostic::SourceMap;

    #[test]
    fn test_render_contains_message_and_line() {
        let source = "agentfiles {\n   \"a.goal\".\n}\n";
        let map = SourceMap::new("m.mas2g", source);
        let d = map.diagnostic(
            DiagnosticKind::MasWarning(MasWarning::AgentFileUnused),
            vec!["a.goal".into()],
            16..24,
        );
        let text = ErrorReporter::new("m.mas2g", source)
            .render_to_string(&d)
            .unwrap();
        assert!(text.contains("Warning"), "{}", text);
        assert!(text.contains("never launched"), "{}", text);
        assert!(text.contains("\"a.goal\""), "{}", text);
    }

    #[test]
    fn test_write_all_without_span() {
        let source = "launchpolicy { }\n";
        let d = crate::diagnostic::Diagnostic::new(
            DiagnosticKind::MasWarning(MasWarning::LaunchPolicyEmpty),
            vec![],
            crate::diagnostic::Position::file_start("m.mas2g"),
        );
        let mut out = Vec::new();
        ErrorReporter::new("m.mas2g", source)
            .write_all(&[d], &mut out)
            .unwrap();
        assert!(!out.is_empty());
    }
}
