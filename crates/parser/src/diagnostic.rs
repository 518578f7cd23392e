//! Positioned diagnostic records and the sink they are collected into.
//!
//! A [`Diagnostic`] is the only artifact this toolchain persists: every
//! lexical, syntax and semantic problem found in a file ends up as one,
//! rendered through the [`Catalog`](crate::catalog::Catalog) at the point of
//! detection.
//!
//! ```rust
//! use mas2g_parser::catalog::{DiagnosticKind, MasWarning};
//! use mas2g_parser::diagnostic::{Diagnostic, Severity, SourceMap};
//!
//! let map = SourceMap::new("demo.mas2g", "agentfiles {\n   \"a.goal\".\n}\n");
//! let d = Diagnostic::new(
//!     DiagnosticKind::MasWarning(MasWarning::AgentFileUnused),
//!     vec!["a.goal".to_string()],
//!     map.position(16..24),
//! );
//! assert_eq!(d.severity, Severity::Warning);
//! assert_eq!((d.position.line, d.position.column), (2, 4));
//! ```

use crate::catalog::{Catalog, DiagnosticKind};
use serde::{Serialize, Serializer};
use std::fmt;
use std::ops::Range;

/// Byte range into a source file.
pub type Span = Range<usize>;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// Where a diagnostic points: file, 1-based line and column, and the byte span
/// when one is known.
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Hash)]
pub struct Position {
    pub file: String,
    pub line: usize,
    pub column: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
}

impl Position {
    /// A position without span information, e.g. for a whole file.
    pub fn file_start(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line: 1,
            column: 1,
            span: None,
        }
    }

    fn sort_key(&self) -> (usize, usize, usize) {
        (self.line, self.column, self.span.as_ref().map_or(0, |s| s.end))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// A rendered, positioned report of an error or warning.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Diagnostic {
    #[serde(serialize_with = "serialize_kind")]
    pub kind: DiagnosticKind,
    #[serde(skip)]
    pub args: Vec<String>,
    pub message: String,
    pub severity: Severity,
    #[serde(flatten)]
    pub position: Position,
}

fn serialize_kind<S: Serializer>(kind: &DiagnosticKind, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(kind.id())
}

impl Diagnostic {
    /// Render `kind` with `args` through the global catalog.
    pub fn new(kind: DiagnosticKind, args: Vec<String>, position: Position) -> Self {
        Self::with_catalog(Catalog::global(), kind, args, position)
    }

    pub fn with_catalog(
        catalog: &Catalog,
        kind: DiagnosticKind,
        args: Vec<String>,
        position: Position,
    ) -> Self {
        let message = catalog.render(kind, &args);
        Self {
            kind,
            args,
            message,
            severity: kind.severity(),
            position,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} [{}]: {}",
            self.position,
            self.severity,
            self.kind.id(),
            self.message
        )
    }
}

/// Receives diagnostics as they are detected.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for &mut S {
    fn report(&mut self, diagnostic: Diagnostic) {
        (**self).report(diagnostic);
    }
}

/// Order diagnostics by source position, keeping detection order for ties.
pub fn sort_by_position(diagnostics: &mut [Diagnostic]) {
    diagnostics.sort_by(|a, b| {
        a.position
            .file
            .cmp(&b.position.file)
            .then(a.position.sort_key().cmp(&b.position.sort_key()))
    });
}

pub fn error_count(diagnostics: &[Diagnostic]) -> usize {
    diagnostics.iter().filter(|d| d.is_error()).count()
}

/// Maps byte offsets of one source file to line/column positions.
#[derive(Debug, Clone)]
pub struct SourceMap<'src> {
    file: String,
    source: &'src str,
    line_starts: Vec<usize>,
}

impl<'src> SourceMap<'src> {
    pub fn new(file: impl Into<String>, source: &'src str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            file: file.into(),
            source,
            line_starts,
        }
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn source(&self) -> &'src str {
        self.source
    }

    /// 1-based (line, column); columns count characters, not bytes.
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.source.len());
        let line = match self.line_starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(next) => next - 1,
        };
        let start = self.line_starts[line];
        let column = self
            .source
            .get(start..offset)
            .map_or(offset - start, |s| s.chars().count());
        (line + 1, column + 1)
    }

    pub fn position(&self, span: Span) -> Position {
        let (line, column) = self.line_col(span.start);
        Position {
            file: self.file.clone(),
            line,
            column,
            span: Some(span),
        }
    }

    pub fn diagnostic(&self, kind: DiagnosticKind, args: Vec<String>, span: Span) -> Diagnostic {
        Diagnostic::new(kind, args, self.position(span))
    }
}
