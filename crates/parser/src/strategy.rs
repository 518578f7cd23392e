//! Turns scanner notifications and parser failures into diagnostics.
//!
//! One [`ErrorStrategy`] serves one compilation unit. It is the
//! [`ScanListener`] of that unit's scanner, and it receives each parser error
//! as a [`Mismatch`]. Everything it reports is rendered through the catalog
//! with humanized token and rule phrases.

use crate::catalog::SyntaxError;
use crate::diagnostic::{Diagnostic, DiagnosticSink, SourceMap, Span};
use crate::humanize::{self, Rule, END_OF_FILE};
use crate::lexer::{self, Token};
use crate::scanner::{LiteralKind, ScanListener};
use chumsky::error::{Rich, RichPattern};
use indexmap::IndexSet;
use std::collections::HashSet;

/// A parser error reduced to what the report needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub span: Span,
    /// Humanized offending token, or the end of file.
    pub found: String,
    /// Humanized admissible continuations, in the parser's order.
    pub expected: Vec<String>,
    /// Raw label of the innermost active rule.
    pub context: Option<String>,
}

impl Mismatch {
    pub fn from_rich(err: &Rich<'_, Token<'_>, lexer::Span>) -> Self {
        let span = err.span().start..err.span().end;
        let expected = err.expected().filter_map(describe_pattern).collect();
        let context = err.contexts().next().map(|(pattern, _)| match pattern {
            RichPattern::Label(label) => label.to_string(),
            other => other.to_string(),
        });
        Self {
            span,
            found: humanize::describe_found(err.found()),
            expected,
            context,
        }
    }
}

/// Phrase for one expected pattern; patterns with nothing to name are dropped.
fn describe_pattern(pattern: &RichPattern<'_, Token<'_>>) -> Option<String> {
    match pattern {
        RichPattern::Token(tok) => match &**tok {
            Token::Operator(op) => Some(format!("'{}'", op)),
            tok => Some(humanize::describe_token_kind(tok.kind()).to_string()),
        },
        RichPattern::Label(label) => Some(humanize::describe_label(label).to_string()),
        RichPattern::EndOfInput => Some(END_OF_FILE.to_string()),
        _ => None,
    }
}

/// Join phrases as "a, b or c".
pub fn join_alternatives<S: AsRef<str>>(phrases: &[S]) -> String {
    match phrases {
        [] => String::new(),
        [only] => only.as_ref().to_string(),
        [init @ .., last] => {
            let head: Vec<&str> = init.iter().map(AsRef::as_ref).collect();
            format!("{} or {}", head.join(", "), last.as_ref())
        }
    }
}

/// Collects the syntax diagnostics of one unit into a [`DiagnosticSink`].
pub struct ErrorStrategy<'src, S = Vec<Diagnostic>> {
    map: SourceMap<'src>,
    root: Rule,
    sink: S,
    reported: usize,
    errors: usize,
    /// Starts of literals whose lexical diagnostic is already reported.
    lexical: HashSet<usize>,
    /// Starts of spans that already carry a parser diagnostic.
    mismatches: HashSet<usize>,
}

impl<'src> ErrorStrategy<'src> {
    /// `root` names the unit when no rule context is known.
    pub fn new(map: SourceMap<'src>, root: Rule) -> Self {
        Self::with_sink(map, root, Vec::new())
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.sink
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.sink
    }
}

impl<'src, S: DiagnosticSink> ErrorStrategy<'src, S> {
    pub fn with_sink(map: SourceMap<'src>, root: Rule, sink: S) -> Self {
        Self {
            map,
            root,
            sink,
            reported: 0,
            errors: 0,
            lexical: HashSet::new(),
            mismatches: HashSet::new(),
        }
    }

    pub fn source_map(&self) -> &SourceMap<'src> {
        &self.map
    }

    /// Number of diagnostics reported so far.
    pub fn reported(&self) -> usize {
        self.reported
    }

    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    fn push(&mut self, kind: SyntaxError, args: Vec<String>, span: Span) {
        let diagnostic = self.map.diagnostic(kind.into(), args, span);
        tracing::debug!(kind = kind.id(), position = %diagnostic.position, "syntax diagnostic");
        self.reported += 1;
        if diagnostic.is_error() {
            self.errors += 1;
        }
        self.sink.report(diagnostic);
    }

    /// Report one parser failure.
    ///
    /// At most one parser diagnostic is kept per offending position, so a
    /// retried parse that fails on the same token is not reported twice.
    pub fn report_mismatch(&mut self, mismatch: Mismatch) {
        if !self.mismatches.insert(mismatch.span.start) {
            return;
        }

        let found = mismatch.found;
        let context = mismatch
            .context
            .as_deref()
            .map(humanize::describe_label)
            .map(str::to_string);

        let expected: IndexSet<String> = mismatch.expected.into_iter().collect();
        if expected.is_empty() {
            let context =
                context.unwrap_or_else(|| humanize::describe_rule(self.root).to_string());
            self.push(SyntaxError::NoViableAlternative, vec![context, found], mismatch.span);
            return;
        }

        let expected = join_alternatives(&expected.into_iter().collect::<Vec<_>>());
        match context {
            Some(context) => self.push(
                SyntaxError::InputMismatch,
                vec![context, expected, found],
                mismatch.span,
            ),
            None => self.push(SyntaxError::UnexpectedInput, vec![expected, found], mismatch.span),
        }
    }

    pub fn report_rich(&mut self, err: &Rich<'_, Token<'_>, lexer::Span>) {
        self.report_mismatch(Mismatch::from_rich(err));
    }
}

impl<S: DiagnosticSink> ScanListener for ErrorStrategy<'_, S> {
    fn literal_unterminated(&mut self, kind: LiteralKind, text: &str, span: Span) {
        if self.lexical.insert(span.start) {
            self.push(kind.syntax_error(), vec![text.to_string()], span);
        }
    }

    fn token_healed(&mut self, kind: LiteralKind, span: Span) {
        // The marker carries no text; recover it from the source so the
        // lexical diagnostic exists exactly once even without the first call.
        if self.lexical.insert(span.start) {
            let raw = self.map.source().get(span.clone()).unwrap_or_default();
            let text = raw.get(1..).unwrap_or_default().trim_end_matches('\r');
            self.push(kind.syntax_error(), vec![text.to_string()], span);
        }
    }

    fn token_unrecognized(&mut self, text: &str, span: Span) {
        self.push(SyntaxError::TokenRecognition, vec![text.to_string()], span);
    }
}
