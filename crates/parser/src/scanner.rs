//! Recovering scanner.
//!
//! Wraps the raw [`lexer`](crate::lexer) and guarantees the parser only ever
//! sees grammar-well-formed tokens. Two kinds of raw token are repaired here:
//!
//! 1. An unterminated quoted literal is healed into the corresponding
//!    terminated literal. The listener first receives
//!    [`ScanListener::literal_unterminated`] with the captured text, then the
//!    text-free marker [`ScanListener::token_healed`].
//! 2. Runs of unrecognized characters are dropped after a single
//!    [`ScanListener::token_unrecognized`] call.
//!
//! ```rust
//! use mas2g_parser::lexer::Token;
//! use mas2g_parser::scanner::{scan, LiteralKind, ScanEvent};
//!
//! let mut events = Vec::new();
//! let tokens: Vec<_> = scan("agent: \"unterminated\nx", &mut events)
//!     .map(|(t, _)| t)
//!     .collect();
//!
//! assert_eq!(tokens[2], Token::DoubleQuoted("unterminated"));
//! assert!(matches!(
//!     events[0],
//!     ScanEvent::Unterminated { kind: LiteralKind::Double, .. }
//! ));
//! ```

use crate::catalog::SyntaxError;
use crate::diagnostic::Span;
use crate::lexer::{self, Spanned, Token, TokenKind};
use serde::Serialize;
use std::iter::Peekable;

/// Quote style of a literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LiteralKind {
    Double,
    Single,
}

impl LiteralKind {
    /// The token type the raw lexer produced before healing.
    pub fn unterminated_kind(self) -> TokenKind {
        match self {
            LiteralKind::Double => TokenKind::UnterminatedDouble,
            LiteralKind::Single => TokenKind::UnterminatedSingle,
        }
    }

    pub fn syntax_error(self) -> SyntaxError {
        match self {
            LiteralKind::Double => SyntaxError::UnterminatedStringLiteral,
            LiteralKind::Single => SyntaxError::UnterminatedSingleQuotedLiteral,
        }
    }

    fn healed(self, text: &str) -> Token<'_> {
        match self {
            LiteralKind::Double => Token::DoubleQuoted(text),
            LiteralKind::Single => Token::SingleQuoted(text),
        }
    }
}

/// Receives the scanner's recovery notifications.
pub trait ScanListener {
    /// A quoted literal ran to the end of its line without a closing quote.
    fn literal_unterminated(&mut self, kind: LiteralKind, text: &str, span: Span);

    /// The literal at `span` was re-typed as terminated and passed on.
    fn token_healed(&mut self, kind: LiteralKind, span: Span);

    fn token_unrecognized(&mut self, text: &str, span: Span);
}

/// Recorded scanner notification, for tools and tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ScanEvent {
    Unterminated {
        kind: LiteralKind,
        text: String,
        span: Span,
    },
    Healed {
        kind: LiteralKind,
        span: Span,
    },
    Unrecognized {
        text: String,
        span: Span,
    },
}

impl ScanListener for Vec<ScanEvent> {
    fn literal_unterminated(&mut self, kind: LiteralKind, text: &str, span: Span) {
        self.push(ScanEvent::Unterminated {
            kind,
            text: text.to_string(),
            span,
        });
    }

    fn token_healed(&mut self, kind: LiteralKind, span: Span) {
        self.push(ScanEvent::Healed { kind, span });
    }

    fn token_unrecognized(&mut self, text: &str, span: Span) {
        self.push(ScanEvent::Unrecognized {
            text: text.to_string(),
            span,
        });
    }
}

/// Lazy stream of healed tokens.
pub struct Scanner<'src, 'l, L: ScanListener + ?Sized> {
    source: &'src str,
    raw: Peekable<lexer::Tokens<'src>>,
    listener: &'l mut L,
    healed: usize,
}

/// Scan `source`, reporting recoveries to `listener`.
///
/// Nothing is lexed until the first token is pulled; a literal is reported
/// when the token it heals into is produced.
pub fn scan<'src, 'l, L: ScanListener + ?Sized>(
    source: &'src str,
    listener: &'l mut L,
) -> Scanner<'src, 'l, L> {
    Scanner {
        source,
        raw: lexer::tokens(source).peekable(),
        listener,
        healed: 0,
    }
}

impl<'src, L: ScanListener + ?Sized> Scanner<'src, '_, L> {
    /// Number of literals healed so far.
    pub fn healed_count(&self) -> usize {
        self.healed
    }

    fn heal(&mut self, kind: LiteralKind, text: &'src str, span: lexer::Span) -> Spanned<Token<'src>> {
        let range = span.start..span.end;
        self.listener.literal_unterminated(kind, text, range.clone());
        let token = kind.healed(text);
        self.healed += 1;
        tracing::debug!(?kind, start = span.start, end = span.end, "healed unterminated literal");
        self.listener.token_healed(kind, range);
        (token, span)
    }

    /// Swallow the run of adjacent unknown characters starting at `first`.
    fn skip_unrecognized(&mut self, first: lexer::Span) {
        let mut end = first.end;
        while let Some(&(Token::Unknown(_), next)) = self.raw.peek() {
            if next.start != end {
                break;
            }
            end = next.end;
            self.raw.next();
        }
        let range = first.start..end;
        let text = self.source.get(range.clone()).unwrap_or_default();
        tracing::debug!(text, "dropped unrecognized input");
        self.listener.token_unrecognized(text, range);
    }
}

impl<'src, L: ScanListener + ?Sized> Iterator for Scanner<'src, '_, L> {
    type Item = Spanned<Token<'src>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (token, span) = self.raw.next()?;
            match token {
                Token::UnterminatedDouble(text) => {
                    return Some(self.heal(LiteralKind::Double, text, span))
                }
                Token::UnterminatedSingle(text) => {
                    return Some(self.heal(LiteralKind::Single, text, span))
                }
                Token::Unknown(_) => self.skip_unrecognized(span),
                token => {
                    tracing::trace!(?token, start = span.start, "token");
                    return Some((token, span));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn scan_all(source: &str) -> (Vec<Token<'_>>, Vec<ScanEvent>) {
        let mut events = Vec::new();
        let tokens = scan(source, &mut events).map(|(t, _)| t).collect();
        (tokens, events)
    }

    #[test]
    fn test_well_formed_input_has_no_events() {
        let (tokens, events) = scan_all("launch bob : \"bob.goal\".");
        assert_eq!(tokens.len(), 5);
        assert!(events.is_empty());
    }

    #[test]
    fn test_unterminated_double_is_healed() {
        let (tokens, events) = scan_all("agent: \"unterminated\nlaunch x.");
        assert_eq!(
            tokens,
            vec![
                Token::Ident("agent"),
                Token::Colon,
                Token::DoubleQuoted("unterminated"),
                Token::Launch,
                Token::Ident("x"),
                Token::Dot,
            ]
        );
        assert_eq!(
            events,
            vec![
                ScanEvent::Unterminated {
                    kind: LiteralKind::Double,
                    text: "unterminated".into(),
                    span: 7..20,
                },
                ScanEvent::Healed {
                    kind: LiteralKind::Double,
                    span: 7..20,
                },
            ]
        );
    }

    #[test]
    fn test_unterminated_single_is_healed() {
        let (tokens, events) = scan_all("x = 'abc");
        assert_eq!(tokens[2], Token::SingleQuoted("abc"));
        assert_eq!(events.len(), 2);
        assert!(matches!(
            events[0],
            ScanEvent::Unterminated {
                kind: LiteralKind::Single,
                ..
            }
        ));
    }

    #[test]
    fn test_unrecognized_run_is_reported_once() {
        let (tokens, events) = scan_all("a §§ b");
        assert_eq!(tokens, vec![Token::Ident("a"), Token::Ident("b")]);
        assert_eq!(
            events,
            vec![ScanEvent::Unrecognized {
                text: "§§".into(),
                span: 2..6,
            }]
        );
    }

    #[test]
    fn test_separate_unrecognized_runs_are_reported_separately() {
        let (_, events) = scan_all("§ a §");
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_tokens_are_scanned_on_demand() {
        let mut events = Vec::new();
        let mut scanner = scan("launch bob : bob.\n\"broken", &mut events);
        assert_eq!(scanner.next().map(|(t, _)| t), Some(Token::Launch));
        assert_eq!(scanner.healed_count(), 0);
        assert_eq!(scanner.by_ref().count(), 5);
        assert_eq!(scanner.healed_count(), 1);
        drop(scanner);
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_unrecognized_input_before_a_comment_ends_the_run() {
        let (tokens, events) = scan_all("a §/* § */§ b");
        assert_eq!(tokens, vec![Token::Ident("a"), Token::Ident("b")]);
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_healed_count() {
        let mut events = Vec::new();
        let mut scanner = scan("\"a\n'b\n\"c\"", &mut events);
        while scanner.next().is_some() {}
        assert_eq!(scanner.healed_count(), 2);
    }

    #[test]
    fn test_syntax_error_kinds() {
        assert_eq!(LiteralKind::Double.syntax_error(), SyntaxError::UnterminatedStringLiteral);
        assert_eq!(
            LiteralKind::Single.syntax_error(),
            SyntaxError::UnterminatedSingleQuotedLiteral
        );
    }
}
