//! Primitive parsers shared by the MAS and test-script grammars.
//!
//! Identifiers, literals, keys, and the token-rendering used for terms.

use crate::ast::Spanned;
use crate::lexer::Token;
use chumsky::input::{BoxedStream, MappedInput};
use chumsky::prelude::*;
use chumsky::recovery::{skip_then_retry_until, via_parser};

/// Token span type (from lexer).
pub type Span = SimpleSpan<usize>;

/// Spanned token type.
pub type SpannedToken<'src> = (Token<'src>, Span);

/// Healed tokens, pulled from the scanner as the grammar needs them.
pub type TokenStream<'tokens, 'src> = BoxedStream<'tokens, SpannedToken<'src>>;

/// Parser input type - the token stream split into chumsky tokens and spans.
pub type ParserInput<'tokens, 'src> =
    MappedInput<'tokens, Token<'src>, Span, TokenStream<'tokens, 'src>>;

/// Convert a chumsky SimpleSpan to our AST Span (Range<usize>).
pub fn to_ast_span(span: Span) -> std::ops::Range<usize> {
    span.start..span.end
}

/// Parse an identifier token.
pub fn ident<'tokens, 'src: 'tokens>() -> impl Parser<
    'tokens,
    ParserInput<'tokens, 'src>,
    &'src str,
    extra::Err<Rich<'tokens, Token<'src>, Span>>,
> + Clone {
    select! {
        Token::Ident(s) => s,
    }
    .labelled("identifier")
}

/// Parse an identifier as a spanned string.
pub fn spanned_ident<'tokens, 'src: 'tokens>() -> impl Parser<
    'tokens,
    ParserInput<'tokens, 'src>,
    Spanned<String>,
    extra::Err<Rich<'tokens, Token<'src>, Span>>,
> + Clone {
    ident().map_with(|s, e| Spanned::new(s.to_string(), to_ast_span(e.span())))
}

/// Parse a double- or single-quoted string literal.
pub fn string_lit<'tokens, 'src: 'tokens>() -> impl Parser<
    'tokens,
    ParserInput<'tokens, 'src>,
    &'src str,
    extra::Err<Rich<'tokens, Token<'src>, Span>>,
> + Clone {
    select! {
        Token::DoubleQuoted(s) => s,
        Token::SingleQuoted(s) => s,
    }
    .labelled("string")
}

/// Parse a spanned string literal.
pub fn spanned_string<'tokens, 'src: 'tokens>() -> impl Parser<
    'tokens,
    ParserInput<'tokens, 'src>,
    Spanned<String>,
    extra::Err<Rich<'tokens, Token<'src>, Span>>,
> + Clone {
    string_lit().map_with(|s, e| Spanned::new(s.to_string(), to_ast_span(e.span())))
}

/// Parse a number, optionally negative, keeping its text.
///
/// Numbers are validated later so that `0` or `-1` get a semantic diagnostic
/// rather than a syntax error.
pub fn spanned_number<'tokens, 'src: 'tokens>() -> impl Parser<
    'tokens,
    ParserInput<'tokens, 'src>,
    Spanned<String>,
    extra::Err<Rich<'tokens, Token<'src>, Span>>,
> + Clone {
    just(Token::Operator("-"))
        .or_not()
        .then(select! {
            Token::Int(s) => s,
            Token::Float(s) => s,
        })
        .map_with(|(minus, digits), e| {
            let text = match minus {
                Some(_) => format!("-{}", digits),
                None => digits.to_string(),
            };
            Spanned::new(text, to_ast_span(e.span()))
        })
        .labelled("number")
}

/// Parse an identifier or keyword that can be used as a key.
pub fn key<'tokens, 'src: 'tokens>() -> impl Parser<
    'tokens,
    ParserInput<'tokens, 'src>,
    Spanned<String>,
    extra::Err<Rich<'tokens, Token<'src>, Span>>,
> + Clone {
    select! {
        Token::Ident(s) => s.to_string(),
        tok if tok.is_keyword() => tok.to_string(),
    }
    .map_with(|s, e| Spanned::new(s, to_ast_span(e.span())))
    .labelled("parameter name")
}

/// Parse a simple value: identifier, keyword, number or string, as text.
pub fn spanned_value<'tokens, 'src: 'tokens>() -> impl Parser<
    'tokens,
    ParserInput<'tokens, 'src>,
    Spanned<String>,
    extra::Err<Rich<'tokens, Token<'src>, Span>>,
> + Clone {
    choice((key(), spanned_string(), spanned_number()))
}

/// Parse a `.` statement terminator.
pub fn dot<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, (), extra::Err<Rich<'tokens, Token<'src>, Span>>>
       + Clone {
    just(Token::Dot).ignored()
}

/// Where a statement ends: its `.` or the `}` closing the enclosing block.
pub fn statement_end<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, (), extra::Err<Rich<'tokens, Token<'src>, Span>>>
       + Clone {
    choice((just(Token::Dot), just(Token::RBrace))).ignored()
}

/// Skip a broken statement up to and including its `.`, or up to the
/// enclosing `}` when the `.` is missing. Fails without consuming anything
/// at a `}`.
pub fn skip_statement<'tokens, 'src: 'tokens>(
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, (), extra::Err<Rich<'tokens, Token<'src>, Span>>>
       + Clone {
    let body = any().and_is(statement_end().not());
    choice((
        body.clone().repeated().then(dot()).ignored(),
        body.repeated().at_least(1).ignored(),
    ))
}

/// Parse one `.`-terminated statement of a block.
///
/// A statement that fails is first retried from each later token up to its
/// end, then skipped whole. Its error is kept either way and the enclosing
/// block keeps parsing; a skipped statement yields `None`.
pub fn statement<'tokens, 'src: 'tokens, O, P>(
    parser: P,
) -> impl Parser<'tokens, ParserInput<'tokens, 'src>, Option<O>, extra::Err<Rich<'tokens, Token<'src>, Span>>>
       + Clone
where
    P: Parser<'tokens, ParserInput<'tokens, 'src>, O, extra::Err<Rich<'tokens, Token<'src>, Span>>>
        + Clone,
{
    parser
        .map(Some)
        .recover_with(skip_then_retry_until(any().ignored(), statement_end()))
        .recover_with(via_parser(skip_statement().map(|()| None::<O>)))
}

/// Render tokens back to compact source-like text.
///
/// Adjacent word-like tokens are separated by one space; punctuation is
/// glued to its neighbours.
pub fn render_tokens(tokens: &[Token<'_>]) -> String {
    fn is_word(tok: &Token<'_>) -> bool {
        matches!(tok, Token::Ident(_) | Token::Int(_) | Token::Float(_)) || tok.is_keyword()
    }

    let mut out = String::new();
    let mut previous: Option<&Token<'_>> = None;
    for tok in tokens {
        if let Some(prev) = previous {
            let spaced = (is_word(prev) && is_word(tok))
                || matches!(prev, Token::Operator(_))
                || matches!(tok, Token::Operator(_));
            if spaced {
                out.push(' ');
            }
        }
        out.push_str(&tok.to_string());
        previous = Some(tok);
    }
    out
}
