//! Environment section parser.
//!
//! ```text
//! environment {
//!    env = "elevator.jar".
//!    init = [floors = 4, cars = [a, b], seed = random(42)].
//! }
//! ```

use crate::ast::{EnvironmentSection, InitKeyValue, InitValue, Spanned};
use crate::humanize::Rule;
use crate::lexer::Token;
use chumsky::prelude::*;

use super::primitives::{dot, key, spanned_string, statement, to_ast_span, ParserInput, Span};

/// Parse `env = "<archive>".`
fn env_ref<'tokens, 'src: 'tokens>() -> impl Parser<
    'tokens,
    ParserInput<'tokens, 'src>,
    Spanned<String>,
    extra::Err<Rich<'tokens, Token<'src>, Span>>,
> + Clone {
    just(Token::Env)
        .ignore_then(just(Token::Eq))
        .ignore_then(spanned_string())
        .then_ignore(dot())
        .labelled(Rule::EnvRef.name())
        .as_context()
}

/// Parse an initialization value; functions and lists nest.
fn init_expr<'tokens, 'src: 'tokens>() -> impl Parser<
    'tokens,
    ParserInput<'tokens, 'src>,
    InitValue,
    extra::Err<Rich<'tokens, Token<'src>, Span>>,
> + Clone {
    recursive(|expr| {
        let args = expr
            .clone()
            .separated_by(just(Token::Comma))
            .at_least(1)
            .collect::<Vec<_>>();

        let function = select! { Token::Ident(s) => s }
            .then(args.delimited_by(just(Token::LParen), just(Token::RParen)))
            .map(|(name, args)| InitValue::Function {
                name: name.to_string(),
                args,
            });

        let list = expr
            .separated_by(just(Token::Comma))
            .collect::<Vec<_>>()
            .delimited_by(just(Token::LBracket), just(Token::RBracket))
            .map(InitValue::List);

        let atom = select! {
            Token::Ident(s) => InitValue::Identifier(s.to_string()),
            Token::Int(s) => InitValue::Integer(s.to_string()),
            Token::Float(s) => InitValue::Float(s.to_string()),
            Token::DoubleQuoted(s) => InitValue::String(s.to_string()),
            Token::SingleQuoted(s) => InitValue::String(s.to_string()),
        };

        choice((function, list, atom))
            .labelled(Rule::InitExpr.name())
            .as_context()
    })
}

fn init_key_value<'tokens, 'src: 'tokens>() -> impl Parser<
    'tokens,
    ParserInput<'tokens, 'src>,
    Spanned<InitKeyValue>,
    extra::Err<Rich<'tokens, Token<'src>, Span>>,
> + Clone {
    key()
        .then_ignore(just(Token::Eq))
        .then(init_expr().map_with(|v, e| Spanned::new(v, to_ast_span(e.span()))))
        .map_with(|(key, value), e| Spanned::new(InitKeyValue { key, value }, to_ast_span(e.span())))
        .labelled(Rule::InitKeyValue.name())
        .as_context()
}

/// Parse `init = [k = v, ...].`
fn initialization<'tokens, 'src: 'tokens>() -> impl Parser<
    'tokens,
    ParserInput<'tokens, 'src>,
    Vec<Spanned<InitKeyValue>>,
    extra::Err<Rich<'tokens, Token<'src>, Span>>,
> + Clone {
    just(Token::Init)
        .ignore_then(just(Token::Eq))
        .ignore_then(
            init_key_value()
                .separated_by(just(Token::Comma))
                .at_least(1)
                .collect::<Vec<_>>()
                .delimited_by(just(Token::LBracket), just(Token::RBracket)),
        )
        .then_ignore(dot())
        .labelled(Rule::Initialization.name())
        .as_context()
}

/// Parse the environment section.
pub fn environment_section<'tokens, 'src: 'tokens>() -> impl Parser<
    'tokens,
    ParserInput<'tokens, 'src>,
    Spanned<EnvironmentSection>,
    extra::Err<Rich<'tokens, Token<'src>, Span>>,
> + Clone {
    // A skipped reference leaves an empty path; the unit is unusable anyway
    let env = statement(env_ref()).map_with(|env, e| {
        env.unwrap_or_else(|| Spanned::new(String::new(), to_ast_span(e.span())))
    });

    just(Token::Environment)
        .ignore_then(just(Token::LBrace))
        .ignore_then(env)
        .then(statement(initialization()).or_not())
        .then_ignore(just(Token::RBrace))
        .map_with(|(env, init), e| {
            Spanned::new(
                EnvironmentSection {
                    env,
                    init: init.flatten().unwrap_or_default(),
                },
                to_ast_span(e.span()),
            )
        })
        .labelled(Rule::Environment.name())
        .as_context()
}
