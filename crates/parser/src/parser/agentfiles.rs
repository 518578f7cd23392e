//! Agent files section parser.
//!
//! ```text
//! agentfiles {
//!    "elevator.goal" [name = caragent, language = swiprolog].
//!    "manager.goal".
//! }
//! ```

use crate::ast::{AgentFileDecl, AgentFileParameter, Spanned};
use crate::humanize::Rule;
use crate::lexer::Token;
use chumsky::prelude::*;

use super::primitives::{
    dot, key, spanned_string, spanned_value, statement, to_ast_span, ParserInput, Span,
};

fn agent_file_parameter<'tokens, 'src: 'tokens>() -> impl Parser<
    'tokens,
    ParserInput<'tokens, 'src>,
    Spanned<AgentFileParameter>,
    extra::Err<Rich<'tokens, Token<'src>, Span>>,
> + Clone {
    key()
        .then_ignore(just(Token::Eq))
        .then(spanned_value())
        .map_with(|(key, value), e| {
            Spanned::new(AgentFileParameter { key, value }, to_ast_span(e.span()))
        })
        .labelled(Rule::AgentFileParameter.name())
        .as_context()
}

fn agent_file<'tokens, 'src: 'tokens>() -> impl Parser<
    'tokens,
    ParserInput<'tokens, 'src>,
    Spanned<AgentFileDecl>,
    extra::Err<Rich<'tokens, Token<'src>, Span>>,
> + Clone {
    let params = agent_file_parameter()
        .separated_by(just(Token::Comma))
        .at_least(1)
        .collect::<Vec<_>>()
        .delimited_by(just(Token::LBracket), just(Token::RBracket));

    spanned_string()
        .then(params.or_not())
        .then_ignore(dot())
        .map_with(|(path, params), e| {
            Spanned::new(
                AgentFileDecl {
                    path,
                    params: params.unwrap_or_default(),
                },
                to_ast_span(e.span()),
            )
        })
        .labelled(Rule::AgentFile.name())
        .as_context()
}

/// Parse the agent files section.
pub fn agent_files_section<'tokens, 'src: 'tokens>() -> impl Parser<
    'tokens,
    ParserInput<'tokens, 'src>,
    Vec<Spanned<AgentFileDecl>>,
    extra::Err<Rich<'tokens, Token<'src>, Span>>,
> + Clone {
    just(Token::AgentFiles)
        .ignore_then(
            statement(agent_file())
                .repeated()
                .collect::<Vec<_>>()
                .delimited_by(just(Token::LBrace), just(Token::RBrace)),
        )
        .map(|decls| decls.into_iter().flatten().collect::<Vec<_>>())
        .labelled(Rule::AgentFiles.name())
        .as_context()
}
