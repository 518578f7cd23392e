//! Test script parser.
//!
//! ```text
//! masTest {
//!    mas = "elevator.mas2g".
//!    timeout = 30.
//!
//!    manager {
//!       do main.
//!       eventually bel(done), not(goal(serve(_))).
//!       never percept(crash).
//!    }
//! }
//! ```

use crate::ast::{
    AgentTest, MentalLiteral, MentalOperator, Spanned, TemporalOperator, TestCondition, TestFile,
};
use crate::humanize::Rule;
use crate::lexer::Token;
use chumsky::prelude::*;
use chumsky::recovery::skip_then_retry_until;

use super::primitives::{
    dot, render_tokens, spanned_ident, spanned_number, spanned_string, statement, to_ast_span,
    ParserInput, Span,
};

fn mas_ref<'tokens, 'src: 'tokens>() -> impl Parser<
    'tokens,
    ParserInput<'tokens, 'src>,
    Spanned<String>,
    extra::Err<Rich<'tokens, Token<'src>, Span>>,
> + Clone {
    just(Token::Mas)
        .ignore_then(just(Token::Eq))
        .ignore_then(spanned_string())
        .then_ignore(dot())
        .labelled(Rule::MasRef.name())
        .as_context()
}

fn timeout<'tokens, 'src: 'tokens>() -> impl Parser<
    'tokens,
    ParserInput<'tokens, 'src>,
    Spanned<String>,
    extra::Err<Rich<'tokens, Token<'src>, Span>>,
> + Clone {
    just(Token::Timeout)
        .ignore_then(just(Token::Eq))
        .ignore_then(spanned_number())
        .then_ignore(dot())
        .labelled(Rule::Timeout.name())
        .as_context()
}

/// Any tokens with balanced parentheses, stopping at `.`, `{` and `}`.
fn term<'tokens, 'src: 'tokens>() -> impl Parser<
    'tokens,
    ParserInput<'tokens, 'src>,
    Spanned<String>,
    extra::Err<Rich<'tokens, Token<'src>, Span>>,
> + Clone {
    let item = recursive(|item| {
        let nested = just(Token::LParen)
            .then(item.repeated().collect::<Vec<Vec<Token<'src>>>>())
            .then(just(Token::RParen))
            .map(|((open, inner), close)| {
                let mut tokens = vec![open];
                tokens.extend(inner.into_iter().flatten());
                tokens.push(close);
                tokens
            });

        let plain = any()
            .filter(|tok: &Token<'src>| {
                !matches!(
                    tok,
                    Token::LParen | Token::RParen | Token::Dot | Token::LBrace | Token::RBrace
                )
            })
            .map(|tok| vec![tok]);

        choice((nested, plain))
    });

    item.repeated()
        .at_least(1)
        .collect::<Vec<Vec<Token<'src>>>>()
        .map_with(|items, e| {
            let tokens: Vec<Token<'src>> = items.into_iter().flatten().collect();
            Spanned::new(render_tokens(&tokens), to_ast_span(e.span()))
        })
        .labelled(Rule::Term.name())
}

fn mental_atom<'tokens, 'src: 'tokens>() -> impl Parser<
    'tokens,
    ParserInput<'tokens, 'src>,
    (MentalOperator, Spanned<String>),
    extra::Err<Rich<'tokens, Token<'src>, Span>>,
> + Clone {
    select! {
        Token::Bel => MentalOperator::Bel,
        Token::Goal => MentalOperator::Goal,
        Token::AGoal => MentalOperator::AGoal,
        Token::GoalA => MentalOperator::GoalA,
        Token::Percept => MentalOperator::Percept,
    }
    .then(term().delimited_by(just(Token::LParen), just(Token::RParen)))
    .labelled(Rule::MentalAtom.name())
    .as_context()
}

fn mental_literal<'tokens, 'src: 'tokens>() -> impl Parser<
    'tokens,
    ParserInput<'tokens, 'src>,
    Spanned<MentalLiteral>,
    extra::Err<Rich<'tokens, Token<'src>, Span>>,
> + Clone {
    let negated = just(Token::Not)
        .ignore_then(mental_atom().delimited_by(just(Token::LParen), just(Token::RParen)))
        .map(|atom| (true, atom));
    let positive = mental_atom().map(|atom| (false, atom));

    choice((negated, positive))
        .map_with(|(negated, (operator, term)), e| {
            Spanned::new(
                MentalLiteral {
                    negated,
                    operator,
                    term,
                },
                to_ast_span(e.span()),
            )
        })
        .labelled(Rule::MentalLiteral.name())
        .as_context()
}

fn test_condition<'tokens, 'src: 'tokens>() -> impl Parser<
    'tokens,
    ParserInput<'tokens, 'src>,
    Spanned<TestCondition>,
    extra::Err<Rich<'tokens, Token<'src>, Span>>,
> + Clone {
    let msc = mental_literal()
        .separated_by(just(Token::Comma))
        .at_least(1)
        .collect::<Vec<_>>()
        .labelled(Rule::Msc.name())
        .as_context();

    select! {
        Token::AtStart => TemporalOperator::AtStart,
        Token::Eventually => TemporalOperator::Eventually,
        Token::Always => TemporalOperator::Always,
        Token::Never => TemporalOperator::Never,
        Token::AtEnd => TemporalOperator::AtEnd,
    }
    .then(msc)
    .then_ignore(dot())
    .map_with(|(operator, literals), e| {
        Spanned::new(TestCondition { operator, literals }, to_ast_span(e.span()))
    })
    .labelled(Rule::TestCondition.name())
    .as_context()
}

fn agent_test<'tokens, 'src: 'tokens>() -> impl Parser<
    'tokens,
    ParserInput<'tokens, 'src>,
    Spanned<AgentTest>,
    extra::Err<Rich<'tokens, Token<'src>, Span>>,
> + Clone {
    let module = just(Token::Do)
        .ignore_then(spanned_ident())
        .then_ignore(dot())
        .labelled(Rule::ModuleRef.name())
        .as_context();

    spanned_ident()
        .then_ignore(just(Token::LBrace))
        .then(module.or_not())
        .then(statement(test_condition()).repeated().collect::<Vec<_>>())
        .then_ignore(just(Token::RBrace))
        .map_with(|((agent, module), conditions), e| {
            Spanned::new(
                AgentTest {
                    agent,
                    module,
                    conditions: conditions.into_iter().flatten().collect(),
                },
                to_ast_span(e.span()),
            )
        })
        .labelled(Rule::AgentTest.name())
        .as_context()
}

/// Parse a complete test script.
pub fn test_file<'tokens, 'src: 'tokens>() -> impl Parser<
    'tokens,
    ParserInput<'tokens, 'src>,
    TestFile,
    extra::Err<Rich<'tokens, Token<'src>, Span>>,
> + Clone {
    // A broken agent test is skipped until the next test can start
    let test = agent_test().recover_with(skip_then_retry_until(
        any().ignored(),
        just(Token::RBrace).ignored(),
    ));

    just(Token::MasTest)
        .ignore_then(just(Token::LBrace))
        .ignore_then(mas_ref())
        .then(timeout().or_not())
        .then(test.repeated().collect::<Vec<_>>())
        .then_ignore(just(Token::RBrace))
        .then_ignore(end())
        .map(|((mas, timeout), tests)| TestFile {
            mas,
            timeout,
            tests,
        })
        .labelled(Rule::Test2g.name())
        .as_context()
}
