//! Launch policy parser.
//!
//! ```text
//! launchpolicy {
//!    launch manager : "manager.goal".
//!    when [type = car, max = 4]@env do launch * : caragent.
//!    when elevator1@env do launch car[number = 2] : caragent.
//! }
//! ```

use crate::ast::{
    AgentRef, Constraint, ConstraintKind, Entity, LaunchComponent, LaunchName, LaunchPolicy,
    LaunchRule, Spanned,
};
use crate::humanize::Rule;
use crate::lexer::Token;
use chumsky::prelude::*;

use super::primitives::{dot, spanned_value, statement, to_ast_span, ParserInput, Span};

fn agent_ref<'tokens, 'src: 'tokens>() -> impl Parser<
    'tokens,
    ParserInput<'tokens, 'src>,
    Spanned<AgentRef>,
    extra::Err<Rich<'tokens, Token<'src>, Span>>,
> + Clone {
    select! {
        Token::Ident(s) => AgentRef::Name(s.to_string()),
        Token::DoubleQuoted(s) => AgentRef::Path(s.to_string()),
        Token::SingleQuoted(s) => AgentRef::Path(s.to_string()),
    }
    .map_with(|r, e| Spanned::new(r, to_ast_span(e.span())))
    .labelled(Rule::AgentRef.name())
}

/// Parse `name[number = N] : agentRef`.
fn launch_component<'tokens, 'src: 'tokens>() -> impl Parser<
    'tokens,
    ParserInput<'tokens, 'src>,
    Spanned<LaunchComponent>,
    extra::Err<Rich<'tokens, Token<'src>, Span>>,
> + Clone {
    let name = select! {
        Token::Ident(s) => LaunchName::Named(s.to_string()),
        Token::Star => LaunchName::Wildcard,
    }
    .map_with(|n, e| Spanned::new(n, to_ast_span(e.span())))
    .labelled("agent name");

    let number = just(Token::Number)
        .ignore_then(just(Token::Eq))
        .ignore_then(spanned_value())
        .delimited_by(just(Token::LBracket), just(Token::RBracket));

    name.then(number.or_not())
        .then_ignore(just(Token::Colon))
        .then(agent_ref())
        .map_with(|((name, number), target), e| {
            Spanned::new(
                LaunchComponent {
                    name,
                    number,
                    target,
                },
                to_ast_span(e.span()),
            )
        })
        .labelled(Rule::LaunchRuleComponent.name())
        .as_context()
}

/// Parse `launch c1, c2.`
fn launch<'tokens, 'src: 'tokens>() -> impl Parser<
    'tokens,
    ParserInput<'tokens, 'src>,
    Vec<Spanned<LaunchComponent>>,
    extra::Err<Rich<'tokens, Token<'src>, Span>>,
> + Clone {
    just(Token::Launch)
        .ignore_then(
            launch_component()
                .separated_by(just(Token::Comma))
                .at_least(1)
                .collect::<Vec<_>>(),
        )
        .then_ignore(dot())
        .labelled(Rule::Launch.name())
        .as_context()
}

fn constraint<'tokens, 'src: 'tokens>() -> impl Parser<
    'tokens,
    ParserInput<'tokens, 'src>,
    Spanned<Constraint>,
    extra::Err<Rich<'tokens, Token<'src>, Span>>,
> + Clone {
    select! {
        Token::Name => ConstraintKind::Name,
        Token::Type => ConstraintKind::Type,
        Token::Max => ConstraintKind::Max,
    }
    .labelled("'name', 'type' or 'max'")
    .then_ignore(just(Token::Eq))
    .then(spanned_value())
    .map_with(|(kind, value), e| Spanned::new(Constraint { kind, value }, to_ast_span(e.span())))
    .labelled(Rule::Constraint.name())
    .as_context()
}

/// Parse `[constraints]@env`, `name@env` or `*@env`.
fn entity<'tokens, 'src: 'tokens>() -> impl Parser<
    'tokens,
    ParserInput<'tokens, 'src>,
    Spanned<Entity>,
    extra::Err<Rich<'tokens, Token<'src>, Span>>,
> + Clone {
    let constraints = constraint()
        .separated_by(just(Token::Comma))
        .at_least(1)
        .collect::<Vec<_>>()
        .delimited_by(just(Token::LBracket), just(Token::RBracket))
        .map(Entity::Constraints);

    let named = select! {
        Token::Ident(s) => Entity::Named(s.to_string()),
        Token::Star => Entity::Any,
    }
    .labelled("entity name");

    choice((constraints, named))
        .then_ignore(just(Token::AtEnv))
        .map_with(|entity, e| Spanned::new(entity, to_ast_span(e.span())))
        .labelled(Rule::Entity.name())
        .as_context()
}

fn launch_rule<'tokens, 'src: 'tokens>() -> impl Parser<
    'tokens,
    ParserInput<'tokens, 'src>,
    Spanned<LaunchRule>,
    extra::Err<Rich<'tokens, Token<'src>, Span>>,
> + Clone {
    let conditional = just(Token::When)
        .ignore_then(entity())
        .then_ignore(just(Token::Do))
        .then(launch())
        .map(|(condition, components)| LaunchRule {
            condition: Some(condition),
            components,
        });

    let unconditional = launch().map(|components| LaunchRule {
        condition: None,
        components,
    });

    choice((conditional, unconditional))
        .map_with(|rule, e| Spanned::new(rule, to_ast_span(e.span())))
        .labelled(Rule::LaunchRule.name())
        .as_context()
}

/// Parse the launch policy section.
pub fn launch_policy_section<'tokens, 'src: 'tokens>() -> impl Parser<
    'tokens,
    ParserInput<'tokens, 'src>,
    Spanned<LaunchPolicy>,
    extra::Err<Rich<'tokens, Token<'src>, Span>>,
> + Clone {
    just(Token::LaunchPolicy)
        .ignore_then(
            statement(launch_rule())
                .repeated()
                .collect::<Vec<_>>()
                .delimited_by(just(Token::LBrace), just(Token::RBrace)),
        )
        .map_with(|rules, e| {
            let rules = rules.into_iter().flatten().collect();
            Spanned::new(LaunchPolicy { rules }, to_ast_span(e.span()))
        })
        .labelled(Rule::LaunchPolicy.name())
        .as_context()
}
