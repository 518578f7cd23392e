//! Humanized names for tokens and grammar rules.
//!
//! Parser errors are phrased in terms of the language a MAS author writes, not
//! in terms of the grammar's internal terminal and rule names. Each lookup is a
//! finite override table with a fallback to the grammar's own symbolic name,
//! so every description is total:
//!
//! ```rust
//! use mas2g_parser::humanize::{describe_rule, describe_token, describe_token_kind, Rule};
//! use mas2g_parser::lexer::{Token, TokenKind};
//!
//! assert_eq!(describe_token_kind(TokenKind::Float), "floating point");
//! assert_eq!(describe_token_kind(TokenKind::Eof), "end of file");
//! assert_eq!(describe_token_kind(TokenKind::Launch), "'launch'");
//! assert_eq!(describe_token(&Token::Ident("bob")), "identifier 'bob'");
//! assert_eq!(describe_rule(Rule::Msc), "a mental state condition");
//! assert_eq!(describe_rule(Rule::Term), "term");
//! ```

use crate::lexer::{Token, TokenKind};
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::fmt;

/// Phrase used for the end of the token stream.
pub const END_OF_FILE: &str = "end of file";

/// Grammar productions that can be active when a parse error occurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Rule {
    MasFile,
    Environment,
    EnvRef,
    Initialization,
    InitKeyValue,
    InitExpr,
    AgentFiles,
    AgentFile,
    AgentFileParameter,
    LaunchPolicy,
    LaunchRule,
    Launch,
    LaunchRuleComponent,
    Entity,
    Constraint,
    AgentRef,
    Test2g,
    MasRef,
    Timeout,
    AgentTest,
    ModuleRef,
    TestCondition,
    Msc,
    MentalLiteral,
    MentalAtom,
    Term,
}

impl Rule {
    pub const ALL: &'static [Rule] = &[
        Rule::MasFile,
        Rule::Environment,
        Rule::EnvRef,
        Rule::Initialization,
        Rule::InitKeyValue,
        Rule::InitExpr,
        Rule::AgentFiles,
        Rule::AgentFile,
        Rule::AgentFileParameter,
        Rule::LaunchPolicy,
        Rule::LaunchRule,
        Rule::Launch,
        Rule::LaunchRuleComponent,
        Rule::Entity,
        Rule::Constraint,
        Rule::AgentRef,
        Rule::Test2g,
        Rule::MasRef,
        Rule::Timeout,
        Rule::AgentTest,
        Rule::ModuleRef,
        Rule::TestCondition,
        Rule::Msc,
        Rule::MentalLiteral,
        Rule::MentalAtom,
        Rule::Term,
    ];

    /// The grammar's name for this production, used as the parser label.
    pub fn name(self) -> &'static str {
        match self {
            Rule::MasFile => "masFile",
            Rule::Environment => "environment",
            Rule::EnvRef => "envRef",
            Rule::Initialization => "initialization",
            Rule::InitKeyValue => "initKeyValue",
            Rule::InitExpr => "initExpr",
            Rule::AgentFiles => "agentFiles",
            Rule::AgentFile => "agentFile",
            Rule::AgentFileParameter => "agentFileParameter",
            Rule::LaunchPolicy => "launchPolicy",
            Rule::LaunchRule => "launchRule",
            Rule::Launch => "launch",
            Rule::LaunchRuleComponent => "launchRuleComponent",
            Rule::Entity => "entity",
            Rule::Constraint => "constraint",
            Rule::AgentRef => "agentRef",
            Rule::Test2g => "test2g",
            Rule::MasRef => "masRef",
            Rule::Timeout => "timeout",
            Rule::AgentTest => "agentTest",
            Rule::ModuleRef => "moduleRef",
            Rule::TestCondition => "testCondition",
            Rule::Msc => "msc",
            Rule::MentalLiteral => "mentalLiteral",
            Rule::MentalAtom => "mentalAtom",
            Rule::Term => "term",
        }
    }

    pub fn from_name(name: &str) -> Option<Rule> {
        Rule::ALL.iter().copied().find(|r| r.name() == name)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(describe_rule(*self))
    }
}

lazy_static! {
    static ref TOKEN_PHRASES: HashMap<TokenKind, &'static str> = HashMap::from([
        (TokenKind::Ident, "identifier"),
        (TokenKind::Int, "integer"),
        (TokenKind::Float, "floating point"),
        (TokenKind::DoubleQuoted, "double-quoted string"),
        (TokenKind::SingleQuoted, "single-quoted string"),
        (TokenKind::UnterminatedDouble, "unterminated double-quoted string"),
        (TokenKind::UnterminatedSingle, "unterminated single-quoted string"),
        (TokenKind::Unknown, "unrecognized input"),
        (TokenKind::Operator, "operator"),
        (TokenKind::Eof, END_OF_FILE),
    ]);

    static ref RULE_PHRASES: HashMap<Rule, &'static str> = HashMap::from([
        (Rule::MasFile, "a MAS file"),
        (Rule::Environment, "the environment section"),
        (Rule::EnvRef, "the environment reference"),
        (Rule::Initialization, "the environment initialization"),
        (Rule::InitKeyValue, "an initialization parameter"),
        (Rule::InitExpr, "an initialization value"),
        (Rule::AgentFiles, "the agent files section"),
        (Rule::AgentFile, "an agent file declaration"),
        (Rule::AgentFileParameter, "an agent file parameter"),
        (Rule::LaunchPolicy, "the launch policy"),
        (Rule::LaunchRule, "a launch rule"),
        (Rule::Launch, "a launch instruction"),
        (Rule::LaunchRuleComponent, "an agent to launch"),
        (Rule::Entity, "an environment entity"),
        (Rule::Constraint, "an entity constraint"),
        (Rule::AgentRef, "an agent file reference"),
        (Rule::Test2g, "a test file"),
        (Rule::MasRef, "the MAS reference"),
        (Rule::Timeout, "the timeout"),
        (Rule::AgentTest, "an agent test"),
        (Rule::ModuleRef, "a module reference"),
        (Rule::TestCondition, "a test condition"),
        (Rule::Msc, "a mental state condition"),
        (Rule::MentalLiteral, "a mental literal"),
        (Rule::MentalAtom, "a mental atom"),
    ]);
}

/// Phrase for a token type.
pub fn describe_token_kind(kind: TokenKind) -> &'static str {
    TOKEN_PHRASES
        .get(&kind)
        .copied()
        .unwrap_or_else(|| kind.symbolic_name())
}

/// Phrase for a concrete token, including its text where that helps.
pub fn describe_token(token: &Token<'_>) -> String {
    let phrase = describe_token_kind(token.kind());
    match token {
        Token::Ident(s) | Token::Operator(s) | Token::Unknown(s) => format!("{} '{}'", phrase, s),
        Token::Int(s) | Token::Float(s) => format!("{} {}", phrase, s),
        Token::DoubleQuoted(s) | Token::UnterminatedDouble(s) => format!("{} \"{}\"", phrase, s),
        Token::SingleQuoted(s) | Token::UnterminatedSingle(s) => format!("{} '{}'", phrase, s),
        _ => phrase.to_string(),
    }
}

/// Phrase for what was found where a parse failed; `None` is the end of input.
pub fn describe_found(token: Option<&Token<'_>>) -> String {
    token.map_or_else(|| END_OF_FILE.to_string(), describe_token)
}

pub fn describe_rule(rule: Rule) -> &'static str {
    RULE_PHRASES.get(&rule).copied().unwrap_or_else(|| rule.name())
}

/// Phrase for a raw parser label; labels that are not rule names pass through.
pub fn describe_label(label: &str) -> &str {
    match Rule::from_name(label) {
        Some(rule) => describe_rule(rule),
        None => label,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_every_token_kind_has_a_phrase() {
        for kind in TokenKind::ALL {
            assert!(!describe_token_kind(*kind).is_empty(), "{:?}", kind);
        }
    }

    #[test]
    fn test_every_rule_has_a_phrase() {
        for rule in Rule::ALL {
            assert!(!describe_rule(*rule).is_empty(), "{:?}", rule);
        }
    }

    #[test]
    fn test_end_of_file() {
        assert_eq!(describe_token_kind(TokenKind::Eof), "end of file");
        assert_eq!(describe_found(None), "end of file");
    }

    #[test]
    fn test_literal_tokens_carry_their_text() {
        assert_eq!(describe_token(&Token::Int("5")), "integer 5");
        assert_eq!(describe_token(&Token::Float("2.5")), "floating point 2.5");
        assert_eq!(
            describe_token(&Token::DoubleQuoted("bob.goal")),
            "double-quoted string \"bob.goal\""
        );
        assert_eq!(describe_token(&Token::SingleQuoted("x")), "single-quoted string 'x'");
    }

    #[test]
    fn test_fixed_tokens_fall_back_to_symbolic_name() {
        assert_eq!(describe_token(&Token::LBrace), "'{'");
        assert_eq!(describe_token(&Token::AtEnv), "'@env'");
        assert_eq!(describe_token_kind(TokenKind::AGoal), "'a-goal'");
    }

    #[test]
    fn test_rule_without_override_uses_grammar_name() {
        assert_eq!(describe_rule(Rule::Term), "term");
    }

    #[test]
    fn test_labels_map_through_rule_names() {
        assert_eq!(describe_label("launchRule"), "a launch rule");
        assert_eq!(describe_label("something else"), "something else");
    }

    #[test]
    fn test_rule_names_round_trip() {
        for rule in Rule::ALL {
            assert_eq!(Rule::from_name(rule.name()), Some(*rule));
        }
    }
}
