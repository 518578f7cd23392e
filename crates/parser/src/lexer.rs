//! Raw lexer for MAS files and test scripts.
//!
//! This is the grammar layer of scanning: it turns characters into tokens and
//! never fails. Input that cannot be completed is still tokenized:
//!
//! - a quoted literal that reaches the end of the line (or file) without its
//!   closing quote becomes [`Token::UnterminatedDouble`] or
//!   [`Token::UnterminatedSingle`];
//! - characters that start no token become [`Token::Unknown`].
//!
//! Both are synthetic error tokens. The [`scanner`](crate::scanner) heals or
//! drops them before the parser sees the stream, and reports them.
//!
//! Whitespace, `%` line comments and `/* */` block comments are skipped.
//!
//! # Example
//!
//! ```rust
//! use mas2g_parser::lexer::{lex, Token};
//!
//! let tokens = lex("launch bob : \"bob.goal\".");
//! let kinds: Vec<_> = tokens.iter().map(|(t, _)| t.clone()).collect();
//! assert_eq!(
//!     kinds,
//!     vec![
//!         Token::Launch,
//!         Token::Ident("bob"),
//!         Token::Colon,
//!         Token::DoubleQuoted("bob.goal"),
//!         Token::Dot,
//!     ]
//! );
//! ```
//!
//! # Token Types
//!
//! | Category | Examples |
//! |----------|----------|
//! | MAS keywords | `environment`, `agentfiles`, `launchpolicy`, `when`, `launch` |
//! | Test keywords | `masTest`, `timeout`, `eventually`, `never` |
//! | Mental operators | `bel`, `goal`, `a-goal`, `goal-a`, `percept` |
//! | Literals | `"text"`, `'text'`, `42`, `2.5`, identifiers |
//! | Punctuation | `{ } [ ] ( ) , . : = *`, `@env` |

use chumsky::prelude::*;
use std::fmt;

/// A token of the MAS and test-script grammars.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Token<'src> {
    // MAS keywords
    Environment,
    Env,
    Init,
    AgentFiles,
    LaunchPolicy,
    Launch,
    When,
    Do,
    Name,
    Type,
    Max,
    Number,

    // Test keywords
    MasTest,
    Mas,
    Timeout,
    AtStart,
    Eventually,
    Always,
    Never,
    AtEnd,

    // Mental state operators
    Bel,
    Goal,
    AGoal,
    GoalA,
    Percept,
    Not,

    // Literals
    Ident(&'src str),
    Int(&'src str),
    Float(&'src str),
    DoubleQuoted(&'src str),
    SingleQuoted(&'src str),

    // Synthetic error tokens, never seen by the parser
    UnterminatedDouble(&'src str),
    UnterminatedSingle(&'src str),
    Unknown(&'src str),

    // Punctuation
    LBrace,   // {
    RBrace,   // }
    LBracket, // [
    RBracket, // ]
    LParen,   // (
    RParen,   // )
    Comma,    // ,
    Dot,      // .
    Colon,    // :
    Eq,       // =
    Star,     // *
    AtEnv,    // @env

    /// Any other run of operator characters inside terms.
    Operator(&'src str),
}

/// Payload-free token type, the key for humanization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TokenKind {
    Environment,
    Env,
    Init,
    AgentFiles,
    LaunchPolicy,
    Launch,
    When,
    Do,
    Name,
    Type,
    Max,
    Number,
    MasTest,
    Mas,
    Timeout,
    AtStart,
    Eventually,
    Always,
    Never,
    AtEnd,
    Bel,
    Goal,
    AGoal,
    GoalA,
    Percept,
    Not,
    Ident,
    Int,
    Float,
    DoubleQuoted,
    SingleQuoted,
    UnterminatedDouble,
    UnterminatedSingle,
    Unknown,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Comma,
    Dot,
    Colon,
    Eq,
    Star,
    AtEnv,
    Operator,
    /// End of the token stream.
    Eof,
}

impl TokenKind {
    pub const ALL: &'static [TokenKind] = &[
        TokenKind::Environment,
        TokenKind::Env,
        TokenKind::Init,
        TokenKind::AgentFiles,
        TokenKind::LaunchPolicy,
        TokenKind::Launch,
        TokenKind::When,
        TokenKind::Do,
        TokenKind::Name,
        TokenKind::Type,
        TokenKind::Max,
        TokenKind::Number,
        TokenKind::MasTest,
        TokenKind::Mas,
        TokenKind::Timeout,
        TokenKind::AtStart,
        TokenKind::Eventually,
        TokenKind::Always,
        TokenKind::Never,
        TokenKind::AtEnd,
        TokenKind::Bel,
        TokenKind::Goal,
        TokenKind::AGoal,
        TokenKind::GoalA,
        TokenKind::Percept,
        TokenKind::Not,
        TokenKind::Ident,
        TokenKind::Int,
        TokenKind::Float,
        TokenKind::DoubleQuoted,
        TokenKind::SingleQuoted,
        TokenKind::UnterminatedDouble,
        TokenKind::UnterminatedSingle,
        TokenKind::Unknown,
        TokenKind::LBrace,
        TokenKind::RBrace,
        TokenKind::LBracket,
        TokenKind::RBracket,
        TokenKind::LParen,
        TokenKind::RParen,
        TokenKind::Comma,
        TokenKind::Dot,
        TokenKind::Colon,
        TokenKind::Eq,
        TokenKind::Star,
        TokenKind::AtEnv,
        TokenKind::Operator,
        TokenKind::Eof,
    ];

    /// The grammar's own name for this terminal: the quoted literal for fixed
    /// tokens, an upper-case symbol for the rest.
    pub fn symbolic_name(self) -> &'static str {
        match self {
            TokenKind::Environment => "'environment'",
            TokenKind::Env => "'env'",
            TokenKind::Init => "'init'",
            TokenKind::AgentFiles => "'agentfiles'",
            TokenKind::LaunchPolicy => "'launchpolicy'",
            TokenKind::Launch => "'launch'",
            TokenKind::When => "'when'",
            TokenKind::Do => "'do'",
            TokenKind::Name => "'name'",
            TokenKind::Type => "'type'",
            TokenKind::Max => "'max'",
            TokenKind::Number => "'number'",
            TokenKind::MasTest => "'masTest'",
            TokenKind::Mas => "'mas'",
            TokenKind::Timeout => "'timeout'",
            TokenKind::AtStart => "'atstart'",
            TokenKind::Eventually => "'eventually'",
            TokenKind::Always => "'always'",
            TokenKind::Never => "'never'",
            TokenKind::AtEnd => "'atend'",
            TokenKind::Bel => "'bel'",
            TokenKind::Goal => "'goal'",
            TokenKind::AGoal => "'a-goal'",
            TokenKind::GoalA => "'goal-a'",
            TokenKind::Percept => "'percept'",
            TokenKind::Not => "'not'",
            TokenKind::Ident => "ID",
            TokenKind::Int => "INT",
            TokenKind::Float => "FLOAT",
            TokenKind::DoubleQuoted => "DOUBLESTRING",
            TokenKind::SingleQuoted => "SINGLESTRING",
            TokenKind::UnterminatedDouble => "UNTERMINATED_DOUBLESTRING",
            TokenKind::UnterminatedSingle => "UNTERMINATED_SINGLESTRING",
            TokenKind::Unknown => "UNKNOWN",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::Comma => "','",
            TokenKind::Dot => "'.'",
            TokenKind::Colon => "':'",
            TokenKind::Eq => "'='",
            TokenKind::Star => "'*'",
            TokenKind::AtEnv => "'@env'",
            TokenKind::Operator => "OPERATOR",
            TokenKind::Eof => "EOF",
        }
    }
}

impl Token<'_> {
    pub fn kind(&self) -> TokenKind {
        match self {
            Token::Environment => TokenKind::Environment,
            Token::Env => TokenKind::Env,
            Token::Init => TokenKind::Init,
            Token::AgentFiles => TokenKind::AgentFiles,
            Token::LaunchPolicy => TokenKind::LaunchPolicy,
            Token::Launch => TokenKind::Launch,
            Token::When => TokenKind::When,
            Token::Do => TokenKind::Do,
            Token::Name => TokenKind::Name,
            Token::Type => TokenKind::Type,
            Token::Max => TokenKind::Max,
            Token::Number => TokenKind::Number,
            Token::MasTest => TokenKind::MasTest,
            Token::Mas => TokenKind::Mas,
            Token::Timeout => TokenKind::Timeout,
            Token::AtStart => TokenKind::AtStart,
            Token::Eventually => TokenKind::Eventually,
            Token::Always => TokenKind::Always,
            Token::Never => TokenKind::Never,
            Token::AtEnd => TokenKind::AtEnd,
            Token::Bel => TokenKind::Bel,
            Token::Goal => TokenKind::Goal,
            Token::AGoal => TokenKind::AGoal,
            Token::GoalA => TokenKind::GoalA,
            Token::Percept => TokenKind::Percept,
            Token::Not => TokenKind::Not,
            Token::Ident(_) => TokenKind::Ident,
            Token::Int(_) => TokenKind::Int,
            Token::Float(_) => TokenKind::Float,
            Token::DoubleQuoted(_) => TokenKind::DoubleQuoted,
            Token::SingleQuoted(_) => TokenKind::SingleQuoted,
            Token::UnterminatedDouble(_) => TokenKind::UnterminatedDouble,
            Token::UnterminatedSingle(_) => TokenKind::UnterminatedSingle,
            Token::Unknown(_) => TokenKind::Unknown,
            Token::LBrace => TokenKind::LBrace,
            Token::RBrace => TokenKind::RBrace,
            Token::LBracket => TokenKind::LBracket,
            Token::RBracket => TokenKind::RBracket,
            Token::LParen => TokenKind::LParen,
            Token::RParen => TokenKind::RParen,
            Token::Comma => TokenKind::Comma,
            Token::Dot => TokenKind::Dot,
            Token::Colon => TokenKind::Colon,
            Token::Eq => TokenKind::Eq,
            Token::Star => TokenKind::Star,
            Token::AtEnv => TokenKind::AtEnv,
            Token::Operator(_) => TokenKind::Operator,
        }
    }

    /// Reserved words, which may still be used as keys.
    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            Token::Environment
                | Token::Env
                | Token::Init
                | Token::AgentFiles
                | Token::LaunchPolicy
                | Token::Launch
                | Token::When
                | Token::Do
                | Token::Name
                | Token::Type
                | Token::Max
                | Token::Number
                | Token::MasTest
                | Token::Mas
                | Token::Timeout
                | Token::AtStart
                | Token::Eventually
                | Token::Always
                | Token::Never
                | Token::AtEnd
                | Token::Bel
                | Token::Goal
                | Token::Percept
                | Token::Not
        )
    }

    /// Source text carried by literal-like tokens.
    pub fn text(&self) -> Option<&str> {
        match self {
            Token::Ident(s)
            | Token::Int(s)
            | Token::Float(s)
            | Token::DoubleQuoted(s)
            | Token::SingleQuoted(s)
            | Token::UnterminatedDouble(s)
            | Token::UnterminatedSingle(s)
            | Token::Unknown(s)
            | Token::Operator(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(s) | Token::Int(s) | Token::Float(s) => write!(f, "{}", s),
            Token::Operator(s) | Token::Unknown(s) => write!(f, "{}", s),
            Token::DoubleQuoted(s) => write!(f, "\"{}\"", s),
            Token::SingleQuoted(s) => write!(f, "'{}'", s),
            Token::UnterminatedDouble(s) => write!(f, "\"{}", s),
            Token::UnterminatedSingle(s) => write!(f, "'{}", s),
            other => write!(f, "{}", other.kind().symbolic_name().trim_matches('\'')),
        }
    }
}

/// Span type for tokens.
pub type Span = SimpleSpan<usize>;

/// A token with its span.
pub type Spanned<T> = (T, Span);

/// Length of the whitespace, `%` line comments and `/* */` block comments
/// at the start of `text`. An unclosed block comment runs to the end.
fn padding_len(text: &str) -> usize {
    let mut rest = text;
    loop {
        let trimmed = rest.trim_start_matches([' ', '\t', '\r', '\n']);
        rest = if let Some(comment) = trimmed.strip_prefix('%') {
            comment.find('\n').map_or("", |end| &comment[end..])
        } else if let Some(comment) = trimmed.strip_prefix("/*") {
            comment.find("*/").map_or("", |end| &comment[end + 2..])
        } else {
            return text.len() - trimmed.len();
        };
    }
}

/// Parser for one token at the start of its input.
///
/// Only the first token is read; whatever follows it is left alone.
pub fn token<'src>(
) -> impl Parser<'src, &'src str, Spanned<Token<'src>>, extra::Err<Rich<'src, char, Span>>> + Clone
{
    // Quoted literals stop at the end of the line; a missing closing quote
    // yields the unterminated variant instead of an error.
    let double_quoted = just('"')
        .ignore_then(none_of("\"\n").repeated().to_slice())
        .then(just('"').or_not())
        .map(|(text, closing): (&str, Option<char>)| match closing {
            Some(_) => Token::DoubleQuoted(text),
            None => Token::UnterminatedDouble(text.trim_end_matches('\r')),
        });

    let single_quoted = just('\'')
        .ignore_then(none_of("'\n").repeated().to_slice())
        .then(just('\'').or_not())
        .map(|(text, closing): (&str, Option<char>)| match closing {
            Some(_) => Token::SingleQuoted(text),
            None => Token::UnterminatedSingle(text.trim_end_matches('\r')),
        });

    let number = text::int(10)
        .then(just('.').then(text::digits(10)).or_not())
        .to_slice()
        .map(|s: &str| {
            if s.contains('.') {
                Token::Float(s)
            } else {
                Token::Int(s)
            }
        });

    // Hyphenated operators and `@env` must come before identifiers
    let compound = choice((
        just("a-goal").to(Token::AGoal),
        just("goal-a").to(Token::GoalA),
        just("@env").to(Token::AtEnv),
    ));

    let mas_keywords = choice((
        text::keyword("environment").to(Token::Environment),
        text::keyword("env").to(Token::Env),
        text::keyword("init").to(Token::Init),
        text::keyword("agentfiles").to(Token::AgentFiles),
        text::keyword("launchpolicy").to(Token::LaunchPolicy),
        text::keyword("launch").to(Token::Launch),
        text::keyword("when").to(Token::When),
        text::keyword("do").to(Token::Do),
        text::keyword("name").to(Token::Name),
        text::keyword("type").to(Token::Type),
        text::keyword("max").to(Token::Max),
        text::keyword("number").to(Token::Number),
    ));

    let test_keywords = choice((
        text::keyword("masTest").to(Token::MasTest),
        text::keyword("mas").to(Token::Mas),
        text::keyword("timeout").to(Token::Timeout),
        text::keyword("atstart").to(Token::AtStart),
        text::keyword("eventually").to(Token::Eventually),
        text::keyword("always").to(Token::Always),
        text::keyword("never").to(Token::Never),
        text::keyword("atend").to(Token::AtEnd),
    ));

    let mental_keywords = choice((
        text::keyword("bel").to(Token::Bel),
        text::keyword("goal").to(Token::Goal),
        text::keyword("percept").to(Token::Percept),
        text::keyword("not").to(Token::Not),
    ));

    let keyword = choice((mas_keywords, test_keywords, mental_keywords));

    let ident = text::ident().map(Token::Ident);

    let punctuation = choice((
        just('{').to(Token::LBrace),
        just('}').to(Token::RBrace),
        just('[').to(Token::LBracket),
        just(']').to(Token::RBracket),
        just('(').to(Token::LParen),
        just(')').to(Token::RParen),
        just(',').to(Token::Comma),
        just('.').to(Token::Dot),
        just(':').to(Token::Colon),
        just('=').to(Token::Eq),
        just('*').to(Token::Star),
    ));

    let operator = one_of("+-/<>|;!?&^~#$\\`")
        .repeated()
        .at_least(1)
        .to_slice()
        .map(Token::Operator);

    // Anything else is a single unrecognized character
    let unknown = any().to_slice().map(Token::Unknown);

    let token = choice((
        double_quoted,
        single_quoted,
        number,
        compound,
        keyword,
        ident,
        punctuation,
        operator,
        unknown,
    ));

    token.map_with(|tok, e| (tok, e.span())).lazy()
}

/// Tokens of a source text, lexed one at a time as they are pulled.
pub struct Tokens<'src> {
    source: &'src str,
    offset: usize,
    token: Boxed<'src, 'src, &'src str, Spanned<Token<'src>>, extra::Err<Rich<'src, char, Span>>>,
}

/// Lex `source` on demand.
///
/// No token spans a line break, so each token is read from the rest of its
/// line only.
pub fn tokens(source: &str) -> Tokens<'_> {
    Tokens {
        source,
        offset: 0,
        token: token().boxed(),
    }
}

impl<'src> Iterator for Tokens<'src> {
    type Item = Spanned<Token<'src>>;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = self.source.get(self.offset..)?;
        let start = self.offset + padding_len(rest);
        let rest = self.source.get(start..).filter(|rest| !rest.is_empty())?;
        let line = match rest.find('\n') {
            Some(end) => rest.get(..end).unwrap_or(rest),
            None => rest,
        };

        let (token, errors) = self.token.parse(line).into_output_errors();
        for err in &errors {
            tracing::warn!(span = ?err.span(), reason = %err.reason(), "raw lexer error");
        }
        let (token, span) = token?;
        let span = Span::from(start + span.start..start + span.end);
        self.offset = span.end;
        Some((token, span))
    }
}

/// Tokenize a whole source text.
pub fn lex(source: &str) -> Vec<Spanned<Token<'_>>> {
    tokens(source).collect()
}
