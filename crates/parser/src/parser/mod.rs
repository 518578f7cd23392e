//! Parsers for MAS files and test scripts.
//!
//! Both entry points run the full front end for one compilation unit:
//!
//! 1. the [recovering scanner](crate::scanner) heals malformed literals,
//!    reporting them to the unit's [`ErrorStrategy`];
//! 2. the chumsky grammar pulls healed tokens from the scanner as it needs
//!    them, resynchronizing at the `.` ending a statement and at section
//!    boundaries;
//! 3. every remaining parser error goes through the strategy, which renders
//!    it with humanized token and rule names.
//!
//! ```rust
//! use mas2g_parser::parser::parse_mas_with_recovery;
//!
//! let result = parse_mas_with_recovery(
//!     "demo.mas2g",
//!     "agentfiles { \"bob.goal\". } launchpolicy { launch bob : bob. }",
//! );
//! assert!(result.usable);
//! assert_eq!(result.ast.unwrap().agent_files.len(), 1);
//! ```
//!
//! [`parse_mas_into`] and [`parse_test_into`] hand each diagnostic to a
//! [`DiagnosticSink`] instead of collecting them.

pub mod agentfiles;
pub mod environment;
pub mod launch;
pub mod primitives;
pub mod test_script;


use crate::ast::{AgentFileDecl, EnvironmentSection, LaunchPolicy, MasFile, Spanned, TestFile};
use crate::diagnostic::{error_count, Diagnostic, DiagnosticSink, SourceMap};
use crate::humanize::Rule;
use crate::lexer::Token;
use crate::scanner::scan;
use crate::strategy::{ErrorStrategy, Mismatch};

use chumsky::input::{Input as _, Stream};
use chumsky::prelude::*;
use chumsky::recovery::{skip_then_retry_until, via_parser};

use agentfiles::agent_files_section;
use environment::environment_section;
use launch::launch_policy_section;
use primitives::{ParserInput, Span, SpannedToken};
use test_script::test_file;

/// Outcome of parsing one unit.
#[derive(Debug, Clone)]
pub struct ParseResult<T> {
    /// The (possibly partial) tree; `None` when nothing could be recovered.
    pub ast: Option<T>,
    /// Lexical and syntax diagnostics, in detection order.
    pub diagnostics: Vec<Diagnostic>,
    /// False when any syntax error was found; semantic phases skip the unit.
    pub usable: bool,
}

impl<T> ParseResult<T> {
    pub fn syntax_error_count(&self) -> usize {
        error_count(&self.diagnostics)
    }

    /// The tree, if the unit is usable for semantic analysis.
    pub fn usable_ast(&self) -> Option<&T> {
        if self.usable {
            self.ast.as_ref()
        } else {
            None
        }
    }
}

// ============================================================================
// Top-Level MAS File Parser
// ============================================================================

/// Enum for tracking parsed top-level sections.
#[derive(Clone)]
enum Section {
    Environment(Spanned<EnvironmentSection>),
    AgentFiles(Vec<Spanned<AgentFileDecl>>),
    LaunchPolicy(Spanned<LaunchPolicy>),
    /// A section that could not be parsed and was skipped.
    Broken,
}

/// Parse a complete MAS file.
fn mas_file<'tokens, 'src: 'tokens>() -> impl Parser<
    'tokens,
    ParserInput<'tokens, 'src>,
    MasFile,
    extra::Err<Rich<'tokens, Token<'src>, Span>>,
> + Clone {
    let section_keyword = choice((
        just(Token::Environment).ignored(),
        just(Token::AgentFiles).ignored(),
        just(Token::LaunchPolicy).ignored(),
    ));

    // A section that fails after its keyword is dropped up to the next
    // section keyword (or the end of the file).
    let skip_broken = section_keyword
        .clone()
        .then(any().and_is(section_keyword.clone().not()).repeated())
        .to(Section::Broken);

    // Recovery strategy: input that starts no section is skipped until a
    // section can be parsed again.
    choice((
        environment_section().map(Section::Environment),
        agent_files_section().map(Section::AgentFiles),
        launch_policy_section().map(Section::LaunchPolicy),
    ))
    .recover_with(via_parser(skip_broken))
    .recover_with(skip_then_retry_until(any().ignored(), section_keyword))
    .repeated()
    .collect::<Vec<_>>()
    .then_ignore(end())
    .map(|sections| {
        let mut file = MasFile::default();

        for section in sections {
            match section {
                Section::Environment(env) => {
                    if file.environment.is_some() {
                        file.extra_environments.push(env.span);
                    } else {
                        file.environment = Some(env);
                    }
                }
                Section::AgentFiles(decls) => file.agent_files.extend(decls),
                Section::LaunchPolicy(policy) => match file.launch_policy.as_mut() {
                    Some(existing) => existing.node.rules.extend(policy.node.rules),
                    None => file.launch_policy = Some(policy),
                },
                Section::Broken => {}
            }
        }

        file
    })
    .labelled(Rule::MasFile.name())
}

// ============================================================================
// Entry points
// ============================================================================

/// Outcome of parsing one unit into a caller-provided sink.
#[derive(Debug, Clone)]
pub struct ParseOutcome<T> {
    /// The (possibly partial) tree; `None` when nothing could be recovered.
    pub ast: Option<T>,
    /// Diagnostics handed to the sink for this unit.
    pub diagnostic_count: usize,
    /// False when any syntax error was found; semantic phases skip the unit.
    pub usable: bool,
}

/// Healed tokens of `source` as parser input.
///
/// Nothing is scanned until the grammar pulls the first token; scanner
/// diagnostics reach `strategy` as the parse advances.
fn token_input<'tokens, 'src: 'tokens, S: DiagnosticSink + 'tokens>(
    source: &'src str,
    strategy: &'tokens mut ErrorStrategy<'src, S>,
) -> ParserInput<'tokens, 'src> {
    let eoi = Span::new((), source.len()..source.len());
    Stream::from_iter(scan(source, strategy))
        .boxed()
        .map(eoi, split_token as fn(_) -> _)
}

fn split_token(token: SpannedToken<'_>) -> SpannedToken<'_> {
    token
}

fn finish<T, S: DiagnosticSink>(
    mut strategy: ErrorStrategy<'_, S>,
    ast: Option<T>,
    mismatches: Vec<Mismatch>,
) -> ParseOutcome<T> {
    let parser_errors = mismatches.len();
    for mismatch in mismatches {
        strategy.report_mismatch(mismatch);
    }
    let usable = ast.is_some() && !strategy.has_errors();
    tracing::debug!(
        diagnostics = strategy.reported(),
        parser_errors,
        usable,
        "parsed unit"
    );
    ParseOutcome {
        ast,
        diagnostic_count: strategy.reported(),
        usable,
    }
}

/// Parse a MAS file, reporting every lexical and syntax diagnostic to `sink`
/// as it is found.
pub fn parse_mas_into(
    file: &str,
    source: &str,
    sink: &mut dyn DiagnosticSink,
) -> ParseOutcome<MasFile> {
    let mut strategy = ErrorStrategy::with_sink(SourceMap::new(file, source), Rule::MasFile, sink);
    let (ast, mismatches) = {
        let (ast, errors) = mas_file()
            .parse(token_input(source, &mut strategy))
            .into_output_errors();
        (ast, errors.iter().map(Mismatch::from_rich).collect::<Vec<_>>())
    };
    finish(strategy, ast, mismatches)
}

/// Parse a test script, reporting every lexical and syntax diagnostic to
/// `sink` as it is found.
pub fn parse_test_into(
    file: &str,
    source: &str,
    sink: &mut dyn DiagnosticSink,
) -> ParseOutcome<TestFile> {
    let mut strategy = ErrorStrategy::with_sink(SourceMap::new(file, source), Rule::Test2g, sink);
    let (ast, mismatches) = {
        let (ast, errors) = test_file()
            .parse(token_input(source, &mut strategy))
            .into_output_errors();
        (ast, errors.iter().map(Mismatch::from_rich).collect::<Vec<_>>())
    };
    finish(strategy, ast, mismatches)
}

fn collect_diagnostics<T>(
    parse: impl FnOnce(&mut dyn DiagnosticSink) -> ParseOutcome<T>,
) -> ParseResult<T> {
    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    let outcome = parse(&mut diagnostics);
    ParseResult {
        ast: outcome.ast,
        diagnostics,
        usable: outcome.usable,
    }
}

/// Parse a MAS file, collecting every lexical and syntax diagnostic.
pub fn parse_mas_with_recovery(file: &str, source: &str) -> ParseResult<MasFile> {
    collect_diagnostics(|sink| parse_mas_into(file, source, sink))
}

/// Parse a test script, collecting every lexical and syntax diagnostic.
pub fn parse_test_with_recovery(file: &str, source: &str) -> ParseResult<TestFile> {
    collect_diagnostics(|sink| parse_test_into(file, source, sink))
}

/// Parse a MAS file, returning the tree only when it has no syntax errors.
pub fn parse_mas(file: &str, source: &str) -> Result<MasFile, Vec<Diagnostic>> {
    let result = parse_mas_with_recovery(file, source);
    match result.ast {
        Some(ast) if result.usable => Ok(ast),
        _ => Err(result.diagnostics),
    }
}

/// Parse a test script, returning the tree only when it has no syntax errors.
pub fn parse_test(file: &str, source: &str) -> Result<TestFile, Vec<Diagnostic>> {
    let result = parse_test_with_recovery(file, source);
    match result.ast {
        Some(ast) if result.usable => Ok(ast),
        _ => Err(result.diagnostics),
    }
}
