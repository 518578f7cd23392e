//! The closed set of diagnostic kinds and their message templates.
//!
//! Every diagnostic the toolchain can produce is one of the kinds below. Each
//! kind has a stable identifier that keys into a message bundle; the bundle
//! maps identifiers to templates with positional placeholders (`{0}`, `{1}`,
//! ...). The embedded bundle lives in `resources/messages.json` and is parsed
//! once into [`Catalog::global()`].
//!
//! Rendering never fails:
//!
//! ```rust
//! use mas2g_parser::catalog::{Catalog, DiagnosticKind, MasError};
//!
//! let kind = DiagnosticKind::MasError(MasError::AgentFileNotFound);
//! let text = Catalog::global().render(kind, &["bob.goal"]);
//! assert!(text.contains("bob.goal"));
//!
//! // An empty catalog falls back to the first argument, then to the id.
//! let empty = Catalog::empty();
//! assert_eq!(empty.render(kind, &["bob.goal"]), "bob.goal");
//! assert_eq!(empty.render::<&str>(kind, &[]), "AGENTFILE_COULDNOT_FIND");
//! ```

use crate::diagnostic::Severity;
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

macro_rules! diagnostic_kinds {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $id:literal, )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )*
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$( $name::$variant, )*];

            /// Stable identifier, used as the message bundle key.
            pub fn id(self) -> &'static str {
                match self {
                    $( $name::$variant => $id, )*
                }
            }
        }
    };
}

diagnostic_kinds! {
    /// Lexical and grammar-level problems.
    SyntaxError {
        /// The parser found a token it could not use here.
        InputMismatch => "INPUTMISMATCH",
        /// Same as [`SyntaxError::InputMismatch`] outside any named rule.
        UnexpectedInput => "UNEXPECTEDINPUT",
        /// Nothing that could be named was admissible here.
        NoViableAlternative => "NOVIABLEALTERNATIVE",
        TokenRecognition => "TOKENRECOGNITIONERROR",
        UnterminatedStringLiteral => "UNTERMINATEDSTRINGLITERAL",
        UnterminatedSingleQuotedLiteral => "UNTERMINATEDSINGLEQUOTEDSTRINGLITERAL",
    }
}

diagnostic_kinds! {
    /// Problems in a MAS file that block running it.
    MasError {
        EnvironmentNotFound => "ENVIRONMENT_COULDNOT_FIND",
        EnvironmentNotAnArchive => "ENVIRONMENT_NOTAJAR",
        AgentFileNotFound => "AGENTFILE_COULDNOT_FIND",
        AgentFileWrongExtension => "AGENTFILE_WRONG_EXTENSION",
        AgentFileUnknownParameter => "AGENTFILE_UNKNOWN_PARAMETER",
        AgentFileNonexistentReference => "AGENTFILE_NONEXISTANT_REFERENCE",
        LaunchInvalidNumber => "LAUNCH_INVALID_NUMBER",
        ConstraintInvalidNumber => "CONSTRAINT_INVALID_NUMBER",
        ResourceUnreadable => "RESOURCE_UNREADABLE",
    }
}

diagnostic_kinds! {
    /// Suspicious but runnable MAS constructs.
    MasWarning {
        EnvironmentDuplicate => "ENVIRONMENT_DUPLICATE",
        AgentFileDuplicateName => "AGENTFILE_DUPLICATE_NAME",
        AgentFileDuplicateParameter => "AGENTFILE_DUPLICATE_PARAMETER",
        AgentFileUnused => "AGENTFILE_UNUSED",
        InitDuplicateKey => "INIT_DUPLICATE_KEY",
        LaunchUnconditionalWildcard => "LAUNCH_UNCONDITIONAL_WILDCARD",
        ConstraintDuplicate => "CONSTRAINT_DUPLICATE",
        LaunchConditionalWithoutEnvironment => "LAUNCH_CONDITIONAL_WITHOUT_ENVIRONMENT",
        LaunchPolicyEmpty => "LAUNCHPOLICY_EMPTY",
    }
}

diagnostic_kinds! {
    /// Problems in a test script that block running it.
    TestError {
        MasNotFound => "TEST_MAS_NOT_FOUND",
        InvalidTimeout => "TEST_INVALID_TIMEOUT",
        UnknownAgent => "TEST_UNKNOWN_AGENT",
    }
}

diagnostic_kinds! {
    TestWarning {
        DuplicateAgent => "TEST_DUPLICATE_AGENT",
    }
}

/// Message bundle section a kind belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    Syntax,
    MasError,
    MasWarning,
    TestError,
    TestWarning,
}

impl Domain {
    pub const ALL: &'static [Domain] = &[
        Domain::Syntax,
        Domain::MasError,
        Domain::MasWarning,
        Domain::TestError,
        Domain::TestWarning,
    ];

    /// Section name in the message bundle.
    pub fn name(self) -> &'static str {
        match self {
            Domain::Syntax => "syntax",
            Domain::MasError => "mas.error",
            Domain::MasWarning => "mas.warning",
            Domain::TestError => "test.error",
            Domain::TestWarning => "test.warning",
        }
    }

    pub fn from_name(name: &str) -> Option<Domain> {
        Domain::ALL.iter().copied().find(|d| d.name() == name)
    }

    pub fn severity(self) -> Severity {
        match self {
            Domain::Syntax | Domain::MasError | Domain::TestError => Severity::Error,
            Domain::MasWarning | Domain::TestWarning => Severity::Warning,
        }
    }
}

/// A diagnostic kind from any domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    Syntax(SyntaxError),
    MasError(MasError),
    MasWarning(MasWarning),
    TestError(TestError),
    TestWarning(TestWarning),
}

impl DiagnosticKind {
    pub fn id(self) -> &'static str {
        match self {
            DiagnosticKind::Syntax(k) => k.id(),
            DiagnosticKind::MasError(k) => k.id(),
            DiagnosticKind::MasWarning(k) => k.id(),
            DiagnosticKind::TestError(k) => k.id(),
            DiagnosticKind::TestWarning(k) => k.id(),
        }
    }

    pub fn domain(self) -> Domain {
        match self {
            DiagnosticKind::Syntax(_) => Domain::Syntax,
            DiagnosticKind::MasError(_) => Domain::MasError,
            DiagnosticKind::MasWarning(_) => Domain::MasWarning,
            DiagnosticKind::TestError(_) => Domain::TestError,
            DiagnosticKind::TestWarning(_) => Domain::TestWarning,
        }
    }

    pub fn severity(self) -> Severity {
        self.domain().severity()
    }

    /// Every kind of every domain.
    pub fn all() -> impl Iterator<Item = DiagnosticKind> {
        let syntax = SyntaxError::ALL.iter().copied().map(DiagnosticKind::Syntax);
        let mas_errors = MasError::ALL.iter().copied().map(DiagnosticKind::MasError);
        let mas_warnings = MasWarning::ALL.iter().copied().map(DiagnosticKind::MasWarning);
        let test_errors = TestError::ALL.iter().copied().map(DiagnosticKind::TestError);
        let test_warnings = TestWarning::ALL.iter().copied().map(DiagnosticKind::TestWarning);
        syntax
            .chain(mas_errors)
            .chain(mas_warnings)
            .chain(test_errors)
            .chain(test_warnings)
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl From<SyntaxError> for DiagnosticKind {
    fn from(k: SyntaxError) -> Self {
        DiagnosticKind::Syntax(k)
    }
}

impl From<MasError> for DiagnosticKind {
    fn from(k: MasError) -> Self {
        DiagnosticKind::MasError(k)
    }
}

impl From<MasWarning> for DiagnosticKind {
    fn from(k: MasWarning) -> Self {
        DiagnosticKind::MasWarning(k)
    }
}

impl From<TestError> for DiagnosticKind {
    fn from(k: TestError) -> Self {
        DiagnosticKind::TestError(k)
    }
}

impl From<TestWarning> for DiagnosticKind {
    fn from(k: TestWarning) -> Self {
        DiagnosticKind::TestWarning(k)
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("malformed message bundle: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown diagnostic domain '{0}' in message bundle")]
    UnknownDomain(String),
}

const EMBEDDED_BUNDLE: &str = include_str!("../resources/messages.json");

lazy_static! {
    static ref GLOBAL: Catalog = Catalog::embedded();
}

/// Read-only mapping from diagnostic kinds to message templates.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    templates: HashMap<Domain, HashMap<String, String>>,
}

impl Catalog {
    /// The process-wide catalog built from the embedded bundle.
    pub fn global() -> &'static Catalog {
        &GLOBAL
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a bundle of the form `{ "<domain>": { "<ID>": "<template>" } }`.
    pub fn from_json(bundle: &str) -> Result<Self, CatalogError> {
        let raw: HashMap<String, HashMap<String, String>> = serde_json::from_str(bundle)?;
        let mut templates = HashMap::with_capacity(raw.len());
        for (section, entries) in raw {
            let domain =
                Domain::from_name(&section).ok_or(CatalogError::UnknownDomain(section))?;
            templates.insert(domain, entries);
        }
        Ok(Self { templates })
    }

    fn embedded() -> Self {
        Self::from_json(EMBEDDED_BUNDLE).unwrap_or_else(|err| {
            tracing::error!(%err, "embedded message bundle is unusable; messages fall back to ids");
            Self::empty()
        })
    }

    pub fn template(&self, kind: DiagnosticKind) -> Option<&str> {
        self.templates
            .get(&kind.domain())
            .and_then(|entries| entries.get(kind.id()))
            .map(String::as_str)
    }

    /// Render `kind` with positional `args`.
    ///
    /// Without a template the first argument (or the bare id) is returned; a
    /// template that needs more arguments than given is returned unformatted.
    pub fn render<S: AsRef<str>>(&self, kind: DiagnosticKind, args: &[S]) -> String {
        let Some(template) = self.template(kind) else {
            tracing::warn!(kind = kind.id(), "no message template registered");
            return args
                .first()
                .map(|a| a.as_ref().to_string())
                .unwrap_or_else(|| kind.id().to_string());
        };

        if placeholders(template).any(|(_, index)| index >= args.len()) {
            return template.to_string();
        }
        substitute(template, args)
    }
}

/// Scan a template for `{n}` placeholders, yielding (byte range, index).
fn placeholders(template: &str) -> impl Iterator<Item = (std::ops::Range<usize>, usize)> + '_ {
    template.match_indices('{').filter_map(move |(open, _)| {
        let rest = &template[open + 1..];
        let close = rest.find('}')?;
        let index = rest[..close].parse::<usize>().ok()?;
        Some((open..open + close + 2, index))
    })
}

fn substitute<S: AsRef<str>>(template: &str, args: &[S]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;
    for (range, index) in placeholders(template) {
        if range.start < last {
            continue;
        }
        out.push_str(&template[last..range.start]);
        match args.get(index) {
            Some(arg) => out.push_str(arg.as_ref()),
            None => out.push_str(&template[range.clone()]),
        }
        last = range.end;
    }
    out.push_str(&template[last..]);
    out
}
