//! Declared names and their uses within one compilation unit.
//!
//! The table is filled in two passes. Analyzers first [`declare`] every
//! symbol, then record every [`reference`]; [`resolve_all`] checks the uses
//! against the declarations once both passes are done.
//!
//! [`declare`]: SymbolTable::declare
//! [`reference`]: SymbolTable::reference
//! [`resolve_all`]: SymbolTable::resolve_all

use crate::graph::ReferenceGraph;
use indexmap::IndexMap;
use mas2g_parser::catalog::{DiagnosticKind, MasError, MasWarning, TestError, TestWarning};
use mas2g_parser::diagnostic::{Diagnostic, DiagnosticSink, Position};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use tracing::debug;

/// Namespace a symbol is declared in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SymbolCategory {
    /// An entry of the `agentfiles` section, by reference name.
    AgentFile,
    /// A key of the environment `init` list.
    InitKey,
    /// A name a MAS unit can launch agents under.
    Agent,
    /// A per-agent block of a test script.
    AgentTest,
}

impl SymbolCategory {
    pub fn label(self) -> &'static str {
        match self {
            SymbolCategory::AgentFile => "agent file",
            SymbolCategory::InitKey => "init key",
            SymbolCategory::Agent => "agent",
            SymbolCategory::AgentTest => "agent test",
        }
    }

    /// Warning for a second declaration, `None` where repeats are normal.
    pub fn duplicate_kind(self) -> Option<DiagnosticKind> {
        match self {
            SymbolCategory::AgentFile => {
                Some(DiagnosticKind::MasWarning(MasWarning::AgentFileDuplicateName))
            }
            SymbolCategory::InitKey => Some(DiagnosticKind::MasWarning(MasWarning::InitDuplicateKey)),
            SymbolCategory::Agent => None,
            SymbolCategory::AgentTest => {
                Some(DiagnosticKind::TestWarning(TestWarning::DuplicateAgent))
            }
        }
    }

    /// Error for a use that matches no declaration.
    pub fn unresolved_kind(self) -> Option<DiagnosticKind> {
        match self {
            SymbolCategory::AgentFile => {
                Some(DiagnosticKind::MasError(MasError::AgentFileNonexistentReference))
            }
            SymbolCategory::Agent => Some(DiagnosticKind::TestError(TestError::UnknownAgent)),
            SymbolCategory::InitKey | SymbolCategory::AgentTest => None,
        }
    }
}

impl fmt::Display for SymbolCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Symbol {
    pub category: SymbolCategory,
    pub name: String,
    pub position: Position,
    /// Backing file, for agent files.
    pub resource: Option<PathBuf>,
}

/// What a reference points at.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum RefTarget {
    Name(String),
    /// A backing file path, matched against [`Symbol::resource`].
    Resource(String),
}

impl RefTarget {
    pub fn text(&self) -> &str {
        match self {
            RefTarget::Name(s) | RefTarget::Resource(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reference {
    pub category: SymbolCategory,
    pub target: RefTarget,
    pub position: Position,
    /// Human-readable description of where the use occurs.
    pub context: String,
}

/// A repeated declaration; the first one stays bound.
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateWarning {
    pub kind: DiagnosticKind,
    pub category: SymbolCategory,
    pub name: String,
    pub first: Position,
    pub duplicate: Position,
}

impl DuplicateWarning {
    pub fn into_diagnostic(self) -> Diagnostic {
        Diagnostic::new(
            self.kind,
            vec![self.name, self.first.to_string()],
            self.duplicate,
        )
    }
}

/// Symbols and references of one compilation unit.
///
/// ```rust
/// use mas2g_parser::diagnostic::Position;
/// use mas2g_resolver::{RefTarget, SymbolCategory, SymbolTable};
///
/// let mut table = SymbolTable::new("demo.mas2g");
/// table.declare(SymbolCategory::AgentFile, "bob", Position::file_start("demo.mas2g"), None);
/// table.reference(
///     SymbolCategory::AgentFile,
///     RefTarget::Name("alice".into()),
///     Position::file_start("demo.mas2g"),
///     "the launch rule for agent 'alice'",
/// );
///
/// let diagnostics = table.resolve_all();
/// assert_eq!(diagnostics.len(), 2); // alice is unknown, bob is unused
/// ```
#[derive(Debug, Clone)]
pub struct SymbolTable {
    file: String,
    symbols: IndexMap<(SymbolCategory, String), Symbol>,
    references: Vec<Reference>,
    report_unused: bool,
}

impl SymbolTable {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            symbols: IndexMap::new(),
            references: Vec::new(),
            report_unused: true,
        }
    }

    /// Whether [`resolve_all`](Self::resolve_all) reports unused agent files.
    pub fn with_unused_report(mut self, report_unused: bool) -> Self {
        self.report_unused = report_unused;
        self
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    /// Bind `name` in `category`. A repeated name keeps the first binding and
    /// yields a warning when the category treats repeats as suspicious.
    pub fn declare(
        &mut self,
        category: SymbolCategory,
        name: impl Into<String>,
        position: Position,
        resource: Option<PathBuf>,
    ) -> Option<DuplicateWarning> {
        let name = name.into();
        let key = (category, name);
        if let Some(existing) = self.symbols.get(&key) {
            let (category, name) = key;
            debug!(%category, %name, first = %existing.position, "duplicate declaration ignored");
            let kind = category.duplicate_kind()?;
            return Some(DuplicateWarning {
                kind,
                category,
                name,
                first: existing.position.clone(),
                duplicate: position,
            });
        }

        let symbol = Symbol {
            category,
            name: key.1.clone(),
            position,
            resource,
        };
        self.symbols.insert(key, symbol);
        None
    }

    /// Record a use, checked later by [`resolve_all`](Self::resolve_all).
    pub fn reference(
        &mut self,
        category: SymbolCategory,
        target: RefTarget,
        position: Position,
        context: impl Into<String>,
    ) {
        self.references.push(Reference {
            category,
            target,
            position,
            context: context.into(),
        });
    }

    pub fn lookup(&self, category: SymbolCategory, name: &str) -> Option<&Symbol> {
        self.symbols.get(&(category, name.to_string()))
    }

    /// Symbols in declaration order.
    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.values()
    }

    pub fn symbols_in(&self, category: SymbolCategory) -> impl Iterator<Item = &Symbol> {
        self.symbols.values().filter(move |s| s.category == category)
    }

    pub fn references(&self) -> &[Reference] {
        &self.references
    }

    /// Build the declaration/use graph of this unit.
    pub fn graph(&self) -> ReferenceGraph<'_> {
        ReferenceGraph::build(self)
    }

    /// Check every reference against the declarations.
    ///
    /// Reports each unresolved use and, unless disabled, each agent file no
    /// rule launches. Does not modify the table, so repeated calls agree.
    pub fn resolve_all(&self) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        self.resolve_into(&mut diagnostics);
        diagnostics
    }

    /// Same as [`SymbolTable::resolve_all`], reporting into `sink`; returns
    /// the number of diagnostics reported.
    pub fn resolve_into(&self, sink: &mut dyn DiagnosticSink) -> usize {
        let graph = self.graph();
        let mut reported = 0;

        for reference in graph.unresolved() {
            let Some(kind) = reference.category.unresolved_kind() else {
                debug!(category = %reference.category, target = reference.target.text(), "unchecked reference");
                continue;
            };
            let args = match reference.category {
                SymbolCategory::Agent => {
                    vec![reference.target.text().to_string(), reference.context.clone()]
                }
                _ => vec![reference.context.clone(), reference.target.text().to_string()],
            };
            sink.report(Diagnostic::new(kind, args, reference.position.clone()));
            reported += 1;
        }

        if self.report_unused {
            for symbol in graph.unused(SymbolCategory::AgentFile) {
                let shown = symbol
                    .resource
                    .as_ref()
                    .map_or_else(|| symbol.name.clone(), |p| p.display().to_string());
                sink.report(Diagnostic::new(
                    DiagnosticKind::MasWarning(MasWarning::AgentFileUnused),
                    vec![shown],
                    symbol.position.clone(),
                ));
                reported += 1;
            }
        }

        debug!(
            file = %self.file,
            symbols = self.symbols.len(),
            references = self.references.len(),
            diagnostics = reported,
            "resolved symbol table"
        );
        reported
    }
}
