//! Abstract syntax trees for MAS files and test scripts.
//!
//! Every node that a diagnostic may point at is wrapped in [`Spanned`].
//!
//! ```text
//! MasFile
//! ├── environment: EnvironmentSection (env archive, init parameters)
//! ├── agent_files: Vec<AgentFileDecl> (path + parameters)
//! └── launch_policy: Option<LaunchPolicy> (launch rules)
//!
//! TestFile
//! ├── mas: referenced MAS file
//! ├── timeout
//! └── tests: Vec<AgentTest> (agent, module, conditions)
//! ```

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Byte range in the source.
pub type Span = Range<usize>;

/// A value paired with its source location.
///
/// ```rust
/// use mas2g_parser::ast::Spanned;
///
/// let s = Spanned::new(5, 0..1).map(|n| n * 2);
/// assert_eq!(s.node, 10);
/// assert_eq!(s.span, 0..1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Spanned<U> {
        Spanned {
            node: f(self.node),
            span: self.span,
        }
    }
}

// ============================================================================
// MAS files
// ============================================================================

/// A parsed MAS file. Sections may appear in any order; repeated agent file
/// and launch policy sections are merged in source order, and only the first
/// environment section is kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MasFile {
    pub environment: Option<Spanned<EnvironmentSection>>,
    /// Spans of environment sections after the first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_environments: Vec<Span>,
    pub agent_files: Vec<Spanned<AgentFileDecl>>,
    pub launch_policy: Option<Spanned<LaunchPolicy>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentSection {
    /// Path of the environment interface archive.
    pub env: Spanned<String>,
    pub init: Vec<Spanned<InitKeyValue>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitKeyValue {
    pub key: Spanned<String>,
    pub value: Spanned<InitValue>,
}

/// Value of an environment initialization parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum InitValue {
    Identifier(String),
    Integer(String),
    Float(String),
    String(String),
    Function { name: String, args: Vec<InitValue> },
    List(Vec<InitValue>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentFileDecl {
    pub path: Spanned<String>,
    pub params: Vec<Spanned<AgentFileParameter>>,
}

impl AgentFileDecl {
    /// First value given for `key`.
    pub fn param(&self, key: &str) -> Option<&Spanned<String>> {
        self.params
            .iter()
            .find(|p| p.node.key.node == key)
            .map(|p| &p.node.value)
    }

    /// The name agents launch this file by: the `name` parameter, otherwise
    /// the file stem of the path.
    pub fn reference_name(&self) -> Spanned<String> {
        match self.param("name") {
            Some(name) => name.clone(),
            None => {
                let stem = std::path::Path::new(&self.path.node)
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or(&self.path.node)
                    .to_string();
                Spanned::new(stem, self.path.span.clone())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentFileParameter {
    pub key: Spanned<String>,
    pub value: Spanned<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LaunchPolicy {
    pub rules: Vec<Spanned<LaunchRule>>,
}

/// `launch ...` or `when <entity> do launch ...`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchRule {
    pub condition: Option<Spanned<Entity>>,
    pub components: Vec<Spanned<LaunchComponent>>,
}

impl LaunchRule {
    pub fn is_conditional(&self) -> bool {
        self.condition.is_some()
    }
}

/// Environment entity a conditional rule waits for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Entity {
    Constraints(Vec<Spanned<Constraint>>),
    Named(String),
    Any,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub kind: ConstraintKind,
    pub value: Spanned<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConstraintKind {
    Name,
    Type,
    Max,
}

impl ConstraintKind {
    pub fn keyword(self) -> &'static str {
        match self {
            ConstraintKind::Name => "name",
            ConstraintKind::Type => "type",
            ConstraintKind::Max => "max",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchComponent {
    pub name: Spanned<LaunchName>,
    /// `[number = N]`, kept as written.
    pub number: Option<Spanned<String>>,
    pub target: Spanned<AgentRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum LaunchName {
    Named(String),
    /// `*`: the agent takes the name of the entity it is connected to.
    Wildcard,
}

/// Agent file a launch component refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum AgentRef {
    /// By reference name, e.g. `bob`.
    Name(String),
    /// By path, e.g. `"bob.goal"`.
    Path(String),
}

impl AgentRef {
    pub fn text(&self) -> &str {
        match self {
            AgentRef::Name(s) | AgentRef::Path(s) => s,
        }
    }
}

// ============================================================================
// Test scripts
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestFile {
    /// Path of the MAS file under test.
    pub mas: Spanned<String>,
    /// Seconds, kept as written.
    pub timeout: Option<Spanned<String>>,
    pub tests: Vec<Spanned<AgentTest>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentTest {
    pub agent: Spanned<String>,
    pub module: Option<Spanned<String>>,
    pub conditions: Vec<Spanned<TestCondition>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCondition {
    pub operator: TemporalOperator,
    pub literals: Vec<Spanned<MentalLiteral>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemporalOperator {
    AtStart,
    Eventually,
    Always,
    Never,
    AtEnd,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MentalLiteral {
    pub negated: bool,
    pub operator: MentalOperator,
    /// Source text of the queried term.
    pub term: Spanned<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MentalOperator {
    Bel,
    Goal,
    AGoal,
    GoalA,
    Percept,
}
