//! Semantic checks for a parsed MAS file.

use crate::options::AnalysisOptions;
use crate::probe::ResourceProbe;
use crate::symbols::{RefTarget, SymbolCategory, SymbolTable};
use indexmap::IndexSet;
use mas2g_parser::ast::{
    AgentFileDecl, AgentRef, ConstraintKind, EnvironmentSection, Entity, LaunchName, LaunchPolicy,
    LaunchRule, MasFile, Spanned,
};
use mas2g_parser::catalog::{DiagnosticKind, MasError, MasWarning};
use mas2g_parser::diagnostic::{Diagnostic, Position, SourceMap};
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Parameters an agent file declaration may carry.
pub const AGENT_FILE_PARAMETERS: &[&str] = &["name", "language"];

/// What a test script needs to know about the MAS it runs.
#[derive(Debug, Clone)]
pub struct MasAnalysis {
    pub file: String,
    pub table: SymbolTable,
    pub diagnostics: Vec<Diagnostic>,
    /// Some rule launches agents named after environment entities.
    pub has_wildcard_launch: bool,
    /// Names given explicitly in launch components.
    pub launched: IndexSet<String>,
}

impl MasAnalysis {
    /// Declared agent file names followed by explicitly launched names.
    pub fn agent_names(&self) -> impl Iterator<Item = &str> {
        self.table
            .symbols_in(SymbolCategory::AgentFile)
            .map(|s| s.name.as_str())
            .chain(self.launched.iter().map(String::as_str))
    }

    pub fn can_launch(&self, agent: &str) -> bool {
        self.has_wildcard_launch || self.agent_names().any(|name| name == agent)
    }
}

pub struct MasAnalyzer<'a> {
    map: SourceMap<'a>,
    probe: &'a dyn ResourceProbe,
    options: &'a AnalysisOptions,
    table: SymbolTable,
    diagnostics: Vec<Diagnostic>,
    has_wildcard_launch: bool,
    launched: IndexSet<String>,
}

impl<'a> MasAnalyzer<'a> {
    pub fn new(
        map: SourceMap<'a>,
        probe: &'a dyn ResourceProbe,
        options: &'a AnalysisOptions,
    ) -> Self {
        let table = SymbolTable::new(map.file()).with_unused_report(options.report_unused);
        Self {
            map,
            probe,
            options,
            table,
            diagnostics: Vec::new(),
            has_wildcard_launch: false,
            launched: IndexSet::new(),
        }
    }

    pub fn analyze(mut self, mas: &MasFile) -> MasAnalysis {
        // Declarations first, so launch rules may precede the agent files
        if let Some(env) = &mas.environment {
            self.check_environment(&env.node);
            let first = self.map.position(env.span.clone()).to_string();
            for span in &mas.extra_environments {
                self.report_at(
                    DiagnosticKind::MasWarning(MasWarning::EnvironmentDuplicate),
                    vec![first.clone()],
                    span,
                );
            }
        }
        for decl in &mas.agent_files {
            self.declare_agent_file(decl);
        }

        match &mas.launch_policy {
            Some(policy) => self.check_launch_policy(policy, mas.environment.is_some()),
            None => self.report(
                DiagnosticKind::MasWarning(MasWarning::LaunchPolicyEmpty),
                vec![],
                Position::file_start(self.map.file()),
            ),
        }

        self.table.resolve_into(&mut self.diagnostics);
        debug!(
            file = self.map.file(),
            diagnostics = self.diagnostics.len(),
            wildcard = self.has_wildcard_launch,
            "analyzed MAS file"
        );

        MasAnalysis {
            file: self.map.file().to_string(),
            table: self.table,
            diagnostics: self.diagnostics,
            has_wildcard_launch: self.has_wildcard_launch,
            launched: self.launched,
        }
    }

    fn report(&mut self, kind: DiagnosticKind, args: Vec<String>, position: Position) {
        self.diagnostics.push(Diagnostic::new(kind, args, position));
    }

    fn report_at(&mut self, kind: DiagnosticKind, args: Vec<String>, span: &Range<usize>) {
        let position = self.map.position(span.clone());
        self.report(kind, args, position);
    }

    fn check_environment(&mut self, env: &EnvironmentSection) {
        let path = &env.env;
        let ext = self.options.environment_extension.clone();

        if self.options.check_resources && !self.probe.exists(Path::new(&path.node)) {
            self.report_at(
                DiagnosticKind::MasError(MasError::EnvironmentNotFound),
                vec![path.node.clone()],
                &path.span,
            );
        } else if !has_extension(&path.node, &ext) {
            self.report_at(
                DiagnosticKind::MasError(MasError::EnvironmentNotAnArchive),
                vec![path.node.clone(), format!("expected a .{} file", ext)],
                &path.span,
            );
        } else if self.options.check_resources {
            match self.probe.is_archive(Path::new(&path.node)) {
                Ok(true) => {}
                Ok(false) => self.report_at(
                    DiagnosticKind::MasError(MasError::EnvironmentNotAnArchive),
                    vec![path.node.clone(), "it has no zip signature".to_string()],
                    &path.span,
                ),
                Err(e) => self.report_at(
                    DiagnosticKind::MasError(MasError::ResourceUnreadable),
                    vec![path.node.clone(), e.to_string()],
                    &path.span,
                ),
            }
        }

        for kv in &env.init {
            let key = &kv.node.key;
            let position = self.map.position(key.span.clone());
            if let Some(warning) =
                self.table
                    .declare(SymbolCategory::InitKey, key.node.clone(), position, None)
            {
                self.diagnostics.push(warning.into_diagnostic());
            }
        }
    }

    fn declare_agent_file(&mut self, decl: &Spanned<AgentFileDecl>) {
        let path = &decl.node.path;
        let ext = self.options.agent_extension.clone();

        if !has_extension(&path.node, &ext) {
            self.report_at(
                DiagnosticKind::MasError(MasError::AgentFileWrongExtension),
                vec![path.node.clone(), ext],
                &path.span,
            );
        } else if self.options.check_resources && !self.probe.exists(Path::new(&path.node)) {
            self.report_at(
                DiagnosticKind::MasError(MasError::AgentFileNotFound),
                vec![path.node.clone()],
                &path.span,
            );
        }

        let mut seen: IndexSet<&str> = IndexSet::new();
        for param in &decl.node.params {
            let key = param.node.key.node.as_str();
            if !AGENT_FILE_PARAMETERS.contains(&key) {
                self.report_at(
                    DiagnosticKind::MasError(MasError::AgentFileUnknownParameter),
                    vec![key.to_string(), AGENT_FILE_PARAMETERS.join(", ")],
                    &param.node.key.span,
                );
            } else if !seen.insert(key) {
                self.report_at(
                    DiagnosticKind::MasWarning(MasWarning::AgentFileDuplicateParameter),
                    vec![key.to_string(), path.node.clone()],
                    &param.node.key.span,
                );
            }
        }

        let name = decl.node.reference_name();
        let position = self.map.position(name.span.clone());
        if let Some(warning) = self.table.declare(
            SymbolCategory::AgentFile,
            name.node,
            position,
            Some(PathBuf::from(&path.node)),
        ) {
            self.diagnostics.push(warning.into_diagnostic());
        }
    }

    fn check_launch_policy(&mut self, policy: &Spanned<LaunchPolicy>, has_environment: bool) {
        if policy.node.rules.is_empty() {
            self.report_at(
                DiagnosticKind::MasWarning(MasWarning::LaunchPolicyEmpty),
                vec![],
                &policy.span,
            );
            return;
        }
        for rule in &policy.node.rules {
            self.check_launch_rule(rule, has_environment);
        }
    }

    fn check_launch_rule(&mut self, rule: &Spanned<LaunchRule>, has_environment: bool) {
        if let Some(condition) = &rule.node.condition {
            if !has_environment {
                self.report_at(
                    DiagnosticKind::MasWarning(MasWarning::LaunchConditionalWithoutEnvironment),
                    vec![],
                    &rule.span,
                );
            }
            if let Entity::Constraints(constraints) = &condition.node {
                let mut seen = IndexSet::new();
                for constraint in constraints {
                    let kind = constraint.node.kind;
                    if !seen.insert(kind) {
                        self.report_at(
                            DiagnosticKind::MasWarning(MasWarning::ConstraintDuplicate),
                            vec![kind.keyword().to_string()],
                            &constraint.span,
                        );
                        continue;
                    }
                    if kind == ConstraintKind::Max && !is_positive_integer(&constraint.node.value.node) {
                        self.report_at(
                            DiagnosticKind::MasError(MasError::ConstraintInvalidNumber),
                            vec![constraint.node.value.node.clone()],
                            &constraint.node.value.span,
                        );
                    }
                }
            }
        }

        for component in &rule.node.components {
            let component = &component.node;
            let target = &component.target;

            let context = match &component.name.node {
                LaunchName::Wildcard => {
                    self.has_wildcard_launch = true;
                    if !rule.node.is_conditional() {
                        self.report_at(
                            DiagnosticKind::MasWarning(MasWarning::LaunchUnconditionalWildcard),
                            vec![target.node.text().to_string()],
                            &component.name.span,
                        );
                    }
                    "the wildcard launch rule".to_string()
                }
                LaunchName::Named(name) => {
                    self.launched.insert(name.clone());
                    format!("the launch rule for agent '{}'", name)
                }
            };

            if let Some(number) = &component.number {
                if !is_positive_integer(&number.node) {
                    self.report_at(
                        DiagnosticKind::MasError(MasError::LaunchInvalidNumber),
                        vec![number.node.clone()],
                        &number.span,
                    );
                }
            }

            let reference = match &target.node {
                AgentRef::Name(name) => RefTarget::Name(name.clone()),
                AgentRef::Path(path) => RefTarget::Resource(path.clone()),
            };
            let position = self.map.position(target.span.clone());
            self.table
                .reference(SymbolCategory::AgentFile, reference, position, context);
        }
    }
}

fn has_extension(path: &str, ext: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

pub(crate) fn is_positive_integer(text: &str) -> bool {
    text.parse::<u64>().is_ok_and(|n| n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::{MemoryProbe, ZIP_MAGIC};
    use mas2g_parser::parse_mas;
    use pretty_assertions::assert_eq;

    fn probe() -> MemoryProbe {
        MemoryProbe::new()
            .with_file("elevator.jar", ZIP_MAGIC.to_vec())
            .with_file("fake.jar", b"text".to_vec())
            .with_file("car.goal", Vec::new())
            .with_file("manager.goal", Vec::new())
    }

    fn analyze_with(source: &str, options: &AnalysisOptions) -> MasAnalysis {
        let mas = parse_mas("m.mas2g", source).expect("valid MAS file");
        let probe = probe();
        MasAnalyzer::new(SourceMap::new("m.mas2g", source), &probe, options).analyze(&mas)
    }

    fn analyze(source: &str) -> MasAnalysis {
        analyze_with(source, &AnalysisOptions::default())
    }

    fn kinds(analysis: &MasAnalysis) -> Vec<&'static str> {
        analysis.diagnostics.iter().map(|d| d.kind.id()).collect()
    }

    #[test]
    fn test_clean_file() {
        let analysis = analyze(
            r#"
environment { env = "elevator.jar". }
agentfiles { "car.goal". "manager.goal" [name = boss]. }
launchpolicy {
   launch boss : boss.
   when [type = car, max = 2]@env do launch * : car.
}
"#,
        );
        assert_eq!(kinds(&analysis), Vec::<&str>::new());
        assert!(analysis.has_wildcard_launch);
        assert!(analysis.can_launch("anything"));
    }

    #[test]
    fn test_undeclared_agent_file_reference() {
        let source = "agentfiles { \"car.goal\". }\nlaunchpolicy {\n   launch car : car.\n   launch bob : \"bob.goal\".\n}\n";
        let analysis = analyze(source);
        assert_eq!(kinds(&analysis), vec!["AGENTFILE_NONEXISTANT_REFERENCE"]);
        let d = &analysis.diagnostics[0];
        assert_eq!(d.position.line, 4);
        assert!(d.message.contains("bob.goal"), "{}", d.message);
        assert!(d.message.contains("agent 'bob'"), "{}", d.message);
    }

    #[test]
    fn test_repeated_constraint() {
        let analysis = analyze(
            "environment { env = \"elevator.jar\". }\nagentfiles { \"car.goal\". }\nlaunchpolicy { when [max = 1, max = 2]@env do launch * : car. }\n",
        );
        assert_eq!(kinds(&analysis), vec!["CONSTRAINT_DUPLICATE"]);
        assert_eq!(analysis.diagnostics[0].args, vec!["max".to_string()]);
    }

    #[test]
    fn test_environment_checks() {
        let missing = analyze("environment { env = \"gone.jar\". }\nlaunchpolicy { }\n");
        assert_eq!(kinds(&missing), vec!["ENVIRONMENT_COULDNOT_FIND", "LAUNCHPOLICY_EMPTY"]);

        let fake = analyze("environment { env = \"fake.jar\". }\nlaunchpolicy { }\n");
        assert_eq!(kinds(&fake)[0], "ENVIRONMENT_NOTAJAR");

        let offline = analyze_with(
            "environment { env = \"gone.zip\". }\nlaunchpolicy { }\n",
            &AnalysisOptions::offline(),
        );
        assert_eq!(kinds(&offline), vec!["ENVIRONMENT_NOTAJAR", "LAUNCHPOLICY_EMPTY"]);
    }

    #[test]
    fn test_second_environment_section() {
        let analysis = analyze(
            "environment { env = \"elevator.jar\". }\nlaunchpolicy { }\nenvironment { env = \"gone.jar\". }\n",
        );
        // Only the first section is checked
        assert_eq!(kinds(&analysis), vec!["ENVIRONMENT_DUPLICATE", "LAUNCHPOLICY_EMPTY"]);
        let d = &analysis.diagnostics[0];
        assert_eq!((d.position.line, d.position.column), (3, 1));
        assert_eq!(d.args, vec!["m.mas2g:1:1".to_string()]);
        assert!(d.message.contains("m.mas2g:1:1"), "{}", d.message);
    }

    #[test]
    fn test_duplicate_init_key() {
        let analysis = analyze(
            "environment { env = \"elevator.jar\". init = [floors = 3, floors = 4]. }\nlaunchpolicy { }\n",
        );
        assert_eq!(kinds(&analysis), vec!["INIT_DUPLICATE_KEY", "LAUNCHPOLICY_EMPTY"]);
    }

    #[test]
    fn test_agent_file_checks() {
        let analysis = analyze(
            "agentfiles {\n \"car.goal\" [name = a, name = b, colour = red].\n \"x.txt\".\n \"lost.goal\".\n}\nlaunchpolicy { launch a : a. launch x : x. launch l : lost. }\n",
        );
        assert_eq!(
            kinds(&analysis),
            vec![
                "AGENTFILE_DUPLICATE_PARAMETER",
                "AGENTFILE_UNKNOWN_PARAMETER",
                "AGENTFILE_WRONG_EXTENSION",
                "AGENTFILE_COULDNOT_FIND",
            ]
        );
    }

    #[test]
    fn test_duplicate_agent_file_name_first_wins() {
        let analysis = analyze(
            "agentfiles { \"car.goal\" [name = a]. \"manager.goal\" [name = a]. }\nlaunchpolicy { launch a : a. }\n",
        );
        assert_eq!(kinds(&analysis), vec!["AGENTFILE_DUPLICATE_NAME"]);
        let bound = analysis
            .table
            .lookup(SymbolCategory::AgentFile, "a")
            .expect("a");
        assert_eq!(bound.resource, Some(PathBuf::from("car.goal")));
    }

    #[test]
    fn test_unused_agent_file() {
        let analysis = analyze("agentfiles { \"car.goal\". \"manager.goal\". }\nlaunchpolicy { launch car : car. }\n");
        assert_eq!(kinds(&analysis), vec!["AGENTFILE_UNUSED"]);
        assert_eq!(analysis.diagnostics[0].args, vec!["manager.goal".to_string()]);

        let quiet = analyze_with(
            "agentfiles { \"car.goal\". \"manager.goal\". }\nlaunchpolicy { launch car : car. }\n",
            &AnalysisOptions {
                report_unused: false,
                ..AnalysisOptions::default()
            },
        );
        assert!(quiet.diagnostics.is_empty());
    }

    #[test]
    fn test_launch_rule_checks() {
        let analysis = analyze(
            "agentfiles { \"car.goal\". }\nlaunchpolicy {\n launch * : car.\n launch c[number = 0] : car.\n when [max = many]@env do launch d : car.\n}\n",
        );
        assert_eq!(
            kinds(&analysis),
            vec![
                "LAUNCH_UNCONDITIONAL_WILDCARD",
                "LAUNCH_INVALID_NUMBER",
                "LAUNCH_CONDITIONAL_WITHOUT_ENVIRONMENT",
                "CONSTRAINT_INVALID_NUMBER",
            ]
        );
    }

    #[test]
    fn test_missing_launch_policy() {
        let analysis = analyze("");
        assert_eq!(kinds(&analysis), vec!["LAUNCHPOLICY_EMPTY"]);
        assert_eq!(analysis.diagnostics[0].position.span, None);
    }

    #[test]
    fn test_agent_names() {
        let analysis = analyze(
            "agentfiles { \"car.goal\". \"manager.goal\" [name = boss]. }\nlaunchpolicy { launch elevator1 : car. launch boss : boss. }\n",
        );
        let names: Vec<_> = analysis.agent_names().collect();
        assert_eq!(names, vec!["car", "boss", "elevator1", "boss"]);
        assert!(analysis.can_launch("elevator1"));
        assert!(!analysis.can_launch("stranger"));
    }
}
