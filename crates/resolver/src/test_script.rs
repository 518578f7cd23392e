//! Semantic checks for a parsed test script, against the MAS it names.

use crate::mas::{is_positive_integer, MasAnalysis};
use crate::options::AnalysisOptions;
use crate::probe::ResourceProbe;
use crate::symbols::{RefTarget, SymbolCategory, SymbolTable};
use mas2g_parser::ast::TestFile;
use mas2g_parser::catalog::{DiagnosticKind, TestError};
use mas2g_parser::diagnostic::{Diagnostic, Position, SourceMap};
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct TestAnalysis {
    pub table: SymbolTable,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct TestAnalyzer<'a> {
    map: SourceMap<'a>,
    probe: &'a dyn ResourceProbe,
    options: &'a AnalysisOptions,
    mas: Option<&'a MasAnalysis>,
}

impl<'a> TestAnalyzer<'a> {
    /// `mas` is the analysis of the MAS file the script names, when it could
    /// be parsed. Without it, tested agents are not checked.
    pub fn new(
        map: SourceMap<'a>,
        probe: &'a dyn ResourceProbe,
        options: &'a AnalysisOptions,
        mas: Option<&'a MasAnalysis>,
    ) -> Self {
        Self {
            map,
            probe,
            options,
            mas,
        }
    }

    pub fn analyze(self, test: &TestFile) -> TestAnalysis {
        let mut table = SymbolTable::new(self.map.file());
        let mut diagnostics = Vec::new();

        let mas_path = &test.mas;
        if self.options.check_resources && !self.probe.exists(Path::new(&mas_path.node)) {
            diagnostics.push(self.map.diagnostic(
                DiagnosticKind::TestError(TestError::MasNotFound),
                vec![mas_path.node.clone()],
                mas_path.span.clone(),
            ));
        }

        if let Some(timeout) = &test.timeout {
            if !is_positive_integer(&timeout.node) {
                diagnostics.push(self.map.diagnostic(
                    DiagnosticKind::TestError(TestError::InvalidTimeout),
                    vec![timeout.node.clone()],
                    timeout.span.clone(),
                ));
            }
        }

        // Agents the MAS can launch, then the tested agents
        let checked = self.mas.filter(|mas| !mas.has_wildcard_launch);
        if let Some(mas) = checked {
            for name in mas.agent_names() {
                table.declare(
                    SymbolCategory::Agent,
                    name,
                    Position::file_start(mas.file.as_str()),
                    None,
                );
            }
        } else {
            debug!(file = self.map.file(), "tested agents not checked against a MAS");
        }

        for agent_test in &test.tests {
            let agent = &agent_test.node.agent;
            let position = self.map.position(agent.span.clone());
            if let Some(warning) = table.declare(
                SymbolCategory::AgentTest,
                agent.node.clone(),
                position.clone(),
                None,
            ) {
                diagnostics.push(warning.into_diagnostic());
            }
            if checked.is_some() {
                table.reference(
                    SymbolCategory::Agent,
                    RefTarget::Name(agent.node.clone()),
                    position,
                    mas_path.node.clone(),
                );
            }
        }

        table.resolve_into(&mut diagnostics);
        debug!(
            file = self.map.file(),
            tests = test.tests.len(),
            diagnostics = diagnostics.len(),
            "analyzed test script"
        );
        TestAnalysis { table, diagnostics }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mas::MasAnalyzer;
    use crate::probe::MemoryProbe;
    use mas2g_parser::{parse_mas, parse_test};
    use pretty_assertions::assert_eq;

    const MAS: &str = "agentfiles { \"car.goal\". \"manager.goal\" [name = boss]. }\nlaunchpolicy { launch boss : boss. launch elevator1 : car. }\n";

    fn mas_analysis(source: &str) -> MasAnalysis {
        let mas = parse_mas("m.mas2g", source).expect("MAS");
        let options = AnalysisOptions::offline();
        MasAnalyzer::new(SourceMap::new("m.mas2g", source), &MemoryProbe::new(), &options)
            .analyze(&mas)
    }

    fn analyze(source: &str, mas: Option<&MasAnalysis>) -> Vec<&'static str> {
        let test = parse_test("t.test2g", source).expect("test script");
        let probe = MemoryProbe::new().with_file("m.mas2g", MAS.as_bytes().to_vec());
        let options = AnalysisOptions::default();
        let analysis =
            TestAnalyzer::new(SourceMap::new("t.test2g", source), &probe, &options, mas).analyze(&test);
        analysis.diagnostics.iter().map(|d| d.kind.id()).collect()
    }

    #[test]
    fn test_known_agents() {
        let mas = mas_analysis(MAS);
        let source = "masTest {\n mas = \"m.mas2g\".\n timeout = 10.\n car { eventually bel(x). }\n boss { never bel(y). }\n elevator1 { always bel(z). }\n}\n";
        assert_eq!(analyze(source, Some(&mas)), Vec::<&str>::new());
    }

    #[test]
    fn test_unknown_agent() {
        let mas = mas_analysis(MAS);
        let source = "masTest {\n mas = \"m.mas2g\".\n ghost { eventually bel(x). }\n}\n";
        assert_eq!(analyze(source, Some(&mas)), vec!["TEST_UNKNOWN_AGENT"]);
    }

    #[test]
    fn test_wildcard_mas_accepts_any_agent() {
        let mas = mas_analysis(
            "environment { env = \"e.jar\". }\nagentfiles { \"car.goal\". }\nlaunchpolicy { when *@env do launch * : car. }\n",
        );
        let source = "masTest {\n mas = \"m.mas2g\".\n ghost { eventually bel(x). }\n}\n";
        assert_eq!(analyze(source, Some(&mas)), Vec::<&str>::new());
    }

    #[test]
    fn test_missing_mas_and_bad_timeout() {
        let source = "masTest {\n mas = \"other.mas2g\".\n timeout = 0.\n ghost { eventually bel(x). }\n}\n";
        assert_eq!(
            analyze(source, None),
            vec!["TEST_MAS_NOT_FOUND", "TEST_INVALID_TIMEOUT"]
        );
    }

    #[test]
    fn test_duplicate_agent_test() {
        let mas = mas_analysis(MAS);
        let source = "masTest {\n mas = \"m.mas2g\".\n car { eventually bel(x). }\n car { never bel(y). }\n}\n";
        assert_eq!(analyze(source, Some(&mas)), vec!["TEST_DUPLICATE_AGENT"]);
    }
}
