//! Whole-pipeline tests over single compilation units.
//!
//! Fixture MAS files declare the diagnostics they must produce in
//! `% expect: KIND` comment lines; a fixture without any must compile clean.

use mas2g::{
    compile_mas, compile_test, AnalysisOptions, DiskProbe, MemoryProbe, ResourceProbe,
};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn expected_kinds(source: &str) -> Vec<String> {
    source
        .lines()
        .filter_map(|line| line.trim().strip_prefix("% expect:"))
        .map(|kind| kind.trim().to_string())
        .collect()
}

fn ids(report: &mas2g::UnitReport) -> Vec<&'static str> {
    report.diagnostics.iter().map(|d| d.kind.id()).collect()
}

#[test]
fn mas_fixtures_produce_expected_diagnostics() {
    let dir = fixtures_dir();
    let probe = DiskProbe::new(&dir);
    let options = AnalysisOptions::default();
    let pattern = dir.join("*.mas2g");

    let mut checked = 0;
    for entry in glob::glob(&pattern.to_string_lossy()).expect("valid glob pattern") {
        let path = entry.expect("readable fixture path");
        let source = fs::read_to_string(&path).expect("readable fixture");
        let name = path.file_name().unwrap().to_string_lossy().to_string();

        let report = compile_mas(&name, &source, &probe, &options);
        let actual: Vec<String> = ids(&report).into_iter().map(String::from).collect();
        assert_eq!(actual, expected_kinds(&source), "fixture {}", name);
        checked += 1;
    }
    assert!(checked >= 9, "only {} fixtures found", checked);
}

#[test]
fn test_fixture_against_its_mas() {
    let dir = fixtures_dir();
    let probe = DiskProbe::new(&dir);
    let options = AnalysisOptions::default();

    let mas_source = fs::read_to_string(dir.join("clean_elevator.mas2g")).unwrap();
    let mas = compile_mas("clean_elevator.mas2g", &mas_source, &probe, &options);
    assert!(mas.is_success(), "{:#?}", mas.diagnostics);

    let test_source = fs::read_to_string(dir.join("elevator.test2g")).unwrap();
    let report = compile_test(
        "elevator.test2g",
        &test_source,
        mas.analysis.as_ref(),
        &probe,
        &options,
    );
    assert!(report.analyzed);
    assert!(report.diagnostics.is_empty(), "{:#?}", report.diagnostics);
}

// ============================================================================
// Scenarios
// ============================================================================

fn memory_probe() -> MemoryProbe {
    MemoryProbe::new()
        .with_file("car.goal", Vec::new())
        .with_file("manager.goal", Vec::new())
        .with_file("env.jar", b"PK\x03\x04".to_vec())
}

#[test]
fn undeclared_agent_file_gives_one_reference_error() {
    let source = "agentfiles { \"car.goal\". }\nlaunchpolicy {\n   launch car : car.\n   launch bob : \"bob.goal\".\n}\n";
    let report = compile_mas("m.mas2g", source, &memory_probe(), &AnalysisOptions::default());
    assert_eq!(ids(&report), vec!["AGENTFILE_NONEXISTANT_REFERENCE"]);
    assert!(!report.is_success());
    assert_eq!(report.diagnostics[0].position.line, 4);
}

#[test]
fn repeated_max_constraint_gives_one_warning_and_still_resolves() {
    let source = "environment { env = \"env.jar\". }\nagentfiles { \"car.goal\". }\nlaunchpolicy {\n   when [max = 1, max = 2]@env do launch * : car.\n}\n";
    let report = compile_mas("m.mas2g", source, &memory_probe(), &AnalysisOptions::default());
    assert_eq!(ids(&report), vec!["CONSTRAINT_DUPLICATE"]);
    assert!(report.is_success());

    let analysis = report.analysis.expect("analysis");
    let graph = analysis.table.graph();
    assert!(graph.unresolved().is_empty());
    assert_eq!(graph.edge_count(), 1);
}

#[test]
fn unreferenced_agent_file_gives_one_unused_warning() {
    let source = "agentfiles { \"car.goal\". \"manager.goal\". }\nlaunchpolicy { launch car : car. }\n";
    let report = compile_mas("m.mas2g", source, &memory_probe(), &AnalysisOptions::default());
    assert_eq!(ids(&report), vec!["AGENTFILE_UNUSED"]);
    assert!(report.is_success());
    assert_eq!(report.warning_count(), 1);
}

#[test]
fn duplicate_declaration_warns_once_and_first_wins() {
    let source = "agentfiles {\n   \"car.goal\" [name = a].\n   \"manager.goal\" [name = a].\n}\nlaunchpolicy { launch a : a. }\n";
    let report = compile_mas("m.mas2g", source, &memory_probe(), &AnalysisOptions::default());
    assert_eq!(ids(&report), vec!["AGENTFILE_DUPLICATE_NAME"]);
    assert_eq!(report.diagnostics[0].position.line, 3);

    let analysis = report.analysis.expect("analysis");
    let symbol = analysis
        .table
        .lookup(mas2g::resolver::SymbolCategory::AgentFile, "a")
        .expect("a");
    assert_eq!(symbol.position.line, 2);
}

#[test]
fn resolution_is_idempotent() {
    let source = "agentfiles { \"car.goal\". \"manager.goal\". }\nlaunchpolicy { launch x : ghost. }\n";
    let report = compile_mas("m.mas2g", source, &memory_probe(), &AnalysisOptions::default());
    let table = &report.analysis.as_ref().expect("analysis").table;
    let first = table.resolve_all();
    assert_eq!(first.len(), 3);
    assert_eq!(first, table.resolve_all());
}

#[test]
fn test_script_checks_agents_against_mas() {
    let probe = memory_probe();
    let options = AnalysisOptions::offline();
    let mas = compile_mas(
        "m.mas2g",
        "agentfiles { \"car.goal\". }\nlaunchpolicy { launch car : car. }\n",
        &probe,
        &options,
    );

    let source = "masTest {\n   mas = \"m.mas2g\".\n   timeout = -5.\n   car { eventually bel(x). }\n   ghost { never bel(y). }\n   car { always bel(z). }\n}\n";
    let report = compile_test("t.test2g", source, mas.analysis.as_ref(), &probe, &options);
    assert_eq!(
        ids(&report),
        vec!["TEST_INVALID_TIMEOUT", "TEST_UNKNOWN_AGENT", "TEST_DUPLICATE_AGENT"]
    );
    assert!(report.diagnostics[1].message.contains("ghost"));
}

#[test]
fn unterminated_literal_in_mas_reports_once() {
    let source = "agentfiles {\n   \"car.goal\n   .\n}\nlaunchpolicy { launch car : car. }\n";
    let report = compile_mas("m.mas2g", source, &memory_probe(), &AnalysisOptions::default());
    assert_eq!(ids(&report), vec!["UNTERMINATEDSTRINGLITERAL"]);
    assert!(!report.analyzed);
}

#[test]
fn broken_statements_in_one_section_are_all_reported() {
    let source = "launchpolicy {\n   launch a b.\n   launch c : car.\n   launch d e.\n}\n";
    let report = compile_mas("m.mas2g", source, &memory_probe(), &AnalysisOptions::default());
    assert_eq!(ids(&report), vec!["INPUTMISMATCH", "INPUTMISMATCH"]);
    let lines: Vec<_> = report.diagnostics.iter().map(|d| d.position.line).collect();
    assert_eq!(lines, vec![2, 4]);
    assert!(!report.analyzed);
}

#[test]
fn report_serializes_without_analysis() {
    let source = "launchpolicy { launch * : car. }\n";
    let report = compile_mas("m.mas2g", source, &memory_probe(), &AnalysisOptions::default());
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["file"], "m.mas2g");
    assert!(json.get("analysis").is_none());
    assert_eq!(json["diagnostics"][0]["kind"], "LAUNCH_UNCONDITIONAL_WILDCARD");
}

#[test]
fn probes_are_interchangeable() {
    let probes: Vec<Box<dyn ResourceProbe>> = vec![
        Box::new(memory_probe()),
        Box::new(DiskProbe::new(fixtures_dir())),
    ];
    let source = "agentfiles { \"car.goal\". }\nlaunchpolicy { launch car : car. }\n";
    for probe in &probes {
        let report = compile_mas("m.mas2g", source, probe.as_ref(), &AnalysisOptions::default());
        assert!(report.diagnostics.is_empty(), "{:#?}", report.diagnostics);
    }
}
