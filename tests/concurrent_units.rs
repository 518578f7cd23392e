//! Independent units compiled on separate threads must not affect each other.

use mas2g::{compile_mas, compile_test, AnalysisOptions, MemoryProbe};
use pretty_assertions::assert_eq;
use std::thread;

fn mas_source(i: usize) -> String {
    // Every third unit launches an undeclared agent file
    let target = if i % 3 == 0 { "ghost" } else { "car" };
    format!(
        "agentfiles {{ \"car.goal\". }}\nlaunchpolicy {{ launch agent{} : {}. }}\n",
        i, target
    )
}

#[test]
fn units_compile_in_parallel() {
    let probe = MemoryProbe::new().with_file("car.goal", Vec::new());
    let options = AnalysisOptions::offline();

    let reports: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let probe = &probe;
                let options = &options;
                scope.spawn(move || {
                    let file = format!("unit{}.mas2g", i);
                    compile_mas(&file, &mas_source(i), probe, options)
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("worker panicked"))
            .collect()
    });

    for (i, report) in reports.iter().enumerate() {
        assert_eq!(report.file, format!("unit{}.mas2g", i));
        let ids: Vec<_> = report.diagnostics.iter().map(|d| d.kind.id()).collect();
        if i % 3 == 0 {
            assert_eq!(ids, vec!["AGENTFILE_UNUSED", "AGENTFILE_NONEXISTANT_REFERENCE"]);
        } else {
            assert_eq!(ids, Vec::<&str>::new());
        }
        assert!(report
            .diagnostics
            .iter()
            .all(|d| d.position.file == report.file));
    }
}

#[test]
fn test_scripts_share_one_mas_analysis() {
    let probe = MemoryProbe::new().with_file("car.goal", Vec::new());
    let options = AnalysisOptions::offline();
    let mas = compile_mas("m.mas2g", &mas_source(1), &probe, &options);
    let analysis = mas.analysis.as_ref();

    let results: Vec<usize> = thread::scope(|scope| {
        let handles: Vec<_> = ["agent1", "agent2", "car"]
            .into_iter()
            .map(|agent| {
                let probe = &probe;
                let options = &options;
                scope.spawn(move || {
                    let source = format!(
                        "masTest {{ mas = \"m.mas2g\". {} {{ eventually bel(done). }} }}",
                        agent
                    );
                    compile_test("t.test2g", &source, analysis, probe, options).error_count()
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("worker panicked"))
            .collect()
    });

    // agent1 is launched and car is a declared agent file
    assert_eq!(results, vec![0, 1, 0]);
}
