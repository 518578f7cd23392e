//! Benchmarks for the scan, parse and resolve pipeline.
//!
//! Run with: cargo bench
//! Results are saved to target/criterion/

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use glob::glob;
use mas2g::parser::scanner::ScanEvent;
use mas2g::{compile_mas, AnalysisOptions, MemoryProbe};
use std::fs;

/// A MAS file with `agents` agent files, each launched once. Every tenth
/// declaration is broken to exercise recovery.
fn generated_mas(agents: usize, broken: bool) -> String {
    let mut source = String::from("environment {\n   env = \"env.jar\".\n   init = [floors = 4].\n}\n\nagentfiles {\n");
    for i in 0..agents {
        if broken && i % 10 == 0 {
            source.push_str(&format!("   \"agent{}.goal\n   .\n", i));
        } else {
            source.push_str(&format!("   \"agent{}.goal\" [name = a{}].\n", i, i));
        }
    }
    source.push_str("}\n\nlaunchpolicy {\n");
    for i in 0..agents {
        source.push_str(&format!("   when [type = t{}, max = 2]@env do launch * : a{}.\n", i, i));
    }
    source.push_str("}\n");
    source
}

fn load_fixtures() -> Vec<(String, String)> {
    let mut fixtures: Vec<(String, String)> = glob("tests/fixtures/*.mas2g")
        .expect("Failed to read glob pattern")
        .flatten()
        .filter_map(|path| {
            let content = fs::read_to_string(&path).ok()?;
            let name = path.file_stem()?.to_str()?.to_string();
            Some((name, content))
        })
        .collect();
    fixtures.sort_by(|a, b| a.0.cmp(&b.0));
    fixtures
}

fn bench_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("scan");
    for agents in [10, 100, 1000] {
        let source = generated_mas(agents, true);
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(agents), &source, |b, source| {
            b.iter(|| {
                let mut events: Vec<ScanEvent> = Vec::new();
                let count = mas2g::parser::scan(black_box(source), &mut events).count();
                black_box((count, events.len()))
            });
        });
    }
    group.finish();
}

fn bench_compile(c: &mut Criterion) {
    let options = AnalysisOptions::offline();
    let probe = MemoryProbe::new();

    let mut group = c.benchmark_group("compile_mas");
    for agents in [10, 100, 1000] {
        for broken in [false, true] {
            let source = generated_mas(agents, broken);
            let id = format!("{}{}", agents, if broken { "_broken" } else { "" });
            group.throughput(Throughput::Bytes(source.len() as u64));
            group.bench_with_input(BenchmarkId::from_parameter(id), &source, |b, source| {
                b.iter(|| black_box(compile_mas("bench.mas2g", source, &probe, &options)));
            });
        }
    }
    group.finish();
}

fn bench_fixtures(c: &mut Criterion) {
    let fixtures = load_fixtures();
    if fixtures.is_empty() {
        eprintln!("Warning: No fixtures found. Run from the repository root.");
        return;
    }

    let options = AnalysisOptions::offline();
    let probe = MemoryProbe::new();
    let mut group = c.benchmark_group("fixtures");
    for (name, content) in &fixtures {
        group.bench_with_input(BenchmarkId::from_parameter(name), content, |b, content| {
            b.iter(|| black_box(compile_mas(name, content, &probe, &options)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_scan, bench_compile, bench_fixtures);
criterion_main!(benches);
