//! Dump the healed token stream of a MAS file or test script.
//!
//! ```text
//! debug_tokens elevator.mas2g --line 12
//! RUST_LOG=mas2g_parser=debug debug_tokens broken.test2g --json
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use mas2g_parser::diagnostic::SourceMap;
use mas2g_parser::scanner::{scan, ScanEvent};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "debug_tokens", about = "Print the token stream the parser sees")]
struct Args {
    /// MAS file or test script to scan
    file: PathBuf,

    /// Only print tokens within five lines of this line
    #[arg(long)]
    line: Option<usize>,

    /// Emit JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct TokenRecord {
    line: usize,
    column: usize,
    kind: String,
    text: Option<String>,
    start: usize,
    end: usize,
}

#[derive(Serialize)]
struct Dump {
    tokens: Vec<TokenRecord>,
    events: Vec<ScanEvent>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let source = fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let map = SourceMap::new(args.file.display().to_string(), &source);

    let mut events = Vec::new();
    let tokens: Vec<TokenRecord> = scan(&source, &mut events)
        .map(|(tok, span)| {
            let (line, column) = map.line_col(span.start);
            TokenRecord {
                line,
                column,
                kind: tok.kind().symbolic_name().to_string(),
                text: tok.text().map(str::to_string),
                start: span.start,
                end: span.end,
            }
        })
        .filter(|t| match args.line {
            Some(target) => t.line + 5 >= target && t.line <= target + 5,
            None => true,
        })
        .collect();

    if args.json {
        let dump = Dump { tokens, events };
        println!("{}", serde_json::to_string_pretty(&dump)?);
        return Ok(());
    }

    for t in &tokens {
        match &t.text {
            Some(text) => println!("Line {:4}:{:<3} {} {:?} @ {}..{}", t.line, t.column, t.kind, text, t.start, t.end),
            None => println!("Line {:4}:{:<3} {} @ {}..{}", t.line, t.column, t.kind, t.start, t.end),
        }
    }
    for event in &events {
        eprintln!("recovery: {:?}", event);
    }
    Ok(())
}
