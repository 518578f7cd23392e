//! # mas2g-resolver
//!
//! Semantic analysis of parsed MAS files and test scripts.
//!
//! Each compilation unit gets its own [`SymbolTable`]: analyzers declare what
//! a file defines, record what it uses, and resolve the uses over a
//! petgraph [`ReferenceGraph`] once all declarations are in.
//!
//! ## Features
//!
//! - **Reference resolution**: launch rules must name declared agent files,
//!   tests must name agents their MAS launches
//! - **Duplicate detection**: repeated agent names, init keys and agent tests
//!   are reported once; the first declaration stays bound
//! - **Dead declarations**: agent files no launch rule uses
//! - **Resource checks**: referenced files exist and environments are jar
//!   archives, through a swappable [`ResourceProbe`]
//!
//! ## Example
//!
//! ```rust
//! use mas2g_parser::{parse_mas, SourceMap};
//! use mas2g_resolver::{AnalysisOptions, MasAnalyzer, MemoryProbe};
//!
//! let source = "agentfiles { \"car.goal\". }\nlaunchpolicy { launch car : bob. }\n";
//! let mas = parse_mas("demo.mas2g", source).unwrap();
//!
//! let probe = MemoryProbe::new().with_file("car.goal", Vec::new());
//! let options = AnalysisOptions::default();
//! let analysis = MasAnalyzer::new(SourceMap::new("demo.mas2g", source), &probe, &options)
//!     .analyze(&mas);
//!
//! let ids: Vec<_> = analysis.diagnostics.iter().map(|d| d.kind.id()).collect();
//! assert_eq!(ids, ["AGENTFILE_NONEXISTANT_REFERENCE", "AGENTFILE_UNUSED"]);
//! ```

pub mod graph;
pub mod mas;
pub mod options;
pub mod probe;
pub mod symbols;
pub mod test_script;

pub use graph::{GraphRepr, RefEdge, RefNode, ReferenceGraph};
pub use mas::{MasAnalysis, MasAnalyzer, AGENT_FILE_PARAMETERS};
pub use options::AnalysisOptions;
pub use probe::{DiskProbe, MemoryProbe, ProbeError, ResourceProbe};
pub use symbols::{DuplicateWarning, RefTarget, Reference, Symbol, SymbolCategory, SymbolTable};
pub use test_script::{TestAnalysis, TestAnalyzer};
