//! # Oracle: Comparator, Aggregator, Orchestrator
//!
//! Turns a set of per-file fingerprints (§4.1-§4.5) into the unified
//! analysis response (§4.6-§4.8): pairwise similarity scoring and matched
//! regions, the similarity matrix/graph/cluster views, and the response
//! envelope itself — `analysis_id`, summary, per-file metrics, metadata, and
//! an optional LLM summary.
//!
//! `comparator` and `aggregator` are pure, synchronous, and exhaustively
//! unit-tested in isolation; `orchestrator` wires them together behind a
//! single `async` entry point so a future HTTP surface can await it, and
//! `cache` holds the process-wide in-memory table a visualisation endpoint
//! would read from after the fact.

pub mod aggregator;
pub mod cache;
pub mod comparator;
pub mod orchestrator;

pub use cache::AnalysisCache;
pub use comparator::compare_single;
pub use orchestrator::{run_analysis, AnalysisResponse, ComparisonScope};
