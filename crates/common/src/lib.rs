//! Shared types for the structural-similarity pipeline: the Unified
//! Intermediate Representation (UIR), per-file fingerprints, comparator
//! output, and the configuration loaded at the process boundary.

pub mod cancellation;
pub mod config;
pub mod error;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub use cancellation::CancellationToken;
pub use config::Config;
pub use error::{AnalysisError, PipelineError};

/// Language family a source file belongs to.
///
/// Determines parse-failure tolerance (§4.1): `Python` is fatal on a syntax
/// error, `JavaScript`/`TypeScript` tolerate a partial tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
}

impl Language {
    /// Resolves a language from a filename's extension, or `None` if the
    /// extension is not recognised (`UnsupportedFile`).
    pub fn from_extension(filename: &str) -> Option<Self> {
        let ext = filename.rsplit('.').next()?;
        match ext {
            "py" => Some(Language::Python),
            "js" | "jsx" => Some(Language::JavaScript),
            "ts" | "tsx" => Some(Language::TypeScript),
            _ => None,
        }
    }

    /// Whether a parse error in this language family is fatal to the file
    /// (scripting family) or merely degrades to a partial tree (curly-brace
    /// family).
    pub fn fatal_on_parse_error(self) -> bool {
        matches!(self, Language::Python)
    }
}

/// A single node of the Unified Intermediate Representation.
///
/// `children` is ordered; order matters for CFG/DFG discovery but is
/// deliberately ignored (via hash sorting) for the AST layer so that
/// commutable children don't spuriously differ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UirNode {
    pub kind: String,
    pub children: Vec<UirNode>,
    pub start_line: u32,
    pub end_line: u32,
    pub name: Option<String>,
    pub value: Option<String>,
}

impl UirNode {
    pub fn leaf(kind: impl Into<String>, start_line: u32, end_line: u32) -> Self {
        Self {
            kind: kind.into(),
            children: Vec::new(),
            start_line,
            end_line,
            name: None,
            value: None,
        }
    }

    pub fn with_children(
        kind: impl Into<String>,
        start_line: u32,
        end_line: u32,
        children: Vec<UirNode>,
    ) -> Self {
        Self {
            kind: kind.into(),
            children,
            start_line,
            end_line,
            name: None,
            value: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

/// Node kinds too small to record as independent structural units. They
/// still feed their parent's hash (see `forge::ast`), they are simply never
/// recorded as a standalone `SubtreeInfo`.
///
/// Two kinds of node are trivial: the semantic leaves explicitly named here
/// (bare identifiers and literal-atom wrappers), and raw operator/punctuation
/// tokens carried over verbatim from the tree-sitter grammar (parser adapters
/// give those their literal token text as `kind`, e.g. `"+"` or `"and"`,
/// which never starts with an uppercase letter — our mapped structural node
/// kinds, like `FunctionDef` or `If`, always do).
pub const TRIVIAL_KINDS: &[&str] = &["Identifier", "Literal", "Constant"];

pub fn is_trivial_kind(kind: &str) -> bool {
    TRIVIAL_KINDS.contains(&kind) || !kind.starts_with(|c: char| c.is_ascii_uppercase())
}

/// Provenance of a single recorded subtree hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtreeInfo {
    pub hash: String,
    pub start_line: u32,
    pub end_line: u32,
}

/// A fully-fingerprinted file: source text, per-subtree hashes (with line
/// provenance), CFG/DFG edge hashes, and structural metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileFingerprint {
    pub filename: String,
    pub language: Language,
    pub source_lines: Vec<String>,
    pub subtree_infos: Vec<SubtreeInfo>,
    pub hash_set: std::collections::HashSet<String>,
    pub hash_to_lines: HashMap<String, Vec<[u32; 2]>>,
    pub cfg_edges: std::collections::HashSet<String>,
    pub dfg_edges: std::collections::HashSet<String>,
    pub cfg_node_count: u32,
    pub metrics: HashMap<String, i64>,
    #[serde(skip)]
    pub normalised_tree: Option<UirNode>,
}

impl FileFingerprint {
    /// Extracts the 1-indexed inclusive line range `[start, end]` as text.
    pub fn snippet(&self, start_line: u32, end_line: u32) -> Vec<CodeLine> {
        let start = start_line.max(1) as usize;
        let end = (end_line as usize).min(self.source_lines.len());
        (start..=end.max(start))
            .filter_map(|ln| {
                self.source_lines
                    .get(ln - 1)
                    .map(|code| CodeLine {
                        line_number: ln as u32,
                        code: code.clone(),
                    })
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeLine {
    pub line_number: u32,
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchedRegion {
    pub file1_lines: [u32; 2],
    pub file2_lines: [u32; 2],
    pub file1_code: Vec<CodeLine>,
    pub file2_code: Vec<CodeLine>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfidenceLevel {
    VeryHigh,
    High,
    Moderate,
    Low,
}

impl ConfidenceLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.85 {
            ConfidenceLevel::VeryHigh
        } else if score >= 0.75 {
            ConfidenceLevel::High
        } else if score >= 0.60 {
            ConfidenceLevel::Moderate
        } else {
            ConfidenceLevel::Low
        }
    }
}

/// Semantic-judge classification. The judge itself is an external
/// collaborator (§4.6); this crate only carries the shape of its verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LlmClassification {
    LikelyCopy,
    TemplateOrBoilerplate,
    StandardAlgorithm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Critical,
    High,
    Medium,
    Low,
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmVerdict {
    pub classification: LlmClassification,
    pub explanation: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefinedVerdict {
    pub risk_level: RiskLevel,
    pub recommendation: String,
}

/// Computes the risk-refinement (§4.6) from a structural score and the
/// judge's classification, independent of whether a judge is reachable.
pub fn compute_refined_verdict(structural_score: f64, verdict: &LlmVerdict) -> RefinedVerdict {
    match verdict.classification {
        LlmClassification::StandardAlgorithm => RefinedVerdict {
            risk_level: RiskLevel::None,
            recommendation: "Common algorithmic pattern; no action needed.".to_string(),
        },
        LlmClassification::TemplateOrBoilerplate => RefinedVerdict {
            risk_level: RiskLevel::Low,
            recommendation: "Likely shared boilerplate; review only if pattern recurs."
                .to_string(),
        },
        LlmClassification::LikelyCopy => {
            let risk_level = if structural_score >= 0.85 {
                RiskLevel::Critical
            } else if structural_score >= 0.75 {
                RiskLevel::High
            } else {
                RiskLevel::Medium
            };
            RefinedVerdict {
                risk_level,
                recommendation: "Manual review recommended.".to_string(),
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityPair {
    pub file1: String,
    pub file2: String,
    pub similarity_score: f64,
    pub ast_score: f64,
    pub cfg_score: f64,
    pub dfg_score: f64,
    pub confidence_level: ConfidenceLevel,
    pub plagiarism_flag: bool,
    pub matching_regions: Vec<MatchedRegion>,
    pub llm_verdict: Option<LlmVerdict>,
    pub refined_verdict: Option<RefinedVerdict>,
}

pub const PLAGIARISM_THRESHOLD: f64 = 0.75;

pub fn plagiarism_flag(score: f64) -> bool {
    score >= PLAGIARISM_THRESHOLD
}

/// Rounds to 4 decimal places, matching the precision carried in every
/// score field of the unified response (§4.6-§4.8).
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityMatrix {
    pub files: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityGraph {
    pub nodes: Vec<String>,
    pub edges: Vec<GraphEdge>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cluster {
    pub members: Vec<String>,
    pub average_similarity: f64,
}

/// Contract for the external semantic-judge collaborator (§4.6, §6). The
/// core is fully testable without any implementation of this trait
/// reachable; its absence never fails an analysis.
pub trait SemanticJudge: Send + Sync {
    fn judge(
        &self,
        file1_source: &str,
        file2_source: &str,
        ast_score: f64,
        cfg_score: f64,
        dfg_score: f64,
    ) -> anyhow::Result<LlmVerdict>;
}
