//! Orchestrator (§4.8, §5): assembles the unified analysis response from a
//! set of fingerprints — runs the comparator, feeds its pairs to the
//! aggregator, folds in per-file metrics, and stamps the result with an
//! analysis id and timestamp. The entry point is `async` so a future HTTP
//! surface can `.await` it alongside other request handling, but everything
//! underneath is plain, synchronous, testable Rust.

use crate::{aggregator, comparator};
use common::{AnalysisError, CancellationToken, Config, FileFingerprint, SemanticJudge, SimilarityPair};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

/// Which comparator variant to run (§4.6): the full within-set comparison,
/// or a cross-group comparison between two disjoint file sets.
pub enum ComparisonScope<'a> {
    WithinSet,
    CrossGroups {
        group_a: &'a [String],
        group_b: &'a [String],
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileMetrics {
    pub file: String,
    pub metrics: HashMap<String, i64>,
    pub total_subtrees: usize,
    pub unique_subtrees: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub total_files: usize,
    pub suspicious_pairs_count: usize,
    pub highest_similarity: f64,
    pub cluster_count: usize,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityBlock {
    pub pairs: Vec<SimilarityPair>,
    pub matrix: common::SimilarityMatrix,
    pub graph: common::SimilarityGraph,
    pub clusters: Vec<common::Cluster>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    pub analysis_type: String,
    pub timestamp: String,
    pub llm_enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSummary {
    pub pairs_evaluated_by_llm: usize,
    pub classification_breakdown: HashMap<String, usize>,
    pub risk_level_breakdown: HashMap<String, usize>,
    pub likely_copy_count: usize,
    pub standard_algorithm_count: usize,
    pub template_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub analysis_id: Uuid,
    pub summary: AnalysisSummary,
    pub files: Vec<String>,
    pub similarity: SimilarityBlock,
    pub metrics: Vec<FileMetrics>,
    pub metadata: AnalysisMetadata,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub llm_summary: Option<LlmSummary>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub errors: Vec<String>,
}

/// Runs a complete analysis over `fingerprints`, producing the response
/// shape a CLI or future HTTP surface serialises directly. `errors` carries
/// any per-file `PipelineError` messages already rendered to text by the
/// caller; they're attached verbatim and never abort the analysis.
///
/// Requires at least two fingerprints — a single file has nothing to compare
/// against. Checked once up front and again after the comparator runs, so a
/// cancellation requested mid-comparison is still honoured.
pub async fn run_analysis(
    fingerprints: &HashMap<String, FileFingerprint>,
    errors: Vec<String>,
    analysis_type: &str,
    scope: ComparisonScope<'_>,
    config: &Config,
    judge: Option<&dyn SemanticJudge>,
    extra_summary: HashMap<String, Value>,
    cancellation: &CancellationToken,
) -> Result<AnalysisResponse, AnalysisError> {
    if fingerprints.len() < 2 {
        return Err(AnalysisError::InsufficientFiles(fingerprints.len()));
    }
    if cancellation.is_cancelled() {
        return Err(AnalysisError::Cancelled);
    }

    let pairs = match scope {
        ComparisonScope::WithinSet => comparator::compute_similarity(fingerprints, config, judge),
        ComparisonScope::CrossGroups { group_a, group_b } => {
            let a = select(fingerprints, group_a);
            let b = select(fingerprints, group_b);
            comparator::compute_cross_similarity(&a, &b, config, judge)
        }
    };

    if cancellation.is_cancelled() {
        return Err(AnalysisError::Cancelled);
    }

    let mut filenames: Vec<String> = fingerprints.keys().cloned().collect();
    filenames.sort();

    let matrix = aggregator::build_matrix(&pairs, &filenames);
    let graph = aggregator::build_graph(&pairs, &filenames, config.graph_threshold);
    let clusters = aggregator::detect_clusters(&pairs, config.cluster_threshold);

    let metrics: Vec<FileMetrics> = filenames
        .iter()
        .map(|f| {
            let fp = &fingerprints[f];
            FileMetrics {
                file: f.clone(),
                metrics: fp.metrics.clone(),
                total_subtrees: fp.subtree_infos.len(),
                unique_subtrees: fp.hash_set.len(),
            }
        })
        .collect();

    let highest_similarity = pairs
        .iter()
        .map(|p| p.similarity_score)
        .fold(0.0_f64, f64::max);

    let llm_summary = build_llm_summary(&pairs);

    let summary = AnalysisSummary {
        total_files: fingerprints.len(),
        suspicious_pairs_count: pairs.len(),
        highest_similarity: common::round4(highest_similarity),
        cluster_count: clusters.len(),
        extra: extra_summary,
    };

    Ok(AnalysisResponse {
        analysis_id: Uuid::new_v4(),
        summary,
        files: filenames,
        similarity: SimilarityBlock {
            pairs,
            matrix,
            graph,
            clusters,
        },
        metrics,
        metadata: AnalysisMetadata {
            analysis_type: analysis_type.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            llm_enabled: llm_summary.is_some(),
        },
        llm_summary,
        errors,
    })
}

fn select(
    fingerprints: &HashMap<String, FileFingerprint>,
    names: &[String],
) -> HashMap<String, FileFingerprint> {
    names
        .iter()
        .filter_map(|name| fingerprints.get(name).map(|fp| (name.clone(), fp.clone())))
        .collect()
}

/// Folds every judge-evaluated pair into classification/risk-level counts
/// (§4.8). Returns `None` when no pair cleared the LLM threshold, so a
/// response without a reachable judge simply omits the field.
fn build_llm_summary(pairs: &[SimilarityPair]) -> Option<LlmSummary> {
    let evaluated: Vec<&SimilarityPair> = pairs.iter().filter(|p| p.llm_verdict.is_some()).collect();
    if evaluated.is_empty() {
        return None;
    }

    let mut classification_breakdown: HashMap<String, usize> = HashMap::new();
    let mut risk_level_breakdown: HashMap<String, usize> = HashMap::new();

    for p in &evaluated {
        if let Some(verdict) = &p.llm_verdict {
            *classification_breakdown
                .entry(classification_label(verdict.classification).to_string())
                .or_insert(0) += 1;
        }
        if let Some(refined) = &p.refined_verdict {
            *risk_level_breakdown
                .entry(risk_label(refined.risk_level).to_string())
                .or_insert(0) += 1;
        }
    }

    let likely_copy_count = *classification_breakdown.get("LIKELY_COPY").unwrap_or(&0);
    let standard_algorithm_count = *classification_breakdown
        .get("STANDARD_ALGORITHM")
        .unwrap_or(&0);
    let template_count = *classification_breakdown
        .get("TEMPLATE_OR_BOILERPLATE")
        .unwrap_or(&0);

    Some(LlmSummary {
        pairs_evaluated_by_llm: evaluated.len(),
        classification_breakdown,
        risk_level_breakdown,
        likely_copy_count,
        standard_algorithm_count,
        template_count,
    })
}

fn classification_label(c: common::LlmClassification) -> &'static str {
    match c {
        common::LlmClassification::LikelyCopy => "LIKELY_COPY",
        common::LlmClassification::TemplateOrBoilerplate => "TEMPLATE_OR_BOILERPLATE",
        common::LlmClassification::StandardAlgorithm => "STANDARD_ALGORITHM",
    }
}

fn risk_label(r: common::RiskLevel) -> &'static str {
    match r {
        common::RiskLevel::Critical => "CRITICAL",
        common::RiskLevel::High => "HIGH",
        common::RiskLevel::Medium => "MEDIUM",
        common::RiskLevel::Low => "LOW",
        common::RiskLevel::None => "NONE",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{Language, SubtreeInfo};
    use std::collections::HashSet;

    fn fixture(filename: &str, hashes: &[&str]) -> FileFingerprint {
        let hash_set: HashSet<String> = hashes.iter().map(|s| s.to_string()).collect();
        let mut hash_to_lines = HashMap::new();
        for (i, h) in hashes.iter().enumerate() {
            hash_to_lines.insert(h.to_string(), vec![[(i as u32) + 1, (i as u32) + 1]]);
        }
        FileFingerprint {
            filename: filename.to_string(),
            language: Language::Python,
            source_lines: hashes.iter().map(|s| s.to_string()).collect(),
            subtree_infos: hashes
                .iter()
                .enumerate()
                .map(|(i, h)| SubtreeInfo {
                    hash: h.to_string(),
                    start_line: (i as u32) + 1,
                    end_line: (i as u32) + 1,
                })
                .collect(),
            hash_set,
            hash_to_lines,
            cfg_edges: HashSet::new(),
            dfg_edges: HashSet::new(),
            cfg_node_count: 0,
            metrics: HashMap::new(),
            normalised_tree: None,
        }
    }

    #[tokio::test]
    async fn rejects_a_single_file() {
        let mut files = HashMap::new();
        files.insert("a.py".to_string(), fixture("a.py", &["h1"]));
        let config = Config::default();
        let result = run_analysis(
            &files,
            Vec::new(),
            "directory",
            ComparisonScope::WithinSet,
            &config,
            None,
            HashMap::new(),
            &CancellationToken::new(),
        )
        .await;
        assert!(matches!(result, Err(AnalysisError::InsufficientFiles(1))));
    }

    #[tokio::test]
    async fn assembles_a_response_for_two_identical_files() {
        let mut files = HashMap::new();
        files.insert("a.py".to_string(), fixture("a.py", &["h1", "h2"]));
        files.insert("b.py".to_string(), fixture("b.py", &["h1", "h2"]));
        let config = Config::default();
        let response = run_analysis(
            &files,
            Vec::new(),
            "directory",
            ComparisonScope::WithinSet,
            &config,
            None,
            HashMap::new(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
        assert_eq!(response.files, vec!["a.py".to_string(), "b.py".to_string()]);
        assert_eq!(response.similarity.pairs.len(), 1);
        assert_eq!(response.similarity.matrix.values[0][0], 1.0);
        assert!(response.metadata.llm_enabled == false);
        assert!(response.llm_summary.is_none());
    }

    #[tokio::test]
    async fn honours_pre_cancelled_token() {
        let mut files = HashMap::new();
        files.insert("a.py".to_string(), fixture("a.py", &["h1"]));
        files.insert("b.py".to_string(), fixture("b.py", &["h1"]));
        let config = Config::default();
        let token = CancellationToken::new();
        token.cancel();
        let result = run_analysis(
            &files,
            Vec::new(),
            "directory",
            ComparisonScope::WithinSet,
            &config,
            None,
            HashMap::new(),
            &token,
        )
        .await;
        assert!(matches!(result, Err(AnalysisError::Cancelled)));
    }
}
