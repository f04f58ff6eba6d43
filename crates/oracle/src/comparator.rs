//! Pairwise comparator (§4.6): turns two fingerprints into a [`SimilarityPair`]
//! — the weighted three-layer score, matched regions, and (above the LLM
//! threshold) a semantic-judge verdict. File-level fan-out runs across
//! available cores via `rayon`; the comparison itself stays plain sync code.

use common::{
    compute_refined_verdict, plagiarism_flag, round4, Config, ConfidenceLevel, FileFingerprint,
    MatchedRegion, SemanticJudge, SimilarityPair,
};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};

/// All pairwise comparisons within a single set of files, `i < j` over the
/// sorted filenames, dropping any pair whose weighted score falls below
/// `config.similarity_threshold`. Sorted by descending score, ties broken by
/// `(file1, file2)` ascending.
pub fn compute_similarity(
    fingerprints: &HashMap<String, FileFingerprint>,
    config: &Config,
    judge: Option<&dyn SemanticJudge>,
) -> Vec<SimilarityPair> {
    let mut names: Vec<&String> = fingerprints.keys().collect();
    names.sort();

    let mut index_pairs = Vec::new();
    for i in 0..names.len() {
        for j in (i + 1)..names.len() {
            index_pairs.push((i, j));
        }
    }

    let mut pairs: Vec<SimilarityPair> = index_pairs
        .par_iter()
        .filter_map(|&(i, j)| {
            build_pair(
                names[i],
                &fingerprints[names[i]],
                names[j],
                &fingerprints[names[j]],
                config,
                judge,
            )
        })
        .collect();

    sort_pairs(&mut pairs);
    pairs
}

/// Comparisons between two disjoint groups of files — every file in
/// `group_a` against every file in `group_b`, none within a group.
pub fn compute_cross_similarity(
    group_a: &HashMap<String, FileFingerprint>,
    group_b: &HashMap<String, FileFingerprint>,
    config: &Config,
    judge: Option<&dyn SemanticJudge>,
) -> Vec<SimilarityPair> {
    let mut names_a: Vec<&String> = group_a.keys().collect();
    names_a.sort();
    let mut names_b: Vec<&String> = group_b.keys().collect();
    names_b.sort();

    let mut cross_pairs = Vec::new();
    for a in &names_a {
        for b in &names_b {
            cross_pairs.push((*a, *b));
        }
    }

    let mut pairs: Vec<SimilarityPair> = cross_pairs
        .par_iter()
        .filter_map(|(a, b)| build_pair(a, &group_a[*a], b, &group_b[*b], config, judge))
        .collect();

    sort_pairs(&mut pairs);
    pairs
}

fn sort_pairs(pairs: &mut [SimilarityPair]) {
    pairs.sort_by(|a, b| {
        b.similarity_score
            .partial_cmp(&a.similarity_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.file1.cmp(&b.file1))
            .then_with(|| a.file2.cmp(&b.file2))
    });
}

fn build_pair(
    name1: &str,
    fp1: &FileFingerprint,
    name2: &str,
    fp2: &FileFingerprint,
    config: &Config,
    judge: Option<&dyn SemanticJudge>,
) -> Option<SimilarityPair> {
    let pair = score_pair(name1, fp1, name2, fp2, config, judge);
    if pair.similarity_score < config.similarity_threshold {
        return None;
    }
    Some(pair)
}

/// Scores a single pair unconditionally, ignoring `similarity_threshold` —
/// used for a direct single-pair query (the CLI's `compare` subcommand),
/// where the caller asked about this exact pair and a below-threshold score
/// is itself the answer, not a reason to omit one.
pub fn compare_single(
    name1: &str,
    fp1: &FileFingerprint,
    name2: &str,
    fp2: &FileFingerprint,
    config: &Config,
    judge: Option<&dyn SemanticJudge>,
) -> SimilarityPair {
    score_pair(name1, fp1, name2, fp2, config, judge)
}

fn score_pair(
    name1: &str,
    fp1: &FileFingerprint,
    name2: &str,
    fp2: &FileFingerprint,
    config: &Config,
    judge: Option<&dyn SemanticJudge>,
) -> SimilarityPair {
    let ast_score = jaccard(&fp1.hash_set, &fp2.hash_set);
    let cfg_score = jaccard_both_empty_is_full_match(&fp1.cfg_edges, &fp2.cfg_edges);
    let dfg_score = jaccard_both_empty_is_full_match(&fp1.dfg_edges, &fp2.dfg_edges);

    let final_score =
        config.ast_weight * ast_score + config.cfg_weight * cfg_score + config.dfg_weight * dfg_score;

    let mut pair = SimilarityPair {
        file1: name1.to_string(),
        file2: name2.to_string(),
        similarity_score: round4(final_score),
        ast_score: round4(ast_score),
        cfg_score: round4(cfg_score),
        dfg_score: round4(dfg_score),
        confidence_level: ConfidenceLevel::from_score(final_score),
        plagiarism_flag: plagiarism_flag(final_score),
        matching_regions: matched_regions(fp1, fp2),
        llm_verdict: None,
        refined_verdict: None,
    };

    if final_score >= config.llm_threshold {
        if let Some(judge) = judge {
            let joined1 = fp1.source_lines.join("\n");
            let joined2 = fp2.source_lines.join("\n");
            match judge.judge(&joined1, &joined2, ast_score, cfg_score, dfg_score) {
                Ok(verdict) => {
                    let refined = compute_refined_verdict(final_score, &verdict);
                    pair.llm_verdict = Some(verdict);
                    pair.refined_verdict = Some(refined);
                }
                Err(e) => {
                    tracing::warn!("semantic judge failed for {name1}/{name2}: {e}");
                }
            }
        }
    }

    pair
}

/// AST-layer Jaccard (§4.3): 0 when both sides are empty, never 1.
fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

/// CFG/DFG-layer Jaccard (§4.4-§4.5): both sides empty (no branches, no data
/// flow) counts as a full match; one side empty counts as no match at all.
fn jaccard_both_empty_is_full_match(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let union = a.union(b).count();
    a.intersection(b).count() as f64 / union as f64
}

/// Enumerates matched code regions (§4.6): every occurrence pair of a shared
/// AST hash, skipping the whole-file root (line 0) and deduplicating by the
/// four line-range endpoints, sorted by `file1`'s starting line.
fn matched_regions(fp1: &FileFingerprint, fp2: &FileFingerprint) -> Vec<MatchedRegion> {
    let mut seen = HashSet::new();
    let mut regions = Vec::new();

    for hash in fp1.hash_set.intersection(&fp2.hash_set) {
        let Some(occurrences1) = fp1.hash_to_lines.get(hash) else {
            continue;
        };
        let Some(occurrences2) = fp2.hash_to_lines.get(hash) else {
            continue;
        };

        for a in occurrences1 {
            if a[0] == 0 {
                continue;
            }
            for b in occurrences2 {
                if b[0] == 0 {
                    continue;
                }
                let key = (a[0], a[1], b[0], b[1]);
                if !seen.insert(key) {
                    continue;
                }
                regions.push(region(fp1, fp2, *a, *b));
            }
        }
    }

    regions.sort_by_key(|r| r.file1_lines[0]);
    regions
}

fn region(fp1: &FileFingerprint, fp2: &FileFingerprint, a: [u32; 2], b: [u32; 2]) -> MatchedRegion {
    MatchedRegion {
        file1_lines: a,
        file2_lines: b,
        file1_code: fp1.snippet(a[0], a[1]),
        file2_code: fp2.snippet(b[0], b[1]),
    }
}
