//! Aggregator (§4.7): reduces a flat pair list into the three visualisation
//! shapes the orchestrator hands back — a dense similarity matrix, a sparse
//! edge-list graph, and connected-component clusters.

use common::{round4, Cluster, GraphEdge, SimilarityGraph, SimilarityMatrix, SimilarityPair};
use petgraph::graphmap::UnGraphMap;
use std::collections::{BTreeSet, HashMap, VecDeque};

/// Dense `n x n` matrix over every known file, not only those with a scored
/// pair. Diagonal is always `1.0`; unscored off-diagonal cells are `0.0`.
pub fn build_matrix(pairs: &[SimilarityPair], filenames: &[String]) -> SimilarityMatrix {
    let index: HashMap<&str, usize> = filenames
        .iter()
        .enumerate()
        .map(|(i, f)| (f.as_str(), i))
        .collect();

    let n = filenames.len();
    let mut values = vec![vec![0.0; n]; n];
    for i in 0..n {
        values[i][i] = 1.0;
    }
    for pair in pairs {
        if let (Some(&i), Some(&j)) = (index.get(pair.file1.as_str()), index.get(pair.file2.as_str())) {
            values[i][j] = pair.similarity_score;
            values[j][i] = pair.similarity_score;
        }
    }

    SimilarityMatrix {
        files: filenames.to_vec(),
        values,
    }
}

/// Visualisation graph: every known file is a node (even an isolated one
/// with no edges above threshold), edges sorted by `(source, target)`.
pub fn build_graph(pairs: &[SimilarityPair], all_files: &[String], threshold: f64) -> SimilarityGraph {
    let mut nodes = all_files.to_vec();
    nodes.sort();

    let mut edges: Vec<GraphEdge> = pairs
        .iter()
        .filter(|p| p.similarity_score >= threshold)
        .map(|p| GraphEdge {
            source: p.file1.clone(),
            target: p.file2.clone(),
            weight: round4(p.similarity_score),
        })
        .collect();
    edges.sort_by(|a, b| a.source.cmp(&b.source).then_with(|| a.target.cmp(&b.target)));

    SimilarityGraph { nodes, edges }
}

/// Connected components of the threshold graph (§4.7), found by BFS starting
/// from the lexicographically smallest unvisited node each round, visiting
/// neighbours in sorted order. Singleton components (no edge survived) are
/// dropped. `average_similarity` is the mean over every pair *within* the
/// component that carries a registered edge weight — not only the direct
/// BFS edges — so a component found via a spanning path still reports the
/// density of all its internal connections.
///
/// Built on `petgraph`'s `UnGraphMap` (edge weight = similarity score)
/// rather than a hand-rolled adjacency map, matching how the rest of this
/// codebase reaches for `petgraph` over raw graph bookkeeping.
pub fn detect_clusters(pairs: &[SimilarityPair], threshold: f64) -> Vec<Cluster> {
    let mut graph: UnGraphMap<&str, f64> = UnGraphMap::new();
    for pair in pairs {
        if pair.similarity_score < threshold {
            continue;
        }
        graph.add_edge(pair.file1.as_str(), pair.file2.as_str(), pair.similarity_score);
    }

    let mut nodes: Vec<&str> = graph.nodes().collect();
    nodes.sort();

    let mut visited: BTreeSet<&str> = BTreeSet::new();
    let mut clusters = Vec::new();

    for &start in &nodes {
        if visited.contains(start) {
            continue;
        }

        let mut component: Vec<&str> = Vec::new();
        let mut queue = VecDeque::new();
        visited.insert(start);
        queue.push_back(start);

        while let Some(node) = queue.pop_front() {
            component.push(node);
            let mut neighbours: Vec<&str> = graph.neighbors(node).collect();
            neighbours.sort();
            for neighbour in neighbours {
                if visited.insert(neighbour) {
                    queue.push_back(neighbour);
                }
            }
        }

        if component.len() < 2 {
            continue;
        }
        component.sort();

        let mut scores = Vec::new();
        for i in 0..component.len() {
            for j in (i + 1)..component.len() {
                if let Some(&score) = graph.edge_weight(component[i], component[j]) {
                    scores.push(score);
                }
            }
        }
        let average = if scores.is_empty() {
            0.0
        } else {
            scores.iter().sum::<f64>() / scores.len() as f64
        };

        clusters.push(Cluster {
            members: component.into_iter().map(String::from).collect(),
            average_similarity: round4(average),
        });
    }

    clusters
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{ConfidenceLevel, MatchedRegion};

    fn pair(file1: &str, file2: &str, score: f64) -> SimilarityPair {
        SimilarityPair {
            file1: file1.to_string(),
            file2: file2.to_string(),
            similarity_score: score,
            ast_score: score,
            cfg_score: score,
            dfg_score: score,
            confidence_level: ConfidenceLevel::from_score(score),
            plagiarism_flag: score >= common::PLAGIARISM_THRESHOLD,
            matching_regions: Vec::<MatchedRegion>::new(),
            llm_verdict: None,
            refined_verdict: None,
        }
    }

    #[test]
    fn matrix_diagonal_is_one_and_symmetric() {
        let files = vec!["a.py".to_string(), "b.py".to_string(), "c.py".to_string()];
        let pairs = vec![pair("a.py", "b.py", 0.8)];
        let matrix = build_matrix(&pairs, &files);
        assert_eq!(matrix.values[0][0], 1.0);
        assert_eq!(matrix.values[1][1], 1.0);
        assert_eq!(matrix.values[0][1], matrix.values[1][0]);
        assert_eq!(matrix.values[0][2], 0.0);
    }

    #[test]
    fn graph_includes_isolated_nodes() {
        let files = vec!["a.py".to_string(), "b.py".to_string(), "c.py".to_string()];
        let pairs = vec![pair("a.py", "b.py", 0.9)];
        let graph = build_graph(&pairs, &files, 0.5);
        assert_eq!(graph.nodes.len(), 3);
        assert_eq!(graph.edges.len(), 1);
    }

    #[test]
    fn graph_drops_edges_below_threshold() {
        let files = vec!["a.py".to_string(), "b.py".to_string()];
        let pairs = vec![pair("a.py", "b.py", 0.3)];
        let graph = build_graph(&pairs, &files, 0.5);
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn singleton_components_are_dropped() {
        let pairs = vec![pair("a.py", "b.py", 0.9)];
        // Only one cluster above threshold; nothing else connects.
        let clusters = detect_clusters(&pairs, 0.75);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].members, vec!["a.py".to_string(), "b.py".to_string()]);
    }

    #[test]
    fn cluster_average_counts_every_internal_pair_not_just_spanning_edges() {
        // a-b and b-c connect a 3-node component via a path; a-c is also
        // registered above threshold and must still count toward the average.
        let pairs = vec![
            pair("a.py", "b.py", 0.8),
            pair("b.py", "c.py", 0.8),
            pair("a.py", "c.py", 0.76),
        ];
        let clusters = detect_clusters(&pairs, 0.75);
        assert_eq!(clusters.len(), 1);
        let expected = (0.8 + 0.8 + 0.76) / 3.0;
        assert!((clusters[0].average_similarity - round4(expected)).abs() < 1e-9);
    }

    #[test]
    fn below_threshold_pairs_never_form_a_cluster() {
        let pairs = vec![pair("a.py", "b.py", 0.4)];
        assert!(detect_clusters(&pairs, 0.75).is_empty());
    }
}
