//! End-to-end pipeline test: parse -> normalise -> fingerprint -> compare ->
//! aggregate, over small embedded Python/JavaScript fixtures. Exercises the
//! same path `structsim analyze` drives, without going through the CLI.

use common::{CancellationToken, Config, Language};
use oracle::orchestrator::ComparisonScope;
use std::collections::HashMap;

fn fingerprint(source: &str, filename: &str, language: Language) -> common::FileFingerprint {
    let tree = parser::parse_source(source, filename, language).unwrap();
    let normalised = normalizer::normalize(&tree);
    let lines = source.lines().map(|l| l.to_string()).collect();
    forge::fingerprint_file(filename.to_string(), language, lines, normalised)
}

#[tokio::test]
async fn renamed_python_functions_are_flagged_as_plagiarism() {
    let a = fingerprint(
        "def add(a, b):\n    total = a + b\n    return total\n",
        "alice/solution.py",
        Language::Python,
    );
    let b = fingerprint(
        "def sum_values(x, y):\n    result = x + y\n    return result\n",
        "bob/solution.py",
        Language::Python,
    );

    let mut files = HashMap::new();
    files.insert(a.filename.clone(), a);
    files.insert(b.filename.clone(), b);

    let config = Config::default();
    let response = oracle::run_analysis(
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

    assert_eq!(response.files.len(), 2);
    assert_eq!(response.similarity.pairs.len(), 1);
    let pair = &response.similarity.pairs[0];
    assert_eq!(pair.similarity_score, 1.0);
    assert!(pair.plagiarism_flag);
    assert!(!pair.matching_regions.is_empty());

    // Symmetric matrix, both diagonal entries 1.0.
    let m = &response.similarity.matrix;
    let i = m.files.iter().position(|f| f == &pair.file1).unwrap();
    let j = m.files.iter().position(|f| f == &pair.file2).unwrap();
    assert_eq!(m.values[i][i], 1.0);
    assert_eq!(m.values[i][j], m.values[j][i]);

    // One cluster of the two colluding files.
    assert_eq!(response.similarity.clusters.len(), 1);
    assert_eq!(response.similarity.clusters[0].members.len(), 2);
}

#[tokio::test]
async fn unrelated_files_produce_no_suspicious_pairs_but_all_nodes() {
    let a = fingerprint(
        "def add(a, b):\n    return a + b\n",
        "a.py",
        Language::Python,
    );
    let b = fingerprint(
        "class Widget:\n    def __init__(self, name):\n        self.name = name\n\n    def render(self):\n        for part in self.name:\n            print(part)\n",
        "b.py",
        Language::Python,
    );

    let mut files = HashMap::new();
    files.insert(a.filename.clone(), a);
    files.insert(b.filename.clone(), b);

    let config = Config::default();
    let response = oracle::run_analysis(
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

    assert_eq!(response.similarity.graph.nodes.len(), 2);
    assert!(response.similarity.clusters.is_empty());
}

#[tokio::test]
async fn javascript_and_jsx_fixtures_fingerprint_and_compare() {
    let a = fingerprint(
        "function Greeting(props) {\n  return <div className=\"a\" id=\"b\">{props.name}</div>;\n}",
        "a.jsx",
        Language::JavaScript,
    );
    let b = fingerprint(
        "function Hello(info) {\n  return <div id=\"b\" className=\"a\">{info.name}</div>;\n}",
        "b.jsx",
        Language::JavaScript,
    );

    let mut files = HashMap::new();
    files.insert(a.filename.clone(), a);
    files.insert(b.filename.clone(), b);

    let config = Config::default();
    let response = oracle::run_analysis(
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

    let pair = &response.similarity.pairs[0];
    // Attribute order differs on the wire but not after normalisation.
    assert_eq!(pair.ast_score, 1.0);
}

#[tokio::test]
async fn cross_group_comparison_excludes_same_group_pairs() {
    let a1 = fingerprint("def f(x):\n    return x\n", "groupA/a1.py", Language::Python);
    let a2 = fingerprint("def g(y):\n    return y\n", "groupA/a2.py", Language::Python);
    let b1 = fingerprint("def h(z):\n    return z\n", "groupB/b1.py", Language::Python);

    let mut files = HashMap::new();
    for fp in [a1, a2, b1] {
        files.insert(fp.filename.clone(), fp);
    }

    let config = Config::default();
    let response = oracle::run_analysis(
        &files,
        Vec::new(),
        "cross_group",
        ComparisonScope::CrossGroups {
            group_a: &["groupA/a1.py".to_string(), "groupA/a2.py".to_string()],
            group_b: &["groupB/b1.py".to_string()],
        },
        &config,
        None,
        HashMap::new(),
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    // groupA/a1 <-> groupA/a2 must never appear; only cross-group pairs do.
    for pair in &response.similarity.pairs {
        let same_group = pair.file1.starts_with("groupA") && pair.file2.starts_with("groupA");
        assert!(!same_group, "same-group pair leaked into cross comparison");
    }
}
