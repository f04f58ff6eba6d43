//! `structsim` — CLI front-end over the structural-similarity engine
//! (parser → normaliser → forge → oracle). Four subcommands: `analyze` runs
//! the full pipeline over a directory or file list, `compare` scores a
//! single pair with the per-layer breakdown, and `graph`/`matrix`/`clusters`
//! re-render one view of a past `analyze` run from its saved JSON.

use clap::{Parser, Subcommand};
use common::{CancellationToken, Config, FileFingerprint, Language};
use oracle::orchestrator::{AnalysisResponse, ComparisonScope};
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "structsim")]
#[command(about = "Structural-similarity plagiarism detection engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline over a directory of source files.
    Analyze {
        /// Directory to walk for `.py`/`.js`/`.jsx`/`.ts`/`.tsx` files.
        path: PathBuf,
        /// Print the full response as JSON instead of the summary table.
        #[arg(long)]
        json: bool,
        /// Skip persisting the response under `.structsim/` for later
        /// `graph`/`matrix`/`clusters` lookups.
        #[arg(long)]
        no_save: bool,
    },
    /// Score a single pair of files with the per-layer breakdown.
    Compare {
        file1: PathBuf,
        file2: PathBuf,
        /// Print the full breakdown (including matched regions) as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Re-render the similarity graph of a past `analyze` run.
    Graph {
        /// `analysis_id` printed by a prior `analyze` run.
        id: Uuid,
    },
    /// Re-render the similarity matrix of a past `analyze` run.
    Matrix {
        id: Uuid,
    },
    /// Re-render the connected-component clusters of a past `analyze` run.
    Clusters {
        id: Uuid,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .compact()
        .init();

    let config = Config::from_env();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Analyze {
            path,
            json,
            no_save,
        } => cmd_analyze(path, &config, *json, !*no_save).await?,
        Commands::Compare { file1, file2, json } => cmd_compare(file1, file2, &config, *json)?,
        Commands::Graph { id } => cmd_graph(*id)?,
        Commands::Matrix { id } => cmd_matrix(*id)?,
        Commands::Clusters { id } => cmd_clusters(*id)?,
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// analyze
// ---------------------------------------------------------------------------

async fn cmd_analyze(path: &Path, config: &Config, json: bool, save: bool) -> anyhow::Result<()> {
    let files = collect_source_files(path)?;
    if files.is_empty() {
        println!("No recognised source files found at: {}", path.display());
        return Ok(());
    }

    let (fingerprints, errors) = ingest(&files, config.treat_imports_as_structural);
    tracing::info!(
        total = files.len(),
        fingerprinted = fingerprints.len(),
        errors = errors.len(),
        "ingest complete"
    );

    let response = oracle::run_analysis(
        &fingerprints,
        errors,
        "directory",
        ComparisonScope::WithinSet,
        config,
        None,
        HashMap::new(),
        &CancellationToken::new(),
    )
    .await?;

    if save {
        if let Err(e) = save_analysis(&response) {
            tracing::warn!("could not persist analysis {}: {e}", response.analysis_id);
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print_summary(&response);
    }

    Ok(())
}

fn print_summary(response: &AnalysisResponse) {
    println!("+------------------------------------------+");
    println!("| STRUCTSIM ANALYSIS                        |");
    println!("+------------------------------------------+");
    println!("| analysis_id    : {:>22} |", response.analysis_id.to_string());
    println!("| Total files    : {:>22} |", response.summary.total_files);
    println!(
        "| Suspicious pairs: {:>21} |",
        response.summary.suspicious_pairs_count
    );
    println!(
        "| Highest score  : {:>22.4} |",
        response.summary.highest_similarity
    );
    println!("| Clusters       : {:>22} |", response.summary.cluster_count);
    println!("+------------------------------------------+");

    if !response.errors.is_empty() {
        println!("\nERRORS:");
        for e in &response.errors {
            println!("  {e}");
        }
    }

    if response.similarity.pairs.is_empty() {
        println!("\nNo pairs at or above the similarity threshold.");
    } else {
        println!("\nSUSPICIOUS PAIRS:");
        for pair in &response.similarity.pairs {
            println!(
                "  {} <-> {}  score={:.4}  (ast={:.2} cfg={:.2} dfg={:.2})  {:?}{}",
                pair.file1,
                pair.file2,
                pair.similarity_score,
                pair.ast_score,
                pair.cfg_score,
                pair.dfg_score,
                pair.confidence_level,
                if pair.plagiarism_flag { "  [FLAGGED]" } else { "" },
            );
        }
    }

    if !response.similarity.clusters.is_empty() {
        println!("\nCLUSTERS:");
        for cluster in &response.similarity.clusters {
            println!(
                "  {{{}}}  avg={:.4}",
                cluster.members.join(", "),
                cluster.average_similarity
            );
        }
    }

    println!(
        "\nFull response: structsim {} --json  (or re-render with `graph`/`matrix`/`clusters {}`)",
        "analyze <path>", response.analysis_id
    );
}

// ---------------------------------------------------------------------------
// compare
// ---------------------------------------------------------------------------

fn cmd_compare(file1: &Path, file2: &Path, config: &Config, json: bool) -> anyhow::Result<()> {
    let fp1 = ingest_one(file1, config.treat_imports_as_structural)?
        .ok_or_else(|| anyhow::anyhow!("{}: unsupported or undecodable file", file1.display()))?;
    let fp2 = ingest_one(file2, config.treat_imports_as_structural)?
        .ok_or_else(|| anyhow::anyhow!("{}: unsupported or undecodable file", file2.display()))?;

    let name1 = file1.to_string_lossy().to_string();
    let name2 = file2.to_string_lossy().to_string();
    let pair = oracle::compare_single(&name1, &fp1, &name2, &fp2, config, None);

    if json {
        println!("{}", serde_json::to_string_pretty(&pair)?);
        return Ok(());
    }

    println!("+------------------------------------------+");
    println!("| ADVANCED COMPARISON                       |");
    println!("+------------------------------------------+");
    println!("| {} <-> {}", pair.file1, pair.file2);
    println!("| AST score       : {:.4}", pair.ast_score);
    println!("| CFG score       : {:.4}", pair.cfg_score);
    println!("| DFG score       : {:.4}", pair.dfg_score);
    println!("| Final score     : {:.4}", pair.similarity_score);
    println!("| Confidence      : {:?}", pair.confidence_level);
    println!("| Plagiarism flag : {}", pair.plagiarism_flag);
    println!("| Matched regions : {}", pair.matching_regions.len());
    println!("+------------------------------------------+");

    Ok(())
}

// ---------------------------------------------------------------------------
// graph / matrix / clusters
// ---------------------------------------------------------------------------

fn cmd_graph(id: Uuid) -> anyhow::Result<()> {
    let response = load_analysis(id)?;
    println!("{}", serde_json::to_string_pretty(&response.similarity.graph)?);
    Ok(())
}

fn cmd_matrix(id: Uuid) -> anyhow::Result<()> {
    let response = load_analysis(id)?;
    println!("{}", serde_json::to_string_pretty(&response.similarity.matrix)?);
    Ok(())
}

fn cmd_clusters(id: Uuid) -> anyhow::Result<()> {
    let response = load_analysis(id)?;
    println!("{}", serde_json::to_string_pretty(&response.similarity.clusters)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Ingest: directory walk -> parse -> normalise -> fingerprint
// ---------------------------------------------------------------------------

/// Collects every file under `path` whose extension is recognised (§4.1). A
/// single file path is passed through unchanged.
fn collect_source_files(path: &Path) -> anyhow::Result<Vec<PathBuf>> {
    use walkdir::WalkDir;
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    let files = WalkDir::new(path)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.file_type().is_file()
                && Language::from_extension(&e.path().to_string_lossy()).is_some()
        })
        .map(|e| e.path().to_path_buf())
        .collect();
    Ok(files)
}

/// Parses, normalises, and fingerprints every file in parallel (§5, §10 —
/// `rayon` drives file-level fingerprinting). Per-file failures are recorded
/// as strings in the returned `errors` list and the file is dropped rather
/// than aborting the whole analysis (§7).
fn ingest(
    paths: &[PathBuf],
    treat_imports_as_structural: bool,
) -> (HashMap<String, FileFingerprint>, Vec<String>) {
    let results: Vec<Result<Option<(String, FileFingerprint)>, String>> = paths
        .par_iter()
        .map(|path| {
            let filename = path.to_string_lossy().to_string();
            match parser::parse_file(path) {
                Ok(None) => Err(format!("{filename}: unsupported file extension")),
                Ok(Some((tree, lines, language))) => {
                    let normalised =
                        normalizer::normalize_with_options(&tree, treat_imports_as_structural);
                    let fp = forge::fingerprint_file(filename.clone(), language, lines, normalised);
                    Ok(Some((filename, fp)))
                }
                Err(e) => Err(e.to_string()),
            }
        })
        .collect();

    let mut fingerprints = HashMap::new();
    let mut errors = Vec::new();
    for result in results {
        match result {
            Ok(Some((name, fp))) => {
                fingerprints.insert(name, fp);
            }
            Ok(None) => {}
            Err(e) => errors.push(e),
        }
    }
    (fingerprints, errors)
}

fn ingest_one(
    path: &Path,
    treat_imports_as_structural: bool,
) -> anyhow::Result<Option<FileFingerprint>> {
    match parser::parse_file(path) {
        Ok(None) => Ok(None),
        Ok(Some((tree, lines, language))) => {
            let normalised = normalizer::normalize_with_options(&tree, treat_imports_as_structural);
            let filename = path.to_string_lossy().to_string();
            Ok(Some(forge::fingerprint_file(filename, language, lines, normalised)))
        }
        Err(e) => Err(anyhow::anyhow!(e)),
    }
}

// ---------------------------------------------------------------------------
// Persistence for the re-render subcommands
// ---------------------------------------------------------------------------

fn store_dir() -> PathBuf {
    PathBuf::from(".structsim")
}

fn save_analysis(response: &AnalysisResponse) -> anyhow::Result<()> {
    let dir = store_dir();
    std::fs::create_dir_all(&dir)?;
    let path = dir.join(format!("{}.json", response.analysis_id));
    std::fs::write(path, serde_json::to_vec_pretty(response)?)?;
    Ok(())
}

fn load_analysis(id: Uuid) -> anyhow::Result<AnalysisResponse> {
    let path = store_dir().join(format!("{id}.json"));
    let bytes = std::fs::read(&path).map_err(|_| {
        anyhow::anyhow!(
            "no saved analysis for {id} at {} — run `structsim analyze` first",
            path.display()
        )
    })?;
    Ok(serde_json::from_slice(&bytes)?)
}
