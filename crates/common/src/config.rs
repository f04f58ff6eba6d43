//! Process-boundary configuration (§6, §10). Loaded once by the CLI via
//! [`Config::from_env`]; library crates never read the environment directly.

use serde::{Deserialize, Serialize};
use std::env;

fn env_f64(key: &str, default: f64) -> f64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub ast_weight: f64,
    pub cfg_weight: f64,
    pub dfg_weight: f64,
    pub llm_threshold: f64,
    pub similarity_threshold: f64,
    pub cluster_threshold: f64,
    pub graph_threshold: f64,
    /// §9 open question: import/export specifiers are left unnormalised by
    /// the normaliser and so remain structural features. Defaults to `true`.
    pub treat_imports_as_structural: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ast_weight: 0.4,
            cfg_weight: 0.3,
            dfg_weight: 0.3,
            llm_threshold: 0.70,
            similarity_threshold: 0.5,
            cluster_threshold: 0.75,
            graph_threshold: 0.5,
            treat_imports_as_structural: true,
        }
    }
}

impl Config {
    /// Loads a `.env` file if present (a missing file is never an error),
    /// then reads the environment variables documented in §6, falling back
    /// to defaults on anything missing or unparsable.
    pub fn from_env() -> Self {
        if let Err(e) = dotenvy::dotenv() {
            tracing::debug!("no .env file loaded: {e}");
        }
        let defaults = Self::default();
        Self {
            ast_weight: env_f64("AST_WEIGHT", defaults.ast_weight),
            cfg_weight: env_f64("CFG_WEIGHT", defaults.cfg_weight),
            dfg_weight: env_f64("DATAFLOW_WEIGHT", defaults.dfg_weight),
            llm_threshold: env_f64("LLM_THRESHOLD", defaults.llm_threshold),
            similarity_threshold: env_f64("SIMILARITY_THRESHOLD", defaults.similarity_threshold),
            cluster_threshold: env_f64("CLUSTER_THRESHOLD", defaults.cluster_threshold),
            graph_threshold: env_f64("GRAPH_THRESHOLD", defaults.graph_threshold),
            treat_imports_as_structural: defaults.treat_imports_as_structural,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_sum_to_one() {
        let cfg = Config::default();
        assert!((cfg.ast_weight + cfg.cfg_weight + cfg.dfg_weight - 1.0).abs() < 1e-9);
    }
}
