//! Environment-driven configuration, mirroring the env vars the LLVM
//! pass (`afl-llvm-pass.so.cc`) reads at instrumentation time:
//! `DAFL_SELECTIVE_COV`, `DAFL_DFG_SCORE`, `DAFL_NO_FILENAME_MATCH`.
//! Here they configure the replay driver instead of a compiler pass.

use crate::engine::scorer::{DFG_MAP_SIZE, DfgMap};
use crate::error::SchedulerError;
use std::env;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Only score DFG nodes selected by the instrumentation pass, rather
    /// than every node (`DAFL_SELECTIVE_COV`).
    pub selective_cov: bool,
    /// Path to the `<score> <path_count> <file:line>` table
    /// (`DAFL_DFG_SCORE`).
    pub dfg_score_path: Option<String>,
    /// Disable filename matching when resolving DFG node provenance
    /// (`DAFL_NO_FILENAME_MATCH`).
    pub no_filename_match: bool,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            selective_cov: env_flag("DAFL_SELECTIVE_COV"),
            dfg_score_path: env::var("DAFL_DFG_SCORE").ok(),
            no_filename_match: env_flag("DAFL_NO_FILENAME_MATCH"),
        }
    }

    pub fn load_dfg_map(&self) -> Result<DfgMap, SchedulerError> {
        match &self.dfg_score_path {
            Some(path) => load_dfg_map(path),
            None => Err(SchedulerError::Configuration(
                "DAFL_DFG_SCORE is not set".to_string(),
            )),
        }
    }
}

fn env_flag(name: &str) -> bool {
    env::var(name).map(|v| v != "0" && !v.is_empty()).unwrap_or(false)
}

/// Parses a `DAFL_DFG_SCORE` file: one `<score> <path_count> <file:line>`
/// record per line, index implied by line order. `file:line` is kept
/// only for provenance and isn't part of the `DfgMap` itself.
fn load_dfg_map(path: impl AsRef<Path>) -> Result<DfgMap, SchedulerError> {
    let text = fs::read_to_string(path.as_ref()).map_err(|source| SchedulerError::Io { source, retries: 0 })?;

    let mut score = Vec::new();
    let mut count = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut parts = line.split_whitespace();
        let raw_score: u32 = parts
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| malformed(lineno, line))?;
        let raw_count: u64 = parts
            .next()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| malformed(lineno, line))?;
        if score.len() >= DFG_MAP_SIZE {
            return Err(SchedulerError::Configuration(format!(
                "DAFL_DFG_SCORE has at least {} DFG nodes, exceeding DFG_MAP_SIZE={DFG_MAP_SIZE}",
                score.len() + 1
            )));
        }
        score.push(raw_score);
        count.push(raw_count);
    }

    Ok(DfgMap { score, count })
}

fn malformed(lineno: usize, line: &str) -> SchedulerError {
    SchedulerError::Configuration(format!("malformed DAFL_DFG_SCORE line {}: {:?}", lineno + 1, line))
}
