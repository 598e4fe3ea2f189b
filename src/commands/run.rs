//! `dafl run`: drives the scheduler against a pre-recorded trace of
//! candidate executions instead of forking and executing a target.
//!
//! Each trace line stands in for one round of mutate/execute: a label
//! (used as the candidate's input bytes), the raw DFG hit-count vector
//! the instrumentation would have produced, and whether the execution
//! opened a new edge in the (out-of-scope) global coverage bitmap.

use crate::config::Config;
use crate::engine::Scheduler;
use crate::engine::admission::AdmissionPolicy;
use crate::engine::clock::SystemClock;
use crate::engine::scheduler::SubmitOutcome;
use crate::seed_dir::{SeedFileName, write_seed};
use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to a JSONL trace file of `{label, dfg_hits, new_edges}` records.
    pub trace: PathBuf,

    /// Admission policy to apply to every record.
    #[arg(long, value_enum, default_value = "default")]
    pub policy: PolicyArg,

    /// Directory to write admitted seeds into, named per the scheduler's
    /// `id:...,src:...,op:...,pos:...` convention. If omitted, seeds are
    /// scored but not persisted to disk.
    #[arg(long)]
    pub seed_dir: Option<PathBuf>,

    /// RNG seed for mode/entry/seed selection, for reproducible replays.
    #[arg(long, default_value_t = 0)]
    pub rng_seed: u64,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum PolicyArg {
    Default,
    UniqueValue,
    UniqueValuePerPath,
    All,
    None,
    UniqueValuePerPathInVertical,
    UniqueValuePerPathInVerticalPlusDefault,
}

impl From<PolicyArg> for AdmissionPolicy {
    fn from(p: PolicyArg) -> Self {
        match p {
            PolicyArg::Default => AdmissionPolicy::Default,
            PolicyArg::UniqueValue => AdmissionPolicy::UniqueValue,
            PolicyArg::UniqueValuePerPath => AdmissionPolicy::UniqueValuePerPath,
            PolicyArg::All => AdmissionPolicy::All,
            PolicyArg::None => AdmissionPolicy::None,
            PolicyArg::UniqueValuePerPathInVertical => AdmissionPolicy::UniqueValuePerPathInVertical,
            PolicyArg::UniqueValuePerPathInVerticalPlusDefault => {
                AdmissionPolicy::UniqueValuePerPathInVerticalPlusDefault
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct TraceRecord {
    label: String,
    dfg_hits: Vec<u64>,
    #[serde(default)]
    new_edges: bool,
}

pub fn run(args: &RunArgs) -> Result<()> {
    let config = Config::from_env();
    let dfg_map = config
        .load_dfg_map()
        .with_context(|| "loading DFG map from DAFL_DFG_SCORE")?;

    let mut scheduler = Scheduler::new(dfg_map, args.policy.into(), Box::new(SystemClock::default()));
    let mut rng = StdRng::seed_from_u64(args.rng_seed);

    let text = fs::read_to_string(&args.trace).with_context(|| format!("reading trace file {:?}", args.trace))?;

    let mut admitted = 0u32;
    let mut rejected = 0u32;

    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record: TraceRecord =
            serde_json::from_str(line).with_context(|| format!("parsing trace line {}", lineno + 1))?;

        scheduler.select_mode();
        let _ = scheduler.pick_seed(&mut rng);

        let outcome = scheduler.submit(record.label.clone().into_bytes(), &record.dfg_hits, record.new_edges);
        match outcome {
            SubmitOutcome::Admitted(id) => {
                admitted += 1;
                log::info!("admitted seed {:?} from record {:?}", id, record.label);
                if let Some(dir) = &args.seed_dir {
                    fs::create_dir_all(dir).ok();
                    let name = SeedFileName {
                        id: id.0,
                        src: 0,
                        op: "replay",
                        pos: lineno as u32,
                    };
                    write_seed(dir, &name, record.label.as_bytes())
                        .with_context(|| format!("writing seed {:?} to {:?}", id, dir))?;
                }
            }
            SubmitOutcome::Rejected => {
                rejected += 1;
                log::debug!("rejected record {:?}", record.label);
            }
        }
    }

    log::info!("replay complete: {admitted} admitted, {rejected} rejected");
    println!("admitted={admitted} rejected={rejected}");
    Ok(())
}
