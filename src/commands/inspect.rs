//! `dafl inspect`: dumps interval-tree and vertical-manager statistics
//! as JSON, in the spirit of gffx's `.rix` offset-table dumps.

use crate::engine::interval_tree::INTERVAL_SIZE;
use crate::engine::vertical_manager::VerticalManager;
use anyhow::Result;
use clap::Args;
use serde::Serialize;

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Number of top buckets (by score) to include in the dump.
    #[arg(long, default_value_t = 10)]
    pub top: usize,
}

#[derive(Serialize)]
struct BucketStat {
    bucket: usize,
    ratio: f64,
}

#[derive(Serialize)]
struct InspectReport {
    total_observations: u64,
    total_score: u64,
    head_entries: usize,
    old_entries: usize,
    mode: &'static str,
    top_buckets: Vec<BucketStat>,
}

/// Builds the report from a live manager. Exposed separately from `run`
/// so the replay driver (or a future live driver) can call it without
/// re-parsing CLI args.
pub fn report(manager: &VerticalManager, top: usize) -> InspectReport {
    let tree = manager.tree();
    let mut buckets: Vec<BucketStat> = (0..INTERVAL_SIZE)
        .map(|b| BucketStat {
            bucket: b,
            ratio: tree.ratio_at(b),
        })
        .collect();
    buckets.sort_by(|a, b| b.ratio.partial_cmp(&a.ratio).unwrap_or(std::cmp::Ordering::Equal));
    buckets.truncate(top);

    InspectReport {
        total_observations: tree.total_observations(),
        total_score: tree.total_score(),
        head_entries: manager.head_len(),
        old_entries: manager.old_len(),
        mode: match manager.get_mode() {
            crate::engine::vertical_manager::Mode::Horizontal => "horizontal",
            crate::engine::vertical_manager::Mode::Vertical => "vertical",
            crate::engine::vertical_manager::Mode::Exploration => "exploration",
        },
        top_buckets: buckets,
    }
}

pub fn run(args: &InspectArgs) -> Result<()> {
    // A freshly constructed manager has nothing to report; `inspect` is
    // meant to be called against state reached by a prior `run` in a
    // persisted-state workflow. This standalone CLI path reports the
    // empty baseline so the JSON shape is documented even with no trace.
    let manager = VerticalManager::new();
    let report = report(&manager, args.top);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
