//! Telemetry counters kept by a renderer and emitted as one JSON line per commit.

use log::info;
use serde::Serialize;

/// What the most recent commit did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CommitSummary {
    pub placements: u64,
    pub updates: u64,
    pub deletions: u64,
    /// Adapter calls made (creates, prop updates, appends, removals).
    pub host_mutations: u64,
    pub effects_run: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RenderStats {
    pub passes_started: u64,
    pub passes_abandoned: u64,
    pub units_performed: u64,
    pub yields: u64,
    pub commits: u64,
    pub host_mutations_total: u64,
    pub effects_run_total: u64,
    pub last_commit: CommitSummary,
}

impl RenderStats {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| String::from("{}"))
    }

    /// Fold a finished commit into the totals.
    pub(crate) fn record_commit(&mut self, summary: CommitSummary) {
        self.commits = self.commits.saturating_add(1);
        self.host_mutations_total = self.host_mutations_total.saturating_add(summary.host_mutations);
        self.effects_run_total = self.effects_run_total.saturating_add(summary.effects_run);
        self.last_commit = summary;
    }
}

pub fn maybe_emit(enabled: bool, stats: &RenderStats) {
    if enabled {
        info!("{}", stats.to_json());
    }
}
