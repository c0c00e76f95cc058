//! Aggregate view over a list of normalized entries.

use super::record::TrafficEntry;
use super::wire::RequestKind;
use crate::types::TokenUsage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-model totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelStats {
    pub requests: u64,
    pub errors: u64,
    pub usage: TokenUsage,
    /// Mean duration over entries that have a response.
    pub mean_duration_ms: Option<f64>,
    #[serde(skip)]
    timed: u64,
    #[serde(skip)]
    duration_sum: u64,
}

impl ModelStats {
    fn record(&mut self, entry: &TrafficEntry) {
        self.requests += 1;
        if entry.is_error() {
            self.errors += 1;
        }
        if let Some(usage) = &entry.usage {
            self.usage.add(usage);
        }
        // entries without a response carry no status and a zero duration
        if entry.status_code.is_some() || entry.duration_ms > 0 {
            self.timed = self.timed.saturating_add(1);
            self.duration_sum = self.duration_sum.saturating_add(entry.duration_ms);
            self.mean_duration_ms = Some(self.duration_sum as f64 / self.timed as f64);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrafficSummary {
    pub total: u64,
    pub errors: u64,
    pub by_kind: BTreeMap<RequestKind, u64>,
    pub by_model: BTreeMap<String, ModelStats>,
}

impl TrafficSummary {
    pub fn from_entries(entries: &[TrafficEntry]) -> Self {
        let mut summary = Self::default();
        for entry in entries {
            summary.total += 1;
            if entry.is_error() {
                summary.errors += 1;
            }
            *summary.by_kind.entry(entry.request_kind).or_default() += 1;
            summary
                .by_model
                .entry(entry.model.clone())
                .or_default()
                .record(entry);
        }
        summary
    }

    pub fn model(&self, name: &str) -> Option<&ModelStats> {
        self.by_model.get(name)
    }

    /// Token usage summed over every model.
    pub fn total_usage(&self) -> TokenUsage {
        let mut total = TokenUsage::default();
        for stats in self.by_model.values() {
            total.add(&stats.usage);
        }
        total
    }
}
