//! Per-cluster output records.

use crate::error::Result;
use crate::label::LabelGenerator;
use crate::reducer::ClusterAggregate;
use crate::utils::round_to;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// Summary of one cluster, as written to the output artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSummary {
    pub cluster: i64,
    pub label: String,
    pub size: usize,
    /// Mean of the conversion indicator, 3 decimals.
    pub conversion_rate: f64,
    /// Bare channel name to mean engagement, 2 decimals, in channel set order.
    pub channel_preferences: IndexMap<String, f64>,
}

/// Combines cluster statistics and labels into [`ClusterSummary`] records.
#[derive(Debug, Clone, Default)]
pub struct SummaryAssembler {
    labeler: LabelGenerator,
}

impl SummaryAssembler {
    pub fn new(labeler: LabelGenerator) -> Self {
        Self { labeler }
    }

    /// One summary per aggregate, in aggregate order.
    ///
    /// `raw_sizes` holds the record count of each cluster and is used when an
    /// aggregate carries no conversion count.
    pub fn assemble(
        &self,
        aggregates: &[ClusterAggregate],
        raw_sizes: &BTreeMap<i64, usize>,
    ) -> Vec<ClusterSummary> {
        aggregates
            .iter()
            .map(|aggregate| self.summarize(aggregate, raw_sizes))
            .collect()
    }

    fn summarize(
        &self,
        aggregate: &ClusterAggregate,
        raw_sizes: &BTreeMap<i64, usize>,
    ) -> ClusterSummary {
        let size = aggregate.converted_count.unwrap_or_else(|| {
            warn!(
                "No conversion count for cluster {}, using raw record count",
                aggregate.cluster
            );
            raw_sizes.get(&aggregate.cluster).copied().unwrap_or(0)
        });

        let channel_preferences = aggregate
            .channel_means
            .iter()
            .filter_map(|entry| {
                entry
                    .mean
                    .map(|mean| (entry.channel.name.clone(), round_to(mean, 2)))
            })
            .collect();

        ClusterSummary {
            cluster: aggregate.cluster,
            label: self.labeler.generate(aggregate),
            size,
            conversion_rate: round_to(aggregate.converted_mean.unwrap_or(0.0), 3),
            channel_preferences,
        }
    }
}

/// Serialize summaries as pretty JSON (two-space indentation).
pub fn to_json(summaries: &[ClusterSummary]) -> Result<String> {
    Ok(serde_json::to_string_pretty(summaries)?)
}
