//! Grouped reduction of a normalized table into per-cluster statistics.

use crate::channel::Channel;
use crate::config::SchemaConfig;
use crate::error::{Result, ResultExt};
use crate::plan::{AggregateOp, AggregatePlan, stat_key};
use crate::schema::NormalizedTable;
use crate::utils::defined;
use polars::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Mean engagement of one channel within a cluster.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelMean {
    pub channel: Channel,
    pub mean: Option<f64>,
}

/// Statistics of a single cluster.
///
/// A field is `None` when the statistic was not planned for the table (e.g.
/// the input had no age column) or could not be computed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterAggregate {
    pub cluster: i64,
    pub converted_mean: Option<f64>,
    pub converted_count: Option<usize>,
    pub age_mean: Option<f64>,
    pub age_median: Option<f64>,
    pub donation_count_mean: Option<f64>,
    pub donation_count_median: Option<f64>,
    /// One entry per channel, in channel set order.
    pub channel_means: Vec<ChannelMean>,
}

impl ClusterAggregate {
    /// An aggregate with no statistics.
    pub fn empty(cluster: i64) -> Self {
        Self {
            cluster,
            converted_mean: None,
            converted_count: None,
            age_mean: None,
            age_median: None,
            donation_count_mean: None,
            donation_count_median: None,
            channel_means: Vec::new(),
        }
    }
}

/// Groups records by cluster and applies an [`AggregatePlan`].
#[derive(Debug, Clone, Default)]
pub struct GroupedReducer {
    schema: SchemaConfig,
}

impl GroupedReducer {
    pub fn new(schema: SchemaConfig) -> Self {
        Self { schema }
    }

    /// One [`ClusterAggregate`] per distinct cluster, in ascending cluster order.
    pub fn reduce(
        &self,
        table: &NormalizedTable,
        plan: &AggregatePlan,
    ) -> Result<Vec<ClusterAggregate>> {
        let reduced = self.reduce_frame(table, plan)?;
        self.extract_aggregates(&reduced, table)
    }

    /// The reduced frame: the cluster column plus one `<column>_<op>` column
    /// per planned statistic, sorted by cluster.
    pub fn reduce_frame(&self, table: &NormalizedTable, plan: &AggregatePlan) -> Result<DataFrame> {
        let cluster = self.schema.cluster_column.as_str();

        let reduced = table
            .frame()
            .clone()
            .lazy()
            .group_by([col(cluster)])
            .agg(plan.exprs())
            .sort([cluster], SortMultipleOptions::default())
            .collect()
            .context("Failed to aggregate clusters")?;

        debug!(
            "Reduced {} rows into {} clusters ({} statistics)",
            table.height(),
            reduced.height(),
            plan.output_columns().len()
        );

        Ok(reduced)
    }

    /// Raw number of records per cluster.
    pub fn cluster_sizes(&self, table: &NormalizedTable) -> Result<BTreeMap<i64, usize>> {
        let clusters = table
            .frame()
            .column(&self.schema.cluster_column)?
            .as_materialized_series()
            .i64()?
            .clone();

        let mut sizes = BTreeMap::new();
        for cluster in clusters.into_iter().flatten() {
            *sizes.entry(cluster).or_insert(0) += 1;
        }
        Ok(sizes)
    }

    fn extract_aggregates(
        &self,
        reduced: &DataFrame,
        table: &NormalizedTable,
    ) -> Result<Vec<ClusterAggregate>> {
        let schema = &self.schema;
        let clusters = reduced
            .column(&schema.cluster_column)?
            .as_materialized_series()
            .i64()?
            .clone();

        let mut stats: HashMap<String, Vec<Option<f64>>> = HashMap::new();
        for column in reduced.get_columns() {
            if column.name().as_str() == schema.cluster_column {
                continue;
            }
            let values = column
                .as_materialized_series()
                .cast(&DataType::Float64)?
                .f64()?
                .into_iter()
                .collect();
            stats.insert(column.name().to_string(), values);
        }

        let lookup = |column: &str, op: AggregateOp, row: usize| {
            stats
                .get(&stat_key(column, op))
                .and_then(|values| defined(values.get(row).copied().flatten()))
        };

        let mut aggregates = Vec::with_capacity(reduced.height());
        for (row, cluster) in clusters.into_iter().enumerate() {
            let Some(cluster) = cluster else { continue };

            let channel_means = table
                .channels()
                .iter()
                .map(|channel| ChannelMean {
                    channel: channel.clone(),
                    mean: lookup(&channel.column, AggregateOp::Mean, row),
                })
                .collect();

            aggregates.push(ClusterAggregate {
                cluster,
                converted_mean: lookup(&schema.converted_column, AggregateOp::Mean, row),
                converted_count: lookup(&schema.converted_column, AggregateOp::Count, row)
                    .map(|count| count as usize),
                age_mean: lookup(&schema.age_column, AggregateOp::Mean, row),
                age_median: lookup(&schema.age_column, AggregateOp::Median, row),
                donation_count_mean: lookup(&schema.donation_count_column, AggregateOp::Mean, row),
                donation_count_median: lookup(
                    &schema.donation_count_column,
                    AggregateOp::Median,
                    row,
                ),
                channel_means,
            });
        }

        Ok(aggregates)
    }
}
