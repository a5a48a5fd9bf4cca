//! The profiling pipeline.
//!
//! [`ClusterProfiler`] runs the batch transform end to end:
//! normalize -> plan -> reduce -> label -> assemble.

use crate::config::ProfilerConfig;
use crate::error::{Result, ResultExt};
use crate::label::LabelGenerator;
use crate::plan::AggregatePlan;
use crate::reducer::GroupedReducer;
use crate::schema::{NormalizedTable, SchemaNormalizer};
use crate::summary::{ClusterSummary, SummaryAssembler};
use polars::prelude::*;
use serde::Serialize;
use std::time::Instant;
use tracing::info;

/// Output of one profiling run.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileReport {
    /// One summary per cluster, ascending by cluster.
    pub summaries: Vec<ClusterSummary>,
    /// Number of input records.
    pub total_rows: usize,
    /// Bare channel names in channel set order.
    pub channels: Vec<String>,
    /// Columns that were synthesized during normalization.
    pub injected_columns: Vec<String>,
}

/// Computes labeled per-cluster summaries from a clustered dataset.
///
/// # Example
///
/// ```rust,ignore
/// use cluster_profiler::{ClusterProfiler, ProfilerConfig};
///
/// let df = cluster_profiler::io::read_csv("donor_vectors_clustered.csv")?;
/// let report = ClusterProfiler::builder()
///     .config(ProfilerConfig::default())
///     .build()?
///     .profile(&df)?;
///
/// for summary in &report.summaries {
///     println!("{}: {}", summary.cluster, summary.label);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ClusterProfiler {
    config: ProfilerConfig,
    normalizer: SchemaNormalizer,
    reducer: GroupedReducer,
    assembler: SummaryAssembler,
}

static_assertions::assert_impl_all!(ClusterProfiler: Send, Sync);

impl Default for ClusterProfiler {
    fn default() -> Self {
        Self::new(ProfilerConfig::default())
    }
}

impl ClusterProfiler {
    pub fn builder() -> ClusterProfilerBuilder {
        ClusterProfilerBuilder::default()
    }

    fn new(config: ProfilerConfig) -> Self {
        Self {
            normalizer: SchemaNormalizer::new(config.schema.clone()),
            reducer: GroupedReducer::new(config.schema.clone()),
            assembler: SummaryAssembler::new(LabelGenerator::new(config.label_rules)),
            config,
        }
    }

    pub fn config(&self) -> &ProfilerConfig {
        &self.config
    }

    /// Normalize the input and build its aggregation plan without reducing.
    pub fn prepare(&self, df: &DataFrame) -> Result<(NormalizedTable, AggregatePlan)> {
        let table = self.normalizer.normalize(df)?;
        let plan = AggregatePlan::for_table(&table, &self.config.schema);
        Ok((table, plan))
    }

    /// Run the full pipeline.
    ///
    /// # Errors
    ///
    /// Fails with a schema error before any aggregation if the cluster column
    /// is missing.
    pub fn profile(&self, df: &DataFrame) -> Result<ProfileReport> {
        let start = Instant::now();
        info!("Profiling {} records...", df.height());

        let (table, plan) = self.prepare(df)?;
        info!(
            "Aggregation plan: {} columns, {} statistics",
            plan.entries().len(),
            plan.output_columns().len()
        );

        let aggregates = self
            .reducer
            .reduce(&table, &plan)
            .context("Grouped reduction failed")?;
        let raw_sizes = self.reducer.cluster_sizes(&table)?;
        let summaries = self.assembler.assemble(&aggregates, &raw_sizes);

        info!(
            "Summarized {} clusters in {}ms",
            summaries.len(),
            start.elapsed().as_millis()
        );

        Ok(ProfileReport {
            summaries,
            total_rows: table.height(),
            channels: table.channels().names(),
            injected_columns: table.injected().to_vec(),
        })
    }
}

/// Builder for [`ClusterProfiler`].
#[derive(Debug, Default)]
pub struct ClusterProfilerBuilder {
    config: Option<ProfilerConfig>,
}

impl ClusterProfilerBuilder {
    pub fn config(mut self, config: ProfilerConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Build the profiler, validating the configuration.
    pub fn build(self) -> Result<ClusterProfiler> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        Ok(ClusterProfiler::new(config))
    }
}
