//! Cluster Profiling Library
//!
//! Summarizes records that already carry a cluster assignment and gives every
//! cluster a short, deterministic, human-readable label.
//!
//! # Overview
//!
//! The pipeline is a single-pass batch transform over a Polars `DataFrame`:
//!
//! - **Schema Normalization**: the cluster column is mandatory; baseline channel
//!   columns and the conversion indicator are injected when absent
//! - **Aggregation Planning**: an immutable plan of reductions per column
//! - **Grouped Reduction**: mean / count / median per cluster
//! - **Labeling**: rule-based age, donation frequency and channel phrases
//! - **Summary Assembly**: one [`ClusterSummary`] per cluster, serialized as JSON
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use cluster_profiler::{ClusterProfiler, io};
//!
//! let df = io::read_csv("donor_vectors_clustered.csv")?;
//! let report = ClusterProfiler::builder().build()?.profile(&df)?;
//!
//! io::write_summaries("donor_clusters_labeled.json", &report.summaries)?;
//! println!("Clusters summarized: {}", report.summaries.len());
//! ```
//!
//! # Configuration
//!
//! Use [`ProfilerConfig`] to rename recognized columns or tune the label
//! thresholds:
//!
//! ```rust,ignore
//! use cluster_profiler::config::{LabelRules, ProfilerConfig};
//!
//! let config = ProfilerConfig::builder()
//!     .cluster_column("segment")
//!     .baseline_channels(["sms", "email", "phone"])
//!     .label_rules(LabelRules { young_below: 25.0, ..LabelRules::default() })
//!     .build()?;
//! ```

pub mod channel;
pub mod config;
pub mod error;
pub mod io;
pub mod label;
pub mod plan;
pub mod profiler;
pub mod reducer;
pub mod schema;
pub mod summary;
pub mod utils;

// Re-exports for convenient access
pub use channel::{Channel, ChannelKind, ChannelSet};
pub use config::{
    ConfigValidationError, LabelRules, ProfilerConfig, ProfilerConfigBuilder, SchemaConfig,
};
pub use error::{ProfilerError, Result as ProfilerResult, ResultExt};
pub use label::{LabelGenerator, UNLABELED};
pub use plan::{AggregateOp, AggregatePlan, AggregatePlanBuilder, PlanEntry};
pub use profiler::{ClusterProfiler, ClusterProfilerBuilder, ProfileReport};
pub use reducer::{ChannelMean, ClusterAggregate, GroupedReducer};
pub use schema::{NormalizedTable, SchemaNormalizer};
pub use summary::{ClusterSummary, SummaryAssembler};
