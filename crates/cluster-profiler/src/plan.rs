//! Aggregation planning.
//!
//! An [`AggregatePlan`] records which reductions to run for which column. It
//! is assembled once from a [`NormalizedTable`] and is immutable afterwards.

use crate::config::SchemaConfig;
use crate::schema::NormalizedTable;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-group reduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateOp {
    /// Arithmetic mean
    Mean,
    /// Number of records in the group
    Count,
    /// Statistical median
    Median,
}

impl AggregateOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateOp::Mean => "mean",
            AggregateOp::Count => "count",
            AggregateOp::Median => "median",
        }
    }

    /// Polars expression computing this reduction over `column`, as Float64.
    pub fn expr(&self, column: &str) -> Expr {
        let base = col(column);
        let reduced = match self {
            AggregateOp::Mean => base.mean(),
            AggregateOp::Count => base.count(),
            AggregateOp::Median => base.median(),
        };
        reduced.cast(DataType::Float64)
    }
}

impl fmt::Display for AggregateOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flattened name of a statistic, e.g. `age_median`.
pub fn stat_key(column: &str, op: AggregateOp) -> String {
    format!("{}_{}", column, op.as_str())
}

/// Reductions requested for a single column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanEntry {
    pub column: String,
    pub ops: Vec<AggregateOp>,
}

/// Immutable mapping of column to reductions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatePlan {
    entries: Vec<PlanEntry>,
}

impl AggregatePlan {
    pub fn builder() -> AggregatePlanBuilder {
        AggregatePlanBuilder::default()
    }

    /// Plan the reductions for a normalized table:
    ///
    /// - the conversion indicator gets `mean` and `count`
    /// - every channel gets `mean`
    /// - age and donation count get `mean` and `median` when present
    pub fn for_table(table: &NormalizedTable, schema: &SchemaConfig) -> Self {
        let mut builder = Self::builder().column(
            &schema.converted_column,
            [AggregateOp::Mean, AggregateOp::Count],
        );

        for channel in table.channels() {
            builder = builder.column(&channel.column, [AggregateOp::Mean]);
        }

        for optional in [&schema.age_column, &schema.donation_count_column] {
            if table.has_column(optional) {
                builder = builder.column(optional, [AggregateOp::Mean, AggregateOp::Median]);
            }
        }

        builder.build()
    }

    pub fn entries(&self) -> &[PlanEntry] {
        &self.entries
    }

    /// Reductions planned for a column, if any.
    pub fn ops_for(&self, column: &str) -> Option<&[AggregateOp]> {
        self.entries
            .iter()
            .find(|e| e.column == column)
            .map(|e| e.ops.as_slice())
    }

    pub fn contains(&self, column: &str, op: AggregateOp) -> bool {
        self.ops_for(column).is_some_and(|ops| ops.contains(&op))
    }

    /// Flattened statistic names in plan order.
    pub fn output_columns(&self) -> Vec<String> {
        self.entries
            .iter()
            .flat_map(|e| e.ops.iter().map(move |op| stat_key(&e.column, *op)))
            .collect()
    }

    /// Aggregation expressions, each aliased to its flattened name.
    pub fn exprs(&self) -> Vec<Expr> {
        self.entries
            .iter()
            .flat_map(|e| {
                e.ops
                    .iter()
                    .map(move |op| op.expr(&e.column).alias(stat_key(&e.column, *op)))
            })
            .collect()
    }
}

impl fmt::Display for AggregatePlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            let ops: Vec<&str> = entry.ops.iter().map(AggregateOp::as_str).collect();
            writeln!(f, "{}: {}", entry.column, ops.join(", "))?;
        }
        Ok(())
    }
}

/// Builder for [`AggregatePlan`]. Columns keep first-insertion order and
/// operators are deduplicated per column.
#[derive(Debug, Default)]
pub struct AggregatePlanBuilder {
    entries: Vec<PlanEntry>,
}

impl AggregatePlanBuilder {
    pub fn column<I>(mut self, column: &str, ops: I) -> Self
    where
        I: IntoIterator<Item = AggregateOp>,
    {
        let index = match self.entries.iter().position(|e| e.column == column) {
            Some(index) => index,
            None => {
                self.entries.push(PlanEntry {
                    column: column.to_string(),
                    ops: Vec::new(),
                });
                self.entries.len() - 1
            }
        };

        let entry = &mut self.entries[index];
        for op in ops {
            if !entry.ops.contains(&op) {
                entry.ops.push(op);
            }
        }
        self
    }

    pub fn build(self) -> AggregatePlan {
        AggregatePlan {
            entries: self.entries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaNormalizer;

    fn plan_for(df: &DataFrame) -> AggregatePlan {
        let schema = SchemaConfig::default();
        let table = SchemaNormalizer::new(schema.clone()).normalize(df).unwrap();
        AggregatePlan::for_table(&table, &schema)
    }

    #[test]
    fn test_minimal_plan() {
        let df = df!("cluster_label" => [0i64]).unwrap();
        let plan = plan_for(&df);

        assert_eq!(
            plan.ops_for("converted"),
            Some(&[AggregateOp::Mean, AggregateOp::Count][..])
        );
        for channel in ["channel_sms", "channel_email", "channel_phone"] {
            assert_eq!(plan.ops_for(channel), Some(&[AggregateOp::Mean][..]));
        }
        assert!(plan.ops_for("age").is_none());
        assert!(plan.ops_for("donation_count").is_none());
        assert!(plan.ops_for("cluster_label").is_none());
    }

    #[test]
    fn test_optional_columns_get_median() {
        let df = df!(
            "cluster_label" => [0i64],
            "age" => [35.0],
            "donation_count" => [4i64],
            "channel_push" => [0.2]
        )
        .unwrap();
        let plan = plan_for(&df);

        assert!(plan.contains("age", AggregateOp::Mean));
        assert!(plan.contains("age", AggregateOp::Median));
        assert!(plan.contains("donation_count", AggregateOp::Median));
        assert!(plan.contains("channel_push", AggregateOp::Mean));
        assert!(!plan.contains("channel_push", AggregateOp::Median));
    }

    #[test]
    fn test_output_columns_are_flattened() {
        let df = df!("cluster_label" => [0i64], "age" => [35.0]).unwrap();
        let plan = plan_for(&df);

        assert_eq!(
            plan.output_columns(),
            vec![
                "converted_mean",
                "converted_count",
                "channel_sms_mean",
                "channel_email_mean",
                "channel_phone_mean",
                "age_mean",
                "age_median",
            ]
        );
        assert_eq!(plan.exprs().len(), 7);
    }

    #[test]
    fn test_builder_merges_and_dedupes() {
        let plan = AggregatePlan::builder()
            .column("x", [AggregateOp::Mean])
            .column("y", [AggregateOp::Count])
            .column("x", [AggregateOp::Mean, AggregateOp::Median])
            .build();

        assert_eq!(plan.entries().len(), 2);
        assert_eq!(
            plan.ops_for("x"),
            Some(&[AggregateOp::Mean, AggregateOp::Median][..])
        );
        assert_eq!(plan.to_string(), "x: mean, median\ny: count\n");
    }
}
