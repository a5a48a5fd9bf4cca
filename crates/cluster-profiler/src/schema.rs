//! Schema normalization.
//!
//! Guarantees the columns the rest of the pipeline depends on: the integer
//! cluster column (mandatory), the baseline channel columns, and the binary
//! conversion indicator. Everything else that is missing is defaulted to 0.

use crate::channel::{Channel, ChannelSet};
use crate::config::SchemaConfig;
use crate::error::{ProfilerError, Result, ResultExt};
use crate::utils::{column_names, is_numeric_dtype};
use polars::prelude::*;
use tracing::{debug, info};

/// A table that passed schema normalization.
#[derive(Debug, Clone)]
pub struct NormalizedTable {
    frame: DataFrame,
    channels: ChannelSet,
    injected: Vec<String>,
}

impl NormalizedTable {
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// Channels present after normalization, in source order followed by
    /// injected baseline channels.
    pub fn channels(&self) -> &ChannelSet {
        &self.channels
    }

    /// Columns that were absent from the input and had to be synthesized.
    pub fn injected(&self) -> &[String] {
        &self.injected
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.frame.column(name).is_ok()
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }
}

/// Applies the [`SchemaConfig`] defaulting rules to a raw table.
#[derive(Debug, Clone, Default)]
pub struct SchemaNormalizer {
    schema: SchemaConfig,
}

impl SchemaNormalizer {
    pub fn new(schema: SchemaConfig) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &SchemaConfig {
        &self.schema
    }

    /// Normalize a raw table. The input is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ProfilerError::MissingColumn`] if the cluster column is absent
    /// and [`ProfilerError::TypeConversionFailed`] if it cannot be read as
    /// integers.
    pub fn normalize(&self, df: &DataFrame) -> Result<NormalizedTable> {
        let schema = &self.schema;
        let columns = column_names(df);

        if !columns.contains(&schema.cluster_column) {
            return Err(ProfilerError::MissingColumn(schema.cluster_column.clone()));
        }

        let mut frame = df.clone();
        let mut injected = Vec::new();

        self.cast_cluster_column(&mut frame)?;
        self.fill_numeric_columns(&mut frame, &columns)
            .context("Failed to default missing values")?;

        // Baseline channels
        let mut channels = ChannelSet::new();
        for column in columns.iter().filter(|c| schema.is_channel_column(c)) {
            channels.insert(Channel::from_column(column.as_str(), schema));
        }

        let height = frame.height();
        for name in &schema.baseline_channels {
            let column = schema.channel_column(name);
            if channels.contains_column(&column) {
                continue;
            }
            info!("Injecting missing channel column: {}", column);
            frame
                .with_column(Series::new(column.as_str().into(), vec![0.0f64; height]))
                .context(format!("Failed to inject '{}'", column))?;
            channels.insert(Channel::from_column(column.as_str(), schema));
            injected.push(column);
        }

        // Conversion indicator, needed before the aggregation plan is built
        if !columns.contains(&schema.converted_column) {
            info!(
                "Injecting placeholder '{}' column based on {} > {}",
                schema.converted_column, schema.donation_count_column, schema.conversion_donation_threshold
            );
            let converted = self.synthesize_converted(&frame)?;
            frame
                .with_column(converted)
                .context(format!("Failed to inject '{}'", schema.converted_column))?;
            injected.push(schema.converted_column.clone());
        }

        debug!(
            "Normalized table: {} rows, {} columns, {} channels",
            frame.height(),
            frame.width(),
            channels.len()
        );

        Ok(NormalizedTable {
            frame,
            channels,
            injected,
        })
    }

    /// Cast the cluster column to Int64; null labels become 0.
    fn cast_cluster_column(&self, frame: &mut DataFrame) -> Result<()> {
        let name = self.schema.cluster_column.as_str();
        let series = frame.column(name)?.as_materialized_series();

        let cast = series
            .strict_cast(&DataType::Int64)
            .map_err(|e| ProfilerError::TypeConversionFailed {
                column: name.to_string(),
                target_type: "Int64".to_string(),
                reason: e.to_string(),
            })?
            .fill_null(FillNullStrategy::Zero)?;

        frame.replace(name, cast)?;
        Ok(())
    }

    /// Recognized columns are cast to Float64; every numeric column gets its
    /// nulls replaced with 0.
    fn fill_numeric_columns(&self, frame: &mut DataFrame, columns: &[String]) -> Result<()> {
        let schema = &self.schema;

        for name in columns {
            if name == &schema.cluster_column {
                continue;
            }

            let recognized = schema.is_channel_column(name)
                || name == &schema.converted_column
                || name == &schema.age_column
                || name == &schema.donation_count_column;

            let series = frame.column(name)?.as_materialized_series().clone();
            let series = if recognized {
                series.cast(&DataType::Float64)?
            } else if is_numeric_dtype(series.dtype()) {
                series
            } else {
                continue;
            };

            let null_count = series.null_count();
            if null_count > 0 {
                debug!("Defaulting {} missing values in '{}' to 0", null_count, name);
            }

            let filled = series.fill_null(FillNullStrategy::Zero)?;
            frame.replace(name, filled)?;
        }

        Ok(())
    }

    /// `converted` is 1 where the donation count exceeds the threshold, else 0.
    /// A missing donation count counts as 0.
    fn synthesize_converted(&self, frame: &DataFrame) -> Result<Series> {
        let schema = &self.schema;
        let name = schema.converted_column.as_str();
        let threshold = schema.conversion_donation_threshold;

        let values: Vec<i32> = match frame.column(&schema.donation_count_column) {
            Ok(column) => {
                let donations = column.as_materialized_series().cast(&DataType::Float64)?;
                donations
                    .f64()?
                    .into_iter()
                    .map(|v| i32::from(v.unwrap_or(0.0) > threshold))
                    .collect()
            }
            Err(_) => vec![i32::from(0.0 > threshold); frame.height()],
        };

        Ok(Series::new(name.into(), values))
    }
}
