//! Configuration types for the cluster profiling pipeline.
//!
//! This module provides configuration options using the builder pattern.
//! [`SchemaConfig`] enumerates the recognized input columns and their
//! default/synthesis rules; [`LabelRules`] carries the thresholds used by the
//! label heuristic.

use serde::{Deserialize, Serialize};

/// Recognized columns of the input table and how missing ones are filled in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// Mandatory integer grouping column. Its absence is fatal.
    /// Default: "cluster_label"
    pub cluster_column: String,

    /// Prefix that marks a column as a channel engagement score.
    /// Default: "channel_"
    pub channel_prefix: String,

    /// Channels that must always exist; missing ones are injected as all-zero.
    /// Default: ["sms", "email", "phone"]
    pub baseline_channels: Vec<String>,

    /// Binary conversion indicator. Synthesized from the donation count when absent.
    /// Default: "converted"
    pub converted_column: String,

    /// Donation count column (optional).
    /// Default: "donation_count"
    pub donation_count_column: String,

    /// Age column (optional).
    /// Default: "age"
    pub age_column: String,

    /// A synthesized `converted` is 1 where the donation count is strictly above this.
    /// Default: 2.0
    pub conversion_donation_threshold: f64,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            cluster_column: "cluster_label".to_string(),
            channel_prefix: "channel_".to_string(),
            baseline_channels: vec!["sms".to_string(), "email".to_string(), "phone".to_string()],
            converted_column: "converted".to_string(),
            donation_count_column: "donation_count".to_string(),
            age_column: "age".to_string(),
            conversion_donation_threshold: 2.0,
        }
    }
}

impl SchemaConfig {
    /// Full column name of a baseline channel (prefix + bare name).
    pub fn channel_column(&self, name: &str) -> String {
        format!("{}{}", self.channel_prefix, name)
    }

    /// Whether a column name denotes a channel engagement score.
    pub fn is_channel_column(&self, column: &str) -> bool {
        column.len() > self.channel_prefix.len() && column.starts_with(&self.channel_prefix)
    }
}

/// Thresholds for the rule-based cluster label.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelRules {
    /// Median age strictly below this yields "Young".
    pub young_below: f64,
    /// Median age strictly above this yields "Older".
    pub older_above: f64,
    /// Mean donation count at or above this yields "Frequent Donors".
    pub frequent_at_least: f64,
    /// Mean donation count at or below this yields "First-Time Donors".
    pub first_time_at_most: f64,
    /// A channel is only dominant when its mean is strictly above this.
    pub min_channel_engagement: f64,
}

impl Default for LabelRules {
    fn default() -> Self {
        Self {
            young_below: 30.0,
            older_above: 50.0,
            frequent_at_least: 10.0,
            first_time_at_most: 2.0,
            min_channel_engagement: 0.0,
        }
    }
}

/// Configuration for the profiling pipeline.
///
/// Use [`ProfilerConfig::builder()`] to create a validated configuration.
///
/// # Example
///
/// ```rust,ignore
/// use cluster_profiler::config::ProfilerConfig;
///
/// let config = ProfilerConfig::builder()
///     .cluster_column("segment")
///     .baseline_channels(["sms", "email"])
///     .build()?;
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfilerConfig {
    /// Recognized columns and defaulting rules.
    pub schema: SchemaConfig,

    /// Label heuristic thresholds.
    pub label_rules: LabelRules,
}

impl ProfilerConfig {
    /// Create a new configuration builder.
    pub fn builder() -> ProfilerConfigBuilder {
        ProfilerConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        let schema = &self.schema;
        for (field, value) in [
            ("cluster_column", &schema.cluster_column),
            ("channel_prefix", &schema.channel_prefix),
            ("converted_column", &schema.converted_column),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigValidationError::EmptyName(field.to_string()));
            }
        }

        if schema.baseline_channels.is_empty() {
            return Err(ConfigValidationError::NoBaselineChannels);
        }

        if let Some(name) = schema.baseline_channels.iter().find(|c| c.trim().is_empty()) {
            return Err(ConfigValidationError::InvalidChannel(name.clone()));
        }

        let rules = &self.label_rules;
        if rules.young_below > rules.older_above {
            return Err(ConfigValidationError::InvalidRange {
                lower: "young_below".to_string(),
                upper: "older_above".to_string(),
            });
        }

        if rules.first_time_at_most >= rules.frequent_at_least {
            return Err(ConfigValidationError::InvalidRange {
                lower: "first_time_at_most".to_string(),
                upper: "frequent_at_least".to_string(),
            });
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Column name for '{0}' must not be empty")]
    EmptyName(String),

    #[error("At least one baseline channel is required")]
    NoBaselineChannels,

    #[error("Invalid baseline channel name: '{0}'")]
    InvalidChannel(String),

    #[error("Invalid label thresholds: '{lower}' must be below '{upper}'")]
    InvalidRange { lower: String, upper: String },
}

/// Builder for [`ProfilerConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct ProfilerConfigBuilder {
    cluster_column: Option<String>,
    channel_prefix: Option<String>,
    baseline_channels: Option<Vec<String>>,
    converted_column: Option<String>,
    donation_count_column: Option<String>,
    age_column: Option<String>,
    conversion_donation_threshold: Option<f64>,
    label_rules: Option<LabelRules>,
}

impl ProfilerConfigBuilder {
    /// Set the mandatory grouping column.
    pub fn cluster_column(mut self, name: impl Into<String>) -> Self {
        self.cluster_column = Some(name.into());
        self
    }

    /// Set the prefix that identifies channel columns.
    pub fn channel_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.channel_prefix = Some(prefix.into());
        self
    }

    /// Set the baseline channels (bare names, without prefix).
    pub fn baseline_channels<I, S>(mut self, channels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.baseline_channels = Some(channels.into_iter().map(Into::into).collect());
        self
    }

    /// Set the conversion indicator column.
    pub fn converted_column(mut self, name: impl Into<String>) -> Self {
        self.converted_column = Some(name.into());
        self
    }

    /// Set the donation count column.
    pub fn donation_count_column(mut self, name: impl Into<String>) -> Self {
        self.donation_count_column = Some(name.into());
        self
    }

    /// Set the age column.
    pub fn age_column(mut self, name: impl Into<String>) -> Self {
        self.age_column = Some(name.into());
        self
    }

    /// Set the donation count above which a synthesized `converted` is 1.
    pub fn conversion_donation_threshold(mut self, threshold: f64) -> Self {
        self.conversion_donation_threshold = Some(threshold);
        self
    }

    /// Set the label heuristic thresholds.
    pub fn label_rules(mut self, rules: LabelRules) -> Self {
        self.label_rules = Some(rules);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `ProfilerConfig` or an error if validation fails.
    pub fn build(self) -> Result<ProfilerConfig, ConfigValidationError> {
        let defaults = SchemaConfig::default();
        let config = ProfilerConfig {
            schema: SchemaConfig {
                cluster_column: self.cluster_column.unwrap_or(defaults.cluster_column),
                channel_prefix: self.channel_prefix.unwrap_or(defaults.channel_prefix),
                baseline_channels: self.baseline_channels.unwrap_or(defaults.baseline_channels),
                converted_column: self.converted_column.unwrap_or(defaults.converted_column),
                donation_count_column: self
                    .donation_count_column
                    .unwrap_or(defaults.donation_count_column),
                age_column: self.age_column.unwrap_or(defaults.age_column),
                conversion_donation_threshold: self
                    .conversion_donation_threshold
                    .unwrap_or(defaults.conversion_donation_threshold),
            },
            label_rules: self.label_rules.unwrap_or_default(),
        };

        config.validate()?;
        Ok(config)
    }
}
