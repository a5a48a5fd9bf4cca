//! Rule-based cluster labels.
//!
//! A label is built from at most one phrase per category, in this order:
//! age, donation frequency, dominant channel. The joined phrase is
//! title-cased; a cluster that matches no rule is an "Unlabeled Segment".

use crate::channel::Channel;
use crate::config::LabelRules;
use crate::reducer::ClusterAggregate;
use crate::utils::title_case;

/// Label used when no rule matches.
pub const UNLABELED: &str = "Unlabeled Segment";

/// Maps cluster statistics to a short descriptive label.
#[derive(Debug, Clone, Copy, Default)]
pub struct LabelGenerator {
    rules: LabelRules,
}

impl LabelGenerator {
    pub fn new(rules: LabelRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &LabelRules {
        &self.rules
    }

    /// Build the label for one cluster. Never empty.
    pub fn generate(&self, aggregate: &ClusterAggregate) -> String {
        let phrases: Vec<&str> = [
            self.age_phrase(aggregate),
            self.frequency_phrase(aggregate),
            self.channel_phrase(aggregate),
        ]
        .into_iter()
        .flatten()
        .collect();

        let label = title_case(phrases.join(" ").trim());
        if label.is_empty() {
            UNLABELED.to_string()
        } else {
            label
        }
    }

    fn age_phrase(&self, aggregate: &ClusterAggregate) -> Option<&'static str> {
        let age = aggregate.age_median?;
        if age < self.rules.young_below {
            Some("Young")
        } else if age > self.rules.older_above {
            Some("Older")
        } else {
            None
        }
    }

    fn frequency_phrase(&self, aggregate: &ClusterAggregate) -> Option<&'static str> {
        let donations = aggregate.donation_count_mean?;
        if donations >= self.rules.frequent_at_least {
            Some("Frequent Donors")
        } else if donations <= self.rules.first_time_at_most {
            Some("First-Time Donors")
        } else {
            None
        }
    }

    fn channel_phrase(&self, aggregate: &ClusterAggregate) -> Option<&'static str> {
        self.dominant_channel(aggregate)?.kind.preference_phrase()
    }

    /// Channel with the highest defined mean. Ties go to the channel seen
    /// first; means at or below `min_channel_engagement` never dominate.
    ///
    /// With the default threshold of 0, negative means (e.g. standardized
    /// feature vectors) never dominate. Lower the threshold for such inputs.
    pub fn dominant_channel<'a>(&self, aggregate: &'a ClusterAggregate) -> Option<&'a Channel> {
        let mut dominant: Option<(&Channel, f64)> = None;

        for entry in &aggregate.channel_means {
            let Some(mean) = entry.mean else { continue };
            if mean <= self.rules.min_channel_engagement {
                continue;
            }
            match dominant {
                Some((_, best)) if mean <= best => {}
                _ => dominant = Some((&entry.channel, mean)),
            }
        }

        dominant.map(|(channel, _)| channel)
    }
}
