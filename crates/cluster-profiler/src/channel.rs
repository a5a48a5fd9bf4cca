//! Contact channels and the ordered channel set of a normalized table.

use crate::config::SchemaConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical identity of a contact channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelKind {
    Sms,
    Email,
    Phone,
    /// Any channel outside the three known ones.
    Custom,
}

impl ChannelKind {
    /// Classify a bare channel name. Names equal to or ending in `_sms`,
    /// `_email` or `_phone` map to the known kinds.
    pub fn from_name(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        let named = |suffix: &str| lower == suffix || lower.ends_with(&format!("_{}", suffix));

        if named("sms") {
            ChannelKind::Sms
        } else if named("email") {
            ChannelKind::Email
        } else if named("phone") {
            ChannelKind::Phone
        } else {
            ChannelKind::Custom
        }
    }

    /// Label phrase used when this channel dominates a cluster.
    ///
    /// Custom channels have no phrase.
    pub fn preference_phrase(&self) -> Option<&'static str> {
        match self {
            ChannelKind::Sms => Some("Prefer SMS"),
            ChannelKind::Email => Some("Prefer Email"),
            ChannelKind::Phone => Some("Prefer Phone"),
            ChannelKind::Custom => None,
        }
    }
}

/// A channel engagement column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Channel {
    /// Full column name, e.g. `channel_sms`.
    pub column: String,
    /// Column name with the channel prefix stripped, e.g. `sms`.
    pub name: String,
    pub kind: ChannelKind,
}

impl Channel {
    /// Build a channel from its column name.
    pub fn from_column(column: impl Into<String>, schema: &SchemaConfig) -> Self {
        let column = column.into();
        let name = column
            .strip_prefix(schema.channel_prefix.as_str())
            .unwrap_or(&column)
            .to_string();
        let kind = ChannelKind::from_name(&name);
        Self { column, name, kind }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Ordered, duplicate-free set of channels.
///
/// Iteration order is the order channels were inserted; the label heuristic
/// relies on it to break ties between equally engaged channels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSet {
    channels: Vec<Channel>,
}

impl ChannelSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a channel, ignoring it if its column is already present.
    /// Returns whether the channel was added.
    pub fn insert(&mut self, channel: Channel) -> bool {
        if self.contains_column(&channel.column) {
            return false;
        }
        self.channels.push(channel);
        true
    }

    pub fn contains_column(&self, column: &str) -> bool {
        self.channels.iter().any(|c| c.column == column)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Channel> {
        self.channels.iter()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Bare channel names in set order.
    pub fn names(&self) -> Vec<String> {
        self.channels.iter().map(|c| c.name.clone()).collect()
    }
}

impl<'a> IntoIterator for &'a ChannelSet {
    type Item = &'a Channel;
    type IntoIter = std::slice::Iter<'a, Channel>;

    fn into_iter(self) -> Self::IntoIter {
        self.channels.iter()
    }
}
