//! Version numbering engine.
//!
//! Every topic a user writes about owns one major number. The first version
//! of a new topic opens the next unused major at minor 0 (`3.0`); every later
//! version of the same topic bumps the minor (`3.1`, `3.2`, ...).

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::SubsecRound;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreError;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// VersionNumber
// ---------------------------------------------------------------------------

/// A `major.minor` version number. Serialized as the string `"major.minor"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VersionNumber {
    pub major: u32,
    pub minor: u32,
}

impl VersionNumber {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// The next version inside the same topic group.
    pub const fn next_minor(self) -> Self {
        Self::new(self.major, self.minor + 1)
    }
}

impl fmt::Display for VersionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for VersionNumber {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::Validation(format!("Invalid version number '{s}'"));
        let (major, minor) = s.split_once('.').ok_or_else(invalid)?;
        Ok(Self::new(
            major.parse().map_err(|_| invalid())?,
            minor.parse().map_err(|_| invalid())?,
        ))
    }
}

impl Serialize for VersionNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for VersionNumber {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Topic groups
// ---------------------------------------------------------------------------

/// Running counters for one user's topic groups: topic -> latest number,
/// plus the highest major handed out so far.
///
/// Maintained incrementally on every append; [`TopicGroups::from_history`]
/// rebuilds it from stored records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicGroups {
    latest: HashMap<String, VersionNumber>,
    max_major: u32,
}

impl TopicGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the counters from `(topic, number)` pairs in any order.
    pub fn from_history<'a, I>(history: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, VersionNumber)>,
    {
        let mut groups = Self::new();
        for (topic, number) in history {
            groups.record(topic, number);
        }
        groups
    }

    /// The number the next version of `topic` would receive.
    pub fn next_number(&self, topic: &str) -> VersionNumber {
        match self.latest.get(topic) {
            Some(last) => last.next_minor(),
            None => VersionNumber::new(self.max_major + 1, 0),
        }
    }

    /// Register an existing or newly assigned number.
    pub fn record(&mut self, topic: &str, number: VersionNumber) {
        self.max_major = self.max_major.max(number.major);
        self.latest
            .entry(topic.to_string())
            .and_modify(|last| *last = (*last).max(number))
            .or_insert(number);
    }

    /// Compute and register the next number for `topic`.
    pub fn assign(&mut self, topic: &str) -> VersionNumber {
        let number = self.next_number(topic);
        self.record(topic, number);
        number
    }

    /// Latest number used in `topic`'s group, if the group exists.
    pub fn latest(&self, topic: &str) -> Option<VersionNumber> {
        self.latest.get(topic).copied()
    }

    /// Number of distinct topic groups.
    pub fn group_count(&self) -> usize {
        self.latest.len()
    }
}

// ---------------------------------------------------------------------------
// Timestamps
// ---------------------------------------------------------------------------

/// Creation timestamp for a new version: `now` at microsecond precision,
/// bumped one microsecond past `previous` when the clock has not advanced.
pub fn next_created_at(previous: Option<Timestamp>, now: Timestamp) -> Timestamp {
    let now = now.trunc_subsecs(6);
    match previous {
        Some(prev) if prev >= now => prev + chrono::Duration::microseconds(1),
        _ => now,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::{TimeZone, Utc};

    #[test]
    fn first_topic_opens_major_one() {
        let mut groups = TopicGroups::new();
        assert_eq!(groups.assign("marketing"), VersionNumber::new(1, 0));
    }

    #[test]
    fn same_topic_bumps_minor() {
        let mut groups = TopicGroups::new();
        groups.assign("marketing");
        groups.assign("travel");
        assert_eq!(groups.assign("marketing"), VersionNumber::new(1, 1));
        assert_eq!(groups.assign("marketing"), VersionNumber::new(1, 2));
        assert_eq!(groups.assign("travel"), VersionNumber::new(2, 1));
    }

    #[test]
    fn new_topic_takes_next_unused_major() {
        let mut groups = TopicGroups::new();
        groups.assign("a");
        groups.assign("b");
        groups.assign("a");
        assert_eq!(groups.assign("c"), VersionNumber::new(3, 0));
        assert_eq!(groups.group_count(), 3);
    }

    #[test]
    fn rebuild_from_history_matches_incremental() {
        let mut incremental = TopicGroups::new();
        let history: Vec<(String, VersionNumber)> = ["x", "y", "x", "z", "y"]
            .into_iter()
            .map(|t| (t.to_string(), incremental.assign(t)))
            .collect();

        // Order of replay does not matter.
        let rebuilt =
            TopicGroups::from_history(history.iter().rev().map(|(t, n)| (t.as_str(), *n)));
        assert_eq!(rebuilt, incremental);
        assert_eq!(rebuilt.next_number("y"), VersionNumber::new(2, 2));
        assert_eq!(rebuilt.next_number("new"), VersionNumber::new(4, 0));
    }

    #[test]
    fn latest_reports_group_head() {
        let mut groups = TopicGroups::new();
        assert_eq!(groups.latest("a"), None);
        groups.assign("a");
        groups.assign("a");
        assert_eq!(groups.latest("a"), Some(VersionNumber::new(1, 1)));
    }

    #[test]
    fn version_number_display_and_parse() {
        let number = VersionNumber::new(12, 3);
        assert_eq!(number.to_string(), "12.3");
        assert_eq!("12.3".parse::<VersionNumber>().unwrap(), number);
    }

    #[test]
    fn version_number_rejects_malformed_input() {
        assert_matches!("1".parse::<VersionNumber>(), Err(CoreError::Validation(_)));
        assert_matches!("1.x".parse::<VersionNumber>(), Err(CoreError::Validation(_)));
        assert_matches!("-1.0".parse::<VersionNumber>(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn version_number_serializes_as_string() {
        let json = serde_json::to_value(VersionNumber::new(2, 0)).unwrap();
        assert_eq!(json, serde_json::json!("2.0"));
        let back: VersionNumber = serde_json::from_value(json).unwrap();
        assert_eq!(back, VersionNumber::new(2, 0));
    }

    #[test]
    fn version_numbers_order_by_major_then_minor() {
        assert!(VersionNumber::new(1, 9) < VersionNumber::new(2, 0));
        assert!(VersionNumber::new(1, 2) < VersionNumber::new(1, 10));
    }

    #[test]
    fn created_at_uses_clock_when_it_advanced() {
        let prev = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 1).unwrap();
        assert_eq!(next_created_at(Some(prev), now), now);
        assert_eq!(next_created_at(None, now), now);
    }

    #[test]
    fn created_at_is_bumped_on_clock_tie_or_skew() {
        let prev = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 5).unwrap();
        let earlier = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 1).unwrap();
        let expected = prev + chrono::Duration::microseconds(1);
        assert_eq!(next_created_at(Some(prev), prev), expected);
        assert_eq!(next_created_at(Some(prev), earlier), expected);
    }

    #[test]
    fn created_at_is_truncated_to_microseconds() {
        let now = Utc.timestamp_nanos(1_700_000_000_123_456_789);
        let stamped = next_created_at(None, now);
        assert_eq!(stamped.timestamp_subsec_nanos(), 123_456_000);
    }
}
