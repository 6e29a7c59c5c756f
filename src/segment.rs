//! Rule-based customer segmentation.
//!
//! A customer's (frequency, monetary) aggregate maps to one of three tiers
//! through strict threshold comparisons. The rule is a pure function of one
//! aggregate, so it can be applied to customers in any order or in parallel.

use crate::error::{InsightsError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Customer tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Segment {
    /// High-value repeat buyers.
    Gold,
    /// Moderate value regardless of frequency.
    Silver,
    /// Low value or insufficient history.
    Bronze,
}

impl Segment {
    /// All segments, highest tier first.
    pub const ALL: [Segment; 3] = [Segment::Gold, Segment::Silver, Segment::Bronze];

    /// Returns the segment label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gold => "Gold",
            Self::Silver => "Silver",
            Self::Bronze => "Bronze",
        }
    }
}

impl std::str::FromStr for Segment {
    type Err = String;

    /// Parses a segment label, ignoring case.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gold" => Ok(Self::Gold),
            "silver" => Ok(Self::Silver),
            "bronze" => Ok(Self::Bronze),
            _ => Err(format!("Invalid segment: {s}. Expected: gold, silver or bronze")),
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tunable thresholds for [`classify`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentThresholds {
    /// Gold requires monetary strictly above this.
    pub gold_monetary_min: f64,

    /// Gold also requires frequency strictly above this.
    pub gold_frequency_min: u64,

    /// Silver requires monetary strictly above this.
    pub silver_monetary_min: f64,
}

impl Default for SegmentThresholds {
    fn default() -> Self {
        Self {
            gold_monetary_min: 3000.0,
            gold_frequency_min: 10,
            silver_monetary_min: 1000.0,
        }
    }
}

impl SegmentThresholds {
    pub fn new(gold_monetary_min: f64, gold_frequency_min: u64, silver_monetary_min: f64) -> Self {
        Self {
            gold_monetary_min,
            gold_frequency_min,
            silver_monetary_min,
        }
    }

    /// Rejects non-finite monetary thresholds.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("gold_monetary_min", self.gold_monetary_min),
            ("silver_monetary_min", self.silver_monetary_min),
        ] {
            if !value.is_finite() {
                return Err(InsightsError::config(format!(
                    "{name} must be a finite number, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Classifies one customer aggregate.
    pub fn classify(&self, frequency: u64, monetary: f64) -> Segment {
        classify(self, frequency, monetary)
    }
}

/// Assigns a segment from a customer's order count and total sales.
///
/// Comparisons are strict: a customer exactly at a threshold falls to the
/// lower tier.
pub fn classify(thresholds: &SegmentThresholds, frequency: u64, monetary: f64) -> Segment {
    if monetary > thresholds.gold_monetary_min && frequency > thresholds.gold_frequency_min {
        Segment::Gold
    } else if monetary > thresholds.silver_monetary_min {
        Segment::Silver
    } else {
        Segment::Bronze
    }
}
