//! Risk classification
//!
//! Pure functions mapping scores and risk-level labels to a priority tier and a
//! display color. They run on every projection of the dashboard and must stay
//! side-effect free.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Score at or above which a record is high priority
pub const HIGH_TIER_THRESHOLD: f64 = 70.0;
/// Score at or above which a record is medium priority
pub const MEDIUM_TIER_THRESHOLD: f64 = 40.0;

/// Three-tier priority of a combined score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    High,
    Medium,
    Low,
}

impl RiskTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::High => "high",
            RiskTier::Medium => "medium",
            RiskTier::Low => "low",
        }
    }
}

/// Classifies a combined score (percent) into a tier
///
/// High when `score >= 70`, medium when `40 <= score < 70`, low otherwise
/// (including NaN).
pub fn classify(score: f64) -> RiskTier {
    if score >= HIGH_TIER_THRESHOLD {
        RiskTier::High
    } else if score >= MEDIUM_TIER_THRESHOLD {
        RiskTier::Medium
    } else {
        RiskTier::Low
    }
}

/// Risk-level label attached to an analysis by the scoring pipeline
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RiskLevel {
    Minimal,
    Low,
    Medium,
    High,
    VeryHigh,
    /// Placeholder while scoring failed or is outstanding
    #[default]
    Pending,
    /// Any other label, kept verbatim
    Unrecognized(String),
}

impl RiskLevel {
    /// Parses a label case-insensitively; spaces and hyphens count as underscores
    pub fn parse(label: &str) -> Self {
        let key: String = label
            .trim()
            .chars()
            .map(|c| if c == ' ' || c == '-' { '_' } else { c.to_ascii_lowercase() })
            .collect();
        match key.as_str() {
            "minimal" => RiskLevel::Minimal,
            "low" => RiskLevel::Low,
            "medium" => RiskLevel::Medium,
            "high" => RiskLevel::High,
            "very_high" | "veryhigh" => RiskLevel::VeryHigh,
            "pending" => RiskLevel::Pending,
            _ => RiskLevel::Unrecognized(label.to_string()),
        }
    }

    /// Level derived from a rule-engine score
    pub fn from_rule_score(score: f64) -> Self {
        if score >= 70.0 {
            RiskLevel::High
        } else if score >= 40.0 {
            RiskLevel::Medium
        } else if score >= 20.0 {
            RiskLevel::Low
        } else {
            RiskLevel::Minimal
        }
    }

    pub fn label(&self) -> &str {
        match self {
            RiskLevel::Minimal => "MINIMAL",
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
            RiskLevel::VeryHigh => "VERY_HIGH",
            RiskLevel::Pending => "PENDING",
            RiskLevel::Unrecognized(raw) => raw,
        }
    }

    pub fn color(&self) -> ColorToken {
        match self {
            RiskLevel::Minimal => ColorToken::Green,
            RiskLevel::Low => ColorToken::Lime,
            RiskLevel::Medium => ColorToken::Amber,
            RiskLevel::High => ColorToken::Red,
            RiskLevel::VeryHigh => ColorToken::Crimson,
            RiskLevel::Pending | RiskLevel::Unrecognized(_) => ColorToken::Gray,
        }
    }
}

impl From<String> for RiskLevel {
    fn from(label: String) -> Self {
        RiskLevel::parse(&label)
    }
}

impl From<RiskLevel> for String {
    fn from(level: RiskLevel) -> Self {
        level.label().to_string()
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Display color token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorToken {
    Green,
    Lime,
    Amber,
    Red,
    Crimson,
    /// Fallback for anything unrecognized
    Gray,
}

impl ColorToken {
    pub fn hex(&self) -> &'static str {
        match self {
            ColorToken::Green => "#22c55e",
            ColorToken::Lime => "#84cc16",
            ColorToken::Amber => "#f59e0b",
            ColorToken::Red => "#ef4444",
            ColorToken::Crimson => "#b91c1c",
            ColorToken::Gray => "#6b7280",
        }
    }
}

/// Color for a risk-level label; total, never fails
pub fn color_for(risk_level: &str) -> ColorToken {
    RiskLevel::parse(risk_level).color()
}

/// Color for a raw fraud score shown next to a submission result
pub fn score_color(score: f64) -> ColorToken {
    if score < 30.0 {
        ColorToken::Green
    } else if score < 60.0 {
        ColorToken::Amber
    } else {
        ColorToken::Red
    }
}
