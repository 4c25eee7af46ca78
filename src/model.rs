//! Catalog data model shared by the client, session, views and server.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    #[serde(other)]
    Unknown,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
            Self::Unknown => "Unknown",
        }
    }

    /// Suffix used by badge and card classes (`badge-easy`, ...).
    pub fn css_class(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
            Self::Unknown => "unknown",
        }
    }

    pub(crate) fn rank(self) -> u8 {
        match self {
            Self::Easy => 0,
            Self::Medium => 1,
            Self::Hard => 2,
            Self::Unknown => 3,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseValueError {
    #[error("unsupported difficulty filter: {0}")]
    Difficulty(String),
    #[error("unsupported sort order: {0}")]
    SortOrder(String),
    #[error("unsupported theme: {0}")]
    Theme(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DifficultyFilter {
    #[default]
    All,
    Only(Difficulty),
}

impl DifficultyFilter {
    /// Value sent as the `difficulty` query parameter. `All` goes over the
    /// wire verbatim; the API decides what it means.
    pub fn as_query_value(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Only(difficulty) => difficulty.as_str(),
        }
    }

    pub fn matches(self, difficulty: Difficulty) -> bool {
        match self {
            Self::All => true,
            Self::Only(expected) => expected == difficulty,
        }
    }
}

impl FromStr for DifficultyFilter {
    type Err = ParseValueError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim() {
            "" | "All" => Ok(Self::All),
            "Easy" => Ok(Self::Only(Difficulty::Easy)),
            "Medium" => Ok(Self::Only(Difficulty::Medium)),
            "Hard" => Ok(Self::Only(Difficulty::Hard)),
            "Unknown" => Ok(Self::Only(Difficulty::Unknown)),
            other => Err(ParseValueError::Difficulty(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    NumberAsc,
    NumberDesc,
    DifficultyAsc,
    DifficultyDesc,
    DateDesc,
}

impl SortOrder {
    pub const ALL: [SortOrder; 5] = [
        SortOrder::NumberAsc,
        SortOrder::NumberDesc,
        SortOrder::DifficultyAsc,
        SortOrder::DifficultyDesc,
        SortOrder::DateDesc,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::NumberAsc => "number_asc",
            Self::NumberDesc => "number_desc",
            Self::DifficultyAsc => "difficulty_asc",
            Self::DifficultyDesc => "difficulty_desc",
            Self::DateDesc => "date_desc",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::NumberAsc => "Number ↑",
            Self::NumberDesc => "Number ↓",
            Self::DifficultyAsc => "Difficulty ↑",
            Self::DifficultyDesc => "Difficulty ↓",
            Self::DateDesc => "Date ↓",
        }
    }
}

impl FromStr for SortOrder {
    type Err = ParseValueError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|order| order.as_str() == raw.trim())
            .ok_or_else(|| ParseValueError::SortOrder(raw.to_string()))
    }
}

/// User-controlled list filters. `search` and `tag` are empty when unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub search: String,
    pub difficulty: DifficultyFilter,
    pub tag: String,
    pub sort: SortOrder,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    pub slug: String,
    #[serde(default)]
    pub number: Option<u32>,
    pub title: String,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub body: String,
}

impl Problem {
    /// Outbound link to the original problem, if one is set.
    pub fn source_url(&self) -> Option<&str> {
        self.url.as_deref().filter(|url| !url.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub total: u64,
    pub easy: u64,
    pub medium: u64,
    pub hard: u64,
    #[serde(default)]
    pub tags: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveRequest {
    pub markdown: String,
    pub filename: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveResponse {
    pub title: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub filename: String,
    pub contents: Vec<u8>,
}

impl UploadFile {
    pub fn new(filename: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            contents: contents.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedProblem {
    pub title: String,
    pub path: String,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReport {
    pub success: u64,
    #[serde(default)]
    pub uploaded: Vec<UploadedProblem>,
    #[serde(default)]
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

impl FromStr for Theme {
    type Err = ParseValueError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(ParseValueError::Theme(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn problem_json_from_api_ignores_extra_fields_and_unknown_difficulty() {
        let raw = r##"{
            "slug": "1-two-sum",
            "title": "Two Sum",
            "number": 1,
            "difficulty": "Unknown",
            "tags": ["Array", "Hash Table"],
            "date": null,
            "url": "",
            "body": "# Two Sum",
            "filename": "0001-two-sum.md"
        }"##;

        let problem: Problem = serde_json::from_str(raw).unwrap();
        assert_eq!(problem.number, Some(1));
        assert_eq!(problem.difficulty, Difficulty::Unknown);
        assert_eq!(problem.source_url(), None);
        assert_eq!(problem.tags.len(), 2);
    }

    #[test]
    fn difficulty_filter_parses_all_and_names() {
        assert_eq!("All".parse::<DifficultyFilter>(), Ok(DifficultyFilter::All));
        assert_eq!(
            "Hard".parse::<DifficultyFilter>(),
            Ok(DifficultyFilter::Only(Difficulty::Hard))
        );
        assert!("Insane".parse::<DifficultyFilter>().is_err());
        assert_eq!(DifficultyFilter::All.as_query_value(), "All");
    }

    #[test]
    fn sort_order_wire_names_round_trip_through_from_str() {
        for order in SortOrder::ALL {
            assert_eq!(order.as_str().parse::<SortOrder>(), Ok(order));
        }
        assert_eq!(
            "oldest".parse::<SortOrder>(),
            Err(ParseValueError::SortOrder("oldest".to_string()))
        );
    }

    #[test]
    fn stats_tags_map_is_optional() {
        let stats: Stats =
            serde_json::from_str(r#"{"total":3,"easy":1,"medium":1,"hard":1}"#).unwrap();
        assert_eq!(stats.total, 3);
        assert!(stats.tags.is_empty());
    }

    #[test]
    fn theme_toggles_between_light_and_dark() {
        assert_eq!(Theme::default(), Theme::Light);
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
        assert_eq!("dark".parse::<Theme>(), Ok(Theme::Dark));
    }
}
