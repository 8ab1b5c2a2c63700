use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Fixed set of categories a news item can belong to.
/// Lowercase on the wire, capitalized for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Category {
    Business,
    Entertainment,
    Lifestyle,
    Travel,
    Sports,
    Tech,
    Opinions,
    Interviews,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Business,
        Category::Entertainment,
        Category::Lifestyle,
        Category::Travel,
        Category::Sports,
        Category::Tech,
        Category::Opinions,
        Category::Interviews,
    ];

    /// Path segment used by the backend
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Business => "business",
            Category::Entertainment => "entertainment",
            Category::Lifestyle => "lifestyle",
            Category::Travel => "travel",
            Category::Sports => "sports",
            Category::Tech => "tech",
            Category::Opinions => "opinions",
            Category::Interviews => "interviews",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Business => "Business",
            Category::Entertainment => "Entertainment",
            Category::Lifestyle => "Lifestyle",
            Category::Travel => "Travel",
            Category::Sports => "Sports",
            Category::Tech => "Tech",
            Category::Opinions => "Opinions",
            Category::Interviews => "Interviews",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

impl TryFrom<String> for Category {
    type Error = UnknownCategory;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.as_str().to_string()
    }
}

/// Record identifier as handed out by the backend: numeric or opaque text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NewsId {
    Number(i64),
    Text(String),
}

impl fmt::Display for NewsId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NewsId::Number(n) => write!(f, "{}", n),
            NewsId::Text(s) => f.write_str(s),
        }
    }
}

impl FromStr for NewsId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Ok(s.parse::<i64>()
            .map(NewsId::Number)
            .unwrap_or_else(|_| NewsId::Text(s.to_string())))
    }
}

impl From<i64> for NewsId {
    fn from(n: i64) -> Self {
        NewsId::Number(n)
    }
}

impl From<&str> for NewsId {
    fn from(s: &str) -> Self {
        NewsId::Text(s.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsRecord {
    pub id: NewsId,
    #[serde(default)]
    pub title_arabic: String,
    #[serde(default)]
    pub title_english: String,
    #[serde(default)]
    pub description_arabic: String,
    #[serde(default)]
    pub description_english: String,
    pub category: Category,
    #[serde(default, with = "flexible_date")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl NewsRecord {
    /// English title, falling back to Arabic, then a dash
    pub fn display_title(&self) -> &str {
        if !self.title_english.is_empty() {
            &self.title_english
        } else if !self.title_arabic.is_empty() {
            &self.title_arabic
        } else {
            "-"
        }
    }
}

/// Body sent on create and update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsPayload {
    pub title_arabic: String,
    pub title_english: String,
    pub description_arabic: String,
    pub description_english: String,
    pub category: Category,
    pub date: NaiveDate,
    pub image: String,
}

/// One page of the list endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse {
    #[serde(default)]
    pub content: Vec<NewsRecord>,
    #[serde(default)]
    pub total_elements: u64,
}

/// The upload endpoint answers either with a bare URL or with `{ "imageUrl": ... }`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ImageUploadResponse {
    Url(String),
    Object {
        #[serde(rename = "imageUrl")]
        image_url: String,
    },
}

impl ImageUploadResponse {
    pub fn into_url(self) -> String {
        match self {
            ImageUploadResponse::Url(url) => url,
            ImageUploadResponse::Object { image_url } => image_url,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self { message: message.into(), severity: Severity::Success }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { message: message.into(), severity: Severity::Error }
    }
}

/// Accepts `YYYY-MM-DD` as well as full timestamps, keeping only the calendar date.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|d| d.date_naive()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|d| d.date())
        })
}

mod flexible_date {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(d) => serializer.serialize_str(&d.format("%Y-%m-%d").to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(value) => super::parse_date(value)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("invalid date: {}", value))),
        }
    }
}
