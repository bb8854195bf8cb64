use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum_macros::{EnumIter, EnumString, IntoStaticStr};
use uuid::Uuid;

/// All journal entries keyed by `YYYY-MM-DD`.
pub type EntriesMap = BTreeMap<String, EntryData>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: String,
    pub text: String,
}

impl LogEntry {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: new_log_id(),
            text: text.into(),
        }
    }
}

/// Ids only need to be unique within one data file.
pub fn new_log_id() -> String {
    Uuid::new_v4().simple().to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EntryData {
    #[serde(default)]
    pub logs: Vec<LogEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

impl EntryData {
    /// Color used for rendering; unknown or missing ids fall back to the default.
    pub fn resolved_color(&self) -> Color {
        Color::resolve(self.color.as_deref())
    }

    pub fn has_content(&self) -> bool {
        !self.logs.is_empty()
            || self.weight.as_deref().is_some_and(|w| !w.trim().is_empty())
            || !self.images.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, IntoStaticStr, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Color {
    #[default]
    White,
    Red,
    Orange,
    Yellow,
    Green,
    Blue,
    Purple,
    Pink,
}

impl Color {
    pub fn resolve(id: Option<&str>) -> Self {
        id.and_then(|id| id.parse().ok()).unwrap_or_default()
    }

    pub fn id(self) -> &'static str {
        self.into()
    }

    pub fn label(self) -> &'static str {
        match self {
            Color::White => "Default",
            Color::Red => "Red",
            Color::Orange => "Orange",
            Color::Yellow => "Yellow",
            Color::Green => "Green",
            Color::Blue => "Blue",
            Color::Purple => "Purple",
            Color::Pink => "Pink",
        }
    }

    /// Cell background used by the month page.
    pub fn swatch(self) -> &'static str {
        match self {
            Color::White => "#ffffff",
            Color::Red => "#fff1f2",
            Color::Orange => "#fff7ed",
            Color::Yellow => "#fffbeb",
            Color::Green => "#ecfdf5",
            Color::Blue => "#f0f9ff",
            Color::Purple => "#f5f3ff",
            Color::Pink => "#fdf2f8",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LogTextRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct ColorRequest {
    pub color: String,
}

#[derive(Debug, Deserialize)]
pub struct WeightRequest {
    #[serde(default)]
    pub weight: String,
}

#[derive(Debug, Deserialize)]
pub struct MonthQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct SummaryRequest {
    pub year: i32,
    pub month: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DayResponse {
    pub date: String,
    pub entry: EntryData,
    pub persisted: bool,
    pub uploading: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImageFailure {
    pub index: usize,
    pub name: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImagesResponse {
    pub day: DayResponse,
    pub failures: Vec<ImageFailure>,
}

#[derive(Debug, Serialize)]
pub struct CalendarDay {
    pub date: String,
    pub in_month: bool,
    pub is_today: bool,
}

#[derive(Debug, Serialize)]
pub struct CalendarResponse {
    pub year: i32,
    pub month: u32,
    pub month_name: &'static str,
    pub days: Vec<CalendarDay>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthSummary {
    pub summary: String,
    pub mood: String,
    pub tips: Vec<String>,
}
