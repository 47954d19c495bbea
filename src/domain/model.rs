use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Current period plus the equally long period right before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportingWindow {
    pub current_start: NaiveDate,
    pub current_end: NaiveDate,
    pub previous_start: NaiveDate,
    pub previous_end: NaiveDate,
}

impl ReportingWindow {
    pub fn days(&self) -> i64 {
        (self.current_end - self.current_start).num_days() + 1
    }
}

/// Ranking bucket of a query. Boundaries are inclusive on the upper end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankBucket {
    Top3,
    FirstPage,
    SecondPage,
    Beyond,
}

impl RankBucket {
    pub const ALL: [RankBucket; 4] = [
        RankBucket::Top3,
        RankBucket::FirstPage,
        RankBucket::SecondPage,
        RankBucket::Beyond,
    ];

    /// Upper bound of the bucket, `None` for the open-ended last one.
    pub fn upper_bound(&self) -> Option<f64> {
        match self {
            RankBucket::Top3 => Some(3.0),
            RankBucket::FirstPage => Some(10.0),
            RankBucket::SecondPage => Some(20.0),
            RankBucket::Beyond => None,
        }
    }

    pub fn from_position(position: f64) -> Self {
        Self::ALL
            .into_iter()
            .find(|bucket| bucket.upper_bound().is_some_and(|upper| position <= upper))
            .unwrap_or(RankBucket::Beyond)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RankBucket::Top3 => "top3",
            RankBucket::FirstPage => "first_page",
            RankBucket::SecondPage => "second_page",
            RankBucket::Beyond => "beyond",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|bucket| bucket.as_str().eq_ignore_ascii_case(value.trim()))
    }

    pub fn label(&self) -> &'static str {
        match self {
            RankBucket::Top3 => "1-3",
            RankBucket::FirstPage => "4-10",
            RankBucket::SecondPage => "11-20",
            RankBucket::Beyond => "21+",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankBuckets {
    pub top3: u64,
    pub first_page: u64,
    pub second_page: u64,
    pub beyond: u64,
}

impl RankBuckets {
    pub fn add(&mut self, bucket: RankBucket, count: u64) {
        match bucket {
            RankBucket::Top3 => self.top3 += count,
            RankBucket::FirstPage => self.first_page += count,
            RankBucket::SecondPage => self.second_page += count,
            RankBucket::Beyond => self.beyond += count,
        }
    }

    pub fn get(&self, bucket: RankBucket) -> u64 {
        match bucket {
            RankBucket::Top3 => self.top3,
            RankBucket::FirstPage => self.first_page,
            RankBucket::SecondPage => self.second_page,
            RankBucket::Beyond => self.beyond,
        }
    }

    pub fn total(&self) -> u64 {
        self.top3 + self.first_page + self.second_page + self.beyond
    }
}

/// One page of the site-wide list, keyed on its best query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSummary {
    pub page: String,
    pub best_query: Option<String>,
    pub best_query_clicks: u64,
    pub best_query_impressions: u64,
    pub best_query_position: Option<f64>,
    pub prev_best_query_clicks: Option<u64>,
    pub prev_best_query_position: Option<f64>,
    pub total_clicks: u64,
    pub total_impressions: u64,
    pub prev_total_clicks: Option<u64>,
    pub prev_total_impressions: Option<u64>,
    pub keyword_count: u64,
    pub ranks: RankBuckets,
}

impl PageSummary {
    pub fn click_change(&self) -> Option<i64> {
        self.prev_total_clicks
            .map(|prev| self.total_clicks as i64 - prev as i64)
    }

    /// Positive means the best query moved up.
    pub fn best_position_change(&self) -> Option<f64> {
        match (self.prev_best_query_position, self.best_query_position) {
            (Some(prev), Some(current)) => Some(prev - current),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryMetric {
    pub query: String,
    #[serde(default)]
    pub clicks: u64,
    #[serde(default)]
    pub impressions: u64,
    pub position: Option<f64>,
    pub prev_clicks: Option<u64>,
    pub prev_position: Option<f64>,
    pub rank_bucket: Option<RankBucket>,
}

impl QueryMetric {
    pub fn ctr(&self) -> f64 {
        if self.impressions == 0 {
            0.0
        } else {
            self.clicks as f64 / self.impressions as f64
        }
    }

    pub fn position_change(&self) -> Option<f64> {
        match (self.prev_position, self.position) {
            (Some(prev), Some(current)) => Some(prev - current),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeywordSummary {
    pub keyword_count: u64,
    pub total_clicks: u64,
    pub total_impressions: u64,
    pub best_query: Option<String>,
    pub ranks: RankBuckets,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Strategy {
    Repost,
    NewPost,
    Unknown,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Repost => "REPOST",
            Strategy::NewPost => "NEW_POST",
            Strategy::Unknown => "UNKNOWN",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub title: Option<String>,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisData {
    pub strategy: Strategy,
    pub search_intent: Option<String>,
    pub priority_keywords: Vec<String>,
    pub action_items: Vec<String>,
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineSection {
    pub heading: String,
    pub subheadings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailDraft {
    pub subject: String,
    pub markdown: String,
    pub html: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsertPosition {
    Before,
    #[default]
    After,
    Replace,
}

/// A suggested insertion into an existing article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextVector {
    pub paragraph_index: Option<usize>,
    pub anchor: Option<String>,
    pub position: InsertPosition,
    pub content: String,
    pub target_keyword: Option<String>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub url: String,
    pub title: Option<String>,
    pub paragraphs: Vec<String>,
}

impl Article {
    pub fn text(&self) -> String {
        self.paragraphs.join("\n\n")
    }
}

/// One row of a batch run; from JSON or from the input CSV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchItem {
    pub page: String,
    #[serde(default)]
    pub site: Option<String>,
    #[serde(default)]
    pub best_query: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOutcome<T> {
    pub page: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> BatchOutcome<T> {
    pub fn ok(page: impl Into<String>, data: T) -> Self {
        Self {
            page: page.into(),
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failed(page: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            page: page.into(),
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub system: Option<String>,
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

impl GenerationRequest {
    pub fn new(system: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            system: Some(system.into()),
            prompt: prompt.into(),
            temperature: 0.4,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}
