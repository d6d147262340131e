use serde::{Deserialize, Serialize};

use crate::domain::Sentiment;

/// Longest text the gateway analyzes; anything beyond is truncated
/// server-side and reported via `text_truncated`.
pub const MAX_TEXT_CHARS: usize = 5000;

/// Largest batch the gateway accepts before rejecting with TOO_MANY_TEXTS.
pub const MAX_BATCH_TEXTS: usize = 50;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub text: String,
    pub preprocess: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeBatchRequest {
    pub texts: Vec<String>,
    pub preprocess: bool,
}

/// One classified text. `stars` and `sentiment` track the sign and
/// magnitude of `sentiment_score`; that consistency is a gateway contract,
/// not re-checked here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    pub sentiment: Sentiment,
    pub confidence: f64,
    pub stars: u8,
    pub emoji: String,
    pub sentiment_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_label: Option<String>,
    pub text_original: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_analyzed: Option<String>,
    #[serde(default)]
    pub text_truncated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_length: Option<usize>,
    pub processing_time: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<SentimentResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ResponseMetadata>,
}

/// Batch slots keep input order. A slot is either a full result or the
/// gateway's per-item failure record; which one is a gateway policy
/// decision passed through as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BatchEntry {
    Item(SentimentResult),
    Failed(BatchItemError),
}

impl BatchEntry {
    pub fn result(&self) -> Option<&SentimentResult> {
        match self {
            BatchEntry::Item(result) => Some(result),
            BatchEntry::Failed(_) => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, BatchEntry::Failed(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItemError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_original: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeBatchResponse {
    pub success: bool,
    #[serde(default)]
    pub results: Vec<BatchEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statistics: Option<BatchStatistics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ResponseMetadata>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preprocessed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_texts: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentTally {
    pub positive: u64,
    pub negative: u64,
    pub neutral: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentShares {
    pub positive: f64,
    pub negative: f64,
    pub neutral: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchStatistics {
    pub total: usize,
    pub valid: usize,
    pub errors: usize,
    #[serde(default)]
    pub sentiments: SentimentTally,
    #[serde(default)]
    pub average_confidence: f64,
    #[serde(default)]
    pub percentages: SentimentShares,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_loaded: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl HealthResponse {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub model_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
}

/// Aggregate from GET /api/stats. Everything defaults so the gateway's
/// nothing-analyzed-yet variant (counters plus a message) still decodes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceStats {
    #[serde(default)]
    pub total_analyzed: u64,
    #[serde(default)]
    pub valid_results: u64,
    #[serde(default)]
    pub errors: u64,
    #[serde(default)]
    pub sentiments: SentimentTally,
    #[serde(default)]
    pub percentages: SentimentShares,
    #[serde(default)]
    pub average_confidence: f64,
    #[serde(default)]
    pub average_stars: f64,
    #[serde(default)]
    pub average_processing_time: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_analysis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
