//! Month summaries from the Gemini `generateContent` REST endpoint.

use crate::config::GeminiConfig;
use crate::images::split_data_uri;
use crate::models::{EntriesMap, EntryData, MonthSummary};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("No entries found for this month to analyze.")]
    NoEntries,
    #[error("summaries are not configured; set GEMINI_API_KEY")]
    NotConfigured,
    #[error("summary request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("summary service returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("summary service returned no text")]
    EmptyResponse,
    #[error("could not parse summary: {0}")]
    Parse(#[from] serde_json::Error),
}

const INSTRUCTIONS: &str = "You are a helpful personal productivity and wellness assistant.
I will provide you with my calendar journal entries for {MONTH} {YEAR}.
Some entries have multiple text logs, some have weight logs, and some have attached images.

Please analyze them and provide:
1. A brief summary of my month (3-4 sentences).
2. An assessment of my general mood, focus, and physical trends (if weight or visual body checks are present).
3. Three actionable tips for next month based on what I tracked.

Here are the entries:";

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum Part {
    Text(String),
    InlineData {
        #[serde(rename = "mimeType")]
        mime_type: String,
        data: String,
    },
}

/// Entries of one month that have anything worth summarizing, in date order.
pub fn month_entries(entries: &EntriesMap, year: i32, month: u32) -> Vec<(String, EntryData)> {
    let prefix = format!("{year:04}-{:02}-", month + 1);
    entries
        .range(prefix.clone()..)
        .take_while(|(key, _)| key.starts_with(&prefix))
        .filter(|(_, entry)| entry.has_content())
        .map(|(key, entry)| (key.clone(), entry.clone()))
        .collect()
}

pub fn build_parts(month_name: &str, year: i32, entries: &[(String, EntryData)]) -> Vec<Part> {
    let mut parts = vec![Part::Text(
        INSTRUCTIONS
            .replace("{MONTH}", month_name)
            .replace("{YEAR}", &year.to_string()),
    )];

    for (date, entry) in entries {
        let mut text = format!("\nDate: {date}\n");
        if !entry.logs.is_empty() {
            text.push_str("Journal Entries:\n");
            for log in &entry.logs {
                text.push_str(&format!("- {}\n", log.text));
            }
        }
        if let Some(weight) = entry.weight.as_deref().filter(|w| !w.trim().is_empty()) {
            text.push_str(&format!("Weight: {weight}\n"));
        }
        parts.push(Part::Text(text));

        for image in &entry.images {
            match split_data_uri(image) {
                Some((mime, data)) => parts.push(Part::InlineData {
                    mime_type: mime.to_string(),
                    data: data.to_string(),
                }),
                None => warn!(%date, "skipping image that is not a data URI"),
            }
        }
    }
    parts
}

pub fn request_body(parts: Vec<Part>) -> serde_json::Value {
    json!({
        "contents": [{ "parts": parts }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": {
                "type": "OBJECT",
                "properties": {
                    "summary": { "type": "STRING" },
                    "mood": { "type": "STRING" },
                    "tips": { "type": "ARRAY", "items": { "type": "STRING" } }
                },
                "required": ["summary", "mood", "tips"]
            }
        }
    })
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

pub fn parse_response(body: &str) -> Result<MonthSummary, SummaryError> {
    let response: GenerateResponse = serde_json::from_str(body)?;
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| content.parts.into_iter().filter_map(|part| part.text).collect())
        .unwrap_or_default();
    if text.trim().is_empty() {
        return Err(SummaryError::EmptyResponse);
    }
    Ok(serde_json::from_str(&text)?)
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(http: reqwest::Client, config: GeminiConfig) -> Self {
        Self { http, config }
    }

    pub async fn summarize(
        &self,
        month_name: &str,
        year: i32,
        entries: &[(String, EntryData)],
    ) -> Result<MonthSummary, SummaryError> {
        if entries.is_empty() {
            return Err(SummaryError::NoEntries);
        }

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url, self.config.model
        );
        let response = self
            .http
            .post(url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&request_body(build_parts(month_name, year, entries)))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            error!("summary request failed with {status}");
            return Err(SummaryError::Api {
                status: status.as_u16(),
                body,
            });
        }
        parse_response(&body)
    }
}
