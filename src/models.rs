use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SuggestionBatch {
    #[serde(default)]
    pub schema: Option<String>,
    #[serde(rename = "generatedAtUtc", default)]
    pub generated_at_utc: Option<String>,
    #[serde(rename = "fileSuggestions", default)]
    pub file_suggestions: Vec<FileSuggestions>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct FileSuggestions {
    #[serde(rename = "fileId")]
    pub file_id: String,
    #[serde(default)]
    pub schema: Option<String>,
    #[serde(rename = "generatedAtUtc", default)]
    pub generated_at_utc: Option<String>,
    #[serde(default)]
    pub suggestions: Vec<Suggestion>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Suggestion {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub original: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub suggested_text: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl SuggestionBatch {
    /// Model name recorded in subtask markers.
    pub fn source_model<'a>(&'a self, entry: &'a FileSuggestions, fallback: &'a str) -> &'a str {
        self.schema
            .as_deref()
            .or(entry.schema.as_deref())
            .unwrap_or(fallback)
    }

    pub fn generated_at<'a>(&'a self, entry: &'a FileSuggestions) -> &'a str {
        self.generated_at_utc
            .as_deref()
            .or(entry.generated_at_utc.as_deref())
            .unwrap_or("")
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Insert,
    SkipSimilar,
    SkipNotActionable,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Placed,
    SkippedSimilar,
    SkippedNotActionable,
    SkippedNoMatch,
    AlreadyPresent,
}

impl From<Decision> for Outcome {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Insert => Outcome::Placed,
            Decision::SkipSimilar => Outcome::SkippedSimilar,
            Decision::SkipNotActionable => Outcome::SkippedNotActionable,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub original: String,
    pub title: String,
    pub similarity: f64,
    pub actionable: bool,
    pub decision: Decision,
    pub outcome: Outcome,
}

#[derive(Default, Debug)]
pub struct ApplyReport {
    pub placed: usize,
    pub skipped_similar: usize,
    pub skipped_not_actionable: usize,
    pub skipped_no_match: usize,
    pub already_present: usize,
}

impl ApplyReport {
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Placed => self.placed += 1,
            Outcome::SkippedSimilar => self.skipped_similar += 1,
            Outcome::SkippedNotActionable => self.skipped_not_actionable += 1,
            Outcome::SkippedNoMatch => self.skipped_no_match += 1,
            Outcome::AlreadyPresent => self.already_present += 1,
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "Placed {} | Similar {} | Not actionable {} | No match {} | Present {}",
            self.placed,
            self.skipped_similar,
            self.skipped_not_actionable,
            self.skipped_no_match,
            self.already_present
        )
    }
}
