//! Decoding of the JSON file formats into domain types.
//!
//! This is the single place where malformed files are recovered: anything that
//! cannot be understood is logged and replaced by an empty/default value.

use std::path::Path;

use quiz_core::model::{
    ProgressMap, Question, QuestionBank, QuestionIndex, QuizSettings, Streak,
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::repository::StorageError;

pub(crate) const QUESTIONS_PER_SESSION_KEY: &str = "questions_per_session";

/// Persisted shape of one question record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub question: String,
    #[serde(default)]
    pub correct_answers: Vec<String>,
    #[serde(default)]
    pub wrong_options: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl QuestionRecord {
    #[must_use]
    pub fn from_question(question: &Question) -> Self {
        Self {
            question: question.question().to_owned(),
            correct_answers: question.correct_answers().to_vec(),
            wrong_options: question.wrong_options().to_vec(),
            explanation: question.explanation().to_owned(),
            id: None,
        }
    }
}

pub(crate) fn decode_question_bank(bytes: &[u8], source: &Path) -> QuestionBank {
    let records: Vec<Value> = match serde_json::from_slice(bytes) {
        Ok(records) => records,
        Err(err) => {
            warn!(path = %source.display(), error = %err, "question file is not a JSON array");
            return QuestionBank::default();
        }
    };

    let slots = records
        .into_iter()
        .enumerate()
        .map(|(index, raw)| {
            let record: QuestionRecord = match serde_json::from_value(raw) {
                Ok(record) => record,
                Err(err) => {
                    warn!(path = %source.display(), index, error = %err, "skipping malformed question");
                    return None;
                }
            };
            match Question::new(
                record.question,
                record.correct_answers,
                record.wrong_options,
                record.explanation,
            ) {
                Ok(question) => Some(question),
                Err(err) => {
                    warn!(path = %source.display(), index, error = %err, "skipping invalid question");
                    None
                }
            }
        })
        .collect();

    QuestionBank::new(slots)
}

pub(crate) fn decode_progress(bytes: &[u8], source: &Path) -> ProgressMap {
    let raw: Map<String, Value> = match serde_json::from_slice(bytes) {
        Ok(raw) => raw,
        Err(err) => {
            warn!(path = %source.display(), error = %err, "corrupt progress file, treating as empty");
            return ProgressMap::new();
        }
    };

    raw.into_iter()
        .filter_map(|(key, value)| {
            let index = key.parse::<QuestionIndex>().ok();
            let streak = value.as_u64().and_then(|v| u32::try_from(v).ok());
            match (index, streak) {
                (Some(index), Some(streak)) => Some((index, Streak::new(streak))),
                _ => {
                    warn!(path = %source.display(), key = %key, value = %value, "skipping progress entry");
                    None
                }
            }
        })
        .collect()
}

pub(crate) fn encode_progress(progress: &ProgressMap) -> Result<Vec<u8>, StorageError> {
    let raw: Map<String, Value> = progress
        .iter()
        .map(|(index, streak)| (index.to_string(), Value::from(streak.value())))
        .collect();
    serde_json::to_vec_pretty(&raw).map_err(|e| StorageError::Serialization(e.to_string()))
}

pub(crate) fn decode_settings_object(bytes: &[u8], source: &Path) -> Map<String, Value> {
    match serde_json::from_slice(bytes) {
        Ok(raw) => raw,
        Err(err) => {
            warn!(path = %source.display(), error = %err, "corrupt settings file, using defaults");
            Map::new()
        }
    }
}

pub(crate) fn settings_from_object(raw: &Map<String, Value>) -> QuizSettings {
    raw.get(QUESTIONS_PER_SESSION_KEY)
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())
        .map_or_else(QuizSettings::default, QuizSettings::from_persisted)
}
