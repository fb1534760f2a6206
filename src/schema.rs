//! Shape check for decoded model output.
//!
//! Both providers hand back a JSON object the model wrote. Before it becomes
//! a [`ResearchResult`](crate::ResearchResult) it must have the three
//! required keys with the right primitive types. Unknown keys, including a
//! stray `query`, are dropped.

use serde_json::{Map, Value};

use crate::error::ResearchError;
use crate::types::Provider;

/// Validated model output, before the request's query is attached.
#[derive(Debug, Clone, PartialEq)]
pub struct ResearchPayload {
    pub answer: String,
    pub follow_up_questions: Vec<String>,
    pub confidence: f64,
    pub sources: Option<Vec<String>>,
}

impl ResearchPayload {
    pub fn from_value(provider: Provider, value: Value) -> Result<Self, ResearchError> {
        let object = match value {
            Value::Object(object) => object,
            other => {
                return Err(ResearchError::schema(
                    provider,
                    format!("expected a JSON object, got {}", kind_of(&other)),
                ))
            }
        };

        let answer = match object.get("answer") {
            Some(Value::String(answer)) => answer.clone(),
            Some(other) => return Err(wrong_type(provider, "answer", "a string", other)),
            None => return Err(missing(provider, "answer")),
        };

        let follow_up_questions = match object.get("followUpQuestions") {
            Some(value) => string_array(provider, "followUpQuestions", value)?,
            None => return Err(missing(provider, "followUpQuestions")),
        };

        let confidence = match object.get("confidence") {
            Some(Value::Number(n)) => n
                .as_f64()
                .ok_or_else(|| ResearchError::schema(provider, "field 'confidence' is not finite"))?,
            Some(other) => return Err(wrong_type(provider, "confidence", "a number", other)),
            None => return Err(missing(provider, "confidence")),
        };

        let sources = optional_sources(provider, &object)?;

        Ok(Self {
            answer,
            follow_up_questions,
            confidence,
            sources,
        })
    }
}

fn optional_sources(
    provider: Provider,
    object: &Map<String, Value>,
) -> Result<Option<Vec<String>>, ResearchError> {
    match object.get("sources") {
        None | Some(Value::Null) => Ok(None),
        Some(value) => string_array(provider, "sources", value).map(Some),
    }
}

fn string_array(provider: Provider, field: &str, value: &Value) -> Result<Vec<String>, ResearchError> {
    let items = value
        .as_array()
        .ok_or_else(|| wrong_type(provider, field, "an array of strings", value))?;

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            item.as_str().map(str::to_string).ok_or_else(|| {
                ResearchError::schema(
                    provider,
                    format!("field '{}[{}]' must be a string, got {}", field, i, kind_of(item)),
                )
            })
        })
        .collect()
}

fn missing(provider: Provider, field: &str) -> ResearchError {
    ResearchError::schema(provider, format!("missing required field '{}'", field))
}

fn wrong_type(provider: Provider, field: &str, expected: &str, got: &Value) -> ResearchError {
    ResearchError::schema(
        provider,
        format!("field '{}' must be {}, got {}", field, expected, kind_of(got)),
    )
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
