//! Accessors over the JSON object a model passes as tool input.

use chrono::NaiveDate;
use serde_json::{Map, Value};

use super::errors::ToolError;

/// Longest allowed intention title, in characters.
pub const MAX_TITLE_CHARS: usize = 500;

pub(crate) struct ToolInput<'a>(&'a Map<String, Value>);

impl<'a> ToolInput<'a> {
    pub fn new(value: &'a Value) -> Result<Self, ToolError> {
        value
            .as_object()
            .map(ToolInput)
            .ok_or_else(|| ToolError::invalid("Tool input must be a JSON object"))
    }

    /// A present, non-null value.
    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    /// Boolean flag, absent or non-boolean meaning `false`.
    pub fn flag(&self, key: &str) -> bool {
        self.get(key).and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn intention_id(&self) -> Result<i64, ToolError> {
        let value = self
            .get("intention_id")
            .ok_or_else(|| ToolError::invalid("intention_id is required"))?;
        match value.as_i64() {
            Some(0) => Err(ToolError::invalid("intention_id is required")),
            Some(id) => Ok(id),
            None => Err(ToolError::invalid("intention_id must be an integer")),
        }
    }

    /// Optional `YYYY-MM-DD` date; an empty string counts as absent.
    pub fn date(&self, key: &str) -> Result<Option<NaiveDate>, ToolError> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::String(s)) if s.is_empty() => Ok(None),
            Some(value) => parse_date(value)
                .map(Some)
                .ok_or_else(|| {
                    ToolError::invalid(format!(
                        "Invalid date format: {}. Use YYYY-MM-DD.",
                        display(value)
                    ))
                }),
        }
    }
}

pub(crate) fn parse_date(value: &Value) -> Option<NaiveDate> {
    value
        .as_str()
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
}

/// Render a JSON value for an error message without quoting strings.
pub(crate) fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Trim and validate a title. `prefix` is prepended to error messages.
pub(crate) fn title(value: Option<&Value>, prefix: &str) -> Result<String, ToolError> {
    let title = value.and_then(Value::as_str).unwrap_or_default().trim();
    if title.is_empty() {
        let msg = if prefix.is_empty() {
            "Title is required and cannot be empty".to_string()
        } else {
            format!("{prefix}title is required and cannot be empty")
        };
        return Err(ToolError::invalid(msg));
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        let msg = if prefix.is_empty() {
            format!("Title cannot exceed {MAX_TITLE_CHARS} characters")
        } else {
            format!("{prefix}title cannot exceed {MAX_TITLE_CHARS} characters")
        };
        return Err(ToolError::invalid(msg));
    }
    Ok(title.to_string())
}
