use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

use crate::models::{
    Accessory, CoordinateResult, PaletteColor, MAX_ACCESSORIES, MAX_PALETTE_COLORS,
    MAX_STYLING_TIPS,
};

static FENCED_JSON: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```json\s*([\s\S]*?)\s*```").unwrap());

#[derive(Debug, Error)]
#[error("could not parse AI response: {reason}")]
pub struct ParseError {
    reason: String,
}

impl ParseError {
    fn new(reason: impl Into<String>) -> Self {
        ParseError {
            reason: reason.into(),
        }
    }
}

/// Locates the JSON object in free-form model output.
///
/// Tries a fenced ```json block first, then the whole text, then the slice
/// between the first `{` and the last `}`.
fn extract_json_object(raw: &str) -> Result<Map<String, Value>, ParseError> {
    let mut candidates = Vec::with_capacity(3);
    if let Some(captures) = FENCED_JSON.captures(raw) {
        if let Some(body) = captures.get(1) {
            candidates.push(body.as_str());
        }
    }
    let trimmed = raw.trim();
    candidates.push(trimmed);
    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if end > start {
            candidates.push(&trimmed[start..=end]);
        }
    }

    let mut last_error = String::from("response is empty");
    for candidate in candidates {
        match serde_json::from_str::<Value>(candidate) {
            Ok(Value::Object(object)) => return Ok(object),
            Ok(other) => last_error = format!("expected a JSON object, got {}", json_kind(&other)),
            Err(err) => last_error = err.to_string(),
        }
    }
    Err(ParseError::new(last_error))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Accepts numbers and numeric strings, clamped to 0-100.
fn coerce_score(value: Option<&Value>) -> Option<u8> {
    let number = match value? {
        Value::Null => return None,
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().trim_end_matches('점').trim().parse::<f64>().ok(),
        _ => None,
    };
    match number {
        Some(score) if score.is_finite() => Some(score.round().clamp(0.0, 100.0) as u8),
        _ => {
            warn!("Ignoring non-numeric score in model response: {:?}", value);
            None
        }
    }
}

fn string_list(value: Option<&Value>, limit: usize) -> Vec<String> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
            _ => None,
        })
        .take(limit)
        .collect()
}

fn accessory_list(value: Option<&Value>) -> Vec<Accessory> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::Object(_) => serde_json::from_value::<Accessory>(item.clone()).ok(),
            Value::String(name) if !name.trim().is_empty() => Some(Accessory {
                name: name.trim().to_string(),
                ..Accessory::default()
            }),
            _ => None,
        })
        .filter(|accessory| !accessory.name.trim().is_empty())
        .take(MAX_ACCESSORIES)
        .collect()
}

fn palette(value: Option<&Value>) -> Vec<PaletteColor> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| serde_json::from_value::<PaletteColor>(item.clone()).ok())
        .filter(|color| !color.hex().trim().is_empty())
        .take(MAX_PALETTE_COLORS)
        .collect()
}

/// Turns raw model text into a normalized analysis result.
///
/// Missing fields become empty, lists are capped, and a malformed score is dropped
/// rather than failing the whole response.
pub fn parse_coordinate_response(raw: &str) -> Result<CoordinateResult, ParseError> {
    let object = extract_json_object(raw)?;
    let overall_comment = match object.get("overallComment") {
        Some(Value::String(comment)) => comment.trim().to_string(),
        _ => String::new(),
    };

    Ok(CoordinateResult {
        score: coerce_score(object.get("score")),
        styling_tips: string_list(object.get("stylingTips"), MAX_STYLING_TIPS),
        accessories: accessory_list(object.get("accessories")),
        color_palette: palette(object.get("colorPalette")),
        overall_comment,
    })
}
