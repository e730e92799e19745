use serde_json::Value;

use crate::error::{Error, Result};

/// Pull the string labels out of a subcategory reply. Unparseable replies
/// yield an empty list; whitelist filtering happens downstream.
pub fn parse_subcategory_response(response: &str) -> Vec<String> {
    match extract_json_array(response) {
        Ok(values) => values
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        Err(e) => {
            tracing::debug!("Discarding subcategory reply: {}", e);
            Vec::new()
        }
    }
}

fn extract_json_array(text: &str) -> Result<Vec<Value>> {
    let text = text.trim();

    if let Ok(values) = serde_json::from_str::<Vec<Value>>(text) {
        return Ok(values);
    }

    // Models often wrap the array in prose or a code fence
    if let (Some(start), Some(end)) = (text.find('['), text.rfind(']')) {
        if start < end {
            return serde_json::from_str::<Vec<Value>>(&text[start..=end])
                .map_err(|e| Error::ParseError(format!("Invalid JSON array: {}", e)));
        }
    }

    Err(Error::ParseError("No JSON array found in response".to_string()))
}

/// Trim a synthesized statement and strip one surrounding quote pair.
/// Returns `None` when nothing is left.
pub fn clean_statement(response: &str) -> Option<String> {
    let mut text = response.trim();
    if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
        text = text[1..text.len() - 1].trim();
    }
    (!text.is_empty()).then(|| text.to_string())
}
