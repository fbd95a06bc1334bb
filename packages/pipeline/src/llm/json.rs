use serde::de::DeserializeOwned;

use crate::error::{PipelineError, Result};

/// Extract a JSON object from an LLM response, stripping markdown fences and
/// surrounding prose if present.
///
/// When multiple fenced blocks exist, prefers the first one that looks like a
/// JSON object. Without fences, falls back to the outermost `{ ... }` span.
pub fn extract_json_from_response(response: &str) -> &str {
    let trimmed = response.trim();

    let blocks = extract_fenced_blocks(trimmed);
    if let Some(block) = blocks.iter().find(|b| b.starts_with('{')) {
        return block;
    }
    if let Some(block) = blocks.first() {
        return block;
    }

    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => trimmed,
    }
}

/// Parse an LLM response into `T`, mapping failures to `LlmResponseParse`.
pub fn parse_json_response<T: DeserializeOwned>(response: &str) -> Result<T> {
    serde_json::from_str(extract_json_from_response(response))
        .map_err(|e| PipelineError::LlmResponseParse(e.to_string()))
}

/// Extract all fenced code blocks from text, trimmed.
fn extract_fenced_blocks(text: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut remaining = text;

    while let Some(start) = remaining.find("```") {
        let after_fence = &remaining[start + 3..];
        // Skip optional language identifier on the same line
        let content_start = after_fence.find('\n').map(|i| i + 1).unwrap_or(0);
        let content = &after_fence[content_start..];
        if let Some(end) = content.find("```") {
            blocks.push(content[..end].trim());
            remaining = &content[end + 3..];
        } else {
            break;
        }
    }

    blocks
}
