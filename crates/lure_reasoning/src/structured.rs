//! Tolerant parsing of structured model output.
//!
//! Models wrap JSON in code fences or surround it with prose. Strategies, in order:
//! 1. Direct parse
//! 2. Contents of a fenced code block
//! 3. Outermost `{...}` slice

use regex::Regex;
use serde::de::DeserializeOwned;
use std::sync::LazyLock;

use crate::error::StageError;

static RE_CODE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```(?:json|JSON)?\s*\n?([\s\S]*?)\n?\s*```").unwrap());

/// Parse `text` as `T`, locating the JSON object inside formatting if needed.
pub fn parse_structured<T: DeserializeOwned>(text: &str) -> Result<T, StageError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(StageError::Empty);
    }

    let mut last_error = match serde_json::from_str::<T>(trimmed) {
        Ok(v) => return Ok(v),
        Err(e) => e.to_string(),
    };

    if let Some(caps) = RE_CODE_BLOCK.captures(trimmed) {
        let inner = caps.get(1).map_or("", |m| m.as_str()).trim();
        match serde_json::from_str::<T>(inner) {
            Ok(v) => return Ok(v),
            Err(e) => last_error = e.to_string(),
        }
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            match serde_json::from_str::<T>(&trimmed[start..=end]) {
                Ok(v) => return Ok(v),
                Err(e) => last_error = e.to_string(),
            }
        }
    }

    tracing::debug!(
        "Could not parse structured response: {}",
        trimmed.chars().take(200).collect::<String>()
    );
    Err(StageError::Parse(last_error))
}

/// Trim whitespace and one pair of surrounding quote characters.
pub fn strip_wrapping_quotes(text: &str) -> String {
    let trimmed = text.trim();
    for (open, close) in [('"', '"'), ('\'', '\''), ('“', '”')] {
        if trimmed.len() >= 2 && trimmed.starts_with(open) && trimmed.ends_with(close) {
            let inner = &trimmed[open.len_utf8()..trimmed.len() - close.len_utf8()];
            return inner.trim().to_string();
        }
    }
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Sample {
        value: i32,
    }

    #[test]
    fn test_parse_clean_json() {
        let p: Sample = parse_structured(r#"{"value": 3}"#).unwrap();
        assert_eq!(p.value, 3);
    }

    #[test]
    fn test_parse_code_block_wrapped() {
        let p: Sample = parse_structured("```json\n{\"value\": 4}\n```").unwrap();
        assert_eq!(p.value, 4);
    }

    #[test]
    fn test_parse_embedded_in_prose() {
        let p: Sample =
            parse_structured("Sure! Here it is: {\"value\": 5} hope that helps").unwrap();
        assert_eq!(p.value, 5);
    }

    #[test]
    fn test_garbage_and_empty() {
        assert!(matches!(parse_structured::<Sample>("no json here"), Err(StageError::Parse(_))));
        assert!(matches!(parse_structured::<Sample>("   "), Err(StageError::Empty)));
    }

    #[test]
    fn test_strip_wrapping_quotes() {
        assert_eq!(strip_wrapping_quotes("  \"hello there\" "), "hello there");
        assert_eq!(strip_wrapping_quotes("“curly”"), "curly");
        assert_eq!(strip_wrapping_quotes("\"unbalanced"), "\"unbalanced");
        assert_eq!(strip_wrapping_quotes("\""), "\"");
    }
}
