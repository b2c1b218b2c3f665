//! Best-effort extraction of sections from free-form model replies.
//!
//! Every extractor returns `None` when its section is absent; malformed
//! replies are a normal outcome, not an error.

use regex::Regex;

use crate::prompt::{EXPLANATION_MARKER, FIX_MARKER, UPDATED_CODE_MARKER};

/// Interior of the first ```` ```<tag>\n ... ``` ```` block, trimmed.
pub fn fenced_block(output: &str, tag: &str) -> Option<String> {
    let re = Regex::new(&format!(r"(?s)```{}\n(.*?)```", regex::escape(tag))).ok()?;
    re.captures(output)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// Everything after the explanation marker through end of text, trimmed.
pub fn explanation(output: &str) -> Option<String> {
    output
        .find(EXPLANATION_MARKER)
        .map(|i| output[i + EXPLANATION_MARKER.len()..].trim().to_string())
}

/// Text between the fix marker and the updated-code marker; both must be present.
pub fn fix_suggestion(output: &str) -> Option<String> {
    let start = output.find(FIX_MARKER)? + FIX_MARKER.len();
    let len = output[start..].find(UPDATED_CODE_MARKER)?;
    Some(output[start..start + len].trim().to_string())
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedGeneration {
    pub code: String,
    pub explanation: String,
}

pub fn parse_generation(output: &str, tag: &str) -> ParsedGeneration {
    ParsedGeneration {
        code: fenced_block(output, tag).unwrap_or_default(),
        explanation: explanation(output).unwrap_or_default(),
    }
}
