//! Response parsing
//!
//! Model output is classified into an explicit [`ParseOutcome`]; nothing in
//! here returns an error. Extraction is lenient (code fences and prose around
//! the JSON object are ignored) but the object itself must match
//! [`ResearchAnswer`] exactly.

use citewise_common::models::{ResearchAnswer, INSUFFICIENT_EVIDENCE};

/// A response that could not be turned into a [`ResearchAnswer`]
#[derive(Debug, Clone, PartialEq)]
pub struct ParseFailure {
    /// The response exactly as the model returned it
    pub raw: String,
    /// The constraint that was violated
    pub violation: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    Valid(ResearchAnswer),
    Failure(ParseFailure),
}

impl ParseOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, ParseOutcome::Valid(_))
    }
}

fn failure(raw: &str, violation: impl Into<String>) -> ParseOutcome {
    ParseOutcome::Failure(ParseFailure {
        raw: raw.to_string(),
        violation: violation.into(),
    })
}

/// Remove a surrounding Markdown code fence, with or without a language tag
fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // single-line fences carry no language tag line to drop
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or(rest);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Slice from the first `{` to the last `}`
fn outermost_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// A bare insufficiency sentence, possibly quoted
fn is_bare_insufficiency(text: &str) -> bool {
    text.trim_matches(|c: char| c == '"' || c == '\'' || c.is_whitespace()) == INSUFFICIENT_EVIDENCE
}

/// Classify a raw model response
pub fn parse_response(raw: &str) -> ParseOutcome {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return failure(raw, "empty response");
    }

    let body = strip_code_fence(trimmed);

    if is_bare_insufficiency(body) {
        return ParseOutcome::Valid(ResearchAnswer {
            limitations: "The retrieved passages do not address the question.".to_string(),
            ..ResearchAnswer::insufficient_evidence()
        });
    }

    let Some(json) = outermost_object(body) else {
        return failure(raw, "no JSON object in response");
    };

    let answer: ResearchAnswer = match serde_json::from_str(json) {
        Ok(answer) => answer,
        Err(e) => return failure(raw, e.to_string()),
    };

    if answer.answer.trim().is_empty() {
        return failure(raw, "`answer` must not be blank");
    }

    ParseOutcome::Valid(answer)
}
