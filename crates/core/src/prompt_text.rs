//! Request text sent with each batch and parsing of the model's reply.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

/// Text sent by the connection test.
pub const CONNECTION_TEST_PROMPT: &str = "Test connection: Say 'API connection successful'";

/// Values substituted into the batch instruction.
#[derive(Debug, Clone)]
pub struct BatchPromptInput<'a> {
    pub complexity_desc: &'a str,
    pub aspect_ratio: &'a str,
    pub aspect_desc: &'a str,
    pub variation_instruction: &'a str,
    pub count: usize,
}

/// Build the instruction asking for exactly `input.count` prompts as JSON.
pub fn build_batch_prompt(input: &BatchPromptInput<'_>) -> String {
    let BatchPromptInput {
        complexity_desc,
        aspect_ratio,
        aspect_desc,
        variation_instruction,
        count,
    } = input;

    format!(
        r#"Analyze this video and generate {count} distinct AI art prompts based on it.

REQUIREMENTS:
- Complexity Level: {complexity_desc}
- Target Aspect Ratio: {aspect_ratio} ({aspect_desc})
- Variation Strategy: {variation_instruction}
- Generate EXACTLY {count} different prompts
- Each prompt should be unique and creative
- Format as JSON array with "prompts" key

Please provide the response as valid JSON in this format:
{{
    "prompts": [
        "first prompt text here...",
        "second prompt text here...",
        "third prompt text here..."
    ]
}}

Make sure each prompt is detailed, creative, and suitable for AI art generation tools."#
    )
}

/// First JSON object mentioning a `prompts` array, possibly inside a code fence.
static EMBEDDED_JSON_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)\{.*?"prompts".*?\[.*?\].*?\}"#).expect("valid regex")
});

static NUMBERED_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\s*").expect("valid regex"));

/// Extract at most `expected` prompts from a model reply.
///
/// Tried in order: the whole reply as JSON with a `prompts` array, the first
/// JSON object embedded in surrounding text, numbered lines (`1. ...`) with
/// enclosing double quotes removed, and finally the whole reply as a single
/// prompt. A blank reply yields no prompts.
pub fn parse_batch_response(text: &str, expected: usize) -> Vec<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() || expected == 0 {
        return Vec::new();
    }

    if let Some(prompts) = prompts_from_json(text) {
        return truncate(prompts, expected);
    }

    if let Some(prompts) = EMBEDDED_JSON_RE
        .find(text)
        .and_then(|m| prompts_from_json(m.as_str()))
    {
        return truncate(prompts, expected);
    }

    let numbered: Vec<String> = trimmed
        .lines()
        .map(str::trim)
        .filter(|line| NUMBERED_LINE_RE.is_match(line))
        .map(|line| {
            let prompt = NUMBERED_LINE_RE.replace(line, "").trim().to_string();
            strip_quotes(&prompt).to_string()
        })
        .take(expected)
        .collect();
    if !numbered.is_empty() {
        return numbered;
    }

    vec![trimmed.to_string()]
}

fn prompts_from_json(text: &str) -> Option<Vec<String>> {
    let value: Value = serde_json::from_str(text).ok()?;
    let items = value.get("prompts")?.as_array()?;
    Some(
        items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
    )
}

fn strip_quotes(s: &str) -> &str {
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

fn truncate(mut prompts: Vec<String>, expected: usize) -> Vec<String> {
    prompts.truncate(expected);
    prompts
}
