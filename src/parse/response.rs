// Completion payloads returned by the chat endpoint, in both the single
// document shape and the per-chunk streaming shape.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletion {
    #[serde(default)]
    pub model: Option<String>,
    pub choices: Vec<CompletionChoice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct CompletionChoice {
    pub message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
pub struct CompletionMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionChunk {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub delta: Option<ChunkDelta>,
}

#[derive(Debug, Deserialize)]
pub struct ChunkDelta {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatCompletionChunk {
    /// `choices[0].delta.content`, if the chunk carries any text.
    pub fn delta_content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.delta.as_ref())
            .and_then(|d| d.content.as_deref())
    }
}

/// The text of one finished request plus what the endpoint told us about it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    pub content: String,
    pub model: Option<String>,
    pub usage: Option<Usage>,
}

/// Extract `choices[0].message.content` from a non-streaming body.
pub fn extract_completion(body: &str) -> Option<Completion> {
    let parsed: ChatCompletion = serde_json::from_str(body).ok()?;
    let content = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)?;
    Some(Completion {
        content,
        model: parsed.model,
        usage: parsed.usage,
    })
}

pub fn format_usage_line(completion: &Completion) -> String {
    let model = completion.model.as_deref().unwrap_or("-");
    match &completion.usage {
        Some(usage) => format!(
            "model={model} usage(prompt={}, completion={}, total={})",
            usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
        ),
        None => format!("model={model} usage(unknown)"),
    }
}
