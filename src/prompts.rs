// Prompt templates for the four study tools. Every request is a system
// instruction followed by the user turn; chat also carries prior turns.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum RewriteStyle {
    #[default]
    Academic,
    Casual,
    Professional,
    Creative,
    Simplified,
}

impl RewriteStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            RewriteStyle::Academic => "academic",
            RewriteStyle::Casual => "casual",
            RewriteStyle::Professional => "professional",
            RewriteStyle::Creative => "creative",
            RewriteStyle::Simplified => "simplified",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

pub const MIN_QUESTIONS: u8 = 1;
pub const MAX_QUESTIONS: u8 = 20;

const SUMMARIZE_SYSTEM: &str = "You are an AI assistant that specializes in summarizing text. Provide concise, accurate summaries that capture the main points of the given text.";

const REWRITE_SYSTEM: &str = "You are an AI assistant that specializes in rewriting and paraphrasing text. Maintain the original meaning while improving clarity and style.";

const QUIZ_SYSTEM: &str = "You are an AI assistant that specializes in creating educational quizzes. Generate well-structured quizzes in JSON format that can be used in interactive applications.";

const CHAT_SYSTEM: &str = "You are IntelliBot, a helpful AI assistant for students. Respond quickly and concisely, prioritizing clarity.

Formatting Guidelines:
- Avoid using LaTeX syntax, including backslashes (\\), dollar signs ($), and environments like \\begin{align*}...\\end{align*}.
- Do not use decorative symbols such as:
  - Triple hashes (###)
  - Asterisks (****)
  - Backticks (```)
  - Tildes (~~~)
  - Angle brackets (<> or <<>>)
  - Curly braces ({})
  - Vertical bars (|)
  - Square brackets ([])
  - Underscores (_)
  - Equal signs (===)
  - Dashes (---)
  - Arrows (e.g., ->, <-, =>)
- Present information using clear, human-friendly formatting:
  - Use plain text for mathematical expressions.
  - Organize content with headings and bullet points.
  - Separate sections with simple line breaks.
- Ensure all responses are easy to read and understand, avoiding unexplained symbols or complex formatting.
- Whenever you introduce yourself or mention your name, always format 'IntelliBot' in bold using double asterisks (e.g., **IntelliBot**).

When you see mathematical expressions in LaTeX (such as align* environments or within \\[ ... \\]), convert them to plain text or easy-to-read lists. Replace decorative symbols with clear, human-friendly formatting such as headings, bullet points, or separators. Never output raw LaTeX or unexplained symbols. Always make your answers easy to read and understand.";

pub fn summarize(text: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(SUMMARIZE_SYSTEM),
        ChatMessage::user(format!("Please summarize the following text:\n\n{text}")),
    ]
}

pub fn rewrite(text: &str, style: RewriteStyle) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(REWRITE_SYSTEM),
        ChatMessage::user(format!(
            "Please rewrite the following text in a {} style:\n\n{text}",
            style.as_str()
        )),
    ]
}

pub fn quiz(topic: &str, difficulty: Difficulty, question_count: u8) -> Vec<ChatMessage> {
    let difficulty = difficulty.as_str();
    let user = format!(
        r#"Please create a {difficulty} quiz about {topic} with {question_count} questions.

Format your response as a strict JSON object with the following structure:
{{
  "title": "Quiz title related to the topic",
  "difficulty": "{difficulty}",
  "questions": [
    {{
      "id": 1,
      "question": "The question text",
      "options": [
        {{"id": "A", "text": "First option"}},
        {{"id": "B", "text": "Second option"}},
        {{"id": "C", "text": "Third option"}},
        {{"id": "D", "text": "Fourth option"}}
      ],
      "correctAnswer": "B",
      "explanation": "Brief explanation why this is the correct answer"
    }}
  ]
}}

Make the quiz educational and appropriate for the {difficulty} difficulty level. Include clear explanations for the correct answers. Return ONLY the valid JSON with no additional text, markdown formatting, or code blocks."#
    );

    vec![ChatMessage::system(QUIZ_SYSTEM), ChatMessage::user(user)]
}

/// System messages in `history` are dropped; the persona is always ours.
pub fn chat(message: &str, history: &[ChatMessage]) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(CHAT_SYSTEM));
    messages.extend(
        history
            .iter()
            .filter(|m| m.role != Role::System)
            .cloned(),
    );
    messages.push(ChatMessage::user(message));
    messages
}

/// Topic for a quiz generated from a document: the file name up to its first
/// dot, with dashes and underscores read as spaces.
pub fn topic_from_file_name(file_name: &str) -> String {
    let stem = file_name.split('.').next().unwrap_or_default();
    stem.replace(['-', '_'], " ").trim().to_string()
}
