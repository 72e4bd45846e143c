//! Typed quiz schema for model output.
//!
//! The model is asked for strict JSON, but nothing forces it to comply, so
//! the text is deserialized and then checked structurally. Anything that
//! would break the quiz session (no questions, duplicate ids, a correct answer
//! that names no option) is rejected with a [`QuizParseError`].

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::errors::CliError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizOption {
    pub id: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub id: u32,
    pub question: String,
    pub options: Vec<QuizOption>,
    pub correct_answer: String,
    #[serde(default)]
    pub explanation: String,
}

impl QuizQuestion {
    pub fn option(&self, id: &str) -> Option<&QuizOption> {
        self.options.iter().find(|o| o.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    pub title: String,
    #[serde(default)]
    pub difficulty: String,
    pub questions: Vec<QuizQuestion>,
}

#[derive(Debug, Error)]
pub enum QuizParseError {
    #[error("quiz is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("quiz has no questions")]
    NoQuestions,
    #[error("question id {0} appears more than once")]
    DuplicateQuestion(u32),
    #[error("question {question_id} has no options")]
    NoOptions { question_id: u32 },
    #[error("question {question_id} repeats option '{option_id}'")]
    DuplicateOption { question_id: u32, option_id: String },
    #[error("question {question_id} marks '{answer}' correct but has no such option")]
    UnknownCorrectAnswer { question_id: u32, answer: String },
}

impl From<QuizParseError> for CliError {
    fn from(value: QuizParseError) -> Self {
        CliError::Parse(value.to_string())
    }
}

/// Parse and validate raw model output.
pub fn parse_quiz(raw: &str) -> Result<Quiz, QuizParseError> {
    let quiz: Quiz = serde_json::from_str(strip_code_fence(raw))?;
    validate(&quiz)?;
    Ok(quiz)
}

fn validate(quiz: &Quiz) -> Result<(), QuizParseError> {
    if quiz.questions.is_empty() {
        return Err(QuizParseError::NoQuestions);
    }

    let mut question_ids = HashSet::new();
    for question in &quiz.questions {
        if !question_ids.insert(question.id) {
            return Err(QuizParseError::DuplicateQuestion(question.id));
        }
        if question.options.is_empty() {
            return Err(QuizParseError::NoOptions {
                question_id: question.id,
            });
        }

        let mut option_ids = HashSet::new();
        for option in &question.options {
            if !option_ids.insert(option.id.as_str()) {
                return Err(QuizParseError::DuplicateOption {
                    question_id: question.id,
                    option_id: option.id.clone(),
                });
            }
        }

        if !option_ids.contains(question.correct_answer.as_str()) {
            return Err(QuizParseError::UnknownCorrectAnswer {
                question_id: question.id,
                answer: question.correct_answer.clone(),
            });
        }
    }
    Ok(())
}

/// Models wrap JSON in ```json fences despite being told not to.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening fence line.
    match body.split_once('\n') {
        Some((_, inner)) => inner.trim(),
        None => body.trim(),
    }
}
