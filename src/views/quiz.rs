//! Quiz session: setup, one question at a time, then a scored review.

use std::collections::BTreeMap;

use tracing::warn;

use crate::errors::CliError;
use crate::parse::quiz::{Quiz, QuizParseError, QuizQuestion, parse_quiz};

pub const FORMAT_NOTICE: &str = "The quiz format is incorrect. Showing plain text instead.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizPhase {
    Setup,
    /// Zero-based position in the question list.
    InProgress { index: usize },
    Completed { score: u8 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewItem {
    pub number: usize,
    pub question: String,
    pub selected: Option<String>,
    pub correct_answer: String,
    pub correct_text: String,
    pub explanation: String,
    pub is_correct: bool,
}

#[derive(Debug, Clone)]
pub struct QuizSession {
    phase: QuizPhase,
    quiz: Option<Quiz>,
    answers: BTreeMap<u32, String>,
    raw: Option<String>,
    notice: Option<&'static str>,
}

impl Default for QuizSession {
    fn default() -> Self {
        Self::new()
    }
}

impl QuizSession {
    pub fn new() -> Self {
        Self {
            phase: QuizPhase::Setup,
            quiz: None,
            answers: BTreeMap::new(),
            raw: None,
            notice: None,
        }
    }

    pub fn phase(&self) -> QuizPhase {
        self.phase
    }

    pub fn quiz(&self) -> Option<&Quiz> {
        self.quiz.as_ref()
    }

    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    pub fn notice(&self) -> Option<&'static str> {
        self.notice
    }

    pub fn answer_count(&self) -> usize {
        self.answers.len()
    }

    /// Takes a fresh generation. Valid quizzes start at the first question;
    /// anything else stays in setup with the raw text and a notice kept.
    pub fn load(&mut self, raw: impl Into<String>) -> Result<&Quiz, QuizParseError> {
        let raw = raw.into();
        self.answers.clear();
        self.quiz = None;
        self.phase = QuizPhase::Setup;

        match parse_quiz(&raw) {
            Ok(quiz) => {
                self.raw = Some(raw);
                self.notice = None;
                self.phase = QuizPhase::InProgress { index: 0 };
                let quiz = self.quiz.insert(quiz);
                Ok(&*quiz)
            }
            Err(err) => {
                warn!("quiz generation rejected: {err}");
                self.raw = Some(raw);
                self.notice = Some(FORMAT_NOTICE);
                Err(err)
            }
        }
    }

    pub fn current(&self) -> Option<(usize, &QuizQuestion)> {
        match (self.phase, &self.quiz) {
            (QuizPhase::InProgress { index }, Some(quiz)) => {
                quiz.questions.get(index).map(|q| (index, q))
            }
            _ => None,
        }
    }

    pub fn selected(&self, question_id: u32) -> Option<&str> {
        self.answers.get(&question_id).map(String::as_str)
    }

    /// Records an answer for the current question. Choosing again replaces it.
    pub fn select(&mut self, option_id: &str) -> Result<(), CliError> {
        let (_, question) = self
            .current()
            .ok_or_else(|| CliError::Usage("No question is being answered.".to_string()))?;
        let option = question
            .options
            .iter()
            .find(|o| o.id.eq_ignore_ascii_case(option_id.trim()))
            .ok_or_else(|| {
                CliError::Usage(format!("'{}' is not one of the options.", option_id.trim()))
            })?;
        let (id, chosen) = (question.id, option.id.clone());
        self.answers.insert(id, chosen);
        Ok(())
    }

    /// Moves on once the current question is answered; the last question
    /// scores the quiz.
    pub fn next(&mut self) -> Result<QuizPhase, CliError> {
        let (index, question) = self
            .current()
            .ok_or_else(|| CliError::Usage("No question is being answered.".to_string()))?;
        if !self.answers.contains_key(&question.id) {
            return Err(CliError::Usage(
                "Choose an answer before moving on.".to_string(),
            ));
        }

        let total = self.quiz.as_ref().map_or(0, |q| q.questions.len());
        self.phase = if index + 1 < total {
            QuizPhase::InProgress { index: index + 1 }
        } else {
            QuizPhase::Completed {
                score: self.score(),
            }
        };
        Ok(self.phase)
    }

    /// Steps back one question; answers are untouched.
    pub fn previous(&mut self) -> QuizPhase {
        if let QuizPhase::InProgress { index } = self.phase {
            self.phase = QuizPhase::InProgress {
                index: index.saturating_sub(1),
            };
        }
        self.phase
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn correct_count(&self) -> usize {
        self.quiz.as_ref().map_or(0, |quiz| {
            quiz.questions
                .iter()
                .filter(|q| self.selected(q.id) == Some(q.correct_answer.as_str()))
                .count()
        })
    }

    /// Percentage of correct answers, rounded half away from zero.
    pub fn score(&self) -> u8 {
        let total = self.quiz.as_ref().map_or(0, |q| q.questions.len());
        if total == 0 {
            return 0;
        }
        ((self.correct_count() * 100) as f64 / total as f64).round() as u8
    }

    pub fn review(&self) -> Vec<ReviewItem> {
        let Some(quiz) = &self.quiz else {
            return Vec::new();
        };
        quiz.questions
            .iter()
            .enumerate()
            .map(|(idx, question)| {
                let selected = self.selected(question.id).map(str::to_string);
                ReviewItem {
                    number: idx + 1,
                    question: question.question.clone(),
                    is_correct: selected.as_deref() == Some(question.correct_answer.as_str()),
                    selected,
                    correct_answer: question.correct_answer.clone(),
                    correct_text: question
                        .option(&question.correct_answer)
                        .map(|o| o.text.clone())
                        .unwrap_or_default(),
                    explanation: question.explanation.clone(),
                }
            })
            .collect()
    }
}

pub fn feedback(score: u8) -> &'static str {
    match score {
        90.. => "Excellent work! You aced it!",
        70..=89 => "Great job! You know your stuff.",
        50..=69 => "Good effort. Keep studying to improve!",
        _ => "You might need more practice with this topic.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::quiz::tests::sample_quiz_json;

    // Mirrors the answer key of the sample quiz.
    fn correct_for(id: u32) -> &'static str {
        ["A", "B", "C", "D"][id as usize % 4]
    }

    fn answer_all(session: &mut QuizSession, right: usize) {
        let mut answered = 0;
        while let Some((_, question)) = session.current() {
            let id = question.id;
            let pick = if answered < right {
                correct_for(id)
            } else if correct_for(id) == "A" {
                "B"
            } else {
                "A"
            };
            session.select(pick).unwrap();
            session.next().unwrap();
            answered += 1;
        }
    }

    #[test]
    fn all_correct_scores_one_hundred() {
        let mut session = QuizSession::new();
        session.load(sample_quiz_json(5)).unwrap();
        answer_all(&mut session, 5);
        assert_eq!(session.phase(), QuizPhase::Completed { score: 100 });
        assert_eq!(feedback(100), "Excellent work! You aced it!");
    }

    #[test]
    fn score_is_rounded_percentage() {
        let mut session = QuizSession::new();
        session.load(sample_quiz_json(3)).unwrap();
        answer_all(&mut session, 2);
        assert_eq!(session.phase(), QuizPhase::Completed { score: 67 });
        assert_eq!(session.correct_count(), 2);

        let mut session = QuizSession::new();
        session.load(sample_quiz_json(8)).unwrap();
        answer_all(&mut session, 0);
        assert_eq!(session.phase(), QuizPhase::Completed { score: 0 });
    }

    #[test]
    fn next_requires_an_answer() {
        let mut session = QuizSession::new();
        session.load(sample_quiz_json(2)).unwrap();
        assert!(matches!(session.next(), Err(CliError::Usage(_))));
        assert_eq!(session.phase(), QuizPhase::InProgress { index: 0 });
    }

    #[test]
    fn unknown_option_is_rejected() {
        let mut session = QuizSession::new();
        session.load(sample_quiz_json(1)).unwrap();
        assert!(session.select("Z").is_err());
        assert_eq!(session.answer_count(), 0);
        session.select("b").unwrap();
        assert_eq!(session.selected(1), Some("B"));
    }

    #[test]
    fn last_answer_wins_and_previous_keeps_answers() {
        let mut session = QuizSession::new();
        session.load(sample_quiz_json(3)).unwrap();
        session.select("A").unwrap();
        session.select("B").unwrap();
        assert_eq!(session.selected(1), Some("B"));

        session.next().unwrap();
        assert_eq!(session.previous(), QuizPhase::InProgress { index: 0 });
        assert_eq!(session.previous(), QuizPhase::InProgress { index: 0 });
        assert_eq!(session.selected(1), Some("B"));
        assert_eq!(session.answer_count(), 1);
    }

    #[test]
    fn reset_returns_to_setup_with_no_answers() {
        let mut session = QuizSession::new();
        session.load(sample_quiz_json(4)).unwrap();
        session.select("A").unwrap();
        session.reset();
        assert_eq!(session.phase(), QuizPhase::Setup);
        assert_eq!(session.answer_count(), 0);
        assert!(session.quiz().is_none());
        assert!(session.raw().is_none());
        assert!(session.notice().is_none());

        session.load("not json").unwrap_err();
        session.reset();
        assert_eq!(session.phase(), QuizPhase::Setup);
        assert!(session.notice().is_none());
    }

    #[test]
    fn malformed_generation_stays_in_setup() {
        let mut session = QuizSession::new();
        let raw = "Here is your quiz: 1. What is 2+2?";
        assert!(session.load(raw).is_err());
        assert_eq!(session.phase(), QuizPhase::Setup);
        assert_eq!(session.raw(), Some(raw));
        assert_eq!(session.notice(), Some(FORMAT_NOTICE));
        assert!(session.current().is_none());
    }

    #[test]
    fn completed_quiz_ignores_navigation() {
        let mut session = QuizSession::new();
        session.load(sample_quiz_json(1)).unwrap();
        answer_all(&mut session, 1);
        assert_eq!(session.previous(), QuizPhase::Completed { score: 100 });
        assert!(session.select("A").is_err());
        assert!(session.next().is_err());
    }

    #[test]
    fn review_lists_choices_and_explanations() {
        let mut session = QuizSession::new();
        session.load(sample_quiz_json(2)).unwrap();
        answer_all(&mut session, 1);
        let review = session.review();
        assert_eq!(review.len(), 2);
        assert!(review[0].is_correct);
        assert_eq!(review[0].correct_answer, "B");
        assert_eq!(review[0].correct_text, "Second");
        assert_eq!(review[0].explanation, "Because 1.");
        assert!(!review[1].is_correct);
        assert_eq!(review[1].selected.as_deref(), Some("A"));
    }

    #[test]
    fn feedback_tiers() {
        assert_eq!(feedback(90), "Excellent work! You aced it!");
        assert_eq!(feedback(70), "Great job! You know your stuff.");
        assert_eq!(feedback(50), "Good effort. Keep studying to improve!");
        assert_eq!(feedback(49), "You might need more practice with this topic.");
    }
}
