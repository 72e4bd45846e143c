use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use clap::Args;
use serde_json::json;
use tracing::info;

use crate::app::Runtime;
use crate::errors::CliError;
use crate::prompts::{self, Difficulty, MAX_QUESTIONS, MIN_QUESTIONS};
use crate::spinner;
use crate::views::quiz::{FORMAT_NOTICE, QuizPhase, QuizSession, feedback};

#[derive(Debug, Args)]
pub struct QuizArgs {
    /// What the quiz is about
    pub topic: Option<String>,
    /// Take the topic from a document's file name
    #[arg(long = "from-file", value_name = "PATH", conflicts_with = "topic")]
    pub from_file: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = Difficulty::Medium)]
    pub difficulty: Difficulty,
    /// Number of questions
    #[arg(
        long,
        default_value_t = 5,
        value_parser = clap::value_parser!(u8).range(MIN_QUESTIONS as i64..=MAX_QUESTIONS as i64)
    )]
    pub count: u8,
}

pub async fn handle(runtime: &Runtime, args: QuizArgs) -> Result<(), CliError> {
    let topic = resolve_topic(&args)?;
    let api = runtime.api_client()?;

    let spinner = spinner::start(&runtime.output, "Generating quiz...");
    let result = api
        .complete(&prompts::quiz(&topic, args.difficulty, args.count))
        .await;
    if let Some(spinner) = spinner {
        spinner.stop().await;
    }
    let completion = result.inspect_err(|_| {
        let notice = if args.from_file.is_some() {
            "Failed to process the file. Please try again."
        } else {
            "Failed to generate quiz. Please try again."
        };
        runtime.output.print_stderr(notice);
    })?;

    let mut session = QuizSession::new();
    let loaded = session.load(completion.content).map(|quiz| quiz.clone());

    if runtime.output.json {
        let payload = match &loaded {
            Ok(quiz) => json!({ "ok": true, "quiz": quiz }),
            Err(err) => json!({
                "ok": false,
                "error": err.to_string(),
                "notice": FORMAT_NOTICE,
                "raw": session.raw(),
            }),
        };
        return runtime.output.print_json(&payload);
    }

    let quiz = match loaded {
        Ok(quiz) => quiz,
        Err(err) => {
            runtime.output.print_human(session.raw().unwrap_or_default());
            return Err(CliError::Parse(format!("{FORMAT_NOTICE} ({err})")));
        }
    };
    if let Some(path) = &args.from_file {
        runtime
            .output
            .print_stderr(&format!("Generated quiz based on {}.", display_name(path)));
    }
    info!(questions = quiz.questions.len(), "quiz ready");

    let stdin = io::stdin();
    let stdout = io::stdout();
    run_session(&mut session, stdin.lock(), stdout.lock())?;
    Ok(())
}

fn resolve_topic(args: &QuizArgs) -> Result<String, CliError> {
    if let Some(path) = &args.from_file {
        if !path.is_file() {
            return Err(CliError::Usage(format!(
                "Please select a file to upload. {} is not a readable file.",
                path.display()
            )));
        }
        let topic = prompts::topic_from_file_name(&display_name(path));
        if !topic.is_empty() {
            return Ok(topic);
        }
    }

    match &args.topic {
        Some(topic) if !topic.trim().is_empty() => Ok(topic.trim().to_string()),
        _ => Err(CliError::Usage(
            "Please enter a topic for your quiz.".to_string(),
        )),
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Drives a loaded session from line input until it is scored or the user
/// quits. Returns the score when the quiz was finished.
pub fn run_session<R: BufRead, W: Write>(
    session: &mut QuizSession,
    mut input: R,
    mut out: W,
) -> Result<Option<u8>, CliError> {
    loop {
        let (index, question) = match session.phase() {
            QuizPhase::Completed { score } => {
                write_results(session, score, &mut out)?;
                return Ok(Some(score));
            }
            QuizPhase::Setup => return Ok(None),
            QuizPhase::InProgress { .. } => match session.current() {
                Some((index, question)) => (index, question.clone()),
                None => return Ok(None),
            },
        };
        let (total, difficulty) = session
            .quiz()
            .map(|q| (q.questions.len(), q.difficulty.clone()))
            .unwrap_or_default();

        writeln!(out)?;
        if index == 0 {
            if let Some(quiz) = session.quiz() {
                writeln!(out, "{}", quiz.title)?;
            }
        }
        writeln!(out, "Question {} of {total} • {difficulty} difficulty", index + 1)?;
        writeln!(out, "{}", question.question)?;
        let chosen = session.selected(question.id).map(str::to_string);
        for option in &question.options {
            let marker = if chosen.as_deref() == Some(option.id.as_str()) { '>' } else { ' ' };
            writeln!(out, " {marker} {}. {}", option.id, option.text)?;
        }
        let ids: Vec<&str> = question.options.iter().map(|o| o.id.as_str()).collect();
        write!(out, "Answer [{}], n next, p previous, q quit: ", ids.join("/"))?;
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(out)?;
            session.reset();
            return Ok(None);
        }

        let command = line.trim();
        let outcome = match command.to_ascii_lowercase().as_str() {
            "q" | "quit" => {
                session.reset();
                writeln!(out, "Quiz discarded.")?;
                return Ok(None);
            }
            "p" | "prev" | "previous" => {
                session.previous();
                Ok(())
            }
            "n" | "next" => session.next().map(|_| ()),
            "" => Ok(()),
            _ => session.select(command).and_then(|()| session.next().map(|_| ())),
        };
        if let Err(err) = outcome {
            writeln!(out, "{err}")?;
        }
    }
}

fn write_results<W: Write>(session: &QuizSession, score: u8, out: &mut W) -> Result<(), CliError> {
    let review = session.review();
    writeln!(out)?;
    writeln!(out, "Quiz Completed!")?;
    writeln!(
        out,
        "Your Score: {score}% ({} of {} correct)",
        session.correct_count(),
        review.len()
    )?;
    writeln!(out, "{}", feedback(score))?;
    writeln!(out)?;
    writeln!(out, "Answer Review")?;
    for item in review {
        let mark = if item.is_correct { "✓" } else { "✗" };
        writeln!(out, "{}. {} {mark}", item.number, item.question)?;
        writeln!(
            out,
            "   Your answer: {}",
            item.selected.as_deref().unwrap_or("(none)")
        )?;
        writeln!(
            out,
            "   Correct answer: {}. {}",
            item.correct_answer, item.correct_text
        )?;
        if !item.explanation.is_empty() {
            writeln!(out, "   Explanation: {}", item.explanation)?;
        }
    }
    Ok(())
}
