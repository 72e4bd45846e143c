use std::io::{self, BufRead, BufReader, Read};
use std::thread;

use clap::Args;
use serde_json::json;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::api::ApiClient;
use crate::app::Runtime;
use crate::errors::CliError;
use crate::format;
use crate::parse::response::format_usage_line;
use crate::spinner;
use crate::typing::{self, RevealOutcome, TypingPace};
use crate::views::chat::{ChatSession, FAILURE_NOTICE};

#[derive(Debug, Args)]
pub struct ChatArgs {
    /// Message to send; without one an interactive conversation starts
    pub message: Option<String>,
    /// Read the message from stdin
    #[arg(long, conflicts_with = "message")]
    pub stdin: bool,
    /// Print replies at once instead of typing them out
    #[arg(long = "no-animate")]
    pub no_animate: bool,
}

pub async fn handle(runtime: &Runtime, args: ChatArgs) -> Result<(), CliError> {
    let api = runtime.api_client()?;
    let mut chat = ChatSession::new();
    let animate = !args.no_animate;

    if let Some(message) = resolve_message(&args)? {
        return interruptible_turn(runtime, &api, &mut chat, &message, animate).await;
    }
    if runtime.output.json {
        return Err(CliError::Usage(
            "Pass a message (or --stdin) when using --json.".to_string(),
        ));
    }

    runtime.output.print_human(&format::to_terminal(&format::parse(
        "Chat with **IntelliBot**. Type `/clear` to start over, `/exit` to leave.",
    )));
    let mut lines = spawn_line_reader(BufReader::new(io::stdin()));
    loop {
        runtime.output.print_fragment("You: ");
        let line = tokio::select! {
            line = lines.recv() => line.transpose()?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            runtime.output.print_human("");
            break;
        };

        match line.trim() {
            "" => continue,
            "/exit" | "/quit" => break,
            "/clear" => {
                chat.clear();
                runtime.output.print_stderr("Conversation cleared.");
            }
            message => {
                // A failed turn is reported and the conversation goes on.
                let turn = interruptible_turn(runtime, &api, &mut chat, message, animate).await;
                if let Err(err) = turn {
                    runtime.output.print_stderr(&format!("Error: {err}"));
                }
            }
        }
    }
    debug!(messages = chat.messages().len(), "chat ended");
    Ok(())
}

/// Reads lines on a plain thread so a pending read never holds up shutdown.
/// The channel closes at end of input.
fn spawn_line_reader<R>(reader: R) -> mpsc::Receiver<io::Result<String>>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel(1);
    thread::spawn(move || {
        for line in reader.lines() {
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// A token that the next Ctrl-C cancels. Abort the handle when done with it.
fn cancel_on_ctrl_c() -> (CancellationToken, JoinHandle<()>) {
    let token = CancellationToken::new();
    let listener = {
        let token = token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                token.cancel();
            }
        })
    };
    (token, listener)
}

async fn interruptible_turn(
    runtime: &Runtime,
    api: &ApiClient,
    chat: &mut ChatSession,
    message: &str,
    animate: bool,
) -> Result<(), CliError> {
    let (token, listener) = cancel_on_ctrl_c();
    let result = send_turn(runtime, api, chat, message, animate, &token).await;
    listener.abort();
    result
}

fn resolve_message(args: &ChatArgs) -> Result<Option<String>, CliError> {
    if args.stdin {
        let mut input = String::new();
        io::stdin()
            .read_to_string(&mut input)
            .map_err(|e| CliError::Generic(format!("Failed reading stdin: {e}")))?;
        if input.trim().is_empty() {
            return Err(CliError::Usage(
                "No message provided via stdin. Pipe text or pass a message argument.".to_string(),
            ));
        }
        return Ok(Some(input.trim().to_string()));
    }
    Ok(args
        .message
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string))
}

/// One user turn: request, then show and record the reply. Cancelling
/// `cancel` abandons the request, or stops the reveal once the reply is in.
pub async fn send_turn(
    runtime: &Runtime,
    api: &ApiClient,
    chat: &mut ChatSession,
    message: &str,
    animate: bool,
    cancel: &CancellationToken,
) -> Result<(), CliError> {
    let request = chat.submit(message)?;

    let spinner = spinner::start(&runtime.output, "IntelliBot is thinking...");
    let result = tokio::select! {
        result = api.complete(&request) => result,
        _ = cancel.cancelled() => {
            debug!("chat request interrupted");
            Err(CliError::Interrupted("Request cancelled.".to_string()))
        }
    };
    if let Some(spinner) = spinner {
        spinner.stop().await;
    }
    let completion = match result {
        Ok(completion) => completion,
        Err(err) => {
            chat.fail();
            runtime.output.print_stderr(FAILURE_NOTICE);
            return Err(err);
        }
    };
    runtime.output.print_verbose(&format_usage_line(&completion));

    if runtime.output.json {
        runtime.output.print_json(&json!({
            "role": "assistant",
            "content": completion.content,
            "model": completion.model,
            "usage": completion.usage,
        }))?;
        chat.commit_reply(completion.content);
        return Ok(());
    }

    let doc = format::parse(&completion.content);
    if !animate || !runtime.output.is_interactive() {
        let rendered = if runtime.output.is_interactive() {
            format::to_terminal(&doc)
        } else {
            format::to_plain(&doc)
        };
        runtime.output.print_human(&rendered);
        chat.commit_reply(completion.content);
        return Ok(());
    }

    let outcome = reveal_reply(runtime, &format::to_plain(&doc), cancel).await;
    let reply = match &outcome {
        RevealOutcome::Finished(_) => completion.content,
        RevealOutcome::Cancelled(_) => {
            runtime.output.print_stderr("(reply stopped)");
            outcome.text().to_string()
        }
    };
    chat.commit_reply(reply);
    Ok(())
}

/// Types `text` out until it is done or `cancel` fires.
async fn reveal_reply(runtime: &Runtime, text: &str, cancel: &CancellationToken) -> RevealOutcome {
    let outcome = typing::reveal(text, TypingPace::default(), cancel, |chunk| {
        runtime.output.print_fragment(chunk)
    })
    .await;
    runtime.output.print_human("");
    outcome
}
