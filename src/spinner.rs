use std::io::{self, Write};
use std::time::Duration;

use crossterm::{
    cursor::MoveToColumn,
    queue,
    terminal::{Clear, ClearType},
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::output::OutputMode;

#[derive(Debug, Clone)]
pub struct Spinner {
    frames: Vec<&'static str>,
    current_frame: usize,
    speed: Duration,
}

impl Spinner {
    pub fn new(frames: Vec<&'static str>, speed_ms: u64) -> Self {
        Self {
            frames,
            current_frame: 0,
            speed: Duration::from_millis(speed_ms),
        }
    }

    pub fn classic() -> Self {
        Self::new(vec!["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"], 80)
    }

    fn next_frame(&mut self) {
        self.current_frame = (self.current_frame + 1) % self.frames.len();
    }

    fn current(&self) -> &str {
        self.frames.get(self.current_frame).copied().unwrap_or(" ")
    }
}

/// A running spinner on stderr. Dropping it without `stop` leaves the task
/// running until the runtime shuts down.
pub struct SpinnerGuard {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl SpinnerGuard {
    pub async fn stop(self) {
        self.token.cancel();
        let _ = self.handle.await;
    }
}

/// Starts a spinner only when a person is watching the terminal.
pub fn start(output: &OutputMode, label: &str) -> Option<SpinnerGuard> {
    if !output.is_interactive() {
        return None;
    }
    let token = CancellationToken::new();
    let label = label.to_string();
    let task_token = token.clone();
    let handle = tokio::spawn(async move {
        let mut stderr = io::stderr();
        spin(Spinner::classic(), &label, &task_token, &mut stderr).await;
    });
    Some(SpinnerGuard { token, handle })
}

/// Draws frames until cancelled, then clears its line.
async fn spin<W: Write>(mut spinner: Spinner, label: &str, token: &CancellationToken, out: &mut W) {
    loop {
        let _ = write!(out, "\r{} {label}", spinner.current());
        let _ = out.flush();
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = tokio::time::sleep(spinner.speed) => spinner.next_frame(),
        }
    }
    let _ = queue!(out, MoveToColumn(0), Clear(ClearType::CurrentLine));
    let _ = out.flush();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_wrap_around() {
        let mut spinner = Spinner::new(vec!["a", "b", "c"], 10);
        let seen: Vec<String> = (0..5)
            .map(|_| {
                let frame = spinner.current().to_string();
                spinner.next_frame();
                frame
            })
            .collect();
        assert_eq!(seen, vec!["a", "b", "c", "a", "b"]);
    }

    #[tokio::test(start_paused = true)]
    async fn spin_draws_until_cancelled_then_clears() {
        let token = CancellationToken::new();
        let mut buf: Vec<u8> = Vec::new();
        let spinner = Spinner::new(vec!["1", "2"], 100);

        tokio::join!(spin(spinner, "Thinking", &token, &mut buf), async {
            tokio::time::sleep(Duration::from_millis(250)).await;
            token.cancel();
        });

        let text = String::from_utf8_lossy(&buf);
        assert!(text.contains("\r1 Thinking"));
        assert!(text.contains("\r2 Thinking"));
        assert!(text.ends_with("\x1b[2K"));
    }
}
