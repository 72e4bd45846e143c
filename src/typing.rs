//! Character-by-character reveal of a finished answer.

use std::ops::Range;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use tokio_util::sync::CancellationToken;
use tracing::debug;

// Fenced and inline code, display and inline math.
static FAST_SPAN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```.*?```|`[^`\n]+`|\$\$.*?\$\$|\$[^$\n]+\$|\\\[.*?\\\]|\\\(.*?\\\)")
        .expect("invalid fast span regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypingPace {
    pub normal: Duration,
    pub fast: Duration,
}

impl Default for TypingPace {
    fn default() -> Self {
        Self {
            normal: Duration::from_millis(12),
            fast: Duration::from_millis(2),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevealOutcome {
    Finished(String),
    /// Holds whatever was shown before the token fired.
    Cancelled(String),
}

impl RevealOutcome {
    pub fn text(&self) -> &str {
        match self {
            RevealOutcome::Finished(text) | RevealOutcome::Cancelled(text) => text,
        }
    }
}

/// Byte ranges of `text` that are typed at the fast pace.
pub fn fast_spans(text: &str) -> Vec<Range<usize>> {
    FAST_SPAN.find_iter(text).map(|m| m.range()).collect()
}

pub async fn reveal<F>(
    text: &str,
    pace: TypingPace,
    cancel: &CancellationToken,
    mut on_chunk: F,
) -> RevealOutcome
where
    F: FnMut(&str),
{
    let spans = fast_spans(text);
    let mut span_iter = spans.iter().peekable();
    let mut revealed = String::with_capacity(text.len());
    let mut buf = [0u8; 4];

    for (offset, ch) in text.char_indices() {
        while span_iter.peek().is_some_and(|span| span.end <= offset) {
            span_iter.next();
        }
        let fast = span_iter.peek().is_some_and(|span| span.contains(&offset));
        let delay = if fast { pace.fast } else { pace.normal };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(shown = revealed.chars().count(), "reveal cancelled");
                return RevealOutcome::Cancelled(revealed);
            }
            _ = tokio::time::sleep(delay) => {}
        }

        on_chunk(ch.encode_utf8(&mut buf));
        revealed.push(ch);
    }
    RevealOutcome::Finished(revealed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[test]
    fn spans_cover_code_and_math() {
        let text = "Use `x` then $$y$$ and \\(z\\) or\n```\ncode\n```";
        let spans: Vec<&str> = fast_spans(text).into_iter().map(|r| &text[r]).collect();
        assert_eq!(spans, vec!["`x`", "$$y$$", "\\(z\\)", "```\ncode\n```"]);
    }

    #[test]
    fn plain_prose_has_no_fast_spans() {
        assert!(fast_spans("It costs 5 dollars, not $ much.").is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn reveals_every_character_in_order() {
        let token = CancellationToken::new();
        let mut shown = String::new();
        let outcome = reveal("héllo **wörld**", TypingPace::default(), &token, |chunk| {
            shown.push_str(chunk)
        })
        .await;
        assert_eq!(outcome, RevealOutcome::Finished("héllo **wörld**".to_string()));
        assert_eq!(shown, "héllo **wörld**");
    }

    #[tokio::test(start_paused = true)]
    async fn code_spans_type_faster() {
        let pace = TypingPace {
            normal: Duration::from_millis(10),
            fast: Duration::from_millis(1),
        };
        let token = CancellationToken::new();
        let started = Instant::now();
        reveal("ab`cd`", pace, &token, |_| {}).await;
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(24), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(30), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn cancelling_keeps_what_was_shown() {
        let token = CancellationToken::new();
        let mut count = 0;
        let outcome = reveal("abcdefghij", TypingPace::default(), &token, |_| {
            count += 1;
            if count == 4 {
                token.cancel();
            }
        })
        .await;
        assert_eq!(outcome, RevealOutcome::Cancelled("abcd".to_string()));
        assert_eq!(outcome.text(), "abcd");
    }

    #[tokio::test(start_paused = true)]
    async fn already_cancelled_shows_nothing() {
        let token = CancellationToken::new();
        token.cancel();
        let outcome = reveal("text", TypingPace::default(), &token, |_| {}).await;
        assert_eq!(outcome, RevealOutcome::Cancelled(String::new()));
    }
}
