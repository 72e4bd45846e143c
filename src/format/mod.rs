//! Light markdown used by model answers.
//!
//! Text is parsed once into a [`Document`] of line blocks made of styled
//! [`Run`]s, and every output (HTML, terminal, plain text, `.docx`, `.pdf`)
//! is rendered from that tree.
//!
//! Supported subset:
//! - `# `, `## `, `### ` headings and `- ` list items at the start of a line
//! - `***bold italic***`, `**bold**`, `*italic*` inline
//!
//! A closing delimiter must be a run of exactly as many asterisks as the
//! opening one, so a lone `*` never closes inside `**`. Emphasis nests one
//! level (italic inside bold or bold inside italic both give bold-italic);
//! deeper nesting is kept as literal text. Unmatched asterisks are literal.

mod render;

pub use render::{ExportBlock, export_blocks, to_html, to_plain, to_terminal};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emphasis {
    Plain,
    Bold,
    Italic,
    BoldItalic,
}

impl Emphasis {
    pub fn is_bold(self) -> bool {
        matches!(self, Emphasis::Bold | Emphasis::BoldItalic)
    }

    pub fn is_italic(self) -> bool {
        matches!(self, Emphasis::Italic | Emphasis::BoldItalic)
    }

    fn combine(self, other: Emphasis) -> Emphasis {
        match (self.is_bold() || other.is_bold(), self.is_italic() || other.is_italic()) {
            (true, true) => Emphasis::BoldItalic,
            (true, false) => Emphasis::Bold,
            (false, true) => Emphasis::Italic,
            (false, false) => Emphasis::Plain,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub text: String,
    pub emphasis: Emphasis,
}

impl Run {
    pub fn new(text: impl Into<String>, emphasis: Emphasis) -> Self {
        Self {
            text: text.into(),
            emphasis,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, Emphasis::Plain)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading { level: u8, runs: Vec<Run> },
    ListItem(Vec<Run>),
    Paragraph(Vec<Run>),
    Blank,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub blocks: Vec<Block>,
}

/// One block per input line.
pub fn parse(text: &str) -> Document {
    let blocks = text
        .split('\n')
        .map(|line| parse_line(line.strip_suffix('\r').unwrap_or(line)))
        .collect();
    Document { blocks }
}

fn parse_line(line: &str) -> Block {
    if line.trim().is_empty() {
        return Block::Blank;
    }
    for (prefix, level) in [("### ", 3u8), ("## ", 2), ("# ", 1)] {
        if let Some(rest) = line.strip_prefix(prefix) {
            return Block::Heading {
                level,
                runs: parse_inline(rest),
            };
        }
    }
    if let Some(rest) = line.strip_prefix("- ") {
        return Block::ListItem(parse_inline(rest));
    }
    Block::Paragraph(parse_inline(line))
}

/// Inline emphasis for a single line.
pub fn parse_inline(text: &str) -> Vec<Run> {
    let chars: Vec<char> = text.chars().collect();
    let mut runs = Vec::new();
    scan(&chars, Emphasis::Plain, &mut runs);
    merge_runs(runs)
}

fn scan(chars: &[char], base: Emphasis, runs: &mut Vec<Run>) {
    let mut literal = String::new();
    let mut i = 0;

    while i < chars.len() {
        if chars[i] != '*' {
            literal.push(chars[i]);
            i += 1;
            continue;
        }

        let width = delimiter_width(chars, i);
        let kind = match width {
            1 => Some(Emphasis::Italic),
            2 => Some(Emphasis::Bold),
            3 => Some(Emphasis::BoldItalic),
            _ => None,
        };
        let close = kind.and_then(|_| find_closing(chars, i + width, width));

        match (kind, close) {
            (Some(kind), Some(close)) => {
                push_run(runs, &mut literal, base);
                let inner = &chars[i + width..close];
                let style = base.combine(kind);
                if base == Emphasis::Plain && kind != Emphasis::BoldItalic {
                    scan(inner, style, runs);
                } else {
                    runs.push(Run::new(inner.iter().collect::<String>(), style));
                }
                i = close + width;
            }
            _ => {
                literal.extend(std::iter::repeat_n('*', width));
                i += width;
            }
        }
    }
    push_run(runs, &mut literal, base);
}

fn delimiter_width(chars: &[char], start: usize) -> usize {
    chars[start..].iter().take_while(|c| **c == '*').count()
}

fn find_closing(chars: &[char], from: usize, width: usize) -> Option<usize> {
    let mut j = from;
    while j < chars.len() {
        if chars[j] == '*' {
            let run = delimiter_width(chars, j);
            if run == width {
                return Some(j);
            }
            j += run;
        } else {
            j += 1;
        }
    }
    None
}

fn push_run(runs: &mut Vec<Run>, literal: &mut String, emphasis: Emphasis) {
    if !literal.is_empty() {
        runs.push(Run::new(std::mem::take(literal), emphasis));
    }
}

fn merge_runs(runs: Vec<Run>) -> Vec<Run> {
    let mut merged: Vec<Run> = Vec::with_capacity(runs.len());
    for run in runs.into_iter().filter(|r| !r.text.is_empty()) {
        match merged.last_mut() {
            Some(last) if last.emphasis == run.emphasis => last.text.push_str(&run.text),
            _ => merged.push(run),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bold(text: &str) -> Run {
        Run::new(text, Emphasis::Bold)
    }

    fn italic(text: &str) -> Run {
        Run::new(text, Emphasis::Italic)
    }

    #[test]
    fn bold_and_italic_runs() {
        assert_eq!(
            parse_inline("**Hello** *world*"),
            vec![bold("Hello"), Run::plain(" "), italic("world")]
        );
    }

    #[test]
    fn triple_asterisks_are_bold_italic() {
        assert_eq!(
            parse_inline("a ***b*** c"),
            vec![
                Run::plain("a "),
                Run::new("b", Emphasis::BoldItalic),
                Run::plain(" c")
            ]
        );
    }

    #[test]
    fn lone_asterisk_never_closes_inside_bold() {
        assert_eq!(
            parse_inline("**a *b* c**"),
            vec![bold("a "), Run::new("b", Emphasis::BoldItalic), bold(" c")]
        );
        assert_eq!(
            parse_inline("*x **y** z*"),
            vec![italic("x "), Run::new("y", Emphasis::BoldItalic), italic(" z")]
        );
    }

    #[test]
    fn unmatched_delimiters_stay_literal() {
        assert_eq!(parse_inline("5 * 3"), vec![Run::plain("5 * 3")]);
        assert_eq!(parse_inline("**open"), vec![Run::plain("**open")]);
        assert_eq!(parse_inline("****"), vec![Run::plain("****")]);
        assert_eq!(parse_inline("*a **b*"), vec![italic("a **b")]);
    }

    #[test]
    fn line_blocks() {
        let doc = parse("# Title\n## Sub\n### Small\n#### not a heading\n- item\n\nbody");
        assert_eq!(
            doc.blocks,
            vec![
                Block::Heading { level: 1, runs: vec![Run::plain("Title")] },
                Block::Heading { level: 2, runs: vec![Run::plain("Sub")] },
                Block::Heading { level: 3, runs: vec![Run::plain("Small")] },
                Block::Paragraph(vec![Run::plain("#### not a heading")]),
                Block::ListItem(vec![Run::plain("item")]),
                Block::Blank,
                Block::Paragraph(vec![Run::plain("body")]),
            ]
        );
    }

    #[test]
    fn headings_keep_inline_emphasis() {
        let doc = parse("## The **cell** cycle\r");
        assert_eq!(
            doc.blocks,
            vec![Block::Heading {
                level: 2,
                runs: vec![Run::plain("The "), bold("cell"), Run::plain(" cycle")]
            }]
        );
    }

    #[test]
    fn markers_need_a_space() {
        let doc = parse("#hashtag\n-5 degrees");
        assert!(matches!(doc.blocks[0], Block::Paragraph(_)));
        assert!(matches!(doc.blocks[1], Block::Paragraph(_)));
    }
}
