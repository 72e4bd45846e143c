use crossterm::style::Stylize;

use super::{Block, Document, Emphasis, Run, parse};

pub const BULLET: &str = "• ";

/// Blocks handed to the `.docx` and `.pdf` writers. Blank lines are gone and
/// list items are paragraphs that start with a bullet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportBlock {
    Heading { level: u8, text: String },
    Paragraph(Vec<Run>),
}

/// HTML fragment: `<b>`, `<i>`, `<h1>`..`<h3>`, bullets, `<br/>` between lines.
pub fn to_html(doc: &Document) -> String {
    doc.blocks
        .iter()
        .map(|block| match block {
            Block::Heading { level, runs } => format!("<h{level}>{}</h{level}>", runs_html(runs)),
            Block::ListItem(runs) => format!("{BULLET}{}", runs_html(runs)),
            Block::Paragraph(runs) => runs_html(runs),
            Block::Blank => String::new(),
        })
        .collect::<Vec<_>>()
        .join("<br/>")
}

/// Markup stripped; the bullet glyph and line structure survive.
///
/// Stripping can uncover a marker of its own (`**#** Intro` leaves `# Intro`),
/// so the result is read again until it stops changing. A pass that changes
/// the text always drops a `*`, a `#` or a leading `-`.
pub fn to_plain(doc: &Document) -> String {
    let mut text = strip_pass(doc);
    loop {
        let next = strip_pass(&parse(&text));
        if next == text {
            return text;
        }
        text = next;
    }
}

fn strip_pass(doc: &Document) -> String {
    doc.blocks
        .iter()
        .map(|block| match block {
            Block::Heading { runs, .. } | Block::Paragraph(runs) => runs_text(runs),
            Block::ListItem(runs) => format!("{BULLET}{}", runs_text(runs)),
            Block::Blank => String::new(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// ANSI-styled text for a terminal.
pub fn to_terminal(doc: &Document) -> String {
    doc.blocks
        .iter()
        .map(|block| match block {
            Block::Heading { level, runs } => {
                let text = runs_text(runs);
                match level {
                    1 => text.bold().underlined().cyan().to_string(),
                    _ => text.bold().cyan().to_string(),
                }
            }
            Block::ListItem(runs) => format!("{BULLET}{}", runs_terminal(runs)),
            Block::Paragraph(runs) => runs_terminal(runs),
            Block::Blank => String::new(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn export_blocks(doc: &Document) -> Vec<ExportBlock> {
    doc.blocks
        .iter()
        .filter_map(|block| match block {
            Block::Heading { level, runs } => Some(ExportBlock::Heading {
                level: *level,
                text: runs_text(runs),
            }),
            Block::ListItem(runs) => {
                let mut with_bullet = Vec::with_capacity(runs.len() + 1);
                with_bullet.push(Run::plain(BULLET));
                with_bullet.extend(runs.iter().cloned());
                Some(ExportBlock::Paragraph(with_bullet))
            }
            Block::Paragraph(runs) if !runs_text(runs).trim().is_empty() => {
                Some(ExportBlock::Paragraph(runs.clone()))
            }
            _ => None,
        })
        .collect()
}

fn runs_text(runs: &[Run]) -> String {
    runs.iter().map(|r| r.text.as_str()).collect()
}

fn runs_html(runs: &[Run]) -> String {
    runs.iter()
        .map(|run| {
            let text = escape_html(&run.text);
            match run.emphasis {
                Emphasis::Plain => text,
                Emphasis::Bold => format!("<b>{text}</b>"),
                Emphasis::Italic => format!("<i>{text}</i>"),
                Emphasis::BoldItalic => format!("<b><i>{text}</i></b>"),
            }
        })
        .collect()
}

fn runs_terminal(runs: &[Run]) -> String {
    runs.iter()
        .map(|run| {
            let text = run.text.as_str();
            match run.emphasis {
                Emphasis::Plain => text.to_string(),
                Emphasis::Bold => text.bold().to_string(),
                Emphasis::Italic => text.italic().to_string(),
                Emphasis::BoldItalic => text.bold().italic().to_string(),
            }
        })
        .collect()
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
