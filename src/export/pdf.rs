//! A small PDF 1.4 writer for exported answers.
//!
//! Layout works in millimetres from the top of an A4 page: the cursor starts
//! at 20 mm, text sits at a 10 mm margin, body lines advance 7 mm and
//! headings 12 mm (times 1.5 after the heading). A new page starts whenever
//! the cursor would pass 280 mm. Only the built-in Helvetica faces are used,
//! so line wrapping estimates glyph widths instead of measuring them.

use std::fmt::Write as _;

use crate::format::{Emphasis, ExportBlock, Run};

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const TOP_MM: f32 = 20.0;
const MARGIN_MM: f32 = 10.0;
const NORMAL_LINE_MM: f32 = 7.0;
const HEADING_LINE_MM: f32 = 12.0;
const PARAGRAPH_GAP_MM: f32 = 3.0;
const PAGE_LIMIT_MM: f32 = 280.0;
const BODY_SIZE: f32 = 12.0;
// Average Helvetica advance as a fraction of the font size.
const AVG_GLYPH_EM: f32 = 0.5;
const PT_PER_MM: f32 = 72.0 / 25.4;

const CREATOR: &str = "IntelliStudy";

#[derive(Debug, Clone, Copy)]
pub struct PdfInfo<'a> {
    pub title: &'a str,
    pub subject: &'a str,
}

/// The four Helvetica faces, registered as `/F1`..`/F4` on every page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Face {
    Regular,
    Bold,
    Oblique,
    BoldOblique,
}

impl Face {
    const ALL: [Face; 4] = [Face::Regular, Face::Bold, Face::Oblique, Face::BoldOblique];

    fn resource(self) -> &'static str {
        match self {
            Face::Regular => "F1",
            Face::Bold => "F2",
            Face::Oblique => "F3",
            Face::BoldOblique => "F4",
        }
    }

    fn base_font(self) -> &'static str {
        match self {
            Face::Regular => "Helvetica",
            Face::Bold => "Helvetica-Bold",
            Face::Oblique => "Helvetica-Oblique",
            Face::BoldOblique => "Helvetica-BoldOblique",
        }
    }
}

impl From<Emphasis> for Face {
    fn from(emphasis: Emphasis) -> Self {
        match emphasis {
            Emphasis::Plain => Face::Regular,
            Emphasis::Bold => Face::Bold,
            Emphasis::Italic => Face::Oblique,
            Emphasis::BoldItalic => Face::BoldOblique,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Span {
    face: Face,
    text: String,
}

#[derive(Debug, Clone, PartialEq)]
struct PlacedLine {
    y_mm: f32,
    size: f32,
    spans: Vec<Span>,
}

type Page = Vec<PlacedLine>;

pub fn build_pdf(blocks: &[ExportBlock], info: &PdfInfo<'_>) -> Vec<u8> {
    write_document(&layout(blocks), info)
}

fn heading_size(level: u8) -> f32 {
    match level {
        1 => 18.0,
        2 => 16.0,
        _ => 14.0,
    }
}

fn layout(blocks: &[ExportBlock]) -> Vec<Page> {
    let mut pages: Vec<Page> = vec![Vec::new()];
    let mut y = TOP_MM;
    let text_width = PAGE_WIDTH_MM - MARGIN_MM * 2.0;

    let new_page = |pages: &mut Vec<Page>, y: &mut f32| {
        if pages.last().is_some_and(|p| !p.is_empty()) {
            pages.push(Vec::new());
        }
        *y = TOP_MM;
    };

    for (idx, block) in blocks.iter().enumerate() {
        let last_block = idx + 1 == blocks.len();
        match block {
            ExportBlock::Heading { level, text } => {
                let size = heading_size(*level);
                let lines = wrap(&[Run::new(text.as_str(), Emphasis::Bold)], text_width, size);
                if y + lines.len() as f32 * HEADING_LINE_MM > PAGE_LIMIT_MM {
                    new_page(&mut pages, &mut y);
                }
                let line_count = lines.len();
                for (line_idx, spans) in lines.into_iter().enumerate() {
                    push_line(&mut pages, y, size, spans);
                    y += if line_idx + 1 == line_count {
                        HEADING_LINE_MM * 1.5
                    } else {
                        HEADING_LINE_MM
                    };
                }
            }
            ExportBlock::Paragraph(runs) => {
                let lines = wrap(runs, text_width, BODY_SIZE);
                if y + lines.len() as f32 * NORMAL_LINE_MM > PAGE_LIMIT_MM {
                    new_page(&mut pages, &mut y);
                }

                let line_count = lines.len();
                for (line_idx, spans) in lines.into_iter().enumerate() {
                    push_line(&mut pages, y, BODY_SIZE, spans);
                    y += NORMAL_LINE_MM;
                    let more_to_come = line_idx + 1 < line_count || !last_block;
                    if y > PAGE_LIMIT_MM && more_to_come {
                        new_page(&mut pages, &mut y);
                    }
                }
                y += PARAGRAPH_GAP_MM;
            }
        }
    }
    pages
}

fn push_line(pages: &mut [Page], y_mm: f32, size: f32, spans: Vec<Span>) {
    if let Some(page) = pages.last_mut() {
        page.push(PlacedLine { y_mm, size, spans });
    }
}

fn chars_per_line(width_mm: f32, size: f32) -> usize {
    ((width_mm * PT_PER_MM) / (size * AVG_GLYPH_EM)).floor().max(1.0) as usize
}

fn spans_len(spans: &[Span]) -> usize {
    spans.iter().map(|s| s.text.chars().count()).sum()
}

fn push_span(spans: &mut Vec<Span>, face: Face, text: &str) {
    match spans.last_mut() {
        Some(last) if last.face == face => last.text.push_str(text),
        _ => spans.push(Span {
            face,
            text: text.to_string(),
        }),
    }
}

/// Whitespace-separated words; a word keeps every face it is written in.
fn words(runs: &[Run]) -> Vec<Vec<Span>> {
    let mut words = Vec::new();
    let mut current = Vec::new();
    for run in runs {
        let face = Face::from(run.emphasis);
        for (idx, piece) in run.text.split(char::is_whitespace).enumerate() {
            if idx > 0 && !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            if !piece.is_empty() {
                push_span(&mut current, face, piece);
            }
        }
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Cuts `spans` after `at` characters and returns the rest.
fn split_spans(spans: &mut Vec<Span>, at: usize) -> Vec<Span> {
    let mut seen = 0;
    for idx in 0..spans.len() {
        let len = spans[idx].text.chars().count();
        if seen + len > at {
            let text = &mut spans[idx].text;
            let cut = text.char_indices().nth(at - seen).map_or(text.len(), |(b, _)| b);
            let tail_text = text.split_off(cut);
            let face = spans[idx].face;
            let mut tail = spans.split_off(idx + 1);
            tail.insert(0, Span { face, text: tail_text });
            if spans[idx].text.is_empty() {
                spans.remove(idx);
            }
            return tail;
        }
        seen += len;
    }
    Vec::new()
}

/// Greedy word wrap; words wider than a line are cut by characters.
fn wrap(runs: &[Run], width_mm: f32, size: f32) -> Vec<Vec<Span>> {
    let max_chars = chars_per_line(width_mm, size);
    let mut lines = Vec::new();
    let mut line: Vec<Span> = Vec::new();
    let mut line_len = 0;

    for mut word in words(runs) {
        while spans_len(&word) > max_chars {
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
                line_len = 0;
            }
            let rest = split_spans(&mut word, max_chars);
            lines.push(std::mem::replace(&mut word, rest));
        }

        let len = spans_len(&word);
        if line_len > 0 && line_len + 1 + len > max_chars {
            lines.push(std::mem::take(&mut line));
            line_len = 0;
        }
        if line_len > 0 {
            let face = line.last().map_or(Face::Regular, |s| s.face);
            push_span(&mut line, face, " ");
            line_len += 1;
        }
        for span in word {
            push_span(&mut line, span.face, &span.text);
        }
        line_len += len;
    }
    if !line.is_empty() || lines.is_empty() {
        lines.push(line);
    }
    lines
}

fn write_document(pages: &[Page], info: &PdfInfo<'_>) -> Vec<u8> {
    // 1 catalog, 2 page tree, 3-6 fonts, 7 info, then a page and its content
    // stream for every page.
    let page_ids: Vec<usize> = (0..pages.len()).map(|i| 8 + i * 2).collect();
    let kids = page_ids
        .iter()
        .map(|id| format!("{id} 0 R"))
        .collect::<Vec<_>>()
        .join(" ");

    let mut objects: Vec<Vec<u8>> = vec![
        b"<< /Type /Catalog /Pages 2 0 R >>".to_vec(),
        format!("<< /Type /Pages /Kids [{kids}] /Count {} >>", pages.len()).into_bytes(),
    ];
    objects.extend(Face::ALL.iter().map(|face| font_object(face.base_font())));
    objects.push(
        format!(
            "<< /Title ({}) /Subject ({}) /Creator ({CREATOR}) /Author ({CREATOR}) /Producer (intellistudy) >>",
            encode_text(info.title),
            encode_text(info.subject)
        )
        .into_bytes(),
    );

    for (page, page_id) in pages.iter().zip(&page_ids) {
        objects.push(
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] /Resources << /Font << /F1 3 0 R /F2 4 0 R /F3 5 0 R /F4 6 0 R >> >> /Contents {} 0 R >>",
                PAGE_WIDTH_MM * PT_PER_MM,
                PAGE_HEIGHT_MM * PT_PER_MM,
                page_id + 1
            )
            .into_bytes(),
        );
        let content = page_content(page);
        let mut stream = format!("<< /Length {} >>\nstream\n", content.len()).into_bytes();
        stream.extend_from_slice(content.as_bytes());
        stream.extend_from_slice(b"\nendstream");
        objects.push(stream);
    }

    let mut out: Vec<u8> = b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (idx, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n", idx + 1).as_bytes());
        out.extend_from_slice(body);
        out.extend_from_slice(b"\nendobj\n");
    }

    let xref_offset = out.len();
    let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    for offset in offsets {
        let _ = writeln!(xref, "{offset:010} 00000 n ");
    }
    let _ = write!(
        xref,
        "trailer\n<< /Size {} /Root 1 0 R /Info 7 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n",
        objects.len() + 1
    );
    out.extend_from_slice(xref.as_bytes());
    out
}

fn font_object(base: &str) -> Vec<u8> {
    format!("<< /Type /Font /Subtype /Type1 /BaseFont /{base} /Encoding /WinAnsiEncoding >>")
        .into_bytes()
}

fn page_content(page: &Page) -> String {
    let mut content = String::new();
    for line in page {
        let x = MARGIN_MM * PT_PER_MM;
        let y = (PAGE_HEIGHT_MM - line.y_mm) * PT_PER_MM;
        let _ = write!(content, "BT {x:.2} {y:.2} Td");
        for span in &line.spans {
            let _ = write!(
                content,
                " /{} {:.0} Tf ({}) Tj",
                span.face.resource(),
                line.size,
                encode_text(&span.text)
            );
        }
        let _ = writeln!(content, " ET");
    }
    content
}

/// PDF string body in WinAnsi: delimiters escaped, non-ASCII as octal codes,
/// anything the encoding lacks as `?`.
fn encode_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '(' | ')' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            '\t' => out.push(' '),
            ' '..='~' => out.push(c),
            _ => match win_ansi_code(c) {
                Some(code) => {
                    let _ = write!(out, "\\{code:03o}");
                }
                None => out.push('?'),
            },
        }
    }
    out
}

fn win_ansi_code(c: char) -> Option<u8> {
    let code = match c {
        '€' => 0x80,
        '…' => 0x85,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        '™' => 0x99,
        '\u{a0}'..='\u{ff}' => c as u32 as u8,
        _ => return None,
    };
    Some(code)
}
