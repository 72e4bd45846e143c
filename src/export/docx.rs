// Minimal WordprocessingML package: one body of paragraphs, heading styles
// 1-3, and 12pt runs that carry bold/italic.

use std::io::{Cursor, Write};

use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::errors::CliError;
use crate::format::{ExportBlock, Run};

// Half-points, so 24 is 12pt.
const BODY_SIZE: u32 = 24;
const HEADING_SIZES: [u32; 3] = [36, 32, 28];

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const DOCUMENT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

pub fn build_docx(blocks: &[ExportBlock]) -> Result<Vec<u8>, CliError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let parts = [
        ("[Content_Types].xml", CONTENT_TYPES.to_string()),
        ("_rels/.rels", PACKAGE_RELS.to_string()),
        ("word/_rels/document.xml.rels", DOCUMENT_RELS.to_string()),
        ("word/styles.xml", styles_xml()),
        ("word/document.xml", document_xml(blocks)),
    ];
    for (name, body) in parts {
        zip.start_file(name, options)?;
        zip.write_all(body.as_bytes())?;
    }

    Ok(zip.finish()?.into_inner())
}

fn document_xml(blocks: &[ExportBlock]) -> String {
    let mut body = String::new();
    for block in blocks {
        match block {
            ExportBlock::Heading { level, text } => {
                body.push_str(&format!(
                    r#"<w:p><w:pPr><w:pStyle w:val="Heading{level}"/></w:pPr><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
                    escape_xml(text)
                ));
            }
            ExportBlock::Paragraph(runs) => {
                body.push_str("<w:p>");
                for run in runs {
                    body.push_str(&run_xml(run));
                }
                body.push_str("</w:p>");
            }
        }
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="{W_NS}"><w:body>{body}<w:sectPr/></w:body></w:document>"#
    )
}

fn run_xml(run: &Run) -> String {
    let mut props = String::new();
    if run.emphasis.is_bold() {
        props.push_str("<w:b/>");
    }
    if run.emphasis.is_italic() {
        props.push_str("<w:i/>");
    }
    props.push_str(&format!(r#"<w:sz w:val="{BODY_SIZE}"/>"#));
    format!(
        r#"<w:r><w:rPr>{props}</w:rPr><w:t xml:space="preserve">{}</w:t></w:r>"#,
        escape_xml(&run.text)
    )
}

fn styles_xml() -> String {
    let mut styles = String::new();
    for (idx, size) in HEADING_SIZES.iter().enumerate() {
        let level = idx + 1;
        styles.push_str(&format!(
            r#"<w:style w:type="paragraph" w:styleId="Heading{level}"><w:name w:val="heading {level}"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:keepNext/><w:spacing w:before="240" w:after="120"/><w:outlineLvl w:val="{idx}"/></w:pPr><w:rPr><w:b/><w:sz w:val="{size}"/></w:rPr></w:style>"#
        ));
    }
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="{W_NS}"><w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:rPr><w:sz w:val="{BODY_SIZE}"/></w:rPr></w:style>{styles}</w:styles>"#
    )
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    use zip::ZipArchive;

    use crate::format::{self, export_blocks};

    fn read_part(bytes: &[u8], name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut part = archive.by_name(name).unwrap();
        let mut text = String::new();
        part.read_to_string(&mut text).unwrap();
        text
    }

    #[test]
    fn package_has_the_required_parts() {
        let bytes = build_docx(&[]).unwrap();
        let archive = ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        let mut names: Vec<&str> = archive.file_names().collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "[Content_Types].xml",
                "_rels/.rels",
                "word/_rels/document.xml.rels",
                "word/document.xml",
                "word/styles.xml",
            ]
        );
    }

    #[test]
    fn headings_and_runs_become_paragraphs() {
        let blocks = export_blocks(&format::parse("## Key Ideas\n**Bold** and *soft* <tags>\n- item"));
        let document = read_part(&build_docx(&blocks).unwrap(), "word/document.xml");

        assert!(document.contains(r#"<w:pStyle w:val="Heading2"/></w:pPr><w:r><w:t xml:space="preserve">Key Ideas</w:t>"#));
        assert!(document.contains(r#"<w:rPr><w:b/><w:sz w:val="24"/></w:rPr><w:t xml:space="preserve">Bold</w:t>"#));
        assert!(document.contains(r#"<w:rPr><w:i/><w:sz w:val="24"/></w:rPr><w:t xml:space="preserve">soft</w:t>"#));
        assert!(document.contains("&lt;tags&gt;"));
        assert!(document.contains("• "));
        assert_eq!(document.matches("<w:p>").count(), 3);
    }

    #[test]
    fn styles_define_three_heading_levels() {
        let styles = read_part(&build_docx(&[]).unwrap(), "word/styles.xml");
        for level in 1..=3 {
            assert!(styles.contains(&format!(r#"w:styleId="Heading{level}""#)));
        }
    }
}
