use log::{debug, warn};
use printpdf::{
    BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
};
use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};

use crate::report::render::markdown_options;
use crate::report::RenderError;

const PAGE_W: f32 = 210.0;
const PAGE_H: f32 = 297.0;
const MARGIN: f32 = 10.0;
const PT_TO_MM: f32 = 0.3528;

/// A block of laid-out text. Raw HTML in the markdown never becomes a block.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading(u8, String),
    Paragraph(String),
    Item(usize, String),
    Code(Vec<String>),
    Quote(String),
    Row(Vec<String>),
    Rule,
}

/// Flatten markdown into printable blocks.
pub fn blocks(markdown: &str) -> Vec<Block> {
    let mut out = Vec::new();
    let mut text = String::new();
    let mut list_depth = 0usize;
    let mut in_quote = false;
    let mut in_code = false;
    let mut row: Vec<String> = Vec::new();

    for event in Parser::new_ext(markdown, markdown_options()) {
        match event {
            Event::Start(Tag::List(_)) => {
                flush_item(&mut out, &mut text, list_depth);
                list_depth += 1;
            }
            Event::End(TagEnd::List(_)) => list_depth = list_depth.saturating_sub(1),
            Event::Start(Tag::BlockQuote { .. }) => in_quote = true,
            Event::End(TagEnd::BlockQuote { .. }) => in_quote = false,
            Event::Start(Tag::CodeBlock(_)) => in_code = true,
            Event::End(TagEnd::TableCell) => {
                row.push(std::mem::take(&mut text).trim().to_string());
            }
            Event::End(TagEnd::TableHead) | Event::End(TagEnd::TableRow) => {
                out.push(Block::Row(std::mem::take(&mut row)));
            }
            Event::Start(Tag::Item) => flush_item(&mut out, &mut text, list_depth),
            Event::End(TagEnd::Item) => flush_item(&mut out, &mut text, list_depth),
            Event::End(TagEnd::Heading(level)) => {
                out.push(Block::Heading(heading_rank(level), take_trimmed(&mut text)));
            }
            Event::End(TagEnd::CodeBlock) => {
                in_code = false;
                let code = std::mem::take(&mut text);
                out.push(Block::Code(code.lines().map(str::to_string).collect()));
            }
            Event::End(TagEnd::Paragraph) => {
                if list_depth > 0 {
                    text.push(' ');
                } else if !text.trim().is_empty() {
                    let t = take_trimmed(&mut text);
                    out.push(if in_quote { Block::Quote(t) } else { Block::Paragraph(t) });
                }
            }
            Event::Text(t) | Event::Code(t) => text.push_str(&t),
            Event::SoftBreak | Event::HardBreak => {
                text.push(if in_code { '\n' } else { ' ' });
            }
            Event::TaskListMarker(done) => text.push_str(if done { "[x] " } else { "[ ] " }),
            Event::Rule => out.push(Block::Rule),
            _ => {}
        }
    }
    if !text.trim().is_empty() {
        out.push(Block::Paragraph(take_trimmed(&mut text)));
    }
    out
}

fn heading_rank(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn take_trimmed(text: &mut String) -> String {
    std::mem::take(text).trim().to_string()
}

fn flush_item(out: &mut Vec<Block>, text: &mut String, depth: usize) {
    if !text.trim().is_empty() {
        out.push(Block::Item(depth.max(1), take_trimmed(text)));
    }
}

/// Greedy word wrap at `width` characters. Words longer than a line are split.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut line = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            let rest = word.split_off(width);
            lines.push(word.into_iter().collect());
            word = rest;
        }
        let len = line.chars().count();
        if len > 0 && len + 1 + word.len() > width {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.extend(word);
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// Builtin PDF fonts only cover WinAnsi; fold common typography to ASCII.
pub fn pdf_safe(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{2010}'..='\u{2015}' | '\u{2212}' => '-',
            '\u{2018}' | '\u{2019}' => '\'',
            '\u{201C}' | '\u{201D}' => '"',
            '\u{2022}' => '*',
            '\u{00A0}' => ' ',
            c if (c as u32) < 0x100 => c,
            _ => '?',
        })
        .collect()
}

pub struct PdfOutput {
    pub bytes: Vec<u8>,
    pub pages: usize,
    pub backend: &'static str,
}

pub trait PdfBackend {
    fn name(&self) -> &'static str;
    fn render(&self, title: &str, markdown: &str) -> Result<PdfOutput, RenderError>;
}

fn pdf_err(backend: &'static str) -> impl Fn(printpdf::Error) -> RenderError {
    move |e| RenderError::Pdf {
        backend,
        message: format!("{e:?}"),
    }
}

struct Pages {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    y: f32,
    pages: usize,
}

impl Pages {
    fn new(title: &str) -> Self {
        let (doc, page, layer) = PdfDocument::new(title, Mm(PAGE_W), Mm(PAGE_H), "Page 1");
        let layer = doc.get_page(page).get_layer(layer);
        Pages {
            doc,
            layer,
            y: PAGE_H - MARGIN,
            pages: 1,
        }
    }

    fn ensure(&mut self, height: f32) {
        if self.y - height < MARGIN {
            self.pages += 1;
            let (page, layer) =
                self.doc
                    .add_page(Mm(PAGE_W), Mm(PAGE_H), format!("Page {}", self.pages));
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = PAGE_H - MARGIN;
        }
    }

    fn line(&mut self, text: &str, size: f32, indent: f32, font: &IndirectFontRef) {
        let height = size * PT_TO_MM * 1.4;
        self.ensure(height);
        self.y -= height;
        self.layer
            .use_text(pdf_safe(text), size, Mm(MARGIN + indent), Mm(self.y), font);
    }

    fn gap(&mut self, mm: f32) {
        self.y -= mm;
    }

    fn finish(self, backend: &'static str) -> Result<PdfOutput, RenderError> {
        let pages = self.pages;
        let bytes = self.doc.save_to_bytes().map_err(pdf_err(backend))?;
        Ok(PdfOutput {
            bytes,
            pages,
            backend,
        })
    }
}

/// Characters per line for a proportional font, assuming half-em glyphs.
fn columns(size: f32, indent: f32) -> usize {
    let usable = PAGE_W - 2.0 * MARGIN - indent;
    (usable / (size * PT_TO_MM * 0.5)) as usize
}

/// A4 layout with headings, lists, quotes, code and tables.
pub struct LayoutPdf;

impl PdfBackend for LayoutPdf {
    fn name(&self) -> &'static str {
        "layout"
    }

    fn render(&self, title: &str, markdown: &str) -> Result<PdfOutput, RenderError> {
        let name = self.name();
        let mut pages = Pages::new(title);
        let regular = pages
            .doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(pdf_err(name))?;
        let bold = pages
            .doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(pdf_err(name))?;
        let italic = pages
            .doc
            .add_builtin_font(BuiltinFont::HelveticaOblique)
            .map_err(pdf_err(name))?;
        let mono = pages
            .doc
            .add_builtin_font(BuiltinFont::Courier)
            .map_err(pdf_err(name))?;

        let body = 10.5;
        for block in blocks(markdown) {
            match block {
                Block::Heading(rank, text) => {
                    let size = match rank {
                        1 => 18.0,
                        2 => 15.0,
                        3 => 13.0,
                        _ => 11.5,
                    };
                    pages.gap(size * PT_TO_MM * 0.6);
                    for l in wrap(&text, columns(size, 0.0)) {
                        pages.line(&l, size, 0.0, &bold);
                    }
                    pages.gap(1.5);
                }
                Block::Paragraph(text) => {
                    for l in wrap(&text, columns(body, 0.0)) {
                        pages.line(&l, body, 0.0, &regular);
                    }
                    pages.gap(2.0);
                }
                Block::Item(depth, text) => {
                    let indent = 5.0 * depth as f32;
                    for (i, l) in wrap(&text, columns(body, indent + 4.0)).iter().enumerate() {
                        if i == 0 {
                            pages.line(&format!("- {l}"), body, indent, &regular);
                        } else {
                            pages.line(l, body, indent + 4.0, &regular);
                        }
                    }
                }
                Block::Quote(text) => {
                    for l in wrap(&text, columns(body, 6.0)) {
                        pages.line(&l, body, 6.0, &italic);
                    }
                    pages.gap(2.0);
                }
                Block::Code(lines) => {
                    let size = 9.0;
                    let cols = ((PAGE_W - 2.0 * MARGIN - 4.0) / (size * PT_TO_MM * 0.6)) as usize;
                    for raw in &lines {
                        for l in wrap_preserving(raw, cols) {
                            pages.line(&l, size, 4.0, &mono);
                        }
                    }
                    pages.gap(2.0);
                }
                Block::Row(cells) => {
                    let joined = cells.join("  |  ");
                    for l in wrap(&joined, columns(body, 0.0)) {
                        pages.line(&l, body, 0.0, &regular);
                    }
                }
                Block::Rule => {
                    pages.line(&"-".repeat(60), body, 0.0, &regular);
                }
            }
        }
        debug!("layout pdf: {} page(s)", pages.pages);
        pages.finish(name)
    }
}

fn wrap_preserving(line: &str, width: usize) -> Vec<String> {
    let chars: Vec<char> = line.chars().collect();
    if chars.is_empty() {
        return vec![String::new()];
    }
    chars
        .chunks(width.max(1))
        .map(|c| c.iter().collect())
        .collect()
}

/// Plain monospace text, one block after another.
pub struct PlainTextPdf;

impl PdfBackend for PlainTextPdf {
    fn name(&self) -> &'static str {
        "plain"
    }

    fn render(&self, title: &str, markdown: &str) -> Result<PdfOutput, RenderError> {
        let name = self.name();
        let mut pages = Pages::new(title);
        let font = pages
            .doc
            .add_builtin_font(BuiltinFont::Courier)
            .map_err(pdf_err(name))?;
        let size = 10.0;
        let cols = ((PAGE_W - 2.0 * MARGIN) / (size * PT_TO_MM * 0.6)) as usize;

        for raw in markdown.lines() {
            if raw.trim().is_empty() {
                pages.gap(size * PT_TO_MM);
                continue;
            }
            for l in wrap(raw, cols) {
                pages.line(&l, size, 0.0, &font);
            }
        }
        pages.finish(name)
    }
}

/// Tries each backend in order until one produces a document.
pub struct PdfExporter {
    backends: Vec<Box<dyn PdfBackend>>,
}

impl Default for PdfExporter {
    fn default() -> Self {
        PdfExporter::new(vec![Box::new(LayoutPdf), Box::new(PlainTextPdf)])
    }
}

impl PdfExporter {
    pub fn new(backends: Vec<Box<dyn PdfBackend>>) -> Self {
        PdfExporter { backends }
    }

    pub fn export(&self, title: &str, markdown: &str) -> Result<PdfOutput, RenderError> {
        let mut failures = Vec::new();
        for backend in &self.backends {
            match backend.render(title, markdown) {
                Ok(out) => return Ok(out),
                Err(e) => {
                    warn!("{} pdf backend failed: {e}", backend.name());
                    failures.push(e.to_string());
                }
            }
        }
        Err(RenderError::Export(failures.join("; ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Broken;

    impl PdfBackend for Broken {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn render(&self, _: &str, _: &str) -> Result<PdfOutput, RenderError> {
            Err(RenderError::Pdf {
                backend: "broken",
                message: "canvas unavailable".to_string(),
            })
        }
    }

    #[test]
    fn test_blocks_from_markdown() {
        let md = "# Title\n\nSome *text* here.\n\n- one\n- two\n  - nested\n\n> quoted\n\n<div>raw</div>\n\n| a | b |\n|---|---|\n| 1 | 2 |\n\n---\n";
        let b = blocks(md);
        assert_eq!(b[0], Block::Heading(1, "Title".to_string()));
        assert_eq!(b[1], Block::Paragraph("Some text here.".to_string()));
        assert_eq!(b[2], Block::Item(1, "one".to_string()));
        assert_eq!(b[3], Block::Item(1, "two".to_string()));
        assert_eq!(b[4], Block::Item(2, "nested".to_string()));
        assert_eq!(b[5], Block::Quote("quoted".to_string()));
        assert_eq!(b[6], Block::Row(vec!["a".to_string(), "b".to_string()]));
        assert_eq!(b[7], Block::Row(vec!["1".to_string(), "2".to_string()]));
        assert_eq!(b[8], Block::Rule);
        assert_eq!(b.len(), 9);
    }

    #[test]
    fn test_wrap() {
        assert_eq!(wrap("aa bb cc", 5), vec!["aa bb", "cc"]);
        assert_eq!(wrap("abcdefgh", 3), vec!["abc", "def", "gh"]);
        assert!(wrap("   ", 10).is_empty());
    }

    #[test]
    fn test_pdf_safe_folds_typography() {
        assert_eq!(pdf_safe("Post\u{2011}Deployment \u{201C}x\u{201D} \u{2014} 日"), "Post-Deployment \"x\" - ?");
    }

    #[test]
    fn test_layout_paginates() {
        let md = "Lorem ipsum dolor sit amet.\n\n".repeat(200);
        let out = LayoutPdf.render("Report", &md).unwrap();
        assert!(out.bytes.starts_with(b"%PDF"));
        assert!(out.pages > 1);
        assert_eq!(out.backend, "layout");
    }

    #[test]
    fn test_falls_back_to_plain() {
        let exporter = PdfExporter::new(vec![Box::new(Broken), Box::new(PlainTextPdf)]);
        let out = exporter.export("Report", "# Hello\n\nworld").unwrap();
        assert_eq!(out.backend, "plain");
        assert!(out.bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_all_backends_failing_is_an_error() {
        let exporter = PdfExporter::new(vec![Box::new(Broken)]);
        let err = exporter.export("Report", "x").err().unwrap();
        assert!(err.to_string().contains("canvas unavailable"));
    }
}
