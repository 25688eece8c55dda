//! Report presentation: rendering, scoring and export of generated markdown.

pub mod completeness;
pub mod pdf;
pub mod render;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use log::{info, warn};
use regex::Regex;
use thiserror::Error;

use crate::client::{ClientError, Citation, GeneratedReport, Usage};
pub use completeness::{Completeness, SectionScore, SECTION_TITLES};
pub use pdf::{LayoutPdf, PdfBackend, PdfExporter, PdfOutput, PlainTextPdf};
pub use render::{html_document, render_markdown};

pub const DEFAULT_FILE_STEM: &str = "ai-compliance-report";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("{backend} backend: {message}")]
    Pdf {
        backend: &'static str,
        message: String,
    },

    #[error("PDF export failed: {0}")]
    Export(String),

    #[error("failed to write {path}: {message}")]
    Write { path: PathBuf, message: String },
}

/// File stem for a report export. Every whitespace run, leading and
/// trailing included, becomes a single `-`.
pub fn file_stem(system_name: &str) -> String {
    if system_name.is_empty() {
        return DEFAULT_FILE_STEM.to_string();
    }
    whitespace_runs().replace_all(system_name, "-").into_owned()
}

fn whitespace_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace pattern"))
}

/// File stem for an outcome's documentation export.
pub fn documentation_file_stem(outcome_id: &str) -> String {
    format!("{outcome_id}_compliance_documentation")
}

/// Markdown for a cited-sources section, empty when there are no sources.
pub fn sources_markdown(sources: &[Citation]) -> String {
    if sources.is_empty() {
        return String::new();
    }
    let mut md = String::from("## Sources\n\n");
    for s in sources {
        md.push_str(&format!("**[{}] {} \u{2014} {}**\n\n", s.key, s.title, s.source));
        if !s.excerpt.trim().is_empty() {
            for line in s.excerpt.lines() {
                md.push_str(&format!("> {line}\n"));
            }
            md.push('\n');
        }
    }
    md
}

/// `Tokens: 1234 · Cost: $0.037`, or nothing if the backend sent no usage.
pub fn token_info(usage: Option<&Usage>) -> Option<String> {
    let usage = usage?;
    let total = usage.total_tokens?;
    let cost = usage.cost().unwrap_or_default();
    Some(format!("Tokens: {total} \u{00B7} Cost: ${cost}"))
}

/// What the result screen currently shows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportView {
    pub report: Option<GeneratedReport>,
    pub completeness: Option<Completeness>,
    pub error: Option<String>,
}

impl ReportView {
    /// Fold a generation result into the view. A failure keeps whatever
    /// report was showing and only sets the error line.
    pub fn apply(&mut self, result: Result<GeneratedReport, ClientError>) {
        match result {
            Ok(report) => {
                info!(
                    "report received: {} chars, {} source(s)",
                    report.report.len(),
                    report.sources.len()
                );
                self.completeness = Some(completeness::compute(&report.report));
                self.report = Some(report);
                self.error = None;
            }
            Err(e) => {
                warn!("report generation failed: {e}");
                self.error = Some(generation_error(&e));
            }
        }
    }

    pub fn token_info(&self) -> Option<String> {
        token_info(self.report.as_ref()?.usage.as_ref())
    }

    /// Report body followed by its sources.
    pub fn full_markdown(&self) -> Option<String> {
        let r = self.report.as_ref()?;
        let sources = sources_markdown(&r.sources);
        if sources.is_empty() {
            Some(r.report.clone())
        } else {
            Some(format!("{}\n\n{sources}", r.report.trim_end()))
        }
    }

    pub fn html(&self) -> Option<String> {
        self.full_markdown().map(|md| render_markdown(&md))
    }
}

pub fn generation_error(e: &ClientError) -> String {
    match e {
        ClientError::Status { status, message } => {
            format!("Failed to generate report (HTTP {status}): {message}")
        }
        other => format!("Failed to generate report: {other}"),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Exported {
    pub pdf: PathBuf,
    pub html: PathBuf,
    pub backend: &'static str,
    pub pages: usize,
}

/// Write `<stem>.pdf` and `<stem>.html` into `dir`. Nothing is written when
/// every PDF backend fails.
pub fn export(
    exporter: &PdfExporter,
    dir: &Path,
    stem: &str,
    title: &str,
    markdown: &str,
) -> Result<Exported, RenderError> {
    let out = exporter.export(title, markdown)?;

    let pdf = dir.join(format!("{stem}.pdf"));
    let html = dir.join(format!("{stem}.html"));
    write(&pdf, &out.bytes)?;
    write(&html, html_document(title, &render_markdown(markdown)).as_bytes())?;
    info!(
        "exported {} ({} page(s), {} backend)",
        pdf.display(),
        out.pages,
        out.backend
    );

    Ok(Exported {
        pdf,
        html,
        backend: out.backend,
        pages: out.pages,
    })
}

fn write(path: &Path, bytes: &[u8]) -> Result<(), RenderError> {
    fs::write(path, bytes).map_err(|e| RenderError::Write {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> GeneratedReport {
        GeneratedReport {
            report: "# Report\n\n## 2. Impact Assessment\n| a | b |\n".to_string(),
            sources: vec![Citation {
                key: "S1".to_string(),
                title: "SB 24-205".to_string(),
                source: "Colorado General Assembly".to_string(),
                excerpt: "Developers must use reasonable care.".to_string(),
            }],
            project_id: Some(7),
            usage: Some(Usage {
                prompt_tokens: Some(1000),
                completion_tokens: Some(234),
                total_tokens: Some(1234),
            }),
        }
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("Credit  Scoring\tModel"), "Credit-Scoring-Model");
        assert_eq!(file_stem(""), DEFAULT_FILE_STEM);
        assert_eq!(file_stem(" Credit Model "), "-Credit-Model-");
        assert_eq!(file_stem("   "), "-");
        assert_eq!(
            documentation_file_stem("outcome7"),
            "outcome7_compliance_documentation"
        );
    }

    #[test]
    fn test_sources_markdown() {
        let md = sources_markdown(&sample().sources);
        assert!(md.starts_with("## Sources"));
        assert!(md.contains("**[S1] SB 24-205 \u{2014} Colorado General Assembly**"));
        assert!(md.contains("> Developers must use reasonable care."));
        assert!(sources_markdown(&[]).is_empty());
    }

    #[test]
    fn test_failure_keeps_prior_report() {
        let mut view = ReportView::default();
        view.apply(Ok(sample()));
        assert_eq!(view.completeness.as_ref().unwrap().complete, 1);
        assert_eq!(view.token_info().unwrap(), "Tokens: 1234 \u{00B7} Cost: $0.037");

        view.apply(Err(ClientError::Status {
            status: 500,
            message: "LLM backend down".to_string(),
        }));
        assert_eq!(view.report, Some(sample()));
        assert_eq!(
            view.error.as_deref(),
            Some("Failed to generate report (HTTP 500): LLM backend down")
        );

        view.apply(Ok(sample()));
        assert!(view.error.is_none());
    }

    #[test]
    fn test_export_writes_pdf_and_html() {
        let dir = tempfile::tempdir().unwrap();
        let view = ReportView {
            report: Some(sample()),
            ..Default::default()
        };
        let md = view.full_markdown().unwrap();
        let out = export(&PdfExporter::default(), dir.path(), "Credit-Model", "Credit Model", &md)
            .unwrap();
        assert_eq!(out.backend, "layout");
        assert!(fs::read(&out.pdf).unwrap().starts_with(b"%PDF"));
        let html = fs::read_to_string(&out.html).unwrap();
        assert!(html.contains("<h2>Sources</h2>"));
    }

    #[test]
    fn test_failed_export_writes_nothing() {
        struct Down;
        impl PdfBackend for Down {
            fn name(&self) -> &'static str {
                "down"
            }
            fn render(&self, _: &str, _: &str) -> Result<PdfOutput, RenderError> {
                Err(RenderError::Pdf {
                    backend: "down",
                    message: "no fonts".to_string(),
                })
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let exporter = PdfExporter::new(vec![Box::new(Down)]);
        let err = export(&exporter, dir.path(), "x", "x", "# x").unwrap_err();
        assert!(matches!(err, RenderError::Export(_)));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
