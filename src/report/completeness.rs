use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

/// Section headings a complete compliance report is expected to contain.
pub const SECTION_TITLES: [&str; 11] = [
    "0. High-Risk Classification Determination",
    "1. General Description & Intended Use",
    "2. Impact Assessment",
    "3. Risk Management Program",
    "4. Data Governance & Sources",
    "5. Human Oversight & Review",
    "6. Testing, Validation & Performance Metrics",
    "7. Consumer Disclosures & Rights",
    "8. Post\u{2011}Deployment Monitoring",
    "9. Documentation & Record\u{2011}Keeping",
    "Action Items (Missing Info)",
];

/// A section counts as substantive past this many characters.
const MIN_CHARS: usize = 160;
const MIN_BULLETS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionScore {
    pub title: &'static str,
    pub present: bool,
    pub good: bool,
    pub bullets: usize,
    pub chars: usize,
    pub has_table: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Completeness {
    pub percent: u32,
    pub complete: usize,
    pub total: usize,
    pub sections: Vec<SectionScore>,
}

struct Patterns {
    headers: Vec<(&'static str, Regex)>,
    next_heading: Regex,
    bullet: Regex,
    whitespace: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        headers: SECTION_TITLES
            .iter()
            .map(|title| {
                let re = Regex::new(&format!(r"(?mi)^##\s*{}\s*$", regex::escape(title)))
                    .expect("escaped title is a valid pattern");
                (*title, re)
            })
            .collect(),
        next_heading: Regex::new(r"(?m)^##\s").expect("valid pattern"),
        bullet: Regex::new(r"(?m)^\s*[-*]\s+").expect("valid pattern"),
        whitespace: Regex::new(r"\s+").expect("valid pattern"),
    })
}

/// Score `markdown` against [`SECTION_TITLES`].
pub fn compute(markdown: &str) -> Completeness {
    let p = patterns();
    let mut sections = Vec::with_capacity(p.headers.len());

    for (title, header) in &p.headers {
        let Some(m) = header.find(markdown) else {
            sections.push(SectionScore {
                title,
                present: false,
                good: false,
                bullets: 0,
                chars: 0,
                has_table: false,
            });
            continue;
        };

        let after = &markdown[m.end()..];
        let body = match p.next_heading.find(after) {
            Some(next) => &after[..next.start()],
            None => after,
        }
        .trim();

        let bullets = p.bullet.find_iter(body).count();
        let has_table = body.contains('|');
        let chars = p.whitespace.replace_all(body, " ").chars().count();
        let good = chars >= MIN_CHARS || bullets >= MIN_BULLETS || has_table;

        sections.push(SectionScore {
            title,
            present: true,
            good,
            bullets,
            chars,
            has_table,
        });
    }

    let complete = sections.iter().filter(|s| s.good).count();
    let total = sections.len();
    let percent = ((complete as f64 / total as f64) * 100.0).round() as u32;

    Completeness {
        percent,
        complete,
        total,
        sections,
    }
}
