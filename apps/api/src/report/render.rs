//! Plain-text rendering of a `ReportDocument`.
//!
//! Pages are separated by a form feed so printers and pagers break where the
//! compositor did. Every page ends with a `Page n of m` footer.

use crate::report::compositor::BULLET_PREFIX;
use crate::report::document::{Block, ReportDocument, TextSection};

/// Characters per rendered line; used only for centring and rules.
const TEXT_COLUMNS: usize = 90;
const PAGE_BREAK: char = '\u{000C}';

/// Downloadable export: the rendered text plus its dated filename.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportArtifact {
    pub filename: String,
    pub content_type: &'static str,
    pub body: String,
}

pub fn export(document: &ReportDocument) -> ExportArtifact {
    ExportArtifact {
        filename: format!("{}.txt", document.file_stem),
        content_type: "text/plain; charset=utf-8",
        body: render_text(document),
    }
}

pub fn render_text(document: &ReportDocument) -> String {
    let total_pages = document.page_count();
    let mut out = String::new();

    for (i, page) in document.pages.iter().enumerate() {
        if i > 0 {
            out.push(PAGE_BREAK);
            out.push('\n');
        }
        let mut lines: Vec<String> = page
            .blocks
            .iter()
            .flat_map(|placed| render_block(&placed.block))
            .collect();
        lines.push(String::new());
        let footer = format!("Page {} of {}", page.number, total_pages);
        lines.push(format!("{footer:>TEXT_COLUMNS$}"));

        for line in lines {
            out.push_str(&line);
            out.push('\n');
        }
    }
    out
}

fn render_block(block: &Block) -> Vec<String> {
    match block {
        Block::Title { text } => vec![format!("{text:^TEXT_COLUMNS$}"), String::new()],
        Block::Summary {
            total_candidates,
            generated_on,
        } => vec![
            format!("Total Candidates: {total_candidates}"),
            format!("Date: {}", generated_on.format("%Y-%m-%d")),
            String::new(),
        ],
        Block::HeaderBand { rank, name, .. } => {
            let rule = "=".repeat(TEXT_COLUMNS);
            vec![rule.clone(), format!(" #{rank} {name}"), rule]
        }
        Block::MetricsTable { rows, .. } => {
            let mut lines = vec![
                format!("  {:<20}{}", "Metric", "Score"),
                format!("  {}", "-".repeat(32)),
            ];
            lines.extend(
                rows.iter()
                    .map(|row| format!("  {:<20}{}", row.label, row.value)),
            );
            lines.push(String::new());
            lines
        }
        Block::Section(section) => render_section(section),
    }
}

fn render_section(section: &TextSection) -> Vec<String> {
    let indent = " ".repeat(BULLET_PREFIX.chars().count());
    let mut lines: Vec<String> = section.heading.iter().cloned().collect();
    lines.extend(section.lines.iter().map(|line| {
        let lead = match (line.indented, line.bullet) {
            (true, true) => format!("   {BULLET_PREFIX}"),
            (true, false) => format!("   {indent}"),
            (false, _) => String::new(),
        };
        format!("{lead}{}", line.text)
    }));
    lines.push(String::new());
    lines
}
