//! Report Compositor: lays the ranked candidates out as fixed-format blocks on pages.
//!
//! # Per-candidate sequence
//! header band → metrics table → strengths → gaps → analysis paragraph.
//!
//! # Page breaks
//! - The header band is kept with its metrics table: a candidate only starts on the
//!   current page when both fit, so a header band is never the last thing on a page.
//! - Text sections move to the next page whole when they fit on an empty page.
//!   Only a section taller than a whole page is split, at line boundaries.
//!
//! Output depends only on the inputs; the date is passed in, not read from the clock.

use chrono::NaiveDate;
use tracing::debug;

use crate::layout::{get_metrics, wrap_text, FontMetricTable, LayoutConfig, PageCursor};
use crate::models::candidate::{Candidate, CandidateId};
use crate::report::document::{
    file_stem_for, Block, MetricRow, ReportDocument, SectionKind, TextLine, TextSection,
    REPORT_TITLE,
};

pub const BULLET_PREFIX: &str = "• ";

/// Builds the report for `ranked` (already in display order).
pub fn compose(
    ranked: &[Candidate],
    job_description: &str,
    generated_on: NaiveDate,
    config: &LayoutConfig,
) -> ReportDocument {
    let metrics = get_metrics(config.font);
    let mut cursor: PageCursor<'_, Block> = PageCursor::new(config);

    place_document_header(&mut cursor, ranked.len(), job_description, generated_on, metrics, config);

    for (index, candidate) in ranked.iter().enumerate() {
        place_candidate(&mut cursor, index + 1, candidate, metrics, config);
    }

    let pages = cursor.finish();
    debug!(
        candidates = ranked.len(),
        pages = pages.len(),
        font = ?metrics.font,
        "report composed"
    );

    ReportDocument {
        title: REPORT_TITLE.to_string(),
        generated_on,
        file_stem: file_stem_for(generated_on),
        total_candidates: ranked.len(),
        pages,
    }
}

fn place_document_header(
    cursor: &mut PageCursor<'_, Block>,
    total: usize,
    job_description: &str,
    generated_on: NaiveDate,
    metrics: &FontMetricTable,
    config: &LayoutConfig,
) {
    cursor.place(
        Block::Title {
            text: REPORT_TITLE.to_string(),
        },
        config.title_block_height_mm,
    );
    cursor.place(
        Block::Summary {
            total_candidates: total,
            generated_on,
        },
        config.summary_block_height_mm,
    );

    let lines = paragraph_lines(job_description, config.content_width_mm(), metrics, config);
    place_section(cursor, SectionKind::JobDescription, None, lines, config);
    cursor.advance(config.candidate_gap_mm);
}

fn place_candidate(
    cursor: &mut PageCursor<'_, Block>,
    rank: usize,
    candidate: &Candidate,
    metrics: &FontMetricTable,
    config: &LayoutConfig,
) {
    let header_h = config.header_band_height_mm + config.header_band_gap_mm;
    let rows = metric_rows(candidate);
    // +1 for the table's head row.
    let table_h = (rows.len() + 1) as f32 * config.table_row_height_mm + config.table_gap_mm;

    cursor.ensure_room(header_h + table_h);
    cursor.place(
        Block::HeaderBand {
            rank,
            candidate_id: candidate.id.clone(),
            name: candidate.name.clone(),
        },
        header_h,
    );
    cursor.place(
        Block::MetricsTable {
            candidate_id: candidate.id.clone(),
            rows,
        },
        table_h,
    );

    let id = Some(&candidate.id);
    let strengths = list_lines(&candidate.strengths, metrics, config);
    place_section(cursor, SectionKind::Strengths, id, strengths, config);
    let gaps = list_lines(&candidate.gaps, metrics, config);
    place_section(cursor, SectionKind::Gaps, id, gaps, config);
    let analysis = paragraph_lines(
        &candidate.justification,
        config.content_width_mm(),
        metrics,
        config,
    );
    place_section(cursor, SectionKind::Analysis, id, analysis, config);

    cursor.advance(config.candidate_gap_mm);
}

/// Overall/Skills/Experience/Education to one decimal, then the recommendation label.
/// Values are printed as stored, including out-of-range scores.
pub fn metric_rows(candidate: &Candidate) -> Vec<MetricRow> {
    let score = |label: &str, value: f64| MetricRow {
        label: label.to_string(),
        value: format!("{value:.1}/10"),
    };
    vec![
        score("Overall Score", candidate.overall_score),
        score("Skills", candidate.skills_score),
        score("Experience", candidate.experience_score),
        score("Education", candidate.education_score),
        MetricRow {
            label: "Recommendation".to_string(),
            value: candidate.recommendation.label().to_string(),
        },
    ]
}

fn paragraph_lines(
    text: &str,
    width_mm: f32,
    metrics: &FontMetricTable,
    config: &LayoutConfig,
) -> Vec<TextLine> {
    wrap_text(text, width_mm, metrics, config.body_font_size_pt)
        .into_iter()
        .map(|text| TextLine {
            text,
            bullet: false,
            indented: false,
            height_mm: config.line_height_mm,
        })
        .collect()
}

/// Each item wraps at the bulleted width; its first line carries the bullet and
/// the spacing above it.
fn list_lines(items: &[String], metrics: &FontMetricTable, config: &LayoutConfig) -> Vec<TextLine> {
    let bullet_w = metrics.width_mm(BULLET_PREFIX, config.body_font_size_pt);
    let width = config.content_width_mm() - config.bullet_indent_mm - bullet_w;

    let mut lines = Vec::new();
    for (i, item) in items.iter().enumerate() {
        let wrapped = wrap_text(item, width, metrics, config.body_font_size_pt);
        for (j, text) in wrapped.into_iter().enumerate() {
            let spacing = if i > 0 && j == 0 {
                config.list_item_spacing_mm
            } else {
                0.0
            };
            lines.push(TextLine {
                text,
                bullet: j == 0,
                indented: true,
                height_mm: config.line_height_mm + spacing,
            });
        }
    }
    lines
}

/// Places a heading plus its lines, moving or splitting per the module rules.
/// An empty `lines` still places the heading. The section gap trails the last fragment.
///
/// The job description is never moved: it starts on the first page under the summary
/// and splits by line if it overflows.
fn place_section(
    cursor: &mut PageCursor<'_, Block>,
    kind: SectionKind,
    candidate_id: Option<&CandidateId>,
    lines: Vec<TextLine>,
    config: &LayoutConfig,
) {
    let heading_h = config.section_heading_height_mm;
    let whole_h = heading_h + lines.iter().map(|l| l.height_mm).sum::<f32>();

    let section = |heading: bool, lines: Vec<TextLine>, continued: bool| {
        Block::Section(TextSection {
            kind,
            candidate_id: candidate_id.cloned(),
            heading: heading.then(|| kind.heading().to_string()),
            lines,
            continued,
        })
    };

    let movable = kind != SectionKind::JobDescription;
    if cursor.fits(whole_h) || (movable && whole_h <= config.page_capacity_mm()) {
        cursor.place_kept(section(true, lines, false), whole_h);
        cursor.advance(config.section_gap_mm);
        return;
    }

    // Taller than a page (or pinned): fill what is left here, continue on following pages.
    // The heading must travel with at least one line.
    let first_line_h = lines.first().map(|l| l.height_mm).unwrap_or(0.0);
    cursor.ensure_room(heading_h + first_line_h);

    let mut pending = lines.into_iter().peekable();
    let mut first_fragment = true;
    while pending.peek().is_some() {
        let mut fragment = Vec::new();
        let mut height = if first_fragment { heading_h } else { 0.0 };

        while let Some(line) = pending.peek() {
            let fits = cursor.fits(height + line.height_mm);
            // An empty fragment on a fresh page always takes one line so we progress.
            if !fits && !(fragment.is_empty() && cursor.at_page_top()) {
                break;
            }
            height += line.height_mm;
            if let Some(line) = pending.next() {
                fragment.push(line);
            }
        }

        if fragment.is_empty() {
            cursor.new_page();
            continue;
        }

        cursor.place(section(first_fragment, fragment, !first_fragment), height);
        first_fragment = false;
        if pending.peek().is_some() {
            cursor.new_page();
        }
    }
    cursor.advance(config.section_gap_mm);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::font_metrics::FontFamily;
    use crate::models::candidate::Recommendation;
    use crate::session::ranking::tests::candidate;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 14).expect("valid date")
    }

    fn sections(doc: &ReportDocument) -> Vec<&TextSection> {
        doc.pages
            .iter()
            .flat_map(|p| p.blocks.iter())
            .filter_map(|b| match &b.block {
                Block::Section(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    /// Candidate ids in the order their header bands appear.
    fn candidate_order(doc: &ReportDocument) -> Vec<&CandidateId> {
        doc.pages
            .iter()
            .flat_map(|p| p.blocks.iter())
            .filter_map(|placed| match &placed.block {
                Block::HeaderBand { candidate_id, .. } => Some(candidate_id),
                _ => None,
            })
            .collect()
    }

    fn pool(n: usize) -> Vec<Candidate> {
        (0..n)
            .map(|i| {
                let mut c = candidate(&format!("c{i}"), 9.0 - i as f64 * 0.1, 5.0, 5.0);
                c.strengths = vec![
                    "Designed and operated a multi-region event pipeline".to_string(),
                    "Mentors junior engineers".to_string(),
                ];
                c.justification = "Brings deep distributed systems experience and a record of \
                                   shipping reliable services under tight deadlines."
                    .to_string();
                c
            })
            .collect()
    }

    #[test]
    fn test_empty_ranking_yields_header_only() {
        let doc = compose(&[], "Senior Rust engineer", date(), &LayoutConfig::default());

        assert_eq!(doc.page_count(), 1);
        assert_eq!(doc.total_candidates, 0);
        assert!(candidate_order(&doc).is_empty());
        let kinds: Vec<&str> = doc.pages[0]
            .blocks
            .iter()
            .map(|b| match &b.block {
                Block::Title { .. } => "title",
                Block::Summary { .. } => "summary",
                Block::Section(_) => "section",
                _ => "other",
            })
            .collect();
        assert_eq!(kinds, ["title", "summary", "section"]);
        assert_eq!(doc.file_stem, "resume-screening-2026-03-14");
    }

    #[test]
    fn test_job_description_on_first_page_before_candidates() {
        let doc = compose(&pool(2), "Build the \nreport engine", date(), &LayoutConfig::default());
        let first = sections(&doc)[0];
        assert_eq!(first.kind, SectionKind::JobDescription);
        assert_eq!(first.lines.len(), 2);
        let jd_pos = doc.pages[0]
            .blocks
            .iter()
            .position(|b| matches!(&b.block, Block::Section(s) if s.kind == SectionKind::JobDescription));
        let header_pos = doc.pages[0]
            .blocks
            .iter()
            .position(|b| matches!(b.block, Block::HeaderBand { .. }));
        assert!(jd_pos < header_pos);
    }

    #[test]
    fn test_candidate_block_sequence() {
        let doc = compose(&pool(1), "JD", date(), &LayoutConfig::default());
        let blocks: Vec<String> = doc.pages[0]
            .blocks
            .iter()
            .skip(3)
            .map(|b| match &b.block {
                Block::HeaderBand { rank, name, .. } => format!("header #{rank} {name}"),
                Block::MetricsTable { rows, .. } => format!("table {}", rows.len()),
                Block::Section(s) => format!("{:?}", s.kind),
                other => format!("{other:?}"),
            })
            .collect();
        assert_eq!(
            blocks,
            ["header #1 Candidate c0", "table 5", "Strengths", "Gaps", "Analysis"]
        );
    }

    #[test]
    fn test_metric_rows_format_one_decimal_unclamped() {
        let mut c = candidate("x", 12.345, 7.0, -1.0);
        c.recommendation = Recommendation::parse("Needs Review");
        let rows = metric_rows(&c);
        let values: Vec<&str> = rows.iter().map(|r| r.value.as_str()).collect();
        assert_eq!(values, ["12.3/10", "7.0/10", "-1.0/10", "5.0/10", "Needs Review"]);
    }

    #[test]
    fn test_empty_lists_keep_their_headings() {
        let mut c = candidate("x", 5.0, 5.0, 5.0);
        c.strengths.clear();
        c.gaps.clear();
        c.justification.clear();
        let doc = compose(&[c], "JD", date(), &LayoutConfig::default());

        let by_kind = |kind| {
            sections(&doc)
                .into_iter()
                .find(|s| s.kind == kind)
                .cloned()
                .expect("section present")
        };
        for kind in [SectionKind::Strengths, SectionKind::Gaps, SectionKind::Analysis] {
            let section = by_kind(kind);
            assert_eq!(section.heading.as_deref(), Some(kind.heading()));
            assert!(section.lines.is_empty());
        }
    }

    #[test]
    fn test_list_items_are_bulleted_and_wrapped() {
        let mut c = candidate("x", 5.0, 5.0, 5.0);
        c.strengths = vec!["word ".repeat(60).trim().to_string(), "short".to_string()];
        let doc = compose(&[c], "JD", date(), &LayoutConfig::default());
        let strengths = sections(&doc)
            .into_iter()
            .find(|s| s.kind == SectionKind::Strengths)
            .expect("strengths");

        assert!(strengths.lines.len() >= 3);
        assert!(strengths.lines[0].bullet);
        assert!(!strengths.lines[1].bullet);
        assert!(strengths.lines.iter().all(|l| l.indented));
        assert_eq!(strengths.lines.iter().filter(|l| l.bullet).count(), 2);
    }

    #[test]
    fn test_many_candidates_paginate() {
        let config = LayoutConfig::default();
        let doc = compose(&pool(12), "JD", date(), &config);

        assert!(doc.page_count() >= 2, "got {} pages", doc.page_count());
        for page in &doc.pages {
            for placed in &page.blocks {
                assert!(
                    placed.y_mm + placed.height_mm <= config.content_extent_mm + 1e-3,
                    "block overflows page {}",
                    page.number
                );
            }
        }
    }

    #[test]
    fn test_header_band_never_last_on_page() {
        let config = LayoutConfig::default();
        // Vary content so header bands land at many different offsets.
        let ranked: Vec<Candidate> = (0..30)
            .map(|i| {
                let mut c = candidate(&format!("c{i}"), 5.0, 5.0, 5.0);
                c.strengths = (0..(i % 5)).map(|k| format!("Strength number {k}")).collect();
                c.justification = "analysis ".repeat(i * 7);
                c
            })
            .collect();
        let doc = compose(&ranked, "JD", date(), &config);

        for page in &doc.pages {
            if let Some(last) = page.blocks.last() {
                assert!(
                    !matches!(last.block, Block::HeaderBand { .. }),
                    "page {} ends on a header band",
                    page.number
                );
            }
            for (i, placed) in page.blocks.iter().enumerate() {
                if matches!(placed.block, Block::HeaderBand { .. }) {
                    assert!(matches!(
                        page.blocks.get(i + 1).map(|b| &b.block),
                        Some(Block::MetricsTable { .. })
                    ));
                }
            }
        }
    }

    #[test]
    fn test_header_pushed_when_room_is_short() {
        let config = LayoutConfig {
            font: FontFamily::Courier,
            ..LayoutConfig::default()
        };
        // Fill the first page so less than header + table remains.
        let jd = "line\n".repeat(55);
        let doc = compose(&pool(1), &jd, date(), &config);

        assert_eq!(doc.page_count(), 2);
        assert!(matches!(
            doc.pages[1].blocks.first().map(|b| &b.block),
            Some(Block::HeaderBand { rank: 1, .. })
        ));
    }

    #[test]
    fn test_long_job_description_stays_on_first_page() {
        // Fits on an empty page, but not under the title and summary.
        let jd = "requirement line\n".repeat(60);
        let doc = compose(&[], &jd, date(), &LayoutConfig::default());

        assert_eq!(doc.page_count(), 2);
        let first_page: Vec<&Block> = doc.pages[0].blocks.iter().map(|b| &b.block).collect();
        assert_eq!(first_page.len(), 3);
        match first_page[2] {
            Block::Section(s) => {
                assert_eq!(s.kind, SectionKind::JobDescription);
                assert!(s.heading.is_some() && !s.continued);
                assert!(!s.lines.is_empty());
            }
            other => panic!("expected job description, got {other:?}"),
        }

        let jd_sections: Vec<&TextSection> = sections(&doc)
            .into_iter()
            .filter(|s| s.kind == SectionKind::JobDescription)
            .collect();
        assert_eq!(jd_sections.len(), 2);
        assert!(jd_sections[1].heading.is_none() && jd_sections[1].continued);
        let total_lines: usize = jd_sections.iter().map(|s| s.lines.len()).sum();
        assert_eq!(total_lines, 60);
    }

    #[test]
    fn test_section_taller_than_page_splits_by_line() {
        let config = LayoutConfig::default();
        let mut c = candidate("long", 5.0, 5.0, 5.0);
        c.justification = "sentence with several words ".repeat(400);
        let doc = compose(&[c], "JD", date(), &config);

        let analysis: Vec<&TextSection> = sections(&doc)
            .into_iter()
            .filter(|s| s.kind == SectionKind::Analysis)
            .collect();
        assert!(analysis.len() >= 2);
        assert!(analysis[0].heading.is_some() && !analysis[0].continued);
        assert!(analysis[1..].iter().all(|s| s.heading.is_none() && s.continued));
        for page in &doc.pages {
            for placed in &page.blocks {
                assert!(placed.y_mm + placed.height_mm <= config.content_extent_mm + 1e-3);
            }
        }
    }

    #[test]
    fn test_candidate_order_round_trip() {
        let ranked = pool(15);
        let doc = compose(&ranked, "JD", date(), &LayoutConfig::default());
        let expected: Vec<&CandidateId> = ranked.iter().map(|c| &c.id).collect();
        assert_eq!(candidate_order(&doc), expected);

        let ranks: Vec<usize> = doc
            .pages
            .iter()
            .flat_map(|p| p.blocks.iter())
            .filter_map(|b| match b.block {
                Block::HeaderBand { rank, .. } => Some(rank),
                _ => None,
            })
            .collect();
        assert_eq!(ranks, (1..=15).collect::<Vec<_>>());
    }

    #[test]
    fn test_compose_is_deterministic() {
        let ranked = pool(6);
        let config = LayoutConfig::default();
        assert_eq!(
            compose(&ranked, "JD", date(), &config),
            compose(&ranked, "JD", date(), &config)
        );
    }
}
