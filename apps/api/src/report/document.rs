use chrono::NaiveDate;
use serde::Serialize;

use crate::layout::Page;
use crate::models::candidate::CandidateId;

pub const REPORT_TITLE: &str = "Resume Screening Results";

/// Paginated, block-structured export. Built on demand, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportDocument {
    pub title: String,
    pub generated_on: NaiveDate,
    /// `resume-screening-YYYY-MM-DD`, without extension.
    pub file_stem: String,
    pub total_candidates: usize,
    pub pages: Vec<Page<Block>>,
}

impl ReportDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

pub fn file_stem_for(date: NaiveDate) -> String {
    format!("resume-screening-{}", date.format("%Y-%m-%d"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    JobDescription,
    Strengths,
    Gaps,
    Analysis,
}

impl SectionKind {
    pub fn heading(self) -> &'static str {
        match self {
            SectionKind::JobDescription => "Job Description:",
            SectionKind::Strengths => "Strengths:",
            SectionKind::Gaps => "Areas for Improvement:",
            SectionKind::Analysis => "AI Analysis:",
        }
    }
}

/// One rendered line of a text section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextLine {
    pub text: String,
    /// First line of a list item (drawn with a bullet).
    pub bullet: bool,
    /// Drawn at the bullet indent (every line of a list item).
    pub indented: bool,
    pub height_mm: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextSection {
    pub kind: SectionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate_id: Option<CandidateId>,
    /// `None` on continuation fragments after a page break.
    pub heading: Option<String>,
    pub lines: Vec<TextLine>,
    pub continued: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricRow {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Title {
        text: String,
    },
    Summary {
        total_candidates: usize,
        generated_on: NaiveDate,
    },
    HeaderBand {
        rank: usize,
        candidate_id: CandidateId,
        name: String,
    },
    MetricsTable {
        candidate_id: CandidateId,
        rows: Vec<MetricRow>,
    },
    Section(TextSection),
}
