//! Page geometry and the vertical placement cursor.
//!
//! # Placement rules
//! - The cursor starts every page at `top_offset_mm`.
//! - A block of height `h` fits when `cursor + h <= content_extent_mm`.
//! - A block that does not fit moves to a fresh page; only the caller decides whether a
//!   block may instead be split (see `report::compositor`).
//!
//! Every constant here is a rendering heuristic, so all of it is configuration.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::layout::font_metrics::FontFamily;

#[derive(Debug, Error, PartialEq)]
pub enum LayoutError {
    #[error("content extent {content}mm must be below page height {page}mm")]
    ContentExceedsPage { content: f32, page: f32 },

    #[error("top offset {top}mm must be above content extent {content}mm")]
    TopOffsetBelowContent { top: f32, content: f32 },

    #[error("{0} must be positive")]
    NonPositive(&'static str),
}

/// Report layout constants, in millimetres and points.
///
/// Defaults: A4 portrait, 20mm side margins, 9pt body text on a 4mm line pitch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub page_width_mm: f32,
    pub page_height_mm: f32,
    pub margin_left_mm: f32,
    pub margin_right_mm: f32,
    /// Where the cursor starts on each page.
    pub top_offset_mm: f32,
    /// Lowest point a block may reach; the rest of the page is bottom margin.
    pub content_extent_mm: f32,
    pub font: FontFamily,
    pub title_font_size_pt: f32,
    pub heading_font_size_pt: f32,
    pub body_font_size_pt: f32,
    pub title_block_height_mm: f32,
    /// Candidate count + generation date lines under the title.
    pub summary_block_height_mm: f32,
    pub line_height_mm: f32,
    pub section_heading_height_mm: f32,
    /// Extra space above every list item after the first.
    pub list_item_spacing_mm: f32,
    pub bullet_indent_mm: f32,
    /// Space after each text section.
    pub section_gap_mm: f32,
    pub header_band_height_mm: f32,
    pub header_band_gap_mm: f32,
    /// Metrics table: head row + Overall/Skills/Experience/Education/Recommendation.
    pub table_row_height_mm: f32,
    pub table_gap_mm: f32,
    pub candidate_gap_mm: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            page_width_mm: 210.0,
            page_height_mm: 297.0,
            margin_left_mm: 20.0,
            margin_right_mm: 20.0,
            top_offset_mm: 20.0,
            content_extent_mm: 277.0,
            font: FontFamily::Helvetica,
            title_font_size_pt: 20.0,
            heading_font_size_pt: 10.0,
            body_font_size_pt: 9.0,
            title_block_height_mm: 15.0,
            summary_block_height_mm: 15.0,
            line_height_mm: 4.0,
            section_heading_height_mm: 5.0,
            list_item_spacing_mm: 1.0,
            bullet_indent_mm: 5.0,
            section_gap_mm: 4.0,
            header_band_height_mm: 8.0,
            header_band_gap_mm: 4.0,
            table_row_height_mm: 7.0,
            table_gap_mm: 5.0,
            candidate_gap_mm: 10.0,
        }
    }
}

impl LayoutConfig {
    pub fn content_width_mm(&self) -> f32 {
        self.page_width_mm - self.margin_left_mm - self.margin_right_mm
    }

    /// Vertical room on an empty page.
    pub fn page_capacity_mm(&self) -> f32 {
        self.content_extent_mm - self.top_offset_mm
    }

    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.content_extent_mm >= self.page_height_mm {
            return Err(LayoutError::ContentExceedsPage {
                content: self.content_extent_mm,
                page: self.page_height_mm,
            });
        }
        if self.top_offset_mm >= self.content_extent_mm {
            return Err(LayoutError::TopOffsetBelowContent {
                top: self.top_offset_mm,
                content: self.content_extent_mm,
            });
        }
        let positives = [
            ("line_height_mm", self.line_height_mm),
            ("body_font_size_pt", self.body_font_size_pt),
            ("header_band_height_mm", self.header_band_height_mm),
            ("table_row_height_mm", self.table_row_height_mm),
        ];
        if let Some((name, _)) = positives.iter().find(|(_, v)| *v <= 0.0) {
            return Err(LayoutError::NonPositive(*name));
        }
        if self.content_width_mm() <= self.bullet_indent_mm {
            return Err(LayoutError::NonPositive("content width"));
        }
        Ok(())
    }

    /// Loads a (possibly partial) override file; missing keys keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read layout file '{}'", path.display()))?;
        let config: LayoutConfig = serde_json::from_str(&raw)
            .with_context(|| format!("Layout file '{}' is not valid JSON", path.display()))?;
        config.validate()?;
        Ok(config)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pages and the cursor
// ────────────────────────────────────────────────────────────────────────────

/// A block pinned to a vertical position on its page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Placed<B> {
    pub y_mm: f32,
    pub height_mm: f32,
    #[serde(flatten)]
    pub block: B,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<B> {
    /// 1-based.
    pub number: usize,
    pub blocks: Vec<Placed<B>>,
}

/// Walks down the pages placing blocks.
pub struct PageCursor<'a, B> {
    config: &'a LayoutConfig,
    pages: Vec<Page<B>>,
    y: f32,
}

impl<'a, B> PageCursor<'a, B> {
    pub fn new(config: &'a LayoutConfig) -> Self {
        Self {
            config,
            pages: vec![Page {
                number: 1,
                blocks: Vec::new(),
            }],
            y: config.top_offset_mm,
        }
    }

    pub fn fits(&self, height_mm: f32) -> bool {
        self.y + height_mm <= self.config.content_extent_mm
    }

    pub fn at_page_top(&self) -> bool {
        self.y <= self.config.top_offset_mm
    }

    pub fn new_page(&mut self) {
        let number = self.pages.len() + 1;
        self.pages.push(Page {
            number,
            blocks: Vec::new(),
        });
        self.y = self.config.top_offset_mm;
    }

    /// Breaks the page unless `height_mm` fits or the page is still empty.
    pub fn ensure_room(&mut self, height_mm: f32) {
        if !self.fits(height_mm) && !self.at_page_top() {
            self.new_page();
        }
    }

    /// Places `block` at the cursor and moves the cursor below it. No fit check.
    pub fn place(&mut self, block: B, height_mm: f32) {
        let y_mm = self.y;
        if let Some(page) = self.pages.last_mut() {
            page.blocks.push(Placed {
                y_mm,
                height_mm,
                block,
            });
        }
        self.y += height_mm;
    }

    /// `ensure_room` then `place`.
    pub fn place_kept(&mut self, block: B, height_mm: f32) {
        self.ensure_room(height_mm);
        self.place(block, height_mm);
    }

    /// Adds vertical whitespace. May run past the content extent; the next fit check
    /// will break the page.
    pub fn advance(&mut self, gap_mm: f32) {
        self.y += gap_mm;
    }

    pub fn finish(self) -> Vec<Page<B>> {
        self.pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn config() -> LayoutConfig {
        LayoutConfig {
            top_offset_mm: 10.0,
            content_extent_mm: 100.0,
            page_height_mm: 120.0,
            ..LayoutConfig::default()
        }
    }

    #[test]
    fn test_default_layout_sanity() {
        let config = LayoutConfig::default();
        assert!(config.validate().is_ok());
        assert!((config.content_width_mm() - 170.0).abs() < 1e-4);
        assert!(config.content_extent_mm < config.page_height_mm);
        assert!((config.page_capacity_mm() - 257.0).abs() < 1e-4);
    }

    #[test]
    fn test_validate_rejects_inverted_geometry() {
        let bad = LayoutConfig {
            content_extent_mm: 300.0,
            ..LayoutConfig::default()
        };
        assert!(matches!(
            bad.validate(),
            Err(LayoutError::ContentExceedsPage { .. })
        ));

        let bad = LayoutConfig {
            top_offset_mm: 280.0,
            ..LayoutConfig::default()
        };
        assert!(matches!(
            bad.validate(),
            Err(LayoutError::TopOffsetBelowContent { .. })
        ));

        let bad = LayoutConfig {
            line_height_mm: 0.0,
            ..LayoutConfig::default()
        };
        assert_eq!(
            bad.validate(),
            Err(LayoutError::NonPositive("line_height_mm"))
        );
    }

    #[test]
    fn test_cursor_places_until_extent_then_breaks() {
        let config = config();
        let mut cursor: PageCursor<'_, &str> = PageCursor::new(&config);
        cursor.place_kept("a", 50.0); // 10 → 60
        cursor.place_kept("b", 40.0); // 60 → 100, exactly at the extent
        cursor.place_kept("c", 1.0); // does not fit → page 2
        let pages = cursor.finish();

        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].blocks.len(), 2);
        assert_eq!(pages[1].number, 2);
        assert_eq!(pages[1].blocks[0].block, "c");
        assert!((pages[1].blocks[0].y_mm - 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_oversized_block_on_empty_page_stays() {
        let config = config();
        let mut cursor: PageCursor<'_, &str> = PageCursor::new(&config);
        cursor.place_kept("huge", 500.0);
        assert_eq!(cursor.finish().len(), 1);
    }

    #[test]
    fn test_layout_file_partial_override() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"{{ "line_height_mm": 5.0, "font": "courier" }}"#).expect("write");

        let config = LayoutConfig::from_json_file(file.path()).expect("loads");
        assert_eq!(config.line_height_mm, 5.0);
        assert_eq!(config.font, FontFamily::Courier);
        assert_eq!(config.page_height_mm, 297.0);
    }

    #[test]
    fn test_layout_file_invalid_geometry_rejected() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"{{ "content_extent_mm": 400.0 }}"#).expect("write");
        assert!(LayoutConfig::from_json_file(file.path()).is_err());
    }
}
