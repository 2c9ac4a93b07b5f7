// Report layout primitives: glyph metrics, word wrap, page geometry and the placement cursor.
// Composition itself (what goes on the page) lives in `report`.

pub mod font_metrics;
pub mod page;
pub mod wrap;

pub use font_metrics::{get_metrics, FontMetricTable};
pub use page::{LayoutConfig, Page, PageCursor};
pub use wrap::wrap_text;
