// Report Compositor: ranked candidates + job description → paginated document → export artifact.
// Composition is CPU-bound and synchronous; handlers run it inside tokio::task::spawn_blocking.

pub mod compositor;
pub mod document;
pub mod render;

pub use compositor::compose;
pub use document::ReportDocument;
pub use render::export;
