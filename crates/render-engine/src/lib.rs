//! Headless Chrome rendering for fixed-canvas HTML reports
//!
//! Loads report HTML into a headless browser, inlines the report fonts,
//! waits until they are actually loaded, pins every `.page` container to
//! one physical page of the canvas size, and prints to PDF.
//!
//! # Example
//!
//! ```no_run
//! use render_engine::{ChromeRenderer, DocumentRenderer, RenderOptions};
//!
//! # async fn example() -> Result<(), render_engine::RenderError> {
//! let renderer = ChromeRenderer::new(RenderOptions::default());
//! let rendered = renderer.render("<html><body><section class=\"page\"></section></body></html>").await?;
//! println!("{} sections, {} bytes", rendered.section_count, rendered.pdf.len());
//! # Ok(())
//! # }
//! ```
//!
//! The print step produces a spacer page after every content page; the
//! `pagefilter-core` crate removes them.

pub mod browser;
pub mod error;
pub mod options;
pub mod readiness;
pub mod renderer;
pub mod styles;

pub use error::{RenderError, RenderStage};
pub use options::{Canvas, FontFace, FontStyle, RenderOptions, StageDeadlines};
pub use readiness::FontStatus;
pub use renderer::{ChromeRenderer, DocumentRenderer, RenderedDocument};
