//! Odd page retention
//!
//! Keeps pages 1, 3, 5, ... of a document using "Construction by Whitelist":
//! the kept page objects and everything they reference are carried over
//! untouched, the spacer pages are unlinked from the page tree, and the
//! objects only they referenced are pruned.

use crate::error::PageFilterError;
use lopdf::Document;
use tracing::debug;

/// 1-based odd page numbers of a document with `total` pages
pub fn odd_page_numbers(total: u32) -> Vec<u32> {
    (1..=total).step_by(2).collect()
}

/// Keep only the 1-based odd pages of a PDF, in original order
///
/// A document with no pages is returned as an empty document rather than
/// an error. Page content streams are copied verbatim.
pub fn keep_odd_pages(bytes: &[u8]) -> Result<Vec<u8>, PageFilterError> {
    let mut doc =
        Document::load_mem(bytes).map_err(|e| PageFilterError::ParseError(e.to_string()))?;

    let page_count = doc.get_pages().len() as u32;

    // Even pages are the spacers
    let spacer_pages: Vec<u32> = (2..=page_count).step_by(2).collect();
    if !spacer_pages.is_empty() {
        doc.delete_pages(&spacer_pages);
        doc.prune_objects();
    }

    debug!(
        "Kept {} of {} pages",
        page_count - spacer_pages.len() as u32,
        page_count
    );

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| PageFilterError::OperationError(format!("Save failed: {}", e)))?;

    Ok(buffer)
}
