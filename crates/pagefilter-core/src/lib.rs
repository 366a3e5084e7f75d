//! Spacer page removal for rendered reports
//!
//! The print step emits a content page followed by a spacer page for every
//! `.page` section of a report. This crate drops the spacers by keeping the
//! 1-based odd pages of a PDF, copying page objects as-is with lopdf.

pub mod error;
pub mod filter;

pub use error::PageFilterError;
pub use filter::{keep_odd_pages, odd_page_numbers};

/// Parse PDF bytes and return page count
pub fn get_page_count(bytes: &[u8]) -> Result<u32, PageFilterError> {
    let doc = lopdf::Document::load_mem(bytes)
        .map_err(|e| PageFilterError::ParseError(e.to_string()))?;
    Ok(doc.get_pages().len() as u32)
}
