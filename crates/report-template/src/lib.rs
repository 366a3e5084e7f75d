//! Report template store and field patcher
//!
//! The report is a single HTML document made of `.page` sections. Clients
//! edit a fixed set of named text fields; this crate resolves those names
//! to elements, rewrites their text, and persists the result.
//!
//! Templates are handled as owned [`ReportTemplate`] values: load once,
//! patch in memory, hand the HTML to the renderer, and commit back to disk
//! only when the caller decides the job succeeded.
//!
//! ```no_run
//! use report_template::{FieldMap, FieldUpdateRequest, TemplateStore};
//!
//! # async fn example() -> Result<(), report_template::TemplateError> {
//! let store = TemplateStore::new("index.html");
//! let template = store.load().await?;
//!
//! let request = FieldUpdateRequest::new().with("aboutIntro", "Hello");
//! let outcome = template.patch(&request, &FieldMap::builtin())?;
//!
//! store.commit(&outcome.template, template.version()).await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod fields;
pub mod store;
pub mod template;

pub use error::TemplateError;
pub use fields::{FieldLocator, FieldMap, FieldUpdateRequest, PositionalLocator};
pub use store::{write_atomic, TemplateStore};
pub use template::{PatchOutcome, ReportTemplate, SectionInfo, TemplateVersion, PAGE_SELECTOR};
