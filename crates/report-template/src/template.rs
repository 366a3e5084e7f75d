//! In-memory report template
//!
//! DOM handles from kuchiki are reference counted and not `Send`, so every
//! operation here parses, works, and serializes within one call. What
//! travels between stages is plain HTML text plus its version digest.

use std::collections::HashMap;
use std::fmt;

use kuchiki::traits::TendrilSink;
use kuchiki::NodeRef;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::error::TemplateError;
use crate::fields::{FieldLocator, FieldMap, FieldUpdateRequest};

/// Selector for the containers that map 1:1 to output pages
pub const PAGE_SELECTOR: &str = ".page";

/// SHA-256 digest of a template's source text
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TemplateVersion(String);

impl TemplateVersion {
    pub fn of(source: &str) -> Self {
        Self(hex::encode(Sha256::digest(source.as_bytes())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TemplateVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form is enough to tell revisions apart in logs
        f.write_str(&self.0[..12.min(self.0.len())])
    }
}

/// A page section of the template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionInfo {
    /// Position among page sections, 0-based
    pub index: usize,
    /// `aria-label` of the section, e.g. "Page 2"
    pub label: Option<String>,
}

/// Result of applying a [`FieldUpdateRequest`]
#[derive(Debug, Clone)]
pub struct PatchOutcome {
    pub template: ReportTemplate,
    /// Fields whose element was found and rewritten
    pub applied: Vec<String>,
    /// Mapped fields that matched no element
    pub missing: Vec<String>,
}

/// Owned, versioned report template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportTemplate {
    source: String,
    version: TemplateVersion,
}

impl ReportTemplate {
    pub fn parse(source: impl Into<String>) -> Self {
        let source = source.into();
        let version = TemplateVersion::of(&source);
        Self { source, version }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn version(&self) -> &TemplateVersion {
        &self.version
    }

    pub fn into_source(self) -> String {
        self.source
    }

    fn document(&self) -> NodeRef {
        kuchiki::parse_html().one(self.source.as_str())
    }

    /// Page sections in document order
    pub fn sections(&self) -> Result<Vec<SectionInfo>, TemplateError> {
        let document = self.document();
        let sections = document
            .select(PAGE_SELECTOR)
            .map_err(|_| TemplateError::Selector(PAGE_SELECTOR.to_string()))?
            .enumerate()
            .map(|(index, el)| SectionInfo {
                index,
                label: el.attributes.borrow().get("aria-label").map(str::to_string),
            })
            .collect();
        Ok(sections)
    }

    /// Current text of the element a locator resolves to
    pub fn field_text(&self, locator: &FieldLocator) -> Result<Option<String>, TemplateError> {
        let document = self.document();
        let named = index_data_fields(&document);
        Ok(resolve(&document, &named, locator)?.map(|node| node.text_contents()))
    }

    /// Apply a field update request and return the patched template
    ///
    /// Fields that are absent, empty, unmapped or unresolvable leave the
    /// template untouched; none of them is an error. When nothing applies
    /// the original source text is returned as-is.
    pub fn patch(
        &self,
        request: &FieldUpdateRequest,
        fields: &FieldMap,
    ) -> Result<PatchOutcome, TemplateError> {
        let mut wanted = Vec::new();
        for (name, value) in request.supplied() {
            match fields.get(name) {
                Some(locator) => wanted.push((name, locator, value)),
                None => debug!("Ignoring unmapped field '{}'", name),
            }
        }

        if wanted.is_empty() {
            return Ok(PatchOutcome {
                template: self.clone(),
                applied: Vec::new(),
                missing: Vec::new(),
            });
        }

        let document = self.document();
        let named = index_data_fields(&document);

        let mut applied = Vec::new();
        let mut missing = Vec::new();

        for (name, locator, value) in wanted {
            // An earlier field may have replaced an ancestor of this one
            let node = resolve(&document, &named, locator)?
                .filter(|node| is_attached(node, &document));
            match node {
                Some(node) => {
                    replace_text(&node, value);
                    applied.push(name.to_string());
                }
                None => {
                    warn!("Field '{}' matched no element, skipping", name);
                    missing.push(name.to_string());
                }
            }
        }

        let template = if applied.is_empty() {
            self.clone()
        } else {
            Self::parse(serialize(&document)?)
        };

        debug!(
            "Patched template {} -> {} ({} applied, {} missing)",
            self.version,
            template.version,
            applied.len(),
            missing.len()
        );

        Ok(PatchOutcome {
            template,
            applied,
            missing,
        })
    }

    /// HTML for in-memory rendering with relative URLs resolved against `href`
    pub fn with_base_href(&self, href: &str) -> Result<String, TemplateError> {
        let document = self.document();
        let head = document
            .select_first("head")
            .map_err(|_| TemplateError::Selector("head".to_string()))?;

        let scratch = kuchiki::parse_html().one("<base>");
        let base = scratch
            .select_first("base")
            .map_err(|_| TemplateError::Selector("base".to_string()))?;
        base.attributes
            .borrow_mut()
            .insert("href", href.to_string());

        // First <base> in the document wins
        head.as_node().prepend(base.as_node().clone());

        serialize(&document)
    }
}

/// First element carrying each `data-field` value
fn index_data_fields(document: &NodeRef) -> HashMap<String, NodeRef> {
    let mut named = HashMap::new();
    if let Ok(elements) = document.select("[data-field]") {
        for el in elements {
            if let Some(id) = el.attributes.borrow().get("data-field") {
                named
                    .entry(id.to_string())
                    .or_insert_with(|| el.as_node().clone());
            }
        }
    }
    named
}

fn resolve(
    document: &NodeRef,
    named: &HashMap<String, NodeRef>,
    locator: &FieldLocator,
) -> Result<Option<NodeRef>, TemplateError> {
    if let Some(node) = named.get(&locator.data_field) {
        return Ok(Some(node.clone()));
    }

    let Some(fallback) = &locator.fallback else {
        return Ok(None);
    };

    let css = fallback.css();
    let node = document
        .select(&css)
        .map_err(|_| TemplateError::Selector(css.clone()))?
        .nth(fallback.index)
        .map(|el| el.as_node().clone());
    Ok(node)
}

fn is_attached(node: &NodeRef, document: &NodeRef) -> bool {
    node.ancestors().any(|ancestor| ancestor == *document)
}

fn replace_text(node: &NodeRef, text: &str) {
    let children: Vec<NodeRef> = node.children().collect();
    for child in children {
        child.detach();
    }
    node.append(NodeRef::new_text(text));
}

fn serialize(document: &NodeRef) -> Result<String, TemplateError> {
    let mut buffer = Vec::new();
    document
        .serialize(&mut buffer)
        .map_err(|e| TemplateError::Serialize(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TemplateError::Serialize(e.to_string()))
}
