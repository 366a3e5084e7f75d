//! Field update requests and the field address table
//!
//! A logical field (e.g. `aboutIntro`) is addressed by an explicit
//! `data-field` identifier in the template. Templates that predate the
//! identifiers are still reachable through a positional fallback: the n-th
//! element matching a class selector inside a labelled page section.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Replacement text for named report fields, as posted by a client
///
/// `null` and empty strings count as "not supplied". Unknown keys are kept
/// but never resolve to an element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldUpdateRequest(BTreeMap<String, Option<String>>);

impl FieldUpdateRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.0.insert(field.into(), Some(value.into()));
    }

    /// Supplied value for a field, if non-empty
    pub fn value(&self, field: &str) -> Option<&str> {
        self.0
            .get(field)
            .and_then(|v| v.as_deref())
            .filter(|v| !v.is_empty())
    }

    /// All non-empty `(field, value)` pairs, ordered by field name
    pub fn supplied(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().filter_map(|(field, value)| match value.as_deref() {
            Some(v) if !v.is_empty() => Some((field.as_str(), v)),
            _ => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.supplied().next().is_none()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FieldUpdateRequest {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut request = Self::new();
        for (field, value) in iter {
            request.insert(field, value);
        }
        request
    }
}

/// Legacy address: the `index`-th match of `selector` inside the page
/// section(s) whose `aria-label` equals `section`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionalLocator {
    pub section: String,
    pub selector: String,
    pub index: usize,
}

impl PositionalLocator {
    pub fn new(section: impl Into<String>, selector: impl Into<String>, index: usize) -> Self {
        Self {
            section: section.into(),
            selector: selector.into(),
            index,
        }
    }

    /// CSS selector matching every candidate element in document order
    pub(crate) fn css(&self) -> String {
        format!(
            "section[aria-label=\"{}\"] {}",
            escape_css_string(&self.section),
            self.selector
        )
    }
}

/// Where a logical field lives in the template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldLocator {
    /// Value of the `data-field` attribute marking the element
    pub data_field: String,
    /// Used when no element carries `data_field`
    pub fallback: Option<PositionalLocator>,
}

impl FieldLocator {
    pub fn named(data_field: impl Into<String>) -> Self {
        Self {
            data_field: data_field.into(),
            fallback: None,
        }
    }

    pub fn with_fallback(mut self, fallback: PositionalLocator) -> Self {
        self.fallback = Some(fallback);
        self
    }
}

/// Mapping from logical field name to its locator
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap {
    fields: BTreeMap<String, FieldLocator>,
}

const BODY_LG: &str = "span.text.text-body-lg";
const BODY_SM: &str = "span.text.text-body-sm";
const SURVEY_HEADING: &str = "span.text.heading-gray-black-lg";

/// (field, section, selector, index) for the stock report layout
const BUILTIN_FIELDS: &[(&str, &str, &str, usize)] = &[
    ("aboutIntro", "Page 2", BODY_LG, 0),
    ("disclaimerContent", "Page 2", BODY_LG, 6),
    ("analysisIntro", "Page 3", BODY_SM, 12),
    ("psNote", "Page 3", BODY_SM, 13),
    ("ExecutiveSummary", "Page 4", BODY_LG, 0),
    ("BottomDesc", "Page 4", BODY_SM, 0),
    ("coreStabilityIntro", "Page 6", BODY_LG, 5),
    ("adaptabilityIntro", "Page 6", BODY_LG, 6),
    ("sustainablePerformanceDesc", "Page 6", BODY_LG, 7),
    ("burnoutIntro", "Page 6", BODY_LG, 14),
    ("surveyItem1", "Page 6", SURVEY_HEADING, 0),
    ("surveyItem2", "Page 6", SURVEY_HEADING, 1),
    ("surveyItem3", "Page 6", SURVEY_HEADING, 2),
];

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Field table of the stock report template
    pub fn builtin() -> Self {
        let mut map = Self::new();
        for &(name, section, selector, index) in BUILTIN_FIELDS {
            map.insert(
                name,
                FieldLocator::named(name)
                    .with_fallback(PositionalLocator::new(section, selector, index)),
            );
        }
        map
    }

    /// Add or replace a field
    pub fn insert(&mut self, name: impl Into<String>, locator: FieldLocator) {
        self.fields.insert(name.into(), locator);
    }

    pub fn get(&self, name: &str) -> Option<&FieldLocator> {
        self.fields.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldLocator)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn escape_css_string(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
