//! Property-based tests for template patching
//!
//! Test categories:
//! - Fields left out of a request keep their markup
//! - Applying the same request twice is a no-op the second time
//! - Requests naming absent sections never fail

use proptest::prelude::*;
use report_template::{
    FieldLocator, FieldMap, FieldUpdateRequest, PositionalLocator, ReportTemplate,
};

const FIELD_NAMES: &[&str] = &[
    "aboutIntro",
    "disclaimerContent",
    "analysisIntro",
    "psNote",
    "ExecutiveSummary",
    "BottomDesc",
    "coreStabilityIntro",
    "adaptabilityIntro",
    "sustainablePerformanceDesc",
    "burnoutIntro",
    "surveyItem1",
    "surveyItem2",
    "surveyItem3",
];

/// Template with enough spans for every builtin positional address
fn full_template() -> String {
    fn spans(class: &str, prefix: &str, n: usize) -> String {
        (0..n)
            .map(|i| format!("<span class=\"text {}\">{} {}</span>", class, prefix, i))
            .collect::<Vec<_>>()
            .join("\n")
    }

    format!(
        r#"<!DOCTYPE html>
<html><head><title>Report</title></head><body><div class="page-container">
<section class="page" aria-label="Page 2">{}</section>
<section class="page" aria-label="Page 3">{}</section>
<section class="page" aria-label="Page 4">{}{}</section>
<section class="page" aria-label="Page 6">{}{}</section>
</div></body></html>"#,
        spans("text-body-lg", "p2-lg", 8),
        spans("text-body-sm", "p3-sm", 14),
        spans("text-body-lg", "p4-lg", 2),
        spans("text-body-sm", "p4-sm", 2),
        spans("text-body-lg", "p6-lg", 15),
        spans("heading-gray-black-lg", "p6-survey", 3),
    )
}

fn field_name() -> impl Strategy<Value = &'static str> {
    prop::sample::select(FIELD_NAMES)
}

fn field_value() -> impl Strategy<Value = String> {
    "[A-Za-z0-9 .,&<>']{1,40}"
}

fn request_strategy() -> impl Strategy<Value = Vec<(&'static str, String)>> {
    prop::collection::vec((field_name(), field_value()), 0..6)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: every builtin field not named in the request keeps its text
    #[test]
    fn unrequested_fields_are_untouched(pairs in request_strategy()) {
        let template = ReportTemplate::parse(full_template());
        let fields = FieldMap::builtin();
        let request: FieldUpdateRequest = pairs.iter().cloned().collect();

        let outcome = template.patch(&request, &fields).unwrap();

        for (name, locator) in fields.iter() {
            if request.value(name).is_some() {
                continue;
            }
            let before = template.field_text(locator).unwrap();
            let after = outcome.template.field_text(locator).unwrap();
            prop_assert_eq!(before, after, "field '{}' changed", name);
        }
    }

    /// Property: requested fields end up holding exactly the requested text
    #[test]
    fn requested_fields_hold_new_text(pairs in request_strategy()) {
        let template = ReportTemplate::parse(full_template());
        let fields = FieldMap::builtin();
        let request: FieldUpdateRequest = pairs.iter().cloned().collect();

        let outcome = template.patch(&request, &fields).unwrap();

        for (name, value) in request.supplied() {
            let locator = fields.get(name).unwrap();
            let text = outcome.template.field_text(locator).unwrap();
            prop_assert_eq!(text.as_deref(), Some(value));
        }
        prop_assert!(outcome.missing.is_empty());
    }

    /// Property: patching twice with the same request yields the same text
    #[test]
    fn patch_is_idempotent(pairs in request_strategy()) {
        let template = ReportTemplate::parse(full_template());
        let fields = FieldMap::builtin();
        let request: FieldUpdateRequest = pairs.iter().cloned().collect();

        let once = template.patch(&request, &fields).unwrap().template;
        let twice = once.patch(&request, &fields).unwrap().template;

        prop_assert_eq!(once.source(), twice.source());
        prop_assert_eq!(once.version(), twice.version());
    }

    /// Property: addresses into missing sections never error and never mutate
    #[test]
    fn absent_sections_are_noops(page in 7u32..100, index in 0usize..20, value in field_value()) {
        let template = ReportTemplate::parse(full_template());
        let mut fields = FieldMap::new();
        fields.insert(
            "ghost",
            FieldLocator::named("ghost").with_fallback(PositionalLocator::new(
                format!("Page {}", page),
                "span.text.text-body-lg",
                index,
            )),
        );
        let request = FieldUpdateRequest::new().with("ghost", value);

        let outcome = template.patch(&request, &fields).unwrap();

        prop_assert!(outcome.applied.is_empty());
        prop_assert_eq!(outcome.template.source(), template.source());
    }
}
