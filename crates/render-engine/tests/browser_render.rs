//! Browser-backed render tests
//!
//! These launch a real headless Chrome. They skip when SKIP_BROWSER_TESTS is
//! set or when no browser can be launched.

use std::time::Duration;

use render_engine::browser::BrowserSession;
use render_engine::{ChromeRenderer, DocumentRenderer, RenderError, RenderOptions, RenderStage};

fn should_skip() -> bool {
    std::env::var("SKIP_BROWSER_TESTS").is_ok()
}

fn report_html(sections: usize) -> String {
    let body: String = (0..sections)
        .map(|i| {
            format!(
                r#"<section class="page" aria-label="Page {}"><span class="text text-body-lg">Section {}</span></section>"#,
                i + 1,
                i + 1
            )
        })
        .collect();
    format!(
        r#"<!DOCTYPE html><html><head><title>t</title></head><body><div class="page-container">{}</div></body></html>"#,
        body
    )
}

fn renderer() -> ChromeRenderer {
    ChromeRenderer::new(RenderOptions {
        fonts: Vec::new(),
        ..RenderOptions::default()
    })
}

/// Render, or `None` when the browser is unavailable
async fn try_render(html: &str) -> Option<render_engine::RenderedDocument> {
    match renderer().render(html).await {
        Ok(doc) => Some(doc),
        Err(e) if e.stage() == RenderStage::Launch => {
            eprintln!("Skipping: browser unavailable ({})", e);
            None
        }
        Err(e) => panic!("Unexpected render error: {}", e),
    }
}

#[tokio::test]
async fn test_render_counts_sections_and_prints_pdf() {
    if should_skip() {
        return;
    }
    let Some(rendered) = try_render(&report_html(3)).await else {
        return;
    };

    assert!(rendered.pdf.starts_with(b"%PDF"));
    assert_eq!(rendered.section_count, 3);

    // Content page plus spacer page per section
    let pages = pagefilter_core::get_page_count(&rendered.pdf).unwrap();
    assert_eq!(pages, 2 * 3);
}

#[tokio::test]
async fn test_filtered_output_keeps_odd_pages() {
    if should_skip() {
        return;
    }
    let Some(rendered) = try_render(&report_html(2)).await else {
        return;
    };

    let raw = pagefilter_core::get_page_count(&rendered.pdf).unwrap();
    let filtered = pagefilter_core::keep_odd_pages(&rendered.pdf).unwrap();
    let kept = pagefilter_core::get_page_count(&filtered).unwrap();

    assert_eq!(raw, 4);
    assert_eq!(kept, 2);
}

#[tokio::test]
async fn test_unreachable_executable_reports_launch_stage() {
    let dir = tempfile::tempdir().unwrap();
    let renderer = ChromeRenderer::new(RenderOptions {
        fonts: Vec::new(),
        chrome_executable: Some(dir.path().join("chrome")),
        ..RenderOptions::default()
    });

    let err = renderer.render(&report_html(1)).await.unwrap_err();

    assert!(matches!(err, RenderError::Launch(_)));
}

#[tokio::test]
async fn test_dropped_session_removes_profile() {
    if should_skip() {
        return;
    }
    let options = RenderOptions {
        fonts: Vec::new(),
        ..RenderOptions::default()
    };
    let session = match BrowserSession::launch(&options).await {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Skipping: browser unavailable ({})", e);
            return;
        }
    };
    let profile = session.user_data_dir().unwrap().to_path_buf();
    assert!(profile.is_dir());

    // Cancelled render: the session goes away without `close`
    drop(session);

    for _ in 0..40 {
        if !profile.exists() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(250)).await;
    }
    assert!(!profile.exists(), "{} left behind", profile.display());
}
