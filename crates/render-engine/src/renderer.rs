//! HTML to PDF render pipeline
//!
//! ```text
//! fonts css ──► launch ──► set content ──► readyState complete
//!                                                │
//!      print ◄── count sections ◄── layout css ◄─┴─ fonts loaded
//! ```
//!
//! Every stage runs under its own deadline. The browser is shut down on
//! both the success and the failure path.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use chromiumoxide::Page;
use tracing::{debug, info, instrument};

use crate::browser::BrowserSession;
use crate::error::{RenderError, RenderStage};
use crate::options::RenderOptions;
use crate::readiness::{self, FontStatus};
use crate::styles;

/// Raw output of one render pass, before spacer pages are removed
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub pdf: Vec<u8>,
    /// Page containers found in the document at print time
    pub section_count: usize,
    pub fonts: FontStatus,
}

/// Anything that can turn report HTML into PDF bytes
#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    async fn render(&self, html: &str) -> Result<RenderedDocument, RenderError>;
}

/// Run `fut` as `stage`, failing with a timeout once `deadline` passes
pub async fn within<T, F>(stage: RenderStage, deadline: Duration, fut: F) -> Result<T, RenderError>
where
    F: Future<Output = Result<T, RenderError>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(RenderError::Timeout {
            stage,
            after: deadline,
        }),
    }
}

/// Renders through a freshly launched headless Chrome per document
pub struct ChromeRenderer {
    options: RenderOptions,
}

impl ChromeRenderer {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    fn print_params(&self) -> PrintToPdfParams {
        let canvas = self.options.canvas;
        PrintToPdfParams {
            landscape: Some(true),
            print_background: Some(true),
            prefer_css_page_size: Some(true),
            scale: Some(1.0),
            paper_width: Some(canvas.paper_width_in()),
            paper_height: Some(canvas.paper_height_in()),
            margin_top: Some(0.0),
            margin_bottom: Some(0.0),
            margin_left: Some(0.0),
            margin_right: Some(0.0),
            ..Default::default()
        }
    }

    async fn inject_style(page: &Page, css: &str) -> Result<(), RenderError> {
        let css = serde_json::to_string(css).map_err(|e| RenderError::Browser {
            stage: RenderStage::Layout,
            message: e.to_string(),
        })?;
        let script = format!(
            r#"(() => {{
  const style = document.createElement('style');
  style.textContent = {css};
  document.head.appendChild(style);
  return true;
}})()"#
        );
        let _: bool = readiness::evaluate(page, RenderStage::Layout, &script).await?;
        Ok(())
    }

    async fn count_sections(&self, page: &Page) -> Result<usize, RenderError> {
        let selector = serde_json::to_string(&self.options.page_selector).map_err(|e| {
            RenderError::Browser {
                stage: RenderStage::Layout,
                message: e.to_string(),
            }
        })?;
        readiness::evaluate(
            page,
            RenderStage::Layout,
            &format!("document.querySelectorAll({}).length", selector),
        )
        .await
    }

    async fn render_in(
        &self,
        session: &BrowserSession,
        html: &str,
        font_css: &str,
    ) -> Result<RenderedDocument, RenderError> {
        let deadlines = self.options.deadlines;
        let poll = self.options.poll_interval;

        let page = within(RenderStage::Navigation, deadlines.navigation, async {
            let page = session
                .browser()
                .new_page("about:blank")
                .await
                .map_err(RenderError::browser(RenderStage::Navigation))?;
            page.set_content(html)
                .await
                .map_err(RenderError::browser(RenderStage::Navigation))?;
            readiness::wait_for_document(&page, poll).await?;
            Ok(page)
        })
        .await?;
        debug!("Document loaded");

        let fonts = within(RenderStage::Fonts, deadlines.fonts, async {
            if !font_css.is_empty() {
                Self::inject_style(&page, font_css).await?;
            }
            readiness::wait_for_fonts(&page, self.options.fonts.len(), poll).await
        })
        .await?;
        info!(
            "Fonts ready: {}/{} loaded ({})",
            fonts.loaded,
            fonts.total,
            fonts.families.join(", ")
        );

        if !self.options.settle.is_zero() {
            tokio::time::sleep(self.options.settle).await;
        }

        let section_count = within(RenderStage::Layout, deadlines.layout, async {
            let css = styles::layout_css(self.options.canvas, &self.options.page_selector);
            Self::inject_style(&page, &css).await?;
            self.count_sections(&page).await
        })
        .await?;
        info!("Detected {} pages", section_count);

        let pdf = within(RenderStage::Print, deadlines.print, async {
            page.pdf(self.print_params())
                .await
                .map_err(RenderError::browser(RenderStage::Print))
        })
        .await?;

        if let Err(e) = page.close().await {
            debug!("Failed to close page: {}", e);
        }

        Ok(RenderedDocument {
            pdf,
            section_count,
            fonts,
        })
    }
}

#[async_trait]
impl DocumentRenderer for ChromeRenderer {
    #[instrument(skip_all, fields(html_len = html.len()))]
    async fn render(&self, html: &str) -> Result<RenderedDocument, RenderError> {
        // Font files are read before launching so a missing asset fails fast
        let font_css = styles::font_face_css(&self.options.fonts_dir, &self.options.fonts).await?;

        let session = within(
            RenderStage::Launch,
            self.options.deadlines.launch,
            BrowserSession::launch(&self.options),
        )
        .await?;

        let result = self.render_in(&session, html, &font_css).await;
        session.close().await;

        let rendered = result?;
        info!(
            "Rendered {} bytes for {} sections",
            rendered.pdf.len(),
            rendered.section_count
        );
        Ok(rendered)
    }
}
