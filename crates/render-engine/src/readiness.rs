//! Readiness barriers
//!
//! Font loading runs independently of the document load event, so instead
//! of sleeping for a fixed time the pipeline forces every declared face to
//! load and then polls `document.fonts` until the expected number of faces
//! report `loaded`. Callers bound the polling with a stage deadline.

use std::time::Duration;

use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::error::{RenderError, RenderStage};

const DOCUMENT_STATE_JS: &str = "document.readyState";

const FORCE_FONT_LOAD_JS: &str = r#"(async () => {
  await Promise.all(Array.from(document.fonts).map((face) => face.load().catch(() => null)));
  await document.fonts.ready;
  return true;
})()"#;

const FONT_STATUS_JS: &str = r#"(() => {
  const faces = Array.from(document.fonts);
  const loaded = faces.filter((face) => face.status === 'loaded');
  return {
    total: faces.length,
    loaded: loaded.length,
    failed: faces.filter((face) => face.status === 'error').length,
    families: loaded.map((face) => face.family),
  };
})()"#;

/// Snapshot of the page's `FontFaceSet`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontStatus {
    pub total: usize,
    pub loaded: usize,
    pub failed: usize,
    pub families: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    Pending,
    /// Nothing is still loading and too few faces made it
    Failed,
}

impl FontStatus {
    /// Faces neither loaded nor failed yet
    pub fn pending(&self) -> usize {
        self.total.saturating_sub(self.loaded + self.failed)
    }

    pub fn readiness(&self, expected: usize) -> Readiness {
        if self.pending() > 0 {
            Readiness::Pending
        } else if self.loaded >= expected {
            Readiness::Ready
        } else {
            Readiness::Failed
        }
    }
}

/// Evaluate `expression` in the page, awaiting promises, and deserialize the result
pub(crate) async fn evaluate<T: DeserializeOwned>(
    page: &Page,
    stage: RenderStage,
    expression: &str,
) -> Result<T, RenderError> {
    let params = EvaluateParams::builder()
        .expression(expression)
        .await_promise(true)
        .return_by_value(true)
        .build()
        .map_err(|message| RenderError::Browser { stage, message })?;

    page.evaluate_expression(params)
        .await
        .map_err(RenderError::browser(stage))?
        .into_value::<T>()
        .map_err(|e| RenderError::Browser {
            stage,
            message: format!("Unexpected script result: {}", e),
        })
}

/// Poll until `document.readyState` is `complete`
pub async fn wait_for_document(page: &Page, poll: Duration) -> Result<(), RenderError> {
    loop {
        let state: String = evaluate(page, RenderStage::Navigation, DOCUMENT_STATE_JS).await?;
        trace!("document.readyState = {}", state);
        if state == "complete" {
            return Ok(());
        }
        tokio::time::sleep(poll).await;
    }
}

/// Force-load every font face and poll until `expected` of them are loaded
pub async fn wait_for_fonts(
    page: &Page,
    expected: usize,
    poll: Duration,
) -> Result<FontStatus, RenderError> {
    let _: bool = evaluate(page, RenderStage::Fonts, FORCE_FONT_LOAD_JS).await?;

    loop {
        let status: FontStatus = evaluate(page, RenderStage::Fonts, FONT_STATUS_JS).await?;
        debug!(
            "Fonts: {}/{} loaded, {} failed (expecting {})",
            status.loaded, status.total, status.failed, expected
        );

        match status.readiness(expected) {
            Readiness::Ready => {
                if status.failed > 0 {
                    warn!("{} font face(s) failed to load", status.failed);
                }
                return Ok(status);
            }
            Readiness::Failed => {
                return Err(RenderError::FontsNotReady {
                    loaded: status.loaded,
                    expected,
                    failed: status.failed,
                });
            }
            Readiness::Pending => tokio::time::sleep(poll).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(total: usize, loaded: usize, failed: usize) -> FontStatus {
        FontStatus {
            total,
            loaded,
            failed,
            families: Vec::new(),
        }
    }

    #[test]
    fn test_ready_when_all_expected_loaded() {
        assert_eq!(status(7, 7, 0).readiness(7), Readiness::Ready);
        // Template-declared faces may add to the total
        assert_eq!(status(9, 8, 1).readiness(7), Readiness::Ready);
    }

    #[test]
    fn test_pending_while_faces_load() {
        assert_eq!(status(7, 3, 0).readiness(7), Readiness::Pending);
        assert_eq!(status(7, 6, 0).readiness(0), Readiness::Pending);
    }

    #[test]
    fn test_failed_when_settled_short() {
        assert_eq!(status(7, 5, 2).readiness(7), Readiness::Failed);
    }

    #[test]
    fn test_no_fonts_expected_no_fonts_declared() {
        assert_eq!(status(0, 0, 0).readiness(0), Readiness::Ready);
    }

    #[test]
    fn test_status_deserializes_from_script_result() {
        let json = r#"{"total":2,"loaded":1,"failed":0,"families":["ArialMT_lf"]}"#;
        let status: FontStatus = serde_json::from_str(json).unwrap();
        assert_eq!(status.pending(), 1);
        assert_eq!(status.families, vec!["ArialMT_lf"]);
    }
}
