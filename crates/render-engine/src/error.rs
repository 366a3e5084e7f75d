//! Render errors, tagged with the pipeline stage that produced them

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderStage {
    /// Reading and inlining font assets
    Assets,
    /// Starting the browser process
    Launch,
    /// Loading the document into a page
    Navigation,
    /// Waiting for font faces to finish loading
    Fonts,
    /// Injecting page-sizing rules and measuring sections
    Layout,
    /// Printing to PDF
    Print,
}

impl RenderStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderStage::Assets => "assets",
            RenderStage::Launch => "launch",
            RenderStage::Navigation => "navigation",
            RenderStage::Fonts => "fonts",
            RenderStage::Layout => "layout",
            RenderStage::Print => "print",
        }
    }
}

impl fmt::Display for RenderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to read font asset {}: {source}", .path.display())]
    FontAsset {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Browser launch failed: {0}")]
    Launch(String),

    #[error("{stage} stage timed out after {}ms", .after.as_millis())]
    Timeout { stage: RenderStage, after: Duration },

    #[error("Fonts not ready: {loaded} of {expected} loaded, {failed} failed")]
    FontsNotReady {
        loaded: usize,
        expected: usize,
        failed: usize,
    },

    #[error("{stage} stage failed: {message}")]
    Browser { stage: RenderStage, message: String },
}

impl RenderError {
    /// Stage the error was raised in
    pub fn stage(&self) -> RenderStage {
        match self {
            RenderError::FontAsset { .. } => RenderStage::Assets,
            RenderError::Launch(_) => RenderStage::Launch,
            RenderError::Timeout { stage, .. } => *stage,
            RenderError::FontsNotReady { .. } => RenderStage::Fonts,
            RenderError::Browser { stage, .. } => *stage,
        }
    }

    pub(crate) fn browser(stage: RenderStage) -> impl FnOnce(chromiumoxide::error::CdpError) -> Self {
        move |e| RenderError::Browser {
            stage,
            message: e.to_string(),
        }
    }
}
