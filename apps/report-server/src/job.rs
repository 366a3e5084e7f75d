//! Report generation job: patch, render, filter, persist
//!
//! Jobs run one at a time. The template is loaded once, patched in memory,
//! rendered from that in-memory copy, and written back only after the
//! output PDF has been replaced. The on-disk template revision is checked
//! before the PDF is touched, so a failed job leaves both files as they
//! were. Dropping the job future (e.g. the client disconnects) cancels it
//! at the next suspension point.

use std::path::PathBuf;
use std::time::Duration;

use pagefilter_core::{get_page_count, keep_odd_pages, odd_page_numbers, PageFilterError};
use render_engine::RenderError;
use report_template::{write_atomic, FieldUpdateRequest, TemplateError};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::state::AppState;

#[derive(Error, Debug)]
pub enum JobError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Filter(#[from] PageFilterError),

    #[error("Page filter task failed: {0}")]
    FilterTask(String),

    #[error(transparent)]
    Output(TemplateError),

    #[error(transparent)]
    Commit(TemplateError),

    #[error("Job timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
}

impl JobError {
    /// Pipeline stage that failed
    pub fn stage(&self) -> &'static str {
        match self {
            JobError::Template(_) => "template",
            JobError::Render(e) => e.stage().as_str(),
            JobError::Filter(_) | JobError::FilterTask(_) => "filter",
            JobError::Output(_) => "output",
            JobError::Commit(_) => "commit",
            JobError::Timeout(_) => "job",
        }
    }
}

#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub pdf_path: PathBuf,
    pub sections: usize,
    pub rendered_pages: u32,
    pub kept_pages: usize,
    pub applied: Vec<String>,
    pub missing: Vec<String>,
    pub template_committed: bool,
}

/// Run one job under the job lock and the job deadline
#[instrument(skip_all, fields(fields = request.supplied().count()))]
pub async fn run_job(state: &AppState, request: FieldUpdateRequest) -> Result<JobOutcome, JobError> {
    let _guard = state.lock_job().await;

    match tokio::time::timeout(state.job_timeout, execute(state, &request)).await {
        Ok(result) => result,
        Err(_) => Err(JobError::Timeout(state.job_timeout)),
    }
}

async fn execute(state: &AppState, request: &FieldUpdateRequest) -> Result<JobOutcome, JobError> {
    // 1. Load and patch in memory
    let template = state.store.load().await?;
    let patch = template.patch(request, &state.fields)?;
    if !patch.missing.is_empty() {
        warn!("Fields without a matching element: {:?}", patch.missing);
    }

    let html = match &state.asset_base_url {
        Some(url) => patch.template.with_base_href(url)?,
        None => patch.template.source().to_string(),
    };

    // 2. Render the patched copy
    let rendered = state.renderer.render(&html).await?;
    let sections = rendered.section_count;

    // 3. Drop spacer pages
    let pdf = rendered.pdf;
    let (rendered_pages, filtered) = tokio::task::spawn_blocking(move || {
        let pages = get_page_count(&pdf)?;
        let filtered = keep_odd_pages(&pdf)?;
        Ok::<_, PageFilterError>((pages, filtered))
    })
    .await
    .map_err(|e| JobError::FilterTask(e.to_string()))??;

    let kept_pages = odd_page_numbers(rendered_pages).len();
    if rendered_pages as usize != sections * 2 {
        warn!(
            "Expected {} rendered pages for {} sections, got {}",
            sections * 2,
            sections,
            rendered_pages
        );
    }

    // 4. Persist: make sure the template can still be committed, then
    // replace the artifact, then the template
    state
        .store
        .check(&patch.template, template.version())
        .await
        .map_err(JobError::Commit)?;

    write_atomic(&state.output_path, &filtered)
        .await
        .map_err(JobError::Output)?;

    let template_committed = state
        .store
        .commit(&patch.template, template.version())
        .await
        .map_err(JobError::Commit)?;

    let pdf_path = tokio::fs::canonicalize(&state.output_path)
        .await
        .unwrap_or_else(|_| state.output_path.clone());

    info!(
        "Final PDF created at {} ({} of {} pages kept)",
        pdf_path.display(),
        kept_pages,
        rendered_pages
    );

    Ok(JobOutcome {
        pdf_path,
        sections,
        rendered_pages,
        kept_pages,
        applied: patch.applied,
        missing: patch.missing,
        template_committed,
    })
}
