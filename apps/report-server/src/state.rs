//! Application state for the report server

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use render_engine::DocumentRenderer;
use report_template::{FieldMap, TemplateStore};
use tokio::sync::{Mutex, MutexGuard};

#[derive(Clone)]
pub struct AppState {
    pub store: TemplateStore,
    pub fields: Arc<FieldMap>,
    pub renderer: Arc<dyn DocumentRenderer>,
    /// Final PDF, a single slot shared by all jobs
    pub output_path: PathBuf,
    pub fonts_dir: PathBuf,
    /// Injected as `<base href>` so relative template assets resolve
    pub asset_base_url: Option<String>,
    pub job_timeout: Duration,
    job_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(
        store: TemplateStore,
        fields: FieldMap,
        renderer: Arc<dyn DocumentRenderer>,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        let template_dir = store
            .path()
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Self {
            store,
            fields: Arc::new(fields),
            renderer,
            output_path: output_path.into(),
            fonts_dir: template_dir.join("fonts"),
            asset_base_url: None,
            job_timeout: Duration::from_secs(180),
            job_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn with_fonts_dir(mut self, fonts_dir: impl Into<PathBuf>) -> Self {
        self.fonts_dir = fonts_dir.into();
        self
    }

    pub fn with_asset_base_url(mut self, url: impl Into<String>) -> Self {
        self.asset_base_url = Some(url.into());
        self
    }

    pub fn with_job_timeout(mut self, timeout: Duration) -> Self {
        self.job_timeout = timeout;
        self
    }

    /// Exclusive access to the template and output slots
    pub async fn lock_job(&self) -> MutexGuard<'_, ()> {
        self.job_lock.lock().await
    }
}
