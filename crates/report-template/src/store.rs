//! On-disk template store

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::TemplateError;
use crate::template::{ReportTemplate, TemplateVersion};

/// The single HTML template file being edited and rendered
#[derive(Debug, Clone)]
pub struct TemplateStore {
    path: PathBuf,
}

impl TemplateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the current template
    pub async fn load(&self) -> Result<ReportTemplate, TemplateError> {
        let source = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| TemplateError::Read {
                path: self.path.clone(),
                source,
            })?;
        let template = ReportTemplate::parse(source);
        debug!(
            "Loaded template {} (version {})",
            self.path.display(),
            template.version()
        );
        Ok(template)
    }

    /// Whether `template` can replace the file, which must still hold
    /// revision `expected`
    ///
    /// Returns `false` when the file already holds `template`, `true` when a
    /// write is needed, and a conflict when anything else is on disk.
    pub async fn check(
        &self,
        template: &ReportTemplate,
        expected: &TemplateVersion,
    ) -> Result<bool, TemplateError> {
        let current = self.load().await?;

        if current.version() == template.version() {
            return Ok(false);
        }

        if current.version() != expected {
            return Err(TemplateError::Conflict {
                path: self.path.clone(),
                expected: expected.as_str().to_string(),
                found: current.version().as_str().to_string(),
            });
        }

        Ok(true)
    }

    /// Persist `template` if the file still holds revision `expected`
    ///
    /// Returns `false` when the file already holds `template`, in which case
    /// nothing is written.
    pub async fn commit(
        &self,
        template: &ReportTemplate,
        expected: &TemplateVersion,
    ) -> Result<bool, TemplateError> {
        if !self.check(template, expected).await? {
            debug!("Template unchanged, skipping write");
            return Ok(false);
        }

        write_atomic(&self.path, template.source().as_bytes()).await?;
        info!(
            "Committed template {} -> {}",
            expected,
            template.version()
        );
        Ok(true)
    }
}

/// Replace `path` with `bytes` via a sibling temp file and a rename
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), TemplateError> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(".{}.{}.tmp", file_name, std::process::id()));

    let write_err = |source: std::io::Error| TemplateError::Write {
        path: path.to_path_buf(),
        source,
    };

    tokio::fs::write(&tmp, bytes).await.map_err(write_err)?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(write_err(e));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{FieldMap, FieldUpdateRequest};

    const TEMPLATE: &str = r#"<html><head></head><body>
<section class="page" aria-label="Page 2"><span class="text text-body-lg">Old</span></section>
</body></html>"#;

    fn store_with(contents: &str) -> (tempfile::TempDir, TemplateStore) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.html");
        std::fs::write(&path, contents).unwrap();
        (dir, TemplateStore::new(path))
    }

    #[tokio::test]
    async fn test_load_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = TemplateStore::new(dir.path().join("missing.html"));
        let result = store.load().await;
        assert!(matches!(result, Err(TemplateError::Read { .. })));
    }

    #[tokio::test]
    async fn test_commit_persists_patch() {
        let (_dir, store) = store_with(TEMPLATE);
        let template = store.load().await.unwrap();
        let request = FieldUpdateRequest::new().with("aboutIntro", "New");
        let outcome = template.patch(&request, &FieldMap::builtin()).unwrap();

        let written = store
            .commit(&outcome.template, template.version())
            .await
            .unwrap();
        assert!(written);

        let reloaded = store.load().await.unwrap();
        assert_eq!(reloaded, outcome.template);
        assert!(reloaded.source().contains(">New</span>"));
    }

    #[tokio::test]
    async fn test_commit_unchanged_skips_write() {
        let (_dir, store) = store_with(TEMPLATE);
        let template = store.load().await.unwrap();
        let written = store.commit(&template, template.version()).await.unwrap();
        assert!(!written);
    }

    #[tokio::test]
    async fn test_commit_detects_concurrent_edit() {
        let (_dir, store) = store_with(TEMPLATE);
        let template = store.load().await.unwrap();
        let request = FieldUpdateRequest::new().with("aboutIntro", "Mine");
        let outcome = template.patch(&request, &FieldMap::builtin()).unwrap();

        // Someone else rewrites the file in between
        std::fs::write(store.path(), TEMPLATE.replace("Old", "Theirs")).unwrap();

        let result = store.commit(&outcome.template, template.version()).await;
        assert!(matches!(result, Err(TemplateError::Conflict { .. })));
        let on_disk = std::fs::read_to_string(store.path()).unwrap();
        assert!(on_disk.contains("Theirs"));
    }

    #[tokio::test]
    async fn test_check_reports_conflict_without_writing() {
        let (_dir, store) = store_with(TEMPLATE);
        let template = store.load().await.unwrap();
        let request = FieldUpdateRequest::new().with("aboutIntro", "Mine");
        let outcome = template.patch(&request, &FieldMap::builtin()).unwrap();

        assert!(store.check(&outcome.template, template.version()).await.unwrap());
        assert!(!store.check(&template, template.version()).await.unwrap());

        std::fs::write(store.path(), TEMPLATE.replace("Old", "Theirs")).unwrap();
        let result = store.check(&outcome.template, template.version()).await;
        assert!(matches!(result, Err(TemplateError::Conflict { .. })));
        assert!(std::fs::read_to_string(store.path()).unwrap().contains("Theirs"));
    }

    #[tokio::test]
    async fn test_write_atomic_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output_final.pdf");
        write_atomic(&path, b"first").await.unwrap();
        write_atomic(&path, b"second").await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"second");
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }
}
