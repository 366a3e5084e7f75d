//! Headless browser lifecycle
//!
//! One browser process per render. Each process gets its own user data
//! directory so concurrent renders never contend for Chrome's profile lock.

use std::path::Path;
use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::handler::viewport::Viewport;
use futures::StreamExt;
use tempfile::TempDir;
use tracing::{debug, info, warn};

use crate::error::RenderError;
use crate::options::RenderOptions;

const DEFAULT_ARGS: &[&str] = &[
    "--disable-setuid-sandbox",
    "--font-render-hinting=none",
    "--disable-gpu",
];

const PROFILE_PREFIX: &str = "render-engine-";
const PROFILE_REMOVE_ATTEMPTS: u32 = 20;
const PROFILE_REMOVE_INTERVAL: Duration = Duration::from_millis(250);

pub struct BrowserSession {
    browser: Browser,
    handle: tokio::task::JoinHandle<()>,
    // Taken by `close`; otherwise removed on drop
    profile: Option<TempDir>,
}

/// Fresh, uniquely named profile directory under the system temp dir
fn profile_dir() -> Result<TempDir, RenderError> {
    tempfile::Builder::new()
        .prefix(PROFILE_PREFIX)
        .tempdir()
        .map_err(|e| RenderError::Launch(format!("Failed to create profile directory: {}", e)))
}

/// Remove a profile left behind by a session that was never closed
///
/// A killed Chrome can keep writing into its profile for a moment, so the
/// removal is retried in the background while a runtime is available.
fn discard_profile(profile: TempDir) {
    let Ok(runtime) = tokio::runtime::Handle::try_current() else {
        drop(profile);
        return;
    };

    runtime.spawn(async move {
        let path = profile.path().to_path_buf();
        for _ in 0..PROFILE_REMOVE_ATTEMPTS {
            match tokio::fs::remove_dir_all(&path).await {
                Ok(()) => break,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => break,
                Err(e) => {
                    debug!("Retrying removal of {}: {}", path.display(), e);
                    tokio::time::sleep(PROFILE_REMOVE_INTERVAL).await;
                }
            }
        }
        drop(profile);
    });
}

/// Browser configuration for printing on a fixed canvas
pub fn browser_config(
    options: &RenderOptions,
    user_data_dir: &Path,
) -> Result<BrowserConfig, RenderError> {
    let canvas = options.canvas;

    let mut builder = BrowserConfig::builder()
        .no_sandbox()
        .args(DEFAULT_ARGS.iter().copied())
        .args(options.browser_args.iter().cloned())
        .window_size(canvas.width, canvas.height)
        .viewport(Viewport {
            width: canvas.width,
            height: canvas.height,
            device_scale_factor: Some(1.0),
            emulating_mobile: false,
            is_landscape: canvas.width >= canvas.height,
            has_touch: false,
        })
        .user_data_dir(user_data_dir);

    if let Some(chrome) = &options.chrome_executable {
        builder = builder.chrome_executable(chrome);
    }

    builder
        .build()
        .map_err(|e| RenderError::Launch(format!("Failed to build browser config: {}", e)))
}

impl BrowserSession {
    /// Launch a headless browser and start its event handler
    pub async fn launch(options: &RenderOptions) -> Result<Self, RenderError> {
        let profile = profile_dir()?;
        let config = browser_config(options, profile.path())?;

        info!("Launching headless browser");
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| RenderError::Launch(e.to_string()))?;

        // Spawn handler to process browser events
        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler stopped: {}", e);
                    break;
                }
            }
        });

        Ok(Self {
            browser,
            handle,
            profile: Some(profile),
        })
    }

    pub fn browser(&self) -> &Browser {
        &self.browser
    }

    /// Profile directory of the running browser
    pub fn user_data_dir(&self) -> Option<&Path> {
        self.profile.as_ref().map(TempDir::path)
    }

    /// Shut the browser down and remove its profile directory
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("Failed to close browser cleanly: {}", e);
        }
        if let Err(e) = self.browser.wait().await {
            warn!("Failed to reap browser process: {}", e);
        }
        self.handle.abort();

        if let Some(profile) = self.profile.take() {
            let path = profile.path().to_path_buf();
            if let Err(e) = profile.close() {
                debug!("Could not remove {}: {}", path.display(), e);
            }
        }
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        // Reached without `close` when a render is cancelled mid-flight
        self.handle.abort();
        if let Some(profile) = self.profile.take() {
            debug!("Browser session dropped without close, discarding profile");
            discard_profile(profile);
        }
    }
}
