//! Server configuration
//!
//! Every key has a default, so the server runs without a config file. A TOML
//! file can override any section:
//!
//! ```toml
//! [server]
//! port = 5000
//!
//! [template]
//! path = "index.html"
//! output = "output_final.pdf"
//! fonts_dir = "fonts"
//!
//! [render]
//! navigation_timeout_ms = 60000
//!
//! [[fonts]]
//! family = "ArialMT_lf"
//! file = "ArialMT_lf.woff2"
//! weight = 400
//!
//! [fields.closingNote]
//! data_field = "closing-note"
//! ```

use anyhow::Context;
use render_engine::{Canvas, FontFace, RenderOptions, StageDeadlines};
use report_template::{FieldLocator, FieldMap, PositionalLocator};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub template: TemplateConfig,
    #[serde(default)]
    pub render: RenderConfig,
    /// Fonts inlined into every render; defaults to the report's faces
    #[serde(default = "FontFace::report_defaults")]
    pub fonts: Vec<FontFace>,
    /// Additional or overriding field addresses
    #[serde(default)]
    pub fields: BTreeMap<String, FieldConfig>,
    #[serde(default)]
    pub job: JobConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            template: TemplateConfig::default(),
            render: RenderConfig::default(),
            fonts: FontFace::report_defaults(),
            fields: BTreeMap::new(),
            job: JobConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_str(s: &str) -> anyhow::Result<Self> {
        toml::from_str(s).context("Failed to parse TOML configuration")
    }

    /// Where the browser fetches relative assets of the template from
    pub fn asset_base_url(&self) -> String {
        if let Some(url) = &self.server.public_url {
            return url.clone();
        }
        let host = match self.server.host.as_str() {
            "0.0.0.0" | "::" => "127.0.0.1",
            other => other,
        };
        format!("http://{}:{}/", host, self.server.port)
    }

    pub fn render_options(&self) -> RenderOptions {
        let r = &self.render;
        RenderOptions {
            canvas: Canvas {
                width: r.width,
                height: r.height,
            },
            page_selector: r.page_selector.clone(),
            chrome_executable: r.chrome_executable.clone(),
            browser_args: r.browser_args.clone(),
            fonts_dir: self.template.fonts_dir.clone(),
            fonts: self.fonts.clone(),
            deadlines: StageDeadlines {
                launch: Duration::from_millis(r.launch_timeout_ms),
                navigation: Duration::from_millis(r.navigation_timeout_ms),
                fonts: Duration::from_millis(r.font_timeout_ms),
                layout: Duration::from_millis(r.layout_timeout_ms),
                print: Duration::from_millis(r.print_timeout_ms),
            },
            poll_interval: Duration::from_millis(r.poll_interval_ms),
            settle: Duration::from_millis(r.settle_ms),
        }
    }

    /// Builtin report fields merged with configured overrides
    pub fn field_map(&self) -> FieldMap {
        let mut map = FieldMap::builtin();
        for (name, field) in &self.fields {
            map.insert(name.clone(), field.to_locator(name));
        }
        map
    }

    pub fn job_timeout(&self) -> Duration {
        Duration::from_millis(self.job.timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Externally reachable base URL, if the server sits behind a proxy
    pub public_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            public_url: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    /// HTML template, edited in place
    pub path: PathBuf,
    /// Final PDF, overwritten on every job
    pub output: PathBuf,
    pub fonts_dir: PathBuf,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("index.html"),
            output: PathBuf::from("output_final.pdf"),
            fonts_dir: PathBuf::from("fonts"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    pub page_selector: String,
    pub chrome_executable: Option<PathBuf>,
    pub browser_args: Vec<String>,
    pub launch_timeout_ms: u64,
    pub navigation_timeout_ms: u64,
    pub font_timeout_ms: u64,
    pub layout_timeout_ms: u64,
    pub print_timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub settle_ms: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        let options = RenderOptions::default();
        let d = options.deadlines;
        Self {
            width: options.canvas.width,
            height: options.canvas.height,
            page_selector: options.page_selector,
            chrome_executable: None,
            browser_args: Vec::new(),
            launch_timeout_ms: d.launch.as_millis() as u64,
            navigation_timeout_ms: d.navigation.as_millis() as u64,
            font_timeout_ms: d.fonts.as_millis() as u64,
            layout_timeout_ms: d.layout.as_millis() as u64,
            print_timeout_ms: d.print.as_millis() as u64,
            poll_interval_ms: options.poll_interval.as_millis() as u64,
            settle_ms: options.settle.as_millis() as u64,
        }
    }
}

/// Address of one field; any part may be omitted
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FieldConfig {
    /// `data-field` identifier, defaults to the field name
    pub data_field: Option<String>,
    pub section: Option<String>,
    pub selector: Option<String>,
    #[serde(default)]
    pub index: usize,
}

impl FieldConfig {
    fn to_locator(&self, name: &str) -> FieldLocator {
        let locator = FieldLocator::named(self.data_field.as_deref().unwrap_or(name));
        match (&self.section, &self.selector) {
            (Some(section), Some(selector)) => locator.with_fallback(PositionalLocator::new(
                section.as_str(),
                selector.as_str(),
                self.index,
            )),
            _ => locator,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    /// Deadline for one whole patch/render/filter job
    pub timeout_ms: u64,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self { timeout_ms: 180_000 }
    }
}
