//! Render configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Logical pixel size of one output page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    /// CSS pixels per inch, used to turn the canvas into paper size
    pub const CSS_DPI: f64 = 96.0;

    pub fn paper_width_in(&self) -> f64 {
        self.width as f64 / Self::CSS_DPI
    }

    pub fn paper_height_in(&self) -> f64 {
        self.height as f64 / Self::CSS_DPI
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

impl FontStyle {
    pub fn as_css(&self) -> &'static str {
        match self {
            FontStyle::Normal => "normal",
            FontStyle::Italic => "italic",
        }
    }
}

/// A font file inlined into the page as an `@font-face` rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontFace {
    pub family: String,
    /// File name relative to the fonts directory
    pub file: String,
    #[serde(default = "default_weight")]
    pub weight: u16,
    #[serde(default)]
    pub style: FontStyle,
}

fn default_weight() -> u16 {
    400
}

impl FontFace {
    pub fn new(family: &str, file: &str, weight: u16, style: FontStyle) -> Self {
        Self {
            family: family.to_string(),
            file: file.to_string(),
            weight,
            style,
        }
    }

    /// Faces used by the stock report template
    pub fn report_defaults() -> Vec<FontFace> {
        use FontStyle::{Italic, Normal};
        vec![
            FontFace::new("ArialMT_lf", "ArialMT_lf.woff2", 400, Normal),
            FontFace::new("Lato-Semibold_n5", "Lato-Semibold_n5.woff2", 600, Normal),
            FontFace::new("Montserrat-Black_li", "Montserrat-Black_li.woff2", 900, Normal),
            FontFace::new("Montserrat-Bold_l7", "Montserrat-Bold_l7.woff2", 700, Normal),
            FontFace::new("Montserrat-Medium_l6", "Montserrat-Medium_l6.woff2", 500, Normal),
            FontFace::new(
                "Montserrat-SemiBoldItalic_m8",
                "Montserrat-SemiBoldItalic_m8.woff2",
                600,
                Italic,
            ),
            FontFace::new("Montserrat-SemiBold_l8", "Montserrat-SemiBold_l8.woff2", 600, Normal),
        ]
    }
}

/// Upper bound on each pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageDeadlines {
    pub launch: Duration,
    pub navigation: Duration,
    pub fonts: Duration,
    pub layout: Duration,
    pub print: Duration,
}

impl Default for StageDeadlines {
    fn default() -> Self {
        Self {
            launch: Duration::from_secs(30),
            navigation: Duration::from_secs(60),
            fonts: Duration::from_secs(30),
            layout: Duration::from_secs(10),
            print: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub canvas: Canvas,
    /// Containers that map 1:1 to output pages
    pub page_selector: String,
    /// Browser binary; auto-detected when `None`
    pub chrome_executable: Option<PathBuf>,
    /// Extra command-line flags for the browser
    pub browser_args: Vec<String>,
    pub fonts_dir: PathBuf,
    pub fonts: Vec<FontFace>,
    pub deadlines: StageDeadlines,
    /// How often font and document readiness are polled
    pub poll_interval: Duration,
    /// Extra wait after the readiness barrier for late layout, zero to disable
    pub settle: Duration,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            canvas: Canvas::default(),
            page_selector: ".page".to_string(),
            chrome_executable: None,
            browser_args: Vec::new(),
            fonts_dir: PathBuf::from("fonts"),
            fonts: FontFace::report_defaults(),
            deadlines: StageDeadlines::default(),
            poll_interval: Duration::from_millis(100),
            settle: Duration::from_millis(250),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_canvas_paper_size() {
        let canvas = Canvas::default();
        assert_eq!(canvas.paper_width_in(), 20.0);
        assert_eq!(canvas.paper_height_in(), 11.25);
    }

    #[test]
    fn test_default_settle_follows_barrier() {
        let options = RenderOptions::default();
        assert_eq!(options.settle, Duration::from_millis(250));
    }

    #[test]
    fn test_report_fonts() {
        let fonts = FontFace::report_defaults();
        assert_eq!(fonts.len(), 7);
        let italic: Vec<_> = fonts
            .iter()
            .filter(|f| f.style == FontStyle::Italic)
            .collect();
        assert_eq!(italic.len(), 1);
        assert_eq!(italic[0].weight, 600);
    }

    #[test]
    fn test_font_face_deserializes_with_defaults() {
        let face: FontFace =
            serde_json::from_str(r#"{"family":"Body","file":"body.woff2"}"#).unwrap();
        assert_eq!(face.weight, 400);
        assert_eq!(face.style, FontStyle::Normal);
    }
}
