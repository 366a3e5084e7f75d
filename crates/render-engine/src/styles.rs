//! Stylesheets injected into the page before printing

use std::path::Path;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use tracing::debug;

use crate::error::RenderError;
use crate::options::{Canvas, FontFace};

/// Page-sizing rules that pin every page container to one physical page
///
/// The printed output carries a spacer page after each container; callers
/// drop those with `pagefilter-core`.
pub fn layout_css(canvas: Canvas, page_selector: &str) -> String {
    let Canvas { width, height } = canvas;
    format!(
        r#"
html, body {{
  margin: 0;
  padding: 0;
  width: {width}px;
  height: auto;
  background: #fff;
}}

.page-container {{
  margin: 0 auto;
  width: {width}px;
}}

{page_selector} {{
  width: {width}px;
  height: {height}px;
  page-break-inside: avoid;
}}

@page {{
  size: {width}px {height}px;
  margin: 0;
}}
"#
    )
}

fn font_format(file: &str) -> (&'static str, &'static str) {
    let ext = Path::new(file)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("woff") => ("font/woff", "woff"),
        Some("ttf") => ("font/ttf", "truetype"),
        Some("otf") => ("font/otf", "opentype"),
        _ => ("font/woff2", "woff2"),
    }
}

/// `@font-face` rules with each font inlined as a base64 data URL
///
/// Inlining avoids cross-origin and file-access restrictions on font
/// fetches. Any unreadable file fails the whole render.
pub async fn font_face_css(fonts_dir: &Path, fonts: &[FontFace]) -> Result<String, RenderError> {
    let mut css = String::new();

    for face in fonts {
        let path = fonts_dir.join(&face.file);
        let data = tokio::fs::read(&path)
            .await
            .map_err(|source| RenderError::FontAsset {
                path: path.clone(),
                source,
            })?;
        let (mime, format) = font_format(&face.file);
        debug!("Inlining font {} ({} bytes)", face.family, data.len());

        css.push_str(&format!(
            r#"
@font-face {{
  font-family: '{family}';
  src: url('data:{mime};charset=utf-8;base64,{data}') format('{format}');
  font-weight: {weight};
  font-style: {style};
  font-display: block;
}}
"#,
            family = face.family.replace('\'', "\\'"),
            data = BASE64.encode(&data),
            weight = face.weight,
            style = face.style.as_css(),
        ));
    }

    Ok(css)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::FontStyle;

    #[test]
    fn test_layout_css_uses_canvas() {
        let css = layout_css(Canvas::default(), ".page");
        assert!(css.contains("size: 1920px 1080px;"));
        assert!(css.contains(".page {\n  width: 1920px;\n  height: 1080px;"));
        assert!(css.contains("page-break-inside: avoid;"));
    }

    #[test]
    fn test_layout_css_custom_selector() {
        let css = layout_css(
            Canvas {
                width: 800,
                height: 600,
            },
            "section.slide",
        );
        assert!(css.contains("section.slide {\n  width: 800px;\n  height: 600px;"));
    }

    #[test]
    fn test_font_format_by_extension() {
        assert_eq!(font_format("a.woff2"), ("font/woff2", "woff2"));
        assert_eq!(font_format("a.WOFF"), ("font/woff", "woff"));
        assert_eq!(font_format("a.ttf"), ("font/ttf", "truetype"));
    }

    #[tokio::test]
    async fn test_font_face_css_inlines_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Body.woff2"), b"wOF2").unwrap();
        let fonts = vec![FontFace::new("Body", "Body.woff2", 600, FontStyle::Italic)];

        let css = font_face_css(dir.path(), &fonts).await.unwrap();

        assert!(css.contains("font-family: 'Body';"));
        assert!(css.contains("data:font/woff2;charset=utf-8;base64,d09GMg=="));
        assert!(css.contains("font-weight: 600;"));
        assert!(css.contains("font-style: italic;"));
        assert!(css.contains("font-display: block;"));
    }

    #[tokio::test]
    async fn test_missing_font_is_asset_error() {
        let dir = tempfile::tempdir().unwrap();
        let fonts = vec![FontFace::new("Gone", "Gone.woff2", 400, FontStyle::Normal)];

        let err = font_face_css(dir.path(), &fonts).await.unwrap_err();

        assert!(matches!(err, RenderError::FontAsset { .. }));
        assert!(err.to_string().contains("Gone.woff2"));
    }
}
