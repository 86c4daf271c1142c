//! HTML preparation pipeline.
//!
//! Lightweight rendering engines choke on author CSS and scripts, so source
//! documents are rewritten before they reach the renderer: author styling is
//! stripped out and a print-oriented stylesheet is injected into the head.

use regex::Regex;

/// Preparation preset levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PreparePreset {
    /// Pass documents through untouched.
    Off,
    /// Inject the print stylesheet without touching author markup.
    Minimal,
    /// Strip author styling and scripts, then inject the print stylesheet.
    #[default]
    Standard,
}

/// Options for HTML preparation.
#[derive(Debug, Clone)]
pub struct PrepareOptions {
    /// Remove `<style>` blocks.
    pub strip_style_blocks: bool,

    /// Remove inline `style=` attributes.
    pub strip_inline_styles: bool,

    /// Remove `<link rel="stylesheet">` references.
    pub strip_stylesheet_links: bool,

    /// Remove `<script>` blocks.
    pub strip_scripts: bool,

    /// Remove `class=` attributes left dangling once styles are gone.
    pub strip_class_attributes: bool,

    /// Insert the print stylesheet into the document head.
    pub inject_page_styles: bool,
}

impl PrepareOptions {
    /// Create options from a preset.
    pub fn from_preset(preset: PreparePreset) -> Self {
        match preset {
            PreparePreset::Off => Self::off(),
            PreparePreset::Minimal => Self::minimal(),
            PreparePreset::Standard => Self::standard(),
        }
    }

    /// Pass-through options.
    pub fn off() -> Self {
        Self {
            strip_style_blocks: false,
            strip_inline_styles: false,
            strip_stylesheet_links: false,
            strip_scripts: false,
            strip_class_attributes: false,
            inject_page_styles: false,
        }
    }

    /// Stylesheet injection only.
    pub fn minimal() -> Self {
        Self {
            inject_page_styles: true,
            ..Self::off()
        }
    }

    /// Full sanitization plus stylesheet injection.
    pub fn standard() -> Self {
        Self {
            strip_style_blocks: true,
            strip_inline_styles: true,
            strip_stylesheet_links: true,
            strip_scripts: true,
            strip_class_attributes: true,
            inject_page_styles: true,
        }
    }
}

impl Default for PrepareOptions {
    fn default() -> Self {
        Self::standard()
    }
}

/// Print stylesheet injected into prepared documents: A4 pages, page-break
/// hints around headings and tables, readable defaults for code and quotes.
const PAGE_CSS: &str = r#"<style type="text/css">
@page { size: A4; margin: 0.75in; }
body { font-family: Arial, sans-serif; line-height: 1.4; color: #333; font-size: 12pt; }
h1, h2, h3, h4, h5, h6 { page-break-after: avoid; margin-top: 1em; margin-bottom: 0.5em; color: #222; }
h1 { font-size: 18pt; }
h2 { font-size: 16pt; }
h3 { font-size: 14pt; }
h4 { font-size: 13pt; }
h5 { font-size: 12pt; }
h6 { font-size: 11pt; }
p { margin-bottom: 0.8em; text-align: justify; }
img { max-width: 100%; height: auto; page-break-inside: avoid; }
table { page-break-inside: avoid; border-collapse: collapse; width: 100%; margin-bottom: 1em; }
table td, table th { border: 1px solid #ddd; padding: 8px; text-align: left; }
table th { background-color: #f2f2f2; font-weight: bold; }
pre, code { font-family: "Courier New", monospace; background-color: #f5f5f5; font-size: 11pt; }
pre { padding: 1em; page-break-inside: avoid; border: 1px solid #ddd; }
blockquote { margin: 1em 2em; padding-left: 1em; border-left: 3px solid #ddd; color: #666; }
ul, ol { padding-left: 2em; margin-bottom: 1em; }
a { color: #0066cc; text-decoration: underline; }
.page-break { page-break-before: always; }
</style>"#;

/// HTML preparation pipeline.
pub struct PreparePipeline {
    options: PrepareOptions,
    style_block: Regex,
    script_block: Regex,
    stylesheet_link: Regex,
    inline_style: Regex,
    class_attr: Regex,
}

impl PreparePipeline {
    /// Create a new pipeline with the given options.
    pub fn new(options: PrepareOptions) -> Self {
        Self {
            options,
            style_block: Regex::new(r"(?is)<style[^>]*>.*?</style>").unwrap(),
            script_block: Regex::new(r"(?is)<script[^>]*>.*?</script>").unwrap(),
            stylesheet_link: Regex::new(r#"(?i)<link[^>]*rel\s*=\s*["']stylesheet["'][^>]*>"#)
                .unwrap(),
            inline_style: Regex::new(r#"(?i)\sstyle\s*=\s*("[^"]*"|'[^']*')"#).unwrap(),
            class_attr: Regex::new(r#"(?i)\sclass\s*=\s*("[^"]*"|'[^']*')"#).unwrap(),
        }
    }

    /// Create a pipeline from a preset.
    pub fn from_preset(preset: PreparePreset) -> Self {
        Self::new(PrepareOptions::from_preset(preset))
    }

    /// Rewrite one document for rendering.
    pub fn process(&self, html: &str) -> String {
        let mut result = html.to_string();

        if self.options.strip_style_blocks {
            result = self.style_block.replace_all(&result, "").into_owned();
        }
        if self.options.strip_scripts {
            result = self.script_block.replace_all(&result, "").into_owned();
        }
        if self.options.strip_stylesheet_links {
            result = self.stylesheet_link.replace_all(&result, "").into_owned();
        }
        if self.options.strip_inline_styles {
            result = self.inline_style.replace_all(&result, "").into_owned();
        }
        if self.options.strip_class_attributes {
            result = self.class_attr.replace_all(&result, "").into_owned();
        }

        if self.options.inject_page_styles {
            result = inject_into_head(&result);
        }

        result
    }
}

impl Default for PreparePipeline {
    fn default() -> Self {
        Self::new(PrepareOptions::default())
    }
}

/// Insert the print stylesheet right after `<head>`, creating the head (or a
/// whole document shell) when the source lacks one.
fn inject_into_head(html: &str) -> String {
    let lower = html.to_lowercase();

    if let Some(pos) = lower.find("<head>") {
        let insert_at = pos + "<head>".len();
        format!("{}{}{}", &html[..insert_at], PAGE_CSS, &html[insert_at..])
    } else if let Some(pos) = lower.find("<html>") {
        let insert_at = pos + "<html>".len();
        format!(
            "{}<head>{}</head>{}",
            &html[..insert_at],
            PAGE_CSS,
            &html[insert_at..]
        )
    } else {
        format!("<html><head>{}</head><body>{}</body></html>", PAGE_CSS, html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_strips_author_styling() {
        let pipeline = PreparePipeline::default();
        let html = r#"<html><head><style>body { color: red; }</style>
<link rel="stylesheet" href="site.css"></head>
<body><p style="color: blue" class="lead">Hello</p>
<script>alert(1)</script></body></html>"#;

        let prepared = pipeline.process(html);
        assert!(!prepared.contains("color: red"));
        assert!(!prepared.contains("site.css"));
        assert!(!prepared.contains("color: blue"));
        assert!(!prepared.contains("class="));
        assert!(!prepared.contains("alert"));
        assert!(prepared.contains("@page { size: A4;"));
        assert!(prepared.contains("<p >Hello</p>") || prepared.contains("<p>Hello</p>"));
    }

    #[test]
    fn test_injects_head_when_missing() {
        let pipeline = PreparePipeline::from_preset(PreparePreset::Minimal);
        let prepared = pipeline.process("<html><body><p>Hi</p></body></html>");
        assert!(prepared.contains("<head><style"));
        assert!(prepared.contains("<p>Hi</p>"));
    }

    #[test]
    fn test_wraps_bare_fragment() {
        let pipeline = PreparePipeline::from_preset(PreparePreset::Minimal);
        let prepared = pipeline.process("<p>Fragment</p>");
        assert!(prepared.starts_with("<html><head>"));
        assert!(prepared.ends_with("</body></html>"));
        assert!(prepared.contains("<p>Fragment</p>"));
    }

    #[test]
    fn test_off_preset_is_identity() {
        let pipeline = PreparePipeline::from_preset(PreparePreset::Off);
        let html = "<html><head><style>x</style></head><body></body></html>";
        assert_eq!(pipeline.process(html), html);
    }

    #[test]
    fn test_multiline_style_block() {
        let pipeline = PreparePipeline::default();
        let html = "<html><head><style>\nbody {\n  margin: 0;\n}\n</style></head><body></body></html>";
        let prepared = pipeline.process(html);
        assert!(!prepared.contains("margin: 0"));
    }
}
