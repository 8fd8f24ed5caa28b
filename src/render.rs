//! Marker-based template rendering.
//!
//! A renderer takes a template document and a fragment file, and rewrites the
//! fragment file in place so it holds the complete document. The original
//! fragment text is gone afterwards, which makes rendering **not idempotent**:
//! rendering an already-rendered file wraps it in a second copy of the
//! template.
//!
//! ## Default Mode
//!
//! ```text
//! <html>
//! <head>
//!   <title>Page Title</title>     ← "Page Title" replaced with the page title
//! </head>
//! <body>                          ← anchor
//!
//!                                 ← fragment inserted here (anchor + 2)
//! </body>
//! </html>
//! ```
//!
//! ## Toolbox Mode
//!
//! Uppercase tokens anywhere in a line are substituted on the first line
//! that carries them:
//!
//! | Token | Replacement |
//! |-------|-------------|
//! | `PAGE TITLE` | page title |
//! | `HEADER TITLE` | page title |
//! | `CONTENT` | fragment text |
//! | `FILENAME` | file path relative to the output root |
//! | `BREADCRUMB` | breadcrumb navigation (optional token) |
//!
//! Marker lines are located on the pristine template before anything is
//! substituted, so fragment text that happens to contain a token is left
//! alone.

use crate::naming;
use crate::registry::Converter;
use maud::html;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const TITLE_MARKER: &str = "<title>";
pub const TITLE_PLACEHOLDER: &str = "Page Title";
pub const BODY_MARKER: &str = "<body>";

/// Lines between the body anchor and the inserted fragment.
const BODY_OFFSET: usize = 2;

pub const PAGE_TITLE_TOKEN: &str = "PAGE TITLE";
pub const HEADER_TITLE_TOKEN: &str = "HEADER TITLE";
pub const CONTENT_TOKEN: &str = "CONTENT";
pub const FILENAME_TOKEN: &str = "FILENAME";
pub const BREADCRUMB_TOKEN: &str = "BREADCRUMB";

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Cannot read template {}: {source}", .path.display())]
    TemplateRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Marker `{marker}` not found in template {}", .template.display())]
    MarkerNotFound {
        marker: &'static str,
        template: PathBuf,
    },
}

/// Load a template keeping each line's terminator.
fn load_template(path: &Path) -> Result<Vec<String>, RenderError> {
    let text = fs::read_to_string(path).map_err(|source| RenderError::TemplateRead {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(text.split_inclusive('\n').map(str::to_string).collect())
}

fn find_marker(lines: &[String], marker: &'static str, template: &Path) -> Result<usize, RenderError> {
    lines
        .iter()
        .position(|line| line.contains(marker))
        .ok_or_else(|| RenderError::MarkerNotFound {
            marker,
            template: template.to_path_buf(),
        })
}

/// Render `content_file` through `template` using the default markers.
///
/// `file_name` is the bare file name the page title is derived from.
pub fn render(template: &Path, content_file: &Path, file_name: &str) -> Result<(), RenderError> {
    let mut lines = load_template(template)?;

    let title_index = find_marker(&lines, TITLE_MARKER, template)?;
    let title = naming::page_title(file_name);
    lines[title_index] = lines[title_index].replace(TITLE_PLACEHOLDER, &title);

    let body_index = find_marker(&lines, BODY_MARKER, template)?;

    let mut content = fs::read_to_string(content_file)?;
    if !content.ends_with('\n') {
        content.push('\n');
    }

    let insert_at = (body_index + BODY_OFFSET).min(lines.len());
    if insert_at == lines.len()
        && let Some(last) = lines.last_mut()
        && !last.ends_with('\n')
    {
        last.push('\n');
    }
    lines.insert(insert_at, content);

    fs::write(content_file, lines.concat())?;
    Ok(())
}

/// The built-in default converter.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkerRenderer;

impl Converter for MarkerRenderer {
    fn convert(&self, content_file: &Path, file_name: &str, template: &Path) -> Result<(), RenderError> {
        render(template, content_file, file_name)
    }
}

/// Toolbox-mode converter.
///
/// Bound to the output root so it can derive the breadcrumb trail and the
/// relative `FILENAME` reference from a file's position in the tree.
#[derive(Debug, Clone)]
pub struct ToolboxRenderer {
    output_root: PathBuf,
}

impl ToolboxRenderer {
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
        }
    }

    pub fn render(&self, template: &Path, content_file: &Path, file_name: &str) -> Result<(), RenderError> {
        let mut lines = load_template(template)?;

        let title_index = find_marker(&lines, PAGE_TITLE_TOKEN, template)?;
        let header_index = find_marker(&lines, HEADER_TITLE_TOKEN, template)?;
        let content_index = find_marker(&lines, CONTENT_TOKEN, template)?;
        let filename_index = find_marker(&lines, FILENAME_TOKEN, template)?;
        let breadcrumb_index = lines.iter().position(|l| l.contains(BREADCRUMB_TOKEN));

        let title = naming::page_title(file_name);
        let relative = naming::path_key(&self.output_root, content_file);
        let content = fs::read_to_string(content_file)?;

        substitute(&mut lines, title_index, PAGE_TITLE_TOKEN, &title);
        substitute(&mut lines, header_index, HEADER_TITLE_TOKEN, &title);
        if let Some(index) = breadcrumb_index {
            substitute(&mut lines, index, BREADCRUMB_TOKEN, &breadcrumb(&relative, &title));
        }
        substitute(&mut lines, filename_index, FILENAME_TOKEN, &relative);
        // Last, so nothing scans the inserted fragment for tokens.
        substitute(&mut lines, content_index, CONTENT_TOKEN, &content);

        fs::write(content_file, lines.concat())?;
        Ok(())
    }
}

impl Converter for ToolboxRenderer {
    fn convert(&self, content_file: &Path, file_name: &str, template: &Path) -> Result<(), RenderError> {
        self.render(template, content_file, file_name)
    }
}

fn substitute(lines: &mut [String], index: usize, token: &str, value: &str) {
    lines[index] = lines[index].replace(token, value);
}

/// Breadcrumb navigation for a page at `relative_path` (output-root relative).
///
/// One link per directory level, starting with the root labelled `home`,
/// each pointing at that directory's `index.html`. The page itself closes
/// the trail as plain text.
///
/// ```text
/// guides/setup/install.html
/// → home (../../index.html) / guides (../index.html) / setup (index.html) / install
/// ```
pub fn breadcrumb(relative_path: &str, title: &str) -> String {
    let mut dirs: Vec<&str> = relative_path.split('/').filter(|s| !s.is_empty()).collect();
    dirs.pop();
    let depth = dirs.len();

    let mut crumbs = vec![("home".to_string(), format!("{}index.html", "../".repeat(depth)))];
    for (i, dir) in dirs.iter().enumerate() {
        let up = depth - i - 1;
        crumbs.push((
            naming::directory_title(dir),
            format!("{}index.html", "../".repeat(up)),
        ));
    }

    html! {
        nav.breadcrumb {
            @for (label, href) in &crumbs {
                a href=(href) { (label) }
                " / "
            }
            span { (title) }
        }
    }
    .into_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use tempfile::TempDir;

    fn render_fragment(template: &str, file_name: &str, fragment: &str) -> (TempDir, String) {
        let tmp = TempDir::new().unwrap();
        let template_path = tmp.path().join("template.html");
        let file = tmp.path().join(file_name);
        std::fs::write(&template_path, template).unwrap();
        std::fs::write(&file, fragment).unwrap();
        render(&template_path, &file, file_name).unwrap();
        let rendered = std::fs::read_to_string(&file).unwrap();
        (tmp, rendered)
    }

    // =========================================================================
    // Default mode
    // =========================================================================

    #[test]
    fn title_derived_from_file_name() {
        let (_tmp, out) = render_fragment(DEFAULT_TEMPLATE, "index.html", "<p>hi</p>");
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[2], "  <title>index</title>");
    }

    #[test]
    fn underscored_name_becomes_spaced_title() {
        let (_tmp, out) = render_fragment(DEFAULT_TEMPLATE, "getting_started.html", "x");
        assert!(out.contains("<title>getting started</title>"));
    }

    #[test]
    fn content_inserted_two_lines_after_body() {
        let (_tmp, out) = render_fragment(DEFAULT_TEMPLATE, "index.html", "<p>hi</p>");
        let lines: Vec<&str> = out.lines().collect();
        let body = lines.iter().position(|l| l.contains("<body>")).unwrap();
        assert_eq!(lines[body + 2], "<p>hi</p>");
        assert_eq!(lines[body + 3], "</body>");
    }

    #[test]
    fn multiline_fragment_kept_as_block() {
        let (_tmp, out) =
            render_fragment(DEFAULT_TEMPLATE, "index.html", "<h1>A</h1>\n<p>B</p>\n");
        assert!(out.contains("\n<h1>A</h1>\n<p>B</p>\n</body>"));
    }

    #[test]
    fn body_anchor_at_end_of_template() {
        let template = "<title>Page Title</title>\n<body>";
        let (_tmp, out) = render_fragment(template, "a.html", "<p>x</p>");
        assert_eq!(out, "<title>a</title>\n<body>\n<p>x</p>\n");
    }

    #[test]
    fn missing_title_marker_is_error() {
        let tmp = TempDir::new().unwrap();
        let template = tmp.path().join("t.html");
        let file = tmp.path().join("a.html");
        std::fs::write(&template, "<body>\n\n</body>\n").unwrap();
        std::fs::write(&file, "<p>x</p>").unwrap();

        let err = render(&template, &file, "a.html").unwrap_err();
        assert!(matches!(
            err,
            RenderError::MarkerNotFound { marker: TITLE_MARKER, .. }
        ));
        // Fragment left untouched
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "<p>x</p>");
    }

    #[test]
    fn missing_body_marker_is_error() {
        let tmp = TempDir::new().unwrap();
        let template = tmp.path().join("t.html");
        let file = tmp.path().join("a.html");
        std::fs::write(&template, "<title>Page Title</title>\n").unwrap();
        std::fs::write(&file, "<p>x</p>").unwrap();

        let err = render(&template, &file, "a.html").unwrap_err();
        assert!(matches!(
            err,
            RenderError::MarkerNotFound { marker: BODY_MARKER, .. }
        ));
    }

    #[test]
    fn missing_template_is_template_read_error() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("a.html");
        std::fs::write(&file, "x").unwrap();
        let err = render(&tmp.path().join("nope.html"), &file, "a.html").unwrap_err();
        assert!(matches!(err, RenderError::TemplateRead { .. }));
    }

    #[test]
    fn rendering_twice_nests_templates() {
        let tmp = TempDir::new().unwrap();
        let template = tmp.path().join("t.html");
        let file = tmp.path().join("index.html");
        std::fs::write(&template, DEFAULT_TEMPLATE).unwrap();
        std::fs::write(&file, "<p>hi</p>").unwrap();

        render(&template, &file, "index.html").unwrap();
        let once = std::fs::read_to_string(&file).unwrap();
        render(&template, &file, "index.html").unwrap();
        let twice = std::fs::read_to_string(&file).unwrap();

        assert_ne!(once, twice);
        assert_eq!(once.matches("<body>").count(), 1);
        assert_eq!(twice.matches("<body>").count(), 2);
        assert_eq!(twice.matches("<title>index</title>").count(), 2);
        assert_eq!(twice.matches("<p>hi</p>").count(), 1);
    }

    #[test]
    fn marker_renderer_converts_through_trait() {
        let tmp = TempDir::new().unwrap();
        let template = tmp.path().join("t.html");
        let file = tmp.path().join("about.html");
        std::fs::write(&template, DEFAULT_TEMPLATE).unwrap();
        std::fs::write(&file, "<p>me</p>").unwrap();

        MarkerRenderer.convert(&file, "about.html", &template).unwrap();
        let out = std::fs::read_to_string(&file).unwrap();
        assert!(out.contains("<title>about</title>"));
        assert!(out.contains("<p>me</p>"));
    }

    // =========================================================================
    // Toolbox mode
    // =========================================================================

    fn toolbox_render(relative: &str, fragment: &str) -> String {
        let tmp = TempDir::new().unwrap();
        let template = tmp.path().join("toolbox_template.html");
        std::fs::write(&template, TOOLBOX_TEMPLATE).unwrap();
        let out_root = tmp.path().join("out");
        let file = out_root.join(relative);
        std::fs::create_dir_all(file.parent().unwrap()).unwrap();
        std::fs::write(&file, fragment).unwrap();
        let name = file.file_name().unwrap().to_string_lossy().into_owned();

        ToolboxRenderer::new(&out_root)
            .render(&template, &file, &name)
            .unwrap();
        std::fs::read_to_string(&file).unwrap()
    }

    #[test]
    fn toolbox_replaces_titles() {
        let out = toolbox_render("tools/hex_editor.html", "<p>x</p>");
        assert!(out.contains("<title>hex editor</title>"));
        assert!(out.contains("<h1>hex editor</h1>"));
        assert!(!out.contains("PAGE TITLE"));
        assert!(!out.contains("HEADER TITLE"));
    }

    #[test]
    fn toolbox_inserts_content() {
        let out = toolbox_render("tools/hex_editor.html", "<p>bytes</p>");
        assert!(out.contains("<main><p>bytes</p></main>"));
    }

    #[test]
    fn toolbox_filename_is_output_relative() {
        let out = toolbox_render("tools/hex_editor.html", "<p>x</p>");
        assert!(out.contains("source: tools/hex_editor.html"));
    }

    #[test]
    fn toolbox_content_with_token_words_untouched() {
        let out = toolbox_render("a.html", "FILENAME and PAGE TITLE");
        assert!(out.contains("<main>FILENAME and PAGE TITLE</main>"));
        assert!(out.contains("source: a.html"));
    }

    #[test]
    fn toolbox_breadcrumb_links_each_level() {
        let out = toolbox_render("guides/setup/install.html", "x");
        assert!(out.contains(
            r#"<nav class="breadcrumb"><a href="../../index.html">home</a> / <a href="../index.html">guides</a> / <a href="index.html">setup</a> / <span>install</span></nav>"#
        ));
    }

    #[test]
    fn toolbox_missing_required_token_is_error() {
        let tmp = TempDir::new().unwrap();
        let template = tmp.path().join("t.html");
        std::fs::write(&template, "PAGE TITLE\nHEADER TITLE\nCONTENT\n").unwrap();
        let file = tmp.path().join("a.html");
        std::fs::write(&file, "x").unwrap();

        let err = ToolboxRenderer::new(tmp.path())
            .render(&template, &file, "a.html")
            .unwrap_err();
        assert!(matches!(
            err,
            RenderError::MarkerNotFound { marker: FILENAME_TOKEN, .. }
        ));
    }

    #[test]
    fn toolbox_without_breadcrumb_token_renders() {
        let tmp = TempDir::new().unwrap();
        let template = tmp.path().join("t.html");
        std::fs::write(&template, "PAGE TITLE\nHEADER TITLE\nCONTENT\nFILENAME\n").unwrap();
        let file = tmp.path().join("a_b.html");
        std::fs::write(&file, "body").unwrap();

        ToolboxRenderer::new(tmp.path())
            .render(&template, &file, "a_b.html")
            .unwrap();
        assert_eq!(
            std::fs::read_to_string(&file).unwrap(),
            "a b\na b\nbody\na_b.html\n"
        );
    }

    // =========================================================================
    // Breadcrumbs
    // =========================================================================

    #[test]
    fn breadcrumb_at_root() {
        assert_eq!(
            breadcrumb("index.html", "index"),
            r#"<nav class="breadcrumb"><a href="index.html">home</a> / <span>index</span></nav>"#
        );
    }

    #[test]
    fn breadcrumb_directory_titles_spaced() {
        let crumb = breadcrumb("user_guides/intro.html", "intro");
        assert!(crumb.contains(r#"<a href="index.html">user guides</a>"#));
        assert!(crumb.contains(r#"<a href="../index.html">home</a>"#));
    }

    #[test]
    fn breadcrumb_escapes_title() {
        let crumb = breadcrumb("a.html", "<b>");
        assert!(crumb.contains("<span>&lt;b&gt;</span>"));
    }
}
