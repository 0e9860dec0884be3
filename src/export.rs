//! Static error-page export.
//!
//! Renders every (template, known code) pair to `target_dir/<template>/<code>.html`
//! and optionally writes an index page linking all of them. Failures on one
//! file abort only that file; everything written before stays in place.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::format::Format;
use crate::render::{RenderContext, RenderOptions, Renderer};

/// Options for one export run.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Also write `index.html` listing every template and code
    pub index: bool,
}

/// Outcome of an export run.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExportSummary {
    /// Pages written successfully
    pub written: usize,
    /// Pages that failed to render or write
    pub failed: usize,
}

/// Render all pages into `target_dir`.
///
/// The target directory must already exist. A template subdirectory blocked
/// by a same-named regular file fails the run immediately; per-file render
/// and write errors are logged, counted and skipped.
pub fn export(config: &Config, target_dir: &Path, options: &ExportOptions) -> Result<ExportSummary> {
    if target_dir.as_os_str().is_empty() {
        return Err(Error::config("missing target directory"));
    }
    let metadata = fs::metadata(target_dir)
        .map_err(|e| Error::config(format!(
            "cannot access the target directory {}: {}",
            target_dir.display(),
            e
        )))?;
    if !metadata.is_dir() {
        return Err(Error::NotADirectory(target_dir.to_path_buf()));
    }

    config.validate()?;

    let renderer = Renderer::new(RenderOptions {
        minify_html: !config.disable_minification,
        json_override: None,
        xml_override: None,
    })?;

    // wildcard registry patterns have no concrete code and are skipped here
    let codes = config.codes.codes();
    let mut summary = ExportSummary::default();

    for name in config.templates.names() {
        let template_dir = target_dir.join(name);
        match fs::metadata(&template_dir) {
            Ok(m) if !m.is_dir() => return Err(Error::NotADirectory(template_dir)),
            Ok(_) => {}
            Err(_) => fs::create_dir_all(&template_dir)?,
        }

        for &code in &codes {
            let mut context = RenderContext::new(config.codes.describe(code));
            context.l10n_enabled = !config.disable_l10n;

            let path = template_dir.join(format!("{}.html", code));
            let outcome = renderer
                .render(&config.templates, name, &context, Format::Html)
                .and_then(|bytes| fs::write(&path, bytes).map_err(Error::from));

            match outcome {
                Ok(()) => {
                    tracing::debug!(path = %path.display(), "page written");
                    summary.written += 1;
                }
                Err(e) => {
                    tracing::error!(path = %path.display(), error = %e, "page export failed");
                    summary.failed += 1;
                }
            }
        }
    }

    if options.index {
        let index = render_index(config, &codes);
        fs::write(target_dir.join("index.html"), index)?;
        tracing::info!(dir = %target_dir.display(), "index page written");
    }

    tracing::info!(
        written = summary.written,
        failed = summary.failed,
        "export finished"
    );

    Ok(summary)
}

/// Build the index page listing every template and every known code.
///
/// Links are relative to the target directory so the tree can be served from
/// any prefix.
fn render_index(config: &Config, codes: &[u16]) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("    <meta charset=\"utf-8\"/>\n    <title>Error pages index</title>\n");
    html.push_str("</head>\n<body>\n<h1>Error pages index</h1>\n");

    for name in config.templates.names() {
        let _ = writeln!(html, "<h2>Template name: <code>{}</code></h2>\n<ul>", name);
        for &code in codes {
            let description = config.codes.describe(code);
            let _ = writeln!(
                html,
                "    <li><a href=\"./{name}/{code}.html\">{code}</a>: {message}</li>",
                name = name,
                code = code,
                message = description.message,
            );
        }
        html.push_str("</ul>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_lists_codes_ascending() {
        let mut config = Config::default();
        config.add_code_spec("599=Last/Description").unwrap();

        let html = render_index(&config, &config.codes.codes());
        let pos_400 = html.find(">400<").expect("400 should be listed");
        let pos_599 = html.find(">599<").expect("599 should be listed");
        assert!(pos_400 < pos_599, "codes should be listed in ascending order");
    }

    #[test]
    fn test_index_uses_relative_links() {
        let config = Config::default();
        let html = render_index(&config, &config.codes.codes());
        assert!(html.contains("href=\"./app-down/404.html\""));
        assert!(!html.contains("href=\"/"));
    }
}
