//! Rendering of error pages into the negotiated output format.
//!
//! HTML goes through the stored page template; JSON and XML use a built-in
//! structured document unless an override template is configured; plain text
//! is assembled directly from the code description.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tera::Tera;

use crate::error::{Error, Result};
use crate::format::Format;
use crate::registry::CodeDescriptor;
use crate::store::{error_chain, TemplateStore};

/// Everything a template can reference while rendering one page.
///
/// The detail fields come from proxied request headers and are only
/// populated when detail output is enabled; they are intentionally not part
/// of the response cache key.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RenderContext {
    /// Concrete HTTP code
    pub code: u16,
    /// Short status line
    pub message: String,
    /// Longer explanation
    pub description: String,
    /// Whether templates should show request details
    pub show_details: bool,
    /// Whether templates may emit their localization hooks
    pub l10n_enabled: bool,
    /// `Host` header of the original request
    pub host: Option<String>,
    /// `X-Original-URI` of the original request
    pub original_uri: Option<String>,
    /// `X-Forwarded-For` of the original request
    pub forwarded_for: Option<String>,
    /// `X-Request-ID` of the original request
    pub request_id: Option<String>,
}

impl RenderContext {
    /// Build a context from a resolved code description.
    pub fn new(descriptor: CodeDescriptor) -> Self {
        Self {
            code: descriptor.code,
            message: descriptor.message,
            description: descriptor.description,
            l10n_enabled: true,
            ..Self::default()
        }
    }

    fn to_tera(&self) -> Result<tera::Context> {
        tera::Context::from_serialize(self)
            .map_err(|e| Error::render(format!("context serialization: {}", error_chain(&e))))
    }
}

/// Structured document emitted for the built-in JSON and XML formats.
#[derive(Debug, Serialize)]
struct ErrorDocument<'a> {
    code: u16,
    message: &'a str,
    description: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<DocumentDetails<'a>>,
}

#[derive(Debug, Serialize)]
struct DocumentDetails<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    host: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    original_uri: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    forwarded_for: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_id: Option<&'a str>,
}

impl<'a> ErrorDocument<'a> {
    fn from_context(ctx: &'a RenderContext) -> Self {
        let details = if ctx.show_details {
            Some(DocumentDetails {
                host: ctx.host.as_deref(),
                original_uri: ctx.original_uri.as_deref(),
                forwarded_for: ctx.forwarded_for.as_deref(),
                request_id: ctx.request_id.as_deref(),
            })
        } else {
            None
        };

        Self {
            code: ctx.code,
            message: &ctx.message,
            description: &ctx.description,
            details,
        }
    }
}

/// Renderer options, derived from configuration at startup.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Strip comments and inter-tag whitespace from HTML output
    pub minify_html: bool,
    /// Template overriding the built-in JSON document
    pub json_override: Option<String>,
    /// Template overriding the built-in XML document
    pub xml_override: Option<String>,
}

// Internal names for the compiled override templates.
const JSON_OVERRIDE: &str = "json-format";
const XML_OVERRIDE: &str = "xml-format";

/// Turns (template, context, format) into response bytes.
///
/// Override templates are compiled once at construction, so malformed
/// overrides fail at startup rather than on the first request.
#[derive(Debug, Default)]
pub struct Renderer {
    overrides: Tera,
    minify_html: bool,
    has_json_override: bool,
    has_xml_override: bool,
}

impl Renderer {
    /// Create a renderer, compiling any configured override templates.
    pub fn new(options: RenderOptions) -> Result<Self> {
        let mut overrides = Tera::default();
        for (name, source) in [
            (JSON_OVERRIDE, &options.json_override),
            (XML_OVERRIDE, &options.xml_override),
        ] {
            if let Some(source) = source {
                overrides
                    .add_raw_template(name, source)
                    .map_err(|e| Error::TemplateCompilation {
                        template: name.to_owned(),
                        error: error_chain(&e),
                    })?;
            }
        }

        Ok(Self {
            overrides,
            minify_html: options.minify_html,
            has_json_override: options.json_override.is_some(),
            has_xml_override: options.xml_override.is_some(),
        })
    }

    /// Render one page through the named stored template.
    ///
    /// Failures here are per-request errors; callers map them to a 500-class
    /// response or a reported per-file export failure.
    pub fn render(
        &self,
        store: &TemplateStore,
        template: &str,
        context: &RenderContext,
        format: Format,
    ) -> Result<Vec<u8>> {
        let output = match format {
            Format::Html => {
                let html = store.render(template, &context.to_tera()?)?;
                if self.minify_html {
                    minify_html(&html)
                } else {
                    html
                }
            }
            Format::Json => {
                if self.has_json_override {
                    self.render_override(JSON_OVERRIDE, context)?
                } else {
                    serde_json::to_string(&ErrorDocument::from_context(context))?
                }
            }
            Format::Xml => {
                if self.has_xml_override {
                    self.render_override(XML_OVERRIDE, context)?
                } else {
                    let body =
                        quick_xml::se::to_string_with_root("error", &ErrorDocument::from_context(context))
                            .map_err(|e| Error::render(format!("xml serialization: {}", e)))?;
                    format!("{}\n{}", r#"<?xml version="1.0" encoding="utf-8"?>"#, body)
                }
            }
            Format::PlainText => {
                let mut parts = Vec::with_capacity(2);
                if !context.message.is_empty() {
                    parts.push(context.message.as_str());
                }
                if !context.description.is_empty() {
                    parts.push(context.description.as_str());
                }
                parts.join("\n")
            }
        };

        Ok(output.into_bytes())
    }

    fn render_override(&self, name: &str, context: &RenderContext) -> Result<String> {
        self.overrides
            .render(name, &context.to_tera()?)
            .map_err(|e| Error::render(format!("override {}: {}", name, error_chain(&e))))
    }
}

static HTML_COMMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid comment regex"));
static BETWEEN_TAGS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r">\s+<").expect("valid inter-tag regex"));
static LINE_INDENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]+").expect("valid indent regex"));

/// Strip HTML comments and collapse whitespace between tags.
pub fn minify_html(html: &str) -> String {
    let output = HTML_COMMENT.replace_all(html, "");
    let output = BETWEEN_TAGS.replace_all(&output, "><");
    let output = LINE_INDENT.replace_all(&output, "");
    output.trim().to_owned()
}
