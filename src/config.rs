//! Runtime configuration: the code registry, the template store and the
//! serving options assembled from flags and environment variables.

use crate::error::{Error, Result};
use crate::registry::{CodeDescription, CodeRegistry};
use crate::rotation::RotationMode;
use crate::store::TemplateStore;

/// Built-in page templates, embedded at compile time.
const BUILT_IN_TEMPLATES: &[(&str, &str)] = &[
    ("app-down", include_str!("../templates/app-down.html")),
    ("cable", include_str!("../templates/cable.html")),
    ("ghost", include_str!("../templates/ghost.html")),
];

/// Built-in HTTP code descriptions, including the class-level fallbacks.
const BUILT_IN_CODES: &[(&str, &str, &str)] = &[
    ("400", "Bad Request", "The server did not understand the request"),
    ("401", "Unauthorized", "The requested page needs a username and a password"),
    ("403", "Forbidden", "Access is forbidden to the requested page"),
    ("404", "Not Found", "The server can not find the requested page"),
    ("405", "Method Not Allowed", "The method specified in the request is not allowed"),
    ("407", "Proxy Authentication Required", "You must authenticate with a proxy server before this request can be served"),
    ("408", "Request Timeout", "The request took longer than the server was prepared to wait"),
    ("409", "Conflict", "The request could not be completed because of a conflict"),
    ("410", "Gone", "The requested page is no longer available"),
    ("411", "Length Required", "The Content-Length is not defined; the server will not accept the request without it"),
    ("412", "Precondition Failed", "The pre condition given in the request evaluated to false by the server"),
    ("413", "Payload Too Large", "The server will not accept the request, because the request entity is too large"),
    ("416", "Requested Range Not Satisfiable", "The requested byte range is not available and is out of bounds"),
    ("418", "I'm a teapot", "Attempt to brew coffee with a teapot is not supported"),
    ("429", "Too Many Requests", "Too many requests in a given amount of time"),
    ("500", "Internal Server Error", "The server met an unexpected condition"),
    ("502", "Bad Gateway", "The server received an invalid response from the upstream server"),
    ("503", "Service Unavailable", "The server is temporarily overloading or down"),
    ("504", "Gateway Timeout", "The gateway has timed out"),
    ("505", "HTTP Version Not Supported", "The server does not support the requested HTTP protocol version"),
    ("4**", "Client Error", "An error occurred while processing the request"),
    ("5**", "Server Error", "The server encountered an internal error while processing the request"),
];

/// Configuration shared by the HTTP server and the static exporter.
///
/// The registry and the template store are read-only once serving starts;
/// all mutation happens here, strictly before a server or an export run is
/// constructed.
#[derive(Debug)]
pub struct Config {
    /// HTTP code registry
    pub codes: CodeRegistry,
    /// Named page templates
    pub templates: TemplateStore,
    /// Template served when rotation is disabled
    pub template_name: String,
    /// Template rotation policy
    pub rotation_mode: RotationMode,
    /// Show request details in responses when the template supports it
    pub show_details: bool,
    /// Suppress template localization hooks
    pub disable_l10n: bool,
    /// Code rendered for the index page (`/`)
    pub default_code_to_render: u16,
    /// HTTP status returned for the index page
    pub default_http_code: u16,
    /// Request headers proxied onto error page responses
    pub proxy_headers: Vec<String>,
    /// Skip HTML minification
    pub disable_minification: bool,
    /// Override template for JSON responses
    pub json_format: Option<String>,
    /// Override template for XML responses
    pub xml_format: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        let mut templates = TemplateStore::new();
        for (name, source) in BUILT_IN_TEMPLATES {
            // built-ins are compiled as part of the test suite, they cannot fail
            if let Err(e) = templates.add(name, source) {
                unreachable!("built-in template {} failed to compile: {}", name, e);
            }
        }

        let mut codes = CodeRegistry::new();
        for (pattern, message, description) in BUILT_IN_CODES {
            if let Err(e) = codes.add(pattern, CodeDescription::new(*message, *description)) {
                unreachable!("built-in code {} is malformed: {}", pattern, e);
            }
        }

        Self {
            codes,
            templates,
            template_name: BUILT_IN_TEMPLATES[0].0.to_owned(),
            rotation_mode: RotationMode::Disabled,
            show_details: false,
            disable_l10n: false,
            default_code_to_render: 404,
            default_http_code: 200,
            proxy_headers: Vec::new(),
            disable_minification: false,
            json_format: None,
            xml_format: None,
        }
    }
}

impl Config {
    /// Register a code from the `code=message/description` flag format.
    ///
    /// The description part is optional; the code may contain `*` wildcard
    /// positions and is validated by the registry.
    pub fn add_code_spec(&mut self, spec: &str) -> Result<()> {
        let (code, rest) = spec
            .split_once('=')
            .ok_or_else(|| Error::config(format!("wrong code format [{}], expected code=message/description", spec)))?;

        let (message, description) = match rest.split_once('/') {
            Some((m, d)) => (m.trim(), d.trim()),
            None => (rest.trim(), ""),
        };

        self.codes
            .add(code.trim(), CodeDescription::new(message, description))
    }

    /// Validate that the configuration can actually serve pages.
    pub fn validate(&self) -> Result<()> {
        if self.templates.is_empty() {
            return Err(Error::NoTemplates);
        }
        if !self.templates.has(&self.template_name) {
            return Err(Error::TemplateNotFound(self.template_name.clone()));
        }
        if self.default_code_to_render > 999 {
            return Err(Error::config(format!(
                "wrong HTTP code [{}] for the default error page",
                self.default_code_to_render
            )));
        }
        for header in &self.proxy_headers {
            if header.is_empty() || header.chars().any(char::is_whitespace) {
                return Err(Error::config(format!(
                    "whitespaces in the HTTP headers are not allowed: {}",
                    header
                )));
            }
        }
        Ok(())
    }
}
