//! Output format negotiation.
//!
//! An explicit file extension in the request path always wins; otherwise the
//! `Accept` header preference list is walked in order; HTML is the default
//! when neither yields a supported format.

use std::fmt;

/// A supported error page output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// Rendered page template, optionally minified
    Html,
    /// Structured JSON document
    Json,
    /// Structured XML document
    Xml,
    /// Message and description as plain text
    PlainText,
}

impl Format {
    /// The `Content-Type` header value for this format.
    pub const fn content_type(self) -> &'static str {
        match self {
            Format::Html => "text/html; charset=utf-8",
            Format::Json => "application/json; charset=utf-8",
            Format::Xml => "application/xml; charset=utf-8",
            Format::PlainText => "text/plain; charset=utf-8",
        }
    }

    /// Resolve a format from a recognized file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "html" | "htm" => Some(Format::Html),
            "json" => Some(Format::Json),
            "xml" => Some(Format::Xml),
            "txt" => Some(Format::PlainText),
            _ => None,
        }
    }

    /// Resolve a format from an `Accept` header.
    ///
    /// Entries are checked in the order they appear; quality parameters are
    /// ignored. The first supported media type wins.
    pub fn from_accept(header: &str) -> Option<Self> {
        for entry in header.split(',') {
            let media_type = entry
                .split(';')
                .next()
                .unwrap_or("")
                .trim()
                .to_ascii_lowercase();

            let format = match media_type.as_str() {
                "text/html" | "application/xhtml+xml" => Some(Format::Html),
                "application/json" | "text/json" => Some(Format::Json),
                "application/xml" | "text/xml" => Some(Format::Xml),
                "text/plain" => Some(Format::PlainText),
                "*/*" | "text/*" => Some(Format::Html),
                _ => None,
            };

            if format.is_some() {
                return format;
            }
        }
        None
    }

    /// Negotiate the output format for one request.
    ///
    /// Pure function: extension beats `Accept`, and anything unrecognized or
    /// absent falls back to HTML.
    pub fn negotiate(extension: Option<&str>, accept: Option<&str>) -> Self {
        if let Some(format) = extension.and_then(Self::from_extension) {
            return format;
        }
        if let Some(format) = accept.and_then(Self::from_accept) {
            return format;
        }
        Format::Html
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Format::Html => "html",
            Format::Json => "json",
            Format::Xml => "xml",
            Format::PlainText => "txt",
        };
        f.write_str(name)
    }
}
