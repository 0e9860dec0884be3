//! Named template store with compile-at-insert semantics.
//!
//! Template sources are compiled when they are added, so syntax errors are
//! surfaced at configuration time instead of on the first request.

use std::path::Path;

use tera::Tera;

use crate::error::{Error, Result};

/// Store of named page templates, compiled once at insertion.
#[derive(Debug, Default)]
pub struct TemplateStore {
    tera: Tera,
    // (name, source) pairs in insertion order; sources are kept so the
    // compiled set can be rebuilt after a removal.
    sources: Vec<(String, String)>,
}

impl TemplateStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a template under the given name, compiling it immediately.
    ///
    /// The name must be non-empty; re-adding an existing name replaces the
    /// previous template while keeping its position in [`Self::names`].
    pub fn add(&mut self, name: &str, source: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::config("template name cannot be empty"));
        }

        self.tera
            .add_raw_template(name, source)
            .map_err(|e| Error::TemplateCompilation {
                template: name.to_owned(),
                error: error_chain(&e),
            })?;

        match self.sources.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = source.to_owned(),
            None => self.sources.push((name.to_owned(), source.to_owned())),
        }

        Ok(())
    }

    /// Add a template from a file; the file stem becomes the template name.
    ///
    /// Returns the derived name.
    pub fn add_from_file(&mut self, path: &Path) -> Result<String> {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .map(str::to_owned)
            .ok_or_else(|| {
                Error::config(format!(
                    "cannot derive a template name from {}",
                    path.display()
                ))
            })?;

        let source = std::fs::read_to_string(path)?;
        self.add(&name, &source)?;

        Ok(name)
    }

    /// Remove a template by name; returns whether it existed.
    ///
    /// Removing the last template is allowed here; consumers treat an empty
    /// store as a fatal configuration error before serving or exporting.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.sources.len();
        self.sources.retain(|(n, _)| n != name);
        if self.sources.len() == before {
            return false;
        }

        // Tera has no single-template removal, so rebuild from the kept
        // sources. They all compiled before, so this cannot fail.
        let mut tera = Tera::default();
        for (n, s) in &self.sources {
            if let Err(e) = tera.add_raw_template(n, s) {
                tracing::error!(template = %n, error = %error_chain(&e), "template recompilation failed");
            }
        }
        self.tera = tera;
        true
    }

    /// Template names in insertion order
    pub fn names(&self) -> Vec<&str> {
        self.sources.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Whether a template with the given name exists
    pub fn has(&self, name: &str) -> bool {
        self.sources.iter().any(|(n, _)| n == name)
    }

    /// Number of stored templates
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Whether the store holds no templates
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Execute a stored template against the given context.
    pub fn render(&self, name: &str, context: &tera::Context) -> Result<String> {
        if !self.has(name) {
            return Err(Error::TemplateNotFound(name.to_owned()));
        }
        self.tera
            .render(name, context)
            .map_err(|e| Error::render(format!("template {}: {}", name, error_chain(&e))))
    }
}

/// Flatten a tera error and its sources into one line.
///
/// Tera reports the useful part ("variable not found", the syntax error) in
/// the error source, not in the top-level message.
pub(crate) fn error_chain(error: &tera::Error) -> String {
    use std::error::Error as _;

    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(s) = source {
        message.push_str(": ");
        message.push_str(&s.to_string());
        source = s.source();
    }
    message
}
