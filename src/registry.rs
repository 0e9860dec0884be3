//! HTTP code registry with wildcard pattern support.
//!
//! Codes are registered either as exact 3-digit codes (`404`) or as patterns
//! with `*` placeholders (`4**`, `50*`). Lookups resolve the most specific
//! matching entry and always produce a renderable result.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Message and description registered for a code pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeDescription {
    /// Short human-readable status line
    pub message: String,
    /// Longer explanation shown on the page
    pub description: String,
}

impl CodeDescription {
    /// Create a new description
    pub fn new<M: Into<String>, D: Into<String>>(message: M, description: D) -> Self {
        Self {
            message: message.into(),
            description: description.into(),
        }
    }
}

/// A code description resolved for one concrete code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeDescriptor {
    /// The concrete HTTP code (0..=999)
    pub code: u16,
    /// Short human-readable status line
    pub message: String,
    /// Longer explanation shown on the page
    pub description: String,
}

/// A 3-character code pattern where `*` positions match any digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CodePattern {
    chars: [u8; 3],
}

impl CodePattern {
    /// Number of literal (non-wildcard) positions; 3 for an exact code.
    pub fn specificity(&self) -> usize {
        self.chars.iter().filter(|&&c| c != b'*').count()
    }

    /// Whether the pattern contains no wildcard positions.
    pub fn is_exact(&self) -> bool {
        self.specificity() == 3
    }

    /// The exact numeric code, when the pattern has no wildcards.
    pub fn as_exact_code(&self) -> Option<u16> {
        if !self.is_exact() {
            return None;
        }
        let mut code = 0u16;
        for &c in &self.chars {
            code = code * 10 + u16::from(c - b'0');
        }
        Some(code)
    }

    /// Whether the pattern matches the given concrete code.
    pub fn matches(&self, code: u16) -> bool {
        if code > 999 {
            return false;
        }
        let digits = [
            b'0' + (code / 100) as u8,
            b'0' + (code / 10 % 10) as u8,
            b'0' + (code % 10) as u8,
        ];
        self.chars
            .iter()
            .zip(digits.iter())
            .all(|(&p, &d)| p == b'*' || p == d)
    }
}

impl FromStr for CodePattern {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = s.as_bytes();
        if bytes.len() != 3 {
            return Err(Error::invalid_pattern(s, "must be exactly 3 characters"));
        }
        for &b in bytes {
            if !b.is_ascii_digit() && b != b'*' {
                return Err(Error::invalid_pattern(
                    s,
                    "only digits and '*' are allowed",
                ));
            }
        }
        Ok(Self {
            chars: [bytes[0], bytes[1], bytes[2]],
        })
    }
}

impl fmt::Display for CodePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &c in &self.chars {
            write!(f, "{}", c as char)?;
        }
        Ok(())
    }
}

/// Registry resolving concrete codes to the most specific registered entry.
#[derive(Debug, Clone, Default)]
pub struct CodeRegistry {
    // Insertion order is kept so that ties between equally specific
    // patterns resolve to the most recently added one.
    entries: Vec<(CodePattern, CodeDescription)>,
}

impl CodeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a description under an exact code or a wildcard pattern.
    ///
    /// Re-adding an existing pattern replaces the previous entry. A malformed
    /// pattern is rejected without modifying the registry.
    pub fn add(&mut self, pattern: &str, description: CodeDescription) -> Result<()> {
        let pattern: CodePattern = pattern.parse()?;
        self.entries.retain(|(p, _)| *p != pattern);
        self.entries.push((pattern, description));
        Ok(())
    }

    /// Resolve a concrete code to a descriptor.
    ///
    /// An exact entry always outranks wildcards; among matching wildcards the
    /// one with fewer `*` positions wins. When nothing matches, a generic
    /// descriptor echoing the code is returned so callers can always render.
    pub fn describe(&self, code: u16) -> CodeDescriptor {
        let mut best: Option<(&CodePattern, &CodeDescription)> = None;
        for (pattern, description) in &self.entries {
            if !pattern.matches(code) {
                continue;
            }
            // >= keeps the later insertion on equal specificity
            match best {
                Some((b, _)) if pattern.specificity() < b.specificity() => {}
                _ => best = Some((pattern, description)),
            }
        }

        match best {
            Some((_, d)) => CodeDescriptor {
                code,
                message: d.message.clone(),
                description: d.description.clone(),
            },
            None => CodeDescriptor {
                code,
                message: String::new(),
                description: String::new(),
            },
        }
    }

    /// All known exact codes, numerically ascending.
    pub fn codes(&self) -> Vec<u16> {
        let mut codes: Vec<u16> = self
            .entries
            .iter()
            .filter_map(|(p, _)| p.as_exact_code())
            .collect();
        codes.sort_unstable();
        codes.dedup();
        codes
    }

    /// Number of registered entries (exact and wildcard)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
