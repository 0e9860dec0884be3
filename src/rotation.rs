//! Template rotation policies.
//!
//! The rotation mode is fixed at startup; there are no runtime transitions
//! between modes.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::OnceCell;

use crate::error::{Error, Result};

/// Policy governing which template is active for a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RotationMode {
    /// Always serve the configured template
    #[default]
    Disabled,
    /// Pick one random template at startup and keep it for the process lifetime
    RandomOnStartup,
    /// Pick a random template independently for every request
    RandomOnEachRequest,
}

impl RotationMode {
    /// All supported modes, for help texts and validation messages.
    pub const ALL: [RotationMode; 3] = [
        RotationMode::Disabled,
        RotationMode::RandomOnStartup,
        RotationMode::RandomOnEachRequest,
    ];

    /// Canonical string form used by flags and environment variables.
    pub const fn as_str(self) -> &'static str {
        match self {
            RotationMode::Disabled => "disabled",
            RotationMode::RandomOnStartup => "random-on-startup",
            RotationMode::RandomOnEachRequest => "random-on-each-request",
        }
    }
}

impl fmt::Display for RotationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RotationMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s.trim())
            .ok_or_else(|| {
                Error::config(format!(
                    "unrecognized rotation mode [{}], expected one of: {}",
                    s,
                    Self::ALL.map(|m| m.as_str()).join("/")
                ))
            })
    }
}

/// Selects the active template name per request.
///
/// One controller instance is owned by each server; the startup draw for
/// [`RotationMode::RandomOnStartup`] is memoized behind a [`OnceCell`] so
/// concurrent first requests still observe a single draw.
#[derive(Debug)]
pub struct RotationController {
    mode: RotationMode,
    default_name: String,
    available: Vec<String>,
    startup_choice: OnceCell<String>,
}

impl RotationController {
    /// Create a controller over the given template names.
    ///
    /// An empty name list and a default name outside the list are both
    /// configuration errors, caught here rather than at call time.
    pub fn new(
        mode: RotationMode,
        default_name: impl Into<String>,
        available: Vec<String>,
    ) -> Result<Self> {
        let default_name = default_name.into();
        if available.is_empty() {
            return Err(Error::NoTemplates);
        }
        if !available.contains(&default_name) {
            return Err(Error::TemplateNotFound(default_name));
        }

        Ok(Self {
            mode,
            default_name,
            available,
            startup_choice: OnceCell::new(),
        })
    }

    /// The configured rotation mode
    pub fn mode(&self) -> RotationMode {
        self.mode
    }

    /// The template name to use for the current request.
    pub fn active_template(&self) -> &str {
        match self.mode {
            RotationMode::Disabled => &self.default_name,
            RotationMode::RandomOnStartup => self
                .startup_choice
                .get_or_init(|| self.pick_random().to_owned()),
            RotationMode::RandomOnEachRequest => self.pick_random(),
        }
    }

    fn pick_random(&self) -> &str {
        &self.available[fastrand::usize(..self.available.len())]
    }
}
