//! Build configuration.
//!
//! ```
//! use ecoa_model::BuildConfig;
//!
//! let config = BuildConfig::new("/work/demo").with_integration_dir("Integration");
//! let layout = config.layout();
//! assert_eq!(layout.integration_dir(), "Integration");
//! ```

use std::path::PathBuf;

use serde::Deserialize;

use ecoa_linker::{DEFAULT_INTEGRATION_DIR, ProjectLayout};

/// Options of one model build.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Directory the project declarations were read from.
    pub project_dir: PathBuf,
    /// Integration directory name, relative to `project_dir`.
    pub integration_dir: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            project_dir: PathBuf::from("."),
            integration_dir: DEFAULT_INTEGRATION_DIR.to_string(),
        }
    }
}

impl BuildConfig {
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        Self {
            project_dir: project_dir.into(),
            ..Self::default()
        }
    }

    pub fn with_integration_dir(mut self, integration_dir: impl Into<String>) -> Self {
        self.integration_dir = integration_dir.into();
        self
    }

    /// Directory layout handed to the entity parsers.
    pub fn layout(&self) -> ProjectLayout {
        ProjectLayout::new(&self.project_dir).with_integration_dir(&self.integration_dir)
    }
}
