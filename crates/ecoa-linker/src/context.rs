//! ProjectLayout - where project files live on disk.
//!
//! The linker never touches the filesystem; it only needs to know how
//! persistent-info values map to paths so the resolved pinfo tables can be
//! handed to generators as final file locations.

use std::path::{Path, PathBuf};

/// Directory of integration-level files, relative to the project directory.
pub const DEFAULT_INTEGRATION_DIR: &str = "5-Integration";

/// Directory holding pinfo files, under a component or integration directory.
const PINFO_DIR: &str = "Pinfo";

/// Project directory layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    project_dir: PathBuf,
    integration_dir: String,
}

impl Default for ProjectLayout {
    fn default() -> Self {
        Self::new(".")
    }
}

impl ProjectLayout {
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        Self {
            project_dir: project_dir.into(),
            integration_dir: DEFAULT_INTEGRATION_DIR.to_string(),
        }
    }

    pub fn with_integration_dir(mut self, integration_dir: impl Into<String>) -> Self {
        self.integration_dir = integration_dir.into();
        self
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    pub fn integration_dir(&self) -> &str {
        &self.integration_dir
    }

    /// Path of a pinfo value. Quotes around the value are dropped.
    ///
    /// ```text
    /// private: <project>/<component directory>/Pinfo/<value>
    /// public:  <project>/<integration dir>/Pinfo/<value>
    /// ```
    pub fn pinfo_path(&self, component_dir: &str, value: &str, is_private: bool) -> PathBuf {
        let base = if is_private {
            self.project_dir.join(component_dir)
        } else {
            self.project_dir.join(&self.integration_dir)
        };
        base.join(PINFO_DIR).join(value.replace('"', ""))
    }
}
