//! Model builder API.
//!
//! The builder drives every pass over one project, in order. Users load a
//! project, build it once, and hand the resulting model to generators.
//!
//! # Example
//!
//! ```no_run
//! use ecoa_model::ModelBuilder;
//!
//! let mut builder = ModelBuilder::from_json_path("demo/project.json")?;
//! let summary = builder.build()?;
//! println!("{} bindings", summary.bindings);
//!
//! let model = builder.model().expect("built");
//! assert_eq!(model.binding_count(), summary.bindings);
//! # Ok::<(), ecoa_model::BuildError>(())
//! ```
//!
//! ## Pipeline
//!
//! ```text
//! TypeRegistry          libraries + built-ins
//! DeploymentIndex       deployment + assembly wires
//! LanguagesCheck        before anything is built
//! TypeSorter            every library, into sorted_types
//! ComponentParser       per component implementation
//! PropertiesCheck
//! Events -> Requests -> Data linkers
//! DynamicTriggerRedirection
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, info_span};

use ecoa_core::ModelError;
use ecoa_core::decl::ProjectDecl;
use ecoa_linker::{
    ComponentParser, DataLinker, DynamicTriggerRedirection, EventsLinker, LanguagesCheck, Model,
    PropertiesCheck, RequestsLinker, TypeSorter,
};
use ecoa_registry::{DeploymentIndex, TypeRegistry};

use crate::config::BuildConfig;

/// Counts reported by a successful build.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BuildSummary {
    pub components: usize,
    pub entities: usize,
    pub properties_checked: usize,
    /// Bindings left after redirection.
    pub bindings: usize,
    pub redirected: usize,
}

/// Builds the resolved model of one project.
#[derive(Debug)]
pub struct ModelBuilder {
    project: ProjectDecl,
    config: BuildConfig,
    /// Available after a successful build.
    model: Option<Model>,
}

impl ModelBuilder {
    pub fn new(project: ProjectDecl) -> Self {
        Self {
            project,
            config: BuildConfig::default(),
            model: None,
        }
    }

    pub fn with_config(mut self, config: BuildConfig) -> Self {
        self.config = config;
        self
    }

    /// Load a project from its JSON declaration tree.
    pub fn from_json_str(json: &str) -> Result<Self, BuildError> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    /// Load a project file. The file's directory becomes the project directory.
    pub fn from_json_path(path: impl AsRef<Path>) -> Result<Self, BuildError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| BuildError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let project_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(Self::from_json_str(&json)?.with_config(BuildConfig::new(project_dir)))
    }

    pub fn project(&self) -> &ProjectDecl {
        &self.project
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    pub fn is_built(&self) -> bool {
        self.model.is_some()
    }

    /// Resolved model, once built.
    pub fn model(&self) -> Option<&Model> {
        self.model.as_ref()
    }

    pub fn into_model(self) -> Option<Model> {
        self.model
    }

    /// Run every pass over the project.
    ///
    /// # Errors
    ///
    /// Fails on the first fatal model error, if the project has no component
    /// implementation, or if the builder was already built.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn build(&mut self) -> Result<BuildSummary, BuildError> {
        if self.is_built() {
            return Err(BuildError::AlreadyBuilt);
        }
        if self.project.components.is_empty() {
            return Err(BuildError::NoComponents);
        }

        let span = info_span!("build_model", components = self.project.components.len());
        let _guard = span.enter();

        let mut registry = TypeRegistry::new();
        for library in &self.project.libraries {
            registry.register_library(&library.name, &library.types)?;
        }
        let deployment = DeploymentIndex::build(&self.project.deployment, &self.project.assembly)?;
        LanguagesCheck::new(&self.project.components).run()?;

        let mut model = Model::new(registry, deployment);
        let libraries: Vec<String> = model.registry.libraries().map(str::to_string).collect();
        for library in libraries {
            let sorted = TypeSorter::new(&model.registry, &library).sort_registered()?;
            model.sorted_types.insert(library, sorted);
        }

        let layout = self.config.layout();
        let mut summary = BuildSummary {
            components: self.project.components.len(),
            ..BuildSummary::default()
        };
        for component in &self.project.components {
            let parsed = ComponentParser::new(&mut model, &layout).run(component)?;
            summary.entities += parsed.entities();
        }
        summary.properties_checked = PropertiesCheck::new(&model).run()?;

        EventsLinker::new(&mut model).run();
        RequestsLinker::new(&mut model).run();
        DataLinker::new(&mut model).run();
        summary.redirected = DynamicTriggerRedirection::new(&mut model).run().redirected;
        summary.bindings = model.binding_count();

        info!(
            entities = summary.entities,
            bindings = summary.bindings,
            redirected = summary.redirected,
            "model built"
        );
        self.model = Some(model);
        Ok(summary)
    }
}

/// Errors that can occur while loading or building a project.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// A pass rejected the project.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// The project file is not a valid declaration tree.
    #[error("invalid project declaration: {0}")]
    Json(#[from] serde_json::Error),

    /// The project file could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The project declares no component implementation
    #[error("project declares no component implementation")]
    NoComponents,

    /// The builder has already been built
    #[error("model has already been built")]
    AlreadyBuilt,
}

impl BuildError {
    /// The model error behind this error, if a pass failed.
    pub fn model_error(&self) -> Option<&ModelError> {
        match self {
            BuildError::Model(err) => Some(err),
            _ => None,
        }
    }
}
