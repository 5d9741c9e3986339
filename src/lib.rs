//! ECOA model builder.
//!
//! Builds the resolved, linked model of an ECOA project (typed library
//! declarations, component implementations, deployment and component
//! assembly) for downstream code generators.
//!
//! # Quick Start
//!
//! ```no_run
//! use ecoa_model::{BuildConfig, ModelBuilder};
//!
//! let mut builder = ModelBuilder::from_json_path("demo/project.json")?
//!     .with_config(BuildConfig::new("demo").with_integration_dir("5-Integration"));
//! builder.build()?;
//! # Ok::<(), ecoa_model::BuildError>(())
//! ```
//!
//! # Crates
//!
//! - [`ecoa_core`]: raw declarations, entities, links, languages, errors
//! - [`ecoa_registry`]: type registry, deployment index, link table
//! - [`ecoa_linker`]: type sorter, parsers, validation, linkers, visitor

mod builder;
mod config;
pub mod versioned;

pub use builder::{BuildError, BuildSummary, ModelBuilder};
pub use config::BuildConfig;
pub use versioned::{Access, VersionedData, VersionedError};

pub use ecoa_core::decl::ProjectDecl;
pub use ecoa_core::{ArgumentCast, EntityCategory, EntityId, Language, ModelError};
pub use ecoa_linker::visit::{self, Accept, Visit, Visitor, walk_model};
pub use ecoa_linker::{DEFAULT_INTEGRATION_DIR, Model, ProjectLayout};
pub use ecoa_registry::{DeploymentIndex, LinkTable, TypeRegistry, binding_count};
