//! ECOA Model Linker
//!
//! Builds the resolved model from raw declarations, one pass at a time.
//!
//! ## Architecture
//!
//! - **Validation**: implementation languages, then property types and values
//! - **Parsing**: typed entities per component implementation, each carrying
//!   its declared link endpoints
//! - **Linking**: events, requests and versioned data, resolved against the
//!   deployment into mirrored sender/receiver bindings
//! - **Redirection**: dynamic triggers removed from the binding graph
//!
//! ## Modules
//!
//! - [`context`]: project layout used to resolve pinfo paths
//! - [`model`]: the resolved [`Model`] and its entity stores
//! - [`passes`]: the builder passes, in run order
//! - [`sorter`]: dependency order of library type declarations
//! - [`visit`]: visitor contract for code generators

pub mod context;
pub mod model;
pub mod passes;
pub mod sorter;
pub mod visit;

pub use context::{DEFAULT_INTEGRATION_DIR, ProjectLayout};
pub use model::{EntityRef, EntityStore, Model};
pub use passes::{
    ComponentParser, DataLinker, DynamicTriggerRedirection, EventsLinker, LanguagesCheck,
    LinkOutput, ParseOutput, PropertiesCheck, RedirectOutput, RequestsLinker,
};
pub use sorter::TypeSorter;
pub use visit::{Accept, Visit, Visitor};

// Re-export ModelError from core for convenience
pub use ecoa_core::ModelError;
