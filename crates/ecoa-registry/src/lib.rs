//! Registries shared by the model builder passes.
//!
//! - [`type_registry`]: every library and built-in type, name resolution
//!   and classification
//! - [`deployment`]: deployed component names per module instance and the
//!   assembly's service-wiring graph
//! - [`link_table`]: mirrored storage of resolved sender/receiver bindings

pub mod deployment;
pub mod link_table;
pub mod type_registry;

pub use deployment::{DeploymentIndex, ServicePort};
pub use link_table::{Bindings, LinkTable, Peers, binding_count};
pub use type_registry::TypeRegistry;
