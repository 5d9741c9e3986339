//! Core types shared by the model builder crates.
//!
//! - [`decl`]: raw declaration tree (the builder's input)
//! - [`types`]: library type declarations and categories
//! - [`type_ref`]: namespace-qualified type references
//! - [`link`]: declared link endpoints
//! - [`entity`]: operation entities of the resolved model
//! - [`language`]: C / C++ dialects and the cross-language casting policy
//! - [`error`]: [`ModelError`]

pub mod decl;
pub mod entity;
pub mod error;
pub mod language;
pub mod link;
pub mod type_ref;
pub mod types;

pub use entity::{
    DataRead, DataWritten, DynamicTriggerReceived, DynamicTriggerSend, EntityCategory, EntityId,
    EventReceived, EventSend, External, ItemType, LinkedOperation, Log, ModuleScope, Parameter,
    Pinfo, Property, RequestReceived, RequestSend, Time, Trigger,
};
pub use error::ModelError;
pub use language::{ArgumentCast, Language, constant_literal, literal_suffix};
pub use link::{Link, LinkKind, LinkMap};
pub use type_ref::{STANDARD_LIBRARY, TypeRef, literal_reference};
pub use types::{CategoryMask, EnumValue, Field, TypeCategory, TypeDecl, TypeReference, Union};
