//! Model builder passes.
//!
//! - [`validate`]: language and property checks
//! - [`parse`]: entity construction per component implementation
//! - [`link`]: events, requests and versioned-data linkers
//! - [`redirect`]: dynamic-trigger redirection, run after every linker
//!
//! Passes run strictly in order; each one reads what the previous ones
//! wrote into the [`Model`](crate::Model).

pub mod link;
pub mod parse;
pub mod redirect;
pub mod validate;

pub use link::{DataLinker, EventsLinker, LinkOutput, RequestsLinker};
pub use parse::{ComponentParser, ParseOutput};
pub use redirect::{DynamicTriggerRedirection, RedirectOutput};
pub use validate::{LanguagesCheck, PropertiesCheck};
