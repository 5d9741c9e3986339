//! Validation passes.
//!
//! - [`LanguagesCheck`]: runs on the raw declarations, before any entity is built
//! - [`PropertiesCheck`]: runs on the parsed properties, before linking
//!
//! Both fail fast: the first violation aborts the build.

mod languages;
mod properties;

pub use languages::LanguagesCheck;
pub use properties::PropertiesCheck;
