//! Unified error type for model building.
//!
//! Every fatal condition of the model builder is a [`ModelError`]. Each
//! variant carries a human-readable locator (component / module / operation
//! path) so the failing declaration can be found without a debugger.
//!
//! ## Error Taxonomy
//!
//! ```text
//! ModelError
//! ├── UnsupportedLanguage      - module implementation language is not C or C++
//! ├── UnsupportedPropertyType  - property type is not simple/enum/(fixed) array of those
//! ├── InvalidPropertyValue     - array length, enum label, constant ref, unknown symbol
//! ├── UnresolvedType           - a type name resolves to nothing
//! ├── CyclicTypeDependency     - library types reference each other in a loop
//! └── malformed input          - duplicate types, unknown module types/implementations,
//!                                unknown component instances or assembly properties
//! ```
//!
//! Unmatched links are never errors: an entity without a counterpart simply
//! ends up with no resolved bindings.

use thiserror::Error;

/// Fatal model-building errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// A module implementation declares a language other than C or C++.
    #[error("unsupported implementation language {language} for module {module}")]
    UnsupportedLanguage { language: String, module: String },

    /// A property's type category cannot be carried by a property.
    #[error("unsupported type {type_name} for property {property}")]
    UnsupportedPropertyType { type_name: String, property: String },

    /// A property value does not fit its declared type.
    #[error("{reason} for property value {property}")]
    InvalidPropertyValue { property: String, reason: String },

    /// A type reference resolves to nothing in the registry.
    #[error("unresolved type '{name}' referenced by {context}")]
    UnresolvedType { name: String, context: String },

    /// Type declarations of a library reference each other in a loop.
    #[error("cyclic type dependency in library {library}: {}", .chain.join(" -> "))]
    CyclicTypeDependency { library: String, chain: Vec<String> },

    /// The same qualified type name is declared twice.
    #[error("type {name} is declared more than once")]
    DuplicateType { name: String },

    /// A module implementation names a module type that does not exist.
    #[error("unknown module type {module_type} for module implementation {module}")]
    UnknownModuleType { module_type: String, module: String },

    /// A module instance names an implementation that does not exist.
    #[error("unknown module implementation {implementation} for module instance {instance}")]
    UnknownImplementation {
        implementation: String,
        instance: String,
    },

    /// A deployment or wire references a component absent from the assembly.
    #[error("unknown component instance {component} referenced by {context}")]
    UnknownComponentInstance { component: String, context: String },

    /// A `$name` value references an assembly property that does not exist.
    #[error("unknown assembly property {name} of component {component} referenced by {context}")]
    UnknownAssemblyProperty {
        name: String,
        component: String,
        context: String,
    },
}

impl ModelError {
    /// Create an unsupported-language error.
    pub fn unsupported_language(language: impl Into<String>, module: impl Into<String>) -> Self {
        ModelError::UnsupportedLanguage {
            language: language.into(),
            module: module.into(),
        }
    }

    /// Create an invalid-property-value error.
    pub fn invalid_property_value(property: impl Into<String>, reason: impl Into<String>) -> Self {
        ModelError::InvalidPropertyValue {
            property: property.into(),
            reason: reason.into(),
        }
    }

    /// Create an unresolved-type error.
    pub fn unresolved_type(name: impl Into<String>, context: impl Into<String>) -> Self {
        ModelError::UnresolvedType {
            name: name.into(),
            context: context.into(),
        }
    }

    /// Returns `true` for errors caused by a property declaration or value.
    pub fn is_property_error(&self) -> bool {
        matches!(
            self,
            ModelError::UnsupportedPropertyType { .. } | ModelError::InvalidPropertyValue { .. }
        )
    }
}
