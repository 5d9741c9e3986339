//! Link endpoints as declared in component implementations.
//!
//! A [`Link`] names one side of a declared connection: which kind of
//! endpoint it is, which instance it belongs to and which operation it
//! targets. Endpoints compare structurally on `(kind, instance_name,
//! operation_name, language)`; the remaining attributes are carried for
//! code generation only. The language is only set on external endpoints, so
//! the same legacy operation called from C and from C++ stays two endpoints.

use std::fmt;
use std::hash::{Hash, Hasher};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Kind of a declared link endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    /// An operation of a module instance of the same component.
    ModuleInstance,
    /// A service port offered by the component.
    Service,
    /// A reference port required by the component.
    Reference,
    /// Legacy code bridging into the component.
    External,
    /// A periodic trigger instance.
    Trigger,
    /// A dynamic trigger instance (`in` / `out` sub-ports).
    DynamicTrigger,
}

impl LinkKind {
    /// Service and reference endpoints are resolved through assembly wires.
    pub fn is_wired(self) -> bool {
        matches!(self, LinkKind::Service | LinkKind::Reference)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LinkKind::ModuleInstance => "module_instance",
            LinkKind::Service => "service",
            LinkKind::Reference => "reference",
            LinkKind::External => "external",
            LinkKind::Trigger => "trigger",
            LinkKind::DynamicTrigger => "dynamic_trigger",
        }
    }
}

/// A declared link endpoint.
#[derive(Debug, Clone)]
pub struct Link {
    pub kind: LinkKind,
    pub instance_name: String,
    pub operation_name: String,
    /// Whether the endpoint activates the receiving module. `None` on data writers.
    pub activating: Option<bool>,
    /// Language of an external endpoint, lower-cased.
    pub language: Option<String>,
    /// Copy semantics of a versioned-data endpoint.
    pub controlled: Option<bool>,
}

impl Link {
    pub fn new(
        kind: LinkKind,
        instance_name: impl Into<String>,
        operation_name: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            instance_name: instance_name.into(),
            operation_name: operation_name.into(),
            activating: None,
            language: None,
            controlled: None,
        }
    }

    pub fn with_activating(mut self, activating: bool) -> Self {
        self.activating = Some(activating);
        self
    }

    pub fn with_language(mut self, language: impl AsRef<str>) -> Self {
        self.language = Some(language.as_ref().to_ascii_lowercase());
        self
    }

    pub fn with_controlled(mut self, controlled: bool) -> Self {
        self.controlled = Some(controlled);
        self
    }

    /// Endpoint match on kind, instance and operation, ignoring the language.
    pub fn matches(&self, kind: LinkKind, instance_name: &str, operation_name: &str) -> bool {
        self.kind == kind
            && self.instance_name == instance_name
            && self.operation_name == operation_name
    }
}

impl PartialEq for Link {
    fn eq(&self, other: &Self) -> bool {
        self.matches(other.kind, &other.instance_name, &other.operation_name)
            && self.language == other.language
    }
}

impl Eq for Link {}

impl Hash for Link {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.instance_name.hash(state);
        self.operation_name.hash(state);
        self.language.hash(state);
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({}:{})",
            self.kind.as_str(),
            self.instance_name,
            self.operation_name
        )
    }
}

/// Declared endpoints of an entity: own endpoint -> opposite endpoints.
pub type LinkMap = IndexMap<Link, Vec<Link>>;
