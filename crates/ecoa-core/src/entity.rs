//! Operation entities of the resolved model.
//!
//! One entity is built per `(component_impl, module_impl, operation)`, not
//! per instance: instances only contribute deployment multiplicity, which
//! the linkers look up later. Each entity keeps the link endpoints declared
//! for it ([`LinkMap`]); resolved bindings live in the model's link tables
//! and refer back to entities through [`EntityId`].

use std::fmt;
use std::path::PathBuf;

use indexmap::IndexMap;

use crate::language::Language;
use crate::link::LinkMap;
use crate::type_ref::{TypeRef, literal_reference};
use crate::types::TypeCategory;

/// Category of an operation entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityCategory {
    EventSend,
    EventReceived,
    RequestSend,
    RequestReceived,
    DataRead,
    DataWritten,
    Property,
    Pinfo,
    External,
    Trigger,
    DynamicTriggerSend,
    DynamicTriggerReceived,
}

impl EntityCategory {
    pub fn name(self) -> &'static str {
        match self {
            EntityCategory::EventSend => "event send",
            EntityCategory::EventReceived => "event received",
            EntityCategory::RequestSend => "request send",
            EntityCategory::RequestReceived => "request received",
            EntityCategory::DataRead => "data read",
            EntityCategory::DataWritten => "data written",
            EntityCategory::Property => "property",
            EntityCategory::Pinfo => "pinfo",
            EntityCategory::External => "external",
            EntityCategory::Trigger => "trigger",
            EntityCategory::DynamicTriggerSend => "dynamic trigger send",
            EntityCategory::DynamicTriggerReceived => "dynamic trigger received",
        }
    }
}

/// Stable handle to an entity stored in the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId {
    pub category: EntityCategory,
    pub index: u32,
}

impl EntityId {
    pub fn new(category: EntityCategory, index: u32) -> Self {
        Self { category, index }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.category.name(), self.index)
    }
}

/// A typed, namespace-qualified parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub type_ref: TypeRef,
    pub category: TypeCategory,
}

impl Parameter {
    pub fn new(name: impl Into<String>, type_ref: TypeRef, category: TypeCategory) -> Self {
        Self {
            name: name.into(),
            type_ref,
            category,
        }
    }
}

/// Module implementation an operation belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleScope {
    pub component_impl: String,
    pub module_type: String,
    pub module_impl: String,
    pub language: Language,
}

impl ModuleScope {
    /// `component_impl:module_impl`, the key of every per-module collection.
    pub fn key(&self) -> String {
        format!("{}:{}", self.component_impl, self.module_impl)
    }
}

/// Common view of entities that carry declared link endpoints.
pub trait LinkedOperation {
    const CATEGORY: EntityCategory;

    fn component_impl(&self) -> &str;

    fn operation_name(&self) -> &str;

    fn links(&self) -> &LinkMap;
}

macro_rules! linked_operation {
    ($ty:ty, $category:expr, scoped) => {
        impl LinkedOperation for $ty {
            const CATEGORY: EntityCategory = $category;

            fn component_impl(&self) -> &str {
                &self.scope.component_impl
            }

            fn operation_name(&self) -> &str {
                &self.name
            }

            fn links(&self) -> &LinkMap {
                &self.links
            }
        }
    };
    ($ty:ty, $category:expr) => {
        impl LinkedOperation for $ty {
            const CATEGORY: EntityCategory = $category;

            fn component_impl(&self) -> &str {
                &self.component_impl
            }

            fn operation_name(&self) -> &str {
                &self.name
            }

            fn links(&self) -> &LinkMap {
                &self.links
            }
        }
    };
}

#[derive(Debug, Clone)]
pub struct EventSend {
    pub scope: ModuleScope,
    pub name: String,
    pub inputs: Vec<Parameter>,
    pub links: LinkMap,
}

#[derive(Debug, Clone)]
pub struct EventReceived {
    pub scope: ModuleScope,
    pub name: String,
    pub inputs: Vec<Parameter>,
    pub links: LinkMap,
}

#[derive(Debug, Clone)]
pub struct RequestSend {
    pub scope: ModuleScope,
    pub name: String,
    pub inputs: Vec<Parameter>,
    pub outputs: Vec<Parameter>,
    pub is_synchronous: bool,
    pub links: LinkMap,
}

/// Server side of a request. `inputs` starts with the implicit `ID` parameter.
#[derive(Debug, Clone)]
pub struct RequestReceived {
    pub scope: ModuleScope,
    pub name: String,
    pub inputs: Vec<Parameter>,
    pub outputs: Vec<Parameter>,
    pub links: LinkMap,
}

#[derive(Debug, Clone)]
pub struct DataRead {
    pub scope: ModuleScope,
    pub name: String,
    pub type_ref: TypeRef,
    pub category: TypeCategory,
    pub max_versions: Option<u32>,
    pub notifying: bool,
    pub links: LinkMap,
    /// Controlled flag per resolved reader key, filled by data linking.
    pub controlled: IndexMap<String, bool>,
}

#[derive(Debug, Clone)]
pub struct DataWritten {
    pub scope: ModuleScope,
    pub name: String,
    pub type_ref: TypeRef,
    pub category: TypeCategory,
    pub max_versions: Option<u32>,
    pub write_only: bool,
    pub links: LinkMap,
    /// Writer endpoint -> other write ports aliasing the same storage.
    pub siblings: LinkMap,
    /// Controlled flag per resolved writer key, filled by data linking.
    pub controlled: IndexMap<String, bool>,
}

/// Element type of an array property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemType {
    pub type_ref: TypeRef,
    pub category: TypeCategory,
}

#[derive(Debug, Clone)]
pub struct Property {
    pub scope: ModuleScope,
    pub name: String,
    /// Declared type, with constants replaced by their underlying type.
    pub type_ref: TypeRef,
    pub category: TypeCategory,
    pub item: Option<ItemType>,
    /// Declared size bound of an array type.
    pub max_number: Option<String>,
    /// Labels of an enum type, or of the enum item type of an array.
    pub labels: Vec<String>,
    /// `component_impl:module_inst:component` -> value as written.
    pub values: IndexMap<String, String>,
}

impl Property {
    /// Render a property value in `language`.
    ///
    /// Arrays become brace initializers (`{n, {a,b}}` for bounded arrays,
    /// `{a,b}` for fixed arrays), enum labels are qualified and `%ns:Name%`
    /// constant references are spelled with the language separator.
    pub fn convert_value(&self, value: &str, language: Language) -> String {
        match self.category {
            TypeCategory::Array | TypeCategory::FixedArray => {
                let fixed = self.category == TypeCategory::FixedArray;
                self.convert_array(value.trim(), language, fixed)
            }
            TypeCategory::Enum => language.enum_label(&self.type_ref, value.trim()),
            _ => convert_simple(value.trim(), language),
        }
    }

    fn convert_array(&self, value: &str, language: Language, fixed: bool) -> String {
        let (converted, size) = if let Some(inner) =
            value.strip_prefix('[').and_then(|v| v.strip_suffix(']'))
        {
            let items: Vec<String> = inner
                .split(',')
                .map(|item| self.convert_item(item.trim(), language))
                .collect();
            (format!("{{{}}}", items.join(",")), items.len())
        } else if let Some(inner) = value.strip_prefix('"').and_then(|v| v.strip_suffix('"')) {
            (value.to_string(), string_array_length(inner))
        } else {
            (value.to_string(), 0)
        };
        if fixed {
            converted
        } else {
            format!("{{{size}, {converted}}}")
        }
    }

    fn convert_item(&self, item: &str, language: Language) -> String {
        match &self.item {
            Some(ItemType {
                type_ref,
                category: TypeCategory::Enum,
            }) => language.enum_label(type_ref, item),
            _ => convert_simple(item, language),
        }
    }
}

fn convert_simple(value: &str, language: Language) -> String {
    match literal_reference(value) {
        Some(reference) => language.constant_reference(reference),
        None => value.to_string(),
    }
}

/// Number of elements of a string-literal array value, counting the
/// terminating NUL and ignoring escaped quotes.
pub fn string_array_length(inner: &str) -> usize {
    inner.chars().count() - inner.matches('"').count() + 1
}

#[derive(Debug, Clone)]
pub struct Pinfo {
    pub scope: ModuleScope,
    pub name: String,
    pub is_private: bool,
    /// `component_impl:module_inst:component` -> resolved file path.
    pub values: IndexMap<String, PathBuf>,
}

/// Legacy code bridge raising an event into the component.
#[derive(Debug, Clone)]
pub struct External {
    pub component_impl: String,
    pub name: String,
    pub language: Language,
    /// Back-filled from the first linked receiver.
    pub inputs: Vec<Parameter>,
    pub links: LinkMap,
}

impl External {
    /// Sender key of the external: `operation:language`.
    pub fn key(&self) -> String {
        format!("{}:{}", self.name, self.language)
    }
}

#[derive(Debug, Clone)]
pub struct Trigger {
    pub component_impl: String,
    pub name: String,
    pub links: LinkMap,
}

/// Send half of a dynamic trigger (its `out` sub-port).
#[derive(Debug, Clone)]
pub struct DynamicTriggerSend {
    pub component_impl: String,
    pub name: String,
    /// `delayDuration` followed by the declared parameters.
    pub parameters: Vec<Parameter>,
    pub links: LinkMap,
}

/// Received half of a dynamic trigger (its `in` sub-port).
#[derive(Debug, Clone)]
pub struct DynamicTriggerReceived {
    pub component_impl: String,
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub links: LinkMap,
}

/// Logging service of a module implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Log {
    pub scope: ModuleScope,
}

/// Time service of a module implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Time {
    pub scope: ModuleScope,
}

linked_operation!(EventSend, EntityCategory::EventSend, scoped);
linked_operation!(EventReceived, EntityCategory::EventReceived, scoped);
linked_operation!(RequestSend, EntityCategory::RequestSend, scoped);
linked_operation!(RequestReceived, EntityCategory::RequestReceived, scoped);
linked_operation!(DataRead, EntityCategory::DataRead, scoped);
linked_operation!(DataWritten, EntityCategory::DataWritten, scoped);
linked_operation!(External, EntityCategory::External);
linked_operation!(Trigger, EntityCategory::Trigger);
linked_operation!(DynamicTriggerSend, EntityCategory::DynamicTriggerSend);
linked_operation!(DynamicTriggerReceived, EntityCategory::DynamicTriggerReceived);
