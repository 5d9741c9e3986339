//! Raw declaration tree.
//!
//! This is the input of the model builder: a direct, serde-deserializable
//! image of the project's libraries, component implementations, deployment
//! and component assembly. Nothing here is resolved; names are kept exactly
//! as written.
//!
//! ```text
//! ProjectDecl
//! ├── libraries[]       name + TypeDecl[]
//! ├── components[]      ComponentImplDecl (module types/impls/instances, link declarations)
//! ├── deployment        protection domains -> deployed module instances
//! └── assembly          component instances (implementation, properties) + wires
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::link::LinkKind;
use crate::types::TypeDecl;

/// A whole project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectDecl {
    #[serde(default)]
    pub libraries: Vec<LibraryDecl>,
    #[serde(default)]
    pub components: Vec<ComponentImplDecl>,
    #[serde(default)]
    pub deployment: DeploymentDecl,
    #[serde(default)]
    pub assembly: AssemblyDecl,
}

/// A typed data library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryDecl {
    pub name: String,
    #[serde(default)]
    pub types: Vec<TypeDecl>,
}

/// A component implementation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentImplDecl {
    pub name: String,
    /// Directory of the implementation's files, relative to the project.
    #[serde(default)]
    pub directory: String,
    /// Libraries used by the implementation.
    #[serde(default)]
    pub uses: Vec<String>,
    #[serde(default)]
    pub module_types: Vec<ModuleTypeDecl>,
    #[serde(default)]
    pub module_implementations: Vec<ModuleImplDecl>,
    #[serde(default)]
    pub module_instances: Vec<ModuleInstanceDecl>,
    #[serde(default)]
    pub trigger_instances: Vec<TriggerInstanceDecl>,
    #[serde(default)]
    pub dynamic_trigger_instances: Vec<DynamicTriggerInstanceDecl>,
    #[serde(default)]
    pub event_links: Vec<EventLinkDecl>,
    #[serde(default)]
    pub request_links: Vec<RequestLinkDecl>,
    #[serde(default)]
    pub data_links: Vec<DataLinkDecl>,
}

impl ComponentImplDecl {
    pub fn module_type(&self, name: &str) -> Option<&ModuleTypeDecl> {
        self.module_types.iter().find(|t| t.name == name)
    }

    pub fn module_implementation(&self, name: &str) -> Option<&ModuleImplDecl> {
        self.module_implementations.iter().find(|i| i.name == name)
    }

    /// Names of the module instances of an implementation, in declaration order.
    pub fn instances_of<'a>(&'a self, implementation: &'a str) -> impl Iterator<Item = &'a str> {
        self.module_instances
            .iter()
            .filter(move |i| i.implementation == implementation)
            .map(|i| i.name.as_str())
    }
}

/// A module type: the operation interface.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleTypeDecl {
    pub name: String,
    #[serde(default)]
    pub operations: OperationsDecl,
    #[serde(default)]
    pub properties: Vec<PropertyDecl>,
    #[serde(default)]
    pub public_pinfos: Vec<PinfoDecl>,
    #[serde(default)]
    pub private_pinfos: Vec<PinfoDecl>,
}

/// Operations declared by a module type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationsDecl {
    #[serde(default)]
    pub event_sent: Vec<EventDecl>,
    #[serde(default)]
    pub event_received: Vec<EventDecl>,
    #[serde(default)]
    pub request_sent: Vec<RequestDecl>,
    #[serde(default)]
    pub request_received: Vec<RequestDecl>,
    #[serde(default)]
    pub data_read: Vec<DataReadDecl>,
    #[serde(default)]
    pub data_written: Vec<DataWrittenDecl>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDecl {
    pub name: String,
    #[serde(default)]
    pub inputs: Vec<ParameterDecl>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestDecl {
    pub name: String,
    #[serde(default)]
    pub inputs: Vec<ParameterDecl>,
    #[serde(default)]
    pub outputs: Vec<ParameterDecl>,
    #[serde(default)]
    pub is_synchronous: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataReadDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub max_versions: Option<u32>,
    #[serde(default)]
    pub notifying: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataWrittenDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub max_versions: Option<u32>,
    #[serde(default)]
    pub write_only: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinfoDecl {
    pub name: String,
}

/// A module implementation: a module type realized in a language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleImplDecl {
    pub name: String,
    pub module_type: String,
    pub language: String,
}

/// A module instance and its per-instance values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleInstanceDecl {
    pub name: String,
    pub implementation: String,
    #[serde(default)]
    pub property_values: Vec<NamedValueDecl>,
    #[serde(default)]
    pub pinfo_values: Vec<NamedValueDecl>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedValueDecl {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerInstanceDecl {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicTriggerInstanceDecl {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<ParameterDecl>,
}

/// One endpoint inside a link declaration group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointDecl {
    #[serde(default)]
    pub instance_name: String,
    #[serde(default)]
    pub operation_name: String,
    #[serde(default)]
    pub activating: Option<bool>,
    #[serde(default)]
    pub language: Option<String>,
}

/// Endpoints of one side of a link declaration, grouped by kind.
pub type EndpointGroupDecl = IndexMap<LinkKind, Vec<EndpointDecl>>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventLinkDecl {
    #[serde(default)]
    pub senders: EndpointGroupDecl,
    #[serde(default)]
    pub receivers: EndpointGroupDecl,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestLinkDecl {
    #[serde(default)]
    pub clients: EndpointGroupDecl,
    #[serde(default)]
    pub server: EndpointGroupDecl,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataLinkDecl {
    #[serde(default)]
    pub writers: EndpointGroupDecl,
    #[serde(default)]
    pub readers: EndpointGroupDecl,
    #[serde(default = "controlled_default")]
    pub controlled: bool,
}

fn controlled_default() -> bool {
    true
}

/// Deployment: which module instances run in which protection domain,
/// under which component instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentDecl {
    #[serde(default)]
    pub protection_domains: Vec<ProtectionDomainDecl>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectionDomainDecl {
    pub name: String,
    #[serde(default)]
    pub deployed_modules: Vec<DeployedModuleDecl>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployedModuleDecl {
    pub component: String,
    pub module_instance: String,
}

/// Component assembly: component instances and the wires between their ports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssemblyDecl {
    #[serde(default)]
    pub components: Vec<ComponentInstanceDecl>,
    #[serde(default)]
    pub wires: Vec<WireDecl>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentInstanceDecl {
    pub name: String,
    pub implementation: String,
    #[serde(default)]
    pub properties: IndexMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireDecl {
    pub source: WireEndDecl,
    pub target: WireEndDecl,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireEndDecl {
    pub component: String,
    pub service: String,
}
