//! Endpoint pairing and key resolution shared by the linkers.

use ecoa_core::{EntityId, Link, LinkMap, LinkedOperation};
use ecoa_registry::{DeploymentIndex, LinkTable};
use tracing::trace;

use crate::model::EntityStore;

/// A linkable entity seen through its declared endpoints.
#[derive(Debug, Clone, Copy)]
pub(super) struct Candidate<'m> {
    pub id: EntityId,
    pub component_impl: &'m str,
    pub links: &'m LinkMap,
}

impl<'m> Candidate<'m> {
    pub fn of<T: LinkedOperation>(index: u32, entity: &'m T) -> Self {
        Self {
            id: EntityId::new(T::CATEGORY, index),
            component_impl: entity.component_impl(),
            links: entity.links(),
        }
    }

    pub fn same_implementation(&self, other: &Candidate<'_>) -> bool {
        self.component_impl == other.component_impl
    }
}

/// Every entity of a store as a candidate.
pub(super) fn candidates<T: LinkedOperation>(store: &EntityStore<T>) -> Vec<Candidate<'_>> {
    store
        .iter()
        .map(|(index, entity)| Candidate::of(index, entity))
        .collect()
}

/// One combination of a sender endpoint and a receiver endpoint, each with
/// one of the endpoints it declares on the other side.
#[derive(Debug, Clone, Copy)]
pub(super) struct DeclaredPair<'m> {
    pub sender_own: &'m Link,
    /// Receiver endpoint as declared by the sender.
    pub sender_declared: &'m Link,
    pub receiver_own: &'m Link,
    /// Sender endpoint as declared by the receiver.
    pub receiver_declared: &'m Link,
}

impl DeclaredPair<'_> {
    /// Both sides name each other.
    pub fn is_mutual(&self) -> bool {
        self.sender_declared == self.receiver_own && self.receiver_declared == self.sender_own
    }
}

pub(super) fn declared_pairs<'m>(
    sender: &'m LinkMap,
    receiver: &'m LinkMap,
) -> impl Iterator<Item = DeclaredPair<'m>> {
    sender.iter().flat_map(move |(sender_own, sender_side)| {
        sender_side.iter().flat_map(move |sender_declared| {
            receiver.iter().flat_map(move |(receiver_own, receiver_side)| {
                receiver_side.iter().map(move |receiver_declared| DeclaredPair {
                    sender_own,
                    sender_declared,
                    receiver_own,
                    receiver_declared,
                })
            })
        })
    })
}

/// A binding computed but not yet stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Resolved {
    pub sender: EntityId,
    pub sender_key: String,
    pub receiver: EntityId,
    pub receiver_key: String,
}

impl Resolved {
    pub fn new(sender: EntityId, sender_key: String, receiver: EntityId, receiver_key: String) -> Self {
        Self {
            sender,
            sender_key,
            receiver,
            receiver_key,
        }
    }
}

/// Store resolved bindings, returning how many were new.
pub(super) fn bind_all(table: &mut LinkTable<EntityId>, resolved: &[Resolved]) -> usize {
    resolved
        .iter()
        .filter(|r| {
            let added = table.bind(r.sender, &r.sender_key, r.receiver, &r.receiver_key);
            if added {
                trace!(
                    sender = %r.sender,
                    sender_key = %r.sender_key,
                    receiver = %r.receiver,
                    receiver_key = %r.receiver_key,
                    "bound"
                );
            }
            added
        })
        .count()
}

/// Turns declared endpoints into deployed-component keys.
pub(super) struct KeyResolver<'m> {
    deployment: &'m DeploymentIndex,
    /// Data keys also carry the operation name.
    with_operation: bool,
}

impl<'m> KeyResolver<'m> {
    pub fn new(deployment: &'m DeploymentIndex, with_operation: bool) -> Self {
        Self {
            deployment,
            with_operation,
        }
    }

    /// `inst:component`, or `inst:component:operation` for data.
    pub fn key(&self, link: &Link, component: &str) -> String {
        if self.with_operation {
            format!("{}:{}:{}", link.instance_name, component, link.operation_name)
        } else {
            format!("{}:{}", link.instance_name, component)
        }
    }

    /// Components the endpoint's module instance is deployed under.
    pub fn components(&self, component_impl: &str, link: &Link) -> &'m [String] {
        self.deployment.component_names(component_impl, &link.instance_name)
    }

    /// One key per deployed component of the endpoint's instance.
    pub fn instance_keys(&self, component_impl: &str, link: &Link) -> Vec<String> {
        self.components(component_impl, link)
            .iter()
            .map(|component| self.key(link, component))
            .collect()
    }

    /// Module instance to module instance inside one implementation:
    /// the cross product of both deployed-name sets.
    pub fn direct(
        &self,
        sender: &Candidate<'_>,
        receiver: &Candidate<'_>,
        pair: &DeclaredPair<'_>,
    ) -> Vec<(String, String)> {
        if !sender.same_implementation(receiver) {
            return Vec::new();
        }
        let receiver_keys = self.instance_keys(receiver.component_impl, pair.receiver_own);
        self.instance_keys(sender.component_impl, pair.sender_own)
            .into_iter()
            .flat_map(|sender_key| {
                receiver_keys
                    .iter()
                    .map(move |receiver_key| (sender_key.clone(), receiver_key.clone()))
            })
            .collect()
    }

    /// Through assembly wires: the sender's declared port on each sender
    /// component must be wired to the receiver's declared port on one of the
    /// receiver's components.
    pub fn wired(
        &self,
        sender: &Candidate<'_>,
        receiver: &Candidate<'_>,
        pair: &DeclaredPair<'_>,
    ) -> Vec<(String, String)> {
        let sender_components = self.components(sender.component_impl, pair.sender_own);
        let receiver_components = self.components(receiver.component_impl, pair.receiver_own);
        if sender_components.is_empty()
            || receiver_components.is_empty()
            || pair.sender_declared.operation_name != pair.receiver_declared.operation_name
        {
            return Vec::new();
        }

        let mut keys = Vec::new();
        for component in sender_components {
            for port in self
                .deployment
                .wired_ports(component, &pair.sender_declared.instance_name)
            {
                if port.service == pair.receiver_declared.instance_name
                    && receiver_components.contains(&port.component)
                {
                    keys.push((
                        self.key(pair.sender_own, component),
                        self.key(pair.receiver_own, &port.component),
                    ));
                }
            }
        }
        keys
    }
}

/// `instance:operation`, the key of a dynamic trigger sub-port.
pub(super) fn port_key(link: &Link) -> String {
    format!("{}:{}", link.instance_name, link.operation_name)
}

#[cfg(test)]
pub(super) mod fixtures {
    use ecoa_core::decl::{
        AssemblyDecl, ComponentInstanceDecl, DeployedModuleDecl, DeploymentDecl,
        ProtectionDomainDecl, WireDecl, WireEndDecl,
    };
    use ecoa_core::{Language, Link, LinkKind, LinkMap, ModuleScope};
    use ecoa_registry::{DeploymentIndex, TypeRegistry};

    use crate::model::Model;

    pub fn scope(component_impl: &str, module_impl: &str) -> ModuleScope {
        ModuleScope {
            component_impl: component_impl.into(),
            module_type: format!("{module_impl}_t"),
            module_impl: module_impl.into(),
            language: Language::C,
        }
    }

    pub fn mi(instance: &str, operation: &str) -> Link {
        Link::new(LinkKind::ModuleInstance, instance, operation)
    }

    pub fn links(entries: Vec<(Link, Vec<Link>)>) -> LinkMap {
        entries.into_iter().collect()
    }

    /// `components`: `(name, implementation)`; `deployed`: `(component, module_inst)`;
    /// `wires`: `((component, port), (component, port))`.
    pub fn model(
        components: &[(&str, &str)],
        deployed: &[(&str, &str)],
        wires: &[((&str, &str), (&str, &str))],
    ) -> Model {
        let assembly = AssemblyDecl {
            components: components
                .iter()
                .map(|(name, implementation)| ComponentInstanceDecl {
                    name: name.to_string(),
                    implementation: implementation.to_string(),
                    properties: Default::default(),
                })
                .collect(),
            wires: wires
                .iter()
                .map(|(a, b)| WireDecl {
                    source: WireEndDecl {
                        component: a.0.into(),
                        service: a.1.into(),
                    },
                    target: WireEndDecl {
                        component: b.0.into(),
                        service: b.1.into(),
                    },
                })
                .collect(),
        };
        let deployment = DeploymentDecl {
            protection_domains: vec![ProtectionDomainDecl {
                name: "pd".into(),
                deployed_modules: deployed
                    .iter()
                    .map(|(component, module_instance)| DeployedModuleDecl {
                        component: component.to_string(),
                        module_instance: module_instance.to_string(),
                    })
                    .collect(),
            }],
        };
        let index = DeploymentIndex::build(&deployment, &assembly).unwrap();
        Model::new(TypeRegistry::new(), index)
    }
}
