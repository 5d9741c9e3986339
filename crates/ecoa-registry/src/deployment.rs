//! Deployment/Assembly Index.
//!
//! Maps an abstract `(component_impl, module_inst)` pair to the concrete
//! component instances it is deployed under, and holds the assembly's
//! service-wiring graph.
//!
//! Uses `petgraph::UnGraph` with:
//! - Nodes: [`ServicePort`] (`component`, `service`)
//! - Edges: one per assembly wire, weighted by declaration index
//!
//! Wires are undirected for matching: the linker recovers direction from
//! which side plays the service role and which the reference role.

use indexmap::IndexMap;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use ecoa_core::ModelError;
use ecoa_core::decl::{AssemblyDecl, ComponentInstanceDecl, DeploymentDecl, WireEndDecl};

/// One end of a wire: a named port of a component instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServicePort {
    pub component: String,
    pub service: String,
}

impl ServicePort {
    pub fn new(component: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            service: service.into(),
        }
    }
}

/// Edge weight: position of the wire in the assembly declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct WireOrder(usize);

/// Resolved deployment and assembly.
#[derive(Debug, Default)]
pub struct DeploymentIndex {
    /// `component_impl:module_inst` -> deployed component names, in deployment order.
    component_names: IndexMap<String, Vec<String>>,
    components: IndexMap<String, ComponentInstanceDecl>,
    wiring: UnGraph<ServicePort, WireOrder>,
    ports: FxHashMap<ServicePort, NodeIndex>,
}

impl DeploymentIndex {
    /// Build the index from the deployment and the component assembly.
    pub fn build(deployment: &DeploymentDecl, assembly: &AssemblyDecl) -> Result<Self, ModelError> {
        let mut index = Self {
            components: assembly
                .components
                .iter()
                .map(|c| (c.name.clone(), c.clone()))
                .collect(),
            ..Self::default()
        };

        for domain in &deployment.protection_domains {
            for deployed in &domain.deployed_modules {
                let implementation = index
                    .implementation_of(&deployed.component)
                    .ok_or_else(|| ModelError::UnknownComponentInstance {
                        component: deployed.component.clone(),
                        context: format!("protection domain {}", domain.name),
                    })?
                    .to_string();
                let names = index
                    .component_names
                    .entry(format!("{implementation}:{}", deployed.module_instance))
                    .or_default();
                if !names.contains(&deployed.component) {
                    names.push(deployed.component.clone());
                }
                trace!(
                    domain = %domain.name,
                    component = %deployed.component,
                    module_instance = %deployed.module_instance,
                    "deployed module instance"
                );
            }
        }

        for (order, wire) in assembly.wires.iter().enumerate() {
            let source = index.port(&wire.source, order)?;
            let target = index.port(&wire.target, order)?;
            index.wiring.add_edge(source, target, WireOrder(order));
        }

        debug!(
            bindings = index.component_names.len(),
            components = index.components.len(),
            wires = index.wiring.edge_count(),
            "built deployment index"
        );
        Ok(index)
    }

    fn port(&mut self, end: &WireEndDecl, order: usize) -> Result<NodeIndex, ModelError> {
        if !self.components.contains_key(&end.component) {
            return Err(ModelError::UnknownComponentInstance {
                component: end.component.clone(),
                context: format!("wire #{order} ({})", end.service),
            });
        }
        let port = ServicePort::new(&end.component, &end.service);
        if let Some(&node) = self.ports.get(&port) {
            return Ok(node);
        }
        let node = self.wiring.add_node(port.clone());
        self.ports.insert(port, node);
        Ok(node)
    }

    /// Component names a module instance of an implementation is deployed under.
    pub fn component_names(&self, component_impl: &str, module_inst: &str) -> &[String] {
        self.component_names
            .get(&format!("{component_impl}:{module_inst}"))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every `(component_impl:module_inst, component names)` binding, in deployment order.
    pub fn bindings(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.component_names
            .iter()
            .map(|(key, names)| (key.as_str(), names.as_slice()))
    }

    /// Implementation of an assembly component instance.
    pub fn implementation_of(&self, component: &str) -> Option<&str> {
        self.components
            .get(component)
            .map(|c| c.implementation.as_str())
    }

    /// Property value of an assembly component instance.
    pub fn component_property(&self, component: &str, name: &str) -> Option<&str> {
        self.components
            .get(component)?
            .properties
            .get(name)
            .map(String::as_str)
    }

    /// Ports wired to `(component, service)`, in wire declaration order.
    pub fn wired_ports(&self, component: &str, service: &str) -> Vec<&ServicePort> {
        let Some(&node) = self.ports.get(&ServicePort::new(component, service)) else {
            return Vec::new();
        };
        let mut edges: Vec<_> = self.wiring.edges(node).collect();
        edges.sort_by_key(|edge| edge.weight().0);
        edges
            .into_iter()
            .map(|edge| {
                let other = if edge.source() == node {
                    edge.target()
                } else {
                    edge.source()
                };
                &self.wiring[other]
            })
            .collect()
    }

    /// Number of assembly wires.
    pub fn wire_count(&self) -> usize {
        self.wiring.edge_count()
    }

    /// Assembly component instances, in declaration order.
    pub fn components(&self) -> impl Iterator<Item = &ComponentInstanceDecl> {
        self.components.values()
    }
}
