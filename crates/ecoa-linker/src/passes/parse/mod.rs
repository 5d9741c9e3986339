//! Entity Parsers - build typed entities from one component implementation.
//!
//! One entity is built per `(component_impl, module_impl, operation)`.
//! Module instances only select which declared endpoints belong to the
//! entity; their deployment multiplicity is looked up later by the linkers.
//!
//! ## Order
//!
//! ```text
//! LinkIndex::build        declared endpoints, both directions
//! module                  Log / Time per module implementation, used libraries
//! events                  events, externals, triggers, dynamic triggers
//! requests                request send / received
//! data                    data read / written (with sibling writes)
//! properties              typed property values per deployed component
//! pinfos                  pinfo paths per deployed component
//! ```

mod data;
mod events;
mod links;
mod module;
mod pinfos;
mod properties;
mod requests;

pub use links::LinkIndex;

use indexmap::IndexMap;
use tracing::{debug, debug_span};

use ecoa_core::decl::{
    ComponentImplDecl, ModuleInstanceDecl, ModuleTypeDecl, NamedValueDecl, ParameterDecl,
};
use ecoa_core::{Language, ModelError, ModuleScope, Parameter, TypeCategory, TypeRef};

use crate::context::ProjectLayout;
use crate::model::Model;

/// Counts of what one component implementation contributed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ParseOutput {
    pub modules: usize,
    pub events: usize,
    pub requests: usize,
    pub data: usize,
    pub properties: usize,
    pub pinfos: usize,
}

impl ParseOutput {
    pub fn entities(&self) -> usize {
        self.events + self.requests + self.data + self.properties + self.pinfos
    }
}

/// Parses one component implementation into the model.
pub struct ComponentParser<'a> {
    model: &'a mut Model,
    layout: &'a ProjectLayout,
}

/// A module implementation with everything its entities need.
pub(crate) struct ModuleSite<'d> {
    pub scope: ModuleScope,
    pub module_type: &'d ModuleTypeDecl,
    /// Names of the instances of this implementation.
    pub instances: Vec<&'d str>,
}

/// What the per-category parsers share while walking one component.
pub(crate) struct ParseCx<'a, 'd> {
    pub model: &'a mut Model,
    pub layout: &'a ProjectLayout,
    pub component: &'d ComponentImplDecl,
    pub links: &'a LinkIndex,
    pub sites: &'a [ModuleSite<'d>],
}

impl<'a> ComponentParser<'a> {
    pub fn new(model: &'a mut Model, layout: &'a ProjectLayout) -> Self {
        Self { model, layout }
    }

    /// Parse every entity category of `component`.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(self, component: &ComponentImplDecl) -> Result<ParseOutput, ModelError> {
        let span = debug_span!("parse", component = %component.name);
        let _guard = span.enter();

        let sites = module_sites(component)?;
        let links = LinkIndex::build(component);
        let mut cx = ParseCx {
            model: self.model,
            layout: self.layout,
            component,
            links: &links,
            sites: &sites,
        };

        let output = ParseOutput {
            modules: module::parse(&mut cx),
            events: events::parse(&mut cx)?,
            requests: requests::parse(&mut cx)?,
            data: data::parse(&mut cx)?,
            properties: properties::parse(&mut cx)?,
            pinfos: pinfos::parse(&mut cx)?,
        };
        debug!(
            modules = output.modules,
            entities = output.entities(),
            "parsed component implementation"
        );
        Ok(output)
    }
}

impl<'d> ParseCx<'_, 'd> {
    /// Resolve a declared parameter list.
    pub fn parameters(
        &self,
        params: &[ParameterDecl],
        context: &str,
    ) -> Result<Vec<Parameter>, ModelError> {
        params
            .iter()
            .map(|p| {
                let (type_ref, category) = self.typed(&p.type_name, context)?;
                Ok(Parameter::new(&p.name, type_ref, category))
            })
            .collect()
    }

    /// Resolve and classify a type name.
    pub fn typed(
        &self,
        name: &str,
        context: &str,
    ) -> Result<(TypeRef, TypeCategory), ModelError> {
        let registry = &self.model.registry;
        let type_ref = registry.resolve(name, context)?;
        let category = registry
            .classify(&type_ref)
            .ok_or_else(|| ModelError::unresolved_type(name, context))?;
        Ok((type_ref, category))
    }

    /// Module instance declaration of this component.
    pub fn instance(&self, name: &str) -> Option<&'d ModuleInstanceDecl> {
        self.component.module_instances.iter().find(|i| i.name == name)
    }

    /// Per-instance values of `name`, expanded once per deployed component.
    ///
    /// Keys are `component_impl:module_inst:component`. A value written
    /// `$prop` is replaced by the component instance's assembly property
    /// `prop`.
    pub fn deployed_values(
        &self,
        site: &ModuleSite<'_>,
        name: &str,
        select: fn(&ModuleInstanceDecl) -> &[NamedValueDecl],
    ) -> Result<IndexMap<String, String>, ModelError> {
        let component_impl = &site.scope.component_impl;
        let deployment = &self.model.deployment;
        let mut values = IndexMap::new();

        for &instance in &site.instances {
            let Some(value) = self
                .instance(instance)
                .and_then(|decl| select(decl).iter().find(|v| v.name == name))
            else {
                continue;
            };
            let value = value.value.trim();
            for component in deployment.component_names(component_impl, instance) {
                let resolved = match value.strip_prefix('$') {
                    Some(property) => deployment
                        .component_property(component, property)
                        .ok_or_else(|| ModelError::UnknownAssemblyProperty {
                            name: property.to_string(),
                            component: component.clone(),
                            context: format!("{component_impl}:{instance}:{name}"),
                        })?
                        .to_string(),
                    None => value.to_string(),
                };
                values.insert(format!("{component_impl}:{instance}:{component}"), resolved);
            }
        }
        Ok(values)
    }
}

/// Locator of an operation: `component_impl:module_impl:operation`.
pub(crate) fn locator(scope: &ModuleScope, operation: &str) -> String {
    format!("{}:{}", scope.key(), operation)
}

fn module_sites(component: &ComponentImplDecl) -> Result<Vec<ModuleSite<'_>>, ModelError> {
    for instance in &component.module_instances {
        if component.module_implementation(&instance.implementation).is_none() {
            return Err(ModelError::UnknownImplementation {
                implementation: instance.implementation.clone(),
                instance: format!("{}:{}", component.name, instance.name),
            });
        }
    }

    component
        .module_implementations
        .iter()
        .map(|implementation| {
            let module = format!("{}:{}", component.name, implementation.name);
            let module_type = component
                .module_type(&implementation.module_type)
                .ok_or_else(|| ModelError::UnknownModuleType {
                    module_type: implementation.module_type.clone(),
                    module: module.clone(),
                })?;
            let language = Language::parse(&implementation.language)
                .ok_or_else(|| ModelError::unsupported_language(&implementation.language, module))?;
            Ok(ModuleSite {
                scope: ModuleScope {
                    component_impl: component.name.clone(),
                    module_type: module_type.name.clone(),
                    module_impl: implementation.name.clone(),
                    language,
                },
                module_type,
                instances: component.instances_of(&implementation.name).collect(),
            })
        })
        .collect()
}
