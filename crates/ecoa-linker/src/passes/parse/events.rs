//! Event-style entities: events, externals, triggers and dynamic triggers.

use indexmap::IndexMap;
use tracing::trace;

use ecoa_core::{
    DynamicTriggerReceived, DynamicTriggerSend, EventReceived, EventSend, External, Language,
    LinkKind, LinkMap, ModelError, Parameter, Trigger, TypeCategory, TypeRef,
};

use super::{LinkIndex, ParseCx, locator};

/// Implicit first parameter of a dynamic trigger.
const DELAY_PARAMETER: &str = "delayDuration";

pub(super) fn parse(cx: &mut ParseCx<'_, '_>) -> Result<usize, ModelError> {
    let mut count = 0;

    for site in cx.sites {
        let group = site.scope.key();
        for decl in &site.module_type.operations.event_sent {
            let inputs = cx.parameters(&decl.inputs, &locator(&site.scope, &decl.name))?;
            let links = LinkIndex::select(&cx.links.event_senders, &site.instances, &decl.name);
            cx.model.events_send.insert(
                group.clone(),
                EventSend {
                    scope: site.scope.clone(),
                    name: decl.name.clone(),
                    inputs,
                    links,
                },
            );
            count += 1;
        }
        for decl in &site.module_type.operations.event_received {
            let inputs = cx.parameters(&decl.inputs, &locator(&site.scope, &decl.name))?;
            let links = LinkIndex::select(&cx.links.event_receivers, &site.instances, &decl.name);
            cx.model.events_received.insert(
                group.clone(),
                EventReceived {
                    scope: site.scope.clone(),
                    name: decl.name.clone(),
                    inputs,
                    links,
                },
            );
            count += 1;
        }
    }

    count += parse_externals(cx)?;
    count += parse_triggers(cx);
    count += parse_dynamic_triggers(cx)?;
    Ok(count)
}

/// One external per distinct `(operation, language)` of external senders.
fn parse_externals(cx: &mut ParseCx<'_, '_>) -> Result<usize, ModelError> {
    let component = &cx.component.name;
    let mut externals: IndexMap<(String, Language), LinkMap> = IndexMap::new();

    for (own, receivers) in &cx.links.event_senders {
        if own.kind != LinkKind::External {
            continue;
        }
        let written = own.language.as_deref().unwrap_or_default();
        let language = Language::parse(written).ok_or_else(|| {
            ModelError::unsupported_language(written, format!("{component}:{}", own.operation_name))
        })?;
        externals
            .entry((own.operation_name.clone(), language))
            .or_default()
            .insert(own.clone(), receivers.clone());
    }

    let count = externals.len();
    for ((name, language), links) in externals {
        trace!(component = %component, external = %name, %language, "external");
        cx.model.externals.insert(
            component.clone(),
            External {
                component_impl: component.clone(),
                name,
                language,
                inputs: Vec::new(),
                links,
            },
        );
    }
    Ok(count)
}

fn parse_triggers(cx: &mut ParseCx<'_, '_>) -> usize {
    let component = &cx.component.name;
    for instance in &cx.component.trigger_instances {
        let links = LinkIndex::select_instance(&cx.links.event_senders, LinkKind::Trigger, &instance.name);
        cx.model.triggers.insert(
            component.clone(),
            Trigger {
                component_impl: component.clone(),
                name: instance.name.clone(),
                links,
            },
        );
    }
    cx.component.trigger_instances.len()
}

/// Both halves of every dynamic trigger instance.
fn parse_dynamic_triggers(cx: &mut ParseCx<'_, '_>) -> Result<usize, ModelError> {
    let component = &cx.component.name;
    for instance in &cx.component.dynamic_trigger_instances {
        let context = format!("{component}:{}", instance.name);
        let mut parameters = vec![Parameter::new(
            DELAY_PARAMETER,
            TypeRef::standard("duration"),
            TypeCategory::Record,
        )];
        parameters.extend(cx.parameters(&instance.parameters, &context)?);

        let send_links = LinkIndex::select_instance(
            &cx.links.event_senders,
            LinkKind::DynamicTrigger,
            &instance.name,
        );
        let received_links = LinkIndex::select_instance(
            &cx.links.event_receivers,
            LinkKind::DynamicTrigger,
            &instance.name,
        );
        cx.model.dynamic_triggers_send.insert(
            component.clone(),
            DynamicTriggerSend {
                component_impl: component.clone(),
                name: instance.name.clone(),
                parameters: parameters.clone(),
                links: send_links,
            },
        );
        cx.model.dynamic_triggers_received.insert(
            component.clone(),
            DynamicTriggerReceived {
                component_impl: component.clone(),
                name: instance.name.clone(),
                parameters,
                links: received_links,
            },
        );
    }
    Ok(cx.component.dynamic_trigger_instances.len() * 2)
}
