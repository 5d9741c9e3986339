//! Request-response entities.

use ecoa_core::{ModelError, Parameter, RequestReceived, RequestSend, TypeCategory, TypeRef};

use super::{LinkIndex, ParseCx, locator};

/// Implicit first input of a received request, identifying the call.
const REQUEST_ID_PARAMETER: &str = "ID";

pub(super) fn parse(cx: &mut ParseCx<'_, '_>) -> Result<usize, ModelError> {
    let mut count = 0;
    for site in cx.sites {
        let group = site.scope.key();
        for decl in &site.module_type.operations.request_sent {
            let context = locator(&site.scope, &decl.name);
            let inputs = cx.parameters(&decl.inputs, &context)?;
            let outputs = cx.parameters(&decl.outputs, &context)?;
            let links = LinkIndex::select(&cx.links.request_clients, &site.instances, &decl.name);
            cx.model.requests_send.insert(
                group.clone(),
                RequestSend {
                    scope: site.scope.clone(),
                    name: decl.name.clone(),
                    inputs,
                    outputs,
                    is_synchronous: decl.is_synchronous,
                    links,
                },
            );
            count += 1;
        }
        for decl in &site.module_type.operations.request_received {
            let context = locator(&site.scope, &decl.name);
            let mut inputs = vec![Parameter::new(
                REQUEST_ID_PARAMETER,
                TypeRef::standard("uint32"),
                TypeCategory::Simple,
            )];
            inputs.extend(cx.parameters(&decl.inputs, &context)?);
            let outputs = cx.parameters(&decl.outputs, &context)?;
            let links = LinkIndex::select(&cx.links.request_servers, &site.instances, &decl.name);
            cx.model.requests_received.insert(
                group.clone(),
                RequestReceived {
                    scope: site.scope.clone(),
                    name: decl.name.clone(),
                    inputs,
                    outputs,
                    links,
                },
            );
            count += 1;
        }
    }
    Ok(count)
}
