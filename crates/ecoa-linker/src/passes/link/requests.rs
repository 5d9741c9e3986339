//! Requests Linker.
//!
//! Clients (request sends) are bound to servers (request receptions) with
//! `inst:component` keys on both sides:
//!
//! ```text
//! client declares      server declares      strategy
//! module_instance      module_instance      direct, same implementation
//! reference            service              assembly wire reference -> service
//! ```

use tracing::{debug, debug_span};

use ecoa_core::LinkKind;

use super::LinkOutput;
use super::common::{KeyResolver, Resolved, bind_all, candidates, declared_pairs};
use crate::model::Model;

/// Links request sends to request receptions.
pub struct RequestsLinker<'m> {
    model: &'m mut Model,
}

impl<'m> RequestsLinker<'m> {
    pub fn new(model: &'m mut Model) -> Self {
        Self { model }
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(self) -> LinkOutput {
        let span = debug_span!("link_requests");
        let _guard = span.enter();

        let model = self.model;
        let resolved = resolve(model);
        let bindings = bind_all(&mut model.requests, &resolved);
        debug!(
            clients = model.requests_send.len(),
            servers = model.requests_received.len(),
            bindings,
            "linked requests"
        );
        LinkOutput { bindings }
    }
}

fn resolve(model: &Model) -> Vec<Resolved> {
    let keys = KeyResolver::new(&model.deployment, false);
    let servers = candidates(&model.requests_received);
    let mut resolved = Vec::new();

    for client in candidates(&model.requests_send) {
        for server in &servers {
            for pair in declared_pairs(client.links, server.links) {
                let found = match (pair.sender_declared.kind, pair.receiver_declared.kind) {
                    (LinkKind::ModuleInstance, LinkKind::ModuleInstance) if pair.is_mutual() => {
                        keys.direct(&client, server, &pair)
                    }
                    (LinkKind::Reference, LinkKind::Service) => keys.wired(&client, server, &pair),
                    _ => continue,
                };
                resolved.extend(found.into_iter().map(|(client_key, server_key)| {
                    Resolved::new(client.id, client_key, server.id, server_key)
                }));
            }
        }
    }
    resolved
}
