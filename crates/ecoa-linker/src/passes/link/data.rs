//! Versioned Data Linker.
//!
//! Writers are bound to readers with `inst:component:operation` keys. A
//! writer links directly to readers of its own implementation, or through
//! an assembly wire from the service it provides to the reference of the
//! reading component.
//!
//! Once bound, every resolved key is stamped with the `controlled` flag of
//! the declaring endpoint (found by the instance name in the key).

use tracing::{debug, debug_span};

use ecoa_core::{LinkKind, LinkMap};

use super::LinkOutput;
use super::common::{KeyResolver, Resolved, bind_all, candidates, declared_pairs};
use crate::model::Model;

/// Links data writers to data readers.
pub struct DataLinker<'m> {
    model: &'m mut Model,
}

impl<'m> DataLinker<'m> {
    pub fn new(model: &'m mut Model) -> Self {
        Self { model }
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(self) -> LinkOutput {
        let span = debug_span!("link_data");
        let _guard = span.enter();

        let model = self.model;
        let resolved = resolve(model);
        let bindings = bind_all(&mut model.data, &resolved);

        for binding in &resolved {
            if let Some(writer) = model.data_written.get_mut(binding.sender.index) {
                let controlled = controlled(&writer.links, &binding.sender_key);
                writer.controlled.insert(binding.sender_key.clone(), controlled);
            }
            if let Some(reader) = model.data_read.get_mut(binding.receiver.index) {
                let controlled = controlled(&reader.links, &binding.receiver_key);
                reader.controlled.insert(binding.receiver_key.clone(), controlled);
            }
        }
        debug!(
            writers = model.data_written.len(),
            readers = model.data_read.len(),
            bindings,
            "linked versioned data"
        );
        LinkOutput { bindings }
    }
}

fn resolve(model: &Model) -> Vec<Resolved> {
    let keys = KeyResolver::new(&model.deployment, true);
    let readers = candidates(&model.data_read);
    let mut resolved = Vec::new();

    for writer in candidates(&model.data_written) {
        for reader in &readers {
            for pair in declared_pairs(writer.links, reader.links) {
                let found = match (pair.sender_declared.kind, pair.receiver_declared.kind) {
                    (LinkKind::ModuleInstance, LinkKind::ModuleInstance) if pair.is_mutual() => {
                        keys.direct(&writer, reader, &pair)
                    }
                    (LinkKind::Service, LinkKind::Reference) => keys.wired(&writer, reader, &pair),
                    _ => continue,
                };
                resolved.extend(found.into_iter().map(|(writer_key, reader_key)| {
                    Resolved::new(writer.id, writer_key, reader.id, reader_key)
                }));
            }
        }
    }
    resolved
}

/// Controlled flag of the own endpoint whose instance starts `key`.
fn controlled(links: &LinkMap, key: &str) -> bool {
    let instance = key.split(':').next().unwrap_or_default();
    links
        .keys()
        .find(|own| own.instance_name == instance)
        .and_then(|own| own.controlled)
        .unwrap_or(true)
}
