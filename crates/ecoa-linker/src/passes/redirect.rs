//! Dynamic-Trigger Redirection.
//!
//! A dynamic trigger is one relay split in two entities. After linking, a
//! sender bound to the trigger's `in` port is rebound straight to the
//! receivers of the trigger's `out` port:
//!
//! ```text
//! before:  M1:A ──> DT:in        DT:out ──> M2:X, M3:Y
//! after:   M1:A ──> M2:X, M3:Y   DT:out ──> M2:X, M3:Y
//! ```
//!
//! Runs once, after every linker. A second run finds no binding to a
//! dynamic trigger `in` port and changes nothing.

use tracing::{debug, debug_span, trace};

use ecoa_core::{EntityCategory, EntityId};

use crate::model::Model;

/// Result of the redirection pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RedirectOutput {
    /// Bindings to a dynamic trigger `in` port that were removed.
    pub redirected: usize,
    /// Bindings added from senders to the trigger's final receivers.
    pub added: usize,
}

/// One sender binding to a dynamic trigger `in` port.
struct Redirect {
    sender: EntityId,
    sender_key: String,
    trigger: EntityId,
    receiver_key: String,
    /// `(receiver_key, receiver)` of the trigger's `out` port.
    targets: Vec<(String, EntityId)>,
}

/// Replaces bindings to dynamic triggers by their final receivers.
pub struct DynamicTriggerRedirection<'m> {
    model: &'m mut Model,
}

impl<'m> DynamicTriggerRedirection<'m> {
    pub fn new(model: &'m mut Model) -> Self {
        Self { model }
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(self) -> RedirectOutput {
        let span = debug_span!("redirect_dynamic_triggers");
        let _guard = span.enter();

        let model = self.model;
        let redirects = collect(model);

        let mut output = RedirectOutput::default();
        for redirect in redirects {
            for (receiver_key, receiver) in &redirect.targets {
                if model
                    .events
                    .bind(redirect.sender, &redirect.sender_key, *receiver, receiver_key)
                {
                    output.added += 1;
                }
            }
            if model.events.unbind(
                redirect.sender,
                &redirect.sender_key,
                redirect.trigger,
                &redirect.receiver_key,
            ) {
                trace!(
                    sender = %redirect.sender,
                    sender_key = %redirect.sender_key,
                    trigger = %redirect.receiver_key,
                    targets = redirect.targets.len(),
                    "redirected"
                );
                output.redirected += 1;
            }
        }
        debug!(redirected = output.redirected, added = output.added, "redirected dynamic triggers");
        output
    }
}

fn collect(model: &Model) -> Vec<Redirect> {
    model
        .events
        .iter()
        .filter(|(sender, _, receiver_key, receiver)| {
            matches!(sender.category, EntityCategory::EventSend | EntityCategory::External)
                && receiver.category == EntityCategory::DynamicTriggerReceived
                && sub_port(receiver_key) == Some("in")
        })
        .map(|(sender, sender_key, receiver_key, receiver)| Redirect {
            sender,
            sender_key: sender_key.to_string(),
            trigger: receiver,
            receiver_key: receiver_key.to_string(),
            targets: out_receivers(model, receiver),
        })
        .collect()
}

/// Receivers of the `out` port of the trigger whose `in` half is `received`.
fn out_receivers(model: &Model, received: EntityId) -> Vec<(String, EntityId)> {
    let Some(trigger) = model.dynamic_triggers_received.get(received.index) else {
        return Vec::new();
    };
    let Some((index, _)) = model
        .dynamic_triggers_send
        .group(&trigger.component_impl)
        .find(|(_, send)| send.name == trigger.name)
    else {
        return Vec::new();
    };
    model
        .events
        .receivers_of(EntityId::new(EntityCategory::DynamicTriggerSend, index))
        .and_then(|groups| {
            groups
                .iter()
                .find(|(sender_key, _)| sub_port(sender_key) == Some("out"))
        })
        .map(|(_, receivers)| {
            receivers
                .iter()
                .flat_map(|(key, peers)| peers.iter().map(move |&receiver| (key.clone(), receiver)))
                .collect()
        })
        .unwrap_or_default()
}

/// `in` / `out` of a `dt:port` key.
fn sub_port(key: &str) -> Option<&str> {
    key.split(':').nth(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecoa_core::{DynamicTriggerReceived, DynamicTriggerSend, LinkMap};
    use ecoa_registry::{DeploymentIndex, TypeRegistry};

    fn model() -> (Model, EntityId, EntityId) {
        let mut model = Model::new(TypeRegistry::new(), DeploymentIndex::default());
        let send = model.dynamic_triggers_send.insert(
            "C",
            DynamicTriggerSend {
                component_impl: "C".into(),
                name: "DT".into(),
                parameters: vec![],
                links: LinkMap::new(),
            },
        );
        let received = model.dynamic_triggers_received.insert(
            "C",
            DynamicTriggerReceived {
                component_impl: "C".into(),
                name: "DT".into(),
                parameters: vec![],
                links: LinkMap::new(),
            },
        );
        (
            model,
            EntityId::new(EntityCategory::DynamicTriggerSend, send),
            EntityId::new(EntityCategory::DynamicTriggerReceived, received),
        )
    }

    fn id(category: EntityCategory, index: u32) -> EntityId {
        EntityId::new(category, index)
    }

    #[test]
    fn sender_rebound_to_final_receivers() {
        let (mut model, dt_out, dt_in) = model();
        let sender = id(EntityCategory::EventSend, 0);
        let x = id(EntityCategory::EventReceived, 0);
        let y = id(EntityCategory::EventReceived, 1);
        model.events.bind(sender, "M1:A", dt_in, "DT:in");
        model.events.bind(dt_out, "DT:out", x, "M2:X");
        model.events.bind(dt_out, "DT:out", y, "M3:Y");

        let output = DynamicTriggerRedirection::new(&mut model).run();
        assert_eq!(output, RedirectOutput { redirected: 1, added: 2 });

        let receivers = &model.events.receivers_of(sender).unwrap()["M1:A"];
        assert_eq!(receivers.len(), 2);
        assert!(receivers["M2:X"].contains(&x));
        assert!(receivers["M3:Y"].contains(&y));
        assert!(model.events.senders_of(dt_in).is_none());
        assert!(
            model
                .events
                .iter()
                .all(|(_, _, _, r)| r.category != EntityCategory::DynamicTriggerReceived)
        );
    }

    #[test]
    fn redirection_is_idempotent() {
        let (mut model, dt_out, dt_in) = model();
        let sender = id(EntityCategory::External, 0);
        let x = id(EntityCategory::EventReceived, 0);
        model.events.bind(sender, "go:c", dt_in, "DT:in");
        model.events.bind(dt_out, "DT:out", x, "M2:X");

        DynamicTriggerRedirection::new(&mut model).run();
        let first: Vec<_> = model.events.iter().map(|(s, sk, rk, r)| (s, sk.to_string(), rk.to_string(), r)).collect();
        let second = DynamicTriggerRedirection::new(&mut model).run();
        assert_eq!(second, RedirectOutput::default());
        let again: Vec<_> = model.events.iter().map(|(s, sk, rk, r)| (s, sk.to_string(), rk.to_string(), r)).collect();
        assert_eq!(first, again);
    }

    #[test]
    fn trigger_without_receivers_is_dropped() {
        let (mut model, _, dt_in) = model();
        let sender = id(EntityCategory::EventSend, 0);
        model.events.bind(sender, "M1:A", dt_in, "DT:in");

        let output = DynamicTriggerRedirection::new(&mut model).run();
        assert_eq!(output, RedirectOutput { redirected: 1, added: 0 });
        assert!(model.events.is_empty());
    }
}
