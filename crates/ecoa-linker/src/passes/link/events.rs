//! Events Linker.
//!
//! Event-style senders are event sends, externals, triggers and the `out`
//! half of dynamic triggers; receivers are event receptions and the `in`
//! half of dynamic triggers. The phases run in this order:
//!
//! ```text
//! 1. EventSend          -> EventReceived     (any implementation)
//! 2. External           -> EventReceived     (same implementation)
//! 3. External           -> DynamicTrigger in
//! 4. Trigger            -> EventReceived
//! 5. DynamicTrigger out -> EventReceived
//! 6. EventSend          -> DynamicTrigger in
//! ```
//!
//! ## Keys
//!
//! | Strategy | Sender key | Receiver key |
//! |----------|------------|--------------|
//! | direct / wired | `inst:component` | `inst:component` |
//! | external | `operation:language` | `inst:component` |
//! | external to dynamic trigger | `operation:language` | `dt:in` |
//! | trigger | trigger instance | `inst:component` |
//! | dynamic trigger out | `dt:out` | `inst:component` |
//! | to dynamic trigger | `inst:component` | `dt:in` |
//!
//! An external starts without inputs; the first receiver it matches gives
//! them (an event reception's inputs, or a dynamic trigger's parameters).

use indexmap::IndexMap;
use tracing::{debug, debug_span};

use ecoa_core::{EntityCategory, LinkKind, Parameter};

use super::LinkOutput;
use super::common::{
    Candidate, DeclaredPair, KeyResolver, Resolved, bind_all, candidates, declared_pairs, port_key,
};
use crate::model::Model;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SenderRole {
    EventSend,
    External,
    Trigger,
    DynamicTriggerOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReceiverRole {
    EventReceived,
    DynamicTriggerIn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    Direct,
    Wired,
    External,
    ExternalToDynamicTrigger,
    Trigger,
    DynamicTriggerOut,
    ToDynamicTrigger,
}

const PHASES: [(SenderRole, ReceiverRole); 6] = [
    (SenderRole::EventSend, ReceiverRole::EventReceived),
    (SenderRole::External, ReceiverRole::EventReceived),
    (SenderRole::External, ReceiverRole::DynamicTriggerIn),
    (SenderRole::Trigger, ReceiverRole::EventReceived),
    (SenderRole::DynamicTriggerOut, ReceiverRole::EventReceived),
    (SenderRole::EventSend, ReceiverRole::DynamicTriggerIn),
];

/// Pick the strategy from the roles and the declared endpoint kinds:
/// `sender_declared` is the receiver kind named by the sender,
/// `receiver_declared` the sender kind named by the receiver.
fn strategy(
    sender: SenderRole,
    receiver: ReceiverRole,
    sender_declared: LinkKind,
    receiver_declared: LinkKind,
) -> Option<Strategy> {
    use LinkKind::{DynamicTrigger, External, ModuleInstance, Trigger};

    match (sender, receiver) {
        (SenderRole::EventSend, ReceiverRole::EventReceived) => {
            match (sender_declared, receiver_declared) {
                (ModuleInstance, ModuleInstance) => Some(Strategy::Direct),
                (s, r) if s.is_wired() && r.is_wired() => Some(Strategy::Wired),
                _ => None,
            }
        }
        (SenderRole::External, ReceiverRole::EventReceived) => {
            matches!((sender_declared, receiver_declared), (ModuleInstance, External))
                .then_some(Strategy::External)
        }
        (SenderRole::External, ReceiverRole::DynamicTriggerIn) => {
            matches!((sender_declared, receiver_declared), (DynamicTrigger, External))
                .then_some(Strategy::ExternalToDynamicTrigger)
        }
        (SenderRole::Trigger, ReceiverRole::EventReceived) => {
            matches!((sender_declared, receiver_declared), (ModuleInstance, Trigger))
                .then_some(Strategy::Trigger)
        }
        (SenderRole::DynamicTriggerOut, ReceiverRole::EventReceived) => {
            matches!((sender_declared, receiver_declared), (ModuleInstance, DynamicTrigger))
                .then_some(Strategy::DynamicTriggerOut)
        }
        (SenderRole::EventSend, ReceiverRole::DynamicTriggerIn) => {
            matches!((sender_declared, receiver_declared), (DynamicTrigger, ModuleInstance))
                .then_some(Strategy::ToDynamicTrigger)
        }
        // Triggers and dynamic triggers are never chained into a dynamic trigger.
        (SenderRole::Trigger | SenderRole::DynamicTriggerOut, ReceiverRole::DynamicTriggerIn) => None,
    }
}

/// Links every event-style sender to its receivers.
pub struct EventsLinker<'m> {
    model: &'m mut Model,
}

impl<'m> EventsLinker<'m> {
    pub fn new(model: &'m mut Model) -> Self {
        Self { model }
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(self) -> LinkOutput {
        let span = debug_span!("link_events");
        let _guard = span.enter();

        let model = self.model;
        let (resolved, external_inputs) = {
            let mut pass = Resolution::new(model);
            for (sender, receiver) in PHASES {
                pass.phase(sender, receiver);
            }
            (pass.resolved, pass.external_inputs)
        };

        let bindings = bind_all(&mut model.events, &resolved);
        let backfilled = external_inputs.len();
        for (index, inputs) in external_inputs {
            if let Some(external) = model.externals.get_mut(index) {
                external.inputs = inputs;
            }
        }
        debug!(bindings, backfilled, "linked events");
        LinkOutput { bindings }
    }
}

/// Read-only half of the pass.
struct Resolution<'m> {
    model: &'m Model,
    keys: KeyResolver<'m>,
    resolved: Vec<Resolved>,
    /// External index -> inputs taken from its first matched receiver.
    external_inputs: IndexMap<u32, Vec<Parameter>>,
}

impl<'m> Resolution<'m> {
    fn new(model: &'m Model) -> Self {
        Self {
            model,
            keys: KeyResolver::new(&model.deployment, false),
            resolved: Vec::new(),
            external_inputs: IndexMap::new(),
        }
    }

    fn senders(&self, role: SenderRole) -> Vec<Candidate<'m>> {
        let model = self.model;
        match role {
            SenderRole::EventSend => candidates(&model.events_send),
            SenderRole::External => candidates(&model.externals),
            SenderRole::Trigger => candidates(&model.triggers),
            SenderRole::DynamicTriggerOut => candidates(&model.dynamic_triggers_send),
        }
    }

    fn receivers(&self, role: ReceiverRole) -> Vec<Candidate<'m>> {
        let model = self.model;
        match role {
            ReceiverRole::EventReceived => candidates(&model.events_received),
            ReceiverRole::DynamicTriggerIn => candidates(&model.dynamic_triggers_received),
        }
    }

    fn phase(&mut self, sender_role: SenderRole, receiver_role: ReceiverRole) {
        let senders = self.senders(sender_role);
        let receivers = self.receivers(receiver_role);
        for sender in &senders {
            for receiver in &receivers {
                for pair in declared_pairs(sender.links, receiver.links) {
                    let Some(strategy) = strategy(
                        sender_role,
                        receiver_role,
                        pair.sender_declared.kind,
                        pair.receiver_declared.kind,
                    ) else {
                        continue;
                    };
                    self.link(strategy, sender, receiver, &pair);
                }
            }
        }
    }

    fn link(
        &mut self,
        strategy: Strategy,
        sender: &Candidate<'m>,
        receiver: &Candidate<'m>,
        pair: &DeclaredPair<'_>,
    ) {
        if strategy != Strategy::Wired
            && !(pair.is_mutual() && sender.same_implementation(receiver))
        {
            return;
        }

        let receiver_keys = || self.keys.instance_keys(receiver.component_impl, pair.receiver_own);
        let keys = match strategy {
            Strategy::Direct => self.keys.direct(sender, receiver, pair),
            Strategy::Wired => self.keys.wired(sender, receiver, pair),
            Strategy::External => fan_out(self.external_key(sender), receiver_keys()),
            Strategy::ExternalToDynamicTrigger => {
                vec![(self.external_key(sender), port_key(pair.receiver_own))]
            }
            Strategy::Trigger => fan_out(pair.sender_own.instance_name.clone(), receiver_keys()),
            Strategy::DynamicTriggerOut => fan_out(port_key(pair.sender_own), receiver_keys()),
            Strategy::ToDynamicTrigger => {
                let receiver_key = port_key(pair.receiver_own);
                self.keys
                    .instance_keys(sender.component_impl, pair.sender_own)
                    .into_iter()
                    .map(|sender_key| (sender_key, receiver_key.clone()))
                    .collect()
            }
        };

        if matches!(strategy, Strategy::External | Strategy::ExternalToDynamicTrigger)
            && !keys.is_empty()
        {
            self.backfill(sender, receiver);
        }
        self.resolved.extend(keys.into_iter().map(|(sender_key, receiver_key)| {
            Resolved::new(sender.id, sender_key, receiver.id, receiver_key)
        }));
    }

    fn external_key(&self, sender: &Candidate<'_>) -> String {
        self.model.externals[sender.id.index].key()
    }

    fn backfill(&mut self, sender: &Candidate<'_>, receiver: &Candidate<'_>) {
        let index = sender.id.index;
        if self.external_inputs.contains_key(&index)
            || !self.model.externals[index].inputs.is_empty()
        {
            return;
        }
        let inputs = match receiver.id.category {
            EntityCategory::EventReceived => &self.model.events_received[receiver.id.index].inputs,
            EntityCategory::DynamicTriggerReceived => {
                &self.model.dynamic_triggers_received[receiver.id.index].parameters
            }
            _ => return,
        };
        self.external_inputs.insert(index, inputs.clone());
    }
}

fn fan_out(sender_key: String, receiver_keys: Vec<String>) -> Vec<(String, String)> {
    receiver_keys
        .into_iter()
        .map(|receiver_key| (sender_key.clone(), receiver_key))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::super::common::fixtures::*;
    use super::*;
    use ecoa_core::{
        DynamicTriggerReceived, DynamicTriggerSend, EntityId, EventReceived, EventSend, External,
        Language, Link, LinkMap, Trigger, TypeCategory, TypeRef,
    };

    fn event_send(model: &mut Model, component: &str, module: &str, name: &str, links: LinkMap) -> EntityId {
        let index = model.events_send.insert(
            format!("{component}:{module}"),
            EventSend {
                scope: scope(component, module),
                name: name.into(),
                inputs: vec![],
                links,
            },
        );
        EntityId::new(EntityCategory::EventSend, index)
    }

    fn event_received(
        model: &mut Model,
        component: &str,
        module: &str,
        name: &str,
        links: LinkMap,
    ) -> EntityId {
        let index = model.events_received.insert(
            format!("{component}:{module}"),
            EventReceived {
                scope: scope(component, module),
                name: name.into(),
                inputs: vec![Parameter::new(
                    "speed",
                    TypeRef::standard("int32"),
                    TypeCategory::Simple,
                )],
                links,
            },
        );
        EntityId::new(EntityCategory::EventReceived, index)
    }

    fn dt_received(model: &mut Model, links: LinkMap) -> EntityId {
        let index = model.dynamic_triggers_received.insert(
            "C",
            DynamicTriggerReceived {
                component_impl: "C".into(),
                name: "DT".into(),
                parameters: vec![Parameter::new(
                    "delayDuration",
                    TypeRef::standard("duration"),
                    TypeCategory::Record,
                )],
                links,
            },
        );
        EntityId::new(EntityCategory::DynamicTriggerReceived, index)
    }

    fn dt(operation: &str) -> Link {
        Link::new(LinkKind::DynamicTrigger, "DT", operation)
    }

    fn receiver_keys(model: &Model, sender: EntityId) -> Vec<(String, String)> {
        model
            .events
            .iter()
            .filter(|(s, ..)| *s == sender)
            .map(|(_, sk, rk, _)| (sk.to_string(), rk.to_string()))
            .collect()
    }

    fn pairs(keys: &[(&str, &str)]) -> Vec<(String, String)> {
        keys.iter().map(|(a, b)| (a.to_string(), b.to_string())).collect()
    }

    #[test]
    fn direct_link_fans_out_over_deployments() {
        let mut model = model(
            &[("A", "C"), ("B", "C"), ("X", "C")],
            &[("A", "M1"), ("B", "M1"), ("X", "M2")],
            &[],
        );
        let send = event_send(&mut model, "C", "Mod1", "E", links(vec![(mi("M1", "E"), vec![mi("M2", "E")])]));
        let received = event_received(&mut model, "C", "Mod2", "E", links(vec![(mi("M2", "E"), vec![mi("M1", "E")])]));

        let output = EventsLinker::new(&mut model).run();
        assert_eq!(output.bindings, 2);
        assert_eq!(receiver_keys(&model, send), pairs(&[("M1:A", "M2:X"), ("M1:B", "M2:X")]));
        let senders = model.events.senders_of(received).unwrap();
        assert!(senders["M2:X"]["M1:A"].contains(&send));
        assert!(senders["M2:X"]["M1:B"].contains(&send));
    }

    #[test]
    fn receivers_on_one_instance_both_linked() {
        let mut model = model(&[("A", "C")], &[("A", "M1"), ("A", "M2")], &[]);
        let send = event_send(
            &mut model,
            "C",
            "Mod1",
            "E",
            links(vec![(mi("M1", "E"), vec![mi("M2", "Ea"), mi("M2", "Eb")])]),
        );
        let ea = event_received(&mut model, "C", "Mod2", "Ea", links(vec![(mi("M2", "Ea"), vec![mi("M1", "E")])]));
        let eb = event_received(&mut model, "C", "Mod2", "Eb", links(vec![(mi("M2", "Eb"), vec![mi("M1", "E")])]));

        assert_eq!(EventsLinker::new(&mut model).run().bindings, 2);
        let receivers: Vec<_> = model.events.receivers_of(send).unwrap()["M1:A"]["M2:A"]
            .iter()
            .copied()
            .collect();
        assert_eq!(receivers, vec![ea, eb]);
        for received in [ea, eb] {
            assert!(model.events.senders_of(received).unwrap()["M2:A"]["M1:A"].contains(&send));
        }
    }

    #[test]
    fn one_sided_declaration_is_not_linked() {
        let mut model = model(&[("A", "C")], &[("A", "M1"), ("A", "M2")], &[]);
        event_send(&mut model, "C", "Mod1", "E", links(vec![(mi("M1", "E"), vec![mi("M2", "E")])]));
        event_received(&mut model, "C", "Mod2", "E", links(vec![(mi("M2", "E"), vec![mi("M3", "E")])]));

        assert_eq!(EventsLinker::new(&mut model).run().bindings, 0);
        assert!(model.events.is_empty());
    }

    #[test]
    fn direct_link_stays_inside_implementation() {
        let mut model = model(&[("A", "C"), ("X", "D")], &[("A", "M1"), ("X", "M2")], &[]);
        event_send(&mut model, "C", "Mod1", "E", links(vec![(mi("M1", "E"), vec![mi("M2", "E")])]));
        event_received(&mut model, "D", "Mod2", "E", links(vec![(mi("M2", "E"), vec![mi("M1", "E")])]));

        assert_eq!(EventsLinker::new(&mut model).run().bindings, 0);
    }

    #[test]
    fn service_wiring_across_implementations() {
        let mut model = model(
            &[("A", "C"), ("X", "D"), ("Y", "D")],
            &[("A", "M1"), ("X", "M2"), ("Y", "M2")],
            &[(("A", "out"), ("X", "in")), (("Y", "in"), ("A", "out"))],
        );
        let send = event_send(
            &mut model,
            "C",
            "Mod1",
            "E",
            links(vec![(mi("M1", "E"), vec![Link::new(LinkKind::Reference, "out", "notify")])]),
        );
        event_received(
            &mut model,
            "D",
            "Mod2",
            "E",
            links(vec![(mi("M2", "E"), vec![Link::new(LinkKind::Service, "in", "notify")])]),
        );

        EventsLinker::new(&mut model).run();
        assert_eq!(receiver_keys(&model, send), pairs(&[("M1:A", "M2:X"), ("M1:A", "M2:Y")]));
    }

    #[test]
    fn external_backfilled_from_first_receiver() {
        let mut model = model(&[("A", "C")], &[("A", "M2")], &[]);
        let own = Link::new(LinkKind::External, "", "start").with_language("C++");
        let index = model.externals.insert(
            "C",
            External {
                component_impl: "C".into(),
                name: "start".into(),
                language: Language::Cpp,
                inputs: vec![],
                links: links(vec![(own.clone(), vec![mi("M2", "E")])]),
            },
        );
        event_received(&mut model, "C", "Mod2", "E", links(vec![(mi("M2", "E"), vec![own])]));

        EventsLinker::new(&mut model).run();
        let external = EntityId::new(EntityCategory::External, index);
        assert_eq!(receiver_keys(&model, external), pairs(&[("start:c++", "M2:A")]));
        assert_eq!(model.externals[index].inputs.len(), 1);
        assert_eq!(model.externals[index].inputs[0].name, "speed");
    }

    #[test]
    fn external_to_undeployed_receiver_keeps_inputs() {
        let mut model = model(&[("A", "C")], &[], &[]);
        let own = Link::new(LinkKind::External, "", "start").with_language("C");
        let index = model.externals.insert(
            "C",
            External {
                component_impl: "C".into(),
                name: "start".into(),
                language: Language::C,
                inputs: vec![],
                links: links(vec![(own.clone(), vec![mi("M2", "E")])]),
            },
        );
        event_received(&mut model, "C", "Mod2", "E", links(vec![(mi("M2", "E"), vec![own])]));

        assert_eq!(EventsLinker::new(&mut model).run().bindings, 0);
        assert!(model.externals[index].inputs.is_empty());
    }

    #[test]
    fn trigger_key_is_instance_name() {
        let mut model = model(&[("A", "C")], &[("A", "M2")], &[]);
        let own = Link::new(LinkKind::Trigger, "T1", "");
        let index = model.triggers.insert(
            "C",
            Trigger {
                component_impl: "C".into(),
                name: "T1".into(),
                links: links(vec![(own.clone(), vec![mi("M2", "tick")])]),
            },
        );
        event_received(&mut model, "C", "Mod2", "tick", links(vec![(mi("M2", "tick"), vec![own])]));

        EventsLinker::new(&mut model).run();
        let trigger = EntityId::new(EntityCategory::Trigger, index);
        assert_eq!(receiver_keys(&model, trigger), pairs(&[("T1", "M2:A")]));
    }

    #[test]
    fn dynamic_trigger_ports() {
        let mut model = model(&[("A", "C")], &[("A", "M1"), ("A", "M2")], &[]);
        let send = event_send(&mut model, "C", "Mod1", "arm", links(vec![(mi("M1", "arm"), vec![dt("in")])]));
        let dt_in = dt_received(&mut model, links(vec![(dt("in"), vec![mi("M1", "arm")])]));
        let index = model.dynamic_triggers_send.insert(
            "C",
            DynamicTriggerSend {
                component_impl: "C".into(),
                name: "DT".into(),
                parameters: vec![],
                links: links(vec![(dt("out"), vec![mi("M2", "fire")])]),
            },
        );
        event_received(&mut model, "C", "Mod2", "fire", links(vec![(mi("M2", "fire"), vec![dt("out")])]));

        assert_eq!(EventsLinker::new(&mut model).run().bindings, 2);
        assert!(model.events.receivers_of(send).unwrap()["M1:A"]["DT:in"].contains(&dt_in));
        let dt_out = EntityId::new(EntityCategory::DynamicTriggerSend, index);
        assert_eq!(receiver_keys(&model, dt_out), pairs(&[("DT:out", "M2:A")]));
    }

    #[test]
    fn external_into_dynamic_trigger() {
        let mut model = model(&[("A", "C")], &[], &[]);
        let own = Link::new(LinkKind::External, "", "go").with_language("c");
        let index = model.externals.insert(
            "C",
            External {
                component_impl: "C".into(),
                name: "go".into(),
                language: Language::C,
                inputs: vec![],
                links: links(vec![(own.clone(), vec![dt("in")])]),
            },
        );
        dt_received(&mut model, links(vec![(dt("in"), vec![own])]));

        EventsLinker::new(&mut model).run();
        let external = EntityId::new(EntityCategory::External, index);
        assert_eq!(receiver_keys(&model, external), pairs(&[("go:c", "DT:in")]));
        assert_eq!(model.externals[index].inputs[0].name, "delayDuration");
    }

    #[test]
    fn strategy_table() {
        let events = (SenderRole::EventSend, ReceiverRole::EventReceived);
        assert_eq!(
            strategy(events.0, events.1, LinkKind::Service, LinkKind::Reference),
            Some(Strategy::Wired)
        );
        assert_eq!(
            strategy(events.0, events.1, LinkKind::ModuleInstance, LinkKind::Service),
            None
        );
        assert_eq!(
            strategy(
                SenderRole::Trigger,
                ReceiverRole::DynamicTriggerIn,
                LinkKind::DynamicTrigger,
                LinkKind::Trigger
            ),
            None
        );
    }
}
