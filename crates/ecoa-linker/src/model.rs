//! The resolved model.
//!
//! Entities are stored per category in [`EntityStore`]s grouped by
//! `component_impl:module_impl` (or by `component_impl` for externals,
//! triggers and dynamic triggers). Resolved bindings live in three
//! [`LinkTable`]s keyed by [`EntityId`]:
//!
//! - `events`: event sends, externals, triggers and dynamic triggers -> receivers
//! - `requests`: request sends -> request receivers
//! - `data`: data writers -> data readers
//!
//! The model is mutated only by the builder passes; once built it is
//! handed out read-only.

use std::ops::Index;

use indexmap::IndexMap;
use xxhash_rust::xxh64::Xxh64;

use ecoa_core::{
    DataRead, DataWritten, DynamicTriggerReceived, DynamicTriggerSend, EntityCategory, EntityId,
    EventReceived, EventSend, External, Log, Pinfo, Property, RequestReceived, RequestSend, Time,
    Trigger, TypeDecl,
};
use ecoa_registry::{Bindings, DeploymentIndex, LinkTable, TypeRegistry};

/// Entities of one category, grouped by collection key.
#[derive(Debug, Clone)]
pub struct EntityStore<T> {
    items: Vec<T>,
    groups: IndexMap<String, Vec<u32>>,
}

impl<T> Default for EntityStore<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            groups: IndexMap::new(),
        }
    }
}

impl<T> EntityStore<T> {
    /// Add an entity under `group`, returning its index.
    pub fn insert(&mut self, group: impl Into<String>, item: T) -> u32 {
        let index = self.items.len() as u32;
        self.items.push(item);
        self.groups.entry(group.into()).or_default().push(index);
        index
    }

    pub fn get(&self, index: u32) -> Option<&T> {
        self.items.get(index as usize)
    }

    pub fn get_mut(&mut self, index: u32) -> Option<&mut T> {
        self.items.get_mut(index as usize)
    }

    /// All entities with their indices, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &T)> {
        self.items.iter().enumerate().map(|(i, item)| (i as u32, item))
    }

    /// Entities of one group.
    pub fn group(&self, key: &str) -> impl Iterator<Item = (u32, &T)> {
        self.groups
            .get(key)
            .into_iter()
            .flatten()
            .map(|&i| (i, &self.items[i as usize]))
    }

    /// Group keys with their entity indices, in insertion order.
    pub fn groups(&self) -> impl Iterator<Item = (&str, &[u32])> {
        self.groups.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Index<u32> for EntityStore<T> {
    type Output = T;

    fn index(&self, index: u32) -> &T {
        &self.items[index as usize]
    }
}

/// Borrowed view of any entity, for code that dispatches on category.
#[derive(Debug, Clone, Copy)]
pub enum EntityRef<'m> {
    EventSend(&'m EventSend),
    EventReceived(&'m EventReceived),
    RequestSend(&'m RequestSend),
    RequestReceived(&'m RequestReceived),
    DataRead(&'m DataRead),
    DataWritten(&'m DataWritten),
    Property(&'m Property),
    Pinfo(&'m Pinfo),
    External(&'m External),
    Trigger(&'m Trigger),
    DynamicTriggerSend(&'m DynamicTriggerSend),
    DynamicTriggerReceived(&'m DynamicTriggerReceived),
}

impl<'m> EntityRef<'m> {
    /// Operation (or instance) name of the entity.
    pub fn name(&self) -> &'m str {
        match *self {
            EntityRef::EventSend(e) => &e.name,
            EntityRef::EventReceived(e) => &e.name,
            EntityRef::RequestSend(e) => &e.name,
            EntityRef::RequestReceived(e) => &e.name,
            EntityRef::DataRead(e) => &e.name,
            EntityRef::DataWritten(e) => &e.name,
            EntityRef::Property(e) => &e.name,
            EntityRef::Pinfo(e) => &e.name,
            EntityRef::External(e) => &e.name,
            EntityRef::Trigger(e) => &e.name,
            EntityRef::DynamicTriggerSend(e) => &e.name,
            EntityRef::DynamicTriggerReceived(e) => &e.name,
        }
    }

    pub fn component_impl(&self) -> &'m str {
        match *self {
            EntityRef::EventSend(e) => &e.scope.component_impl,
            EntityRef::EventReceived(e) => &e.scope.component_impl,
            EntityRef::RequestSend(e) => &e.scope.component_impl,
            EntityRef::RequestReceived(e) => &e.scope.component_impl,
            EntityRef::DataRead(e) => &e.scope.component_impl,
            EntityRef::DataWritten(e) => &e.scope.component_impl,
            EntityRef::Property(e) => &e.scope.component_impl,
            EntityRef::Pinfo(e) => &e.scope.component_impl,
            EntityRef::External(e) => &e.component_impl,
            EntityRef::Trigger(e) => &e.component_impl,
            EntityRef::DynamicTriggerSend(e) => &e.component_impl,
            EntityRef::DynamicTriggerReceived(e) => &e.component_impl,
        }
    }
}

/// The resolved, cross-referenced model.
#[derive(Debug)]
pub struct Model {
    pub registry: TypeRegistry,
    pub deployment: DeploymentIndex,
    /// Library namespace -> declarations in emission order.
    pub sorted_types: IndexMap<String, Vec<TypeDecl>>,
    /// Component implementation -> used libraries.
    pub uses: IndexMap<String, Vec<String>>,
    pub logs: IndexMap<String, Log>,
    pub times: IndexMap<String, Time>,

    pub events_send: EntityStore<EventSend>,
    pub events_received: EntityStore<EventReceived>,
    pub requests_send: EntityStore<RequestSend>,
    pub requests_received: EntityStore<RequestReceived>,
    pub data_read: EntityStore<DataRead>,
    pub data_written: EntityStore<DataWritten>,
    pub properties: EntityStore<Property>,
    pub pinfos: EntityStore<Pinfo>,
    pub externals: EntityStore<External>,
    pub triggers: EntityStore<Trigger>,
    pub dynamic_triggers_send: EntityStore<DynamicTriggerSend>,
    pub dynamic_triggers_received: EntityStore<DynamicTriggerReceived>,

    /// Event-style bindings (sender -> receivers).
    pub events: LinkTable<EntityId>,
    /// Request bindings (client -> server).
    pub requests: LinkTable<EntityId>,
    /// Versioned-data bindings (writer -> readers).
    pub data: LinkTable<EntityId>,
}

impl Model {
    /// Empty model over a registry and a deployment index.
    pub fn new(registry: TypeRegistry, deployment: DeploymentIndex) -> Self {
        Self {
            registry,
            deployment,
            sorted_types: IndexMap::new(),
            uses: IndexMap::new(),
            logs: IndexMap::new(),
            times: IndexMap::new(),
            events_send: EntityStore::default(),
            events_received: EntityStore::default(),
            requests_send: EntityStore::default(),
            requests_received: EntityStore::default(),
            data_read: EntityStore::default(),
            data_written: EntityStore::default(),
            properties: EntityStore::default(),
            pinfos: EntityStore::default(),
            externals: EntityStore::default(),
            triggers: EntityStore::default(),
            dynamic_triggers_send: EntityStore::default(),
            dynamic_triggers_received: EntityStore::default(),
            events: LinkTable::new(),
            requests: LinkTable::new(),
            data: LinkTable::new(),
        }
    }

    /// Look up any entity by id.
    pub fn entity(&self, id: EntityId) -> Option<EntityRef<'_>> {
        let i = id.index;
        Some(match id.category {
            EntityCategory::EventSend => EntityRef::EventSend(self.events_send.get(i)?),
            EntityCategory::EventReceived => EntityRef::EventReceived(self.events_received.get(i)?),
            EntityCategory::RequestSend => EntityRef::RequestSend(self.requests_send.get(i)?),
            EntityCategory::RequestReceived => {
                EntityRef::RequestReceived(self.requests_received.get(i)?)
            }
            EntityCategory::DataRead => EntityRef::DataRead(self.data_read.get(i)?),
            EntityCategory::DataWritten => EntityRef::DataWritten(self.data_written.get(i)?),
            EntityCategory::Property => EntityRef::Property(self.properties.get(i)?),
            EntityCategory::Pinfo => EntityRef::Pinfo(self.pinfos.get(i)?),
            EntityCategory::External => EntityRef::External(self.externals.get(i)?),
            EntityCategory::Trigger => EntityRef::Trigger(self.triggers.get(i)?),
            EntityCategory::DynamicTriggerSend => {
                EntityRef::DynamicTriggerSend(self.dynamic_triggers_send.get(i)?)
            }
            EntityCategory::DynamicTriggerReceived => {
                EntityRef::DynamicTriggerReceived(self.dynamic_triggers_received.get(i)?)
            }
        })
    }

    /// Resolved event receivers of a sender (event send, external, trigger
    /// or dynamic trigger send), grouped by sender key.
    pub fn receivers_of(&self, sender: EntityId) -> Option<&Bindings<EntityId>> {
        match sender.category {
            EntityCategory::RequestSend => self.requests.receivers_of(sender),
            _ => self.events.receivers_of(sender),
        }
    }

    /// Resolved senders of an event or request receiver, grouped by receiver key.
    pub fn senders_of(&self, receiver: EntityId) -> Option<&Bindings<EntityId>> {
        match receiver.category {
            EntityCategory::RequestReceived => self.requests.senders_of(receiver),
            _ => self.events.senders_of(receiver),
        }
    }

    /// Readers of a data writer, grouped by writer key.
    pub fn readers_of(&self, writer: EntityId) -> Option<&Bindings<EntityId>> {
        self.data.receivers_of(writer)
    }

    /// Writers of a data reader, grouped by reader key.
    pub fn writers_of(&self, reader: EntityId) -> Option<&Bindings<EntityId>> {
        self.data.senders_of(reader)
    }

    /// Number of resolved bindings across all link tables.
    pub fn binding_count(&self) -> usize {
        self.events.len() + self.requests.len() + self.data.len()
    }

    /// Stable digest of the resolved bindings and type order.
    ///
    /// Two builds of the same input produce the same fingerprint.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = Xxh64::new(0);
        for (library, decls) in &self.sorted_types {
            hasher.update(library.as_bytes());
            for decl in decls {
                hasher.update(decl.name().as_bytes());
            }
        }
        for (table, tag) in [(&self.events, b'e'), (&self.requests, b'r'), (&self.data, b'd')] {
            hasher.update(&[tag]);
            for (sender, sender_key, receiver_key, receiver) in table.iter() {
                for id in [sender, receiver] {
                    let name = self.entity(id).map(|e| e.name()).unwrap_or_default();
                    hasher.update(name.as_bytes());
                    hasher.update(&[id.category as u8]);
                }
                hasher.update(sender_key.as_bytes());
                hasher.update(receiver_key.as_bytes());
            }
        }
        hasher.digest()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_groups_keep_order() {
        let mut store = EntityStore::default();
        assert_eq!(store.insert("C:M1", "a"), 0);
        assert_eq!(store.insert("C:M2", "b"), 1);
        assert_eq!(store.insert("C:M1", "c"), 2);
        let g: Vec<_> = store.group("C:M1").map(|(_, v)| *v).collect();
        assert_eq!(g, vec!["a", "c"]);
        assert_eq!(store.group("missing").count(), 0);
        assert_eq!(store[1], "b");
        assert_eq!(store.groups().count(), 2);
    }

    #[test]
    fn empty_model_fingerprint_is_stable() {
        let a = Model::new(TypeRegistry::new(), DeploymentIndex::default());
        let b = Model::new(TypeRegistry::new(), DeploymentIndex::default());
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.binding_count(), 0);
        assert!(a.entity(EntityId::new(EntityCategory::Trigger, 0)).is_none());
    }
}
