//! Visitor contract for consumers of the resolved model.
//!
//! Code generators implement [`Visitor`] and override the `visit_*` methods
//! of the categories they emit. Every entity implements [`Accept`], which
//! dispatches to the matching method together with a [`Visit`] handle used
//! to reach the entity's resolved bindings.
//!
//! # Example
//!
//! ```
//! use ecoa_core::EventSend;
//! use ecoa_linker::Model;
//! use ecoa_linker::visit::{Visit, Visitor, walk_model};
//! use ecoa_registry::binding_count;
//!
//! #[derive(Default)]
//! struct Fanout {
//!     bindings: usize,
//! }
//!
//! impl Visitor for Fanout {
//!     fn visit_event_send(&mut self, _event: &EventSend, at: Visit<'_>) {
//!         self.bindings += at.receivers().map_or(0, binding_count);
//!     }
//! }
//!
//! let model = Model::new(Default::default(), Default::default());
//! let mut fanout = Fanout::default();
//! walk_model(&mut fanout, &model);
//! assert_eq!(fanout.bindings, 0);
//! ```
//!
//! [`walk_model`] visits in a fixed order: libraries, module services, then
//! each entity category in declaration order.

use ecoa_core::{
    DataRead, DataWritten, DynamicTriggerReceived, DynamicTriggerSend, EntityCategory, EntityId,
    EventReceived, EventSend, External, Log, Pinfo, Property, RequestReceived, RequestSend, Time,
    Trigger, TypeDecl,
};
use ecoa_registry::Bindings;

use crate::model::{EntityStore, Model};

/// Position of a visited entity in the model.
#[derive(Debug, Clone, Copy)]
pub struct Visit<'m> {
    pub model: &'m Model,
    pub id: EntityId,
}

impl<'m> Visit<'m> {
    /// Resolved receivers (events, requests) grouped by sender key.
    pub fn receivers(&self) -> Option<&'m Bindings<EntityId>> {
        self.model.receivers_of(self.id)
    }

    /// Resolved senders (events, requests) grouped by receiver key.
    pub fn senders(&self) -> Option<&'m Bindings<EntityId>> {
        self.model.senders_of(self.id)
    }

    /// Readers of a data writer, grouped by writer key.
    pub fn readers(&self) -> Option<&'m Bindings<EntityId>> {
        self.model.readers_of(self.id)
    }

    /// Writers of a data reader, grouped by reader key.
    pub fn writers(&self) -> Option<&'m Bindings<EntityId>> {
        self.model.writers_of(self.id)
    }
}

/// Per-category visitor over the resolved model.
///
/// All entity methods default to doing nothing; `visit_model` and
/// `visit_library` walk their children.
pub trait Visitor: Sized {
    fn visit_model(&mut self, model: &Model) {
        walk_model(self, model);
    }

    /// Visit the sorted declarations of one library.
    fn visit_library(&mut self, namespace: &str, types: &[TypeDecl]) {
        walk_library(self, namespace, types);
    }

    fn visit_type_decl(&mut self, _namespace: &str, _decl: &TypeDecl) {}

    /// Visit the libraries used by a component implementation.
    fn visit_uses(&mut self, _component_impl: &str, _libraries: &[String]) {}

    fn visit_log(&mut self, _log: &Log) {}

    fn visit_time(&mut self, _time: &Time) {}

    fn visit_event_send(&mut self, _event: &EventSend, _at: Visit<'_>) {}

    fn visit_event_received(&mut self, _event: &EventReceived, _at: Visit<'_>) {}

    fn visit_request_send(&mut self, _request: &RequestSend, _at: Visit<'_>) {}

    fn visit_request_received(&mut self, _request: &RequestReceived, _at: Visit<'_>) {}

    fn visit_data_read(&mut self, _data: &DataRead, _at: Visit<'_>) {}

    fn visit_data_written(&mut self, _data: &DataWritten, _at: Visit<'_>) {}

    fn visit_property(&mut self, _property: &Property, _at: Visit<'_>) {}

    fn visit_pinfo(&mut self, _pinfo: &Pinfo, _at: Visit<'_>) {}

    fn visit_external(&mut self, _external: &External, _at: Visit<'_>) {}

    fn visit_trigger(&mut self, _trigger: &Trigger, _at: Visit<'_>) {}

    fn visit_dynamic_trigger_send(&mut self, _trigger: &DynamicTriggerSend, _at: Visit<'_>) {}

    fn visit_dynamic_trigger_received(
        &mut self,
        _trigger: &DynamicTriggerReceived,
        _at: Visit<'_>,
    ) {
    }
}

/// Double dispatch from an entity to its `visit_*` method.
pub trait Accept {
    const CATEGORY: EntityCategory;

    fn accept<V: Visitor>(&self, visitor: &mut V, at: Visit<'_>);
}

macro_rules! accept {
    ($($ty:ty => $category:ident, $method:ident;)*) => {
        $(
            impl Accept for $ty {
                const CATEGORY: EntityCategory = EntityCategory::$category;

                fn accept<V: Visitor>(&self, visitor: &mut V, at: Visit<'_>) {
                    visitor.$method(self, at);
                }
            }
        )*
    };
}

accept! {
    EventSend => EventSend, visit_event_send;
    EventReceived => EventReceived, visit_event_received;
    RequestSend => RequestSend, visit_request_send;
    RequestReceived => RequestReceived, visit_request_received;
    DataRead => DataRead, visit_data_read;
    DataWritten => DataWritten, visit_data_written;
    Property => Property, visit_property;
    Pinfo => Pinfo, visit_pinfo;
    External => External, visit_external;
    Trigger => Trigger, visit_trigger;
    DynamicTriggerSend => DynamicTriggerSend, visit_dynamic_trigger_send;
    DynamicTriggerReceived => DynamicTriggerReceived, visit_dynamic_trigger_received;
}

pub fn walk_model<V: Visitor>(visitor: &mut V, model: &Model) {
    for (namespace, types) in &model.sorted_types {
        visitor.visit_library(namespace, types);
    }
    for (component_impl, libraries) in &model.uses {
        visitor.visit_uses(component_impl, libraries);
    }
    for log in model.logs.values() {
        visitor.visit_log(log);
    }
    for time in model.times.values() {
        visitor.visit_time(time);
    }
    walk_store(visitor, model, &model.events_send);
    walk_store(visitor, model, &model.events_received);
    walk_store(visitor, model, &model.requests_send);
    walk_store(visitor, model, &model.requests_received);
    walk_store(visitor, model, &model.data_read);
    walk_store(visitor, model, &model.data_written);
    walk_store(visitor, model, &model.properties);
    walk_store(visitor, model, &model.pinfos);
    walk_store(visitor, model, &model.externals);
    walk_store(visitor, model, &model.triggers);
    walk_store(visitor, model, &model.dynamic_triggers_send);
    walk_store(visitor, model, &model.dynamic_triggers_received);
}

pub fn walk_library<V: Visitor>(visitor: &mut V, namespace: &str, types: &[TypeDecl]) {
    for decl in types {
        visitor.visit_type_decl(namespace, decl);
    }
}

/// Visit every entity of one category, in insertion order.
pub fn walk_store<V: Visitor, T: Accept>(visitor: &mut V, model: &Model, store: &EntityStore<T>) {
    for (index, entity) in store.iter() {
        let at = Visit {
            model,
            id: EntityId::new(T::CATEGORY, index),
        };
        entity.accept(visitor, at);
    }
}
