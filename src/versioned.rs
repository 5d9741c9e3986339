//! Versioned-data access semantics.
//!
//! A [`VersionedData`] store holds the current value of one data written
//! operation and hands out [`Access`] handles to its readers and writers:
//!
//! | controlled | read / write handle |
//! |---|---|
//! | `true`  | an owned copy, published back explicitly |
//! | `false` | the shared storage itself; every handle aliases it |
//!
//! Every write port starts in "first write" state. Publishing through a port
//! clears that state for the port and for every sibling port declared on the
//! same storage.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::{IndexMap, IndexSet};

use ecoa_core::DataWritten;

/// Errors raised by versioned-data accesses.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionedError {
    #[error("unknown write port '{0}'")]
    UnknownPort(String),
}

/// A read or write handle on versioned data.
#[derive(Debug)]
pub enum Access<T> {
    /// Independent copy, taken when the data is controlled.
    Owned(T),
    /// Alias of the store's storage.
    Shared(Rc<RefCell<T>>),
}

impl<T: Clone> Access<T> {
    pub fn get(&self) -> T {
        match self {
            Access::Owned(value) => value.clone(),
            Access::Shared(storage) => storage.borrow().clone(),
        }
    }

    pub fn set(&mut self, value: T) {
        match self {
            Access::Owned(owned) => *owned = value,
            Access::Shared(storage) => *storage.borrow_mut() = value,
        }
    }

    pub fn modify(&mut self, f: impl FnOnce(&mut T)) {
        match self {
            Access::Owned(owned) => f(owned),
            Access::Shared(storage) => f(&mut *storage.borrow_mut()),
        }
    }

    pub fn is_shared(&self) -> bool {
        matches!(self, Access::Shared(_))
    }

    /// Whether this handle writes straight into `data`'s storage.
    pub fn aliases(&self, data: &VersionedData<T>) -> bool {
        match self {
            Access::Owned(_) => false,
            Access::Shared(storage) => Rc::ptr_eq(storage, &data.storage),
        }
    }
}

/// Current value of one versioned data, with its write ports.
#[derive(Debug)]
pub struct VersionedData<T> {
    storage: Rc<RefCell<T>>,
    controlled: bool,
    version: u64,
    /// Write port -> first write still pending.
    first_write: IndexMap<String, bool>,
    /// Write port -> ports sharing its storage.
    siblings: IndexMap<String, IndexSet<String>>,
}

impl<T: Clone> VersionedData<T> {
    pub fn new(initial: T, controlled: bool) -> Self {
        Self {
            storage: Rc::new(RefCell::new(initial)),
            controlled,
            version: 0,
            first_write: IndexMap::new(),
            siblings: IndexMap::new(),
        }
    }

    /// Declare a write port.
    pub fn with_port(mut self, port: impl Into<String>) -> Self {
        self.first_write.entry(port.into()).or_insert(true);
        self
    }

    /// Declare that `port` and `others` write the same storage.
    pub fn with_siblings<I, S>(mut self, port: &str, others: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self = self.with_port(port);
        for other in others {
            let other = other.into();
            self = self.with_port(other.clone());
            self.siblings
                .entry(port.to_string())
                .or_default()
                .insert(other.clone());
            self.siblings.entry(other).or_default().insert(port.to_string());
        }
        self
    }

    /// Store for the resolved writer key `key` of `writer`.
    ///
    /// The controlled flag is the one data linking recorded for `key`; the
    /// write ports are the writer's operation and its declared siblings.
    pub fn for_writer(initial: T, writer: &DataWritten, key: &str) -> Self {
        let controlled = writer.controlled.get(key).copied().unwrap_or(true);
        let instance = key.split(':').next().unwrap_or_default();
        let siblings = writer
            .siblings
            .iter()
            .filter(|(own, _)| own.instance_name == instance)
            .flat_map(|(_, others)| others.iter().map(|other| other.operation_name.clone()));
        Self::new(initial, controlled).with_siblings(&writer.name, siblings)
    }

    pub fn is_controlled(&self) -> bool {
        self.controlled
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn is_first_write(&self, port: &str) -> Option<bool> {
        self.first_write.get(port).copied()
    }

    /// Current published value.
    pub fn value(&self) -> T {
        self.storage.borrow().clone()
    }

    pub fn read_access(&self) -> Access<T> {
        self.access()
    }

    pub fn write_access(&self) -> Access<T> {
        self.access()
    }

    /// Publish a write made through `port`.
    ///
    /// Returns the new version number.
    pub fn publish(&mut self, port: &str, access: Access<T>) -> Result<u64, VersionedError> {
        if !self.first_write.contains_key(port) {
            return Err(VersionedError::UnknownPort(port.to_string()));
        }
        if let Access::Owned(value) = access {
            *self.storage.borrow_mut() = value;
        }
        self.version += 1;

        self.first_write.insert(port.to_string(), false);
        if let Some(siblings) = self.siblings.get(port) {
            for sibling in siblings {
                self.first_write.insert(sibling.clone(), false);
            }
        }
        Ok(self.version)
    }

    fn access(&self) -> Access<T> {
        if self.controlled {
            Access::Owned(self.storage.borrow().clone())
        } else {
            Access::Shared(Rc::clone(&self.storage))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecoa_core::{Language, Link, LinkKind, LinkMap, ModuleScope, TypeCategory, TypeRef};

    #[test]
    fn controlled_accesses_are_independent() {
        let data = VersionedData::new(1, true).with_port("W");
        let mut write = data.write_access();
        let read = data.read_access();
        write.set(7);
        assert_eq!(read.get(), 1);
        assert_eq!(data.value(), 1);
        assert!(!write.aliases(&data));
    }

    #[test]
    fn uncontrolled_accesses_alias_storage() {
        let data = VersionedData::new(1, false).with_port("W");
        let mut write = data.write_access();
        let read = data.read_access();
        write.modify(|v| *v += 4);
        assert_eq!(read.get(), 5);
        assert!(write.aliases(&data) && read.is_shared());
    }

    #[test]
    fn publish_clears_first_write_of_siblings() {
        let mut data = VersionedData::new(String::new(), true)
            .with_siblings("W1", ["W2"])
            .with_port("W3");
        let mut write = data.write_access();
        write.set("x".to_string());

        assert_eq!(data.publish("W1", write), Ok(1));
        assert_eq!(data.value(), "x");
        assert_eq!(data.is_first_write("W1"), Some(false));
        assert_eq!(data.is_first_write("W2"), Some(false));
        assert_eq!(data.is_first_write("W3"), Some(true));
    }

    #[test]
    fn publish_through_unknown_port() {
        let mut data = VersionedData::new(0, false);
        let access = data.write_access();
        assert_eq!(
            data.publish("W", access),
            Err(VersionedError::UnknownPort("W".into()))
        );
        assert_eq!(data.version(), 0);
    }

    #[test]
    fn writer_store_follows_linked_flags() {
        let own = Link::new(LinkKind::ModuleInstance, "M1", "W1");
        let sibling = Link::new(LinkKind::ModuleInstance, "M1", "W2");
        let writer = DataWritten {
            scope: ModuleScope {
                component_impl: "C".into(),
                module_type: "M_t".into(),
                module_impl: "M".into(),
                language: Language::C,
            },
            name: "W1".into(),
            type_ref: TypeRef::standard("int32"),
            category: TypeCategory::Simple,
            max_versions: None,
            write_only: false,
            links: LinkMap::new(),
            siblings: [(own, vec![sibling])].into_iter().collect(),
            controlled: [("M1:Comp:W1".to_string(), false)].into_iter().collect(),
        };

        let mut data = VersionedData::for_writer(0, &writer, "M1:Comp:W1");
        assert!(!data.is_controlled());
        let access = data.write_access();
        data.publish("W1", access).unwrap();
        assert_eq!(data.is_first_write("W2"), Some(false));

        let other = VersionedData::for_writer(0, &writer, "M9:Comp:W1");
        assert!(other.is_controlled());
        assert_eq!(other.is_first_write("W2"), None);
    }
}
