//! Linkers - resolve declared endpoints into concrete bindings.
//!
//! Each linker compares every sender-side entity of its kind with every
//! receiver-side entity, through their declared endpoints only:
//!
//! ```text
//! sender.links:   sender_own   -> [.., sender_declared, ..]
//! receiver.links: receiver_own -> [.., receiver_declared, ..]
//!
//! mutual:  sender_declared == receiver_own && receiver_declared == sender_own
//! ```
//!
//! The strategy is picked from the entity roles and the declared endpoint
//! kinds, then turned into concrete keys through the deployment index:
//!
//! | Strategy | Declared kinds | Keys |
//! |----------|----------------|------|
//! | direct | `module_instance` both sides, same implementation | `inst:component` cross product |
//! | wired | `service` / `reference` | assembly wires between both deployed-name sets |
//! | special | external, trigger, dynamic trigger | see [`EventsLinker`] |
//!
//! Linkers never fail: an endpoint without a counterpart produces no binding.

mod common;
mod data;
mod events;
mod requests;

pub use data::DataLinker;
pub use events::EventsLinker;
pub use requests::RequestsLinker;

/// Result of one linker run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LinkOutput {
    /// Bindings added to the link table.
    pub bindings: usize,
}
