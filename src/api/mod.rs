//! Cross-organ dispatch layer
//!
//! Two decoupling primitives with different cardinality and failure
//! semantics: the event bus (fire-and-forget fan-out) and the
//! capability/service registry (point-to-point request/response).

pub mod events;
pub mod host;
pub mod services;

pub use events::{EventBus, EventHandler};
pub use host::OrganHost;
pub use services::{CapabilityDescriptor, ServiceHandler, ServiceRegistry, ServiceResponse};
