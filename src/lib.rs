//! Organ Kernel - plugin microkernel for host applications
//!
//! Manages independently-developed feature modules ("organs") inside one
//! host process: lifecycle state machine, dependency/conflict resolution
//! before activation, and two decoupling mechanisms so organs cooperate
//! without importing each other's implementations:
//!
//! - a topic-based **event bus** (fire-and-forget, many-to-many fan-out)
//! - a **capability/service registry** (point-to-point request/response)
//!
//! ## Design principles
//!
//! 1. **Failure isolation**: one organ's misbehaving handler never prevents
//!    another organ from receiving events or answering services.
//! 2. **Ownership-scoped teardown**: disabling an organ purges its
//!    subscriptions, capabilities, and services en masse.
//! 3. **String-keyed discovery**: organs know each other only by identifier
//!    and declared capability/service ids, never by type.
//! 4. **Single thread of control**: hooks and handlers never run
//!    concurrently with kernel state mutation.
//!
//! The kernel performs no file or network I/O; persistence of the
//! configuration snapshot and all UI surfaces belong to the host.

pub mod api;
pub mod config;
pub mod kernel;
pub mod registry;
pub mod traits;

pub use api::events::{handler_fn, EventBus, EventHandler};
pub use api::host::OrganHost;
pub use api::services::{
    service_fn, CapabilityDescriptor, ServiceHandler, ServiceRegistry, ServiceResponse,
};
pub use config::KernelConfig;
pub use kernel::Kernel;
pub use registry::{DependencyCheck, DependencyResolver, OrganRegistry};
pub use traits::{DependencyDeclaration, KernelError, Organ, OrganContext, OrganState};
