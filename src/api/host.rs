//! Host handle given to organs at activation
//!
//! The only surface an organ sees of the rest of the system: publish and
//! subscribe on the bus, advertise capabilities, register and request
//! services. Subscriptions and registrations made through a host are bound
//! to the owning organ, so the kernel can purge them on disable. It carries
//! no lifecycle entry points, which keeps enable/disable non-reentrant by
//! construction.

use std::sync::Arc;

use serde_json::Value;

use crate::api::events::{EventBus, EventHandler};
use crate::api::services::{
    CapabilityDescriptor, ServiceHandler, ServiceRegistry, ServiceResponse,
};
use crate::traits::KernelError;

/// Per-organ view of the kernel's dispatch layer
///
/// Cheap to clone; organs may keep a clone to publish events or request
/// services at any later point while enabled.
#[derive(Clone)]
pub struct OrganHost {
    organ_id: String,
    bus: Arc<EventBus>,
    services: Arc<ServiceRegistry>,
}

impl OrganHost {
    pub(crate) fn new(organ_id: &str, bus: Arc<EventBus>, services: Arc<ServiceRegistry>) -> Self {
        Self {
            organ_id: organ_id.to_string(),
            bus,
            services,
        }
    }

    /// Identifier of the organ this handle is bound to
    pub fn organ_id(&self) -> &str {
        &self.organ_id
    }

    /// Publish an event to every subscriber of `topic`; fire-and-forget
    pub async fn publish(&self, topic: &str, payload: &Value) {
        self.bus.publish(topic, payload).await;
    }

    /// Subscribe to a topic; the subscription is owned by this organ and
    /// purged when the organ is disabled
    pub async fn subscribe(&self, topic: &str, handler: Arc<dyn EventHandler>) {
        self.bus.subscribe(topic, &self.organ_id, handler).await;
    }

    /// Advertise a capability; ownership is stamped with this organ's id
    pub async fn register_capability(
        &self,
        mut descriptor: CapabilityDescriptor,
    ) -> Result<(), KernelError> {
        descriptor.organ_id = self.organ_id.clone();
        self.services.register_capability(descriptor).await
    }

    /// Register a service handler owned by this organ
    pub async fn register_service(
        &self,
        service_id: &str,
        handler: Arc<dyn ServiceHandler>,
    ) -> Result<(), KernelError> {
        self.services
            .register_service(service_id, &self.organ_id, handler)
            .await
    }

    /// Request a service by id; always answers with a result envelope
    pub async fn request_service(&self, service_id: &str, params: Value) -> ServiceResponse {
        self.services.request_service(service_id, params).await
    }

    /// Capability descriptors currently advertised across all organs
    pub async fn capabilities(&self) -> Vec<CapabilityDescriptor> {
        self.services.capabilities().await
    }
}
