//! Capability and service registry
//!
//! Capabilities are declarative advertisements for discovery; services are
//! callable point-to-point request/response handlers, exactly one handler
//! per service id. Both obey the same ownership-scoped cleanup contract as
//! the event bus.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex as TokioMutex;
use tracing::{debug, warn};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::traits::KernelError;

/// Discoverable description of something an organ can do; pure data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityDescriptor {
    /// Unique capability identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// Free-form grouping category
    pub category: String,
    /// Organ that advertised this capability
    pub organ_id: String,
    /// Arbitrary extra metadata
    #[serde(default)]
    pub metadata: Value,
}

/// Result envelope returned by every service call
///
/// Callers must branch on `success` rather than assume `data` is present;
/// this is the only cross-organ call path that returns a result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ServiceResponse {
    /// Successful response carrying the handler's result
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Failure envelope; never thrown to the caller
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

/// Handler answering requests for one service id
#[async_trait]
pub trait ServiceHandler: Send + Sync {
    async fn call(&self, params: Value) -> anyhow::Result<Value>;
}

/// Wrap an async closure as a [`ServiceHandler`]
pub fn service_fn<F, Fut>(f: F) -> Arc<dyn ServiceHandler>
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
{
    struct FnService<F>(F);

    #[async_trait]
    impl<F, Fut> ServiceHandler for FnService<F>
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        async fn call(&self, params: Value) -> anyhow::Result<Value> {
            (self.0)(params).await
        }
    }

    Arc::new(FnService(f))
}

struct ServiceEntry {
    owner: String,
    handler: Arc<dyn ServiceHandler>,
}

/// Registry of capability descriptors and callable services
pub struct ServiceRegistry {
    capabilities: TokioMutex<HashMap<String, CapabilityDescriptor>>,
    services: TokioMutex<HashMap<String, ServiceEntry>>,
}

impl ServiceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            capabilities: TokioMutex::new(HashMap::new()),
            services: TokioMutex::new(HashMap::new()),
        }
    }

    /// Store a capability descriptor for discovery
    ///
    /// Never affects runtime behavior. Duplicate ids are rejected.
    pub async fn register_capability(
        &self,
        descriptor: CapabilityDescriptor,
    ) -> Result<(), KernelError> {
        let mut capabilities = self.capabilities.lock().await;
        if capabilities.contains_key(&descriptor.id) {
            return Err(KernelError::DuplicateCapability(descriptor.id));
        }
        debug!(
            "organ {} advertising capability {}",
            descriptor.organ_id, descriptor.id
        );
        capabilities.insert(descriptor.id.clone(), descriptor);
        Ok(())
    }

    /// Register a callable service under a unique id
    ///
    /// Duplicate registration is an error: one organ must not silently
    /// shadow another's identically-named service.
    pub async fn register_service(
        &self,
        service_id: &str,
        owner: &str,
        handler: Arc<dyn ServiceHandler>,
    ) -> Result<(), KernelError> {
        let mut services = self.services.lock().await;
        if services.contains_key(service_id) {
            return Err(KernelError::DuplicateService(service_id.to_string()));
        }
        debug!("organ {} registering service {}", owner, service_id);
        services.insert(
            service_id.to_string(),
            ServiceEntry {
                owner: owner.to_string(),
                handler,
            },
        );
        Ok(())
    }

    /// Invoke the service registered under `service_id`
    ///
    /// Never returns an error to the caller: an unknown id or a failing
    /// handler is converted into a failure envelope.
    pub async fn request_service(&self, service_id: &str, params: Value) -> ServiceResponse {
        // Clone the handler out and drop the lock before calling, so a
        // handler can itself request services.
        let handler = {
            let services = self.services.lock().await;
            services
                .get(service_id)
                .map(|entry| (entry.owner.clone(), Arc::clone(&entry.handler)))
        };

        match handler {
            None => ServiceResponse::failure(format!("service not found: {}", service_id)),
            Some((owner, handler)) => match handler.call(params).await {
                Ok(data) => ServiceResponse::ok(data),
                Err(e) => {
                    warn!(
                        "service {} of organ {} failed: {}",
                        service_id, owner, e
                    );
                    ServiceResponse::failure(e.to_string())
                }
            },
        }
    }

    /// Remove every capability and service owned by an organ
    pub async fn unregister_all(&self, owner: &str) {
        debug!("purging capabilities and services of organ {}", owner);
        let mut capabilities = self.capabilities.lock().await;
        capabilities.retain(|_, descriptor| descriptor.organ_id != owner);
        drop(capabilities);

        let mut services = self.services.lock().await;
        services.retain(|_, entry| entry.owner != owner);
    }

    /// Snapshot of all advertised capabilities (introspection)
    pub async fn capabilities(&self) -> Vec<CapabilityDescriptor> {
        let capabilities = self.capabilities.lock().await;
        capabilities.values().cloned().collect()
    }

    /// True if a service is currently registered under `service_id`
    pub async fn has_service(&self, service_id: &str) -> bool {
        let services = self.services.lock().await;
        services.contains_key(service_id)
    }
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
