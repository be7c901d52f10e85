//! Kernel orchestrating the organ lifecycle
//!
//! Composes the registry, dependency resolver, event bus, and service
//! registry; it is the only component organs interact with. Lifecycle
//! operations take `&mut self` and organ hooks only receive
//! [`OrganContext`] / [`OrganHost`], so a hook cannot re-enter
//! enable/disable for its own organ.

use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::api::events::EventBus;
use crate::api::host::OrganHost;
use crate::api::services::ServiceRegistry;
use crate::config::KernelConfig;
use crate::registry::{DependencyCheck, DependencyResolver, OrganRegistry};
use crate::traits::{KernelError, Organ, OrganContext, OrganState};

/// Plugin microkernel
pub struct Kernel {
    registry: OrganRegistry,
    bus: Arc<EventBus>,
    services: Arc<ServiceRegistry>,
    config: KernelConfig,
}

impl Kernel {
    /// Create a kernel with an empty configuration snapshot
    pub fn new() -> Self {
        Self::with_config(KernelConfig::new())
    }

    /// Create a kernel seeded with a configuration snapshot from the host
    pub fn with_config(config: KernelConfig) -> Self {
        Self {
            registry: OrganRegistry::new(),
            bus: Arc::new(EventBus::new()),
            services: Arc::new(ServiceRegistry::new()),
            config,
        }
    }

    /// Register an organ; does not invoke any hook
    pub fn register_organ(&mut self, organ: Box<dyn Organ>) -> Result<(), KernelError> {
        let id = organ.id().to_string();
        self.registry.register(organ)?;
        debug!("organ {} registered", id);
        Ok(())
    }

    /// Run one organ's load hook (`Registered → Loaded`)
    ///
    /// Loading never depends on other organs. No-op if the organ already
    /// left `Registered`.
    pub async fn load(&mut self, id: &str) -> Result<(), KernelError> {
        let state = self
            .registry
            .state(id)
            .ok_or_else(|| KernelError::OrganNotFound(id.to_string()))?;
        if state != OrganState::Registered {
            debug!("organ {} already loaded, skipping", id);
            return Ok(());
        }

        let context = OrganContext::new(id.to_string(), self.config.settings_for(id));
        let result = {
            let slot = self
                .registry
                .slot_mut(id)
                .ok_or_else(|| KernelError::OrganNotFound(id.to_string()))?;
            slot.organ.load(&context).await
        };
        match result {
            Ok(()) => {
                if let Some(slot) = self.registry.slot_mut(id) {
                    slot.state = OrganState::Loaded;
                }
                debug!("organ {} loaded", id);
                Ok(())
            }
            Err(e) => Err(KernelError::HookError(format!(
                "load failed for organ {}: {}",
                id, e
            ))),
        }
    }

    /// Run the load hook of every registered organ, in registration order
    ///
    /// A failing load is logged and leaves that organ un-enableable;
    /// startup always continues.
    pub async fn load_all(&mut self) {
        let ids: Vec<String> = self.registry.ids().to_vec();
        for id in ids {
            if let Err(e) = self.load(&id).await {
                error!("{}", e);
            }
        }
        info!("kernel loaded {} organ(s)", self.registry.len());
    }

    /// Enable an organ
    ///
    /// No-op if already enabled. Runs the dependency resolver first; a
    /// blocking verdict fails without any state change. The activation hook
    /// runs before the transition is committed; if it fails, registrations
    /// it made are purged and the organ stays in its previous state.
    pub async fn enable(&mut self, id: &str) -> Result<(), KernelError> {
        let state = self
            .registry
            .state(id)
            .ok_or_else(|| KernelError::OrganNotFound(id.to_string()))?;

        match state {
            OrganState::Enabled => {
                debug!("organ {} already enabled", id);
                return Ok(());
            }
            OrganState::Registered => {
                return Err(KernelError::LifecycleError(format!(
                    "organ {} has not been loaded",
                    id
                )));
            }
            OrganState::Unloaded => {
                return Err(KernelError::LifecycleError(format!(
                    "organ {} has been unloaded",
                    id
                )));
            }
            OrganState::Loaded | OrganState::Disabled => {}
        }

        let check = self.dependency_check(id)?;
        if !check.can_enable {
            return Err(KernelError::DependencyUnsatisfied(format!(
                "cannot enable organ {}: {}",
                id,
                check.blocking_summary()
            )));
        }
        for warning in &check.warnings {
            warn!("organ {}: {}", id, warning);
        }

        let host = OrganHost::new(id, Arc::clone(&self.bus), Arc::clone(&self.services));
        let activation = {
            let slot = self
                .registry
                .slot_mut(id)
                .ok_or_else(|| KernelError::OrganNotFound(id.to_string()))?;
            slot.organ.activate(&host).await
        };

        if let Err(e) = activation {
            // The hook may have registered handlers before failing; purge
            // them so a failed enable leaves nothing dangling.
            self.bus.unsubscribe_all(id).await;
            self.services.unregister_all(id).await;
            return Err(KernelError::HookError(format!(
                "activate failed for organ {}: {}",
                id, e
            )));
        }

        if let Some(slot) = self.registry.slot_mut(id) {
            slot.state = OrganState::Enabled;
        }
        self.config.set_organ_enabled(id, true);
        info!("organ {} enabled", id);
        Ok(())
    }

    /// Disable an organ
    ///
    /// No-op if not currently enabled. The deactivation hook runs first; a
    /// failure there is logged but never skips the purge of the organ's
    /// subscriptions and services, nor the state transition.
    pub async fn disable(&mut self, id: &str) -> Result<(), KernelError> {
        let state = self
            .registry
            .state(id)
            .ok_or_else(|| KernelError::OrganNotFound(id.to_string()))?;

        match state {
            OrganState::Registered => {
                return Err(KernelError::OrganNotFound(format!(
                    "{} (never loaded)",
                    id
                )));
            }
            OrganState::Disabled | OrganState::Loaded | OrganState::Unloaded => {
                debug!("organ {} not enabled, disable is a no-op", id);
                return Ok(());
            }
            OrganState::Enabled => {}
        }

        let deactivation = {
            let slot = self
                .registry
                .slot_mut(id)
                .ok_or_else(|| KernelError::OrganNotFound(id.to_string()))?;
            slot.organ.deactivate().await
        };
        if let Err(e) = deactivation {
            warn!("deactivate hook failed for organ {}: {}", id, e);
        }

        // Cleanup is unconditional, even after a failed hook.
        self.bus.unsubscribe_all(id).await;
        self.services.unregister_all(id).await;

        if let Some(slot) = self.registry.slot_mut(id) {
            slot.state = OrganState::Disabled;
        }
        self.config.set_organ_enabled(id, false);
        info!("organ {} disabled", id);
        Ok(())
    }

    /// Whether an organ is currently enabled
    pub fn is_enabled(&self, id: &str) -> bool {
        self.registry.state(id) == Some(OrganState::Enabled)
    }

    /// Current lifecycle state of an organ
    pub fn state(&self, id: &str) -> Option<OrganState> {
        self.registry.state(id)
    }

    /// Recompute the dependency verdict for an organ (introspection)
    pub fn dependency_check(&self, id: &str) -> Result<DependencyCheck, KernelError> {
        let organ = self
            .registry
            .get(id)
            .ok_or_else(|| KernelError::OrganNotFound(id.to_string()))?;
        let declaration = organ.dependencies();
        Ok(DependencyResolver::check(&declaration, |dep| {
            self.is_enabled(dep)
        }))
    }

    /// Kernel-wide teardown; terminal
    ///
    /// Disables any still-enabled organ (reverse registration order), then
    /// runs every loaded organ's unload hook. Hook failures are logged.
    pub async fn unload_all(&mut self) {
        info!("kernel shutting down");

        let ids: Vec<String> = self.registry.ids().iter().rev().cloned().collect();

        for id in &ids {
            if self.is_enabled(id) {
                if let Err(e) = self.disable(id).await {
                    warn!("error disabling organ {} during teardown: {}", id, e);
                }
            }
        }

        for id in &ids {
            let state = match self.registry.state(id) {
                Some(state) => state,
                None => continue,
            };
            if matches!(state, OrganState::Loaded | OrganState::Disabled) {
                let result = match self.registry.slot_mut(id) {
                    Some(slot) => slot.organ.unload().await,
                    None => continue,
                };
                if let Err(e) = result {
                    warn!("unload hook failed for organ {}: {}", id, e);
                }
            }
            if let Some(slot) = self.registry.slot_mut(id) {
                slot.state = OrganState::Unloaded;
            }
        }

        info!("kernel shut down");
    }

    /// Current configuration snapshot
    pub fn settings(&self) -> &KernelConfig {
        &self.config
    }

    /// Merge a partial configuration update into the snapshot
    ///
    /// Atomic from the caller's point of view: the patch merges into the
    /// existing snapshot, it never replaces it.
    pub fn update_settings(&mut self, patch: KernelConfig) {
        self.config.merge(patch);
    }

    /// Organ registry (read-only)
    pub fn registry(&self) -> &OrganRegistry {
        &self.registry
    }

    /// Event bus handle, for host-side publishing
    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    /// Service registry handle, for host-side introspection
    pub fn services(&self) -> &Arc<ServiceRegistry> {
        &self.services
    }
}

impl Default for Kernel {
    fn default() -> Self {
        Self::new()
    }
}
