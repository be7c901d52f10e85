//! Organ system traits and interfaces
//!
//! Defines the contract between the kernel and every registered organ.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::api::host::OrganHost;

/// Organ lifecycle state
///
/// An organ must reach `Loaded` before it can be enabled. `Enabled` and
/// `Disabled` may cycle arbitrarily many times. `Unloaded` is terminal and
/// only reached through kernel-wide teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrganState {
    /// Registered with the kernel, load hook not yet run (or failed)
    Registered,
    /// Load hook completed, organ is enableable
    Loaded,
    /// Organ is active: subscriptions and services are live
    Enabled,
    /// Organ was deactivated, subscriptions and services purged
    Disabled,
    /// Kernel-wide teardown has run; terminal
    Unloaded,
}

/// Dependency declaration for an organ
///
/// Identifiers are opaque strings compared by exact match. The declaration
/// is immutable after registration for the lifetime of the process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DependencyDeclaration {
    /// Organs that must be enabled before this one can be enabled
    #[serde(default)]
    pub required: Vec<String>,
    /// Organs this one cooperates with when present; missing ones only warn
    #[serde(default)]
    pub optional: Vec<String>,
    /// Organs that must NOT be enabled for this one to be enabled
    #[serde(default)]
    pub conflicts: Vec<String>,
}

impl DependencyDeclaration {
    /// Create an empty declaration (no constraints)
    pub fn new() -> Self {
        Self::default()
    }

    /// Add required dependencies
    pub fn requires<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required.extend(ids.into_iter().map(Into::into));
        self
    }

    /// Add optional dependencies
    pub fn optionally<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.optional.extend(ids.into_iter().map(Into::into));
        self
    }

    /// Add conflicting organs
    pub fn conflicts_with<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.conflicts.extend(ids.into_iter().map(Into::into));
        self
    }
}

/// Context handed to an organ's load hook
///
/// Carries the organ's slice of the kernel configuration snapshot. Organs
/// read their settings here; they never touch the snapshot directly.
#[derive(Debug, Clone)]
pub struct OrganContext {
    /// Organ identifier this context was built for
    pub organ_id: String,
    /// Organ-specific settings from the kernel configuration snapshot
    pub settings: Value,
}

impl OrganContext {
    /// Create a new organ context
    pub fn new(organ_id: String, settings: Value) -> Self {
        Self { organ_id, settings }
    }

    /// Get a settings value by key
    pub fn setting(&self, key: &str) -> Option<&Value> {
        self.settings.get(key)
    }

    /// Get a string settings value with a default
    pub fn setting_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.settings
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or(default)
    }
}

/// Organ trait that all feature modules implement
///
/// Organs never import each other's implementations; all cooperation goes
/// through the [`OrganHost`] handle received at activation (event bus,
/// capability/service registry).
#[async_trait]
pub trait Organ: Send + Sync {
    /// Stable, unique identifier for this organ
    fn id(&self) -> &str;

    /// Human-readable display name
    fn name(&self) -> &str;

    /// Dependency declaration; evaluated on every enable attempt
    fn dependencies(&self) -> DependencyDeclaration {
        DependencyDeclaration::default()
    }

    /// Called once at startup with the organ's configuration.
    ///
    /// Loading never depends on other organs. A load failure leaves this
    /// organ un-enableable but does not abort kernel startup.
    async fn load(&mut self, _context: &OrganContext) -> Result<(), KernelError> {
        Ok(())
    }

    /// Called on enable, after the dependency check passes.
    ///
    /// This is where the organ registers its event subscriptions,
    /// capabilities, and services through the host handle. Registration
    /// calls complete before `enable` returns. The organ may keep a clone
    /// of the host to publish events or request services later.
    async fn activate(&mut self, _host: &OrganHost) -> Result<(), KernelError> {
        Ok(())
    }

    /// Called on disable, before the kernel purges this organ's
    /// subscriptions and services. A failure here is logged; the purge and
    /// state transition still complete.
    async fn deactivate(&mut self) -> Result<(), KernelError> {
        Ok(())
    }

    /// Called during kernel-wide teardown; terminal.
    async fn unload(&mut self) -> Result<(), KernelError> {
        Ok(())
    }
}

/// Organ system errors
#[derive(Debug, Error)]
pub enum KernelError {
    #[error("organ not found: {0}")]
    OrganNotFound(String),

    #[error("organ already registered: {0}")]
    AlreadyRegistered(String),

    #[error("dependencies unsatisfied: {0}")]
    DependencyUnsatisfied(String),

    #[error("invalid lifecycle transition: {0}")]
    LifecycleError(String),

    #[error("organ hook failed: {0}")]
    HookError(String),

    #[error("service already registered: {0}")]
    DuplicateService(String),

    #[error("capability already registered: {0}")]
    DuplicateCapability(String),

    #[error("serialization error: {0}")]
    SerializationError(String),

    #[error("organ operation failed: {0}")]
    OperationError(String),
}

impl From<serde_json::Error> for KernelError {
    fn from(e: serde_json::Error) -> Self {
        KernelError::SerializationError(e.to_string())
    }
}

impl From<toml::de::Error> for KernelError {
    fn from(e: toml::de::Error) -> Self {
        KernelError::SerializationError(e.to_string())
    }
}

impl From<toml::ser::Error> for KernelError {
    fn from(e: toml::ser::Error) -> Self {
        KernelError::SerializationError(e.to_string())
    }
}

impl From<anyhow::Error> for KernelError {
    fn from(e: anyhow::Error) -> Self {
        KernelError::OperationError(e.to_string())
    }
}
