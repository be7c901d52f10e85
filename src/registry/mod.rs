//! Organ registry and dependency resolution
//!
//! Pure storage keyed by organ identifier, plus the resolver that gates
//! activation. The registry never invokes organ hooks.

pub mod dependencies;

pub use dependencies::{DependencyCheck, DependencyResolver};

use std::collections::HashMap;

use crate::traits::{KernelError, Organ, OrganState};

/// Registered organ plus its lifecycle state
pub(crate) struct OrganSlot {
    pub(crate) organ: Box<dyn Organ>,
    pub(crate) state: OrganState,
}

/// Storage for registered organs, keyed by identifier
///
/// Enumeration is stable in registration order.
#[derive(Default)]
pub struct OrganRegistry {
    slots: HashMap<String, OrganSlot>,
    order: Vec<String>,
}

impl OrganRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an organ under its identifier
    ///
    /// Fails if the identifier is already registered. Never invokes hooks.
    pub fn register(&mut self, organ: Box<dyn Organ>) -> Result<(), KernelError> {
        let id = organ.id().to_string();
        if self.slots.contains_key(&id) {
            return Err(KernelError::AlreadyRegistered(id));
        }
        self.order.push(id.clone());
        self.slots.insert(
            id,
            OrganSlot {
                organ,
                state: OrganState::Registered,
            },
        );
        Ok(())
    }

    /// Look up an organ by identifier
    pub fn get(&self, id: &str) -> Option<&dyn Organ> {
        self.slots.get(id).map(|slot| slot.organ.as_ref())
    }

    /// Current lifecycle state of an organ
    pub fn state(&self, id: &str) -> Option<OrganState> {
        self.slots.get(id).map(|slot| slot.state)
    }

    /// Organ identifiers in registration order
    pub fn ids(&self) -> &[String] {
        &self.order
    }

    /// Iterate over organs in registration order
    pub fn all(&self) -> impl Iterator<Item = &dyn Organ> {
        self.order
            .iter()
            .filter_map(|id| self.slots.get(id))
            .map(|slot| slot.organ.as_ref())
    }

    /// Number of registered organs
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// True if no organs are registered
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub(crate) fn slot_mut(&mut self, id: &str) -> Option<&mut OrganSlot> {
        self.slots.get_mut(id)
    }
}
