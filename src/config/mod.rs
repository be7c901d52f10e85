//! Kernel configuration snapshot
//!
//! The only kernel-owned mutable state shared across organs: which organs
//! are enabled, plus per-organ settings. All mutation goes through
//! [`KernelConfig::merge`], a structural merge where new keys overlay old
//! ones, so a partial update from one organ cannot clobber unrelated keys.
//! Persistence of the snapshot (where and how it is stored) belongs to the
//! host application; this module only (de)serializes it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::traits::KernelError;

/// Process-wide configuration snapshot
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct KernelConfig {
    /// Enabled flag per organ id
    #[serde(default)]
    pub enabled_organs: HashMap<String, bool>,

    /// Per-organ settings objects (arbitrary key/value)
    #[serde(default)]
    pub organ_settings: HashMap<String, Value>,
}

impl KernelConfig {
    /// Create an empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the snapshot records an organ as enabled
    pub fn organ_enabled(&self, id: &str) -> bool {
        self.enabled_organs.get(id).copied().unwrap_or(false)
    }

    /// Record an organ's enabled flag
    pub(crate) fn set_organ_enabled(&mut self, id: &str, enabled: bool) {
        self.enabled_organs.insert(id.to_string(), enabled);
    }

    /// Settings object for one organ; an empty object when none are stored
    pub fn settings_for(&self, id: &str) -> Value {
        self.organ_settings
            .get(id)
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()))
    }

    /// Merge a partial snapshot into this one
    ///
    /// Enabled flags overlay per organ. Settings objects are merged deeply:
    /// keys present in the patch win, keys absent from the patch survive.
    pub fn merge(&mut self, patch: KernelConfig) {
        self.enabled_organs.extend(patch.enabled_organs);
        for (organ_id, value) in patch.organ_settings {
            match self.organ_settings.get_mut(&organ_id) {
                Some(existing) => merge_value(existing, value),
                None => {
                    self.organ_settings.insert(organ_id, value);
                }
            }
        }
    }

    /// Parse a snapshot from TOML text supplied by the host
    pub fn from_toml_str(text: &str) -> Result<Self, KernelError> {
        Ok(toml::from_str(text)?)
    }

    /// Render the snapshot as TOML text for the host to persist
    pub fn to_toml_string(&self) -> Result<String, KernelError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Deep structural merge of JSON values: objects merge key by key, any
/// other pairing is replaced by the patch value.
fn merge_value(base: &mut Value, patch: Value) {
    match (base, patch) {
        (Value::Object(base_map), Value::Object(patch_map)) => {
            for (key, patch_val) in patch_map {
                match base_map.get_mut(&key) {
                    Some(slot) => merge_value(slot, patch_val),
                    None => {
                        base_map.insert(key, patch_val);
                    }
                }
            }
        }
        (slot, patch_val) => *slot = patch_val,
    }
}
