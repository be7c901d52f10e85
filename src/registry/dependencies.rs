//! Organ dependency resolution
//!
//! Computes an activation verdict from an organ's declared
//! required/optional/conflicts lists and the kernel's current enabled set.

use tracing::debug;

use crate::traits::DependencyDeclaration;

/// Activation verdict for a single organ
///
/// Derived, never stored: recomputed on every enable attempt and on demand
/// for introspection. Only `missing_required` and `conflicts_found` block
/// activation; `warnings` are advisory.
#[derive(Debug, Clone, Default)]
pub struct DependencyCheck {
    /// True when no required dependency is missing and no conflict is enabled
    pub can_enable: bool,
    /// Required organs that are not currently enabled
    pub missing_required: Vec<String>,
    /// Optional organs that are not currently enabled
    pub missing_optional: Vec<String>,
    /// Declared conflicts that are currently enabled
    pub conflicts_found: Vec<String>,
    /// One entry per missing optional dependency, then one per found conflict
    pub warnings: Vec<String>,
}

impl DependencyCheck {
    /// Human-readable sentence naming every blocking organ identifier
    ///
    /// Mentions each entry in `missing_required` and `conflicts_found` by
    /// identifier; blockers are never summarized away.
    pub fn blocking_summary(&self) -> String {
        let mut parts = Vec::new();
        if !self.missing_required.is_empty() {
            parts.push(format!(
                "missing required organ(s): {}",
                self.missing_required.join(", ")
            ));
        }
        if !self.conflicts_found.is_empty() {
            parts.push(format!(
                "conflicts with enabled organ(s): {}",
                self.conflicts_found.join(", ")
            ));
        }
        if parts.is_empty() {
            "no blocking dependencies".to_string()
        } else {
            parts.join("; ")
        }
    }
}

/// Dependency resolver
pub struct DependencyResolver;

impl DependencyResolver {
    /// Evaluate a declaration against the current enabled set
    ///
    /// `is_enabled` reflects live kernel state at call time. Identifiers
    /// absent from the registry count as not enabled; the resolver never
    /// errors on unknown identifiers. Self-references are evaluated
    /// literally, not special-cased.
    pub fn check<F>(declaration: &DependencyDeclaration, is_enabled: F) -> DependencyCheck
    where
        F: Fn(&str) -> bool,
    {
        let missing_required: Vec<String> = declaration
            .required
            .iter()
            .filter(|id| !is_enabled(id))
            .cloned()
            .collect();

        let missing_optional: Vec<String> = declaration
            .optional
            .iter()
            .filter(|id| !is_enabled(id))
            .cloned()
            .collect();

        let conflicts_found: Vec<String> = declaration
            .conflicts
            .iter()
            .filter(|id| is_enabled(id))
            .cloned()
            .collect();

        let mut warnings = Vec::new();
        for id in &missing_optional {
            warnings.push(format!("optional dependency {} is not enabled", id));
        }
        for id in &conflicts_found {
            warnings.push(format!("conflicts with enabled organ {}", id));
        }

        let can_enable = missing_required.is_empty() && conflicts_found.is_empty();

        debug!(
            "dependency check: can_enable={} missing_required={:?} conflicts={:?}",
            can_enable, missing_required, conflicts_found
        );

        DependencyCheck {
            can_enable,
            missing_required,
            missing_optional,
            conflicts_found,
            warnings,
        }
    }
}
