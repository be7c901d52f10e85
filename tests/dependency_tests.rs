//! Dependency and conflict gating tests
//!
//! The named activation scenarios: required dependencies, conflicts, and
//! chained requirements.

mod common;

use common::*;
use organ_kernel::{Kernel, KernelError};

#[tokio::test]
async fn dependent_requires_dashboard() {
    let log = new_log();
    let mut kernel = Kernel::new();
    kernel
        .register_organ(Box::new(TestOrgan::new("dashboard", log.clone())))
        .unwrap();
    kernel
        .register_organ(Box::new(
            TestOrgan::new("dependent", log.clone()).requires(&["dashboard"]),
        ))
        .unwrap();
    kernel.load_all().await;

    // Missing required dependency blocks, and leaves the dependency alone.
    let err = kernel.enable("dependent").await.unwrap_err();
    assert!(matches!(err, KernelError::DependencyUnsatisfied(_)));
    assert!(!kernel.is_enabled("dependent"));
    assert!(!kernel.is_enabled("dashboard"));

    kernel.enable("dashboard").await.unwrap();
    kernel.enable("dependent").await.unwrap();
    assert!(kernel.is_enabled("dashboard"));
    assert!(kernel.is_enabled("dependent"));
}

#[tokio::test]
async fn conflicting_organ_blocked_until_dashboard_disabled() {
    let log = new_log();
    let mut kernel = Kernel::new();
    kernel
        .register_organ(Box::new(TestOrgan::new("dashboard", log.clone())))
        .unwrap();
    kernel
        .register_organ(Box::new(
            TestOrgan::new("conflicting", log.clone()).conflicts_with(&["dashboard"]),
        ))
        .unwrap();
    kernel.load_all().await;

    kernel.enable("dashboard").await.unwrap();
    let err = kernel.enable("conflicting").await.unwrap_err();
    assert!(matches!(err, KernelError::DependencyUnsatisfied(_)));

    kernel.disable("dashboard").await.unwrap();
    kernel.enable("conflicting").await.unwrap();
    assert!(kernel.is_enabled("conflicting"));
}

#[tokio::test]
async fn conflict_never_enabled_does_not_block() {
    let log = new_log();
    let mut kernel = Kernel::new();
    kernel
        .register_organ(Box::new(TestOrgan::new("dashboard", log.clone())))
        .unwrap();
    kernel
        .register_organ(Box::new(
            TestOrgan::new("conflicting", log).conflicts_with(&["dashboard"]),
        ))
        .unwrap();
    kernel.load_all().await;

    kernel.enable("conflicting").await.unwrap();
    assert!(kernel.is_enabled("conflicting"));
}

#[tokio::test]
async fn requirement_chain_enables_in_dependency_order() {
    let log = new_log();
    let mut kernel = Kernel::new();
    kernel
        .register_organ(Box::new(TestOrgan::new("dashboard", log.clone())))
        .unwrap();
    kernel
        .register_organ(Box::new(
            TestOrgan::new("middle", log.clone()).requires(&["dashboard"]),
        ))
        .unwrap();
    kernel
        .register_organ(Box::new(
            TestOrgan::new("top", log.clone()).requires(&["middle"]),
        ))
        .unwrap();
    kernel.load_all().await;

    // Out-of-order enabling fails at each level.
    assert!(kernel.enable("top").await.is_err());
    assert!(kernel.enable("middle").await.is_err());

    kernel.enable("dashboard").await.unwrap();
    kernel.enable("middle").await.unwrap();
    kernel.enable("top").await.unwrap();
    assert!(kernel.is_enabled("top"));
}

#[tokio::test]
async fn missing_optional_warns_but_enables() {
    let log = new_log();
    let mut kernel = Kernel::new();
    kernel
        .register_organ(Box::new(
            TestOrgan::new("dashboard", log).optionally(&["stats"]),
        ))
        .unwrap();
    kernel.load_all().await;

    let check = kernel.dependency_check("dashboard").unwrap();
    assert!(check.can_enable);
    assert!(check.missing_required.is_empty());
    assert_eq!(check.missing_optional, vec!["stats"]);
    assert_eq!(check.warnings.len(), 1);

    kernel.enable("dashboard").await.unwrap();
    assert!(kernel.is_enabled("dashboard"));
}

#[tokio::test]
async fn error_message_names_every_blocking_organ() {
    let log = new_log();
    let mut kernel = Kernel::new();
    kernel
        .register_organ(Box::new(TestOrgan::new("legacy", log.clone())))
        .unwrap();
    kernel
        .register_organ(Box::new(
            TestOrgan::new("needy", log)
                .requires(&["alpha", "beta"])
                .conflicts_with(&["legacy"]),
        ))
        .unwrap();
    kernel.load_all().await;
    kernel.enable("legacy").await.unwrap();

    let err = kernel.enable("needy").await.unwrap_err();
    let message = err.to_string();
    for id in ["alpha", "beta", "legacy"] {
        assert!(message.contains(id), "message missing {}: {}", id, message);
    }
}

#[tokio::test]
async fn dependency_check_reflects_live_state() {
    let log = new_log();
    let mut kernel = Kernel::new();
    kernel
        .register_organ(Box::new(TestOrgan::new("dashboard", log.clone())))
        .unwrap();
    kernel
        .register_organ(Box::new(
            TestOrgan::new("dependent", log).requires(&["dashboard"]),
        ))
        .unwrap();
    kernel.load_all().await;

    let before = kernel.dependency_check("dependent").unwrap();
    assert!(!before.can_enable);
    assert_eq!(before.missing_required, vec!["dashboard"]);

    kernel.enable("dashboard").await.unwrap();

    let after = kernel.dependency_check("dependent").unwrap();
    assert!(after.can_enable);
    assert!(after.missing_required.is_empty());
}

#[tokio::test]
async fn unknown_required_id_counts_as_missing() {
    let log = new_log();
    let mut kernel = Kernel::new();
    kernel
        .register_organ(Box::new(
            TestOrgan::new("needy", log).requires(&["never-registered"]),
        ))
        .unwrap();
    kernel.load_all().await;

    let err = kernel.enable("needy").await.unwrap_err();
    assert!(err.to_string().contains("never-registered"));
}
