//! Test utilities for the organ system tests
//!
//! Provides a configurable test organ that records its hook invocations and
//! can subscribe/serve/fail on demand.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use organ_kernel::api::events::handler_fn;
use organ_kernel::api::services::service_fn;
use organ_kernel::{DependencyDeclaration, KernelError, Organ, OrganContext, OrganHost};

/// Shared call log recording hook and handler invocations in order
pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn new_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Configurable organ for lifecycle and dispatch tests
pub struct TestOrgan {
    id: String,
    deps: DependencyDeclaration,
    log: CallLog,
    fail_load: bool,
    fail_activate: bool,
    fail_deactivate: bool,
    subscribe_topic: Option<String>,
    service_id: Option<String>,
    host: Arc<Mutex<Option<OrganHost>>>,
    settings_seen: Arc<Mutex<Option<Value>>>,
}

impl TestOrgan {
    pub fn new(id: &str, log: CallLog) -> Self {
        Self {
            id: id.to_string(),
            deps: DependencyDeclaration::new(),
            log,
            fail_load: false,
            fail_activate: false,
            fail_deactivate: false,
            subscribe_topic: None,
            service_id: None,
            host: Arc::new(Mutex::new(None)),
            settings_seen: Arc::new(Mutex::new(None)),
        }
    }

    pub fn requires(mut self, ids: &[&str]) -> Self {
        self.deps = self.deps.requires(ids.iter().copied());
        self
    }

    pub fn optionally(mut self, ids: &[&str]) -> Self {
        self.deps = self.deps.optionally(ids.iter().copied());
        self
    }

    pub fn conflicts_with(mut self, ids: &[&str]) -> Self {
        self.deps = self.deps.conflicts_with(ids.iter().copied());
        self
    }

    pub fn failing_load(mut self) -> Self {
        self.fail_load = true;
        self
    }

    /// Activate fails after any subscription/service registration ran
    pub fn failing_activate(mut self) -> Self {
        self.fail_activate = true;
        self
    }

    pub fn failing_deactivate(mut self) -> Self {
        self.fail_deactivate = true;
        self
    }

    /// Subscribe to a topic on activate, recording `event:<id>:<topic>`
    pub fn subscribing(mut self, topic: &str) -> Self {
        self.subscribe_topic = Some(topic.to_string());
        self
    }

    /// Register an echo service on activate, recording `service:<id>`
    pub fn serving(mut self, service_id: &str) -> Self {
        self.service_id = Some(service_id.to_string());
        self
    }

    /// Slot that receives a clone of the activation host handle
    pub fn host_slot(&self) -> Arc<Mutex<Option<OrganHost>>> {
        Arc::clone(&self.host)
    }

    /// Slot that receives the settings object seen by the load hook
    pub fn settings_slot(&self) -> Arc<Mutex<Option<Value>>> {
        Arc::clone(&self.settings_seen)
    }
}

#[async_trait]
impl Organ for TestOrgan {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.id
    }

    fn dependencies(&self) -> DependencyDeclaration {
        self.deps.clone()
    }

    async fn load(&mut self, context: &OrganContext) -> Result<(), KernelError> {
        self.log.lock().unwrap().push(format!("load:{}", self.id));
        *self.settings_seen.lock().unwrap() = Some(context.settings.clone());
        if self.fail_load {
            return Err(KernelError::OperationError(format!(
                "load failure in {}",
                self.id
            )));
        }
        Ok(())
    }

    async fn activate(&mut self, host: &OrganHost) -> Result<(), KernelError> {
        self.log
            .lock()
            .unwrap()
            .push(format!("activate:{}", self.id));

        if let Some(topic) = &self.subscribe_topic {
            let log = Arc::clone(&self.log);
            let id = self.id.clone();
            let topic_name = topic.clone();
            host.subscribe(
                topic,
                handler_fn(move |_payload| {
                    let log = Arc::clone(&log);
                    let tag = format!("event:{}:{}", id, topic_name);
                    async move {
                        log.lock().unwrap().push(tag);
                        Ok(())
                    }
                }),
            )
            .await;
        }

        if let Some(service_id) = &self.service_id {
            let log = Arc::clone(&self.log);
            let id = self.id.clone();
            host.register_service(
                service_id,
                service_fn(move |params| {
                    let log = Arc::clone(&log);
                    let tag = format!("service:{}", id);
                    async move {
                        log.lock().unwrap().push(tag);
                        Ok(params)
                    }
                }),
            )
            .await?;
        }

        *self.host.lock().unwrap() = Some(host.clone());

        if self.fail_activate {
            return Err(KernelError::OperationError(format!(
                "activate failure in {}",
                self.id
            )));
        }
        Ok(())
    }

    async fn deactivate(&mut self) -> Result<(), KernelError> {
        self.log
            .lock()
            .unwrap()
            .push(format!("deactivate:{}", self.id));
        if self.fail_deactivate {
            return Err(KernelError::OperationError(format!(
                "deactivate failure in {}",
                self.id
            )));
        }
        Ok(())
    }

    async fn unload(&mut self) -> Result<(), KernelError> {
        self.log.lock().unwrap().push(format!("unload:{}", self.id));
        Ok(())
    }
}
