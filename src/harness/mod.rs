// Copyright (c) 2025 - Cowboy AI, Inc.
//! Scenario Harness
//!
//! Drives the engine through declarative acceptance scenarios against one
//! device session:
//!
//! ```text
//! fixture ──plan──> apply (dependency order)
//!                     │
//!     create:  read back, compare every declared field
//!     import:  re-derive the model from read-back, compare to declared
//!     destroy: teardown (reverse order), confirm nothing survives
//! ```
//!
//! [`TestHarness::run`] is the full lifecycle: the scenario step, then
//! teardown, then the destroy check. Teardown and the destroy check run even
//! when the scenario step fails, and whatever they find is reported with the
//! step failure.

pub mod fixture;
pub mod retry;

pub use fixture::{Fixture, FixturePlan, PlannedResource, ResourceBlock, SelfIpBlock, VlanBlock};
pub use retry::with_retry;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

use crate::config::HarnessConfig;
use crate::device::DeviceClient;
use crate::domain::{FullPath, ValidationError, Vlan};
use crate::errors::{ReconcileError, ReconcileResult};
use crate::model::{parse_vlan, ResourceModel, VlanConfig};
use crate::reconcile::{Change, DeviceSession, ReconcileEngine};

/// Scenario failures
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("invalid fixture: {0}")]
    Fixture(#[from] ValidationError),

    #[error("malformed fixture: {0}")]
    FixtureFormat(String),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    /// Read-back differs from what the fixture declared
    #[error("{resource}: {field} expected {expected:?}, got {actual:?}")]
    FieldMismatch {
        resource: String,
        field: &'static str,
        expected: String,
        actual: String,
    },

    #[error("{resource} not found on device after apply")]
    Missing { resource: String },

    #[error("resources still present after destroy: {}", .names.join(", "))]
    Surviving { names: Vec<String> },

    /// Teardown or the destroy check failed; `step` is the scenario failure, if any
    #[error("{}", cleanup_message(.step.as_deref(), .failures))]
    Cleanup {
        step: Option<Box<ScenarioError>>,
        failures: Vec<ScenarioError>,
    },
}

fn cleanup_message(step: Option<&ScenarioError>, failures: &[ScenarioError]) -> String {
    let failures = failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ");
    match step {
        Some(step) => format!("{}; cleanup failed: {}", step, failures),
        None => format!("cleanup failed: {}", failures),
    }
}

impl From<serde_json::Error> for ScenarioError {
    fn from(err: serde_json::Error) -> Self {
        Self::FixtureFormat(err.to_string())
    }
}

/// Which acceptance check a run performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioKind {
    Create,
    Import,
    Destroy,
}

impl fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Import => write!(f, "import"),
            Self::Destroy => write!(f, "destroy"),
        }
    }
}

/// Outcome of a passed scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub run_id: Uuid,
    pub scenario: ScenarioKind,
    /// Resource addresses in apply order
    pub resources: Vec<String>,
    /// Mutations issued by the apply step
    pub changes: Vec<Change>,
    /// Number of field comparisons or absence checks that passed
    pub checks: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Acceptance scenario runner
pub struct TestHarness<C> {
    engine: ReconcileEngine<C>,
    config: HarnessConfig,
}

impl<C: DeviceClient> TestHarness<C> {
    pub fn new(session: DeviceSession<C>, config: HarnessConfig) -> Self {
        Self {
            engine: ReconcileEngine::new(session),
            config,
        }
    }

    pub fn engine(&self) -> &ReconcileEngine<C> {
        &self.engine
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Render fixture text for the configured partition
    pub fn load_fixture(&self, template: &str) -> Result<Fixture, ScenarioError> {
        Fixture::render(template, &self.config.partition)
    }

    async fn retrying<T, F, Fut>(&self, operation: F) -> ReconcileResult<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = ReconcileResult<T>>,
    {
        with_retry(self.config.retry.as_ref(), operation).await
    }

    /// Apply every fixture resource in dependency order
    pub async fn apply_fixture(&self, plan: &FixturePlan) -> Result<Vec<Change>, ScenarioError> {
        let mut changes = Vec::new();

        for step in &plan.steps {
            match step {
                PlannedResource::Vlan { vlan, .. } => {
                    changes.extend(self.retrying(|| self.engine.apply_vlan(vlan)).await?);
                }
                PlannedResource::SelfIp { model, .. } => {
                    let report = self.retrying(|| self.engine.apply(model)).await?;
                    changes.extend(report.changes);
                }
            }
        }

        Ok(changes)
    }

    /// Apply, then assert the device reports every declared field
    pub async fn run_create_scenario(&self, fixture: &Fixture) -> Result<ScenarioReport, ScenarioError> {
        let started_at = Utc::now();
        let plan = fixture.plan()?;
        let changes = self.apply_fixture(&plan).await?;
        let mut checks = 0;

        for step in &plan.steps {
            checks += match step {
                PlannedResource::Vlan { vlan, .. } => self.check_vlan(vlan).await?,
                PlannedResource::SelfIp { model, .. } => self.check_self_ip(model).await?,
            };
        }

        Ok(self.report(ScenarioKind::Create, &plan, changes, checks, started_at))
    }

    /// Apply, then assert a model rebuilt from read-back equals the declared one
    pub async fn run_import_scenario(&self, fixture: &Fixture) -> Result<ScenarioReport, ScenarioError> {
        let started_at = Utc::now();
        let plan = fixture.plan()?;
        let changes = self.apply_fixture(&plan).await?;
        let mut checks = 0;

        for declared in plan.self_ips() {
            let name = &declared.self_ip.name;
            let observed = self
                .engine
                .read(name)
                .await?
                .ok_or_else(|| ScenarioError::Missing {
                    resource: name.to_string(),
                })?;

            let vlan_record = match &declared.vlan {
                Some(vlan) => Some(self.engine.read_vlan(&vlan.name).await?.ok_or_else(|| {
                    ScenarioError::Missing {
                        resource: vlan.name.to_string(),
                    }
                })?),
                None => None,
            };

            // Read-back that fails validation is a device fault, not a fixture fault
            let imported = ResourceModel::from_records(&observed, vlan_record.as_ref())
                .map_err(|err| ScenarioError::Reconcile(err.into()))?;
            checks += compare_models(declared, &imported)?;
        }

        Ok(self.report(ScenarioKind::Import, &plan, changes, checks, started_at))
    }

    /// Assert no fixture resource remains on the device
    pub async fn run_destroy_scenario(&self, fixture: &Fixture) -> Result<ScenarioReport, ScenarioError> {
        let started_at = Utc::now();
        let plan = fixture.plan()?;

        let mut names = Vec::new();
        for step in &plan.steps {
            let present = match step {
                PlannedResource::Vlan { vlan, .. } => self.engine.read_vlan(&vlan.name).await?.is_some(),
                PlannedResource::SelfIp { model, .. } => {
                    self.engine.read(&model.self_ip.name).await?.is_some()
                }
            };
            if present {
                names.push(step.name().to_string());
            }
        }

        if !names.is_empty() {
            return Err(ScenarioError::Surviving { names });
        }

        Ok(self.report(ScenarioKind::Destroy, &plan, Vec::new(), plan.steps.len(), started_at))
    }

    /// Destroy fixture resources, dependents first
    pub async fn teardown(&self, fixture: &Fixture) -> Result<(), ScenarioError> {
        let plan = fixture.plan()?;

        for step in plan.destroy_order() {
            let name: &FullPath = step.name();
            match step {
                PlannedResource::Vlan { .. } => {
                    self.retrying(|| self.engine.destroy_vlan(name)).await?;
                }
                PlannedResource::SelfIp { .. } => {
                    self.retrying(|| self.engine.destroy(name)).await?;
                }
            }
        }

        Ok(())
    }

    /// Scenario step, teardown, destroy check
    ///
    /// Teardown and the destroy check always run. When either fails the
    /// result is [`ScenarioError::Cleanup`], carrying the step failure too.
    pub async fn run(&self, kind: ScenarioKind, fixture: &Fixture) -> Result<ScenarioReport, ScenarioError> {
        info!("Starting {} scenario ({} resources)", kind, fixture.resources.len());

        let outcome = match kind {
            ScenarioKind::Create => self.run_create_scenario(fixture).await,
            ScenarioKind::Import => self.run_import_scenario(fixture).await,
            ScenarioKind::Destroy => {
                let started_at = Utc::now();
                match fixture.plan() {
                    Ok(plan) => self
                        .apply_fixture(&plan)
                        .await
                        .map(|changes| self.report(kind, &plan, changes, 0, started_at)),
                    Err(err) => Err(err.into()),
                }
            }
        };

        if let Err(err) = &outcome {
            error!("{} scenario failed: {}", kind, err);
        }

        let mut failures = Vec::new();
        if let Err(err) = self.teardown(fixture).await {
            error!("Teardown after {} scenario failed: {}", kind, err);
            failures.push(err);
        }
        let destroy_checks = match self.run_destroy_scenario(fixture).await {
            Ok(report) => report.checks,
            Err(err) => {
                error!("Destroy check after {} scenario failed: {}", kind, err);
                failures.push(err);
                0
            }
        };

        match outcome {
            Err(step) if failures.is_empty() => Err(step),
            Err(step) => Err(ScenarioError::Cleanup {
                step: Some(Box::new(step)),
                failures,
            }),
            Ok(_) if !failures.is_empty() => Err(ScenarioError::Cleanup { step: None, failures }),
            Ok(mut report) => {
                report.checks += destroy_checks;
                report.finished_at = Utc::now();
                info!("{} scenario passed: {} checks", kind, report.checks);
                Ok(report)
            }
        }
    }

    fn report(
        &self,
        scenario: ScenarioKind,
        plan: &FixturePlan,
        changes: Vec<Change>,
        checks: usize,
        started_at: DateTime<Utc>,
    ) -> ScenarioReport {
        ScenarioReport {
            run_id: Uuid::now_v7(),
            scenario,
            resources: plan.steps.iter().map(|step| step.address().to_string()).collect(),
            changes,
            checks,
            started_at,
            finished_at: Utc::now(),
        }
    }

    async fn check_self_ip(&self, model: &ResourceModel) -> Result<usize, ScenarioError> {
        let declared = &model.self_ip;
        let resource = declared.name.as_str();
        let observed = self
            .engine
            .read(&declared.name)
            .await?
            .ok_or_else(|| ScenarioError::Missing {
                resource: resource.to_string(),
            })?;

        expect_field(resource, "name", declared.name.as_str(), &observed.name)?;
        expect_field(resource, "ip", &declared.address.to_string(), &observed.address)?;
        expect_field(resource, "vlan", declared.vlan.as_str(), &observed.vlan)?;
        Ok(3)
    }

    async fn check_vlan(&self, declared: &Vlan) -> Result<usize, ScenarioError> {
        let resource = declared.name.as_str();
        let observed = self
            .engine
            .read_vlan(&declared.name)
            .await?
            .ok_or_else(|| ScenarioError::Missing {
                resource: resource.to_string(),
            })?;

        expect_field(resource, "name", declared.name.as_str(), &observed.name)?;
        expect_field(
            resource,
            "tag",
            &declared.tag.value().to_string(),
            &observed.tag.to_string(),
        )?;

        // Read-back that fails validation is a device fault, not a fixture fault
        let observed = parse_vlan(&VlanConfig::from(&observed))
            .map_err(|err| ScenarioError::Reconcile(err.into()))?;
        expect_field(
            resource,
            "interfaces",
            &render_interfaces(declared),
            &render_interfaces(&observed),
        )?;
        Ok(3)
    }
}

fn expect_field(
    resource: &str,
    field: &'static str,
    expected: &str,
    actual: &str,
) -> Result<(), ScenarioError> {
    if expected == actual {
        Ok(())
    } else {
        Err(ScenarioError::FieldMismatch {
            resource: resource.to_string(),
            field,
            expected: expected.to_string(),
            actual: actual.to_string(),
        })
    }
}

fn compare_models(declared: &ResourceModel, imported: &ResourceModel) -> Result<usize, ScenarioError> {
    let resource = declared.self_ip.name.as_str();
    let mut checks = 0;

    for (field, expected, actual) in [
        ("name", declared.self_ip.name.to_string(), imported.self_ip.name.to_string()),
        ("ip", declared.self_ip.address.to_string(), imported.self_ip.address.to_string()),
        ("vlan", declared.self_ip.vlan.to_string(), imported.self_ip.vlan.to_string()),
    ] {
        expect_field(resource, field, &expected, &actual)?;
        checks += 1;
    }

    match (&declared.vlan, &imported.vlan) {
        (Some(expected), Some(actual)) => {
            let resource = expected.name.as_str();
            expect_field(resource, "tag", &expected.tag.to_string(), &actual.tag.to_string())?;
            expect_field(
                resource,
                "interfaces",
                &render_interfaces(expected),
                &render_interfaces(actual),
            )?;
            checks += 2;
        }
        (None, None) => {}
        (expected, actual) => {
            return Err(ScenarioError::FieldMismatch {
                resource: resource.to_string(),
                field: "vlan",
                expected: format!("{:?}", expected.as_ref().map(|v| v.name.to_string())),
                actual: format!("{:?}", actual.as_ref().map(|v| v.name.to_string())),
            });
        }
    }

    Ok(checks)
}

fn render_interfaces(vlan: &Vlan) -> String {
    vlan.interfaces
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
