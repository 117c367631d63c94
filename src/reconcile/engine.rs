// Copyright (c) 2025 - Cowboy AI, Inc.
//! Reconciliation Engine
//!
//! Converges device state to a [`ResourceModel`] with the fewest calls:
//!
//! ```text
//! apply(desired)
//!   1. VLAN      read → plan_vlan    → create | nothing | Conflict
//!   2. Self IP   read → plan_self_ip → create | one update | nothing
//!   3.           read → ApplyReport.observed
//! ```
//!
//! # Guarantees
//!
//! - The VLAN is reconciled before the self IP that references it.
//! - A converged resource costs reads only; no mutation is issued.
//! - Address and VLAN changes travel in a single update.
//! - The returned state comes from a fresh read, never from a cache.
//!
//! # Non-guarantees
//!
//! Multi-step applies are not transactional. A VLAN created in step 1 stays
//! on the device if step 2 fails; the caller decides whether to destroy it.
//! The engine never retries: [`ReconcileError::is_retryable`] tells the
//! caller when a retry makes sense.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use tracing::{debug, info, warn};

use super::plan::{plan_self_ip, plan_vlan, SelfIpAction, VlanAction};
use super::session::DeviceSession;
use crate::device::{DeviceClient, DeviceError, DeviceOperation, DeviceResult, SelfIpRecord, VlanRecord};
use crate::domain::{FullPath, SelfIp, Vlan};
use crate::errors::{ReconcileError, ReconcileResult};
use crate::model::ResourceModel;

/// Self IP state as read back from the device
pub type ObservedSelfIp = SelfIpRecord;

/// Mutation issued during an apply or destroy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    pub resource: String,
    pub operation: DeviceOperation,
    /// Fields carried by the request (`address,vlan` for a combined update)
    pub fields: String,
    pub at: DateTime<Utc>,
}

impl Change {
    fn now(resource: &str, operation: DeviceOperation, fields: &str) -> Self {
        Self {
            resource: resource.to_string(),
            operation,
            fields: fields.to_string(),
            at: Utc::now(),
        }
    }
}

/// Outcome of a successful apply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyReport {
    /// Self IP as the device reports it after the apply
    pub observed: ObservedSelfIp,
    /// Mutations issued, in order; empty when already converged
    pub changes: Vec<Change>,
}

impl ApplyReport {
    pub fn is_noop(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Desired-state reconciler for self IPs and their VLANs
pub struct ReconcileEngine<C> {
    session: DeviceSession<C>,
}

impl<C: DeviceClient> ReconcileEngine<C> {
    pub fn new(session: DeviceSession<C>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &DeviceSession<C> {
        &self.session
    }

    /// Issue one device call, mapping failures onto the resource
    async fn call<T, F>(
        &self,
        resource: &str,
        operation: DeviceOperation,
        field: &str,
        request: F,
    ) -> ReconcileResult<T>
    where
        F: Future<Output = DeviceResult<T>>,
    {
        self.session
            .send(operation, request)
            .await
            .map_err(|err| ReconcileError::from_device(resource, operation, field, err))
    }

    /// Converge one self IP (and its declared VLAN) to `desired`
    pub async fn apply(&self, desired: &ResourceModel) -> ReconcileResult<ApplyReport> {
        let self_ip = &desired.self_ip;
        info!("Applying self IP {}", self_ip);

        let mut changes = match &desired.vlan {
            Some(vlan) => self.apply_vlan(vlan).await?,
            None => {
                self.require_vlan(self_ip).await?;
                Vec::new()
            }
        };

        let resource = self_ip.name.as_str();
        let client = self.session.client();
        let observed = self.read(&self_ip.name).await?;

        match plan_self_ip(self_ip, observed.as_ref()) {
            SelfIpAction::Create => {
                self.call(
                    resource,
                    DeviceOperation::CreateSelfIp,
                    "name",
                    client.create_self_ip(self_ip),
                )
                .await?;
                info!("Created self IP {}", resource);
                changes.push(Change::now(resource, DeviceOperation::CreateSelfIp, "address,vlan"));
            }
            SelfIpAction::Update(patch) => {
                let fields = patch.fields();
                self.call(
                    resource,
                    DeviceOperation::UpdateSelfIp,
                    &fields,
                    client.update_self_ip(&self_ip.name, &patch),
                )
                .await?;
                info!("Updated self IP {} ({})", resource, fields);
                changes.push(Change::now(resource, DeviceOperation::UpdateSelfIp, &fields));
            }
            SelfIpAction::Unchanged => {
                debug!("Self IP {} already converged", resource);
            }
        }

        let observed = self
            .read(&self_ip.name)
            .await?
            .ok_or_else(|| ReconcileError::Device {
                resource: resource.to_string(),
                operation: DeviceOperation::GetSelfIp,
                detail: "self IP missing immediately after apply".to_string(),
            })?;

        Ok(ApplyReport { observed, changes })
    }

    /// Converge a VLAN: create it when absent, fail on a tag conflict
    ///
    /// Creating a VLAN that already exists with the same tag is a no-op.
    pub async fn apply_vlan(&self, desired: &Vlan) -> ReconcileResult<Vec<Change>> {
        let resource = desired.name.as_str();
        let observed = self.read_vlan(&desired.name).await?;

        match plan_vlan(desired, observed.as_ref()) {
            Ok(VlanAction::Create) => {
                let created = self
                    .call(
                        resource,
                        DeviceOperation::CreateVlan,
                        "name",
                        self.session.client().create_vlan(desired),
                    )
                    .await;

                match created {
                    Ok(_) => {
                        info!("Created VLAN {}", desired);
                        Ok(vec![Change::now(resource, DeviceOperation::CreateVlan, "tag,interfaces")])
                    }
                    // Someone else created it between our read and create
                    Err(ReconcileError::Conflict { .. }) => {
                        let current = self.read_vlan(&desired.name).await?;
                        match current {
                            Some(record) if record.tag == desired.tag.value() => {
                                debug!("VLAN {} appeared concurrently with identical tag", resource);
                                Ok(Vec::new())
                            }
                            _ => Err(ReconcileError::Conflict {
                                resource: resource.to_string(),
                                field: "tag".to_string(),
                                detail: "VLAN exists with different parameters".to_string(),
                            }),
                        }
                    }
                    Err(err) => Err(err),
                }
            }
            Ok(VlanAction::Unchanged { interface_drift }) => {
                if interface_drift {
                    warn!("VLAN {} interfaces differ from desired state; leaving them as is", resource);
                }
                debug!("VLAN {} already converged", resource);
                Ok(Vec::new())
            }
            Err(conflict) => Err(ReconcileError::Conflict {
                resource: resource.to_string(),
                field: conflict.field.to_string(),
                detail: conflict.detail,
            }),
        }
    }

    /// Fail unless the VLAN referenced by `self_ip` exists
    async fn require_vlan(&self, self_ip: &SelfIp) -> ReconcileResult<()> {
        match self.read_vlan(&self_ip.vlan).await? {
            Some(_) => Ok(()),
            None => Err(ReconcileError::Conflict {
                resource: self_ip.name.to_string(),
                field: "vlan".to_string(),
                detail: format!("referenced VLAN {} does not exist", self_ip.vlan),
            }),
        }
    }

    /// Fetch one self IP by exact full path; `None` when absent
    pub async fn read(&self, name: &FullPath) -> ReconcileResult<Option<ObservedSelfIp>> {
        let record = self
            .call(
                name.as_str(),
                DeviceOperation::GetSelfIp,
                "name",
                self.session.client().get_self_ip(name),
            )
            .await?;

        Ok(record.filter(|record| record.name == name.as_str()))
    }

    /// Fetch one VLAN by exact full path; `None` when absent
    pub async fn read_vlan(&self, name: &FullPath) -> ReconcileResult<Option<VlanRecord>> {
        let record = self
            .call(
                name.as_str(),
                DeviceOperation::GetVlan,
                "name",
                self.session.client().get_vlan(name),
            )
            .await?;

        Ok(record.filter(|record| record.name == name.as_str()))
    }

    /// Delete a self IP; deleting an absent one succeeds
    pub async fn destroy(&self, name: &FullPath) -> ReconcileResult<()> {
        let operation = DeviceOperation::DeleteSelfIp;
        let result = self
            .session
            .send(operation, self.session.client().delete_self_ip(name))
            .await;

        match result {
            Ok(()) => {
                info!("Destroyed self IP {}", name);
                Ok(())
            }
            Err(DeviceError::NotFound { .. }) => {
                debug!("Self IP {} already absent", name);
                Ok(())
            }
            Err(err) => Err(ReconcileError::from_device(name.as_str(), operation, "name", err)),
        }
    }

    /// Delete a VLAN; fails naming every self IP still bound to it
    pub async fn destroy_vlan(&self, name: &FullPath) -> ReconcileResult<()> {
        let dependents: Vec<String> = self
            .call(
                name.as_str(),
                DeviceOperation::ListSelfIps,
                "name",
                self.session.client().list_self_ips(),
            )
            .await?
            .into_iter()
            .filter(|self_ip| self_ip.vlan == name.as_str())
            .map(|self_ip| self_ip.name)
            .collect();

        if !dependents.is_empty() {
            warn!("Refusing to destroy VLAN {}: bound self IPs {:?}", name, dependents);
            return Err(ReconcileError::Dependency {
                resource: name.to_string(),
                dependents,
            });
        }

        let operation = DeviceOperation::DeleteVlan;
        let result = self
            .session
            .send(operation, self.session.client().delete_vlan(name))
            .await;

        match result {
            Ok(()) => {
                info!("Destroyed VLAN {}", name);
                Ok(())
            }
            Err(DeviceError::NotFound { .. }) => {
                debug!("VLAN {} already absent", name);
                Ok(())
            }
            Err(err) => Err(ReconcileError::from_device(name.as_str(), operation, "name", err)),
        }
    }
}
