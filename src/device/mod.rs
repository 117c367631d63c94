// Copyright (c) 2025 - Cowboy AI, Inc.
//! Device API Collaborator
//!
//! The reconciliation engine talks to a BIG-IP only through [`DeviceClient`].
//! Transport, authentication and retry belong to implementations, not to the
//! engine.
//!
//! # Implementations
//!
//! - [`memory::InMemoryDevice`] - device simulator enforcing BIG-IP object
//!   semantics, used by the scenario harness and tests
//! - `icontrol::IControlClient` - iControl REST over HTTPS (feature `icontrol`)
//!
//! # Records
//!
//! Reads return [`SelfIpRecord`] / [`VlanRecord`]: the device's own view as
//! plain strings. Turning a record back into domain values goes through the
//! same validation as configuration, which keeps read-back honest.

pub mod memory;

#[cfg(feature = "icontrol")]
pub mod icontrol;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::{FullPath, SelfIp, SelfIpPatch, Vlan};

pub use memory::InMemoryDevice;

#[cfg(feature = "icontrol")]
pub use icontrol::IControlClient;

/// Result type for device operations
pub type DeviceResult<T> = Result<T, DeviceError>;

/// Errors reported by a device
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    /// Object does not exist
    #[error("object {name} not found")]
    NotFound { name: String },

    /// Request clashes with existing device state
    #[error("object {name} conflicts with device state: {detail}")]
    Conflict { name: String, detail: String },

    /// Object is still referenced by other objects
    #[error("object {name} is in use by {referrers:?}")]
    InUse { name: String, referrers: Vec<String> },

    /// Network failure or timeout; safe to retry
    #[error("device unavailable: {0}")]
    Transient(String),

    /// Any other rejection
    #[error("device rejected request (status {status}): {message}")]
    Rejected { status: u16, message: String },
}

/// Device API operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DeviceOperation {
    CreateVlan,
    GetVlan,
    DeleteVlan,
    CreateSelfIp,
    UpdateSelfIp,
    DeleteSelfIp,
    GetSelfIp,
    ListSelfIps,
}

impl DeviceOperation {
    /// Whether the operation changes device state
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Self::CreateVlan
                | Self::DeleteVlan
                | Self::CreateSelfIp
                | Self::UpdateSelfIp
                | Self::DeleteSelfIp
        )
    }
}

impl fmt::Display for DeviceOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CreateVlan => "createVlan",
            Self::GetVlan => "getVlan",
            Self::DeleteVlan => "deleteVlan",
            Self::CreateSelfIp => "createSelfIP",
            Self::UpdateSelfIp => "updateSelfIP",
            Self::DeleteSelfIp => "deleteSelfIP",
            Self::GetSelfIp => "getSelfIP",
            Self::ListSelfIps => "listSelfIPs",
        };
        f.write_str(name)
    }
}

/// Self IP as reported by the device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelfIpRecord {
    pub name: String,
    pub address: String,
    pub vlan: String,
}

impl From<&SelfIp> for SelfIpRecord {
    fn from(self_ip: &SelfIp) -> Self {
        Self {
            name: self_ip.name.to_string(),
            address: self_ip.address.to_string(),
            vlan: self_ip.vlan.to_string(),
        }
    }
}

/// VLAN interface as reported by the device
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InterfaceRecord {
    pub name: String,
    pub tagged: bool,
}

/// VLAN as reported by the device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VlanRecord {
    pub name: String,
    pub tag: u16,
    #[serde(default)]
    pub interfaces: Vec<InterfaceRecord>,
}

impl From<&Vlan> for VlanRecord {
    fn from(vlan: &Vlan) -> Self {
        Self {
            name: vlan.name.to_string(),
            tag: vlan.tag.value(),
            interfaces: vlan
                .interfaces
                .iter()
                .map(|iface| InterfaceRecord {
                    name: iface.name.to_string(),
                    tagged: iface.tagged,
                })
                .collect(),
        }
    }
}

/// BIG-IP network object API
///
/// Lookups return `Ok(None)` for absent objects; absence is not an error.
/// Deletes of absent objects return [`DeviceError::NotFound`] and leave the
/// interpretation to the caller.
#[async_trait]
pub trait DeviceClient: Send + Sync {
    /// Create a VLAN
    async fn create_vlan(&self, vlan: &Vlan) -> DeviceResult<VlanRecord>;

    /// Fetch a VLAN by exact full path
    async fn get_vlan(&self, name: &FullPath) -> DeviceResult<Option<VlanRecord>>;

    /// Delete a VLAN
    async fn delete_vlan(&self, name: &FullPath) -> DeviceResult<()>;

    /// Create a self IP
    async fn create_self_ip(&self, self_ip: &SelfIp) -> DeviceResult<SelfIpRecord>;

    /// Modify a self IP in place with a single request
    async fn update_self_ip(
        &self,
        name: &FullPath,
        patch: &SelfIpPatch,
    ) -> DeviceResult<SelfIpRecord>;

    /// Delete a self IP
    async fn delete_self_ip(&self, name: &FullPath) -> DeviceResult<()>;

    /// Fetch a self IP by exact full path
    async fn get_self_ip(&self, name: &FullPath) -> DeviceResult<Option<SelfIpRecord>>;

    /// List every self IP on the device
    async fn list_self_ips(&self) -> DeviceResult<Vec<SelfIpRecord>>;
}
