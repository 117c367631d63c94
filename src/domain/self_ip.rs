// Copyright (c) 2025 - Cowboy AI, Inc.
//! Self IP Entity
//!
//! A self IP is an address the device owns on a VLAN, letting it originate
//! and receive traffic on that segment. Its `name` is the identity key; the
//! address and VLAN binding are mutable in place.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{FullPath, IpAddressWithCidr};

/// Desired or observed self IP, fully validated
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SelfIp {
    /// Identity key, `/partition/short-name`
    pub name: FullPath,

    /// Address and prefix, e.g. `11.1.1.1/24`
    pub address: IpAddressWithCidr,

    /// Full path of the VLAN this address is bound to
    pub vlan: FullPath,
}

impl SelfIp {
    pub fn new(name: FullPath, address: IpAddressWithCidr, vlan: FullPath) -> Self {
        Self {
            name,
            address,
            vlan,
        }
    }

    /// Fields that differ between `self` (desired) and `other` (observed)
    ///
    /// Returns `None` when nothing mutable differs. The name is not compared:
    /// it is the identity, not a mutable field.
    pub fn diff(&self, other: &SelfIp) -> Option<SelfIpPatch> {
        let patch = SelfIpPatch {
            address: (self.address != other.address).then_some(self.address),
            vlan: (self.vlan != other.vlan).then(|| self.vlan.clone()),
        };

        (!patch.is_empty()).then_some(patch)
    }
}

impl fmt::Display for SelfIp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} on {})", self.name, self.address, self.vlan)
    }
}

/// In-place modification of a self IP
///
/// Every changed field travels in one patch so the device never sees an
/// address bound to a VLAN it does not belong to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelfIpPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<IpAddressWithCidr>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub vlan: Option<FullPath>,
}

impl SelfIpPatch {
    pub fn is_empty(&self) -> bool {
        self.address.is_none() && self.vlan.is_none()
    }

    /// Names of the fields carried by this patch, e.g. `address,vlan`
    pub fn fields(&self) -> String {
        let mut fields = Vec::new();
        if self.address.is_some() {
            fields.push("address");
        }
        if self.vlan.is_some() {
            fields.push("vlan");
        }
        fields.join(",")
    }

    /// Apply the patch to an existing self IP
    pub fn apply_to(&self, self_ip: &SelfIp) -> SelfIp {
        SelfIp {
            name: self_ip.name.clone(),
            address: self.address.unwrap_or(self_ip.address),
            vlan: self.vlan.clone().unwrap_or_else(|| self_ip.vlan.clone()),
        }
    }
}
