// Copyright (c) 2025 - Cowboy AI, Inc.
//! In-Memory Device
//!
//! Simulates the object store of a single BIG-IP closely enough to exercise
//! reconciliation:
//!
//! - names are unique per object kind
//! - a self IP must reference an existing VLAN
//! - an address may be bound only once per VLAN
//! - objects still referenced cannot be deleted
//!
//! Every call is recorded so tests can assert how much traffic an apply
//! generated. Faults can be queued per operation and a fixed latency can be
//! added to every call to exercise timeouts.

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

use super::{
    DeviceClient, DeviceError, DeviceOperation, DeviceResult, SelfIpRecord, VlanRecord,
};
use crate::domain::{FullPath, SelfIp, SelfIpPatch, Vlan};

#[derive(Debug, Default)]
struct DeviceState {
    vlans: BTreeMap<String, VlanRecord>,
    self_ips: BTreeMap<String, SelfIpRecord>,
    /// Objects outside this crate's model that reference a self IP or VLAN
    references: BTreeMap<String, BTreeSet<String>>,
    calls: Vec<DeviceOperation>,
    faults: HashMap<DeviceOperation, VecDeque<DeviceError>>,
}

impl DeviceState {
    /// Record the call and pop a queued fault, if any
    fn begin(&mut self, operation: DeviceOperation) -> DeviceResult<()> {
        self.calls.push(operation);
        match self.faults.get_mut(&operation).and_then(VecDeque::pop_front) {
            Some(fault) => {
                debug!("Injected fault for {}: {}", operation, fault);
                Err(fault)
            }
            None => Ok(()),
        }
    }

    fn referrers_of(&self, name: &str) -> Vec<String> {
        self.references
            .get(name)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn check_address_free(&self, name: &str, address: &str, vlan: &str) -> DeviceResult<()> {
        let clash = self
            .self_ips
            .values()
            .find(|other| other.name != name && other.vlan == vlan && other.address == address);

        match clash {
            Some(other) => Err(DeviceError::Conflict {
                name: name.to_string(),
                detail: format!("address {} already bound on {} by {}", address, vlan, other.name),
            }),
            None => Ok(()),
        }
    }

    fn check_vlan_exists(&self, name: &str, vlan: &str) -> DeviceResult<()> {
        if self.vlans.contains_key(vlan) {
            Ok(())
        } else {
            Err(DeviceError::Conflict {
                name: name.to_string(),
                detail: format!("vlan {} does not exist", vlan),
            })
        }
    }
}

/// Simulated BIG-IP object store
#[derive(Debug, Default)]
pub struct InMemoryDevice {
    state: Mutex<DeviceState>,
    latency: Option<Duration>,
}

impl InMemoryDevice {
    /// Create an empty device
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every call by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Fail the next call of `operation` with `error`
    ///
    /// Faults queue up: two calls for the same operation fail its next two
    /// invocations.
    pub async fn fail_next(&self, operation: DeviceOperation, error: DeviceError) {
        self.state
            .lock()
            .await
            .faults
            .entry(operation)
            .or_default()
            .push_back(error);
    }

    /// Register an object outside the reconciled model that references `target`
    pub async fn add_reference(&self, target: &str, referrer: &str) {
        self.state
            .lock()
            .await
            .references
            .entry(target.to_string())
            .or_default()
            .insert(referrer.to_string());
    }

    /// Drop a reference registered with [`Self::add_reference`]
    pub async fn remove_reference(&self, target: &str, referrer: &str) {
        let mut state = self.state.lock().await;
        if let Some(set) = state.references.get_mut(target) {
            set.remove(referrer);
            if set.is_empty() {
                state.references.remove(target);
            }
        }
    }

    /// Place a VLAN on the device without recording a call
    pub async fn seed_vlan(&self, record: VlanRecord) {
        self.state
            .lock()
            .await
            .vlans
            .insert(record.name.clone(), record);
    }

    /// Place a self IP on the device without recording a call
    pub async fn seed_self_ip(&self, record: SelfIpRecord) {
        self.state
            .lock()
            .await
            .self_ips
            .insert(record.name.clone(), record);
    }

    /// Every call made so far, in order
    pub async fn calls(&self) -> Vec<DeviceOperation> {
        self.state.lock().await.calls.clone()
    }

    /// Number of state-changing calls made so far
    pub async fn mutation_count(&self) -> usize {
        self.state
            .lock()
            .await
            .calls
            .iter()
            .filter(|op| op.is_mutation())
            .count()
    }

    /// Forget recorded calls
    pub async fn clear_calls(&self) {
        self.state.lock().await.calls.clear();
    }

    /// Number of VLANs and self IPs currently on the device
    pub async fn object_count(&self) -> usize {
        let state = self.state.lock().await;
        state.vlans.len() + state.self_ips.len()
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl DeviceClient for InMemoryDevice {
    async fn create_vlan(&self, vlan: &Vlan) -> DeviceResult<VlanRecord> {
        self.simulate_latency().await;
        let mut state = self.state.lock().await;
        state.begin(DeviceOperation::CreateVlan)?;

        let name = vlan.name.to_string();
        if state.vlans.contains_key(&name) {
            return Err(DeviceError::Conflict {
                name,
                detail: "object already exists".to_string(),
            });
        }

        let record = VlanRecord::from(vlan);
        state.vlans.insert(name, record.clone());
        Ok(record)
    }

    async fn get_vlan(&self, name: &FullPath) -> DeviceResult<Option<VlanRecord>> {
        self.simulate_latency().await;
        let mut state = self.state.lock().await;
        state.begin(DeviceOperation::GetVlan)?;
        Ok(state.vlans.get(name.as_str()).cloned())
    }

    async fn delete_vlan(&self, name: &FullPath) -> DeviceResult<()> {
        self.simulate_latency().await;
        let mut state = self.state.lock().await;
        state.begin(DeviceOperation::DeleteVlan)?;

        if !state.vlans.contains_key(name.as_str()) {
            return Err(DeviceError::NotFound {
                name: name.to_string(),
            });
        }

        let mut referrers: Vec<String> = state
            .self_ips
            .values()
            .filter(|self_ip| self_ip.vlan == name.as_str())
            .map(|self_ip| self_ip.name.clone())
            .collect();
        referrers.extend(state.referrers_of(name.as_str()));

        if !referrers.is_empty() {
            return Err(DeviceError::InUse {
                name: name.to_string(),
                referrers,
            });
        }

        state.vlans.remove(name.as_str());
        Ok(())
    }

    async fn create_self_ip(&self, self_ip: &SelfIp) -> DeviceResult<SelfIpRecord> {
        self.simulate_latency().await;
        let mut state = self.state.lock().await;
        state.begin(DeviceOperation::CreateSelfIp)?;

        let record = SelfIpRecord::from(self_ip);
        if state.self_ips.contains_key(&record.name) {
            return Err(DeviceError::Conflict {
                name: record.name,
                detail: "object already exists".to_string(),
            });
        }
        state.check_vlan_exists(&record.name, &record.vlan)?;
        state.check_address_free(&record.name, &record.address, &record.vlan)?;

        state.self_ips.insert(record.name.clone(), record.clone());
        Ok(record)
    }

    async fn update_self_ip(
        &self,
        name: &FullPath,
        patch: &SelfIpPatch,
    ) -> DeviceResult<SelfIpRecord> {
        self.simulate_latency().await;
        let mut state = self.state.lock().await;
        state.begin(DeviceOperation::UpdateSelfIp)?;

        let mut updated = state
            .self_ips
            .get(name.as_str())
            .cloned()
            .ok_or_else(|| DeviceError::NotFound {
                name: name.to_string(),
            })?;

        if let Some(address) = &patch.address {
            updated.address = address.to_string();
        }
        if let Some(vlan) = &patch.vlan {
            updated.vlan = vlan.to_string();
        }

        state.check_vlan_exists(&updated.name, &updated.vlan)?;
        state.check_address_free(&updated.name, &updated.address, &updated.vlan)?;

        state.self_ips.insert(updated.name.clone(), updated.clone());
        Ok(updated)
    }

    async fn delete_self_ip(&self, name: &FullPath) -> DeviceResult<()> {
        self.simulate_latency().await;
        let mut state = self.state.lock().await;
        state.begin(DeviceOperation::DeleteSelfIp)?;

        if !state.self_ips.contains_key(name.as_str()) {
            return Err(DeviceError::NotFound {
                name: name.to_string(),
            });
        }

        let referrers = state.referrers_of(name.as_str());
        if !referrers.is_empty() {
            return Err(DeviceError::InUse {
                name: name.to_string(),
                referrers,
            });
        }

        state.self_ips.remove(name.as_str());
        Ok(())
    }

    async fn get_self_ip(&self, name: &FullPath) -> DeviceResult<Option<SelfIpRecord>> {
        self.simulate_latency().await;
        let mut state = self.state.lock().await;
        state.begin(DeviceOperation::GetSelfIp)?;
        Ok(state.self_ips.get(name.as_str()).cloned())
    }

    async fn list_self_ips(&self) -> DeviceResult<Vec<SelfIpRecord>> {
        self.simulate_latency().await;
        let mut state = self.state.lock().await;
        state.begin(DeviceOperation::ListSelfIps)?;
        Ok(state.self_ips.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{IpAddressWithCidr, VlanId};

    fn vlan(name: &str, tag: i64) -> Vlan {
        Vlan::new(FullPath::new(name).unwrap(), VlanId::new(tag).unwrap(), Vec::new())
    }

    fn self_ip(name: &str, address: &str, vlan: &str) -> SelfIp {
        SelfIp::new(
            FullPath::new(name).unwrap(),
            IpAddressWithCidr::new(address).unwrap(),
            FullPath::new(vlan).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_self_ip_requires_vlan() {
        let device = InMemoryDevice::new();
        let result = device
            .create_self_ip(&self_ip("/Common/s", "11.1.1.1/24", "/Common/missing"))
            .await;
        assert!(matches!(result, Err(DeviceError::Conflict { .. })));
        assert_eq!(device.object_count().await, 0);
    }

    #[tokio::test]
    async fn test_address_unique_per_vlan() {
        let device = InMemoryDevice::new();
        device.create_vlan(&vlan("/Common/v", 10)).await.unwrap();
        device
            .create_self_ip(&self_ip("/Common/a", "11.1.1.1/24", "/Common/v"))
            .await
            .unwrap();

        let clash = device
            .create_self_ip(&self_ip("/Common/b", "11.1.1.1/24", "/Common/v"))
            .await;
        assert!(matches!(clash, Err(DeviceError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_vlan_delete_blocked_by_self_ip() {
        let device = InMemoryDevice::new();
        device.create_vlan(&vlan("/Common/v", 10)).await.unwrap();
        device
            .create_self_ip(&self_ip("/Common/a", "11.1.1.1/24", "/Common/v"))
            .await
            .unwrap();

        let result = device.delete_vlan(&FullPath::new("/Common/v").unwrap()).await;
        assert_eq!(
            result,
            Err(DeviceError::InUse {
                name: "/Common/v".to_string(),
                referrers: vec!["/Common/a".to_string()],
            })
        );
    }

    #[tokio::test]
    async fn test_get_is_exact_lookup() {
        let device = InMemoryDevice::new();
        device.create_vlan(&vlan("/Common/v", 10)).await.unwrap();
        device
            .create_self_ip(&self_ip("/Common/a", "11.1.1.1/24", "/Common/v"))
            .await
            .unwrap();

        let other = device
            .get_self_ip(&FullPath::new("/Common/b").unwrap())
            .await
            .unwrap();
        assert!(other.is_none());
    }

    #[tokio::test]
    async fn test_fault_injection_is_one_shot() {
        let device = InMemoryDevice::new();
        device
            .fail_next(
                DeviceOperation::ListSelfIps,
                DeviceError::Transient("connection reset".to_string()),
            )
            .await;

        assert!(device.list_self_ips().await.is_err());
        assert!(device.list_self_ips().await.is_ok());
        assert_eq!(
            device.calls().await,
            vec![DeviceOperation::ListSelfIps, DeviceOperation::ListSelfIps]
        );
        assert_eq!(device.mutation_count().await, 0);
    }

    #[tokio::test]
    async fn test_external_reference_blocks_delete() {
        let device = InMemoryDevice::new();
        device.create_vlan(&vlan("/Common/v", 10)).await.unwrap();
        device
            .create_self_ip(&self_ip("/Common/a", "11.1.1.1/24", "/Common/v"))
            .await
            .unwrap();
        device.add_reference("/Common/a", "/Common/snat-pool").await;

        let name = FullPath::new("/Common/a").unwrap();
        assert!(matches!(
            device.delete_self_ip(&name).await,
            Err(DeviceError::InUse { .. })
        ));

        device.remove_reference("/Common/a", "/Common/snat-pool").await;
        assert!(device.delete_self_ip(&name).await.is_ok());
    }
}
