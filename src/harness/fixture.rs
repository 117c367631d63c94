// Copyright (c) 2025 - Cowboy AI, Inc.
//! Scenario Fixtures
//!
//! A fixture declares the resources a scenario applies, one block per
//! resource:
//!
//! ```json
//! {
//!   "resources": [
//!     { "type": "bigip_ltm_vlan", "id": "test-vlan",
//!       "name": "/${partition}/test-vlan", "tag": 101,
//!       "interfaces": [{ "vlanport": "1.2", "tagged": false }] },
//!     { "type": "bigip_ltm_selfip", "id": "test-selfip",
//!       "name": "/${partition}/test-selfip", "ip": "11.1.1.1/24",
//!       "vlan": "/${partition}/test-vlan",
//!       "depends_on": ["bigip_ltm_vlan.test-vlan"] }
//!   ]
//! }
//! ```
//!
//! Blocks are addressed as `<type>.<id>`. Apply order is a topological sort
//! over explicit `depends_on` edges plus the edge implied when a self IP's
//! `vlan` names a declared VLAN. Ties keep declaration order.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::ScenarioError;
use crate::domain::{FullPath, SelfIp, ValidationError, Vlan};
use crate::model::{parse_self_ip, parse_vlan, InterfaceConfig, ResourceModel, SelfIpConfig, VlanConfig};

/// Resource type of VLAN blocks
pub const VLAN_TYPE: &str = "bigip_ltm_vlan";

/// Resource type of self IP blocks
pub const SELF_IP_TYPE: &str = "bigip_ltm_selfip";

/// Placeholder replaced by the configured partition
pub const PARTITION_PLACEHOLDER: &str = "${partition}";

/// VLAN block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VlanBlock {
    pub id: String,
    pub name: String,
    pub tag: i64,
    #[serde(default)]
    pub interfaces: Vec<InterfaceConfig>,
    #[serde(default)]
    pub depends_on: Vec<String>,
}

/// Self IP block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelfIpBlock {
    pub id: String,
    pub name: String,
    pub ip: String,
    #[serde(default)]
    pub vlan: String,
    #[serde(default)]
    pub depends_on: Vec<String>,
}

/// One declared resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ResourceBlock {
    #[serde(rename = "bigip_ltm_vlan")]
    Vlan(VlanBlock),
    #[serde(rename = "bigip_ltm_selfip")]
    SelfIp(SelfIpBlock),
}

impl ResourceBlock {
    /// `<type>.<id>`
    pub fn address(&self) -> String {
        match self {
            Self::Vlan(block) => format!("{}.{}", VLAN_TYPE, block.id),
            Self::SelfIp(block) => format!("{}.{}", SELF_IP_TYPE, block.id),
        }
    }

    pub fn depends_on(&self) -> &[String] {
        match self {
            Self::Vlan(block) => &block.depends_on,
            Self::SelfIp(block) => &block.depends_on,
        }
    }
}

impl From<&VlanBlock> for VlanConfig {
    fn from(block: &VlanBlock) -> Self {
        Self {
            name: block.name.clone(),
            tag: block.tag,
            interfaces: block.interfaces.clone(),
        }
    }
}

impl From<&SelfIpBlock> for SelfIpConfig {
    fn from(block: &SelfIpBlock) -> Self {
        Self {
            name: block.name.clone(),
            ip: block.ip.clone(),
            vlan: block.vlan.clone(),
        }
    }
}

/// Declared resources of one scenario
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Fixture {
    pub resources: Vec<ResourceBlock>,
}

impl Fixture {
    /// Parse fixture JSON
    pub fn from_json(text: &str) -> Result<Self, ScenarioError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Substitute the partition placeholder, then parse
    pub fn render(template: &str, partition: &str) -> Result<Self, ScenarioError> {
        Self::from_json(&template.replace(PARTITION_PLACEHOLDER, partition))
    }

    /// Validate every block and order them for apply
    pub fn plan(&self) -> Result<FixturePlan, ValidationError> {
        let mut addresses = BTreeSet::new();
        let mut vlans: BTreeMap<FullPath, Vlan> = BTreeMap::new();
        let mut self_ip_names = BTreeSet::new();
        let mut parsed = Vec::with_capacity(self.resources.len());

        for block in &self.resources {
            let address = block.address();
            if !addresses.insert(address.clone()) {
                return Err(ValidationError::DuplicateResource { resource: address });
            }

            match block {
                ResourceBlock::Vlan(vlan_block) => {
                    let vlan = parse_vlan(&VlanConfig::from(vlan_block))?;
                    if vlans.insert(vlan.name.clone(), vlan.clone()).is_some() {
                        return Err(ValidationError::DuplicateResource {
                            resource: vlan.name.to_string(),
                        });
                    }
                    parsed.push(Parsed::Vlan(vlan));
                }
                ResourceBlock::SelfIp(self_ip_block) => {
                    let self_ip = parse_self_ip(&SelfIpConfig::from(self_ip_block))?;
                    if !self_ip_names.insert(self_ip.name.clone()) {
                        return Err(ValidationError::DuplicateResource {
                            resource: self_ip.name.to_string(),
                        });
                    }
                    parsed.push(Parsed::SelfIp(self_ip));
                }
            }
        }

        let order = self.apply_order(&parsed)?;

        let steps = order
            .into_iter()
            .map(|index| {
                let address = self.resources[index].address();
                match &parsed[index] {
                    Parsed::Vlan(vlan) => PlannedResource::Vlan {
                        address,
                        vlan: vlan.clone(),
                    },
                    Parsed::SelfIp(self_ip) => PlannedResource::SelfIp {
                        address,
                        model: ResourceModel {
                            vlan: vlans.get(&self_ip.vlan).cloned(),
                            self_ip: self_ip.clone(),
                        },
                    },
                }
            })
            .collect();

        Ok(FixturePlan { steps })
    }

    /// Kahn's algorithm over block indices, declaration order on ties
    fn apply_order(&self, parsed: &[Parsed]) -> Result<Vec<usize>, ValidationError> {
        let index_of: BTreeMap<String, usize> = self
            .resources
            .iter()
            .enumerate()
            .map(|(index, block)| (block.address(), index))
            .collect();

        let vlan_index: BTreeMap<&FullPath, usize> = parsed
            .iter()
            .enumerate()
            .filter_map(|(index, p)| match p {
                Parsed::Vlan(vlan) => Some((&vlan.name, index)),
                Parsed::SelfIp(_) => None,
            })
            .collect();

        // prerequisites[i] = blocks that must be applied before block i
        let mut prerequisites: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); self.resources.len()];

        for (index, block) in self.resources.iter().enumerate() {
            for dependency in block.depends_on() {
                let target = index_of.get(dependency).ok_or_else(|| {
                    ValidationError::UnknownDependency {
                        resource: block.address(),
                        dependency: dependency.clone(),
                    }
                })?;
                prerequisites[index].insert(*target);
            }

            if let Parsed::SelfIp(self_ip) = &parsed[index] {
                if let Some(target) = vlan_index.get(&self_ip.vlan) {
                    prerequisites[index].insert(*target);
                }
            }
        }

        let mut order = Vec::with_capacity(self.resources.len());
        let mut placed = vec![false; self.resources.len()];

        while order.len() < self.resources.len() {
            let next = (0..self.resources.len()).find(|&index| {
                !placed[index] && prerequisites[index].iter().all(|&dep| placed[dep])
            });

            match next {
                Some(index) => {
                    placed[index] = true;
                    order.push(index);
                }
                None => {
                    let resources = (0..self.resources.len())
                        .filter(|&index| !placed[index])
                        .map(|index| self.resources[index].address())
                        .collect();
                    return Err(ValidationError::DependencyCycle { resources });
                }
            }
        }

        Ok(order)
    }
}

enum Parsed {
    Vlan(Vlan),
    SelfIp(SelfIp),
}

/// One validated resource in apply order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedResource {
    Vlan { address: String, vlan: Vlan },
    SelfIp { address: String, model: ResourceModel },
}

impl PlannedResource {
    pub fn address(&self) -> &str {
        match self {
            Self::Vlan { address, .. } | Self::SelfIp { address, .. } => address,
        }
    }

    /// Device object name
    pub fn name(&self) -> &FullPath {
        match self {
            Self::Vlan { vlan, .. } => &vlan.name,
            Self::SelfIp { model, .. } => &model.self_ip.name,
        }
    }
}

/// Validated fixture in apply order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixturePlan {
    pub steps: Vec<PlannedResource>,
}

impl FixturePlan {
    /// Self IP models in apply order
    pub fn self_ips(&self) -> impl Iterator<Item = &ResourceModel> {
        self.steps.iter().filter_map(|step| match step {
            PlannedResource::SelfIp { model, .. } => Some(model),
            PlannedResource::Vlan { .. } => None,
        })
    }

    /// VLANs in apply order
    pub fn vlans(&self) -> impl Iterator<Item = &Vlan> {
        self.steps.iter().filter_map(|step| match step {
            PlannedResource::Vlan { vlan, .. } => Some(vlan),
            PlannedResource::SelfIp { .. } => None,
        })
    }

    /// Destroy order: dependents before their dependencies
    pub fn destroy_order(&self) -> impl Iterator<Item = &PlannedResource> {
        self.steps.iter().rev()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SELFIP_FIXTURE: &str = r#"{
        "resources": [
            { "type": "bigip_ltm_selfip", "id": "test-selfip",
              "name": "/${partition}/test-selfip", "ip": "11.1.1.1/24",
              "vlan": "/${partition}/test-vlan" },
            { "type": "bigip_ltm_vlan", "id": "test-vlan",
              "name": "/${partition}/test-vlan", "tag": 101,
              "interfaces": [{ "vlanport": 1.2, "tagged": false }] }
        ]
    }"#;

    fn addresses(plan: &FixturePlan) -> Vec<&str> {
        plan.steps.iter().map(PlannedResource::address).collect()
    }

    #[test]
    fn test_vlan_reference_orders_vlan_first() {
        let fixture = Fixture::render(SELFIP_FIXTURE, "Common").unwrap();
        let plan = fixture.plan().unwrap();
        assert_eq!(
            addresses(&plan),
            vec!["bigip_ltm_vlan.test-vlan", "bigip_ltm_selfip.test-selfip"]
        );

        let model = plan.self_ips().next().unwrap();
        assert_eq!(model.vlan.as_ref().unwrap().name.as_str(), "/Common/test-vlan");
    }

    #[test]
    fn test_render_partition() {
        let fixture = Fixture::render(SELFIP_FIXTURE, "tenant_a").unwrap();
        let plan = fixture.plan().unwrap();
        assert_eq!(plan.vlans().next().unwrap().name.partition(), "tenant_a");
    }

    #[test]
    fn test_explicit_depends_on() {
        let fixture = Fixture::from_json(
            r#"{ "resources": [
                { "type": "bigip_ltm_vlan", "id": "b", "name": "/Common/b", "tag": 2,
                  "depends_on": ["bigip_ltm_vlan.a"] },
                { "type": "bigip_ltm_vlan", "id": "a", "name": "/Common/a", "tag": 1 }
            ] }"#,
        )
        .unwrap();
        let plan = fixture.plan().unwrap();
        assert_eq!(addresses(&plan), vec!["bigip_ltm_vlan.a", "bigip_ltm_vlan.b"]);
        assert_eq!(
            plan.destroy_order().map(PlannedResource::address).collect::<Vec<_>>(),
            vec!["bigip_ltm_vlan.b", "bigip_ltm_vlan.a"]
        );
    }

    #[test]
    fn test_unknown_dependency() {
        let fixture = Fixture::from_json(
            r#"{ "resources": [
                { "type": "bigip_ltm_selfip", "id": "s", "name": "/Common/s",
                  "ip": "11.1.1.1/24", "vlan": "/Common/v",
                  "depends_on": ["bigip_ltm_vlan.v"] }
            ] }"#,
        )
        .unwrap();
        assert_eq!(
            fixture.plan(),
            Err(ValidationError::UnknownDependency {
                resource: "bigip_ltm_selfip.s".to_string(),
                dependency: "bigip_ltm_vlan.v".to_string(),
            })
        );
    }

    #[test]
    fn test_dependency_cycle() {
        let fixture = Fixture::from_json(
            r#"{ "resources": [
                { "type": "bigip_ltm_vlan", "id": "a", "name": "/Common/a", "tag": 1,
                  "depends_on": ["bigip_ltm_vlan.b"] },
                { "type": "bigip_ltm_vlan", "id": "b", "name": "/Common/b", "tag": 2,
                  "depends_on": ["bigip_ltm_vlan.a"] }
            ] }"#,
        )
        .unwrap();
        assert!(matches!(
            fixture.plan(),
            Err(ValidationError::DependencyCycle { resources }) if resources.len() == 2
        ));
    }

    #[test]
    fn test_duplicate_address() {
        let fixture = Fixture::from_json(
            r#"{ "resources": [
                { "type": "bigip_ltm_vlan", "id": "a", "name": "/Common/a", "tag": 1 },
                { "type": "bigip_ltm_vlan", "id": "a", "name": "/Common/b", "tag": 2 }
            ] }"#,
        )
        .unwrap();
        assert!(matches!(
            fixture.plan(),
            Err(ValidationError::DuplicateResource { .. })
        ));
    }

    #[test]
    fn test_undeclared_vlan_leaves_model_without_vlan() {
        let fixture = Fixture::from_json(
            r#"{ "resources": [
                { "type": "bigip_ltm_selfip", "id": "s", "name": "/Common/s",
                  "ip": "11.1.1.1/24", "vlan": "/Common/elsewhere" }
            ] }"#,
        )
        .unwrap();
        let plan = fixture.plan().unwrap();
        assert!(plan.self_ips().next().unwrap().vlan.is_none());
    }

    #[test]
    fn test_unknown_resource_type_is_format_error() {
        let result = Fixture::from_json(
            r#"{ "resources": [ { "type": "bigip_ltm_pool", "id": "p" } ] }"#,
        );
        assert!(matches!(result, Err(ScenarioError::FixtureFormat(_))));
    }
}
