// Copyright (c) 2025 - Cowboy AI, Inc.
//! Test Fixtures for bigip-network
//!
//! Deterministic desired-state data shared by the integration tests. Every
//! test builds its device, session and models through these helpers.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use bigip_network::device::{InterfaceRecord, VlanRecord};
use bigip_network::model::{InterfaceConfig, SelfIpConfig, VlanConfig};
use bigip_network::{
    DeviceSession, HarnessConfig, InMemoryDevice, ReconcileEngine, ResourceConfig, ResourceModel,
    TestHarness,
};

pub const SELF_IP_NAME: &str = "/Common/test-selfip";
pub const VLAN_NAME: &str = "/Common/test-vlan";
pub const OTHER_VLAN_NAME: &str = "/Common/other-vlan";
pub const SELF_IP_ADDRESS: &str = "11.1.1.1/24";
pub const VLAN_TAG: i64 = 101;

/// Self IP on a VLAN that is declared alongside it
pub const SELFIP_FIXTURE: &str = r#"{
    "resources": [
        {
            "type": "bigip_ltm_vlan",
            "id": "test-vlan",
            "name": "/${partition}/test-vlan",
            "tag": 101,
            "interfaces": [{ "vlanport": 1.2, "tagged": false }]
        },
        {
            "type": "bigip_ltm_selfip",
            "id": "test-selfip",
            "name": "/${partition}/test-selfip",
            "ip": "11.1.1.1/24",
            "vlan": "/${partition}/test-vlan",
            "depends_on": ["bigip_ltm_vlan.test-vlan"]
        }
    ]
}"#;

/// Desired state of the standard self IP and its VLAN
pub fn resource_config() -> ResourceConfig {
    ResourceConfig {
        self_ip: SelfIpConfig {
            name: SELF_IP_NAME.to_string(),
            ip: SELF_IP_ADDRESS.to_string(),
            vlan: VLAN_NAME.to_string(),
        },
        vlan: Some(vlan_config(VLAN_NAME, VLAN_TAG)),
    }
}

pub fn vlan_config(name: &str, tag: i64) -> VlanConfig {
    VlanConfig {
        name: name.to_string(),
        tag,
        interfaces: vec![InterfaceConfig {
            port: "1.2".to_string(),
            tagged: false,
        }],
    }
}

pub fn model() -> ResourceModel {
    ResourceModel::parse(&resource_config()).expect("Invalid model in test fixture")
}

/// Standard model with a different address and VLAN
pub fn moved_model(address: &str, vlan: &str, tag: i64) -> ResourceModel {
    let mut config = resource_config();
    config.self_ip.ip = address.to_string();
    config.self_ip.vlan = vlan.to_string();
    config.vlan = Some(vlan_config(vlan, tag));
    ResourceModel::parse(&config).expect("Invalid model in test fixture")
}

pub fn vlan_record(name: &str, tag: u16) -> VlanRecord {
    VlanRecord {
        name: name.to_string(),
        tag,
        interfaces: vec![InterfaceRecord {
            name: "1.2".to_string(),
            tagged: false,
        }],
    }
}

pub fn device() -> Arc<InMemoryDevice> {
    Arc::new(InMemoryDevice::new())
}

pub fn engine(device: &Arc<InMemoryDevice>) -> ReconcileEngine<InMemoryDevice> {
    ReconcileEngine::new(DeviceSession::new(Arc::clone(device)).with_timeout(Duration::from_secs(5)))
}

pub fn harness(device: &Arc<InMemoryDevice>) -> TestHarness<InMemoryDevice> {
    TestHarness::new(
        DeviceSession::new(Arc::clone(device)).with_timeout(Duration::from_secs(5)),
        HarnessConfig::default(),
    )
}
