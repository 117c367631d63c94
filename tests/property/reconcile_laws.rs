// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Reconciliation
//!
//! Every generated desired state is applied to a fresh in-memory device.

use std::sync::Arc;

use bigip_network::device::DeviceClient;
use bigip_network::model::{InterfaceConfig, SelfIpConfig, VlanConfig};
use bigip_network::{
    DeviceOperation, DeviceSession, InMemoryDevice, ReconcileEngine, ResourceConfig, ResourceModel,
};
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

fn ipv4_cidr() -> impl Strategy<Value = String> {
    (1u8..=223, any::<u8>(), any::<u8>(), 1u8..=254, 8u8..=30)
        .prop_map(|(a, b, c, d, prefix)| format!("{}.{}.{}.{}/{}", a, b, c, d, prefix))
}

fn ipv6_cidr() -> impl Strategy<Value = String> {
    (any::<u16>(), any::<u16>(), 1u16..=0xfffe, 48u8..=127)
        .prop_map(|(a, b, host, prefix)| format!("2001:db8:{:x}:{:x}::{:x}/{}", a, b, host, prefix))
}

fn address() -> impl Strategy<Value = String> {
    prop_oneof![ipv4_cidr(), ipv6_cidr()]
}

/// Desired state whose VLAN name is derived from its tag, so equal names
/// always carry equal tags
fn desired() -> impl Strategy<Value = ResourceModel> {
    (address(), 1i64..=4094, any::<bool>()).prop_map(|(ip, tag, tagged)| {
        let vlan = format!("/Common/vlan-{}", tag);
        ResourceModel::parse(&ResourceConfig {
            self_ip: SelfIpConfig {
                name: "/Common/prop-selfip".to_string(),
                ip,
                vlan: vlan.clone(),
            },
            vlan: Some(VlanConfig {
                name: vlan,
                tag,
                interfaces: vec![InterfaceConfig {
                    port: "1.1".to_string(),
                    tagged,
                }],
            }),
        })
        .unwrap()
    })
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Applying a converged state issues no mutation
    #[test]
    fn prop_apply_is_idempotent(model in desired()) {
        runtime().block_on(async {
            let device = Arc::new(InMemoryDevice::new());
            let engine = ReconcileEngine::new(DeviceSession::new(Arc::clone(&device)));

            engine.apply(&model).await.unwrap();
            let before = device.mutation_count().await;
            let report = engine.apply(&model).await.unwrap();

            prop_assert!(report.is_noop());
            prop_assert_eq!(device.mutation_count().await, before);
            Ok(())
        })?;
    }

    /// Any state converges to any other with at most one self IP update
    #[test]
    fn prop_transition_converges(from in desired(), to in desired()) {
        runtime().block_on(async {
            let device = Arc::new(InMemoryDevice::new());
            let engine = ReconcileEngine::new(DeviceSession::new(Arc::clone(&device)));

            engine.apply(&from).await.unwrap();
            device.clear_calls().await;
            let report = engine.apply(&to).await.unwrap();

            prop_assert_eq!(&report.observed.address, &to.self_ip.address.to_string());
            prop_assert_eq!(&report.observed.vlan, &to.self_ip.vlan.to_string());

            let updates = device
                .calls()
                .await
                .into_iter()
                .filter(|op| *op == DeviceOperation::UpdateSelfIp)
                .count();
            prop_assert!(updates <= 1);
            prop_assert_eq!(updates == 0, from.self_ip == to.self_ip);
            Ok(())
        })?;
    }

    /// A model re-derived from device read-back equals the applied model
    #[test]
    fn prop_read_back_round_trips(model in desired()) {
        runtime().block_on(async {
            let device = Arc::new(InMemoryDevice::new());
            let engine = ReconcileEngine::new(DeviceSession::new(Arc::clone(&device)));

            let report = engine.apply(&model).await.unwrap();
            let vlan = device.get_vlan(&model.self_ip.vlan).await.unwrap();
            let imported = ResourceModel::from_records(&report.observed, vlan.as_ref()).unwrap();

            prop_assert_eq!(imported, model);
            Ok(())
        })?;
    }
}
