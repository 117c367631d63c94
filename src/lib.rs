// Copyright (c) 2025 - Cowboy AI, Inc.
//! Declarative reconciliation of BIG-IP self IPs and VLANs
//!
//! A desired [`ResourceModel`] is converged onto a device through a
//! [`DeviceClient`] with the minimum number of calls, and acceptance
//! scenarios drive the whole lifecycle against a simulator or a live box.
//!
//! ```text
//! domain      validated value objects (FullPath, IpAddressWithCidr, VlanId)
//! model       configuration ⇄ ResourceModel ⇄ device records
//! device      DeviceClient trait, simulator, iControl REST (feature `icontrol`)
//! reconcile   pure plan + engine sequencing device calls
//! harness     fixture scenarios: create, import, destroy
//! ```

pub mod config;
pub mod device;
pub mod domain;
pub mod errors;
pub mod harness;
pub mod model;
pub mod reconcile;

// Re-export commonly used types
pub use config::{DeviceConfig, HarnessConfig, RetryPolicy};
pub use device::{DeviceClient, DeviceError, DeviceOperation, InMemoryDevice, SelfIpRecord, VlanRecord};
pub use domain::{FullPath, IpAddressWithCidr, SelfIp, ValidationError, Vlan, VlanId};
pub use errors::{ConfigError, ReconcileError, ReconcileResult};
pub use harness::{Fixture, ScenarioError, ScenarioKind, ScenarioReport, TestHarness};
pub use model::{ResourceConfig, ResourceModel};
pub use reconcile::{ApplyReport, Change, DeviceSession, ObservedSelfIp, ReconcileEngine};

#[cfg(feature = "icontrol")]
pub use device::IControlClient;
