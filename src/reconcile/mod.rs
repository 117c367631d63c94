// Copyright (c) 2025 - Cowboy AI, Inc.
//! Reconciliation Layer
//!
//! ```text
//! ResourceModel (desired)
//!     ↓
//! plan  - pure diff against observed records
//!     ↓
//! engine - executes the plan through a DeviceSession
//!     ↓
//! DeviceClient
//! ```
//!
//! Planning is pure and unit-tested in isolation; the engine only sequences
//! device calls and maps their failures onto [`crate::ReconcileError`].

pub mod engine;
pub mod plan;
pub mod session;

pub use engine::{ApplyReport, Change, ObservedSelfIp, ReconcileEngine};
pub use plan::{plan_self_ip, plan_vlan, PlanConflict, SelfIpAction, VlanAction};
pub use session::DeviceSession;
