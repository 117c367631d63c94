// Copyright (c) 2025 - Cowboy AI, Inc.
//! Pure Reconciliation Planning
//!
//! Planners compare desired state with what the device reported and decide
//! which call, if any, converges them:
//!
//! ```text
//! plan(Desired, Option<Observed>) → Action
//! ```
//!
//! Planners are pure functions: no I/O, no clock, same inputs give the same
//! action. The engine owns execution.

use crate::device::{SelfIpRecord, VlanRecord};
use crate::domain::{SelfIp, SelfIpPatch, Vlan};
use crate::model::{parse_self_ip, parse_vlan, SelfIpConfig, VlanConfig};

/// What to do with a VLAN dependency
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VlanAction {
    /// VLAN is absent; create it
    Create,

    /// VLAN exists with the desired tag
    ///
    /// Interface membership is not managed through a self IP apply, so a
    /// differing interface set is reported but not changed.
    Unchanged { interface_drift: bool },
}

/// What to do with a self IP
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelfIpAction {
    Create,
    /// One request carrying every changed field
    Update(SelfIpPatch),
    Unchanged,
}

impl SelfIpAction {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged)
    }
}

/// Observed state that cannot be converged by an in-place change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanConflict {
    pub field: &'static str,
    pub detail: String,
}

/// Plan the VLAN dependency of an apply
///
/// # Rules
/// - absent → create
/// - same tag → nothing to do
/// - different tag → conflict; a VLAN's tag is not changed underneath the
///   self IPs bound to it
pub fn plan_vlan(desired: &Vlan, observed: Option<&VlanRecord>) -> Result<VlanAction, PlanConflict> {
    let Some(record) = observed else {
        return Ok(VlanAction::Create);
    };

    if record.tag != desired.tag.value() {
        return Err(PlanConflict {
            field: "tag",
            detail: format!(
                "device has tag {}, desired tag {}",
                record.tag, desired.tag
            ),
        });
    }

    let interface_drift = match parse_vlan(&VlanConfig::from(record)) {
        Ok(observed) => observed.interfaces != desired.interfaces,
        Err(_) => true,
    };

    Ok(VlanAction::Unchanged { interface_drift })
}

/// Plan the self IP of an apply
///
/// # Rules
/// - absent → create
/// - present and field-equal → nothing to do
/// - present and different → one update with all differing fields
/// - present but unreadable → update both mutable fields
pub fn plan_self_ip(desired: &SelfIp, observed: Option<&SelfIpRecord>) -> SelfIpAction {
    let Some(record) = observed else {
        return SelfIpAction::Create;
    };

    match parse_self_ip(&SelfIpConfig::from(record)) {
        Ok(observed) => match desired.diff(&observed) {
            Some(patch) => SelfIpAction::Update(patch),
            None => SelfIpAction::Unchanged,
        },
        Err(_) => SelfIpAction::Update(SelfIpPatch {
            address: Some(desired.address),
            vlan: Some(desired.vlan.clone()),
        }),
    }
}
