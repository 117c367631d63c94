// Copyright (c) 2025 - Cowboy AI, Inc.
//! Pure Validation Functions - Domain Invariants
//!
//! All desired-state validation lives here. Every function is pure (no I/O)
//! and every failure names the offending resource and the field at fault,
//! so a validation error can be shown to a user without further context.
//!
//! # Invariant Categories
//!
//! 1. **Structural Invariants**: names, addresses, tags are well-formed
//! 2. **Reference Invariants**: a self IP's VLAN reference is non-empty and
//!    agrees with the VLAN declared alongside it
//! 3. **Set Invariants**: a VLAN lists each interface once
//! 4. **Graph Invariants**: fixture dependencies resolve and are acyclic

use std::collections::BTreeSet;

use crate::domain::{
    FullPath, InterfaceName, IpAddressWithCidr, NameError, NetworkError, SelfIp, Vlan,
    VlanId, VlanInterface,
};

/// Validation result with detailed error information
pub type ValidationResult = Result<(), ValidationError>;

/// Validation error with context
///
/// Raised before any device call is made.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A name or reference is not `/partition/short-name`
    #[error("{resource}: invalid {field}: {source}")]
    InvalidName {
        resource: String,
        field: &'static str,
        source: NameError,
    },

    /// Address is not valid CIDR
    #[error("{resource}: invalid ip {value:?}: {source}")]
    InvalidAddress {
        resource: String,
        value: String,
        source: NetworkError,
    },

    /// Self IP does not name its VLAN
    #[error("{resource}: vlan reference is empty")]
    EmptyVlanReference { resource: String },

    /// VLAN tag outside 1-4094
    #[error("{resource}: tag {tag} is outside 1-4094")]
    VlanTagOutOfRange { resource: String, tag: i64 },

    /// Interface name is malformed
    #[error("{resource}: invalid interface {value:?}: {source}")]
    InvalidInterface {
        resource: String,
        value: String,
        source: NetworkError,
    },

    /// Same interface listed twice on one VLAN
    #[error("{resource}: interface {interface} is listed more than once")]
    DuplicateInterface { resource: String, interface: String },

    /// Self IP references a VLAN other than the one declared with it
    #[error("{resource}: vlan reference {reference} does not match declared vlan {declared}")]
    VlanReferenceMismatch {
        resource: String,
        reference: String,
        declared: String,
    },

    /// Two fixture blocks share an address or an object name
    #[error("{resource}: declared more than once")]
    DuplicateResource { resource: String },

    /// `depends_on` names a resource the fixture does not declare
    #[error("{resource}: depends on undeclared resource {dependency}")]
    UnknownDependency { resource: String, dependency: String },

    /// Fixture dependencies form a cycle
    #[error("dependency cycle between {resources:?}")]
    DependencyCycle { resources: Vec<String> },
}

impl ValidationError {
    /// Resource the error is about (first member for cycles)
    pub fn resource(&self) -> &str {
        match self {
            Self::InvalidName { resource, .. }
            | Self::InvalidAddress { resource, .. }
            | Self::EmptyVlanReference { resource }
            | Self::VlanTagOutOfRange { resource, .. }
            | Self::InvalidInterface { resource, .. }
            | Self::DuplicateInterface { resource, .. }
            | Self::VlanReferenceMismatch { resource, .. }
            | Self::DuplicateResource { resource }
            | Self::UnknownDependency { resource, .. } => resource,
            Self::DependencyCycle { resources } => {
                resources.first().map(String::as_str).unwrap_or_default()
            }
        }
    }
}

/// Validate a partition-qualified name
///
/// `resource` is how the error refers to the object being validated (its
/// raw name, or the fixture address when the name itself is bad).
pub fn validate_name(
    resource: &str,
    field: &'static str,
    raw: &str,
) -> Result<FullPath, ValidationError> {
    FullPath::new(raw).map_err(|source| ValidationError::InvalidName {
        resource: resource.to_string(),
        field,
        source,
    })
}

/// Validate a CIDR address
pub fn validate_address(resource: &str, raw: &str) -> Result<IpAddressWithCidr, ValidationError> {
    IpAddressWithCidr::new(raw).map_err(|source| ValidationError::InvalidAddress {
        resource: resource.to_string(),
        value: raw.to_string(),
        source,
    })
}

/// Validate the VLAN reference of a self IP
///
/// # Rules
/// - Must not be empty or blank
/// - Must be a full path
pub fn validate_vlan_reference(resource: &str, raw: &str) -> Result<FullPath, ValidationError> {
    if raw.trim().is_empty() {
        return Err(ValidationError::EmptyVlanReference {
            resource: resource.to_string(),
        });
    }
    validate_name(resource, "vlan", raw)
}

/// Validate an 802.1Q tag
pub fn validate_vlan_tag(resource: &str, tag: i64) -> Result<VlanId, ValidationError> {
    VlanId::new(tag).map_err(|_| ValidationError::VlanTagOutOfRange {
        resource: resource.to_string(),
        tag,
    })
}

/// Validate VLAN interface membership
///
/// # Rules
/// - Each interface name is well-formed
/// - No interface appears twice, whatever its tagging mode
pub fn validate_interfaces<'a>(
    resource: &str,
    interfaces: impl IntoIterator<Item = (&'a str, bool)>,
) -> Result<Vec<VlanInterface>, ValidationError> {
    let mut seen = BTreeSet::new();
    let mut validated = Vec::new();

    for (raw, tagged) in interfaces {
        let name =
            InterfaceName::new(raw).map_err(|source| ValidationError::InvalidInterface {
                resource: resource.to_string(),
                value: raw.to_string(),
                source,
            })?;

        if !seen.insert(name.clone()) {
            return Err(ValidationError::DuplicateInterface {
                resource: resource.to_string(),
                interface: name.to_string(),
            });
        }

        validated.push(VlanInterface::new(name, tagged));
    }

    Ok(validated)
}

/// Validate that a self IP is bound to the VLAN declared with it
pub fn validate_vlan_binding(self_ip: &SelfIp, vlan: &Vlan) -> ValidationResult {
    if self_ip.vlan != vlan.name {
        return Err(ValidationError::VlanReferenceMismatch {
            resource: self_ip.name.to_string(),
            reference: self_ip.vlan.to_string(),
            declared: vlan.name.to_string(),
        });
    }
    Ok(())
}
