// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network Domain Models
//!
//! Typed representation of the BIG-IP objects this crate reconciles. Values
//! here are valid by construction: raw configuration strings become domain
//! values only through the validating constructors and [`invariants`].
//!
//! # Value Objects with Invariants
//!
//! - [`FullPath`] - `/partition/short-name` object identity
//! - [`IpAddressWithCidr`] - IPv4/IPv6 address with mandatory prefix
//! - [`VlanId`] - IEEE 802.1Q VLAN ID (1-4094)
//! - [`InterfaceName`] - interface a VLAN is attached to
//!
//! # Entities
//!
//! - [`SelfIp`] - address bound to a VLAN, identified by name
//! - [`Vlan`] - Layer-2 segment with a tag and interface set
//!
//! # Relationships
//!
//! ```text
//! SelfIp.vlan ──references──> Vlan.name
//! ```
//!
//! The reference must resolve on the device at apply time.

pub mod invariants;
pub mod name;
pub mod network;
pub mod self_ip;
pub mod vlan;

pub use invariants::{ValidationError, ValidationResult};
pub use name::{FullPath, NameError};
pub use network::{InterfaceName, IpAddressWithCidr, NetworkError, VlanId};
pub use self_ip::{SelfIp, SelfIpPatch};
pub use vlan::{Vlan, VlanInterface};
