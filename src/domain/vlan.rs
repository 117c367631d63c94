// Copyright (c) 2025 - Cowboy AI, Inc.
//! VLAN Entity
//!
//! A Layer-2 segment identified by its full path and 802.1Q tag, attached to
//! a set of interfaces. Self IPs depend on a VLAN; a VLAN never depends on
//! anything reconciled here.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::{FullPath, InterfaceName, VlanId};

/// Interface membership of a VLAN
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VlanInterface {
    pub name: InterfaceName,
    pub tagged: bool,
}

impl VlanInterface {
    pub fn new(name: InterfaceName, tagged: bool) -> Self {
        Self { name, tagged }
    }
}

impl fmt::Display for VlanInterface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = if self.tagged { "tagged" } else { "untagged" };
        write!(f, "{} ({})", self.name, mode)
    }
}

/// Desired or observed VLAN, fully validated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vlan {
    pub name: FullPath,
    pub tag: VlanId,
    /// Set semantics: declaration order is irrelevant
    pub interfaces: BTreeSet<VlanInterface>,
}

impl Vlan {
    pub fn new(
        name: FullPath,
        tag: VlanId,
        interfaces: impl IntoIterator<Item = VlanInterface>,
    ) -> Self {
        Self {
            name,
            tag,
            interfaces: interfaces.into_iter().collect(),
        }
    }

    /// Whether `other` carries the same tag
    pub fn same_tag(&self, other: &Vlan) -> bool {
        self.tag == other.tag
    }
}

impl fmt::Display for Vlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (tag {})", self.name, self.tag)
    }
}
