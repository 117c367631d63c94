// Copyright (c) 2025 - Cowboy AI, Inc.
//! Resource Model
//!
//! Parses a desired-state description into a typed [`SelfIp`] / [`Vlan`]
//! pair. Parsing is pure: nothing here talks to a device.
//!
//! ```text
//! ResourceConfig (strings, as written) ──parse──> ResourceModel (validated)
//!                                                    │
//! SelfIpRecord / VlanRecord (device read-back) ──────┘ from_records
//! ```
//!
//! Both directions run through the same validation, so a round trip through
//! the device yields a model that compares field-equal to the one applied.

use serde::{Deserialize, Deserializer, Serialize};

use crate::device::{SelfIpRecord, VlanRecord};
use crate::domain::invariants::{
    validate_address, validate_interfaces, validate_name, validate_vlan_binding,
    validate_vlan_reference, validate_vlan_tag,
};
use crate::domain::{SelfIp, ValidationError, Vlan};

/// Self IP attributes as written in configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelfIpConfig {
    pub name: String,
    pub ip: String,
    #[serde(default)]
    pub vlan: String,
}

/// VLAN interface attributes as written in configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceConfig {
    /// Interface name; fixtures may write it as a number (`1.2`)
    #[serde(alias = "vlanport", deserialize_with = "string_or_number")]
    pub port: String,
    #[serde(default)]
    pub tagged: bool,
}

/// VLAN attributes as written in configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VlanConfig {
    pub name: String,
    pub tag: i64,
    #[serde(default)]
    pub interfaces: Vec<InterfaceConfig>,
}

/// Desired state of one self IP and, optionally, the VLAN it needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceConfig {
    pub self_ip: SelfIpConfig,
    #[serde(default)]
    pub vlan: Option<VlanConfig>,
}

/// Validated desired state
///
/// When `vlan` is `None` the self IP's VLAN must already exist on the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceModel {
    pub self_ip: SelfIp,
    pub vlan: Option<Vlan>,
}

impl ResourceModel {
    /// Parse and validate a desired-state description
    ///
    /// # Errors
    /// - address not valid CIDR
    /// - name or reference not `/partition/short-name`
    /// - empty VLAN reference
    /// - VLAN tag outside 1-4094, or an interface listed twice
    /// - declared VLAN is not the one the self IP references
    pub fn parse(config: &ResourceConfig) -> Result<Self, ValidationError> {
        let self_ip = parse_self_ip(&config.self_ip)?;
        let vlan = config.vlan.as_ref().map(parse_vlan).transpose()?;

        if let Some(vlan) = &vlan {
            validate_vlan_binding(&self_ip, vlan)?;
        }

        Ok(Self { self_ip, vlan })
    }

    /// Re-derive a model purely from device read-back
    pub fn from_records(
        self_ip: &SelfIpRecord,
        vlan: Option<&VlanRecord>,
    ) -> Result<Self, ValidationError> {
        Self::parse(&ResourceConfig {
            self_ip: SelfIpConfig::from(self_ip),
            vlan: vlan.map(VlanConfig::from),
        })
    }

    /// Configuration that parses back into this model
    pub fn to_config(&self) -> ResourceConfig {
        ResourceConfig {
            self_ip: SelfIpConfig::from(&self.self_ip),
            vlan: self.vlan.as_ref().map(VlanConfig::from),
        }
    }
}

/// Parse a self IP block
pub fn parse_self_ip(config: &SelfIpConfig) -> Result<SelfIp, ValidationError> {
    let name = validate_name(&config.name, "name", &config.name)?;
    let resource = name.as_str();
    let address = validate_address(resource, &config.ip)?;
    let vlan = validate_vlan_reference(resource, &config.vlan)?;

    Ok(SelfIp::new(name, address, vlan))
}

/// Parse a VLAN block
pub fn parse_vlan(config: &VlanConfig) -> Result<Vlan, ValidationError> {
    let name = validate_name(&config.name, "name", &config.name)?;
    let resource = name.as_str();
    let tag = validate_vlan_tag(resource, config.tag)?;
    let interfaces = validate_interfaces(
        resource,
        config
            .interfaces
            .iter()
            .map(|iface| (iface.port.as_str(), iface.tagged)),
    )?;

    Ok(Vlan::new(name, tag, interfaces))
}

impl From<&SelfIp> for SelfIpConfig {
    fn from(self_ip: &SelfIp) -> Self {
        Self {
            name: self_ip.name.to_string(),
            ip: self_ip.address.to_string(),
            vlan: self_ip.vlan.to_string(),
        }
    }
}

impl From<&SelfIpRecord> for SelfIpConfig {
    fn from(record: &SelfIpRecord) -> Self {
        Self {
            name: record.name.clone(),
            ip: record.address.clone(),
            vlan: record.vlan.clone(),
        }
    }
}

impl From<&Vlan> for VlanConfig {
    fn from(vlan: &Vlan) -> Self {
        Self {
            name: vlan.name.to_string(),
            tag: i64::from(vlan.tag.value()),
            interfaces: vlan
                .interfaces
                .iter()
                .map(|iface| InterfaceConfig {
                    port: iface.name.to_string(),
                    tagged: iface.tagged,
                })
                .collect(),
        }
    }
}

impl From<&VlanRecord> for VlanConfig {
    fn from(record: &VlanRecord) -> Self {
        Self {
            name: record.name.clone(),
            tag: i64::from(record.tag),
            interfaces: record
                .interfaces
                .iter()
                .map(|iface| InterfaceConfig {
                    port: iface.name.clone(),
                    tagged: iface.tagged,
                })
                .collect(),
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected interface name, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn config() -> ResourceConfig {
        ResourceConfig {
            self_ip: SelfIpConfig {
                name: "/Common/test-selfip".to_string(),
                ip: "11.1.1.1/24".to_string(),
                vlan: "/Common/test-vlan".to_string(),
            },
            vlan: Some(VlanConfig {
                name: "/Common/test-vlan".to_string(),
                tag: 101,
                interfaces: vec![InterfaceConfig {
                    port: "1.2".to_string(),
                    tagged: false,
                }],
            }),
        }
    }

    #[test]
    fn test_parse_valid() {
        let model = ResourceModel::parse(&config()).unwrap();
        assert_eq!(model.self_ip.name.as_str(), "/Common/test-selfip");
        assert_eq!(model.self_ip.address.to_string(), "11.1.1.1/24");
        assert_eq!(model.vlan.as_ref().unwrap().tag.value(), 101);
    }

    #[test]
    fn test_parse_without_vlan_block() {
        let mut config = config();
        config.vlan = None;
        let model = ResourceModel::parse(&config).unwrap();
        assert!(model.vlan.is_none());
        assert_eq!(model.self_ip.vlan.as_str(), "/Common/test-vlan");
    }

    #[test]
    fn test_invalid_cidr() {
        let mut config = config();
        config.self_ip.ip = "11.1.1.300/24".to_string();
        let err = ResourceModel::parse(&config).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidAddress { .. }));
        assert_eq!(err.resource(), "/Common/test-selfip");
    }

    #[test]
    fn test_unqualified_name() {
        let mut config = config();
        config.self_ip.name = "test-selfip".to_string();
        let err = ResourceModel::parse(&config).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InvalidName { field: "name", .. }
        ));
    }

    #[test]
    fn test_empty_vlan_reference() {
        let mut config = config();
        config.self_ip.vlan = String::new();
        config.vlan = None;
        assert!(matches!(
            ResourceModel::parse(&config),
            Err(ValidationError::EmptyVlanReference { .. })
        ));
    }

    #[test]
    fn test_tag_out_of_range() {
        let mut config = config();
        if let Some(vlan) = config.vlan.as_mut() {
            vlan.tag = 4095;
        }
        assert_eq!(
            ResourceModel::parse(&config),
            Err(ValidationError::VlanTagOutOfRange {
                resource: "/Common/test-vlan".to_string(),
                tag: 4095,
            })
        );
    }

    #[test]
    fn test_declared_vlan_must_match_reference() {
        let mut config = config();
        config.self_ip.vlan = "/Common/other-vlan".to_string();
        assert!(matches!(
            ResourceModel::parse(&config),
            Err(ValidationError::VlanReferenceMismatch { .. })
        ));
    }

    #[test]
    fn test_to_config_round_trip() {
        let model = ResourceModel::parse(&config()).unwrap();
        assert_eq!(ResourceModel::parse(&model.to_config()).unwrap(), model);
    }

    #[test]
    fn test_from_records() {
        let model = ResourceModel::parse(&config()).unwrap();
        let self_ip = SelfIpRecord::from(&model.self_ip);
        let vlan = VlanRecord::from(model.vlan.as_ref().unwrap());
        assert_eq!(ResourceModel::from_records(&self_ip, Some(&vlan)).unwrap(), model);
    }

    #[test]
    fn test_numeric_vlanport() {
        let iface: InterfaceConfig =
            serde_json::from_str(r#"{"vlanport": 1.2, "tagged": false}"#).unwrap();
        assert_eq!(iface.port, "1.2");
    }
}
