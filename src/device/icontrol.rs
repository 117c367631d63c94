// Copyright (c) 2025 - Cowboy AI, Inc.

//! iControl REST Device Client
//!
//! Talks to a BIG-IP management interface over HTTPS with basic auth:
//!
//! ```text
//! create_vlan     POST   /mgmt/tm/net/vlan
//! get_vlan        GET    /mgmt/tm/net/vlan/~Common~test-vlan?expandSubcollections=true
//! delete_vlan     DELETE /mgmt/tm/net/vlan/~Common~test-vlan
//! create_self_ip  POST   /mgmt/tm/net/self
//! update_self_ip  PATCH  /mgmt/tm/net/self/~Common~test-selfip
//! get_self_ip     GET    /mgmt/tm/net/self/~Common~test-selfip
//! list_self_ips   GET    /mgmt/tm/net/self
//! ```
//!
//! # Status mapping
//!
//! | Response                          | Error                      |
//! |-----------------------------------|----------------------------|
//! | 404                               | `NotFound` (`None` on get) |
//! | 409                               | `Conflict`                 |
//! | 400 mentioning "in use"/"referenced" | `InUse`                 |
//! | 5xx, timeout, connection failure  | `Transient`                |
//! | anything else                     | `Rejected`                 |

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{DeviceClient, DeviceError, DeviceResult, InterfaceRecord, SelfIpRecord, VlanRecord};
use crate::config::DeviceConfig;
use crate::domain::{FullPath, SelfIp, SelfIpPatch, Vlan};

const VLAN_PATH: &str = "/mgmt/tm/net/vlan";
const SELF_IP_PATH: &str = "/mgmt/tm/net/self";

/// VLAN interface on the wire: exactly one of `tagged`/`untagged` is set
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct WireInterface {
    name: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    tagged: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    untagged: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct WireInterfaces {
    #[serde(default)]
    items: Vec<WireInterface>,
}

#[derive(Debug, Clone, Serialize)]
struct VlanCreate {
    name: String,
    partition: String,
    tag: u16,
    interfaces: Vec<WireInterface>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VlanResponse {
    full_path: String,
    tag: u16,
    #[serde(default)]
    interfaces_reference: WireInterfaces,
}

impl From<VlanResponse> for VlanRecord {
    fn from(wire: VlanResponse) -> Self {
        let mut interfaces: Vec<InterfaceRecord> = wire
            .interfaces_reference
            .items
            .into_iter()
            .map(|iface| InterfaceRecord {
                name: iface.name,
                tagged: iface.tagged,
            })
            .collect();
        interfaces.sort();

        Self {
            name: wire.full_path,
            tag: wire.tag,
            interfaces,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct SelfIpCreate {
    name: String,
    partition: String,
    address: String,
    vlan: String,
}

#[derive(Debug, Clone, Default, Serialize)]
struct SelfIpModify {
    #[serde(skip_serializing_if = "Option::is_none")]
    address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    vlan: Option<String>,
}

impl From<&SelfIpPatch> for SelfIpModify {
    fn from(patch: &SelfIpPatch) -> Self {
        Self {
            address: patch.address.map(|address| address.to_string()),
            vlan: patch.vlan.as_ref().map(ToString::to_string),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SelfIpResponse {
    full_path: String,
    address: String,
    vlan: String,
}

impl From<SelfIpResponse> for SelfIpRecord {
    fn from(wire: SelfIpResponse) -> Self {
        Self {
            name: wire.full_path,
            address: wire.address,
            vlan: wire.vlan,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct Collection<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

/// Error body returned by iControl REST
#[derive(Debug, Clone, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// Map a failed response onto a device error
fn classify(status: u16, name: &str, message: String) -> DeviceError {
    let lower = message.to_ascii_lowercase();
    match status {
        404 => DeviceError::NotFound {
            name: name.to_string(),
        },
        409 => DeviceError::Conflict {
            name: name.to_string(),
            detail: message,
        },
        400 if lower.contains("in use") || lower.contains("referenced") => DeviceError::InUse {
            name: name.to_string(),
            referrers: referrers(name, &message),
        },
        500..=599 => DeviceError::Transient(format!("status {}: {}", status, message)),
        _ => DeviceError::Rejected { status, message },
    }
}

/// Full paths named in an "in use" message, other than the object itself
///
/// `The VLAN (/Common/test-vlan) cannot be deleted because it is in use by
/// a self IP (/Common/test-selfip).` yields `["/Common/test-selfip"]`.
fn referrers(name: &str, message: &str) -> Vec<String> {
    let mut found: Vec<String> = message
        .split(|c: char| c.is_whitespace() || matches!(c, '(' | ')' | ',' | '\'' | '"'))
        .map(|token| token.trim_end_matches(&['.', ';', ':'][..]))
        .filter(|token| token.starts_with('/') && *token != name)
        .filter_map(|token| FullPath::new(token).ok())
        .map(|path| path.to_string())
        .collect();
    found.sort();
    found.dedup();
    found
}

fn transport(err: reqwest::Error) -> DeviceError {
    DeviceError::Transient(format!("iControl request failed: {}", err))
}

/// BIG-IP client over iControl REST
pub struct IControlClient {
    config: DeviceConfig,
    base_url: String,
    client: Client,
}

impl IControlClient {
    /// Build an HTTP client for the configured device
    pub fn new(config: DeviceConfig) -> DeviceResult<Self> {
        let base_url = config.base_url();
        info!("Using iControl REST at {}", base_url);

        let client = Client::builder()
            .timeout(config.timeout())
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()
            .map_err(|e| DeviceError::Rejected {
                status: 0,
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            config,
            base_url,
            client,
        })
    }

    fn object_url(&self, collection: &str, name: &FullPath) -> String {
        format!(
            "{}{}/{}",
            self.base_url,
            collection,
            urlencoding::encode(&name.to_uri_segment())
        )
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        request.basic_auth(&self.config.username, Some(&self.config.password))
    }

    async fn execute(&self, request: RequestBuilder, name: &str) -> DeviceResult<Response> {
        let response = self.authed(request).send().await.map_err(transport)?;
        check(response, name).await
    }

    async fn fetch<T, W>(&self, url: String, name: &FullPath) -> DeviceResult<Option<T>>
    where
        W: DeserializeOwned + Into<T>,
    {
        let response = self
            .authed(self.client.get(&url))
            .send()
            .await
            .map_err(transport)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let wire: W = check(response, name.as_str())
            .await?
            .json()
            .await
            .map_err(transport)?;
        Ok(Some(wire.into()))
    }
}

/// Pass successful responses through, classify the rest
async fn check(response: Response, name: &str) -> DeviceResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.message)
        .unwrap_or(text);
    debug!("iControl returned {} for {}: {}", status, name, message);
    Err(classify(status.as_u16(), name, message))
}

#[async_trait]
impl DeviceClient for IControlClient {
    async fn create_vlan(&self, vlan: &Vlan) -> DeviceResult<VlanRecord> {
        let body = VlanCreate {
            name: vlan.name.short_name().to_string(),
            partition: vlan.name.partition().to_string(),
            tag: vlan.tag.value(),
            interfaces: vlan
                .interfaces
                .iter()
                .map(|iface| WireInterface {
                    name: iface.name.to_string(),
                    tagged: iface.tagged,
                    untagged: !iface.tagged,
                })
                .collect(),
        };

        let url = format!("{}{}", self.base_url, VLAN_PATH);
        self.execute(self.client.post(&url).json(&body), vlan.name.as_str())
            .await?;
        Ok(VlanRecord::from(vlan))
    }

    async fn get_vlan(&self, name: &FullPath) -> DeviceResult<Option<VlanRecord>> {
        let url = format!(
            "{}?expandSubcollections=true",
            self.object_url(VLAN_PATH, name)
        );
        self.fetch::<VlanRecord, VlanResponse>(url, name).await
    }

    async fn delete_vlan(&self, name: &FullPath) -> DeviceResult<()> {
        let url = self.object_url(VLAN_PATH, name);
        self.execute(self.client.delete(&url), name.as_str()).await?;
        Ok(())
    }

    async fn create_self_ip(&self, self_ip: &SelfIp) -> DeviceResult<SelfIpRecord> {
        let body = SelfIpCreate {
            name: self_ip.name.short_name().to_string(),
            partition: self_ip.name.partition().to_string(),
            address: self_ip.address.to_string(),
            vlan: self_ip.vlan.to_string(),
        };

        let url = format!("{}{}", self.base_url, SELF_IP_PATH);
        let response = self
            .execute(self.client.post(&url).json(&body), self_ip.name.as_str())
            .await?;
        let wire: SelfIpResponse = response.json().await.map_err(transport)?;
        Ok(wire.into())
    }

    async fn update_self_ip(
        &self,
        name: &FullPath,
        patch: &SelfIpPatch,
    ) -> DeviceResult<SelfIpRecord> {
        let url = self.object_url(SELF_IP_PATH, name);
        let response = self
            .execute(
                self.client.patch(&url).json(&SelfIpModify::from(patch)),
                name.as_str(),
            )
            .await?;
        let wire: SelfIpResponse = response.json().await.map_err(transport)?;
        Ok(wire.into())
    }

    async fn delete_self_ip(&self, name: &FullPath) -> DeviceResult<()> {
        let url = self.object_url(SELF_IP_PATH, name);
        self.execute(self.client.delete(&url), name.as_str()).await?;
        Ok(())
    }

    async fn get_self_ip(&self, name: &FullPath) -> DeviceResult<Option<SelfIpRecord>> {
        let url = self.object_url(SELF_IP_PATH, name);
        self.fetch::<SelfIpRecord, SelfIpResponse>(url, name).await
    }

    async fn list_self_ips(&self) -> DeviceResult<Vec<SelfIpRecord>> {
        let url = format!("{}{}", self.base_url, SELF_IP_PATH);
        let response = self.execute(self.client.get(&url), SELF_IP_PATH).await?;
        let wire: Collection<SelfIpResponse> = response.json().await.map_err(transport)?;
        Ok(wire.items.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test_case(404, "" ; "not found")]
    #[test_case(409, "already exists" ; "conflict")]
    #[test_case(400, "is referenced by one or more self IPs" ; "in use")]
    #[test_case(503, "service unavailable" ; "transient")]
    #[test_case(401, "unauthorized" ; "rejected")]
    fn test_classify(status: u16, message: &str) {
        let err = classify(status, "/Common/test-vlan", message.to_string());
        let kind = match err {
            DeviceError::NotFound { .. } => 404,
            DeviceError::Conflict { .. } => 409,
            DeviceError::InUse { .. } => 400,
            DeviceError::Transient(_) => 503,
            DeviceError::Rejected { .. } => 401,
        };
        assert_eq!(kind, status);
    }

    #[test]
    fn test_in_use_names_referrers() {
        let err = classify(
            400,
            "/Common/test-vlan",
            "01070621:3: The VLAN (/Common/test-vlan) cannot be deleted because it is in use by a self IP (/Common/test-selfip).".to_string(),
        );
        match err {
            DeviceError::InUse { name, referrers } => {
                assert_eq!(name, "/Common/test-vlan");
                assert_eq!(referrers, vec!["/Common/test-selfip".to_string()]);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_in_use_without_paths_has_no_referrers() {
        let err = classify(400, "/Common/test-vlan", "object is referenced".to_string());
        assert!(matches!(err, DeviceError::InUse { ref referrers, .. } if referrers.is_empty()));
    }

    #[test]
    fn test_plain_bad_request_is_rejected() {
        let err = classify(400, "/Common/test-selfip", "invalid address".to_string());
        assert!(matches!(err, DeviceError::Rejected { status: 400, .. }));
    }

    #[test]
    fn test_vlan_response_to_record() {
        let wire: VlanResponse = serde_json::from_str(
            r#"{
                "kind": "tm:net:vlan:vlanstate",
                "name": "test-vlan",
                "partition": "Common",
                "fullPath": "/Common/test-vlan",
                "tag": 101,
                "interfacesReference": {
                    "items": [
                        { "name": "1.2", "untagged": true },
                        { "name": "1.1", "tagged": true }
                    ]
                }
            }"#,
        )
        .unwrap();

        let record = VlanRecord::from(wire);
        assert_eq!(record.name, "/Common/test-vlan");
        assert_eq!(record.tag, 101);
        assert_eq!(
            record.interfaces,
            vec![
                InterfaceRecord { name: "1.1".to_string(), tagged: true },
                InterfaceRecord { name: "1.2".to_string(), tagged: false },
            ]
        );
    }

    #[test]
    fn test_patch_body_carries_only_changed_fields() {
        let patch = SelfIpPatch {
            address: None,
            vlan: Some(FullPath::new("/Common/other-vlan").unwrap()),
        };
        let json = serde_json::to_value(SelfIpModify::from(&patch)).unwrap();
        assert_eq!(json, serde_json::json!({ "vlan": "/Common/other-vlan" }));
    }

    #[test]
    fn test_object_url_encodes_full_path() {
        let client = IControlClient::new(DeviceConfig {
            host: "10.1.1.245".to_string(),
            ..DeviceConfig::default()
        })
        .unwrap();
        let url = client.object_url(SELF_IP_PATH, &FullPath::new("/Common/test-selfip").unwrap());
        assert_eq!(url, "https://10.1.1.245/mgmt/tm/net/self/~Common~test-selfip");
    }

    #[test]
    fn test_empty_collection() {
        let wire: Collection<SelfIpResponse> =
            serde_json::from_str(r#"{ "kind": "tm:net:self:selfcollectionstate" }"#).unwrap();
        assert!(wire.items.is_empty());
    }
}
