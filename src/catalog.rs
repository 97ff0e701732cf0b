//! Action catalog data model
//!
//! Field names follow the published `iam-actions.json` snippet format.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use url::Url;

/// Top-level catalog: service key -> service catalog
pub type Catalog = BTreeMap<String, ServiceCatalog>;

/// All actions of one IAM-capable service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCatalog {
    #[serde(rename = "serviceName")]
    pub service_name: String,
    /// Namespace of the service's actions (e.g. `s3`), if published
    pub service_prefix: Option<String>,
    /// Bare action identifier -> record
    pub actions: BTreeMap<String, ActionRecord>,
    pub reference_url: String,
}

/// One IAM action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecord {
    /// `prefix:Action`, or the bare action when the prefix is unknown
    pub action_name: String,
    pub description: String,
    pub access_level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_types: Option<Vec<LinkRef>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition_keys: Option<Vec<LinkRef>>,
    pub url: String,
}

/// A named hyperlink into the reference documentation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRef {
    pub name: String,
    pub reference_href: String,
}

/// Qualify an action identifier with the service prefix
pub fn qualified_name(prefix: Option<&str>, action: &str) -> String {
    match prefix {
        Some(prefix) => format!("{}:{}", prefix, action),
        None => action.to_string(),
    }
}

/// Catalog key for a service page: file stem of the URL path, without a
/// leading `list_`.
///
/// `.../list_amazons3.html` -> `amazons3`
pub fn service_key(url: &Url) -> String {
    let file_name = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or_default();

    let stem = match file_name.rfind('.') {
        Some(idx) if idx > 0 => &file_name[..idx],
        _ => file_name,
    };

    stem.strip_prefix("list_").unwrap_or(stem).to_string()
}
