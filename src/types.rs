use crate::errors::CheckError;
use crate::utils::split_api_version;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Version used when a resource declaration leaves it empty.
pub const DEFAULT_VERSION: &str = "v1";

/// Flat key-value evidence produced for one matched resource.
pub type KvRecord = BTreeMap<String, Value>;

/// Raw resource declaration, as read from a rules file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KubernetesResource {
    pub kind: String,
    pub group: String,
    pub version: String,
    pub namespace: String,
    pub api_request: KubernetesApiRequest,
    #[serde(alias = "reportFields")]
    pub report: Vec<ReportField>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KubernetesApiRequest {
    pub verb: String,
    pub resource_name: String,
}

/// One field to pull out of a matched resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportField {
    pub kind: String,
    pub property: String,
    #[serde(rename = "as", skip_serializing_if = "Option::is_none")]
    pub rename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl ReportField {
    /// Output key: the rename when set, the property otherwise.
    pub fn report_name(&self) -> &str {
        self.rename
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.property)
    }

    /// Literal value replacing whatever the query produced.
    pub fn literal_value(&self) -> Option<&str> {
        self.value.as_deref().filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiVerb {
    Get,
    List,
}

impl ApiVerb {
    fn parse(verb: &str) -> Option<Self> {
        match verb {
            "get" => Some(ApiVerb::Get),
            "list" => Some(ApiVerb::List),
            _ => None,
        }
    }
}

impl fmt::Display for ApiVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiVerb::Get => f.write_str("get"),
            ApiVerb::List => f.write_str("list"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub verb: ApiVerb,
    pub resource_name: String,
}

/// Group, version and resource type addressing a collection on the API server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef {
    pub group: String,
    pub version: String,
    pub kind: String,
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group.is_empty() {
            write!(f, "{}, Resource={}", self.version, self.kind)
        } else {
            write!(f, "{}/{}, Resource={}", self.group, self.version, self.kind)
        }
    }
}

/// Validated resource declaration. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSpec {
    resource: ResourceRef,
    namespace: Option<String>,
    api_request: ApiRequest,
    report_fields: Vec<ReportField>,
}

impl ResourceSpec {
    pub fn new(raw: KubernetesResource) -> Result<Self, CheckError> {
        if raw.kind.is_empty() {
            return Err(CheckError::Configuration("resource kind is empty".into()));
        }
        if raw.api_request.verb.is_empty() {
            return Err(CheckError::Configuration("action verb is empty".into()));
        }
        let verb = ApiVerb::parse(&raw.api_request.verb).ok_or_else(|| {
            CheckError::Configuration(format!(
                "unsupported action verb '{}', expected 'get' or 'list'",
                raw.api_request.verb
            ))
        })?;

        let version = if raw.version.is_empty() {
            DEFAULT_VERSION.to_string()
        } else {
            raw.version
        };

        Ok(ResourceSpec {
            resource: ResourceRef {
                group: raw.group,
                version,
                kind: raw.kind,
            },
            namespace: Some(raw.namespace).filter(|ns| !ns.is_empty()),
            api_request: ApiRequest {
                verb,
                resource_name: raw.api_request.resource_name,
            },
            report_fields: raw.report,
        })
    }

    pub fn resource(&self) -> &ResourceRef {
        &self.resource
    }

    pub fn kind(&self) -> &str {
        &self.resource.kind
    }

    pub fn group(&self) -> &str {
        &self.resource.group
    }

    pub fn version(&self) -> &str {
        &self.resource.version
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn api_request(&self) -> &ApiRequest {
        &self.api_request
    }

    pub fn report_fields(&self) -> &[ReportField] {
        &self.report_fields
    }
}

/// A resource instance returned by the API server, kept as an untyped JSON tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Document(Value);

impl Document {
    pub fn new(object: Value) -> Self {
        Document(object)
    }

    pub fn object(&self) -> &Value {
        &self.0
    }

    fn str_at(&self, pointer: &str) -> &str {
        self.0.pointer(pointer).and_then(Value::as_str).unwrap_or("")
    }

    pub fn kind(&self) -> &str {
        self.str_at("/kind")
    }

    pub fn api_version(&self) -> &str {
        self.str_at("/apiVersion")
    }

    pub fn group(&self) -> &str {
        split_api_version(self.api_version()).0
    }

    pub fn version(&self) -> &str {
        split_api_version(self.api_version()).1
    }

    pub fn namespace(&self) -> &str {
        self.str_at("/metadata/namespace")
    }

    pub fn name(&self) -> &str {
        self.str_at("/metadata/name")
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, Kind={} / {} / {}",
            self.api_version(),
            self.kind(),
            self.namespace(),
            self.name()
        )
    }
}

/// Evidence context handed to the reporter along with each record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckContext {
    pub rule_id: String,
}

impl CheckContext {
    pub fn new(rule_id: impl Into<String>) -> Self {
        CheckContext {
            rule_id: rule_id.into(),
        }
    }
}
