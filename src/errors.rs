use crate::jsonquery::QueryPathError;
use crate::types::{ApiVerb, ResourceRef};
use thiserror::Error;

/// Error type returned by cluster client implementations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum CheckError {
    #[error("cannot create kubeapiserver check: {0}")]
    Configuration(String),

    #[error("invalid api request: {0}")]
    InvalidRequest(String),

    #[error(
        "unable to {verb} kube resource '{resource}', ns: '{namespace}' name: '{name}': {source}"
    )]
    Query {
        verb: ApiVerb,
        resource: ResourceRef,
        namespace: String,
        name: String,
        #[source]
        source: BoxError,
    },

    #[error("unable to report field '{property}' for kubernetes object '{object}': {source}")]
    Extraction {
        property: String,
        object: String,
        #[source]
        source: QueryPathError,
    },

    #[error("unsupported kind value '{0}' for kube resource")]
    UnsupportedRule(String),
}

impl CheckError {
    /// Attach the owning rule id to configuration and request errors.
    pub fn for_rule(self, rule_id: &str) -> Self {
        match self {
            CheckError::Configuration(msg) => {
                CheckError::Configuration(format!("{}, rule: {}", msg, rule_id))
            }
            CheckError::InvalidRequest(msg) => {
                CheckError::InvalidRequest(format!("{}: {}", rule_id, msg))
            }
            other => other,
        }
    }
}
