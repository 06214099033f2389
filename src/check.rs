use crate::errors::CheckError;
use crate::extract::extract_field;
use crate::kubernetes::{ResourceClient, query_resources};
use crate::reporter::Reporter;
use crate::types::{CheckContext, Document, KubernetesResource, KvRecord, ResourceSpec};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const KUBE_RESOURCE_NAME_KEY: &str = "kube_resource_name";
const KUBE_RESOURCE_GROUP_KEY: &str = "kube_resource_group";
const KUBE_RESOURCE_VERSION_KEY: &str = "kube_resource_version";
const KUBE_RESOURCE_NAMESPACE_KEY: &str = "kube_resource_namespace";
const KUBE_RESOURCE_KIND_KEY: &str = "kube_resource_kind";

/// Queries the API server for a resource declaration and reports the configured fields
/// of every matched resource.
pub struct KubeApiserverCheck<C, R> {
    context: CheckContext,
    resource: ResourceSpec,
    client: C,
    reporter: R,
    query_timeout: Option<Duration>,
}

impl<C: ResourceClient, R: Reporter> KubeApiserverCheck<C, R> {
    pub fn new(
        context: CheckContext,
        resource: KubernetesResource,
        client: C,
        reporter: R,
    ) -> Result<Self, CheckError> {
        let resource = ResourceSpec::new(resource).map_err(|e| e.for_rule(&context.rule_id))?;
        Ok(KubeApiserverCheck {
            context,
            resource,
            client,
            reporter,
            query_timeout: None,
        })
    }

    /// Bound the API call with a deadline. `None` waits indefinitely.
    pub fn with_query_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.query_timeout = timeout;
        self
    }

    pub async fn run(&self) -> Result<(), CheckError> {
        let rule_id = &self.context.rule_id;
        debug!("{}: kubeapiserver check: {:?}", rule_id, self.resource);

        let documents = query_resources(&self.client, &self.resource, self.query_timeout)
            .await
            .map_err(|e| e.for_rule(rule_id))?;

        debug!("{}: Got {} resources", rule_id, documents.len());
        for document in &documents {
            self.report_resource(document)?;
        }

        Ok(())
    }

    fn report_resource(&self, document: &Document) -> Result<(), CheckError> {
        let mut kv = KvRecord::new();

        for field in self.resource.report_fields() {
            if let Some((name, value)) = extract_field(field, document)? {
                kv.insert(name, value);
            }
        }

        if kv.is_empty() {
            debug!(
                "{}: Nothing to report for '{}'",
                self.context.rule_id, document
            );
            return Ok(());
        }

        let kind = Some(document.kind())
            .filter(|k| !k.is_empty())
            .unwrap_or(self.resource.kind());
        // A document without apiVersion is in the group/version it was requested from
        let (group, version) = if document.api_version().is_empty() {
            (self.resource.group(), self.resource.version())
        } else {
            (document.group(), document.version())
        };

        kv.insert(KUBE_RESOURCE_KIND_KEY.to_string(), Value::from(kind));
        kv.insert(KUBE_RESOURCE_GROUP_KEY.to_string(), Value::from(group));
        kv.insert(KUBE_RESOURCE_VERSION_KEY.to_string(), Value::from(version));
        kv.insert(
            KUBE_RESOURCE_NAMESPACE_KEY.to_string(),
            Value::from(document.namespace()),
        );
        kv.insert(KUBE_RESOURCE_NAME_KEY.to_string(), Value::from(document.name()));

        self.reporter.report(&self.context, kv);
        Ok(())
    }
}
