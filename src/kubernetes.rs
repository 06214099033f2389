use crate::errors::{BoxError, CheckError};
use crate::types::{ApiVerb, Document, ResourceRef, ResourceSpec};
use crate::utils::list_item_kind;
use kube::api::{ApiResource, DynamicObject, GroupVersionKind, ListParams};
use kube::core::TypeMeta;
use kube::{Api, Client};
use std::future::Future;
use std::time::Duration;

/// The two API server operations a check needs.
pub trait ResourceClient {
    fn get(
        &self,
        resource: &ResourceRef,
        namespace: Option<&str>,
        name: &str,
    ) -> impl Future<Output = Result<Document, BoxError>> + Send;

    fn list(
        &self,
        resource: &ResourceRef,
        namespace: Option<&str>,
    ) -> impl Future<Output = Result<Vec<Document>, BoxError>> + Send;
}

impl<C: ResourceClient + ?Sized> ResourceClient for &C {
    fn get(
        &self,
        resource: &ResourceRef,
        namespace: Option<&str>,
        name: &str,
    ) -> impl Future<Output = Result<Document, BoxError>> + Send {
        (**self).get(resource, namespace, name)
    }

    fn list(
        &self,
        resource: &ResourceRef,
        namespace: Option<&str>,
    ) -> impl Future<Output = Result<Vec<Document>, BoxError>> + Send {
        (**self).list(resource, namespace)
    }
}

/// `ResourceClient` backed by the dynamic API of a `kube::Client`.
#[derive(Clone)]
pub struct KubeResourceClient {
    client: Client,
}

impl KubeResourceClient {
    pub fn new(client: Client) -> Self {
        KubeResourceClient { client }
    }

    fn api(&self, resource: &ResourceRef, namespace: Option<&str>) -> Api<DynamicObject> {
        let gvk = GroupVersionKind::gvk(&resource.group, &resource.version, &resource.kind);
        let api_resource = ApiResource::from_gvk_with_plural(&gvk, &resource.kind);
        match namespace {
            Some(ns) => Api::namespaced_with(self.client.clone(), ns, &api_resource),
            None => Api::all_with(self.client.clone(), &api_resource),
        }
    }
}

fn to_document(object: DynamicObject) -> Result<Document, BoxError> {
    Ok(Document::new(serde_json::to_value(object)?))
}

impl ResourceClient for KubeResourceClient {
    async fn get(
        &self,
        resource: &ResourceRef,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<Document, BoxError> {
        let object = self.api(resource, namespace).get(name).await?;
        to_document(object)
    }

    async fn list(
        &self,
        resource: &ResourceRef,
        namespace: Option<&str>,
    ) -> Result<Vec<Document>, BoxError> {
        let list = self
            .api(resource, namespace)
            .list(&ListParams::default())
            .await?;

        // List items come back without apiVersion/kind; take them from the list itself
        let types = TypeMeta {
            api_version: list.types.api_version.clone(),
            kind: list_item_kind(&list.types.kind).to_string(),
        };
        list.items
            .into_iter()
            .map(|mut item| {
                if item.types.is_none() && !types.kind.is_empty() {
                    item.types = Some(types.clone());
                }
                to_document(item)
            })
            .collect()
    }
}

async fn with_deadline<T>(
    deadline: Option<Duration>,
    request: impl Future<Output = Result<T, BoxError>>,
) -> Result<T, BoxError> {
    match deadline {
        Some(limit) => tokio::time::timeout(limit, request).await?,
        None => request.await,
    }
}

/// Run the single API call described by `spec`.
pub async fn query_resources<C: ResourceClient>(
    client: &C,
    spec: &ResourceSpec,
    deadline: Option<Duration>,
) -> Result<Vec<Document>, CheckError> {
    let request = spec.api_request();
    let query_error = |source: BoxError| CheckError::Query {
        verb: request.verb,
        resource: spec.resource().clone(),
        namespace: spec.namespace().unwrap_or_default().to_string(),
        name: request.resource_name.clone(),
        source,
    };

    match request.verb {
        ApiVerb::Get => {
            if request.resource_name.is_empty() {
                return Err(CheckError::InvalidRequest(
                    "unable to use 'get' apirequest without resource name".into(),
                ));
            }
            let document = with_deadline(
                deadline,
                client.get(spec.resource(), spec.namespace(), &request.resource_name),
            )
            .await
            .map_err(query_error)?;
            Ok(vec![document])
        }
        ApiVerb::List => with_deadline(deadline, client.list(spec.resource(), spec.namespace()))
            .await
            .map_err(query_error),
    }
}
