use std::sync::Arc;
use std::time::Duration;

use futures_util::future::try_join_all;
use reqwest::{RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::auth::{ApiError, AuthProvider};
use crate::data::errors::DataError;
use crate::data::router::{ListRoute, list_route, resource_alias};
use crate::session::CookieJar;

const TOTAL_COUNT_HEADER: &str = "x-total-count";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListResult {
    pub data: Vec<Value>,
    pub total: usize,
}

/// CRUD over the console's named resources on the record data service.
///
/// Failed calls are offered to the auth lifecycle first. When it rejects, the
/// caller gets [`DataError::Auth`] and must send the user to login.
pub struct RecordService {
    backend_url: String,
    client: reqwest::Client,
    auth: Arc<dyn AuthProvider>,
}

impl RecordService {
    /// A service whose requests carry the cookies of `jar`
    pub fn new(
        backend_url: impl Into<String>,
        jar: &CookieJar,
        auth: Arc<dyn AuthProvider>,
    ) -> Result<Self, DataError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .cookie_provider(jar.store())
            .build()
            .map_err(|e| DataError::Http(e.to_string()))?;

        Ok(Self {
            backend_url: backend_url.into().trim_end_matches('/').to_string(),
            client,
            auth,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.backend_url, path.trim_start_matches('/'))
    }

    fn record_url(&self, resource: &str, id: &str) -> String {
        self.url(&format!("{resource}/{}", urlencoding::encode(id)))
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Response, DataError> {
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("Data request failed: {}", e);
                self.auth.check_error(ApiError::network()).await?;
                return Err(DataError::Http(e.to_string()));
            }
        };

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        tracing::debug!("Data request answered {}", status);
        self.auth
            .check_error(ApiError::with_status(status.as_u16()))
            .await?;
        Err(DataError::Status(status))
    }

    #[tracing::instrument(skip(self, filter, params))]
    pub async fn get_list(
        &self,
        resource: &str,
        filter: &Map<String, Value>,
        params: &[(String, String)],
    ) -> Result<ListResult, DataError> {
        let route = list_route(resource, filter);
        if let ListRoute::SubjectClass { .. } = route {
            return Ok(self.fetch_subject_classes(&route).await);
        }

        let mut query = filter_query(filter);
        query.extend(params.iter().cloned());
        self.fetch_list(&route.path(), &query).await
    }

    /// Records of `resource` whose `target` field points at `id`
    #[tracing::instrument(skip(self, filter, params))]
    pub async fn get_many_reference(
        &self,
        resource: &str,
        target: &str,
        id: &str,
        filter: &Map<String, Value>,
        params: &[(String, String)],
    ) -> Result<ListResult, DataError> {
        let mut query = filter_query(filter);
        query.push((target.to_string(), id.to_string()));
        query.extend(params.iter().cloned());
        self.fetch_list(resource, &query).await
    }

    async fn fetch_list(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<ListResult, DataError> {
        let response = self
            .execute(self.client.get(self.url(path)).query(query))
            .await?;

        let total = response
            .headers()
            .get(TOTAL_COUNT_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<usize>().ok());

        let data = read_json_array(response).await?;
        let total = total.unwrap_or(data.len());
        Ok(ListResult { data, total })
    }

    /// Subject classes are best effort: any failure is an empty list.
    async fn fetch_subject_classes(&self, route: &ListRoute) -> ListResult {
        let url = self.url(&route.path());
        tracing::debug!("Subject class lookup: {}", url);

        let result = match self.client.get(&url).send().await {
            Ok(response) if response.status().is_success() => read_json_array(response).await,
            Ok(response) => Err(DataError::Status(response.status())),
            Err(e) => Err(DataError::Http(e.to_string())),
        };

        match result {
            Ok(data) => ListResult {
                total: data.len(),
                data,
            },
            Err(e) => {
                tracing::warn!("Subject class lookup failed: {}", e);
                ListResult {
                    data: Vec::new(),
                    total: 0,
                }
            }
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_one(&self, resource: &str, id: &str) -> Result<Value, DataError> {
        let response = self
            .execute(self.client.get(self.record_url(resource, id)))
            .await?;
        read_json(response).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_many(&self, resource: &str, ids: &[String]) -> Result<Vec<Value>, DataError> {
        let query: Vec<(&str, &str)> = ids.iter().map(|id| ("id", id.as_str())).collect();
        let response = self
            .execute(
                self.client
                    .get(self.url(resource_alias(resource)))
                    .query(&query),
            )
            .await?;
        read_json_array(response).await
    }

    #[tracing::instrument(skip(self, data))]
    pub async fn create(&self, resource: &str, data: &Value) -> Result<Value, DataError> {
        let response = self
            .execute(self.client.post(self.url(resource)).json(data))
            .await?;
        read_json(response).await
    }

    #[tracing::instrument(skip(self, data))]
    pub async fn update(&self, resource: &str, id: &str, data: &Value) -> Result<Value, DataError> {
        let response = self
            .execute(self.client.put(self.record_url(resource, id)).json(data))
            .await?;
        read_json(response).await
    }

    /// Apply `data` to every record in `ids`, one request each, returning the updated ids
    #[tracing::instrument(skip(self, data))]
    pub async fn update_many(
        &self,
        resource: &str,
        ids: &[String],
        data: &Value,
    ) -> Result<Vec<Value>, DataError> {
        try_join_all(ids.iter().map(|id| async move {
            let record = self.update(resource, id, data).await?;
            Ok::<_, DataError>(record_id(record, id))
        }))
        .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, resource: &str, id: &str) -> Result<Value, DataError> {
        let response = self
            .execute(self.client.delete(self.record_url(resource, id)))
            .await?;
        read_json(response).await
    }

    /// Delete every record in `ids`, one request each, returning the deleted ids
    #[tracing::instrument(skip(self))]
    pub async fn delete_many(
        &self,
        resource: &str,
        ids: &[String],
    ) -> Result<Vec<Value>, DataError> {
        try_join_all(ids.iter().map(|id| async move {
            let record = self.delete(resource, id).await?;
            Ok::<_, DataError>(record_id(record, id))
        }))
        .await
    }
}

fn filter_query(filter: &Map<String, Value>) -> Vec<(String, String)> {
    filter
        .iter()
        .map(|(key, value)| (key.clone(), query_value(value)))
        .collect()
}

/// The `id` the backend answered with, or the requested one when it has none
fn record_id(record: Value, requested: &str) -> Value {
    match record {
        Value::Object(mut fields) => fields
            .remove("id")
            .unwrap_or_else(|| Value::String(requested.to_string())),
        _ => Value::String(requested.to_string()),
    }
}

fn query_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Response body as JSON, `Null` for an empty body
async fn read_json(response: Response) -> Result<Value, DataError> {
    let body = response
        .text()
        .await
        .map_err(|e| DataError::Http(e.to_string()))?;
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&body)?)
}

async fn read_json_array(response: Response) -> Result<Vec<Value>, DataError> {
    match read_json(response).await? {
        Value::Array(items) => Ok(items),
        Value::Null => Ok(Vec::new()),
        other => Err(DataError::Json(format!("Expected a JSON array, got: {other}"))),
    }
}
