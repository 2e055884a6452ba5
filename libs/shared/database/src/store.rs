use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method, StatusCode,
};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

use shared_config::AppConfig;

/// Equality filter: column name -> required value.
pub type Filter<'a> = &'a [(&'a str, String)];

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("store error ({status}): {message}")]
    Response { status: u16, message: String },

    #[error("malformed store document: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Result of a conditional insert against a store uniqueness constraint.
#[derive(Debug)]
pub enum InsertOutcome {
    Inserted(Value),
    Conflict,
}

/// Key-based access to the backing document collections. Implementations
/// must apply single-document writes atomically; `update_one` patches the
/// first document matching every filter pair and reports how many matched.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find_one(&self, collection: &str, filter: Filter<'_>)
        -> Result<Option<Value>, StoreError>;

    async fn insert_one(&self, collection: &str, document: Value) -> Result<Value, StoreError>;

    /// Insert relying on the collection's uniqueness constraint; a duplicate
    /// key maps to `InsertOutcome::Conflict` instead of an error.
    async fn insert_unique(
        &self,
        collection: &str,
        document: Value,
    ) -> Result<InsertOutcome, StoreError>;

    async fn update_one(
        &self,
        collection: &str,
        filter: Filter<'_>,
        patch: Value,
    ) -> Result<u64, StoreError>;
}

/// REST document store client. Collections are exposed under
/// `/rest/v1/{collection}` with `column=eq.value` filtering; writes return
/// their representation so callers can read back generated fields.
pub struct HttpDocumentStore {
    client: Client,
    base_url: String,
    service_key: String,
}

impl HttpDocumentStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.docstore_url.clone(),
            service_key: config.docstore_service_key.clone(),
        }
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();

        headers.insert("apikey", HeaderValue::from_str(&self.service_key).unwrap());
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.service_key)).unwrap(),
        );
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        headers
    }

    fn eq_params(filter: Filter<'_>) -> Vec<(String, String)> {
        filter
            .iter()
            .map(|(column, value)| (column.to_string(), format!("eq.{}", value)))
            .collect()
    }

    async fn request_rows(
        &self,
        method: Method,
        collection: &str,
        query: &[(String, String)],
        body: Option<Value>,
    ) -> Result<Vec<Value>, StoreError> {
        let url = format!("{}/rest/v1/{}", self.base_url, collection);
        debug!("Store request {} {}", method, url);

        let mut req = self
            .client
            .request(method, &url)
            .headers(self.headers())
            .query(query);

        if let Some(body) = body {
            req = req.json(&body);
        }

        let response = req.send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            error!("Store error ({}): {}", status, message);
            return Err(StoreError::Response {
                status: status.as_u16(),
                message,
            });
        }

        let rows = response.json::<Vec<Value>>().await?;
        Ok(rows)
    }
}

#[async_trait]
impl DocumentStore for HttpDocumentStore {
    async fn find_one(
        &self,
        collection: &str,
        filter: Filter<'_>,
    ) -> Result<Option<Value>, StoreError> {
        let mut query = Self::eq_params(filter);
        query.push(("limit".to_string(), "1".to_string()));

        let rows = self
            .request_rows(Method::GET, collection, &query, None)
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn insert_one(&self, collection: &str, document: Value) -> Result<Value, StoreError> {
        let rows = self
            .request_rows(Method::POST, collection, &[], Some(document))
            .await?;

        rows.into_iter().next().ok_or(StoreError::Response {
            status: 500,
            message: "insert returned no representation".to_string(),
        })
    }

    async fn insert_unique(
        &self,
        collection: &str,
        document: Value,
    ) -> Result<InsertOutcome, StoreError> {
        match self
            .request_rows(Method::POST, collection, &[], Some(document))
            .await
        {
            Ok(rows) => {
                let row = rows.into_iter().next().ok_or(StoreError::Response {
                    status: 500,
                    message: "insert returned no representation".to_string(),
                })?;
                Ok(InsertOutcome::Inserted(row))
            }
            Err(StoreError::Response { status, .. })
                if status == StatusCode::CONFLICT.as_u16() =>
            {
                debug!("Unique insert into {} lost to a concurrent writer", collection);
                Ok(InsertOutcome::Conflict)
            }
            Err(e) => Err(e),
        }
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: Filter<'_>,
        patch: Value,
    ) -> Result<u64, StoreError> {
        let query = Self::eq_params(filter);
        let rows = self
            .request_rows(Method::PATCH, collection, &query, Some(patch))
            .await?;
        Ok(rows.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn store_for(server: &MockServer) -> HttpDocumentStore {
        HttpDocumentStore::new(&AppConfig {
            docstore_url: server.uri(),
            docstore_service_key: "service-key".to_string(),
            auth_jwt_secret: "unused".to_string(),
        })
    }

    #[tokio::test]
    async fn find_one_returns_first_match() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/appointments"))
            .and(query_param("id", "eq.a1"))
            .and(query_param("limit", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "a1"}])))
            .mount(&server)
            .await;

        let store = store_for(&server);
        let found = store
            .find_one("appointments", &[("id", "a1".to_string())])
            .await
            .unwrap();

        assert_eq!(found.unwrap()["id"], "a1");
    }

    #[tokio::test]
    async fn find_one_absent_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/consultations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let store = store_for(&server);
        let found = store
            .find_one("consultations", &[("id", "missing".to_string())])
            .await
            .unwrap();

        assert!(found.is_none());
    }

    #[tokio::test]
    async fn insert_unique_maps_conflict() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/consultations"))
            .respond_with(ResponseTemplate::new(409).set_body_string("duplicate key"))
            .mount(&server)
            .await;

        let store = store_for(&server);
        let outcome = store
            .insert_unique("consultations", json!({"appointment_id": "a1"}))
            .await
            .unwrap();

        assert_matches!(outcome, InsertOutcome::Conflict);
    }

    #[tokio::test]
    async fn update_one_reports_matched_count() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/consultations"))
            .and(query_param("id", "eq.c1"))
            .and(query_param("doctor_id", "eq.d1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "c1"}])))
            .mount(&server)
            .await;

        let store = store_for(&server);
        let matched = store
            .update_one(
                "consultations",
                &[("id", "c1".to_string()), ("doctor_id", "d1".to_string())],
                json!({"status": "completed"}),
            )
            .await
            .unwrap();

        assert_eq!(matched, 1);
    }

    #[tokio::test]
    async fn update_one_zero_matches() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/consultations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let store = store_for(&server);
        let matched = store
            .update_one(
                "consultations",
                &[("id", "c1".to_string())],
                json!({"notes": ""}),
            )
            .await
            .unwrap();

        assert_eq!(matched, 0);
    }

    #[tokio::test]
    async fn server_error_propagates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/appointments"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let store = store_for(&server);
        let err = store
            .find_one("appointments", &[("id", "a1".to_string())])
            .await
            .unwrap_err();

        assert_matches!(err, StoreError::Response { status: 500, .. });
    }
}
