//! Shared fixtures for the cell test suites: deterministic JWTs, config
//! builders, canned store documents, and an in-memory `DocumentStore` that
//! enforces the same uniqueness key the real store schema declares.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde_json::{json, Value};
use sha2::Sha256;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::store::Filter;
use shared_database::{DocumentStore, InsertOutcome, StoreError};
use shared_models::auth::{User, UserRole};

pub struct TestConfig {
    pub jwt_secret: String,
    pub docstore_url: String,
    pub docstore_service_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            docstore_url: "http://localhost:54321".to_string(),
            docstore_service_key: "test-service-key".to_string(),
        }
    }
}

impl TestConfig {
    pub fn with_store_url(url: &str) -> Self {
        Self {
            docstore_url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            docstore_url: self.docstore_url.clone(),
            docstore_service_key: self.docstore_service_key.clone(),
            auth_jwt_secret: self.jwt_secret.clone(),
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub role: String,
}

impl TestUser {
    pub fn new(email: &str, role: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            role: role.to_string(),
        }
    }

    pub fn doctor(email: &str) -> Self {
        Self::new(email, "doctor")
    }

    pub fn patient(email: &str) -> Self {
        Self::new(email, "patient")
    }

    pub fn admin(email: &str) -> Self {
        Self::new(email, "admin")
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    pub fn to_user(&self) -> User {
        let role = match self.role.as_str() {
            "doctor" => UserRole::Doctor,
            "patient" => UserRole::Patient,
            "admin" => UserRole::Admin,
            _ => UserRole::Unknown,
        };

        User {
            id: self.id.clone(),
            email: Some(self.email.clone()),
            role,
            created_at: Some(Utc::now()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "sub": user.id,
            "email": user.email,
            "role": user.role,
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

/// Canned store documents in the wire shape the lifecycle service reads.
pub struct MockStoreDocs;

impl MockStoreDocs {
    pub fn appointment(
        id: &str,
        patient_id: &str,
        doctor_id: &str,
        scheduled: DateTime<Utc>,
        status: &str,
        is_immediate: bool,
    ) -> Value {
        json!({
            "id": id,
            "patient_id": patient_id,
            "doctor_id": doctor_id,
            "patient_name": "Test Patient",
            "doctor_name": "Dr. Test",
            "appointment_date": scheduled,
            "status": status,
            "is_immediate": is_immediate,
            "consultation_type": "video",
            "video_call_id": null,
            "consultation_id": null,
            "last_updated": null
        })
    }

    pub fn consultation(
        id: &str,
        appointment_id: &str,
        patient_id: &str,
        doctor_id: &str,
        status: &str,
    ) -> Value {
        let now = Utc::now();
        json!({
            "id": id,
            "appointment_id": appointment_id,
            "patient_id": patient_id,
            "doctor_id": doctor_id,
            "patient_name": "Test Patient",
            "doctor_name": "Dr. Test",
            "scheduled_time": now,
            "start_time": now,
            "end_time": null,
            "status": status,
            "notes": "",
            "consultation_type": "video",
            "video_call_id": format!("call_{}", appointment_id),
            "is_immediate": false,
            "authorized_users": [doctor_id, patient_id],
            "completed_at": null
        })
    }
}

/// In-memory document store. Uniqueness keys mirror the real schema so the
/// concurrent create path exercises the conflict branch.
pub struct MemoryDocumentStore {
    collections: Mutex<HashMap<String, Vec<Value>>>,
    unique_keys: Vec<(String, String)>,
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self {
            collections: Mutex::new(HashMap::new()),
            unique_keys: vec![("consultations".to_string(), "appointment_id".to_string())],
        }
    }
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, collection: &str, document: Value) {
        let mut collections = self.collections.lock().unwrap();
        collections
            .entry(collection.to_string())
            .or_default()
            .push(document);
    }

    pub fn documents(&self, collection: &str) -> Vec<Value> {
        let collections = self.collections.lock().unwrap();
        collections.get(collection).cloned().unwrap_or_default()
    }

    fn field_matches(document: &Value, column: &str, expected: &str) -> bool {
        match document.get(column) {
            Some(Value::String(actual)) => actual == expected,
            Some(Value::Null) | None => false,
            Some(other) => other.to_string() == expected,
        }
    }

    fn matches(document: &Value, filter: Filter<'_>) -> bool {
        filter
            .iter()
            .all(|(column, expected)| Self::field_matches(document, column, expected))
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn find_one(
        &self,
        collection: &str,
        filter: Filter<'_>,
    ) -> Result<Option<Value>, StoreError> {
        let collections = self.collections.lock().unwrap();
        let found = collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| Self::matches(doc, filter)))
            .cloned();
        Ok(found)
    }

    async fn insert_one(&self, collection: &str, document: Value) -> Result<Value, StoreError> {
        let mut collections = self.collections.lock().unwrap();
        collections
            .entry(collection.to_string())
            .or_default()
            .push(document.clone());
        Ok(document)
    }

    async fn insert_unique(
        &self,
        collection: &str,
        document: Value,
    ) -> Result<InsertOutcome, StoreError> {
        let mut collections = self.collections.lock().unwrap();
        let docs = collections.entry(collection.to_string()).or_default();

        for (unique_collection, column) in &self.unique_keys {
            if unique_collection != collection {
                continue;
            }
            let candidate = document
                .get(column)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            if docs
                .iter()
                .any(|doc| Self::field_matches(doc, column, &candidate))
            {
                return Ok(InsertOutcome::Conflict);
            }
        }

        docs.push(document.clone());
        Ok(InsertOutcome::Inserted(document))
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: Filter<'_>,
        patch: Value,
    ) -> Result<u64, StoreError> {
        let mut collections = self.collections.lock().unwrap();
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(0);
        };

        let Some(target) = docs.iter_mut().find(|doc| Self::matches(doc, filter)) else {
            return Ok(0);
        };

        if let (Some(fields), Some(changes)) = (target.as_object_mut(), patch.as_object()) {
            for (key, value) in changes {
                fields.insert(key.clone(), value.clone());
            }
        }

        Ok(1)
    }
}
