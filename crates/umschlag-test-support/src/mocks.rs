//! In-memory [`ClientApi`] that records every request it receives.
//!
//! Responses are looked up by request path (e.g. `/api/registries/hub`), so
//! tests seed exactly the records a command is expected to read and then
//! assert on [`FakeClient::calls`].

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use umschlag_client::models::{Credentials, Profile, ProfilePayload, Registry, Token};
use umschlag_client::{
    ClientApi, ClientError, ClientResult, MemberParams, Relation, Resource, Writable,
};

const PROFILE_SELF: &str = "/api/profile/self";
const PROFILE_TOKEN: &str = "/api/profile/token";
const AUTH_LOGIN: &str = "/api/auth/login";

/// One request issued against the fake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    /// HTTP verb the real client would have used.
    pub method: &'static str,
    /// Request path including the `/api` prefix.
    pub path: String,
    /// JSON body, when the request carries one.
    pub body: Option<Value>,
}

impl Call {
    /// Whether the request would modify server state.
    #[must_use]
    pub fn is_write(&self) -> bool {
        self.method != "GET"
    }
}

#[derive(Default)]
struct State {
    records: HashMap<String, Value>,
    failures: HashMap<(Option<&'static str>, String), (u16, String)>,
    calls: Vec<Call>,
    next_id: i64,
}

/// Recording test double for [`ClientApi`].
#[derive(Default)]
pub struct FakeClient {
    token: Option<String>,
    state: Mutex<State>,
}

impl FakeClient {
    /// Anonymous fake without any records.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fake that behaves as if configured with `token`.
    #[must_use]
    pub fn authenticated(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            ..Self::default()
        }
    }

    /// Serve `value` for requests to `path`.
    #[must_use]
    pub fn with_record(self, path: impl Into<String>, value: impl Serialize) -> Self {
        self.insert(path, value);
        self
    }

    /// Serve `record` at `/api/{collection}/{id}`.
    #[must_use]
    pub fn seed<K: Resource>(self, id: &str, record: &K) -> Self {
        self.with_record(record_path::<K>(id), record)
    }

    /// Serve `records` at `/api/{collection}`.
    #[must_use]
    pub fn seed_list<K: Resource>(self, records: &[K]) -> Self {
        self.with_record(collection_path::<K>(), records)
    }

    /// Answer every request to `path` with an error envelope.
    #[must_use]
    pub fn fail(self, path: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        self.lock()
            .failures
            .insert((None, path.into()), (status, message.into()));
        self
    }

    /// Answer requests with `method` to `path` with an error envelope.
    #[must_use]
    pub fn fail_on(
        self,
        method: &'static str,
        path: impl Into<String>,
        status: u16,
        message: impl Into<String>,
    ) -> Self {
        self.lock()
            .failures
            .insert((Some(method), path.into()), (status, message.into()));
        self
    }

    /// Store or replace the value served for `path`.
    pub fn insert(&self, path: impl Into<String>, value: impl Serialize) {
        self.lock().records.insert(path.into(), to_body(&value));
    }

    /// Value currently served for `path`.
    #[must_use]
    pub fn record(&self, path: &str) -> Option<Value> {
        self.lock().records.get(path).cloned()
    }

    /// Every request received so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    /// Requests that would have modified server state.
    #[must_use]
    pub fn writes(&self) -> Vec<Call> {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.is_write())
            .cloned()
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn request(
        &self,
        method: &'static str,
        path: String,
        body: Option<Value>,
    ) -> ClientResult<Option<Value>> {
        let mut state = self.lock();
        state.calls.push(Call {
            method,
            path: path.clone(),
            body,
        });

        let failure = state
            .failures
            .get(&(Some(method), path.clone()))
            .or_else(|| state.failures.get(&(None, path.clone())));
        if let Some((status, message)) = failure {
            return Err(ClientError::Api {
                status: *status,
                message: message.clone(),
            });
        }
        Ok(state.records.get(&path).cloned())
    }

    fn write_back(&self, path: String, patch: Value) -> Value {
        let mut state = self.lock();
        let current = state.records.get(&path).cloned().unwrap_or_else(|| json!({}));
        let merged = merge(current, patch);
        state.records.insert(path, merged.clone());
        merged
    }

    fn next_id(&self) -> i64 {
        let mut state = self.lock();
        state.next_id += 1;
        state.next_id
    }
}

#[async_trait]
impl ClientApi for FakeClient {
    async fn is_authenticated(&self) -> ClientResult<bool> {
        if self.token.is_none() {
            return Ok(false);
        }
        match self.request("GET", PROFILE_TOKEN.to_string(), None) {
            Ok(_) => Ok(true),
            Err(ClientError::Api { status: 401, .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }

    async fn auth_login(&self, username: &str, password: &str) -> ClientResult<Token> {
        let credentials = Credentials {
            username: username.to_string(),
            password: password.to_string(),
        };
        let stored = self.request("POST", AUTH_LOGIN.to_string(), Some(to_body(&credentials)))?;
        decode(stored.unwrap_or_else(|| json!({ "token": format!("{username}-token") })))
    }

    async fn profile_token(&self) -> ClientResult<Token> {
        let stored = self.request("GET", PROFILE_TOKEN.to_string(), None)?;
        decode(stored.unwrap_or_else(|| json!({ "token": self.token.clone().unwrap_or_default() })))
    }

    async fn profile_get(&self) -> ClientResult<Profile> {
        let stored = self.request("GET", PROFILE_SELF.to_string(), None)?;
        decode(stored.ok_or_else(not_found)?)
    }

    async fn profile_update(&self, payload: &ProfilePayload) -> ClientResult<Profile> {
        let body = to_body(payload);
        self.request("PUT", PROFILE_SELF.to_string(), Some(body.clone()))?;
        decode(self.write_back(PROFILE_SELF.to_string(), body))
    }

    async fn list<K: Resource>(&self) -> ClientResult<Vec<K>> {
        let stored = self.request("GET", collection_path::<K>(), None)?;
        decode(stored.unwrap_or_else(|| json!([])))
    }

    async fn get<K: Resource>(&self, id: &str) -> ClientResult<K> {
        let stored = self.request("GET", record_path::<K>(id), None)?;
        decode(stored.ok_or_else(not_found)?)
    }

    async fn create<K: Writable>(&self, payload: &K::Payload) -> ClientResult<K> {
        let body = to_body(payload);
        self.request("POST", collection_path::<K>(), Some(body.clone()))?;
        let created = merge(json!({ "id": self.next_id() }), body);
        decode(created)
    }

    async fn update<K: Writable>(&self, id: &str, payload: &K::Payload) -> ClientResult<K> {
        let body = to_body(payload);
        self.request("PATCH", record_path::<K>(id), Some(body.clone()))?;
        decode(self.write_back(record_path::<K>(id), body))
    }

    async fn delete<K: Resource>(&self, id: &str) -> ClientResult<()> {
        let path = record_path::<K>(id);
        self.request("DELETE", path.clone(), None)?;
        self.lock().records.remove(&path);
        Ok(())
    }

    async fn registry_sync(&self, id: &str) -> ClientResult<()> {
        let path = format!("{}/sync", record_path::<Registry>(id));
        self.request("POST", path, None).map(drop)
    }

    async fn member_list<R: Relation>(&self, parent: &str) -> ClientResult<Vec<R::Record>> {
        let stored = self.request("GET", member_path::<R>(parent), None)?;
        decode(stored.unwrap_or_else(|| json!([])))
    }

    async fn member_append<R: Relation>(&self, params: &MemberParams<R>) -> ClientResult<()> {
        self.request("POST", member_path::<R>(&params.parent), Some(to_body(params)))
            .map(drop)
    }

    async fn member_perm<R: Relation>(&self, params: &MemberParams<R>) -> ClientResult<()> {
        self.request("PUT", member_path::<R>(&params.parent), Some(to_body(params)))
            .map(drop)
    }

    async fn member_remove<R: Relation>(&self, params: &MemberParams<R>) -> ClientResult<()> {
        self.request("DELETE", member_path::<R>(&params.parent), Some(to_body(params)))
            .map(drop)
    }
}

fn collection_path<K: Resource>() -> String {
    format!("/api/{}", K::COLLECTION)
}

fn record_path<K: Resource>(id: &str) -> String {
    format!("/api/{}/{id}", K::COLLECTION)
}

fn member_path<R: Relation>(parent: &str) -> String {
    format!(
        "/api/{}/{parent}/{}",
        <R::Parent as Resource>::COLLECTION,
        <R::Child as Resource>::COLLECTION
    )
}

fn to_body<T: Serialize + ?Sized>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

fn decode<T: DeserializeOwned>(value: Value) -> ClientResult<T> {
    serde_json::from_value(value).map_err(|source| ClientError::Decode { source })
}

fn not_found() -> ClientError {
    ClientError::Api {
        status: 404,
        message: "not found".to_string(),
    }
}

fn merge(mut target: Value, patch: Value) -> Value {
    if let (Value::Object(fields), Value::Object(changes)) = (&mut target, patch) {
        for (key, value) in changes {
            if !value.is_null() {
                fields.insert(key, value);
            }
        }
    }
    target
}
