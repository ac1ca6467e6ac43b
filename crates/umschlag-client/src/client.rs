//! reqwest-backed implementation of [`ClientApi`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, Response, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use umschlag_api_models::{Credentials, Profile, ProfilePayload, Token};

use crate::api::ClientApi;
use crate::error::{ClientError, ClientResult};
use crate::resource::{MemberParams, Relation, Resource, Writable};

/// User agent sent with every request.
pub const USER_AGENT: &str = "Umschlag CLI";
/// Request timeout applied unless the builder overrides it.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const HEADER_REQUEST_ID: &str = "x-request-id";
const PROFILE_SELF: &[&str] = &["profile", "self"];
const PROFILE_TOKEN: &[&str] = &["profile", "token"];
const AUTH_LOGIN: &[&str] = &["auth", "login"];
const NO_BODY: Option<&()> = None;

/// Configures a [`DefaultClient`].
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    server: String,
    token: Option<String>,
    timeout: Duration,
    request_id: Option<String>,
}

impl ClientBuilder {
    /// Start from the server address, e.g. `https://umschlag.example.com`.
    #[must_use]
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            token: None,
            timeout: DEFAULT_TIMEOUT,
            request_id: None,
        }
    }

    /// Authenticate every request with a bearer token.
    #[must_use]
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Per-request timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Value of the `x-request-id` header attached to every request.
    #[must_use]
    pub fn request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Validate the configuration and construct the client.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidServer`] when the address is not an absolute
    /// `http`/`https` URL, [`ClientError::InvalidToken`] or
    /// [`ClientError::InvalidRequestId`] when those values cannot be sent as
    /// headers, and [`ClientError::Transport`] when the TLS backend fails to
    /// initialise.
    pub fn build(self) -> ClientResult<DefaultClient> {
        let base = parse_server(&self.server)?;

        let mut headers = HeaderMap::new();
        if let Some(token) = &self.token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| ClientError::InvalidToken)?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        if let Some(request_id) = &self.request_id {
            let value =
                HeaderValue::from_str(request_id).map_err(|_| ClientError::InvalidRequestId)?;
            headers.insert(HeaderName::from_static(HEADER_REQUEST_ID), value);
        }

        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(self.timeout)
            .default_headers(headers)
            .build()?;

        Ok(DefaultClient {
            http,
            base,
            token: self.token,
        })
    }
}

/// Client talking to a live Umschlag server.
#[derive(Debug, Clone)]
pub struct DefaultClient {
    http: Client,
    base: Url,
    token: Option<String>,
}

impl DefaultClient {
    /// Anonymous client for `server`.
    ///
    /// # Errors
    ///
    /// See [`ClientBuilder::build`].
    pub fn new(server: &str) -> ClientResult<Self> {
        ClientBuilder::new(server).build()
    }

    /// Client authenticating every request with `token`.
    ///
    /// # Errors
    ///
    /// See [`ClientBuilder::build`].
    pub fn with_token(server: &str, token: &str) -> ClientResult<Self> {
        ClientBuilder::new(server).token(token).build()
    }

    /// Builder for finer control over the client.
    #[must_use]
    pub fn builder(server: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(server)
    }

    /// Server address requests are resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, segments: &[&str]) -> ClientResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::InvalidServer {
                server: self.base.to_string(),
                reason: "address cannot be a base URL".to_string(),
            })?
            .pop_if_empty()
            .push("api")
            .extend(segments);
        Ok(url)
    }

    async fn send<B>(&self, method: Method, segments: &[&str], body: Option<&B>) -> ClientResult<Response>
    where
        B: Serialize + ?Sized + Sync,
    {
        let url = self.endpoint(segments)?;
        debug!(method = %method, url = %url, "sending API request");

        let mut request = self.http.request(method.clone(), url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;

        let status = response.status().as_u16();
        if status > 300 {
            let bytes = response.bytes().await?;
            let error = ClientError::from_body(status, &bytes);
            debug!(method = %method, status, error = %error, "API request failed");
            return Err(error);
        }
        Ok(response)
    }

    async fn fetch<T, B>(&self, method: Method, segments: &[&str], body: Option<&B>) -> ClientResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized + Sync,
    {
        let response = self.send(method, segments, body).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|source| ClientError::Decode { source })
    }

    async fn execute<B>(&self, method: Method, segments: &[&str], body: Option<&B>) -> ClientResult<()>
    where
        B: Serialize + ?Sized + Sync,
    {
        self.send(method, segments, body).await.map(drop)
    }
}

#[async_trait]
impl ClientApi for DefaultClient {
    async fn is_authenticated(&self) -> ClientResult<bool> {
        if self.token.is_none() {
            return Ok(false);
        }
        match self.execute(Method::GET, PROFILE_TOKEN, NO_BODY).await {
            Ok(()) => Ok(true),
            Err(ClientError::Api { status: 401, .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }

    async fn auth_login(&self, username: &str, password: &str) -> ClientResult<Token> {
        let credentials = Credentials {
            username: username.to_string(),
            password: password.to_string(),
        };
        self.fetch(Method::POST, AUTH_LOGIN, Some(&credentials))
            .await
    }

    async fn profile_token(&self) -> ClientResult<Token> {
        self.fetch(Method::GET, PROFILE_TOKEN, NO_BODY).await
    }

    async fn profile_get(&self) -> ClientResult<Profile> {
        self.fetch(Method::GET, PROFILE_SELF, NO_BODY).await
    }

    async fn profile_update(&self, payload: &ProfilePayload) -> ClientResult<Profile> {
        self.fetch(Method::PUT, PROFILE_SELF, Some(payload)).await
    }

    async fn list<K: Resource>(&self) -> ClientResult<Vec<K>> {
        self.fetch(Method::GET, &[K::COLLECTION], NO_BODY).await
    }

    async fn get<K: Resource>(&self, id: &str) -> ClientResult<K> {
        self.fetch(Method::GET, &[K::COLLECTION, id], NO_BODY).await
    }

    async fn create<K: Writable>(&self, payload: &K::Payload) -> ClientResult<K> {
        self.fetch(Method::POST, &[K::COLLECTION], Some(payload))
            .await
    }

    async fn update<K: Writable>(&self, id: &str, payload: &K::Payload) -> ClientResult<K> {
        self.fetch(Method::PATCH, &[K::COLLECTION, id], Some(payload))
            .await
    }

    async fn delete<K: Resource>(&self, id: &str) -> ClientResult<()> {
        self.execute(Method::DELETE, &[K::COLLECTION, id], NO_BODY)
            .await
    }

    async fn registry_sync(&self, id: &str) -> ClientResult<()> {
        self.execute(
            Method::POST,
            &[<umschlag_api_models::Registry as Resource>::COLLECTION, id, "sync"],
            NO_BODY,
        )
        .await
    }

    async fn member_list<R: Relation>(&self, parent: &str) -> ClientResult<Vec<R::Record>> {
        self.fetch(Method::GET, &member_path::<R>(parent), NO_BODY)
            .await
    }

    async fn member_append<R: Relation>(&self, params: &MemberParams<R>) -> ClientResult<()> {
        self.execute(Method::POST, &member_path::<R>(&params.parent), Some(params))
            .await
    }

    async fn member_perm<R: Relation>(&self, params: &MemberParams<R>) -> ClientResult<()> {
        self.execute(Method::PUT, &member_path::<R>(&params.parent), Some(params))
            .await
    }

    async fn member_remove<R: Relation>(&self, params: &MemberParams<R>) -> ClientResult<()> {
        self.execute(Method::DELETE, &member_path::<R>(&params.parent), Some(params))
            .await
    }
}

fn member_path<R: Relation>(parent: &str) -> [&str; 3] {
    [
        <R::Parent as Resource>::COLLECTION,
        parent,
        <R::Child as Resource>::COLLECTION,
    ]
}

fn parse_server(server: &str) -> ClientResult<Url> {
    let invalid = |reason: String| ClientError::InvalidServer {
        server: server.to_string(),
        reason,
    };
    let url = server
        .trim()
        .parse::<Url>()
        .map_err(|err| invalid(err.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.cannot_be_a_base() {
        return Err(invalid("address cannot be a base URL".to_string()));
    }
    Ok(url)
}
