//! Capability set the command layer depends on.

use async_trait::async_trait;
use umschlag_api_models::{Profile, ProfilePayload, Token};

use crate::error::ClientResult;
use crate::resource::{MemberParams, Relation, Resource, Writable};

/// Operations offered by the Umschlag API.
///
/// Implemented by [`crate::DefaultClient`] for real traffic; tests substitute a
/// recording fake. Every method maps to exactly one HTTP request.
#[async_trait]
pub trait ClientApi: Send + Sync {
    /// Check whether the configured token is accepted by the server.
    ///
    /// Returns `Ok(false)` without a token or on `401`. Any other failure is
    /// returned as an error instead of being read as a valid session.
    async fn is_authenticated(&self) -> ClientResult<bool>;

    /// Exchange credentials for a token.
    async fn auth_login(&self, username: &str, password: &str) -> ClientResult<Token>;

    /// Fetch the token of the current session.
    async fn profile_token(&self) -> ClientResult<Token>;

    /// Fetch the caller's own account.
    async fn profile_get(&self) -> ClientResult<Profile>;

    /// Update the caller's own account.
    async fn profile_update(&self, payload: &ProfilePayload) -> ClientResult<Profile>;

    /// List every record of a collection.
    async fn list<K: Resource>(&self) -> ClientResult<Vec<K>>;

    /// Fetch one record by ID or slug.
    async fn get<K: Resource>(&self, id: &str) -> ClientResult<K>;

    /// Create a record and return it as stored by the server.
    async fn create<K: Writable>(&self, payload: &K::Payload) -> ClientResult<K>;

    /// Update the record identified by `id` with the fields present in `payload`.
    async fn update<K: Writable>(&self, id: &str, payload: &K::Payload) -> ClientResult<K>;

    /// Delete a record by ID or slug.
    async fn delete<K: Resource>(&self, id: &str) -> ClientResult<()>;

    /// Trigger a catalog synchronisation of a registry.
    async fn registry_sync(&self, id: &str) -> ClientResult<()>;

    /// List memberships of `parent`.
    async fn member_list<R: Relation>(&self, parent: &str) -> ClientResult<Vec<R::Record>>;

    /// Add a membership.
    async fn member_append<R: Relation>(&self, params: &MemberParams<R>) -> ClientResult<()>;

    /// Change the permission of an existing membership.
    async fn member_perm<R: Relation>(&self, params: &MemberParams<R>) -> ClientResult<()>;

    /// Remove a membership.
    async fn member_remove<R: Relation>(&self, params: &MemberParams<R>) -> ClientResult<()>;
}
