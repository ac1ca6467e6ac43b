#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
//! Shared HTTP DTOs for the Umschlag public API.
//!
//! Records mirror the server-side resources and are only ever produced by the
//! server; the client writes through the `*Payload` types, whose fields are all
//! optional so request bodies carry exactly what the caller supplied.
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error envelope returned by the server for non-successful responses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    /// HTTP status code echoed by the server.
    pub status: u16,
    /// Human-readable failure description.
    pub message: String,
}

/// Session token issued by the server.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Token {
    /// Bearer token value.
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Expiry timestamp as reported by the server, if any.
    pub expire: Option<String>,
}

/// Credentials submitted to the login endpoint.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Credentials {
    /// Account username.
    pub username: String,
    /// Account password.
    pub password: String,
}

/// Permission level granted through a membership.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    /// Regular member.
    #[default]
    User,
    /// Member allowed to manage the resource.
    Admin,
    /// Member owning the resource.
    Owner,
}

impl Permission {
    /// Wire representation of the permission.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
            Self::Owner => "owner",
        }
    }
}

impl Display for Permission {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Raised when a permission string is not one of `user`, `admin` or `owner`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid permission, can be user, admin or owner")]
pub struct InvalidPermission {
    /// The rejected input.
    pub value: String,
}

impl FromStr for Permission {
    type Err = InvalidPermission;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            "owner" => Ok(Self::Owner),
            other => Err(InvalidPermission {
                value: other.to_string(),
            }),
        }
    }
}

/// Docker registry managed by the server.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Registry {
    /// Server-assigned identifier.
    pub id: i64,
    /// URL-safe unique identifier.
    pub slug: String,
    /// Display name.
    pub name: String,
    /// Registry host name.
    pub host: String,
    /// Whether the registry is reached over TLS.
    pub use_ssl: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Creation timestamp.
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Last modification timestamp.
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Organisations hosted on the registry, when expanded.
    pub orgs: Option<Vec<Org>>,
}

/// Organisation grouping repositories under a registry.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Org {
    /// Server-assigned identifier.
    pub id: i64,
    /// Parent registry identifier.
    pub registry_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Parent registry, when expanded.
    pub registry: Option<Box<Registry>>,
    /// URL-safe unique identifier.
    pub slug: String,
    /// Display name.
    pub name: String,
    /// Whether anonymous users can pull.
    pub public: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Creation timestamp.
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Last modification timestamp.
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Repositories of the organisation, when expanded.
    pub repos: Option<Vec<Repo>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Member users, when expanded.
    pub users: Option<Vec<User>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Member teams, when expanded.
    pub teams: Option<Vec<Team>>,
}

/// Namespace, the earlier name for an organisation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Namespace {
    /// Server-assigned identifier.
    pub id: i64,
    /// Parent registry identifier.
    pub registry_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Parent registry, when expanded.
    pub registry: Option<Box<Registry>>,
    /// URL-safe unique identifier.
    pub slug: String,
    /// Display name.
    pub name: String,
    /// Whether anonymous users can pull.
    pub public: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Creation timestamp.
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Last modification timestamp.
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Member users, when expanded.
    pub users: Option<Vec<User>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Member teams, when expanded.
    pub teams: Option<Vec<Team>>,
}

/// Container image repository within an organisation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Repo {
    /// Server-assigned identifier.
    pub id: i64,
    /// Parent organisation identifier.
    pub org_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Parent organisation, when expanded.
    pub org: Option<Box<Org>>,
    /// URL-safe unique identifier.
    pub slug: String,
    /// Repository name.
    pub name: String,
    /// Name including the organisation prefix.
    pub full_name: String,
    /// Whether anonymous users can pull.
    pub public: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Creation timestamp.
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Last modification timestamp.
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Tags of the repository, when expanded.
    pub tags: Option<Vec<Tag>>,
}

/// Named image version within a repository.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Tag {
    /// Server-assigned identifier.
    pub id: i64,
    /// Parent repository identifier.
    pub repo_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Parent repository, when expanded.
    pub repo: Option<Box<Repo>>,
    /// URL-safe unique identifier.
    pub slug: String,
    /// Tag name.
    pub name: String,
    /// Name including repository and organisation.
    pub full_name: String,
    /// Whether anonymous users can pull.
    pub public: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Creation timestamp.
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Last modification timestamp.
    pub updated_at: Option<DateTime<Utc>>,
}

/// User account.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct User {
    /// Server-assigned identifier.
    pub id: i64,
    /// URL-safe unique identifier.
    pub slug: String,
    /// Login name.
    pub username: String,
    /// Contact address.
    pub email: String,
    /// Whether the account may sign in.
    pub active: bool,
    /// Whether the account has administrative rights.
    pub admin: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Creation timestamp.
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Last modification timestamp.
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Teams the user belongs to, when expanded.
    pub teams: Option<Vec<Team>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Organisations the user belongs to, when expanded.
    pub orgs: Option<Vec<Org>>,
}

/// Group of users sharing permissions.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Team {
    /// Server-assigned identifier.
    pub id: i64,
    /// URL-safe unique identifier.
    pub slug: String,
    /// Display name.
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Creation timestamp.
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Last modification timestamp.
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Member users, when expanded.
    pub users: Option<Vec<User>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Organisations the team belongs to, when expanded.
    pub orgs: Option<Vec<Org>>,
}

/// The authenticated caller's own account.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Profile {
    /// Server-assigned identifier.
    pub id: i64,
    /// URL-safe unique identifier.
    pub slug: String,
    /// Login name.
    pub username: String,
    /// Contact address.
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Creation timestamp.
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Last modification timestamp.
    pub updated_at: Option<DateTime<Utc>>,
}

/// Membership of a user in a team.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TeamUser {
    /// Team identifier.
    pub team_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Team record, when expanded.
    pub team: Option<Team>,
    /// User identifier.
    pub user_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// User record, when expanded.
    pub user: Option<User>,
    /// Granted permission.
    pub perm: Permission,
}

/// Membership of a user in an organisation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct UserOrg {
    /// User identifier.
    pub user_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// User record, when expanded.
    pub user: Option<User>,
    /// Organisation identifier.
    pub org_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Organisation record, when expanded.
    pub org: Option<Org>,
    /// Granted permission.
    pub perm: Permission,
}

/// Membership of a team in an organisation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TeamOrg {
    /// Team identifier.
    pub team_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Team record, when expanded.
    pub team: Option<Team>,
    /// Organisation identifier.
    pub org_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Organisation record, when expanded.
    pub org: Option<Org>,
    /// Granted permission.
    pub perm: Permission,
}

/// Membership of a user in a namespace.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct UserNamespace {
    /// User identifier.
    pub user_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// User record, when expanded.
    pub user: Option<User>,
    /// Namespace identifier.
    pub namespace_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Namespace record, when expanded.
    pub namespace: Option<Namespace>,
    /// Granted permission.
    pub perm: Permission,
}

/// Membership of a team in a namespace.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TeamNamespace {
    /// Team identifier.
    pub team_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Team record, when expanded.
    pub team: Option<Team>,
    /// Namespace identifier.
    pub namespace_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    /// Namespace record, when expanded.
    pub namespace: Option<Namespace>,
    /// Granted permission.
    pub perm: Permission,
}

/// Writable registry fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegistryPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// New slug.
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// New display name.
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// New host name.
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// New TLS toggle.
    pub use_ssl: Option<bool>,
}

/// Writable organisation fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrgPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Parent registry identifier.
    pub registry_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// New slug.
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// New display name.
    pub name: Option<String>,
}

/// Writable namespace fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NamespacePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Parent registry identifier.
    pub registry_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// New slug.
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// New display name.
    pub name: Option<String>,
}

/// Writable user fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// New slug.
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// New login name.
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// New contact address.
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// New password.
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// New activation state.
    pub active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// New administrative flag.
    pub admin: Option<bool>,
}

/// Writable team fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeamPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// New slug.
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// New display name.
    pub name: Option<String>,
}

/// Writable profile fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProfilePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// New slug.
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// New login name.
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// New contact address.
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// New password.
    pub password: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn permission_parses_known_values() {
        assert_eq!("user".parse::<Permission>(), Ok(Permission::User));
        assert_eq!("admin".parse::<Permission>(), Ok(Permission::Admin));
        assert_eq!("owner".parse::<Permission>(), Ok(Permission::Owner));
    }

    #[test]
    fn permission_rejects_other_values() {
        for value in ["", "Admin", "root", "owner "] {
            let err = value
                .parse::<Permission>()
                .expect_err("unexpected permission accepted");
            assert_eq!(err.value, value);
            assert_eq!(
                err.to_string(),
                "Invalid permission, can be user, admin or owner"
            );
        }
    }

    #[test]
    fn payload_omits_unset_fields() {
        let payload = RegistryPayload {
            name: Some("foo".into()),
            host: Some("example.com".into()),
            use_ssl: Some(true),
            ..RegistryPayload::default()
        };
        let value = serde_json::to_value(&payload).expect("serialize payload");
        assert_eq!(
            value,
            json!({"name": "foo", "host": "example.com", "use_ssl": true})
        );
    }

    #[test]
    fn records_tolerate_missing_fields() {
        let org: Org = serde_json::from_value(json!({
            "id": 4,
            "slug": "acme",
            "name": "Acme",
            "created_at": "2018-01-02T03:04:05Z",
            "registry": {"id": 1, "name": "hub"}
        }))
        .expect("decode org");
        assert_eq!(org.id, 4);
        assert_eq!(org.registry_id, 0);
        assert!(org.users.is_none());
        assert_eq!(org.registry.map(|registry| registry.name), Some("hub".into()));
        assert!(org.created_at.is_some());
    }

    #[test]
    fn membership_decodes_permission() {
        let member: TeamUser = serde_json::from_value(json!({
            "team_id": 1,
            "user_id": 2,
            "user": {"id": 2, "username": "jdoe"},
            "perm": "owner"
        }))
        .expect("decode membership");
        assert_eq!(member.perm, Permission::Owner);
        assert_eq!(member.user.map(|user| user.username), Some("jdoe".into()));
    }
}
