//! Sample records with stable identifiers and timestamps.

use chrono::{DateTime, TimeZone, Utc};
use umschlag_client::models::{
    Namespace, Org, Profile, Registry, Repo, Tag, Team, TeamUser, User, Permission,
};

/// Fixed instant used for every `created_at`/`updated_at`.
#[must_use]
pub fn timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0)
        .single()
        .unwrap_or_default()
}

/// Registry `hub` at `hub.example.com`.
#[must_use]
pub fn registry() -> Registry {
    Registry {
        id: 1,
        slug: "hub".into(),
        name: "Hub".into(),
        host: "hub.example.com".into(),
        use_ssl: true,
        created_at: Some(timestamp()),
        updated_at: Some(timestamp()),
        orgs: None,
    }
}

/// Organisation `acme` on [`registry`].
#[must_use]
pub fn org() -> Org {
    Org {
        id: 2,
        registry_id: 1,
        registry: Some(Box::new(registry())),
        slug: "acme".into(),
        name: "Acme".into(),
        public: false,
        created_at: Some(timestamp()),
        updated_at: Some(timestamp()),
        repos: None,
        users: Some(vec![user()]),
        teams: Some(vec![team()]),
    }
}

/// Namespace `library` on [`registry`].
#[must_use]
pub fn namespace() -> Namespace {
    Namespace {
        id: 3,
        registry_id: 1,
        registry: Some(Box::new(registry())),
        slug: "library".into(),
        name: "Library".into(),
        public: true,
        created_at: Some(timestamp()),
        updated_at: Some(timestamp()),
        users: None,
        teams: None,
    }
}

/// Repository `acme/api`.
#[must_use]
pub fn repo() -> Repo {
    Repo {
        id: 4,
        org_id: 2,
        org: None,
        slug: "api".into(),
        name: "api".into(),
        full_name: "acme/api".into(),
        public: false,
        created_at: Some(timestamp()),
        updated_at: Some(timestamp()),
        tags: Some(vec![tag()]),
    }
}

/// Tag `acme/api:latest`.
#[must_use]
pub fn tag() -> Tag {
    Tag {
        id: 5,
        repo_id: 4,
        repo: None,
        slug: "latest".into(),
        name: "latest".into(),
        full_name: "acme/api:latest".into(),
        public: false,
        created_at: Some(timestamp()),
        updated_at: Some(timestamp()),
    }
}

/// Active, non-admin user `jdoe`.
#[must_use]
pub fn user() -> User {
    User {
        id: 6,
        slug: "jdoe".into(),
        username: "jdoe".into(),
        email: "jdoe@example.com".into(),
        active: true,
        admin: false,
        created_at: Some(timestamp()),
        updated_at: Some(timestamp()),
        teams: None,
        orgs: None,
    }
}

/// Team `ops`.
#[must_use]
pub fn team() -> Team {
    Team {
        id: 7,
        slug: "ops".into(),
        name: "Ops".into(),
        created_at: Some(timestamp()),
        updated_at: Some(timestamp()),
        users: None,
        orgs: None,
    }
}

/// Profile of [`user`].
#[must_use]
pub fn profile() -> Profile {
    Profile {
        id: 6,
        slug: "jdoe".into(),
        username: "jdoe".into(),
        email: "jdoe@example.com".into(),
        created_at: Some(timestamp()),
        updated_at: Some(timestamp()),
    }
}

/// Membership of [`user`] in [`team`].
#[must_use]
pub fn team_user(perm: Permission) -> TeamUser {
    TeamUser {
        team_id: 7,
        team: Some(team()),
        user_id: 6,
        user: Some(user()),
        perm,
    }
}
