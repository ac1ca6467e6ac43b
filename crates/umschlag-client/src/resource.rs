//! Descriptors mapping record types onto API paths.
//!
//! Every collection lives below `/api/{COLLECTION}` and every membership below
//! `/api/{parent}/{id}/{child}`, so one set of generic operations covers all of
//! them.

use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::ser::{Serialize, SerializeMap, Serializer};
use umschlag_api_models::{
    Namespace, NamespacePayload, Org, OrgPayload, Permission, Registry, RegistryPayload, Repo,
    Tag, Team, TeamNamespace, TeamOrg, TeamPayload, TeamUser, User, UserNamespace, UserOrg,
    UserPayload,
};

/// A record type served from its own collection.
pub trait Resource: DeserializeOwned + Serialize + Send + Sync + 'static {
    /// Path segment of the collection below `/api`.
    const COLLECTION: &'static str;
    /// Singular name, used as key in membership bodies.
    const KEY: &'static str;

    /// Immutable server-assigned identifier.
    fn id(&self) -> i64;
}

/// A resource that can be created and updated by clients.
pub trait Writable: Resource {
    /// Body sent on create and update; the default value carries no fields.
    type Payload: Serialize + Default + PartialEq + Send + Sync + 'static;
}

/// Membership between two resources carrying a permission.
pub trait Relation: Send + Sync + 'static {
    /// Resource owning the nested collection.
    type Parent: Resource;
    /// Resource listed in the nested collection.
    type Child: Resource;
    /// Join record returned by listings.
    type Record: DeserializeOwned + Serialize + Send + 'static;
}

macro_rules! resource {
    ($record:ty, $collection:literal, $key:literal) => {
        impl Resource for $record {
            const COLLECTION: &'static str = $collection;
            const KEY: &'static str = $key;

            fn id(&self) -> i64 {
                self.id
            }
        }
    };
}

resource!(Registry, "registries", "registry");
resource!(Org, "orgs", "org");
resource!(Namespace, "namespaces", "namespace");
resource!(Repo, "repos", "repo");
resource!(Tag, "tags", "tag");
resource!(User, "users", "user");
resource!(Team, "teams", "team");

impl Writable for Registry {
    type Payload = RegistryPayload;
}

impl Writable for Org {
    type Payload = OrgPayload;
}

impl Writable for Namespace {
    type Payload = NamespacePayload;
}

impl Writable for User {
    type Payload = UserPayload;
}

impl Writable for Team {
    type Payload = TeamPayload;
}

macro_rules! relation {
    ($(#[$doc:meta])* $name:ident, $parent:ty, $child:ty, $record:ty) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy)]
        pub struct $name;

        impl Relation for $name {
            type Parent = $parent;
            type Child = $child;
            type Record = $record;
        }
    };
}

relation!(
    /// Users of an organisation.
    OrgUsers, Org, User, UserOrg
);
relation!(
    /// Teams of an organisation.
    OrgTeams, Org, Team, TeamOrg
);
relation!(
    /// Users of a namespace.
    NamespaceUsers, Namespace, User, UserNamespace
);
relation!(
    /// Teams of a namespace.
    NamespaceTeams, Namespace, Team, TeamNamespace
);
relation!(
    /// Users of a team.
    TeamUsers, Team, User, TeamUser
);
relation!(
    /// Organisations of a team.
    TeamOrgs, Team, Org, TeamOrg
);
relation!(
    /// Namespaces of a team.
    TeamNamespaces, Team, Namespace, TeamNamespace
);
relation!(
    /// Teams of a user.
    UserTeams, User, Team, TeamUser
);
relation!(
    /// Organisations of a user.
    UserOrgs, User, Org, UserOrg
);
relation!(
    /// Namespaces of a user.
    UserNamespaces, User, Namespace, UserNamespace
);

/// Body of a membership change.
///
/// Serializes as `{"<parent key>": parent, "<child key>": child, "perm": perm}`,
/// e.g. `{"team": "t1", "user": "u1", "perm": "admin"}` for [`TeamUsers`].
pub struct MemberParams<R> {
    /// Parent ID or slug.
    pub parent: String,
    /// Child ID or slug.
    pub child: String,
    /// Permission to grant, omitted on removal.
    pub perm: Option<Permission>,
    relation: PhantomData<fn() -> R>,
}

impl<R: Relation> MemberParams<R> {
    /// Membership between `parent` and `child` without a permission.
    #[must_use]
    pub fn new(parent: impl Into<String>, child: impl Into<String>) -> Self {
        Self {
            parent: parent.into(),
            child: child.into(),
            perm: None,
            relation: PhantomData,
        }
    }

    /// Attach the permission to grant.
    #[must_use]
    pub const fn with_perm(mut self, perm: Permission) -> Self {
        self.perm = Some(perm);
        self
    }
}

impl<R> Clone for MemberParams<R> {
    fn clone(&self) -> Self {
        Self {
            parent: self.parent.clone(),
            child: self.child.clone(),
            perm: self.perm,
            relation: PhantomData,
        }
    }
}

impl<R: Relation> fmt::Debug for MemberParams<R> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("MemberParams")
            .field(<R::Parent as Resource>::KEY, &self.parent)
            .field(<R::Child as Resource>::KEY, &self.child)
            .field("perm", &self.perm)
            .finish()
    }
}

impl<R: Relation> Serialize for MemberParams<R> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.perm.is_some() { 3 } else { 2 };
        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry(<R::Parent as Resource>::KEY, &self.parent)?;
        map.serialize_entry(<R::Child as Resource>::KEY, &self.child)?;
        if let Some(perm) = &self.perm {
            map.serialize_entry("perm", perm)?;
        }
        map.end()
    }
}
