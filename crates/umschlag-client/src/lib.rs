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

//! HTTP client for the Umschlag REST API.
//!
//! Layout:
//! - `resource.rs`: collection descriptors and membership relations
//! - `api.rs`: the `ClientApi` capability set consumed by the CLI
//! - `client.rs`: reqwest-backed `DefaultClient` and its builder
//! - `error.rs`: error type and server envelope mapping

mod api;
mod client;
mod error;
mod resource;

pub use api::ClientApi;
pub use client::{ClientBuilder, DEFAULT_TIMEOUT, DefaultClient, USER_AGENT};
pub use error::{ClientError, ClientResult};
pub use resource::{
    MemberParams, NamespaceTeams, NamespaceUsers, OrgTeams, OrgUsers, Relation, Resource,
    TeamNamespaces, TeamOrgs, TeamUsers, UserNamespaces, UserOrgs, UserTeams, Writable,
};
pub use umschlag_api_models as models;
