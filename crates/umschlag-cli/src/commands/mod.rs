//! Command handlers grouped by resource.
//!
//! The helpers here implement the shared command shapes once: listing, detail
//! views, create, diff-then-patch update, delete and membership changes. Each
//! resource module only supplies its flags, payload mapping and layouts.

pub(crate) mod group;
pub(crate) mod profile;
pub(crate) mod registry;
pub(crate) mod repo;
pub(crate) mod team;
pub(crate) mod user;

use tracing::debug;
use umschlag_client::models::Permission;
use umschlag_client::{ClientApi, MemberParams, Relation, Resource, Writable};

use crate::cli::{IdArgs, OutputArgs, ShowArgs};
use crate::client::{AppContext, CliError, CliResult};
use crate::output::{Listing, render_list, render_record};

const MISSING_ID: &str = "You must provide an ID or a slug.";

/// Raw membership flags as collected by the relation subcommands.
#[derive(Debug, Default)]
pub(crate) struct MemberInput {
    pub(crate) parent: Option<String>,
    pub(crate) child: Option<String>,
    pub(crate) perm: Option<String>,
}

/// Treat empty flag values as absent.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

pub(crate) fn require(value: Option<String>, message: &str) -> CliResult<String> {
    non_empty(value).ok_or_else(|| CliError::validation(message))
}

pub(crate) fn require_id(id: Option<String>) -> CliResult<String> {
    require(id, MISSING_ID)
}

/// Message for a missing membership target, keyed by `Resource::KEY`.
pub(crate) fn missing_child(key: &str) -> &'static str {
    match key {
        "user" => "You must provide a user ID or slug.",
        "team" => "You must provide a team ID or slug.",
        "org" => "You must provide an org ID or slug.",
        "namespace" => "You must provide a namespace ID or slug.",
        _ => MISSING_ID,
    }
}

/// Resolve a pair of opposing switches into an optional value.
pub(crate) fn exclusive(on: bool, off: bool, conflict: &str) -> CliResult<Option<bool>> {
    match (on, off) {
        (true, true) => Err(CliError::validation(conflict)),
        (true, false) => Ok(Some(true)),
        (false, true) => Ok(Some(false)),
        (false, false) => Ok(None),
    }
}

/// Keep `flag` only when it differs from the current value.
pub(crate) fn changed<T: PartialEq>(flag: Option<T>, current: &T) -> Option<T> {
    flag.filter(|value| value != current)
}

pub(crate) fn parse_perm(value: &str) -> CliResult<Permission> {
    value
        .parse()
        .map_err(|err: umschlag_client::models::InvalidPermission| {
            CliError::validation(err.to_string())
        })
}

pub(crate) async fn list<K: Resource, C: ClientApi>(
    ctx: &AppContext<'_, C>,
    output: &OutputArgs,
    listing: &Listing,
) -> CliResult<()> {
    let mode = output.mode()?;
    let records = ctx.client.list::<K>().await?;
    debug!(collection = K::COLLECTION, count = records.len(), "listed records");
    render_list(ctx.console, mode, listing, &records)
}

pub(crate) async fn show<K: Resource, C: ClientApi>(
    ctx: &AppContext<'_, C>,
    args: ShowArgs,
    template: &str,
) -> CliResult<()> {
    let id = require_id(args.id)?;
    let mode = args.output.mode()?;
    let record = ctx.client.get::<K>(&id).await?;
    render_record(ctx.console, mode, K::KEY, template, &record)
}

pub(crate) async fn create<K: Writable, C: ClientApi>(
    ctx: &AppContext<'_, C>,
    payload: &K::Payload,
) -> CliResult<()> {
    let record = ctx.client.create::<K>(payload).await?;
    debug!(collection = K::COLLECTION, id = record.id(), "created record");
    ctx.console.notice("Successfully created");
    Ok(())
}

/// Fetch the record, derive the changed fields and patch them when any differ.
pub(crate) async fn update<K, C, F>(ctx: &AppContext<'_, C>, id: Option<String>, diff: F) -> CliResult<()>
where
    K: Writable,
    C: ClientApi,
    F: FnOnce(&K) -> K::Payload + Send,
{
    let id = require_id(id)?;
    let current = ctx.client.get::<K>(&id).await?;
    let payload = diff(&current);

    if payload == K::Payload::default() {
        ctx.console.notice("Nothing to update...");
        return Ok(());
    }

    ctx.client
        .update::<K>(&current.id().to_string(), &payload)
        .await?;
    ctx.console.notice("Successfully updated");
    Ok(())
}

pub(crate) async fn delete<K: Resource, C: ClientApi>(
    ctx: &AppContext<'_, C>,
    args: IdArgs,
) -> CliResult<()> {
    let id = require_id(args.id)?;
    ctx.client.delete::<K>(&id).await?;
    ctx.console.notice("Successfully deleted");
    Ok(())
}

pub(crate) async fn member_list<R: Relation, C: ClientApi>(
    ctx: &AppContext<'_, C>,
    args: ShowArgs,
    listing: &Listing,
) -> CliResult<()> {
    let parent = require_id(args.id)?;
    let mode = args.output.mode()?;
    let records = ctx.client.member_list::<R>(&parent).await?;
    render_list(ctx.console, mode, listing, &records)
}

pub(crate) async fn member_append<R: Relation, C: ClientApi>(
    ctx: &AppContext<'_, C>,
    input: MemberInput,
) -> CliResult<()> {
    let params = member_params::<R>(input)?;
    ctx.client.member_append(&params).await?;
    ctx.console.notice("Successfully appended");
    Ok(())
}

pub(crate) async fn member_perm<R: Relation, C: ClientApi>(
    ctx: &AppContext<'_, C>,
    input: MemberInput,
) -> CliResult<()> {
    let params = member_params::<R>(input)?;
    ctx.client.member_perm(&params).await?;
    ctx.console.notice("Successfully updated permissions");
    Ok(())
}

pub(crate) async fn member_remove<R: Relation, C: ClientApi>(
    ctx: &AppContext<'_, C>,
    input: MemberInput,
) -> CliResult<()> {
    let params = member_params::<R>(input)?;
    ctx.client.member_remove(&params).await?;
    ctx.console.notice("Successfully removed");
    Ok(())
}

fn member_params<R: Relation>(input: MemberInput) -> CliResult<MemberParams<R>> {
    let parent = require_id(input.parent)?;
    let child = require(input.child, missing_child(<R::Child as Resource>::KEY))?;
    let params = MemberParams::new(parent, child);
    match input.perm {
        Some(perm) => Ok(params.with_perm(parse_perm(&perm)?)),
        None => Ok(params),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::Console;
    use serde_json::json;
    use umschlag_client::TeamUsers;
    use umschlag_client::models::{Registry, Team};
    use umschlag_test_support::fixtures;
    use umschlag_test_support::mocks::FakeClient;

    #[test]
    fn child_messages_name_the_resource() {
        assert_eq!(missing_child("user"), "You must provide a user ID or slug.");
        assert_eq!(missing_child("org"), "You must provide an org ID or slug.");
        assert_eq!(
            missing_child("namespace"),
            "You must provide a namespace ID or slug."
        );
        assert_eq!(missing_child("team"), "You must provide a team ID or slug.");
    }

    #[test]
    fn exclusive_switches() {
        assert_eq!(exclusive(false, false, "x").ok(), Some(None));
        assert_eq!(exclusive(true, false, "x").ok(), Some(Some(true)));
        assert_eq!(exclusive(false, true, "x").ok(), Some(Some(false)));
        let err = exclusive(true, true, "both").expect_err("conflict");
        assert_eq!(err.display_message(), "both");
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn permissions_are_validated() {
        for value in ["user", "admin", "owner"] {
            assert_eq!(parse_perm(value).map(Permission::as_str).ok(), Some(value));
        }
        let err = parse_perm("root").expect_err("unknown permission");
        assert_eq!(
            err.display_message(),
            "Invalid permission, can be user, admin or owner"
        );
    }

    #[test]
    fn blank_values_count_as_missing() {
        assert!(require(Some("  ".into()), "missing").is_err());
        assert_eq!(require_id(None).expect_err("id").display_message(), MISSING_ID);
        assert_eq!(changed(Some("hub".to_string()), &"hub".to_string()), None);
        assert_eq!(
            changed(Some("mirror".to_string()), &"hub".to_string()),
            Some("mirror".to_string())
        );
    }

    #[tokio::test]
    async fn update_without_changes_skips_the_write() -> anyhow::Result<()> {
        let console = Console::buffered();
        let fake = FakeClient::new().seed("hub", &fixtures::registry());
        let ctx = AppContext::new(fake, &console);

        update::<Registry, _, _>(&ctx, Some("hub".into()), |_| Default::default())
            .await
            .map_err(|err| anyhow::anyhow!(err.display_message()))?;

        assert_eq!(console.stderr_text(), "Nothing to update...\n");
        assert!(ctx.client.writes().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn update_patches_by_record_id() -> anyhow::Result<()> {
        let console = Console::buffered();
        let fake = FakeClient::new().seed("ops", &fixtures::team());
        let ctx = AppContext::new(fake, &console);

        update::<Team, _, _>(&ctx, Some("ops".into()), |team| {
            umschlag_client::models::TeamPayload {
                name: changed(Some("Operations".to_string()), &team.name),
                ..Default::default()
            }
        })
        .await
        .map_err(|err| anyhow::anyhow!(err.display_message()))?;

        let writes = ctx.client.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].method, "PATCH");
        assert_eq!(writes[0].path, "/api/teams/7");
        assert_eq!(writes[0].body, Some(json!({"name": "Operations"})));
        assert_eq!(console.stderr_text(), "Successfully updated\n");
        Ok(())
    }

    #[tokio::test]
    async fn invalid_permission_never_reaches_the_server() {
        let console = Console::buffered();
        let ctx = AppContext::new(FakeClient::new(), &console);
        let input = MemberInput {
            parent: Some("t1".into()),
            child: Some("u1".into()),
            perm: Some("superuser".into()),
        };

        let err = member_append::<TeamUsers, _>(&ctx, input)
            .await
            .expect_err("invalid permission");

        assert_eq!(err.exit_code(), 1);
        assert!(ctx.client.calls().is_empty());
    }

    #[tokio::test]
    async fn missing_member_reports_the_child_key() {
        let console = Console::buffered();
        let ctx = AppContext::new(FakeClient::new(), &console);
        let input = MemberInput {
            parent: Some("t1".into()),
            ..MemberInput::default()
        };

        let err = member_remove::<TeamUsers, _>(&ctx, input)
            .await
            .expect_err("missing user");

        assert_eq!(err.display_message(), "You must provide a user ID or slug.");
        assert!(ctx.client.calls().is_empty());
    }
}
