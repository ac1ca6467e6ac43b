use umschlag_client::models::{Team, TeamPayload};
use umschlag_client::{ClientApi, TeamNamespaces, TeamOrgs, TeamUsers};

use crate::cli::{TeamCommand, TeamCreateArgs, TeamUpdateArgs};
use crate::client::{AppContext, CliResult};
use crate::commands::{self, changed, non_empty, require};
use crate::output::{Listing, column};

const LISTING: Listing = Listing {
    element: "team",
    columns: &[column("ID", "id"), column("SLUG", "slug"), column("NAME", "name")],
};

const TEMPLATE: &str = "Slug: \x1b[33m{{ slug }} \x1b[0m
ID: {{ id }}
Name: {{ name }}{% if users %}
Users: {{ userlist(users) }}{% endif %}{% if orgs %}
Orgs: {{ orglist(orgs) }}{% endif %}
Created: {{ created_at | date }}
Updated: {{ updated_at | date }}";

const USER_LISTING: Listing = Listing {
    element: "team_user",
    columns: &[
        column("ID", "user_id"),
        column("SLUG", "user.slug"),
        column("USERNAME", "user.username"),
        column("PERM", "perm"),
    ],
};

const ORG_LISTING: Listing = Listing {
    element: "team_org",
    columns: &[
        column("ID", "org_id"),
        column("SLUG", "org.slug"),
        column("NAME", "org.name"),
        column("PERM", "perm"),
    ],
};

const NAMESPACE_LISTING: Listing = Listing {
    element: "team_namespace",
    columns: &[
        column("ID", "namespace_id"),
        column("SLUG", "namespace.slug"),
        column("NAME", "namespace.name"),
        column("PERM", "perm"),
    ],
};

pub(crate) async fn handle<C: ClientApi>(
    ctx: &AppContext<'_, C>,
    command: TeamCommand,
) -> CliResult<()> {
    match command {
        TeamCommand::List(output) => commands::list::<Team, C>(ctx, &output, &LISTING).await,
        TeamCommand::Show(args) => commands::show::<Team, C>(ctx, args, TEMPLATE).await,
        TeamCommand::Create(args) => handle_team_create(ctx, args).await,
        TeamCommand::Update(args) => handle_team_update(ctx, args).await,
        TeamCommand::Delete(args) => commands::delete::<Team, C>(ctx, args).await,
        TeamCommand::UserList(args) => {
            commands::member_list::<TeamUsers, C>(ctx, args, &USER_LISTING).await
        }
        TeamCommand::UserAppend(args) => commands::member_append::<TeamUsers, C>(ctx, args.into()).await,
        TeamCommand::UserPerm(args) => commands::member_perm::<TeamUsers, C>(ctx, args.into()).await,
        TeamCommand::UserRemove(args) => commands::member_remove::<TeamUsers, C>(ctx, args.into()).await,
        TeamCommand::OrgList(args) => {
            commands::member_list::<TeamOrgs, C>(ctx, args, &ORG_LISTING).await
        }
        TeamCommand::OrgAppend(args) => commands::member_append::<TeamOrgs, C>(ctx, args.into()).await,
        TeamCommand::OrgPerm(args) => commands::member_perm::<TeamOrgs, C>(ctx, args.into()).await,
        TeamCommand::OrgRemove(args) => commands::member_remove::<TeamOrgs, C>(ctx, args.into()).await,
        TeamCommand::NamespaceList(args) => {
            commands::member_list::<TeamNamespaces, C>(ctx, args, &NAMESPACE_LISTING).await
        }
        TeamCommand::NamespaceAppend(args) => {
            commands::member_append::<TeamNamespaces, C>(ctx, args.into()).await
        }
        TeamCommand::NamespacePerm(args) => {
            commands::member_perm::<TeamNamespaces, C>(ctx, args.into()).await
        }
        TeamCommand::NamespaceRemove(args) => {
            commands::member_remove::<TeamNamespaces, C>(ctx, args.into()).await
        }
    }
}

async fn handle_team_create<C: ClientApi>(
    ctx: &AppContext<'_, C>,
    args: TeamCreateArgs,
) -> CliResult<()> {
    let name = require(args.name, "You must provide a name.")?;
    let payload = TeamPayload {
        slug: non_empty(args.slug),
        name: Some(name),
    };
    commands::create::<Team, C>(ctx, &payload).await
}

async fn handle_team_update<C: ClientApi>(
    ctx: &AppContext<'_, C>,
    args: TeamUpdateArgs,
) -> CliResult<()> {
    let (slug, name) = (non_empty(args.slug), non_empty(args.name));
    commands::update::<Team, C, _>(ctx, args.id, move |current| TeamPayload {
        slug: changed(slug, &current.slug),
        name: changed(name, &current.name),
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{ShowArgs, UserMemberArgs};
    use crate::output::{Console, OutputMode};
    use serde_json::json;
    use umschlag_client::models::Permission;
    use umschlag_test_support::fixtures;
    use umschlag_test_support::mocks::FakeClient;

    #[tokio::test]
    async fn user_append_posts_the_membership() -> anyhow::Result<()> {
        let console = Console::buffered();
        let ctx = AppContext::new(FakeClient::new(), &console);
        let args = UserMemberArgs {
            id: Some("t1".into()),
            child: Some("u1".into()),
            perm: "admin".into(),
        };

        handle(&ctx, TeamCommand::UserAppend(args))
            .await
            .map_err(|err| anyhow::anyhow!(err.display_message()))?;

        let calls = ctx.client.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].method, "POST");
        assert_eq!(calls[0].path, "/api/teams/t1/users");
        assert_eq!(
            calls[0].body,
            Some(json!({"team": "t1", "user": "u1", "perm": "admin"}))
        );
        assert_eq!(console.stderr_text(), "Successfully appended\n");
        Ok(())
    }

    #[tokio::test]
    async fn create_requires_a_name() {
        let console = Console::buffered();
        let ctx = AppContext::new(FakeClient::new(), &console);

        let err = handle(&ctx, TeamCommand::Create(TeamCreateArgs::default()))
            .await
            .expect_err("name is required");

        assert_eq!(err.display_message(), "You must provide a name.");
        assert!(ctx.client.calls().is_empty());
    }

    #[tokio::test]
    async fn update_without_flags_is_a_no_op() -> anyhow::Result<()> {
        let console = Console::buffered();
        let ctx = AppContext::new(FakeClient::new().seed("ops", &fixtures::team()), &console);
        let args = TeamUpdateArgs {
            id: Some("ops".into()),
            ..TeamUpdateArgs::default()
        };

        handle(&ctx, TeamCommand::Update(args))
            .await
            .map_err(|err| anyhow::anyhow!(err.display_message()))?;

        assert!(ctx.client.writes().is_empty());
        assert_eq!(console.stderr_text(), "Nothing to update...\n");
        Ok(())
    }

    #[tokio::test]
    async fn user_list_in_json() -> anyhow::Result<()> {
        let console = Console::buffered();
        let ctx = AppContext::new(
            FakeClient::new().with_record(
                "/api/teams/ops/users",
                vec![fixtures::team_user(Permission::Owner)],
            ),
            &console,
        );
        let mut args = ShowArgs {
            id: Some("ops".into()),
            ..ShowArgs::default()
        };
        args.output.json = true;
        assert_eq!(args.output.mode().ok(), Some(OutputMode::Json));

        handle(&ctx, TeamCommand::UserList(args))
            .await
            .map_err(|err| anyhow::anyhow!(err.display_message()))?;

        let printed: serde_json::Value = serde_json::from_str(&console.stdout_text())?;
        assert_eq!(printed[0]["perm"], "owner");
        assert_eq!(printed[0]["user"]["username"], "jdoe");
        Ok(())
    }
}
