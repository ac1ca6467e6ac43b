//! Organisations and namespaces.
//!
//! Both live below a registry and carry user and team memberships, so one
//! handler serves the two command groups.

use umschlag_client::models::{Namespace, NamespacePayload, Org, OrgPayload, Registry, Team, User};
use umschlag_client::{
    ClientApi, NamespaceTeams, NamespaceUsers, OrgTeams, OrgUsers, Relation, Writable,
};

use crate::cli::{GroupCommand, GroupCreateArgs, GroupUpdateArgs};
use crate::client::{AppContext, CliResult};
use crate::commands::{self, changed, non_empty, require};
use crate::output::{Listing, column};

/// A registry-scoped group with user and team members.
pub(crate) trait Group: Writable {
    type Users: Relation<Parent = Self, Child = User>;
    type Teams: Relation<Parent = Self, Child = Team>;

    const LISTING: Listing;
    const USER_LISTING: Listing;
    const TEAM_LISTING: Listing;
    const TEMPLATE: &'static str;

    fn slug(&self) -> &String;
    fn name(&self) -> &String;
    fn payload(registry_id: Option<i64>, slug: Option<String>, name: Option<String>) -> Self::Payload;
}

const USER_COLUMNS: &[crate::output::Column] = &[
    column("ID", "user_id"),
    column("SLUG", "user.slug"),
    column("USERNAME", "user.username"),
    column("PERM", "perm"),
];

const TEAM_COLUMNS: &[crate::output::Column] = &[
    column("ID", "team_id"),
    column("SLUG", "team.slug"),
    column("NAME", "team.name"),
    column("PERM", "perm"),
];

const GROUP_COLUMNS: &[crate::output::Column] = &[
    column("ID", "id"),
    column("SLUG", "slug"),
    column("NAME", "name"),
    column("REGISTRY", "registry.name"),
];

impl Group for Org {
    type Users = OrgUsers;
    type Teams = OrgTeams;

    const LISTING: Listing = Listing {
        element: "org",
        columns: GROUP_COLUMNS,
    };
    const USER_LISTING: Listing = Listing {
        element: "user_org",
        columns: USER_COLUMNS,
    };
    const TEAM_LISTING: Listing = Listing {
        element: "team_org",
        columns: TEAM_COLUMNS,
    };
    const TEMPLATE: &'static str = "Slug: \x1b[33m{{ slug }} \x1b[0m
ID: {{ id }}
Name: {{ name }}{% if registry %}
Registry: {{ registry.name }}{% endif %}{% if repos %}
Repos: {{ repolist(repos) }}{% endif %}{% if users %}
Users: {{ userlist(users) }}{% endif %}{% if teams %}
Teams: {{ teamlist(teams) }}{% endif %}
Created: {{ created_at | date }}
Updated: {{ updated_at | date }}";

    fn slug(&self) -> &String {
        &self.slug
    }

    fn name(&self) -> &String {
        &self.name
    }

    fn payload(registry_id: Option<i64>, slug: Option<String>, name: Option<String>) -> OrgPayload {
        OrgPayload {
            registry_id,
            slug,
            name,
        }
    }
}

impl Group for Namespace {
    type Users = NamespaceUsers;
    type Teams = NamespaceTeams;

    const LISTING: Listing = Listing {
        element: "namespace",
        columns: GROUP_COLUMNS,
    };
    const USER_LISTING: Listing = Listing {
        element: "user_namespace",
        columns: USER_COLUMNS,
    };
    const TEAM_LISTING: Listing = Listing {
        element: "team_namespace",
        columns: TEAM_COLUMNS,
    };
    const TEMPLATE: &'static str = "Slug: \x1b[33m{{ slug }} \x1b[0m
ID: {{ id }}
Name: {{ name }}{% if registry %}
Registry: {{ registry.name }}{% endif %}{% if users %}
Users: {{ userlist(users) }}{% endif %}{% if teams %}
Teams: {{ teamlist(teams) }}{% endif %}
Created: {{ created_at | date }}
Updated: {{ updated_at | date }}";

    fn slug(&self) -> &String {
        &self.slug
    }

    fn name(&self) -> &String {
        &self.name
    }

    fn payload(
        registry_id: Option<i64>,
        slug: Option<String>,
        name: Option<String>,
    ) -> NamespacePayload {
        NamespacePayload {
            registry_id,
            slug,
            name,
        }
    }
}

pub(crate) async fn handle<G: Group, C: ClientApi>(
    ctx: &AppContext<'_, C>,
    command: GroupCommand,
) -> CliResult<()> {
    match command {
        GroupCommand::List(output) => commands::list::<G, C>(ctx, &output, &G::LISTING).await,
        GroupCommand::Show(args) => commands::show::<G, C>(ctx, args, G::TEMPLATE).await,
        GroupCommand::Create(args) => handle_group_create::<G, C>(ctx, args).await,
        GroupCommand::Update(args) => handle_group_update::<G, C>(ctx, args).await,
        GroupCommand::Delete(args) => commands::delete::<G, C>(ctx, args).await,
        GroupCommand::UserList(args) => {
            commands::member_list::<G::Users, C>(ctx, args, &G::USER_LISTING).await
        }
        GroupCommand::UserAppend(args) => commands::member_append::<G::Users, C>(ctx, args.into()).await,
        GroupCommand::UserPerm(args) => commands::member_perm::<G::Users, C>(ctx, args.into()).await,
        GroupCommand::UserRemove(args) => commands::member_remove::<G::Users, C>(ctx, args.into()).await,
        GroupCommand::TeamList(args) => {
            commands::member_list::<G::Teams, C>(ctx, args, &G::TEAM_LISTING).await
        }
        GroupCommand::TeamAppend(args) => commands::member_append::<G::Teams, C>(ctx, args.into()).await,
        GroupCommand::TeamPerm(args) => commands::member_perm::<G::Teams, C>(ctx, args.into()).await,
        GroupCommand::TeamRemove(args) => commands::member_remove::<G::Teams, C>(ctx, args.into()).await,
    }
}

async fn handle_group_create<G: Group, C: ClientApi>(
    ctx: &AppContext<'_, C>,
    args: GroupCreateArgs,
) -> CliResult<()> {
    let registry = require(args.registry, "You must provide a registry ID or slug.")?;
    let name = require(args.name, "You must provide a name.")?;

    let registry_id = match registry.parse::<i64>() {
        Ok(id) => id,
        Err(_) => ctx.client.get::<Registry>(&registry).await?.id,
    };

    let payload = G::payload(Some(registry_id), non_empty(args.slug), Some(name));
    commands::create::<G, C>(ctx, &payload).await
}

async fn handle_group_update<G: Group, C: ClientApi>(
    ctx: &AppContext<'_, C>,
    args: GroupUpdateArgs,
) -> CliResult<()> {
    let (slug, name) = (non_empty(args.slug), non_empty(args.name));
    commands::update::<G, C, _>(ctx, args.id, move |current: &G| {
        G::payload(
            None,
            changed(slug, current.slug()),
            changed(name, current.name()),
        )
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{ShowArgs, TeamMemberArgs, UserRemoveArgs};
    use crate::output::Console;
    use serde_json::json;
    use umschlag_test_support::fixtures;
    use umschlag_test_support::mocks::FakeClient;

    #[tokio::test]
    async fn create_without_registry_makes_no_requests() {
        let console = Console::buffered();
        let ctx = AppContext::new(FakeClient::new(), &console);
        let args = GroupCreateArgs {
            name: Some("bar".into()),
            ..GroupCreateArgs::default()
        };

        let err = handle::<Org, _>(&ctx, GroupCommand::Create(args))
            .await
            .expect_err("registry is required");

        assert_eq!(err.display_message(), "You must provide a registry ID or slug.");
        assert_eq!(err.exit_code(), 1);
        assert!(ctx.client.calls().is_empty());
    }

    #[tokio::test]
    async fn create_resolves_registry_slugs() -> anyhow::Result<()> {
        let console = Console::buffered();
        let ctx = AppContext::new(FakeClient::new().seed("hub", &fixtures::registry()), &console);
        let args = GroupCreateArgs {
            registry: Some("hub".into()),
            name: Some("bar".into()),
            ..GroupCreateArgs::default()
        };

        handle::<Org, _>(&ctx, GroupCommand::Create(args))
            .await
            .map_err(|err| anyhow::anyhow!(err.display_message()))?;

        let calls = ctx.client.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].path, "/api/registries/hub");
        assert_eq!(calls[1].path, "/api/orgs");
        assert_eq!(calls[1].body, Some(json!({"registry_id": 1, "name": "bar"})));
        Ok(())
    }

    #[tokio::test]
    async fn numeric_registry_is_used_directly() -> anyhow::Result<()> {
        let console = Console::buffered();
        let ctx = AppContext::new(FakeClient::new(), &console);
        let args = GroupCreateArgs {
            registry: Some("12".into()),
            slug: Some("lib".into()),
            name: Some("Library".into()),
        };

        handle::<Namespace, _>(&ctx, GroupCommand::Create(args))
            .await
            .map_err(|err| anyhow::anyhow!(err.display_message()))?;

        let calls = ctx.client.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].path, "/api/namespaces");
        assert_eq!(
            calls[0].body,
            Some(json!({"registry_id": 12, "slug": "lib", "name": "Library"}))
        );
        Ok(())
    }

    #[tokio::test]
    async fn update_diffs_against_the_stored_org() -> anyhow::Result<()> {
        let console = Console::buffered();
        let ctx = AppContext::new(FakeClient::new().seed("acme", &fixtures::org()), &console);
        let args = GroupUpdateArgs {
            id: Some("acme".into()),
            slug: Some("acme".into()),
            name: Some("Acme Corp".into()),
        };

        handle::<Org, _>(&ctx, GroupCommand::Update(args))
            .await
            .map_err(|err| anyhow::anyhow!(err.display_message()))?;

        let writes = ctx.client.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].path, "/api/orgs/2");
        assert_eq!(writes[0].body, Some(json!({"name": "Acme Corp"})));
        Ok(())
    }

    #[tokio::test]
    async fn team_membership_uses_the_group_path() -> anyhow::Result<()> {
        let console = Console::buffered();
        let ctx = AppContext::new(FakeClient::new(), &console);
        let args = TeamMemberArgs {
            id: Some("library".into()),
            child: Some("ops".into()),
            perm: "owner".into(),
        };

        handle::<Namespace, _>(&ctx, GroupCommand::TeamPerm(args))
            .await
            .map_err(|err| anyhow::anyhow!(err.display_message()))?;

        let writes = ctx.client.writes();
        assert_eq!(writes[0].method, "PUT");
        assert_eq!(writes[0].path, "/api/namespaces/library/teams");
        assert_eq!(
            writes[0].body,
            Some(json!({"namespace": "library", "team": "ops", "perm": "owner"}))
        );
        assert_eq!(console.stderr_text(), "Successfully updated permissions\n");
        Ok(())
    }

    #[tokio::test]
    async fn user_removal_omits_the_permission() -> anyhow::Result<()> {
        let console = Console::buffered();
        let ctx = AppContext::new(FakeClient::new(), &console);
        let args = UserRemoveArgs {
            id: Some("acme".into()),
            child: Some("jdoe".into()),
        };

        handle::<Org, _>(&ctx, GroupCommand::UserRemove(args))
            .await
            .map_err(|err| anyhow::anyhow!(err.display_message()))?;

        let writes = ctx.client.writes();
        assert_eq!(writes[0].method, "DELETE");
        assert_eq!(writes[0].body, Some(json!({"org": "acme", "user": "jdoe"})));
        assert_eq!(console.stderr_text(), "Successfully removed\n");
        Ok(())
    }

    #[tokio::test]
    async fn show_lists_members() -> anyhow::Result<()> {
        let console = Console::buffered();
        let ctx = AppContext::new(FakeClient::new().seed("acme", &fixtures::org()), &console);
        let args = ShowArgs {
            id: Some("acme".into()),
            ..ShowArgs::default()
        };

        handle::<Org, _>(&ctx, GroupCommand::Show(args))
            .await
            .map_err(|err| anyhow::anyhow!(err.display_message()))?;

        let text = console.stdout_text();
        assert!(text.contains("Registry: Hub\n"));
        assert!(text.contains("Users: jdoe\nTeams: Ops\n"));
        assert!(!text.contains("Repos:"));
        Ok(())
    }
}
