use umschlag_client::models::{User, UserPayload};
use umschlag_client::{ClientApi, UserNamespaces, UserOrgs, UserTeams};

use crate::cli::{UserCommand, UserCreateArgs, UserUpdateArgs};
use crate::client::{AppContext, CliResult};
use crate::commands::{self, changed, exclusive, non_empty, require};
use crate::output::{Column, Listing, column};

const ACTIVE_CONFLICT: &str = "Conflict, you can mark it only active OR blocked!";
const ADMIN_CONFLICT: &str = "Conflict, you can mark it only admin OR user!";

const LISTING: Listing = Listing {
    element: "user",
    columns: &[
        column("ID", "id"),
        column("SLUG", "slug"),
        column("USERNAME", "username"),
        column("EMAIL", "email"),
        column("ACTIVE", "active"),
        column("ADMIN", "admin"),
    ],
};

const TEMPLATE: &str = "Slug: \x1b[33m{{ slug }} \x1b[0m
ID: {{ id }}
Username: {{ username }}
Email: {{ email }}
Active: {{ active }}
Admin: {{ admin }}{% if teams %}
Teams: {{ teamlist(teams) }}{% endif %}{% if orgs %}
Orgs: {{ orglist(orgs) }}{% endif %}
Created: {{ created_at | date }}
Updated: {{ updated_at | date }}";

const fn member_listing(element: &'static str, columns: &'static [Column]) -> Listing {
    Listing { element, columns }
}

const TEAM_LISTING: Listing = member_listing(
    "team_user",
    &[
        column("ID", "team_id"),
        column("SLUG", "team.slug"),
        column("NAME", "team.name"),
        column("PERM", "perm"),
    ],
);

const ORG_LISTING: Listing = member_listing(
    "user_org",
    &[
        column("ID", "org_id"),
        column("SLUG", "org.slug"),
        column("NAME", "org.name"),
        column("PERM", "perm"),
    ],
);

const NAMESPACE_LISTING: Listing = member_listing(
    "user_namespace",
    &[
        column("ID", "namespace_id"),
        column("SLUG", "namespace.slug"),
        column("NAME", "namespace.name"),
        column("PERM", "perm"),
    ],
);

pub(crate) async fn handle<C: ClientApi>(
    ctx: &AppContext<'_, C>,
    command: UserCommand,
) -> CliResult<()> {
    match command {
        UserCommand::List(output) => commands::list::<User, C>(ctx, &output, &LISTING).await,
        UserCommand::Show(args) => commands::show::<User, C>(ctx, args, TEMPLATE).await,
        UserCommand::Create(args) => handle_user_create(ctx, args).await,
        UserCommand::Update(args) => handle_user_update(ctx, args).await,
        UserCommand::Delete(args) => commands::delete::<User, C>(ctx, args).await,
        UserCommand::TeamList(args) => {
            commands::member_list::<UserTeams, C>(ctx, args, &TEAM_LISTING).await
        }
        UserCommand::TeamAppend(args) => commands::member_append::<UserTeams, C>(ctx, args.into()).await,
        UserCommand::TeamPerm(args) => commands::member_perm::<UserTeams, C>(ctx, args.into()).await,
        UserCommand::TeamRemove(args) => commands::member_remove::<UserTeams, C>(ctx, args.into()).await,
        UserCommand::OrgList(args) => {
            commands::member_list::<UserOrgs, C>(ctx, args, &ORG_LISTING).await
        }
        UserCommand::OrgAppend(args) => commands::member_append::<UserOrgs, C>(ctx, args.into()).await,
        UserCommand::OrgPerm(args) => commands::member_perm::<UserOrgs, C>(ctx, args.into()).await,
        UserCommand::OrgRemove(args) => commands::member_remove::<UserOrgs, C>(ctx, args.into()).await,
        UserCommand::NamespaceList(args) => {
            commands::member_list::<UserNamespaces, C>(ctx, args, &NAMESPACE_LISTING).await
        }
        UserCommand::NamespaceAppend(args) => {
            commands::member_append::<UserNamespaces, C>(ctx, args.into()).await
        }
        UserCommand::NamespacePerm(args) => {
            commands::member_perm::<UserNamespaces, C>(ctx, args.into()).await
        }
        UserCommand::NamespaceRemove(args) => {
            commands::member_remove::<UserNamespaces, C>(ctx, args.into()).await
        }
    }
}

async fn handle_user_create<C: ClientApi>(
    ctx: &AppContext<'_, C>,
    args: UserCreateArgs,
) -> CliResult<()> {
    let active = exclusive(args.active, args.blocked, ACTIVE_CONFLICT)?;
    let admin = exclusive(args.admin, args.regular, ADMIN_CONFLICT)?;
    let username = require(args.username, "You must provide a username.")?;
    let email = require(args.email, "You must provide an email.")?;
    let password = require(args.password, "You must provide a password.")?;

    let payload = UserPayload {
        slug: non_empty(args.slug),
        username: Some(username),
        email: Some(email),
        password: Some(password),
        active,
        admin,
    };
    commands::create::<User, C>(ctx, &payload).await
}

async fn handle_user_update<C: ClientApi>(
    ctx: &AppContext<'_, C>,
    args: UserUpdateArgs,
) -> CliResult<()> {
    let active = exclusive(args.active, args.blocked, ACTIVE_CONFLICT)?;
    let admin = exclusive(args.admin, args.regular, ADMIN_CONFLICT)?;
    let slug = non_empty(args.slug);
    let username = non_empty(args.username);
    let email = non_empty(args.email);
    let password = non_empty(args.password);

    commands::update::<User, C, _>(ctx, args.id, move |current| UserPayload {
        slug: changed(slug, &current.slug),
        username: changed(username, &current.username),
        email: changed(email, &current.email),
        password,
        active: changed(active, &current.active),
        admin: changed(admin, &current.admin),
    })
    .await
}
