use umschlag_client::ClientApi;
use umschlag_client::models::{Registry, RegistryPayload};

use crate::cli::{IdArgs, RegistryCommand, RegistryCreateArgs, RegistryUpdateArgs};
use crate::client::{AppContext, CliResult};
use crate::commands::{self, changed, exclusive, non_empty, require, require_id};
use crate::output::{Listing, column};

const SSL_CONFLICT: &str = "Conflict, you can either use SSL or not!";

const LISTING: Listing = Listing {
    element: "registry",
    columns: &[
        column("ID", "id"),
        column("SLUG", "slug"),
        column("NAME", "name"),
        column("HOST", "host"),
        column("SSL", "use_ssl"),
    ],
};

const TEMPLATE: &str = "Slug: \x1b[33m{{ slug }} \x1b[0m
ID: {{ id }}
Name: {{ name }}
Host: {{ host }}
Use SSL: {{ use_ssl }}{% if orgs %}
Orgs: {{ orglist(orgs) }}{% endif %}
Created: {{ created_at | date }}
Updated: {{ updated_at | date }}";

pub(crate) async fn handle<C: ClientApi>(
    ctx: &AppContext<'_, C>,
    command: RegistryCommand,
) -> CliResult<()> {
    match command {
        RegistryCommand::List(output) => commands::list::<Registry, C>(ctx, &output, &LISTING).await,
        RegistryCommand::Show(args) => commands::show::<Registry, C>(ctx, args, TEMPLATE).await,
        RegistryCommand::Create(args) => handle_registry_create(ctx, args).await,
        RegistryCommand::Update(args) => handle_registry_update(ctx, args).await,
        RegistryCommand::Delete(args) => commands::delete::<Registry, C>(ctx, args).await,
        RegistryCommand::Sync(args) => handle_registry_sync(ctx, args).await,
    }
}

async fn handle_registry_create<C: ClientApi>(
    ctx: &AppContext<'_, C>,
    args: RegistryCreateArgs,
) -> CliResult<()> {
    let use_ssl = exclusive(args.use_ssl, args.no_ssl, SSL_CONFLICT)?;
    let name = require(args.name, "You must provide a name.")?;
    let host = require(args.host, "You must provide a host.")?;

    let payload = RegistryPayload {
        slug: non_empty(args.slug),
        name: Some(name),
        host: Some(host),
        use_ssl,
    };
    commands::create::<Registry, C>(ctx, &payload).await
}

async fn handle_registry_update<C: ClientApi>(
    ctx: &AppContext<'_, C>,
    args: RegistryUpdateArgs,
) -> CliResult<()> {
    let use_ssl = exclusive(args.use_ssl, args.no_ssl, SSL_CONFLICT)?;
    let (slug, name, host) = (
        non_empty(args.slug),
        non_empty(args.name),
        non_empty(args.host),
    );

    commands::update::<Registry, C, _>(ctx, args.id, move |current| RegistryPayload {
        slug: changed(slug, &current.slug),
        name: changed(name, &current.name),
        host: changed(host, &current.host),
        use_ssl: changed(use_ssl, &current.use_ssl),
    })
    .await
}

async fn handle_registry_sync<C: ClientApi>(ctx: &AppContext<'_, C>, args: IdArgs) -> CliResult<()> {
    let id = require_id(args.id)?;
    ctx.client.registry_sync(&id).await?;
    ctx.console.notice("Successfully synced");
    Ok(())
}
