//! Read-only catalog views: repositories and their tags.

use umschlag_client::ClientApi;
use umschlag_client::models::{Repo, Tag};

use crate::cli::CatalogCommand;
use crate::client::{AppContext, CliResult};
use crate::commands;
use crate::output::{Listing, column};

const REPO_LISTING: Listing = Listing {
    element: "repo",
    columns: &[
        column("ID", "id"),
        column("SLUG", "slug"),
        column("NAME", "full_name"),
    ],
};

const REPO_TEMPLATE: &str = "Slug: \x1b[33m{{ slug }} \x1b[0m
ID: {{ id }}
Name: {{ full_name }}{% if tags %}
Tags: {{ taglist(tags) }}{% endif %}
Created: {{ created_at | date }}
Updated: {{ updated_at | date }}";

const TAG_LISTING: Listing = Listing {
    element: "tag",
    columns: &[
        column("ID", "id"),
        column("SLUG", "slug"),
        column("NAME", "full_name"),
    ],
};

const TAG_TEMPLATE: &str = "Slug: \x1b[33m{{ slug }} \x1b[0m
ID: {{ id }}
Name: {{ full_name }}
Created: {{ created_at | date }}
Updated: {{ updated_at | date }}";

pub(crate) async fn handle_repo<C: ClientApi>(
    ctx: &AppContext<'_, C>,
    command: CatalogCommand,
) -> CliResult<()> {
    match command {
        CatalogCommand::List(output) => commands::list::<Repo, C>(ctx, &output, &REPO_LISTING).await,
        CatalogCommand::Show(args) => commands::show::<Repo, C>(ctx, args, REPO_TEMPLATE).await,
        CatalogCommand::Delete(args) => commands::delete::<Repo, C>(ctx, args).await,
    }
}

pub(crate) async fn handle_tag<C: ClientApi>(
    ctx: &AppContext<'_, C>,
    command: CatalogCommand,
) -> CliResult<()> {
    match command {
        CatalogCommand::List(output) => commands::list::<Tag, C>(ctx, &output, &TAG_LISTING).await,
        CatalogCommand::Show(args) => commands::show::<Tag, C>(ctx, args, TAG_TEMPLATE).await,
        CatalogCommand::Delete(args) => commands::delete::<Tag, C>(ctx, args).await,
    }
}
