//! The caller's own account and session token.

use umschlag_client::ClientApi;
use umschlag_client::models::ProfilePayload;

use crate::cli::{LoginArgs, OutputArgs, ProfileCommand, ProfileUpdateArgs};
use crate::client::{AppContext, CliError, CliResult};
use crate::commands::{changed, non_empty, require};
use crate::output::render_record;

const TEMPLATE: &str = "Slug: \x1b[33m{{ slug }} \x1b[0m
ID: {{ id }}
Username: {{ username }}
Email: {{ email }}
Created: {{ created_at | date }}
Updated: {{ updated_at | date }}";

pub(crate) async fn handle<C: ClientApi>(
    ctx: &AppContext<'_, C>,
    command: ProfileCommand,
) -> CliResult<()> {
    match command {
        ProfileCommand::Show(output) => handle_profile_show(ctx, &output).await,
        ProfileCommand::Update(args) => handle_profile_update(ctx, args).await,
        ProfileCommand::Token => handle_profile_token(ctx).await,
        ProfileCommand::Login(args) => handle_profile_login(ctx, args).await,
    }
}

async fn handle_profile_show<C: ClientApi>(
    ctx: &AppContext<'_, C>,
    output: &OutputArgs,
) -> CliResult<()> {
    let mode = output.mode()?;
    let profile = ctx.client.profile_get().await?;
    render_record(ctx.console, mode, "profile", TEMPLATE, &profile)
}

async fn handle_profile_update<C: ClientApi>(
    ctx: &AppContext<'_, C>,
    args: ProfileUpdateArgs,
) -> CliResult<()> {
    let current = ctx.client.profile_get().await?;
    let payload = ProfilePayload {
        slug: changed(non_empty(args.slug), &current.slug),
        username: changed(non_empty(args.username), &current.username),
        email: changed(non_empty(args.email), &current.email),
        password: non_empty(args.password),
    };

    if payload == ProfilePayload::default() {
        ctx.console.notice("Nothing to update...");
        return Ok(());
    }

    ctx.client.profile_update(&payload).await?;
    ctx.console.notice("Successfully updated");
    Ok(())
}

async fn handle_profile_token<C: ClientApi>(ctx: &AppContext<'_, C>) -> CliResult<()> {
    if !ctx.client.is_authenticated().await? {
        return Err(CliError::validation("You must provide a valid token."));
    }
    let token = ctx.client.profile_token().await?;
    ctx.console.line(&token.token)
}

async fn handle_profile_login<C: ClientApi>(
    ctx: &AppContext<'_, C>,
    args: LoginArgs,
) -> CliResult<()> {
    let username = require(args.username, "You must provide a username.")?;
    let password = require(args.password, "You must provide a password.")?;
    let token = ctx.client.auth_login(&username, &password).await?;
    ctx.console.line(&token.token)
}
