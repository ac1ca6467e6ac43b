//! Argument parsing and command dispatch.

use std::env;

use clap::{Args, Parser, Subcommand};
use tracing::{debug, warn};
use umschlag_client::ClientApi;
use umschlag_client::models::{Namespace, Org};
use umschlag_telemetry::{DEFAULT_LOG_LEVEL, LoggingConfig, init_logging, parse_log_format};
use uuid::Uuid;

use crate::client::{AppContext, CliError, CliResult, Connection};
use crate::commands::{MemberInput, group, profile, registry, repo, team, user};
use crate::output::{Console, OutputMode};
use crate::update::{self, DEFAULT_UPDATE_URL};

const ENV_FILE_VAR: &str = "UMSCHLAG_ENV_FILE";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Parses CLI arguments, executes the requested command and reports the
/// outcome. Returns the process exit code.
pub async fn run() -> i32 {
    let env_file = load_env_file();
    let console = Console::stdio();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => return parse_failure(&err),
    };

    if let Err(err) = install_logging(&cli) {
        console.notice(&format!("Error: {}", err.display_message()));
        return err.exit_code();
    }
    if let Some(Err(err)) = env_file {
        warn!(error = %err, "failed to load environment file");
    }

    execute(cli, &console).await
}

/// Parse `args` and execute the command against `console`.
#[cfg(test)]
pub(crate) async fn run_from<I, T>(args: I, console: &Console) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    match Cli::try_parse_from(args) {
        Ok(cli) => execute(cli, console).await,
        Err(err) => parse_failure(&err),
    }
}

async fn execute(cli: Cli, console: &Console) -> i32 {
    let trace_id = Uuid::new_v4();
    let update_check = cli
        .update
        .then(|| update::spawn(cli.update_url.clone(), console))
        .flatten();

    let connection = Connection {
        server: cli.server,
        token: cli.token,
        timeout_secs: cli.timeout,
    }
    .with_legacy_env();
    debug!(trace_id = %trace_id, command = command_label(&cli.command), "dispatching command");

    let result = match connection.connect(&trace_id) {
        Ok(client) => dispatch(&AppContext::new(client, console), cli.command).await,
        Err(err) => Err(err),
    };

    if let Some(handle) = update_check {
        handle.abort();
    }

    match result {
        Ok(()) => 0,
        Err(err) => {
            console.notice(&format!("Error: {}", err.display_message()));
            err.exit_code()
        }
    }
}

pub(crate) async fn dispatch<C: ClientApi>(
    ctx: &AppContext<'_, C>,
    command: Command,
) -> CliResult<()> {
    match command {
        Command::Registry(command) => registry::handle(ctx, command).await,
        Command::Org(command) => group::handle::<Org, C>(ctx, command).await,
        Command::Namespace(command) => group::handle::<Namespace, C>(ctx, command).await,
        Command::Repo(command) => repo::handle_repo(ctx, command).await,
        Command::Tag(command) => repo::handle_tag(ctx, command).await,
        Command::User(command) => user::handle(ctx, command).await,
        Command::Team(command) => team::handle(ctx, command).await,
        Command::Profile(command) => profile::handle(ctx, command).await,
    }
}

fn parse_failure(err: &clap::Error) -> i32 {
    if let Err(print_err) = err.print() {
        debug!(error = %print_err, "failed to print usage");
    }
    i32::from(err.use_stderr())
}

fn install_logging(cli: &Cli) -> CliResult<()> {
    let format = parse_log_format(cli.log_format.as_deref())
        .map_err(|err| CliError::validation(err.to_string()))?;
    let config = LoggingConfig {
        level: &cli.log_level,
        format,
        build_sha: option_env!("UMSCHLAG_BUILD_SHA").unwrap_or("dev"),
    };
    init_logging(&config).map_err(CliError::failure)
}

fn load_env_file() -> Option<Result<(), dotenv::Error>> {
    let path = env::var(ENV_FILE_VAR).ok().filter(|path| !path.is_empty())?;
    Some(dotenv::from_path(path))
}

const fn command_label(command: &Command) -> &'static str {
    match command {
        Command::Registry(_) => "registry",
        Command::Org(_) => "org",
        Command::Namespace(_) => "namespace",
        Command::Repo(_) => "repo",
        Command::Tag(_) => "tag",
        Command::User(_) => "user",
        Command::Team(_) => "team",
        Command::Profile(_) => "profile",
    }
}

#[derive(Parser)]
#[command(
    name = "umschlag-cli",
    version,
    about = "Docker distribution management system"
)]
pub(crate) struct Cli {
    #[arg(
        short = 's',
        long,
        global = true,
        env = "UMSCHLAG_SERVER",
        help = "Umschlag API server"
    )]
    server: Option<String>,
    #[arg(
        short = 't',
        long,
        global = true,
        env = "UMSCHLAG_TOKEN",
        hide_env_values = true,
        help = "Umschlag API token"
    )]
    token: Option<String>,
    #[arg(
        long,
        global = true,
        env = "UMSCHLAG_HTTP_TIMEOUT_SECS",
        default_value_t = DEFAULT_TIMEOUT_SECS,
        help = "Request timeout in seconds"
    )]
    timeout: u64,
    #[arg(
        long,
        global = true,
        env = "UMSCHLAG_LOG_LEVEL",
        default_value = DEFAULT_LOG_LEVEL,
        help = "Log level or filter directive, RUST_LOG takes precedence"
    )]
    log_level: String,
    #[arg(
        long,
        global = true,
        env = "UMSCHLAG_LOG_FORMAT",
        help = "Log format, pretty or json"
    )]
    log_format: Option<String>,
    #[arg(
        long,
        global = true,
        env = "UMSCHLAG_UPDATE",
        help = "Check for a newer release in the background"
    )]
    update: bool,
    #[arg(
        long,
        global = true,
        env = "UMSCHLAG_UPDATE_URL",
        default_value = DEFAULT_UPDATE_URL,
        help = "Base URL of the release manifests"
    )]
    update_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Registry related sub-commands
    #[command(subcommand)]
    Registry(RegistryCommand),
    /// Org related sub-commands
    #[command(subcommand)]
    Org(GroupCommand),
    /// Namespace related sub-commands
    #[command(subcommand)]
    Namespace(GroupCommand),
    /// Repo related sub-commands
    #[command(subcommand)]
    Repo(CatalogCommand),
    /// Tag related sub-commands
    #[command(subcommand)]
    Tag(CatalogCommand),
    /// User related sub-commands
    #[command(subcommand)]
    User(UserCommand),
    /// Team related sub-commands
    #[command(subcommand)]
    Team(TeamCommand),
    /// Profile related sub-commands
    #[command(subcommand)]
    Profile(ProfileCommand),
}

#[derive(Subcommand)]
pub(crate) enum RegistryCommand {
    /// List all registries
    #[command(visible_alias = "ls")]
    List(OutputArgs),
    /// Display a registry
    Show(ShowArgs),
    /// Create a registry
    Create(RegistryCreateArgs),
    /// Update a registry
    Update(RegistryUpdateArgs),
    /// Delete a registry
    #[command(visible_alias = "rm")]
    Delete(IdArgs),
    /// Sync a registry
    Sync(IdArgs),
}

#[derive(Subcommand)]
pub(crate) enum GroupCommand {
    /// List all records
    #[command(visible_alias = "ls")]
    List(OutputArgs),
    /// Display a record
    Show(ShowArgs),
    /// Create a record within a registry
    Create(GroupCreateArgs),
    /// Update a record
    Update(GroupUpdateArgs),
    /// Delete a record
    #[command(visible_alias = "rm")]
    Delete(IdArgs),
    /// List assigned users
    UserList(ShowArgs),
    /// Append a user
    UserAppend(UserMemberArgs),
    /// Update user permissions
    UserPerm(UserMemberArgs),
    /// Remove a user
    UserRemove(UserRemoveArgs),
    /// List assigned teams
    TeamList(ShowArgs),
    /// Append a team
    TeamAppend(TeamMemberArgs),
    /// Update team permissions
    TeamPerm(TeamMemberArgs),
    /// Remove a team
    TeamRemove(TeamRemoveArgs),
}

#[derive(Subcommand)]
pub(crate) enum CatalogCommand {
    /// List all records
    #[command(visible_alias = "ls")]
    List(OutputArgs),
    /// Display a record
    Show(ShowArgs),
    /// Delete a record
    #[command(visible_alias = "rm")]
    Delete(IdArgs),
}

#[derive(Subcommand)]
pub(crate) enum UserCommand {
    /// List all users
    #[command(visible_alias = "ls")]
    List(OutputArgs),
    /// Display a user
    Show(ShowArgs),
    /// Create a user
    Create(UserCreateArgs),
    /// Update a user
    Update(UserUpdateArgs),
    /// Delete a user
    #[command(visible_alias = "rm")]
    Delete(IdArgs),
    /// List assigned teams
    TeamList(ShowArgs),
    /// Append a team to user
    TeamAppend(TeamMemberArgs),
    /// Update user team permissions
    TeamPerm(TeamMemberArgs),
    /// Remove a team from user
    TeamRemove(TeamRemoveArgs),
    /// List assigned orgs
    OrgList(ShowArgs),
    /// Append an org to user
    OrgAppend(OrgMemberArgs),
    /// Update user org permissions
    OrgPerm(OrgMemberArgs),
    /// Remove an org from user
    OrgRemove(OrgRemoveArgs),
    /// List assigned namespaces
    NamespaceList(ShowArgs),
    /// Append a namespace to user
    NamespaceAppend(NamespaceMemberArgs),
    /// Update user namespace permissions
    NamespacePerm(NamespaceMemberArgs),
    /// Remove a namespace from user
    NamespaceRemove(NamespaceRemoveArgs),
}

#[derive(Subcommand)]
pub(crate) enum TeamCommand {
    /// List all teams
    #[command(visible_alias = "ls")]
    List(OutputArgs),
    /// Display a team
    Show(ShowArgs),
    /// Create a team
    Create(TeamCreateArgs),
    /// Update a team
    Update(TeamUpdateArgs),
    /// Delete a team
    #[command(visible_alias = "rm")]
    Delete(IdArgs),
    /// List assigned users
    UserList(ShowArgs),
    /// Append a user to team
    UserAppend(UserMemberArgs),
    /// Update team user permissions
    UserPerm(UserMemberArgs),
    /// Remove a user from team
    UserRemove(UserRemoveArgs),
    /// List assigned orgs
    OrgList(ShowArgs),
    /// Append an org to team
    OrgAppend(OrgMemberArgs),
    /// Update team org permissions
    OrgPerm(OrgMemberArgs),
    /// Remove an org from team
    OrgRemove(OrgRemoveArgs),
    /// List assigned namespaces
    NamespaceList(ShowArgs),
    /// Append a namespace to team
    NamespaceAppend(NamespaceMemberArgs),
    /// Update team namespace permissions
    NamespacePerm(NamespaceMemberArgs),
    /// Remove a namespace from team
    NamespaceRemove(NamespaceRemoveArgs),
}

#[derive(Subcommand)]
pub(crate) enum ProfileCommand {
    /// Display your profile
    Show(OutputArgs),
    /// Update your profile
    Update(ProfileUpdateArgs),
    /// Print the token of the current session
    Token,
    /// Exchange credentials for a token
    Login(LoginArgs),
}

#[derive(Args, Default)]
pub(crate) struct OutputArgs {
    #[arg(long, help = "Custom output template")]
    pub(crate) format: Option<String>,
    #[arg(long, help = "Print in JSON format")]
    pub(crate) json: bool,
    #[arg(long, help = "Print in XML format")]
    pub(crate) xml: bool,
}

impl OutputArgs {
    pub(crate) fn mode(&self) -> CliResult<OutputMode<'_>> {
        OutputMode::resolve(self.format.as_deref(), self.json, self.xml)
    }
}

#[derive(Args, Default)]
pub(crate) struct IdArgs {
    #[arg(short = 'i', long, help = "ID or slug of the record")]
    pub(crate) id: Option<String>,
}

#[derive(Args, Default)]
pub(crate) struct ShowArgs {
    #[arg(short = 'i', long, help = "ID or slug of the record")]
    pub(crate) id: Option<String>,
    #[command(flatten)]
    pub(crate) output: OutputArgs,
}

#[derive(Args, Default)]
pub(crate) struct RegistryCreateArgs {
    #[arg(long, help = "Provide a slug")]
    pub(crate) slug: Option<String>,
    #[arg(long, help = "Provide a name")]
    pub(crate) name: Option<String>,
    #[arg(long, help = "Provide a host")]
    pub(crate) host: Option<String>,
    #[arg(long, help = "Connect to the registry with SSL")]
    pub(crate) use_ssl: bool,
    #[arg(long, help = "Connect to the registry without SSL")]
    pub(crate) no_ssl: bool,
}

#[derive(Args, Default)]
pub(crate) struct RegistryUpdateArgs {
    #[arg(short = 'i', long, help = "Registry ID or slug to update")]
    pub(crate) id: Option<String>,
    #[arg(long, help = "Provide a slug")]
    pub(crate) slug: Option<String>,
    #[arg(long, help = "Provide a name")]
    pub(crate) name: Option<String>,
    #[arg(long, help = "Provide a host")]
    pub(crate) host: Option<String>,
    #[arg(long, help = "Connect to the registry with SSL")]
    pub(crate) use_ssl: bool,
    #[arg(long, help = "Connect to the registry without SSL")]
    pub(crate) no_ssl: bool,
}

#[derive(Args, Default)]
pub(crate) struct GroupCreateArgs {
    #[arg(long, help = "Registry ID or slug")]
    pub(crate) registry: Option<String>,
    #[arg(long, help = "Provide a slug")]
    pub(crate) slug: Option<String>,
    #[arg(long, help = "Provide a name")]
    pub(crate) name: Option<String>,
}

#[derive(Args, Default)]
pub(crate) struct GroupUpdateArgs {
    #[arg(short = 'i', long, help = "ID or slug to update")]
    pub(crate) id: Option<String>,
    #[arg(long, help = "Provide a slug")]
    pub(crate) slug: Option<String>,
    #[arg(long, help = "Provide a name")]
    pub(crate) name: Option<String>,
}

#[derive(Args, Default)]
pub(crate) struct UserCreateArgs {
    #[arg(long, help = "Provide a slug")]
    pub(crate) slug: Option<String>,
    #[arg(long, help = "Provide a username")]
    pub(crate) username: Option<String>,
    #[arg(long, help = "Provide an email")]
    pub(crate) email: Option<String>,
    #[arg(long, help = "Provide a password")]
    pub(crate) password: Option<String>,
    #[arg(long, help = "Mark user as active")]
    pub(crate) active: bool,
    #[arg(long, help = "Mark user as blocked")]
    pub(crate) blocked: bool,
    #[arg(long, help = "Mark user as admin")]
    pub(crate) admin: bool,
    #[arg(long = "user", help = "Mark user as regular user")]
    pub(crate) regular: bool,
}

#[derive(Args, Default)]
pub(crate) struct UserUpdateArgs {
    #[arg(short = 'i', long, help = "User ID or slug to update")]
    pub(crate) id: Option<String>,
    #[arg(long, help = "Provide a slug")]
    pub(crate) slug: Option<String>,
    #[arg(long, help = "Provide a username")]
    pub(crate) username: Option<String>,
    #[arg(long, help = "Provide an email")]
    pub(crate) email: Option<String>,
    #[arg(long, help = "Provide a password")]
    pub(crate) password: Option<String>,
    #[arg(long, help = "Mark user as active")]
    pub(crate) active: bool,
    #[arg(long, help = "Mark user as blocked")]
    pub(crate) blocked: bool,
    #[arg(long, help = "Mark user as admin")]
    pub(crate) admin: bool,
    #[arg(long = "user", help = "Mark user as regular user")]
    pub(crate) regular: bool,
}

#[derive(Args, Default)]
pub(crate) struct TeamCreateArgs {
    #[arg(long, help = "Provide a slug")]
    pub(crate) slug: Option<String>,
    #[arg(long, help = "Provide a name")]
    pub(crate) name: Option<String>,
}

#[derive(Args, Default)]
pub(crate) struct TeamUpdateArgs {
    #[arg(short = 'i', long, help = "Team ID or slug to update")]
    pub(crate) id: Option<String>,
    #[arg(long, help = "Provide a slug")]
    pub(crate) slug: Option<String>,
    #[arg(long, help = "Provide a name")]
    pub(crate) name: Option<String>,
}

#[derive(Args, Default)]
pub(crate) struct ProfileUpdateArgs {
    #[arg(long, help = "Provide a slug")]
    pub(crate) slug: Option<String>,
    #[arg(long, help = "Provide a username")]
    pub(crate) username: Option<String>,
    #[arg(long, help = "Provide an email")]
    pub(crate) email: Option<String>,
    #[arg(long, help = "Provide a password")]
    pub(crate) password: Option<String>,
}

#[derive(Args, Default)]
pub(crate) struct LoginArgs {
    #[arg(long, help = "Account username")]
    pub(crate) username: Option<String>,
    #[arg(long, help = "Account password")]
    pub(crate) password: Option<String>,
}

macro_rules! member_args {
    ($change:ident, $remove:ident, $flag:literal, $value:literal, $help:literal $(, $short:literal)?) => {
        #[derive(Args, Default)]
        pub(crate) struct $change {
            #[arg(short = 'i', long, help = "ID or slug of the record to modify")]
            pub(crate) id: Option<String>,
            #[arg(long = $flag, value_name = $value, help = $help $(, short = $short)?)]
            pub(crate) child: Option<String>,
            #[arg(
                long,
                default_value = "user",
                help = "Permission, can be user, admin or owner"
            )]
            pub(crate) perm: String,
        }

        #[derive(Args, Default)]
        pub(crate) struct $remove {
            #[arg(short = 'i', long, help = "ID or slug of the record to modify")]
            pub(crate) id: Option<String>,
            #[arg(long = $flag, value_name = $value, help = $help $(, short = $short)?)]
            pub(crate) child: Option<String>,
        }

        impl From<$change> for MemberInput {
            fn from(args: $change) -> Self {
                Self {
                    parent: args.id,
                    child: args.child,
                    perm: Some(args.perm),
                }
            }
        }

        impl From<$remove> for MemberInput {
            fn from(args: $remove) -> Self {
                Self {
                    parent: args.id,
                    child: args.child,
                    perm: None,
                }
            }
        }
    };
}

member_args!(UserMemberArgs, UserRemoveArgs, "user", "USER", "User ID or slug", 'u');
member_args!(TeamMemberArgs, TeamRemoveArgs, "team", "TEAM", "Team ID or slug");
member_args!(OrgMemberArgs, OrgRemoveArgs, "org", "ORG", "Org ID or slug");
member_args!(
    NamespaceMemberArgs,
    NamespaceRemoveArgs,
    "namespace",
    "NAMESPACE",
    "Namespace ID or slug"
);

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use httpmock::prelude::*;
    use serde_json::json;

    #[test]
    fn command_tree_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn relation_subcommands_are_hyphenated() {
        let cli = Cli::try_parse_from([
            "umschlag-cli",
            "team",
            "user-append",
            "--id",
            "t1",
            "-u",
            "u1",
            "--perm",
            "admin",
        ])
        .expect("arguments parse");
        let Command::Team(TeamCommand::UserAppend(args)) = cli.command else {
            panic!("unexpected command");
        };
        let input = MemberInput::from(args);
        assert_eq!(input.parent.as_deref(), Some("t1"));
        assert_eq!(input.child.as_deref(), Some("u1"));
        assert_eq!(input.perm.as_deref(), Some("admin"));
    }

    #[test]
    fn member_perm_defaults_to_user() {
        let cli = Cli::try_parse_from(["umschlag-cli", "org", "team-append", "-i", "acme", "--team", "ops"])
            .expect("arguments parse");
        let Command::Org(GroupCommand::TeamAppend(args)) = cli.command else {
            panic!("unexpected command");
        };
        assert_eq!(args.perm, "user");
    }

    #[test]
    fn global_flags_work_after_subcommands() {
        let cli = Cli::try_parse_from([
            "umschlag-cli",
            "registry",
            "ls",
            "--server",
            "http://localhost:8080",
            "--timeout",
            "5",
        ])
        .expect("arguments parse");
        assert_eq!(cli.server.as_deref(), Some("http://localhost:8080"));
        assert_eq!(cli.timeout, 5);
        assert!(matches!(cli.command, Command::Registry(RegistryCommand::List(_))));
    }

    #[tokio::test]
    async fn unknown_arguments_exit_with_one() {
        let console = Console::buffered();
        let code = run_from(["umschlag-cli", "registry", "frobnicate"], &console).await;
        assert_eq!(code, 1);
    }

    #[tokio::test]
    async fn missing_id_fails_before_any_request() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.path_includes("/api");
            then.status(500);
        });

        let console = Console::buffered();
        let code = run_from(
            ["umschlag-cli", "-s", &server.base_url(), "registry", "show"],
            &console,
        )
        .await;

        assert_eq!(code, 1);
        assert_eq!(
            console.stderr_text(),
            "Error: You must provide an ID or a slug.\n"
        );
        mock.assert_calls(0);
    }

    #[tokio::test]
    async fn missing_member_names_the_child_resource() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.path_includes("/api");
            then.status(500);
        });

        let console = Console::buffered();
        let code = run_from(
            [
                "umschlag-cli",
                "-s",
                &server.base_url(),
                "team",
                "user-remove",
                "-i",
                "t1",
            ],
            &console,
        )
        .await;

        assert_eq!(code, 1);
        assert_eq!(
            console.stderr_text(),
            "Error: You must provide a user ID or slug.\n"
        );
        mock.assert_calls(0);
    }

    #[tokio::test]
    async fn server_errors_print_the_envelope_message() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET).path("/api/registries/missing");
            then.status(404)
                .json_body(json!({"status": 404, "message": "not found"}));
        });

        let console = Console::buffered();
        let code = run_from(
            [
                "umschlag-cli",
                "--server",
                &server.base_url(),
                "registry",
                "show",
                "--id",
                "missing",
            ],
            &console,
        )
        .await;

        mock.assert();
        assert_eq!(code, 2);
        assert_eq!(console.stderr_text(), "Error: not found\n");
        assert_eq!(console.stdout_text(), "");
    }

    #[tokio::test]
    async fn create_registry_end_to_end() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/registries")
                .header("authorization", "Bearer secret")
                .header_exists("x-request-id")
                .json_body(json!({"name": "foo", "host": "example.com", "use_ssl": true}));
            then.status(201)
                .json_body(json!({"id": 1, "slug": "foo", "name": "foo", "host": "example.com", "use_ssl": true}));
        });

        let console = Console::buffered();
        let code = run_from(
            [
                "umschlag-cli",
                "-s",
                &server.base_url(),
                "-t",
                "secret",
                "registry",
                "create",
                "--name",
                "foo",
                "--host",
                "example.com",
                "--use-ssl",
            ],
            &console,
        )
        .await;

        mock.assert();
        assert_eq!(code, 0);
        assert_eq!(console.stderr_text(), "Successfully created\n");
    }

    #[tokio::test]
    async fn invalid_server_address_exits_with_one() {
        let console = Console::buffered();
        let code = run_from(
            ["umschlag-cli", "-s", "::not a url::", "tag", "list"],
            &console,
        )
        .await;
        assert_eq!(code, 1);
        assert_eq!(
            console.stderr_text(),
            "Error: Invalid server address, bad format?\n"
        );
    }
}
