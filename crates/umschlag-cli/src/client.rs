//! Error types, client construction and the context shared by command handlers.

use std::env;
use std::fmt::{self, Display, Formatter};
use std::time::Duration;

use umschlag_client::{ClientApi, ClientError, DefaultClient};
use uuid::Uuid;

use crate::output::Console;

const LEGACY_SERVER_ENV: &str = "HARBOR_SERVER";
const LEGACY_TOKEN_ENV: &str = "HARBOR_TOKEN";

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 1,
            Self::Failure(_) => 2,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.display_message())
    }
}

impl std::error::Error for CliError {}

impl From<ClientError> for CliError {
    fn from(error: ClientError) -> Self {
        Self::failure(error)
    }
}

/// Application context passed to command handlers.
pub(crate) struct AppContext<'a, C> {
    pub(crate) client: C,
    pub(crate) console: &'a Console,
}

impl<'a, C: ClientApi> AppContext<'a, C> {
    pub(crate) const fn new(client: C, console: &'a Console) -> Self {
        Self { client, console }
    }
}

/// Connection settings collected from flags and the environment.
#[derive(Debug, Clone, Default)]
pub(crate) struct Connection {
    pub(crate) server: Option<String>,
    pub(crate) token: Option<String>,
    pub(crate) timeout_secs: u64,
}

impl Connection {
    /// Fill unset values from the historical `HARBOR_*` variables.
    #[must_use]
    pub(crate) fn with_legacy_env(mut self) -> Self {
        if self.server.is_none() {
            self.server = env::var(LEGACY_SERVER_ENV).ok();
        }
        if self.token.is_none() {
            self.token = env::var(LEGACY_TOKEN_ENV).ok();
        }
        self
    }

    /// Build the HTTP client, tagging every request with `trace_id`.
    pub(crate) fn connect(&self, trace_id: &Uuid) -> CliResult<DefaultClient> {
        let server = self
            .server
            .as_deref()
            .map(str::trim)
            .filter(|server| !server.is_empty())
            .ok_or_else(|| CliError::validation("You must provide the server address."))?;

        let mut builder = DefaultClient::builder(server)
            .timeout(Duration::from_secs(self.timeout_secs))
            .request_id(trace_id.to_string());
        if let Some(token) = self
            .token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
        {
            builder = builder.token(token);
        }

        builder.build().map_err(|err| match err {
            ClientError::InvalidServer { .. } => {
                tracing::debug!(error = %err, "rejected server address");
                CliError::validation("Invalid server address, bad format?")
            }
            ClientError::InvalidToken => CliError::validation(err.to_string()),
            other => CliError::failure(other),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connection(server: Option<&str>, token: Option<&str>) -> Connection {
        Connection {
            server: server.map(str::to_string),
            token: token.map(str::to_string),
            timeout_secs: 5,
        }
    }

    #[test]
    fn exit_codes_split_validation_from_failures() {
        assert_eq!(CliError::validation("missing").exit_code(), 1);
        assert_eq!(
            CliError::failure(anyhow::anyhow!("boom")).exit_code(),
            2
        );
    }

    #[test]
    fn server_errors_keep_the_server_message() {
        let err = CliError::from(ClientError::Api {
            status: 404,
            message: "not found".into(),
        });
        assert_eq!(err.display_message(), "not found");
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn missing_server_is_a_validation_error() {
        for server in [None, Some(""), Some("   ")] {
            let err = connection(server, None)
                .connect(&Uuid::new_v4())
                .expect_err("server is required");
            assert_eq!(err.display_message(), "You must provide the server address.");
            assert_eq!(err.exit_code(), 1);
        }
    }

    #[test]
    fn malformed_server_is_a_validation_error() {
        let err = connection(Some("not a url"), None)
            .connect(&Uuid::new_v4())
            .expect_err("server must parse");
        assert_eq!(err.display_message(), "Invalid server address, bad format?");
    }

    #[test]
    fn valid_settings_build_a_client() {
        let client = connection(Some("https://umschlag.example.com"), Some("secret"))
            .connect(&Uuid::new_v4())
            .expect("client builds");
        assert_eq!(client.base_url().as_str(), "https://umschlag.example.com/");
    }
}
