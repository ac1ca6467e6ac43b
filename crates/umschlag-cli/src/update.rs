//! Background check for newer releases.
//!
//! Release manifests are published per platform as
//! `{base}/umschlag-cli/{os}-{arch}.json` with a `Version` field. The check is
//! advisory only: failures are logged at debug level and never reach the user.

use std::time::Duration;

use anyhow::{Context, anyhow};
use serde::Deserialize;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::output::Console;

/// Default base URL of the release manifests.
pub(crate) const DEFAULT_UPDATE_URL: &str = "http://dl.webhippie.de/";

const BINARY_NAME: &str = "umschlag-cli";
const CHECK_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct Release {
    #[serde(rename = "Version")]
    version: String,
}

/// Start the update check unless this is a development build.
pub(crate) fn spawn(base: String, console: &Console) -> Option<JoinHandle<()>> {
    if cfg!(debug_assertions) {
        console.notice("Updates are disabled for development versions.");
        return None;
    }

    Some(tokio::spawn(async move {
        match latest_version(&base).await {
            Ok(latest) if is_newer(&latest, env!("CARGO_PKG_VERSION")) => {
                warn!(
                    current = env!("CARGO_PKG_VERSION"),
                    latest = %latest,
                    "a newer umschlag-cli release is available"
                );
            }
            Ok(latest) => debug!(latest = %latest, "umschlag-cli is up to date"),
            Err(err) => debug!(error = %format!("{err:#}"), "update check failed"),
        }
    }))
}

fn manifest_url(base: &str) -> String {
    format!(
        "{}/{BINARY_NAME}/{}-{}.json",
        base.trim_end_matches('/'),
        std::env::consts::OS,
        platform_arch(std::env::consts::ARCH)
    )
}

fn platform_arch(arch: &str) -> &str {
    match arch {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        "x86" => "386",
        other => other,
    }
}

async fn latest_version(base: &str) -> anyhow::Result<String> {
    let url = manifest_url(base);
    let client = reqwest::Client::builder()
        .timeout(CHECK_TIMEOUT)
        .build()
        .context("failed to build update client")?;

    let response = client
        .get(&url)
        .send()
        .await
        .with_context(|| format!("request to {url} failed"))?;
    if !response.status().is_success() {
        return Err(anyhow!("{url} returned {}", response.status()));
    }

    let release = response
        .json::<Release>()
        .await
        .context("failed to parse release manifest")?;
    Ok(release.version)
}

/// Compare dotted numeric versions, ignoring a leading `v` and pre-release suffixes.
fn is_newer(candidate: &str, current: &str) -> bool {
    match (parse_version(candidate), parse_version(current)) {
        (Some(candidate), Some(current)) => candidate > current,
        _ => false,
    }
}

fn parse_version(raw: &str) -> Option<Vec<u64>> {
    let core = raw.trim().trim_start_matches('v');
    let core = core.split(['-', '+']).next()?;
    core.split('.').map(|part| part.parse().ok()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    #[test]
    fn versions_compare_numerically() {
        assert!(is_newer("0.10.0", "0.9.3"));
        assert!(is_newer("v1.0.0", "0.1.0"));
        assert!(!is_newer("0.1.0", "0.1.0"));
        assert!(!is_newer("0.1.0-rc1", "0.1.0"));
        assert!(!is_newer("latest", "0.1.0"));
    }

    #[test]
    fn manifest_url_names_the_platform() {
        let url = manifest_url("http://dl.example.com/");
        assert!(url.starts_with("http://dl.example.com/umschlag-cli/"));
        assert!(url.ends_with(".json"));
        assert_eq!(platform_arch("x86_64"), "amd64");
        assert_eq!(platform_arch("riscv64"), "riscv64");
    }

    #[tokio::test]
    async fn latest_version_reads_the_manifest() -> anyhow::Result<()> {
        let server = MockServer::start_async().await;
        let path = manifest_url("")
            .trim_start_matches('/')
            .to_string();
        let mock = server.mock(|when, then| {
            when.method(GET).path(format!("/{path}"));
            then.status(200).json_body(json!({"Version": "2.1.0"}));
        });

        let version = latest_version(&server.base_url()).await?;

        mock.assert();
        assert_eq!(version, "2.1.0");
        Ok(())
    }

    #[tokio::test]
    async fn missing_manifest_is_an_error() {
        let server = MockServer::start_async().await;
        let err = latest_version(&server.base_url())
            .await
            .expect_err("no manifest served");
        assert!(err.to_string().contains("returned 404"));
    }

    #[tokio::test]
    async fn development_builds_skip_the_check() {
        let console = Console::buffered();
        let handle = spawn("http://127.0.0.1:9/".into(), &console);
        if cfg!(debug_assertions) {
            assert!(handle.is_none());
            assert_eq!(
                console.stderr_text(),
                "Updates are disabled for development versions.\n"
            );
        } else if let Some(handle) = handle {
            handle.abort();
        }
    }
}
