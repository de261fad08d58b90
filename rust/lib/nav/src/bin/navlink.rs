//! navlink: resolve a launch URL the way a mounted root would.
//!
//! Prints the resolved initial state, the action that reaches it and the
//! path it maps back to, as JSON.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use serde_json::json;
use tracing::info;

use openerp_nav::action::state_to_action;
use openerp_nav::path::state_to_path;
use openerp_nav::platform::InitialUrl;
use openerp_nav::{
    LinkingOptions, MemoryBackHandler, MemoryPlatform, NavigationRoot, NavigationStore, Render,
    ResolverConfig, RootOptions,
};

/// Resolve a deep link against a linking config.
#[derive(Parser, Debug)]
#[command(name = "navlink", about = "Resolve a deep link against a linking config")]
struct Cli {
    /// Linking options as JSON (`prefixes`, `config`, `enabled`).
    #[arg(long = "config")]
    config: Option<PathBuf>,

    /// Extra URL prefix, e.g. `myapp://`. Repeatable.
    #[arg(long = "prefix")]
    prefix: Vec<String>,

    /// How long to wait for the launch URL, in milliseconds.
    #[arg(long = "timeout-ms")]
    timeout_ms: Option<u64>,

    /// Launch URL. Omit to resolve as a launch without a link.
    url: Option<String>,
}

impl Cli {
    fn linking(&self) -> anyhow::Result<LinkingOptions> {
        let mut linking = match &self.config {
            Some(path) => LinkingOptions::from_json_file(path)?,
            None => LinkingOptions::default(),
        };
        linking.prefixes.extend(self.prefix.iter().cloned());
        Ok(linking)
    }

    fn resolver(&self) -> ResolverConfig {
        self.timeout_ms
            .map(|ms| ResolverConfig::with_timeout(Duration::from_millis(ms)))
            .unwrap_or_default()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let linking = cli.linking()?;
    info!(url = ?cli.url, prefixes = ?linking.prefixes, "resolving");

    let route_names: Vec<String> = linking
        .config
        .as_ref()
        .map(|c| c.screens.keys().cloned().collect())
        .unwrap_or_default();
    let store = Arc::new(NavigationStore::with_route_names(route_names));
    let platform = Arc::new(MemoryPlatform::new(InitialUrl::Ready(cli.url.clone())));

    let root = NavigationRoot::mount(
        RootOptions::<()>::new()
            .with_linking(linking)
            .with_resolver(cli.resolver()),
        store,
        platform,
        Arc::new(MemoryBackHandler::new()),
    );
    root.ready().await;

    let Render::Navigator(view) = root.render() else {
        anyhow::bail!("navigation root did not become ready");
    };
    let options = view.linking.options();

    let (action, path) = match &view.initial_state {
        Some(state) => (
            state_to_action(state, None, &options),
            Some(state_to_path(state, &options)?),
        ),
        None => (None, None),
    };

    let out = json!({
        "resolution": root.resolution().map(|r| format!("{r:?}")),
        "state": view.initial_state,
        "action": action,
        "path": path,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);

    root.unmount();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_flags_and_url() {
        let cli = Cli::try_parse_from([
            "navlink",
            "--prefix",
            "myapp://",
            "--prefix=https://app.example.com",
            "--timeout-ms",
            "500",
            "myapp://user/42",
        ])
        .unwrap();

        assert_eq!(cli.prefix, vec!["myapp://", "https://app.example.com"]);
        assert_eq!(cli.url.as_deref(), Some("myapp://user/42"));
        assert_eq!(cli.resolver().initial_url_timeout, Duration::from_millis(500));
    }

    #[test]
    fn defaults_without_flags() {
        let cli = Cli::try_parse_from(["navlink"]).unwrap();
        assert!(cli.url.is_none());
        assert_eq!(cli.resolver(), ResolverConfig::default());
        assert!(cli.linking().unwrap().prefixes.is_empty());
    }

    #[test]
    fn rejects_non_numeric_timeout() {
        assert!(Cli::try_parse_from(["navlink", "--timeout-ms", "soon"]).is_err());
    }

    #[test]
    fn prefixes_extend_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"prefixes": ["myapp://"]}"#).unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let cli = Cli::try_parse_from(["navlink", "--config", &path, "--prefix", "other://"])
            .unwrap();
        assert_eq!(cli.linking().unwrap().prefixes, vec!["myapp://", "other://"]);
    }
}
