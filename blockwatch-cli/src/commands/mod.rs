pub mod baseline;
pub mod run;
pub mod status;

use std::path::Path;

use anyhow::{Context, Result};

use blockwatch_core::Config;
use blockwatch_remote::{GitHubClient, RetryPolicy, RetryingFetcher};

/// Environment variable holding an optional GitHub token.
pub const TOKEN_ENV: &str = "GITHUB_TOKEN";

pub fn load_config(path: &Path) -> Result<Config> {
    Config::load_at(path).with_context(|| {
        format!(
            "failed to load config {}; pass --config or create blockwatch.yaml",
            path.display()
        )
    })
}

/// Production fetcher: GitHub over HTTPS with the configured retry policy.
pub fn remote_fetcher(config: &Config) -> RetryingFetcher<GitHubClient> {
    let token = std::env::var(TOKEN_ENV).ok();
    let client = GitHubClient::new(&config.remote, token);
    if !client.is_authenticated() {
        tracing::debug!("{TOKEN_ENV} not set; using unauthenticated rate limits");
    }
    RetryingFetcher::new(client, RetryPolicy::from(&config.retry))
}
