//! Blocking GitHub client built on `ureq`.
//!
//! Head resolution goes through the REST API (counts against the API quota);
//! file contents come from the raw content host, which serves files of any
//! size and answers 404 for paths missing at a revision.

use std::io::{ErrorKind, Read};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::Deserialize;

use blockwatch_core::{RemoteSettings, Repository, Revision};

use crate::error::FetchError;
use crate::fetcher::RemoteFetcher;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct RepoInfo {
    default_branch: String,
}

/// Talks to `api.github.com` / `raw.githubusercontent.com` (or compatible hosts).
pub struct GitHubClient {
    agent: ureq::Agent,
    api_url: String,
    raw_url: String,
    token: Option<String>,
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("api_url", &self.api_url)
            .field("raw_url", &self.raw_url)
            .field("authenticated", &self.token.is_some())
            .finish()
    }
}

impl GitHubClient {
    /// Build a client. Without a token the host applies its stricter
    /// unauthenticated quota; nothing else changes.
    pub fn new(settings: &RemoteSettings, token: Option<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(CONNECT_TIMEOUT)
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(concat!("blockwatch/", env!("CARGO_PKG_VERSION")))
            .build();
        Self {
            agent,
            api_url: settings.api_url.trim_end_matches('/').to_string(),
            raw_url: settings.raw_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.trim().is_empty()),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    fn repo_url(&self, repository: &Repository) -> String {
        format!("{}/repos/{repository}", self.api_url)
    }

    fn commit_url(&self, repository: &Repository, branch: &str) -> String {
        format!("{}/repos/{repository}/commits/{branch}", self.api_url)
    }

    fn content_url(&self, repository: &Repository, path: &str, revision: &Revision) -> String {
        format!("{}/{repository}/{revision}/{path}", self.raw_url)
    }

    fn get(&self, url: &str, accept: &str) -> ureq::Request {
        let request = self.agent.get(url).set("Accept", accept);
        match &self.token {
            Some(token) => request.set("Authorization", &format!("Bearer {token}")),
            None => request,
        }
    }
}

impl RemoteFetcher for GitHubClient {
    fn head_revision(&self, repository: &Repository) -> Result<Revision, FetchError> {
        let url = self.repo_url(repository);
        tracing::debug!("resolving default branch: {url}");
        let info: RepoInfo = self
            .get(&url, "application/vnd.github+json")
            .call()
            .map_err(|e| classify(&url, e, || format!("repository {repository}")))?
            .into_json()
            .map_err(|e| read_error(&url, e))?;

        let url = self.commit_url(repository, &info.default_branch);
        tracing::debug!("resolving head of {}: {url}", info.default_branch);
        let body = self
            .get(&url, "application/vnd.github.sha")
            .call()
            .map_err(|e| {
                classify(&url, e, || {
                    format!("branch '{}' of {repository}", info.default_branch)
                })
            })?
            .into_string()
            .map_err(|e| read_error(&url, e))?;

        body.trim().parse().map_err(|e| FetchError::Decode {
            url,
            message: format!("{e}"),
        })
    }

    fn verify_revision(&self, repository: &Repository, revision: &Revision) -> Result<(), FetchError> {
        let url = self.commit_url(repository, revision.as_str());
        tracing::debug!("verifying revision {}: {url}", revision.short());
        let what = || format!("revision {revision} of {repository}");
        match self.get(&url, "application/vnd.github.sha").call() {
            Ok(_) => Ok(()),
            // The commits endpoint answers 422 for a well-formed but unknown sha.
            Err(ureq::Error::Status(422, _)) => Err(FetchError::NotFound { what: what() }),
            Err(e) => Err(classify(&url, e, what)),
        }
    }

    fn file_content_at(
        &self,
        repository: &Repository,
        path: &str,
        revision: &Revision,
    ) -> Result<Option<String>, FetchError> {
        let url = self.content_url(repository, path, revision);
        tracing::debug!("fetching {url}");
        let response = match self.get(&url, "text/plain").call() {
            Ok(response) => response,
            Err(ureq::Error::Status(404, _)) => {
                tracing::debug!("{path} absent at {}", revision.short());
                return Ok(None);
            }
            Err(e) => {
                return Err(classify(&url, e, || {
                    format!("{path} at {revision} in {repository}")
                }))
            }
        };

        // `into_string` caps bodies at 10 MB; large blocklists exceed that.
        let mut body = String::new();
        response
            .into_reader()
            .read_to_string(&mut body)
            .map_err(|e| read_error(&url, e))?;
        Ok(Some(body))
    }
}

// ---------------------------------------------------------------------------
// Response classification
// ---------------------------------------------------------------------------

/// Rate-limit related response headers, parsed leniently.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct RateLimitHints {
    /// `retry-after`, in seconds.
    pub retry_after: Option<u64>,
    /// `x-ratelimit-remaining`.
    pub remaining: Option<u64>,
    /// `x-ratelimit-reset`, Unix seconds.
    pub reset: Option<u64>,
}

impl RateLimitHints {
    fn from_response(response: &ureq::Response) -> Self {
        let number = |name: &str| response.header(name).and_then(|v| v.trim().parse().ok());
        Self {
            retry_after: number("retry-after"),
            remaining: number("x-ratelimit-remaining"),
            reset: number("x-ratelimit-reset"),
        }
    }

    /// How long the remote asked us to wait, if it said.
    pub fn delay(&self, now_unix: u64) -> Option<Duration> {
        self.retry_after
            .or_else(|| self.reset.map(|reset| reset.saturating_sub(now_unix)))
            .map(Duration::from_secs)
    }
}

fn classify(url: &str, err: ureq::Error, what: impl FnOnce() -> String) -> FetchError {
    match err {
        ureq::Error::Status(code, response) => {
            let hints = RateLimitHints::from_response(&response);
            classify_status(url, code, &hints, unix_now(), what)
        }
        ureq::Error::Transport(transport) => FetchError::Network {
            url: url.to_string(),
            message: transport.to_string(),
        },
    }
}

pub(crate) fn classify_status(
    url: &str,
    code: u16,
    hints: &RateLimitHints,
    now_unix: u64,
    what: impl FnOnce() -> String,
) -> FetchError {
    let quota_exhausted = hints.remaining == Some(0) || hints.retry_after.is_some();
    if code == 429 || (code == 403 && quota_exhausted) {
        return FetchError::RateLimited {
            url: url.to_string(),
            retry_after: hints.delay(now_unix),
        };
    }
    match code {
        404 | 410 => FetchError::NotFound { what: what() },
        500..=599 => FetchError::Network {
            url: url.to_string(),
            message: format!("server responded {code}"),
        },
        _ => FetchError::Rejected {
            url: url.to_string(),
            status: code,
        },
    }
}

fn read_error(url: &str, err: std::io::Error) -> FetchError {
    if err.kind() == ErrorKind::InvalidData {
        FetchError::Decode {
            url: url.to_string(),
            message: err.to_string(),
        }
    } else {
        FetchError::Network {
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
