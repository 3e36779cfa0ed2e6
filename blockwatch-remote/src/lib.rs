//! # blockwatch-remote
//!
//! Read-only access to a remote repository host.
//!
//! [`RemoteFetcher`] is the seam the sync engine depends on; [`GitHubClient`]
//! is the production implementation and [`RetryingFetcher`] wraps any
//! fetcher with the bounded back-off policy.

pub mod client;
pub mod error;
pub mod fetcher;
pub mod retry;

pub use client::GitHubClient;
pub use error::FetchError;
pub use fetcher::RemoteFetcher;
pub use retry::{RetryPolicy, RetryingFetcher, Sleeper, ThreadSleeper};
