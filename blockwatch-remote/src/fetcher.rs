//! The read-only view of a remote repository that the sync engine needs.

use blockwatch_core::{Repository, Revision};

use crate::error::FetchError;

/// Retrieves revisions and file contents from a repository host.
///
/// Implementations never mutate remote state.
pub trait RemoteFetcher {
    /// Most recent revision of the repository's default branch.
    fn head_revision(&self, repository: &Repository) -> Result<Revision, FetchError>;

    /// Confirm `revision` exists in the repository.
    ///
    /// Fails with `FetchError::NotFound` for an unknown or garbage-collected
    /// revision. Content lookups cannot make that distinction: a missing
    /// revision and a missing path both read as absent.
    fn verify_revision(&self, repository: &Repository, revision: &Revision)
        -> Result<(), FetchError>;

    /// Raw text of `path` as of `revision`.
    ///
    /// `Ok(None)` means the path did not exist at that revision, which is a
    /// normal state for a newly tracked file rather than an error.
    fn file_content_at(
        &self,
        repository: &Repository,
        path: &str,
        revision: &Revision,
    ) -> Result<Option<String>, FetchError>;
}

impl<T: RemoteFetcher + ?Sized> RemoteFetcher for &T {
    fn head_revision(&self, repository: &Repository) -> Result<Revision, FetchError> {
        (**self).head_revision(repository)
    }

    fn verify_revision(
        &self,
        repository: &Repository,
        revision: &Revision,
    ) -> Result<(), FetchError> {
        (**self).verify_revision(repository, revision)
    }

    fn file_content_at(
        &self,
        repository: &Repository,
        path: &str,
        revision: &Revision,
    ) -> Result<Option<String>, FetchError> {
        (**self).file_content_at(repository, path, revision)
    }
}

impl<T: RemoteFetcher + ?Sized> RemoteFetcher for Box<T> {
    fn head_revision(&self, repository: &Repository) -> Result<Revision, FetchError> {
        (**self).head_revision(repository)
    }

    fn verify_revision(
        &self,
        repository: &Repository,
        revision: &Revision,
    ) -> Result<(), FetchError> {
        (**self).verify_revision(repository, revision)
    }

    fn file_content_at(
        &self,
        repository: &Repository,
        path: &str,
        revision: &Revision,
    ) -> Result<Option<String>, FetchError> {
        (**self).file_content_at(repository, path, revision)
    }
}
