//! Catalog providers: authentication, course/podcast discovery, media streams.
//!
//! This module defines the seam between the download core and a podcast
//! source. The core only ever sees the [`CatalogProvider`] trait:
//!
//! - [`CatalogProvider`] - async trait implemented by concrete portals
//! - [`Course`] / [`Podcast`] - opaque catalog records
//! - [`DownloadStream`] - an open media stream plus its declared length
//! - [`VideoPortal`] - the CAS-backed university portal adapter
//!
//! Cookie/session state lives inside the provider instance; nothing here is
//! process-global.

mod error;
mod portal;

pub use error::ProviderError;
pub use portal::VideoPortal;

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::Stream;

/// A named grouping of podcasts, mapped to one local subdirectory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Course {
    /// Display name of the course.
    pub name: String,
    /// Portal-relative href of the course podcast listing.
    pub href: String,
}

impl Course {
    /// Creates a course record.
    #[must_use]
    pub fn new(name: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            href: href.into(),
        }
    }
}

/// One discoverable downloadable media item (a recorded lecture).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Podcast {
    /// Display name of the podcast.
    pub name: String,
    /// Portal-relative href of the podcast page.
    pub href: String,
}

impl Podcast {
    /// Creates a podcast record.
    #[must_use]
    pub fn new(name: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            href: href.into(),
        }
    }
}

/// Boxed chunk stream yielded by [`CatalogProvider::open_download`].
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<Bytes, ProviderError>> + Send>>;

/// An open media download: a byte stream and its declared total length.
pub struct DownloadStream {
    /// Total length declared by the remote service, in bytes.
    pub total_size: u64,
    /// The chunked response body.
    pub chunks: ChunkStream,
}

impl std::fmt::Debug for DownloadStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadStream")
            .field("total_size", &self.total_size)
            .finish_non_exhaustive()
    }
}

/// Interface to a podcast source.
///
/// Implementations hold their own HTTP session/cookie state. All methods are
/// fallible with [`ProviderError`]; `login` distinguishes bad credentials
/// (`Ok(false)`) from transport or parsing failures (`Err`).
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Logs the user into the provider.
    ///
    /// Returns `Ok(false)` when the credentials are rejected.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] on transport or page-structure failures.
    async fn login(&self, username: &str, password: &str) -> Result<bool, ProviderError>;

    /// Lists the available courses.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] if the course listing cannot be fetched.
    async fn list_courses(&self) -> Result<Vec<Course>, ProviderError>;

    /// Lists the podcasts for one course, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] if the course page cannot be fetched.
    async fn list_podcasts(&self, course: &Course) -> Result<Vec<Podcast>, ProviderError>;

    /// Opens the media download for one podcast.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] if the podcast page or media resource is
    /// unavailable, or if the media response declares no content length.
    async fn open_download(&self, podcast: &Podcast) -> Result<DownloadStream, ProviderError>;
}
