//! Shared test support: a scriptable in-memory catalog provider.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream;
use podhoard::{CatalogProvider, Course, DownloadStream, Podcast, ProviderError};

/// Tracks how many media streams are open at once, and the high-water mark.
#[derive(Debug, Default)]
pub struct Gauge {
    active: AtomicUsize,
    max: AtomicUsize,
}

impl Gauge {
    fn enter(&self) {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max.fetch_max(now, Ordering::SeqCst);
    }

    fn exit(&self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }

    /// Highest number of simultaneously open streams observed.
    pub fn max_seen(&self) -> usize {
        self.max.load(Ordering::SeqCst)
    }
}

/// Scripted outcome for one course's podcast listing.
pub enum Listing {
    Podcasts(Vec<Podcast>),
    Fails(u16),
}

/// Scripted outcome for one podcast's media stream.
pub enum Media {
    Body(Vec<u8>),
    OpenFails(u16),
}

/// In-memory catalog provider with scripted listings and media bodies.
pub struct StubCatalog {
    courses: Vec<Course>,
    listings: HashMap<String, Listing>,
    media: HashMap<String, Media>,
    pub gauge: Arc<Gauge>,
    chunk_delay: Duration,
}

impl StubCatalog {
    pub fn new() -> Self {
        Self {
            courses: Vec::new(),
            listings: HashMap::new(),
            media: HashMap::new(),
            gauge: Arc::new(Gauge::default()),
            chunk_delay: Duration::ZERO,
        }
    }

    /// Delays every media chunk, keeping streams open long enough for
    /// concurrency observations.
    pub fn with_chunk_delay(mut self, delay: Duration) -> Self {
        self.chunk_delay = delay;
        self
    }

    /// Adds a course whose podcasts are listed newest first.
    pub fn add_course(&mut self, name: &str, podcasts: Vec<(String, Media)>) {
        let course_href = format!("/course/{}", self.courses.len());
        self.courses.push(Course::new(name, course_href.clone()));

        let mut listed = Vec::new();
        for (podcast_name, media) in podcasts {
            let href = format!("{course_href}/podcast/{}", listed.len());
            listed.push(Podcast::new(podcast_name, href.clone()));
            self.media.insert(href, media);
        }
        self.listings.insert(course_href, Listing::Podcasts(listed));
    }

    /// Adds a course whose podcast listing fails with the given status.
    pub fn add_failing_course(&mut self, name: &str, status: u16) {
        let href = format!("/course/{}", self.courses.len());
        self.courses.push(Course::new(name, href.clone()));
        self.listings.insert(href, Listing::Fails(status));
    }

    fn open_body(&self, body: &[u8]) -> DownloadStream {
        self.gauge.enter();
        let gauge = Arc::clone(&self.gauge);
        let delay = self.chunk_delay;
        let chunks: Vec<Bytes> = body.chunks(16).map(Bytes::copy_from_slice).collect();
        let total_size = body.len() as u64;

        let stream = stream::unfold(
            (chunks.into_iter(), gauge),
            move |(mut chunks, gauge)| async move {
                match chunks.next() {
                    Some(chunk) => {
                        if !delay.is_zero() {
                            tokio::time::sleep(delay).await;
                        }
                        Some((Ok(chunk), (chunks, gauge)))
                    }
                    None => {
                        gauge.exit();
                        None
                    }
                }
            },
        );

        DownloadStream {
            total_size,
            chunks: Box::pin(stream),
        }
    }
}

#[async_trait]
impl CatalogProvider for StubCatalog {
    async fn login(&self, _username: &str, _password: &str) -> Result<bool, ProviderError> {
        Ok(true)
    }

    async fn list_courses(&self) -> Result<Vec<Course>, ProviderError> {
        Ok(self.courses.clone())
    }

    async fn list_podcasts(&self, course: &Course) -> Result<Vec<Podcast>, ProviderError> {
        match self.listings.get(&course.href) {
            Some(Listing::Podcasts(podcasts)) => Ok(podcasts.clone()),
            Some(Listing::Fails(status)) => Err(ProviderError::status(
                format!("get podcasts for {}", course.name),
                *status,
            )),
            None => Err(ProviderError::malformed(
                format!("get podcasts for {}", course.name),
                "unknown course",
            )),
        }
    }

    async fn open_download(&self, podcast: &Podcast) -> Result<DownloadStream, ProviderError> {
        match self.media.get(&podcast.href) {
            Some(Media::Body(body)) => Ok(self.open_body(body)),
            Some(Media::OpenFails(status)) => Err(ProviderError::status(
                format!("get podcast for {}", podcast.name),
                *status,
            )),
            None => Err(ProviderError::malformed(
                format!("get podcast webpage for {}", podcast.name),
                "no download link found",
            )),
        }
    }
}
