//! CAS-backed university video portal adapter.
//!
//! Implements [`CatalogProvider`] against the portal's login service and
//! listing pages. Page structure knowledge is confined to this file: a small
//! set of precompiled patterns extracting the hidden login-form parameters,
//! the course/episode anchors and the download button href. Everything else
//! in the crate sees only abstract [`Course`]/[`Podcast`] records.

use async_trait::async_trait;
use futures_util::StreamExt;
use regex::Regex;
use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

use super::{CatalogProvider, Course, DownloadStream, Podcast, ProviderError};

/// HTTP connect timeout for portal requests (30 seconds).
const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Precompiled extraction patterns for the portal's markup.
#[derive(Debug)]
struct Markup {
    /// Hidden `lt` parameter on the login form.
    login_lt: Regex,
    /// Hidden `execution` parameter on the login form.
    login_execution: Regex,
    /// Error banner shown for rejected credentials.
    login_error: Regex,
    /// Course anchors on the lectures page.
    course: Regex,
    /// Episode anchors on a course page.
    episode: Regex,
    /// Download button on a podcast page.
    download_button: Regex,
}

impl Markup {
    /// Compiles the static portal patterns.
    #[allow(clippy::expect_used)]
    fn new() -> Self {
        // Static patterns; compilation cannot fail at runtime.
        let compile = |pattern: &str| Regex::new(pattern).expect("static portal pattern");
        Self {
            login_lt: compile(r#"name="lt"[^>]*value="([^"]*)""#),
            login_execution: compile(r#"name="execution"[^>]*value="([^"]*)""#),
            login_error: compile(r#"id="msg"[^>]*class="[^"]*\berrors\b"#),
            course: compile(r#"<li class="series">\s*<a href="([^"]+)">([^<]+)</a>"#),
            episode: compile(r#"<li class="episode">\s*<a href="([^"]+)">([^<]+)</a>"#),
            download_button: compile(r#"<a[^>]*id="downloadButton"[^>]*href="([^"]+)""#),
        }
    }
}

/// Catalog provider for the university video portal.
///
/// Holds the cookie session established at login; one instance serves the
/// whole run and is shared across transfer executors.
#[derive(Debug)]
pub struct VideoPortal {
    client: Client,
    login_url: Url,
    base_url: Url,
    markup: Markup,
}

impl VideoPortal {
    /// Creates a portal provider for the given login service and portal base
    /// URLs.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] if either URL is unparseable or the HTTP
    /// client cannot be constructed.
    pub fn new(login_url: &str, portal_url: &str) -> Result<Self, ProviderError> {
        let login_url = Url::parse(login_url).map_err(|err| {
            ProviderError::malformed("initialize provider", format!("bad login URL: {err}"))
        })?;
        let base_url = Url::parse(portal_url).map_err(|err| {
            ProviderError::malformed("initialize provider", format!("bad portal URL: {err}"))
        })?;

        let client = Client::builder()
            .cookie_store(true)
            .gzip(true)
            .connect_timeout(std::time::Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|source| ProviderError::network("initialize provider", source))?;

        Ok(Self {
            client,
            login_url,
            base_url,
            markup: Markup::new(),
        })
    }

    /// Joins a portal-relative href against the portal base URL.
    fn portal_url(&self, href: &str, action: &str) -> Result<Url, ProviderError> {
        self.base_url.join(href).map_err(|err| {
            ProviderError::malformed(action.to_string(), format!("bad href {href:?}: {err}"))
        })
    }

    /// Issues a GET and checks the status, returning the response on success.
    async fn get_checked(&self, url: Url, action: &str) -> Result<reqwest::Response, ProviderError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| ProviderError::network(action.to_string(), source))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::status(action.to_string(), status.as_u16()));
        }
        Ok(response)
    }

    /// Issues a GET and returns the body text on success.
    async fn get_text(&self, url: Url, action: &str) -> Result<String, ProviderError> {
        self.get_checked(url, action)
            .await?
            .text()
            .await
            .map_err(|source| ProviderError::network(action.to_string(), source))
    }

    fn extract(&self, pattern: &Regex, html: &str) -> Option<String> {
        pattern
            .captures(html)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }
}

#[async_trait]
impl CatalogProvider for VideoPortal {
    #[instrument(skip(self, password), fields(username = %username))]
    async fn login(&self, username: &str, password: &str) -> Result<bool, ProviderError> {
        // The login form carries hidden one-time parameters; fetch the page
        // first to extract them.
        let form_html = self
            .get_text(self.login_url.clone(), "get login page")
            .await?;

        let param_lt = self
            .extract(&self.markup.login_lt, &form_html)
            .ok_or_else(|| {
                ProviderError::malformed("get login page", "login form has no lt parameter")
            })?;
        let param_execution = self
            .extract(&self.markup.login_execution, &form_html)
            .ok_or_else(|| {
                ProviderError::malformed("get login page", "login form has no execution parameter")
            })?;

        let response = self
            .client
            .post(self.login_url.clone())
            .form(&[
                ("username", username),
                ("password", password),
                ("lt", &param_lt),
                ("execution", &param_execution),
                ("_eventId", "submit"),
                ("submit", "Login"),
            ])
            .send()
            .await
            .map_err(|source| ProviderError::network("log in", source))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::status("log in", status.as_u16()));
        }

        let result_html = response
            .text()
            .await
            .map_err(|source| ProviderError::network("log in", source))?;

        // The portal answers 200 either way; rejected credentials show an
        // error banner instead.
        let accepted = !self.markup.login_error.is_match(&result_html);
        debug!(accepted, "login response parsed");
        Ok(accepted)
    }

    #[instrument(skip(self))]
    async fn list_courses(&self) -> Result<Vec<Course>, ProviderError> {
        let action = "get video service";
        let url = self.portal_url("/lectures", action)?;
        let html = self.get_text(url, action).await?;

        let courses: Vec<Course> = self
            .markup
            .course
            .captures_iter(&html)
            .map(|caps| Course::new(caps[2].trim(), &caps[1]))
            .collect();
        debug!(count = courses.len(), "courses listed");
        Ok(courses)
    }

    #[instrument(skip(self, course), fields(course = %course.name))]
    async fn list_podcasts(&self, course: &Course) -> Result<Vec<Podcast>, ProviderError> {
        let action = format!("get podcasts for {}", course.name);
        let url = self.portal_url(&course.href, &action)?;
        let html = self.get_text(url, &action).await?;

        let podcasts: Vec<Podcast> = self
            .markup
            .episode
            .captures_iter(&html)
            .map(|caps| Podcast::new(caps[2].trim(), &caps[1]))
            .collect();
        debug!(count = podcasts.len(), "podcasts listed");
        Ok(podcasts)
    }

    #[instrument(skip(self, podcast), fields(podcast = %podcast.name))]
    async fn open_download(&self, podcast: &Podcast) -> Result<DownloadStream, ProviderError> {
        // Podcast page first, to find the media href behind the download
        // button.
        let page_action = format!("get podcast webpage for {}", podcast.name);
        let page_url = self.portal_url(&podcast.href, &page_action)?;
        let page_html = self.get_text(page_url, &page_action).await?;

        let media_href = self
            .extract(&self.markup.download_button, &page_html)
            .ok_or_else(|| {
                ProviderError::malformed(page_action.clone(), "no download link found")
            })?;

        let media_action = format!("get podcast for {}", podcast.name);
        let media_url = self.portal_url(&media_href, &media_action)?;
        let response = self.get_checked(media_url, &media_action).await?;

        let total_size = response.content_length().ok_or_else(|| {
            ProviderError::malformed(media_action.clone(), "no content length declared")
        })?;

        let chunks = response
            .bytes_stream()
            .map(move |chunk| {
                chunk.map_err(|source| ProviderError::network(media_action.clone(), source))
            })
            .boxed();

        Ok(DownloadStream { total_size, chunks })
    }
}
