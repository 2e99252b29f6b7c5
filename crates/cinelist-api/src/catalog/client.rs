//! `CatalogClient` - movie catalog API client implementation.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::instrument;
use url::Url;

use super::api::CatalogApi;
use super::error::CatalogError;
use super::types::{Category, Movie, MoviePage};

/// Default base URL for the catalog API (TMDB v3).
const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3/";

/// Default response language.
const DEFAULT_LANGUAGE: &str = "en-US";

/// Credential value shipped in sample configs; never valid.
const PLACEHOLDER_API_KEY: &str = "YOUR_API_KEY";

/// Query parameter carrying the credential.
const API_KEY_PARAM: &str = "api_key";

/// Error body returned by the catalog on non-2xx responses.
#[derive(Debug, Deserialize)]
struct CatalogErrorResponse {
    /// Catalog error code.
    status_code: u32,
    /// Error message.
    status_message: String,
}

/// Movie catalog API client.
#[derive(Debug, Clone)]
#[allow(clippy::module_name_repetitions)]
pub struct CatalogClient {
    /// HTTP client.
    http_client: Client,
    /// Base URL for API requests.
    base_url: Url,
    /// API key sent as a query parameter.
    api_key: String,
    /// Response language (e.g. "es-ES").
    language: String,
}

/// Builder for `CatalogClient`.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct CatalogClientBuilder {
    base_url: Option<Url>,
    api_key: Option<String>,
    user_agent: Option<String>,
    language: Option<String>,
    timeout: Option<Duration>,
}

impl CatalogClientBuilder {
    /// Creates a new builder.
    const fn new() -> Self {
        Self {
            base_url: None,
            api_key: None,
            user_agent: None,
            language: None,
            timeout: None,
        }
    }

    /// Overrides the base URL (for wiremock in tests).
    #[must_use]
    pub fn base_url(mut self, url: Url) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Sets the API key (required).
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the User-Agent (required).
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Sets the response language (default: "en-US").
    #[must_use]
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Sets a total request timeout (default: none).
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the client.
    ///
    /// An empty API key is accepted here; requests made with it fail with
    /// [`CatalogError::InvalidCredentials`] without touching the network.
    ///
    /// # Errors
    ///
    /// - `api_key` is not set.
    /// - `user_agent` is not set.
    /// - `reqwest::Client` build fails.
    pub fn build(self) -> Result<CatalogClient> {
        let api_key = self.api_key.context("api_key is required")?;
        let user_agent = self.user_agent.context("user_agent is required")?;

        let base_url = if let Some(url) = self.base_url {
            url
        } else {
            let result = Url::parse(DEFAULT_BASE_URL);
            result.context("invalid default base URL")?
        };

        let mut http_builder = Client::builder().user_agent(&user_agent).gzip(true);
        if let Some(timeout) = self.timeout {
            http_builder = http_builder.timeout(timeout);
        }
        let http_client = http_builder
            .build()
            .context("failed to build HTTP client")?;

        Ok(CatalogClient {
            http_client,
            base_url,
            api_key,
            language: self
                .language
                .unwrap_or_else(|| String::from(DEFAULT_LANGUAGE)),
        })
    }
}

impl CatalogClient {
    /// Creates a new builder.
    #[must_use]
    pub const fn builder() -> CatalogClientBuilder {
        CatalogClientBuilder::new()
    }

    /// Returns `true` if the configured key can possibly be accepted.
    fn has_usable_key(&self) -> bool {
        let key = self.api_key.trim();
        !key.is_empty() && key != PLACEHOLDER_API_KEY
    }

    /// Sends a single GET request and decodes the JSON body.
    ///
    /// `query` is sent first, followed by the credential and language.
    #[instrument(skip_all)]
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, CatalogError> {
        if !self.has_usable_key() {
            tracing::debug!(path, "catalog API key missing or placeholder");
            return Err(CatalogError::InvalidCredentials);
        }

        let url = self.base_url.join(path).map_err(|e| {
            tracing::debug!(path, error = %e, "failed to join URL path");
            CatalogError::InvalidUrl
        })?;

        let mut params: Vec<(&str, String)> = query.to_vec();
        params.push((API_KEY_PARAM, self.api_key.clone()));
        params.push(("language", self.language.clone()));

        let request = self
            .http_client
            .get(url)
            .query(&params)
            .build()
            .map_err(|e| CatalogError::from_transport(&e))?;

        tracing::debug!(url = %redacted(request.url()), "catalog API request");

        let response = self.http_client.execute(request).await.map_err(|e| {
            let kind = CatalogError::from_transport(&e);
            let e = e.without_url();
            tracing::debug!(path, error = %e, ?kind, "catalog API transport failure");
            kind
        })?;

        let status = response.status();
        if !status.is_success() {
            let kind = CatalogError::from_status(status.as_u16());
            match response.text().await {
                Ok(body) => {
                    if let Ok(error_response) = serde_json::from_str::<CatalogErrorResponse>(&body)
                    {
                        tracing::debug!(
                            %status,
                            code = error_response.status_code,
                            message = %error_response.status_message,
                            ?kind,
                            "catalog API error response"
                        );
                    } else {
                        tracing::debug!(%status, ?kind, "catalog API error response");
                    }
                }
                Err(e) => {
                    let e = e.without_url();
                    tracing::debug!(%status, error = %e, ?kind, "failed to read error body");
                }
            }
            return Err(kind);
        }

        let body = response.bytes().await.map_err(|e| {
            let kind = CatalogError::from_transport(&e);
            let e = e.without_url();
            tracing::debug!(path, error = %e, ?kind, "failed to read response body");
            kind
        })?;

        if body.is_empty() {
            return Err(CatalogError::NoData);
        }

        serde_json::from_slice(&body).map_err(|e| {
            let kind = CatalogError::from_json(&e);
            tracing::debug!(path, error = %e, ?kind, "failed to decode JSON response");
            kind
        })
    }
}

/// Returns a copy of `url` with the credential replaced, for logging.
pub(super) fn redacted(url: &Url) -> Url {
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            if k == API_KEY_PARAM {
                (k.into_owned(), String::from("***"))
            } else {
                (k.into_owned(), v.into_owned())
            }
        })
        .collect();
    let mut out = url.clone();
    out.query_pairs_mut().clear().extend_pairs(pairs);
    out
}

impl CatalogApi for CatalogClient {
    #[instrument(skip_all, fields(category = %category, page = page))]
    async fn fetch_page(&self, category: Category, page: u32) -> Result<MoviePage, CatalogError> {
        if page == 0 {
            return Err(CatalogError::InvalidUrl);
        }
        let path = format!("movie/{}", category.as_str());
        let query = [("page", page.to_string())];
        self.get_json(&path, &query).await
    }

    #[instrument(skip_all, fields(id = id))]
    async fn fetch_detail(&self, id: u64) -> Result<Movie, CatalogError> {
        let path = format!("movie/{id}");
        self.get_json(&path, &[]).await
    }
}
