//! Scryfall card catalog client.
//!
//! Translates fuzzy card names and free-text queries into card attributes via
//! the external catalog API. The catalog is a black box that can be slow or
//! down; every request carries a bounded timeout and the workflow treats all
//! failures as "card not found" rather than surfacing a server error.

pub mod types;

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::ScryfallConfig;
use crate::models::card::Card;
use types::{ScryfallCard, SearchPage};

/// Errors that can occur when talking to the catalog.
#[derive(Debug, Error)]
pub enum ScryfallError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The catalog has no card matching the request.
    #[error("card not found")]
    NotFound,

    /// The catalog returned an unexpected status.
    #[error("API error: {status}")]
    Api { status: u16 },
}

/// Scryfall catalog API client.
#[derive(Clone)]
pub struct ScryfallClient {
    client: reqwest::Client,
    base_url: String,
}

impl ScryfallClient {
    /// Create a new catalog client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &ScryfallConfig) -> Result<Self, ScryfallError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("rhystic-market/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
        })
    }

    /// Look up a single card by (fuzzy) name.
    ///
    /// # Errors
    ///
    /// Returns `ScryfallError::NotFound` when no card matches, on timeout, or
    /// on connection failure; other unexpected responses map to
    /// `ScryfallError::Api`.
    pub async fn find_by_name(&self, name: &str) -> Result<Card, ScryfallError> {
        let url = format!(
            "{}/cards/named?fuzzy={}",
            self.base_url,
            urlencoding::encode(name)
        );

        let card: ScryfallCard = self.get_json(&url).await?;
        Ok(card.into_card())
    }

    /// Search for paper printings matching a free-text query.
    ///
    /// `order` and `dir` are forwarded to the catalog when both are present,
    /// so result ordering is the catalog's. An empty result set is reported
    /// as `NotFound`.
    ///
    /// # Errors
    ///
    /// Same contract as [`Self::find_by_name`].
    pub async fn search(
        &self,
        query: &str,
        order: Option<&str>,
        dir: Option<&str>,
    ) -> Result<Vec<Card>, ScryfallError> {
        // The catalog treats '-' as a word joiner inside a single q term.
        let q = format!("{}+unique:prints+(game:paper)", query.replace(' ', "-"));

        let mut url = format!("{}/cards/search?q={q}", self.base_url);
        if let (Some(order), Some(dir)) = (order, dir) {
            url.push_str(&format!(
                "&order={}&dir={}",
                urlencoding::encode(order),
                urlencoding::encode(dir)
            ));
        }

        let page: SearchPage = self.get_json(&url).await?;
        if page.data.is_empty() {
            return Err(ScryfallError::NotFound);
        }

        Ok(page.data.into_iter().map(ScryfallCard::into_card).collect())
    }

    /// Issue a GET and decode the JSON body.
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ScryfallError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(into_not_found_on_transport)?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ScryfallError::NotFound);
        }
        if !status.is_success() {
            return Err(ScryfallError::Api {
                status: status.as_u16(),
            });
        }

        Ok(response.json().await?)
    }
}

/// Timeouts and connection failures mean the card cannot be resolved right
/// now; the contract reports them as `NotFound` instead of an upstream error.
fn into_not_found_on_transport(e: reqwest::Error) -> ScryfallError {
    if e.is_timeout() || e.is_connect() {
        ScryfallError::NotFound
    } else {
        ScryfallError::Http(e)
    }
}
